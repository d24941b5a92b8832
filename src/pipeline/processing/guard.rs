use serde_json::{Map, Value};

/// Amount fields any retained transaction row must populate at least one of.
const TRANSACTION_AMOUNT_FIELDS: [&str; 4] = [
    "amounts.expenseAmount",
    "amounts.depositAmount",
    "amounts.bankAmount",
    "amounts.balanceAfter",
];

/// Fields that give a project row an identity of its own. Summary and
/// subtotal rows carry numeric totals but none of these.
const PROJECT_IDENTITY_FIELDS: [&str; 6] = [
    "name",
    "clientOrg",
    "budgetCategory",
    "budgetSubCategory",
    "budgetDetail",
    "expenseCategory",
];

/// Collection-specific admission rules for assembled records. Collections
/// without rules admit everything.
pub fn admit_record(record: &Map<String, Value>, target_collection: &str) -> bool {
    match target_collection {
        "transactions" => admit_transaction(record),
        "projects" => admit_project(record),
        _ => true,
    }
}

fn admit_transaction(record: &Map<String, Value>) -> bool {
    let has_when = is_present(field_at(record, "dateTime")) || is_present(field_at(record, "weekCode"));
    let has_method = is_present(field_at(record, "method"));
    let has_amount = TRANSACTION_AMOUNT_FIELDS
        .iter()
        .any(|path| !matches!(field_at(record, path), None | Some(Value::Null)));
    has_when && has_method && has_amount
}

fn admit_project(record: &Map<String, Value>) -> bool {
    PROJECT_IDENTITY_FIELDS
        .iter()
        .any(|path| is_present(field_at(record, path)))
}

/// Dot-path field lookup.
fn field_at<'a>(record: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut current: Option<&Value> = None;
    for segment in path.split('.') {
        current = match current {
            None => record.get(segment),
            Some(Value::Object(map)) => map.get(segment),
            Some(_) => return None,
        };
        current?;
    }
    current
}

/// Present means not null and not a blank string.
fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(text)) => !text.trim().is_empty(),
        Some(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::processing::assemble::set_path;
    use serde_json::json;

    fn record(pairs: &[(&str, Value)]) -> Map<String, Value> {
        let mut map = Map::new();
        for (path, value) in pairs {
            set_path(&mut map, path, value.clone());
        }
        map
    }

    #[test]
    fn transaction_needs_date_or_week_code() {
        let admitted = record(&[
            ("dateTime", json!("2024-03-05")),
            ("method", json!("card")),
            ("amounts.expenseAmount", json!(1000)),
        ]);
        assert!(admit_record(&admitted, "transactions"));

        let by_week = record(&[
            ("weekCode", json!("2024-W10")),
            ("method", json!("cash")),
            ("amounts.depositAmount", json!(500)),
        ]);
        assert!(admit_record(&by_week, "transactions"));

        let dateless = record(&[
            ("method", json!("card")),
            ("amounts.expenseAmount", json!(1000)),
        ]);
        assert!(!admit_record(&dateless, "transactions"));
    }

    #[test]
    fn transaction_needs_a_method() {
        let methodless = record(&[
            ("dateTime", json!("2024-03-05")),
            ("amounts.expenseAmount", json!(1000)),
        ]);
        assert!(!admit_record(&methodless, "transactions"));

        let blank_method = record(&[
            ("dateTime", json!("2024-03-05")),
            ("method", json!("   ")),
            ("amounts.expenseAmount", json!(1000)),
        ]);
        assert!(!admit_record(&blank_method, "transactions"));
    }

    #[test]
    fn transaction_needs_at_least_one_amount() {
        let amountless = record(&[
            ("dateTime", json!("2024-03-05")),
            ("method", json!("card")),
            ("amounts.expenseAmount", Value::Null),
        ]);
        assert!(!admit_record(&amountless, "transactions"));

        let with_balance = record(&[
            ("dateTime", json!("2024-03-05")),
            ("method", json!("card")),
            ("amounts.balanceAfter", json!(0)),
        ]);
        assert!(admit_record(&with_balance, "transactions"));
    }

    #[test]
    fn project_needs_an_identity_field() {
        let subtotal = record(&[
            ("totalAmount", json!(99000)),
            ("name", Value::Null),
        ]);
        assert!(!admit_record(&subtotal, "projects"));

        let named = record(&[("budgetDetail", json!("연구장비"))]);
        assert!(admit_record(&named, "projects"));
    }

    #[test]
    fn unknown_collections_admit_everything() {
        assert!(admit_record(&Map::new(), "members"));
    }
}

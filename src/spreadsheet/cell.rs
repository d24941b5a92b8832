use chrono::NaiveDateTime;
use serde_json::Value;

/// A raw cell value as reported by the underlying workbook reader, before
/// normalization. Readers surface several representations for what a caller
/// ultimately wants as a scalar: native dates, rich-text runs, cached
/// formula results, and error markers.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RawCell {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDateTime),
    /// Rich-text run contents, in document order.
    RichText(Vec<String>),
    /// A formula cell, with the reader's cached result when one exists.
    Formula {
        formula: String,
        result: Option<Box<RawCell>>,
    },
    /// An error marker such as #REF! or #DIV/0!.
    Error(String),
}

/// Normalizes one raw cell value into a plain scalar.
///
/// Richer and cached representations are preferred over surfacing ambiguous
/// shapes to callers: dates collapse to their ISO calendar date, rich text
/// to its concatenated runs, formulas to their cached result. Error markers
/// and uncached formulas read as null.
pub fn resolve_cell(cell: &RawCell) -> Value {
    match cell {
        RawCell::Empty => Value::Null,
        RawCell::Date(dt) => Value::String(dt.date().format("%Y-%m-%d").to_string()),
        RawCell::RichText(runs) => Value::String(runs.concat()),
        RawCell::Formula {
            result: Some(result),
            ..
        } => match result.as_ref() {
            RawCell::Error(_) => Value::Null,
            other => resolve_cell(other),
        },
        RawCell::Formula { result: None, .. } => Value::Null,
        RawCell::Text(text) => Value::String(text.clone()),
        RawCell::Error(_) => Value::Null,
        RawCell::Number(n) => serde_json::Number::from_f64(*n)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        RawCell::Bool(b) => Value::Bool(*b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> RawCell {
        RawCell::Date(NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(13, 45, 0).unwrap())
    }

    #[test]
    fn empty_resolves_to_null() {
        assert_eq!(resolve_cell(&RawCell::Empty), Value::Null);
    }

    #[test]
    fn date_keeps_only_the_calendar_date() {
        assert_eq!(resolve_cell(&date(2024, 3, 5)), json!("2024-03-05"));
    }

    #[test]
    fn rich_text_concatenates_runs_without_separator() {
        let cell = RawCell::RichText(vec!["결제".to_string(), " 완료".to_string()]);
        assert_eq!(resolve_cell(&cell), json!("결제 완료"));
    }

    #[test]
    fn formula_prefers_cached_result() {
        let cell = RawCell::Formula {
            formula: "SUM(A1:A3)".to_string(),
            result: Some(Box::new(RawCell::Number(42.0))),
        };
        assert_eq!(resolve_cell(&cell), json!(42.0));
    }

    #[test]
    fn formula_with_error_result_is_null() {
        let cell = RawCell::Formula {
            formula: "A1/B1".to_string(),
            result: Some(Box::new(RawCell::Error("#DIV/0!".to_string()))),
        };
        assert_eq!(resolve_cell(&cell), Value::Null);
    }

    #[test]
    fn uncached_formula_is_null() {
        let cell = RawCell::Formula {
            formula: "TODAY()".to_string(),
            result: None,
        };
        assert_eq!(resolve_cell(&cell), Value::Null);
    }

    #[test]
    fn error_marker_is_null() {
        assert_eq!(resolve_cell(&RawCell::Error("#REF!".to_string())), Value::Null);
    }

    #[test]
    fn primitives_pass_through() {
        assert_eq!(resolve_cell(&RawCell::Text("메모".to_string())), json!("메모"));
        assert_eq!(resolve_cell(&RawCell::Number(1.5)), json!(1.5));
        assert_eq!(resolve_cell(&RawCell::Bool(true)), json!(true));
    }

    #[test]
    fn non_finite_numbers_are_null() {
        assert_eq!(resolve_cell(&RawCell::Number(f64::NAN)), Value::Null);
    }
}

// Named normalization functions applied to raw cell values during record
// assembly. The registry is process-wide and read-only after first use.

pub mod rate;

use std::collections::HashMap;

use anyhow::{anyhow, Result};
use chrono::{Datelike, Duration, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// A single-argument pure normalization function.
pub type Transform = fn(&Value) -> Result<Value>;

/// Registry of named normalizers, keyed by the names the upstream schema
/// discovery emits in `ColumnMapping.transform`.
static TRANSFORM_MAP: Lazy<HashMap<&'static str, Transform>> = Lazy::new(|| {
    let mut map: HashMap<&'static str, Transform> = HashMap::new();
    map.insert("normalizeDate", normalize_date);
    map.insert("normalizeAmount", normalize_amount);
    map.insert("normalizePercent", normalize_percent);
    map.insert("normalizePaymentMethod", normalize_payment_method);
    map.insert("normalizeProjectStatus", normalize_project_status);
    map.insert("normalizeProjectType", normalize_project_type);
    map.insert("normalizeSettlementType", normalize_settlement_type);
    map.insert("normalizeAccountType", normalize_account_type);
    map.insert("normalizeString", normalize_string);
    map.insert("normalizeWeekCode", normalize_week_code);
    map
});

/// Apply a named transform. An unregistered name is a no-op.
pub fn apply(name: &str, value: &Value) -> Result<Value> {
    match TRANSFORM_MAP.get(name) {
        Some(transform) => transform(value),
        None => Ok(value.clone()),
    }
}

pub fn is_registered(name: &str) -> bool {
    TRANSFORM_MAP.contains_key(name)
}

fn non_scalar(name: &str, value: &Value) -> anyhow::Error {
    anyhow!("{} cannot normalize non-scalar value: {}", name, value)
}

fn number_value(n: f64) -> Value {
    serde_json::Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
}

/// Excel serial date origin. Serial 1 is 1900-01-01 in the 1900 date system.
fn excel_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1899, 12, 30).unwrap()
}

static ISO_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})[-./](\d{1,2})[-./](\d{1,2})").unwrap());
static KOREAN_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})\s*년\s*(\d{1,2})\s*월\s*(\d{1,2})\s*일?").unwrap());

fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let captures = ISO_DATE_RE.captures(text).or_else(|| KOREAN_DATE_RE.captures(text))?;
    let year: i32 = captures[1].parse().ok()?;
    let month: u32 = captures[2].parse().ok()?;
    let day: u32 = captures[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Dates arrive as ISO-ish strings, Korean-labelled strings, or raw Excel
/// serial numbers. All collapse to "YYYY-MM-DD"; unparseable text reads as
/// null rather than failing the row.
fn normalize_date(value: &Value) -> Result<Value> {
    match value {
        Value::Null => Ok(Value::Null),
        Value::String(text) => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(Value::Null);
            }
            Ok(parse_date_text(text)
                .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
                .unwrap_or(Value::Null))
        }
        Value::Number(n) => {
            let serial = n.as_f64().filter(|v| v.is_finite() && *v > 0.0);
            Ok(serial
                .and_then(|s| excel_epoch().checked_add_signed(Duration::days(s.trunc() as i64)))
                .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
                .unwrap_or(Value::Null))
        }
        Value::Bool(_) => Ok(Value::Null),
        other => Err(non_scalar("normalizeDate", other)),
    }
}

static AMOUNT_STRIP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[₩$,\s원]").unwrap());

/// Monetary amounts: strips currency markers and thousands separators,
/// treats accounting-style parentheses as negation. Also used directly by
/// the matrix extractor for numeric side-table cells.
pub(crate) fn normalize_amount(value: &Value) -> Result<Value> {
    match value {
        Value::Null => Ok(Value::Null),
        Value::Number(n) => Ok(n
            .as_f64()
            .filter(|v| v.is_finite())
            .map(number_value)
            .unwrap_or(Value::Null)),
        Value::String(text) => {
            let mut cleaned = AMOUNT_STRIP_RE.replace_all(text, "").into_owned();
            let mut negative = false;
            if cleaned.starts_with('(') && cleaned.ends_with(')') {
                negative = true;
                cleaned = cleaned[1..cleaned.len() - 1].to_string();
            }
            if cleaned.is_empty() {
                return Ok(Value::Null);
            }
            match cleaned.parse::<f64>() {
                Ok(parsed) if parsed.is_finite() => {
                    Ok(number_value(if negative { -parsed } else { parsed }))
                }
                _ => Ok(Value::Null),
            }
        }
        Value::Bool(_) => Ok(Value::Null),
        other => Err(non_scalar("normalizeAmount", other)),
    }
}

/// Percent-suffixed strings become fractions; bare numbers are taken as
/// already-fractional Excel percent cells and pass through.
fn normalize_percent(value: &Value) -> Result<Value> {
    match value {
        Value::Null => Ok(Value::Null),
        Value::Number(n) => Ok(n
            .as_f64()
            .filter(|v| v.is_finite())
            .map(number_value)
            .unwrap_or(Value::Null)),
        Value::String(text) => {
            let had_percent = text.contains('%');
            let cleaned: String = text
                .chars()
                .filter(|c| !c.is_whitespace() && *c != '%' && *c != ',')
                .collect();
            if cleaned.is_empty() {
                return Ok(Value::Null);
            }
            match cleaned.parse::<f64>() {
                Ok(parsed) if parsed.is_finite() => {
                    Ok(number_value(if had_percent { parsed / 100.0 } else { parsed }))
                }
                _ => Ok(Value::Null),
            }
        }
        Value::Bool(_) => Ok(Value::Null),
        other => Err(non_scalar("normalizePercent", other)),
    }
}

/// Maps a label through (substring, canonical) pairs; unknown labels pass
/// through trimmed so downstream consumers still see the source wording.
fn normalize_label(value: &Value, table: &[(&str, &str)]) -> Result<Value> {
    match value {
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Ok(Value::Null);
            }
            for (needle, canonical) in table {
                if trimmed.contains(needle) {
                    return Ok(Value::String((*canonical).to_string()));
                }
            }
            Ok(Value::String(trimmed.to_string()))
        }
        other => Ok(other.clone()),
    }
}

fn normalize_payment_method(value: &Value) -> Result<Value> {
    normalize_label(
        value,
        &[
            ("신용카드", "card"),
            ("체크카드", "card"),
            ("카드", "card"),
            ("현금", "cash"),
            ("자동이체", "auto_transfer"),
            ("계좌이체", "transfer"),
            ("이체", "transfer"),
            ("송금", "transfer"),
        ],
    )
}

fn normalize_project_status(value: &Value) -> Result<Value> {
    normalize_label(
        value,
        &[
            ("진행", "in_progress"),
            ("완료", "completed"),
            ("예정", "planned"),
            ("보류", "on_hold"),
            ("중단", "on_hold"),
            ("취소", "cancelled"),
        ],
    )
}

fn normalize_project_type(value: &Value) -> Result<Value> {
    normalize_label(
        value,
        &[
            ("용역", "service"),
            ("연구", "research"),
            ("개발", "development"),
            ("컨설팅", "consulting"),
            ("내부", "internal"),
        ],
    )
}

fn normalize_settlement_type(value: &Value) -> Result<Value> {
    normalize_label(
        value,
        &[
            ("선금", "advance"),
            ("착수금", "advance"),
            ("중도금", "interim"),
            ("잔금", "balance"),
            ("일시불", "lump_sum"),
            ("월", "monthly"),
        ],
    )
}

fn normalize_account_type(value: &Value) -> Result<Value> {
    normalize_label(
        value,
        &[
            ("법인", "corporate"),
            ("개인", "personal"),
            ("저축", "savings"),
            ("보통", "checking"),
        ],
    )
}

/// Generic string cleanup: trim and collapse internal whitespace runs.
fn normalize_string(value: &Value) -> Result<Value> {
    match value {
        Value::String(text) => {
            let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
            if collapsed.is_empty() {
                Ok(Value::Null)
            } else {
                Ok(Value::String(collapsed))
            }
        }
        other => Ok(other.clone()),
    }
}

static YEAR_WEEK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(\d{4})\s*[-_]?\s*W\s*(\d{1,2})$").unwrap());
static KOREAN_WEEK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:(\d{4})\s*년\s*)?(\d{1,2})\s*주차?$").unwrap());
static BARE_WEEK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^W\s*(\d{1,2})$").unwrap());

fn week_code(year: Option<i32>, week: u32) -> Value {
    match year {
        Some(year) => Value::String(format!("{}-W{:02}", year, week)),
        None => Value::String(format!("W{:02}", week)),
    }
}

/// Week codes arrive as "2024-W5", "2024년 5주차", bare "5주차"/"W5", a week
/// number, or a plain date. All collapse to "YYYY-Wnn" (or "Wnn" when the
/// year is unknown).
fn normalize_week_code(value: &Value) -> Result<Value> {
    match value {
        Value::Null => Ok(Value::Null),
        Value::Number(n) => Ok(n
            .as_f64()
            .filter(|v| v.is_finite() && (1.0..=53.0).contains(&v.trunc()))
            .map(|v| week_code(None, v.trunc() as u32))
            .unwrap_or(Value::Null)),
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Ok(Value::Null);
            }
            if let Some(captures) = YEAR_WEEK_RE.captures(trimmed) {
                let year: i32 = captures[1].parse()?;
                let week: u32 = captures[2].parse()?;
                return Ok(week_code(Some(year), week));
            }
            if let Some(captures) = KOREAN_WEEK_RE.captures(trimmed) {
                let year = captures.get(1).and_then(|m| m.as_str().parse().ok());
                let week: u32 = captures[2].parse()?;
                return Ok(week_code(year, week));
            }
            if let Some(captures) = BARE_WEEK_RE.captures(trimmed) {
                let week: u32 = captures[1].parse()?;
                return Ok(week_code(None, week));
            }
            if let Some(date) = parse_date_text(trimmed) {
                let iso = date.iso_week();
                return Ok(week_code(Some(iso.year()), iso.week()));
            }
            Ok(Value::String(trimmed.to_string()))
        }
        Value::Bool(_) => Ok(Value::Null),
        other => Err(non_scalar("normalizeWeekCode", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unregistered_name_is_a_no_op() {
        let value = json!({"nested": true});
        assert_eq!(apply("normalizeNothing", &value).unwrap(), value);
    }

    #[test]
    fn date_formats_collapse_to_iso() {
        for raw in ["2024-03-05", "2024.03.05", "2024/3/5", "2024년 3월 5일"] {
            assert_eq!(apply("normalizeDate", &json!(raw)).unwrap(), json!("2024-03-05"), "{raw}");
        }
        assert_eq!(apply("normalizeDate", &json!("2024-03-05T09:30:00")).unwrap(), json!("2024-03-05"));
    }

    #[test]
    fn excel_serial_dates_convert() {
        // 45356 days past 1899-12-30 is 2024-03-05
        assert_eq!(apply("normalizeDate", &json!(45356)).unwrap(), json!("2024-03-05"));
    }

    #[test]
    fn unparseable_date_degrades_to_null() {
        assert_eq!(apply("normalizeDate", &json!("미정")).unwrap(), Value::Null);
    }

    #[test]
    fn amounts_strip_separators_and_currency() {
        assert_eq!(apply("normalizeAmount", &json!("1,000")).unwrap(), json!(1000.0));
        assert_eq!(apply("normalizeAmount", &json!("₩12,345원")).unwrap(), json!(12345.0));
        assert_eq!(apply("normalizeAmount", &json!("(2,500)")).unwrap(), json!(-2500.0));
        assert_eq!(apply("normalizeAmount", &json!(99.5)).unwrap(), json!(99.5));
        assert_eq!(apply("normalizeAmount", &json!("합계")).unwrap(), Value::Null);
    }

    #[test]
    fn amount_rejects_non_scalar_input() {
        assert!(apply("normalizeAmount", &json!(["1", "2"])).is_err());
        assert!(apply("normalizeAmount", &json!({"v": 1})).is_err());
    }

    #[test]
    fn percent_strings_become_fractions() {
        assert_eq!(apply("normalizePercent", &json!("45%")).unwrap(), json!(0.45));
        assert_eq!(apply("normalizePercent", &json!(0.45)).unwrap(), json!(0.45));
        assert_eq!(apply("normalizePercent", &json!("45")).unwrap(), json!(45.0));
    }

    #[test]
    fn known_labels_map_to_canonical_tokens() {
        assert_eq!(apply("normalizePaymentMethod", &json!("신용카드")).unwrap(), json!("card"));
        assert_eq!(apply("normalizePaymentMethod", &json!(" 계좌이체 ")).unwrap(), json!("transfer"));
        assert_eq!(apply("normalizeProjectStatus", &json!("진행중")).unwrap(), json!("in_progress"));
        assert_eq!(apply("normalizeSettlementType", &json!("잔금")).unwrap(), json!("balance"));
        assert_eq!(apply("normalizeAccountType", &json!("법인계좌")).unwrap(), json!("corporate"));
    }

    #[test]
    fn unknown_labels_pass_through_trimmed() {
        assert_eq!(apply("normalizeProjectType", &json!(" 특수과제 ")).unwrap(), json!("특수과제"));
    }

    #[test]
    fn strings_trim_and_collapse_whitespace() {
        assert_eq!(apply("normalizeString", &json!("  회계   1팀 ")).unwrap(), json!("회계 1팀"));
        assert_eq!(apply("normalizeString", &json!("   ")).unwrap(), Value::Null);
    }

    #[test]
    fn week_codes_normalize() {
        assert_eq!(apply("normalizeWeekCode", &json!("2024-W5")).unwrap(), json!("2024-W05"));
        assert_eq!(apply("normalizeWeekCode", &json!("2024W05")).unwrap(), json!("2024-W05"));
        assert_eq!(apply("normalizeWeekCode", &json!("2024년 5주차")).unwrap(), json!("2024-W05"));
        assert_eq!(apply("normalizeWeekCode", &json!("5주차")).unwrap(), json!("W05"));
        assert_eq!(apply("normalizeWeekCode", &json!(5)).unwrap(), json!("W05"));
        // 2024-03-05 falls in ISO week 10
        assert_eq!(apply("normalizeWeekCode", &json!("2024-03-05")).unwrap(), json!("2024-W10"));
    }

    #[test]
    fn registry_knows_its_names() {
        assert!(is_registered("normalizeAmount"));
        assert!(!is_registered("normalizeRate"));
    }
}

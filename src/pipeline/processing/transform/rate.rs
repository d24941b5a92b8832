use serde_json::Value;

/// Scale cutoff below which a numeric rate is taken as already fractional.
///
/// Source cells mix true fractions (0.35), integer percents (35), and
/// percent strings ("35%"). Everything above the cutoff shares one ÷100
/// bracket: 35 becomes 0.35 and 150 becomes 1.5 through the same division.
const FRACTION_CUTOFF: f64 = 2.0;

/// Normalizes a participation-rate cell into a fraction, or `None` when the
/// value is empty or unparseable.
pub fn normalize_rate(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => normalize_numeric(n.as_f64()?),
        Value::String(text) => {
            let had_percent = text.contains('%');
            let cleaned: String = text
                .chars()
                .filter(|c| !c.is_whitespace() && *c != '%' && *c != ',')
                .collect();
            if cleaned.is_empty() {
                return None;
            }
            let parsed: f64 = cleaned.parse().ok()?;
            if had_percent {
                Some(parsed / 100.0)
            } else {
                normalize_numeric(parsed)
            }
        }
        _ => None,
    }
}

fn normalize_numeric(value: f64) -> Option<f64> {
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    if value <= FRACTION_CUTOFF {
        Some(value)
    } else {
        Some(value / 100.0)
    }
}

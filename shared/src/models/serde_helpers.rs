//! Lenient serde helpers for form and CSV payloads
//!
//! Numbers coming from input widgets arrive as either JSON numbers or
//! strings. Blank or unparseable values are treated as absent, the same way
//! an empty input box is.

use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::str::FromStr;

/// Deserialize a string that treats blank as None
pub fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(|opt| {
        opt.map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    })
}

/// Deserialize a decimal from a number or numeric string
pub fn lenient_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => Decimal::from_str(&n.to_string())
            .ok()
            .or_else(|| n.as_f64().and_then(Decimal::from_f64)),
        Some(Value::String(s)) => parse_decimal(&s),
        _ => None,
    })
}

/// Deserialize an integer from a number or numeric string
///
/// Fractional input is truncated toward zero.
pub fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| parse_decimal(trimmed).and_then(|d| d.trunc().to_i64()))
        }
        _ => None,
    })
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    Decimal::from_str(trimmed)
        .ok()
        .or_else(|| Decimal::from_scientific(trimmed).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[derive(Debug, Deserialize)]
    struct Form {
        #[serde(default, deserialize_with = "lenient_decimal")]
        amount: Option<Decimal>,
        #[serde(default, deserialize_with = "lenient_i64")]
        count: Option<i64>,
        #[serde(default, deserialize_with = "blank_as_none")]
        code: Option<String>,
    }

    fn parse(value: serde_json::Value) -> Form {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_numbers_and_strings() {
        let form = parse(serde_json::json!({ "amount": "12.50", "count": "7", "code": " P1 " }));
        assert_eq!(form.amount, Some(dec!(12.50)));
        assert_eq!(form.count, Some(7));
        assert_eq!(form.code.as_deref(), Some("P1"));

        let form = parse(serde_json::json!({ "amount": 3, "count": 4.9 }));
        assert_eq!(form.amount, Some(dec!(3)));
        assert_eq!(form.count, Some(4));
    }

    #[test]
    fn test_blank_and_garbage_are_absent() {
        let form = parse(serde_json::json!({ "amount": "", "count": "abc", "code": "" }));
        assert_eq!(form.amount, None);
        assert_eq!(form.count, None);
        assert_eq!(form.code, None);

        let form = parse(serde_json::json!({ "amount": null }));
        assert_eq!(form.amount, None);
        assert_eq!(form.count, None);
    }

    #[test]
    fn test_fractional_string_count_truncates() {
        let form = parse(serde_json::json!({ "count": "12.9" }));
        assert_eq!(form.count, Some(12));
        let form = parse(serde_json::json!({ "count": "-3" }));
        assert_eq!(form.count, Some(-3));
    }
}

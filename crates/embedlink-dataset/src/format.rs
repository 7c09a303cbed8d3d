//! Display formatting for cell values.

use crate::axes::AxisItem;
use serde_json::Value;

/// Decimals used when no precision is given.
pub const DEFAULT_PRECISION: u32 = 2;

const GROUP_SEPARATOR: char = ' ';

/// Format a number for display.
///
/// Rounds to `precision` decimals (`None` keeps the shortest representation),
/// groups the integer digits in threes and drops an all-zero fraction.
/// Non-finite values format as an empty string.
///
/// ```
/// use embedlink_dataset::format::format_number;
///
/// assert_eq!(format_number(1234567.891, Some(2)), "1 234 567.89");
/// assert_eq!(format_number(1000.0, Some(2)), "1 000");
/// assert_eq!(format_number(f64::NAN, Some(2)), "");
/// ```
pub fn format_number(value: f64, precision: Option<u32>) -> String {
    if !value.is_finite() {
        return String::new();
    }

    let text = match precision {
        Some(digits) => format!("{:.*}", digits as usize, value),
        None => value.to_string(),
    };

    let (integer, fraction) = match text.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (text.as_str(), None),
    };
    let integer = group_digits(integer);

    match fraction {
        Some(fraction) if !fraction.bytes().all(|b| b == b'0') => format!("{integer}.{fraction}"),
        _ => integer,
    }
}

fn group_digits(integer: &str) -> String {
    let (sign, digits) = match integer.strip_prefix('-') {
        Some(digits) => ("-", digits),
        None => ("", integer),
    };

    let mut grouped = String::with_capacity(integer.len() + digits.len() / 3);
    grouped.push_str(sign);
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(GROUP_SEPARATOR);
        }
        grouped.push(digit);
    }
    grouped
}

/// Key under which a number is looked up in a unit's value map.
fn number_key(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// Display text of a cell value in `unit`.
///
/// Null is shown as `-` and strings pass through. Numbers are looked up in the
/// unit's `config.valueMap`, else formatted with `digits` decimals; the unit's
/// `value_prefix` and `value_suffix` are then attached.
pub fn make_value(value: &Value, unit: Option<&AxisItem>, digits: Option<u32>) -> String {
    let number = match value {
        Value::String(s) => return s.clone(),
        Value::Number(n) => match n.as_f64() {
            Some(number) => number,
            None => return "-".to_string(),
        },
        _ => return "-".to_string(),
    };

    let mapped = unit
        .and_then(|u| u.attribute("config"))
        .and_then(|config| config.get("valueMap"))
        .and_then(|map| map.get(number_key(number)))
        .map(|mapped| match mapped {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        });

    let mut text =
        mapped.unwrap_or_else(|| format_number(number, Some(digits.unwrap_or(DEFAULT_PRECISION))));

    if let Some(unit) = unit {
        if let Some(prefix) = unit.text_attribute("value_prefix") {
            text = format!("{prefix} {text}");
        }
        if let Some(suffix) = unit.text_attribute("value_suffix") {
            text = format!("{text} {suffix}");
        }
    }
    text
}

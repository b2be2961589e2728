//! pt-BR numeric text parsing and formatting
//!
//! Backends return metrics as display strings (`"1.234,56"`, `"R$ 10,00"`,
//! `"12,5%"`). Parsing treats `.` as the thousands separator and `,` as the
//! decimal separator; it must not be used for other locales.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::classify::PLACEHOLDER;

/// Longest numeric prefix, mirroring how browsers parse floats
static FLOAT_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?(?:\d+(?:\.\d*)?|\.\d+)").unwrap());

/// Parse a cell value into a number.
///
/// - `null` → `None`
/// - numbers are returned unchanged
/// - strings go through [`parse_locale_str`]
/// - anything else → `None`
pub fn parse_locale_number(value: &Value) -> Option<f64> {
    match value {
        Value::Null => None,
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => parse_locale_str(s),
        _ => None,
    }
}

/// Parse pt-BR formatted text.
///
/// Keeps only digits, `,`, `.` and `-`; drops every `.`; the first `,`
/// becomes the decimal point. Returns `None` unless a finite number results.
pub fn parse_locale_str(text: &str) -> Option<f64> {
    let kept: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '-'))
        .filter(|c| *c != '.')
        .collect();
    let normalized = kept.replacen(',', ".", 1);

    let prefix = FLOAT_PREFIX_RE.find(&normalized)?;
    prefix
        .as_str()
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
}

/// Currency in Brazilian reais: `R$ 1.234,56`
pub fn format_brl(value: f64) -> String {
    if !value.is_finite() {
        return PLACEHOLDER.to_string();
    }
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}R$ {}", sign, fixed_pt_br(value.abs(), 2))
}

/// Rounded integer with `.` grouping: `12.345`
pub fn format_integer(value: f64) -> String {
    if !value.is_finite() {
        return PLACEHOLDER.to_string();
    }
    let sign = if value < 0.0 && value.round() != 0.0 {
        "-"
    } else {
        ""
    };
    format!("{}{}", sign, fixed_pt_br(value.abs(), 0))
}

/// Percentage of an already-scaled value: `12.3456` with 2 decimals → `12,35%`
pub fn format_percent(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return PLACEHOLDER.to_string();
    }
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}{}%", sign, fixed_pt_br(value.abs(), decimals))
}

/// Non-negative value with fixed decimals, `.` grouping and `,` decimal mark
fn fixed_pt_br(value: f64, decimals: usize) -> String {
    let fixed = format!("{:.*}", decimals, value);
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };
    let grouped = group_thousands(int_part);
    match frac_part {
        Some(frac) => format!("{},{}", grouped, frac),
        None => grouped,
    }
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    out
}

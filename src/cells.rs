//! Per-column display preparation for grid cells.
//!
//! Pure functions over raw row values: no fetching, no renderer state.

use grid_types::{Bucket, ClassificationResult, Row};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::classify::{classify_fraction, classify_status, strip_markup, PLACEHOLDER};
use crate::numeric::{format_brl, format_integer, format_percent, parse_locale_number};

/// Decimals shown for percentage columns
const PERCENT_DECIMALS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Delivery status keyword
    Status,
    /// `"done/total"` counter
    Fraction,
    /// Amount in reais
    Currency,
    Integer,
    /// Already-scaled percentage (`12.5` → `12,50%`)
    Percent,
    Text,
}

impl ColumnKind {
    /// Guess a column kind from a backend field name.
    pub fn infer(field: &str) -> Self {
        let field = field.to_ascii_lowercase();
        if field == "status" || field.ends_with("_status") {
            ColumnKind::Status
        } else if field.ends_with("_progress") || field.ends_with("_fraction") {
            ColumnKind::Fraction
        } else if ["spend", "budget", "revenue", "cpc", "cpm", "cpa"]
            .iter()
            .any(|k| field == *k || field.ends_with(&format!("_{}", k)))
        {
            ColumnKind::Currency
        } else if field == "ctr" || field.ends_with("_rate") || field.ends_with("_pct") {
            ColumnKind::Percent
        } else if ["impressions", "clicks", "reach", "conversions", "results"]
            .iter()
            .any(|k| field == *k)
        {
            ColumnKind::Integer
        } else {
            ColumnKind::Text
        }
    }
}

/// Display text plus the bucket a renderer colours it with
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellDisplay {
    pub text: String,
    pub bucket: Bucket,
}

impl CellDisplay {
    fn neutral(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bucket: Bucket::Neutral,
        }
    }
}

impl From<ClassificationResult> for CellDisplay {
    fn from(result: ClassificationResult) -> Self {
        Self {
            text: result.label,
            bucket: result.bucket,
        }
    }
}

/// Prepare one cell for display.
///
/// Numeric columns show the placeholder when the value does not parse.
pub fn format_cell(kind: ColumnKind, value: &Value) -> CellDisplay {
    match kind {
        ColumnKind::Status => classify_status(&raw_text(value)).into(),
        ColumnKind::Fraction => classify_fraction(&raw_text(value)).into(),
        ColumnKind::Currency => numeric_cell(value, format_brl),
        ColumnKind::Integer => numeric_cell(value, format_integer),
        ColumnKind::Percent => numeric_cell(value, |v| format_percent(v, PERCENT_DECIMALS)),
        ColumnKind::Text => {
            let text = strip_markup(&raw_text(value));
            let text = text.trim();
            CellDisplay::neutral(if text.is_empty() { PLACEHOLDER } else { text })
        }
    }
}

/// Format a field of `row`, inferring its kind from the field name.
pub fn format_field(row: &Row, field: &str) -> CellDisplay {
    format_cell(
        ColumnKind::infer(field),
        row.get(field).unwrap_or(&Value::Null),
    )
}

fn numeric_cell(value: &Value, format: impl Fn(f64) -> String) -> CellDisplay {
    match parse_locale_number(value) {
        Some(n) => CellDisplay::neutral(format(n)),
        None => CellDisplay::neutral(PLACEHOLDER),
    }
}

fn raw_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

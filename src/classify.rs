//! Cell value classification into display buckets.
//!
//! Two independent rules:
//!
//! - **status**: delivery status keywords (`ACTIVE`, `PAUSED`, `ERROR`, ...)
//! - **fraction**: `"done/total"` counters, bucketed by how much is outstanding
//!
//! Both are pure functions of their input. Turning a bucket into a colored
//! element is left to the renderer (see [`Bucket::css_class`]).

use std::sync::LazyLock;

use grid_types::{Bucket, ClassificationResult};
use regex::Regex;

/// Label shown when a value is empty
pub const PLACEHOLDER: &str = "—";

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

static FRACTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+)\s*/\s*(\d+)\s*$").unwrap());

/// Ratio above which a fraction is flagged as danger
const DANGER_RATIO: f64 = 0.5;

/// Remove HTML tags and decode the handful of entities renderers emit.
pub fn strip_markup(raw: &str) -> String {
    TAG_RE
        .replace_all(raw, "")
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

fn label_or_placeholder(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        PLACEHOLDER.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Bucket for a delivery status keyword (case-insensitive).
pub fn status_bucket(status: &str) -> Bucket {
    match status.trim().to_lowercase().as_str() {
        "active" => Bucket::Success,
        "paused" => Bucket::Neutral,
        "error" | "rejected" | "off" => Bucket::Danger,
        _ => Bucket::Neutral,
    }
}

/// Classify a status cell; the label is the trimmed text.
pub fn classify_status(raw: &str) -> ClassificationResult {
    let text = strip_markup(raw);
    ClassificationResult::new(label_or_placeholder(&text), status_bucket(&text))
}

/// Classify a `"current/total"` counter.
///
/// `current == 0` is success (nothing outstanding), more than half is danger,
/// anything in between is a warning. Unparseable input or a zero total is
/// neutral and keeps its stripped text as label.
pub fn classify_fraction(raw: &str) -> ClassificationResult {
    let text = strip_markup(raw);

    let Some((current, total)) = parse_fraction(&text) else {
        return ClassificationResult::new(label_or_placeholder(&text), Bucket::Neutral);
    };

    let label = format!("{}/{}", current, total);
    let bucket = if current <= 0.0 {
        Bucket::Success
    } else if current / total > DANGER_RATIO {
        Bucket::Danger
    } else {
        Bucket::Warning
    };
    ClassificationResult::new(label, bucket)
}

/// `(current, total)` when the text is a fraction with a finite positive total
fn parse_fraction(text: &str) -> Option<(f64, f64)> {
    let caps = FRACTION_RE.captures(text)?;
    let current: f64 = caps[1].parse().ok()?;
    let total: f64 = caps[2].parse().ok()?;
    if !current.is_finite() || !total.is_finite() || total <= 0.0 {
        return None;
    }
    Some((current, total))
}

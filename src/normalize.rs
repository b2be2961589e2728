//! Response envelope normalization.
//!
//! Backends wrap row arrays inconsistently. The probes below run in order and
//! the first one that finds an array wins:
//!
//! 1. the payload itself is an array
//! 2. `rows`
//! 3. `data`
//! 4. `list`
//! 5. `result.rows`, then `result.data`
//! 6. the first array-valued property, in JS own-key order: integer-like
//!    keys ascending first, then the rest in document order
//!
//! Anything else normalizes to no rows. Normalization never fails.

use grid_types::{EnvelopeShape, NormalizedResponse, Row};
use serde_json::{Map, Value};
use tracing::debug;

/// Named keys probed in order (steps 2-4)
const TOP_LEVEL_PROBES: [(&str, EnvelopeShape); 3] = [
    ("rows", EnvelopeShape::Rows),
    ("data", EnvelopeShape::Data),
    ("list", EnvelopeShape::List),
];

/// Keys probed under `result` (step 5)
const RESULT_PROBES: [(&str, EnvelopeShape); 2] = [
    ("rows", EnvelopeShape::ResultRows),
    ("data", EnvelopeShape::ResultData),
];

/// Total-count hint keys, checked at the top level and then under `result`
const TOTAL_HINT_KEYS: [&str; 5] = ["total", "totalCount", "total_count", "rowCount", "lastRow"];

/// Extract the ordered row list from any payload.
pub fn normalize(response: &Value) -> Vec<Row> {
    locate_rows(response)
        .map(|(rows, _)| rows.iter().cloned().map(Row::new).collect())
        .unwrap_or_default()
}

/// Extract rows together with the matched envelope and any total-count hint.
///
/// When no array is found the result is empty with `shape: None`; callers
/// treat that as "no rows", not as an error.
pub fn normalize_response(response: &Value) -> NormalizedResponse {
    match locate_rows(response) {
        Some((rows, shape)) => NormalizedResponse {
            rows: rows.iter().cloned().map(Row::new).collect(),
            total_hint: total_hint(response),
            shape: Some(shape),
        },
        None => {
            debug!(
                payload_kind = value_kind(response),
                "no row array located in response, treating as empty"
            );
            NormalizedResponse::empty()
        }
    }
}

fn locate_rows(response: &Value) -> Option<(&Vec<Value>, EnvelopeShape)> {
    let object = match response {
        Value::Array(rows) => return Some((rows, EnvelopeShape::BareArray)),
        Value::Object(object) => object,
        _ => return None,
    };

    if let Some(found) = probe(object, &TOP_LEVEL_PROBES) {
        return Some(found);
    }

    if let Some(result) = object.get("result").and_then(Value::as_object) {
        if let Some(found) = probe(result, &RESULT_PROBES) {
            return Some(found);
        }
    }

    first_array_property(object)
        .map(|(key, rows)| (rows, EnvelopeShape::FirstArrayProperty(key.clone())))
}

/// First array-valued property in JS own-key order: array-index keys
/// ascending, then the remaining keys in document order.
fn first_array_property(object: &Map<String, Value>) -> Option<(&String, &Vec<Value>)> {
    let indexed = object
        .iter()
        .filter_map(|(key, value)| Some((array_index(key)?, key, value.as_array()?)))
        .min_by_key(|(index, _, _)| *index)
        .map(|(_, key, rows)| (key, rows));

    indexed.or_else(|| {
        object
            .iter()
            .filter(|(key, _)| array_index(key).is_none())
            .find_map(|(key, value)| value.as_array().map(|rows| (key, rows)))
    })
}

/// Canonical array index (`"0"`, `"17"`, not `"01"` or `"+1"`)
fn array_index(key: &str) -> Option<u32> {
    key.parse::<u32>()
        .ok()
        .filter(|index| *index != u32::MAX && index.to_string() == key)
}

fn probe<'a>(
    object: &'a Map<String, Value>,
    probes: &[(&str, EnvelopeShape)],
) -> Option<(&'a Vec<Value>, EnvelopeShape)> {
    probes.iter().find_map(|(key, shape)| {
        object
            .get(*key)
            .and_then(Value::as_array)
            .map(|rows| (rows, shape.clone()))
    })
}

fn total_hint(response: &Value) -> Option<u64> {
    let object = response.as_object()?;
    let scopes = std::iter::once(object).chain(object.get("result").and_then(Value::as_object));
    for scope in scopes {
        for key in TOTAL_HINT_KEYS {
            if let Some(total) = scope.get(key).and_then(Value::as_u64) {
                return Some(total);
            }
        }
    }
    None
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample() -> Value {
        json!([{"id": "C2", "name": "Beta"}, {"id": "C1", "name": "Alpha"}, {"id": "C3"}])
    }

    fn ids(rows: &[Row]) -> Vec<String> {
        rows.iter().filter_map(Row::id).collect()
    }

    #[test]
    fn test_all_envelopes_yield_contained_array() {
        let envelopes = vec![
            (sample(), EnvelopeShape::BareArray),
            (json!({"rows": sample()}), EnvelopeShape::Rows),
            (json!({"data": sample()}), EnvelopeShape::Data),
            (json!({"list": sample()}), EnvelopeShape::List),
            (json!({"result": {"rows": sample()}}), EnvelopeShape::ResultRows),
            (json!({"result": {"data": sample()}}), EnvelopeShape::ResultData),
            (
                json!({"ok": true, "campaigns": sample()}),
                EnvelopeShape::FirstArrayProperty("campaigns".into()),
            ),
        ];

        for (payload, expected_shape) in envelopes {
            let normalized = normalize_response(&payload);
            assert_eq!(ids(&normalized.rows), vec!["C2", "C1", "C3"]);
            assert_eq!(normalized.shape, Some(expected_shape));
            assert_eq!(normalize(&payload), normalized.rows);
        }
    }

    #[test]
    fn test_empty_inputs() {
        assert!(normalize(&Value::Null).is_empty());
        assert!(normalize(&json!({})).is_empty());
        assert!(normalize(&json!(false)).is_empty());
        assert!(normalize(&json!("rows")).is_empty());
        assert!(normalize(&json!({"rows": "not-an-array", "count": 3})).is_empty());

        let unlocated = normalize_response(&json!({"message": "ok"}));
        assert!(unlocated.is_unlocated());
        assert_eq!(unlocated.total_hint, None);
    }

    #[test]
    fn test_probe_priority() {
        let payload = json!({
            "list": [{"id": "from-list"}],
            "data": [{"id": "from-data"}],
            "rows": [{"id": "from-rows"}]
        });
        assert_eq!(ids(&normalize(&payload)), vec!["from-rows"]);

        let payload = json!({"result": {"data": [{"id": "d"}], "rows": [{"id": "r"}]}});
        assert_eq!(ids(&normalize(&payload)), vec!["r"]);

        // named probes beat an earlier arbitrary array
        let payload = json!({"errors": [], "data": [{"id": "d"}]});
        assert_eq!(ids(&normalize(&payload)), vec!["d"]);
    }

    #[test]
    fn test_fallback_uses_document_order() {
        let payload: Value =
            serde_json::from_str(r#"{"zeta": [{"id": "z"}], "alpha": [{"id": "a"}]}"#).unwrap();
        assert_eq!(ids(&normalize(&payload)), vec!["z"]);
    }

    #[test]
    fn test_fallback_visits_integer_keys_first() {
        let payload: Value = serde_json::from_str(
            r#"{"b": [{"id": "b"}], "10": [{"id": "ten"}], "2": [{"id": "two"}]}"#,
        )
        .unwrap();
        let normalized = normalize_response(&payload);
        assert_eq!(ids(&normalized.rows), vec!["two"]);
        assert_eq!(
            normalized.shape,
            Some(EnvelopeShape::FirstArrayProperty("2".into()))
        );

        // non-canonical numbers are ordinary keys
        let payload: Value =
            serde_json::from_str(r#"{"b": [{"id": "b"}], "01": [{"id": "zero-one"}]}"#).unwrap();
        assert_eq!(ids(&normalize(&payload)), vec!["b"]);

        // integer keys without arrays do not shadow later string keys
        let payload: Value =
            serde_json::from_str(r#"{"0": "x", "b": [{"id": "b"}]}"#).unwrap();
        assert_eq!(ids(&normalize(&payload)), vec!["b"]);
    }

    #[test]
    fn test_rows_pass_through_untouched() {
        let payload = json!({"data": [{"id": 1, "spend": "1.234,56", "nested": {"x": [1]}}, 5]});
        let rows = normalize(&payload);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("nested"), Some(&json!({"x": [1]})));
        assert_eq!(rows[1].as_value(), &json!(5));
    }

    #[test]
    fn test_total_hint() {
        let top = normalize_response(&json!({"rows": [], "total": 1200}));
        assert_eq!(top.total_hint, Some(1200));

        let nested = normalize_response(&json!({"result": {"data": [], "rowCount": 7}}));
        assert_eq!(nested.total_hint, Some(7));

        let negative = normalize_response(&json!({"rows": [], "total": -1}));
        assert_eq!(negative.total_hint, None);

        let bare = normalize_response(&json!([1, 2]));
        assert_eq!(bare.total_hint, None);
    }
}

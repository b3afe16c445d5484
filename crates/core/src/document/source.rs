use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Zone-less timestamp layout the CMS uses for `datetime` fields.
const NAIVE_TIMESTAMP: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// A `blog_posts` item as carried by a lifecycle event payload.
///
/// Create payloads carry the whole item; update payloads only the fields
/// that changed. Accessors therefore all return `Option`, and distinguish
/// a field that is *present* (non-null) from one that is *set* (present
/// and not an empty string).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourcePost {
    fields: Map<String, Value>,
}

impl SourcePost {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Whether the payload carries `field` with a non-null value.
    pub fn contains(&self, field: &str) -> bool {
        self.json(field).is_some()
    }

    /// Raw non-null value of `field`.
    pub fn json(&self, field: &str) -> Option<&Value> {
        self.fields.get(field).filter(|v| !v.is_null())
    }

    /// Non-empty text of `field`. Numbers are rendered as text, anything
    /// else counts as unset.
    pub fn text(&self, field: &str) -> Option<String> {
        match self.json(field)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Text of a field that is present, with `""` for present-but-unset
    /// values. `None` only when the payload does not mention the field.
    pub fn present_text(&self, field: &str) -> Option<String> {
        self.contains(field)
            .then(|| self.text(field).unwrap_or_default())
    }

    /// Integer value of `field`. Numeric strings are accepted; fractional
    /// numbers are truncated.
    pub fn count(&self, field: &str) -> Option<i64> {
        match self.json(field)? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Timestamp value of `field`, as RFC 3339 or the CMS's zone-less form
    /// (read as UTC).
    pub fn timestamp(&self, field: &str) -> Option<DateTime<Utc>> {
        let raw = match self.json(field)? {
            Value::String(s) => s.trim(),
            _ => return None,
        };
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, NAIVE_TIMESTAMP)
            .ok()
            .map(|naive| naive.and_utc())
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl From<Map<String, Value>> for SourcePost {
    fn from(fields: Map<String, Value>) -> Self {
        Self::new(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn post(value: Value) -> SourcePost {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn empty_strings_are_present_but_unset() {
        let p = post(json!({"title": "", "slug": null}));
        assert!(p.contains("title"));
        assert_eq!(p.text("title"), None);
        assert_eq!(p.present_text("title"), Some(String::new()));
        assert!(!p.contains("slug"));
        assert_eq!(p.present_text("slug"), None);
    }

    #[test]
    fn counts_accept_numbers_and_numeric_strings() {
        let p = post(json!({"a": 12, "b": "7", "c": 3.9, "d": "many", "e": true}));
        assert_eq!(p.count("a"), Some(12));
        assert_eq!(p.count("b"), Some(7));
        assert_eq!(p.count("c"), Some(3));
        assert_eq!(p.count("d"), None);
        assert_eq!(p.count("e"), None);
        assert_eq!(p.count("missing"), None);
    }

    #[test]
    fn timestamps_accept_rfc3339_and_naive_forms() {
        let p = post(json!({
            "a": "2025-03-01T10:30:00Z",
            "b": "2025-03-01T12:30:00+02:00",
            "c": "2025-03-01T10:30:00",
            "d": "yesterday",
        }));
        let expected = Utc.with_ymd_and_hms(2025, 3, 1, 10, 30, 0).unwrap();
        assert_eq!(p.timestamp("a"), Some(expected));
        assert_eq!(p.timestamp("b"), Some(expected));
        assert_eq!(p.timestamp("c"), Some(expected));
        assert_eq!(p.timestamp("d"), None);
    }

    #[test]
    fn non_object_payload_is_rejected() {
        assert!(serde_json::from_value::<SourcePost>(json!(["title"])).is_err());
    }
}

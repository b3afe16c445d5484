use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// Primary key of a source item.
///
/// The CMS keys `blog_posts` either by auto-increment integer or by UUID
/// string, depending on how the collection was created. The key keeps its
/// native type so the mirror's `directusId` matches what is already stored:
/// - `42` → `Int(42)`, written as a number
/// - `"3f1c..."` → `Text("3f1c...")`, written as a string
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "Value")]
pub enum ItemKey {
    Int(i64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ItemKeyError {
    #[error("item key cannot be empty")]
    Empty,
    #[error("item key must be a string or an integer, got {0}")]
    Unsupported(String),
}

impl ItemKey {
    /// Parse a textual key. Surrounding whitespace is not significant.
    /// Digits stay text; only JSON numbers become integer keys.
    pub fn parse(raw: &str) -> Result<Self, ItemKeyError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ItemKeyError::Empty);
        }
        Ok(Self::Text(trimmed.to_string()))
    }

    pub fn is_int(&self) -> bool {
        matches!(self, Self::Int(_))
    }
}

impl From<i64> for ItemKey {
    fn from(id: i64) -> Self {
        Self::Int(id)
    }
}

impl TryFrom<Value> for ItemKey {
    type Error = ItemKeyError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(s) => Self::parse(&s),
            Value::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .ok_or_else(|| ItemKeyError::Unsupported(n.to_string())),
            other => Err(ItemKeyError::Unsupported(other.to_string())),
        }
    }
}

impl Serialize for ItemKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Int(id) => serializer.serialize_i64(*id),
            Self::Text(id) => serializer.serialize_str(id),
        }
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(id) => write!(f, "{id}"),
            Self::Text(id) => f.write_str(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_uuid_key() {
        let key: ItemKey =
            serde_json::from_value(json!("3f1c0a52-9d1e-4f7a-b0c3-1a2b3c4d5e6f")).unwrap();
        assert_eq!(
            key,
            ItemKey::Text("3f1c0a52-9d1e-4f7a-b0c3-1a2b3c4d5e6f".into())
        );
        assert!(!key.is_int());
    }

    #[test]
    fn parse_integer_key() {
        let key: ItemKey = serde_json::from_value(json!(42)).unwrap();
        assert_eq!(key, ItemKey::Int(42));
        assert!(key.is_int());
        assert_eq!(key.to_string(), "42");
    }

    #[test]
    fn numeric_text_stays_text() {
        let key: ItemKey = serde_json::from_value(json!("42")).unwrap();
        assert_eq!(key, ItemKey::Text("42".into()));
        assert_ne!(key, ItemKey::from(42));
    }

    #[test]
    fn reject_empty_and_non_scalar_keys() {
        assert_eq!(ItemKey::parse("  "), Err(ItemKeyError::Empty));
        assert!(serde_json::from_value::<ItemKey>(json!(1.5)).is_err());
        assert!(serde_json::from_value::<ItemKey>(json!(u64::MAX)).is_err());
        assert!(serde_json::from_value::<ItemKey>(json!({"id": 1})).is_err());
        assert!(serde_json::from_value::<ItemKey>(json!(null)).is_err());
    }

    #[test]
    fn serializes_in_native_type() {
        assert_eq!(serde_json::to_value(ItemKey::parse("abc").unwrap()).unwrap(), json!("abc"));
        assert_eq!(serde_json::to_value(ItemKey::from(42)).unwrap(), json!(42));
    }
}

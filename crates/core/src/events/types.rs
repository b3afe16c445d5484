use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::document::{ItemKey, SourcePost};

/// Lifecycle notification for one source collection, as delivered by the
/// CMS and stamped on receipt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleEvent {
    pub id: Uuid,
    pub received_at: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: LifecycleKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum LifecycleKind {
    #[serde(rename = "items.create")]
    Create(CreateEvent),
    #[serde(rename = "items.update")]
    Update(UpdateEvent),
    #[serde(rename = "items.delete")]
    Delete(DeleteEvent),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEvent {
    #[serde(default)]
    pub payload: SourcePost,
    pub key: ItemKey,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateEvent {
    #[serde(default)]
    pub payload: SourcePost,
    pub keys: Vec<ItemKey>,
}

/// The CMS sends deletes either as `{"keys": [...]}` or as a bare array.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "DeleteBody")]
pub struct DeleteEvent {
    pub keys: Vec<ItemKey>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DeleteBody {
    Keys { keys: Vec<ItemKey> },
    Bare(Vec<ItemKey>),
}

impl From<DeleteBody> for DeleteEvent {
    fn from(body: DeleteBody) -> Self {
        match body {
            DeleteBody::Keys { keys } | DeleteBody::Bare(keys) => DeleteEvent { keys },
        }
    }
}

#[derive(Debug, Error)]
pub enum EventParseError {
    #[error("unknown lifecycle event: {0}")]
    UnknownEvent(String),
    #[error("invalid {event} body: {source}")]
    InvalidBody {
        event: &'static str,
        source: serde_json::Error,
    },
}

impl LifecycleKind {
    /// Build an event from its name (`items.create`, `items.update`,
    /// `items.delete`) and raw JSON body.
    pub fn parse(event: &str, body: Value) -> Result<Self, EventParseError> {
        fn body_of<T: serde::de::DeserializeOwned>(
            event: &'static str,
            body: Value,
        ) -> Result<T, EventParseError> {
            serde_json::from_value(body).map_err(|source| EventParseError::InvalidBody { event, source })
        }

        match event {
            "items.create" => body_of("items.create", body).map(LifecycleKind::Create),
            "items.update" => body_of("items.update", body).map(LifecycleKind::Update),
            "items.delete" => body_of("items.delete", body).map(LifecycleKind::Delete),
            other => Err(EventParseError::UnknownEvent(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LifecycleKind::Create(_) => "items.create",
            LifecycleKind::Update(_) => "items.update",
            LifecycleKind::Delete(_) => "items.delete",
        }
    }

    /// Number of items the event affects.
    pub fn item_count(&self) -> usize {
        match self {
            LifecycleKind::Create(_) => 1,
            LifecycleKind::Update(e) => e.keys.len(),
            LifecycleKind::Delete(e) => e.keys.len(),
        }
    }
}

impl LifecycleEvent {
    pub fn new(kind: LifecycleKind) -> Self {
        Self {
            id: Uuid::now_v7(),
            received_at: Utc::now(),
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_create_event() {
        let kind = LifecycleKind::parse(
            "items.create",
            json!({"payload": {"title": "T", "slug": "t-1", "system": "rca"}, "key": "abc"}),
        )
        .unwrap();
        let LifecycleKind::Create(create) = kind else {
            panic!("expected create");
        };
        assert_eq!(create.key, ItemKey::Text("abc".into()));
        assert_eq!(create.payload.text("slug").as_deref(), Some("t-1"));
    }

    #[test]
    fn parse_update_event_with_integer_keys() {
        let kind =
            LifecycleKind::parse("items.update", json!({"payload": {"excerpt": "new"}, "keys": [1, "2"]}))
                .unwrap();
        assert_eq!(kind.name(), "items.update");
        assert_eq!(kind.item_count(), 2);
    }

    #[test]
    fn parse_delete_event_in_both_shapes() {
        let wrapped = LifecycleKind::parse("items.delete", json!({"keys": ["abc"]})).unwrap();
        let bare = LifecycleKind::parse("items.delete", json!(["abc", "def"])).unwrap();
        assert_eq!(wrapped.item_count(), 1);
        assert_eq!(bare.item_count(), 2);
    }

    #[test]
    fn reject_unknown_event_and_bad_bodies() {
        assert!(matches!(
            LifecycleKind::parse("items.sort", json!({})),
            Err(EventParseError::UnknownEvent(_))
        ));
        assert!(matches!(
            LifecycleKind::parse("items.create", json!({"payload": {}})),
            Err(EventParseError::InvalidBody { event: "items.create", .. })
        ));
        assert!(matches!(
            LifecycleKind::parse("items.update", json!({"payload": "x", "keys": ["a"]})),
            Err(EventParseError::InvalidBody { .. })
        ));
    }

    #[test]
    fn event_serializes_with_tag() {
        let event = LifecycleEvent::new(LifecycleKind::Delete(DeleteEvent {
            keys: vec![ItemKey::parse("abc").unwrap()],
        }));
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], json!("items.delete"));
        assert_eq!(value["keys"], json!(["abc"]));
        assert!(value["receivedAt"].is_string());
    }
}

//! Mirror store: the secondary collection that holds one denormalized copy
//! of every source item, keyed by `directusId`.

pub mod memory;
pub mod mongo;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::document::{ItemKey, MirrorDocument, MirrorPatch};

pub use memory::InMemoryMirrorStore;
pub use mongo::{MongoMirrorStore, MongoSettings};

#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached. Nothing was written.
    #[error("mirror store unreachable: {0}")]
    Connection(String),

    #[error("{operation} failed for directusId={directus_id}: {message}")]
    Operation {
        operation: &'static str,
        directus_id: String,
        message: String,
    },
}

impl StoreError {
    pub fn operation(operation: &'static str, directus_id: &ItemKey, err: impl ToString) -> Self {
        StoreError::Operation {
            operation,
            directus_id: directus_id.to_string(),
            message: err.to_string(),
        }
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, StoreError::Connection(_))
    }
}

/// Result of applying a changed-fields patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOutcome {
    Applied,
    /// No mirror document has this `directusId`; nothing was created.
    Missing,
}

/// The fields the publish webhook needs, read back from the mirror.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PublishedPost {
    pub title: String,
    pub slug: String,
    pub system: String,
    pub excerpt: String,
    pub featured_image_url: String,
    pub tags: Vec<Value>,
}

impl From<&MirrorDocument> for PublishedPost {
    fn from(doc: &MirrorDocument) -> Self {
        Self {
            title: doc.title.clone(),
            slug: doc.slug.clone(),
            system: doc.system.clone(),
            excerpt: doc.excerpt.clone(),
            featured_image_url: doc.featured_image_url.clone(),
            tags: doc.tags.clone(),
        }
    }
}

#[async_trait]
pub trait MirrorStore: Send + Sync {
    /// Write the mirror of a newly created item, replacing any document that
    /// already carries the same `directusId`.
    async fn upsert_on_create(
        &self,
        directus_id: &ItemKey,
        document: &MirrorDocument,
    ) -> Result<(), StoreError>;

    /// Merge the set fields of `patch` into the existing mirror document.
    /// Never creates a document.
    async fn apply_changed_fields(
        &self,
        directus_id: &ItemKey,
        patch: &MirrorPatch,
    ) -> Result<PatchOutcome, StoreError>;

    /// Delete the mirror document. Returns whether one existed.
    async fn remove(&self, directus_id: &ItemKey) -> Result<bool, StoreError>;

    async fn find_published(&self, directus_id: &ItemKey)
        -> Result<Option<PublishedPost>, StoreError>;

    /// Check that the store is reachable.
    async fn ping(&self) -> Result<(), StoreError>;
}

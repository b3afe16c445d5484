use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{MirrorStore, PatchOutcome, PublishedPost, StoreError};
use crate::document::{ItemKey, MirrorDocument, MirrorPatch};

/// Process-local mirror store backed by a map. Same semantics as the
/// MongoDB store; contents are lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryMirrorStore {
    documents: RwLock<HashMap<ItemKey, MirrorDocument>>,
}

impl InMemoryMirrorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, directus_id: &ItemKey) -> Option<MirrorDocument> {
        self.documents.read().await.get(directus_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

#[async_trait]
impl MirrorStore for InMemoryMirrorStore {
    async fn upsert_on_create(
        &self,
        directus_id: &ItemKey,
        document: &MirrorDocument,
    ) -> Result<(), StoreError> {
        self.documents
            .write()
            .await
            .insert(directus_id.clone(), document.clone());
        Ok(())
    }

    async fn apply_changed_fields(
        &self,
        directus_id: &ItemKey,
        patch: &MirrorPatch,
    ) -> Result<PatchOutcome, StoreError> {
        let mut documents = self.documents.write().await;
        match documents.get_mut(directus_id) {
            Some(doc) => {
                doc.apply(patch);
                Ok(PatchOutcome::Applied)
            }
            None => Ok(PatchOutcome::Missing),
        }
    }

    async fn remove(&self, directus_id: &ItemKey) -> Result<bool, StoreError> {
        Ok(self
            .documents
            .write()
            .await
            .remove(directus_id)
            .is_some())
    }

    async fn find_published(
        &self,
        directus_id: &ItemKey,
    ) -> Result<Option<PublishedPost>, StoreError> {
        Ok(self
            .documents
            .read()
            .await
            .get(directus_id)
            .map(PublishedPost::from))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::document::ItemKey;
use crate::events::types::{CreateEvent, DeleteEvent, LifecycleEvent, LifecycleKind, UpdateEvent};
use crate::mapping::PostMapper;
use crate::mirror::{MirrorStore, PatchOutcome, StoreError};
use crate::notify::PublishNotifier;

/// Status value that triggers the publish webhook.
pub const PUBLISHED_STATUS: &str = "published";

/// What one lifecycle event did to the mirror. Only used for logging; the
/// CMS never sees it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Documents written, patched or deleted.
    pub applied: usize,
    /// Updates or deletes whose mirror document did not exist.
    pub missing: usize,
    /// Per-item store or webhook failures.
    pub failed: usize,
    pub notified: usize,
    /// The store was unreachable and the rest of the event was dropped.
    pub aborted: bool,
}

/// Applies lifecycle events to the mirror store and fires the publish
/// webhook. Every failure is logged and absorbed here.
pub struct SyncService {
    store: Arc<dyn MirrorStore>,
    mapper: PostMapper,
    notifier: PublishNotifier,
}

impl SyncService {
    pub fn new(store: Arc<dyn MirrorStore>, mapper: PostMapper, notifier: PublishNotifier) -> Self {
        Self {
            store,
            mapper,
            notifier,
        }
    }

    pub async fn handle(&self, event: &LifecycleEvent) -> SyncReport {
        let report = match &event.kind {
            LifecycleKind::Create(create) => self.on_create(event.id, create).await,
            LifecycleKind::Update(update) => self.on_update(event.id, update).await,
            LifecycleKind::Delete(delete) => self.on_delete(event.id, delete).await,
        };

        tracing::debug!(
            event_id = %event.id,
            event = event.kind.name(),
            applied = report.applied,
            missing = report.missing,
            failed = report.failed,
            notified = report.notified,
            aborted = report.aborted,
            "lifecycle event handled"
        );
        report
    }

    async fn on_create(&self, event_id: Uuid, create: &CreateEvent) -> SyncReport {
        let mut report = SyncReport::default();
        let document = self.mapper.map_post(&create.key, &create.payload, Utc::now());

        match self.store.upsert_on_create(&create.key, &document).await {
            Ok(()) => {
                report.applied += 1;
                tracing::info!(
                    event_id = %event_id,
                    directus_id = %create.key,
                    slug = %document.slug,
                    "mirror document created"
                );
            }
            Err(err) => record_failure(&mut report, event_id, &create.key, &err),
        }
        report
    }

    async fn on_update(&self, event_id: Uuid, update: &UpdateEvent) -> SyncReport {
        let mut report = SyncReport::default();
        let patch = self.mapper.map_changes(&update.payload, Utc::now());

        for key in &update.keys {
            match self.store.apply_changed_fields(key, &patch).await {
                Ok(PatchOutcome::Applied) => {
                    report.applied += 1;
                    tracing::info!(event_id = %event_id, directus_id = %key, "mirror document updated");
                }
                Ok(PatchOutcome::Missing) => {
                    report.missing += 1;
                    tracing::debug!(
                        event_id = %event_id,
                        directus_id = %key,
                        "no mirror document to update"
                    );
                }
                Err(err) => {
                    record_failure(&mut report, event_id, key, &err);
                    if report.aborted {
                        return report;
                    }
                }
            }
        }

        // Fires on every save that carries the published status, not only
        // on the draft → published transition.
        if update.payload.text("status").as_deref() == Some(PUBLISHED_STATUS) {
            self.notify_published(event_id, &update.keys, &mut report).await;
        }
        report
    }

    async fn on_delete(&self, event_id: Uuid, delete: &DeleteEvent) -> SyncReport {
        let mut report = SyncReport::default();

        for key in &delete.keys {
            match self.store.remove(key).await {
                Ok(true) => {
                    report.applied += 1;
                    tracing::info!(event_id = %event_id, directus_id = %key, "mirror document deleted");
                }
                Ok(false) => {
                    report.missing += 1;
                    tracing::debug!(event_id = %event_id, directus_id = %key, "no mirror document to delete");
                }
                Err(err) => {
                    record_failure(&mut report, event_id, key, &err);
                    if report.aborted {
                        return report;
                    }
                }
            }
        }
        report
    }

    async fn notify_published(&self, event_id: Uuid, keys: &[ItemKey], report: &mut SyncReport) {
        if !self.notifier.is_enabled() {
            return;
        }

        for key in keys {
            let post = match self.store.find_published(key).await {
                Ok(Some(post)) => post,
                Ok(None) => {
                    tracing::warn!(
                        event_id = %event_id,
                        directus_id = %key,
                        "published post has no mirror document; webhook skipped"
                    );
                    continue;
                }
                Err(err) => {
                    record_failure(report, event_id, key, &err);
                    if report.aborted {
                        return;
                    }
                    continue;
                }
            };

            match self.notifier.notify(&post).await {
                Ok(true) => report.notified += 1,
                Ok(false) => {}
                Err(err) => {
                    report.failed += 1;
                    tracing::error!(
                        event_id = %event_id,
                        directus_id = %key,
                        slug = %post.slug,
                        error = %err,
                        "publish webhook failed"
                    );
                }
            }
        }
    }
}

fn record_failure(report: &mut SyncReport, event_id: Uuid, key: &ItemKey, err: &StoreError) {
    report.failed += 1;
    if err.is_connection() {
        report.aborted = true;
    }
    tracing::error!(
        event_id = %event_id,
        directus_id = %key,
        error = %err,
        "mirror sync failed"
    );
}

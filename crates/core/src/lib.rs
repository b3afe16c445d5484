//! Mirrors `blog_posts` items from the CMS into a secondary document store
//! and announces freshly published posts to an outbound webhook.
//!
//! The pipeline is linear: a [`events::types::LifecycleEvent`] is mapped by
//! [`mapping::PostMapper`], written through a [`mirror::MirrorStore`], and on
//! publication read back and handed to [`notify::PublishNotifier`].
//! [`sync::SyncService`] owns that chain.

pub mod document;
pub mod events;
pub mod mapping;
pub mod mirror;
pub mod notify;
pub mod sync;

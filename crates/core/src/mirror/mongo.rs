use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::bson::{self, doc, Bson, Document};
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection, Database};
use serde::Serialize;
use tokio::sync::OnceCell;

use super::{MirrorStore, PatchOutcome, PublishedPost, StoreError};
use crate::document::{ItemKey, MirrorDocument, MirrorPatch};

const ID_FIELD: &str = "directusId";

/// Sub-objects whose patches are written key by key with dotted `$set` paths.
const NESTED_PATCHES: [&str; 4] = ["author", "seo", "social", "stats"];

/// Connection parameters for the MongoDB mirror.
#[derive(Debug, Clone)]
pub struct MongoSettings {
    pub uri: String,
    pub database: String,
    pub collection: String,
    /// Applied to both the TCP connect and server selection.
    pub connect_timeout: Duration,
}

struct Connection {
    database: Database,
    collection: Collection<Document>,
}

/// MongoDB-backed mirror store.
///
/// Construction does no I/O. The first operation connects and verifies the
/// deployment with a `ping`; the connection is then kept for the life of the
/// store. A failed attempt is reported as [`StoreError::Connection`] and
/// retried by the next operation.
pub struct MongoMirrorStore {
    settings: MongoSettings,
    connection: OnceCell<Connection>,
}

impl MongoMirrorStore {
    pub fn new(settings: MongoSettings) -> Self {
        Self {
            settings,
            connection: OnceCell::new(),
        }
    }

    async fn connection(&self) -> Result<&Connection, StoreError> {
        self.connection
            .get_or_try_init(|| connect(&self.settings))
            .await
    }

    async fn collection(&self) -> Result<&Collection<Document>, StoreError> {
        Ok(&self.connection().await?.collection)
    }
}

async fn connect(settings: &MongoSettings) -> Result<Connection, StoreError> {
    let mut options = ClientOptions::parse(&settings.uri)
        .await
        .map_err(|e| StoreError::Connection(e.to_string()))?;
    options.connect_timeout = Some(settings.connect_timeout);
    options.server_selection_timeout = Some(settings.connect_timeout);

    let client = Client::with_options(options).map_err(|e| StoreError::Connection(e.to_string()))?;
    let database = client.database(&settings.database);
    database
        .run_command(doc! { "ping": 1 })
        .await
        .map_err(|e| StoreError::Connection(e.to_string()))?;

    tracing::info!(
        database = %settings.database,
        collection = %settings.collection,
        "connected to MongoDB"
    );

    let collection = database.collection::<Document>(&settings.collection);
    Ok(Connection {
        database,
        collection,
    })
}

#[async_trait]
impl MirrorStore for MongoMirrorStore {
    async fn upsert_on_create(
        &self,
        directus_id: &ItemKey,
        document: &MirrorDocument,
    ) -> Result<(), StoreError> {
        const OP: &str = "upsert_on_create";
        let replacement = document_fields(document, directus_id, OP)?;
        self.collection()
            .await?
            .replace_one(by_id(directus_id), replacement)
            .upsert(true)
            .await
            .map_err(|e| StoreError::operation(OP, directus_id, e))?;
        Ok(())
    }

    async fn apply_changed_fields(
        &self,
        directus_id: &ItemKey,
        patch: &MirrorPatch,
    ) -> Result<PatchOutcome, StoreError> {
        const OP: &str = "apply_changed_fields";
        let fields = patch_fields(patch, directus_id, OP)?;
        let result = self
            .collection()
            .await?
            .update_one(by_id(directus_id), doc! { "$set": fields })
            .upsert(false)
            .await
            .map_err(|e| StoreError::operation(OP, directus_id, e))?;

        Ok(if result.matched_count == 0 {
            PatchOutcome::Missing
        } else {
            PatchOutcome::Applied
        })
    }

    async fn remove(&self, directus_id: &ItemKey) -> Result<bool, StoreError> {
        let result = self
            .collection()
            .await?
            .delete_one(by_id(directus_id))
            .await
            .map_err(|e| StoreError::operation("remove", directus_id, e))?;
        Ok(result.deleted_count > 0)
    }

    async fn find_published(
        &self,
        directus_id: &ItemKey,
    ) -> Result<Option<PublishedPost>, StoreError> {
        const OP: &str = "find_published";
        let found = self
            .collection()
            .await?
            .find_one(by_id(directus_id))
            .projection(doc! {
                "title": 1,
                "slug": 1,
                "system": 1,
                "excerpt": 1,
                "featuredImageUrl": 1,
                "tags": 1,
            })
            .await
            .map_err(|e| StoreError::operation(OP, directus_id, e))?;

        found
            .map(|raw| bson::from_document(raw).map_err(|e| StoreError::operation(OP, directus_id, e)))
            .transpose()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.connection()
            .await?
            .database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(())
    }
}

/// Filter on `directusId` in the key's native BSON type. Integer keys are
/// written as Int64; MongoDB equality matches them against Int32 and Double
/// values written by other clients.
fn by_id(directus_id: &ItemKey) -> Document {
    let id = match directus_id {
        ItemKey::Int(id) => Bson::Int64(*id),
        ItemKey::Text(id) => Bson::String(id.clone()),
    };
    doc! { ID_FIELD: id }
}

fn to_bson<T: Serialize>(
    value: &T,
    directus_id: &ItemKey,
    operation: &'static str,
) -> Result<Document, StoreError> {
    bson::to_document(value).map_err(|e| StoreError::operation(operation, directus_id, e))
}

fn date(at: DateTime<Utc>) -> Bson {
    Bson::DateTime(bson::DateTime::from_millis(at.timestamp_millis()))
}

/// Full BSON form of a mirror document, with timestamps as BSON dates.
fn document_fields(
    document: &MirrorDocument,
    directus_id: &ItemKey,
    operation: &'static str,
) -> Result<Document, StoreError> {
    let mut fields = to_bson(document, directus_id, operation)?;
    fields.insert("publishedAt", date(document.published_at));
    fields.insert("createdAt", date(document.created_at));
    fields.insert("updatedAt", date(document.updated_at));
    Ok(fields)
}

/// `$set` body for a patch: only set fields, nested sub-patches flattened
/// to dotted paths so sibling keys survive.
fn patch_fields(
    patch: &MirrorPatch,
    directus_id: &ItemKey,
    operation: &'static str,
) -> Result<Document, StoreError> {
    let mut fields = to_bson(patch, directus_id, operation)?;
    for parent in NESTED_PATCHES {
        if let Some(Bson::Document(children)) = fields.remove(parent) {
            for (key, value) in children {
                fields.insert(format!("{parent}.{key}"), value);
            }
        }
    }
    if let Some(published_at) = patch.published_at {
        fields.insert("publishedAt", date(published_at));
    }
    fields.insert("updatedAt", date(patch.updated_at));
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::model::tests::stored_document;
    use crate::document::Category;
    use chrono::TimeZone;
    use serde_json::json;

    fn key() -> ItemKey {
        ItemKey::parse("abc").unwrap()
    }

    #[test]
    fn document_timestamps_are_bson_dates() {
        let doc = stored_document();
        let fields = document_fields(&doc, &key(), "test").unwrap();

        assert_eq!(fields.get_str(ID_FIELD).unwrap(), "abc");
        assert_eq!(
            fields.get_datetime("createdAt").unwrap().timestamp_millis(),
            doc.created_at.timestamp_millis()
        );
        assert!(matches!(fields.get("updatedAt"), Some(Bson::DateTime(_))));
        assert_eq!(fields.get_document("category").unwrap().get_str("slug").unwrap(), "rca");
    }

    #[test]
    fn integer_key_is_stored_and_filtered_as_a_number() {
        let key = ItemKey::from(42);
        let mut doc = stored_document();
        doc.directus_id = key.clone();

        let fields = document_fields(&doc, &key, "test").unwrap();
        assert_eq!(fields.get(ID_FIELD), Some(&Bson::Int64(42)));
        assert_eq!(by_id(&key), doc! { ID_FIELD: 42_i64 });
    }

    #[test]
    fn text_key_is_filtered_as_a_string() {
        assert_eq!(by_id(&key()), doc! { ID_FIELD: "abc" });
        assert_eq!(
            by_id(&ItemKey::parse("42").unwrap()),
            doc! { ID_FIELD: "42" }
        );
    }

    #[test]
    fn patch_flattens_nested_sub_objects() {
        let at = Utc.with_ymd_and_hms(2025, 2, 1, 9, 0, 0).unwrap();
        let mut patch = MirrorPatch::touch(at);
        patch.excerpt = Some("new".into());
        patch.stats.views = Some(7);
        patch.seo.meta_description = Some("new".into());
        patch.social.posted = Some(json!({"facebook": true}));
        patch.category = Some(Category::new("RCA", "rca"));

        let fields = patch_fields(&patch, &key(), "test").unwrap();

        let mut keys: Vec<&str> = fields.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec![
                "category",
                "excerpt",
                "seo.metaDescription",
                "social.posted",
                "stats.views",
                "updatedAt",
            ]
        );
        assert_eq!(fields.get_i64("stats.views").unwrap(), 7);
        assert!(fields
            .get_document("social.posted")
            .unwrap()
            .get_bool("facebook")
            .unwrap());
        assert!(matches!(fields.get("updatedAt"), Some(Bson::DateTime(_))));
    }

    #[test]
    fn touch_patch_only_sets_updated_at() {
        let fields = patch_fields(&MirrorPatch::touch(Utc::now()), &key(), "test").unwrap();
        assert_eq!(fields.len(), 1);
        assert!(fields.contains_key("updatedAt"));
    }

    #[test]
    fn published_post_reads_projected_fields() {
        let projected = doc! {
            "_id": bson::oid::ObjectId::new(),
            "title": "T",
            "slug": "t-1",
            "system": "rca",
            "featuredImageUrl": "https://cdn/x.jpg",
            "tags": [],
        };
        let post: PublishedPost = bson::from_document(projected).unwrap();
        assert_eq!(post.slug, "t-1");
        assert_eq!(post.excerpt, "");
        assert_eq!(post.featured_image_url, "https://cdn/x.jpg");
    }

    #[tokio::test]
    async fn unreachable_deployment_is_a_connection_error() {
        let store = MongoMirrorStore::new(MongoSettings {
            uri: "not-a-mongodb-uri".into(),
            database: "wib_test".into(),
            collection: "blog_posts".into(),
            connect_timeout: Duration::from_millis(50),
        });
        let err = store.remove(&key()).await.unwrap_err();
        assert!(err.is_connection());
    }
}

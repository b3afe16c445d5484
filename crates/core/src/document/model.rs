use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::category::Category;
use super::id::ItemKey;

/// Denormalized copy of a `blog_posts` item, as stored in the mirror
/// collection. `directus_id` is the only correlation key back to the CMS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MirrorDocument {
    pub title: String,
    pub slug: String,
    pub system: String,
    pub status: String,
    pub content_html: String,
    pub excerpt: String,
    pub intro_text: String,
    pub conclusion: String,
    pub toc_items: Value,
    pub content_sections: Value,
    pub featured_image_url: String,
    pub featured_image_alt: String,
    pub author_display_name: String,
    pub author: Author,
    pub category: Category,
    /// Never resolved during mapping; always written empty.
    pub tags: Vec<Value>,
    pub reading_time: u32,
    pub seo: Seo,
    pub social: Social,
    pub stats: Stats,
    pub comments_enabled: bool,
    pub directus_id: ItemKey,
    pub version: i64,
    pub published_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub id: Option<String>,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seo {
    pub meta_title: String,
    pub meta_description: String,
    pub keywords: Value,
    pub canonical_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Social {
    pub og_title: String,
    pub og_description: String,
    pub og_image: String,
    pub posted: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub views: i64,
    pub likes: i64,
    pub shares: i64,
    pub comments: i64,
}

/// Changed-fields update for an existing mirror document.
///
/// Every field is optional: `None` leaves the stored value alone. Nested
/// sub-objects are patched key by key rather than replaced. Only
/// `updated_at` is unconditional.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MirrorPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intro_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conclusion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toc_items: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_sections: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured_image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured_image_alt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_display_name: Option<String>,
    #[serde(skip_serializing_if = "AuthorPatch::is_empty")]
    pub author: AuthorPatch,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reading_time: Option<u32>,
    #[serde(skip_serializing_if = "SeoPatch::is_empty")]
    pub seo: SeoPatch,
    #[serde(skip_serializing_if = "SocialPatch::is_empty")]
    pub social: SocialPatch,
    #[serde(skip_serializing_if = "StatsPatch::is_empty")]
    pub stats: StatsPatch,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AuthorPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub canonical_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub og_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub og_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub og_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posted: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub views: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub likes: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shares: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<i64>,
}

impl AuthorPatch {
    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.name.is_none()
    }
}

impl SeoPatch {
    pub fn is_empty(&self) -> bool {
        self.meta_title.is_none()
            && self.meta_description.is_none()
            && self.keywords.is_none()
            && self.canonical_url.is_none()
    }
}

impl SocialPatch {
    pub fn is_empty(&self) -> bool {
        self.og_title.is_none()
            && self.og_description.is_none()
            && self.og_image.is_none()
            && self.posted.is_none()
    }
}

impl StatsPatch {
    pub fn is_empty(&self) -> bool {
        self.views.is_none() && self.likes.is_none() && self.shares.is_none() && self.comments.is_none()
    }
}

impl MirrorPatch {
    /// A patch that only bumps `updated_at`.
    pub fn touch(updated_at: DateTime<Utc>) -> Self {
        Self {
            title: None,
            slug: None,
            system: None,
            status: None,
            content_html: None,
            excerpt: None,
            intro_text: None,
            conclusion: None,
            toc_items: None,
            content_sections: None,
            featured_image_url: None,
            featured_image_alt: None,
            author_display_name: None,
            author: AuthorPatch::default(),
            category: None,
            reading_time: None,
            seo: SeoPatch::default(),
            social: SocialPatch::default(),
            stats: StatsPatch::default(),
            version: None,
            published_at: None,
            updated_at,
        }
    }
}

impl MirrorDocument {
    /// Merge a changed-fields patch into this document in place.
    pub fn apply(&mut self, patch: &MirrorPatch) {
        set(&mut self.title, &patch.title);
        set(&mut self.slug, &patch.slug);
        set(&mut self.system, &patch.system);
        set(&mut self.status, &patch.status);
        set(&mut self.content_html, &patch.content_html);
        set(&mut self.excerpt, &patch.excerpt);
        set(&mut self.intro_text, &patch.intro_text);
        set(&mut self.conclusion, &patch.conclusion);
        set(&mut self.toc_items, &patch.toc_items);
        set(&mut self.content_sections, &patch.content_sections);
        set(&mut self.featured_image_url, &patch.featured_image_url);
        set(&mut self.featured_image_alt, &patch.featured_image_alt);
        set(&mut self.author_display_name, &patch.author_display_name);
        if patch.author.id.is_some() {
            self.author.id = patch.author.id.clone();
        }
        set(&mut self.author.name, &patch.author.name);
        set(&mut self.category, &patch.category);
        set(&mut self.reading_time, &patch.reading_time);
        set(&mut self.seo.meta_title, &patch.seo.meta_title);
        set(&mut self.seo.meta_description, &patch.seo.meta_description);
        set(&mut self.seo.keywords, &patch.seo.keywords);
        set(&mut self.seo.canonical_url, &patch.seo.canonical_url);
        set(&mut self.social.og_title, &patch.social.og_title);
        set(&mut self.social.og_description, &patch.social.og_description);
        set(&mut self.social.og_image, &patch.social.og_image);
        set(&mut self.social.posted, &patch.social.posted);
        set(&mut self.stats.views, &patch.stats.views);
        set(&mut self.stats.likes, &patch.stats.likes);
        set(&mut self.stats.shares, &patch.stats.shares);
        set(&mut self.stats.comments, &patch.stats.comments);
        set(&mut self.version, &patch.version);
        set(&mut self.published_at, &patch.published_at);
        self.updated_at = patch.updated_at;
    }
}

fn set<T: Clone>(slot: &mut T, value: &Option<T>) {
    if let Some(value) = value {
        *slot = value.clone();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    pub(crate) fn stored_document() -> MirrorDocument {
        let at = Utc.with_ymd_and_hms(2025, 1, 10, 8, 0, 0).unwrap();
        MirrorDocument {
            title: "Ghid RCA".into(),
            slug: "ghid-rca".into(),
            system: "rca".into(),
            status: "draft".into(),
            content_html: "<p>Despre RCA</p>".into(),
            excerpt: "Despre RCA".into(),
            intro_text: "Intro".into(),
            conclusion: "Final".into(),
            toc_items: json!([]),
            content_sections: json!([]),
            featured_image_url: "https://cdn.example/rca.jpg".into(),
            featured_image_alt: "RCA".into(),
            author_display_name: "Ana".into(),
            author: Author {
                id: Some("user-1".into()),
                name: "Ana".into(),
                email: String::new(),
            },
            category: Category::new("RCA", "rca"),
            tags: vec![],
            reading_time: 3,
            seo: Seo {
                meta_title: "Ghid RCA".into(),
                meta_description: "Despre RCA".into(),
                keywords: json!(["rca"]),
                canonical_url: "https://www.asigurari.ro/blog/rca/ghid-rca".into(),
            },
            social: Social {
                og_title: "Ghid RCA".into(),
                og_description: "Despre RCA".into(),
                og_image: "https://cdn.example/rca.jpg".into(),
                posted: json!({"facebook": true}),
            },
            stats: Stats {
                views: 10,
                likes: 2,
                shares: 1,
                comments: 0,
            },
            comments_enabled: true,
            directus_id: ItemKey::Text("abc".into()),
            version: 1,
            published_at: at,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn apply_merges_only_supplied_fields() {
        let mut doc = stored_document();
        let later = Utc.with_ymd_and_hms(2025, 2, 1, 9, 0, 0).unwrap();
        let mut patch = MirrorPatch::touch(later);
        patch.excerpt = Some("new".into());
        patch.stats.views = Some(99);

        doc.apply(&patch);

        assert_eq!(doc.excerpt, "new");
        assert_eq!(doc.stats.views, 99);
        assert_eq!(doc.stats.likes, 2);
        assert_eq!(doc.title, "Ghid RCA");
        assert_eq!(doc.seo.meta_description, "Despre RCA");
        assert_eq!(doc.social.posted, json!({"facebook": true}));
        assert_eq!(doc.author.id.as_deref(), Some("user-1"));
        assert_eq!(doc.updated_at, later);
        assert_eq!(doc.created_at, stored_document().created_at);
    }

    #[test]
    fn patch_serializes_without_untouched_fields() {
        let at = Utc.with_ymd_and_hms(2025, 2, 1, 9, 0, 0).unwrap();
        let mut patch = MirrorPatch::touch(at);
        patch.title = Some("T".into());
        patch.seo.meta_title = Some("T".into());

        let value = serde_json::to_value(&patch).unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys.len(), 3);
        assert!(keys.contains(&"title"));
        assert!(keys.contains(&"updatedAt"));
        assert_eq!(value["seo"], json!({"metaTitle": "T"}));
    }

    #[test]
    fn document_uses_camel_case_field_names() {
        let value = serde_json::to_value(stored_document()).unwrap();
        assert_eq!(value["directusId"], json!("abc"));
        assert_eq!(value["contentHtml"], json!("<p>Despre RCA</p>"));
        assert_eq!(value["seo"]["canonicalUrl"], json!("https://www.asigurari.ro/blog/rca/ghid-rca"));
        assert_eq!(value["category"], json!({"name": "RCA", "slug": "rca"}));
        assert_eq!(value["readingTime"], json!(3));
    }
}

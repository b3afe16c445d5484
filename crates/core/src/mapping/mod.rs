//! CMS item → mirror document mapping.
//!
//! [`PostMapper::map_post`] builds a whole document for newly created items;
//! [`PostMapper::map_changes`] builds a [`MirrorPatch`] from an update
//! payload that only carries the changed fields. Both are total: any JSON
//! object maps to something, with missing fields falling back to defaults.

pub mod text;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::document::category::DEFAULT_SYSTEM;
use crate::document::model::{Author, Seo, Social, Stats};
use crate::document::{CategoryTable, ItemKey, MirrorDocument, MirrorPatch, SourcePost};

const DEFAULT_SITE_URL: &str = "https://www.asigurari.ro";
const DEFAULT_AUTHOR: &str = "Echipa asigurari.ro";
const DEFAULT_STATUS: &str = "draft";
const DEFAULT_VERSION: i64 = 1;

/// Public site the mirrored posts are served from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteProfile {
    url: String,
    default_author: String,
}

impl SiteProfile {
    pub fn new(url: impl Into<String>, default_author: impl Into<String>) -> Self {
        let url: String = url.into();
        Self {
            url: url.trim_end_matches('/').to_string(),
            default_author: default_author.into(),
        }
    }

    /// Public URL of a post: `{site}/blog/{system}/{slug}`.
    pub fn post_url(&self, system: &str, slug: &str) -> String {
        format!("{}/blog/{system}/{slug}", self.url)
    }

    pub fn default_author(&self) -> &str {
        &self.default_author
    }
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self::new(DEFAULT_SITE_URL, DEFAULT_AUTHOR)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PostMapper {
    site: SiteProfile,
    categories: CategoryTable,
}

impl PostMapper {
    pub fn new(site: SiteProfile, categories: CategoryTable) -> Self {
        Self { site, categories }
    }

    pub fn site(&self) -> &SiteProfile {
        &self.site
    }

    /// Map a complete item to a fresh mirror document.
    pub fn map_post(&self, key: &ItemKey, post: &SourcePost, now: DateTime<Utc>) -> MirrorDocument {
        let system = post.text("system").unwrap_or_else(|| DEFAULT_SYSTEM.to_string());
        let title = post.text("title").unwrap_or_default();
        let slug = post.text("slug").unwrap_or_default();
        let content = post.text("content").unwrap_or_default();
        let plain = text::plain_text(&content);

        let excerpt = match post.text("excerpt") {
            Some(explicit) => explicit,
            None if !plain.is_empty() => text::auto_excerpt(&plain),
            None => String::new(),
        };
        let display_name = post.text("author_display_name");
        let image = post.text("featured_image_url").unwrap_or_default();

        MirrorDocument {
            category: self.categories.resolve(&system),
            reading_time: text::reading_time(&plain),
            seo: Seo {
                meta_title: post.text("seo_meta_title").unwrap_or_else(|| title.clone()),
                meta_description: post
                    .text("seo_meta_description")
                    .unwrap_or_else(|| excerpt.clone()),
                keywords: json_or(post, "seo_keywords", json!([])),
                canonical_url: post
                    .text("seo_canonical_url")
                    .unwrap_or_else(|| self.site.post_url(&system, &slug)),
            },
            social: Social {
                og_title: post.text("og_title").unwrap_or_else(|| title.clone()),
                og_description: post.text("og_description").unwrap_or_else(|| excerpt.clone()),
                og_image: image.clone(),
                posted: json_or(post, "social_posted", json!({})),
            },
            stats: Stats {
                views: post.count("stats_views").unwrap_or(0),
                likes: post.count("stats_likes").unwrap_or(0),
                shares: post.count("stats_shares").unwrap_or(0),
                comments: post.count("stats_comments").unwrap_or(0),
            },
            author_display_name: display_name
                .clone()
                .unwrap_or_else(|| self.site.default_author().to_string()),
            author: Author {
                id: post.text("author"),
                name: display_name.unwrap_or_default(),
                email: String::new(),
            },
            status: post.text("status").unwrap_or_else(|| DEFAULT_STATUS.to_string()),
            intro_text: post.text("intro_text").unwrap_or_default(),
            conclusion: post.text("conclusion").unwrap_or_default(),
            toc_items: json_or(post, "toc_items", json!([])),
            content_sections: json_or(post, "content_sections", json!([])),
            featured_image_url: image,
            featured_image_alt: post.text("featured_image_alt").unwrap_or_default(),
            tags: Vec::new(),
            comments_enabled: true,
            directus_id: key.clone(),
            version: post.count("version").filter(|v| *v != 0).unwrap_or(DEFAULT_VERSION),
            published_at: post.timestamp("published_at").unwrap_or(now),
            created_at: post.timestamp("date_created").unwrap_or(now),
            updated_at: now,
            content_html: content,
            excerpt,
            title,
            slug,
            system,
        }
    }

    /// Map an update payload to a changed-fields patch.
    ///
    /// A mirror field is set only when the payload mentions its source
    /// field. Derived values follow their inputs: reading time with
    /// `content`, category with `system`. Fields that fall back to another
    /// field on create (SEO and Open Graph overrides, the excerpt) are
    /// only written when their own source field is present; a cleared
    /// override takes the fallback from the same payload, or is left alone
    /// when the payload cannot supply one.
    ///
    /// A field that took its value from a fallback on create is not
    /// recomputed when that fallback later changes. Updating only `excerpt`
    /// leaves `seo.metaDescription` and `social.ogDescription` holding the
    /// previous excerpt until the post is re-created or their own source
    /// fields are sent.
    pub fn map_changes(&self, post: &SourcePost, now: DateTime<Utc>) -> MirrorPatch {
        let mut patch = MirrorPatch::touch(now);

        patch.title = post.present_text("title");
        patch.slug = post.present_text("slug");
        patch.status = post
            .contains("status")
            .then(|| post.text("status").unwrap_or_else(|| DEFAULT_STATUS.to_string()));
        patch.intro_text = post.present_text("intro_text");
        patch.conclusion = post.present_text("conclusion");
        patch.toc_items = post.json("toc_items").cloned();
        patch.content_sections = post.json("content_sections").cloned();
        patch.featured_image_alt = post.present_text("featured_image_alt");

        if post.contains("system") {
            let system = post.text("system").unwrap_or_else(|| DEFAULT_SYSTEM.to_string());
            patch.category = Some(self.categories.resolve(&system));
            patch.system = Some(system);
        }

        let mut auto_excerpt = None;
        if let Some(content) = post.present_text("content") {
            let plain = text::plain_text(&content);
            patch.reading_time = Some(text::reading_time(&plain));
            auto_excerpt = Some(if plain.is_empty() {
                String::new()
            } else {
                text::auto_excerpt(&plain)
            });
            patch.content_html = Some(content);
        }
        patch.excerpt = overridden(post, "excerpt", auto_excerpt);

        if let Some(image) = post.present_text("featured_image_url") {
            patch.social.og_image = Some(image.clone());
            patch.featured_image_url = Some(image);
        }

        if post.contains("author_display_name") {
            let name = post.text("author_display_name");
            patch.author_display_name = Some(
                name.clone()
                    .unwrap_or_else(|| self.site.default_author().to_string()),
            );
            patch.author.name = Some(name.unwrap_or_default());
        }
        patch.author.id = post.text("author");

        let title = post.text("title");
        let description = patch.excerpt.clone().filter(|e| !e.is_empty());
        let url = match (&patch.system, &patch.slug) {
            (Some(system), Some(slug)) if !slug.is_empty() => Some(self.site.post_url(system, slug)),
            _ => None,
        };
        patch.seo.meta_title = overridden(post, "seo_meta_title", title.clone());
        patch.seo.meta_description = overridden(post, "seo_meta_description", description.clone());
        patch.seo.keywords = post.json("seo_keywords").cloned();
        patch.seo.canonical_url = overridden(post, "seo_canonical_url", url);
        patch.social.og_title = overridden(post, "og_title", title);
        patch.social.og_description = overridden(post, "og_description", description);
        patch.social.posted = post.json("social_posted").cloned();

        patch.stats.views = present_count(post, "stats_views");
        patch.stats.likes = present_count(post, "stats_likes");
        patch.stats.shares = present_count(post, "stats_shares");
        patch.stats.comments = present_count(post, "stats_comments");

        patch.version = post
            .contains("version")
            .then(|| post.count("version").filter(|v| *v != 0).unwrap_or(DEFAULT_VERSION));
        patch.published_at = post.timestamp("published_at");

        patch
    }
}

fn json_or(post: &SourcePost, field: &str, default: Value) -> Value {
    post.json(field).cloned().unwrap_or(default)
}

fn present_count(post: &SourcePost, field: &str) -> Option<i64> {
    post.contains(field)
        .then(|| post.count(field).unwrap_or(0))
}

/// Value of an override field that the payload mentions: its own text when
/// set, otherwise `fallback`.
fn overridden(post: &SourcePost, field: &str, fallback: Option<String>) -> Option<String> {
    if !post.contains(field) {
        return None;
    }
    post.text(field).or(fallback)
}

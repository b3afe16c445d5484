//! Outbound "post published" webhook.
//!
//! One POST per publish, no retry, no delivery tracking. A notifier built
//! without a webhook base URL is disabled and never touches the network.

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::mapping::SiteProfile;
use crate::mirror::PublishedPost;

pub const PUBLISHED_HOOK_PATH: &str = "/webhook/blog-published";

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("webhook request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("webhook rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Body of the published-post webhook.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublishedPayload {
    pub title: String,
    pub slug: String,
    pub system: String,
    pub excerpt: String,
    pub featured_image_url: String,
    pub tags: Vec<Value>,
    pub url: String,
}

pub struct PublishNotifier {
    http: Client,
    endpoint: Option<String>,
    site: SiteProfile,
}

impl PublishNotifier {
    /// `webhook_base` is the automation server root; the published hook path
    /// is appended to it. `None` or a blank value disables the notifier.
    pub fn new(webhook_base: Option<&str>, site: SiteProfile) -> Self {
        let endpoint = webhook_base
            .map(|base| base.trim().trim_end_matches('/'))
            .filter(|base| !base.is_empty())
            .map(|base| format!("{base}{PUBLISHED_HOOK_PATH}"));
        Self {
            http: Client::new(),
            endpoint,
            site,
        }
    }

    pub fn disabled(site: SiteProfile) -> Self {
        Self::new(None, site)
    }

    pub fn is_enabled(&self) -> bool {
        self.endpoint.is_some()
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    pub fn payload(&self, post: &PublishedPost) -> PublishedPayload {
        PublishedPayload {
            title: post.title.clone(),
            slug: post.slug.clone(),
            system: post.system.clone(),
            excerpt: post.excerpt.clone(),
            featured_image_url: post.featured_image_url.clone(),
            tags: post.tags.clone(),
            url: self.site.post_url(&post.system, &post.slug),
        }
    }

    /// Fire the webhook for `post`. Returns `Ok(false)` when disabled.
    pub async fn notify(&self, post: &PublishedPost) -> Result<bool, NotifyError> {
        let Some(endpoint) = &self.endpoint else {
            return Ok(false);
        };

        let response = self.http.post(endpoint).json(&self.payload(post)).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!(slug = %post.slug, status = status.as_u16(), "publish webhook fired");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn post() -> PublishedPost {
        PublishedPost {
            title: "Ghid RCA".into(),
            slug: "ghid-rca".into(),
            system: "rca".into(),
            excerpt: "Despre RCA".into(),
            featured_image_url: "https://cdn.example/rca.jpg".into(),
            tags: vec![],
        }
    }

    #[test]
    fn blank_base_disables_notifier() {
        assert!(!PublishNotifier::new(None, SiteProfile::default()).is_enabled());
        assert!(!PublishNotifier::new(Some("  "), SiteProfile::default()).is_enabled());
        let notifier = PublishNotifier::new(Some("https://n8n.example/"), SiteProfile::default());
        assert_eq!(
            notifier.endpoint(),
            Some("https://n8n.example/webhook/blog-published")
        );
    }

    #[test]
    fn payload_carries_public_url() {
        let notifier = PublishNotifier::disabled(SiteProfile::default());
        let payload = serde_json::to_value(notifier.payload(&post())).unwrap();
        assert_eq!(
            payload,
            json!({
                "title": "Ghid RCA",
                "slug": "ghid-rca",
                "system": "rca",
                "excerpt": "Despre RCA",
                "featured_image_url": "https://cdn.example/rca.jpg",
                "tags": [],
                "url": "https://www.asigurari.ro/blog/rca/ghid-rca",
            })
        );
    }

    #[tokio::test]
    async fn posts_payload_to_published_hook() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/webhook/blog-published"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({
                "title": "Ghid RCA",
                "slug": "ghid-rca",
                "system": "rca",
                "excerpt": "Despre RCA",
                "featured_image_url": "https://cdn.example/rca.jpg",
                "tags": [],
                "url": "https://www.asigurari.ro/blog/rca/ghid-rca",
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = PublishNotifier::new(Some(server.uri().as_str()), SiteProfile::default());
        assert!(notifier.notify(&post()).await.unwrap());
    }

    #[tokio::test]
    async fn non_success_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let notifier = PublishNotifier::new(Some(server.uri().as_str()), SiteProfile::default());
        let err = notifier.notify(&post()).await.unwrap_err();
        assert!(matches!(err, NotifyError::Rejected { status: 502, .. }));
    }

    #[tokio::test]
    async fn disabled_notifier_sends_nothing() {
        let notifier = PublishNotifier::disabled(SiteProfile::default());
        assert!(!notifier.notify(&post()).await.unwrap());
    }
}

use std::env;
use std::str::FromStr;
use std::time::Duration;

use blog_sync_core::mapping::SiteProfile;
use blog_sync_core::mirror::MongoSettings;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} has an invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server host to bind to.
    pub host: String,
    /// Server port to bind to.
    pub port: u16,
    /// MongoDB connection URI of the mirror store.
    pub mongo_uri: String,
    pub mongo_db: String,
    pub mongo_collection: String,
    /// Connect and server-selection timeout for MongoDB.
    pub mongo_connect_timeout: Duration,
    /// CMS collection whose lifecycle events are accepted.
    pub source_collection: String,
    /// Automation server base URL. Unset disables the publish webhook.
    pub webhook_url: Option<String>,
    /// Public site root used for canonical and webhook URLs.
    pub site_url: String,
    /// Author display name used when a post has none.
    pub default_author: String,
    /// Event bus channel capacity.
    pub event_bus_capacity: usize,
    /// Log level (e.g., "info", "debug", "trace").
    pub log_level: String,
}

impl AppConfig {
    /// Load configuration from environment variables with sensible defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through `lookup`, which returns the raw value of a
    /// variable if it is set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let text = |name: &str, default: &str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        Ok(Self {
            host: text("HOST", "0.0.0.0"),
            port: parse(&lookup, "PORT", 3030)?,
            mongo_uri: text("MONGO_URI", "mongodb://localhost:27017"),
            mongo_db: text("MONGO_DB", "wib_test"),
            mongo_collection: text("MONGO_COLLECTION", "blog_posts"),
            mongo_connect_timeout: Duration::from_millis(parse(
                &lookup,
                "MONGO_CONNECT_TIMEOUT_MS",
                5000,
            )?),
            source_collection: text("SOURCE_COLLECTION", "blog_posts"),
            webhook_url: lookup("N8N_WEBHOOK_URL").filter(|v| !v.trim().is_empty()),
            site_url: text("SITE_URL", "https://www.asigurari.ro"),
            default_author: text("DEFAULT_AUTHOR", "Echipa asigurari.ro"),
            event_bus_capacity: positive(&lookup, "EVENT_BUS_CAPACITY", 1024)?,
            log_level: text("LOG_LEVEL", "info"),
        })
    }

    /// Build the socket address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn mongo_settings(&self) -> MongoSettings {
        MongoSettings {
            uri: self.mongo_uri.clone(),
            database: self.mongo_db.clone(),
            collection: self.mongo_collection.clone(),
            connect_timeout: self.mongo_connect_timeout,
        }
    }

    pub fn site(&self) -> SiteProfile {
        SiteProfile::new(&self.site_url, &self.default_author)
    }
}

fn parse<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        None => Ok(default),
        Some(raw) if raw.trim().is_empty() => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
    }
}

/// Like [`parse`], but zero is rejected. Used for sizes that must hold at
/// least one item.
fn positive(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: usize,
) -> Result<usize, ConfigError> {
    match parse(lookup, name, default)? {
        0 => Err(ConfigError::Invalid {
            name,
            value: "0".to_string(),
        }),
        value => Ok(value),
    }
}

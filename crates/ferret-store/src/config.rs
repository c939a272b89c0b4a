//! Connection settings for the storage backends

use serde::{Deserialize, Serialize};

/// Connection settings shared by [`PgStore`](crate::PgStore) and
/// [`PgContentStore`](crate::PgContentStore)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Relational database URL
    pub database_url: String,

    /// Content database URL (falls back to `database_url`)
    #[serde(default)]
    pub content_database_url: Option<String>,

    /// Pool size per worker
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    4
}

impl StoreConfig {
    /// Settings with a single database and the default pool size
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            content_database_url: None,
            max_connections: default_max_connections(),
        }
    }

    /// URL the content store connects to
    pub fn content_url(&self) -> &str {
        self.content_database_url
            .as_deref()
            .unwrap_or(&self.database_url)
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), String> {
        if self.database_url.trim().is_empty() {
            return Err("database_url must not be empty".to_string());
        }
        if self.max_connections == 0 {
            return Err("max_connections must be at least 1".to_string());
        }
        Ok(())
    }
}

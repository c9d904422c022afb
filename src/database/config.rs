use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Connection URL, e.g. `sqlite::memory:` or `postgres://...`
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://vinyldigger.db?mode=rwc".to_string(),
            max_connections: 10,
        }
    }
}

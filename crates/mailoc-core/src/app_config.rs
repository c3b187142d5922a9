use std::net::SocketAddr;
use std::path::PathBuf;

use crate::geo::DistanceUnit;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub taxonomies_path: PathBuf,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    /// Selectable radius thresholds; the first entry is the resolver default.
    pub distance_options: Vec<u32>,
    /// Selectable distance units; the first entry is the resolver default.
    pub unit_options: Vec<DistanceUnit>,
    pub default_limit: i64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("taxonomies_path", &self.taxonomies_path)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("distance_options", &self.distance_options)
            .field("unit_options", &self.unit_options)
            .field("default_limit", &self.default_limit)
            .finish()
    }
}

impl AppConfig {
    /// The distance threshold preselected when a request carries none.
    #[must_use]
    pub fn default_distance(&self) -> u32 {
        self.distance_options.first().copied().unwrap_or(0)
    }

    /// The unit preselected when a request carries none.
    #[must_use]
    pub fn default_unit(&self) -> DistanceUnit {
        self.unit_options
            .first()
            .copied()
            .unwrap_or(DistanceUnit::Miles)
    }
}

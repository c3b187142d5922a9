pub mod app_config;
pub mod config;
pub mod filters;
pub mod geo;
pub mod taxonomies;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use filters::{FilterDefaults, FilterParams, FilterValue};
pub use geo::{haversine_distance, DistanceUnit, EARTH_RADIUS_KM, EARTH_RADIUS_MILES};
pub use taxonomies::{load_taxonomies, TaxonomiesFile, TaxonomyConfig, TermConfig};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
    #[error("failed to read taxonomies file at {path}")]
    TaxonomiesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse taxonomies file")]
    TaxonomiesFileParse(#[from] serde_yaml::Error),
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

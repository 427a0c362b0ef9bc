pub mod app_config;
pub mod classify;
pub mod config;
pub mod products;
pub mod report;
pub mod restock;
pub mod time;

use thiserror::Error;

pub use app_config::AppConfig;
pub use classify::{classify, url_set, verify_consistent, ClassifyError, Classification};
pub use config::{load_app_config, load_app_config_from_env};
pub use products::{EventType, HistoryEvent, Listing, Product, RestockEntry};
pub use report::CycleReport;
pub use restock::{extract_restocks, next_resale_date, parse_restock_tag};
pub use time::CanonicalTz;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

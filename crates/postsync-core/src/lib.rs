//! Shared domain types and configuration for the postsync ingestion pipeline.

pub mod app_config;
pub mod config;
pub mod error;
pub mod post;

pub use app_config::{AppConfig, WritePolicy};
pub use config::{load_app_config, load_app_config_from_env};
pub use error::ConfigError;
pub use post::{CanonicalPost, NaturalKey, Platform};

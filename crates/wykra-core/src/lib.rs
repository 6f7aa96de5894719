//! Shared domain types for the Wykra profile-insight pipeline.
//!
//! Everything here is I/O free: the validated [`ProfileHandle`], the
//! [`Field`] unknown marker, the [`ProjectedProfile`] that flows between the
//! scraper and the prompt builder, the stable [`ErrorKind`] taxonomy and the
//! environment-driven [`AppConfig`].

pub mod app_config;
pub mod backoff;
pub mod config;
pub mod error_kind;
pub mod field;
pub mod handle;
pub mod profile;

use thiserror::Error;

pub use app_config::{AppConfig, Environment, LlmBackend};
pub use backoff::BackoffPolicy;
pub use config::{load_app_config, load_app_config_from_env, load_app_config_with_backend};
pub use error_kind::{ErrorKind, Stage};
pub use field::Field;
pub use handle::{HandleError, ProfileHandle};
pub use profile::{ProfileField, ProjectedProfile};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

//! Shared domain model for the backoffice console: organizations, users,
//! reporting periods, derived statistics, configuration and errors.

pub mod config;
pub mod error;
pub mod types;

pub use self::config::AppConfig;
pub use error::{BackofficeError, BackofficeResult};

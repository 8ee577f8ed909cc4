//! Core types, configuration, and error handling for basket.
//!
//! This crate provides the shared foundation used by the other basket crates:
//! - [`BasketError`]: unified error type using `thiserror`
//! - [`BasketConfig`]: configuration loaded from `.basket.toml`
//! - Shared types: [`RawTable`], [`Cell`], [`OutputFormat`]

mod config;
mod error;
mod types;

pub use config::{AnalysisConfig, BasketConfig, IngestConfig, OutputConfig};
pub use error::BasketError;
pub use types::{Cell, OutputFormat, RawTable};

/// A convenience `Result` type for basket operations.
pub type Result<T> = std::result::Result<T, BasketError>;

/// Check that a support or confidence threshold lies in `(0, 1]`.
///
/// # Errors
///
/// Returns [`BasketError::InvalidThreshold`] for values outside the range,
/// including `NaN`.
///
/// # Examples
///
/// ```
/// use basket_core::validate_threshold;
///
/// assert!(validate_threshold("min_support", 0.5).is_ok());
/// assert!(validate_threshold("min_support", 1.0).is_ok());
/// assert!(validate_threshold("min_support", 0.0).is_err());
/// assert!(validate_threshold("min_confidence", 1.5).is_err());
/// ```
pub fn validate_threshold(name: &'static str, value: f64) -> Result<()> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(BasketError::InvalidThreshold { name, value })
    }
}

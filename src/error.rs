//! Error types for the counter-enabled callback plugin.
//!
//! The plugin itself has almost no failure modes: execution failures are
//! host-classified outcomes that it merely renders. The error type here
//! covers the one thing that can go wrong on the plugin's side, parsing
//! its own option values.

use thiserror::Error;

/// Result type alias for plugin operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the counter-enabled callback plugin.
#[derive(Error, Debug)]
pub enum Error {
    /// An option value could not be parsed as a boolean toggle.
    #[error("invalid value '{value}' for option {key} (expected a boolean)")]
    InvalidOption {
        /// Name of the option (or environment variable) being parsed
        key: String,
        /// The rejected raw value
        value: String,
    },
}

#![deny(missing_docs)]

//! # CLI Errors
//!
//! Error types for the CLI crate.

use derive_more::{Display, From};
use oapigen_core::AppError;

/// Main error enum for CLI operations.
#[derive(Debug, Display, From)]
pub enum CliError {
    /// IO Error wrapper.
    #[display("IO Error: {}", _0)]
    Io(std::io::Error),

    /// Failure inside the generator.
    #[display("{}", _0)]
    Core(AppError),

    /// Unreadable or invalid configuration.
    #[display("Configuration error: {}", _0)]
    #[from(ignore)]
    Config(String),

    /// General failure message.
    #[display("Operation failed: {}", _0)]
    General(String),
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Io(e) => Some(e),
            CliError::Core(e) => Some(e),
            _ => None,
        }
    }
}

/// Result type alias.
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_core_error_is_transparent() {
        let err: CliError = AppError::Reference("bad ref".into()).into();
        assert_eq!(err.to_string(), AppError::Reference("bad ref".into()).to_string());
        assert!(err.source().is_some());
    }

    #[test]
    fn test_config_error_display() {
        let err = CliError::Config("missing field".into());
        assert_eq!(err.to_string(), "Configuration error: missing field");
        assert!(err.source().is_none());
    }
}

//! Errors raised while loading or resolving a build configuration.

use std::path::PathBuf;

use crate::overlay::Variant;

/// Errors that can occur while producing a resolved configuration.
///
/// Every variant is fatal: a build cannot start from a partially resolved
/// configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Unknown variant '{0}' (expected one of: development, production)")]
    UnknownVariant(String),

    #[error("No overlay defined for variant '{0}'")]
    MissingOverlay(Variant),

    #[error("Key '{0}' is variant-specific and cannot appear in the common configuration")]
    VariantKeyInCommon(String),

    #[error("Malformed configuration at '{key}': {message}")]
    Malformed { key: String, message: String },

    #[error("Invalid pattern at '{key}': {pattern}: {message}")]
    InvalidPattern {
        key: String,
        pattern: String,
        message: String,
    },

    #[error("Failed to render template '{template}': {message}")]
    Template { template: String, message: String },

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),
}

impl ConfigurationError {
    pub(crate) fn malformed(key: impl Into<String>, message: impl ToString) -> Self {
        Self::Malformed {
            key: key.into(),
            message: message.to_string(),
        }
    }
}

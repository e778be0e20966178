//! Unified error types for the Kubeforge workspace.
//!
//! The core pipeline degrades gracefully wherever possible; these variants
//! cover the few genuinely fallible boundaries (file loading, structurally
//! broken YAML, serialization of generated objects).

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum KubeforgeError {
    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// An input document or option is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// A YAML document could not be parsed or rendered.
    #[error("YAML error: {source}")]
    Yaml {
        /// Underlying YAML error.
        #[from]
        source: serde_yaml::Error,
    },

    /// JSON serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, KubeforgeError>;

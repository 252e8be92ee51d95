//! Error Types
//!
//! This module defines the error type shared by the staging helpers.
//!
//! # Overview
//!
//! [`Error`] covers every failure mode of the crate:
//! - Configuration errors (unknown preset, malformed source lists)
//! - Asset IO and decoding errors
//! - Environment derivation (PMREM) errors
//! - Async task failures
//!
//! Configuration errors are reported synchronously, when an
//! [`Environment`](crate::environment::Environment) is constructed. Everything
//! else surfaces through the futures returned by the loading APIs.
//!
//! # Usage
//!
//! ```rust,ignore
//! use myth_stage::errors::{Error, Result};
//!
//! fn resolve() -> Result<()> {
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use thiserror::Error;

/// The main error type for the staging helpers.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// A preset name that is not part of the registry.
    #[error("Preset must be one of: {valid}")]
    UnknownPreset {
        /// The rejected name
        name: String,
        /// Comma-separated list of valid preset names
        valid: String,
    },

    /// A file list whose shape maps to neither a cubemap nor a panorama.
    #[error("Invalid environment source: {0}")]
    InvalidSource(String),

    /// Configuration could not be parsed.
    #[error("Config parse error: {0}")]
    ConfigError(#[from] serde_json::Error),

    // ========================================================================
    // I/O Errors
    // ========================================================================
    /// File I/O error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// HTTP request error.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// HTTP response error with status code.
    #[error("HTTP response error: status {status} ({url})")]
    HttpResponseError {
        /// HTTP status code
        status: u16,
        /// Requested URL
        url: String,
    },

    /// URL parsing error.
    #[cfg(feature = "http")]
    #[error("URL parse error: {0}")]
    UrlParseError(#[from] url::ParseError),

    /// Feature not enabled.
    #[error("Feature not enabled: {0}")]
    FeatureNotEnabled(String),

    // ========================================================================
    // Image & Texture Errors
    // ========================================================================
    /// Image decoding error.
    #[error("Image decode error: {0}")]
    ImageDecodeError(String),

    /// Cube map validation error.
    #[error("Cube map error: {0}")]
    CubeMapError(String),

    /// Prefiltering of the environment failed.
    #[error("Environment convolution error: {0}")]
    ConvolutionError(String),

    // ========================================================================
    // Async & Threading Errors
    // ========================================================================
    /// Task join error (when async tasks fail to complete).
    #[error("Task join error: {0}")]
    TaskJoinError(String),

    /// An error produced once and observed by several coalesced waiters.
    #[error(transparent)]
    Shared(Arc<Error>),
}

impl Error {
    /// Returns the innermost error, looking through [`Error::Shared`].
    #[must_use]
    pub fn root(&self) -> &Error {
        match self {
            Error::Shared(inner) => inner.root(),
            other => other,
        }
    }
}

// ============================================================================
// Convenient conversion implementations
// ============================================================================

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::ImageDecodeError(err.to_string())
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::TaskJoinError(err.to_string())
    }
}

/// Alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

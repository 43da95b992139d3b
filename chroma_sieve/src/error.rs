//! Error types for the chroma_sieve library

use crate::config::ConfigError;
use crate::core_modules::mask::MaskShapeError;
use crate::frame::FrameError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for chroma_sieve operations
pub type Result<T> = std::result::Result<T, SieveError>;

#[derive(Error, Debug)]
pub enum SieveError {
    /// Configuration is missing or invalid; nothing has been processed yet.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A video, image, or corpus path could not be opened or decoded.
    #[error("cannot open source {}: {message}", path.display())]
    SourceUnavailable {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// One corpus image could not be decoded.
    #[error("cannot decode {}", path.display())]
    ItemDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to write {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error(transparent)]
    MaskShape(#[from] MaskShapeError),

    /// Operator input for the target accuracy was not an integer in 0..=100.
    #[error("target accuracy must be a whole number from 0 to 100, got {input:?}")]
    InvalidTargetAccuracy { input: String },
}

impl SieveError {
    pub fn source_unavailable<E>(path: impl Into<PathBuf>, message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::SourceUnavailable {
            path: path.into(),
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn write<E>(path: impl Into<PathBuf>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Write {
            path: path.into(),
            source: Box::new(source),
        }
    }

    /// Per-item failures that a batch run logs and skips.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, SieveError::ItemDecode { .. } | SieveError::Write { .. })
    }
}

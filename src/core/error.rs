//! Error types for the skinned mesh engine

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the engine
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to open asset {}: {source}", path.display())]
    AssetOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error in {section} at token {token}: {message}")]
    Parse {
        section: &'static str,
        token: usize,
        message: String,
    },

    #[error("animation clip not found: {0}")]
    ClipNotFound(String),

    #[error("invalid skeleton: {0}")]
    InvalidSkeleton(String),

    #[error("invalid animation: {0}")]
    InvalidAnimation(String),

    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for the one recoverable runtime condition: a clip lookup miss
    pub fn is_clip_not_found(&self) -> bool {
        matches!(self, Error::ClipNotFound(_))
    }
}

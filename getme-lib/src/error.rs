use thiserror::Error;

/// Everything that can go wrong while resolving and transferring an artifact.
/// All variants are terminal for the current download; nothing is retried.
#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("invalid download url '{0}'")]
    InvalidLocator(String),

    #[error("malformed header entry '{0}', expected Name=Value")]
    InvalidHeader(String),

    #[error("failed to resolve {provider} url: {reason}")]
    Resolution {
        provider: &'static str,
        reason: String,
    },

    #[error("transfer failed: {0}")]
    Transfer(String),

    #[error("object storage error: {0}")]
    Storage(#[from] object_store::Error),

    #[error("filesystem error: {0}")]
    Filesystem(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DownloadError>;

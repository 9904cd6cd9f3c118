//! Upload staging error types.

use thiserror::Error;

/// Errors that can occur while staging a multipart upload.
#[derive(Debug, Error)]
pub enum StagingError {
    /// The request carried more candidate files than the configured cap.
    #[error("too many CV files: at most {limit} are accepted per request")]
    TooManyFiles { limit: usize },

    /// One uploaded file exceeded the per-file byte cap.
    #[error("file '{name}' exceeds the upload size limit of {limit} bytes")]
    FileTooLarge { name: String, limit: u64 },

    /// The multipart stream itself was malformed or truncated.
    #[error("malformed upload: {0}")]
    Multipart(String),

    /// Creating the staging directory or writing a staged file failed.
    #[error("staging failed: {0}")]
    Io(#[from] std::io::Error),
}

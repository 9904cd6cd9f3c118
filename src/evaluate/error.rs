//! Evaluation failure taxonomy.

use thiserror::Error;

/// Classified outcome of a failed evaluation.
///
/// Every local or upstream failure in the evaluation pipeline folds into one
/// of these variants; nothing else crosses the orchestrator boundary.
#[derive(Debug, Clone, Error)]
pub enum EvalError {
    /// A precondition was violated before any work happened.
    #[error("invalid evaluation input: {0}")]
    InvalidInput(String),

    /// The provider rejected the supplied API key.
    #[error("invalid or incorrect API key: {0}")]
    InvalidCredential(String),

    /// The provider reported quota or rate exhaustion.
    #[error("provider quota exceeded: {0}")]
    QuotaExceeded(String),

    /// The requested model does not exist or is not available to this key.
    #[error("model '{model}' not found or invalid: {detail}")]
    ModelNotFound { model: String, detail: String },

    /// The provider could not process an attached file.
    #[error("provider failed to process an uploaded file: {0}")]
    FileProcessingFailed(String),

    /// A staged file could not be read from local disk.
    #[error("could not read staged file '{path}': {detail}")]
    LocalFileNotFound { path: String, detail: String },

    /// The stream completed without producing any text.
    #[error("provider returned an empty response{}", block_reason_suffix(.block_reason))]
    EmptyResponse { block_reason: Option<String> },

    /// The provider call exceeded the configured deadline.
    #[error("provider call timed out after {0} seconds")]
    Timeout(u64),

    /// Anything unclassified; the original message is preserved.
    #[error("evaluation failed: {0}")]
    Unknown(String),
}

impl EvalError {
    /// True when the failure is something the caller can fix: bad input, bad
    /// key, bad model, exhausted quota, or an upload the pipeline could not
    /// read or the provider could not digest.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput(_)
                | Self::InvalidCredential(_)
                | Self::QuotaExceeded(_)
                | Self::ModelNotFound { .. }
                | Self::FileProcessingFailed(_)
                | Self::LocalFileNotFound { .. }
        )
    }
}

fn block_reason_suffix(block_reason: &Option<String>) -> String {
    match block_reason {
        Some(reason) => format!(" (block reason: {reason})"),
        None => String::new(),
    }
}

/// Maps a provider error message onto the typed taxonomy.
///
/// `genai` does not expose stable typed status codes across adapters, so the
/// mapping keys on the provider's documented error phrases. Unmatched
/// messages become [`EvalError::Unknown`] with the text preserved.
pub(crate) fn classify_provider_message(message: &str, model: &str) -> EvalError {
    let lowered = message.to_ascii_lowercase();

    const CREDENTIAL: &[&str] = &[
        "api key not valid",
        "api_key_invalid",
        "permission denied",
        "permission_denied",
        "unauthenticated",
        "authentication failed",
        "unauthorized",
    ];
    const QUOTA: &[&str] = &[
        "quota",
        "resource has been exhausted",
        "resource_exhausted",
        "rate limit",
        "too many requests",
    ];
    const MODEL: &[&str] = &[
        "model not found",
        "invalid model",
        "is not found for api version",
        "not_found",
        "unknown model",
    ];
    const FILE: &[&str] = &[
        "file size",
        "file processing failed",
        "unsupported file",
        "unsupported mime",
        "invalid file",
    ];

    let contains_any = |keys: &[&str]| keys.iter().any(|k| lowered.contains(k));

    if contains_any(CREDENTIAL) {
        EvalError::InvalidCredential(message.to_string())
    } else if contains_any(QUOTA) {
        EvalError::QuotaExceeded(message.to_string())
    } else if contains_any(MODEL) {
        EvalError::ModelNotFound {
            model: model.to_string(),
            detail: message.to_string(),
        }
    } else if contains_any(FILE) {
        EvalError::FileProcessingFailed(message.to_string())
    } else {
        EvalError::Unknown(message.to_string())
    }
}

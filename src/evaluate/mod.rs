//! Evaluation orchestration.
//!
//! Reads the staged files, encodes them as attachments, issues one streaming
//! generation call through the [`GenerationBackend`] seam, and accumulates
//! the streamed verdict. Reads files, writes nothing; every failure comes
//! back as a classified [`EvalError`], never a panic or a raw provider error.

pub mod backend;
pub mod error;


#[cfg(any(test, feature = "mock"))]
pub use backend::MockGeneration;
pub use backend::{
    EncodedFile, GenAiBackend, GenerationBackend, GenerationEvent, GenerationStream, RequestParts,
};
pub use error::EvalError;

use std::io;
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use futures_util::StreamExt;
use tracing::{debug, info, warn};

/// MIME type attached to PDF uploads.
pub const PDF_MIME: &str = "application/pdf";

/// Fallback MIME type for anything else; the provider may reject it.
pub const GENERIC_MIME: &str = "application/octet-stream";

/// Inputs for one evaluation run.
#[derive(Debug, Clone)]
pub struct EvaluationRequest<'a> {
    pub criteria_path: &'a Path,
    pub candidate_paths: &'a [PathBuf],
    pub prompt: &'a str,
    pub model: &'a str,
    pub api_key: &'a str,
}

/// Successful evaluation. `text` starts with the provenance line naming the
/// model that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub model: String,
    pub text: String,
}

/// Runs one evaluation end to end.
///
/// Preconditions are re-validated here and fail fast without touching the
/// backend; local reads also happen before the call, so a missing staged
/// file never costs an upstream request.
pub async fn evaluate<P: GenerationBackend>(
    backend: &P,
    req: EvaluationRequest<'_>,
) -> Result<Evaluation, EvalError> {
    if req.api_key.trim().is_empty() {
        return Err(EvalError::InvalidInput(
            "API key was not provided".to_string(),
        ));
    }
    if req.criteria_path.as_os_str().is_empty() {
        return Err(EvalError::InvalidInput(
            "criteria file path is missing".to_string(),
        ));
    }
    if req.candidate_paths.is_empty() {
        return Err(EvalError::InvalidInput(
            "no CV file paths were provided".to_string(),
        ));
    }

    let mut attachments = Vec::with_capacity(req.candidate_paths.len() + 1);
    attachments.push(encode_attachment(req.criteria_path).await?);
    for path in req.candidate_paths {
        attachments.push(encode_attachment(path).await?);
    }

    info!(
        model = %req.model,
        candidates = req.candidate_paths.len(),
        "issuing streaming generation request"
    );

    let parts = RequestParts {
        prompt: req.prompt.to_string(),
        attachments,
    };
    let mut stream = backend
        .stream_generation(req.api_key, req.model, parts)
        .await?;

    // The accumulation loop is the single place mid-stream failure shows up;
    // fragments received before an error are intentionally discarded with it.
    let mut accumulated = String::new();
    let mut block_reason = None;
    while let Some(event) = stream.next().await {
        match event? {
            GenerationEvent::Text(fragment) => accumulated.push_str(&fragment),
            GenerationEvent::Finished {
                block_reason: reason,
            } => block_reason = reason,
        }
    }

    if accumulated.trim().is_empty() {
        return Err(EvalError::EmptyResponse { block_reason });
    }

    debug!(chars = accumulated.len(), "generation stream complete");

    Ok(Evaluation {
        text: format!("Powered by {}\n\n{}", req.model, accumulated),
        model: req.model.to_string(),
    })
}

async fn encode_attachment(path: &Path) -> Result<EncodedFile, EvalError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| read_error(path, e))?;
    let mime_type = mime_for(path);
    if mime_type != PDF_MIME {
        warn!(file = %path.display(), "non-PDF attachment; the provider may reject it");
    }
    Ok(EncodedFile {
        mime_type,
        data: BASE64.encode(&bytes),
    })
}

fn mime_for(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("pdf") => PDF_MIME,
        _ => GENERIC_MIME,
    }
}

fn read_error(path: &Path, err: io::Error) -> EvalError {
    let path_display = path.display().to_string();
    match err.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => EvalError::LocalFileNotFound {
            path: path_display,
            detail: err.to_string(),
        },
        _ => EvalError::Unknown(format!("reading '{path_display}': {err}")),
    }
}

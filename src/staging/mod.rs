//! Multipart upload staging.
//!
//! Each request gets its own freshly created temp directory under the staging
//! root; accepted files are written there under sanitized names. The
//! directory is removed exactly once per request: explicitly via
//! [`StagedUpload::cleanup`] on the normal paths, or by `Drop` when the
//! request is cancelled mid-flight.

pub mod error;


pub use error::StagingError;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use axum::extract::Multipart;
use tempfile::TempDir;
use tracing::{debug, warn};

use crate::sanitize::sanitize;

/// Multipart field carrying the single criteria document.
pub const CRITERIA_FIELD: &str = "criteriaFile";

/// Multipart field carrying candidate CVs (repeatable).
pub const CANDIDATES_FIELD: &str = "cvFiles[]";

/// Prefix of every per-request staging directory.
pub const STAGING_DIR_PREFIX: &str = "sift-";

/// Admission limits applied while staging an upload.
#[derive(Debug, Clone)]
pub struct UploadLimits {
    /// Maximum size of a single uploaded file, in bytes.
    pub max_file_size_bytes: u64,

    /// Maximum number of candidate files per request.
    pub max_candidate_files: usize,

    /// Lower-cased extensions accepted for upload.
    pub allowed_extensions: HashSet<String>,

    /// Directory under which per-request temp directories are created.
    /// `None` means the OS temp directory.
    pub staging_root: Option<PathBuf>,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_file_size_bytes: crate::config::DEFAULT_MAX_FILE_SIZE_BYTES,
            max_candidate_files: crate::config::DEFAULT_MAX_CANDIDATE_FILES,
            allowed_extensions: HashSet::from(["pdf".to_string()]),
            staging_root: None,
        }
    }
}

impl UploadLimits {
    /// Whole-request body cap derived from the per-file and count caps,
    /// with a little slack for form fields and multipart framing.
    pub fn max_body_bytes(&self) -> usize {
        let files =
            (self.max_candidate_files as u64 + 1).saturating_mul(self.max_file_size_bytes);
        usize::try_from(files.saturating_add(64 * 1024)).unwrap_or(usize::MAX)
    }
}

/// One file materialized on disk for the lifetime of a request.
pub struct StagedFile {
    /// Name as submitted by the client.
    pub original_name: String,

    /// Sanitized on-disk name.
    pub stored_name: String,

    /// Absolute path inside the request's staging directory.
    pub path: PathBuf,
}

/// Raw form fields submitted alongside the files. Not validated here.
#[derive(Default)]
pub struct UploadForm {
    pub api_key: Option<String>,
    pub model_name: Option<String>,
    pub min_rating: Option<String>,
    pub max_rating: Option<String>,
}

/// Everything staged for one request. Owns the temp directory.
pub struct StagedUpload {
    dir: TempDir,
    pub criteria: Vec<StagedFile>,
    pub candidates: Vec<StagedFile>,
    /// Original names of files skipped for having a disallowed extension.
    pub skipped: Vec<String>,
    pub form: UploadForm,
}

impl StagedUpload {
    /// Path of the request's staging directory.
    pub fn dir_path(&self) -> &Path {
        self.dir.path()
    }

    /// Removes the staging directory and everything in it.
    ///
    /// Consumes `self`, so removal can only happen once. Failures are logged,
    /// not propagated: by the time cleanup runs the response is already
    /// decided.
    pub fn cleanup(self) {
        let path = self.dir.path().to_path_buf();
        match self.dir.close() {
            Ok(()) => debug!(path = %path.display(), "removed staging directory"),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to remove staging directory");
            }
        }
    }
}

/// Walks the multipart stream once, staging accepted files and collecting the
/// raw form fields.
///
/// Files with a disallowed extension are skipped (recorded in
/// [`StagedUpload::skipped`]) and the rest of the request is still processed.
/// An oversized file or a candidate count above the cap rejects the whole
/// request. Field *values* are not validated here.
pub async fn stage_upload(
    mut multipart: Multipart,
    limits: &UploadLimits,
) -> Result<StagedUpload, StagingError> {
    let root = limits
        .staging_root
        .clone()
        .unwrap_or_else(std::env::temp_dir);
    let dir = TempDir::with_prefix_in(STAGING_DIR_PREFIX, &root)?;
    debug!(path = %dir.path().display(), "created staging directory");

    let mut staged = StagedUpload {
        dir,
        criteria: Vec::new(),
        candidates: Vec::new(),
        skipped: Vec::new(),
        form: UploadForm::default(),
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| StagingError::Multipart(e.to_string()))?
    {
        let field_name = field.name().unwrap_or("").to_string();
        match field_name.as_str() {
            CRITERIA_FIELD | CANDIDATES_FIELD => {
                let original_name = field.file_name().unwrap_or("").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| StagingError::Multipart(e.to_string()))?;

                if !has_allowed_extension(&original_name, &limits.allowed_extensions) {
                    warn!(file = %original_name, "skipping file with disallowed extension");
                    staged.skipped.push(original_name);
                    continue;
                }
                if bytes.len() as u64 > limits.max_file_size_bytes {
                    return Err(StagingError::FileTooLarge {
                        name: original_name,
                        limit: limits.max_file_size_bytes,
                    });
                }

                if field_name == CRITERIA_FIELD {
                    if !staged.criteria.is_empty() {
                        warn!(file = %original_name, "ignoring extra criteria file");
                        staged.skipped.push(original_name);
                        continue;
                    }
                    let file =
                        write_staged_file(staged.dir.path(), &original_name, &bytes).await?;
                    staged.criteria.push(file);
                } else {
                    if staged.candidates.len() >= limits.max_candidate_files {
                        return Err(StagingError::TooManyFiles {
                            limit: limits.max_candidate_files,
                        });
                    }
                    let file =
                        write_staged_file(staged.dir.path(), &original_name, &bytes).await?;
                    staged.candidates.push(file);
                }
            }
            "apiKey" => staged.form.api_key = Some(text_field(field).await?),
            "modelName" => staged.form.model_name = Some(text_field(field).await?),
            "minRating" => staged.form.min_rating = Some(text_field(field).await?),
            "maxRating" => staged.form.max_rating = Some(text_field(field).await?),
            other => debug!(field = other, "ignoring unexpected form field"),
        }
    }

    Ok(staged)
}

async fn text_field(field: axum::extract::multipart::Field<'_>) -> Result<String, StagingError> {
    field
        .text()
        .await
        .map_err(|e| StagingError::Multipart(e.to_string()))
}

fn has_allowed_extension(name: &str, allowed: &HashSet<String>) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| allowed.contains(&ext.to_ascii_lowercase()))
        .unwrap_or(false)
}

async fn write_staged_file(
    dir: &Path,
    original_name: &str,
    bytes: &[u8],
) -> Result<StagedFile, StagingError> {
    let base_name = sanitize(original_name);
    let mut stored_name = base_name.clone();
    let mut path = dir.join(&stored_name);

    // Two uploads can sanitize to the same name; suffix rather than overwrite.
    let mut attempt = 1u32;
    while tokio::fs::try_exists(&path).await? {
        stored_name = with_numeric_suffix(&base_name, attempt);
        path = dir.join(&stored_name);
        attempt += 1;
    }

    tokio::fs::write(&path, bytes).await?;
    debug!(file = %original_name, stored = %stored_name, "staged upload file");

    Ok(StagedFile {
        original_name: original_name.to_string(),
        stored_name,
        path,
    })
}

fn with_numeric_suffix(name: &str, n: u32) -> String {
    match name.rfind('.') {
        Some(idx) if idx > 0 => format!("{}_{}{}", &name[..idx], n, &name[idx..]),
        _ => format!("{name}_{n}"),
    }
}

use axum::{
    Json,
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{info, instrument};

use super::error::GatewayError;
use super::state::HandlerState;
use crate::evaluate::{self, EvalError, EvaluationRequest, GenerationBackend};
use crate::prompt;
use crate::staging::{StagedUpload, UploadForm, stage_upload};

/// Success body relayed to the caller.
#[derive(serde::Serialize)]
pub struct ProcessResponse {
    pub result: String,
}

/// Validated form fields for one request.
#[derive(Debug)]
struct ProcessForm {
    api_key: String,
    model_name: String,
    min_rating: i64,
    max_rating: i64,
}

/// One screening request, end to end: stage the upload, validate, build the
/// prompt, run the evaluation, map the outcome — and remove the staging
/// directory on every path before the response leaves.
#[instrument(skip(state, multipart))]
pub async fn process_handler<P>(
    State(state): State<HandlerState<P>>,
    multipart: Multipart,
) -> Response
where
    P: GenerationBackend + Clone + Send + Sync + 'static,
{
    let staged = match stage_upload(multipart, &state.limits).await {
        Ok(staged) => staged,
        Err(e) => return GatewayError::from(e).into_response(),
    };

    let outcome = run_pipeline(&state, &staged).await;

    // Explicit removal on the success and failure paths; `Drop` on
    // `StagedUpload` covers cancelled requests and panics.
    staged.cleanup();

    match outcome {
        Ok(result) => (StatusCode::OK, Json(ProcessResponse { result })).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn run_pipeline<P>(
    state: &HandlerState<P>,
    staged: &StagedUpload,
) -> Result<String, GatewayError>
where
    P: GenerationBackend + Clone + Send + Sync + 'static,
{
    let form = validate_form(&staged.form)?;
    validate_files(staged)?;

    let prompt = prompt::build(form.min_rating, form.max_rating);
    let candidate_paths: Vec<_> = staged.candidates.iter().map(|f| f.path.clone()).collect();

    info!(
        model = %form.model_name,
        candidates = candidate_paths.len(),
        "starting evaluation"
    );

    let request = EvaluationRequest {
        criteria_path: &staged.criteria[0].path,
        candidate_paths: &candidate_paths,
        prompt: &prompt,
        model: &form.model_name,
        api_key: &form.api_key,
    };

    let evaluation = tokio::time::timeout(
        state.provider_timeout,
        evaluate::evaluate(&state.backend, request),
    )
    .await
    .map_err(|_| EvalError::Timeout(state.provider_timeout.as_secs()))??;

    Ok(evaluation.text)
}

fn validate_form(form: &UploadForm) -> Result<ProcessForm, GatewayError> {
    let mut problems: Vec<&str> = Vec::new();

    let api_key = non_blank(&form.api_key);
    if api_key.is_none() {
        problems.push("API Key is missing");
    }
    let model_name = non_blank(&form.model_name);
    if model_name.is_none() {
        problems.push("Model Name is missing");
    }
    let max_raw = non_blank(&form.max_rating);
    if max_raw.is_none() {
        problems.push("Maximum Rating is missing");
    }
    let min_raw = non_blank(&form.min_rating);
    if min_raw.is_none() {
        problems.push("Minimum Rating is missing");
    }

    let mut min_rating = 0i64;
    let mut max_rating = 0i64;
    if let (Some(min_raw), Some(max_raw)) = (&min_raw, &max_raw) {
        match (min_raw.parse::<i64>(), max_raw.parse::<i64>()) {
            (Ok(min), Ok(max)) => {
                if min >= max {
                    problems.push("Minimum rating must be smaller than Maximum rating");
                }
                min_rating = min;
                max_rating = max;
            }
            _ => problems.push("Max/Min Rating must be numbers"),
        }
    }

    if !problems.is_empty() {
        return Err(GatewayError::InvalidForm(problems.join(". ")));
    }

    Ok(ProcessForm {
        api_key: api_key.unwrap_or_default(),
        model_name: model_name.unwrap_or_default(),
        min_rating,
        max_rating,
    })
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn validate_files(staged: &StagedUpload) -> Result<(), GatewayError> {
    if staged.criteria.is_empty() {
        return Err(GatewayError::MissingFiles(with_skipped_note(
            "Criteria file is missing or was not uploaded successfully.",
            staged,
        )));
    }
    if staged.candidates.is_empty() {
        return Err(GatewayError::MissingFiles(with_skipped_note(
            "No CV files were uploaded successfully.",
            staged,
        )));
    }
    Ok(())
}

fn with_skipped_note(message: &str, staged: &StagedUpload) -> String {
    if staged.skipped.is_empty() {
        message.to_string()
    } else {
        format!(
            "{message} Files skipped for a disallowed extension: {}.",
            staged.skipped.join(", ")
        )
    }
}

//! Job submission and polling handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::info;
use validator::Validate;

use vmerge_models::{Job, JobId, SubmitJobRequest, SubmitJobResponse};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Accept a job and start it in the background.
///
/// Responds 202 with the job ID as soon as the job is registered.
pub async fn submit_job(
    State(state): State<AppState>,
    payload: Result<Json<SubmitJobRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SubmitJobResponse>)> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    request.validate()?;

    let job_id = state.orchestrator.submit(request).await;
    info!(job_id = %job_id, "Job submitted");

    Ok((StatusCode::ACCEPTED, Json(SubmitJobResponse { job_id })))
}

/// Current state of a job.
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<Job>> {
    let id = JobId::from_string(job_id);
    state
        .orchestrator
        .registry()
        .get(&id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Job {id} not found")))
}

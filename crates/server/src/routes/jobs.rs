use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use deploy_core::Job;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::state::AppState;

/// A job as posted by the evaluator: the job fields plus the shared secret.
#[derive(Deserialize, ToSchema)]
pub struct JobSubmission {
    pub secret: String,
    #[serde(flatten)]
    pub job: Job,
}

#[derive(Serialize, ToSchema)]
pub struct AcceptedResponse {
    status: String,
}

#[utoipa::path(
    post,
    path = "/api-endpoint",
    request_body = JobSubmission,
    responses(
        (status = 202, description = "Job accepted and started", body = AcceptedResponse),
        (status = 400, description = "Malformed JSON or invalid job"),
        (status = 403, description = "Secret mismatch")
    ),
    tag = "jobs"
)]
pub async fn submit_job(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<AcceptedResponse>), AppError> {
    let mut payload: Value = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid JSON: {}", e)))?;

    let secret = payload
        .as_object_mut()
        .and_then(|fields| fields.remove("secret"))
        .and_then(|secret| secret.as_str().map(str::to_string))
        .unwrap_or_default();
    if !state.secret_matches(&secret) {
        warn!("Rejected job submission with invalid secret");
        return Err(AppError::Forbidden("Invalid secret".to_string()));
    }

    let job: Job = serde_json::from_value(payload)
        .map_err(|e| AppError::BadRequest(format!("Invalid job: {}", e)))?;
    job.validate()?;

    info!(task = %job.task_id, round = job.round, "Job accepted");

    let orchestrator = state.orchestrator.clone();
    tokio::spawn(async move {
        orchestrator.run(job).await;
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(AcceptedResponse {
            status: "accepted".to_string(),
        }),
    ))
}

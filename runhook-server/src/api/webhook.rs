//! Webhook API Handler
//!
//! Every POST outside the fixed routes is a run task webhook. The request
//! path, percent-decoded, names the script to run relative to the server's
//! base directory, and the `shasum` query parameter carries its expected
//! digest.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{Method, Uri},
};
use runhook_core::domain::job::JobDescription;
use serde::Deserialize;

use crate::api::AppState;
use crate::api::error::{ApiError, ApiResult};
use crate::service::intake;

#[derive(Debug, Default, Deserialize)]
pub struct WebhookQuery {
    #[serde(default)]
    pub shasum: String,
}

/// POST /{*script_path}?shasum=<algorithm>:<hex>
/// Validate the script and queue a job for the worker
pub async fn receive_webhook(
    State(state): State<AppState>,
    Path(script_path): Path<String>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> ApiResult<&'static str> {
    if method != Method::POST {
        return Err(ApiError::MethodNotAllowed);
    }

    let description: JobDescription = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("Error parsing JSON payload: {}", e)))?;

    let Query(query) = Query::<WebhookQuery>::try_from_uri(&uri)
        .map_err(|e| ApiError::BadRequest(format!("Invalid query string: {}", e)))?;

    tracing::debug!(
        "Webhook for script {} (run {})",
        script_path,
        description.run_id
    );

    intake::handle_payload(
        &state.validator,
        &state.queue,
        &script_path,
        &query.shasum,
        description,
    )
    .await?;

    Ok("200 OK")
}

/// Requests that name no script at all
pub async fn missing_script(method: Method) -> ApiError {
    if method != Method::POST {
        return ApiError::MethodNotAllowed;
    }
    ApiError::BadRequest("Invalid script path: no script named".to_string())
}

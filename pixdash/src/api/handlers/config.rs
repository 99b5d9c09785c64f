//! HTTP handler for the sanitized configuration endpoint.

use axum::{extract::State, response::Json};

use crate::{AppState, api::models::config::ConfigResponse};

/// Get sanitized configuration metadata
#[utoipa::path(
    get,
    path = "/config",
    tag = "config",
    summary = "Get sanitized configuration metadata",
    description = "The configuration subset a filter UI needs. Connection strings and other \
                   secrets are never included.",
    responses(
        (status = 200, description = "Sanitized configuration", body = ConfigResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_config(State(state): State<AppState>) -> Json<ConfigResponse> {
    Json(ConfigResponse::from(&state.config))
}

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;
use wykra_insight::Insight;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};
use crate::middleware::RequestId;

#[derive(Debug, Deserialize)]
pub(super) struct AnalysisQuery {
    profile: Option<String>,
}

/// `GET /api/v1/instagram/analysis?profile=<handle>`
///
/// A missing `profile` goes through handle validation like any other bad
/// input, so it is reported as `invalid_handle` at the `received` stage.
pub(super) async fn analyze_profile(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<AnalysisQuery>,
) -> Result<Json<ApiResponse<Insight>>, ApiError> {
    let profile = query.profile.unwrap_or_default();
    tracing::info!(request_id = %req_id.0, profile = %profile, "analysis requested");

    match state.orchestrator.analyze(&profile).await {
        Ok(insight) => Ok(Json(ApiResponse {
            data: insight,
            meta: ResponseMeta::new(req_id.0),
        })),
        Err(err) => {
            if err.kind() == wykra_core::ErrorKind::ConfigurationError {
                tracing::error!(request_id = %req_id.0, error = %err, "analysis misconfigured");
            }
            Err(ApiError::from_analysis(req_id.0, &err))
        }
    }
}

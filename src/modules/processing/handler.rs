use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use tracing::warn;

use super::dto::{PushRequest, decode_video_message};
use super::model::ProcessedVideo;
use crate::common::response::{ApiError, ApiResponse, ApiSuccess};
use crate::state::AppState;

/// Process a raw video announced by a push message
#[utoipa::path(
    post,
    path = "/process-video",
    request_body = PushRequest,
    responses(
        (status = 200, description = "Video processed successfully", body = ApiResponse<ProcessedVideo>),
        (status = 400, description = "Invalid data"),
        (status = 500, description = "Error processing video")
    ),
    tag = "Processing"
)]
pub async fn process_video(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    let message = match decode_video_message(&body) {
        Ok(message) => message,
        Err(e) => {
            warn!(error = %e, "Invalid data");
            return ApiError("Invalid data".to_string(), StatusCode::BAD_REQUEST)
                .into_response();
        }
    };

    match state.orchestrator.process_job(&message.name).await {
        Ok(video) => ApiSuccess(
            ApiResponse::success(video, "Video processed successfully"),
            StatusCode::OK,
        )
        .into_response(),
        Err(e) => ApiError::from(&e).into_response(),
    }
}

/// Liveness probe
#[utoipa::path(
    get,
    path = "/api/v1/health",
    responses(
        (status = 200, description = "Service is up", body = String)
    ),
    tag = "Processing"
)]
pub async fn health() -> &'static str {
    "ok"
}

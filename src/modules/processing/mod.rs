use axum::Router;
use axum::routing::{get, post};

use crate::state::AppState;

pub mod dto;
pub mod error;
pub mod gateway;
pub mod handler;
pub mod model;
pub mod retry;
pub mod service;
pub mod workspace;

pub use error::{ProcessingError, ProcessingResult};
pub use gateway::ArtifactGateway;
pub use service::{JobOrchestrator, PipelineSettings};
pub use workspace::Workspace;

pub fn router() -> Router<AppState> {
    Router::new().route("/process-video", post(handler::process_video))
}

pub fn health_router() -> Router<AppState> {
    Router::new().route("/health", get(handler::health))
}

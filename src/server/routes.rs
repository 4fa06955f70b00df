use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Router,
};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::error::{AppError, Result};
use crate::pipeline::PublishPipeline;
use crate::sources::ami;

#[derive(Clone)]
pub struct AdminState {
    pub pipeline: Arc<PublishPipeline>,
    pub config_path: PathBuf,
}

async fn health_check() -> StatusCode {
    StatusCode::OK
}

async fn ready_check(State(state): State<AdminState>) -> StatusCode {
    if state.pipeline.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

async fn reload(State(state): State<AdminState>) -> Result<(StatusCode, String)> {
    let pipeline = Arc::clone(&state.pipeline);
    let path = state.config_path.clone();
    tokio::task::spawn_blocking(move || pipeline.reload_from_file(&path))
        .await
        .map_err(|e| AppError::Config(format!("reload task failed: {}", e)))??;

    let version = state
        .pipeline
        .snapshot()
        .map(|snapshot| snapshot.version)
        .unwrap_or_default();
    Ok((StatusCode::OK, format!("reloaded configuration v{}", version)))
}

pub fn create_router(
    pipeline: Arc<PublishPipeline>,
    config_path: PathBuf,
    events_path: &str,
) -> Router {
    let admin = AdminState {
        pipeline: Arc::clone(&pipeline),
        config_path,
    };

    let router = Router::new()
        .route("/-/healthz", get(health_check))
        .route("/-/ready", get(ready_check))
        .route("/-/reload", post(reload))
        .with_state(admin);

    ami::register_ami_routes(router, events_path, pipeline).layer(TraceLayer::new_for_http())
}

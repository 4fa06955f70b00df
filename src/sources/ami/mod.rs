pub mod handler;

use axum::{routing::post, Router};
use std::sync::Arc;

use crate::pipeline::PublishPipeline;
use handler::{handle_ami_event, AmiSourceState};

/// Mounts the AMI event endpoint at `path`.
pub fn register_ami_routes(router: Router, path: &str, pipeline: Arc<PublishPipeline>) -> Router {
    let state = Arc::new(AmiSourceState { pipeline });

    let router = router.route(path, post(handle_ami_event).with_state(state));

    tracing::info!("Registered AMI event endpoint at: {}", path);

    router
}

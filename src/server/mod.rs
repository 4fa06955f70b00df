pub mod routes;

use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::error::Result;
use crate::pipeline::PublishPipeline;

pub async fn run_server(
    server: &ServerConfig,
    pipeline: Arc<PublishPipeline>,
    config_path: PathBuf,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let router = routes::create_router(pipeline, config_path, &server.events_path);

    let addr = SocketAddr::from(([0, 0, 0, 0], server.port()));
    let listener = TcpListener::bind(addr).await?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

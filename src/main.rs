use ami_kafka::{
    config::{AppConfig, ServerConfig},
    identity::SystemIdentity,
    pipeline::{producer::default_factory, PublishPipeline},
    server::run_server,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

    let use_ansi = atty::is(atty::Stream::Stdout);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("ami_kafka={},tower_http=debug", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_ansi(use_ansi))
        .init();

    let config_path = PathBuf::from(AppConfig::config_path());
    let config = match AppConfig::from_file(&config_path) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::error!("{}; publishing stays disabled until a successful reload", e);
            None
        }
    };

    let identity = match &config {
        Some(config) => SystemIdentity::from_config(&config.system)?,
        None => SystemIdentity::from_config(&Default::default())?,
    };
    tracing::info!(
        "Entity ID {}, system name {}",
        identity.entity_id,
        identity.system_name().unwrap_or("<unset>")
    );

    let pipeline = Arc::new(PublishPipeline::new(Arc::new(identity), default_factory()));
    if let Some(config) = &config {
        if let Err(e) = pipeline.reload(config) {
            tracing::error!("Configuration failed to load: {}", e);
        }
    }

    #[cfg(unix)]
    spawn_reload_on_hangup(Arc::clone(&pipeline), config_path.clone())?;

    let server = config
        .map(|config| config.server)
        .unwrap_or_else(ServerConfig::default);

    run_server(&server, Arc::clone(&pipeline), config_path, shutdown_signal()).await?;

    pipeline.flush(Duration::from_secs(5));
    tracing::info!("Stopped");

    Ok(())
}

#[cfg(unix)]
fn spawn_reload_on_hangup(pipeline: Arc<PublishPipeline>, path: PathBuf) -> anyhow::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = signal(SignalKind::hangup())?;
    tokio::spawn(async move {
        while hangup.recv().await.is_some() {
            tracing::info!("SIGHUP received, reloading {}", path.display());
            let pipeline = Arc::clone(&pipeline);
            let path = path.clone();
            // failures are logged by the pipeline
            let _ = tokio::task::spawn_blocking(move || pipeline.reload_from_file(&path)).await;
        }
    });

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

use tracing::info;

use mailhub_dead_letter::infrastructure::config::Config;
use mailhub_dead_letter::infrastructure::logger::init_logger;
use mailhub_dead_letter::DeadLetterService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Config
    let config_path =
        std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/config.yaml".to_string());
    let cfg = Config::load(&config_path)?;

    init_logger(&cfg.app.environment, &cfg.logging.format);

    info!(
        app_name = %cfg.app.name,
        version = %cfg.app.version,
        environment = %cfg.app.environment,
        alert_threshold = cfg.dlq.alert_threshold,
        cleanup_interval_ms = cfg.dlq.cleanup_interval_ms,
        "starting dead letter service"
    );

    let service = DeadLetterService::connect(&cfg).await?;
    service.start().await;

    let signal_result = shutdown_signal().await;
    service.shutdown().await;
    signal_result?;

    info!("dead letter service exited");
    Ok(())
}

async fn shutdown_signal() -> anyhow::Result<()> {
    use tokio::signal;

    #[cfg(unix)]
    let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())?;

    #[cfg(unix)]
    let terminate = async move {
        terminate.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        result = signal::ctrl_c() => result?,
        () = terminate => {},
    }
    info!("shutdown signal received");
    Ok(())
}

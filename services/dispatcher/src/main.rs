use std::env;
use std::path::PathBuf;

use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_owned());
    tracing_subscriber::fmt().with_env_filter(EnvFilter::new(log_level)).init();

    let config_path = env::var("DISPATCHER_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/etc/bermudafunk/dispatcher.toml"));
    let config = dispatcher::config::load_config_from_path(&config_path).unwrap_or_else(|e| {
        eprintln!("FATAL: failed to load config from {}: {e}", config_path.display());
        std::process::exit(1);
    });

    let service = dispatcher::build(&config).await.unwrap_or_else(|e| {
        eprintln!("FATAL: failed to start dispatcher: {e}");
        std::process::exit(1);
    });
    info!(studios = service.studios_by_name.len(), "dispatcher started");

    let button_feed = tokio::spawn(dispatcher::buttons::run_stdin_feed(
        service.studios_by_name.clone(),
        service.button_tx.clone(),
    ));

    shutdown_signal().await;
    button_feed.abort();

    // spec.md §5 "Cancellation" step 4: cancel the protocol-client push
    // task and close the transport.
    service.push_task.abort();
    drop(service.client);

    info!("shutting down: cancelling timers and saving state");
    service.dispatcher.cancel_timers().await;
    if let Err(e) = service.dispatcher.save().await {
        tracing::error!(error = %e, "failed to persist dispatcher state on shutdown");
    }
    info!("dispatcher shut down gracefully");
}

/// Waits for SIGTERM or Ctrl-C (SIGINT) and returns to trigger graceful
/// shutdown (spec.md §5 "Cancellation").
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => { info!("received Ctrl+C, shutting down"); },
        _ = terminate => { info!("received SIGTERM, shutting down"); },
    }
}

//! Serve command - run the relay until a shutdown signal

use anyhow::Result;
use relay::Relay;
use relay_config::Config;
use tokio::signal;
use tracing::{error, info};

/// Run the serve command
pub async fn run(config: Config) -> Result<()> {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        listen = %config.source.bind_address(),
        publisher = config.publisher.kind(),
        "relay starting"
    );

    let relay = match Relay::build(config).await {
        Ok(relay) => relay,
        Err(e) => {
            error!(error = %e, "failed to start relay");
            return Err(e);
        }
    };
    info!(address = %relay.local_addr()?, "syslog listener ready");

    let summary = match relay.run(wait_for_shutdown()).await {
        Ok(summary) => summary,
        Err(e) => {
            error!(error = %e, "relay stopped on error");
            return Err(e);
        }
    };

    info!(
        received = summary.received,
        published = summary.published,
        rejected = summary.rejected,
        dead_lettered = summary.dead_lettered,
        dropped = summary.dropped,
        "relay shutdown complete"
    );
    Ok(())
}

/// Wait for SIGINT or SIGTERM
async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

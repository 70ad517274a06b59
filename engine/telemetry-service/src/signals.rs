//! Signal handling for graceful shutdown

use anyhow::Result;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::service::ServiceState;

type ShutdownSender = Arc<Mutex<Option<oneshot::Sender<()>>>>;

fn notify(sender: &ShutdownSender) {
    if let Some(tx) = sender.lock().take() {
        let _ = tx.send(());
    }
}

/// Setup signal handlers for graceful shutdown. The receiver completes on
/// the first of Ctrl+C or SIGTERM.
pub fn setup_signal_handlers() -> Result<oneshot::Receiver<()>> {
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let shutdown_tx: ShutdownSender = Arc::new(Mutex::new(Some(shutdown_tx)));

    // Handle Ctrl+C (SIGINT)
    {
        let shutdown_tx = Arc::clone(&shutdown_tx);
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl+C signal: {}", e);
                return;
            }

            info!("Ctrl+C signal received");
            notify(&shutdown_tx);
        });
    }

    // Handle SIGTERM (Unix only)
    #[cfg(unix)]
    {
        use signal_hook::consts::SIGTERM;
        use std::sync::atomic::{AtomicBool, Ordering};

        let shutdown_flag = Arc::new(AtomicBool::new(false));
        signal_hook::flag::register(SIGTERM, Arc::clone(&shutdown_flag))?;

        tokio::spawn(async move {
            // Poll for signal
            loop {
                if shutdown_flag.load(Ordering::Relaxed) {
                    info!("SIGTERM signal received");
                    notify(&shutdown_tx);
                    break;
                }
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        });
    }

    Ok(shutdown_rx)
}

/// Stop all streams and wait for the streaming task to drain
pub async fn graceful_shutdown(
    service_state: Arc<ServiceState>,
    stream_handle: tokio::task::JoinHandle<Result<u64>>,
) -> Result<()> {
    info!("Starting graceful shutdown...");

    service_state.stop_streams();

    let shutdown_timeout = Duration::from_secs(service_state.config.service.shutdown_timeout_secs);
    match timeout(shutdown_timeout, stream_handle).await {
        Ok(Ok(Ok(delivered))) => {
            info!("Telemetry stream stopped after {} payloads", delivered);
        }
        Ok(Ok(Err(e))) => {
            error!("Telemetry stream failed: {}", e);
        }
        Ok(Err(e)) => {
            error!("Telemetry stream task failed: {}", e);
        }
        Err(_) => {
            warn!("Telemetry stream did not stop within timeout, forcing shutdown");
        }
    }

    service_state.shutdown();

    info!("Graceful shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceConfig;

    #[tokio::test]
    async fn test_graceful_shutdown_drains_stream() {
        let mut config = ServiceConfig::default();
        config.stream.interval_ms = 10;
        let state = Arc::new(ServiceState::new(config).unwrap());

        let stream_handle = {
            let state = Arc::clone(&state);
            tokio::spawn(async move { state.run_stream(None, std::io::sink()).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        graceful_shutdown(Arc::clone(&state), stream_handle).await.unwrap();
        assert_eq!(state.driver.active_streams(), 0);
    }
}

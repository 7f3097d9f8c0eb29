//! Graceful shutdown signal handling.

use tokio::signal::ctrl_c;
#[cfg(unix)]
use tokio::signal::unix;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::TRACING_TARGET_SHUTDOWN;

/// Cancels `cancel_token` on the first SIGTERM or SIGINT/Ctrl+C.
pub fn spawn_signal_listener(cancel_token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            () = shutdown_signal() => cancel_token.cancel(),
            () = cancel_token.cancelled() => {}
        }
    })
}

/// Waits for a shutdown signal (SIGTERM or SIGINT/Ctrl+C).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            tracing::error!(
                target: TRACING_TARGET_SHUTDOWN,
                error = %e,
                "Failed to install Ctrl+C handler"
            );
            std::future::pending::<()>().await;
        } else {
            tracing::info!(
                target: TRACING_TARGET_SHUTDOWN,
                "Received Ctrl+C signal, initiating graceful shutdown"
            );
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match unix::signal(unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
                tracing::info!(
                    target: TRACING_TARGET_SHUTDOWN,
                    "Received SIGTERM signal, initiating graceful shutdown"
                );
            }
            Err(e) => {
                tracing::error!(
                    target: TRACING_TARGET_SHUTDOWN,
                    error = %e,
                    "Failed to install SIGTERM handler"
                );
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}

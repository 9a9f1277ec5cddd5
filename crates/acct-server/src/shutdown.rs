//! Process signal handling

use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Resolve on Ctrl+C, or SIGTERM on unix.
///
/// If a handler cannot be installed that signal is never reported.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), shutting down");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down");
        },
    }
}

/// Token cancelled once [`shutdown_signal`] resolves.
///
/// Must be called from within a tokio runtime.
pub fn spawn_signal_listener() -> CancellationToken {
    let token = CancellationToken::new();
    let cancel = token.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        cancel.cancel();
    });
    token
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_listener_starts_uncancelled() {
        let token = spawn_signal_listener();
        tokio::task::yield_now().await;
        assert!(!token.is_cancelled());
    }
}

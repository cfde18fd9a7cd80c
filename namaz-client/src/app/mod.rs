pub mod agent;
pub mod commands;

use tracing::{info, warn};

pub(crate) async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match (
            signal(SignalKind::interrupt()),
            signal(SignalKind::terminate()),
        ) {
            (Ok(mut sigint), Ok(mut sigterm)) => {
                tokio::select! {
                    _ = sigint.recv() => {
                        info!("shutdown: received SIGINT");
                    }
                    _ = sigterm.recv() => {
                        info!("shutdown: received SIGTERM");
                    }
                }
                return;
            }
            (Err(e), _) | (_, Err(e)) => {
                warn!(error=%e, "failed to install unix signal handlers; using Ctrl+C only");
            }
        }
    }
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown: received Ctrl+C");
}

//! Termination signal handling.

use tokio::signal;
use tracing::info;

/// Waits for a termination signal and returns its name.
///
/// Listens for SIGINT and SIGTERM on Unix, Ctrl+C elsewhere.
pub async fn wait_for_shutdown_signal() -> std::io::Result<&'static str> {
    #[cfg(unix)]
    {
        use signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;

        let name = tokio::select! {
            _ = sigint.recv() => "SIGINT",
            _ = sigterm.recv() => "SIGTERM",
        };
        info!("📡 Received {}", name);
        Ok(name)
    }

    #[cfg(not(unix))]
    {
        signal::ctrl_c().await?;
        info!("📡 Received Ctrl+C");
        Ok("Ctrl+C")
    }
}

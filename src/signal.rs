//! # OS stop-signal handling.
//!
//! [`wait_for_stop_signal`] is the default locker: it completes when the
//! process receives a termination signal.
//!
//! **Unix:** `SIGTERM` (kill default, systemd/Kubernetes) or `SIGINT`
//! (Ctrl-C). **Other platforms:** Ctrl-C via [`tokio::signal::ctrl_c`].

/// Waits for a termination signal.
///
/// Each call creates independent signal listeners. Returns `Ok(())` when
/// a signal is received, or `Err` if listener registration fails.
#[cfg(unix)]
pub async fn wait_for_stop_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = sigterm.recv() => {},
        _ = sigint.recv() => {},
    }
    Ok(())
}

/// Waits for a termination signal.
///
/// Each call creates independent signal listeners. Returns `Ok(())` when
/// a signal is received, or `Err` if listener registration fails.
#[cfg(not(unix))]
pub async fn wait_for_stop_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}

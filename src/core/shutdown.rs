//! Termination signals for [`Supervisor::run_until_signal`](crate::Supervisor::run_until_signal).
//!
//! Unix listens for `SIGINT`, `SIGTERM` and `SIGQUIT`; other platforms for Ctrl-C.

/// Resolves once the process is asked to terminate.
///
/// Fails only if the signal handlers cannot be registered.
#[cfg(unix)]
pub(crate) async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let mut quit = signal(SignalKind::quit())?;

    tokio::select! {
        _ = interrupt.recv() => {},
        _ = terminate.recv() => {},
        _ = quit.recv() => {},
    }
    Ok(())
}

/// Resolves once the process is asked to terminate.
#[cfg(not(unix))]
pub(crate) async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}

//! SIGINT/SIGTERM as a shared cancellation flag.

use tokio::sync::watch;

/// Set once a termination signal arrives. Stages before publishing race
/// against [`Shutdown::requested`]; publishing polls
/// [`Shutdown::is_requested`] between artifacts so a replacement in flight
/// always completes under the lock.
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    /// Install the signal handlers on a background task.
    #[must_use]
    pub fn listen() -> Self {
        let (tx, rx) = watch::channel(false);
        tokio::spawn(async move {
            shutdown_signal().await;
            let _ = tx.send(true);
        });
        Self { rx }
    }

    /// A flag that never changes.
    #[cfg(test)]
    #[must_use]
    pub fn fixed(set: bool) -> Self {
        let (_tx, rx) = watch::channel(set);
        Self { rx }
    }

    #[must_use]
    pub fn is_requested(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once a signal has arrived. Never resolves otherwise.
    pub async fn requested(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|&set| set).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let (Ok(mut sigterm), Ok(mut sigint)) =
            (signal(SignalKind::terminate()), signal(SignalKind::interrupt()))
        else {
            tracing::warn!("cannot install signal handlers; interrupts will not be reported");
            return std::future::pending().await;
        };
        tokio::select! {
            _ = sigterm.recv() => tracing::warn!("received SIGTERM"),
            _ = sigint.recv() => tracing::warn!("received SIGINT"),
        }
    }
    #[cfg(not(unix))]
    {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

//! Shutdown coordination for the relay.

use tokio::sync::broadcast;

use crate::lifecycle::signals::shutdown_signal;

/// Broadcasts a single stop notice to the server and any helper tasks.
///
/// Tests use it to stop a server they spawned; `main` relies on OS signals
/// through [`until_shutdown`].
#[derive(Debug)]
pub struct Shutdown {
    notify: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (notify, _) = broadcast::channel(1);
        Self { notify }
    }

    /// New receiver; only notices sent after this call are observed.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.notify.subscribe()
    }

    /// Notify every subscriber. No-op when nobody listens.
    pub fn trigger(&self) {
        let _ = self.notify.send(());
    }

    /// Number of tasks still listening.
    pub fn receiver_count(&self) -> usize {
        self.notify.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves on the first of: a triggered [`Shutdown`], its sender being
/// dropped, or an OS stop signal.
pub async fn until_shutdown(mut notice: broadcast::Receiver<()>) {
    tokio::select! {
        _ = notice.recv() => tracing::info!("Shutdown requested"),
        _ = shutdown_signal() => {},
    }
}

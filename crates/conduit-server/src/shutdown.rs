//! Graceful shutdown.
//!
//! Both halves are `watch` channels: [`ShutdownSignal`] flips a flag once and
//! every clone observes it, [`ConnectionTracker`] publishes the number of
//! connections still being served so the server can wait for zero.

use std::sync::Arc;

use tokio::sync::watch;

/// A one-shot, cloneable shutdown trigger.
///
/// ```rust
/// use conduit_server::ShutdownSignal;
///
/// let shutdown = ShutdownSignal::new();
/// let observer = shutdown.clone();
/// shutdown.trigger();
/// assert!(observer.is_shutdown());
/// ```
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    fired: Arc<watch::Sender<bool>>,
}

impl ShutdownSignal {
    /// Creates an untriggered signal.
    #[must_use]
    pub fn new() -> Self {
        let (fired, _) = watch::channel(false);
        Self { fired: Arc::new(fired) }
    }

    /// Creates a signal triggered by SIGINT or SIGTERM.
    ///
    /// Must be called inside a tokio runtime.
    #[must_use]
    pub fn with_os_signals() -> Self {
        let signal = Self::new();
        let trigger = signal.clone();
        tokio::spawn(async move {
            wait_for_os_signal().await;
            trigger.trigger();
        });
        signal
    }

    /// Triggers shutdown. Returns `false` if it had already been triggered.
    pub fn trigger(&self) -> bool {
        self.fired.send_if_modified(|fired| !std::mem::replace(fired, true))
    }

    /// Returns `true` once triggered.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        *self.fired.borrow()
    }

    /// Resolves when shutdown is triggered, immediately if it already was.
    pub async fn recv(&self) {
        let mut fired = self.fired.subscribe();
        // The sender lives as long as `self`, so this only returns once the flag is set.
        let _ = fired.wait_for(|fired| *fired).await;
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

async fn wait_for_os_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(mut term), Ok(mut int)) => {
                let name = tokio::select! {
                    _ = term.recv() => "SIGTERM",
                    _ = int.recv() => "SIGINT",
                };
                tracing::info!(signal = name, "shutdown requested");
                return;
            }
            (Err(err), _) | (_, Err(err)) => {
                tracing::warn!(error = %err, "unix signal handlers unavailable, using ctrl-c");
            }
        }
    }

    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "ctrl-c handler unavailable, only a programmatic trigger stops the server");
        std::future::pending::<()>().await;
    }
    tracing::info!(signal = "ctrl-c", "shutdown requested");
}

/// Counts live connections.
///
/// ```rust
/// use conduit_server::ConnectionTracker;
///
/// let tracker = ConnectionTracker::new();
/// let token = tracker.acquire();
/// assert_eq!(tracker.active_connections(), 1);
/// drop(token);
/// assert_eq!(tracker.active_connections(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct ConnectionTracker {
    live: Arc<watch::Sender<usize>>,
}

impl ConnectionTracker {
    /// Creates a tracker with no connections.
    #[must_use]
    pub fn new() -> Self {
        let (live, _) = watch::channel(0);
        Self { live: Arc::new(live) }
    }

    /// Registers a connection until the token is dropped.
    #[must_use]
    pub fn acquire(&self) -> ConnectionToken {
        self.live.send_modify(|live| *live += 1);
        ConnectionToken {
            live: Arc::clone(&self.live),
        }
    }

    /// Returns the number of live connections.
    #[must_use]
    pub fn active_connections(&self) -> usize {
        *self.live.borrow()
    }

    /// Resolves once no connection is live.
    pub async fn wait_idle(&self) {
        let mut live = self.live.subscribe();
        let _ = live.wait_for(|live| *live == 0).await;
    }
}

impl Default for ConnectionTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Held for the lifetime of one connection.
#[derive(Debug)]
pub struct ConnectionToken {
    live: Arc<watch::Sender<usize>>,
}

impl Drop for ConnectionToken {
    fn drop(&mut self) {
        self.live.send_modify(|live| *live = live.saturating_sub(1));
    }
}

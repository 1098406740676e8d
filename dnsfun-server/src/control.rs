//! Control messages and the signal handlers that produce them.
//!
//! | signal                                   | message         |
//! |------------------------------------------|-----------------|
//! | `SIGINT`, `SIGTERM`, `SIGHUP`, `SIGQUIT` | `Terminate`     |
//! | `SIGUSR1`                                | `ForceSnapshot` |

use tokio::sync::mpsc;

use crate::error::ServerError;

/// What the snapshot loop should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMessage {
    /// Persist every snapshot-enabled service, then keep serving.
    ForceSnapshot,
    /// Persist every snapshot-enabled service, then exit.
    Terminate,
}

impl ControlMessage {
    pub fn ends_process(self) -> bool {
        matches!(self, ControlMessage::Terminate)
    }
}

/// Signal handlers. Installed before the socket is bound; a signal that
/// arrives before that gets the default action.
#[cfg(unix)]
pub struct Signals {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
    hangup: tokio::signal::unix::Signal,
    quit: tokio::signal::unix::Signal,
    user1: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl Signals {
    /// Must be called from within a tokio runtime.
    pub fn install() -> Result<Self, ServerError> {
        use tokio::signal::unix::{signal, SignalKind};

        use crate::error::io_err;

        let install = |kind: SignalKind, name: &str| {
            signal(kind).map_err(|e| io_err(format!("installing {name} handler"), e))
        };
        Ok(Self {
            interrupt: install(SignalKind::interrupt(), "SIGINT")?,
            terminate: install(SignalKind::terminate(), "SIGTERM")?,
            hangup: install(SignalKind::hangup(), "SIGHUP")?,
            quit: install(SignalKind::quit(), "SIGQUIT")?,
            user1: install(SignalKind::user_defined1(), "SIGUSR1")?,
        })
    }

    /// Forward signals to `tx` until a terminating signal has been sent or
    /// the receiver is gone.
    pub async fn forward(mut self, tx: mpsc::Sender<ControlMessage>) {
        loop {
            let (name, message) = tokio::select! {
                _ = self.interrupt.recv() => ("SIGINT", ControlMessage::Terminate),
                _ = self.terminate.recv() => ("SIGTERM", ControlMessage::Terminate),
                _ = self.hangup.recv() => ("SIGHUP", ControlMessage::Terminate),
                _ = self.quit.recv() => ("SIGQUIT", ControlMessage::Terminate),
                _ = self.user1.recv() => ("SIGUSR1", ControlMessage::ForceSnapshot),
            };
            tracing::info!(signal = name, ?message, "signal received");
            if tx.send(message).await.is_err() || message.ends_process() {
                break;
            }
        }
    }
}

/// Without unix signals only ctrl-c is available, and it terminates.
#[cfg(not(unix))]
pub struct Signals;

#[cfg(not(unix))]
impl Signals {
    pub fn install() -> Result<Self, ServerError> {
        Ok(Self)
    }

    pub async fn forward(self, tx: mpsc::Sender<ControlMessage>) {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("received ctrl-c");
                let _ = tx.send(ControlMessage::Terminate).await;
            }
            Err(err) => tracing::error!(error = %err, "ctrl-c handler failed"),
        }
    }
}

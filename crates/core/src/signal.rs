//! Completion Signal
//!
//! A single-use handle that marks one command's post-processing as finished.
//! The level owns the [`CompletionSignal`]; the command pipeline awaits the
//! paired [`SettleWaiter`] before accepting the next command.

use crate::error::LevelError;
use tokio::sync::oneshot;
use tracing::error;

#[derive(Debug)]
pub struct CompletionSignal {
    tx: Option<oneshot::Sender<()>>,
}

#[derive(Debug)]
pub struct SettleWaiter {
    rx: oneshot::Receiver<()>,
    released: bool,
}

impl CompletionSignal {
    pub fn new() -> (Self, SettleWaiter) {
        let (tx, rx) = oneshot::channel();
        (
            Self { tx: Some(tx) },
            SettleWaiter {
                rx,
                released: false,
            },
        )
    }

    /// Releases the waiting pipeline. Consumes the signal, so it can only
    /// happen once.
    pub fn release(mut self) {
        if let Some(tx) = self.tx.take() {
            // A waiter that already went away has nothing left to resume.
            let _ = tx.send(());
        }
    }
}

impl Drop for CompletionSignal {
    fn drop(&mut self) {
        if self.tx.is_some() {
            error!("Completion signal dropped without being released");
        }
    }
}

impl SettleWaiter {
    /// Resolves once the signal is released, or fails if it was dropped.
    pub async fn settled(self) -> Result<(), LevelError> {
        if self.released {
            return Ok(());
        }
        self.rx.await.map_err(|_| LevelError::SignalDropped)
    }

    /// Non-blocking check used to observe ordering in tests and hosts.
    pub fn is_settled(&mut self) -> bool {
        if !self.released {
            self.released = self.rx.try_recv().is_ok();
        }
        self.released
    }
}

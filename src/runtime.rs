//! Cancellation support for in-flight pushes

use std::sync::Arc;

use tokio::sync::watch;

/// A token that can be used to cancel a running push.
///
/// Clones share state: cancelling any clone cancels all of them. Unlike a
/// plain atomic flag the token can also be awaited, so a subprocess wait
/// can race against it in `tokio::select!`.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    sender: Arc<watch::Sender<bool>>,
}

impl CancellationToken {
    pub fn new() -> Self {
        let (sender, _receiver) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Cancel the operation
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    /// Check if the operation has been cancelled
    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }

    /// Resolves once the token is cancelled; pends forever otherwise.
    pub async fn cancelled(&self) {
        let mut receiver = self.sender.subscribe();
        // The sender lives in `self`, so `wait_for` cannot observe a closed channel.
        let _ = receiver.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

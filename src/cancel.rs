// ABOUTME: Cooperative cancellation for orchestration runs.
// ABOUTME: Every polling loop sleeps through Cancellation so a caller can stop it.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Returned by cancellable operations once cancellation was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("operation cancelled")]
pub struct Cancelled;

/// A cloneable cancellation signal shared by a caller and an orchestration run.
///
/// Cancelling is idempotent. All clones observe the same state.
#[derive(Debug, Clone)]
pub struct Cancellation {
    sender: Arc<watch::Sender<bool>>,
}

impl Default for Cancellation {
    fn default() -> Self {
        Self::new()
    }
}

impl Cancellation {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }

    /// Fail fast if cancellation was already requested.
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }

    /// Resolve once cancellation is requested.
    pub async fn cancelled(&self) {
        let mut receiver = self.sender.subscribe();
        // The sender lives in self, so the channel cannot close while we wait
        let _ = receiver.wait_for(|cancelled| *cancelled).await;
    }

    /// Sleep for `duration`, waking early with `Cancelled` if cancellation is
    /// requested in the meantime.
    pub async fn sleep(&self, duration: Duration) -> Result<(), Cancelled> {
        self.check()?;
        tokio::select! {
            _ = tokio::time::sleep(duration) => Ok(()),
            _ = self.cancelled() => Err(Cancelled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_uncancelled() {
        let cancel = Cancellation::new();
        assert!(!cancel.is_cancelled());
        assert_eq!(cancel.check(), Ok(()));
    }

    #[test]
    fn clones_share_state() {
        let cancel = Cancellation::new();
        let other = cancel.clone();
        other.cancel();
        other.cancel();
        assert!(cancel.is_cancelled());
        assert_eq!(cancel.check(), Err(Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn sleep_completes_when_not_cancelled() {
        let cancel = Cancellation::new();
        assert_eq!(cancel.sleep(Duration::from_secs(5)).await, Ok(()));
    }

    #[tokio::test(start_paused = true)]
    async fn sleep_wakes_on_cancel() {
        let cancel = Cancellation::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let result = cancel.sleep(Duration::from_secs(3600)).await;
        assert_eq!(result, Err(Cancelled));
    }
}

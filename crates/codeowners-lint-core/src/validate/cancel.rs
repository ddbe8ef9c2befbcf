//! Run-scoped cooperative cancellation.

use crate::validate::CheckError;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;

/// A cloneable cancellation signal shared by every check of a run.
///
/// Checks call [`check`](Self::check) at each loop iteration and race
/// blocking work against the signal with
/// [`run_until_cancelled`](Self::run_until_cancelled).
#[derive(Debug, Clone)]
pub struct CancellationToken {
    sender: Arc<watch::Sender<bool>>,
    receiver: watch::Receiver<bool>,
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancellationToken {
    pub fn new() -> Self {
        let (sender, receiver) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
            receiver,
        }
    }

    /// Signals cancellation to every clone of this token.
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Returns `Err(CheckError::Cancelled)` once the token is cancelled.
    pub fn check(&self) -> Result<(), CheckError> {
        if self.is_cancelled() {
            Err(CheckError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Completes when the token is cancelled.
    pub async fn cancelled(&self) {
        let mut receiver = self.receiver.clone();
        // The sender lives as long as `self`, so this only returns on cancel.
        let _ = receiver.wait_for(|cancelled| *cancelled).await;
    }

    /// Drives `future` unless the token is cancelled first.
    pub async fn run_until_cancelled<F>(&self, future: F) -> Result<F::Output, CheckError>
    where
        F: Future,
    {
        tokio::select! {
            biased;
            _ = self.cancelled() => Err(CheckError::Cancelled),
            output = future => Ok(output),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(clone.check().is_ok());

        token.cancel();
        assert!(clone.is_cancelled());
        assert!(matches!(clone.check(), Err(CheckError::Cancelled)));
    }

    #[test]
    fn cancelled_resolves_after_cancel() {
        let token = CancellationToken::new();
        token.cancel();
        tokio_test::block_on(token.cancelled());
    }

    #[tokio::test]
    async fn run_until_cancelled_completes() {
        let token = CancellationToken::new();
        let value = token.run_until_cancelled(async { 7 }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn run_until_cancelled_interrupts_pending_work() {
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::task::yield_now().await;
            canceller.cancel();
        });

        let result = token.run_until_cancelled(std::future::pending::<()>()).await;
        assert!(matches!(result, Err(CheckError::Cancelled)));
    }

    #[tokio::test]
    async fn already_cancelled_wins_over_ready_future() {
        let token = CancellationToken::new();
        token.cancel();
        let result = token.run_until_cancelled(std::future::ready(())).await;
        assert!(result.is_err());
    }
}

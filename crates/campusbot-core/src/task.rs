//! Handles for requests running in the background.
//!
//! Screens never block on the network. Each request is spawned onto the
//! tokio runtime and the owning controller polls it from the UI loop.
//! Dropping the handle aborts the request, so a screen that is torn down
//! cannot receive a late result.

use futures_util::FutureExt;
use std::future::Future;
use tokio::task::{JoinError, JoinHandle};

pub struct Pending<T> {
    handle: JoinHandle<T>,
}

impl<T: Send + 'static> Pending<T> {
    pub fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        Self {
            handle: tokio::spawn(future),
        }
    }
}

impl<T> Pending<T> {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Collect the result if the task is done, without waiting.
    ///
    /// Must not be called again after it returned `Some`.
    pub fn poll(&mut self) -> Option<Result<T, JoinError>> {
        if !self.handle.is_finished() {
            return None;
        }
        (&mut self.handle).now_or_never()
    }

    /// Wait for the task to finish.
    pub async fn join(mut self) -> Result<T, JoinError> {
        (&mut self.handle).await
    }

    pub fn abort(&self) {
        self.handle.abort();
    }
}

impl<T> Drop for Pending<T> {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_join_returns_output() {
        let pending = Pending::spawn(async { 7 });
        assert_eq!(pending.join().await.ok(), Some(7));
    }

    #[tokio::test]
    async fn test_poll_is_none_while_running() {
        let mut pending = Pending::spawn(async {
            tokio::time::sleep(Duration::from_secs(60)).await;
        });
        assert!(pending.poll().is_none());
    }

    #[tokio::test]
    async fn test_poll_after_completion() {
        let mut pending = Pending::spawn(async { "done" });
        while !pending.is_finished() {
            tokio::task::yield_now().await;
        }
        assert_eq!(pending.poll().map(|r| r.ok()), Some(Some("done")));
    }

    #[tokio::test]
    async fn test_drop_aborts_task() {
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let pending = Pending::spawn(async move {
            tokio::time::sleep(Duration::from_secs(60)).await;
            let _ = tx.send(());
        });
        drop(pending);
        // The sender is dropped with the aborted task, never sent
        assert!(rx.await.is_err());
    }

    #[tokio::test]
    async fn test_panic_surfaces_as_join_error() {
        let pending = Pending::spawn(async {
            panic!("boom");
        });
        let result: Result<(), JoinError> = pending.join().await;
        assert!(result.is_err());
    }
}

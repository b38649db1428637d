//! Cooperative cancellation module.
//!
//! This module provides the [`CancelSource`]/[`CancelToken`] pair used to
//! cancel an in-flight dispatch. The pair is one-shot: the source fires at
//! most once, and the token resolves at most once with the supplied reason.

use async_channel::{bounded, Receiver, Sender};
use futures::future;

/// Caller-held side of a cancellation pair.
///
/// Firing the source settles the paired [`CancelToken`] with a reason; the
/// dispatcher attached to that token aborts its transport and fails with the
/// reason verbatim.
#[derive(Debug, Clone)]
pub struct CancelSource {
    cancel_tx: Sender<String>,
}

/// Dispatcher-held side of a cancellation pair.
///
/// Exposes a single await point, [`CancelToken::cancelled`], that resolves
/// with the cancellation reason once the paired [`CancelSource`] fires.
#[derive(Debug, Clone)]
pub struct CancelToken {
    cancel_rx: Receiver<String>,
}

impl CancelSource {
    /// Create a connected source/token pair.
    pub fn new() -> (CancelSource, CancelToken) {
        let (cancel_tx, cancel_rx) = bounded(1);
        (CancelSource { cancel_tx }, CancelToken { cancel_rx })
    }

    /// Fire the cancellation with `reason`.
    ///
    /// The pair is one-shot: subsequent calls are no-ops and the original
    /// reason is the one observed by the token.
    pub fn cancel(&self, reason: impl Into<String>) {
        if self.cancel_tx.try_send(reason.into()).is_ok() {
            self.cancel_tx.close();
        }
    }

    /// Whether [`CancelSource::cancel`] has already fired.
    pub fn is_fired(&self) -> bool {
        self.cancel_tx.is_closed()
    }
}

impl CancelToken {
    /// Resolve with the cancellation reason.
    ///
    /// Pends forever when the paired source is dropped without firing, so the
    /// token never produces a spurious cancellation.
    pub async fn cancelled(&self) -> String {
        match self.cancel_rx.recv().await {
            Ok(reason) => reason,
            Err(_) => future::pending().await,
        }
    }
}

#[cfg(test)]
mod should {
    use super::*;

    #[tokio::test]
    async fn resolve_with_fired_reason() {
        let (source, token) = CancelSource::new();

        tokio::spawn(async move {
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
            source.cancel("user navigated away");
        });

        assert_eq!(token.cancelled().await, "user navigated away");
    }

    #[tokio::test]
    async fn ignore_second_fire() {
        let (source, token) = CancelSource::new();

        source.cancel("first");
        source.cancel("second");

        assert!(source.is_fired());
        assert_eq!(token.cancelled().await, "first");
    }

    #[tokio::test]
    async fn pend_when_source_dropped_without_firing() {
        let (source, token) = CancelSource::new();
        drop(source);

        let outcome = tokio::time::timeout(
            tokio::time::Duration::from_millis(50),
            token.cancelled(),
        )
        .await;

        assert!(outcome.is_err());
    }
}

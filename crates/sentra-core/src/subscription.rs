// ── Feed state subscriptions ──
//
// Watch-channel handle vended by the orchestrator for reactive rendering.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::state::FeedState;

/// A subscription to the orchestrator's state.
///
/// Provides point-in-time snapshot access and change notification via
/// [`changed()`](Self::changed) or by converting to a `Stream`.
pub struct FeedSubscription {
    current: Arc<FeedState>,
    receiver: watch::Receiver<Arc<FeedState>>,
}

impl FeedSubscription {
    pub(crate) fn new(mut receiver: watch::Receiver<Arc<FeedState>>) -> Self {
        let current = receiver.borrow_and_update().clone();
        Self { current, receiver }
    }

    /// Snapshot as of creation or the last `changed()`.
    pub fn current(&self) -> &Arc<FeedState> {
        &self.current
    }

    /// Latest published snapshot.
    pub fn latest(&self) -> Arc<FeedState> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next state change.
    /// Returns `None` once the orchestrator has been dropped.
    pub async fn changed(&mut self) -> Option<Arc<FeedState>> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = snap.clone();
        Some(snap)
    }

    /// Wait until the state satisfies `predicate`, returning that state.
    ///
    /// Checks the latest snapshot first.
    pub async fn wait_for(
        &mut self,
        mut predicate: impl FnMut(&FeedState) -> bool,
    ) -> Option<Arc<FeedState>> {
        let snap = self
            .receiver
            .wait_for(|state| predicate(state))
            .await
            .ok()?
            .clone();
        self.current = snap.clone();
        Some(snap)
    }

    /// Convert into a `Stream` yielding every published snapshot, starting
    /// with the current one.
    pub fn into_stream(self) -> FeedStateStream {
        FeedStateStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter over a [`FeedSubscription`].
pub struct FeedStateStream {
    inner: WatchStream<Arc<FeedState>>,
}

impl Stream for FeedStateStream {
    type Item = Arc<FeedState>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

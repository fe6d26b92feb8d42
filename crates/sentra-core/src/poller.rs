// ── Detection poller ──
//
// Owned-handle wrapper around one background polling task. `start` always
// tears down the previous task first, so a poller never runs two
// intervals at once.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::backend::FeedBackend;
use crate::model::{CameraId, DetectionEvent};

/// Floor for the poll period; `tokio::time::interval` rejects zero.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Periodically fetches detections for one camera at a time.
///
/// The first fetch happens immediately on [`start`](Self::start), then
/// once per period. A failed fetch is logged and the next tick tries
/// again. Dropping the poller stops it without waiting for a delivery
/// already in progress.
pub struct DetectionPoller {
    backend: Arc<dyn FeedBackend>,
    period: Duration,
    active: Option<ActivePoll>,
}

struct ActivePoll {
    camera_id: CameraId,
    cancel: CancellationToken,
    gate: Arc<DeliveryGate>,
    handle: JoinHandle<()>,
}

impl DetectionPoller {
    pub fn new(backend: Arc<dyn FeedBackend>, period: Duration) -> Self {
        Self {
            backend,
            period: period.max(MIN_POLL_INTERVAL),
            active: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Camera currently being polled.
    pub fn camera(&self) -> Option<&CameraId> {
        self.active.as_ref().map(|a| &a.camera_id)
    }

    pub fn is_running(&self) -> bool {
        self.active.as_ref().is_some_and(|a| !a.handle.is_finished())
    }

    /// Start polling `camera_id`, replacing any running poll.
    ///
    /// `on_result` receives the complete detection list of every
    /// successful tick. It must not call back into this poller.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<F>(&mut self, camera_id: CameraId, on_result: F)
    where
        F: Fn(Vec<DetectionEvent>) + Send + Sync + 'static,
    {
        self.stop();

        let cancel = CancellationToken::new();
        let gate = Arc::new(DeliveryGate::new());
        let handle = tokio::spawn(poll_loop(
            Arc::clone(&self.backend),
            camera_id.clone(),
            self.period,
            cancel.clone(),
            Arc::clone(&gate),
            on_result,
        ));

        debug!(camera = %camera_id, period_ms = self.period.as_millis(), "detection polling started");
        self.active = Some(ActivePoll {
            camera_id,
            cancel,
            gate,
            handle,
        });
    }

    /// Stop polling.
    ///
    /// Once this returns, `on_result` will not be called again, even if a
    /// fetch was in flight. Waits for a delivery already in progress to
    /// finish.
    pub fn stop(&mut self) {
        if let Some(active) = self.active.take() {
            active.gate.close();
            active.cancel.cancel();
            debug!(camera = %active.camera_id, "detection polling stopped");
        }
    }

    /// Stop polling and wait for the background task to exit.
    pub async fn stop_and_wait(&mut self) {
        if let Some(active) = self.active.take() {
            active.gate.close();
            active.cancel.cancel();
            let _ = active.handle.await;
            debug!(camera = %active.camera_id, "detection polling stopped");
        }
    }
}

impl Drop for DetectionPoller {
    fn drop(&mut self) {
        // May run inside `on_result` itself, so never wait on the gate here.
        if let Some(active) = self.active.take() {
            active.gate.seal();
            active.cancel.cancel();
        }
    }
}

// ── Delivery gate ────────────────────────────────────────────────────

/// Serializes result delivery against `stop`.
///
/// Delivery runs with the lock held and `close` takes the same lock, so
/// after `close` returns no delivery is running or can start.
struct DeliveryGate {
    closed: AtomicBool,
    delivering: Mutex<()>,
}

impl DeliveryGate {
    fn new() -> Self {
        Self {
            closed: AtomicBool::new(false),
            delivering: Mutex::new(()),
        }
    }

    /// Run `deliver` if the gate is still open. Returns whether it ran.
    fn deliver(&self, deliver: impl FnOnce()) -> bool {
        let _guard = self.delivering.lock().unwrap_or_else(PoisonError::into_inner);
        if self.closed.load(Ordering::Acquire) {
            return false;
        }
        deliver();
        true
    }

    /// Refuse new deliveries and wait out one in progress.
    fn close(&self) {
        self.seal();
        drop(self.delivering.lock().unwrap_or_else(PoisonError::into_inner));
    }

    /// Refuse new deliveries without waiting.
    fn seal(&self) {
        self.closed.store(true, Ordering::Release);
    }
}

// ── Background task ──────────────────────────────────────────────────

async fn poll_loop<F>(
    backend: Arc<dyn FeedBackend>,
    camera_id: CameraId,
    period: Duration,
    cancel: CancellationToken,
    gate: Arc<DeliveryGate>,
    on_result: F,
) where
    F: Fn(Vec<DetectionEvent>) + Send + Sync + 'static,
{
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {}
        }

        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = backend.list_detections(Some(&camera_id)) => result,
        };

        match result {
            Ok(events) => {
                trace!(camera = %camera_id, count = events.len(), "detections fetched");
                if !gate.deliver(|| on_result(events)) {
                    break;
                }
            }
            Err(e) => {
                warn!(camera = %camera_id, error = %e, "detection poll failed, retrying next tick");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_gate_refuses_delivery() {
        let gate = DeliveryGate::new();
        let mut delivered = 0;
        assert!(gate.deliver(|| delivered += 1));
        gate.close();
        assert!(!gate.deliver(|| delivered += 1));
        assert_eq!(delivered, 1);
    }

    #[test]
    fn sealing_inside_delivery_does_not_block() {
        let gate = DeliveryGate::new();
        assert!(gate.deliver(|| gate.seal()));
        assert!(!gate.deliver(|| {}));
    }
}

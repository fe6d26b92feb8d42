// ── Feed orchestrator ──
//
// Owns the selection, the detection poller and the in-flight stream
// requests. Every mutation goes through `dispatch`, which runs the pure
// reducer in `state` and then executes the effects it returns.
//
// Lock order: poller -> delivery gate -> machine. The poll callback only
// ever takes the machine lock.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use sentra_api::LiveFeedClient;
use sentra_api::transport::{TlsMode, TransportConfig};

use crate::backend::FeedBackend;
use crate::config::{FeedConfig, TlsVerification};
use crate::directory::CameraDirectory;
use crate::error::CoreError;
use crate::model::{CameraId, CameraStatus, CameraStatusReport, DetectionEvent};
use crate::poller::DetectionPoller;
use crate::resolver::StreamResolver;
use crate::state::{Effect, FeedEvent, FeedMachine, FeedState, FeedSummary, SelectionTicket};
use crate::subscription::FeedSubscription;

/// The only entry point the presentation layer talks to.
///
/// Cheaply cloneable. Dropping the last handle cancels all background
/// work; [`shutdown()`](Self::shutdown) does the same and waits for it.
#[derive(Clone)]
pub struct FeedOrchestrator {
    inner: Arc<OrchestratorInner>,
}

struct OrchestratorInner {
    config: FeedConfig,
    backend: Arc<dyn FeedBackend>,
    directory: CameraDirectory,
    resolver: StreamResolver,
    machine: Mutex<FeedMachine>,
    state_tx: watch::Sender<Arc<FeedState>>,
    poller: Mutex<DetectionPoller>,
    cancel: CancellationToken,
    /// Child of `cancel`, replaced on every selection change.
    selection_cancel: Mutex<CancellationToken>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl FeedOrchestrator {
    /// Build an orchestrator talking HTTP to `config.base_url`.
    ///
    /// Does not fetch anything; call [`load_directory()`](Self::load_directory).
    pub fn new(config: FeedConfig) -> Result<Self, CoreError> {
        let transport = build_transport(&config);
        let client = LiveFeedClient::new(config.base_url.clone(), &transport)?;
        Ok(Self::with_backend(Arc::new(client), config))
    }

    /// Build an orchestrator over an arbitrary backend.
    pub fn with_backend(backend: Arc<dyn FeedBackend>, config: FeedConfig) -> Self {
        let machine = FeedMachine::new();
        let (state_tx, _) = watch::channel(Arc::new(machine.state().clone()));
        let cancel = CancellationToken::new();

        Self {
            inner: Arc::new(OrchestratorInner {
                directory: CameraDirectory::new(Arc::clone(&backend)),
                resolver: StreamResolver::new(Arc::clone(&backend), config.fallback.clone()),
                poller: Mutex::new(DetectionPoller::new(
                    Arc::clone(&backend),
                    config.poll_interval,
                )),
                selection_cancel: Mutex::new(cancel.child_token()),
                machine: Mutex::new(machine),
                tasks: Mutex::new(Vec::new()),
                backend,
                config,
                state_tx,
                cancel,
            }),
        }
    }

    pub fn config(&self) -> &FeedConfig {
        &self.inner.config
    }

    // ── Directory ────────────────────────────────────────────────────

    /// Fetch the camera roster and auto-select the first active camera.
    ///
    /// When seeding is enabled the unscoped detection history is fetched
    /// alongside. Failures end up in the returned state, never as an
    /// error. A roster that is already loaded stays visible while the
    /// reload is in flight and keeps its selection unless the camera is
    /// gone from the new roster. A failed reload leaves the roster in
    /// place and reports through [`FeedState::error`].
    pub async fn load_directory(&self) -> Arc<FeedState> {
        let inner = &self.inner;
        inner.dispatch(FeedEvent::DirectoryRequested);

        let seed = async {
            if !inner.config.seed_detections {
                return None;
            }
            inner
                .backend
                .list_detections(None)
                .await
                .inspect_err(|e| warn!(error = %e, "detection history fetch failed"))
                .ok()
        };

        let (cameras, seed) = tokio::select! {
            biased;
            () = inner.cancel.cancelled() => return self.state(),
            loaded = async { tokio::join!(inner.directory.list_cameras(), seed) } => loaded,
        };

        match cameras {
            Ok(cameras) => {
                info!(cameras = cameras.len(), "camera directory ready");
                inner.dispatch(FeedEvent::DirectoryLoaded { cameras, seed });
            }
            Err(e) => inner.dispatch(FeedEvent::DirectoryFailed(e.to_string())),
        }
        self.state()
    }

    /// Retry after a directory failure.
    pub async fn retry_directory(&self) -> Arc<FeedState> {
        debug!("retrying camera directory");
        self.load_directory().await
    }

    // ── Selection & stream ───────────────────────────────────────────

    /// Select a camera from the loaded roster.
    ///
    /// Stops the previous camera's poller, starts one for the new camera
    /// and kicks off stream resolution. Selecting the current camera again
    /// only re-resolves its stream.
    pub fn select_camera(&self, camera_id: &CameraId) -> Result<(), CoreError> {
        let state = self.state();
        let camera = match &*state {
            FeedState::Closed => return Err(CoreError::Closed),
            FeedState::Ready(ready) => ready
                .cameras
                .iter()
                .find(|c| &c.id == camera_id)
                .cloned()
                .ok_or_else(|| CoreError::CameraNotFound {
                    identifier: camera_id.to_string(),
                })?,
            FeedState::Loading | FeedState::DirectoryFailed { .. } => {
                return Err(CoreError::DirectoryNotLoaded);
            }
        };

        info!(camera = %camera.id, location = %camera.location, "camera selected");
        self.inner.dispatch(FeedEvent::SelectCamera(camera));
        Ok(())
    }

    /// Re-resolve the selected camera's stream without changing the
    /// selection.
    pub fn refresh_stream(&self) -> Result<(), CoreError> {
        match &*self.state() {
            FeedState::Closed => return Err(CoreError::Closed),
            FeedState::Ready(ready) if ready.selection.is_none() => {
                return Err(CoreError::NoSelection);
            }
            FeedState::Ready(_) => {}
            FeedState::Loading | FeedState::DirectoryFailed { .. } => {
                return Err(CoreError::DirectoryNotLoaded);
            }
        }
        self.inner.dispatch(FeedEvent::RefreshStream);
        Ok(())
    }

    // ── Camera status ────────────────────────────────────────────────

    pub async fn camera_status(&self, camera_id: &CameraId) -> Result<CameraStatusReport, CoreError> {
        self.ensure_open()?;
        self.inner.directory.camera_status(camera_id).await
    }

    /// Change a camera's operational status and reflect it in the roster.
    pub async fn set_camera_status(
        &self,
        camera_id: &CameraId,
        status: CameraStatus,
    ) -> Result<Option<String>, CoreError> {
        self.ensure_open()?;
        let message = self
            .inner
            .directory
            .set_camera_status(camera_id, status)
            .await?;
        self.inner
            .dispatch(FeedEvent::CameraStatusChanged(camera_id.clone(), status));
        Ok(message)
    }

    // ── Observation ──────────────────────────────────────────────────

    /// Latest state snapshot.
    pub fn state(&self) -> Arc<FeedState> {
        self.inner.state_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> FeedSubscription {
        FeedSubscription::new(self.inner.state_tx.subscribe())
    }

    pub fn summary(&self) -> FeedSummary {
        FeedSummary::of(&self.state())
    }

    /// Ticket of the most recent stream request.
    pub fn current_ticket(&self) -> Option<SelectionTicket> {
        lock(&self.inner.machine).ticket().cloned()
    }

    /// Whether a detection poll is running.
    pub fn is_polling(&self) -> bool {
        lock(&self.inner.poller).is_running()
    }

    // ── Teardown ─────────────────────────────────────────────────────

    /// Stop polling, cancel in-flight work and wait for it to finish.
    ///
    /// The state moves to [`FeedState::Closed`] and stays there.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        self.inner.dispatch(FeedEvent::Closed);

        let handles = std::mem::take(&mut *lock(&self.inner.tasks));
        for handle in handles {
            let _ = handle.await;
        }
        info!("feed orchestrator shut down");
    }

    fn ensure_open(&self) -> Result<(), CoreError> {
        if self.inner.cancel.is_cancelled() {
            Err(CoreError::Closed)
        } else {
            Ok(())
        }
    }
}

// ── Dispatch ─────────────────────────────────────────────────────────

impl OrchestratorInner {
    fn dispatch(self: &Arc<Self>, event: FeedEvent) {
        let mut poller = lock(&self.poller);

        // Silence the outgoing camera's poller before the new selection
        // is visible, so none of its results can land afterwards.
        let leaving = match &event {
            FeedEvent::SelectCamera(camera) => poller.camera().is_some_and(|c| c != &camera.id),
            FeedEvent::DirectoryLoaded { cameras, .. } => poller
                .camera()
                .is_some_and(|c| cameras.iter().all(|cam| &cam.id != c)),
            FeedEvent::Closed => true,
            _ => false,
        };
        if leaving {
            poller.stop();
        }

        let effects = {
            let mut machine = lock(&self.machine);
            let effects = machine.apply(event);
            self.publish(&machine);
            effects
        };

        for effect in effects {
            match effect {
                Effect::StopPolling => {
                    poller.stop();
                    self.rotate_selection_token();
                }
                Effect::StartPolling(camera_id) => {
                    let weak = Arc::downgrade(self);
                    poller.start(camera_id, move |events| deliver_detections(&weak, events));
                }
                Effect::Resolve(ticket) => self.spawn_resolve(ticket),
            }
        }
    }

    /// Poll results bypass `dispatch`: they never produce effects and the
    /// poll task must not take the poller lock.
    fn apply_detections(&self, events: Vec<DetectionEvent>) {
        let mut machine = lock(&self.machine);
        machine.apply(FeedEvent::DetectionsReceived(events));
        self.publish(&machine);
    }

    fn publish(&self, machine: &FeedMachine) {
        let next = machine.state();
        self.state_tx.send_if_modified(|current| {
            if **current == *next {
                false
            } else {
                *current = Arc::new(next.clone());
                true
            }
        });
    }

    fn spawn_resolve(self: &Arc<Self>, ticket: SelectionTicket) {
        let weak = Arc::downgrade(self);
        let resolver = self.resolver.clone();
        let cancel = lock(&self.selection_cancel).clone();

        let handle = tokio::spawn(async move {
            let result = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    debug!(camera = %ticket.camera_id, generation = ticket.generation, "stream resolution cancelled");
                    return;
                }
                result = resolver.resolve(&ticket.camera_id) => result,
            };

            let Some(inner) = weak.upgrade() else { return };
            let event = match result {
                Ok(reference) => FeedEvent::StreamResolved(ticket, reference),
                Err(e) => FeedEvent::StreamFailed(ticket, e.to_string()),
            };
            inner.dispatch(event);
        });

        let mut tasks = lock(&self.tasks);
        tasks.retain(|h| !h.is_finished());
        tasks.push(handle);
    }

    /// Cancel work tied to the previous selection.
    fn rotate_selection_token(&self) {
        let previous = std::mem::replace(
            &mut *lock(&self.selection_cancel),
            self.cancel.child_token(),
        );
        previous.cancel();
    }
}

impl Drop for OrchestratorInner {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn deliver_detections(inner: &Weak<OrchestratorInner>, events: Vec<DetectionEvent>) {
    if let Some(inner) = inner.upgrade() {
        inner.apply_detections(events);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ── Helpers ──────────────────────────────────────────────────────────

fn build_transport(config: &FeedConfig) -> TransportConfig {
    TransportConfig {
        tls: tls_to_transport(&config.tls),
        timeout: config.timeout,
        token: config.token.clone(),
    }
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}

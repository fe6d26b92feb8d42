// ── Feed state machine ──
//
// Render-ready state for the live-feed view, plus the pure reducer that
// drives it. The orchestrator feeds events in and executes the effects
// that come back out; nothing in here performs I/O.

use std::sync::Arc;

use tracing::debug;

use crate::directory::first_active;
use crate::model::{Camera, CameraId, CameraStatus, DetectionEvent, StreamReference};

// ── Public state ─────────────────────────────────────────────────────

/// Top-level state of the live feed.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedState {
    /// Directory fetch in flight.
    Loading,
    /// Directory fetch failed; roster is empty and a retry is possible.
    DirectoryFailed { message: String },
    /// Directory loaded.
    Ready(ReadyState),
    /// Orchestrator shut down.
    Closed,
}

impl FeedState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn ready(&self) -> Option<&ReadyState> {
        match self {
            Self::Ready(ready) => Some(ready),
            _ => None,
        }
    }

    /// Cameras in the roster; empty unless `Ready`.
    pub fn cameras(&self) -> &[Camera] {
        self.ready()
            .map(|r| r.cameras.as_slice())
            .unwrap_or_default()
    }

    pub fn selection(&self) -> Option<&Camera> {
        self.ready().and_then(|r| r.selection.as_ref())
    }

    pub fn stream(&self) -> Option<&StreamState> {
        self.ready().map(|r| &r.stream)
    }

    pub fn detections(&self) -> &[DetectionEvent] {
        self.ready()
            .map(|r| r.detections.as_slice())
            .unwrap_or_default()
    }

    /// Directory failure, including a failed reload behind a roster that
    /// is still shown.
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::DirectoryFailed { message } => Some(message),
            Self::Ready(ready) => ready.reload_error.as_deref(),
            _ => None,
        }
    }
}

/// State once the roster is known.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadyState {
    pub cameras: Arc<Vec<Camera>>,
    pub selection: Option<Camera>,
    pub stream: StreamState,
    pub detections: Arc<Vec<DetectionEvent>>,
    /// Set when the latest directory reload failed; cleared by the next
    /// successful load.
    pub reload_error: Option<String>,
}

/// Stream sub-state of the selected camera.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StreamState {
    #[default]
    Idle,
    Resolving,
    Resolved(StreamReference),
    Failed(String),
}

impl StreamState {
    pub fn reference(&self) -> Option<&StreamReference> {
        match self {
            Self::Resolved(r) => Some(r),
            _ => None,
        }
    }
}

/// Identifies one stream request. A result is applied only if its
/// ticket is still the current one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SelectionTicket {
    pub camera_id: CameraId,
    pub generation: u64,
}

/// Dashboard counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedSummary {
    pub total_cameras: usize,
    pub active_cameras: usize,
    pub detections: usize,
}

impl FeedSummary {
    pub fn of(state: &FeedState) -> Self {
        let cameras = state.cameras();
        Self {
            total_cameras: cameras.len(),
            active_cameras: cameras.iter().filter(|c| c.is_active()).count(),
            detections: state.detections().len(),
        }
    }
}

// ── Reducer ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub(crate) enum FeedEvent {
    DirectoryRequested,
    DirectoryLoaded {
        cameras: Vec<Camera>,
        seed: Option<Vec<DetectionEvent>>,
    },
    DirectoryFailed(String),
    SelectCamera(Camera),
    RefreshStream,
    StreamResolved(SelectionTicket, StreamReference),
    StreamFailed(SelectionTicket, String),
    DetectionsReceived(Vec<DetectionEvent>),
    CameraStatusChanged(CameraId, CameraStatus),
    Closed,
}

/// Work the orchestrator must perform after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Effect {
    Resolve(SelectionTicket),
    StartPolling(CameraId),
    StopPolling,
}

#[derive(Debug)]
pub(crate) struct FeedMachine {
    state: FeedState,
    generation: u64,
    ticket: Option<SelectionTicket>,
}

impl FeedMachine {
    pub(crate) fn new() -> Self {
        Self {
            state: FeedState::Loading,
            generation: 0,
            ticket: None,
        }
    }

    pub(crate) fn state(&self) -> &FeedState {
        &self.state
    }

    pub(crate) fn ticket(&self) -> Option<&SelectionTicket> {
        self.ticket.as_ref()
    }

    /// Apply one event, returning the effects to run.
    pub(crate) fn apply(&mut self, event: FeedEvent) -> Vec<Effect> {
        if matches!(self.state, FeedState::Closed) {
            return Vec::new();
        }

        match event {
            FeedEvent::DirectoryRequested => {
                // A loaded roster stays visible while a reload is in flight.
                if !matches!(self.state, FeedState::Ready(_)) {
                    self.state = FeedState::Loading;
                }
                Vec::new()
            }
            FeedEvent::DirectoryLoaded { cameras, seed } => self.directory_loaded(cameras, seed),
            FeedEvent::DirectoryFailed(message) => {
                match &mut self.state {
                    FeedState::Ready(ready) => ready.reload_error = Some(message),
                    _ => self.state = FeedState::DirectoryFailed { message },
                }
                Vec::new()
            }
            FeedEvent::SelectCamera(camera) => self.select(camera),
            FeedEvent::RefreshStream => self.refresh(),
            FeedEvent::StreamResolved(ticket, reference) => {
                self.stream_result(&ticket, StreamState::Resolved(reference));
                Vec::new()
            }
            FeedEvent::StreamFailed(ticket, message) => {
                self.stream_result(&ticket, StreamState::Failed(message));
                Vec::new()
            }
            FeedEvent::DetectionsReceived(events) => {
                if let FeedState::Ready(ready) = &mut self.state {
                    ready.detections = Arc::new(events);
                }
                Vec::new()
            }
            FeedEvent::CameraStatusChanged(camera_id, status) => {
                self.status_changed(&camera_id, status);
                Vec::new()
            }
            FeedEvent::Closed => {
                self.state = FeedState::Closed;
                self.ticket = None;
                vec![Effect::StopPolling]
            }
        }
    }

    fn directory_loaded(
        &mut self,
        cameras: Vec<Camera>,
        seed: Option<Vec<DetectionEvent>>,
    ) -> Vec<Effect> {
        let mut effects = Vec::new();
        match &mut self.state {
            FeedState::Ready(ready) => {
                // Reload: keep the selection while it is still on the roster.
                ready.reload_error = None;
                if let Some(selected) = ready.selection.take() {
                    match cameras.iter().find(|c| c.id == selected.id) {
                        Some(fresh) => ready.selection = Some(fresh.clone()),
                        None => {
                            debug!(camera = %selected.id, "selected camera left the roster");
                            ready.stream = StreamState::Idle;
                            ready.detections = Arc::new(Vec::new());
                            self.ticket = None;
                            effects.push(Effect::StopPolling);
                        }
                    }
                }
                ready.cameras = Arc::new(cameras);
                if ready.selection.is_some() {
                    return effects;
                }
            }
            _ => {
                self.state = FeedState::Ready(ReadyState {
                    cameras: Arc::new(cameras),
                    selection: None,
                    stream: StreamState::Idle,
                    detections: Arc::new(seed.unwrap_or_default()),
                    reload_error: None,
                });
            }
        }

        let candidate = self
            .ready()
            .and_then(|r| first_active(&r.cameras))
            .cloned();
        match candidate {
            Some(camera) => {
                debug!(camera = %camera.id, "auto-selecting first active camera");
                // Leads with StopPolling, which covers `effects`.
                self.select(camera)
            }
            None => {
                debug!("no active camera to auto-select");
                effects
            }
        }
    }

    fn select(&mut self, camera: Camera) -> Vec<Effect> {
        let FeedState::Ready(ready) = &mut self.state else {
            return Vec::new();
        };

        let camera_id = camera.id.clone();
        let previous = ready.selection.replace(camera);
        match previous {
            Some(prev) if prev.id == camera_id => return self.refresh(),
            // The old camera's detections must not show under the new one.
            // The initial selection keeps the seeded history until its
            // first poll lands.
            Some(_) => ready.detections = Arc::new(Vec::new()),
            None => {}
        }

        let ticket = self.next_ticket(camera_id.clone());
        vec![
            Effect::StopPolling,
            Effect::Resolve(ticket),
            Effect::StartPolling(camera_id),
        ]
    }

    fn refresh(&mut self) -> Vec<Effect> {
        let Some(camera_id) = self.selection().map(|c| c.id.clone()) else {
            return Vec::new();
        };
        vec![Effect::Resolve(self.next_ticket(camera_id))]
    }

    /// Issue a new ticket for `camera_id` and enter `Resolving`.
    fn next_ticket(&mut self, camera_id: CameraId) -> SelectionTicket {
        self.generation += 1;
        if let FeedState::Ready(ready) = &mut self.state {
            ready.stream = StreamState::Resolving;
        }
        let ticket = SelectionTicket {
            camera_id,
            generation: self.generation,
        };
        self.ticket = Some(ticket.clone());
        ticket
    }

    fn stream_result(&mut self, ticket: &SelectionTicket, stream: StreamState) {
        if self.ticket.as_ref() != Some(ticket) {
            debug!(
                camera = %ticket.camera_id,
                generation = ticket.generation,
                "discarding stale stream result"
            );
            return;
        }
        if let FeedState::Ready(ready) = &mut self.state {
            ready.stream = stream;
        }
    }

    fn status_changed(&mut self, camera_id: &CameraId, status: CameraStatus) {
        let FeedState::Ready(ready) = &mut self.state else {
            return;
        };
        let cameras = Arc::make_mut(&mut ready.cameras);
        for camera in cameras.iter_mut().filter(|c| &c.id == camera_id) {
            camera.status = status;
        }
        if let Some(selected) = ready.selection.as_mut().filter(|c| &c.id == camera_id) {
            selected.status = status;
        }
    }

    fn ready(&self) -> Option<&ReadyState> {
        self.state.ready()
    }

    fn selection(&self) -> Option<&Camera> {
        self.state.selection()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use url::Url;

    use crate::model::StreamProtocol;

    fn cam(id: &str, status: CameraStatus) -> Camera {
        Camera::new(id, format!("Junction {id}"), status)
    }

    fn reference(id: &str) -> StreamReference {
        StreamReference {
            camera_id: id.into(),
            url: Url::parse(&format!("https://cdn.local/{id}.m3u8")).unwrap(),
            protocol: StreamProtocol::Native,
            original_url: None,
            resolution: None,
            fps: None,
            is_live: Some(true),
        }
    }

    fn loaded(cameras: Vec<Camera>) -> (FeedMachine, Vec<Effect>) {
        let mut m = FeedMachine::new();
        let effects = m.apply(FeedEvent::DirectoryLoaded {
            cameras,
            seed: None,
        });
        (m, effects)
    }

    fn ticket(id: &str, generation: u64) -> SelectionTicket {
        SelectionTicket {
            camera_id: id.into(),
            generation,
        }
    }

    #[test]
    fn auto_selects_first_active_camera() {
        let (m, effects) = loaded(vec![
            cam("A", CameraStatus::Inactive),
            cam("B", CameraStatus::Active),
        ]);

        assert_eq!(m.state().selection().unwrap().id.as_str(), "B");
        assert_eq!(m.state().stream(), Some(&StreamState::Resolving));
        assert_eq!(
            effects,
            vec![
                Effect::StopPolling,
                Effect::Resolve(ticket("B", 1)),
                Effect::StartPolling("B".into()),
            ]
        );
    }

    #[test]
    fn no_active_camera_stays_unselected() {
        let (m, effects) = loaded(vec![cam("A", CameraStatus::Inactive)]);
        assert!(m.state().selection().is_none());
        assert_eq!(m.state().stream(), Some(&StreamState::Idle));
        assert!(effects.is_empty());
    }

    #[test]
    fn stale_stream_result_is_discarded() {
        let (mut m, _) = loaded(vec![
            cam("A", CameraStatus::Active),
            cam("B", CameraStatus::Active),
        ]);
        m.apply(FeedEvent::SelectCamera(cam("B", CameraStatus::Active)));

        m.apply(FeedEvent::StreamResolved(ticket("A", 1), reference("A")));
        assert_eq!(m.state().stream(), Some(&StreamState::Resolving));

        m.apply(FeedEvent::StreamResolved(ticket("B", 2), reference("B")));
        assert_eq!(
            m.state().stream().and_then(StreamState::reference),
            Some(&reference("B"))
        );
    }

    #[test]
    fn refresh_supersedes_earlier_request_for_same_camera() {
        let (mut m, _) = loaded(vec![cam("A", CameraStatus::Active)]);
        let effects = m.apply(FeedEvent::RefreshStream);
        assert_eq!(effects, vec![Effect::Resolve(ticket("A", 2))]);

        m.apply(FeedEvent::StreamFailed(ticket("A", 1), "timeout".into()));
        assert_eq!(m.state().stream(), Some(&StreamState::Resolving));

        m.apply(FeedEvent::StreamFailed(ticket("A", 2), "timeout".into()));
        assert_eq!(
            m.state().stream(),
            Some(&StreamState::Failed("timeout".into()))
        );
    }

    #[test]
    fn reselecting_same_camera_only_refreshes_stream() {
        let (mut m, _) = loaded(vec![cam("A", CameraStatus::Active)]);
        let effects = m.apply(FeedEvent::SelectCamera(cam("A", CameraStatus::Active)));
        assert_eq!(effects, vec![Effect::Resolve(ticket("A", 2))]);
    }

    #[test]
    fn seed_detections_kept_through_initial_selection() {
        let seed = vec![
            DetectionEvent::new("D1", Some("A".into()), "speeding"),
            DetectionEvent::new("D2", Some("B".into()), "no_helmet"),
        ];
        let mut m = FeedMachine::new();
        m.apply(FeedEvent::DirectoryLoaded {
            cameras: vec![
                cam("A", CameraStatus::Active),
                cam("B", CameraStatus::Active),
            ],
            seed: Some(seed.clone()),
        });
        assert_eq!(m.state().selection().unwrap().id.as_str(), "A");
        assert_eq!(m.state().detections(), seed.as_slice());

        m.apply(FeedEvent::SelectCamera(cam("B", CameraStatus::Active)));
        assert!(m.state().detections().is_empty());
    }

    #[test]
    fn detections_replace_wholesale() {
        let (mut m, _) = loaded(vec![cam("A", CameraStatus::Active)]);
        m.apply(FeedEvent::DetectionsReceived(vec![
            DetectionEvent::new("D1", Some("A".into()), "speeding"),
            DetectionEvent::new("D2", Some("A".into()), "speeding"),
        ]));
        m.apply(FeedEvent::DetectionsReceived(vec![DetectionEvent::new(
            "D3",
            Some("A".into()),
            "signal_jump",
        )]));

        let ids: Vec<_> = m.state().detections().iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["D3"]);
    }

    #[test]
    fn directory_failure_is_retryable_state() {
        let mut m = FeedMachine::new();
        m.apply(FeedEvent::DirectoryFailed("connection refused".into()));
        assert_eq!(m.state().error(), Some("connection refused"));
        assert!(m.state().cameras().is_empty());

        m.apply(FeedEvent::DirectoryRequested);
        assert!(m.state().is_loading());
    }

    #[test]
    fn reload_keeps_selection() {
        let (mut m, _) = loaded(vec![
            cam("A", CameraStatus::Active),
            cam("B", CameraStatus::Active),
        ]);
        m.apply(FeedEvent::SelectCamera(cam("B", CameraStatus::Active)));

        let effects = m.apply(FeedEvent::DirectoryLoaded {
            cameras: vec![
                cam("A", CameraStatus::Active),
                cam("B", CameraStatus::Maintenance),
            ],
            seed: None,
        });
        assert!(effects.is_empty());
        let selected = m.state().selection().unwrap();
        assert_eq!(selected.id.as_str(), "B");
        assert_eq!(selected.status, CameraStatus::Maintenance);
    }

    #[test]
    fn reload_without_selected_camera_reselects() {
        let (mut m, _) = loaded(vec![
            cam("A", CameraStatus::Active),
            cam("B", CameraStatus::Active),
        ]);
        m.apply(FeedEvent::SelectCamera(cam("B", CameraStatus::Active)));
        m.apply(FeedEvent::DetectionsReceived(vec![DetectionEvent::new(
            "D1",
            Some("B".into()),
            "speeding",
        )]));

        let effects = m.apply(FeedEvent::DirectoryLoaded {
            cameras: vec![cam("A", CameraStatus::Active)],
            seed: None,
        });
        assert_eq!(
            effects,
            vec![
                Effect::StopPolling,
                Effect::Resolve(ticket("A", 3)),
                Effect::StartPolling("A".into()),
            ]
        );
        assert_eq!(m.state().selection().unwrap().id.as_str(), "A");
        assert!(m.state().detections().is_empty());

        // A late result for the dropped camera must not land.
        m.apply(FeedEvent::StreamResolved(ticket("B", 2), reference("B")));
        assert_eq!(m.state().stream(), Some(&StreamState::Resolving));
    }

    #[test]
    fn reload_without_selected_camera_and_no_active_clears_selection() {
        let (mut m, _) = loaded(vec![
            cam("A", CameraStatus::Active),
            cam("B", CameraStatus::Inactive),
        ]);

        let effects = m.apply(FeedEvent::DirectoryLoaded {
            cameras: vec![cam("B", CameraStatus::Inactive)],
            seed: None,
        });
        assert_eq!(effects, vec![Effect::StopPolling]);
        assert!(m.state().selection().is_none());
        assert_eq!(m.state().stream(), Some(&StreamState::Idle));
        assert!(m.ticket().is_none());

        m.apply(FeedEvent::StreamResolved(ticket("A", 1), reference("A")));
        assert_eq!(m.state().stream(), Some(&StreamState::Idle));
    }

    #[test]
    fn reload_failure_keeps_roster_and_reports_error() {
        let (mut m, _) = loaded(vec![cam("A", CameraStatus::Active)]);

        m.apply(FeedEvent::DirectoryRequested);
        m.apply(FeedEvent::DirectoryFailed("connection refused".into()));
        assert_eq!(m.state().cameras().len(), 1);
        assert_eq!(m.state().selection().unwrap().id.as_str(), "A");
        assert_eq!(m.state().error(), Some("connection refused"));

        m.apply(FeedEvent::DirectoryLoaded {
            cameras: vec![cam("A", CameraStatus::Active)],
            seed: None,
        });
        assert!(m.state().error().is_none());
    }

    #[test]
    fn status_change_updates_roster_and_selection() {
        let (mut m, _) = loaded(vec![cam("A", CameraStatus::Active)]);
        m.apply(FeedEvent::CameraStatusChanged("A".into(), CameraStatus::Inactive));

        assert_eq!(m.state().cameras()[0].status, CameraStatus::Inactive);
        assert_eq!(m.state().selection().unwrap().status, CameraStatus::Inactive);
        assert_eq!(
            FeedSummary::of(m.state()),
            FeedSummary {
                total_cameras: 1,
                active_cameras: 0,
                detections: 0,
            }
        );
    }

    #[test]
    fn closed_is_terminal() {
        let (mut m, _) = loaded(vec![cam("A", CameraStatus::Active)]);
        assert_eq!(m.apply(FeedEvent::Closed), vec![Effect::StopPolling]);
        assert!(m.apply(FeedEvent::RefreshStream).is_empty());
        m.apply(FeedEvent::StreamResolved(ticket("A", 1), reference("A")));
        assert_eq!(m.state(), &FeedState::Closed);
    }
}

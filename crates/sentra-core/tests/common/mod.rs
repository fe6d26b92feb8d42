// Scripted in-memory backend shared by the integration tests.

#![allow(dead_code, clippy::unwrap_used)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use sentra_core::{
    Camera, CameraId, CameraStatus, CameraStatusReport, CoreError, DetectionEvent, FeedBackend,
    FeedConfig, StreamSource,
};

/// One scripted answer, delivered after `delay`.
pub struct Scripted<T> {
    pub delay: Duration,
    pub result: Result<T, String>,
}

impl<T> Scripted<T> {
    pub fn ok(value: T) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Ok(value),
        }
    }

    pub fn err(message: &str) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Err(message.to_owned()),
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Backend whose answers are queued per call.
///
/// When a queue runs dry the backend falls back to a healthy default:
/// the current roster, a native HTTPS stream, and one detection per poll.
#[derive(Default)]
pub struct FakeBackend {
    pub cameras: Mutex<Vec<Camera>>,
    pub camera_script: Mutex<VecDeque<Scripted<Vec<Camera>>>>,
    pub stream_script: Mutex<HashMap<CameraId, VecDeque<Scripted<StreamSource>>>>,
    pub detection_script: Mutex<VecDeque<Scripted<Vec<DetectionEvent>>>>,
    pub detection_delay: Mutex<Duration>,
    pub history: Mutex<Vec<DetectionEvent>>,
    pub status_updates: Mutex<Vec<(CameraId, CameraStatus)>>,
    pub camera_calls: AtomicUsize,
    pub stream_calls: AtomicUsize,
    pub detection_calls: AtomicUsize,
    pub scoped_calls: Mutex<Vec<Option<CameraId>>>,
}

impl FakeBackend {
    pub fn with_cameras(cameras: Vec<Camera>) -> Self {
        let backend = Self::default();
        *backend.cameras.lock().unwrap() = cameras;
        backend
    }

    pub fn script_cameras(&self, answer: Scripted<Vec<Camera>>) {
        self.camera_script.lock().unwrap().push_back(answer);
    }

    pub fn script_stream(&self, camera: &str, answer: Scripted<StreamSource>) {
        self.stream_script
            .lock()
            .unwrap()
            .entry(CameraId::from(camera))
            .or_default()
            .push_back(answer);
    }

    pub fn script_detections(&self, answer: Scripted<Vec<DetectionEvent>>) {
        self.detection_script.lock().unwrap().push_back(answer);
    }

    pub fn detection_calls(&self) -> usize {
        self.detection_calls.load(Ordering::SeqCst)
    }

    pub fn stream_calls(&self) -> usize {
        self.stream_calls.load(Ordering::SeqCst)
    }

    /// Camera ids of every scoped detection fetch, in order.
    pub fn polled_cameras(&self) -> Vec<String> {
        self.scoped_calls
            .lock()
            .unwrap()
            .iter()
            .flatten()
            .map(|id| id.as_str().to_owned())
            .collect()
    }
}

async fn settle<T>(answer: Scripted<T>) -> Result<T, CoreError> {
    if !answer.delay.is_zero() {
        tokio::time::sleep(answer.delay).await;
    }
    answer.result.map_err(|message| CoreError::Backend {
        message,
        status: Some(503),
    })
}

#[async_trait]
impl FeedBackend for FakeBackend {
    async fn list_cameras(&self) -> Result<Vec<Camera>, CoreError> {
        self.camera_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.camera_script.lock().unwrap().pop_front();
        match scripted {
            Some(answer) => settle(answer).await,
            None => Ok(self.cameras.lock().unwrap().clone()),
        }
    }

    async fn list_detections(
        &self,
        camera_id: Option<&CameraId>,
    ) -> Result<Vec<DetectionEvent>, CoreError> {
        let Some(camera_id) = camera_id else {
            return Ok(self.history.lock().unwrap().clone());
        };

        let call = self.detection_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.scoped_calls
            .lock()
            .unwrap()
            .push(Some(camera_id.clone()));

        let scripted = self.detection_script.lock().unwrap().pop_front();
        let answer = scripted.unwrap_or_else(|| {
            Scripted::ok(vec![DetectionEvent::new(
                format!("{camera_id}-{call}"),
                Some(camera_id.clone()),
                "speeding",
            )])
        });
        let delay = *self.detection_delay.lock().unwrap();
        let answer = if answer.delay.is_zero() {
            answer.after(delay)
        } else {
            answer
        };
        settle(answer).await
    }

    async fn fetch_stream(&self, camera_id: &CameraId) -> Result<StreamSource, CoreError> {
        self.stream_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self
            .stream_script
            .lock()
            .unwrap()
            .get_mut(camera_id)
            .and_then(VecDeque::pop_front);
        let answer = scripted
            .unwrap_or_else(|| Scripted::ok(stream(&format!("https://cdn.test/{camera_id}.m3u8"))));
        settle(answer).await
    }

    async fn camera_status(&self, camera_id: &CameraId) -> Result<CameraStatusReport, CoreError> {
        let cameras = self.cameras.lock().unwrap();
        let camera = cameras
            .iter()
            .find(|c| &c.id == camera_id)
            .ok_or_else(|| CoreError::CameraNotFound {
                identifier: camera_id.to_string(),
            })?;
        Ok(CameraStatusReport {
            camera_id: camera.id.clone(),
            status: camera.status,
            last_ping: None,
            uptime: Some("99.5%".into()),
        })
    }

    async fn set_camera_status(
        &self,
        camera_id: &CameraId,
        status: CameraStatus,
    ) -> Result<Option<String>, CoreError> {
        self.status_updates
            .lock()
            .unwrap()
            .push((camera_id.clone(), status));
        Ok(Some(format!("Camera {camera_id} status updated to {status}")))
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────

pub fn shared(backend: &Arc<FakeBackend>) -> Arc<dyn FeedBackend> {
    Arc::clone(backend) as Arc<dyn FeedBackend>
}

pub fn camera(id: &str, status: CameraStatus) -> Camera {
    Camera::new(id, format!("Junction {id}"), status)
}

pub fn stream(url: &str) -> StreamSource {
    StreamSource {
        url: Some(url.to_owned()),
        resolution: Some("1280x720".into()),
        fps: Some(25),
        is_live: Some(true),
    }
}

pub fn config() -> FeedConfig {
    FeedConfig {
        poll_interval: Duration::from_secs(10),
        seed_detections: false,
        ..FeedConfig::default()
    }
}

/// Let spawned tasks run without advancing the paused clock.
pub async fn settle_tasks() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

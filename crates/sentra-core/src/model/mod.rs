// ── Domain model ──
//
// Canonical types the orchestrator and its consumers work with. Wire
// records from `sentra-api` are translated into these in `convert`.

pub mod camera;
pub mod detection;
pub mod stream;

pub use camera::{Camera, CameraId, CameraStatus, CameraStatusReport};
pub use detection::{DetectionEvent, Severity, ViolationKind};
pub use stream::{StreamProtocol, StreamReference, StreamSource};

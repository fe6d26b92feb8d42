//! Live camera feed orchestration on top of `sentra-api`.
//!
//! - **[`FeedOrchestrator`]**: the facade the presentation layer talks to.
//!   Loads the camera directory, auto-selects the first active camera,
//!   resolves its stream and polls its detections, discarding results that
//!   belong to a previous selection.
//!
//! - **[`FeedState`]**: tagged-union render state (`Loading`,
//!   `DirectoryFailed`, `Ready`, `Closed`), observed through
//!   [`FeedSubscription`] (`current()` / `latest()` / `changed()` /
//!   `into_stream()`).
//!
//! - **Components**: [`CameraDirectory`], [`StreamResolver`] (with a
//!   configurable [`FallbackPolicy`] for URLs the client cannot play) and
//!   [`DetectionPoller`] (owned-handle interval with a deterministic
//!   `stop()`), all reaching the backend through the [`FeedBackend`] trait.
//!
//! - **Domain model** ([`model`]): `Camera`, `DetectionEvent`,
//!   `StreamReference` and friends, converted from the raw wire records.

pub mod backend;
pub mod config;
pub mod convert;
pub mod directory;
pub mod error;
pub mod model;
pub mod orchestrator;
pub mod poller;
pub mod resolver;
pub mod state;
pub mod subscription;

// ── Primary re-exports ──────────────────────────────────────────────
pub use backend::FeedBackend;
pub use config::{FallbackPolicy, FeedConfig, TlsVerification};
pub use directory::CameraDirectory;
pub use error::CoreError;
pub use orchestrator::FeedOrchestrator;
pub use poller::DetectionPoller;
pub use resolver::StreamResolver;
pub use state::{FeedState, FeedSummary, ReadyState, SelectionTicket, StreamState};
pub use subscription::{FeedStateStream, FeedSubscription};

pub use model::{
    Camera, CameraId, CameraStatus, CameraStatusReport, DetectionEvent, Severity,
    StreamProtocol, StreamReference, StreamSource, ViolationKind,
};

// sentra-api: Async Rust client for the Sentra live-feed backend

pub mod cameras;
pub mod client;
pub mod detections;
pub mod error;
pub mod models;
pub mod stream;
pub mod transport;

pub use client::LiveFeedClient;
pub use error::Error;
pub use models::{
    CameraRecord, CameraStatusRecord, DetectionRecord, Envelope, EnvelopeStatus, StreamDescriptor,
};
pub use transport::{TlsMode, TransportConfig};

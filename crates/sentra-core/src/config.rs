// ── Runtime feed configuration ──
//
// These types describe *how* to reach the backend and how the feed
// behaves. They carry the token and tuning knobs but never touch disk;
// sentra-config builds a `FeedConfig` and hands it in.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

/// Default base path of the live-feed backend.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/api/livefeed/";

/// Sample clip substituted for non-playable streams unless configured.
pub const DEFAULT_FALLBACK_URL: &str =
    "https://commondatastorage.googleapis.com/gtv-videos-bucket/sample/BigBuckBunny.mp4";

/// Detection poll period.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// What to do when the backend hands out a stream URL the client cannot
/// play natively (e.g. `rtsp://`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackPolicy {
    /// Substitute a fixed, known-playable resource.
    Substitute { url: Url },
    /// Rewrite to a transcoding gateway; `{camera_id}` is replaced with the
    /// camera identifier (e.g. `https://gw.local/hls/{camera_id}.m3u8`).
    Template { template: String },
    /// Report the stream as unavailable.
    Reject,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self::Substitute {
            url: builtin_url(DEFAULT_FALLBACK_URL),
        }
    }
}

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed lab backends).
    DangerAcceptInvalid,
}

/// Configuration for one feed orchestrator.
///
/// Built by the embedding host, passed to
/// [`FeedOrchestrator`](crate::FeedOrchestrator). Core never reads config files.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Live-feed API base (e.g. `http://127.0.0.1:8000/api/livefeed/`).
    pub base_url: Url,
    /// Optional bearer token for the backend.
    pub token: Option<SecretString>,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Request timeout.
    pub timeout: Duration,
    /// Detection poll period.
    pub poll_interval: Duration,
    /// Handling of non-playable stream URLs.
    pub fallback: FallbackPolicy,
    /// Seed the detection list with the unscoped history while the
    /// directory loads.
    pub seed_detections: bool,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: builtin_url(DEFAULT_BASE_URL),
            token: None,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            poll_interval: DEFAULT_POLL_INTERVAL,
            fallback: FallbackPolicy::default(),
            seed_detections: true,
        }
    }
}

/// Parse one of the URL constants above.
///
/// Only ever called with those constants, which `builtin_urls_parse`
/// pins, so the `expect` cannot fire.
fn builtin_url(raw: &'static str) -> Url {
    Url::parse(raw).expect("built-in URL constant")
}

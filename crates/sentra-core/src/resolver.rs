// ── Stream resolver ──
//
// One-shot lookup of a camera's playable stream. URLs the client cannot
// render directly are run through the configured `FallbackPolicy`
// instead of failing the lookup.

use std::sync::Arc;

use tracing::{debug, info, warn};
use url::Url;

use crate::backend::FeedBackend;
use crate::config::FallbackPolicy;
use crate::error::CoreError;
use crate::model::{CameraId, StreamProtocol, StreamReference, StreamSource};

const CAMERA_ID_PLACEHOLDER: &str = "{camera_id}";

/// Resolves camera ids to playable [`StreamReference`]s.
#[derive(Clone)]
pub struct StreamResolver {
    backend: Arc<dyn FeedBackend>,
    fallback: FallbackPolicy,
}

impl StreamResolver {
    pub fn new(backend: Arc<dyn FeedBackend>, fallback: FallbackPolicy) -> Self {
        Self { backend, fallback }
    }

    pub fn fallback(&self) -> &FallbackPolicy {
        &self.fallback
    }

    /// Resolve the stream for `camera_id`. No retries; callers re-invoke.
    pub async fn resolve(&self, camera_id: &CameraId) -> Result<StreamReference, CoreError> {
        let source = self
            .backend
            .fetch_stream(camera_id)
            .await
            .inspect_err(|e| warn!(camera = %camera_id, error = %e, "stream lookup failed"))?;
        self.reference_for(camera_id, source)
    }

    /// Turn a backend descriptor into a playable reference.
    pub fn reference_for(
        &self,
        camera_id: &CameraId,
        source: StreamSource,
    ) -> Result<StreamReference, CoreError> {
        let StreamSource {
            url,
            resolution,
            fps,
            is_live,
        } = source;

        let raw = url.ok_or_else(|| CoreError::StreamUnavailable {
            camera_id: camera_id.clone(),
            reason: "backend returned no stream URL".into(),
        })?;

        let (url, protocol, original_url) = match playable(&raw) {
            Some(url) => {
                debug!(camera = %camera_id, %url, "native stream");
                (url, StreamProtocol::Native, None)
            }
            None => {
                let url = self.substitute(camera_id, &raw)?;
                info!(
                    camera = %camera_id,
                    original = %raw,
                    fallback = %url,
                    "stream not natively playable, using fallback"
                );
                (url, StreamProtocol::Incompatible, Some(raw))
            }
        };

        Ok(StreamReference {
            camera_id: camera_id.clone(),
            url,
            protocol,
            original_url,
            resolution,
            fps,
            is_live,
        })
    }

    fn substitute(&self, camera_id: &CameraId, raw: &str) -> Result<Url, CoreError> {
        match &self.fallback {
            FallbackPolicy::Substitute { url } => Ok(url.clone()),
            FallbackPolicy::Template { template } => {
                let rendered = template.replace(CAMERA_ID_PLACEHOLDER, camera_id.as_str());
                Url::parse(&rendered).map_err(|e| CoreError::StreamUnavailable {
                    camera_id: camera_id.clone(),
                    reason: format!("fallback template produced invalid URL '{rendered}': {e}"),
                })
            }
            FallbackPolicy::Reject => Err(CoreError::StreamUnavailable {
                camera_id: camera_id.clone(),
                reason: format!("unsupported stream protocol: {raw}"),
            }),
        }
    }
}

/// `Some(url)` when `raw` is directly playable media (plain HTTP or HTTPS).
pub fn playable(raw: &str) -> Option<Url> {
    let url = Url::parse(raw.trim()).ok()?;
    matches!(url.scheme(), "http" | "https").then_some(url)
}

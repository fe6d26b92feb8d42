// Live-feed API HTTP client
//
// Wraps `reqwest::Client` with URL construction under the live-feed base
// path and envelope unwrapping. Endpoint methods live in sibling modules
// (cameras, detections, stream) as inherent impls so this file stays
// focused on transport mechanics.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::{ParseError, Url};

use crate::error::Error;
use crate::models::{Envelope, EnvelopeStatus};
use crate::transport::TransportConfig;

const BODY_PREVIEW_LEN: usize = 200;

/// Raw HTTP client for the live-feed backend.
///
/// Handles the `{ status, message?, <payload> }` envelope and URL
/// construction beneath the base path (e.g.
/// `http://127.0.0.1:8000/api/livefeed`). All endpoint methods return the
/// unwrapped payload -- the envelope is stripped before the caller sees it.
#[derive(Clone)]
pub struct LiveFeedClient {
    http: reqwest::Client,
    base_url: Url,
}

impl LiveFeedClient {
    /// Create a client from a `TransportConfig`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self { http, base_url })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// The live-feed base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build `{base}/{segments...}/`.
    ///
    /// Segments are percent-encoded individually, so camera ids can be
    /// passed through verbatim. The backend routes every endpoint with a
    /// trailing slash, which is appended here.
    pub(crate) fn endpoint_url(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| Error::InvalidUrl(ParseError::RelativeUrlWithCannotBeABaseBase))?;
            path.pop_if_empty();
            path.extend(segments);
            path.push("");
        }
        Ok(url)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request and extract `key` from the envelope.
    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        url: Url,
        key: &'static str,
    ) -> Result<T, Error> {
        debug!("GET {}", url);

        let resp = self.http.get(url).send().await.map_err(Error::Transport)?;
        let envelope = Self::parse_envelope(resp).await?;
        take_payload(envelope, key)
    }

    /// Send a POST request with a JSON body.
    ///
    /// Returns the envelope's `message`, which is all the mutation
    /// endpoints send back.
    pub(crate) async fn post(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
    ) -> Result<Option<String>, Error> {
        debug!("POST {}", url);

        let resp = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(Error::Transport)?;
        let envelope = Self::parse_envelope(resp).await?;
        Ok(envelope.message)
    }

    /// Parse the envelope, returning it on `status: "success"`.
    ///
    /// Non-2xx responses usually still carry an error envelope; its
    /// `message` is preferred over the raw body for the error text.
    async fn parse_envelope(resp: reqwest::Response) -> Result<Envelope, Error> {
        let status = resp.status();
        let body = resp.text().await.map_err(Error::Transport)?;
        trace!(%status, len = body.len(), "response received");

        if !status.is_success() {
            let message = serde_json::from_str::<Envelope>(&body)
                .ok()
                .and_then(|e| e.message)
                .unwrap_or_else(|| preview(&body).to_owned());
            return Err(Error::Http {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: Envelope = serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body: body.clone(),
        })?;

        match envelope.status {
            EnvelopeStatus::Success => Ok(envelope),
            EnvelopeStatus::Error => Err(Error::Backend {
                message: envelope
                    .message
                    .unwrap_or_else(|| "unspecified backend error".into()),
            }),
        }
    }
}

/// Pull one payload key out of a success envelope and decode it.
fn take_payload<T: DeserializeOwned>(
    mut envelope: Envelope,
    key: &'static str,
) -> Result<T, Error> {
    let value = envelope
        .payload
        .remove(key)
        .ok_or(Error::MissingPayload { key })?;
    let raw = value.to_string();
    serde_json::from_value(value).map_err(|e| Error::Deserialization {
        message: format!("{key}: {e}"),
        body: raw,
    })
}

fn preview(body: &str) -> &str {
    let mut end = body.len().min(BODY_PREVIEW_LEN);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

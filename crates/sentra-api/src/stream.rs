// Stream descriptor endpoint

use tracing::debug;

use crate::client::LiveFeedClient;
use crate::error::Error;
use crate::models::StreamDescriptor;

impl LiveFeedClient {
    /// Fetch the stream descriptor for a camera.
    ///
    /// `GET stream/{id}/`. The returned URL is whatever the backend has on
    /// record; playability is judged by the caller.
    pub async fn get_stream(&self, camera_id: &str) -> Result<StreamDescriptor, Error> {
        let url = self.endpoint_url(&["stream", camera_id])?;
        debug!(camera_id, "fetching stream descriptor");
        self.get(url, "stream").await
    }
}

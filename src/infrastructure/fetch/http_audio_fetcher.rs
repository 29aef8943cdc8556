use std::io;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;

use crate::application::ports::{AudioFetcher, FetchError, RemoteAudio};
use crate::infrastructure::observability::sanitize_url;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Streams remote audio over HTTP(S). The body is handed back unread so the caller
/// can enforce its own size ceiling while copying.
pub struct HttpAudioFetcher {
    client: reqwest::Client,
}

impl HttpAudioFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT.min(timeout))
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AudioFetcher for HttpAudioFetcher {
    async fn open(&self, url: &str) -> Result<RemoteAudio, FetchError> {
        let safe_url = sanitize_url(url);
        tracing::debug!(url = %safe_url, "Fetching remote audio");

        let response = self.client.get(url).send().await.map_err(|e| {
            let e = e.without_url();
            tracing::warn!(url = %safe_url, error = %e, "Remote audio request failed");
            FetchError::Transport(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(url = %safe_url, status = status.as_u16(), "Remote audio returned error status");
            return Err(FetchError::Status(status.as_u16()));
        }

        let content_length = response.content_length();
        tracing::debug!(url = %safe_url, content_length = ?content_length, "Remote audio response received");

        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| io::Error::other(e.without_url())))
            .boxed();

        Ok(RemoteAudio {
            content_length,
            body,
        })
    }
}

use bytes::Bytes;
use engine_logging::engine_debug;
use futures_util::stream::BoxStream;
use futures_util::{StreamExt, TryStreamExt};
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use relay_core::ChatRequest;

use crate::http::{check_status, map_reqwest_error, HttpBackend};
use crate::{FailureKind, TransportError};

/// Finite, non-restartable sequence of body chunks.
pub type ChunkStream = BoxStream<'static, Result<Bytes, TransportError>>;

#[async_trait::async_trait]
pub trait ChatTransport: Send + Sync {
    /// Sends the question and resolves once response headers arrive.
    /// A non-success status is an error; the body is not read.
    async fn open(&self, request: &ChatRequest) -> Result<ChunkStream, TransportError>;
}

#[async_trait::async_trait]
impl ChatTransport for HttpBackend {
    async fn open(&self, request: &ChatRequest) -> Result<ChunkStream, TransportError> {
        let url = self.endpoint(&["api", "mattermost", "stream", "chat"]);
        let body = serde_json::to_vec(request)
            .map_err(|err| TransportError::new(FailureKind::Decode, err.to_string()))?;

        engine_debug!("POST {} ({} byte body)", url, body.len());
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .body(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        check_status(&response)?;

        Ok(response.bytes_stream().map_err(map_reqwest_error).boxed())
    }
}

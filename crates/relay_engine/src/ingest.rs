use engine_logging::engine_info;
use relay_core::IngestionRequest;

use crate::http::{check_status, map_reqwest_error, HttpBackend};
use crate::TransportError;

#[async_trait::async_trait]
pub trait IngestionClient: Send + Sync {
    /// Submits once; failures are reported, never retried.
    async fn submit(&self, request: &IngestionRequest) -> Result<(), TransportError>;
}

#[async_trait::async_trait]
impl IngestionClient for HttpBackend {
    async fn submit(&self, request: &IngestionRequest) -> Result<(), TransportError> {
        let mut url = self.endpoint(&["api", "mattermost", "ingest"]);
        url.query_pairs_mut().extend_pairs(request.query_pairs());

        engine_info!("POST {}", url);
        let response = self.client.post(url).send().await.map_err(map_reqwest_error)?;
        check_status(&response)
    }
}

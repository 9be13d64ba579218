/*
    remote - Client side of the document store protocol

    BoardStore is the trait seam; HttpBoardStore implements it over
    JSON-POST with reqwest. Neither operation retries internally: retry
    policy is the caller's, and in this design there is none beyond the
    next poll tick.
*/

use crate::config::SyncConfig;
use crate::errors::{SyncError, SyncResult};
use crate::protocol::{
    DocumentVersion, GetBoardRequest, GetBoardResponse, PushOutcome, SetBoardRequest,
    SetBoardResponse, API_VERSION,
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

mod memory;

pub use memory::MemoryBoardStore;

/// Operations against a per-identifier document store
#[async_trait]
pub trait BoardStore: Send + Sync {
    /// Request the store's current snapshot. `Ok(None)` means the store
    /// has no content yet; callers must not apply it.
    async fn fetch(&self, identifier: &str) -> SyncResult<Option<crate::protocol::Snapshot>>;

    /// Push a whole-document replace based on `source_version`. The
    /// store always accepts the write; the outcome reports whether it
    /// was still the newest at acceptance time.
    async fn push(
        &self,
        identifier: &str,
        source_version: DocumentVersion,
        content: &str,
    ) -> SyncResult<PushOutcome>;
}

/// HTTP client for the document store
pub struct HttpBoardStore {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpBoardStore {
    pub fn new(config: &SyncConfig) -> SyncResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(SyncError::from)?;
        Ok(HttpBoardStore { client, endpoint: config.endpoint.trim_end_matches('/').to_string() })
    }

    /// POST a JSON body and decode the JSON response. A 2xx with a null
    /// body decodes to `None`; non-2xx is a transport error.
    async fn post_json<Req, Resp>(&self, path: &str, request: &Req) -> SyncResult<Option<Resp>>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let url = format!("{}{}", self.endpoint, path);
        let response = self.client.post(&url).json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Transport {
                status: Some(status.as_u16()),
                cause: format!("{} returned {}", path, status),
            });
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| SyncError::Protocol(format!("undecodable {} response: {}", path, e)))?;
        if body.is_null() {
            debug!(path, "response body unexpectedly null");
            return Ok(None);
        }
        serde_json::from_value(body)
            .map(Some)
            .map_err(|e| SyncError::Protocol(format!("unexpected {} response shape: {}", path, e)))
    }
}

#[async_trait]
impl BoardStore for HttpBoardStore {
    async fn fetch(&self, identifier: &str) -> SyncResult<Option<crate::protocol::Snapshot>> {
        let request = GetBoardRequest::new(identifier);
        let response: Option<GetBoardResponse> = self.post_json("/api/get", &request).await?;
        // A null body means the store has nothing for us yet
        Ok(response.map(|r| crate::protocol::Snapshot {
            version: r.current_newest_whiteboard_version,
            content: r.content.unwrap_or_default(),
        }))
    }

    async fn push(
        &self,
        identifier: &str,
        source_version: DocumentVersion,
        content: &str,
    ) -> SyncResult<PushOutcome> {
        let request = SetBoardRequest {
            api_version: API_VERSION,
            identifier: identifier.to_string(),
            source_whiteboard_version: source_version,
            content: content.to_string(),
        };
        let response: Option<SetBoardResponse> = self.post_json("/api/set", &request).await?;
        let response =
            response.ok_or_else(|| SyncError::Protocol("null /api/set response body".into()))?;
        Ok(PushOutcome::from(response))
    }
}

/*
    protocol - Wire contract for the document store

    JSON-over-HTTP-POST request/response shapes for /api/get and
    /api/set, camelCase on the wire. Versions are assigned by the store
    and are the sole source of truth for "newer"; content travels as a
    compressed blob (see codec).
*/

use serde::{Deserialize, Serialize};

/// Store-assigned, monotonically non-decreasing document version
pub type DocumentVersion = i64;

/// Wire protocol version carried in every request
pub const API_VERSION: i64 = 1;

/// Sentinel for a client that has not yet observed any store version
pub const UNSYNCED_VERSION: DocumentVersion = -1;

/// Request body for POST /api/get
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetBoardRequest {
    pub api_version: i64,
    pub identifier: String,
}

impl GetBoardRequest {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self { api_version: API_VERSION, identifier: identifier.into() }
    }
}

/// Response body for POST /api/get
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetBoardResponse {
    pub current_newest_whiteboard_version: DocumentVersion,
    pub content: Option<String>,
}

/// Request body for POST /api/set
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetBoardRequest {
    pub api_version: i64,
    pub identifier: String,
    pub source_whiteboard_version: DocumentVersion,
    pub content: String,
}

/// Response body for POST /api/set
///
/// The store always accepts the write (last-writer-wins whole-document
/// replace) and reports three versions: the basis the caller presented,
/// the version that was newest immediately before this write landed,
/// and the version this write was assigned.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetBoardResponse {
    pub request_source_whiteboard_version: DocumentVersion,
    pub existing_newest_whiteboard_version: DocumentVersion,
    pub current_newest_whiteboard_version: DocumentVersion,
    pub content: String,
}

/// The full serialized document state at one version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub version: DocumentVersion,
    pub content: String,
}

/// Client-side view of an accepted push
#[derive(Debug, Clone)]
pub struct PushOutcome {
    /// Whether our declared basis version still matched the store's true
    /// newest version at acceptance time. False means a concurrent write
    /// raced ahead of us and `resulting_content` must be adopted locally.
    pub accepted_as_newest: bool,
    pub resulting_version: DocumentVersion,
    pub resulting_content: String,
}

impl From<SetBoardResponse> for PushOutcome {
    fn from(response: SetBoardResponse) -> Self {
        PushOutcome {
            accepted_as_newest: response.request_source_whiteboard_version
                == response.existing_newest_whiteboard_version,
            resulting_version: response.current_newest_whiteboard_version,
            resulting_content: response.content,
        }
    }
}

/*
    handlers.rs - /api/get and /api/set handlers

    JSON-over-POST per the wire contract in slateboard-core::protocol.
    The store always accepts a set (last-writer-wins replace) and
    reports the three versions the client needs to detect a raced push.
*/

use crate::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use slateboard_core::protocol::{
    GetBoardRequest, GetBoardResponse, SetBoardRequest, SetBoardResponse,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Error body for non-2xx API responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Wraps any handler failure into a JSON 500
pub struct ApiError(anyhow::Error);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse { error: self.0.to_string() };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        ApiError(err.into())
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// POST /api/get - newest snapshot for an identifier
pub async fn get_board(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GetBoardRequest>,
) -> ApiResult<Json<GetBoardResponse>> {
    debug!(identifier = %request.identifier, "get board");
    let board = state.boards.newest_or_create(&request.identifier).await;
    Ok(Json(GetBoardResponse {
        current_newest_whiteboard_version: board.version,
        content: Some(board.content),
    }))
}

/// POST /api/set - whole-document replace
pub async fn set_board(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SetBoardRequest>,
) -> ApiResult<Json<SetBoardResponse>> {
    info!(
        identifier = %request.identifier,
        source_version = request.source_whiteboard_version,
        "set board"
    );
    let result = state.boards.replace(&request.identifier, request.content).await;
    Ok(Json(SetBoardResponse {
        request_source_whiteboard_version: request.source_whiteboard_version,
        existing_newest_whiteboard_version: result.existing_newest_version,
        current_newest_whiteboard_version: result.current_newest_version,
        content: result.content,
    }))
}

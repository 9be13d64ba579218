//! Shared server state

use crate::store::BoardRepository;

/// State shared across requests
#[derive(Debug, Default)]
pub struct AppState {
    pub boards: BoardRepository,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }
}

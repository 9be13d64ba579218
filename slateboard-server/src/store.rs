/*
    store.rs - In-memory versioned board repository

    Per identifier: the newest content and its store-assigned version.
    Versions start at 1 and only ever increase. Writes are whole-document
    replaces; the repository reports which version was newest immediately
    before a write landed so clients can detect raced pushes.
*/

use slateboard_core::protocol::DocumentVersion;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct StoredBoard {
    pub version: DocumentVersion,
    pub content: String,
}

/// Result of a whole-document replace
#[derive(Debug, Clone)]
pub struct ReplaceResult {
    /// Version that was newest immediately before this write
    pub existing_newest_version: DocumentVersion,
    /// Version assigned to this write
    pub current_newest_version: DocumentVersion,
    /// The store's content after the write
    pub content: String,
}

#[derive(Debug, Default)]
pub struct BoardRepository {
    boards: RwLock<HashMap<String, StoredBoard>>,
}

impl BoardRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Newest snapshot for a board, lazily creating an empty board at
    /// version 1 when the identifier has never been seen.
    pub async fn newest_or_create(&self, identifier: &str) -> StoredBoard {
        let mut boards = self.boards.write().await;
        boards
            .entry(identifier.to_string())
            .or_insert_with(|| {
                info!(identifier, "board does not exist, creating empty board");
                StoredBoard { version: 1, content: String::new() }
            })
            .clone()
    }

    /// Replace a board's content wholesale, bumping the version. A
    /// never-seen identifier starts from a version 0 baseline so the
    /// first write lands as version 1.
    pub async fn replace(&self, identifier: &str, content: String) -> ReplaceResult {
        let mut boards = self.boards.write().await;
        let board = boards
            .entry(identifier.to_string())
            .or_insert_with(|| StoredBoard { version: 0, content: String::new() });

        let existing_newest_version = board.version;
        board.version = existing_newest_version + 1;
        board.content = content;
        debug!(identifier, version = board.version, "board replaced");

        ReplaceResult {
            existing_newest_version,
            current_newest_version: board.version,
            content: board.content.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_board_created_empty_at_version_one() {
        let repository = BoardRepository::new();
        let board = repository.newest_or_create("b").await;
        assert_eq!(board.version, 1);
        assert!(board.content.is_empty());
    }

    #[tokio::test]
    async fn test_replace_bumps_version_monotonically() {
        let repository = BoardRepository::new();
        repository.newest_or_create("b").await;
        let first = repository.replace("b", "one".into()).await;
        let second = repository.replace("b", "two".into()).await;
        assert_eq!(first.existing_newest_version, 1);
        assert_eq!(first.current_newest_version, 2);
        assert_eq!(second.existing_newest_version, 2);
        assert_eq!(second.current_newest_version, 3);
        assert_eq!(second.content, "two");
    }

    #[tokio::test]
    async fn test_replace_on_missing_board_lands_as_version_one() {
        let repository = BoardRepository::new();
        let result = repository.replace("fresh", "content".into()).await;
        assert_eq!(result.existing_newest_version, 0);
        assert_eq!(result.current_newest_version, 1);
    }
}

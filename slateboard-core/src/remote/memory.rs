/*
    memory.rs - In-memory document store

    Test double for BoardStore with the same version-assignment
    semantics as the real store: lazily created boards start at version
    1 with empty content, every accepted set bumps the version by one
    and replaces content wholesale. Counts fetches and pushes so tests
    can assert on exactly how many network calls a flow issued.
*/

use super::BoardStore;
use crate::errors::SyncResult;
use crate::protocol::{DocumentVersion, PushOutcome, Snapshot};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
struct StoredBoard {
    version: DocumentVersion,
    content: String,
}

/// Shared in-memory store; clone handles to simulate multiple clients
/// against one store.
#[derive(Clone, Default)]
pub struct MemoryBoardStore {
    boards: Arc<Mutex<HashMap<String, StoredBoard>>>,
    fetch_count: Arc<AtomicUsize>,
    push_count: Arc<AtomicUsize>,
}

impl MemoryBoardStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }

    pub fn push_count(&self) -> usize {
        self.push_count.load(Ordering::SeqCst)
    }

    /// Current newest version for a board, if it exists
    pub async fn newest_version(&self, identifier: &str) -> Option<DocumentVersion> {
        self.boards.lock().await.get(identifier).map(|b| b.version)
    }

    /// Seed or overwrite a board directly, bypassing the protocol
    /// (simulates another client's write landing)
    pub async fn seed(&self, identifier: &str, version: DocumentVersion, content: &str) {
        self.boards.lock().await.insert(
            identifier.to_string(),
            StoredBoard { version, content: content.to_string() },
        );
    }
}

#[async_trait]
impl BoardStore for MemoryBoardStore {
    async fn fetch(&self, identifier: &str) -> SyncResult<Option<Snapshot>> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        let mut boards = self.boards.lock().await;
        let board = boards
            .entry(identifier.to_string())
            .or_insert_with(|| StoredBoard { version: 1, content: String::new() });
        Ok(Some(Snapshot { version: board.version, content: board.content.clone() }))
    }

    async fn push(
        &self,
        identifier: &str,
        source_version: DocumentVersion,
        content: &str,
    ) -> SyncResult<PushOutcome> {
        self.push_count.fetch_add(1, Ordering::SeqCst);
        let mut boards = self.boards.lock().await;
        let board = boards
            .entry(identifier.to_string())
            .or_insert_with(|| StoredBoard { version: 0, content: String::new() });

        let existing_newest = board.version;
        board.version = existing_newest + 1;
        board.content = content.to_string();

        Ok(PushOutcome {
            accepted_as_newest: source_version == existing_newest,
            resulting_version: board.version,
            resulting_content: board.content.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_creates_empty_board_at_version_one() {
        let store = MemoryBoardStore::new();
        let snapshot = store.fetch("b").await.unwrap().unwrap();
        assert_eq!(snapshot.version, 1);
        assert!(snapshot.content.is_empty());
    }

    #[tokio::test]
    async fn test_push_bumps_version_and_replaces_content() {
        let store = MemoryBoardStore::new();
        store.fetch("b").await.unwrap();
        let outcome = store.push("b", 1, "blob-a").await.unwrap();
        assert!(outcome.accepted_as_newest);
        assert_eq!(outcome.resulting_version, 2);
        assert_eq!(outcome.resulting_content, "blob-a");
    }

    #[tokio::test]
    async fn test_raced_push_reports_stale_basis() {
        let store = MemoryBoardStore::new();
        store.fetch("b").await.unwrap();
        // Client B lands version 2 first
        store.push("b", 1, "from-b").await.unwrap();
        // Client A pushes with the stale basis 1
        let outcome = store.push("b", 1, "from-a").await.unwrap();
        assert!(!outcome.accepted_as_newest);
        assert_eq!(outcome.resulting_version, 3);
        // Replace-wins: A's content is what the store now holds
        assert_eq!(outcome.resulting_content, "from-a");
    }

    #[tokio::test]
    async fn test_call_counters() {
        let store = MemoryBoardStore::new();
        store.fetch("b").await.unwrap();
        store.fetch("b").await.unwrap();
        store.push("b", 1, "x").await.unwrap();
        assert_eq!(store.fetch_count(), 2);
        assert_eq!(store.push_count(), 1);
    }
}

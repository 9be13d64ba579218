/*
    session - Per-document sync state

    One SyncSession value per open document, owned by its coordinator
    and passed explicitly. Holds the last version/content known to be
    in sync with the store (VersionState), the echo-suppression state,
    and the per-browser-session client identifier.
*/

use crate::protocol::{DocumentVersion, UNSYNCED_VERSION};

mod storage;

pub use storage::{ClientSessionId, MemorySessionStorage, NullSessionStorage, SessionStorage};

/// The most recent snapshot observed from the store for one document.
///
/// `last_known_version` only ever increases; `observe` is the single
/// place it is updated.
#[derive(Debug, Clone)]
pub struct VersionState {
    last_known_version: DocumentVersion,
    last_known_content: Option<String>,
}

impl VersionState {
    pub fn new() -> Self {
        VersionState { last_known_version: UNSYNCED_VERSION, last_known_content: None }
    }

    /// The newness test: adopt `(version, content)` only when `version`
    /// is strictly greater than everything seen so far. Returns whether
    /// the snapshot was adopted. Strict inequality makes redelivery of
    /// the same version a no-op.
    pub fn observe(&mut self, version: DocumentVersion, content: &str) -> bool {
        if version > self.last_known_version {
            self.last_known_version = version;
            self.last_known_content = Some(content.to_string());
            true
        } else {
            false
        }
    }

    pub fn last_known_version(&self) -> DocumentVersion {
        self.last_known_version
    }

    pub fn last_known_content(&self) -> Option<&str> {
        self.last_known_content.as_deref()
    }
}

impl Default for VersionState {
    fn default() -> Self {
        Self::new()
    }
}

/// Transient flag covering the window from the moment a remote snapshot
/// is handed to the editing surface until the change notification that
/// apply re-fires has been swallowed. Distinguishes "listener fired
/// because we applied a remote snapshot" from a genuine local edit.
#[derive(Debug, Default)]
pub struct SuppressionFlag {
    armed: bool,
}

impl SuppressionFlag {
    pub fn arm(&mut self) {
        self.armed = true;
    }

    pub fn disarm(&mut self) {
        self.armed = false;
    }

    /// Consume the flag. Returns true exactly once per arming.
    pub fn consume(&mut self) -> bool {
        std::mem::take(&mut self.armed)
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }
}

/// Process-local sync state for one document identifier
#[derive(Debug)]
pub struct SyncSession {
    identifier: String,
    client_id: ClientSessionId,
    version_state: VersionState,
    suppression: SuppressionFlag,
}

impl SyncSession {
    pub fn new(identifier: impl Into<String>, client_id: ClientSessionId) -> Self {
        SyncSession {
            identifier: identifier.into(),
            client_id,
            version_state: VersionState::new(),
            suppression: SuppressionFlag::default(),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn client_id(&self) -> &ClientSessionId {
        &self.client_id
    }

    pub fn version_state(&self) -> &VersionState {
        &self.version_state
    }

    pub fn version_state_mut(&mut self) -> &mut VersionState {
        &mut self.version_state
    }

    pub fn suppression(&self) -> &SuppressionFlag {
        &self.suppression
    }

    pub fn suppression_mut(&mut self) -> &mut SuppressionFlag {
        &mut self.suppression
    }

    /// Echo check: is this freshly serialized+compressed snapshot
    /// byte-identical to the last content observed from the store?
    /// Equality is always on the compressed form; comparing decompressed
    /// XML would give false positives from non-canonical serialization.
    pub fn is_echo(&self, compressed: &str) -> bool {
        self.version_state.last_known_content() == Some(compressed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_session() -> SyncSession {
        SyncSession::new("board-1", ClientSessionId::generate())
    }

    #[test]
    fn test_version_state_starts_unsynced() {
        let state = VersionState::new();
        assert_eq!(state.last_known_version(), UNSYNCED_VERSION);
        assert!(state.last_known_content().is_none());
    }

    #[test]
    fn test_observe_adopts_newer_version() {
        let mut state = VersionState::new();
        assert!(state.observe(1, "v1"));
        assert_eq!(state.last_known_version(), 1);
        assert_eq!(state.last_known_content(), Some("v1"));
    }

    #[test]
    fn test_observe_rejects_same_version() {
        let mut state = VersionState::new();
        assert!(state.observe(3, "v3"));
        assert!(!state.observe(3, "v3-redelivered"));
        assert_eq!(state.last_known_content(), Some("v3"));
    }

    #[test]
    fn test_observe_rejects_older_version() {
        let mut state = VersionState::new();
        assert!(state.observe(5, "v5"));
        assert!(!state.observe(4, "v4"));
        assert_eq!(state.last_known_version(), 5);
    }

    #[test]
    fn test_version_is_monotonic_over_any_sequence() {
        let mut state = VersionState::new();
        let mut highest = UNSYNCED_VERSION;
        for version in [2, 1, 5, 3, 5, 7, 6] {
            state.observe(version, "content");
            highest = highest.max(version);
            assert_eq!(state.last_known_version(), highest);
        }
    }

    #[test]
    fn test_suppression_consumes_once() {
        let mut flag = SuppressionFlag::default();
        assert!(!flag.consume());
        flag.arm();
        assert!(flag.consume());
        assert!(!flag.consume());
    }

    #[test]
    fn test_echo_matches_compressed_form_only() {
        let mut session = test_session();
        session.version_state_mut().observe(1, "compressed-blob");
        assert!(session.is_echo("compressed-blob"));
        assert!(!session.is_echo("different-blob"));
    }

    #[test]
    fn test_fresh_session_has_no_echo() {
        let session = test_session();
        assert!(!session.is_echo(""));
    }
}

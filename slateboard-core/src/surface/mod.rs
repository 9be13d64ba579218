/*
    surface - Seam to the external editing surface

    The drawing/editing library is an external collaborator. Instead of
    patching its internals, the sync core talks to it through the small
    EditorSurface trait; change notifications flow out-of-band into the
    coordinator's event channel, wired up by the embedder.
*/

use crate::codec;
use crate::errors::SyncResult;
use tracing::debug;

mod memory;

pub use memory::MemoryEditor;

/// The operations the sync core needs from an editing surface.
///
/// Implemented once against the real editor library and once as an
/// in-memory test double (`MemoryEditor`).
pub trait EditorSurface: Send {
    /// Serialize the full current document state
    fn snapshot(&self) -> SyncResult<String>;

    /// Replace the document model wholesale with a decoded snapshot.
    /// Implementations clear undo history around the replace (a
    /// remote-origin change must never be undone by a local undo) and
    /// re-select surviving element identifiers best-effort.
    fn apply_snapshot(&mut self, document: &str) -> SyncResult<()>;

    /// Disable/enable local editing, used to hold edits back while a
    /// push is outstanding.
    fn set_editing_enabled(&mut self, enabled: bool);
}

/// Applies fetched/returned snapshots onto the live editing surface.
pub struct LocalDocumentAdapter;

impl LocalDocumentAdapter {
    /// Decompress a content blob and hand it to the surface. Empty or
    /// absent content is a no-op. Returns whether a replace actually
    /// happened, so the caller knows whether to expect an echo.
    pub fn apply(surface: &mut dyn EditorSurface, blob: &str) -> SyncResult<bool> {
        if blob.is_empty() {
            debug!("content is empty, not applying");
            return Ok(false);
        }
        let document = codec::decompress(blob)?;
        surface.apply_snapshot(&document)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_empty_blob_is_noop() {
        let mut editor = MemoryEditor::new("client-a");
        assert!(!LocalDocumentAdapter::apply(&mut editor, "").unwrap());
    }

    #[test]
    fn test_apply_replaces_document() {
        let mut editor = MemoryEditor::new("client-a");
        let blob = codec::compress("<cell id=\"x\" value=\"box\"/>").unwrap();
        assert!(LocalDocumentAdapter::apply(&mut editor, &blob).unwrap());
        assert_eq!(editor.cell_value("x").as_deref(), Some("box"));
    }

    #[test]
    fn test_apply_corrupt_blob_errors_without_touching_model() {
        let mut editor = MemoryEditor::new("client-a");
        editor.insert_cell("1", "keep me");
        let before = editor.snapshot().unwrap();
        assert!(LocalDocumentAdapter::apply(&mut editor, "!!not a blob!!").is_err());
        assert_eq!(editor.snapshot().unwrap(), before);
    }
}

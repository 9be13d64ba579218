/*
    memory.rs - In-memory editing surface

    Test double for the external editor: a flat cell model with a
    selection set and an undo counter, serialized as one element per
    line. Faithfully reproduces the behaviors the sync core has to cope
    with, in particular re-firing the change notification channel when
    a snapshot is applied (the echo the suppression flag swallows).
*/

use super::EditorSurface;
use crate::coordinator::SyncEvent;
use crate::errors::{SyncError, SyncResult};
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::mpsc::UnboundedSender;

/// In-memory editor model
pub struct MemoryEditor {
    /// Element id -> value, BTreeMap so serialization is deterministic
    cells: BTreeMap<String, String>,
    selection: BTreeSet<String>,
    undo_depth: usize,
    editing_enabled: bool,
    id_prefix: String,
    changes: Option<UnboundedSender<SyncEvent>>,
    next_local_id: u64,
}

impl MemoryEditor {
    pub fn new(id_prefix: impl Into<String>) -> Self {
        MemoryEditor {
            cells: BTreeMap::new(),
            selection: BTreeSet::new(),
            undo_depth: 0,
            editing_enabled: true,
            id_prefix: id_prefix.into(),
            changes: None,
            next_local_id: 1,
        }
    }

    /// Wire the editor's change event to the coordinator's event channel
    pub fn with_change_channel(mut self, sender: UnboundedSender<SyncEvent>) -> Self {
        self.changes = Some(sender);
        self
    }

    /// Wire the change event after construction (the coordinator hands
    /// out its sender only once it exists)
    pub fn set_change_channel(&mut self, sender: UnboundedSender<SyncEvent>) {
        self.changes = Some(sender);
    }

    fn notify_change(&self) {
        if let Some(sender) = &self.changes {
            let _ = sender.send(SyncEvent::LocalChange);
        }
    }

    /// Insert a cell with an explicit local id; the stored id is
    /// namespaced with the client prefix so concurrent clients cannot
    /// collide. Ignored while editing is disabled.
    pub fn insert_cell(&mut self, local_id: &str, value: &str) -> Option<String> {
        if !self.editing_enabled {
            return None;
        }
        let id = format!("{}_{}", self.id_prefix, local_id);
        self.cells.insert(id.clone(), value.to_string());
        self.undo_depth += 1;
        self.notify_change();
        Some(id)
    }

    /// Insert a cell with an auto-assigned local id
    pub fn add_cell(&mut self, value: &str) -> Option<String> {
        let local_id = self.next_local_id.to_string();
        self.next_local_id += 1;
        self.insert_cell(&local_id, value)
    }

    /// Update an existing cell's value. Ignored while editing is
    /// disabled or when the cell does not exist.
    pub fn set_cell_value(&mut self, id: &str, value: &str) -> bool {
        if !self.editing_enabled || !self.cells.contains_key(id) {
            return false;
        }
        self.cells.insert(id.to_string(), value.to_string());
        self.undo_depth += 1;
        self.notify_change();
        true
    }

    pub fn cell_value(&self, id: &str) -> Option<String> {
        self.cells.get(id).cloned()
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn select(&mut self, ids: &[&str]) {
        self.selection = ids.iter().map(|id| id.to_string()).collect();
    }

    pub fn selection(&self) -> Vec<String> {
        self.selection.iter().cloned().collect()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_depth
    }

    pub fn is_editing_enabled(&self) -> bool {
        self.editing_enabled
    }
}

impl EditorSurface for MemoryEditor {
    fn snapshot(&self) -> SyncResult<String> {
        let mut document = String::new();
        for (id, value) in &self.cells {
            document.push_str(&format!("<cell id=\"{}\" value=\"{}\"/>\n", id, value));
        }
        Ok(document)
    }

    fn apply_snapshot(&mut self, document: &str) -> SyncResult<()> {
        let cells = parse_cells(document)?;

        // Remote-origin changes must never be undoable locally
        self.undo_depth = 0;
        let previous_selection = std::mem::take(&mut self.selection);
        self.cells = cells;
        // Best-effort reselect: identifiers gone after the replace are dropped
        self.selection = previous_selection
            .into_iter()
            .filter(|id| self.cells.contains_key(id))
            .collect();
        self.undo_depth = 0;

        // The real editor re-fires its change event when the model is
        // decoded back into it; reproduce that here
        self.notify_change();
        Ok(())
    }

    fn set_editing_enabled(&mut self, enabled: bool) {
        self.editing_enabled = enabled;
    }
}

fn parse_cells(document: &str) -> SyncResult<BTreeMap<String, String>> {
    let mut cells = BTreeMap::new();
    for line in document.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let id = extract_attr(line, "id")
            .ok_or_else(|| SyncError::Surface(format!("cell without id: {}", line)))?;
        let value = extract_attr(line, "value").unwrap_or_default();
        cells.insert(id, value);
    }
    Ok(cells)
}

fn extract_attr(line: &str, name: &str) -> Option<String> {
    let marker = format!("{}=\"", name);
    let start = line.find(&marker)? + marker.len();
    let end = line[start..].find('"')? + start;
    Some(line[start..end].to_string())
}

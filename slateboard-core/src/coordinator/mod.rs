/*
    coordinator - Sync coordinator for one open document

    Owns the SyncSession, the poll scheduler, and the seams to the
    store and the editing surface. A single event-loop task processes
    local change notifications and poll ticks sequentially, which gives
    the required ordering guarantee for free: at most one push is in
    flight per document, and the surface is disabled while it is.

    Control flow is sequential awaits: push -> ack -> update version
    state -> conditionally reapply -> ensure the scheduler is armed.
*/

use crate::codec;
use crate::config::SyncConfig;
use crate::remote::BoardStore;
use crate::scheduler::PollScheduler;
use crate::session::SyncSession;
use crate::surface::{EditorSurface, LocalDocumentAdapter};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

/// Events fed to the coordinator by the embedder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncEvent {
    /// The editing surface reported a model change
    LocalChange,
    /// The window gained focus
    FocusGained,
    /// The window lost focus
    FocusLost,
    /// A text cell entered inline editing
    TextEditStarted,
    /// Inline text editing finished
    TextEditStopped,
    /// Stop the coordinator loop
    Shutdown,
}

/// Coordinates one document's replica against the store
pub struct SyncCoordinator<S: BoardStore, E: EditorSurface> {
    store: S,
    surface: E,
    session: SyncSession,
    scheduler: PollScheduler,
    events: UnboundedReceiver<SyncEvent>,
    text_edit_in_progress: bool,
}

impl<S: BoardStore, E: EditorSurface> SyncCoordinator<S, E> {
    /// Build a coordinator and the sender the embedder wires editor and
    /// focus events into.
    pub fn new(
        store: S,
        surface: E,
        session: SyncSession,
        config: &SyncConfig,
    ) -> (Self, UnboundedSender<SyncEvent>) {
        let (sender, events) = unbounded_channel();
        let coordinator = SyncCoordinator {
            store,
            surface,
            session,
            scheduler: PollScheduler::new(config.poll_interval),
            events,
            text_edit_in_progress: false,
        };
        (coordinator, sender)
    }

    pub fn session(&self) -> &SyncSession {
        &self.session
    }

    pub fn surface(&self) -> &E {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut E {
        &mut self.surface
    }

    pub fn scheduler(&self) -> &PollScheduler {
        &self.scheduler
    }

    /// Run until the event channel closes or a Shutdown event arrives.
    /// The scheduler starts Active with an immediate first fetch.
    pub async fn run(mut self) -> Self {
        info!(identifier = %self.session.identifier(), "sync coordinator started");
        loop {
            tokio::select! {
                maybe_event = self.events.recv() => match maybe_event {
                    None | Some(SyncEvent::Shutdown) => break,
                    Some(event) => self.process_event(event).await,
                },
                _ = self.scheduler.tick() => self.poll_once().await,
            }
        }
        info!(identifier = %self.session.identifier(), "sync coordinator stopped");
        self
    }

    /// Process every event already queued on the channel without
    /// blocking, for embedders that pump the coordinator manually
    /// instead of running the loop.
    pub async fn pump(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            if event == SyncEvent::Shutdown {
                break;
            }
            self.process_event(event).await;
        }
    }

    /// Process one event. Public so tests can drive the coordinator
    /// deterministically without the loop.
    pub async fn process_event(&mut self, event: SyncEvent) {
        match event {
            SyncEvent::LocalChange => self.push_local_change().await,
            SyncEvent::FocusGained => {
                debug!("gained focus, ensuring refresh timer is running");
                self.scheduler.resume();
            }
            SyncEvent::FocusLost => {
                debug!("lost focus, halting refresh timer");
                self.scheduler.pause();
            }
            SyncEvent::TextEditStarted => {
                self.text_edit_in_progress = true;
            }
            SyncEvent::TextEditStopped => {
                if self.text_edit_in_progress {
                    self.text_edit_in_progress = false;
                    self.push_local_change().await;
                }
            }
            SyncEvent::Shutdown => {}
        }
    }

    /// One poll cycle: fetch the store's newest snapshot and apply it
    /// if the newness test passes. Always rearms the scheduler.
    pub async fn poll_once(&mut self) {
        if self.text_edit_in_progress {
            debug!("text edit in progress, skipping this fetch");
            self.scheduler.rearm();
            return;
        }

        match self.store.fetch(self.session.identifier()).await {
            Err(error) => {
                // Abandoned, not retried; the next tick covers recovery
                warn!(%error, "fetch failed");
            }
            Ok(None) => {
                debug!("store has no content yet");
            }
            Ok(Some(snapshot)) => {
                if self.session.version_state_mut().observe(snapshot.version, &snapshot.content) {
                    debug!(version = snapshot.version, "adopting newer remote snapshot");
                    self.apply_remote(&snapshot.content);
                } else {
                    debug!(version = snapshot.version, "snapshot is not newer, discarding");
                }
            }
        }

        self.scheduler.rearm();
    }

    /// React to a local change notification: serialize, compress, and
    /// push unless one of the echo guards swallows it.
    async fn push_local_change(&mut self) {
        // Secondary guard: this notification was caused by us applying
        // a remote snapshot onto the surface, not by a genuine edit
        if self.session.suppression_mut().consume() {
            debug!("suppressing change notification from our own apply");
            return;
        }
        if self.text_edit_in_progress {
            debug!("text edit in progress, suppressing push");
            return;
        }

        let document = match self.surface.snapshot() {
            Ok(document) => document,
            Err(error) => {
                warn!(%error, "could not serialize surface, skipping push");
                return;
            }
        };
        let compressed = match codec::compress(&document) {
            Ok(compressed) => compressed,
            Err(error) => {
                warn!(%error, "could not compress snapshot, skipping push");
                return;
            }
        };

        // Primary guard: the edit event fired but produced no net
        // content change (selection-only change, immediately undone
        // edit). Compared on the compressed form.
        if self.session.is_echo(&compressed) {
            debug!("change event but content is unchanged, skipping push");
            return;
        }

        // Hold further edits back while the push is outstanding so two
        // pushes can never race on the same source version
        self.surface.set_editing_enabled(false);
        let source_version = self.session.version_state().last_known_version();
        let result = self.store.push(self.session.identifier(), source_version, &compressed).await;
        self.surface.set_editing_enabled(true);

        match result {
            Err(error) => {
                warn!(%error, "push failed, store will be reconciled on the next poll");
            }
            Ok(outcome) => {
                let adopted = self
                    .session
                    .version_state_mut()
                    .observe(outcome.resulting_version, &outcome.resulting_content);
                if adopted && !outcome.accepted_as_newest {
                    // A concurrent write raced ahead of our basis; adopt
                    // the store's actual newest state or we diverge
                    info!(
                        version = outcome.resulting_version,
                        "push was superseded, adopting store content"
                    );
                    self.apply_remote(&outcome.resulting_content);
                } else if adopted {
                    // Accepted as newest: the surface already shows this
                    // content, re-applying would be a redundant decode
                    debug!(version = outcome.resulting_version, "push accepted as newest");
                }
            }
        }

        self.scheduler.ensure_running();
    }

    /// Hand a remote content blob to the surface, arming the
    /// suppression flag for the change notification the apply re-fires.
    fn apply_remote(&mut self, blob: &str) {
        self.session.suppression_mut().arm();
        match LocalDocumentAdapter::apply(&mut self.surface, blob) {
            Ok(true) => {}
            Ok(false) => {
                // Nothing was applied, so no echo is coming
                self.session.suppression_mut().disarm();
            }
            Err(error) => {
                // Corrupt snapshot is fatal to this snapshot only
                warn!(%error, "skipping undecodable snapshot");
                self.session.suppression_mut().disarm();
            }
        }
    }
}

/*
    slateboard-core - Document synchronization core

    Keeps replicas of one shared diagram converging over discrete
    poll/push calls against a version-assigning document store. No
    persistent connection: a focus-aware scheduler pulls, local edits
    push, and optimistic version comparison resolves the rest.
*/

pub mod codec;
pub mod config;
pub mod coordinator;
pub mod errors;
pub mod logging;
pub mod protocol;
pub mod remote;
pub mod scheduler;
pub mod session;
pub mod surface;

pub use config::SyncConfig;
pub use coordinator::{SyncCoordinator, SyncEvent};
pub use errors::{SyncError, SyncResult};
pub use logging::{init_logging, init_logging_with_config, LogConfig, LogLevel};
pub use protocol::{DocumentVersion, PushOutcome, Snapshot};
pub use remote::{BoardStore, HttpBoardStore, MemoryBoardStore};
pub use session::{ClientSessionId, SessionStorage, SyncSession};
pub use surface::{EditorSurface, MemoryEditor};

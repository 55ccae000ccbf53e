//! Storygraph Sync
//!
//! The editing surface of the story graph engine. [`GraphEditor`] ties
//! the model, the layout file, and the script synchronizer together:
//! every edit keeps all three consistent and notifies observers. The
//! [`SyncCoordinator`] runs bulk jobs off the editing thread, with
//! progress reporting and cooperative cancellation: pushing the whole
//! graph into script files, or planning a graph rebuild from them.

#![warn(missing_docs)]

pub mod coordinator;
pub mod error;
pub mod facade;
pub mod state;

// Re-exports
pub use coordinator::{
    plan_rebuild, PlannedScene, RebuildPlan, SyncCoordinator, SyncItem, SyncProgress, SyncReport,
};
pub use error::EditorError;
pub use facade::GraphEditor;
pub use state::{allowed_transitions, validate_transition, SyncState};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for editing and synchronization
    pub use crate::{
        EditorError, GraphEditor, RebuildPlan, SyncCoordinator, SyncItem, SyncProgress,
        SyncReport, SyncState,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

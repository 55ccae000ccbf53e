//! Error types for editing and synchronization.

use crate::state::SyncState;
use storygraph_core::GraphError;
use storygraph_layout::LayoutError;
use storygraph_script::ScriptError;

/// Errors raised by the editing facade and the sync coordinator.
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    /// Graph model rejection.
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    /// Script file failure.
    #[error("script error: {0}")]
    Script(#[from] ScriptError),

    /// Layout file failure.
    #[error("layout error: {0}")]
    Layout(#[from] LayoutError),

    /// Illegal sync state transition.
    #[error("invalid sync transition: {from} -> {to}")]
    InvalidTransition {
        /// Current state.
        from: SyncState,
        /// Requested state.
        to: SyncState,
    },

    /// A job is already in flight.
    #[error("sync already running")]
    SyncBusy,

    /// No node with this id exists.
    #[error("unknown node: {0}")]
    UnknownNode(String),

    /// The property name is not one the editor exposes.
    #[error("unknown property: {0}")]
    UnknownProperty(String),

    /// The property exists but the value does not parse.
    #[error("invalid value for {property}: {value}")]
    InvalidValue {
        /// Property name.
        property: String,
        /// Offending value.
        value: String,
    },
}

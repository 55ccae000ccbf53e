//! Error types for graph model operations.

use crate::handle::NodeHandle;

/// Errors raised by [`crate::GraphModel`] mutations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// A node with this id already exists.
    #[error("duplicate node id: {0}")]
    DuplicateNodeId(String),

    /// No node with this id exists.
    #[error("node not found: {0}")]
    NodeNotFound(String),

    /// The handle's slot was recycled or never issued.
    #[error("stale node handle: {0}")]
    StaleHandle(NodeHandle),

    /// An edge from a node to itself.
    #[error("self loop on node: {0}")]
    SelfLoop(String),

    /// The edge is already present.
    #[error("duplicate edge: {from} -> {to}")]
    DuplicateEdge {
        /// Source node id.
        from: String,
        /// Target node id.
        to: String,
    },

    /// Inserting the edge would close a directed cycle.
    #[error("edge would create cycle: {from} -> {to}")]
    WouldCreateCycle {
        /// Source node id.
        from: String,
        /// Target node id.
        to: String,
    },
}

impl GraphError {
    /// Whether the failure is a structural rejection (as opposed to a
    /// lookup miss), meaning the model itself was left untouched but the
    /// requested link is never going to be legal as-is.
    #[inline]
    #[must_use]
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::SelfLoop(_) | Self::DuplicateEdge { .. } | Self::WouldCreateCycle { .. }
        )
    }
}

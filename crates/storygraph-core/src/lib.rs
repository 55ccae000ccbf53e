//! Storygraph Core
//!
//! The in-memory model behind a visual editor for branching narrative
//! scripts: an acyclic directed graph of scenes, dialogue lines, choices,
//! and condition branches.
//!
//! # Overview
//!
//! - **GraphModel**: arena-backed node storage with generation-checked
//!   handles, an id index, and validated edge insertion
//! - **would_create_cycle**: pure reachability check used before every
//!   edge insert
//! - **Observers**: synchronous fan-out of [`GraphEvent`]s to registered
//!   listeners
//!
//! # Example
//!
//! ```rust
//! use storygraph_core::{GraphModel, NodeData, NodeKind};
//!
//! let mut model = GraphModel::new();
//! let intro = model.add_node(NodeData::new("intro", NodeKind::Scene)).unwrap();
//! let forest = model.add_node(NodeData::new("forest", NodeKind::Scene)).unwrap();
//!
//! model.add_edge(intro, forest).unwrap();
//! // The reverse edge would close a cycle and is rejected.
//! assert!(model.add_edge(forest, intro).is_err());
//! ```

#![warn(missing_docs)]

pub mod cycle;
pub mod error;
pub mod events;
pub mod handle;
pub mod model;
pub mod node;

// Re-exports
pub use cycle::would_create_cycle;
pub use error::GraphError;
pub use events::{GraphEvent, Observers};
pub use handle::NodeHandle;
pub use model::GraphModel;
pub use node::{NodeData, NodeKind, Position};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for graph model operations
    pub use crate::{
        would_create_cycle, GraphError, GraphEvent, GraphModel, NodeData, NodeHandle, NodeKind,
        Observers, Position,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

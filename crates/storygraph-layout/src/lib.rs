//! Storygraph Layout
//!
//! Canvas placement for story graph nodes: a BFS-layered auto layout
//! engine and the JSON layout file that persists positions and node
//! payloads between editor sessions.

#![warn(missing_docs)]

pub mod engine;
pub mod error;
pub mod store;

// Re-exports
pub use engine::{auto_layout, LayoutConfig};
pub use error::LayoutError;
pub use store::{LayoutDocument, LayoutRecord, LayoutStore};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for layout operations
    pub use crate::{auto_layout, LayoutConfig, LayoutDocument, LayoutError, LayoutStore};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

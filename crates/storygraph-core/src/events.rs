//! Change notifications for editor surfaces.
//!
//! The facade emits one event per completed mutation; listeners run
//! synchronously in registration order. Events carry node ids rather
//! than handles so listeners can outlive individual nodes.

use parking_lot::RwLock;
use std::sync::Arc;

/// A completed change to the story graph.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphEvent {
    /// A node was added.
    NodeAdded {
        /// Id of the new node.
        id: String,
    },
    /// A node (and its incident edges) was removed.
    NodeRemoved {
        /// Id the node had.
        id: String,
    },
    /// A node changed id.
    NodeRenamed {
        /// Previous id.
        old_id: String,
        /// New id.
        new_id: String,
    },
    /// An edge was inserted.
    EdgeAdded {
        /// Source node id.
        from: String,
        /// Target node id.
        to: String,
    },
    /// An edge was removed.
    EdgeRemoved {
        /// Source node id.
        from: String,
        /// Target node id.
        to: String,
    },
    /// One or more nodes moved on the canvas.
    NodesMoved {
        /// Ids of the moved nodes.
        ids: Vec<String>,
    },
    /// The entry marker changed.
    EntryChanged {
        /// New entry node id, or `None` when cleared.
        id: Option<String>,
    },
    /// A node property was edited.
    PropertyChanged {
        /// Node id.
        id: String,
        /// Property name as the editor spells it.
        property: String,
    },
    /// The whole graph was rebuilt from script files.
    GraphRebuilt,
}

type Listener = Arc<dyn Fn(&GraphEvent) + Send + Sync>;

/// Registry of graph event listeners.
#[derive(Default)]
pub struct Observers {
    listeners: RwLock<Vec<Listener>>,
}

impl Observers {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. Listeners are never unregistered; they live
    /// as long as the registry.
    pub fn subscribe(&self, listener: impl Fn(&GraphEvent) + Send + Sync + 'static) {
        self.listeners.write().push(Arc::new(listener));
    }

    /// Deliver an event to every listener in registration order.
    ///
    /// The list is snapshotted first, so a listener may subscribe
    /// further listeners; they only see later events.
    pub fn emit(&self, event: &GraphEvent) {
        let listeners: Vec<Listener> = self.listeners.read().clone();
        for listener in &listeners {
            listener(event);
        }
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.read().len()
    }

    /// Whether no listeners are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.read().is_empty()
    }
}

impl std::fmt::Debug for Observers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observers")
            .field("listeners", &self.len())
            .finish()
    }
}

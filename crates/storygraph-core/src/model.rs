//! Arena-backed story graph model.

use crate::cycle::would_create_cycle;
use crate::error::GraphError;
use crate::handle::NodeHandle;
use crate::node::{NodeData, Position};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    data: Option<NodeData>,
}

/// The editor's in-memory story graph.
///
/// Nodes live in an arena of recycled slots and are addressed by
/// [`NodeHandle`]s; a handle to a removed node fails its generation
/// check rather than aliasing a later occupant. Edges are kept in
/// insertion order, which is also the branch order shown in the editor
/// and written to script files. The graph is acyclic at all times:
/// every insert is validated first.
#[derive(Debug, Default)]
pub struct GraphModel {
    slots: Vec<Slot>,
    free: Vec<u32>,
    ids: HashMap<String, NodeHandle>,
    edges: Vec<(NodeHandle, NodeHandle)>,
    entry: Option<NodeHandle>,
}

impl GraphModel {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live nodes.
    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.ids.len()
    }

    /// Number of edges.
    #[inline]
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// All edges in insertion order.
    #[inline]
    #[must_use]
    pub fn edges(&self) -> &[(NodeHandle, NodeHandle)] {
        &self.edges
    }

    /// Insert a node.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DuplicateNodeId`] when a node with the same
    /// id already exists.
    pub fn add_node(&mut self, data: NodeData) -> Result<NodeHandle, GraphError> {
        if self.ids.contains_key(&data.id) {
            return Err(GraphError::DuplicateNodeId(data.id));
        }

        let handle = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.data = Some(data);
                NodeHandle {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
                self.slots.push(Slot {
                    generation: 0,
                    data: Some(data),
                });
                NodeHandle {
                    index,
                    generation: 0,
                }
            }
        };

        let id = self.slots[handle.index as usize]
            .data
            .as_ref()
            .map(|d| d.id.clone())
            .unwrap_or_default();
        debug!(node = %id, %handle, "node added");
        self.ids.insert(id, handle);
        Ok(handle)
    }

    /// Remove a node and every edge touching it.
    ///
    /// Other nodes' handles are unaffected; the slot is recycled with a
    /// bumped generation. Clears the entry marker when it pointed here.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::StaleHandle`] for an invalid handle.
    pub fn remove_node(&mut self, handle: NodeHandle) -> Result<NodeData, GraphError> {
        self.check(handle)?;
        let slot = &mut self.slots[handle.index as usize];
        let data = slot.data.take().ok_or(GraphError::StaleHandle(handle))?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);

        self.ids.remove(&data.id);
        self.edges.retain(|&(a, b)| a != handle && b != handle);
        if self.entry == Some(handle) {
            self.entry = None;
        }
        debug!(node = %data.id, "node removed");
        Ok(data)
    }

    /// Borrow a node's data.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::StaleHandle`] for an invalid handle.
    pub fn node(&self, handle: NodeHandle) -> Result<&NodeData, GraphError> {
        self.check(handle)?;
        self.slots[handle.index as usize]
            .data
            .as_ref()
            .ok_or(GraphError::StaleHandle(handle))
    }

    /// Mutably borrow a node's data.
    ///
    /// The id field must not be edited through this borrow; use
    /// [`GraphModel::rename`] so the id index stays consistent.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::StaleHandle`] for an invalid handle.
    pub fn node_mut(&mut self, handle: NodeHandle) -> Result<&mut NodeData, GraphError> {
        self.check(handle)?;
        self.slots[handle.index as usize]
            .data
            .as_mut()
            .ok_or(GraphError::StaleHandle(handle))
    }

    /// Look up a node by id.
    #[must_use]
    pub fn resolve(&self, id: &str) -> Option<NodeHandle> {
        self.ids.get(id).copied()
    }

    /// Whether the handle refers to a live node.
    #[must_use]
    pub fn contains(&self, handle: NodeHandle) -> bool {
        self.check(handle).is_ok()
    }

    /// Iterate over all live nodes.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeHandle, &NodeData)> {
        self.ids.values().filter_map(move |&handle| {
            self.slots[handle.index as usize]
                .data
                .as_ref()
                .map(|data| (handle, data))
        })
    }

    /// Handles of all live nodes.
    #[must_use]
    pub fn handles(&self) -> Vec<NodeHandle> {
        self.ids.values().copied().collect()
    }

    /// Change a node's id, keeping the id index consistent.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DuplicateNodeId`] when the new id is taken
    /// by another node, or [`GraphError::StaleHandle`] for an invalid
    /// handle.
    pub fn rename(&mut self, handle: NodeHandle, new_id: impl Into<String>) -> Result<(), GraphError> {
        let new_id = new_id.into();
        self.check(handle)?;
        if let Some(&other) = self.ids.get(&new_id) {
            if other != handle {
                return Err(GraphError::DuplicateNodeId(new_id));
            }
            return Ok(());
        }
        let data = self.slots[handle.index as usize]
            .data
            .as_mut()
            .ok_or(GraphError::StaleHandle(handle))?;
        let old_id = std::mem::replace(&mut data.id, new_id.clone());
        self.ids.remove(&old_id);
        self.ids.insert(new_id, handle);
        Ok(())
    }

    /// Insert a validated edge.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::SelfLoop`], [`GraphError::DuplicateEdge`],
    /// or [`GraphError::WouldCreateCycle`] when the edge is illegal, and
    /// [`GraphError::StaleHandle`] when either endpoint is dead. The
    /// model is untouched on any error.
    pub fn add_edge(&mut self, from: NodeHandle, to: NodeHandle) -> Result<(), GraphError> {
        self.check(from)?;
        self.check(to)?;

        if from == to {
            return Err(GraphError::SelfLoop(self.id_of(from)));
        }
        if self.edges.contains(&(from, to)) {
            return Err(GraphError::DuplicateEdge {
                from: self.id_of(from),
                to: self.id_of(to),
            });
        }
        if would_create_cycle(&self.edges, from, to) {
            return Err(GraphError::WouldCreateCycle {
                from: self.id_of(from),
                to: self.id_of(to),
            });
        }

        self.edges.push((from, to));
        Ok(())
    }

    /// Remove an edge. Returns whether it was present.
    pub fn remove_edge(&mut self, from: NodeHandle, to: NodeHandle) -> bool {
        let before = self.edges.len();
        self.edges.retain(|&e| e != (from, to));
        before != self.edges.len()
    }

    /// Whether the edge exists.
    #[must_use]
    pub fn has_edge(&self, from: NodeHandle, to: NodeHandle) -> bool {
        self.edges.contains(&(from, to))
    }

    /// Targets of a node's outgoing edges, in insertion order.
    #[must_use]
    pub fn outgoing(&self, from: NodeHandle) -> Vec<NodeHandle> {
        self.edges
            .iter()
            .filter(|&&(a, _)| a == from)
            .map(|&(_, b)| b)
            .collect()
    }

    /// Sources of a node's incoming edges, in insertion order.
    #[must_use]
    pub fn incoming(&self, to: NodeHandle) -> Vec<NodeHandle> {
        self.edges
            .iter()
            .filter(|&&(_, b)| b == to)
            .map(|&(a, _)| a)
            .collect()
    }

    /// The entry marker, if set.
    #[inline]
    #[must_use]
    pub fn entry(&self) -> Option<NodeHandle> {
        self.entry
    }

    /// Mark a node as the story entry point.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::StaleHandle`] for an invalid handle.
    pub fn set_entry(&mut self, handle: NodeHandle) -> Result<(), GraphError> {
        self.check(handle)?;
        self.entry = Some(handle);
        Ok(())
    }

    /// Clear the entry marker.
    pub fn clear_entry(&mut self) {
        self.entry = None;
    }

    /// Batch position update; invalid handles are skipped.
    pub fn move_nodes(&mut self, moves: &[(NodeHandle, Position)]) {
        for &(handle, position) in moves {
            if let Ok(data) = self.node_mut(handle) {
                data.position = position;
            }
        }
    }

    /// Drop every node and edge.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            if slot.data.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
        }
        self.free = (0..u32::try_from(self.slots.len()).unwrap_or(u32::MAX)).collect();
        self.free.reverse();
        self.ids.clear();
        self.edges.clear();
        self.entry = None;
    }

    fn check(&self, handle: NodeHandle) -> Result<(), GraphError> {
        let slot = self
            .slots
            .get(handle.index as usize)
            .ok_or(GraphError::StaleHandle(handle))?;
        if slot.generation != handle.generation || slot.data.is_none() {
            return Err(GraphError::StaleHandle(handle));
        }
        Ok(())
    }

    fn id_of(&self, handle: NodeHandle) -> String {
        self.slots[handle.index as usize]
            .data
            .as_ref()
            .map(|d| d.id.clone())
            .unwrap_or_default()
    }
}

//! BFS-layered automatic layout.
//!
//! Nodes are assigned to layers by breadth-first traversal from the
//! entry node; the first visit fixes a node's layer. Each layer is
//! centered horizontally around the configured origin. The engine is
//! pure: it returns positions and leaves the model alone, so callers
//! can confirm a destructive re-layout before applying it.

use std::collections::{HashMap, HashSet, VecDeque};
use storygraph_core::{GraphModel, NodeHandle, Position};

/// Spacing and origin for the auto layout pass. No globals: callers
/// hand the engine an explicit config.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutConfig {
    /// Horizontal distance between neighbors in a layer.
    pub spacing_x: f64,
    /// Vertical distance between layers.
    pub spacing_y: f64,
    /// Horizontal center of every layer.
    pub origin_x: f64,
    /// Vertical position of the first layer.
    pub origin_y: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            spacing_x: 250.0,
            spacing_y: 150.0,
            origin_x: 0.0,
            origin_y: 0.0,
        }
    }
}

/// Compute positions for every node in the model.
///
/// Traversal starts at the entry node when one is set, otherwise at
/// every node without incoming edges (sorted by id for determinism).
/// Nodes unreachable from the seeds are collected into one extra layer
/// below the deepest.
#[must_use]
pub fn auto_layout(model: &GraphModel, config: &LayoutConfig) -> HashMap<NodeHandle, Position> {
    let mut layers: Vec<Vec<NodeHandle>> = Vec::new();
    let mut visited: HashSet<NodeHandle> = HashSet::new();

    let seeds = seed_nodes(model);
    let mut queue: VecDeque<(NodeHandle, usize)> = VecDeque::new();
    for seed in seeds {
        if visited.insert(seed) {
            queue.push_back((seed, 0));
        }
    }

    while let Some((handle, layer)) = queue.pop_front() {
        if layers.len() <= layer {
            layers.resize_with(layer + 1, Vec::new);
        }
        layers[layer].push(handle);

        for next in model.outgoing(handle) {
            if visited.insert(next) {
                queue.push_back((next, layer + 1));
            }
        }
    }

    let mut orphans: Vec<NodeHandle> = model
        .handles()
        .into_iter()
        .filter(|h| !visited.contains(h))
        .collect();
    if !orphans.is_empty() {
        sort_by_id(model, &mut orphans);
        layers.push(orphans);
    }

    let mut positions = HashMap::new();
    for (layer_index, layer) in layers.iter().enumerate() {
        let count = layer.len();
        #[allow(clippy::cast_precision_loss)]
        let start_x = config.origin_x - (count.saturating_sub(1) as f64) * config.spacing_x / 2.0;
        #[allow(clippy::cast_precision_loss)]
        let y = config.origin_y + layer_index as f64 * config.spacing_y;
        for (i, &handle) in layer.iter().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let x = start_x + i as f64 * config.spacing_x;
            positions.insert(handle, Position::new(x, y));
        }
    }

    positions
}

fn seed_nodes(model: &GraphModel) -> Vec<NodeHandle> {
    if let Some(entry) = model.entry() {
        return vec![entry];
    }
    let mut roots: Vec<NodeHandle> = model
        .handles()
        .into_iter()
        .filter(|&h| model.incoming(h).is_empty())
        .collect();
    sort_by_id(model, &mut roots);
    roots
}

fn sort_by_id(model: &GraphModel, handles: &mut [NodeHandle]) {
    handles.sort_by_key(|&h| model.node(h).map(|n| n.id.clone()).unwrap_or_default());
}

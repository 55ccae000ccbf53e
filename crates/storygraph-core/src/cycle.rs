//! Cycle detection for prospective edges.
//!
//! The check is pure: it looks only at the edge list it is given and
//! never mutates anything, so callers can validate an edge before
//! touching the model.

use crate::handle::NodeHandle;
use std::collections::{HashMap, HashSet, VecDeque};

/// Would adding `from -> to` close a directed cycle?
///
/// Runs a breadth-first search from `to` along the existing edges; if it
/// reaches `from`, the new edge would complete a loop. A self edge
/// (`from == to`) always counts as a cycle. O(V + E).
#[must_use]
pub fn would_create_cycle(edges: &[(NodeHandle, NodeHandle)], from: NodeHandle, to: NodeHandle) -> bool {
    if from == to {
        return true;
    }

    let mut successors: HashMap<NodeHandle, Vec<NodeHandle>> = HashMap::new();
    for &(a, b) in edges {
        successors.entry(a).or_default().push(b);
    }

    let mut visited: HashSet<NodeHandle> = HashSet::new();
    let mut queue = VecDeque::new();
    queue.push_back(to);
    visited.insert(to);

    while let Some(current) = queue.pop_front() {
        if current == from {
            return true;
        }
        if let Some(next) = successors.get(&current) {
            for &n in next {
                if visited.insert(n) {
                    queue.push_back(n);
                }
            }
        }
    }

    false
}

//! Generation-checked node handles.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Dense handle into the model's node arena.
///
/// A handle stays valid exactly as long as the node it was issued for.
/// When a slot is recycled its generation is bumped, so handles to the
/// deleted occupant fail the generation check instead of aliasing the
/// new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeHandle {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl NodeHandle {
    /// Arena slot index.
    #[inline]
    #[must_use]
    pub fn index(self) -> u32 {
        self.index
    }

    /// Slot generation at issue time.
    #[inline]
    #[must_use]
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

//! Node payloads stored in the graph model.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Position of a node on the editor canvas.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Position {
    /// Create a position.
    #[inline]
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// What role a node plays in the story graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NodeKind {
    /// A scene container (may embed its own dialogue).
    #[default]
    Scene,
    /// A single spoken line.
    Dialogue,
    /// A player-facing choice with labeled branches.
    Choice,
    /// A silent branch on a condition expression.
    Condition,
    /// Marker for where playback starts.
    EntryMarker,
}

impl NodeKind {
    /// Canonical string form used by the layout file and the editor.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scene => "Scene",
            Self::Dialogue => "Dialogue",
            Self::Choice => "Choice",
            Self::Condition => "Condition",
            Self::EntryMarker => "EntryMarker",
        }
    }

    /// Parse the canonical string form, case-insensitively.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "scene" => Some(Self::Scene),
            "dialogue" => Some(Self::Dialogue),
            "choice" => Some(Self::Choice),
            "condition" => Some(Self::Condition),
            "entrymarker" | "entry" => Some(Self::EntryMarker),
            _ => None,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the editor knows about one node.
///
/// The branching target maps (`choice_targets`, `condition_targets`) are
/// keyed by branch label and rebuilt whenever outgoing edges change.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodeData {
    /// Unique node id; doubles as the scene identifier in script files.
    pub id: String,
    /// Human-readable title shown on the canvas.
    pub title: String,
    /// Node role.
    pub kind: NodeKind,
    /// Canvas position.
    pub position: Position,
    /// Path of the backing script file, relative to the project root.
    pub script_path: String,
    /// Speaker for dialogue-bearing nodes.
    pub speaker: String,
    /// Dialogue text for dialogue-bearing nodes.
    pub dialogue_text: String,
    /// Choice option labels, in branch order.
    pub choice_options: Vec<String>,
    /// Condition expression for condition nodes.
    pub condition_expression: String,
    /// Condition output labels, in branch order.
    pub condition_outputs: Vec<String>,
    /// Choice label -> target node id.
    pub choice_targets: BTreeMap<String, String>,
    /// Condition output label -> target node id.
    pub condition_targets: BTreeMap<String, String>,
    /// Scene identifier when it differs from the node id.
    pub scene_id: String,
    /// Whether a scene node carries its own dialogue.
    pub has_embedded_dialogue: bool,
}

impl NodeData {
    /// Create a node with the given id and kind; everything else default.
    #[must_use]
    pub fn new(id: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            kind,
            ..Self::default()
        }
    }

    /// Scene identifier used in script files: `scene_id` when set,
    /// otherwise the node id.
    #[must_use]
    pub fn scene_id(&self) -> &str {
        if self.scene_id.is_empty() {
            &self.id
        } else {
            &self.scene_id
        }
    }

    /// Whether this node carries a say statement worth syncing.
    #[must_use]
    pub fn speaks(&self) -> bool {
        matches!(self.kind, NodeKind::Dialogue | NodeKind::Choice)
            || (self.kind == NodeKind::Scene && self.has_embedded_dialogue)
    }
}

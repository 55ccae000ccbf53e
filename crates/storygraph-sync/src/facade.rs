//! The graph editing facade.
//!
//! [`GraphEditor`] is the single entry point editor surfaces talk to.
//! Every operation validates against the model, mirrors the change
//! into the affected script file, notifies observers, and persists the
//! layout. While a rebuild is replaying parsed scenes, intermediate
//! saves and script writes are suppressed.

use crate::coordinator::{plan_rebuild, RebuildPlan, SyncCoordinator, SyncProgress, SyncReport};
use crate::error::EditorError;
use crate::state::SyncState;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use storygraph_core::{
    GraphEvent, GraphModel, NodeData, NodeHandle, NodeKind, Observers, Position,
};
use storygraph_layout::{auto_layout, LayoutConfig, LayoutStore};
use storygraph_script::{
    scaffold_script, update_branch_block, update_say_statement, NARRATOR,
};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Layout file location inside the project directory.
pub const LAYOUT_FILE: &str = ".storygraph/story_graph.json";

/// Grid pitch used for parsed scenes that have no stored position yet.
const REBUILD_GRID_X: f64 = 260.0;
const REBUILD_GRID_Y: f64 = 140.0;
const REBUILD_GRID_COLUMNS: usize = 4;

/// The editing surface over one project's story graph.
pub struct GraphEditor {
    model: GraphModel,
    store: LayoutStore,
    layout_config: LayoutConfig,
    observers: Arc<Observers>,
    coordinator: SyncCoordinator,
    project_root: PathBuf,
    rebuilding: bool,
}

impl GraphEditor {
    /// Create an editor for the project rooted at `project_root`.
    #[must_use]
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        let project_root = project_root.into();
        let store = LayoutStore::new(project_root.join(LAYOUT_FILE));
        Self {
            model: GraphModel::new(),
            store,
            layout_config: LayoutConfig::default(),
            observers: Arc::new(Observers::new()),
            coordinator: SyncCoordinator::new(),
            project_root,
            rebuilding: false,
        }
    }

    /// Override the auto layout configuration.
    pub fn set_layout_config(&mut self, config: LayoutConfig) {
        self.layout_config = config;
    }

    /// Read access to the model.
    #[inline]
    #[must_use]
    pub fn model(&self) -> &GraphModel {
        &self.model
    }

    /// Register an event listener.
    pub fn subscribe(&self, listener: impl Fn(&GraphEvent) + Send + Sync + 'static) {
        self.observers.subscribe(listener);
    }

    /// Load the layout file into an empty model, if one exists.
    /// Returns problems found in the file; they are never fatal.
    ///
    /// # Errors
    ///
    /// Layout file I/O or parse failures.
    pub fn load(&mut self) -> Result<Vec<String>, EditorError> {
        let Some(doc) = self.store.load()? else {
            return Ok(Vec::new());
        };
        self.rebuilding = true;
        let issues = doc.populate(&mut self.model);
        self.rebuilding = false;
        self.observers.emit(&GraphEvent::GraphRebuilt);
        Ok(issues)
    }

    /// Add a node. Dialogue and choice nodes default their speaker to
    /// `Narrator`, matching what new nodes say on first sync.
    ///
    /// # Errors
    ///
    /// Duplicate ids, or a failed layout save.
    pub fn add_node(
        &mut self,
        id: &str,
        kind: NodeKind,
        position: Position,
    ) -> Result<NodeHandle, EditorError> {
        let mut data = NodeData::new(id, kind);
        data.position = position;
        if matches!(kind, NodeKind::Dialogue | NodeKind::Choice) && data.speaker.is_empty() {
            data.speaker = NARRATOR.to_string();
        }
        let handle = self.model.add_node(data)?;
        self.observers.emit(&GraphEvent::NodeAdded { id: id.to_string() });
        self.save_layout()?;
        Ok(handle)
    }

    /// Delete a node and its incident edges. The entry marker is
    /// cleared when it pointed at the node; the layout entry vanishes
    /// with the save.
    ///
    /// # Errors
    ///
    /// [`EditorError::UnknownNode`], or a failed layout save.
    pub fn delete_node(&mut self, id: &str) -> Result<NodeData, EditorError> {
        let handle = self.resolve(id)?;
        let had_entry = self.model.entry() == Some(handle);
        let data = self.model.remove_node(handle)?;
        self.observers.emit(&GraphEvent::NodeRemoved { id: id.to_string() });
        if had_entry {
            self.observers.emit(&GraphEvent::EntryChanged { id: None });
        }
        self.save_layout()?;
        Ok(data)
    }

    /// Change a node's id. Scripts are untouched; a scene keeps its
    /// explicit `sceneId` binding, so the graph-side name is free to
    /// move independently.
    ///
    /// # Errors
    ///
    /// [`EditorError::UnknownNode`], a duplicate id rejection, or a
    /// failed layout save.
    pub fn rename_node(&mut self, old_id: &str, new_id: &str) -> Result<(), EditorError> {
        let handle = self.resolve(old_id)?;
        self.model.rename(handle, new_id)?;
        self.observers.emit(&GraphEvent::NodeRenamed {
            old_id: old_id.to_string(),
            new_id: new_id.to_string(),
        });
        self.save_layout()?;
        Ok(())
    }

    /// Apply a batch of canvas moves, emitting a single event.
    ///
    /// # Errors
    ///
    /// A failed layout save.
    pub fn move_nodes(&mut self, moves: &[(NodeHandle, Position)]) -> Result<(), EditorError> {
        self.model.move_nodes(moves);
        let ids: Vec<String> = moves
            .iter()
            .filter_map(|&(h, _)| self.model.node(h).ok().map(|n| n.id.clone()))
            .collect();
        if !ids.is_empty() {
            self.observers.emit(&GraphEvent::NodesMoved { ids });
            self.save_layout()?;
        }
        Ok(())
    }

    /// Connect two nodes.
    ///
    /// Validation order: live endpoints, self loop, duplicate, cycle.
    /// On success the source's branch labels and target map are
    /// rebuilt and its script branch block rewritten.
    ///
    /// # Errors
    ///
    /// Graph rejections, or a failed layout save.
    pub fn connect(&mut self, from: &str, to: &str) -> Result<(), EditorError> {
        let from_h = self.resolve(from)?;
        let to_h = self.resolve(to)?;
        self.model.add_edge(from_h, to_h)?;
        self.relabel_branches(from_h)?;
        self.observers.emit(&GraphEvent::EdgeAdded {
            from: from.to_string(),
            to: to.to_string(),
        });
        self.save_layout()?;
        Ok(())
    }

    /// Remove an edge. A missing edge is a no-op.
    ///
    /// # Errors
    ///
    /// [`EditorError::UnknownNode`], or a failed layout save.
    pub fn disconnect(&mut self, from: &str, to: &str) -> Result<(), EditorError> {
        let from_h = self.resolve(from)?;
        let to_h = self.resolve(to)?;
        if !self.model.remove_edge(from_h, to_h) {
            return Ok(());
        }
        self.relabel_branches(from_h)?;
        self.observers.emit(&GraphEvent::EdgeRemoved {
            from: from.to_string(),
            to: to.to_string(),
        });
        self.save_layout()?;
        Ok(())
    }

    /// Mark a node as the story entry point.
    ///
    /// # Errors
    ///
    /// [`EditorError::UnknownNode`], or a failed layout save.
    pub fn set_entry(&mut self, id: &str) -> Result<(), EditorError> {
        let handle = self.resolve(id)?;
        self.model.set_entry(handle)?;
        self.observers.emit(&GraphEvent::EntryChanged {
            id: Some(id.to_string()),
        });
        self.save_layout()?;
        Ok(())
    }

    /// Clear the entry marker.
    ///
    /// # Errors
    ///
    /// A failed layout save.
    pub fn clear_entry(&mut self) -> Result<(), EditorError> {
        self.model.clear_entry();
        self.observers.emit(&GraphEvent::EntryChanged { id: None });
        self.save_layout()?;
        Ok(())
    }

    /// Apply a string-typed property edit, the way the editor's
    /// property panel delivers them.
    ///
    /// `speaker` and `text` re-sync the scene's say statement;
    /// `scriptPath` scaffolds a missing script file; the target-map
    /// properties take `label=target` lines.
    ///
    /// # Errors
    ///
    /// Unknown node or property, unparseable values, script file
    /// failures, or a failed layout save.
    pub fn set_property(&mut self, id: &str, property: &str, value: &str) -> Result<(), EditorError> {
        let handle = self.resolve(id)?;

        match property {
            "title" => {
                self.model.node_mut(handle)?.title = value.to_string();
            }
            "type" => {
                let kind = NodeKind::parse(value).ok_or_else(|| EditorError::InvalidValue {
                    property: property.to_string(),
                    value: value.to_string(),
                })?;
                self.model.node_mut(handle)?.kind = kind;
            }
            "scriptPath" => {
                self.model.node_mut(handle)?.script_path = value.to_string();
                if !value.is_empty() {
                    let path = self.resolve_script_path(value);
                    let node = self.model.node(handle)?;
                    scaffold_script(&path, node)?;
                }
            }
            "speaker" => {
                let text = self.model.node(handle)?.dialogue_text.clone();
                self.write_say(handle, value, &text)?;
                self.model.node_mut(handle)?.speaker = value.to_string();
            }
            "text" => {
                let speaker = self.model.node(handle)?.speaker.clone();
                self.write_say(handle, &speaker, value)?;
                self.model.node_mut(handle)?.dialogue_text = value.to_string();
            }
            "choices" => {
                self.model.node_mut(handle)?.choice_options = split_lines(value);
            }
            "conditionExpression" => {
                self.model.node_mut(handle)?.condition_expression = value.to_string();
            }
            "conditionOutputs" => {
                self.model.node_mut(handle)?.condition_outputs = split_lines(value);
            }
            "choiceTargets" => {
                self.model.node_mut(handle)?.choice_targets = parse_target_lines(value);
            }
            "conditionTargets" => {
                self.model.node_mut(handle)?.condition_targets = parse_target_lines(value);
            }
            other => return Err(EditorError::UnknownProperty(other.to_string())),
        }

        self.observers.emit(&GraphEvent::PropertyChanged {
            id: id.to_string(),
            property: property.to_string(),
        });
        self.save_layout()?;
        Ok(())
    }

    /// Recompute positions with the layout engine and apply them.
    ///
    /// Destructive to hand placement; callers confirm with the user
    /// before invoking.
    ///
    /// # Errors
    ///
    /// A failed layout save.
    pub fn run_auto_layout(&mut self) -> Result<(), EditorError> {
        let positions = auto_layout(&self.model, &self.layout_config);
        let moves: Vec<(NodeHandle, Position)> = positions.into_iter().collect();
        self.model.move_nodes(&moves);

        let ids: Vec<String> = moves
            .iter()
            .filter_map(|&(h, _)| self.model.node(h).ok().map(|n| n.id.clone()))
            .collect();
        info!(nodes = ids.len(), "auto layout applied");
        self.observers.emit(&GraphEvent::NodesMoved { ids });
        self.save_layout()?;
        Ok(())
    }

    /// Start pushing every node's dialogue into its script file.
    ///
    /// # Errors
    ///
    /// [`EditorError::SyncBusy`] when a job is already running.
    pub fn start_sync_to_scripts(
        &self,
        progress: UnboundedSender<SyncProgress>,
    ) -> Result<JoinHandle<SyncReport>, EditorError> {
        let root = self.project_root.clone();
        let (items, skipped) = SyncCoordinator::collect_items(&self.model, |rel| {
            resolve_in(&root, rel)
        });
        self.coordinator.start_graph_to_script(items, skipped, progress)
    }

    /// Request cancellation of the running sync job.
    pub fn cancel_sync(&self) {
        self.coordinator.cancel();
    }

    /// Current sync job state.
    #[must_use]
    pub fn sync_state(&self) -> SyncState {
        self.coordinator.state()
    }

    /// Acknowledge a finished sync job.
    ///
    /// # Errors
    ///
    /// [`EditorError::InvalidTransition`] while a job is running.
    pub fn reset_sync(&self) -> Result<(), EditorError> {
        self.coordinator.reset()
    }

    /// Parse the project's scripts into a rebuild plan without touching
    /// the model.
    #[must_use]
    pub fn plan_rebuild_from_scripts(&self, scripts_dir: &Path) -> RebuildPlan {
        plan_rebuild(scripts_dir)
    }

    /// Replace the whole graph with a rebuild plan.
    ///
    /// Parsed scenes without stored positions land on a fallback grid.
    /// Unknown edge targets and rejected edges are reported, not fatal.
    /// One `GraphRebuilt` event fires at the end, followed by a single
    /// layout save.
    ///
    /// # Errors
    ///
    /// A failed layout save.
    pub fn apply_rebuild(&mut self, plan: &RebuildPlan) -> Result<Vec<String>, EditorError> {
        let mut issues = plan.issues.clone();
        self.rebuilding = true;
        self.model.clear();

        for (i, planned) in plan.nodes.iter().enumerate() {
            let parsed = &planned.node;
            let mut data = NodeData::new(&parsed.id, parsed.kind);
            data.script_path = planned.script_path.clone();
            data.speaker = parsed.speaker.clone();
            data.dialogue_text = parsed.text.clone();
            data.choice_options = parsed.choices.clone();
            data.condition_expression = parsed.condition_expression.clone();
            data.condition_outputs = parsed.condition_outputs.clone();
            #[allow(clippy::cast_precision_loss)]
            let position = Position::new(
                (i % REBUILD_GRID_COLUMNS) as f64 * REBUILD_GRID_X,
                (i / REBUILD_GRID_COLUMNS) as f64 * REBUILD_GRID_Y,
            );
            data.position = position;
            if let Err(e) = self.model.add_node(data) {
                issues.push(e.to_string());
            }
        }

        for (from, to) in &plan.edges {
            let (Some(from_h), Some(to_h)) = (self.model.resolve(from), self.model.resolve(to))
            else {
                issues.push(format!("unknown connection target: {from} -> {to}"));
                continue;
            };
            if let Err(e) = self.model.add_edge(from_h, to_h) {
                issues.push(e.to_string());
            }
        }

        if let Some(entry) = &plan.entry {
            match self.model.resolve(entry) {
                Some(handle) => self.model.set_entry(handle)?,
                None => issues.push(format!("unknown entry node: {entry}")),
            }
        }

        for handle in self.model.handles() {
            if !self.model.outgoing(handle).is_empty() {
                self.relabel_branches(handle)?;
            }
        }

        self.rebuilding = false;
        info!(
            nodes = self.model.node_count(),
            edges = self.model.edge_count(),
            issues = issues.len(),
            "graph rebuilt from scripts"
        );
        self.observers.emit(&GraphEvent::GraphRebuilt);
        self.save_layout()?;
        Ok(issues)
    }

    /// Rebuild the source node's branch labels and target map after an
    /// edge change, then rewrite its script branch block.
    ///
    /// Choice nodes label branches with their option texts, condition
    /// nodes with their output labels (defaulting to true/false); both
    /// synthesize positional names past the configured labels.
    fn relabel_branches(&mut self, from: NodeHandle) -> Result<(), EditorError> {
        let target_ids: Vec<String> = self
            .model
            .outgoing(from)
            .into_iter()
            .filter_map(|h| self.model.node(h).ok().map(|n| n.id.clone()))
            .collect();

        let node = self.model.node_mut(from)?;
        match node.kind {
            NodeKind::Choice => {
                let options = node.choice_options.clone();
                node.choice_targets = target_ids
                    .iter()
                    .enumerate()
                    .map(|(i, target)| {
                        let label = options
                            .get(i)
                            .cloned()
                            .unwrap_or_else(|| format!("Option {}", i + 1));
                        (label, target.clone())
                    })
                    .collect();
            }
            NodeKind::Condition => {
                let outputs = if node.condition_outputs.is_empty() {
                    vec!["true".to_string(), "false".to_string()]
                } else {
                    node.condition_outputs.clone()
                };
                node.condition_targets = target_ids
                    .iter()
                    .enumerate()
                    .map(|(i, target)| {
                        let label = outputs
                            .get(i)
                            .cloned()
                            .unwrap_or_else(|| format!("branch_{}", i + 1));
                        (label, target.clone())
                    })
                    .collect();
            }
            _ => {}
        }

        let scene_id = node.scene_id().to_string();
        let script_path = node.script_path.clone();
        // During a rebuild the scripts are the source of truth; their
        // existing transitions must not be rewritten.
        if script_path.is_empty() || self.rebuilding {
            return Ok(());
        }
        let path = self.resolve_script_path(&script_path);
        if let Err(e) = update_branch_block(&path, &scene_id, &target_ids) {
            // The script may not exist yet; the next full sync or
            // scaffold will catch up.
            warn!(scene = %scene_id, error = %e, "branch block rewrite skipped");
        }
        Ok(())
    }

    /// Push a say statement into the node's script. Runs before the
    /// model is touched so a failed write leaves model, layout, and
    /// script in agreement.
    fn write_say(&self, handle: NodeHandle, speaker: &str, text: &str) -> Result<(), EditorError> {
        let node = self.model.node(handle)?;
        if node.script_path.is_empty() {
            return Ok(());
        }
        let path = self.resolve_script_path(&node.script_path);
        update_say_statement(&path, node.scene_id(), speaker, text)?;
        Ok(())
    }

    fn resolve(&self, id: &str) -> Result<NodeHandle, EditorError> {
        self.model
            .resolve(id)
            .ok_or_else(|| EditorError::UnknownNode(id.to_string()))
    }

    fn resolve_script_path(&self, rel: &str) -> PathBuf {
        resolve_in(&self.project_root, rel)
    }

    fn save_layout(&self) -> Result<(), EditorError> {
        if self.rebuilding {
            return Ok(());
        }
        self.store.save(&self.model)?;
        Ok(())
    }
}

fn resolve_in(root: &Path, rel: &str) -> PathBuf {
    let path = Path::new(rel);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

/// Split a multi-line property value into trimmed, non-empty lines.
fn split_lines(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Parse `label=target` lines into a target map. Lines without a `=`,
/// or with an empty label, are ignored.
fn parse_target_lines(raw: &str) -> std::collections::BTreeMap<String, String> {
    let mut targets = std::collections::BTreeMap::new();
    for line in split_lines(raw) {
        if let Some(eq) = line.find('=') {
            let label = line[..eq].trim();
            let target = line[eq + 1..].trim();
            if !label.is_empty() {
                targets.insert(label.to_string(), target.to_string());
            }
        }
    }
    targets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_lines_drops_blanks() {
        assert_eq!(
            split_lines("  a \n\n b\r\n  \nc"),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
    }

    #[test]
    fn target_lines_parsed() {
        let targets = parse_target_lines("Left = cave\nRight=river\nbroken\n = nolabel");
        assert_eq!(targets.len(), 2);
        assert_eq!(targets["Left"], "cave");
        assert_eq!(targets["Right"], "river");
    }
}

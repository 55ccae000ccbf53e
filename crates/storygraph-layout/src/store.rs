//! The layout file: node positions and payloads persisted as JSON.
//!
//! The document lives at a fixed path inside the project (the editor
//! uses `.storygraph/story_graph.json`). Fields with default values are
//! omitted on write; old files that used the `text` key for dialogue
//! are still readable.

use crate::error::LayoutError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use storygraph_core::{GraphModel, NodeData, NodeKind, Position};
use tracing::{debug, warn};

fn is_false(v: &bool) -> bool {
    !*v
}

/// One node as stored in the layout file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LayoutRecord {
    /// Node id.
    pub id: String,
    /// Canvas x.
    #[serde(default)]
    pub x: f64,
    /// Canvas y.
    #[serde(default)]
    pub y: f64,
    /// Node kind string ("Scene", "Dialogue", ...).
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    /// Backing script path.
    #[serde(rename = "scriptPath", default, skip_serializing_if = "String::is_empty")]
    pub script_path: String,
    /// Node title.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    /// Dialogue speaker.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub speaker: String,
    /// Dialogue text; older files spelled this `text`.
    #[serde(
        rename = "dialogueText",
        alias = "text",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub dialogue_text: String,
    /// Choice labels.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,
    /// Scene identifier when distinct from the node id.
    #[serde(rename = "sceneId", default, skip_serializing_if = "String::is_empty")]
    pub scene_id: String,
    /// Whether a scene node embeds dialogue.
    #[serde(rename = "hasEmbeddedDialogue", default, skip_serializing_if = "is_false")]
    pub has_embedded_dialogue: bool,
    /// Condition expression.
    #[serde(
        rename = "conditionExpression",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub condition_expression: String,
    /// Condition output labels.
    #[serde(rename = "conditionOutputs", default, skip_serializing_if = "Vec::is_empty")]
    pub condition_outputs: Vec<String>,
    /// Choice label -> target node id.
    #[serde(rename = "choiceTargets", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub choice_targets: BTreeMap<String, String>,
    /// Condition output label -> target node id.
    #[serde(
        rename = "conditionTargets",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub condition_targets: BTreeMap<String, String>,
}

impl LayoutRecord {
    /// Build a record from node data.
    #[must_use]
    pub fn from_node(node: &NodeData) -> Self {
        Self {
            id: node.id.clone(),
            x: node.position.x,
            y: node.position.y,
            kind: node.kind.as_str().to_string(),
            script_path: node.script_path.clone(),
            title: node.title.clone(),
            speaker: node.speaker.clone(),
            dialogue_text: node.dialogue_text.clone(),
            choices: node.choice_options.clone(),
            scene_id: node.scene_id.clone(),
            has_embedded_dialogue: node.has_embedded_dialogue,
            condition_expression: node.condition_expression.clone(),
            condition_outputs: node.condition_outputs.clone(),
            choice_targets: node.choice_targets.clone(),
            condition_targets: node.condition_targets.clone(),
        }
    }

    /// Convert the record back into node data. An unknown kind string
    /// falls back to `Scene`.
    #[must_use]
    pub fn into_node(self) -> NodeData {
        NodeData {
            id: self.id,
            title: self.title,
            kind: NodeKind::parse(&self.kind).unwrap_or_default(),
            position: Position::new(self.x, self.y),
            script_path: self.script_path,
            speaker: self.speaker,
            dialogue_text: self.dialogue_text,
            choice_options: self.choices,
            condition_expression: self.condition_expression,
            condition_outputs: self.condition_outputs,
            choice_targets: self.choice_targets,
            condition_targets: self.condition_targets,
            scene_id: self.scene_id,
            has_embedded_dialogue: self.has_embedded_dialogue,
        }
    }
}

/// The whole layout file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LayoutDocument {
    /// Entry node id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<String>,
    /// Node records.
    #[serde(default)]
    pub nodes: Vec<LayoutRecord>,
}

impl LayoutDocument {
    /// Snapshot a model into a document, nodes sorted by id so saves
    /// are deterministic.
    #[must_use]
    pub fn from_model(model: &GraphModel) -> Self {
        let entry = model
            .entry()
            .and_then(|h| model.node(h).ok())
            .map(|n| n.id.clone());
        let mut nodes: Vec<LayoutRecord> = model
            .nodes()
            .map(|(_, data)| LayoutRecord::from_node(data))
            .collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        Self { entry, nodes }
    }

    /// Populate an empty model from the document.
    ///
    /// Records with empty ids are skipped, matching the editor's loader.
    /// Edges are reconstructed from the branching target maps; a target
    /// that does not resolve, or would break the graph's invariants, is
    /// reported rather than applied.
    pub fn populate(&self, model: &mut GraphModel) -> Vec<String> {
        let mut issues = Vec::new();

        for record in &self.nodes {
            if record.id.is_empty() {
                continue;
            }
            let data = record.clone().into_node();
            if let Err(e) = model.add_node(data) {
                issues.push(e.to_string());
            }
        }

        for record in &self.nodes {
            let Some(from) = model.resolve(&record.id) else {
                continue;
            };
            let targets = record
                .choice_targets
                .values()
                .chain(record.condition_targets.values());
            for target in targets {
                let Some(to) = model.resolve(target) else {
                    issues.push(format!("{}: unknown target {target}", record.id));
                    continue;
                };
                if model.has_edge(from, to) {
                    continue;
                }
                if let Err(e) = model.add_edge(from, to) {
                    issues.push(e.to_string());
                }
            }
        }

        if let Some(entry) = &self.entry {
            match model.resolve(entry) {
                Some(handle) => {
                    // Entry always resolves after the node pass above.
                    let _ = model.set_entry(handle);
                }
                None => issues.push(format!("unknown entry node: {entry}")),
            }
        }

        issues
    }
}

/// Loads and saves the layout file at a fixed path.
#[derive(Debug, Clone)]
pub struct LayoutStore {
    path: PathBuf,
}

impl LayoutStore {
    /// Create a store for the given file path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The layout file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the document; `Ok(None)` when the file does not exist yet.
    ///
    /// # Errors
    ///
    /// I/O failures, or [`LayoutError::Malformed`] for invalid JSON.
    pub fn load(&self) -> Result<Option<LayoutDocument>, LayoutError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no layout file yet");
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&self.path)?;
        let doc: LayoutDocument = serde_json::from_str(&raw)?;
        Ok(Some(doc))
    }

    /// Save a snapshot of the model, creating the parent directory and
    /// writing atomically through a temp file.
    ///
    /// # Errors
    ///
    /// I/O failures or a failed atomic rename.
    pub fn save(&self, model: &GraphModel) -> Result<(), LayoutError> {
        let doc = LayoutDocument::from_model(model);
        self.save_document(&doc)
    }

    /// Save an explicit document.
    ///
    /// # Errors
    ///
    /// I/O failures or a failed atomic rename.
    pub fn save_document(&self, doc: &LayoutDocument) -> Result<(), LayoutError> {
        if let Some(dir) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(doc)?;

        let dir = self.path.parent().filter(|p| !p.as_os_str().is_empty());
        let mut tmp = match dir {
            Some(dir) => tempfile::NamedTempFile::new_in(dir)?,
            None => tempfile::NamedTempFile::new()?,
        };
        tmp.write_all(json.as_bytes())?;
        if let Err(e) = tmp.persist(&self.path) {
            warn!(path = %self.path.display(), error = %e, "layout save failed");
            return Err(LayoutError::Persist(e.to_string()));
        }
        debug!(path = %self.path.display(), nodes = doc.nodes.len(), "layout saved");
        Ok(())
    }
}

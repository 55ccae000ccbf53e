//! Whole-file script generation and new-file scaffolding.

use crate::error::ScriptError;
use crate::ident::sanitize_speaker;
use crate::sync::{escape_text, render_branch_block, write_atomic, PLACEHOLDER_TEXT};
use std::path::Path;
use storygraph_core::{NodeData, NodeKind};
use tracing::info;

const GENERATED_HEADER: &str = "\
// ========================================
// Generated from Story Graph
// Do not edit manually - changes may be overwritten
// ========================================
";

/// Render one scene block for a node with the given outgoing targets.
#[must_use]
pub fn scene_block(node: &NodeData, targets: &[String]) -> String {
    let mut block = String::new();
    block.push_str(&format!("scene {} {{\n", node.scene_id()));

    if node.speaks() && !node.dialogue_text.is_empty() && node.dialogue_text.trim() != PLACEHOLDER_TEXT
    {
        let speaker = sanitize_speaker(&node.speaker);
        let text = escape_text(&node.dialogue_text);
        block.push_str(&format!("    say {speaker} \"{text}\"\n"));
    }
    if node.kind == NodeKind::Condition && !node.condition_expression.is_empty() {
        block.push_str(&format!("    // condition: {}\n", node.condition_expression));
    }

    if !targets.is_empty() {
        block.push('\n');
        block.push_str(&render_branch_block(targets));
        block.push('\n');
    }

    block.push_str("}\n");
    block
}

/// Generate a complete script file from nodes and their outgoing targets.
///
/// Emits the generated-file header, an `entry` statement when one is
/// set, then one scene block per node in the given order.
#[must_use]
pub fn generate_script(scenes: &[(NodeData, Vec<String>)], entry: Option<&str>) -> String {
    let mut out = String::from(GENERATED_HEADER);
    if let Some(entry) = entry {
        out.push_str(&format!("\nentry {entry}\n"));
    }
    for (node, targets) in scenes {
        out.push('\n');
        out.push_str(&scene_block(node, targets));
    }
    out
}

/// Create the script file for a freshly assigned path, if absent.
///
/// Dialogue-bearing nodes get a placeholder say statement; Scene and
/// Condition nodes are silent and get a comment-only body. Returns
/// whether a file was written.
///
/// # Errors
///
/// I/O failures while creating the file.
pub fn scaffold_script(path: &Path, node: &NodeData) -> Result<bool, ScriptError> {
    if path.as_os_str().is_empty() || path.exists() {
        return Ok(false);
    }
    if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }

    let mut content = String::from(GENERATED_HEADER);
    content.push_str(&format!("// {}\n", node.id));
    content.push_str(&format!("scene {} {{\n", node.scene_id()));
    match node.kind {
        NodeKind::Condition => {
            content.push_str("  // Condition node - add branching logic here\n");
        }
        NodeKind::Scene | NodeKind::EntryMarker => {
            content.push_str("  // Scene node - add scene content here\n");
        }
        NodeKind::Dialogue | NodeKind::Choice => {
            content.push_str("  say Narrator \"New script node\"\n");
        }
    }
    content.push_str("}\n");

    write_atomic(path, &content)?;
    info!(node = %node.id, path = %path.display(), "scaffolded script file");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_content;

    fn dialogue(id: &str, speaker: &str, text: &str) -> NodeData {
        let mut node = NodeData::new(id, NodeKind::Dialogue);
        node.speaker = speaker.to_string();
        node.dialogue_text = text.to_string();
        node
    }

    #[test]
    fn generated_script_parses_back() {
        let scenes = vec![
            (dialogue("intro", "Alice", "Welcome"), vec!["fork".to_string()]),
            (
                dialogue("fork", "Narrator", "Choose"),
                vec!["cave".to_string(), "river".to_string()],
            ),
            (NodeData::new("cave", NodeKind::Scene), vec![]),
            (NodeData::new("river", NodeKind::Scene), vec![]),
        ];
        let script = generate_script(&scenes, Some("intro"));

        let outcome = parse_content(&script);
        assert!(outcome.is_clean(), "issues: {:?}", outcome.issues);
        assert_eq!(outcome.entry_point, Some("intro".to_string()));
        assert_eq!(outcome.nodes.len(), 4);
        assert_eq!(outcome.nodes[0].text, "Welcome");
        assert_eq!(outcome.nodes[1].targets.len(), 2);
        assert!(outcome
            .edges
            .contains(&("fork".to_string(), "cave".to_string())));
    }

    #[test]
    fn placeholder_text_not_emitted() {
        let block = scene_block(&dialogue("s", "Bob", "New scene"), &[]);
        assert!(!block.contains("say"));
    }

    #[test]
    fn silent_kinds_have_no_say() {
        let mut node = NodeData::new("gate", NodeKind::Condition);
        node.dialogue_text = "should not appear".to_string();
        let block = scene_block(&node, &[]);
        assert!(!block.contains("say"));
    }
}

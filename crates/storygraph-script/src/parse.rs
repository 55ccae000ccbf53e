//! Script file parsing for graph reconstruction.
//!
//! The parser is deliberately shallow: it recovers scene structure,
//! branch targets, and the first say statement per scene (exactly the
//! information the graph tracks) and ignores everything else a script
//! can contain. Problems are collected per file instead of aborting,
//! so one broken script never blocks a project-wide rebuild.

use crate::error::ScriptError;
use crate::scan::{code_mask, line_of, matching_brace};
use crate::sync::unescape_text;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::fmt;
use std::ops::Range;
use std::path::Path;
use storygraph_core::NodeKind;

static SCENE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bscene\s+([\p{L}_][\p{L}\p{N}_]*)").expect("static pattern"));
static ENTRY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bentry\s+([\p{L}_][\p{L}\p{N}_]*)").expect("static pattern"));
static GOTO_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bgoto\s+([\p{L}_][\p{L}\p{N}_]*)").expect("static pattern"));
static GOTO_KEYWORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bgoto\b").expect("static pattern"));
static CHOICE_HEAD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bchoice\s*\{").expect("static pattern"));
static CHOICE_ARM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""([^"]+)"\s*->\s*(?:goto\s+)?([\p{L}_][\p{L}\p{N}_]*)"#).expect("static pattern")
});
static IF_PAREN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bif\s*\(([^)]*)\)").expect("static pattern"));
static IF_BARE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bif\s+([^{(\n]+?)\s*\{").expect("static pattern"));
static SAY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\bsay\s+(?:([\p{L}_][\p{L}\p{N}_]*)\s+)?"([^"]*)""#).expect("static pattern")
});

/// One scene recovered from a script file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedNode {
    /// Scene identifier.
    pub id: String,
    /// Inferred node role (best effort; see [`ParseOutcome`]).
    pub kind: NodeKind,
    /// Speaker of the first say statement, if any.
    pub speaker: String,
    /// Text of the first say statement, unescaped.
    pub text: String,
    /// Choice labels in branch order.
    pub choices: Vec<String>,
    /// Distinct branch targets in order of appearance.
    pub targets: Vec<String>,
    /// Condition expression, when the body branches on one.
    pub condition_expression: String,
    /// Condition output labels (empty; defaults apply downstream).
    pub condition_outputs: Vec<String>,
    /// 1-based line of the scene declaration.
    pub source_line: usize,
}

/// A non-fatal problem found while parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIssue {
    /// 1-based line number.
    pub line: usize,
    /// What went wrong.
    pub message: String,
}

impl fmt::Display for ParseIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

/// Everything recovered from one script file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseOutcome {
    /// First `entry <id>` statement in the file, if any.
    pub entry_point: Option<String>,
    /// Scenes in declaration order.
    pub nodes: Vec<ParsedNode>,
    /// `(from, to)` scene connections implied by branch targets.
    pub edges: Vec<(String, String)>,
    /// Collected problems; never fatal.
    pub issues: Vec<ParseIssue>,
}

impl ParseOutcome {
    /// Whether parsing finished without recording any issue.
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Parse a script file.
///
/// # Errors
///
/// Only for I/O failures; malformed content is reported through
/// [`ParseOutcome::issues`].
pub fn parse_file(path: &Path) -> Result<ParseOutcome, ScriptError> {
    let content = std::fs::read_to_string(path)?;
    Ok(parse_content(&content))
}

/// Parse script content.
#[must_use]
pub fn parse_content(content: &str) -> ParseOutcome {
    let mask = code_mask(content);
    let mut outcome = ParseOutcome::default();
    let mut bodies: Vec<Range<usize>> = Vec::new();
    let mut seen_ids: HashSet<String> = HashSet::new();

    for caps in SCENE_RE.captures_iter(content) {
        let Some(head) = caps.get(0) else { continue };
        if !is_code(&mask, head.start()) {
            continue;
        }
        if bodies.iter().any(|r| r.contains(&head.start())) {
            continue;
        }
        let id = caps.get(1).map_or("", |m| m.as_str()).to_string();
        let line = line_of(content, head.start());

        let Some(open) = content[head.end()..].find('{').map(|p| head.end() + p) else {
            outcome.issues.push(ParseIssue {
                line,
                message: format!("scene {id} has no body"),
            });
            continue;
        };
        let Some(close) = matching_brace(content, open) else {
            outcome.issues.push(ParseIssue {
                line,
                message: format!("unterminated scene block: {id}"),
            });
            continue;
        };
        let body_range = open + 1..close;
        bodies.push(open..close + 1);

        if !seen_ids.insert(id.clone()) {
            outcome.issues.push(ParseIssue {
                line,
                message: format!("duplicate scene id: {id}"),
            });
            continue;
        }

        let mut node = parse_scene_body(&content[body_range.clone()], &mut outcome.issues, || {
            line_of(content, body_range.start)
        });
        node.id = id;
        node.source_line = line;

        for target in &node.targets {
            outcome.edges.push((node.id.clone(), target.clone()));
        }
        outcome.nodes.push(node);
    }

    for caps in ENTRY_RE.captures_iter(content) {
        let Some(head) = caps.get(0) else { continue };
        if !is_code(&mask, head.start()) {
            continue;
        }
        if bodies.iter().any(|r| r.contains(&head.start())) {
            continue;
        }
        outcome.entry_point = caps.get(1).map(|m| m.as_str().to_string());
        break;
    }

    outcome
}

fn is_code(mask: &[bool], offset: usize) -> bool {
    mask.get(offset).copied().unwrap_or(false)
}

fn parse_scene_body(
    body: &str,
    issues: &mut Vec<ParseIssue>,
    base_line: impl Fn() -> usize,
) -> ParsedNode {
    let mask = code_mask(body);
    let mut node = ParsedNode::default();

    if let Some(caps) = SAY_RE
        .captures_iter(body)
        .find(|c| c.get(0).is_some_and(|m| is_code(&mask, m.start())))
    {
        node.speaker = caps.get(1).map_or("", |m| m.as_str()).to_string();
        node.text = unescape_text(caps.get(2).map_or("", |m| m.as_str()));
    }

    let mut goto_starts = HashSet::new();
    for caps in GOTO_RE.captures_iter(body) {
        let Some(m) = caps.get(0) else { continue };
        if !is_code(&mask, m.start()) {
            continue;
        }
        goto_starts.insert(m.start());
        let target = caps.get(1).map_or("", |m| m.as_str()).to_string();
        if !node.targets.contains(&target) {
            node.targets.push(target);
        }
    }

    for m in GOTO_KEYWORD_RE.find_iter(body) {
        if is_code(&mask, m.start()) && !goto_starts.contains(&m.start()) {
            issues.push(ParseIssue {
                line: base_line() + body[..m.start()].matches('\n').count(),
                message: "goto missing target".to_string(),
            });
        }
    }

    for caps in CHOICE_ARM_RE.captures_iter(body) {
        // The label sits in a string literal; anchor the code check on
        // the target identifier instead.
        let Some(target) = caps.get(2) else { continue };
        if !is_code(&mask, target.start()) {
            continue;
        }
        let label = caps.get(1).map_or("", |m| m.as_str()).to_string();
        if !label.is_empty() {
            node.choices.push(label);
        }
        let target = target.as_str().to_string();
        if !node.targets.contains(&target) {
            node.targets.push(target);
        }
    }

    let has_choice = CHOICE_HEAD_RE
        .find_iter(body)
        .any(|m| is_code(&mask, m.start()));

    if let Some(caps) = IF_PAREN_RE
        .captures_iter(body)
        .find(|c| c.get(0).is_some_and(|m| is_code(&mask, m.start())))
    {
        node.condition_expression = caps.get(1).map_or("", |m| m.as_str()).trim().to_string();
    } else if let Some(caps) = IF_BARE_RE
        .captures_iter(body)
        .find(|c| c.get(0).is_some_and(|m| is_code(&mask, m.start())))
    {
        node.condition_expression = caps.get(1).map_or("", |m| m.as_str()).trim().to_string();
    }

    node.kind = if has_choice {
        NodeKind::Choice
    } else if !node.condition_expression.is_empty() {
        NodeKind::Condition
    } else if !node.text.is_empty() {
        NodeKind::Dialogue
    } else {
        NodeKind::Scene
    };

    node
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_dialogue_scene() {
        let outcome = parse_content("scene intro {\n    say Alice \"Hello\"\n    goto forest\n}\n");
        assert!(outcome.is_clean());
        assert_eq!(outcome.nodes.len(), 1);
        let node = &outcome.nodes[0];
        assert_eq!(node.id, "intro");
        assert_eq!(node.kind, NodeKind::Dialogue);
        assert_eq!(node.speaker, "Alice");
        assert_eq!(node.text, "Hello");
        assert_eq!(node.targets, vec!["forest".to_string()]);
        assert_eq!(outcome.edges, vec![("intro".to_string(), "forest".to_string())]);
    }

    #[test]
    fn parses_choice_scene() {
        let content = r#"scene fork {
    say Narrator "Pick a path"
    choice {
        "Go left" -> goto cave
        "Go right" -> goto river
    }
}"#;
        let outcome = parse_content(content);
        let node = &outcome.nodes[0];
        assert_eq!(node.kind, NodeKind::Choice);
        assert_eq!(node.choices, vec!["Go left".to_string(), "Go right".to_string()]);
        assert_eq!(node.targets, vec!["cave".to_string(), "river".to_string()]);
        assert_eq!(outcome.edges.len(), 2);
    }

    #[test]
    fn parses_condition_scene() {
        let content = "scene gate {\n    if (has_key) {\n        goto vault\n    }\n    goto hall\n}\n";
        let outcome = parse_content(content);
        let node = &outcome.nodes[0];
        assert_eq!(node.kind, NodeKind::Condition);
        assert_eq!(node.condition_expression, "has_key");
        assert_eq!(node.targets, vec!["vault".to_string(), "hall".to_string()]);
    }

    #[test]
    fn entry_statement_recorded_once() {
        let content = "entry intro\nentry other\nscene intro { }\n";
        let outcome = parse_content(content);
        assert_eq!(outcome.entry_point, Some("intro".to_string()));
    }

    #[test]
    fn say_without_speaker() {
        let outcome = parse_content("scene s { say \"plain line\" }");
        assert_eq!(outcome.nodes[0].speaker, "");
        assert_eq!(outcome.nodes[0].text, "plain line");
    }

    #[test]
    fn escaped_text_is_unescaped() {
        let outcome = parse_content(r#"scene s { say Bob "line1\nline2 \"q\"" }"#);
        assert_eq!(outcome.nodes[0].text, "line1\nline2 \"q\"");
    }

    #[test]
    fn commented_out_statements_ignored() {
        let content = "scene s {\n    // goto nowhere\n    /* say Ghost \"boo\" */\n    goto real\n}\n";
        let outcome = parse_content(content);
        assert_eq!(outcome.nodes[0].targets, vec!["real".to_string()]);
        assert_eq!(outcome.nodes[0].text, "");
    }

    #[test]
    fn duplicate_scene_id_reported() {
        let content = "scene a { }\nscene a { }\n";
        let outcome = parse_content(content);
        assert_eq!(outcome.nodes.len(), 1);
        assert_eq!(outcome.issues.len(), 1);
        assert!(outcome.issues[0].message.contains("duplicate scene id"));
    }

    #[test]
    fn unterminated_scene_reported_with_line() {
        let content = "scene ok { }\nscene broken {\n    goto ok\n";
        let outcome = parse_content(content);
        assert_eq!(outcome.nodes.len(), 1);
        assert_eq!(outcome.issues.len(), 1);
        assert_eq!(outcome.issues[0].line, 2);
        assert!(outcome.issues[0].message.contains("unterminated"));
    }

    #[test]
    fn goto_without_target_reported() {
        let content = "scene s {\n    goto\n}\n";
        let outcome = parse_content(content);
        assert!(outcome
            .issues
            .iter()
            .any(|i| i.message == "goto missing target"));
    }

    #[test]
    fn sentinel_block_round_trips() {
        let mut content = String::from("scene hub {\n    say Guide \"Choose\"\n");
        content.push('\n');
        content.push_str(&crate::sync::render_branch_block(&[
            "left".to_string(),
            "right".to_string(),
        ]));
        content.push_str("\n}\n");

        let outcome = parse_content(&content);
        assert!(outcome.is_clean());
        let node = &outcome.nodes[0];
        assert_eq!(node.kind, NodeKind::Choice);
        assert_eq!(node.targets, vec!["left".to_string(), "right".to_string()]);
    }

    #[test]
    fn duplicate_targets_deduplicated() {
        let content = "scene s { goto a\n goto a\n goto b }";
        let outcome = parse_content(content);
        assert_eq!(
            outcome.nodes[0].targets,
            vec!["a".to_string(), "b".to_string()]
        );
    }
}

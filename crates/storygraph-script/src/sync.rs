//! Surgical rewrites of scene bodies inside script files.
//!
//! Two regions of a scene are owned by the graph and may be rewritten:
//! the sentinel-delimited branch block and the first say statement.
//! Everything else in the file belongs to the author and is preserved.

use crate::error::ScriptError;
use crate::ident::sanitize_speaker;
use crate::scan::{code_mask, scene_body_range, BlockIssue};
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Opening sentinel of the generated branch block.
pub const GRAPH_BLOCK_BEGIN: &str = "// @graph-begin";
/// Closing sentinel of the generated branch block.
pub const GRAPH_BLOCK_END: &str = "// @graph-end";
/// Default dialogue text that must never be written into a script.
pub const PLACEHOLDER_TEXT: &str = "New scene";

static GRAPH_BLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"//\s*@graph-begin[\s\S]*?//\s*@graph-end").expect("static pattern"));

static SAY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\bsay\s+(?:([\p{L}_][\p{L}\p{N}_]*)\s+)?"([^"]*)""#).expect("static pattern")
});

/// Render the sentinel-delimited branch block for `targets`.
///
/// No targets yields a comment-only body, one target a plain `goto`,
/// several a `choice` block with one labeled branch per target.
#[must_use]
pub fn render_branch_block(targets: &[String]) -> String {
    let indent = "    ";
    let mut lines = Vec::new();
    lines.push(format!("{indent}{GRAPH_BLOCK_BEGIN}"));
    lines.push(format!("{indent}// Auto-generated transitions from Story Graph"));

    match targets {
        [] => lines.push(format!("{indent}// (no outgoing transitions)")),
        [only] => lines.push(format!("{indent}goto {only}")),
        many => {
            lines.push(format!("{indent}choice {{"));
            for target in many {
                lines.push(format!("{indent}    \"{target}\" -> goto {target}"));
            }
            lines.push(format!("{indent}}}"));
        }
    }

    lines.push(format!("{indent}{GRAPH_BLOCK_END}"));
    lines.join("\n")
}

/// Escape dialogue text for a script string literal.
///
/// Backslashes first, then quotes, then control characters.
#[must_use]
pub fn escape_text(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

/// Undo [`escape_text`].
#[must_use]
pub fn unescape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Rewrite the branch block of `scene_id` in the script at `path`.
///
/// With an empty target list any existing block is removed; otherwise
/// the block is replaced in place, or appended to the scene body when
/// no sentinels are present yet. The file is untouched when nothing
/// changes.
///
/// # Errors
///
/// I/O failures, [`ScriptError::SceneNotFound`], or
/// [`ScriptError::UnterminatedBlock`].
pub fn update_branch_block(
    path: &Path,
    scene_id: &str,
    targets: &[String],
) -> Result<(), ScriptError> {
    let content = std::fs::read_to_string(path)?;
    let range = scene_body_range(&content, scene_id).map_err(|issue| match issue {
        BlockIssue::SceneNotFound => ScriptError::SceneNotFound(scene_id.to_string()),
        BlockIssue::Unterminated => ScriptError::UnterminatedBlock(scene_id.to_string()),
    })?;

    let mut body = content[range.clone()].to_string();
    let has_block = GRAPH_BLOCK_RE.is_match(&body);

    if targets.is_empty() {
        if !has_block {
            return Ok(());
        }
        body = GRAPH_BLOCK_RE.replace_all(&body, "").into_owned();
    } else {
        let block = render_branch_block(targets);
        if has_block {
            body = GRAPH_BLOCK_RE
                .replace_all(&body, regex::NoExpand(&block))
                .into_owned();
        } else {
            if !body.ends_with('\n') && !body.trim().is_empty() {
                body.push('\n');
            }
            body.push('\n');
            body.push_str(&block);
            body.push('\n');
        }
    }

    if body == content[range.clone()] {
        return Ok(());
    }

    let updated = splice(&content, range, &body);
    debug!(scene = scene_id, path = %path.display(), targets = targets.len(), "branch block updated");
    write_atomic(path, &updated)
}

/// Rewrite the first say statement of `scene_id` in the script at `path`.
///
/// Empty text and the `"New scene"` placeholder are silently skipped.
/// The speaker is sanitized to a legal identifier and the text escaped.
/// An existing say statement is replaced only when different; a missing
/// one is prepended to the body unless the exact statement is already
/// present elsewhere in it.
///
/// # Errors
///
/// I/O failures, [`ScriptError::SceneNotFound`], or
/// [`ScriptError::UnterminatedBlock`].
pub fn update_say_statement(
    path: &Path,
    scene_id: &str,
    speaker: &str,
    text: &str,
) -> Result<(), ScriptError> {
    if text.is_empty() || text.trim() == PLACEHOLDER_TEXT {
        return Ok(());
    }

    let content = std::fs::read_to_string(path)?;
    let range = scene_body_range(&content, scene_id).map_err(|issue| match issue {
        BlockIssue::SceneNotFound => ScriptError::SceneNotFound(scene_id.to_string()),
        BlockIssue::Unterminated => ScriptError::UnterminatedBlock(scene_id.to_string()),
    })?;

    let mut body = content[range.clone()].to_string();
    let escaped = escape_text(text);
    let speaker = sanitize_speaker(speaker);
    let statement = format!("say {speaker} \"{escaped}\"");

    // A commented-out say is author text, not the statement we own.
    let mask = code_mask(&body);
    let found = SAY_RE
        .find_iter(&body)
        .find(|m| mask.get(m.start()).copied().unwrap_or(false));
    match found {
        None => {
            if !body.contains(&statement) {
                body = format!("\n    {statement}{body}");
            }
        }
        Some(m) => {
            if m.as_str() != statement {
                body.replace_range(m.range(), &statement);
            }
        }
    }

    if body == content[range.clone()] {
        return Ok(());
    }

    let updated = splice(&content, range, &body);
    debug!(scene = scene_id, path = %path.display(), "say statement updated");
    write_atomic(path, &updated)
}

fn splice(content: &str, range: std::ops::Range<usize>, body: &str) -> String {
    let mut updated = String::with_capacity(content.len() + body.len());
    updated.push_str(&content[..range.start]);
    updated.push_str(body);
    updated.push_str(&content[range.end..]);
    updated
}

/// Write `content` to `path` through a temp file in the same directory,
/// so a crash mid-write never leaves a truncated script behind.
pub(crate) fn write_atomic(path: &Path, content: &str) -> Result<(), ScriptError> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    let mut tmp = match dir {
        Some(dir) => tempfile::NamedTempFile::new_in(dir)?,
        None => tempfile::NamedTempFile::new()?,
    };
    tmp.write_all(content.as_bytes())?;
    tmp.persist(path)
        .map_err(|e| ScriptError::Persist(e.to_string()))?;
    Ok(())
}

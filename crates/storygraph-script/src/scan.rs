//! Comment- and string-aware scanning of script text.
//!
//! Script files mix code with `//` line comments, `/* */` block
//! comments, and string literals delimited by `"` or `'` (with
//! backslash escapes). Brace matching and keyword searches must ignore
//! anything inside those regions; a `}` in a dialogue string is not a
//! scene terminator.

use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;

/// Where a scene block lookup went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockIssue {
    /// No `scene <id>` declaration in the text.
    SceneNotFound,
    /// The declaration exists but its body never closes.
    Unterminated,
}

/// Byte offset of the brace that closes the one at `open`.
///
/// `open` must point at a `{`. Braces inside comments and string
/// literals are skipped. Returns `None` when the block never closes.
#[must_use]
pub fn matching_brace(content: &str, open: usize) -> Option<usize> {
    let bytes = content.as_bytes();
    let mut depth = 0i32;
    let mut in_string = false;
    let mut delimiter = 0u8;
    let mut in_line_comment = false;
    let mut in_block_comment = false;

    let mut i = open;
    while i < bytes.len() {
        let c = bytes[i];
        let next = if i + 1 < bytes.len() { bytes[i + 1] } else { 0 };

        if in_line_comment {
            if c == b'\n' {
                in_line_comment = false;
            }
            i += 1;
            continue;
        }
        if in_block_comment {
            if c == b'*' && next == b'/' {
                in_block_comment = false;
                i += 2;
                continue;
            }
            i += 1;
            continue;
        }

        if !in_string && c == b'/' && next == b'/' {
            in_line_comment = true;
            i += 2;
            continue;
        }
        if !in_string && c == b'/' && next == b'*' {
            in_block_comment = true;
            i += 2;
            continue;
        }

        if c == b'"' || c == b'\'' {
            if !in_string {
                in_string = true;
                delimiter = c;
            } else if delimiter == c && i > 0 && bytes[i - 1] != b'\\' {
                in_string = false;
            }
        }

        if !in_string {
            if c == b'{' {
                depth += 1;
            } else if c == b'}' {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
        }

        i += 1;
    }

    None
}

/// Per-byte classification of `content`: `true` where the byte is code,
/// `false` inside comments or string literals. Delimiters themselves
/// count as non-code for strings and comments.
#[must_use]
pub fn code_mask(content: &str) -> Vec<bool> {
    let bytes = content.as_bytes();
    let mut mask = vec![true; bytes.len()];
    let mut in_string = false;
    let mut delimiter = 0u8;
    let mut in_line_comment = false;
    let mut in_block_comment = false;

    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        let next = if i + 1 < bytes.len() { bytes[i + 1] } else { 0 };

        if in_line_comment {
            mask[i] = false;
            if c == b'\n' {
                in_line_comment = false;
                mask[i] = true;
            }
            i += 1;
            continue;
        }
        if in_block_comment {
            mask[i] = false;
            if c == b'*' && next == b'/' {
                in_block_comment = false;
                mask[i + 1] = false;
                i += 2;
                continue;
            }
            i += 1;
            continue;
        }

        if !in_string && c == b'/' && next == b'/' {
            in_line_comment = true;
            mask[i] = false;
            i += 1;
            continue;
        }
        if !in_string && c == b'/' && next == b'*' {
            in_block_comment = true;
            mask[i] = false;
            i += 1;
            continue;
        }

        if c == b'"' || c == b'\'' {
            if !in_string {
                in_string = true;
                delimiter = c;
                mask[i] = false;
            } else if delimiter == c && i > 0 && bytes[i - 1] != b'\\' {
                in_string = false;
                mask[i] = false;
            }
        }

        if in_string {
            mask[i] = false;
        }

        i += 1;
    }

    mask
}

static IDENT_TAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\p{L}\p{N}_]").expect("static pattern"));

/// Find the body of `scene <scene_id> { ... }` in `content`.
///
/// The returned range covers the body between the braces, exclusive.
/// The id match is exact: `scene intro` does not match `scene intro2`.
///
/// # Errors
///
/// [`BlockIssue::SceneNotFound`] when no declaration matches,
/// [`BlockIssue::Unterminated`] when the body never closes.
pub fn scene_body_range(content: &str, scene_id: &str) -> Result<Range<usize>, BlockIssue> {
    let pattern = format!(r"\bscene\s+{}", regex::escape(scene_id));
    let re = Regex::new(&pattern).map_err(|_| BlockIssue::SceneNotFound)?;

    let mut head_end = None;
    for m in re.find_iter(content) {
        // Reject prefix matches like `scene intro2` for id `intro`.
        if IDENT_TAIL.is_match(&content[m.end()..]) {
            continue;
        }
        head_end = Some(m.end());
        break;
    }
    let head_end = head_end.ok_or(BlockIssue::SceneNotFound)?;

    let open = content[head_end..]
        .find('{')
        .map(|p| head_end + p)
        .ok_or(BlockIssue::SceneNotFound)?;
    let close = matching_brace(content, open).ok_or(BlockIssue::Unterminated)?;
    Ok(open + 1..close)
}

/// 1-based line number of a byte offset.
#[must_use]
pub fn line_of(content: &str, offset: usize) -> usize {
    content
        .as_bytes()
        .iter()
        .take(offset)
        .filter(|&&b| b == b'\n')
        .count()
        + 1
}

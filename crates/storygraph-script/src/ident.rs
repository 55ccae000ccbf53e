//! Speaker identifier validation and sanitization.
//!
//! Speakers written into `say` statements must be legal script
//! identifiers, or playback fails with an undefined-character error.
//! The accepted ranges mirror the script lexer exactly, so a speaker
//! that passes here always tokenizes in the engine.

/// Fallback speaker for empty or unusable names.
pub const NARRATOR: &str = "Narrator";

/// Whether `c` can start an identifier (underscore aside).
fn is_identifier_start(c: char) -> bool {
    let cp = c as u32;
    c.is_ascii_alphabetic()
        || (0x00C0..=0x024F).contains(&cp) // Latin Extended-A/B/Additional
        || (0x0370..=0x03FF).contains(&cp) // Greek
        || (0x0400..=0x04FF).contains(&cp) // Cyrillic
        || (0x0500..=0x052F).contains(&cp) // Cyrillic Supplement
        || (0x0590..=0x05FF).contains(&cp) // Hebrew
        || (0x0600..=0x06FF).contains(&cp) // Arabic
        || (0x3040..=0x309F).contains(&cp) // Hiragana
        || (0x30A0..=0x30FF).contains(&cp) // Katakana
        || (0x4E00..=0x9FFF).contains(&cp) // CJK Unified Ideographs
        || (0xAC00..=0xD7AF).contains(&cp) // Hangul
}

/// Whether `c` can continue an identifier (underscore aside).
fn is_identifier_part(c: char) -> bool {
    let cp = c as u32;
    is_identifier_start(c)
        || c.is_ascii_digit()
        || (0x0300..=0x036F).contains(&cp) // combining marks
}

/// Whether `speaker` is already a legal script identifier.
#[must_use]
pub fn is_valid_identifier(speaker: &str) -> bool {
    let mut chars = speaker.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if first != '_' && !is_identifier_start(first) {
        return false;
    }
    chars.all(|c| c == '_' || is_identifier_part(c))
}

/// Coerce `speaker` into a legal script identifier.
///
/// Empty input, and any result consisting only of underscores, falls
/// back to [`NARRATOR`]. A leading digit gets an underscore prefix;
/// every other illegal character becomes an underscore.
#[must_use]
pub fn sanitize_speaker(speaker: &str) -> String {
    if speaker.is_empty() {
        return NARRATOR.to_string();
    }

    if is_valid_identifier(speaker) {
        if speaker.chars().any(|c| c != '_') {
            return speaker.to_string();
        }
        return NARRATOR.to_string();
    }

    let mut result = String::with_capacity(speaker.len() + 1);
    for (i, c) in speaker.chars().enumerate() {
        if i == 0 {
            if c == '_' || is_identifier_start(c) {
                result.push(c);
            } else if c.is_ascii_digit() {
                result.push('_');
                result.push(c);
            } else {
                result.push('_');
            }
        } else if c == '_' || is_identifier_part(c) {
            result.push(c);
        } else {
            result.push('_');
        }
    }

    if result.chars().all(|c| c == '_') {
        return NARRATOR.to_string();
    }
    result
}

//! Storygraph Script
//!
//! Text-level synchronization between the story graph and `.nms` script
//! files. Edits are surgical: only the sentinel-delimited branch block
//! and the first say statement of a scene are ever touched, everything
//! else in the file is preserved byte for byte.
//!
//! # Overview
//!
//! - **scan**: comment- and string-aware brace matching
//! - **ident**: speaker identifier validation and sanitization
//! - **sync**: branch block and say statement rewriting with atomic writes
//! - **parse**: per-file extraction of scenes, edges, and the entry marker
//! - **generate**: whole-file script generation and new-file scaffolding

#![warn(missing_docs)]

pub mod error;
pub mod generate;
pub mod ident;
pub mod parse;
pub mod scan;
pub mod sync;

// Re-exports
pub use error::ScriptError;
pub use generate::{generate_script, scaffold_script, scene_block};
pub use ident::{is_valid_identifier, sanitize_speaker, NARRATOR};
pub use parse::{parse_content, parse_file, ParseIssue, ParseOutcome, ParsedNode};
pub use sync::{
    render_branch_block, update_branch_block, update_say_statement, PLACEHOLDER_TEXT,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for script synchronization
    pub use crate::{
        parse_content, parse_file, render_branch_block, sanitize_speaker, scaffold_script,
        update_branch_block, update_say_statement, ParseOutcome, ParsedNode, ScriptError,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

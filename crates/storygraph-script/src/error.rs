//! Error types for script file operations.

/// Errors raised while reading, rewriting, or parsing script files.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    /// Filesystem failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The scene declaration is absent from the file.
    #[error("scene not found in script: {0}")]
    SceneNotFound(String),

    /// A scene body's opening brace never closes.
    #[error("unterminated scene block: {0}")]
    UnterminatedBlock(String),

    /// The atomic rename at the end of a write failed.
    #[error("failed to persist script file: {0}")]
    Persist(String),
}

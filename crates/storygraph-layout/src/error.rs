//! Error types for layout persistence.

/// Errors raised while loading or saving the layout file.
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    /// Filesystem failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The layout file exists but is not valid JSON of the expected shape.
    #[error("malformed layout file: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The atomic rename at the end of a save failed.
    #[error("failed to persist layout file: {0}")]
    Persist(String),
}

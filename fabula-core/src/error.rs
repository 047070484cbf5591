use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by story persistence, reconstruction, and generation.
#[derive(Debug, Error)]
pub enum Error {
    /// Upstream-produced node data violated the tree shape contract.
    /// Aborts the whole ingestion; nothing of the tree survives.
    #[error("malformed story tree: {0}")]
    MalformedTree(String),

    /// The model's output did not decode into the expected story shape.
    #[error("model response did not match the story format: {0}")]
    ModelResponseParse(String),

    /// Stored rows for a story do not form a well-rooted tree.
    #[error("structural integrity violation: {0}")]
    StructuralIntegrity(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

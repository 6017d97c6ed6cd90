use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error("embedding {index} has dimension {found}, expected {expected}")]
    ShapeMismatch {
        index: usize,
        expected: usize,
        found: usize,
    },
    #[error("embedding {index} has a non-finite value at position {position}")]
    NonFiniteEmbedding { index: usize, position: usize },
    #[error("no items or embeddings to work with")]
    EmptyInput,
    #[error("movie title not found: {title}")]
    ItemNotFound {
        title: String,
        suggestion: Option<String>,
    },
    #[error("no movie has genre: {0}")]
    GenreNotFound(String),
    #[error("join mismatch: {0}")]
    JoinMismatch(String),
    #[error("duplicate movie title: {0}")]
    DuplicateTitle(String),
    #[error("duplicate id: {0}")]
    DuplicateId(usize),
    #[error("unknown metric: {0}, expected Distance, Dotproduct or Cosine")]
    UnknownMetric(String),
}

impl CoreError {
    /// Whether the error belongs to a single request rather than to the loaded data.
    pub fn is_per_query(&self) -> bool {
        matches!(
            self,
            CoreError::ItemNotFound { .. }
                | CoreError::GenreNotFound(_)
                | CoreError::UnknownMetric(_)
        )
    }
}

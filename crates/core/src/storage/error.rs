use thiserror::Error;

/// Errors returned by repositories and everything layered on top of them.
///
/// `NotFound` is the only variant callers are expected to branch on; the rest
/// are infrastructure failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },
    #[error("{entity_type} already exists: {id}")]
    AlreadyExists {
        entity_type: &'static str,
        id: String,
    },
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Query failed: {0}")]
    QueryFailed(String),
    #[error("Exec failed: {0}")]
    ExecFailed(String),
    #[error("Could not scan row: {0}")]
    Scan(String),
    #[error("Could not marshal column: {0}")]
    Marshal(String),
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),
    #[error("Insufficient balance on account {id}")]
    InsufficientBalance { id: String },
    #[error("Timed out waiting for {entity_type} {id}")]
    Timeout {
        entity_type: &'static str,
        id: String,
    },
    #[error("Cache failed: {0}")]
    Cache(String),
}

impl RepositoryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound { .. })
    }
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;

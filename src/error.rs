use thiserror::Error;

/// All possible errors in a scoped session
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Failed to open database connection: {0}")]
    Connection(#[source] rusqlite::Error),

    #[error("Query failed: {0}")]
    Query(#[source] rusqlite::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, SessionError>;

//! Error types for collaborator operations

use thiserror::Error;

/// Errors reported by a storage backend
///
/// Backends map their driver errors into these variants so that the
/// extraction layer never depends on a concrete database crate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Backend could not be reached or the connection was lost
    #[error("Connection error: {0}")]
    Connection(String),

    /// A query failed while executing
    #[error("Query error: {0}")]
    Query(String),

    /// A row held data that could not be turned into a domain value
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// A row expected to exist was not found
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Errors reported by an indicator pattern matcher
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatchError {
    /// A pattern could not be compiled
    #[error("Invalid pattern for {kind}: {message}")]
    InvalidPattern {
        /// Kind the pattern belongs to
        kind: String,
        /// Compiler message
        message: String,
    },

    /// The input could not be searched
    #[error("Unsearchable input: {0}")]
    Input(String),
}

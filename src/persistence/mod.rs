//! Persistence for authentication logs
//!
//! Factories and observers that save logins go through [`AuthLogStore`],
//! so the pipeline never talks to a database directly.

pub mod sqlite_store;

pub use sqlite_store::SqliteAuthLogStore;

use thiserror::Error;

use crate::models::AuthenticationLog;

/// Errors that can occur during persistence operations
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid data in database: {0}")]
    InvalidData(String),

    #[error("No store configured for {0} logs")]
    NoStore(String),
}

/// Storage backend for authentication logs
pub trait AuthLogStore: Send + Sync {
    /// Append a log entry
    fn store_log(&self, log: &AuthenticationLog) -> Result<(), PersistenceError>;

    /// Most recent entries for one principal, newest first
    fn recent_logs(
        &self,
        user_kind: &str,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<AuthenticationLog>, PersistenceError>;

    /// Number of entries stored for one principal
    fn count_logs(&self, user_kind: &str, user_id: &str) -> Result<usize, PersistenceError>;

    /// Clear all data (useful for testing)
    fn clear_all(&self) -> Result<(), PersistenceError>;
}

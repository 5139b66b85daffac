//! Crate-level error type
//!
//! Location lookups never fail from the caller's point of view, so there is
//! no geolocation variant here. Everything else that can abort a login
//! pipeline run ends up in [`AuthLogError`].

use thiserror::Error;

use crate::notification::NotificationError;
use crate::persistence::PersistenceError;

/// Errors surfaced by the login pipeline
#[derive(Error, Debug)]
pub enum AuthLogError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("There is no authentication log factory available named {0}")]
    FactoryNotFound(String),

    #[error(
        "New device event for {kind} user '{user_id}' was not handled: \
         register an observer that marks it handled or use a persistable factory"
    )]
    UnhandledEvent { kind: String, user_id: String },

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Notification error: {0}")]
    Notification(#[from] NotificationError),

    #[error("Login queue closed")]
    QueueClosed,

    #[error("Login queue full")]
    QueueFull,

    #[error("{failed} of {enqueued} queued login(s) failed")]
    QueuedLoginsFailed { failed: usize, enqueued: usize },
}

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, AuthLogError>;

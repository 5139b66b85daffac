//! Authentication log factories
//!
//! Each factory handles the logins of one kind. A factory that can save its
//! own entries exposes that through [`AuthenticationLogFactory::as_persistable`];
//! for the others, an event observer has to take responsibility.

pub mod registry;
pub mod standard;

pub use registry::FactoryRegistry;
pub use standard::StandardLogFactory;

use crate::models::{AuthenticationLog, UserInformation, UserReference};
use crate::persistence::PersistenceError;

/// Strategy responsible for the log entries of one kind
pub trait AuthenticationLogFactory: Send + Sync {
    /// The kind this factory handles
    fn supports(&self) -> &str;

    /// Build the log entry for a login
    fn create(
        &self,
        user_reference: &UserReference,
        user_information: &UserInformation,
    ) -> AuthenticationLog {
        AuthenticationLog::new(user_reference, user_information)
    }

    /// Persistence capability, if this factory has one
    fn as_persistable(&self) -> Option<&dyn PersistableAuthenticationLogFactory> {
        None
    }
}

/// A factory that saves its own log entries without an observer
pub trait PersistableAuthenticationLogFactory: AuthenticationLogFactory {
    fn persist(
        &self,
        user_reference: &UserReference,
        user_information: &UserInformation,
    ) -> Result<(), PersistenceError>;
}

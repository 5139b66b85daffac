use std::sync::Arc;

use super::{AuthenticationLogFactory, PersistableAuthenticationLogFactory};
use crate::models::{UserInformation, UserReference};
use crate::persistence::{AuthLogStore, PersistenceError};

/// Factory for one kind, optionally backed by a store
///
/// With a store the factory persists its own entries. Without one, an
/// observer must handle the new device event.
pub struct StandardLogFactory {
    kind: String,
    store: Option<Arc<dyn AuthLogStore>>,
}

impl StandardLogFactory {
    /// A factory that leaves persistence to observers
    pub fn new(kind: impl Into<String>) -> Self {
        StandardLogFactory {
            kind: kind.into(),
            store: None,
        }
    }

    /// A factory that persists into `store`
    pub fn with_store(kind: impl Into<String>, store: Arc<dyn AuthLogStore>) -> Self {
        StandardLogFactory {
            kind: kind.into(),
            store: Some(store),
        }
    }
}

impl AuthenticationLogFactory for StandardLogFactory {
    fn supports(&self) -> &str {
        &self.kind
    }

    fn as_persistable(&self) -> Option<&dyn PersistableAuthenticationLogFactory> {
        if self.store.is_some() {
            Some(self)
        } else {
            None
        }
    }
}

impl PersistableAuthenticationLogFactory for StandardLogFactory {
    fn persist(
        &self,
        user_reference: &UserReference,
        user_information: &UserInformation,
    ) -> Result<(), PersistenceError> {
        let store = self
            .store
            .as_ref()
            .ok_or_else(|| PersistenceError::NoStore(self.kind.clone()))?;
        store.store_log(&self.create(user_reference, user_information))
    }
}

use std::sync::Arc;

use super::{EventObserver, NewDeviceEvent};
use crate::error::Result;
use crate::models::AuthenticationLog;
use crate::persistence::AuthLogStore;

/// Observer that records every login in a store
///
/// Used with factories that do not persist on their own.
pub struct StoreObserver {
    store: Arc<dyn AuthLogStore>,
}

impl StoreObserver {
    pub fn new(store: Arc<dyn AuthLogStore>) -> Self {
        StoreObserver { store }
    }
}

impl EventObserver for StoreObserver {
    fn on_new_device(&self, event: &NewDeviceEvent<'_>) -> Result<bool> {
        let log = AuthenticationLog::new(event.user_reference, event.user_information);
        self.store.store_log(&log)?;
        log::debug!(
            "Recorded login for {} '{}'",
            event.user_reference.kind,
            event.user_reference.id
        );
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{UserInformation, UserReference};
    use crate::persistence::SqliteAuthLogStore;
    use chrono::Utc;

    #[test]
    fn test_store_observer_records_and_handles() {
        let store = Arc::new(SqliteAuthLogStore::in_memory().unwrap());
        let observer = StoreObserver::new(store.clone());

        let reference = UserReference::new("account", "42");
        let info = UserInformation::new(Some("10.0.0.1".to_string()), None, Utc::now(), None);

        let handled = observer
            .on_new_device(&NewDeviceEvent::new(&reference, &info))
            .unwrap();

        assert!(handled);
        let logs = store.recent_logs("account", "42", 5).unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].ip_address.as_deref(), Some("10.0.0.1"));
    }
}

//! New device events and their observers
//!
//! Every login produces one [`NewDeviceEvent`]. Observers run synchronously
//! in registration order and each reports whether it took responsibility for
//! recording the login. The event counts as handled if any observer did.

pub mod store_observer;

pub use store_observer::StoreObserver;

use std::sync::Arc;

use crate::error::Result;
use crate::models::{UserInformation, UserReference};

/// Signal dispatched once per login
#[derive(Debug, Clone, Copy)]
pub struct NewDeviceEvent<'a> {
    pub user_reference: &'a UserReference,
    pub user_information: &'a UserInformation,
}

impl<'a> NewDeviceEvent<'a> {
    pub fn new(user_reference: &'a UserReference, user_information: &'a UserInformation) -> Self {
        NewDeviceEvent {
            user_reference,
            user_information,
        }
    }
}

/// Reacts to new device events
pub trait EventObserver: Send + Sync {
    /// Returns `true` when this observer recorded the login
    fn on_new_device(&self, event: &NewDeviceEvent<'_>) -> Result<bool>;
}

/// Runs observers in registration order
#[derive(Clone, Default)]
pub struct EventDispatcher {
    observers: Vec<Arc<dyn EventObserver>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        EventDispatcher {
            observers: Vec::new(),
        }
    }

    pub fn with_observers(observers: Vec<Arc<dyn EventObserver>>) -> Self {
        EventDispatcher { observers }
    }

    pub fn register(&mut self, observer: Arc<dyn EventObserver>) {
        self.observers.push(observer);
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Deliver `event` to every observer
    ///
    /// Returns whether any observer handled it. An observer error stops
    /// delivery and is returned as is.
    pub fn dispatch(&self, event: &NewDeviceEvent<'_>) -> Result<bool> {
        let mut handled = false;
        for observer in &self.observers {
            handled |= observer.on_new_device(event)?;
        }
        Ok(handled)
    }
}

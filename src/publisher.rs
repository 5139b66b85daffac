//! Authentication event publication
//!
//! For every login, in this order: automatic persistence (when the factory
//! can persist), event dispatch to observers, the handled check, and finally
//! the notification. A login that is neither persisted by its factory nor
//! handled by an observer is an error, and no notification goes out for it.

use std::sync::Arc;

use crate::context::AuthenticationContext;
use crate::error::{AuthLogError, Result};
use crate::events::{EventDispatcher, NewDeviceEvent};
use crate::notification::Notifier;

pub struct AuthenticationEventPublisher {
    dispatcher: EventDispatcher,
    notifier: Arc<dyn Notifier>,
}

impl AuthenticationEventPublisher {
    pub fn new(dispatcher: EventDispatcher, notifier: Arc<dyn Notifier>) -> Self {
        AuthenticationEventPublisher {
            dispatcher,
            notifier,
        }
    }

    pub async fn publish(&self, context: &AuthenticationContext) -> Result<()> {
        let reference = &context.user_reference;
        let information = &context.user_information;

        let persisted = match context.authentication_log_factory.as_persistable() {
            Some(factory) => {
                log::debug!(
                    "Persisting login for {} '{}' through its factory",
                    reference.kind,
                    reference.id
                );
                factory.persist(reference, information)?;
                true
            }
            None => false,
        };

        let handled = self
            .dispatcher
            .dispatch(&NewDeviceEvent::new(reference, information))?;

        if !handled && !persisted {
            log::error!(
                "New device event for {} '{}' was not handled by any observer",
                reference.kind,
                reference.id
            );
            return Err(AuthLogError::UnhandledEvent {
                kind: reference.kind.clone(),
                user_id: reference.id.clone(),
            });
        }

        self.notifier.send(information, reference).await?;
        Ok(())
    }
}

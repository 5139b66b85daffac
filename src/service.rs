//! Login orchestration
//!
//! [`LoginService`] is what runs for each successful login: build the
//! authentication context, then publish it. The same call runs inline or on
//! a queue worker (see [`crate::dispatch`]).

use std::sync::Arc;

use crate::config::Config;
use crate::context::{AuthenticationContextBuilder, UserInformationCollector};
use crate::error::Result;
use crate::events::{EventDispatcher, EventObserver};
use crate::factory::{AuthenticationLogFactory, FactoryRegistry};
use crate::geolocation::build_resolver;
use crate::models::{LoginParameters, UserReference};
use crate::notification::{build_notifier, Notifier};
use crate::publisher::AuthenticationEventPublisher;

pub struct LoginService {
    builder: AuthenticationContextBuilder,
    publisher: AuthenticationEventPublisher,
}

impl LoginService {
    pub fn new(
        builder: AuthenticationContextBuilder,
        publisher: AuthenticationEventPublisher,
    ) -> Self {
        LoginService { builder, publisher }
    }

    /// Wire a service from configuration
    ///
    /// The configuration is validated first; the location resolver and
    /// notification channels come from it, factories and observers from the
    /// application.
    pub fn from_config(
        config: &Config,
        factories: Vec<Arc<dyn AuthenticationLogFactory>>,
        observers: Vec<Arc<dyn EventObserver>>,
    ) -> Result<Self> {
        config.validate()?;

        let collector = UserInformationCollector::from_optional(build_resolver(&config.location));
        let registry = Arc::new(FactoryRegistry::new(factories));
        let notifier: Arc<dyn Notifier> =
            Arc::new(build_notifier(&config.notification, &config.transports)?);

        Ok(LoginService::new(
            AuthenticationContextBuilder::new(registry, collector),
            AuthenticationEventPublisher::new(EventDispatcher::with_observers(observers), notifier),
        ))
    }

    /// Process one login
    pub async fn execute(&self, params: &LoginParameters) -> Result<()> {
        self.execute_for(
            &params.factory_name,
            params.user_reference(),
            params.client_ip.as_deref(),
            params.user_agent.as_deref(),
        )
        .await
    }

    pub async fn execute_for(
        &self,
        kind: &str,
        user_reference: UserReference,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
    ) -> Result<()> {
        let context = self
            .builder
            .build(kind, user_reference, ip_address, user_agent)
            .await?;
        self.publisher.publish(&context).await
    }
}

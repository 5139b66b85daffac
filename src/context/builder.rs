use std::sync::Arc;

use super::{AuthenticationContext, UserInformationCollector};
use crate::error::Result;
use crate::factory::FactoryRegistry;
use crate::models::UserReference;

/// Composes a factory, a user reference and collected request facts
#[derive(Clone)]
pub struct AuthenticationContextBuilder {
    registry: Arc<FactoryRegistry>,
    collector: UserInformationCollector,
}

impl AuthenticationContextBuilder {
    pub fn new(registry: Arc<FactoryRegistry>, collector: UserInformationCollector) -> Self {
        AuthenticationContextBuilder {
            registry,
            collector,
        }
    }

    /// Build the context for one login
    ///
    /// Fails with `FactoryNotFound` before any location lookup when `kind`
    /// has no registered factory.
    pub async fn build(
        &self,
        kind: &str,
        user_reference: UserReference,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
    ) -> Result<AuthenticationContext> {
        let factory = self.registry.create_from(kind)?;
        let user_information = self.collector.collect(ip_address, user_agent).await;

        Ok(AuthenticationContext::new(
            factory,
            user_reference,
            user_information,
        ))
    }
}

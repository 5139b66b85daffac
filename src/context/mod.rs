//! Authentication context assembly
//!
//! Turns a raw login signal into an [`AuthenticationContext`]: the factory
//! for the login's kind, the user reference, and a snapshot of request facts.

pub mod builder;
pub mod collector;

pub use builder::AuthenticationContextBuilder;
pub use collector::UserInformationCollector;

use std::sync::Arc;

use crate::factory::AuthenticationLogFactory;
use crate::models::{UserInformation, UserReference};

/// Everything the publisher needs for one login
pub struct AuthenticationContext {
    pub authentication_log_factory: Arc<dyn AuthenticationLogFactory>,
    pub user_reference: UserReference,
    pub user_information: UserInformation,
}

impl AuthenticationContext {
    pub fn new(
        authentication_log_factory: Arc<dyn AuthenticationLogFactory>,
        user_reference: UserReference,
        user_information: UserInformation,
    ) -> Self {
        AuthenticationContext {
            authentication_log_factory,
            user_reference,
            user_information,
        }
    }
}

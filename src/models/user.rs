use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geolocation::LocateValues;

/// The authenticated principal a login belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserReference {
    /// Discriminates which log factory applies
    #[serde(rename = "type")]
    pub kind: String,
    /// Opaque stable identifier
    pub id: String,
    email: Option<String>,
    display_name: Option<String>,
    #[serde(skip)]
    notification_set: bool,
}

impl UserReference {
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        UserReference {
            kind: kind.into(),
            id: id.into(),
            email: None,
            display_name: None,
            notification_set: false,
        }
    }

    /// Set the notification recipient
    ///
    /// The recipient can only be set once. Later calls leave it unchanged
    /// and return `false`.
    pub fn set_notification_parameters(
        &mut self,
        email: Option<String>,
        display_name: Option<String>,
    ) -> bool {
        if self.notification_set {
            log::warn!(
                "Notification parameters for {} '{}' already set, ignoring",
                self.kind,
                self.id
            );
            return false;
        }
        self.email = email;
        self.display_name = display_name;
        self.notification_set = true;
        true
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }
}

/// Request-derived facts captured once per login
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInformation {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub login_at: DateTime<Utc>,
    pub location: Option<LocateValues>,
}

impl UserInformation {
    pub fn new(
        ip_address: Option<String>,
        user_agent: Option<String>,
        login_at: DateTime<Utc>,
        location: Option<LocateValues>,
    ) -> Self {
        UserInformation {
            ip_address,
            user_agent,
            login_at,
            location,
        }
    }
}

/// Everything extracted from a login success signal
///
/// Plain strings only, so the value can travel through a queue and be
/// replayed on a worker with the same effect as an inline call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginParameters {
    /// Log factory kind
    pub factory_name: String,
    pub user_identifier: String,
    pub to_email: Option<String>,
    pub to_email_name: Option<String>,
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
}

impl LoginParameters {
    /// Build the user reference this login is about
    pub fn user_reference(&self) -> UserReference {
        let mut reference = UserReference::new(&self.factory_name, &self.user_identifier);
        reference.set_notification_parameters(self.to_email.clone(), self.to_email_name.clone());
        reference
    }
}

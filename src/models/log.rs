use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::geolocation::LocateValues;
use crate::models::{UserInformation, UserReference};

/// A stored record of one successful login
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthenticationLog {
    pub user_kind: String,
    pub user_id: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub login_at: DateTime<Utc>,
    /// Flat location mapping, empty when the login could not be located
    pub location: Map<String, Value>,
}

impl AuthenticationLog {
    pub fn new(user_reference: &UserReference, user_information: &UserInformation) -> Self {
        AuthenticationLog {
            user_kind: user_reference.kind.clone(),
            user_id: user_reference.id.clone(),
            ip_address: user_information.ip_address.clone(),
            user_agent: user_information.user_agent.clone(),
            login_at: user_information.login_at,
            location: user_information
                .location
                .as_ref()
                .map(LocateValues::to_map)
                .unwrap_or_default(),
        }
    }

    /// Rebuild the resolved location, if one was stored
    pub fn location(&self) -> Option<LocateValues> {
        if self.location.is_empty() {
            return None;
        }
        LocateValues::from_map(&self.location)
    }
}

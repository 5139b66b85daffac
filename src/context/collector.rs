use chrono::Utc;
use std::sync::Arc;

use crate::geolocation::LocationResolver;
use crate::models::UserInformation;

/// Captures request facts and resolves the client location
#[derive(Clone, Default)]
pub struct UserInformationCollector {
    resolver: Option<Arc<dyn LocationResolver>>,
}

impl UserInformationCollector {
    /// A collector that never resolves locations
    pub fn new() -> Self {
        UserInformationCollector { resolver: None }
    }

    pub fn with_resolver(resolver: Arc<dyn LocationResolver>) -> Self {
        UserInformationCollector {
            resolver: Some(resolver),
        }
    }

    pub fn from_optional(resolver: Option<Arc<dyn LocationResolver>>) -> Self {
        UserInformationCollector { resolver }
    }

    /// Snapshot the login, timestamped now
    pub async fn collect(&self, ip_address: Option<&str>, user_agent: Option<&str>) -> UserInformation {
        let login_at = Utc::now();

        let location = match (self.resolver.as_ref(), ip_address) {
            (Some(resolver), Some(ip)) if !ip.trim().is_empty() => {
                let location = resolver.resolve(ip).await;
                if location.is_none() {
                    log::debug!("No location resolved for {}", ip);
                }
                location
            }
            _ => None,
        };

        UserInformation::new(
            ip_address.map(String::from),
            user_agent.map(String::from),
            login_at,
            location,
        )
    }
}

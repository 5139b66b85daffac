use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{AuthLogError, Result};

/// Configuration for the login auditing pipeline
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Asynchronous dispatch configuration
    pub dispatch: DispatchConfig,
    /// Sender identity handed to notifiers
    pub transports: TransportsConfig,
    /// IP geolocation configuration
    pub location: LocationConfig,
    /// Authentication log storage
    pub storage: StorageConfig,
    /// Notification channels
    pub notification: NotificationConfig,
}

/// Asynchronous dispatch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Route logins through the queue instead of running them inline
    pub async_enabled: bool,
    /// Bounded capacity of the login queue
    pub queue_capacity: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        DispatchConfig {
            async_enabled: false,
            queue_capacity: 100,
        }
    }
}

/// Sender identity for outgoing notifications
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportsConfig {
    pub sender_email: String,
    pub sender_name: String,
}

impl Default for TransportsConfig {
    fn default() -> Self {
        TransportsConfig {
            sender_email: "no-reply@example.com".to_string(),
            sender_name: "Security".to_string(),
        }
    }
}

/// Which location resolver is wired at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationProvider {
    /// No resolver, locations are always empty
    #[default]
    None,
    /// Remote lookup against the ip-api.com JSON endpoint
    IpApi,
    /// Offline lookup in a MaxMind GeoIP2/GeoLite2 city database
    Geoip2,
}

/// IP geolocation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    pub provider: LocationProvider,
    /// Path to the `.mmdb` file, required for `geoip2`
    pub geoip2_database_path: Option<PathBuf>,
    /// Base URL of the ip-api service
    pub ip_api_base_url: String,
    /// Connect timeout for remote lookups, in seconds
    pub connect_timeout_secs: u64,
    /// Total request timeout for remote lookups, in seconds
    pub timeout_secs: u64,
}

impl Default for LocationConfig {
    fn default() -> Self {
        LocationConfig {
            provider: LocationProvider::None,
            geoip2_database_path: None,
            ip_api_base_url: "http://ip-api.com".to_string(),
            connect_timeout_secs: 5,
            timeout_secs: 10,
        }
    }
}

/// Authentication log storage
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database file
    pub database_path: PathBuf,
    /// Kinds recorded by store-backed factories in the bundled binaries
    pub kinds: Vec<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            database_path: PathBuf::from("authlog.db"),
            kinds: vec!["standard".to_string()],
        }
    }
}

/// Notification channels
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub output: Option<OutputConfig>,
    pub slack: Option<SlackConfig>,
    pub webhooks: Vec<WebhookConfig>,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        NotificationConfig {
            output: Some(OutputConfig {
                format: "console".to_string(),
                file_path: None,
            }),
            slack: None,
            webhooks: Vec::new(),
        }
    }
}

const OUTPUT_FORMATS: [&str; 3] = ["json", "jsonl", "console"];

/// Local output channel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output format: "json", "jsonl", or "console"
    pub format: String,
    /// Output file path (stdout when absent)
    pub file_path: Option<PathBuf>,
}

/// Slack incoming webhook
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlackConfig {
    pub webhook_url: String,
    pub channel: Option<String>,
    pub username: Option<String>,
}

/// Generic JSON webhook
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    pub name: String,
    pub url: String,
    /// "POST" (default) or "PUT"
    pub method: Option<String>,
    pub headers: Option<HashMap<String, String>>,
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> std::result::Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn to_file(&self, path: &Path) -> std::result::Result<(), Box<dyn std::error::Error>> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Reject combinations that can never work at runtime
    pub fn validate(&self) -> Result<()> {
        if self.transports.sender_email.trim().is_empty() {
            return Err(AuthLogError::Configuration(
                "transports.sender_email cannot be empty".to_string(),
            ));
        }
        if self.transports.sender_name.trim().is_empty() {
            return Err(AuthLogError::Configuration(
                "transports.sender_name cannot be empty".to_string(),
            ));
        }

        if self.location.provider == LocationProvider::Geoip2 {
            let missing = self
                .location
                .geoip2_database_path
                .as_ref()
                .map_or(true, |p| p.as_os_str().is_empty());
            if missing {
                return Err(AuthLogError::Configuration(
                    "location.geoip2_database_path is required when provider is \"geoip2\""
                        .to_string(),
                ));
            }
        }

        if self.dispatch.queue_capacity == 0 {
            return Err(AuthLogError::Configuration(
                "dispatch.queue_capacity must be greater than zero".to_string(),
            ));
        }

        if self.location.connect_timeout_secs == 0 || self.location.timeout_secs == 0 {
            return Err(AuthLogError::Configuration(
                "location timeouts must be greater than zero".to_string(),
            ));
        }

        if let Some(output) = &self.notification.output {
            let format = output.format.to_lowercase();
            if !OUTPUT_FORMATS.contains(&format.as_str()) {
                return Err(AuthLogError::Configuration(format!(
                    "notification.output.format '{}' is not one of {:?}",
                    output.format, OUTPUT_FORMATS
                )));
            }
        }

        Ok(())
    }
}

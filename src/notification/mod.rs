//! New device notifications
//!
//! The publisher calls a single [`Notifier`] after every accepted login.
//! Channels (local output, Slack, generic webhooks) are combined with
//! [`CompositeNotifier`].

pub mod output;
pub mod webhook;

pub use output::{OutputFormat, OutputNotifier};
pub use webhook::WebhookNotifier;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::config::{NotificationConfig, TransportsConfig};
use crate::models::{UserInformation, UserReference};

/// Errors that can occur while delivering a notification
#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{channel} returned non-success status {status}")]
    Status { channel: String, status: u16 },
}

/// Delivers new device notifications
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(
        &self,
        user_information: &UserInformation,
        user_reference: &UserReference,
    ) -> Result<(), NotificationError>;
}

/// The payload every channel renders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDeviceNotification {
    pub sender_email: String,
    pub sender_name: String,
    pub recipient_email: Option<String>,
    pub recipient_name: Option<String>,
    pub user_kind: String,
    pub user_id: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub login_at: DateTime<Utc>,
    pub location: Option<String>,
}

impl NewDeviceNotification {
    pub fn new(
        sender: &TransportsConfig,
        user_information: &UserInformation,
        user_reference: &UserReference,
    ) -> Self {
        NewDeviceNotification {
            sender_email: sender.sender_email.clone(),
            sender_name: sender.sender_name.clone(),
            recipient_email: user_reference.email().map(String::from),
            recipient_name: user_reference.display_name().map(String::from),
            user_kind: user_reference.kind.clone(),
            user_id: user_reference.id.clone(),
            ip_address: user_information.ip_address.clone(),
            user_agent: user_information.user_agent.clone(),
            login_at: user_information.login_at,
            location: user_information
                .location
                .as_ref()
                .map(|l| l.display_location()),
        }
    }

    /// One-line summary used by chat channels and console output
    pub fn summary(&self) -> String {
        format!(
            "New login for {} '{}' from {} ({}) at {}",
            self.user_kind,
            self.user_id,
            self.ip_address.as_deref().unwrap_or("unknown IP"),
            self.location.as_deref().unwrap_or("unknown location"),
            self.login_at.to_rfc3339()
        )
    }
}

/// Fans a notification out to several channels
///
/// Every channel is attempted; the first failure is returned.
#[derive(Clone, Default)]
pub struct CompositeNotifier {
    notifiers: Vec<Arc<dyn Notifier>>,
}

impl CompositeNotifier {
    pub fn new(notifiers: Vec<Arc<dyn Notifier>>) -> Self {
        CompositeNotifier { notifiers }
    }

    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }
}

#[async_trait]
impl Notifier for CompositeNotifier {
    async fn send(
        &self,
        user_information: &UserInformation,
        user_reference: &UserReference,
    ) -> Result<(), NotificationError> {
        let mut errors = Vec::new();

        for notifier in &self.notifiers {
            if let Err(e) = notifier.send(user_information, user_reference).await {
                log::error!("Notification channel failed: {}", e);
                errors.push(e);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.remove(0))
        }
    }
}

/// Build the notifier described by configuration
pub fn build_notifier(
    config: &NotificationConfig,
    transports: &TransportsConfig,
) -> Result<CompositeNotifier, NotificationError> {
    let mut notifiers: Vec<Arc<dyn Notifier>> = Vec::new();

    if let Some(ref output) = config.output {
        notifiers.push(Arc::new(OutputNotifier::new(
            OutputFormat::from_str(&output.format),
            output.file_path.clone(),
            transports.clone(),
        )?));
    }

    if config.slack.is_some() || !config.webhooks.is_empty() {
        notifiers.push(Arc::new(WebhookNotifier::new(
            config.slack.clone(),
            config.webhooks.clone(),
            transports.clone(),
        )));
    }

    if notifiers.is_empty() {
        log::warn!("No notification channel configured, new device notifications are dropped");
    }

    Ok(CompositeNotifier::new(notifiers))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputConfig;
    use crate::geolocation::LocateValues;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingNotifier {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingNotifier {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(CountingNotifier {
                calls: AtomicUsize::new(0),
                fail,
            })
        }
    }

    #[async_trait]
    impl Notifier for CountingNotifier {
        async fn send(
            &self,
            _user_information: &UserInformation,
            _user_reference: &UserReference,
        ) -> Result<(), NotificationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(NotificationError::Status {
                    channel: "test".to_string(),
                    status: 500,
                })
            } else {
                Ok(())
            }
        }
    }

    fn sample() -> (UserInformation, UserReference) {
        let mut reference = UserReference::new("account", "42");
        reference.set_notification_parameters(
            Some("alice@acme.dev".to_string()),
            Some("Alice".to_string()),
        );
        let info = UserInformation::new(
            Some("203.0.113.5".to_string()),
            Some("TestAgent/1.0".to_string()),
            Utc::now(),
            Some(LocateValues {
                city: Some("Lyon".to_string()),
                country: Some("France".to_string()),
                ..LocateValues::default()
            }),
        );
        (info, reference)
    }

    #[test]
    fn test_notification_payload() {
        let (info, reference) = sample();
        let notification =
            NewDeviceNotification::new(&TransportsConfig::default(), &info, &reference);

        assert_eq!(notification.sender_email, "no-reply@example.com");
        assert_eq!(notification.recipient_email.as_deref(), Some("alice@acme.dev"));
        assert_eq!(notification.location.as_deref(), Some("Lyon, France"));
        assert!(notification.summary().contains("203.0.113.5"));
        assert!(notification.summary().contains("'42'"));
    }

    #[tokio::test]
    async fn test_composite_attempts_every_channel() {
        let (info, reference) = sample();
        let failing = CountingNotifier::new(true);
        let healthy = CountingNotifier::new(false);
        let composite = CompositeNotifier::new(vec![
            failing.clone() as Arc<dyn Notifier>,
            healthy.clone() as Arc<dyn Notifier>,
        ]);

        let result = composite.send(&info, &reference).await;

        assert!(matches!(result, Err(NotificationError::Status { status: 500, .. })));
        assert_eq!(failing.calls.load(Ordering::SeqCst), 1);
        assert_eq!(healthy.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_composite_succeeds() {
        let (info, reference) = sample();
        let composite = CompositeNotifier::default();
        assert!(composite.is_empty());
        assert!(composite.send(&info, &reference).await.is_ok());
    }

    #[test]
    fn test_build_notifier_channels() {
        let transports = TransportsConfig::default();

        let default = build_notifier(&NotificationConfig::default(), &transports).unwrap();
        assert_eq!(default.len(), 1);

        let config = NotificationConfig {
            output: Some(OutputConfig {
                format: "jsonl".to_string(),
                file_path: None,
            }),
            slack: None,
            webhooks: vec![crate::config::WebhookConfig {
                name: "audit".to_string(),
                url: "http://127.0.0.1:1/hook".to_string(),
                method: None,
                headers: None,
            }],
        };
        assert_eq!(build_notifier(&config, &transports).unwrap().len(), 2);

        let silent = NotificationConfig {
            output: None,
            slack: None,
            webhooks: Vec::new(),
        };
        assert!(build_notifier(&silent, &transports).unwrap().is_empty());
    }
}

//! Webhook notification channels
//!
//! Sends new device notifications to a Slack incoming webhook and to any
//! number of generic JSON webhooks.

use async_trait::async_trait;
use reqwest::Client;

use super::{NewDeviceNotification, NotificationError, Notifier};
use crate::config::{SlackConfig, TransportsConfig, WebhookConfig};
use crate::models::{UserInformation, UserReference};

/// Delivers notifications over HTTP webhooks
pub struct WebhookNotifier {
    slack: Option<SlackConfig>,
    webhooks: Vec<WebhookConfig>,
    sender: TransportsConfig,
    client: Client,
}

impl WebhookNotifier {
    pub fn new(
        slack: Option<SlackConfig>,
        webhooks: Vec<WebhookConfig>,
        sender: TransportsConfig,
    ) -> Self {
        WebhookNotifier {
            slack,
            webhooks,
            sender,
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
        }
    }

    /// Send a notification to Slack
    async fn send_slack(
        &self,
        config: &SlackConfig,
        notification: &NewDeviceNotification,
    ) -> Result<(), NotificationError> {
        let payload = serde_json::json!({
            "channel": config.channel,
            "username": config.username.as_deref().unwrap_or(&self.sender.sender_name),
            "icon_emoji": ":closed_lock_with_key:",
            "attachments": [{
                "color": "warning",
                "title": ":new: New device login",
                "fields": [
                    { "title": "User", "value": format!("{} ({})", notification.user_id, notification.user_kind), "short": true },
                    { "title": "IP", "value": notification.ip_address.as_deref().unwrap_or("N/A"), "short": true },
                    { "title": "Location", "value": notification.location.as_deref().unwrap_or("N/A"), "short": true },
                    { "title": "Agent", "value": notification.user_agent.as_deref().unwrap_or("N/A"), "short": false },
                ],
                "text": notification.summary(),
                "ts": notification.login_at.timestamp(),
            }]
        });

        let response = self
            .client
            .post(&config.webhook_url)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(NotificationError::Status {
                channel: "Slack".to_string(),
                status: response.status().as_u16(),
            });
        }

        Ok(())
    }

    /// Send a notification to a generic webhook
    async fn send_generic_webhook(
        &self,
        config: &WebhookConfig,
        notification: &NewDeviceNotification,
    ) -> Result<(), NotificationError> {
        let method = config.method.as_deref().unwrap_or("POST");

        let mut request = match method.to_uppercase().as_str() {
            "PUT" => self.client.put(&config.url),
            _ => self.client.post(&config.url),
        };

        if let Some(ref headers) = config.headers {
            for (key, value) in headers {
                request = request.header(key, value);
            }
        }

        let response = request.json(notification).send().await?;

        if !response.status().is_success() {
            return Err(NotificationError::Status {
                channel: format!("Webhook {}", config.name),
                status: response.status().as_u16(),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(
        &self,
        user_information: &UserInformation,
        user_reference: &UserReference,
    ) -> Result<(), NotificationError> {
        let notification = NewDeviceNotification::new(&self.sender, user_information, user_reference);
        let mut errors = Vec::new();

        if let Some(ref slack) = self.slack {
            if let Err(e) = self.send_slack(slack, &notification).await {
                log::error!("Slack notification failed: {}", e);
                errors.push(e);
            }
        }

        for webhook in &self.webhooks {
            if let Err(e) = self.send_generic_webhook(webhook, &notification).await {
                log::error!("Webhook {} failed: {}", webhook.name, e);
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

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::HashMap;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;

    /// Accept connections, forward each raw request, answer with `status_line`
    async fn capture(status_line: &'static str) -> (String, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::channel(8);

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let request = read_request(&mut socket).await;
                let _ = tx.send(request).await;
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                    status_line
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        (format!("http://{}", addr), rx)
    }

    async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
        let mut data = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = match socket.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(n) => n,
            };
            data.extend_from_slice(&buf[..n]);

            let text = String::from_utf8_lossy(&data).to_string();
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        if name.eq_ignore_ascii_case("content-length") {
                            value.trim().parse::<usize>().ok()
                        } else {
                            None
                        }
                    })
                    .unwrap_or(0);
                if data.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&data).to_string()
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
            None,
        );
        (info, reference)
    }

    #[tokio::test]
    async fn test_generic_webhook_receives_payload() {
        let (base, mut rx) = capture("200 OK").await;
        let mut headers = HashMap::new();
        headers.insert("X-Audit-Token".to_string(), "secret".to_string());

        let notifier = WebhookNotifier::new(
            None,
            vec![WebhookConfig {
                name: "audit".to_string(),
                url: format!("{}/hooks/login", base),
                method: Some("put".to_string()),
                headers: Some(headers),
            }],
            TransportsConfig::default(),
        );

        let (info, reference) = sample();
        notifier.send(&info, &reference).await.unwrap();

        let request = rx.recv().await.unwrap();
        assert!(request.starts_with("PUT /hooks/login"));
        assert!(request.to_lowercase().contains("x-audit-token: secret"));
        assert!(request.contains("\"user_id\":\"42\""));
        assert!(request.contains("\"recipient_email\":\"alice@acme.dev\""));
        assert!(request.contains("\"sender_email\":\"no-reply@example.com\""));
    }

    #[tokio::test]
    async fn test_slack_payload() {
        let (base, mut rx) = capture("200 OK").await;
        let notifier = WebhookNotifier::new(
            Some(SlackConfig {
                webhook_url: format!("{}/services/T000", base),
                channel: Some("#security".to_string()),
                username: None,
            }),
            Vec::new(),
            TransportsConfig::default(),
        );

        let (info, reference) = sample();
        notifier.send(&info, &reference).await.unwrap();

        let request = rx.recv().await.unwrap();
        assert!(request.starts_with("POST /services/T000"));
        assert!(request.contains("#security"));
        assert!(request.contains("\"username\":\"Security\""));
        assert!(request.contains("203.0.113.5"));
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let (base, _rx) = capture("500 Internal Server Error").await;
        let notifier = WebhookNotifier::new(
            None,
            vec![WebhookConfig {
                name: "audit".to_string(),
                url: base,
                method: None,
                headers: None,
            }],
            TransportsConfig::default(),
        );

        let (info, reference) = sample();
        let result = notifier.send(&info, &reference).await;
        assert!(matches!(
            result,
            Err(NotificationError::Status { status: 500, .. })
        ));
    }
}

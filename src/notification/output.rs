use async_trait::async_trait;
use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Mutex;

use super::{NewDeviceNotification, NotificationError, Notifier};
use crate::config::TransportsConfig;
use crate::models::{UserInformation, UserReference};

/// Writes notifications to a file or stdout
pub struct OutputNotifier {
    format: OutputFormat,
    sender: TransportsConfig,
    writer: Mutex<Option<Box<dyn Write + Send>>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Jsonl,
    Console,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "jsonl" => OutputFormat::Jsonl,
            "console" => OutputFormat::Console,
            _ => OutputFormat::Console, // Default
        }
    }
}

impl OutputNotifier {
    /// Create a notifier; output goes to stdout when `file_path` is `None`
    pub fn new(
        format: OutputFormat,
        file_path: Option<PathBuf>,
        sender: TransportsConfig,
    ) -> Result<Self, NotificationError> {
        let writer: Option<Box<dyn Write + Send>> = match file_path {
            Some(path) => {
                let file = OpenOptions::new().create(true).append(true).open(path)?;
                Some(Box::new(BufWriter::new(file)))
            }
            None => None,
        };

        Ok(Self::with_writer(format, writer, sender))
    }

    /// Create a notifier over an arbitrary writer
    pub fn with_writer(
        format: OutputFormat,
        writer: Option<Box<dyn Write + Send>>,
        sender: TransportsConfig,
    ) -> Self {
        OutputNotifier {
            format,
            sender,
            writer: Mutex::new(writer),
        }
    }

    fn render(&self, notification: &NewDeviceNotification) -> Result<String, NotificationError> {
        let rendered = match self.format {
            OutputFormat::Json => format!("{}\n", serde_json::to_string_pretty(notification)?),
            OutputFormat::Jsonl => format!("{}\n", serde_json::to_string(notification)?),
            OutputFormat::Console => format!(
                "[{} <{}>] to {} <{}>: {} - Agent: {}\n",
                notification.sender_name,
                notification.sender_email,
                notification.recipient_name.as_deref().unwrap_or("-"),
                notification.recipient_email.as_deref().unwrap_or("-"),
                notification.summary(),
                notification.user_agent.as_deref().unwrap_or("unknown")
            ),
        };
        Ok(rendered)
    }

    fn write_output(&self, data: &str) -> Result<(), NotificationError> {
        let mut guard = match self.writer.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        match guard.as_mut() {
            Some(writer) => {
                writer.write_all(data.as_bytes())?;
                writer.flush()?;
            }
            None => {
                let mut stdout = io::stdout().lock();
                stdout.write_all(data.as_bytes())?;
                stdout.flush()?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for OutputNotifier {
    async fn send(
        &self,
        user_information: &UserInformation,
        user_reference: &UserReference,
    ) -> Result<(), NotificationError> {
        let notification = NewDeviceNotification::new(&self.sender, user_information, user_reference);
        let rendered = self.render(&notification)?;
        self.write_output(&rendered)
    }
}

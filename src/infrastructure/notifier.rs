//! Notification sinks for task-start and break-transition alerts

use crate::infrastructure::error::InfraError;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationPermission {
    Granted,
    Denied,
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoundKind {
    Break,
    Task,
}

pub trait NotificationSink: Send + Sync {
    fn permission(&self) -> NotificationPermission;
    fn request_permission(&self) -> NotificationPermission;
    fn notify(&self, title: &str, body: &str) -> Result<(), InfraError>;
    fn play_sound(&self, kind: SoundKind) -> Result<(), InfraError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotificationBackend {
    None,
    Log,
    #[default]
    System,
}

impl NotificationBackend {
    pub fn from_settings_value(s: &str) -> Option<Self> {
        Self::from_str(s).ok()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Log => "log",
            Self::System => "system",
        }
    }

    pub fn build_sink(&self, display_duration_ms: u64) -> Arc<dyn NotificationSink> {
        match self {
            Self::None => Arc::new(NullNotificationSink),
            Self::Log => Arc::new(LogNotificationSink),
            Self::System => Arc::new(SystemNotificationSink::new(display_duration_ms)),
        }
    }
}

impl FromStr for NotificationBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "log" => Ok(Self::Log),
            "system" => Ok(Self::System),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SystemNotificationSink {
    display_duration_ms: u64,
}

impl SystemNotificationSink {
    pub fn new(display_duration_ms: u64) -> Self {
        Self {
            display_duration_ms,
        }
    }
}

impl NotificationSink for SystemNotificationSink {
    fn permission(&self) -> NotificationPermission {
        if cfg!(any(target_os = "linux", target_os = "macos")) {
            NotificationPermission::Granted
        } else {
            NotificationPermission::Denied
        }
    }

    fn request_permission(&self) -> NotificationPermission {
        self.permission()
    }

    fn notify(&self, title: &str, body: &str) -> Result<(), InfraError> {
        #[cfg(any(target_os = "linux", target_os = "macos"))]
        {
            let timeout_ms = self.display_duration_ms.min(u32::MAX as u64) as u32;
            debug!(title, body, timeout_ms, "sending system notification");

            let notification_result = notify_rust::Notification::new()
                .summary(title)
                .body(body)
                .icon("dialog-information")
                .timeout(notify_rust::Timeout::Milliseconds(timeout_ms))
                .show();

            if let Err(err) = notification_result {
                warn!(error = %err, "failed to send system notification");
            }
        }

        #[cfg(not(any(target_os = "linux", target_os = "macos")))]
        {
            debug!(title, body, "system notifications not supported on this OS");
        }

        Ok(())
    }

    fn play_sound(&self, kind: SoundKind) -> Result<(), InfraError> {
        // terminal bell; break chime rings twice
        let bell: &[u8] = match kind {
            SoundKind::Break => b"\x07\x07",
            SoundKind::Task => b"\x07",
        };
        let mut stderr = std::io::stderr();
        stderr.write_all(bell)?;
        stderr.flush()?;
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotificationSink;

impl NotificationSink for LogNotificationSink {
    fn permission(&self) -> NotificationPermission {
        NotificationPermission::Granted
    }

    fn request_permission(&self) -> NotificationPermission {
        NotificationPermission::Granted
    }

    fn notify(&self, title: &str, body: &str) -> Result<(), InfraError> {
        info!(title, body, "notification");
        Ok(())
    }

    fn play_sound(&self, kind: SoundKind) -> Result<(), InfraError> {
        debug!(?kind, "notification sound");
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotificationSink;

impl NotificationSink for NullNotificationSink {
    fn permission(&self) -> NotificationPermission {
        NotificationPermission::Denied
    }

    fn request_permission(&self) -> NotificationPermission {
        NotificationPermission::Denied
    }

    fn notify(&self, _title: &str, _body: &str) -> Result<(), InfraError> {
        Ok(())
    }

    fn play_sound(&self, _kind: SoundKind) -> Result<(), InfraError> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    PermissionRequested,
    Notified { title: String, body: String },
    Sound(SoundKind),
}

#[derive(Debug)]
pub struct InMemoryNotificationSink {
    permission: Mutex<NotificationPermission>,
    grant_on_request: bool,
    events: Mutex<Vec<SinkEvent>>,
}

impl InMemoryNotificationSink {
    pub fn new(permission: NotificationPermission, grant_on_request: bool) -> Self {
        Self {
            permission: Mutex::new(permission),
            grant_on_request,
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn granted() -> Self {
        Self::new(NotificationPermission::Granted, true)
    }

    pub fn events(&self) -> Vec<SinkEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn notifications(&self) -> Vec<(String, String)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SinkEvent::Notified { title, body } => Some((title, body)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: SinkEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl NotificationSink for InMemoryNotificationSink {
    fn permission(&self) -> NotificationPermission {
        self.permission
            .lock()
            .map(|permission| *permission)
            .unwrap_or(NotificationPermission::Denied)
    }

    fn request_permission(&self) -> NotificationPermission {
        self.record(SinkEvent::PermissionRequested);
        let answer = if self.grant_on_request {
            NotificationPermission::Granted
        } else {
            NotificationPermission::Denied
        };
        if let Ok(mut permission) = self.permission.lock() {
            *permission = answer;
        }
        answer
    }

    fn notify(&self, title: &str, body: &str) -> Result<(), InfraError> {
        self.record(SinkEvent::Notified {
            title: title.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }

    fn play_sound(&self, kind: SoundKind) -> Result<(), InfraError> {
        self.record(SinkEvent::Sound(kind));
        Ok(())
    }
}

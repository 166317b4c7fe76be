use crate::domain::clock::Clock;
use crate::domain::time::{format_day_key, minutes_of_day};
use crate::domain::timer::WORK_MINUTES;
use crate::infrastructure::config::{AppConfig, DEFAULT_APP_NAME, DEFAULT_BREAK_ALERT_DEBOUNCE_MS};
use crate::infrastructure::error::InfraError;
use crate::infrastructure::kv_store::KeyValueStore;
use crate::infrastructure::notifier::{NotificationPermission, NotificationSink, SoundKind};
use crate::infrastructure::task_store::TaskStore;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const LAST_NOTIFICATION_DAY_KEY: &str = "lastNotificationDay";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertSettings {
    pub app_name: String,
    pub sound: bool,
    pub break_alert_debounce_ms: u64,
    pub work_minutes: u32,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.to_string(),
            sound: true,
            break_alert_debounce_ms: DEFAULT_BREAK_ALERT_DEBOUNCE_MS,
            work_minutes: WORK_MINUTES,
        }
    }
}

impl AlertSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            app_name: config.app_name.clone(),
            sound: config.notifications.sound,
            break_alert_debounce_ms: config.notifications.break_alert_debounce_ms,
            work_minutes: config.timer.work_minutes,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationLedger {
    notified_task_ids: HashSet<String>,
    last_break_alert_at_ms: Option<i64>,
    last_day_key: Option<String>,
}

impl NotificationLedger {
    pub fn load(kv: &dyn KeyValueStore) -> Self {
        let last_day_key = kv.get(LAST_NOTIFICATION_DAY_KEY).unwrap_or_else(|error| {
            warn!(error = %error, "failed to load last notification day");
            None
        });
        Self {
            last_day_key,
            ..Self::default()
        }
    }

    pub fn save(&self, kv: &dyn KeyValueStore) -> Result<(), InfraError> {
        match self.last_day_key.as_deref() {
            Some(day_key) => kv.set(LAST_NOTIFICATION_DAY_KEY, day_key),
            None => Ok(()),
        }
    }

    pub fn is_notified(&self, task_id: &str) -> bool {
        self.notified_task_ids.contains(task_id)
    }

    pub fn notified_count(&self) -> usize {
        self.notified_task_ids.len()
    }

    pub fn last_day_key(&self) -> Option<&str> {
        self.last_day_key.as_deref()
    }

    fn mark_notified(&mut self, task_id: &str) {
        self.notified_task_ids.insert(task_id.to_string());
    }

    fn roll_over(&mut self, day_key: &str) {
        self.notified_task_ids.clear();
        self.last_day_key = Some(day_key.to_string());
    }
}

pub struct NotificationScheduler {
    settings: AlertSettings,
    sink: Arc<dyn NotificationSink>,
    kv: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    ledger: NotificationLedger,
}

impl NotificationScheduler {
    pub fn new(
        settings: AlertSettings,
        sink: Arc<dyn NotificationSink>,
        kv: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let ledger = NotificationLedger::load(kv.as_ref());
        Self {
            settings,
            sink,
            kv,
            clock,
            ledger,
        }
    }

    pub fn ledger(&self) -> &NotificationLedger {
        &self.ledger
    }

    /// Clears the dedup set when the persisted day differs from today.
    pub fn check_day_change(&mut self) -> bool {
        let today_key = format_day_key(self.clock.now().date());
        let stored = match self.kv.get(LAST_NOTIFICATION_DAY_KEY) {
            Ok(stored) => stored,
            Err(error) => {
                warn!(error = %error, "failed to read last notification day");
                self.ledger.last_day_key.clone()
            }
        };
        if stored.as_deref() == Some(today_key.as_str()) {
            return false;
        }

        self.ledger.roll_over(&today_key);
        if let Err(error) = self.ledger.save(self.kv.as_ref()) {
            warn!(error = %error, "failed to persist last notification day");
        }
        info!(day_key = %today_key, "notification day rolled over");
        true
    }

    pub fn check_upcoming_tasks(&mut self, store: &dyn TaskStore) -> Vec<String> {
        let now = self.clock.now();
        let today_key = format_day_key(now.date());
        let mut tasks = match store.get_tasks_for_date(&today_key) {
            Ok(tasks) => tasks,
            Err(error) => {
                warn!(
                    error = %error,
                    day_key = %today_key,
                    "failed to load tasks for notifications"
                );
                return Vec::new();
            }
        };
        tasks.retain(|task| !task.completed);
        tasks.sort_by_key(|task| task.start_minutes());

        let current_minutes = minutes_of_day(now.time());
        let mut fired = Vec::new();
        for task in &tasks {
            if self.ledger.is_notified(&task.id) || task.start_minutes() != current_minutes {
                continue;
            }
            self.play(SoundKind::Task);
            self.ledger.mark_notified(&task.id);
            self.deliver(&format!("⏰ Task starting now: {}", task.title));
            info!(task_id = %task.id, day_key = %today_key, "task start alert fired");
            fired.push(task.id.clone());
        }
        fired
    }

    pub fn show_break_transition_alert(&mut self, entered_break: bool) -> bool {
        let now_ms = self.clock.now_millis();
        if let Some(last) = self.ledger.last_break_alert_at_ms {
            let debounce_ms =
                i64::try_from(self.settings.break_alert_debounce_ms).unwrap_or(i64::MAX);
            if now_ms - last < debounce_ms {
                debug!("break transition alert suppressed by debounce");
                return false;
            }
        }
        self.ledger.last_break_alert_at_ms = Some(now_ms);

        let message = if entered_break {
            format!(
                "Time for a break! You've completed {} minutes of focused work.",
                self.settings.work_minutes
            )
        } else {
            "Break time is over! Ready to get back to work?".to_string()
        };
        self.play(SoundKind::Break);
        self.deliver(&message);
        info!(entered_break, "break transition alert fired");
        true
    }

    fn play(&self, kind: SoundKind) {
        if !self.settings.sound {
            return;
        }
        if let Err(error) = self.sink.play_sound(kind) {
            warn!(error = %error, ?kind, "failed to play notification sound");
        }
    }

    fn deliver(&self, body: &str) {
        let permission = match self.sink.permission() {
            NotificationPermission::Default => self.sink.request_permission(),
            answered => answered,
        };
        if permission != NotificationPermission::Granted {
            debug!(?permission, "notification permission not granted");
            return;
        }
        if let Err(error) = self.sink.notify(&self.settings.app_name, body) {
            warn!(error = %error, "failed to deliver notification");
        }
    }
}

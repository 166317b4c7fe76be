use crate::domain::timer::TimerSettings;
use crate::infrastructure::error::InfraError;
use crate::infrastructure::notifier::NotificationBackend;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const APP_JSON: &str = "app.json";
const SUPPORTED_SCHEMA: u64 = 1;
pub const DEFAULT_APP_NAME: &str = "Schedule Manager";
pub const DEFAULT_BREAK_ALERT_DEBOUNCE_MS: u64 = 2000;
const DEFAULT_DISPLAY_DURATION_MS: u64 = 5000;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationConfig {
    pub backend: String,
    pub sound: bool,
    pub break_alert_debounce_ms: u64,
    pub display_duration_ms: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            backend: NotificationBackend::System.as_str().to_string(),
            sound: true,
            break_alert_debounce_ms: DEFAULT_BREAK_ALERT_DEBOUNCE_MS,
            display_duration_ms: DEFAULT_DISPLAY_DURATION_MS,
        }
    }
}

impl NotificationConfig {
    pub fn backend(&self) -> Result<NotificationBackend, InfraError> {
        NotificationBackend::from_settings_value(&self.backend).ok_or_else(|| {
            InfraError::InvalidConfig(format!(
                "unknown notifications.backend '{}'",
                self.backend
            ))
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    pub schema: u8,
    #[serde(default = "default_app_name")]
    pub app_name: String,
    #[serde(default)]
    pub timer: TimerSettings,
    #[serde(default)]
    pub notifications: NotificationConfig,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            schema: SUPPORTED_SCHEMA as u8,
            app_name: default_app_name(),
            timer: TimerSettings::default(),
            notifications: NotificationConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), InfraError> {
        self.timer.validate().map_err(InfraError::InvalidConfig)?;
        self.notifications.backend()?;
        if self.app_name.trim().is_empty() {
            return Err(InfraError::InvalidConfig(
                "appName must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_app_name() -> String {
    DEFAULT_APP_NAME.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

pub fn ensure_default_configs(config_dir: &Path) -> Result<(), InfraError> {
    let path = config_dir.join(APP_JSON);
    if !path.exists() {
        let formatted = serde_json::to_string_pretty(&AppConfig::default())?;
        fs::write(path, format!("{formatted}\n"))?;
    }
    Ok(())
}

fn read_config(path: &Path) -> Result<serde_json::Value, InfraError> {
    let raw = fs::read_to_string(path)?;
    let parsed: serde_json::Value = serde_json::from_str(&raw)?;
    let schema = parsed
        .get("schema")
        .and_then(serde_json::Value::as_u64)
        .ok_or_else(|| InfraError::InvalidConfig(format!("missing schema in {}", path.display())))?;
    if schema != SUPPORTED_SCHEMA {
        return Err(InfraError::InvalidConfig(format!(
            "unsupported schema {} in {}",
            schema,
            path.display()
        )));
    }
    Ok(parsed)
}

pub fn load_app_config(config_dir: &Path) -> Result<AppConfig, InfraError> {
    let value = read_config(&config_dir.join(APP_JSON))?;
    let config: AppConfig = serde_json::from_value(value)?;
    config.validate()?;
    Ok(config)
}

pub fn save_app_config(config_dir: &Path, config: &AppConfig) -> Result<(), InfraError> {
    config.validate()?;
    let formatted = serde_json::to_string_pretty(config)?;
    fs::write(config_dir.join(APP_JSON), format!("{formatted}\n"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TempWorkspace;

    #[test]
    fn default_config_is_written_once_and_loads() {
        let workspace = TempWorkspace::new("config");
        ensure_default_configs(workspace.path()).expect("write defaults");
        let config = load_app_config(workspace.path()).expect("load defaults");
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.timer.work_minutes, 40);
        assert_eq!(config.timer.break_minutes, 10);
        assert_eq!(config.notifications.break_alert_debounce_ms, 2000);

        let mut edited = config.clone();
        edited.timer.work_minutes = 25;
        save_app_config(workspace.path(), &edited).expect("save");
        ensure_default_configs(workspace.path()).expect("defaults do not overwrite");
        assert_eq!(
            load_app_config(workspace.path()).expect("reload").timer.work_minutes,
            25
        );
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let workspace = TempWorkspace::new("config-partial");
        fs::write(workspace.path().join(APP_JSON), r#"{ "schema": 1 }"#).expect("write");
        let config = load_app_config(workspace.path()).expect("load");
        assert_eq!(config.app_name, DEFAULT_APP_NAME);
        assert_eq!(config.log_level, "info");
        assert!(config.notifications.sound);
    }

    #[test]
    fn unsupported_schema_is_rejected() {
        let workspace = TempWorkspace::new("config-schema");
        fs::write(workspace.path().join(APP_JSON), r#"{ "schema": 2 }"#).expect("write");
        match load_app_config(workspace.path()) {
            Err(InfraError::InvalidConfig(message)) => {
                assert!(message.contains("unsupported schema"))
            }
            other => panic!("expected invalid config error, got {other:?}"),
        }
    }

    #[test]
    fn zero_work_minutes_and_unknown_backend_are_rejected() {
        let workspace = TempWorkspace::new("config-invalid");
        fs::write(
            workspace.path().join(APP_JSON),
            r#"{ "schema": 1, "timer": { "workMinutes": 0, "breakMinutes": 10 } }"#,
        )
        .expect("write");
        assert!(load_app_config(workspace.path()).is_err());

        fs::write(
            workspace.path().join(APP_JSON),
            r#"{ "schema": 1, "notifications": { "backend": "pager", "sound": true, "breakAlertDebounceMs": 2000, "displayDurationMs": 5000 } }"#,
        )
        .expect("write");
        assert!(load_app_config(workspace.path()).is_err());
    }
}

use crate::infrastructure::error::InfraError;
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_LEVEL_ENV: &str = "SCHEDULE_CORE_LOG_LEVEL";
const LOG_FILE_PREFIX: &str = "schedule-";

/// Installs the global file subscriber. Keep the guard alive to flush on exit.
pub fn init_logging(
    logs_dir: &Path,
    configured_level: &str,
) -> Result<(PathBuf, WorkerGuard), InfraError> {
    fs::create_dir_all(logs_dir)?;
    let log_file_path = log_file_path(logs_dir);
    let file = fs::File::create(&log_file_path)?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    let level = resolve_log_level(std::env::var(LOG_LEVEL_ENV).ok().as_deref(), configured_level);
    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(EnvFilter::new(format!("warn,schedule_core={level}")))
        .with(file_layer)
        .try_init()
        .map_err(|error| InfraError::Logging(error.to_string()))?;

    tracing::info!(path = %log_file_path.display(), "logging initialized");
    Ok((log_file_path, guard))
}

/// Env override first, then the configured level, then `info`.
pub fn resolve_log_level(env_value: Option<&str>, configured: &str) -> &'static str {
    env_value
        .and_then(normalize_log_level)
        .or_else(|| normalize_log_level(configured))
        .unwrap_or("info")
}

fn normalize_log_level(raw: &str) -> Option<&'static str> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "trace" => Some("trace"),
        "debug" => Some("debug"),
        "info" => Some("info"),
        "warn" | "warning" => Some("warn"),
        "error" => Some("error"),
        _ => None,
    }
}

pub fn log_file_path(logs_dir: &Path) -> PathBuf {
    let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S").to_string();
    logs_dir.join(format!("{LOG_FILE_PREFIX}{timestamp}.log"))
}

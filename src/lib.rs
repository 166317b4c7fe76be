pub mod application;
pub mod domain;
pub mod infrastructure;

#[cfg(test)]
mod test_support;

use application::bootstrap::bootstrap_workspace;
use application::notification_scheduler::AlertSettings;
use application::session::{PlannerSession, SessionDeps};
use application::ticker::{spawn_session_ticker, TICK_PERIOD};
use domain::clock::SystemClock;
use domain::timer::WorkTotal;
use infrastructure::error::InfraError;
use infrastructure::kv_store::SqliteKeyValueStore;
use infrastructure::logging::init_logging;
use infrastructure::task_store::SqliteTaskStore;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// Runs the scheduling engine against `workspace_root` until Ctrl-C.
pub async fn run(workspace_root: &Path) -> Result<(), InfraError> {
    let workspace = bootstrap_workspace(workspace_root)?;
    let _log_guard = match init_logging(&workspace.logs_dir, &workspace.config.log_level) {
        Ok((path, guard)) => {
            eprintln!("logging to {}", path.display());
            Some(guard)
        }
        Err(error) => {
            eprintln!("warning: failed to initialize logging: {error}");
            None
        }
    };

    let config = workspace.config;
    let sink = config
        .notifications
        .backend()?
        .build_sink(config.notifications.display_duration_ms);
    let work_total = WorkTotal::new();
    let session = PlannerSession::new(
        config.timer,
        AlertSettings::from_config(&config),
        SessionDeps {
            clock: Arc::new(SystemClock),
            store: Arc::new(SqliteTaskStore::new(&workspace.database_path)),
            kv: Arc::new(SqliteKeyValueStore::new(&workspace.database_path)),
            sink,
            work_total: work_total.clone(),
        },
    );
    let session = Arc::new(Mutex::new(session));
    let stop = Arc::new(AtomicBool::new(false));
    let ticker = spawn_session_ticker(session.clone(), stop.clone(), TICK_PERIOD);
    info!(
        workspace_root = %workspace.workspace_root.display(),
        database_path = %workspace.database_path.display(),
        backend = %config.notifications.backend,
        "schedule engine running"
    );

    let signal = tokio::signal::ctrl_c().await;
    stop.store(true, Ordering::SeqCst);
    if let Err(error) = ticker.await {
        warn!(error = %error, "session ticker ended abnormally");
    }
    signal?;

    info!(total_work_seconds = work_total.seconds(), "schedule engine stopped");
    Ok(())
}

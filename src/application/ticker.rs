use crate::application::session::PlannerSession;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Drives `PlannerSession::tick` on a fixed period until `stop` is set.
pub fn spawn_session_ticker(
    session: Arc<Mutex<PlannerSession>>,
    stop: Arc<AtomicBool>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        debug!(period_ms = period.as_millis() as u64, "session ticker started");

        loop {
            interval.tick().await;
            if stop.load(Ordering::SeqCst) {
                break;
            }
            let Ok(mut guard) = session.lock() else {
                warn!("planner session lock poisoned; stopping ticker");
                break;
            };
            // the flag may have flipped while waiting on the lock
            if stop.load(Ordering::SeqCst) {
                break;
            }
            let report = guard.tick();
            drop(guard);

            if let Some(transition) = report.transition {
                info!(
                    from = %transition.from,
                    to = %transition.to,
                    work_session_count = transition.work_session_count,
                    "phase transition"
                );
            }
            if !report.fired_task_ids.is_empty() {
                debug!(count = report.fired_task_ids.len(), "task start alerts fired");
            }
        }

        debug!("session ticker stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::notification_scheduler::AlertSettings;
    use crate::application::session::SessionDeps;
    use crate::domain::clock::ManualClock;
    use crate::domain::models::TimerPhase;
    use crate::domain::timer::{TimerSettings, WorkTotal};
    use crate::infrastructure::kv_store::InMemoryKeyValueStore;
    use crate::infrastructure::notifier::InMemoryNotificationSink;
    use crate::infrastructure::task_store::InMemoryTaskStore;
    use chrono::NaiveDate;

    fn sample_session(clock: Arc<ManualClock>) -> Arc<Mutex<PlannerSession>> {
        let session = PlannerSession::new(
            TimerSettings::default(),
            AlertSettings::default(),
            SessionDeps {
                clock,
                store: Arc::new(InMemoryTaskStore::default()),
                kv: Arc::new(InMemoryKeyValueStore::default()),
                sink: Arc::new(InMemoryNotificationSink::granted()),
                work_total: WorkTotal::new(),
            },
        );
        Arc::new(Mutex::new(session))
    }

    fn sample_clock() -> Arc<ManualClock> {
        let start = NaiveDate::from_ymd_opt(2026, 2, 16)
            .expect("valid date")
            .and_hms_opt(9, 0, 0)
            .expect("valid time");
        Arc::new(ManualClock::new(start))
    }

    #[tokio::test]
    async fn ticker_finalizes_expired_phase() {
        let clock = sample_clock();
        let session = sample_session(clock.clone());
        session.lock().expect("lock").start_timer();
        clock.advance_seconds(40 * 60);

        let stop = Arc::new(AtomicBool::new(false));
        let handle = spawn_session_ticker(session.clone(), stop.clone(), Duration::from_millis(5));
        tokio::time::sleep(Duration::from_millis(50)).await;
        stop.store(true, Ordering::SeqCst);
        handle.await.expect("ticker joins");

        let session = session.lock().expect("lock");
        assert_eq!(session.timer().phase(), TimerPhase::Break);
        assert_eq!(session.timer().work_session_count(), 1);
    }

    #[tokio::test]
    async fn stopped_ticker_never_mutates_session() {
        let clock = sample_clock();
        let session = sample_session(clock.clone());
        session.lock().expect("lock").start_timer();
        clock.advance_seconds(40 * 60);

        let stop = Arc::new(AtomicBool::new(true));
        let handle = spawn_session_ticker(session.clone(), stop, Duration::from_millis(5));
        handle.await.expect("ticker joins");

        let session = session.lock().expect("lock");
        assert_eq!(session.timer().phase(), TimerPhase::Work);
        assert!(session.timer().is_running());
    }
}

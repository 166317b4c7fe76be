use crate::application::drag_drop::{DragDropEngine, DragTarget, ReorderOutcome};
use crate::application::notification_scheduler::{AlertSettings, NotificationScheduler};
use crate::domain::calendar::CalendarState;
use crate::domain::clock::Clock;
use crate::domain::models::Task;
use crate::domain::time::{format_day_key, minutes_of_day};
use crate::domain::timer::{FocusTimer, PhaseTransition, TimerSettings, WorkTotal};
use crate::infrastructure::kv_store::KeyValueStore;
use crate::infrastructure::notifier::NotificationSink;
use crate::infrastructure::task_store::TaskStore;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::warn;

pub struct SessionDeps {
    pub clock: Arc<dyn Clock>,
    pub store: Arc<dyn TaskStore>,
    pub kv: Arc<dyn KeyValueStore>,
    pub sink: Arc<dyn NotificationSink>,
    pub work_total: WorkTotal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub transition: Option<PhaseTransition>,
    pub break_alert_fired: bool,
    pub fired_task_ids: Vec<String>,
}

pub struct PlannerSession {
    clock: Arc<dyn Clock>,
    store: Arc<dyn TaskStore>,
    calendar: CalendarState,
    timer: FocusTimer,
    drag_drop: DragDropEngine,
    scheduler: NotificationScheduler,
    last_scanned_minute: Option<(NaiveDate, u32)>,
}

impl PlannerSession {
    pub fn new(timer_settings: TimerSettings, alerts: AlertSettings, deps: SessionDeps) -> Self {
        let SessionDeps {
            clock,
            store,
            kv,
            sink,
            work_total,
        } = deps;
        let calendar = CalendarState::new(clock.now().date());
        let timer = FocusTimer::new(timer_settings, clock.clone(), work_total);
        let scheduler = NotificationScheduler::new(alerts, sink, kv, clock.clone());
        Self {
            clock,
            store,
            calendar,
            timer,
            drag_drop: DragDropEngine::new(),
            scheduler,
            last_scanned_minute: None,
        }
    }

    pub fn calendar(&self) -> &CalendarState {
        &self.calendar
    }

    pub fn calendar_mut(&mut self) -> &mut CalendarState {
        &mut self.calendar
    }

    pub fn timer(&self) -> &FocusTimer {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut FocusTimer {
        &mut self.timer
    }

    pub fn drag_drop(&self) -> &DragDropEngine {
        &self.drag_drop
    }

    pub fn scheduler(&self) -> &NotificationScheduler {
        &self.scheduler
    }

    pub fn tasks_for_active_day(&self) -> Vec<Task> {
        self.tasks_for_day(self.calendar.active_day())
    }

    pub fn tasks_for_column(&self, column: &str) -> Vec<Task> {
        self.tasks_for_active_day()
            .into_iter()
            .filter(|task| task.column == column)
            .collect()
    }

    /// The earliest pending task running at this minute, only while viewing today.
    pub fn active_task(&self) -> Option<Task> {
        let now = self.clock.now();
        if self.calendar.active_day() != now.date() {
            return None;
        }
        let current_minutes = minutes_of_day(now.time());
        self.tasks_for_day(now.date())
            .into_iter()
            .filter(|task| task.is_active_at(current_minutes))
            .min_by_key(Task::start_minutes)
    }

    pub fn start_timer(&mut self) -> bool {
        let active_task = self.active_task();
        self.timer.start(active_task.as_ref()).is_some()
    }

    pub fn pause_timer(&mut self) {
        self.timer.pause();
    }

    pub fn reset_timer(&mut self) {
        self.timer.reset();
    }

    pub fn switch_to_work(&mut self) {
        self.timer.switch_to_work();
    }

    pub fn switch_to_break(&mut self) {
        self.timer.switch_to_break();
    }

    pub fn tick(&mut self) -> TickReport {
        let now = self.clock.now();
        self.calendar.set_today(now.date());

        let transition = self
            .timer
            .active_token()
            .and_then(|token| self.timer.tick(token));
        let break_alert_fired = transition
            .as_ref()
            .is_some_and(|transition| {
                self.scheduler
                    .show_break_transition_alert(transition.entered_break())
            });

        let minute = (now.date(), minutes_of_day(now.time()));
        let mut fired_task_ids = Vec::new();
        if self.last_scanned_minute != Some(minute) {
            self.last_scanned_minute = Some(minute);
            self.scheduler.check_day_change();
            fired_task_ids = self.scheduler.check_upcoming_tasks(self.store.as_ref());
        }

        TickReport {
            transition,
            break_alert_fired,
            fired_task_ids,
        }
    }

    pub fn begin_drag(&mut self, task_id: &str) -> bool {
        self.drag_drop.begin_drag(&self.calendar, task_id)
    }

    pub fn drag_over(&mut self, target: DragTarget<'_>) {
        self.drag_drop.drag_over(&self.calendar, target);
    }

    pub fn drag_leave(&mut self) {
        self.drag_drop.drag_leave();
    }

    pub fn column_drag_leave(&mut self) {
        self.drag_drop.column_drag_leave();
    }

    pub fn end_drag(&mut self) {
        self.drag_drop.end_drag();
    }

    pub fn drop(
        &mut self,
        target_task_id: Option<&str>,
        target_column: Option<&str>,
    ) -> Option<ReorderOutcome> {
        self.drag_drop.drop(
            &self.calendar,
            self.store.as_ref(),
            target_task_id,
            target_column,
        )
    }

    fn tasks_for_day(&self, day: NaiveDate) -> Vec<Task> {
        let day_key = format_day_key(day);
        match self.store.get_tasks_for_date(&day_key) {
            Ok(tasks) => tasks,
            Err(error) => {
                warn!(error = %error, day_key = %day_key, "failed to load tasks");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::clock::ManualClock;
    use crate::domain::models::TimerPhase;
    use crate::infrastructure::kv_store::InMemoryKeyValueStore;
    use crate::infrastructure::notifier::InMemoryNotificationSink;
    use crate::infrastructure::task_store::InMemoryTaskStore;
    use chrono::NaiveDateTime;

    const DAY: &str = "2026-02-16";

    fn at(hour: u32, minute: u32, second: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 2, 16)
            .expect("valid date")
            .and_hms_opt(hour, minute, second)
            .expect("valid time")
    }

    fn sample_task(id: &str, time: &str, end_time: Option<&str>, column: &str) -> Task {
        Task {
            id: id.to_string(),
            time: time.to_string(),
            end_time: end_time.map(str::to_string),
            title: format!("Task {id}"),
            completed: false,
            order: 0,
            column: column.to_string(),
        }
    }

    struct Fixture {
        clock: Arc<ManualClock>,
        store: Arc<InMemoryTaskStore>,
        sink: Arc<InMemoryNotificationSink>,
        session: PlannerSession,
    }

    fn fixture(start: NaiveDateTime) -> Fixture {
        let clock = Arc::new(ManualClock::new(start));
        let store = Arc::new(InMemoryTaskStore::default());
        let sink = Arc::new(InMemoryNotificationSink::granted());
        let session = PlannerSession::new(
            TimerSettings::default(),
            AlertSettings::default(),
            SessionDeps {
                clock: clock.clone(),
                store: store.clone(),
                kv: Arc::new(InMemoryKeyValueStore::default()),
                sink: sink.clone(),
                work_total: WorkTotal::new(),
            },
        );
        Fixture {
            clock,
            store,
            sink,
            session,
        }
    }

    #[test]
    fn start_timer_syncs_to_running_task() {
        let mut fx = fixture(at(9, 35, 0));
        fx.store
            .add_task(DAY, &sample_task("a", "09:00", Some("10:00"), "todo"))
            .expect("add");
        fx.store
            .add_task(DAY, &sample_task("b", "11:00", None, "todo"))
            .expect("add");

        assert_eq!(fx.session.active_task().map(|task| task.id), Some("a".to_string()));
        assert!(fx.session.start_timer());
        assert_eq!(fx.session.timer().display(), "25:00");
        assert!(!fx.session.start_timer());
    }

    #[test]
    fn viewing_another_day_skips_task_sync() {
        let mut fx = fixture(at(9, 35, 0));
        fx.store
            .add_task(DAY, &sample_task("a", "09:00", Some("10:00"), "todo"))
            .expect("add");
        fx.session
            .calendar_mut()
            .select_date(NaiveDate::from_ymd_opt(2026, 2, 17).expect("valid date"));

        assert!(fx.session.active_task().is_none());
        fx.session.start_timer();
        assert_eq!(fx.session.timer().display(), "40:00");
    }

    #[test]
    fn tick_completes_phase_and_alerts_once() {
        let mut fx = fixture(at(9, 0, 0));
        fx.session.start_timer();
        fx.clock.advance_seconds(40 * 60);

        let report = fx.session.tick();
        let transition = report.transition.expect("work phase completes");
        assert!(transition.entered_break());
        assert!(report.break_alert_fired);
        assert_eq!(fx.session.timer().phase(), TimerPhase::Break);
        assert_eq!(fx.session.timer().total_work_seconds(), 40 * 60);

        let report = fx.session.tick();
        assert!(report.transition.is_none());
        assert_eq!(fx.sink.notifications().len(), 1);
    }

    #[test]
    fn task_scan_runs_once_per_minute() {
        let mut fx = fixture(at(9, 30, 0));
        fx.store
            .add_task(DAY, &sample_task("a", "09:30", None, "todo"))
            .expect("add");

        assert_eq!(fx.session.tick().fired_task_ids, vec!["a"]);
        fx.clock.advance_seconds(1);
        assert!(fx.session.tick().fired_task_ids.is_empty());
        fx.clock.advance_seconds(59);
        assert!(fx.session.tick().fired_task_ids.is_empty());
        assert_eq!(fx.sink.notifications().len(), 1);
    }

    #[test]
    fn paused_timer_ignores_ticks() {
        let mut fx = fixture(at(9, 0, 0));
        fx.session.start_timer();
        fx.clock.advance_seconds(60);
        fx.session.tick();
        fx.session.pause_timer();
        let before = fx.session.timer().snapshot();
        fx.clock.advance_seconds(40 * 60);
        assert!(fx.session.tick().transition.is_none());
        assert_eq!(fx.session.timer().snapshot(), before);
    }

    #[test]
    fn column_filter_and_drag_passthrough() {
        let mut fx = fixture(at(8, 0, 0));
        fx.store
            .add_task(DAY, &sample_task("a", "09:00", None, "todo"))
            .expect("add");
        fx.store
            .add_task(DAY, &sample_task("b", "10:00", None, "doing"))
            .expect("add");

        assert_eq!(fx.session.tasks_for_column("todo").len(), 1);
        assert!(fx.session.begin_drag("a"));
        fx.session.drag_over(DragTarget::Column("doing"));
        let outcome = fx.session.drop(None, Some("doing")).expect("drop commits");
        assert_eq!(outcome.day_key, DAY);
        assert_eq!(fx.session.tasks_for_column("doing").len(), 2);
        assert!(fx.session.tasks_for_column("todo").is_empty());
    }
}

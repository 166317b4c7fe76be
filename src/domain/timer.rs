use crate::domain::clock::Clock;
use crate::domain::models::{Task, TimerPhase};
use crate::domain::time::minutes_of_day;
use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

pub const WORK_MINUTES: u32 = 40;
pub const BREAK_MINUTES: u32 = 10;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct TimerSettings {
    pub work_minutes: u32,
    pub break_minutes: u32,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            work_minutes: WORK_MINUTES,
            break_minutes: BREAK_MINUTES,
        }
    }
}

impl TimerSettings {
    pub fn validate(&self) -> Result<(), String> {
        if self.work_minutes == 0 {
            return Err("timer.work_minutes must be > 0".to_string());
        }
        if self.break_minutes == 0 {
            return Err("timer.break_minutes must be > 0".to_string());
        }
        Ok(())
    }

    pub fn phase_minutes(&self, phase: TimerPhase) -> u32 {
        match phase {
            TimerPhase::Work => self.work_minutes,
            TimerPhase::Break => self.break_minutes,
        }
    }
}

/// Session-wide committed work seconds, shared by every timer built from the same handle.
#[derive(Debug, Clone, Default)]
pub struct WorkTotal {
    seconds: Arc<AtomicU64>,
}

impl WorkTotal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seconds(&self) -> u64 {
        self.seconds.load(Ordering::SeqCst)
    }

    // Only called from `FocusTimer::finalize`.
    fn commit(&self, seconds: u64) {
        self.seconds.fetch_add(seconds, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickToken(u64);

#[derive(Debug, Clone, Copy)]
struct RunningCountdown {
    token: TickToken,
    started_at_ms: i64,
    target_ms: i64,
    phase_was_work: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PhaseTransition {
    pub from: TimerPhase,
    pub to: TimerPhase,
    pub work_seconds_committed: u64,
    pub work_session_count: u32,
}

impl PhaseTransition {
    pub fn entered_break(&self) -> bool {
        self.to == TimerPhase::Break
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TimerSnapshot {
    pub phase: TimerPhase,
    pub remaining_minutes: u32,
    pub remaining_seconds: u32,
    pub running: bool,
    pub session_work_seconds: u64,
    pub total_work_seconds: u64,
    pub work_session_count: u32,
    pub display: String,
}

type CompletionCallback = Box<dyn FnMut(&PhaseTransition) + Send>;

/// Work/break countdown driven by absolute deadlines.
///
/// Every tick recomputes the remaining time from `target - now`, so late or
/// skipped ticks never accumulate drift. Expiry commits elapsed work seconds to
/// the shared [`WorkTotal`] before the phase flips.
pub struct FocusTimer {
    settings: TimerSettings,
    clock: Arc<dyn Clock>,
    work_total: WorkTotal,
    phase: TimerPhase,
    remaining_minutes: u32,
    remaining_seconds: u32,
    session_work_seconds: u64,
    work_session_count: u32,
    running: Option<RunningCountdown>,
    generation: u64,
    on_complete: Option<CompletionCallback>,
}

impl fmt::Debug for FocusTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FocusTimer")
            .field("settings", &self.settings)
            .field("phase", &self.phase)
            .field("remaining_minutes", &self.remaining_minutes)
            .field("remaining_seconds", &self.remaining_seconds)
            .field("session_work_seconds", &self.session_work_seconds)
            .field("work_session_count", &self.work_session_count)
            .field("running", &self.running)
            .finish_non_exhaustive()
    }
}

impl FocusTimer {
    pub fn new(settings: TimerSettings, clock: Arc<dyn Clock>, work_total: WorkTotal) -> Self {
        Self {
            settings,
            clock,
            work_total,
            phase: TimerPhase::Work,
            remaining_minutes: settings.work_minutes,
            remaining_seconds: 0,
            session_work_seconds: 0,
            work_session_count: 0,
            running: None,
            generation: 0,
            on_complete: None,
        }
    }

    pub fn on_complete<F>(&mut self, callback: F)
    where
        F: FnMut(&PhaseTransition) + Send + 'static,
    {
        self.on_complete = Some(Box::new(callback));
    }

    pub fn settings(&self) -> TimerSettings {
        self.settings
    }

    pub fn phase(&self) -> TimerPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    pub fn remaining_minutes(&self) -> u32 {
        self.remaining_minutes
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    pub fn session_work_seconds(&self) -> u64 {
        self.session_work_seconds
    }

    pub fn work_session_count(&self) -> u32 {
        self.work_session_count
    }

    pub fn work_total(&self) -> &WorkTotal {
        &self.work_total
    }

    pub fn active_token(&self) -> Option<TickToken> {
        self.running.map(|running| running.token)
    }

    pub fn start(&mut self, active_task: Option<&Task>) -> Option<TickToken> {
        if self.running.is_some() {
            return None;
        }

        let now = self.clock.now();
        if self.phase == TimerPhase::Work {
            if let Some(task) = active_task {
                self.sync_to_task_end(task, now);
            }
        }

        self.generation += 1;
        let token = TickToken(self.generation);
        let started_at_ms = self.clock.now_millis();
        let countdown_ms =
            (i64::from(self.remaining_minutes) * 60 + i64::from(self.remaining_seconds)) * 1000;
        self.running = Some(RunningCountdown {
            token,
            started_at_ms,
            target_ms: started_at_ms + countdown_ms,
            phase_was_work: self.phase == TimerPhase::Work,
        });

        info!(
            phase = %self.phase,
            countdown = %self.display(),
            task_id = active_task.map(|task| task.id.as_str()).unwrap_or("-"),
            "timer started"
        );
        Some(token)
    }

    fn sync_to_task_end(&mut self, task: &Task, now: NaiveDateTime) {
        let now_minutes = i64::from(minutes_of_day(now.time()));
        let remaining = i64::from(task.effective_end_minutes()) - now_minutes;
        if remaining <= 0 {
            debug!(task_id = %task.id, "active task already ended; countdown unchanged");
            return;
        }

        let clamped = remaining.min(i64::from(self.settings.work_minutes)) as u32;
        let seconds = now.second();
        if seconds > 0 {
            self.remaining_minutes = clamped - 1;
            self.remaining_seconds = 60 - seconds;
        } else {
            self.remaining_minutes = clamped;
            self.remaining_seconds = 0;
        }
        debug!(task_id = %task.id, countdown = %self.display(), "countdown synced to task end");
    }

    pub fn tick(&mut self, token: TickToken) -> Option<PhaseTransition> {
        let running = self.running?;
        if running.token != token {
            return None;
        }

        let now_ms = self.clock.now_millis();
        if running.phase_was_work {
            self.session_work_seconds = elapsed_seconds(running.started_at_ms, now_ms);
        }

        let remaining_ms = running.target_ms - now_ms;
        if remaining_ms <= 0 {
            return Some(self.finalize(running));
        }

        let seconds_left = (remaining_ms + 999) / 1000;
        self.remaining_minutes = (seconds_left / 60) as u32;
        self.remaining_seconds = (seconds_left % 60) as u32;
        None
    }

    fn finalize(&mut self, running: RunningCountdown) -> PhaseTransition {
        let now_ms = self.clock.now_millis();
        let mut committed = 0;
        if running.phase_was_work {
            committed = elapsed_seconds(running.started_at_ms, now_ms);
            self.work_total.commit(committed);
            self.session_work_seconds = 0;
        }

        self.remaining_minutes = 0;
        self.remaining_seconds = 0;
        self.running = None;

        let from = self.phase;
        self.phase = from.next();
        if from == TimerPhase::Work {
            self.work_session_count += 1;
        }
        self.restore_full_duration();

        let transition = PhaseTransition {
            from,
            to: self.phase,
            work_seconds_committed: committed,
            work_session_count: self.work_session_count,
        };
        info!(
            from = %transition.from,
            to = %transition.to,
            committed_seconds = committed,
            total_work_seconds = self.work_total.seconds(),
            "timer phase completed"
        );

        if let Some(callback) = self.on_complete.as_mut() {
            callback(&transition);
        }
        transition
    }

    pub fn pause(&mut self) {
        if self.running.take().is_some() {
            info!(phase = %self.phase, countdown = %self.display(), "timer paused");
        }
    }

    pub fn reset(&mut self) {
        self.pause();
        self.restore_full_duration();
    }

    pub fn switch_to_work(&mut self) {
        self.switch_to(TimerPhase::Work);
    }

    pub fn switch_to_break(&mut self) {
        self.switch_to(TimerPhase::Break);
    }

    fn switch_to(&mut self, phase: TimerPhase) {
        self.pause();
        self.phase = phase;
        self.restore_full_duration();
        info!(phase = %phase, "timer phase switched manually");
    }

    fn restore_full_duration(&mut self) {
        self.remaining_minutes = self.settings.phase_minutes(self.phase);
        self.remaining_seconds = 0;
    }

    pub fn display(&self) -> String {
        format!("{:02}:{:02}", self.remaining_minutes, self.remaining_seconds)
    }

    pub fn total_work_seconds(&self) -> u64 {
        let live = if self.is_running() && self.phase == TimerPhase::Work {
            self.session_work_seconds
        } else {
            0
        };
        self.work_total.seconds() + live
    }

    pub fn total_work_display(&self) -> String {
        let total = self.total_work_seconds();
        let hours = total / 3600;
        let minutes = (total % 3600) / 60;
        let seconds = total % 60;
        if hours > 0 {
            format!("{hours}h {minutes:02}m")
        } else {
            format!("{minutes:02}m {seconds:02}s")
        }
    }

    pub fn total_work_minutes(&self) -> u64 {
        self.total_work_seconds() / 60
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            phase: self.phase,
            remaining_minutes: self.remaining_minutes,
            remaining_seconds: self.remaining_seconds,
            running: self.is_running(),
            session_work_seconds: self.session_work_seconds,
            total_work_seconds: self.total_work_seconds(),
            work_session_count: self.work_session_count,
            display: self.display(),
        }
    }
}

fn elapsed_seconds(started_at_ms: i64, now_ms: i64) -> u64 {
    ((now_ms - started_at_ms).max(0) / 1000) as u64
}

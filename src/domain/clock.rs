use chrono::{Duration, Local, NaiveDateTime, Utc};
use std::sync::Mutex;

/// `now` is local wall-clock time for day keys and minute-of-day math.
/// `now_millis` is an absolute timestamp that must not jump with DST shifts.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
    fn now_millis(&self) -> i64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<NaiveDateTime>,
}

impl ManualClock {
    pub fn new(start: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, value: NaiveDateTime) {
        if let Ok(mut now) = self.now.lock() {
            *now = value;
        }
    }

    pub fn advance_millis(&self, millis: i64) {
        if let Ok(mut now) = self.now.lock() {
            *now += Duration::milliseconds(millis);
        }
    }

    pub fn advance_seconds(&self, seconds: i64) {
        self.advance_millis(seconds * 1000);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        match self.now.lock() {
            Ok(now) => *now,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn now_millis(&self) -> i64 {
        epoch_millis(self.now())
    }
}

// Manual clocks have no zone, so their naive time is read as UTC.
fn epoch_millis(value: NaiveDateTime) -> i64 {
    value.and_utc().timestamp_millis()
}

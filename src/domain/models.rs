use crate::domain::time::{minutes_from_time, validate_hhmm};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_TASK_MINUTES: u32 = 60;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub order: i64,
    pub column: String,
}

impl Task {
    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.id, "task.id")?;
        validate_non_empty(&self.title, "task.title")?;
        validate_non_empty(&self.column, "task.column")?;
        validate_hhmm(&self.time, "task.time")?;
        if let Some(end_time) = self.end_time.as_deref() {
            validate_hhmm(end_time, "task.end_time")?;
        }
        Ok(())
    }

    pub fn start_minutes(&self) -> u32 {
        minutes_from_time(&self.time)
    }

    pub fn effective_end_minutes(&self) -> u32 {
        match self.end_time.as_deref() {
            Some(end_time) => minutes_from_time(end_time),
            None => self.start_minutes().saturating_add(DEFAULT_TASK_MINUTES),
        }
    }

    pub fn is_active_at(&self, minute_of_day: u32) -> bool {
        !self.completed
            && self.start_minutes() <= minute_of_day
            && minute_of_day < self.effective_end_minutes()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CalendarView {
    Day,
    Week,
    #[default]
    Month,
}

impl CalendarView {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }
}

impl FromStr for CalendarView {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            other => Err(format!("unknown calendar view: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TimerPhase {
    #[default]
    Work,
    Break,
}

impl TimerPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Work => "work",
            Self::Break => "break",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::Work => Self::Break,
            Self::Break => Self::Work,
        }
    }
}

impl fmt::Display for TimerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn validate_non_empty(value: &str, field_name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field_name} must not be empty"));
    }
    Ok(())
}

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::Serialize;

pub const WEEK_DAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

pub const GRID_START_HOUR: u32 = 6;
pub const GRID_END_HOUR: u32 = 23;

pub fn format_day_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}-{:02}", date.year(), date.month(), date.day())
}

pub fn parse_day_key(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

pub fn current_time_string(time: NaiveTime) -> String {
    format!("{:02}:{:02}", time.hour(), time.minute())
}

/// Converts `HH:MM` into minutes since midnight. Anything unparsable counts as 0.
pub fn minutes_from_time(value: &str) -> u32 {
    let mut split = value.trim().split(':');
    let (Some(hour), Some(minute)) = (split.next(), split.next()) else {
        return 0;
    };
    match (hour.trim().parse::<u32>(), minute.trim().parse::<u32>()) {
        (Ok(hour), Ok(minute)) => hour
            .checked_mul(60)
            .and_then(|minutes| minutes.checked_add(minute))
            .unwrap_or(0),
        _ => 0,
    }
}

pub fn minutes_of_day(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

pub fn week_start(date: NaiveDate) -> NaiveDateTime {
    let offset = i64::from(date.weekday().num_days_from_sunday());
    (date - Duration::days(offset)).and_time(NaiveTime::default())
}

pub fn is_past_date(date: NaiveDate, today: NaiveDate) -> bool {
    date < today
}

pub fn format_hour(hour: u32) -> String {
    match hour {
        0 => "12 AM".to_string(),
        1..=11 => format!("{hour} AM"),
        12 => "12 PM".to_string(),
        _ => format!("{} PM", hour - 12),
    }
}

pub fn month_name(month: u32) -> &'static str {
    let index = month.saturating_sub(1) as usize;
    MONTH_NAMES.get(index).copied().unwrap_or(MONTH_NAMES[0])
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first_of_next| first_of_next.pred_opt())
        .map(|last| last.day())
        .unwrap_or(31)
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct GridPosition {
    pub top: f64,
    pub height: f64,
    pub display: bool,
}

pub fn grid_position(time: &str, slot_height: f64) -> GridPosition {
    let mut split = time.split(':');
    let hour = split
        .next()
        .and_then(|raw| raw.trim().parse::<u32>().ok())
        .unwrap_or(0);
    let minute = split
        .next()
        .and_then(|raw| raw.trim().parse::<u32>().ok())
        .unwrap_or(0);

    if !(GRID_START_HOUR..=GRID_END_HOUR).contains(&hour) {
        return GridPosition {
            top: 0.0,
            height: slot_height,
            display: false,
        };
    }

    let top = f64::from(hour - GRID_START_HOUR) * slot_height
        + f64::from(minute) * (slot_height / 60.0);
    GridPosition {
        top,
        height: slot_height,
        display: true,
    }
}

pub(crate) fn validate_hhmm(value: &str, field_name: &str) -> Result<(), String> {
    let mut split = value.split(':');
    let Some(hour_str) = split.next() else {
        return Err(format!("{field_name} must be HH:MM"));
    };
    let Some(minute_str) = split.next() else {
        return Err(format!("{field_name} must be HH:MM"));
    };
    if split.next().is_some() {
        return Err(format!("{field_name} must be HH:MM"));
    }

    let hour = hour_str
        .parse::<u8>()
        .map_err(|_| format!("{field_name} must be HH:MM"))?;
    let minute = minute_str
        .parse::<u8>()
        .map_err(|_| format!("{field_name} must be HH:MM"))?;
    if hour > 23 || minute > 59 {
        return Err(format!("{field_name} must be HH:MM"));
    }
    Ok(())
}

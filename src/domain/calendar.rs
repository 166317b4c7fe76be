use crate::domain::models::CalendarView;
use crate::domain::time::{
    days_in_month, format_day_key, is_past_date, month_name, week_start, GRID_END_HOUR,
    GRID_START_HOUR,
};
use chrono::{Datelike, Duration, Months, NaiveDate};
use std::ops::RangeInclusive;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarState {
    today: NaiveDate,
    current_date: NaiveDate,
    selected_date: Option<NaiveDate>,
    view: CalendarView,
}

impl CalendarState {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today,
            current_date: today,
            selected_date: Some(today),
            view: CalendarView::Month,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn today_key(&self) -> String {
        format_day_key(self.today)
    }

    pub fn set_today(&mut self, today: NaiveDate) {
        self.today = today;
    }

    pub fn current_date(&self) -> NaiveDate {
        self.current_date
    }

    pub fn selected_date(&self) -> Option<NaiveDate> {
        self.selected_date
    }

    pub fn view(&self) -> CalendarView {
        self.view
    }

    pub fn set_view(&mut self, view: CalendarView) {
        debug!(view = view.as_str(), "calendar view changed");
        self.view = view;
    }

    pub fn select_date(&mut self, date: NaiveDate) {
        self.selected_date = Some(date);
    }

    pub fn clear_selection(&mut self) {
        self.selected_date = None;
    }

    pub fn active_day(&self) -> NaiveDate {
        self.selected_date.unwrap_or(self.today)
    }

    pub fn is_active_day_past(&self) -> bool {
        is_past_date(self.active_day(), self.today)
    }

    pub fn month_name(&self) -> &'static str {
        month_name(self.current_date.month())
    }

    pub fn current_year(&self) -> i32 {
        self.current_date.year()
    }

    pub fn change_unit(&mut self, delta: i32) {
        match self.view {
            CalendarView::Month => {
                let first = self.current_date.with_day(1).unwrap_or(self.current_date);
                let months = Months::new(delta.unsigned_abs());
                let shifted = if delta >= 0 {
                    first.checked_add_months(months)
                } else {
                    first.checked_sub_months(months)
                };
                self.current_date = shifted.unwrap_or(first);
            }
            CalendarView::Week | CalendarView::Day => {
                let step = if self.view == CalendarView::Week {
                    i64::from(delta) * 7
                } else {
                    i64::from(delta)
                };
                let shifted = self
                    .active_day()
                    .checked_add_signed(Duration::days(step))
                    .unwrap_or_else(|| self.active_day());
                self.selected_date = Some(shifted);
                self.current_date = shifted;
            }
        }
        debug!(
            view = self.view.as_str(),
            delta,
            current_date = %format_day_key(self.current_date),
            "calendar navigated"
        );
    }

    pub fn visible_days(&self) -> Vec<Option<NaiveDate>> {
        match self.view {
            CalendarView::Month => self.month_days(),
            CalendarView::Week => self.week_days().into_iter().map(Some).collect(),
            CalendarView::Day => self.selected_date.into_iter().map(Some).collect(),
        }
    }

    pub fn month_days(&self) -> Vec<Option<NaiveDate>> {
        let year = self.current_date.year();
        let month = self.current_date.month();
        let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
            return Vec::new();
        };
        let offset = first.weekday().num_days_from_sunday() as usize;
        let total = days_in_month(year, month);

        let mut days = vec![None; offset];
        days.extend(
            (1..=total)
                .filter_map(|day| NaiveDate::from_ymd_opt(year, month, day))
                .map(Some),
        );
        days
    }

    pub fn week_days(&self) -> Vec<NaiveDate> {
        let start = week_start(self.active_day()).date();
        start.iter_days().take(7).collect()
    }

    pub fn title(&self) -> String {
        match self.view {
            CalendarView::Month => format!("{} {}", self.month_name(), self.current_year()),
            CalendarView::Week => {
                let start = week_start(self.active_day()).date();
                let end = start + Duration::days(6);
                format!("Week {} - {}", format_day_key(start), format_day_key(end))
            }
            CalendarView::Day => format!("Day {}", format_day_key(self.active_day())),
        }
    }
}

pub fn time_slots() -> RangeInclusive<u32> {
    GRID_START_HOUR..=GRID_END_HOUR
}

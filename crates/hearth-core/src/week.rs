//! Calendar-week helpers shared by the recurrence subsystem.
//!
//! Weeks run Monday through Sunday; all watermark bookkeeping is keyed on
//! the Monday date.

use chrono::{Datelike, Days, NaiveDate};

/// Monday of the week containing `date`.
pub fn week_monday(date: NaiveDate) -> NaiveDate {
    let back = date.weekday().num_days_from_monday() as u64;
    date - Days::new(back)
}

/// True when `date` is the last day of its month. Used to clamp monthly
/// recurrence anchors (e.g. anchor day 31 lands on Feb 28/29).
pub fn is_last_day_of_month(date: NaiveDate) -> bool {
    (date + Days::new(1)).month() != date.month()
}

//! Event filtering
//!
//! Filtering is conjunctive: an event survives only if its category (read
//! through the selected pivot) is selected, BOTH of its equipment labels are
//! selected, and it falls inside the time window.
//!
//! Requiring both equipment labels is deliberate. When an operator moves an
//! event from one machine to another, showing it under only the still-selected
//! machine would silently leak minutes across machine boundaries into a
//! partial view. Excluding the event entirely keeps per-machine views honest.
//!
//! # Window modes
//!
//! - [`Window::Absolute`] compares combined date+time bounds as single
//!   timestamps. This is the canonical mode and the only one that handles a
//!   window crossing midnight (e.g. night shift 22:00 → 06:00).
//! - [`Window::RecurringHours`] applies a daily time-of-day band across a
//!   date range ("06:00-18:00 every day this week"). Comparing date and
//!   wall-clock independently is wrong for an absolute range, but useful as
//!   its own filter, so it exists as an explicit opt-in mode.

use crate::event::{Event, Field};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Time window over event start timestamps. Bounds are inclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Window {
    /// Everything; no time constraint.
    All,
    /// Combined date+time bounds compared as single timestamps.
    Absolute {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
    /// A date range with a daily time-of-day band applied to every day.
    RecurringHours {
        first_day: NaiveDate,
        last_day: NaiveDate,
        day_start: NaiveTime,
        day_end: NaiveTime,
    },
}

impl Window {
    /// Build the canonical absolute window from separate date and
    /// time-of-day picker values.
    pub fn absolute(
        start_date: NaiveDate,
        start_time: NaiveTime,
        end_date: NaiveDate,
        end_time: NaiveTime,
    ) -> Self {
        Window::Absolute {
            start: start_date.and_time(start_time),
            end: end_date.and_time(end_time),
        }
    }

    fn contains(&self, ts: NaiveDateTime) -> bool {
        match self {
            Window::All => true,
            Window::Absolute { start, end } => *start <= ts && ts <= *end,
            Window::RecurringHours {
                first_day,
                last_day,
                day_start,
                day_end,
            } => {
                let date = ts.date();
                let time = ts.time();
                *first_day <= date
                    && date <= *last_day
                    && *day_start <= time
                    && time <= *day_end
            }
        }
    }
}

/// Operator-chosen filter parameters for one render.
#[derive(Debug, Clone)]
pub struct FilterParams {
    /// Which label set the category predicate reads.
    pub category_field: Field,
    /// Selected categories by display name. `None` means all.
    pub categories: Option<HashSet<String>>,
    /// Selected equipment names. `None` means all.
    pub equipment: Option<HashSet<String>>,
    pub window: Window,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            category_field: Field::Original,
            categories: None,
            equipment: None,
            window: Window::All,
        }
    }
}

impl FilterParams {
    fn matches(&self, event: &Event) -> bool {
        if let Some(cats) = &self.categories {
            if !cats.contains(&event.category(self.category_field).to_string()) {
                return false;
            }
        }
        if let Some(eq) = &self.equipment {
            // Both label sets must be selected; see module docs.
            if !eq.contains(&event.equipment_original) || !eq.contains(&event.equipment_reclassified)
            {
                return false;
            }
        }
        self.window.contains(event.start)
    }
}

/// Apply the filter, preserving input order.
pub fn filter<'a>(events: &'a [Event], params: &FilterParams) -> Vec<&'a Event> {
    events.iter().filter(|e| params.matches(e)).collect()
}

//! Read access to the schedulable items currently on screen.

use std::str::FromStr;

use chrono::NaiveDate;
use chrono_tz::Tz;

use crate::models::event::ScheduledEvent;

/// Visible items used for overlap checks.
pub trait EventSource {
    /// Every item across all displayed days (needed for cross-day moves).
    fn visible_items(&self) -> Vec<ScheduledEvent>;

    /// Items that touch `date` in the viewer's zone.
    fn items_for_day(&self, date: NaiveDate) -> Vec<ScheduledEvent>;
}

/// Snapshot of the items a view loaded for its date range.
#[derive(Debug, Clone, Default)]
pub struct VisibleEventSet {
    items: Vec<ScheduledEvent>,
    timezone: Option<Tz>,
}

impl VisibleEventSet {
    /// `timezone` decides which calendar day an instant falls on; unknown
    /// ids fall back to UTC.
    pub fn new(items: Vec<ScheduledEvent>, timezone: &str) -> Self {
        let timezone = Tz::from_str(timezone).ok();
        if timezone.is_none() {
            log::warn!("Unknown timezone for visible set, grouping days in UTC");
        }
        Self { items, timezone }
    }

    pub fn items(&self) -> &[ScheduledEvent] {
        &self.items
    }

    pub fn get(&self, id: i64) -> Option<&ScheduledEvent> {
        self.items.iter().find(|item| item.id == Some(id))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn local_date(&self, item_instant: chrono::DateTime<chrono::Utc>) -> NaiveDate {
        match self.timezone {
            Some(tz) => item_instant.with_timezone(&tz).date_naive(),
            None => item_instant.date_naive(),
        }
    }
}

impl EventSource for VisibleEventSet {
    fn visible_items(&self) -> Vec<ScheduledEvent> {
        self.items.clone()
    }

    fn items_for_day(&self, date: NaiveDate) -> Vec<ScheduledEvent> {
        self.items
            .iter()
            .filter(|item| {
                let first = self.local_date(item.start);
                // An item ending exactly at midnight does not touch the next day
                let last = self.local_date(item.end - chrono::Duration::nanoseconds(1));
                first <= date && date <= last
            })
            .cloned()
            .collect()
    }
}

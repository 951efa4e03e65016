// Event module
// Schedulable item model shared by the store and the drag engine

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// What kind of schedulable item a block on the grid represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Event,
    Task,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Event => "event",
            ItemKind::Task => "task",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "event" => Some(ItemKind::Event),
            "task" => Some(ItemKind::Task),
            _ => None,
        }
    }
}

/// Half-open `[start, end)` interval of instants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Two ranges overlap iff each starts before the other ends.
    /// Ranges that merely touch do not overlap.
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        other.start < self.end && other.end > self.start
    }
}

/// A calendar event or task as seen by the planner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledEvent {
    pub id: Option<i64>,
    pub title: String,
    pub kind: ItemKind,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub recurrence_rule: Option<String>, // RRULE string (RFC 5545)
}

impl ScheduledEvent {
    /// Create a new event with required fields
    ///
    /// # Examples
    /// ```
    /// use rust_planner::models::event::ScheduledEvent;
    /// use chrono::{Duration, Utc};
    ///
    /// let start = Utc::now();
    /// let event = ScheduledEvent::new("Team Meeting", start, start + Duration::hours(1)).unwrap();
    /// assert_eq!(event.duration(), Duration::hours(1));
    /// ```
    pub fn new(
        title: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Self, String> {
        let event = Self {
            id: None,
            title: title.into(),
            kind: ItemKind::Event,
            start,
            end,
            recurrence_rule: None,
        };
        event.validate()?;
        Ok(event)
    }

    pub fn builder() -> ScheduledEventBuilder {
        ScheduledEventBuilder::default()
    }

    /// Validate the event
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Event title cannot be empty".to_string());
        }

        if self.end <= self.start {
            return Err("Event end time must be after start time".to_string());
        }

        Ok(())
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence_rule
            .as_deref()
            .map_or(false, |rule| !rule.trim().is_empty())
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn time_range(&self) -> TimeRange {
        TimeRange::new(self.start, self.end)
    }

    /// Copy of this event moved to `range`
    pub fn with_range(&self, range: TimeRange) -> Self {
        Self {
            start: range.start,
            end: range.end,
            ..self.clone()
        }
    }
}

/// Builder for creating events with optional fields
#[derive(Default)]
pub struct ScheduledEventBuilder {
    id: Option<i64>,
    title: Option<String>,
    kind: Option<ItemKind>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    recurrence_rule: Option<String>,
}

impl ScheduledEventBuilder {
    pub fn id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn kind(mut self, kind: ItemKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn start(mut self, start: DateTime<Utc>) -> Self {
        self.start = Some(start);
        self
    }

    pub fn end(mut self, end: DateTime<Utc>) -> Self {
        self.end = Some(end);
        self
    }

    pub fn recurrence_rule(mut self, rule: impl Into<String>) -> Self {
        self.recurrence_rule = Some(rule.into());
        self
    }

    pub fn build(self) -> Result<ScheduledEvent, String> {
        let title = self.title.ok_or("Event title is required")?;
        let start = self.start.ok_or("Event start time is required")?;
        let end = self.end.ok_or("Event end time is required")?;

        let event = ScheduledEvent {
            id: self.id,
            title,
            kind: self.kind.unwrap_or(ItemKind::Event),
            start,
            end,
            recurrence_rule: self.recurrence_rule,
        };

        event.validate()?;
        Ok(event)
    }
}

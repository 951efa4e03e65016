// Test fixtures - reusable test data
// Provides a consistent week grid and events across all test files
#![allow(dead_code)]

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Timelike, Utc};
use egui::{Pos2, Rect, Vec2};

use rust_planner::interaction::{
    BlockGeometry, GestureKind, GestureTarget, GridGeometry, PointerEvent, PointerPhase,
    PointerSource,
};
use rust_planner::models::event::{ScheduledEvent, TimeRange};

/// Width of one day column in the test grid
pub const COLUMN_WIDTH: f32 = 100.0;
/// One pixel per minute keeps offsets easy to read
pub const HOUR_HEIGHT: f32 = 60.0;

/// Monday, March 10 2025
pub fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
}

/// Instant in March 2025, UTC
pub fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, day, hour, minute, 0).unwrap()
}

pub fn range(start: DateTime<Utc>, end: DateTime<Utc>) -> TimeRange {
    TimeRange::new(start, end)
}

/// The whole test week, Monday to Sunday
pub fn week_range() -> TimeRange {
    range(at(10, 0, 0), at(17, 0, 0))
}

/// Seven UTC columns laid out from the origin
pub fn week_geometry() -> GridGeometry {
    GridGeometry {
        surface: Rect::from_min_size(Pos2::ZERO, Vec2::new(7.0 * COLUMN_WIDTH, 24.0 * HOUR_HEIGHT)),
        column_width: COLUMN_WIDTH,
        hour_height: HOUR_HEIGHT,
        column_dates: (0..7).map(|d| monday() + Duration::days(d)).collect(),
        timezone: "UTC".to_string(),
    }
}

/// Unsaved event for inserting into a store
pub fn new_event(title: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> ScheduledEvent {
    ScheduledEvent::builder()
        .title(title)
        .start(start)
        .end(end)
        .build()
        .unwrap()
}

/// Unsaved weekly series
pub fn weekly_event(title: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> ScheduledEvent {
    ScheduledEvent::builder()
        .title(title)
        .start(start)
        .end(end)
        .recurrence_rule("FREQ=WEEKLY")
        .build()
        .unwrap()
}

pub fn event(id: i64, start: DateTime<Utc>, end: DateTime<Utc>) -> ScheduledEvent {
    ScheduledEvent::builder()
        .id(id)
        .title(format!("Event {id}"))
        .start(start)
        .end(end)
        .build()
        .unwrap()
}

/// Gesture target for `event` drawn in `column` of [`week_geometry`]
pub fn target_for(event: &ScheduledEvent, column: usize, kind: GestureKind) -> GestureTarget {
    let top = (event.start.num_seconds_from_midnight() / 60) as f32;
    let height = event.duration().num_minutes() as f32;
    GestureTarget::new(event.clone(), kind, BlockGeometry { column, top, height })
}

pub fn mouse(phase: PointerPhase, x: f32, y: f32) -> PointerEvent {
    PointerEvent::new(PointerSource::Mouse, phase, Pos2::new(x, y))
}

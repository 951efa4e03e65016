//! Pixel ↔ time mapping for the time grid.
//!
//! Everything here is a pure function of its inputs. Geometry is supplied
//! by the renderer through [`GridGeometry`]; nothing in this module looks at
//! a visual tree.

use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Timelike, Utc};
use chrono_tz::Tz;
use egui::{Pos2, Rect, Vec2};

use super::timezone::TimezoneConverter;
use crate::models::event::TimeRange;

pub const MINUTES_PER_DAY: i64 = 24 * 60;

/// Column/hour layout of the grid a gesture runs over.
///
/// `surface` is the screen-space box of the 24-hour day columns: its left
/// edge is the left edge of column 0 and its top edge is 00:00.
#[derive(Debug, Clone, PartialEq)]
pub struct GridGeometry {
    pub surface: Rect,
    pub column_width: f32,
    pub hour_height: f32,
    pub column_dates: Vec<NaiveDate>,
    pub timezone: String,
}

impl GridGeometry {
    pub fn column_count(&self) -> usize {
        self.column_dates.len()
    }

    pub fn column_date(&self, index: usize) -> Option<NaiveDate> {
        self.column_dates.get(index).copied()
    }

    /// False while the layout is mid-change (zero or non-finite width).
    pub fn has_usable_columns(&self) -> bool {
        self.column_width.is_finite() && self.column_width > 0.0
    }

    pub fn is_multi_column(&self) -> bool {
        self.column_count() > 1 && self.has_usable_columns()
    }

    pub fn column_left(&self, index: usize) -> f32 {
        self.surface.left() + index as f32 * self.column_width
    }

    /// Pixel offset from the top of the day for a minute-of-day.
    pub fn offset_for_minutes(&self, minutes: i64) -> f32 {
        minutes_to_offset(minutes, self.hour_height)
    }

    /// Screen rect of a block placed in `column` at `top` (offset from 00:00).
    pub fn block_rect(&self, column: usize, top: f32, height: f32) -> Rect {
        Rect::from_min_size(
            Pos2::new(self.column_left(column), self.surface.top() + top),
            Vec2::new(self.column_width, height),
        )
    }
}

/// A vertical offset snapped onto the grid, with the time it represents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnappedPosition {
    pub offset: f32,
    pub hour: u32,
    pub minute: u32,
}

impl SnappedPosition {
    pub fn minutes_of_day(&self) -> i64 {
        i64::from(self.hour) * 60 + i64::from(self.minute)
    }

    pub fn time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour, self.minute, 0).unwrap_or(NaiveTime::MIN)
    }
}

pub fn minutes_to_offset(minutes: i64, hour_height: f32) -> f32 {
    minutes as f32 / 60.0 * hour_height
}

fn offset_to_minutes(offset: f32, hour_height: f32) -> f64 {
    if !offset.is_finite() || !(hour_height.is_finite() && hour_height > 0.0) {
        return 0.0;
    }
    f64::from(offset) / f64::from(hour_height) * 60.0
}

fn round_to_interval(minutes: f64, interval: i64) -> i64 {
    (minutes / interval as f64).round() as i64 * interval
}

/// Snap a vertical offset within a day column to the nearest
/// `snap_minutes` boundary.
///
/// The result is clamped to the last slot of the day, so `hour` stays in
/// `0..=23` and `minute` in `0..=59`. The returned offset is the pixel
/// position of the snapped time, so snapping it again is a no-op.
pub fn snap_to_interval(offset: f32, hour_height: f32, snap_minutes: u32) -> SnappedPosition {
    let interval = i64::from(snap_minutes.clamp(1, 60));
    let snapped = round_to_interval(offset_to_minutes(offset, hour_height), interval)
        .clamp(0, MINUTES_PER_DAY - interval);

    let hour = (snapped / 60).clamp(0, 23) as u32;
    let minute = (snapped % 60).clamp(0, 59) as u32;

    let offset = if hour_height.is_finite() && hour_height > 0.0 {
        minutes_to_offset(snapped, hour_height)
    } else {
        0.0
    };

    SnappedPosition { offset, hour, minute }
}

/// Snap a block height to whole intervals, bounded by `[min, max]` minutes.
/// `min` wins when the bounds cross.
pub fn snap_duration_minutes(
    height: f32,
    hour_height: f32,
    snap_minutes: u32,
    min_minutes: i64,
    max_minutes: i64,
) -> i64 {
    let interval = i64::from(snap_minutes.clamp(1, 60));
    let snapped = round_to_interval(offset_to_minutes(height, hour_height), interval);
    snapped.clamp(min_minutes, max_minutes.max(min_minutes))
}

/// Column under the pointer, or `origin_index` until the gesture has
/// crossed its movement threshold.
///
/// `pointer_offset_x` is measured from the grid's left edge. A zero or
/// non-finite `column_width` pins the gesture to its origin column.
pub fn resolve_column_index(
    pointer_offset_x: f32,
    origin_index: usize,
    column_width: f32,
    total_columns: usize,
    has_crossed_threshold: bool,
) -> usize {
    if total_columns == 0 {
        return 0;
    }
    let last = total_columns - 1;
    let origin = origin_index.min(last);

    if !has_crossed_threshold {
        return origin;
    }

    if !(column_width.is_finite() && column_width > 0.0) || !pointer_offset_x.is_finite() {
        log::warn!(
            "Unusable column geometry (width {}), keeping gesture in column {}",
            column_width,
            origin
        );
        return origin;
    }

    let raw = (pointer_offset_x / column_width).floor();
    if raw <= 0.0 {
        0
    } else {
        // float → usize casts saturate, so huge offsets land on `last`
        (raw as usize).min(last)
    }
}

/// Start/end instants for a block of `origin_duration` placed at the
/// snapped wall-clock time on `column_date`.
pub fn compute_time_range(
    origin_duration: Duration,
    snapped_hour: u32,
    snapped_minute: u32,
    column_date: NaiveDate,
    timezone: &str,
    converter: &dyn TimezoneConverter,
) -> Option<TimeRange> {
    let time = NaiveTime::from_hms_opt(snapped_hour, snapped_minute, 0)?;
    let start = converter.to_instant(column_date.and_time(time), timezone)?;
    Some(TimeRange::new(start, start + origin_duration))
}

/// Minutes since local midnight of `instant` in `timezone` (UTC if the
/// zone id is unknown).
pub fn local_minute_of_day(instant: DateTime<Utc>, timezone: &str) -> i64 {
    let time = match Tz::from_str(timezone) {
        Ok(tz) => instant.with_timezone(&tz).time(),
        Err(_) => instant.time(),
    };
    i64::from(time.num_seconds_from_midnight() / 60)
}

/// Constrain a pointer position to the calendar surface so a gesture
/// dragged outside the visible grid still maps to an in-bounds slot.
pub fn clamp_to_surface(pos: Pos2, surface: Rect) -> Pos2 {
    if !surface.is_finite() || !surface.is_positive() {
        return pos;
    }

    let x = if pos.x.is_finite() { pos.x } else { surface.left() };
    let y = if pos.y.is_finite() { pos.y } else { surface.top() };
    surface.clamp(Pos2::new(x, y))
}

// Property-based tests for grid mapping and overlap detection
// Exercises the pure helpers with random geometry

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use egui::{Pos2, Rect, Vec2};
use proptest::prelude::*;
use rust_planner::interaction::position::{
    clamp_to_surface, compute_time_range, resolve_column_index, snap_duration_minutes,
    snap_to_interval, MINUTES_PER_DAY,
};
use rust_planner::interaction::{has_overlap, ChronoTzConverter};
use rust_planner::models::event::ScheduledEvent;

proptest! {
    /// Property: snapped positions always land on the grid and inside the day
    #[test]
    fn prop_snap_lands_on_interval(
        offset in -500.0f32..3000.0,
        hour_height in 20.0f32..200.0,
        snap in prop::sample::select(vec![1u32, 5, 10, 15, 30, 60]),
    ) {
        let snapped = snap_to_interval(offset, hour_height, snap);
        let minutes = snapped.minutes_of_day();

        prop_assert_eq!(minutes % i64::from(snap), 0);
        prop_assert!(minutes >= 0);
        prop_assert!(minutes <= MINUTES_PER_DAY - i64::from(snap));
        prop_assert!(snapped.hour < 24 && snapped.minute < 60);
    }

    /// Property: resized durations respect the minimum and maximum
    #[test]
    fn prop_duration_is_bounded(
        height in -200.0f32..2000.0,
        max in 15i64..1440,
    ) {
        let minutes = snap_duration_minutes(height, 60.0, 15, 15, max);
        prop_assert!(minutes >= 15);
        prop_assert!(minutes <= max.max(15));
    }

    /// Property: the resolved column is always a real column
    #[test]
    fn prop_column_index_in_range(
        x in -1000.0f32..3000.0,
        origin in 0usize..10,
        width in 1.0f32..300.0,
        total in 1usize..8,
        crossed in any::<bool>(),
    ) {
        let index = resolve_column_index(x, origin, width, total, crossed);
        prop_assert!(index < total);
        if !crossed {
            prop_assert_eq!(index, origin.min(total - 1));
        }
    }

    /// Property: clamping keeps finite pointers inside the surface
    #[test]
    fn prop_clamp_stays_inside(x in -5000.0f32..5000.0, y in -5000.0f32..5000.0) {
        let surface = Rect::from_min_size(Pos2::new(40.0, 30.0), Vec2::new(700.0, 1440.0));
        let clamped = clamp_to_surface(Pos2::new(x, y), surface);
        prop_assert!(surface.contains(clamped));
    }

    /// Property: computed ranges keep the original duration
    #[test]
    fn prop_time_range_keeps_duration(
        hour in 0u32..24,
        quarter in 0u32..4,
        minutes in 15i64..600,
    ) {
        let date = NaiveDate::from_ymd_opt(2025, 3, 12).unwrap();
        let range = compute_time_range(
            Duration::minutes(minutes),
            hour,
            quarter * 15,
            date,
            "Europe/Berlin",
            &ChronoTzConverter,
        );
        // Berlin has no gap on this date, so every slot maps
        let range = range.unwrap();
        prop_assert_eq!(range.duration(), Duration::minutes(minutes));
    }

    /// Property: a candidate placed after every item never overlaps
    #[test]
    fn prop_range_after_all_items_is_free(
        starts in prop::collection::vec(0i64..600, 0..10),
    ) {
        let base = Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap();
        let items: Vec<ScheduledEvent> = starts
            .iter()
            .enumerate()
            .map(|(i, s)| {
                ScheduledEvent::builder()
                    .id(i as i64 + 1)
                    .title("Busy")
                    .start(base + Duration::minutes(*s))
                    .end(base + Duration::minutes(*s + 30))
                    .build()
                    .unwrap()
            })
            .collect();

        let start = base + Duration::minutes(630);
        prop_assert!(!has_overlap(start, start + Duration::minutes(60), None, &items));
    }
}

//! Speculative overlap detection for projected placements.

use chrono::{DateTime, Utc};

use crate::models::event::ScheduledEvent;

/// True if `[candidate_start, candidate_end)` intersects any event in
/// `events` other than `exclude_id`.
///
/// Touching intervals do not overlap. The caller decides how wide
/// `events` is: a single day, or every visible day for cross-day moves.
pub fn has_overlap(
    candidate_start: DateTime<Utc>,
    candidate_end: DateTime<Utc>,
    exclude_id: Option<i64>,
    events: &[ScheduledEvent],
) -> bool {
    first_overlap(candidate_start, candidate_end, exclude_id, events).is_some()
}

/// The first event that blocks the candidate range, if any.
pub fn first_overlap<'a>(
    candidate_start: DateTime<Utc>,
    candidate_end: DateTime<Utc>,
    exclude_id: Option<i64>,
    events: &'a [ScheduledEvent],
) -> Option<&'a ScheduledEvent> {
    events.iter().find(|existing| {
        let excluded = exclude_id.is_some() && existing.id == exclude_id;
        !excluded && existing.start < candidate_end && existing.end > candidate_start
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, hour, minute, 0).unwrap()
    }

    fn event(id: i64, start: DateTime<Utc>, end: DateTime<Utc>) -> ScheduledEvent {
        ScheduledEvent::builder()
            .id(id)
            .title(format!("Event {id}"))
            .start(start)
            .end(end)
            .build()
            .unwrap()
    }

    #[test]
    fn test_projected_move_hits_neighbour() {
        let events = vec![event(1, at(9, 0), at(10, 0)), event(2, at(10, 30), at(11, 30))];

        assert!(has_overlap(at(10, 15), at(11, 15), Some(1), &events));
        assert_eq!(
            first_overlap(at(10, 15), at(11, 15), Some(1), &events).and_then(|e| e.id),
            Some(2)
        );
    }

    #[test]
    fn test_dragged_event_is_excluded() {
        let events = vec![event(1, at(9, 0), at(10, 0))];

        // Sliding an event by 15 minutes overlaps its own old slot only
        assert!(!has_overlap(at(9, 15), at(10, 15), Some(1), &events));
        // Without the exclusion the same range is blocked
        assert!(has_overlap(at(9, 15), at(10, 15), None, &events));
        // Excluding some other id does not hide the event
        assert!(has_overlap(at(9, 15), at(10, 15), Some(99), &events));
    }

    #[test]
    fn test_adjacent_ranges_are_free() {
        let events = vec![event(2, at(10, 0), at(11, 0))];
        assert!(!has_overlap(at(9, 0), at(10, 0), None, &events));
        assert!(!has_overlap(at(11, 0), at(12, 0), None, &events));
    }

    #[test]
    fn test_zero_length_candidate_on_boundary() {
        let events = vec![event(2, at(10, 0), at(11, 0))];
        assert!(!has_overlap(at(10, 0), at(10, 0), None, &events));
        assert!(!has_overlap(at(11, 0), at(11, 0), None, &events));
    }

    #[test]
    fn test_scans_whole_supplied_set() {
        let mut events: Vec<_> = (0..20)
            .map(|day| {
                let start = at(8, 0) + Duration::days(day);
                event(day + 100, start, start + Duration::minutes(30))
            })
            .collect();
        events.reverse();

        let late = at(8, 15) + Duration::days(19);
        assert!(has_overlap(late, late + Duration::hours(1), Some(1), &events));
    }

    proptest! {
        #[test]
        fn prop_overlap_is_symmetric(
            a_start in 0i64..600,
            a_len in 1i64..240,
            b_start in 0i64..600,
            b_len in 1i64..240,
        ) {
            let base = at(0, 0);
            let a = event(1, base + Duration::minutes(a_start), base + Duration::minutes(a_start + a_len));
            let b = event(2, base + Duration::minutes(b_start), base + Duration::minutes(b_start + b_len));

            let a_against_b = has_overlap(a.start, a.end, Some(1), std::slice::from_ref(&b));
            let b_against_a = has_overlap(b.start, b.end, Some(2), std::slice::from_ref(&a));
            prop_assert_eq!(a_against_b, b_against_a);
        }
    }
}

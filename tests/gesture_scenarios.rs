// End-to-end gesture scenarios against the process-wide drag store
mod fixtures;

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use fixtures::*;
use pretty_assertions::assert_eq;
use rust_planner::interaction::{
    ChronoTzConverter, DragPhase, DragSessionStore, GestureKind, GestureOutcome,
    GestureStateMachine, LongPress, MachinePhase, NoCapture, PointerPhase, TouchAction,
    TouchGestureRecognizer, VisibleEventSet,
};
use rust_planner::models::settings::InteractionSettings;
use serial_test::serial;

fn global_machine() -> GestureStateMachine {
    GestureStateMachine::new(
        InteractionSettings::default(),
        DragSessionStore::global(),
        Arc::new(ChronoTzConverter),
        Arc::new(NoCapture),
    )
}

#[test]
#[serial]
fn test_every_column_sees_one_cross_day_drag() {
    let a = event(1, at(11, 9, 0), at(11, 10, 0));
    let visible = VisibleEventSet::new(vec![a.clone()], "UTC");
    let mut machine = global_machine();

    // Two "columns" reading the same store
    let tuesday = DragSessionStore::global().clone();
    let friday = DragSessionStore::global().clone();

    machine.begin(
        target_for(&a, 1, GestureKind::Move),
        mouse(PointerPhase::Down, 150.0, 560.0),
        week_geometry(),
        &visible,
    );
    machine.handle(mouse(PointerPhase::Move, 450.0, 560.0));

    let seen_tuesday = tuesday.current().unwrap();
    let seen_friday = friday.current().unwrap();
    assert_eq!(seen_tuesday, seen_friday);
    assert!(!seen_tuesday.previews_in_column(1));
    assert!(seen_friday.previews_in_column(4));

    machine.cancel();
    assert!(DragSessionStore::global().current().is_none());
}

#[test]
#[serial]
fn test_subscribers_follow_gesture_lifecycle() {
    let a = event(1, at(10, 9, 0), at(10, 10, 0));
    let visible = VisibleEventSet::new(vec![a.clone()], "UTC");
    let phases = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&phases);
    let subscription = DragSessionStore::global().subscribe(move |snapshot| {
        sink.lock()
            .unwrap()
            .push(snapshot.state.as_ref().map(|s| s.phase));
    });

    let mut machine = global_machine();
    machine.begin(
        target_for(&a, 0, GestureKind::Move),
        mouse(PointerPhase::Down, 50.0, 560.0),
        week_geometry(),
        &visible,
    );
    machine.handle(mouse(PointerPhase::Move, 50.0, 600.0));
    let outcome = machine.handle(mouse(PointerPhase::Cancel, 50.0, 600.0));
    assert_eq!(outcome, Some(GestureOutcome::Cancelled { event_id: 1 }));

    assert!(DragSessionStore::global().unsubscribe(subscription));

    let phases = phases.lock().unwrap().clone();
    assert_eq!(phases.first(), Some(&Some(DragPhase::Pending)));
    assert!(phases.contains(&Some(DragPhase::Dragging)));
    assert_eq!(phases.last(), Some(&None));
}

#[test]
#[serial]
fn test_dropping_machine_clears_global_projection() {
    let a = event(1, at(10, 9, 0), at(10, 10, 0));
    let visible = VisibleEventSet::new(vec![a.clone()], "UTC");
    {
        let mut machine = global_machine();
        machine.begin(
            target_for(&a, 0, GestureKind::Move),
            mouse(PointerPhase::Down, 50.0, 560.0),
            week_geometry(),
            &visible,
        );
        machine.handle(mouse(PointerPhase::Move, 50.0, 620.0));
        assert!(DragSessionStore::global().is_active());
    }
    assert!(DragSessionStore::global().current().is_none());
}

#[test]
fn test_touch_long_press_drags_event() {
    let a = event(3, at(12, 14, 0), at(12, 15, 0));
    let visible = VisibleEventSet::new(vec![a.clone()], "UTC");
    let store = DragSessionStore::new();
    let mut machine = GestureStateMachine::new(
        InteractionSettings::default(),
        &store,
        Arc::new(ChronoTzConverter),
        Arc::new(NoCapture),
    );
    let mut touch = TouchGestureRecognizer::from_settings(&InteractionSettings::default());
    let start = Instant::now();
    let press_at = egui::Pos2::new(250.0, 860.0);

    touch.touch_start(Some(target_for(&a, 2, GestureKind::Move)), press_at, start);
    assert_eq!(touch.touch_move(egui::Pos2::new(253.0, 862.0)), TouchAction::Ignored);
    assert!(touch.poll(start + Duration::from_millis(200)).is_none());

    let LongPress { target, event } = touch
        .poll(start + Duration::from_millis(500))
        .expect("long-press should fire");
    assert!(machine.begin(target, event, week_geometry(), &visible));

    let TouchAction::Forward(moved) = touch.touch_move(egui::Pos2::new(253.0, 922.0)) else {
        panic!("engaged touch should forward moves");
    };
    machine.handle(moved);
    assert_eq!(machine.phase(), MachinePhase::Dragging);

    let TouchAction::Forward(lifted) = touch.touch_end(egui::Pos2::new(253.0, 922.0)) else {
        panic!("engaged touch should forward the lift");
    };
    match machine.handle(lifted) {
        Some(GestureOutcome::Commit(request)) => {
            assert_eq!(request.candidate, range(at(12, 15, 0), at(12, 16, 0)));
        }
        other => panic!("expected commit, got {other:?}"),
    }
}

#[test]
fn test_quick_touch_is_a_tap_not_a_gesture() {
    let a = event(3, at(12, 14, 0), at(12, 15, 0));
    let mut touch = TouchGestureRecognizer::from_settings(&InteractionSettings::default());
    let start = Instant::now();
    let pos = egui::Pos2::new(250.0, 860.0);

    touch.touch_start(Some(target_for(&a, 2, GestureKind::Move)), pos, start);
    assert!(touch.poll(start + Duration::from_millis(300)).is_none());
    assert!(matches!(touch.touch_end(pos), TouchAction::Tap(t) if t.event.id == Some(3)));
    assert!(!touch.is_engaged());
}

#[test]
fn test_touch_scroll_cancels_long_press() {
    let a = event(3, at(12, 14, 0), at(12, 15, 0));
    let mut touch = TouchGestureRecognizer::from_settings(&InteractionSettings::default());
    let start = Instant::now();

    touch.touch_start(
        Some(target_for(&a, 2, GestureKind::Move)),
        egui::Pos2::new(250.0, 860.0),
        start,
    );
    touch.touch_move(egui::Pos2::new(250.0, 900.0));
    assert!(!touch.is_waiting());
    assert!(touch.poll(start + Duration::from_secs(1)).is_none());
}

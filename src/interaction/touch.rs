//! Touch adapter: a long-press gate in front of the gesture machine.
//!
//! A touch on an event block only becomes a gesture after it has been held
//! for the configured delay without drifting past the jitter tolerance.
//! Until then the touch belongs to the host (scrolling, taps). The timer is
//! a deadline checked by [`TouchGestureRecognizer::poll`] on each frame.

use std::time::{Duration, Instant};

use egui::Pos2;

use super::input::{PointerEvent, PointerPhase, PointerSource};
use super::session::GestureTarget;
use crate::models::settings::InteractionSettings;

#[derive(Debug, Clone, PartialEq)]
pub enum TouchAction {
    /// Nothing for the gesture machine
    Ignored,
    /// Released before the long-press fired
    Tap(GestureTarget),
    /// Part of an engaged gesture; hand to the machine
    Forward(PointerEvent),
}

/// A press that was held long enough; start a session with it.
#[derive(Debug, Clone, PartialEq)]
pub struct LongPress {
    pub target: GestureTarget,
    pub event: PointerEvent,
}

#[derive(Debug, Clone)]
struct PendingPress {
    target: GestureTarget,
    origin: Pos2,
    last: Pos2,
    deadline: Instant,
}

#[derive(Debug)]
pub struct TouchGestureRecognizer {
    delay: Duration,
    jitter: f32,
    pending: Option<PendingPress>,
    engaged: bool,
}

impl TouchGestureRecognizer {
    pub fn new(delay: Duration, jitter: f32) -> Self {
        Self {
            delay,
            jitter,
            pending: None,
            engaged: false,
        }
    }

    pub fn from_settings(settings: &InteractionSettings) -> Self {
        Self::new(settings.long_press_delay(), settings.touch_jitter_px)
    }

    pub fn is_waiting(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_engaged(&self) -> bool {
        self.engaged
    }

    /// When the pending long-press would fire, for scheduling a repaint.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|press| press.deadline)
    }

    /// A finger went down. Only touches on an event block arm the timer;
    /// extra fingers during a press are ignored.
    pub fn touch_start(&mut self, target: Option<GestureTarget>, pos: Pos2, now: Instant) {
        if self.pending.is_some() || self.engaged {
            return;
        }
        if let Some(target) = target {
            log::debug!("Long-press armed for event {:?}", target.event.id);
            self.pending = Some(PendingPress {
                target,
                origin: pos,
                last: pos,
                deadline: now + self.delay,
            });
        }
    }

    pub fn touch_move(&mut self, pos: Pos2) -> TouchAction {
        if self.engaged {
            return TouchAction::Forward(Self::pointer(PointerPhase::Move, pos));
        }

        if let Some(press) = self.pending.as_mut() {
            let drift = pos - press.origin;
            if drift.x.abs() > self.jitter || drift.y.abs() > self.jitter {
                log::debug!("Long-press cancelled by movement");
                self.pending = None;
            } else {
                press.last = pos;
            }
        }
        TouchAction::Ignored
    }

    pub fn touch_end(&mut self, pos: Pos2) -> TouchAction {
        if self.engaged {
            self.engaged = false;
            return TouchAction::Forward(Self::pointer(PointerPhase::Up, pos));
        }

        match self.pending.take() {
            Some(press) => TouchAction::Tap(press.target),
            None => TouchAction::Ignored,
        }
    }

    pub fn touch_cancel(&mut self, pos: Pos2) -> TouchAction {
        self.pending = None;
        if std::mem::take(&mut self.engaged) {
            TouchAction::Forward(Self::pointer(PointerPhase::Cancel, pos))
        } else {
            TouchAction::Ignored
        }
    }

    /// Fire the long-press if its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<LongPress> {
        let due = self
            .pending
            .as_ref()
            .map_or(false, |press| now >= press.deadline);
        if !due {
            return None;
        }

        let press = self.pending.take()?;
        self.engaged = true;
        log::debug!("Long-press fired for event {:?}", press.target.event.id);
        Some(LongPress {
            target: press.target,
            event: Self::pointer(PointerPhase::Down, press.last),
        })
    }

    /// The machine refused the long-press; stop forwarding this touch.
    pub fn disengage(&mut self) {
        self.engaged = false;
    }

    /// Drop any armed timer and engaged touch (view teardown).
    pub fn reset(&mut self) {
        self.pending = None;
        self.engaged = false;
    }

    fn pointer(phase: PointerPhase, pos: Pos2) -> PointerEvent {
        PointerEvent::new(PointerSource::Touch, phase, pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::session::{BlockGeometry, GestureKind};
    use crate::models::event::ScheduledEvent;
    use chrono::{TimeZone, Utc};

    fn target() -> GestureTarget {
        let event = ScheduledEvent::builder()
            .id(3)
            .title("Gym")
            .start(Utc.with_ymd_and_hms(2025, 3, 10, 7, 0, 0).unwrap())
            .end(Utc.with_ymd_and_hms(2025, 3, 10, 8, 0, 0).unwrap())
            .build()
            .unwrap();
        GestureTarget::new(
            event,
            GestureKind::Move,
            BlockGeometry {
                column: 0,
                top: 420.0,
                height: 60.0,
            },
        )
    }

    fn recognizer() -> TouchGestureRecognizer {
        TouchGestureRecognizer::new(Duration::from_millis(500), 10.0)
    }

    #[test]
    fn test_fires_after_delay() {
        let mut touch = recognizer();
        let start = Instant::now();
        touch.touch_start(Some(target()), Pos2::new(40.0, 440.0), start);

        assert!(touch.poll(start + Duration::from_millis(499)).is_none());
        let press = touch.poll(start + Duration::from_millis(500)).unwrap();

        assert_eq!(press.event.phase, PointerPhase::Down);
        assert_eq!(press.event.source, PointerSource::Touch);
        assert!(touch.is_engaged());
        assert!(!touch.is_waiting());
    }

    #[test]
    fn test_small_jitter_keeps_timer() {
        let mut touch = recognizer();
        let start = Instant::now();
        touch.touch_start(Some(target()), Pos2::new(40.0, 440.0), start);

        assert_eq!(touch.touch_move(Pos2::new(46.0, 432.0)), TouchAction::Ignored);
        let press = touch.poll(start + Duration::from_millis(600)).unwrap();
        assert_eq!(press.event.pos, Pos2::new(46.0, 432.0));
    }

    #[test]
    fn test_movement_cancels_long_press() {
        let mut touch = recognizer();
        let start = Instant::now();
        touch.touch_start(Some(target()), Pos2::new(40.0, 440.0), start);

        touch.touch_move(Pos2::new(40.0, 470.0));
        assert!(!touch.is_waiting());
        assert!(touch.poll(start + Duration::from_secs(1)).is_none());
        assert_eq!(touch.touch_end(Pos2::new(40.0, 470.0)), TouchAction::Ignored);
    }

    #[test]
    fn test_early_release_is_a_tap() {
        let mut touch = recognizer();
        let start = Instant::now();
        touch.touch_start(Some(target()), Pos2::new(40.0, 440.0), start);

        match touch.touch_end(Pos2::new(40.0, 440.0)) {
            TouchAction::Tap(tapped) => assert_eq!(tapped.event.id, Some(3)),
            other => panic!("expected tap, got {other:?}"),
        }
        assert!(touch.next_deadline().is_none());
    }

    #[test]
    fn test_touch_outside_events_does_nothing() {
        let mut touch = recognizer();
        let start = Instant::now();
        touch.touch_start(None, Pos2::ZERO, start);
        assert!(!touch.is_waiting());
        assert!(touch.poll(start + Duration::from_secs(1)).is_none());
    }

    #[test]
    fn test_engaged_touch_is_forwarded() {
        let mut touch = recognizer();
        let start = Instant::now();
        touch.touch_start(Some(target()), Pos2::new(40.0, 440.0), start);
        touch.poll(start + Duration::from_millis(500)).unwrap();

        assert!(matches!(
            touch.touch_move(Pos2::new(140.0, 500.0)),
            TouchAction::Forward(PointerEvent { phase: PointerPhase::Move, .. })
        ));
        assert!(matches!(
            touch.touch_cancel(Pos2::new(140.0, 500.0)),
            TouchAction::Forward(PointerEvent { phase: PointerPhase::Cancel, .. })
        ));
        assert!(!touch.is_engaged());
    }

    #[test]
    fn test_reset_clears_timer() {
        let mut touch = recognizer();
        let start = Instant::now();
        touch.touch_start(Some(target()), Pos2::new(40.0, 440.0), start);
        touch.reset();
        assert!(touch.poll(start + Duration::from_secs(1)).is_none());
    }
}

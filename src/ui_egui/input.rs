//! egui input → gesture engine.
//!
//! egui reports mouse and touch through one event list and also synthesizes
//! pointer events from touches. While a finger is down the synthesized
//! pointer events are ignored and the touch goes through the long-press
//! recognizer instead.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use egui::{Event, Key, Pos2, TouchPhase};

use crate::interaction::capture::InputCapture;
use crate::interaction::input::{MouseAdapter, MouseInput, PointerButton, PointerEvent, PointerPhase};
use crate::interaction::session::GestureTarget;
use crate::interaction::touch::{TouchAction, TouchGestureRecognizer};
use crate::models::settings::InteractionSettings;

/// egui already delivers pointer events outside a widget's rect for the
/// whole window, so "capturing" only records that a gesture owns the
/// pointer; the app uses it to keep scroll areas from stealing drags.
#[derive(Debug, Default)]
pub struct GlobalPointerCapture {
    active: AtomicBool,
}

impl GlobalPointerCapture {
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

impl InputCapture for GlobalPointerCapture {
    fn attach(&self) {
        self.active.store(true, Ordering::SeqCst);
    }

    fn detach(&self) {
        self.active.store(false, Ordering::SeqCst);
    }
}

/// What one raw event means for the gesture machine.
#[derive(Debug, Clone, PartialEq)]
pub enum InputAction {
    /// A press (or fired long-press) on an event block
    Begin {
        target: GestureTarget,
        event: PointerEvent,
    },
    Pointer(PointerEvent),
    /// Touch released before the long-press fired
    Tap(GestureTarget),
    /// Escape, window focus loss
    Cancel,
}

#[derive(Debug)]
pub struct EguiInputAdapter {
    mouse: MouseAdapter,
    touch: TouchGestureRecognizer,
    touch_down: bool,
    last_pos: Pos2,
}

impl EguiInputAdapter {
    pub fn new(settings: &InteractionSettings) -> Self {
        Self {
            mouse: MouseAdapter::new(),
            touch: TouchGestureRecognizer::from_settings(settings),
            touch_down: false,
            last_pos: Pos2::ZERO,
        }
    }

    /// When the next long-press may fire, so the app can schedule a repaint.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.touch.next_deadline()
    }

    /// Call when the machine refused a long-press `Begin`.
    pub fn reject_touch(&mut self) {
        self.touch.disengage();
    }

    pub fn reset(&mut self) {
        self.touch.reset();
        self.touch_down = false;
    }

    /// Translate this frame's events. `hit_test` maps a screen position to
    /// the block (and gesture kind) under it.
    pub fn collect<F>(&mut self, events: &[Event], hit_test: F, now: Instant) -> Vec<InputAction>
    where
        F: Fn(Pos2) -> Option<GestureTarget>,
    {
        let mut actions = Vec::new();

        for event in events {
            match event {
                Event::Touch { phase, pos, .. } => {
                    self.on_touch(*phase, *pos, &hit_test, now, &mut actions);
                }
                Event::PointerButton {
                    pos,
                    button,
                    pressed,
                    ..
                } if !self.touch_down => {
                    self.last_pos = *pos;
                    let button = map_button(*button);
                    let input = if *pressed {
                        MouseInput::Pressed { pos: *pos, button }
                    } else {
                        MouseInput::Released { pos: *pos, button }
                    };
                    if let Some(pointer) = self.mouse.translate(input) {
                        if pointer.phase == PointerPhase::Down {
                            if let Some(target) = hit_test(pointer.pos) {
                                actions.push(InputAction::Begin {
                                    target,
                                    event: pointer,
                                });
                            }
                        } else {
                            actions.push(InputAction::Pointer(pointer));
                        }
                    }
                }
                Event::PointerMoved(pos) if !self.touch_down => {
                    self.last_pos = *pos;
                    if let Some(pointer) = self.mouse.translate(MouseInput::Moved { pos: *pos }) {
                        actions.push(InputAction::Pointer(pointer));
                    }
                }
                Event::PointerGone if !self.touch_down => {
                    if let Some(pointer) = self.mouse.translate(MouseInput::Lost {
                        last_pos: self.last_pos,
                    }) {
                        actions.push(InputAction::Pointer(pointer));
                    }
                }
                Event::WindowFocused(false) => {
                    self.reset();
                    actions.push(InputAction::Cancel);
                }
                Event::Key {
                    key: Key::Escape,
                    pressed: true,
                    ..
                } => actions.push(InputAction::Cancel),
                _ => {}
            }
        }

        if let Some(press) = self.touch.poll(now) {
            actions.push(InputAction::Begin {
                target: press.target,
                event: press.event,
            });
        }

        actions
    }

    fn on_touch<F>(
        &mut self,
        phase: TouchPhase,
        pos: Pos2,
        hit_test: &F,
        now: Instant,
        actions: &mut Vec<InputAction>,
    ) where
        F: Fn(Pos2) -> Option<GestureTarget>,
    {
        let action = match phase {
            TouchPhase::Start => {
                self.touch_down = true;
                self.touch.touch_start(hit_test(pos), pos, now);
                TouchAction::Ignored
            }
            TouchPhase::Move => {
                // A due long-press fires before the movement is judged
                if let Some(press) = self.touch.poll(now) {
                    actions.push(InputAction::Begin {
                        target: press.target,
                        event: press.event,
                    });
                }
                self.touch.touch_move(pos)
            }
            TouchPhase::End => {
                self.touch_down = false;
                self.touch.touch_end(pos)
            }
            TouchPhase::Cancel => {
                self.touch_down = false;
                self.touch.touch_cancel(pos)
            }
        };

        match action {
            TouchAction::Ignored => {}
            TouchAction::Tap(target) => actions.push(InputAction::Tap(target)),
            TouchAction::Forward(pointer) => actions.push(InputAction::Pointer(pointer)),
        }
    }
}

fn map_button(button: egui::PointerButton) -> PointerButton {
    match button {
        egui::PointerButton::Primary => PointerButton::Primary,
        egui::PointerButton::Secondary => PointerButton::Secondary,
        _ => PointerButton::Middle,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::input::PointerSource;
    use crate::interaction::session::{BlockGeometry, GestureKind};
    use crate::models::event::ScheduledEvent;
    use chrono::{TimeZone, Utc};
    use egui::{Modifiers, Rect, TouchDeviceId, TouchId, Vec2};
    use std::time::Duration;

    fn block() -> Rect {
        Rect::from_min_size(Pos2::new(100.0, 600.0), Vec2::new(100.0, 60.0))
    }

    fn hit(pos: Pos2) -> Option<GestureTarget> {
        block().contains(pos).then(|| {
            let event = ScheduledEvent::builder()
                .id(1)
                .title("Block")
                .start(Utc.with_ymd_and_hms(2025, 3, 11, 10, 0, 0).unwrap())
                .end(Utc.with_ymd_and_hms(2025, 3, 11, 11, 0, 0).unwrap())
                .build()
                .unwrap();
            GestureTarget::new(
                event,
                GestureKind::Move,
                BlockGeometry {
                    column: 1,
                    top: 600.0,
                    height: 60.0,
                },
            )
        })
    }

    fn press(pos: Pos2, pressed: bool) -> Event {
        Event::PointerButton {
            pos,
            button: egui::PointerButton::Primary,
            pressed,
            modifiers: Modifiers::NONE,
        }
    }

    fn touch(phase: TouchPhase, pos: Pos2) -> Event {
        Event::Touch {
            device_id: TouchDeviceId(0),
            id: TouchId(0),
            phase,
            pos,
            force: None,
        }
    }

    fn adapter() -> EguiInputAdapter {
        EguiInputAdapter::new(&InteractionSettings::default())
    }

    #[test]
    fn test_mouse_press_on_block_begins() {
        let mut input = adapter();
        let actions = input.collect(&[press(Pos2::new(150.0, 620.0), true)], hit, Instant::now());

        assert!(matches!(
            actions.as_slice(),
            [InputAction::Begin { event, .. }] if event.source == PointerSource::Mouse
        ));
    }

    #[test]
    fn test_mouse_press_on_empty_grid_does_nothing() {
        let mut input = adapter();
        let actions = input.collect(&[press(Pos2::new(10.0, 10.0), true)], hit, Instant::now());
        assert!(actions.is_empty());
    }

    #[test]
    fn test_moves_and_release_are_forwarded() {
        let mut input = adapter();
        let now = Instant::now();
        input.collect(&[press(Pos2::new(150.0, 620.0), true)], hit, now);

        let actions = input.collect(
            &[
                Event::PointerMoved(Pos2::new(160.0, 700.0)),
                press(Pos2::new(160.0, 700.0), false),
            ],
            hit,
            now,
        );
        let phases: Vec<_> = actions
            .iter()
            .filter_map(|a| match a {
                InputAction::Pointer(p) => Some(p.phase),
                _ => None,
            })
            .collect();
        assert_eq!(phases, vec![PointerPhase::Move, PointerPhase::Up]);
    }

    #[test]
    fn test_pointer_gone_cancels_held_button() {
        let mut input = adapter();
        let now = Instant::now();
        input.collect(&[press(Pos2::new(150.0, 620.0), true)], hit, now);

        let actions = input.collect(&[Event::PointerGone], hit, now);
        assert!(matches!(
            actions.as_slice(),
            [InputAction::Pointer(PointerEvent { phase: PointerPhase::Cancel, .. })]
        ));
    }

    #[test]
    fn test_escape_and_focus_loss_cancel() {
        let mut input = adapter();
        let escape = Event::Key {
            key: Key::Escape,
            physical_key: None,
            pressed: true,
            repeat: false,
            modifiers: Modifiers::NONE,
        };
        let actions = input.collect(&[escape, Event::WindowFocused(false)], hit, Instant::now());
        assert_eq!(actions, vec![InputAction::Cancel, InputAction::Cancel]);
    }

    #[test]
    fn test_touch_needs_long_press() {
        let mut input = adapter();
        let start = Instant::now();
        let pos = Pos2::new(150.0, 620.0);

        // egui also synthesizes a pointer press for the touch; it must not begin
        let actions = input.collect(&[touch(TouchPhase::Start, pos), press(pos, true)], hit, start);
        assert!(actions.is_empty());

        let actions = input.collect(&[], hit, start + Duration::from_millis(500));
        assert!(matches!(
            actions.as_slice(),
            [InputAction::Begin { event, .. }] if event.source == PointerSource::Touch
        ));

        let actions = input.collect(
            &[touch(TouchPhase::Move, Pos2::new(150.0, 700.0))],
            hit,
            start + Duration::from_millis(600),
        );
        assert!(matches!(
            actions.as_slice(),
            [InputAction::Pointer(PointerEvent { phase: PointerPhase::Move, .. })]
        ));
    }

    #[test]
    fn test_quick_touch_is_a_tap() {
        let mut input = adapter();
        let start = Instant::now();
        let pos = Pos2::new(150.0, 620.0);

        input.collect(&[touch(TouchPhase::Start, pos)], hit, start);
        let actions = input.collect(
            &[touch(TouchPhase::End, pos), press(pos, false)],
            hit,
            start + Duration::from_millis(100),
        );
        assert!(matches!(actions.as_slice(), [InputAction::Tap(_)]));
    }

    #[test]
    fn test_capture_flag_follows_attach() {
        let capture = GlobalPointerCapture::default();
        capture.attach();
        assert!(capture.is_active());
        capture.detach();
        assert!(!capture.is_active());
    }
}

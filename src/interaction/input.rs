//! The single pointer-event shape the gesture machine consumes.
//!
//! Mouse input maps onto it directly through [`MouseAdapter`]; touch input
//! goes through the long-press gate in [`super::touch`] first.

use egui::Pos2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerSource {
    Mouse,
    Touch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    /// Capture was lost or the gesture was explicitly aborted
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub source: PointerSource,
    pub phase: PointerPhase,
    pub pos: Pos2,
    pub button: PointerButton,
}

impl PointerEvent {
    pub fn new(source: PointerSource, phase: PointerPhase, pos: Pos2) -> Self {
        Self {
            source,
            phase,
            pos,
            button: PointerButton::Primary,
        }
    }

    pub fn with_button(mut self, button: PointerButton) -> Self {
        self.button = button;
        self
    }

    /// Only a primary press may open a session.
    pub fn starts_gesture(&self) -> bool {
        self.phase == PointerPhase::Down && self.button == PointerButton::Primary
    }
}

/// Raw mouse input as a windowing layer reports it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MouseInput {
    Pressed { pos: Pos2, button: PointerButton },
    Moved { pos: Pos2 },
    Released { pos: Pos2, button: PointerButton },
    /// Pointer left the window or capture was taken away
    Lost { last_pos: Pos2 },
}

/// Mouse → pointer adapter. There is no press gate for mice.
#[derive(Debug, Default)]
pub struct MouseAdapter {
    primary_down: bool,
}

impl MouseAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_primary_down(&self) -> bool {
        self.primary_down
    }

    /// Translate one mouse input. Releases of non-primary buttons, and
    /// primary releases without a press we saw, are dropped so they cannot
    /// end a gesture.
    pub fn translate(&mut self, input: MouseInput) -> Option<PointerEvent> {
        match input {
            MouseInput::Pressed { pos, button } => {
                if button == PointerButton::Primary {
                    self.primary_down = true;
                }
                Some(PointerEvent::new(PointerSource::Mouse, PointerPhase::Down, pos).with_button(button))
            }
            MouseInput::Moved { pos } => {
                Some(PointerEvent::new(PointerSource::Mouse, PointerPhase::Move, pos))
            }
            MouseInput::Released { pos, button } => {
                if button != PointerButton::Primary || !self.primary_down {
                    return None;
                }
                self.primary_down = false;
                Some(PointerEvent::new(PointerSource::Mouse, PointerPhase::Up, pos))
            }
            MouseInput::Lost { last_pos } => {
                let was_down = std::mem::take(&mut self.primary_down);
                was_down.then(|| PointerEvent::new(PointerSource::Mouse, PointerPhase::Cancel, last_pos))
            }
        }
    }
}

//! Gesture session records and the projection published to renderers.

use chrono::Duration;
use egui::Pos2;
use serde::Serialize;

use super::input::PointerSource;
use crate::models::event::{ScheduledEvent, TimeRange};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum GestureKind {
    Move,
    /// Dragging the bottom edge; start stays fixed
    ResizeBottom,
}

/// On-screen placement of a block, relative to the top of its day column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BlockGeometry {
    pub column: usize,
    pub top: f32,
    pub height: f32,
}

/// What the renderer hands over when a press lands on an event block.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureTarget {
    pub event: ScheduledEvent,
    pub kind: GestureKind,
    pub origin: BlockGeometry,
}

impl GestureTarget {
    pub fn new(event: ScheduledEvent, kind: GestureKind, origin: BlockGeometry) -> Self {
        Self { event, kind, origin }
    }
}

/// The machine's private record of one in-progress gesture.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureSession {
    pub event_id: i64,
    pub event: ScheduledEvent,
    pub kind: GestureKind,
    pub source: PointerSource,
    pub origin_pointer: Pos2,
    pub origin: BlockGeometry,
    pub has_crossed_threshold: bool,
    pub pointer: Pos2,
    pub target_column: usize,
    pub preview: Option<TimeRange>,
    pub preview_geometry: BlockGeometry,
    pub is_overlapping: bool,
}

impl GestureSession {
    pub fn new(event_id: i64, target: GestureTarget, source: PointerSource, pointer: Pos2) -> Self {
        let origin = target.origin;
        Self {
            event_id,
            kind: target.kind,
            event: target.event,
            source,
            origin_pointer: pointer,
            origin,
            has_crossed_threshold: false,
            pointer,
            target_column: origin.column,
            preview: None,
            preview_geometry: origin,
            is_overlapping: false,
        }
    }

    pub fn original_range(&self) -> TimeRange {
        self.event.time_range()
    }

    pub fn original_duration(&self) -> Duration {
        self.event.duration()
    }

    /// Largest per-axis travel from the press point.
    pub fn travel(&self, pos: Pos2) -> f32 {
        let delta = pos - self.origin_pointer;
        delta.x.abs().max(delta.y.abs())
    }

    pub fn project(&self, phase: DragPhase) -> DragState {
        DragState {
            phase,
            kind: self.kind,
            event_id: self.event_id,
            origin_column: self.origin.column,
            target_column: self.target_column,
            origin: self.origin,
            preview_geometry: self.preview_geometry,
            preview: self.preview,
            is_overlapping: self.is_overlapping,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DragPhase {
    Pending,
    Dragging,
    Resizing,
    /// Released; waiting on the commit collaborator
    Committing,
}

/// Published view of the in-flight gesture, read by every day column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DragState {
    pub phase: DragPhase,
    pub kind: GestureKind,
    pub event_id: i64,
    pub origin_column: usize,
    pub target_column: usize,
    pub origin: BlockGeometry,
    pub preview_geometry: BlockGeometry,
    pub preview: Option<TimeRange>,
    pub is_overlapping: bool,
}

impl DragState {
    pub fn is_pending(&self) -> bool {
        self.phase == DragPhase::Pending
    }

    pub fn is_dragging(&self) -> bool {
        self.phase == DragPhase::Dragging
    }

    pub fn is_resizing(&self) -> bool {
        self.phase == DragPhase::Resizing
    }

    pub fn is_committing(&self) -> bool {
        self.phase == DragPhase::Committing
    }

    /// Whether a ghost should be drawn at all.
    pub fn shows_preview(&self) -> bool {
        !self.is_pending()
    }

    /// Whether `column` should draw the ghost.
    pub fn previews_in_column(&self, column: usize) -> bool {
        self.shows_preview() && self.preview_geometry.column == column
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn target() -> GestureTarget {
        let event = ScheduledEvent::builder()
            .id(4)
            .title("Review")
            .start(Utc.with_ymd_and_hms(2025, 3, 10, 10, 0, 0).unwrap())
            .end(Utc.with_ymd_and_hms(2025, 3, 10, 11, 0, 0).unwrap())
            .build()
            .unwrap();
        GestureTarget::new(
            event,
            GestureKind::Move,
            BlockGeometry {
                column: 2,
                top: 600.0,
                height: 60.0,
            },
        )
    }

    #[test]
    fn test_new_session_starts_at_origin() {
        let session = GestureSession::new(4, target(), PointerSource::Mouse, Pos2::new(250.0, 620.0));
        assert!(!session.has_crossed_threshold);
        assert_eq!(session.target_column, 2);
        assert_eq!(session.preview_geometry, session.origin);
        assert!(session.preview.is_none());
    }

    #[test]
    fn test_travel_uses_largest_axis() {
        let session = GestureSession::new(4, target(), PointerSource::Mouse, Pos2::new(100.0, 100.0));
        assert_eq!(session.travel(Pos2::new(103.0, 96.0)), 4.0);
        assert_eq!(session.travel(Pos2::new(90.0, 101.0)), 10.0);
    }

    #[test]
    fn test_pending_projection_has_no_ghost() {
        let session = GestureSession::new(4, target(), PointerSource::Touch, Pos2::ZERO);
        let state = session.project(DragPhase::Pending);
        assert!(state.is_pending());
        assert!(!state.previews_in_column(2));

        let state = session.project(DragPhase::Dragging);
        assert!(state.is_dragging());
        assert!(state.previews_in_column(2));
        assert!(!state.previews_in_column(3));
    }

    #[test]
    fn test_projection_serializes_for_inspection() {
        let session = GestureSession::new(4, target(), PointerSource::Mouse, Pos2::ZERO);
        let json = serde_json::to_value(session.project(DragPhase::Resizing)).unwrap();
        assert_eq!(json["phase"], "resizing");
        assert_eq!(json["kind"], "move");
        assert_eq!(json["event_id"], 4);
    }
}

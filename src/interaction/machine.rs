//! The gesture state machine.
//!
//! ```text
//! idle ──down──▶ pending ──threshold──▶ dragging | resizing ──up──▶ committing ──report──▶ idle
//!                   │ up (no threshold) → click                │ cancel
//!                   └ cancel ──────────────────────────────────┴──────────────────────────▶ idle
//! ```
//!
//! [`transition`] is a pure function from `(state, input)` to the next state
//! and a list of [`Effect`]s. [`GestureStateMachine`] owns the state and
//! carries the effects out: listener capture, store publishes, snap-back
//! and cooldown bookkeeping. Outcomes that need the host (click dispatch,
//! commit) are returned to the caller.

use std::sync::Arc;
use std::time::Instant;

use chrono::Duration;

use super::capture::{CaptureGuard, InputCapture};
use super::commit::{CommitReport, CommitRequest};
use super::input::{PointerEvent, PointerPhase};
use super::overlap::has_overlap;
use super::position::{
    clamp_to_surface, compute_time_range, local_minute_of_day, minutes_to_offset,
    resolve_column_index, snap_duration_minutes, snap_to_interval, GridGeometry, MINUTES_PER_DAY,
};
use super::session::{BlockGeometry, DragPhase, DragState, GestureKind, GestureSession, GestureTarget};
use super::snap_back::SnapBackAnimation;
use super::source::EventSource;
use super::store::{DragSessionStore, DragSessionWriter};
use super::timezone::TimezoneConverter;
use crate::models::event::{ScheduledEvent, TimeRange};
use crate::models::settings::InteractionSettings;

/// A session plus the context it was started with.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveGesture {
    pub session: GestureSession,
    pub geometry: GridGeometry,
    pub visible: Vec<ScheduledEvent>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum MachineState {
    #[default]
    Idle,
    Pending(Box<ActiveGesture>),
    Dragging(Box<ActiveGesture>),
    Resizing(Box<ActiveGesture>),
    Committing(Box<CommitRequest>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MachinePhase {
    Idle,
    Pending,
    Dragging,
    Resizing,
    Committing,
}

impl MachineState {
    pub fn phase(&self) -> MachinePhase {
        match self {
            MachineState::Idle => MachinePhase::Idle,
            MachineState::Pending(_) => MachinePhase::Pending,
            MachineState::Dragging(_) => MachinePhase::Dragging,
            MachineState::Resizing(_) => MachinePhase::Resizing,
            MachineState::Committing(_) => MachinePhase::Committing,
        }
    }

    pub fn session(&self) -> Option<&GestureSession> {
        match self {
            MachineState::Pending(active)
            | MachineState::Dragging(active)
            | MachineState::Resizing(active) => Some(&active.session),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MachineInput {
    Begin {
        target: GestureTarget,
        pointer: PointerEvent,
        geometry: GridGeometry,
        visible: Vec<ScheduledEvent>,
    },
    Pointer(PointerEvent),
    Cancel,
    CommitResolved(CommitReport),
}

/// What the host must do after a gesture ends.
#[derive(Debug, Clone, PartialEq)]
pub enum GestureOutcome {
    /// Released without crossing the threshold
    Click(ScheduledEvent),
    /// Released after moving; run it through the commit pipeline and hand
    /// the report back with [`GestureStateMachine::complete_commit`]
    Commit(CommitRequest),
    Cancelled { event_id: i64 },
    /// Moved but dropped back onto its original slot
    Unchanged { event_id: i64 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    AcquireCapture,
    ReleaseCapture,
    Publish(Option<DragState>),
    SnapBack {
        event_id: i64,
        from: BlockGeometry,
        to: BlockGeometry,
    },
    MarkCompleted(i64),
    Emit(GestureOutcome),
}

pub struct TransitionEnv<'a> {
    pub settings: &'a InteractionSettings,
    pub converter: &'a dyn TimezoneConverter,
}

pub fn transition(
    state: MachineState,
    input: MachineInput,
    env: &TransitionEnv<'_>,
) -> (MachineState, Vec<Effect>) {
    match (state, input) {
        (
            MachineState::Idle,
            MachineInput::Begin {
                target,
                pointer,
                geometry,
                visible,
            },
        ) => begin(target, pointer, geometry, visible),

        (state, MachineInput::Begin { target, .. }) => {
            log::warn!(
                "Ignoring press on event {:?}: a gesture is already {:?}",
                target.event.id,
                state.phase()
            );
            (state, Vec::new())
        }

        (MachineState::Pending(active), MachineInput::Pointer(event)) => {
            on_pending_pointer(active, event, env)
        }

        (MachineState::Dragging(active), MachineInput::Pointer(event))
        | (MachineState::Resizing(active), MachineInput::Pointer(event)) => {
            on_active_pointer(active, event, env)
        }

        (MachineState::Pending(active), MachineInput::Cancel)
        | (MachineState::Dragging(active), MachineInput::Cancel)
        | (MachineState::Resizing(active), MachineInput::Cancel) => cancel(&active),

        (MachineState::Committing(request), MachineInput::CommitResolved(report)) => {
            if report.event_id != request.event_id {
                log::warn!(
                    "Commit report for event {} does not match pending event {}",
                    report.event_id,
                    request.event_id
                );
                return (MachineState::Committing(request), Vec::new());
            }
            resolve_commit(&request, &report)
        }

        (state, _) => (state, Vec::new()),
    }
}

fn begin(
    target: GestureTarget,
    pointer: PointerEvent,
    geometry: GridGeometry,
    visible: Vec<ScheduledEvent>,
) -> (MachineState, Vec<Effect>) {
    if !pointer.starts_gesture() {
        return (MachineState::Idle, Vec::new());
    }

    let Some(event_id) = target.event.id else {
        log::warn!("Cannot drag unsaved event '{}'", target.event.title);
        return (MachineState::Idle, Vec::new());
    };

    let session = GestureSession::new(event_id, target, pointer.source, pointer.pos);
    log::debug!(
        "Gesture pending on event {} ({:?}, {:?})",
        event_id,
        session.kind,
        session.source
    );
    let projection = session.project(DragPhase::Pending);
    let active = ActiveGesture {
        session,
        geometry,
        visible,
    };

    (
        MachineState::Pending(Box::new(active)),
        vec![Effect::AcquireCapture, Effect::Publish(Some(projection))],
    )
}

fn on_pending_pointer(
    mut active: Box<ActiveGesture>,
    event: PointerEvent,
    env: &TransitionEnv<'_>,
) -> (MachineState, Vec<Effect>) {
    match event.phase {
        PointerPhase::Move => {
            active.session.pointer = event.pos;
            if active.session.travel(event.pos) < env.settings.drag_threshold_px {
                return (MachineState::Pending(active), Vec::new());
            }

            active.session.has_crossed_threshold = true;
            update_projection(&mut active, env);

            let phase = active_phase(active.session.kind);
            log::debug!(
                "Event {} crossed drag threshold, now {:?}",
                active.session.event_id,
                phase
            );
            let projection = active.session.project(phase);
            (wrap_active(phase, active), vec![Effect::Publish(Some(projection))])
        }
        PointerPhase::Up => {
            log::debug!("Event {} released without movement", active.session.event_id);
            (
                MachineState::Idle,
                vec![
                    Effect::ReleaseCapture,
                    Effect::Publish(None),
                    Effect::Emit(GestureOutcome::Click(active.session.event.clone())),
                ],
            )
        }
        PointerPhase::Cancel => cancel(&active),
        PointerPhase::Down => (MachineState::Pending(active), Vec::new()),
    }
}

fn on_active_pointer(
    mut active: Box<ActiveGesture>,
    event: PointerEvent,
    env: &TransitionEnv<'_>,
) -> (MachineState, Vec<Effect>) {
    let phase = active_phase(active.session.kind);

    match event.phase {
        PointerPhase::Move => {
            active.session.pointer = event.pos;
            update_projection(&mut active, env);
            let projection = active.session.project(phase);
            (wrap_active(phase, active), vec![Effect::Publish(Some(projection))])
        }
        PointerPhase::Up => {
            active.session.pointer = event.pos;
            update_projection(&mut active, env);
            finish(active)
        }
        PointerPhase::Cancel => cancel(&active),
        PointerPhase::Down => (wrap_active(phase, active), Vec::new()),
    }
}

fn active_phase(kind: GestureKind) -> DragPhase {
    match kind {
        GestureKind::Move => DragPhase::Dragging,
        GestureKind::ResizeBottom => DragPhase::Resizing,
    }
}

fn wrap_active(phase: DragPhase, active: Box<ActiveGesture>) -> MachineState {
    match phase {
        DragPhase::Resizing => MachineState::Resizing(active),
        _ => MachineState::Dragging(active),
    }
}

fn finish(active: Box<ActiveGesture>) -> (MachineState, Vec<Effect>) {
    let ActiveGesture {
        session, visible, ..
    } = *active;
    let event_id = session.event_id;

    let Some(candidate) = session.preview else {
        log::warn!("Event {} released over a slot with no valid time", event_id);
        return (
            MachineState::Idle,
            vec![
                Effect::ReleaseCapture,
                Effect::Publish(None),
                Effect::Emit(GestureOutcome::Cancelled { event_id }),
            ],
        );
    };

    if candidate == session.original_range() {
        return (
            MachineState::Idle,
            vec![
                Effect::ReleaseCapture,
                Effect::Publish(None),
                Effect::Emit(GestureOutcome::Unchanged { event_id }),
            ],
        );
    }

    let projection = session.project(DragPhase::Committing);
    let request = CommitRequest {
        event_id,
        kind: session.kind,
        candidate,
        origin: session.origin,
        preview_geometry: session.preview_geometry,
        event: session.event,
        visible,
    };

    (
        MachineState::Committing(Box::new(request.clone())),
        vec![
            Effect::ReleaseCapture,
            Effect::Publish(Some(projection)),
            Effect::Emit(GestureOutcome::Commit(request)),
        ],
    )
}

fn cancel(active: &ActiveGesture) -> (MachineState, Vec<Effect>) {
    let event_id = active.session.event_id;
    log::debug!("Gesture on event {} cancelled", event_id);
    (
        MachineState::Idle,
        vec![
            Effect::ReleaseCapture,
            Effect::Publish(None),
            Effect::Emit(GestureOutcome::Cancelled { event_id }),
        ],
    )
}

fn resolve_commit(request: &CommitRequest, report: &CommitReport) -> (MachineState, Vec<Effect>) {
    let mut effects = Vec::with_capacity(3);
    if report.resolution.needs_snap_back() {
        effects.push(Effect::SnapBack {
            event_id: request.event_id,
            from: request.preview_geometry,
            to: request.origin,
        });
    }
    if report.resolution.is_success() {
        effects.push(Effect::MarkCompleted(request.event_id));
    }
    effects.push(Effect::Publish(None));
    (MachineState::Idle, effects)
}

/// Recompute target column, snapped range and overlap from the current
/// pointer position.
fn update_projection(active: &mut ActiveGesture, env: &TransitionEnv<'_>) {
    let ActiveGesture {
        session,
        geometry,
        visible,
    } = active;
    let settings = env.settings;
    let pos = clamp_to_surface(session.pointer, geometry.surface);
    let dy = pos.y - session.origin_pointer.y;

    let preview = match session.kind {
        GestureKind::Move => {
            let column = resolve_column_index(
                pos.x - geometry.surface.left(),
                session.origin.column,
                geometry.column_width,
                geometry.column_count(),
                session.has_crossed_threshold,
            );
            let snapped = snap_to_interval(
                session.origin.top + dy,
                geometry.hour_height,
                settings.snap_minutes,
            );

            session.target_column = column;
            session.preview_geometry = BlockGeometry {
                column,
                top: snapped.offset,
                height: session.origin.height,
            };

            geometry.column_date(column).and_then(|date| {
                compute_time_range(
                    session.original_duration(),
                    snapped.hour,
                    snapped.minute,
                    date,
                    &geometry.timezone,
                    env.converter,
                )
            })
        }
        GestureKind::ResizeBottom => {
            // The rendered block is clipped at midnight, so size from the
            // stored duration rather than origin.height
            let original = session.original_duration().num_minutes();
            let day_left =
                MINUTES_PER_DAY - local_minute_of_day(session.event.start, &geometry.timezone);
            let snapped = snap_duration_minutes(
                minutes_to_offset(original, geometry.hour_height) + dy,
                geometry.hour_height,
                settings.snap_minutes,
                settings.min_duration_minutes,
                day_left.max(original),
            );
            // Dragging the edge down never shortens the event
            let minutes = if dy >= 0.0 { snapped.max(original) } else { snapped };

            session.target_column = session.origin.column;
            session.preview_geometry = BlockGeometry {
                column: session.origin.column,
                top: session.origin.top,
                height: minutes_to_offset(minutes.min(day_left.max(0)), geometry.hour_height),
            };

            let start = session.event.start;
            Some(TimeRange::new(start, start + Duration::minutes(minutes)))
        }
    };

    match preview {
        Some(range) => {
            session.preview = Some(range);
            session.is_overlapping =
                has_overlap(range.start, range.end, Some(session.event_id), visible);
        }
        None => log::warn!(
            "No valid instant under the pointer for event {}, keeping last preview",
            session.event_id
        ),
    }
}

/// Owns the current [`MachineState`] and executes transition effects.
pub struct GestureStateMachine {
    state: MachineState,
    settings: InteractionSettings,
    converter: Arc<dyn TimezoneConverter>,
    capture: Arc<dyn InputCapture>,
    guard: Option<CaptureGuard>,
    writer: DragSessionWriter,
}

impl GestureStateMachine {
    pub fn new(
        settings: InteractionSettings,
        store: &DragSessionStore,
        converter: Arc<dyn TimezoneConverter>,
        capture: Arc<dyn InputCapture>,
    ) -> Self {
        Self {
            state: MachineState::Idle,
            settings,
            converter,
            capture,
            guard: None,
            writer: store.writer(),
        }
    }

    pub fn phase(&self) -> MachinePhase {
        self.state.phase()
    }

    pub fn is_idle(&self) -> bool {
        self.phase() == MachinePhase::Idle
    }

    pub fn state(&self) -> &MachineState {
        &self.state
    }

    pub fn session(&self) -> Option<&GestureSession> {
        self.state.session()
    }

    pub fn settings(&self) -> &InteractionSettings {
        &self.settings
    }

    pub fn store(&self) -> &DragSessionStore {
        self.writer.store()
    }

    /// Start a session for a primary press (or fired long-press) on
    /// `target`. Returns false if the press was not accepted, including
    /// when another gesture has not yet returned to idle.
    pub fn begin(
        &mut self,
        target: GestureTarget,
        pointer: PointerEvent,
        geometry: GridGeometry,
        events: &dyn EventSource,
    ) -> bool {
        if !self.is_idle() {
            log::warn!(
                "Press on event {:?} ignored while a gesture is {:?}",
                target.event.id,
                self.phase()
            );
            return false;
        }

        let visible = if geometry.is_multi_column() {
            events.visible_items()
        } else {
            match geometry.column_date(target.origin.column) {
                Some(date) => events.items_for_day(date),
                None => events.visible_items(),
            }
        };

        self.apply(
            MachineInput::Begin {
                target,
                pointer,
                geometry,
                visible,
            },
            Instant::now(),
        );
        self.phase() == MachinePhase::Pending
    }

    pub fn handle(&mut self, event: PointerEvent) -> Option<GestureOutcome> {
        self.apply(MachineInput::Pointer(event), Instant::now())
    }

    /// Abort the current gesture (Escape, lost capture, focus loss).
    pub fn cancel(&mut self) -> Option<GestureOutcome> {
        self.apply(MachineInput::Cancel, Instant::now())
    }

    /// Feed back the pipeline's report for the gesture in `committing`.
    pub fn complete_commit(&mut self, report: CommitReport, now: Instant) {
        self.apply(MachineInput::CommitResolved(report), now);
    }

    fn apply(&mut self, input: MachineInput, now: Instant) -> Option<GestureOutcome> {
        let state = std::mem::take(&mut self.state);
        let env = TransitionEnv {
            settings: &self.settings,
            converter: self.converter.as_ref(),
        };
        let (next, effects) = transition(state, input, &env);
        self.state = next;

        let mut outcome = None;
        for effect in effects {
            match effect {
                Effect::AcquireCapture => {
                    self.guard = Some(CaptureGuard::acquire(Arc::clone(&self.capture)));
                }
                Effect::ReleaseCapture => self.guard = None,
                Effect::Publish(state) => self.writer.publish(state),
                Effect::SnapBack { event_id, from, to } => {
                    self.writer.start_snap_back(SnapBackAnimation::new(
                        event_id,
                        from,
                        to,
                        now,
                        self.settings.snap_back_duration(),
                    ));
                }
                Effect::MarkCompleted(event_id) => {
                    self.writer
                        .mark_completed(event_id, now, self.settings.completion_cooldown());
                }
                Effect::Emit(emitted) => outcome = Some(emitted),
            }
        }
        outcome
    }
}

impl Drop for GestureStateMachine {
    fn drop(&mut self) {
        if !self.is_idle() {
            log::debug!("Gesture machine torn down mid-gesture, clearing drag store");
            self.writer.publish(None);
        }
    }
}

impl std::fmt::Debug for GestureStateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GestureStateMachine")
            .field("phase", &self.phase())
            .field("capturing", &self.guard.is_some())
            .finish()
    }
}

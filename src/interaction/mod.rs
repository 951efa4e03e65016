//! Drag and resize engine for timed items on a day/week grid.
//!
//! Renderers hand pointer input to a [`GestureStateMachine`], read the
//! published [`DragState`] from the [`DragSessionStore`], and run finished
//! gestures through a [`CommitPipeline`].

pub mod capture;
pub mod commit;
pub mod input;
pub mod machine;
pub mod overlap;
pub mod position;
pub mod session;
pub mod snap_back;
pub mod source;
pub mod store;
pub mod timezone;
pub mod touch;

pub use capture::{CaptureGuard, InputCapture, NoCapture};
pub use commit::{
    CommitAck, CommitError, CommitPipeline, CommitReport, CommitRequest, CommitResolution,
    EventCommitter, FeedbackSink, NoFeedback, UndoRecord,
};
pub use input::{MouseAdapter, MouseInput, PointerButton, PointerEvent, PointerPhase, PointerSource};
pub use machine::{GestureOutcome, GestureStateMachine, MachinePhase};
pub use overlap::{first_overlap, has_overlap};
pub use position::GridGeometry;
pub use session::{BlockGeometry, DragPhase, DragState, GestureKind, GestureTarget};
pub use snap_back::{SnapBackAnimation, SnapBackFrame};
pub use source::{EventSource, VisibleEventSet};
pub use store::{DragSessionStore, DragSnapshot, SubscriptionId};
pub use timezone::{ChronoTzConverter, TimezoneConverter};
pub use touch::{LongPress, TouchAction, TouchGestureRecognizer};

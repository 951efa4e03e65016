//! Turning a finished gesture into a committed (or rolled back) move.
//!
//! The pipeline runs the local overlap pre-check, calls the external
//! [`EventCommitter`] with a bounded wait, and reports what happened. It
//! never touches the drag store; the gesture machine applies the report.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use super::overlap::first_overlap;
use super::session::{BlockGeometry, GestureKind};
use crate::models::event::{ScheduledEvent, TimeRange};

/// Successful answers from the commit collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitAck {
    Applied,
    /// The collaborator opened its own confirmation flow (for example a
    /// recurring-series scope prompt) and owns the follow-up.
    Deferred,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommitError {
    #[error("the new time overlaps another event")]
    Overlap { conflicting_id: Option<i64> },
    #[error("move rejected: {0}")]
    Conflict(String),
    #[error("could not save the move: {0}")]
    Failed(String),
    #[error("saving the move did not finish within {0:?}")]
    TimedOut(Duration),
}

impl CommitError {
    /// Overlap rejections are expected and never shown as an error toast.
    pub fn is_overlap(&self) -> bool {
        matches!(self, CommitError::Overlap { .. })
    }
}

/// The persistent side of a move: `commit_move(event_id, range)`.
pub trait EventCommitter: Send + Sync {
    fn commit_move(
        &self,
        event_id: i64,
        range: TimeRange,
    ) -> impl Future<Output = Result<CommitAck, CommitError>> + Send;
}

/// Optional user feedback (toasts, haptics). Has no effect on outcomes.
#[cfg_attr(test, mockall::automock)]
pub trait FeedbackSink: Send + Sync {
    /// The move was refused because it would overlap another item.
    fn overlap_blocked(&self, event_id: i64);
    /// The move was saved; `undo` can put it back.
    fn committed(&self, undo: &UndoRecord);
    /// The move failed for a reason other than overlap.
    fn failed(&self, event_id: i64, message: &str);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoFeedback;

impl FeedbackSink for NoFeedback {
    fn overlap_blocked(&self, _event_id: i64) {}
    fn committed(&self, _undo: &UndoRecord) {}
    fn failed(&self, _event_id: i64, _message: &str) {}
}

/// Enough to reverse a committed move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UndoRecord {
    pub event_id: i64,
    pub previous: TimeRange,
    pub applied: TimeRange,
}

/// A released gesture that moved its event, ready to commit.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitRequest {
    pub event_id: i64,
    pub event: ScheduledEvent,
    pub kind: GestureKind,
    pub candidate: TimeRange,
    /// Items the candidate must not overlap (excluding the event itself)
    pub visible: Vec<ScheduledEvent>,
    pub origin: BlockGeometry,
    pub preview_geometry: BlockGeometry,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommitResolution {
    Committed(UndoRecord),
    Deferred,
    /// Blocked by the local pre-check; the collaborator was never called
    LocalOverlap,
    Rejected(CommitError),
}

impl CommitResolution {
    pub fn needs_snap_back(&self) -> bool {
        matches!(
            self,
            CommitResolution::LocalOverlap | CommitResolution::Rejected(_)
        )
    }

    /// Committed or handed off; either way the gesture is done.
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            CommitResolution::Committed(_) | CommitResolution::Deferred
        )
    }

    pub fn undo(&self) -> Option<&UndoRecord> {
        match self {
            CommitResolution::Committed(undo) => Some(undo),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommitReport {
    pub event_id: i64,
    pub resolution: CommitResolution,
}

pub struct CommitPipeline<C> {
    committer: Arc<C>,
    feedback: Arc<dyn FeedbackSink>,
    timeout: Duration,
}

impl<C: EventCommitter> CommitPipeline<C> {
    pub fn new(committer: Arc<C>, feedback: Arc<dyn FeedbackSink>, timeout: Duration) -> Self {
        Self {
            committer,
            feedback,
            timeout,
        }
    }

    pub fn committer(&self) -> &Arc<C> {
        &self.committer
    }

    /// Finalize a released gesture. Every collaborator failure is folded
    /// into the report; nothing propagates to the caller.
    pub async fn run(&self, request: CommitRequest) -> CommitReport {
        let event_id = request.event_id;
        let candidate = request.candidate;

        if let Some(blocker) = first_overlap(
            candidate.start,
            candidate.end,
            Some(event_id),
            &request.visible,
        ) {
            log::warn!(
                "Move of event {} to {} blocked locally by event {:?}",
                event_id,
                candidate.start,
                blocker.id
            );
            self.feedback.overlap_blocked(event_id);
            return CommitReport {
                event_id,
                resolution: CommitResolution::LocalOverlap,
            };
        }

        let resolution = match self.dispatch(event_id, candidate).await {
            Ok(CommitAck::Applied) => {
                let undo = UndoRecord {
                    event_id,
                    previous: request.event.time_range(),
                    applied: candidate,
                };
                log::info!(
                    "Moved event {} to {} - {}",
                    event_id,
                    candidate.start,
                    candidate.end
                );
                self.feedback.committed(&undo);
                CommitResolution::Committed(undo)
            }
            Ok(CommitAck::Deferred) => {
                log::info!("Move of event {} handed to confirmation flow", event_id);
                CommitResolution::Deferred
            }
            Err(err) if err.is_overlap() => {
                log::warn!("Move of event {} rejected: {}", event_id, err);
                self.feedback.overlap_blocked(event_id);
                CommitResolution::Rejected(err)
            }
            Err(err) => {
                log::error!("Failed to move event {}: {}", event_id, err);
                self.feedback.failed(event_id, &err.to_string());
                CommitResolution::Rejected(err)
            }
        };

        CommitReport {
            event_id,
            resolution,
        }
    }

    /// Put a committed move back where it was.
    pub async fn undo(&self, record: &UndoRecord) -> Result<CommitAck, CommitError> {
        let result = self.dispatch(record.event_id, record.previous).await;
        if let Err(err) = &result {
            log::error!("Failed to undo move of event {}: {}", record.event_id, err);
            self.feedback.failed(record.event_id, &err.to_string());
        }
        result
    }

    async fn dispatch(&self, event_id: i64, range: TimeRange) -> Result<CommitAck, CommitError> {
        match tokio::time::timeout(self.timeout, self.committer.commit_move(event_id, range)).await {
            Ok(result) => result,
            Err(_) => {
                log::warn!(
                    "Commit for event {} still pending after {:?}, rolling back",
                    event_id,
                    self.timeout
                );
                Err(CommitError::TimedOut(self.timeout))
            }
        }
    }
}

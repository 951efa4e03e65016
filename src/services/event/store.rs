//! SQLite-backed commit collaborator for the drag engine.
//!
//! Moves are validated against the whole table before anything is written.
//! A move of a recurring event is parked as a [`PendingConfirmation`] and
//! reported as deferred; the UI later confirms or dismisses it.

use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, Result};

use super::{EventService, MoveOutcome};
use crate::interaction::commit::{CommitAck, CommitError, EventCommitter, UndoRecord};
use crate::interaction::source::VisibleEventSet;
use crate::models::event::{ScheduledEvent, TimeRange};
use crate::services::database::Database;

/// A recurring-series move waiting for the user to pick a scope.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingConfirmation {
    pub event_id: i64,
    pub title: String,
    pub previous: TimeRange,
    pub requested: TimeRange,
}

pub struct SqliteEventStore {
    db: Mutex<Database>,
    pending: Mutex<Vec<PendingConfirmation>>,
}

impl SqliteEventStore {
    pub fn new(db: Database) -> Self {
        Self {
            db: Mutex::new(db),
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Open the database at `path` and make sure the schema exists.
    pub fn open(path: &str) -> Result<Self> {
        let db = Database::new(path)?;
        db.initialize_schema()?;
        Ok(Self::new(db))
    }

    fn lock_db(&self) -> Result<MutexGuard<'_, Database>> {
        self.db.lock().map_err(|_| anyhow!("Database lock poisoned"))
    }

    fn lock_pending(&self) -> MutexGuard<'_, Vec<PendingConfirmation>> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run `f` with an [`EventService`] over the shared connection.
    pub fn with_service<T>(&self, f: impl FnOnce(&EventService<'_>) -> Result<T>) -> Result<T> {
        let db = self.lock_db()?;
        let service = EventService::new(db.connection());
        f(&service)
    }

    pub fn create(&self, event: ScheduledEvent) -> Result<ScheduledEvent> {
        self.with_service(|service| service.create(event))
    }

    pub fn get(&self, id: i64) -> Result<Option<ScheduledEvent>> {
        self.with_service(|service| service.get(id))
    }

    /// Items a view shows for `range`, grouped into days in `timezone`.
    pub fn load_visible(&self, range: TimeRange, timezone: &str) -> Result<VisibleEventSet> {
        let items = self.with_service(|service| service.find_by_date_range(range))?;
        Ok(VisibleEventSet::new(items, timezone))
    }

    /// Oldest move still waiting for confirmation.
    pub fn pending_confirmation(&self) -> Option<PendingConfirmation> {
        self.lock_pending().first().cloned()
    }

    pub fn has_pending_confirmation(&self) -> bool {
        !self.lock_pending().is_empty()
    }

    /// Apply the parked move for `event_id` to the whole series.
    pub fn confirm_pending(&self, event_id: i64) -> std::result::Result<UndoRecord, CommitError> {
        let pending = self.take_pending(event_id).ok_or_else(|| {
            CommitError::Conflict(format!("no pending move for event {}", event_id))
        })?;

        let outcome = self
            .with_service(|service| service.confirm_move(event_id, pending.requested))
            .map_err(|e| CommitError::Failed(format!("{:#}", e)))?;

        match outcome {
            MoveOutcome::Applied(_) => {
                log::info!("Moved recurring event {} after confirmation", event_id);
                Ok(UndoRecord {
                    event_id,
                    previous: pending.previous,
                    applied: pending.requested,
                })
            }
            MoveOutcome::Overlap { conflicting_id } => {
                log::warn!("Confirmed move of event {} now overlaps", event_id);
                Err(CommitError::Overlap { conflicting_id })
            }
            MoveOutcome::RequiresConfirmation(_) => Err(CommitError::Conflict(
                "series move still requires confirmation".to_string(),
            )),
        }
    }

    /// Drop the parked move for `event_id` without touching the database.
    pub fn dismiss_pending(&self, event_id: i64) -> bool {
        let dismissed = self.take_pending(event_id).is_some();
        if dismissed {
            log::info!("Recurring move of event {} dismissed", event_id);
        }
        dismissed
    }

    fn take_pending(&self, event_id: i64) -> Option<PendingConfirmation> {
        let mut pending = self.lock_pending();
        let index = pending.iter().position(|p| p.event_id == event_id)?;
        Some(pending.remove(index))
    }

    fn park(&self, event: &ScheduledEvent, previous: TimeRange, requested: TimeRange) {
        let Some(event_id) = event.id else {
            return;
        };
        let mut pending = self.lock_pending();
        // A newer drag of the same series replaces the older request
        pending.retain(|p| p.event_id != event_id);
        pending.push(PendingConfirmation {
            event_id,
            title: event.title.clone(),
            previous,
            requested,
        });
    }

    fn try_move(&self, event_id: i64, range: TimeRange) -> std::result::Result<CommitAck, CommitError> {
        let (previous, outcome) = self
            .with_service(|service| {
                let previous = service.get(event_id)?.map(|e| e.time_range());
                let outcome = service.move_event(event_id, range)?;
                Ok((previous, outcome))
            })
            .map_err(|e| CommitError::Failed(format!("{:#}", e)))?;

        match outcome {
            MoveOutcome::Applied(_) => Ok(CommitAck::Applied),
            MoveOutcome::Overlap { conflicting_id } => Err(CommitError::Overlap { conflicting_id }),
            MoveOutcome::RequiresConfirmation(event) => {
                let previous = previous.unwrap_or_else(|| event.time_range());
                self.park(&event, previous, range);
                log::info!(
                    "Move of recurring event {} waiting for confirmation",
                    event_id
                );
                Ok(CommitAck::Deferred)
            }
        }
    }
}

impl EventCommitter for SqliteEventStore {
    async fn commit_move(
        &self,
        event_id: i64,
        range: TimeRange,
    ) -> std::result::Result<CommitAck, CommitError> {
        self.try_move(event_id, range)
    }
}

impl std::fmt::Debug for SqliteEventStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteEventStore")
            .field("pending", &self.lock_pending().len())
            .finish()
    }
}

use super::EventService;
use crate::models::event::{ScheduledEvent, TimeRange};
use anyhow::{anyhow, Result};

/// Result of asking the store to move an event to a new time range.
#[derive(Debug, Clone, PartialEq)]
pub enum MoveOutcome {
    Applied(ScheduledEvent),
    /// Another stored event occupies part of the range; nothing was written
    Overlap { conflicting_id: Option<i64> },
    /// The event repeats; the caller must confirm before the series moves
    RequiresConfirmation(ScheduledEvent),
}

impl<'a> EventService<'a> {
    /// Validate and apply a move. Overlap is checked against every stored
    /// event, not just the ones a view happens to show.
    pub fn move_event(&self, id: i64, range: TimeRange) -> Result<MoveOutcome> {
        let event = self.load_for_move(id, range)?;

        if let Some(conflict) = self.find_overlapping(range, Some(id))? {
            log::warn!(
                "Move of event {} rejected: overlaps event {:?}",
                id,
                conflict.id
            );
            return Ok(MoveOutcome::Overlap {
                conflicting_id: conflict.id,
            });
        }

        if event.is_recurring() {
            return Ok(MoveOutcome::RequiresConfirmation(event.with_range(range)));
        }

        self.update_times(id, range)?;
        Ok(MoveOutcome::Applied(event.with_range(range)))
    }

    /// Apply a move the user confirmed for a recurring series. Overlap is
    /// re-checked because the store may have changed while the prompt was
    /// open.
    pub fn confirm_move(&self, id: i64, range: TimeRange) -> Result<MoveOutcome> {
        let event = self.load_for_move(id, range)?;

        if let Some(conflict) = self.find_overlapping(range, Some(id))? {
            return Ok(MoveOutcome::Overlap {
                conflicting_id: conflict.id,
            });
        }

        self.update_times(id, range)?;
        Ok(MoveOutcome::Applied(event.with_range(range)))
    }

    fn load_for_move(&self, id: i64, range: TimeRange) -> Result<ScheduledEvent> {
        if range.end <= range.start {
            return Err(anyhow!("Event end time must be after start time"));
        }
        self.get(id)?
            .ok_or_else(|| anyhow!("Event with id {} not found", id))
    }
}

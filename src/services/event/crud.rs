use super::shared::{format_instant, map_event_row, EVENT_COLUMNS};
use super::EventService;
use crate::models::event::{ScheduledEvent, TimeRange};
use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use rusqlite::{self, params};

impl<'a> EventService<'a> {
    /// Create a new event in the database.
    pub fn create(&self, mut event: ScheduledEvent) -> Result<ScheduledEvent> {
        event.validate().map_err(|e| anyhow!(e))?;

        let now = format_instant(Utc::now());
        self.conn
            .execute(
                "INSERT INTO events (
                    title, kind, start_datetime, end_datetime, recurrence_rule,
                    created_at, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?)",
                params![
                    event.title,
                    event.kind.as_str(),
                    format_instant(event.start),
                    format_instant(event.end),
                    event.recurrence_rule,
                    &now,
                    &now,
                ],
            )
            .context("Failed to insert event")?;

        event.id = Some(self.conn.last_insert_rowid());
        Ok(event)
    }

    /// Retrieve an event by ID.
    pub fn get(&self, id: i64) -> Result<Option<ScheduledEvent>> {
        let sql = format!("SELECT {} FROM events WHERE id = ?", EVENT_COLUMNS);
        match self.conn.query_row(&sql, [id], map_event_row) {
            Ok(event) => Ok(Some(event)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Overwrite the start and end of an event, leaving everything else.
    pub fn update_times(&self, id: i64, range: TimeRange) -> Result<()> {
        if range.end <= range.start {
            return Err(anyhow!("Event end time must be after start time"));
        }

        let rows_affected = self
            .conn
            .execute(
                "UPDATE events SET start_datetime = ?, end_datetime = ?, updated_at = ?
                 WHERE id = ?",
                params![
                    format_instant(range.start),
                    format_instant(range.end),
                    format_instant(Utc::now()),
                    id,
                ],
            )
            .context("Failed to update event times")?;

        if rows_affected == 0 {
            return Err(anyhow!("Event with id {} not found", id));
        }

        Ok(())
    }

    /// Delete an event by ID.
    pub fn delete(&self, id: i64) -> Result<()> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM events WHERE id = ?", [id])
            .context("Failed to delete event")?;

        if rows_affected == 0 {
            return Err(anyhow!("Event with id {} not found", id));
        }

        Ok(())
    }
}

use super::shared::{format_instant, map_event_row, EVENT_COLUMNS};
use super::EventService;
use crate::models::event::{ScheduledEvent, TimeRange};
use anyhow::Result;
use rusqlite::{self, params};

impl<'a> EventService<'a> {
    /// List every event ordered by start.
    pub fn list_all(&self) -> Result<Vec<ScheduledEvent>> {
        let sql = format!(
            "SELECT {} FROM events ORDER BY start_datetime ASC",
            EVENT_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;

        let events = stmt
            .query_map([], map_event_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(events)
    }

    /// Events that share any instant with `range` (touching ends excluded).
    pub fn find_by_date_range(&self, range: TimeRange) -> Result<Vec<ScheduledEvent>> {
        let sql = format!(
            "SELECT {} FROM events
             WHERE start_datetime < ?1 AND end_datetime > ?2
             ORDER BY start_datetime ASC",
            EVENT_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;

        let events = stmt
            .query_map(
                params![format_instant(range.end), format_instant(range.start)],
                map_event_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(events)
    }

    /// First stored event, other than `exclude_id`, that overlaps `range`.
    pub fn find_overlapping(
        &self,
        range: TimeRange,
        exclude_id: Option<i64>,
    ) -> Result<Option<ScheduledEvent>> {
        let sql = format!(
            "SELECT {} FROM events
             WHERE start_datetime < ?1 AND end_datetime > ?2
               AND (?3 IS NULL OR id != ?3)
             ORDER BY start_datetime ASC
             LIMIT 1",
            EVENT_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query_map(
            params![format_instant(range.end), format_instant(range.start), exclude_id],
            map_event_row,
        )?;

        Ok(rows.next().transpose()?)
    }
}

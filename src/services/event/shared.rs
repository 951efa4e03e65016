use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{self, Result, Row};

use crate::models::event::{ItemKind, ScheduledEvent};

pub(crate) const EVENT_COLUMNS: &str =
    "id, title, kind, start_datetime, end_datetime, recurrence_rule";

/// Fixed-width UTC form, so text comparison in SQL is chronological.
pub(crate) fn format_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub(crate) fn to_utc_datetime(value: String) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

pub(crate) fn map_event_row(row: &Row<'_>) -> Result<ScheduledEvent> {
    let kind: String = row.get(2)?;
    Ok(ScheduledEvent {
        id: Some(row.get(0)?),
        title: row.get(1)?,
        kind: ItemKind::parse(&kind).unwrap_or(ItemKind::Event),
        start: to_utc_datetime(row.get(3)?)?,
        end: to_utc_datetime(row.get(4)?)?,
        recurrence_rule: row.get(5)?,
    })
}

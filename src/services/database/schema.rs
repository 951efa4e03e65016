use anyhow::{Context, Result};
use rusqlite::Connection;

pub fn initialize_schema(conn: &Connection) -> Result<()> {
    create_events_table(conn)?;
    create_event_indexes(conn)?;
    Ok(())
}

fn create_events_table(conn: &Connection) -> Result<()> {
    // Instants are stored as UTC RFC 3339 with whole seconds so that string
    // comparison orders them chronologically.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            kind TEXT NOT NULL DEFAULT 'event',
            start_datetime TEXT NOT NULL,
            end_datetime TEXT NOT NULL,
            recurrence_rule TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )
    .context("Failed to create events table")?;

    Ok(())
}

fn create_event_indexes(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_start_end
            ON events (start_datetime, end_datetime)",
        [],
    )
    .context("Failed to create events time index")?;

    Ok(())
}

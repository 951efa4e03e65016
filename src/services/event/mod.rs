//! Planner event service entry point.
//! Provides database-backed CRUD, range queries and move validation
//! organized across focused submodules.

use rusqlite::Connection;

pub mod crud;
pub mod moves;
pub mod queries;
mod shared;
pub mod store;

pub use moves::MoveOutcome;
pub use store::{PendingConfirmation, SqliteEventStore};

/// Service for managing events stored in SQLite.
pub struct EventService<'a> {
    pub(crate) conn: &'a Connection,
}

impl<'a> EventService<'a> {
    /// Create a new EventService with a database connection
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

//! SQLite persistence: users, bans, click events and routed-record correlations.
//!
//! Every public operation is a single statement, so it is atomic per record.
//! No operation spans more than one record, so there are no multi-record transactions.

pub mod bans;
pub mod clicks;
mod migrations;
pub mod routes;
pub mod users;

use std::{path::Path, sync::Mutex};

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tracing::info;

use crate::{errors::Error, Result};

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        migrations::run(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        migrations::run(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub(crate) fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| Error::External(format!("database lock poisoned: {e}")))?;
        f(&conn)
    }
}

pub(crate) fn encode_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339()
}

pub(crate) fn decode_ts(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::External(format!("bad timestamp in database: {raw}: {e}")))
}

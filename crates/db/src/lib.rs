mod alerts;
mod analytics;
mod emissions;
mod error;
mod helpers;
mod migrations;
mod reference;
mod rollup;

use std::path::Path;

use rusqlite::Connection;

pub use error::{DbError, Result};
pub use emissions::InsertedIds;
pub use helpers::format_ts;

pub struct Db {
    conn: Connection,
}

impl Db {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "temp_store", "MEMORY")?;
        conn.pragma_update(None, "cache_size", -20_000)?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        Ok(Self { conn })
    }

    pub fn ping(&self) -> Result<bool> {
        let value: i64 = self.conn.query_row("SELECT 1", [], |row| row.get(0))?;
        Ok(value == 1)
    }
}

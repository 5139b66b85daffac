//! SQLite implementation of the AuthLogStore trait

use super::{AuthLogStore, PersistenceError};
use crate::models::AuthenticationLog;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection};
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// SQLite-based authentication log storage
pub struct SqliteAuthLogStore {
    conn: Mutex<Connection>,
}

impl SqliteAuthLogStore {
    /// Open (or create) a database at the specified path
    ///
    /// Initializes the schema if it doesn't exist.
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self, PersistenceError> {
        let conn = Connection::open(db_path)?;
        let store = SqliteAuthLogStore {
            conn: Mutex::new(conn),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Create an in-memory SQLite database (useful for testing)
    pub fn in_memory() -> Result<Self, PersistenceError> {
        let conn = Connection::open_in_memory()?;
        let store = SqliteAuthLogStore {
            conn: Mutex::new(conn),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&self) -> Result<(), PersistenceError> {
        self.conn().execute_batch(include_str!("schema.sql"))?;
        Ok(())
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        match self.conn.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn parse_login_at(raw: &str) -> Result<DateTime<Utc>, PersistenceError> {
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| PersistenceError::InvalidData(format!("Invalid login_at: {}", raw)))
    }

    fn parse_location(raw: &str) -> Result<Map<String, Value>, PersistenceError> {
        match serde_json::from_str(raw)? {
            Value::Object(map) => Ok(map),
            other => Err(PersistenceError::InvalidData(format!(
                "Location is not a flat object: {}",
                other
            ))),
        }
    }
}

impl AuthLogStore for SqliteAuthLogStore {
    fn store_log(&self, log: &AuthenticationLog) -> Result<(), PersistenceError> {
        let location = serde_json::to_string(&log.location)?;
        self.conn().execute(
            "INSERT INTO authentication_logs
             (user_kind, user_id, ip_address, user_agent, login_at, location)
             VALUES (?, ?, ?, ?, ?, ?)",
            params![
                log.user_kind,
                log.user_id,
                log.ip_address,
                log.user_agent,
                log.login_at.to_rfc3339_opts(SecondsFormat::Micros, true),
                location
            ],
        )?;
        Ok(())
    }

    fn recent_logs(
        &self,
        user_kind: &str,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<AuthenticationLog>, PersistenceError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT user_kind, user_id, ip_address, user_agent, login_at, location
             FROM authentication_logs
             WHERE user_kind = ? AND user_id = ?
             ORDER BY login_at DESC, id DESC
             LIMIT ?",
        )?;

        let rows = stmt
            .query_map(params![user_kind, user_id, limit as i64], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut logs = Vec::with_capacity(rows.len());
        for (user_kind, user_id, ip_address, user_agent, login_at, location) in rows {
            logs.push(AuthenticationLog {
                user_kind,
                user_id,
                ip_address,
                user_agent,
                login_at: Self::parse_login_at(&login_at)?,
                location: Self::parse_location(&location)?,
            });
        }
        Ok(logs)
    }

    fn count_logs(&self, user_kind: &str, user_id: &str) -> Result<usize, PersistenceError> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM authentication_logs WHERE user_kind = ? AND user_id = ?",
            params![user_kind, user_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn clear_all(&self) -> Result<(), PersistenceError> {
        self.conn().execute_batch("DELETE FROM authentication_logs;")?;
        Ok(())
    }
}

//! SQLite-backed flight repository.
//!
//! # Architecture
//!
//! Three tables back the [`FlightRepository`] interface:
//! - `flight_state`: one row per flight number (natural key), upserted in place
//! - `alerts`: append-only except for the one-way `resolved` flag
//! - `bookings`: customer bookings used to resolve affected customers
//!
//! Timestamps are stored as INTEGER microseconds since the UNIX epoch so that
//! ordering by `created_at` is a plain integer sort.
//!
//! # Guarantees
//!
//! - `created_at` of a flight row is fixed by its first insert
//! - `updated_at` of a flight row never decreases
//! - an alert moves from unresolved to resolved at most once
//! - WAL journal mode for crash recovery

use rusqlite::types::{Type, Value as SqlValue};
use rusqlite::{params, params_from_iter, Connection, OpenFlags, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;
use tracing::{debug, info};

use crate::alert::{Alert, AlertQuery};
use crate::booking::Booking;
use crate::error::ParseEnumError;
use crate::flight::FlightState;
use crate::repository::{
    dedup_preserving_order, FlightRepository, PersistenceError, PersistenceResult,
};
use crate::types::{from_micros, now, to_micros, Timestamp};

const FLIGHT_STATE_COLUMNS: &str = "flight_number, status, estimated_arrival, scheduled_arrival, \
     origin, destination, created_at, updated_at";

const ALERT_COLUMNS: &str =
    "id, flight_number, alert_type, message, severity, customer_ids, created_at, resolved_at";

#[derive(Debug, Error)]
#[error("timestamp out of range: {0}us")]
struct InvalidTimestamp(i64);

/// Flight repository over a single SQLite connection.
pub struct SqliteRepository {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SqliteRepository {
    /// Create or open a repository at the specified path
    ///
    /// # Arguments
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    /// * `Ok(SqliteRepository)` - Successfully opened repository
    /// * `Err(PersistenceError)` - Failed to open or initialize database
    pub fn open(path: impl AsRef<Path>) -> PersistenceResult<Self> {
        let path = path.as_ref();

        info!(path = %path.display(), "Opening flight repository");

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        })
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> PersistenceResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    /// Database file, if not in-memory.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn init_schema(conn: &Connection) -> PersistenceResult<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS flight_state (
                flight_number TEXT PRIMARY KEY NOT NULL,
                status TEXT NOT NULL,
                estimated_arrival INTEGER NOT NULL,
                scheduled_arrival INTEGER,
                origin TEXT,
                destination TEXT,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_flight_state_status ON flight_state(status);

            CREATE TABLE IF NOT EXISTS alerts (
                seq_no INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                flight_number TEXT NOT NULL,
                alert_type TEXT NOT NULL,
                message TEXT NOT NULL,
                severity TEXT NOT NULL,
                customer_ids TEXT NOT NULL DEFAULT '[]',
                created_at INTEGER NOT NULL,
                resolved INTEGER NOT NULL DEFAULT 0,
                resolved_at INTEGER
            );

            CREATE INDEX IF NOT EXISTS idx_alerts_flight_number ON alerts(flight_number);
            CREATE INDEX IF NOT EXISTS idx_alerts_severity ON alerts(severity);
            CREATE INDEX IF NOT EXISTS idx_alerts_resolved ON alerts(resolved);
            CREATE INDEX IF NOT EXISTS idx_alerts_created_at ON alerts(created_at);

            CREATE TABLE IF NOT EXISTS bookings (
                seq_no INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                customer_id TEXT NOT NULL,
                flight_number TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'confirmed',
                created_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_bookings_flight_number ON bookings(flight_number);
            "#,
        )?;

        Ok(())
    }

    fn conn(&self) -> PersistenceResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| PersistenceError::Unavailable("connection lock poisoned".to_string()))
    }

    fn select_alert(conn: &Connection, alert_id: &str) -> PersistenceResult<Option<Alert>> {
        let sql = format!("SELECT {ALERT_COLUMNS} FROM alerts WHERE id = ?1");
        let alert = conn
            .query_row(&sql, [alert_id], alert_from_row)
            .optional()?;
        Ok(alert)
    }
}

impl FlightRepository for SqliteRepository {
    fn upsert_flight_state(&self, state: &FlightState) -> PersistenceResult<()> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO flight_state (
                flight_number, status, estimated_arrival, scheduled_arrival,
                origin, destination, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(flight_number) DO UPDATE SET
                status = excluded.status,
                estimated_arrival = excluded.estimated_arrival,
                scheduled_arrival = excluded.scheduled_arrival,
                origin = excluded.origin,
                destination = excluded.destination,
                updated_at = MAX(flight_state.updated_at, excluded.updated_at)
            "#,
            params![
                state.flight_number,
                state.status.as_str(),
                to_micros(&state.estimated_arrival),
                state.scheduled_arrival.as_ref().map(to_micros),
                state.origin,
                state.destination,
                to_micros(&state.created_at),
                to_micros(&state.updated_at),
            ],
        )?;

        debug!(
            flight_number = %state.flight_number,
            status = %state.status,
            "Flight state persisted"
        );

        Ok(())
    }

    fn get_flight_state(&self, flight_number: &str) -> PersistenceResult<Option<FlightState>> {
        let conn = self.conn()?;
        let sql = format!("SELECT {FLIGHT_STATE_COLUMNS} FROM flight_state WHERE flight_number = ?1");
        let state = conn
            .query_row(&sql, [flight_number], flight_state_from_row)
            .optional()?;
        Ok(state)
    }

    fn insert_alert(&self, alert: &Alert) -> PersistenceResult<()> {
        let customer_ids = serde_json::to_string(&alert.customer_ids)?;
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO alerts (
                id, flight_number, alert_type, message, severity,
                customer_ids, created_at, resolved, resolved_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                alert.id,
                alert.flight_number,
                alert.alert_type.as_str(),
                alert.message,
                alert.severity.as_str(),
                customer_ids,
                to_micros(&alert.created_at),
                alert.is_resolved(),
                alert.resolved_at().as_ref().map(to_micros),
            ],
        )?;

        debug!(alert_id = %alert.id, "Alert persisted");

        Ok(())
    }

    fn get_alert(&self, alert_id: &str) -> PersistenceResult<Option<Alert>> {
        let conn = self.conn()?;
        Self::select_alert(&conn, alert_id)
    }

    fn list_alerts(&self, query: &AlertQuery) -> PersistenceResult<Vec<Alert>> {
        let mut sql = format!("SELECT {ALERT_COLUMNS} FROM alerts WHERE 1 = 1");
        let mut values: Vec<SqlValue> = Vec::new();

        if let Some(flight_number) = &query.flight_number {
            sql.push_str(" AND flight_number = ?");
            values.push(SqlValue::Text(flight_number.clone()));
        }
        if let Some(severity) = query.severity {
            sql.push_str(" AND severity = ?");
            values.push(SqlValue::Text(severity.as_str().to_string()));
        }
        if let Some(resolved) = query.resolved {
            sql.push_str(" AND resolved = ?");
            values.push(SqlValue::Integer(i64::from(resolved)));
        }

        sql.push_str(" ORDER BY created_at DESC, seq_no DESC LIMIT ?");
        values.push(SqlValue::Integer(query.effective_limit() as i64));

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let alerts = stmt
            .query_map(params_from_iter(values.iter()), alert_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(alerts)
    }

    fn resolve_alert(&self, alert_id: &str, resolved_at: Timestamp) -> PersistenceResult<Alert> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE alerts SET resolved = 1, resolved_at = ?2 WHERE id = ?1 AND resolved = 0",
            params![alert_id, to_micros(&resolved_at)],
        )?;

        if changed == 0 {
            let exists = conn
                .query_row("SELECT 1 FROM alerts WHERE id = ?1", [alert_id], |_| Ok(()))
                .optional()?
                .is_some();
            let alert_id = alert_id.to_string();
            return Err(if exists {
                PersistenceError::AlreadyResolved { alert_id }
            } else {
                PersistenceError::AlertNotFound { alert_id }
            });
        }

        info!(alert_id = %alert_id, "Alert resolved");

        Self::select_alert(&conn, alert_id)?.ok_or_else(|| PersistenceError::AlertNotFound {
            alert_id: alert_id.to_string(),
        })
    }

    fn insert_booking(&self, booking: &Booking) -> PersistenceResult<()> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO bookings (id, customer_id, flight_number, status, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                booking.id,
                booking.customer_id,
                booking.flight_number,
                booking.status.as_str(),
                to_micros(&now()),
            ],
        )?;
        Ok(())
    }

    fn find_bookings_by_flight(&self, flight_number: &str) -> PersistenceResult<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT customer_id FROM bookings
            WHERE flight_number = ?1 AND status = 'confirmed'
            ORDER BY seq_no ASC
            "#,
        )?;
        let ids = stmt
            .query_map([flight_number], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(dedup_preserving_order(ids))
    }
}

fn flight_state_from_row(row: &Row<'_>) -> rusqlite::Result<FlightState> {
    Ok(FlightState {
        flight_number: row.get(0)?,
        status: enum_column(row, 1)?,
        estimated_arrival: timestamp_column(row, 2)?,
        scheduled_arrival: optional_timestamp_column(row, 3)?,
        origin: row.get(4)?,
        destination: row.get(5)?,
        created_at: timestamp_column(row, 6)?,
        updated_at: timestamp_column(row, 7)?,
    })
}

fn alert_from_row(row: &Row<'_>) -> rusqlite::Result<Alert> {
    let customer_ids: String = row.get(5)?;
    let customer_ids: Vec<String> = serde_json::from_str(&customer_ids)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?;

    let mut alert = Alert::new(
        row.get::<_, String>(1)?,
        enum_column(row, 2)?,
        enum_column(row, 4)?,
        row.get::<_, String>(3)?,
        customer_ids,
        timestamp_column(row, 6)?,
    );
    alert.id = row.get(0)?;

    Ok(alert.with_resolution(optional_timestamp_column(row, 7)?))
}

fn enum_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = ParseEnumError>,
{
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Timestamp> {
    let micros: i64 = row.get(idx)?;
    micros_to_timestamp(idx, micros)
}

fn optional_timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Timestamp>> {
    let micros: Option<i64> = row.get(idx)?;
    micros.map(|m| micros_to_timestamp(idx, m)).transpose()
}

fn micros_to_timestamp(idx: usize, micros: i64) -> rusqlite::Result<Timestamp> {
    from_micros(micros).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Integer,
            Box::new(InvalidTimestamp(micros)),
        )
    })
}

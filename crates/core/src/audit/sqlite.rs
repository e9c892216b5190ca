use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use super::{AuditError, AuditEvent, AuditFilter, AuditRecord, AuditStore};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS audit_events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT NOT NULL,
    event_type TEXT NOT NULL,
    ticket_id TEXT,
    data TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_audit_events_timestamp ON audit_events(timestamp);
CREATE INDEX IF NOT EXISTS idx_audit_events_ticket_id ON audit_events(ticket_id);
CREATE INDEX IF NOT EXISTS idx_audit_events_event_type ON audit_events(event_type);
"#;

/// SQLite-backed audit store
pub struct SqliteAuditStore {
    conn: Mutex<Connection>,
}

impl SqliteAuditStore {
    /// Create a new SQLite audit store, creating the database file and
    /// tables if needed
    pub fn new(path: &Path) -> Result<Self, AuditError> {
        let conn = Connection::open(path).map_err(|e| AuditError::Database(e.to_string()))?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| AuditError::Database(e.to_string()))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite audit store (useful for testing)
    pub fn in_memory() -> Result<Self, AuditError> {
        let conn = Connection::open_in_memory().map_err(|e| AuditError::Database(e.to_string()))?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| AuditError::Database(e.to_string()))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn build_where_clause(filter: &AuditFilter) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref ticket_id) = filter.ticket_id {
            conditions.push("ticket_id = ?");
            params.push(Box::new(ticket_id.clone()));
        }

        if let Some(ref event_type) = filter.event_type {
            conditions.push("event_type = ?");
            params.push(Box::new(event_type.clone()));
        }

        if let Some(ref from) = filter.from {
            conditions.push("timestamp >= ?");
            params.push(Box::new(from.to_rfc3339()));
        }

        if let Some(ref to) = filter.to {
            conditions.push("timestamp <= ?");
            params.push(Box::new(to.to_rfc3339()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        (where_clause, params)
    }

    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<(i64, String, String, Option<String>, String)>
    {
        Ok((
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
        ))
    }
}

impl AuditStore for SqliteAuditStore {
    fn insert(&self, record: &AuditRecord) -> Result<i64, AuditError> {
        let conn = self.conn.lock().unwrap();

        let data_json = serde_json::to_string(&record.data)
            .map_err(|e| AuditError::Serialization(e.to_string()))?;

        conn.execute(
            "INSERT INTO audit_events (timestamp, event_type, ticket_id, data) VALUES (?, ?, ?, ?)",
            params![
                record.timestamp.to_rfc3339(),
                record.event_type,
                record.ticket_id,
                data_json,
            ],
        )
        .map_err(|e| AuditError::Database(e.to_string()))?;

        Ok(conn.last_insert_rowid())
    }

    fn query(&self, filter: &AuditFilter) -> Result<Vec<AuditRecord>, AuditError> {
        let conn = self.conn.lock().unwrap();

        let (where_clause, params) = Self::build_where_clause(filter);

        let sql = format!(
            "SELECT id, timestamp, event_type, ticket_id, data FROM audit_events {} ORDER BY timestamp DESC LIMIT ? OFFSET ?",
            where_clause
        );

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| AuditError::Database(e.to_string()))?;

        let mut all_params: Vec<Box<dyn rusqlite::ToSql>> = params;
        all_params.push(Box::new(filter.limit));
        all_params.push(Box::new(filter.offset));

        let param_refs: Vec<&dyn rusqlite::ToSql> = all_params.iter().map(|p| p.as_ref()).collect();

        let rows = stmt
            .query_map(param_refs.as_slice(), Self::row_to_record)
            .map_err(|e| AuditError::Database(e.to_string()))?;

        let mut records = Vec::new();
        for row_result in rows {
            let (id, timestamp_str, event_type, ticket_id, data_json) =
                row_result.map_err(|e| AuditError::Database(e.to_string()))?;

            let timestamp = DateTime::parse_from_rfc3339(&timestamp_str)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now());

            let data: AuditEvent = serde_json::from_str(&data_json)
                .map_err(|e| AuditError::Serialization(e.to_string()))?;

            records.push(AuditRecord {
                id,
                timestamp,
                event_type,
                ticket_id,
                data,
            });
        }

        Ok(records)
    }

    fn count(&self, filter: &AuditFilter) -> Result<i64, AuditError> {
        let conn = self.conn.lock().unwrap();

        let (where_clause, params) = Self::build_where_clause(filter);

        let sql = format!("SELECT COUNT(*) FROM audit_events {}", where_clause);

        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let count: i64 = conn
            .query_row(&sql, param_refs.as_slice(), |row| row.get(0))
            .map_err(|e| AuditError::Database(e.to_string()))?;

        Ok(count)
    }
}

//! SQLite-backed ticket store implementation.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use super::{
    CompletionUpdate, CreateTicketRequest, Ticket, TicketError, TicketStatus, TicketStore,
};

const TICKET_COLUMNS: &str =
    "ticket, requested_time, filesize, status, success, execution_time, comment, result";

/// SQLite-backed ticket store.
pub struct SqliteTicketStore {
    conn: Mutex<Connection>,
}

impl SqliteTicketStore {
    /// Create a new SQLite ticket store, creating the database file and
    /// tables if needed.
    pub fn new(path: &Path) -> Result<Self, TicketError> {
        let conn = Connection::open(path).map_err(|e| TicketError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite ticket store (useful for testing).
    pub fn in_memory() -> Result<Self, TicketError> {
        let conn =
            Connection::open_in_memory().map_err(|e| TicketError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), TicketError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS tickets (
                ticket TEXT PRIMARY KEY,
                requested_time TEXT NOT NULL,
                filesize INTEGER NOT NULL,
                status INTEGER NOT NULL DEFAULT 0,
                success INTEGER,
                execution_time REAL,
                comment TEXT,
                result TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_tickets_requested_time ON tickets(requested_time);
            CREATE INDEX IF NOT EXISTS idx_tickets_status ON tickets(status);
            "#,
        )
        .map_err(|e| TicketError::Database(e.to_string()))?;

        Ok(())
    }

    fn row_to_ticket(row: &rusqlite::Row) -> rusqlite::Result<Ticket> {
        let ticket: String = row.get(0)?;
        let requested_time_str: String = row.get(1)?;
        let filesize: u64 = row.get(2)?;
        let status: i64 = row.get(3)?;
        let success: Option<bool> = row.get(4)?;
        let execution_time: Option<f64> = row.get(5)?;
        let comment: Option<String> = row.get(6)?;
        let result: Option<String> = row.get(7)?;

        let requested_time = DateTime::parse_from_rfc3339(&requested_time_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        let status = if status == 0 {
            TicketStatus::Pending
        } else {
            TicketStatus::Completed
        };

        Ok(Ticket {
            ticket,
            requested_time,
            filesize,
            status,
            success,
            execution_time,
            comment,
            result,
        })
    }

    fn get_locked(conn: &Connection, ticket: &str) -> Result<Option<Ticket>, TicketError> {
        let result = conn.query_row(
            &format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE ticket = ?"),
            params![ticket],
            Self::row_to_ticket,
        );

        match result {
            Ok(ticket) => Ok(Some(ticket)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(TicketError::Database(e.to_string())),
        }
    }
}

impl TicketStore for SqliteTicketStore {
    fn create(&self, request: CreateTicketRequest) -> Result<Ticket, TicketError> {
        let conn = self.conn.lock().unwrap();

        let ticket = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO tickets (ticket, requested_time, filesize, status) VALUES (?, ?, ?, 0)",
            params![ticket, now.to_rfc3339(), request.filesize],
        )
        .map_err(|e| TicketError::Database(e.to_string()))?;

        Ok(Ticket {
            ticket,
            requested_time: now,
            filesize: request.filesize,
            status: TicketStatus::Pending,
            success: None,
            execution_time: None,
            comment: None,
            result: None,
        })
    }

    fn get(&self, ticket: &str) -> Result<Option<Ticket>, TicketError> {
        let conn = self.conn.lock().unwrap();
        Self::get_locked(&conn, ticket)
    }

    fn complete(&self, ticket: &str, update: CompletionUpdate) -> Result<Ticket, TicketError> {
        let conn = self.conn.lock().unwrap();

        // The status guard makes the terminal write at-most-once: a
        // completed ticket never matches, so a second update is a no-op
        // at the SQL level and surfaces as AlreadyCompleted.
        let updated = conn
            .execute(
                "UPDATE tickets SET status = 1, success = ?, execution_time = ?, comment = ?, result = ? \
                 WHERE ticket = ? AND status = 0",
                params![
                    update.success,
                    update.execution_time,
                    update.comment,
                    update.result,
                    ticket,
                ],
            )
            .map_err(|e| TicketError::Database(e.to_string()))?;

        if updated == 0 {
            return match Self::get_locked(&conn, ticket)? {
                Some(_) => Err(TicketError::AlreadyCompleted(ticket.to_string())),
                None => Err(TicketError::NotFound(ticket.to_string())),
            };
        }

        Self::get_locked(&conn, ticket)?.ok_or_else(|| TicketError::NotFound(ticket.to_string()))
    }

    fn ping(&self) -> Result<(), TicketError> {
        let conn = self.conn.lock().unwrap();
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .map_err(|e| TicketError::Database(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_store() -> SqliteTicketStore {
        SqliteTicketStore::in_memory().unwrap()
    }

    fn create_test_request() -> CreateTicketRequest {
        CreateTicketRequest { filesize: 4096 }
    }

    fn success_update() -> CompletionUpdate {
        CompletionUpdate {
            success: true,
            execution_time: 1.234,
            comment: None,
            result: Some("250807/abc/out.csv".to_string()),
        }
    }

    #[test]
    fn test_create_ticket() {
        let store = create_test_store();
        let ticket = store.create(create_test_request()).unwrap();

        assert!(!ticket.ticket.is_empty());
        assert_eq!(ticket.filesize, 4096);
        assert_eq!(ticket.status, TicketStatus::Pending);
        assert!(ticket.success.is_none());
        assert!(ticket.execution_time.is_none());
        assert!(ticket.result.is_none());
    }

    #[test]
    fn test_get_ticket() {
        let store = create_test_store();
        let created = store.create(create_test_request()).unwrap();

        let fetched = store.get(&created.ticket).unwrap().unwrap();
        assert_eq!(fetched.ticket, created.ticket);
        assert_eq!(fetched.filesize, created.filesize);
        assert_eq!(fetched.status, TicketStatus::Pending);
    }

    #[test]
    fn test_get_nonexistent_ticket() {
        let store = create_test_store();
        assert!(store.get("nonexistent-id").unwrap().is_none());
    }

    #[test]
    fn test_fresh_identifiers_per_create() {
        let store = create_test_store();
        let a = store.create(create_test_request()).unwrap();
        let b = store.create(create_test_request()).unwrap();
        assert_ne!(a.ticket, b.ticket);
    }

    #[test]
    fn test_complete_success() {
        let store = create_test_store();
        let ticket = store.create(create_test_request()).unwrap();

        let completed = store.complete(&ticket.ticket, success_update()).unwrap();
        assert_eq!(completed.status, TicketStatus::Completed);
        assert_eq!(completed.success, Some(true));
        assert_eq!(completed.execution_time, Some(1.234));
        assert_eq!(completed.result.as_deref(), Some("250807/abc/out.csv"));
        assert!(completed.comment.is_none());

        // Identity fields survive completion untouched.
        assert_eq!(completed.requested_time, ticket.requested_time);
        assert_eq!(completed.filesize, ticket.filesize);
    }

    #[test]
    fn test_complete_failure_records_comment() {
        let store = create_test_store();
        let ticket = store.create(create_test_request()).unwrap();

        let completed = store
            .complete(
                &ticket.ticket,
                CompletionUpdate {
                    success: false,
                    execution_time: 0.1,
                    comment: Some("column not found: name".to_string()),
                    result: None,
                },
            )
            .unwrap();

        assert_eq!(completed.success, Some(false));
        assert_eq!(
            completed.comment.as_deref(),
            Some("column not found: name")
        );
        assert!(completed.result.is_none());
    }

    #[test]
    fn test_complete_is_set_once() {
        let store = create_test_store();
        let ticket = store.create(create_test_request()).unwrap();

        store.complete(&ticket.ticket, success_update()).unwrap();
        let second = store.complete(
            &ticket.ticket,
            CompletionUpdate {
                success: false,
                execution_time: 9.0,
                comment: Some("should not land".to_string()),
                result: None,
            },
        );

        assert!(matches!(second, Err(TicketError::AlreadyCompleted(_))));

        // The first outcome is still in place.
        let fetched = store.get(&ticket.ticket).unwrap().unwrap();
        assert_eq!(fetched.success, Some(true));
        assert_eq!(fetched.execution_time, Some(1.234));
    }

    #[test]
    fn test_complete_nonexistent_ticket() {
        let store = create_test_store();
        let result = store.complete("nonexistent-id", success_update());
        assert!(matches!(result, Err(TicketError::NotFound(_))));
    }

    #[test]
    fn test_ping() {
        let store = create_test_store();
        assert!(store.ping().is_ok());
    }

    #[test]
    fn test_file_based_store() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("tickets.db");

        let store = SqliteTicketStore::new(&db_path).unwrap();
        let ticket = store.create(create_test_request()).unwrap();

        assert!(db_path.exists());
        assert!(store.get(&ticket.ticket).unwrap().is_some());
    }
}

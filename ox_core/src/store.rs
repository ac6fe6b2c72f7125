//! Relational projection of a training log.
//!
//! # Responsibility
//! - Load a [`TrainingLog`] into an in-memory SQLite database.
//! - Expose the flat `training` view for ad hoc queries and reports.
//!
//! # Invariants
//! - Connections run with `foreign_keys=ON`.
//! - A store is built inside one transaction; a failed build returns an
//!   error and no store.
//! - The store holds no references back into the log.

use crate::log::TrainingLog;
use crate::types::TrainingSet;
use crate::{Error, Result};
use rusqlite::types::Value;
use rusqlite::{params, Connection};
use std::time::Instant;
use tracing::{debug, info};

const SCHEMA: &str = "
CREATE TABLE sessions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    date TEXT NOT NULL,
    status TEXT NOT NULL,
    name TEXT
);

CREATE TABLE movements (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id INTEGER NOT NULL REFERENCES sessions(id),
    name TEXT NOT NULL,
    note TEXT
);

CREATE TABLE sets (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    movement_id INTEGER NOT NULL REFERENCES movements(id),
    reps INTEGER NOT NULL CHECK (reps >= 1),
    weight_magnitude REAL,
    weight_unit TEXT
);

CREATE TABLE notes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    date TEXT NOT NULL,
    text TEXT NOT NULL
);

CREATE TABLE session_notes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id INTEGER NOT NULL REFERENCES sessions(id),
    text TEXT NOT NULL
);

CREATE VIEW training AS
SELECT
    s.id AS session_id,
    s.date,
    s.status,
    s.name AS session_name,
    m.id AS movement_id,
    m.name AS movement_name,
    m.note AS movement_note,
    t.id AS set_id,
    t.reps,
    t.weight_magnitude,
    t.weight_unit
FROM sessions s
JOIN movements m ON m.session_id = s.id
JOIN sets t ON t.movement_id = m.id;
";

/// Column names and rows of an ad hoc query
#[derive(Clone, Debug, PartialEq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// A table or view in the projection
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableInfo {
    pub name: String,
    pub kind: String,
}

/// Disposable, queryable projection of one log
#[derive(Debug)]
pub struct TrainingStore {
    conn: Connection,
}

impl TrainingStore {
    /// Build a fresh projection. All-or-nothing.
    pub fn build(log: &TrainingLog) -> Result<Self> {
        let started_at = Instant::now();
        let mut conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;

        load(&mut conn, log)?;

        let store = Self { conn };
        store.check_integrity()?;
        store.conn.execute_batch("PRAGMA query_only = ON;")?;
        info!(
            "Built store: {} sessions, {} notes in {}ms",
            log.sessions.len(),
            log.notes.len(),
            started_at.elapsed().as_millis()
        );
        Ok(store)
    }

    /// Underlying connection, for reports
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Run `PRAGMA foreign_key_check`; any row is an integrity violation
    pub fn check_integrity(&self) -> Result<()> {
        let mut stmt = self.conn.prepare("PRAGMA foreign_key_check")?;
        let violations: Vec<String> = stmt
            .query_map([], |row| {
                let table: String = row.get(0)?;
                let rowid: Option<i64> = row.get(1)?;
                let parent: String = row.get(2)?;
                Ok(format!("{} row {:?} references missing {}", table, rowid, parent))
            })?
            .collect::<std::result::Result<_, _>>()?;

        if violations.is_empty() {
            Ok(())
        } else {
            Err(Error::IntegrityViolation(violations.join("; ")))
        }
    }

    /// Run an arbitrary read query. Statements that would write are refused.
    pub fn query(&self, sql: &str) -> Result<QueryResult> {
        debug!("Running query: {}", sql);
        let mut stmt = self.conn.prepare(sql)?;
        if !stmt.readonly() {
            return Err(Error::Other(format!("Query must be read-only: {}", sql)));
        }
        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
        let width = columns.len();

        let mut rows = Vec::new();
        let mut cursor = stmt.query([])?;
        while let Some(row) = cursor.next()? {
            let mut values = Vec::with_capacity(width);
            for i in 0..width {
                values.push(row.get::<_, Value>(i)?);
            }
            rows.push(values);
        }
        Ok(QueryResult { columns, rows })
    }

    /// Tables and views, sorted by name
    pub fn tables(&self) -> Result<Vec<TableInfo>> {
        let mut stmt = self.conn.prepare(
            "SELECT name, type FROM sqlite_master
             WHERE type IN ('table', 'view') AND name NOT LIKE 'sqlite_%'
             ORDER BY name",
        )?;
        let tables = stmt
            .query_map([], |row| {
                Ok(TableInfo {
                    name: row.get(0)?,
                    kind: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<_, _>>()?;
        Ok(tables)
    }

    /// Count rows in a table or view
    pub fn count(&self, table: &str) -> Result<i64> {
        let known = self.tables()?.into_iter().any(|t| t.name == table);
        if !known {
            return Err(Error::NotFound(format!("table '{}'", table)));
        }
        let count = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
        Ok(count)
    }
}

fn load(conn: &mut Connection, log: &TrainingLog) -> Result<()> {
    let tx = conn.transaction()?;
    {
        let mut insert_session =
            tx.prepare("INSERT INTO sessions (date, status, name) VALUES (?1, ?2, ?3)")?;
        let mut insert_movement =
            tx.prepare("INSERT INTO movements (session_id, name, note) VALUES (?1, ?2, ?3)")?;
        let mut insert_set = tx.prepare(
            "INSERT INTO sets (movement_id, reps, weight_magnitude, weight_unit)
             VALUES (?1, ?2, ?3, ?4)",
        )?;
        let mut insert_session_note =
            tx.prepare("INSERT INTO session_notes (session_id, text) VALUES (?1, ?2)")?;
        let mut insert_note = tx.prepare("INSERT INTO notes (date, text) VALUES (?1, ?2)")?;

        for session in &log.sessions {
            let session_id = insert_session.insert(params![
                session.date.to_string(),
                session.status.as_str(),
                session.name
            ])?;

            for note in &session.notes {
                insert_session_note
                    .execute(params![session_id, note.text])
                    .map_err(|e| integrity(e, "session note"))?;
            }

            for movement in &session.movements {
                let movement_id = insert_movement
                    .insert(params![session_id, movement.name, movement.note])
                    .map_err(|e| integrity(e, "movement"))?;

                for set in &movement.sets {
                    let (magnitude, unit) = decompose_weight(set);
                    insert_set
                        .execute(params![movement_id, set.reps, magnitude, unit])
                        .map_err(|e| integrity(e, "set"))?;
                }
            }
        }

        for note in &log.notes {
            let date = note.date.map(|d| d.to_string());
            insert_note.execute(params![date, note.text])?;
        }
    }
    tx.commit()?;
    Ok(())
}

/// `(magnitude, unit)`, both `None` for bodyweight
fn decompose_weight(set: &TrainingSet) -> (Option<f64>, Option<&'static str>) {
    match set.weight {
        Some(w) => (Some(w.magnitude()), Some(w.unit().name())),
        None => (None, None),
    }
}

fn integrity(err: rusqlite::Error, what: &str) -> Error {
    match err {
        rusqlite::Error::SqliteFailure(e, msg)
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Error::IntegrityViolation(format!(
                "{}: {}",
                what,
                msg.unwrap_or_else(|| e.to_string())
            ))
        }
        other => Error::Sqlite(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Movement, Note, Session, SessionStatus};
    use crate::units::{MassUnit, Quantity};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn lb(m: f64) -> Option<Quantity> {
        Some(Quantity::new(m, MassUnit::Pound))
    }

    fn sample_log() -> TrainingLog {
        TrainingLog::new(
            vec![
                Session::single(
                    date(2025, 1, 10),
                    SessionStatus::Completed,
                    Movement::new("pullups", vec![TrainingSet::bodyweight(10); 2], None),
                ),
                Session::named(
                    date(2025, 1, 11),
                    SessionStatus::Completed,
                    "Upper Day",
                    vec![
                        Movement::new(
                            "bench-press",
                            vec![TrainingSet::new(5, lb(135.0)); 5],
                            Some("^rm".into()),
                        ),
                        Movement::new("pullups", vec![TrainingSet::bodyweight(8); 3], None),
                    ],
                    vec![Note::embedded("Cycle 1")],
                ),
            ],
            vec![Note::standalone("rest", date(2025, 1, 12))],
        )
    }

    #[test]
    fn test_table_counts() {
        let store = TrainingStore::build(&sample_log()).unwrap();
        assert_eq!(store.count("sessions").unwrap(), 2);
        assert_eq!(store.count("movements").unwrap(), 3);
        assert_eq!(store.count("sets").unwrap(), 10);
        assert_eq!(store.count("notes").unwrap(), 1);
        assert_eq!(store.count("session_notes").unwrap(), 1);
        assert_eq!(store.count("training").unwrap(), 10);
    }

    #[test]
    fn test_unknown_table() {
        let store = TrainingStore::build(&sample_log()).unwrap();
        assert!(matches!(store.count("nope"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_bodyweight_sets_have_null_weight() {
        let store = TrainingStore::build(&sample_log()).unwrap();
        let result = store
            .query(
                "SELECT weight_magnitude, weight_unit FROM training
                 WHERE movement_name = 'pullups'",
            )
            .unwrap();
        assert_eq!(result.rows.len(), 5);
        assert!(result
            .rows
            .iter()
            .all(|r| r[0] == Value::Null && r[1] == Value::Null));
    }

    #[test]
    fn test_training_view_columns() {
        let store = TrainingStore::build(&sample_log()).unwrap();
        let result = store.query("SELECT * FROM training LIMIT 1").unwrap();
        assert_eq!(
            result.columns,
            vec![
                "session_id",
                "date",
                "status",
                "session_name",
                "movement_id",
                "movement_name",
                "movement_note",
                "set_id",
                "reps",
                "weight_magnitude",
                "weight_unit",
            ]
        );
    }

    #[test]
    fn test_weight_decomposed_with_canonical_unit() {
        let store = TrainingStore::build(&sample_log()).unwrap();
        let result = store
            .query(
                "SELECT DISTINCT weight_magnitude, weight_unit, status, session_name
                 FROM training WHERE movement_name = 'bench-press'",
            )
            .unwrap();
        assert_eq!(
            result.rows,
            vec![vec![
                Value::Real(135.0),
                Value::Text("pound".into()),
                Value::Text("completed".into()),
                Value::Text("Upper Day".into()),
            ]]
        );
    }

    #[test]
    fn test_integrity_check_passes() {
        let store = TrainingStore::build(&sample_log()).unwrap();
        assert!(store.check_integrity().is_ok());
    }

    #[test]
    fn test_foreign_keys_enforced() {
        let store = TrainingStore::build(&sample_log()).unwrap();
        store
            .connection()
            .execute_batch("PRAGMA query_only = OFF;")
            .unwrap();
        let err = store
            .connection()
            .execute(
                "INSERT INTO movements (session_id, name) VALUES (999, 'ghost')",
                [],
            )
            .unwrap_err();
        assert!(matches!(
            integrity(err, "movement"),
            Error::IntegrityViolation(_)
        ));
    }

    #[test]
    fn test_empty_log() {
        let store = TrainingStore::build(&TrainingLog::default()).unwrap();
        assert_eq!(store.count("training").unwrap(), 0);
    }

    #[test]
    fn test_tables_listing() {
        let store = TrainingStore::build(&TrainingLog::default()).unwrap();
        let names: Vec<_> = store.tables().unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(
            names,
            vec!["movements", "notes", "session_notes", "sessions", "sets", "training"]
        );
    }

    #[test]
    fn test_query_cannot_modify_store() {
        let store = TrainingStore::build(&sample_log()).unwrap();
        let before = store.count("sets").unwrap();

        assert!(store.query("DELETE FROM sets").is_err());
        assert!(store.query("DROP TABLE notes").is_err());
        assert!(store
            .connection()
            .execute("DELETE FROM sets", [])
            .is_err());

        assert_eq!(store.count("sets").unwrap(), before);
        assert_eq!(store.query("SELECT COUNT(*) FROM notes").unwrap().rows.len(), 1);
    }
}

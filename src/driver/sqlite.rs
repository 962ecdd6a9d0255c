/// Bundled SQLite driver.
///
/// Executes a batch statement by statement via `rusqlite::Batch`, collecting
/// one row-set per statement that produces columns. Declared temporal column
/// types (`DATE`, `DATETIME`, `DATETIME2(n)`, `DATETIMEOFFSET(n)`,
/// `SMALLDATETIME`) are honoured: stored literals are parsed into UTC
/// date-times so the formatter can apply scale-aware patterns.
use crate::driver::{Cancel, Column, ConnectOptions, Driver, RowSet, TypeInfo, Value};
use crate::error::{CheetahError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rusqlite::{types::ValueRef, Batch, Connection, InterruptHandle};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub struct SqliteDriver {
    conn: Connection,
    interrupt: Arc<InterruptHandle>,
}

/// Interrupts the statement currently running on the connection.
pub struct SqliteCanceller {
    handle: Arc<InterruptHandle>,
}

impl Cancel for SqliteCanceller {
    fn cancel(&self) {
        self.handle.interrupt();
    }
}

impl SqliteDriver {
    /// Opens the database named by `options.database` (a file path, or
    /// `:memory:` / empty for an in-memory database).
    pub fn connect(options: &ConnectOptions) -> Result<Self> {
        let conn = if options.database.is_empty() || options.database == ":memory:" {
            Connection::open_in_memory()
        } else {
            Connection::open(&options.database)
        }
        .map_err(|e| CheetahError::Connection(e.to_string()))?;

        conn.busy_timeout(Duration::from_secs(options.request_timeout))?;
        let interrupt = Arc::new(conn.get_interrupt_handle());
        Ok(SqliteDriver { conn, interrupt })
    }
}

impl Driver for SqliteDriver {
    fn submit(&mut self, sql: &str) -> Result<Vec<RowSet>> {
        let mut results = Vec::new();
        let mut batch = Batch::new(&self.conn, sql);
        while let Some(mut stmt) = batch
            .next()
            .map_err(|e| CheetahError::Execution(e.to_string()))?
        {
            if stmt.column_count() == 0 {
                let affected = stmt
                    .execute([])
                    .map_err(|e| CheetahError::Execution(e.to_string()))?;
                debug!(affected, "statement without result set");
                continue;
            }

            let columns: Vec<Column> = stmt
                .columns()
                .iter()
                .map(|c| Column {
                    name: c.name().to_string(),
                    type_info: TypeInfo::from_decl(c.decl_type().unwrap_or("")),
                })
                .collect();

            let mut out_rows = Vec::new();
            let mut rows = stmt
                .query([])
                .map_err(|e| CheetahError::Execution(e.to_string()))?;
            while let Some(row) = rows
                .next()
                .map_err(|e| CheetahError::Execution(e.to_string()))?
            {
                let mut values = Vec::with_capacity(columns.len());
                for (i, column) in columns.iter().enumerate() {
                    let value_ref = row
                        .get_ref(i)
                        .map_err(|e| CheetahError::Execution(e.to_string()))?;
                    values.push(read_value(value_ref, column.type_info));
                }
                out_rows.push(values);
            }
            results.push(RowSet {
                columns,
                rows: out_rows,
            });
        }
        Ok(results)
    }

    fn canceller(&self) -> Option<Box<dyn Cancel>> {
        Some(Box::new(SqliteCanceller {
            handle: self.interrupt.clone(),
        }))
    }
}

fn read_value(value: ValueRef, type_info: TypeInfo) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(f) => Value::Real(f),
        ValueRef::Text(t) => {
            let text = String::from_utf8_lossy(t).to_string();
            if type_info.is_temporal() {
                if let Some(dt) = parse_temporal(&text) {
                    return Value::DateTime(dt);
                }
            }
            Value::Text(text)
        }
        ValueRef::Blob(b) => Value::Blob(b.to_vec()),
    }
}

/// Parses a stored temporal literal, normalizing offsets to UTC.
fn parse_temporal(text: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    for pattern in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, pattern) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_test_driver() -> SqliteDriver {
        let mut driver = SqliteDriver::connect(&ConnectOptions::default()).unwrap();
        driver
            .submit(
                "CREATE TABLE events (
                    id INTEGER PRIMARY KEY,
                    name TEXT,
                    on_date DATE,
                    at_time DATETIME2(3)
                );
                INSERT INTO events (name, on_date, at_time)
                VALUES ('launch', '2021-06-01', '2021-06-01 10:30:00.125');",
            )
            .unwrap();
        driver
    }

    #[test]
    fn test_submit_collects_one_rowset_per_query() {
        let mut driver = open_test_driver();
        let rowsets = driver
            .submit("SELECT id FROM events; SELECT name FROM events;")
            .unwrap();
        assert_eq!(rowsets.len(), 2);
        assert_eq!(rowsets[0].column_names(), vec!["id"]);
        assert_eq!(rowsets[1].column_names(), vec!["name"]);
    }

    #[test]
    fn test_statements_without_results_yield_no_rowset() {
        let mut driver = open_test_driver();
        let rowsets = driver
            .submit("INSERT INTO events (name) VALUES ('x'); SELECT COUNT(*) AS n FROM events;")
            .unwrap();
        assert_eq!(rowsets.len(), 1);
        assert_eq!(rowsets[0].rows[0], vec![Value::Integer(2)]);
    }

    #[test]
    fn test_declared_temporal_types_are_parsed() {
        let mut driver = open_test_driver();
        let rowsets = driver
            .submit("SELECT on_date, at_time, name FROM events;")
            .unwrap();
        let row = &rowsets[0].rows[0];
        assert_eq!(rowsets[0].columns[0].type_info, TypeInfo::Date);
        assert_eq!(rowsets[0].columns[1].type_info, TypeInfo::DateTime2(3));
        match (&row[0], &row[1]) {
            (Value::DateTime(_), Value::DateTime(_)) => {}
            other => panic!("expected temporal values, got {:?}", other),
        }
        assert_eq!(row[2], Value::Text("launch".to_string()));
    }

    #[test]
    fn test_submit_error_on_bad_sql() {
        let mut driver = open_test_driver();
        let result = driver.submit("SELECT * FROM missing_table;");
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_temporal_variants() {
        assert!(parse_temporal("2021-06-01").is_some());
        assert!(parse_temporal("2021-06-01 10:30").is_some());
        assert!(parse_temporal("2021-06-01 10:30:00.125").is_some());
        assert!(parse_temporal("2021-06-01T10:30:00+02:00").is_some());
        assert!(parse_temporal("not a date").is_none());
    }
}

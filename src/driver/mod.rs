/// Driver Boundary Module
///
/// Defines the data model a database driver produces (row-sets with column
/// name/type/scale metadata) and the trait the rest of the client talks to.
/// The wire protocol itself lives behind `Driver`; the bundled SQLite
/// implementation is in `driver::sqlite`.
use crate::error::Result;
use chrono::NaiveDateTime;

pub mod sqlite;

/// Connection parameters handed to a driver factory.
///
/// Network drivers use the full set; the bundled SQLite driver only needs
/// `database` (a file path or `:memory:`) and the request timeout.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    pub server: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    /// Connection timeout in seconds
    pub connection_timeout: u64,
    /// Per-request timeout in seconds
    pub request_timeout: u64,
    pub encrypt: bool,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        ConnectOptions {
            server: String::new(),
            port: 1433,
            user: "local".to_string(),
            password: String::new(),
            database: ":memory:".to_string(),
            connection_timeout: 30,
            request_timeout: 30,
            encrypt: false,
        }
    }
}

/// Declared column type, carrying the fractional-second scale where the
/// declaration specifies one. Drives temporal literal formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeInfo {
    Date,
    DateTime,
    DateTime2(u8),
    DateTimeOffset(u8),
    SmallDateTime,
    /// Temporal declaration without a dedicated pattern (e.g. TIMESTAMP)
    OtherTemporal,
    /// Anything non-temporal
    Other,
}

impl TypeInfo {
    /// Parses a declared SQL type such as `DATETIME2(3)` or `varchar(40)`.
    pub fn from_decl(decl: &str) -> TypeInfo {
        let upper = decl.trim().to_uppercase();
        let (base, scale) = match upper.find('(') {
            Some(open) => {
                let scale = upper[open + 1..]
                    .trim_end_matches(')')
                    .trim()
                    .parse::<u8>()
                    .ok();
                (upper[..open].trim().to_string(), scale)
            }
            None => (upper, None),
        };
        match base.as_str() {
            "DATE" => TypeInfo::Date,
            "DATETIME" => TypeInfo::DateTime,
            "DATETIME2" => TypeInfo::DateTime2(scale.unwrap_or(7)),
            "DATETIMEOFFSET" => TypeInfo::DateTimeOffset(scale.unwrap_or(7)),
            "SMALLDATETIME" => TypeInfo::SmallDateTime,
            "TIMESTAMP" | "TIME" => TypeInfo::OtherTemporal,
            _ => TypeInfo::Other,
        }
    }

    /// True for any declared type that stores a point in time.
    pub fn is_temporal(&self) -> bool {
        !matches!(self, TypeInfo::Other)
    }
}

/// A single cell value as produced by a driver.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
    /// Temporal value, normalized to UTC by the driver
    DateTime(NaiveDateTime),
}

/// Column metadata attached to a row-set.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub type_info: TypeInfo,
}

/// The ordered rows returned by one statement within a batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Value>>,
}

impl RowSet {
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Handle for interrupting the request currently in flight on a connection.
pub trait Cancel {
    fn cancel(&self);
}

/// A live connection. One batch is submitted at a time; a batch may contain
/// several statements and yields one row-set per statement that produces
/// results.
pub trait Driver {
    fn submit(&mut self, sql: &str) -> Result<Vec<RowSet>>;

    /// Cancellation handle for the next submission, when the backend
    /// supports interruption.
    fn canceller(&self) -> Option<Box<dyn Cancel>> {
        None
    }

    fn close(&mut self) {}
}

/// Connection factory for the bundled backend.
pub fn connect(options: &ConnectOptions) -> Result<Box<dyn Driver>> {
    let driver = sqlite::SqliteDriver::connect(options)?;
    Ok(Box::new(driver))
}

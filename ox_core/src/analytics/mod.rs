//! Reports, summaries and generators over a loaded log.
//!
//! Every report returns a [`ReportTable`]; generators return `.ox` text.
//! Both are dispatched by name through a [`registry::Registry`].

pub mod e1rm;
pub mod generators;
pub mod registry;
pub mod reports;
pub mod summary;

use crate::store::QueryResult;
use crate::{Error, Result};
use chrono::{Datelike, Duration, NaiveDate};
use rusqlite::types::Value;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

pub use e1rm::{brzycki, epley, estimated_1rm, Formula};
pub use registry::{GeneratorDescriptor, PluginDescriptor, Registry, ReportDescriptor};
pub use reports::{session_matrix, volume_over_time};

// ============================================================================
// Time bucketing
// ============================================================================

/// How dates are grouped into periods
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Granularity {
    Daily,
    /// Keyed by the Sunday that starts the week
    Weekly,
    /// `YYYY-Www`, Sunday-based week number
    WeeklyNum,
    Monthly,
}

impl Granularity {
    pub const ALL: [Granularity; 4] = [
        Granularity::Daily,
        Granularity::Weekly,
        Granularity::WeeklyNum,
        Granularity::Monthly,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Granularity::Daily => "daily",
            Granularity::Weekly => "weekly",
            Granularity::WeeklyNum => "weekly-num",
            Granularity::Monthly => "monthly",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| Error::UnknownBucket {
                bin: s.to_string(),
                choices: Self::ALL.map(Granularity::as_str).join(", "),
            })
    }
}

/// Period key for `date`
pub fn bucket(date: NaiveDate, granularity: Granularity) -> String {
    match granularity {
        Granularity::Daily => date.format("%Y-%m-%d").to_string(),
        Granularity::Weekly => {
            let offset = i64::from(date.weekday().num_days_from_sunday());
            (date - Duration::days(offset)).format("%Y-%m-%d").to_string()
        }
        Granularity::WeeklyNum => date.format("%Y-W%U").to_string(),
        Granularity::Monthly => date.format("%Y-%m").to_string(),
    }
}

/// Parse a stored ISO date
pub(crate) fn parse_stored_date(text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map_err(|e| Error::Other(format!("Invalid date '{}' in store: {}", text, e)))
}

/// Round to one decimal place
pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

// ============================================================================
// Tabular results
// ============================================================================

/// One cell of a report table
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    pub fn text(s: impl Into<String>) -> Self {
        Cell::Text(s.into())
    }

    pub fn opt_float(value: Option<f64>) -> Self {
        value.map_or(Cell::Null, Cell::Float)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Int(i) => write!(f, "{}", i),
            Cell::Float(x) => write!(f, "{:?}", x),
            Cell::Text(s) => f.write_str(s),
        }
    }
}

impl From<Value> for Cell {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Cell::Null,
            Value::Integer(i) => Cell::Int(i),
            Value::Real(f) => Cell::Float(f),
            Value::Text(s) => Cell::Text(s),
            Value::Blob(b) => Cell::Text(format!("<{} bytes>", b.len())),
        }
    }
}

/// Column names plus rows
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ReportTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl ReportTable {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<Cell>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl From<QueryResult> for ReportTable {
    fn from(result: QueryResult) -> Self {
        Self {
            columns: result.columns,
            rows: result
                .rows
                .into_iter()
                .map(|row| row.into_iter().map(Cell::from).collect())
                .collect(),
        }
    }
}

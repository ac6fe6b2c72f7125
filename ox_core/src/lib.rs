#![forbid(unsafe_code)]

//! Core domain model and analytics for the ox training log.
//!
//! This crate provides:
//! - Weight units, quantities and the weight/rep grammar
//! - Domain types (sets, movements, sessions, notes, diagnostics)
//! - Syntax tree interface, reference reader and lint
//! - Record building, loading and canonical `.ox` serialization
//! - Relational projection into SQLite
//! - Reports, generators and the registry that dispatches them

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod units;
pub mod grammar;
pub mod syntax;
pub mod lint;
pub mod builder;
pub mod log;
pub mod loader;
pub mod serialize;
pub mod store;
pub mod args;
pub mod analytics;
pub mod export;

// Re-export commonly used types
pub use error::{ArgError, Error, Result};
pub use types::*;
pub use config::Config;
pub use units::{MassUnit, Quantity, UnitSystem};
pub use log::TrainingLog;
pub use loader::{parse_file, parse_source, LiveStore, Snapshot};
pub use serialize::{format_source, ToOx};
pub use store::TrainingStore;
pub use analytics::{Cell, Granularity, Registry, ReportTable};
pub use export::{write_table, OutputFormat};

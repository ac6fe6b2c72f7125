//! Error types for the ox_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for ox_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// SQLite error from the projection store
    #[error("SQL error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Mass unit not present in the unit table
    #[error("Unknown unit '{unit}'. Choose from: {choices}")]
    UnknownUnit { unit: String, choices: String },

    /// Time bucket granularity not recognized
    #[error("Unknown time bin '{bin}'. Choose from: {choices}")]
    UnknownBucket { bin: String, choices: String },

    /// One-rep-max formula not recognized
    #[error("Unknown formula '{formula}'. Choose from: {choices}")]
    UnknownFormula { formula: String, choices: String },

    /// No report registered under this name
    #[error("Unknown report: {name}. Available: {available}")]
    UnknownReport { name: String, available: String },

    /// No generator registered under this name
    #[error("Unknown generator: {name}. Available: {available}")]
    UnknownGenerator { name: String, available: String },

    /// Malformed report/generator argument string
    #[error(transparent)]
    Args(#[from] ArgError),

    /// Referential integrity breach while building the projection
    #[error("Integrity violation: {0}")]
    IntegrityViolation(String),

    /// Query produced no result where one was required
    #[error("Not found: {0}")]
    NotFound(String),

    /// A recognized record whose fields could not be interpreted
    #[error("Malformed record at line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    /// A set that breaks the at-least-one-rep rule
    #[error("Invalid set: {0}")]
    InvalidSet(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Argument syntax errors raised by the flag parser.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArgError {
    #[error("Unknown flag: {0}")]
    UnknownFlag(String),

    #[error("{0} requires a value")]
    MissingFlagValue(String),

    #[error("Missing required flag(s): {}", .0.join(", "))]
    MissingRequired(Vec<String>),

    #[error("Unexpected argument: {0}")]
    UnexpectedArgument(String),

    #[error("Invalid value '{value}' for {flag}: expected {expected}")]
    InvalidValue {
        flag: String,
        value: String,
        expected: &'static str,
    },

    #[error("No closing quotation")]
    UnterminatedQuote,
}

//! Core domain types for training logs.
//!
//! This module defines the entity graph built from a parsed log:
//! - Sets, movements and sessions
//! - Notes (log-level and session-level)
//! - Diagnostics reported while reading a log

use crate::units::Quantity;
use crate::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Entry status
// ============================================================================

/// Status of a dated session
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Completed,
    Planned,
    WeighIn,
}

impl SessionStatus {
    /// Flag character used in `.ox` text
    pub fn flag(self) -> &'static str {
        match self {
            SessionStatus::Completed => "*",
            SessionStatus::Planned => "!",
            SessionStatus::WeighIn => "W",
        }
    }

    /// Value stored in the projection's `status` column
    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::Completed => "completed",
            SessionStatus::Planned => "planned",
            SessionStatus::WeighIn => "weigh_in",
        }
    }
}

/// Marker found in the flag position of a dated line
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryFlag {
    Session(SessionStatus),
    Note,
}

impl EntryFlag {
    pub fn parse(text: &str) -> Option<EntryFlag> {
        match text {
            "*" => Some(EntryFlag::Session(SessionStatus::Completed)),
            "!" => Some(EntryFlag::Session(SessionStatus::Planned)),
            "W" => Some(EntryFlag::Session(SessionStatus::WeighIn)),
            "note" => Some(EntryFlag::Note),
            _ => None,
        }
    }
}

// ============================================================================
// Sets and movements
// ============================================================================

/// One performed set. `weight = None` means bodyweight.
///
/// Deserialization goes through [`TrainingSet::try_new`], so a zero-rep set
/// read from JSON is rejected.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "RawSet")]
pub struct TrainingSet {
    pub reps: u32,
    pub weight: Option<Quantity>,
}

#[derive(Deserialize)]
struct RawSet {
    reps: u32,
    weight: Option<Quantity>,
}

impl TryFrom<RawSet> for TrainingSet {
    type Error = Error;

    fn try_from(raw: RawSet) -> Result<Self> {
        Self::try_new(raw.reps, raw.weight)
    }
}

impl TrainingSet {
    /// Callers must pass `reps >= 1`; use [`TrainingSet::try_new`] for
    /// unchecked input.
    pub fn new(reps: u32, weight: Option<Quantity>) -> Self {
        debug_assert!(reps >= 1, "a set needs at least one rep");
        Self { reps, weight }
    }

    pub fn try_new(reps: u32, weight: Option<Quantity>) -> Result<Self> {
        if reps == 0 {
            return Err(Error::InvalidSet("a set needs at least one rep".into()));
        }
        Ok(Self { reps, weight })
    }

    pub fn bodyweight(reps: u32) -> Self {
        Self::new(reps, None)
    }

    /// reps × weight, undefined for bodyweight sets
    pub fn volume(&self) -> Option<Quantity> {
        self.weight.map(|w| w * self.reps)
    }
}

/// An exercise within a session
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Movement {
    pub name: String,
    pub sets: Vec<TrainingSet>,
    pub note: Option<String>,
}

impl Movement {
    pub fn new(name: impl Into<String>, sets: Vec<TrainingSet>, note: Option<String>) -> Self {
        Self {
            name: name.into(),
            sets,
            note,
        }
    }

    pub fn total_reps(&self) -> u64 {
        self.sets.iter().map(|s| u64::from(s.reps)).sum()
    }

    /// Sum of set volumes, in the unit of the first weighted set.
    /// `None` if no set carries a weight.
    pub fn total_volume(&self) -> Option<Quantity> {
        self.sets
            .iter()
            .filter_map(TrainingSet::volume)
            .reduce(|acc, v| acc + v)
    }

    /// Heaviest weight across weighted sets
    pub fn top_set_weight(&self) -> Option<Quantity> {
        self.sets
            .iter()
            .filter_map(|s| s.weight)
            .reduce(|best, w| if w > best { w } else { best })
    }
}

// ============================================================================
// Notes and sessions
// ============================================================================

/// Free-text annotation. Dated notes stand alone in the log; undated notes
/// belong to the session that contains them.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Note {
    pub text: String,
    pub date: Option<NaiveDate>,
}

impl Note {
    pub fn standalone(text: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            text: text.into(),
            date: Some(date),
        }
    }

    pub fn embedded(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            date: None,
        }
    }
}

/// A dated log entry: either a single line or a named block of movements
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub date: NaiveDate,
    pub status: SessionStatus,
    /// `None` for single-line entries
    pub name: Option<String>,
    pub movements: Vec<Movement>,
    pub notes: Vec<Note>,
}

impl Session {
    /// Single-line entry holding exactly one movement
    pub fn single(date: NaiveDate, status: SessionStatus, movement: Movement) -> Self {
        Self {
            date,
            status,
            name: None,
            movements: vec![movement],
            notes: Vec::new(),
        }
    }

    pub fn named(
        date: NaiveDate,
        status: SessionStatus,
        name: impl Into<String>,
        movements: Vec<Movement>,
        notes: Vec<Note>,
    ) -> Self {
        Self {
            date,
            status,
            name: Some(name.into()),
            movements,
            notes,
        }
    }
}

// ============================================================================
// Diagnostics
// ============================================================================

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
        }
    }
}

/// Position + message + severity. Lines are 1-based, columns 0-based.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Diagnostic {
    pub start_line: usize,
    pub start_col: usize,
    pub end_line: usize,
    pub end_col: usize,
    pub message: String,
    pub severity: Severity,
}

impl Diagnostic {
    pub fn at(span: crate::syntax::Span, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            start_line: span.start_line + 1,
            start_col: span.start_col,
            end_line: span.end_line + 1,
            end_col: span.end_col,
            message: message.into(),
            severity,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Line {}, col {}: {} ({})",
            self.start_line, self.start_col, self.message, self.severity
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::MassUnit;

    fn lb(m: f64) -> Option<Quantity> {
        Some(Quantity::new(m, MassUnit::Pound))
    }

    #[test]
    fn test_bodyweight_set_has_no_volume() {
        let set = TrainingSet::bodyweight(10);
        assert_eq!(set.reps, 10);
        assert!(set.weight.is_none());
        assert!(set.volume().is_none());
    }

    #[test]
    fn test_weighted_set_volume() {
        let set = TrainingSet::new(5, Some(Quantity::new(24.0, MassUnit::Kilogram)));
        assert_eq!(set.volume(), Some(Quantity::new(120.0, MassUnit::Kilogram)));
    }

    #[test]
    fn test_total_reps() {
        let movement = Movement::new("pullups", vec![TrainingSet::bodyweight(5); 3], None);
        assert_eq!(movement.total_reps(), 15);
    }

    #[test]
    fn test_total_reps_past_u32() {
        let movement = Movement::new(
            "pullups",
            vec![TrainingSet::bodyweight(4_000_000_000); 2],
            None,
        );
        assert_eq!(movement.total_reps(), 8_000_000_000);
    }

    #[test]
    fn test_zero_rep_set_rejected() {
        assert!(matches!(TrainingSet::try_new(0, None), Err(Error::InvalidSet(_))));
        assert_eq!(TrainingSet::try_new(3, lb(95.0)).unwrap(), TrainingSet::new(3, lb(95.0)));
    }

    #[test]
    fn test_zero_rep_set_rejected_from_json() {
        assert!(serde_json::from_str::<TrainingSet>(r#"{"reps":0,"weight":null}"#).is_err());

        let set: TrainingSet = serde_json::from_str(r#"{"reps":5,"weight":null}"#).unwrap();
        assert_eq!(set, TrainingSet::bodyweight(5));
    }

    #[test]
    fn test_total_volume_bodyweight() {
        let movement = Movement::new("pushups", vec![TrainingSet::bodyweight(10); 2], None);
        assert!(movement.total_volume().is_none());
    }

    #[test]
    fn test_total_volume_weighted() {
        let movement = Movement::new("bench-press", vec![TrainingSet::new(5, lb(100.0)); 3], None);
        assert_eq!(movement.total_volume(), lb(1500.0));
    }

    #[test]
    fn test_total_volume_ignores_bodyweight_sets() {
        let movement = Movement::new(
            "pullup",
            vec![TrainingSet::bodyweight(8), TrainingSet::new(5, lb(25.0))],
            None,
        );
        assert_eq!(movement.total_volume(), lb(125.0));
    }

    #[test]
    fn test_top_set_weight() {
        let movement = Movement::new(
            "squat",
            vec![
                TrainingSet::new(5, lb(135.0)),
                TrainingSet::new(5, lb(155.0)),
                TrainingSet::new(5, lb(145.0)),
            ],
            None,
        );
        assert_eq!(movement.top_set_weight(), lb(155.0));
    }

    #[test]
    fn test_top_set_weight_bodyweight() {
        let movement = Movement::new("pullups", vec![TrainingSet::bodyweight(10)], None);
        assert!(movement.top_set_weight().is_none());
    }

    #[test]
    fn test_entry_flags() {
        assert_eq!(EntryFlag::parse("*"), Some(EntryFlag::Session(SessionStatus::Completed)));
        assert_eq!(EntryFlag::parse("!"), Some(EntryFlag::Session(SessionStatus::Planned)));
        assert_eq!(EntryFlag::parse("W"), Some(EntryFlag::Session(SessionStatus::WeighIn)));
        assert_eq!(EntryFlag::parse("note"), Some(EntryFlag::Note));
        assert_eq!(EntryFlag::parse("?"), None);
    }

    #[test]
    fn test_diagnostic_is_one_based() {
        let d = Diagnostic::at(
            crate::syntax::Span::new(2, 4, 2, 10),
            "Syntax error",
            Severity::Error,
        );
        assert_eq!(d.start_line, 3);
        assert_eq!(d.start_col, 4);
        assert_eq!(d.to_string(), "Line 3, col 4: Syntax error (error)");
    }
}

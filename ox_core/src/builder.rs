//! Turns syntax-tree nodes into typed log records.
//!
//! Dispatch is on [`NodeKind`]. Every top-level node maps to exactly one
//! [`Record`]; the caller decides what to keep. Two outcomes stay apart:
//! - [`Record::Unsupported`] for categories that are recognized but not built
//!   yet (weigh-ins, planned session blocks)
//! - `Err(Error::MalformedRecord)` for recognized categories whose fields
//!   cannot be interpreted (bad date, unknown flag, missing item)

use crate::grammar::{parse_progressive, parse_rep_scheme};
use crate::syntax::{NodeKind, Span, SyntaxNode};
use crate::types::{
    Diagnostic, EntryFlag, Movement, Note, Session, SessionStatus, Severity, TrainingSet,
};
use crate::{Error, Result};
use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::{debug, warn};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Outcome of building one top-level node
#[derive(Clone, Debug, PartialEq)]
pub enum Record {
    Session(Session),
    Note(Note),
    Unsupported(Unsupported),
    /// Comments, exercise/template blocks and syntax-error nodes
    Skipped,
}

/// Recognized but not yet built
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Unsupported {
    WeighIn { date: NaiveDate },
    PlannedSessionBlock { date: NaiveDate, name: String },
}

impl std::fmt::Display for Unsupported {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Unsupported::WeighIn { date } => write!(f, "weigh-in on {}", date),
            Unsupported::PlannedSessionBlock { date, name } => {
                write!(f, "planned session block '{}' on {}", name, date)
            }
        }
    }
}

/// Builds records and collects non-fatal warnings along the way
#[derive(Debug, Default)]
pub struct RecordBuilder {
    warnings: Vec<Diagnostic>,
}

impl RecordBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Warnings raised so far (pairing mismatches)
    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<Diagnostic> {
        self.warnings
    }

    pub fn build<N: SyntaxNode>(&mut self, node: &N) -> Result<Record> {
        match node.kind() {
            NodeKind::SinglelineEntry => self.build_singleline(node),
            NodeKind::SessionBlock => self.build_session_block(node),
            NodeKind::NoteEntry => build_note_entry(node),
            NodeKind::Comment
            | NodeKind::ExerciseBlock
            | NodeKind::TemplateBlock
            | NodeKind::Error => Ok(Record::Skipped),
            NodeKind::SourceFile
            | NodeKind::ItemLine
            | NodeKind::NoteLine
            | NodeKind::Details
            | NodeKind::Token => Err(malformed(
                node,
                format!("{:?} cannot appear at the top level", node.kind()),
            )),
        }
    }

    fn build_singleline<N: SyntaxNode>(&mut self, node: &N) -> Result<Record> {
        let date = entry_date(node)?;
        let status = match entry_flag(node)? {
            EntryFlag::Session(status) => status,
            EntryFlag::Note => return Err(malformed(node, "note flag on an item line")),
        };
        if status == SessionStatus::WeighIn {
            return Ok(Record::Unsupported(Unsupported::WeighIn { date }));
        }

        let movement = self.build_movement(node)?;
        Ok(Record::Session(Session::single(date, status, movement)))
    }

    fn build_session_block<N: SyntaxNode>(&mut self, node: &N) -> Result<Record> {
        let date = entry_date(node)?;
        let status = match entry_flag(node)? {
            EntryFlag::Session(status) => status,
            EntryFlag::Note => return Err(malformed(node, "note flag on a session header")),
        };
        let name = required_field(node, "name")?;
        let name = name.trim().trim_matches('"').to_string();

        match status {
            SessionStatus::WeighIn => {
                return Ok(Record::Unsupported(Unsupported::WeighIn { date }));
            }
            SessionStatus::Planned => {
                return Ok(Record::Unsupported(Unsupported::PlannedSessionBlock {
                    date,
                    name,
                }));
            }
            SessionStatus::Completed => {}
        }

        let mut movements = Vec::new();
        let mut notes = Vec::new();
        for child in node.children() {
            match child.kind() {
                NodeKind::ItemLine => movements.push(self.build_movement(&child)?),
                NodeKind::NoteLine => {
                    if let Some(text) = present_field(&child, "text") {
                        notes.push(Note::embedded(clean_note(&text)));
                    }
                }
                _ => {}
            }
        }

        if movements.is_empty() {
            return Err(malformed(node, format!("session '{}' has no movements", name)));
        }
        Ok(Record::Session(Session::named(
            date, status, name, movements, notes,
        )))
    }

    /// `item: details` on a single line or inside a block
    fn build_movement<N: SyntaxNode>(&mut self, node: &N) -> Result<Movement> {
        let item = required_field(node, "item")?;
        let name = item.trim().trim_end_matches(':').to_string();

        let (sets, note) = match node.child_by_field("details") {
            Some(details) => self.build_sets(&details),
            None => (Vec::new(), None),
        };
        Ok(Movement::new(name, sets, note))
    }

    fn build_sets<N: SyntaxNode>(&mut self, details: &N) -> (Vec<TrainingSet>, Option<String>) {
        let fields = details_map(details);
        let note = fields.get("note").map(|n| clean_note(n));

        let Some(reps) = fields.get("rep_scheme").and_then(|r| parse_rep_scheme(r)) else {
            return (Vec::new(), note);
        };

        let weights = fields
            .get("weight")
            .map(|w| parse_progressive(w))
            .unwrap_or_default();
        if weights.is_empty() {
            return (reps.into_iter().map(TrainingSet::bodyweight).collect(), note);
        }

        if weights.len() > 1 && weights.len() != reps.len() {
            let message = format!(
                "{} weights for {} sets; reusing the last weight",
                weights.len(),
                reps.len()
            );
            warn!("Potentially incomplete entry: {}", message);
            self.warnings
                .push(Diagnostic::at(details.span(), message, Severity::Warning));
        }

        let sets = reps
            .into_iter()
            .enumerate()
            .map(|(i, r)| TrainingSet::new(r, pad_with_last(&weights, i)))
            .collect();
        (sets, note)
    }
}

fn build_note_entry<N: SyntaxNode>(node: &N) -> Result<Record> {
    let date = entry_date(node)?;
    match entry_flag(node)? {
        EntryFlag::Note => {}
        EntryFlag::Session(_) => return Err(malformed(node, "note entry without note flag")),
    }
    let text = required_field(node, "text")?;
    debug!("Standalone note on {}", date);
    Ok(Record::Note(Note::standalone(clean_note(&text), date)))
}

/// Element `i`, or the last element when `i` runs past the end
fn pad_with_last<T: Copy>(items: &[T], i: usize) -> T {
    items[i.min(items.len() - 1)]
}

/// Field name → text for every named, non-missing detail token
fn details_map<N: SyntaxNode>(details: &N) -> HashMap<String, String> {
    details
        .children()
        .into_iter()
        .filter(|c| c.kind() != NodeKind::Error && !c.is_missing())
        .filter_map(|c| {
            let field = c.field_name()?.to_string();
            Some((field, c.text().to_string()))
        })
        .collect()
}

pub(crate) fn clean_note(text: &str) -> String {
    text.replace(['\'', '"'], "").trim().to_string()
}

fn present_field<N: SyntaxNode>(node: &N, name: &str) -> Option<String> {
    node.child_by_field(name)
        .filter(|c| !c.is_missing())
        .map(|c| c.text().to_string())
}

fn required_field<N: SyntaxNode>(node: &N, name: &str) -> Result<String> {
    present_field(node, name).ok_or_else(|| malformed(node, format!("missing {}", name)))
}

fn entry_date<N: SyntaxNode>(node: &N) -> Result<NaiveDate> {
    let text = required_field(node, "date")?;
    NaiveDate::parse_from_str(&text, DATE_FORMAT)
        .map_err(|e| malformed(node, format!("invalid date '{}': {}", text, e)))
}

fn entry_flag<N: SyntaxNode>(node: &N) -> Result<EntryFlag> {
    let text = required_field(node, "flag")?;
    EntryFlag::parse(&text).ok_or_else(|| malformed(node, format!("unknown flag '{}'", text)))
}

fn malformed<N: SyntaxNode>(node: &N, reason: impl Into<String>) -> Error {
    let Span { start_line, .. } = node.span();
    Error::MalformedRecord {
        line: start_line + 1,
        reason: reason.into(),
    }
}

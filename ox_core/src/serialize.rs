//! Canonical `.ox` rendering of domain values.
//!
//! Output is deterministic and reads back through the reader and record
//! builder to the same sets, reps and weights. [`format_source`] applies
//! the same rendering to a whole document while keeping everything it
//! cannot render faithfully as written.

use crate::builder::{clean_note, Record, RecordBuilder};
use crate::grammar::{parse_combined, parse_rep_scheme, BODYWEIGHT};
use crate::lint::collect_diagnostics;
use crate::log::TrainingLog;
use crate::syntax::{self, NodeKind, SyntaxNode};
use crate::types::{Movement, Note, Session, TrainingSet};
use crate::units::Quantity;
use tracing::debug;

/// Render as `.ox` text
pub trait ToOx {
    fn to_ox(&self) -> String;
}

impl ToOx for Movement {
    /// `name: <weights> <reps> "note"`
    fn to_ox(&self) -> String {
        let mut out = format!("{}:", self.name);

        if let Some((first, rest)) = self.sets.split_first() {
            let uniform_weight = rest.iter().all(|s| same_weight(s, first));
            let uniform_reps = rest.iter().all(|s| s.reps == first.reps);

            let weights = if uniform_weight {
                weight_text(first.weight)
            } else {
                join_slashed(self.sets.iter().map(|s| weight_text(s.weight)))
            };
            let reps = if uniform_weight && uniform_reps {
                format!("{}x{}", self.sets.len(), first.reps)
            } else {
                join_slashed(self.sets.iter().map(|s| s.reps.to_string()))
            };
            out.push_str(&format!(" {} {}", weights, reps));
        }

        if let Some(note) = &self.note {
            out.push_str(&format!(" \"{}\"", note));
        }
        out
    }
}

impl ToOx for Note {
    fn to_ox(&self) -> String {
        match self.date {
            Some(date) => format!("{} note \"{}\"", date, self.text),
            None => format!("note: \"{}\"", self.text),
        }
    }
}

impl ToOx for Session {
    fn to_ox(&self) -> String {
        let flag = self.status.flag();
        match &self.name {
            None => self
                .movements
                .iter()
                .map(|m| format!("{} {} {}", self.date, flag, m.to_ox()))
                .collect::<Vec<_>>()
                .join("\n"),
            Some(name) => {
                let mut lines = vec![
                    "@session".to_string(),
                    format!("{} {} {}", self.date, flag, name),
                ];
                lines.extend(self.notes.iter().map(Note::to_ox));
                lines.extend(self.movements.iter().map(Movement::to_ox));
                lines.push("@end".to_string());
                lines.join("\n")
            }
        }
    }
}

impl ToOx for TrainingLog {
    /// Sessions in log order, then standalone notes. Blocks are followed by
    /// a blank line.
    fn to_ox(&self) -> String {
        let mut out = String::new();
        for session in &self.sessions {
            out.push_str(&session.to_ox());
            out.push('\n');
            if session.name.is_some() {
                out.push('\n');
            }
        }
        for note in &self.notes {
            out.push_str(&note.to_ox());
            out.push('\n');
        }
        out
    }
}

/// Reformat `.ox` text in place.
///
/// Entries keep their source order. Sessions and notes that build cleanly
/// are rewritten canonically; comments, weigh-ins, planned blocks, exercise
/// and template blocks, malformed entries and anything carrying fields the
/// domain model drops are copied through verbatim.
pub fn format_source(text: &str) -> String {
    let root = syntax::parse_source(text);
    format_tree(&&root)
}

/// [`format_source`] over any tree that implements [`SyntaxNode`]
pub fn format_tree<N: SyntaxNode>(root: &N) -> String {
    let mut builder = RecordBuilder::new();
    let mut out = String::new();
    let mut verbatim = 0usize;

    for node in root.children() {
        let warnings_before = builder.warnings().len();
        let canonical = match builder.build(&node) {
            Ok(Record::Session(session)) => Some(session.to_ox()),
            Ok(Record::Note(note)) => Some(note.to_ox()),
            Ok(Record::Unsupported(_) | Record::Skipped) | Err(_) => None,
        };
        let canonical = canonical.filter(|_| {
            builder.warnings().len() == warnings_before
                && collect_diagnostics(&node).is_empty()
                && renders_faithfully(&node)
        });

        match canonical {
            Some(text) => out.push_str(&text),
            None => {
                verbatim += 1;
                out.push_str(node.text().trim_end());
            }
        }
        out.push('\n');
        if matches!(
            node.kind(),
            NodeKind::SessionBlock | NodeKind::ExerciseBlock | NodeKind::TemplateBlock
        ) {
            out.push('\n');
        }
    }

    debug!("Formatted document, {} entries kept verbatim", verbatim);
    out
}

/// False when building the node discards something written in it
fn renders_faithfully<N: SyntaxNode>(node: &N) -> bool {
    match node.kind() {
        NodeKind::Comment | NodeKind::Error => return false,
        NodeKind::Details => return details_are_faithful(node),
        NodeKind::Token if matches!(node.field_name(), Some("text")) => {
            return quoted_cleanly(node.text());
        }
        _ => {}
    }
    !node.is_missing() && node.children().iter().all(|c| renders_faithfully(c))
}

fn details_are_faithful<N: SyntaxNode>(details: &N) -> bool {
    let children = details.children();
    let has_reps = children.iter().any(|c| c.field_name() == Some("rep_scheme"));

    children.iter().all(|c| {
        if c.kind() != NodeKind::Token || c.is_missing() {
            return false;
        }
        match c.field_name() {
            Some("note") => quoted_cleanly(c.text()),
            Some("rep_scheme") => parse_rep_scheme(c.text()).is_some(),
            Some("weight") => {
                has_reps
                    && c.text()
                        .split('/')
                        .all(|slice| slice == BODYWEIGHT || parse_combined(slice).is_some())
            }
            _ => false,
        }
    })
}

/// Quoted text that survives note cleaning unchanged
fn quoted_cleanly(text: &str) -> bool {
    text == format!("\"{}\"", clean_note(text))
}

fn same_weight(a: &TrainingSet, b: &TrainingSet) -> bool {
    match (a.weight, b.weight) {
        (Some(x), Some(y)) => x.unit() == y.unit() && x.magnitude() == y.magnitude(),
        (None, None) => true,
        _ => false,
    }
}

fn weight_text(weight: Option<Quantity>) -> String {
    weight.map_or_else(|| BODYWEIGHT.to_string(), |w| w.to_string())
}

fn join_slashed(parts: impl Iterator<Item = String>) -> String {
    parts.collect::<Vec<_>>().join("/")
}

//! The training log aggregate and its query surface.

use crate::types::{Diagnostic, Movement, Note, Session, SessionStatus};
use crate::{Error, Result};
use chrono::NaiveDate;
use serde::Serialize;

/// Every session and standalone note read from one source text.
///
/// Built once per load and never mutated; a reload produces a new log.
#[derive(Clone, Debug, Default, Serialize)]
pub struct TrainingLog {
    pub sessions: Vec<Session>,
    pub notes: Vec<Note>,
    pub diagnostics: Vec<Diagnostic>,
}

impl TrainingLog {
    pub fn new(sessions: Vec<Session>, notes: Vec<Note>) -> Self {
        Self {
            sessions,
            notes,
            diagnostics: Vec::new(),
        }
    }

    /// Iterate `(date, movement)` in log order, optionally filtered by exact
    /// name. Call again to restart.
    pub fn movements<'a>(
        &'a self,
        name: Option<&'a str>,
    ) -> impl Iterator<Item = (NaiveDate, &'a Movement)> + 'a {
        self.sessions.iter().flat_map(move |session| {
            session
                .movements
                .iter()
                .filter(move |m| name.map_or(true, |n| m.name == n))
                .map(move |m| (session.date, m))
        })
    }

    /// All instances of a movement, oldest first. Same-day instances keep
    /// their log order.
    pub fn movement_history(&self, name: &str) -> Vec<(NaiveDate, &Movement)> {
        let mut history: Vec<_> = self
            .movements(None)
            .filter(|(_, m)| m.name == name)
            .collect();
        history.sort_by_key(|(date, _)| *date);
        history
    }

    pub fn most_recent_session(&self, name: &str) -> Result<(NaiveDate, &Movement)> {
        self.movement_history(name)
            .pop()
            .ok_or_else(|| Error::NotFound(format!("no history for movement '{}'", name)))
    }

    pub fn completed_sessions(&self) -> Vec<&Session> {
        self.sessions_with_status(SessionStatus::Completed)
    }

    pub fn planned_sessions(&self) -> Vec<&Session> {
        self.sessions_with_status(SessionStatus::Planned)
    }

    fn sessions_with_status(&self, status: SessionStatus) -> Vec<&Session> {
        self.sessions.iter().filter(|s| s.status == status).collect()
    }

    /// Distinct movement names in first-seen order
    pub fn movement_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for (_, movement) in self.movements(None) {
            if !names.contains(&movement.name.as_str()) {
                names.push(&movement.name);
            }
        }
        names
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == crate::types::Severity::Error)
    }
}

//! Source text → [`TrainingLog`], and the live snapshot that reloads swap.

use crate::builder::{Record, RecordBuilder};
use crate::lint::collect_diagnostics;
use crate::log::TrainingLog;
use crate::store::TrainingStore;
use crate::syntax::{self, SyntaxNode};
use crate::types::{Diagnostic, Severity};
use crate::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Read `.ox` text into a log. Never fails; problems end up in
/// `log.diagnostics`.
pub fn parse_source(text: &str) -> TrainingLog {
    let root = syntax::parse_source(text);
    load_tree(&&root)
}

pub fn parse_file(path: &Path) -> Result<TrainingLog> {
    let text = std::fs::read_to_string(path)?;
    let log = parse_source(&text);
    info!(
        "Loaded {:?}: {} sessions, {} notes, {} diagnostics",
        path,
        log.sessions.len(),
        log.notes.len(),
        log.diagnostics.len()
    );
    Ok(log)
}

/// Build a log from any tree that implements [`SyntaxNode`]
pub fn load_tree<N: SyntaxNode>(root: &N) -> TrainingLog {
    let mut diagnostics = collect_diagnostics(root);
    let mut builder = RecordBuilder::new();
    let mut log = TrainingLog::default();
    let mut unsupported = 0usize;

    for node in root.children() {
        match builder.build(&node) {
            Ok(Record::Session(session)) => log.sessions.push(session),
            Ok(Record::Note(note)) => log.notes.push(note),
            Ok(Record::Unsupported(what)) => {
                debug!("Skipping unsupported record: {}", what);
                unsupported += 1;
            }
            Ok(Record::Skipped) => {}
            Err(e) => {
                warn!("Skipping record: {}", e);
                diagnostics.push(Diagnostic::at(node.span(), e.to_string(), Severity::Warning));
            }
        }
    }

    if unsupported > 0 {
        info!("{} unsupported record(s) skipped", unsupported);
    }

    diagnostics.extend(builder.into_warnings());
    diagnostics.sort_by_key(|d| (d.start_line, d.start_col));
    log.diagnostics = diagnostics;
    log
}

/// A log together with its projection
#[derive(Debug)]
pub struct Snapshot {
    pub log: TrainingLog,
    pub store: TrainingStore,
}

impl Snapshot {
    pub fn build(log: TrainingLog) -> Result<Self> {
        let store = TrainingStore::build(&log)?;
        Ok(Self { log, store })
    }
}

/// The current snapshot of a log file.
///
/// `reload` builds a complete new snapshot before replacing the current
/// one; on failure the current snapshot stays in place.
#[derive(Debug)]
pub struct LiveStore {
    path: PathBuf,
    current: Snapshot,
}

impl LiveStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let current = Snapshot::build(parse_file(&path)?)?;
        Ok(Self { path, current })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.current
    }

    pub fn log(&self) -> &TrainingLog {
        &self.current.log
    }

    pub fn store(&self) -> &TrainingStore {
        &self.current.store
    }

    /// Re-read the file from disk
    pub fn reload(&mut self) -> Result<&Snapshot> {
        let next = parse_file(&self.path).and_then(Snapshot::build);
        self.swap(next)
    }

    /// Replace the snapshot with one built from `text`
    pub fn reload_from_source(&mut self, text: &str) -> Result<&Snapshot> {
        let next = Snapshot::build(parse_source(text));
        self.swap(next)
    }

    fn swap(&mut self, next: Result<Snapshot>) -> Result<&Snapshot> {
        match next {
            Ok(snapshot) => {
                self.current = snapshot;
                info!("Reloaded {:?}", self.path);
                Ok(&self.current)
            }
            Err(e) => {
                warn!("Reload failed, keeping previous snapshot: {}", e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SessionStatus;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = "\
# training log
2025-01-10 * pullups: BW 5x10
2025-01-10 note \"felt strong\"

@session
2025-01-11 * Upper Day
note: \"Cycle 1\"
bench-press: 135lb 5x5
pullups: BW 3x8
@end

2025-01-12 W 180lb
2025-01-13 ! squat: 185lb 3x5
";

    fn write_log(text: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_parse_source_end_to_end() {
        let log = parse_source(SAMPLE);
        assert_eq!(log.sessions.len(), 3);
        assert_eq!(log.notes.len(), 1);
        assert!(log.diagnostics.is_empty(), "{:?}", log.diagnostics);
        assert_eq!(log.completed_sessions().len(), 2);
        assert_eq!(log.planned_sessions().len(), 1);
        assert_eq!(log.planned_sessions()[0].status, SessionStatus::Planned);
    }

    #[test]
    fn test_malformed_record_becomes_warning() {
        let log = parse_source("2025-02-30 * squat: 185lb 3x5\n2025-01-10 * pullups: BW 5x10\n");
        assert_eq!(log.sessions.len(), 1);
        assert_eq!(log.diagnostics.len(), 1);
        assert_eq!(log.diagnostics[0].severity, Severity::Warning);
        assert_eq!(log.diagnostics[0].start_line, 1);
    }

    #[test]
    fn test_huge_set_count_is_malformed() {
        let log = parse_source("2025-01-10 * squat: 185lb 3000000000000000000x5\n");
        assert!(log.sessions.is_empty());
        assert_eq!(log.diagnostics.len(), 1);
    }

    #[test]
    fn test_diagnostics_are_ordered() {
        let text = "junk\n2025-01-10 * press: 95lb/105lb 5/5/5\nmore junk\n";
        let log = parse_source(text);
        let lines: Vec<_> = log.diagnostics.iter().map(|d| d.start_line).collect();
        assert_eq!(lines, vec![1, 2, 3]);
        assert!(log.has_errors());
    }

    #[test]
    fn test_parse_file() {
        let file = write_log(SAMPLE);
        let log = parse_file(file.path()).unwrap();
        assert_eq!(log.sessions.len(), 3);
    }

    #[test]
    fn test_parse_missing_file() {
        assert!(parse_file(Path::new("/nonexistent/log.ox")).is_err());
    }

    #[test]
    fn test_reload_swaps_snapshot() {
        let file = write_log("2025-01-10 * pullups: BW 5x10\n");
        let mut live = LiveStore::open(file.path()).unwrap();
        assert_eq!(live.store().count("sessions").unwrap(), 1);

        std::fs::write(file.path(), SAMPLE).unwrap();
        live.reload().unwrap();
        assert_eq!(live.log().sessions.len(), 3);
        assert_eq!(live.store().count("sessions").unwrap(), 3);
    }

    #[test]
    fn test_failed_reload_keeps_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.ox");
        std::fs::write(&path, SAMPLE).unwrap();

        let mut live = LiveStore::open(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert!(live.reload().is_err());
        assert_eq!(live.log().sessions.len(), 3);
        assert_eq!(live.store().count("training").unwrap(), 16);
    }

    #[test]
    fn test_reload_from_source() {
        let file = write_log(SAMPLE);
        let mut live = LiveStore::open(file.path()).unwrap();
        live.reload_from_source("2025-03-01 * squat: 225lb 1x5\n").unwrap();
        assert_eq!(live.log().sessions.len(), 1);
        assert_eq!(live.snapshot().store.count("sets").unwrap(), 1);
    }
}

//! Per-exercise summaries computed straight from the log.

use super::{Cell, ReportTable};
use crate::grammar::BODYWEIGHT;
use crate::log::TrainingLog;
use crate::{Error, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Stats {
    pub table: ReportTable,
    pub completed_sessions: usize,
    pub planned_sessions: usize,
    pub unique_exercises: usize,
}

/// One row per exercise: sessions, total reps, last session date
pub fn stats(log: &TrainingLog) -> Stats {
    let mut per_exercise: BTreeMap<&str, (usize, u64, NaiveDate)> = BTreeMap::new();
    for (date, movement) in log.movements(None) {
        let entry = per_exercise
            .entry(movement.name.as_str())
            .or_insert((0, 0, date));
        entry.0 += 1;
        entry.1 = entry.1.saturating_add(movement.total_reps());
        entry.2 = entry.2.max(date);
    }

    let mut table = ReportTable::new(["exercise", "sessions", "total_reps", "last_session"]);
    for (name, (sessions, reps, last)) in &per_exercise {
        table.push(vec![
            Cell::text(*name),
            Cell::Int(*sessions as i64),
            Cell::Int(i64::try_from(*reps).unwrap_or(i64::MAX)),
            Cell::Text(last.to_string()),
        ]);
    }

    Stats {
        table,
        completed_sessions: log.completed_sessions().len(),
        planned_sessions: log.planned_sessions().len(),
        unique_exercises: per_exercise.len(),
    }
}

/// Dated history of one exercise, oldest first
pub fn history(log: &TrainingLog, exercise: &str) -> Result<ReportTable> {
    let entries = log.movement_history(exercise);
    if entries.is_empty() {
        return Err(Error::NotFound(format!("no history found for '{}'", exercise)));
    }

    let mut table = ReportTable::new(["date", "sets_x_reps", "top_weight", "volume"]);
    for (date, movement) in entries {
        let reps = movement
            .sets
            .iter()
            .map(|s| s.reps.to_string())
            .collect::<Vec<_>>()
            .join(" + ");
        let top = movement
            .top_set_weight()
            .map_or_else(|| BODYWEIGHT.to_string(), |w| w.to_string());
        let volume = movement
            .total_volume()
            .map_or(Cell::Null, |v| Cell::Text(v.to_string()));

        table.push(vec![Cell::Text(date.to_string()), Cell::Text(reps), Cell::Text(top), volume]);
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::parse_source;

    const LOG: &str = "\
2025-01-10 * pullups: BW 5x10
@session
2025-01-11 * Upper Day
bench-press: 135lb 5x5
pullups: BW 3x8
@end
2025-01-18 ! bench-press: 140lb 5x5
";

    #[test]
    fn test_stats() {
        let stats = stats(&parse_source(LOG));
        assert_eq!(stats.completed_sessions, 2);
        assert_eq!(stats.planned_sessions, 1);
        assert_eq!(stats.unique_exercises, 2);
        assert_eq!(
            stats.table.rows,
            vec![
                vec![
                    Cell::text("bench-press"),
                    Cell::Int(2),
                    Cell::Int(50),
                    Cell::text("2025-01-18"),
                ],
                vec![
                    Cell::text("pullups"),
                    Cell::Int(2),
                    Cell::Int(74),
                    Cell::text("2025-01-11"),
                ],
            ]
        );
    }

    #[test]
    fn test_stats_total_reps_past_u32() {
        let stats = stats(&parse_source("2025-01-10 * pullups: BW 2x4000000000\n"));
        assert_eq!(stats.table.rows[0][2], Cell::Int(8_000_000_000));
    }

    #[test]
    fn test_history() {
        let table = history(&parse_source(LOG), "pullups").unwrap();
        assert_eq!(
            table.rows,
            vec![
                vec![
                    Cell::text("2025-01-10"),
                    Cell::text("10 + 10 + 10 + 10 + 10"),
                    Cell::text("BW"),
                    Cell::Null,
                ],
                vec![
                    Cell::text("2025-01-11"),
                    Cell::text("8 + 8 + 8"),
                    Cell::text("BW"),
                    Cell::Null,
                ],
            ]
        );
    }

    #[test]
    fn test_history_weighted() {
        let table = history(&parse_source(LOG), "bench-press").unwrap();
        assert_eq!(table.rows[0][2], Cell::text("135lb"));
        assert_eq!(table.rows[0][3], Cell::text("3375lb"));
    }

    #[test]
    fn test_history_unknown_exercise() {
        assert!(matches!(
            history(&parse_source(LOG), "squat"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_stats_empty_log() {
        let stats = stats(&TrainingLog::default());
        assert!(stats.table.is_empty());
        assert_eq!(stats.unique_exercises, 0);
    }
}

//! Volume-over-time and session-matrix reports.

use super::{bucket, parse_stored_date, round1, Cell, Granularity, ReportTable};
use crate::store::TrainingStore;
use crate::units::{MassUnit, UnitSystem};
use crate::Result;
use rusqlite::params;
use std::collections::{BTreeMap, BTreeSet};

pub const VOLUME_COLUMNS: [&str; 4] = ["period", "total_volume", "total_reps", "avg_weight_per_rep"];

#[derive(Default)]
struct VolumeBucket {
    volume: Option<f64>,
    reps: i64,
}

/// Per-period volume for one movement, with weights in `unit`.
///
/// `total_reps` counts bodyweight sets too. `total_volume` and
/// `avg_weight_per_rep` are null for periods without a weighted set.
pub fn volume_over_time(
    store: &TrainingStore,
    movement: &str,
    granularity: Granularity,
    unit: MassUnit,
) -> Result<ReportTable> {
    let mut stmt = store.connection().prepare(
        "SELECT date, reps, weight_magnitude, weight_unit
         FROM training
         WHERE movement_name = ?1
         ORDER BY date, set_id",
    )?;
    let rows = stmt
        .query_map(params![movement], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, Option<f64>>(2)?,
                row.get::<_, Option<String>>(3)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut buckets: BTreeMap<String, VolumeBucket> = BTreeMap::new();
    for (date, reps, magnitude, stored_unit) in rows {
        let period = bucket(parse_stored_date(&date)?, granularity);
        let entry = buckets.entry(period).or_default();
        entry.reps += reps;

        if let (Some(magnitude), Some(stored_unit)) = (magnitude, stored_unit) {
            let from = MassUnit::parse(&stored_unit)?;
            let weight = UnitSystem::convert_units(magnitude, from, unit);
            *entry.volume.get_or_insert(0.0) += reps as f64 * weight;
        }
    }

    let mut table = ReportTable::new(VOLUME_COLUMNS);
    for (period, b) in buckets {
        let avg = match b.volume {
            Some(volume) if b.reps > 0 => Some(round1(volume / b.reps as f64)),
            _ => None,
        };
        table.push(vec![
            Cell::Text(period),
            Cell::opt_float(b.volume.map(round1)),
            Cell::Int(b.reps),
            Cell::opt_float(avg),
        ]);
    }
    Ok(table)
}

/// Distinct-session counts per movement per period.
///
/// Movement columns are ordered by overall session count, most frequent
/// first, ties alphabetical. Cells with no sessions are zero.
pub fn session_matrix(store: &TrainingStore, granularity: Granularity) -> Result<ReportTable> {
    let conn = store.connection();

    let mut stmt = conn.prepare(
        "SELECT name, COUNT(DISTINCT session_id) AS freq
         FROM movements
         GROUP BY name
         ORDER BY freq DESC, name",
    )?;
    let movement_names: Vec<String> = stmt
        .query_map([], |row| row.get(0))?
        .collect::<std::result::Result<_, _>>()?;

    let mut stmt = conn.prepare(
        "SELECT s.date, m.name, s.id
         FROM sessions s
         JOIN movements m ON m.session_id = s.id",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut pivot: BTreeMap<String, BTreeMap<String, BTreeSet<i64>>> = BTreeMap::new();
    for (date, name, session_id) in rows {
        let period = bucket(parse_stored_date(&date)?, granularity);
        pivot
            .entry(period)
            .or_default()
            .entry(name)
            .or_default()
            .insert(session_id);
    }

    let mut table = ReportTable::new(
        std::iter::once("period".to_string()).chain(movement_names.iter().cloned()),
    );
    for (period, counts) in pivot {
        let mut row = vec![Cell::Text(period)];
        row.extend(movement_names.iter().map(|name| {
            let count = counts.get(name).map_or(0, BTreeSet::len);
            Cell::Int(count as i64)
        }));
        table.push(row);
    }
    Ok(table)
}

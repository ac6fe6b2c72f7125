//! Estimated one-rep max from max-effort sets.
//!
//! A set counts when its movement note contains the max-effort marker
//! (`^rm` by default), e.g. `deadlift: 315lb 1x3 "^rm top set felt good"`.

use super::{parse_stored_date, round1, Cell, ReportTable};
use crate::store::TrainingStore;
use crate::units::{MassUnit, UnitSystem};
use crate::{Error, Result};
use rusqlite::params;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const E1RM_COLUMNS: [&str; 5] = ["date", "estimated_1rm", "weight", "reps", "unit"];

/// `weight × 36 / (37 − reps)`; returns `weight` unchanged from 37 reps up
pub fn brzycki(weight: f64, reps: u32) -> f64 {
    if reps >= 37 {
        return weight;
    }
    weight * 36.0 / (37.0 - f64::from(reps))
}

/// `weight × (1 + reps / 30)`
pub fn epley(weight: f64, reps: u32) -> f64 {
    weight * (1.0 + f64::from(reps) / 30.0)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Formula {
    Brzycki,
    Epley,
}

impl Formula {
    pub const ALL: [Formula; 2] = [Formula::Brzycki, Formula::Epley];

    pub fn as_str(self) -> &'static str {
        match self {
            Formula::Brzycki => "brzycki",
            Formula::Epley => "epley",
        }
    }

    pub fn estimate(self, weight: f64, reps: u32) -> f64 {
        match self {
            Formula::Brzycki => brzycki(weight, reps),
            Formula::Epley => epley(weight, reps),
        }
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Formula {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| Error::UnknownFormula {
                formula: s.to_string(),
                choices: Self::ALL.map(Formula::as_str).join(", "),
            })
    }
}

/// Heaviest marked set per date with its estimated 1RM, weights in `unit`
pub fn estimated_1rm(
    store: &TrainingStore,
    movement: &str,
    formula: Formula,
    unit: MassUnit,
    marker: &str,
) -> Result<ReportTable> {
    let mut stmt = store.connection().prepare(
        "SELECT date, weight_magnitude, weight_unit, reps
         FROM training
         WHERE movement_name = ?1
           AND instr(movement_note, ?2) > 0
           AND weight_magnitude IS NOT NULL
         ORDER BY date, set_id",
    )?;
    let rows = stmt
        .query_map(params![movement, marker], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, f64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, u32>(3)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    // date → (weight in output unit, reps); first heaviest set wins
    let mut heaviest: BTreeMap<String, (f64, u32)> = BTreeMap::new();
    for (date, magnitude, stored_unit, reps) in rows {
        let weight = UnitSystem::convert_units(magnitude, MassUnit::parse(&stored_unit)?, unit);
        let date = parse_stored_date(&date)?.to_string();
        let heavier = heaviest.get(&date).map_or(true, |&(best, _)| weight > best);
        if heavier {
            heaviest.insert(date, (weight, reps));
        }
    }

    let mut table = ReportTable::new(E1RM_COLUMNS);
    for (date, (weight, reps)) in heaviest {
        table.push(vec![
            Cell::Text(date),
            Cell::Float(round1(formula.estimate(weight, reps))),
            Cell::Float(round1(weight)),
            Cell::Int(i64::from(reps)),
            Cell::text(unit.symbol()),
        ]);
    }
    Ok(table)
}

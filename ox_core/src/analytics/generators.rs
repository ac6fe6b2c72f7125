//! Built-in program generators. Output is planned `.ox` entries.

use crate::serialize::ToOx;
use crate::types::{Movement, Session, SessionStatus, TrainingSet};
use crate::units::{MassUnit, Quantity};
use chrono::{Duration, NaiveDate};

/// `(fraction of training max, reps)` for the three main sets of each week
const WENDLER_WEEKS: [(&str, [(f64, u32); 3]); 4] = [
    ("5s", [(0.65, 5), (0.75, 5), (0.85, 5)]),
    ("3s", [(0.70, 3), (0.80, 3), (0.90, 3)]),
    ("5/3/1", [(0.75, 5), (0.85, 3), (0.95, 1)]),
    ("Deload", [(0.40, 5), (0.50, 5), (0.60, 5)]),
];

/// Nearest loadable increment: 2.5 kg, otherwise 5 of the unit
pub fn round_to_plates(weight: f64, unit: MassUnit) -> f64 {
    let increment = if unit == MassUnit::Kilogram { 2.5 } else { 5.0 };
    (weight / increment).round() * increment
}

/// Four-week Wendler 5/3/1 cycle, one planned entry per week starting on
/// `start` and spaced seven days apart.
pub fn wendler531(movement: &str, training_max: f64, unit: MassUnit, start: NaiveDate) -> String {
    let tm = Quantity::new(training_max, unit);
    let mut lines = vec![
        format!("# Wendler 5/3/1 for {} (TM: {})", movement, tm),
        String::new(),
    ];

    let mut date = start;
    for (week, sets) in WENDLER_WEEKS {
        let sets = sets
            .iter()
            .map(|&(pct, reps)| {
                let weight = round_to_plates(training_max * pct, unit);
                TrainingSet::new(reps, Some(Quantity::new(weight, unit)))
            })
            .collect();
        let note = format!("{} Week", week);
        let session = Session::single(
            date,
            SessionStatus::Planned,
            Movement::new(movement, sets, Some(note)),
        );
        lines.push(session.to_ox());
        date += Duration::weeks(1);
    }

    let mut text = lines.join("\n");
    text.push('\n');
    text
}

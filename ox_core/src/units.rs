//! Mass units, quantities and conversion.
//!
//! All conversion goes through a fixed, read-only table of factors to the
//! kilogram. Unit strings are resolved through an alias table that accepts
//! short symbols (`kg`, `lb`), plurals and long names.

use crate::{Error, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::ops::{Add, Mul};

/// Closed set of supported mass units
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MassUnit {
    Kilogram,
    Gram,
    Pound,
    Ounce,
    Stone,
}

impl MassUnit {
    pub const ALL: [MassUnit; 5] = [
        MassUnit::Kilogram,
        MassUnit::Gram,
        MassUnit::Pound,
        MassUnit::Ounce,
        MassUnit::Stone,
    ];

    /// Multiplicative factor to the base unit (kilogram)
    pub fn factor(self) -> f64 {
        match self {
            MassUnit::Kilogram => 1.0,
            MassUnit::Gram => 0.001,
            MassUnit::Pound => 0.453_592_37,
            MassUnit::Ounce => 0.028_349_523_125,
            MassUnit::Stone => 6.350_293_18,
        }
    }

    /// Long name, used as the stored unit string in the projection
    pub fn name(self) -> &'static str {
        match self {
            MassUnit::Kilogram => "kilogram",
            MassUnit::Gram => "gram",
            MassUnit::Pound => "pound",
            MassUnit::Ounce => "ounce",
            MassUnit::Stone => "stone",
        }
    }

    /// Short symbol, used when rendering `.ox` text
    pub fn symbol(self) -> &'static str {
        match self {
            MassUnit::Kilogram => "kg",
            MassUnit::Gram => "g",
            MassUnit::Pound => "lb",
            MassUnit::Ounce => "oz",
            MassUnit::Stone => "st",
        }
    }

    /// Resolve a unit string through the alias table.
    ///
    /// Matching is exact: `kg` resolves, `KG` does not.
    pub fn from_alias(text: &str) -> Option<MassUnit> {
        UNIT_ALIASES.get(text).copied()
    }

    /// Like [`MassUnit::from_alias`] but fails with `UnknownUnit`
    pub fn parse(text: &str) -> Result<MassUnit> {
        Self::from_alias(text).ok_or_else(|| Error::UnknownUnit {
            unit: text.to_string(),
            choices: unit_choices(),
        })
    }
}

impl fmt::Display for MassUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

static UNIT_ALIASES: Lazy<HashMap<&'static str, MassUnit>> = Lazy::new(|| {
    let table: [(&str, MassUnit); 17] = [
        ("kg", MassUnit::Kilogram),
        ("kgs", MassUnit::Kilogram),
        ("kilogram", MassUnit::Kilogram),
        ("kilograms", MassUnit::Kilogram),
        ("g", MassUnit::Gram),
        ("gram", MassUnit::Gram),
        ("grams", MassUnit::Gram),
        ("lb", MassUnit::Pound),
        ("lbs", MassUnit::Pound),
        ("pound", MassUnit::Pound),
        ("pounds", MassUnit::Pound),
        ("oz", MassUnit::Ounce),
        ("ounce", MassUnit::Ounce),
        ("ounces", MassUnit::Ounce),
        ("st", MassUnit::Stone),
        ("stone", MassUnit::Stone),
        ("stones", MassUnit::Stone),
    ];
    table.into_iter().collect()
});

fn unit_choices() -> String {
    MassUnit::ALL
        .iter()
        .map(|u| u.symbol())
        .collect::<Vec<_>>()
        .join(", ")
}

/// A mass with its unit. Immutable once constructed.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Quantity {
    magnitude: f64,
    unit: MassUnit,
}

impl Quantity {
    pub fn new(magnitude: f64, unit: MassUnit) -> Self {
        Self { magnitude, unit }
    }

    pub fn magnitude(&self) -> f64 {
        self.magnitude
    }

    pub fn unit(&self) -> MassUnit {
        self.unit
    }

    /// Value expressed in kilograms
    pub fn base_value(&self) -> f64 {
        self.magnitude * self.unit.factor()
    }

    /// Same mass expressed in another unit
    pub fn to_unit(&self, unit: MassUnit) -> Quantity {
        Quantity::new(UnitSystem::convert_units(self.magnitude, self.unit, unit), unit)
    }
}

/// Equality compares the mass, so `1 kg == 1000 g`.
impl PartialEq for Quantity {
    fn eq(&self, other: &Self) -> bool {
        self.partial_cmp(other) == Some(Ordering::Equal)
    }
}

impl PartialOrd for Quantity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.unit == other.unit {
            return self.magnitude.partial_cmp(&other.magnitude);
        }
        self.base_value().partial_cmp(&other.base_value())
    }
}

/// Sums keep the left-hand unit.
impl Add for Quantity {
    type Output = Quantity;

    fn add(self, rhs: Quantity) -> Quantity {
        let rhs = rhs.to_unit(self.unit);
        Quantity::new(self.magnitude + rhs.magnitude, self.unit)
    }
}

impl Mul<u32> for Quantity {
    type Output = Quantity;

    fn mul(self, reps: u32) -> Quantity {
        Quantity::new(self.magnitude * f64::from(reps), self.unit)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", format_magnitude(self.magnitude), self.unit.symbol())
    }
}

/// Render a magnitude without a trailing `.0` for whole numbers
pub fn format_magnitude(magnitude: f64) -> String {
    if magnitude.fract() == 0.0 && magnitude.abs() < 1e15 {
        format!("{}", magnitude as i64)
    } else {
        format!("{}", magnitude)
    }
}

/// Stateless conversion facade over the static unit table
pub struct UnitSystem;

impl UnitSystem {
    /// Convert `magnitude` between two unit strings (symbols, plurals or
    /// long names). Fails with `UnknownUnit` if either side is unknown.
    pub fn convert(magnitude: f64, from: &str, to: &str) -> Result<f64> {
        let from = MassUnit::parse(from)?;
        let to = MassUnit::parse(to)?;
        Ok(Self::convert_units(magnitude, from, to))
    }

    pub fn convert_units(magnitude: f64, from: MassUnit, to: MassUnit) -> f64 {
        if from == to {
            return magnitude;
        }
        magnitude * from.factor() / to.factor()
    }
}

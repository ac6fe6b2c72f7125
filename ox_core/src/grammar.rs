//! Micro-grammars for weight literals and rep schemes.
//!
//! ```text
//! WEIGHT   := COMBINED ('/' COMBINED)*
//! COMBINED := TOKEN ('+' TOKEN)*
//! TOKEN    := NUMBER UNIT | "BW"
//! REPS     := N 'x' R | R ('/' R)*
//! ```
//!
//! A token that does not match yields `None`; callers treat that as
//! bodyweight or absence, never as an error.

use crate::units::{MassUnit, Quantity};
use once_cell::sync::Lazy;
use regex::Regex;

/// Literal marking a bodyweight set
pub const BODYWEIGHT: &str = "BW";

static WEIGHT_TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+(?:\.\d+)?)([A-Za-z]+)$").expect("valid weight regex"));

/// Parse a single `<number><unit>` token.
///
/// `BW` and anything that does not resolve to a mass unit return `None`.
pub fn parse_token(text: &str) -> Option<Quantity> {
    let text = text.trim();
    if text == BODYWEIGHT {
        return None;
    }
    let caps = WEIGHT_TOKEN_RE.captures(text)?;
    let magnitude: f64 = caps[1].parse().ok()?;
    let unit = MassUnit::from_alias(&caps[2])?;
    Some(Quantity::new(magnitude, unit))
}

/// Parse `a+b+...`, summing each side. Fails if any side fails.
pub fn parse_combined(text: &str) -> Option<Quantity> {
    let mut total: Option<Quantity> = None;
    for part in text.split('+') {
        let quantity = parse_token(part)?;
        total = Some(match total {
            Some(sum) => sum + quantity,
            None => quantity,
        });
    }
    total
}

/// Parse `a/b/...`, applying [`parse_combined`] to each slice independently.
///
/// Units are not carried between slices: in `160/185/210lb` only the last
/// slice has a unit, so the first two come back as `None`.
pub fn parse_progressive(text: &str) -> Vec<Option<Quantity>> {
    text.split('/').map(parse_combined).collect()
}

/// Largest set count accepted in an `NxR` rep scheme
pub const MAX_SETS: u32 = 1000;

/// Parse a rep scheme into per-set rep counts.
///
/// `5x3` is five sets of three, `5/3/1` is three sets with explicit reps
/// and a bare `10` is a single set. Zero sets or zero reps fail the scheme,
/// as does an `NxR` count above [`MAX_SETS`].
pub fn parse_rep_scheme(text: &str) -> Option<Vec<u32>> {
    let text = text.trim();
    let reps: Vec<u32> = if text.contains('/') {
        text.split('/')
            .map(|r| r.trim().parse::<u32>().ok())
            .collect::<Option<Vec<_>>>()?
    } else if let Some((sets, reps)) = text.split_once('x') {
        let sets: u32 = sets.trim().parse().ok()?;
        let reps: u32 = reps.trim().parse().ok()?;
        if sets > MAX_SETS {
            return None;
        }
        vec![reps; sets as usize]
    } else {
        vec![text.parse::<u32>().ok()?]
    };

    if reps.is_empty() || reps.contains(&0) {
        return None;
    }
    Some(reps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kg() {
        assert_eq!(parse_token("24kg"), Some(Quantity::new(24.0, MassUnit::Kilogram)));
    }

    #[test]
    fn test_parse_lb_and_aliases() {
        assert_eq!(parse_token("135lb"), Some(Quantity::new(135.0, MassUnit::Pound)));
        assert_eq!(parse_token("135lbs"), Some(Quantity::new(135.0, MassUnit::Pound)));
        assert_eq!(parse_token("135pound"), Some(Quantity::new(135.0, MassUnit::Pound)));
        assert_eq!(
            parse_token("24kilogram"),
            Some(Quantity::new(24.0, MassUnit::Kilogram))
        );
    }

    #[test]
    fn test_parse_small_and_imperial_units() {
        assert_eq!(parse_token("500g"), Some(Quantity::new(500.0, MassUnit::Gram)));
        assert_eq!(parse_token("16oz"), Some(Quantity::new(16.0, MassUnit::Ounce)));
        assert_eq!(parse_token("12stone"), Some(Quantity::new(12.0, MassUnit::Stone)));
    }

    #[test]
    fn test_parse_decimal_weight() {
        assert_eq!(parse_token("2.5kg"), Some(Quantity::new(2.5, MassUnit::Kilogram)));
    }

    #[test]
    fn test_rejects_non_mass_unit() {
        assert_eq!(parse_token("100m"), None);
        assert_eq!(parse_token("30min"), None);
    }

    #[test]
    fn test_parse_invalid() {
        assert_eq!(parse_token("100"), None);
        assert_eq!(parse_token("abc"), None);
        assert_eq!(parse_token(""), None);
        assert_eq!(parse_token(BODYWEIGHT), None);
    }

    #[test]
    fn test_token_round_trips_through_unit_system() {
        for text in ["24kg", "135lb", "2.5kg", "500g", "16oz", "12stone"] {
            let q = parse_token(text).unwrap();
            let back = crate::units::UnitSystem::convert(
                q.magnitude(),
                q.unit().name(),
                q.unit().symbol(),
            )
            .unwrap();
            assert_eq!(back, q.magnitude());
        }
    }

    #[test]
    fn test_combined_weights() {
        let result = parse_combined("24kg+32kg").unwrap();
        assert_eq!(result.magnitude(), 56.0);
        assert_eq!(result.unit(), MassUnit::Kilogram);
    }

    #[test]
    fn test_combined_fails_if_any_side_fails() {
        assert_eq!(parse_combined("24kg+32"), None);
        assert_eq!(parse_combined("BW+10kg"), None);
    }

    #[test]
    fn test_progressive_weights_explicit_units() {
        let result = parse_progressive("24kg/32kg/48kg");
        assert_eq!(
            result,
            vec![
                Some(Quantity::new(24.0, MassUnit::Kilogram)),
                Some(Quantity::new(32.0, MassUnit::Kilogram)),
                Some(Quantity::new(48.0, MassUnit::Kilogram)),
            ]
        );
    }

    #[test]
    fn test_progressive_weights_implied_unit_is_not_inferred() {
        // Each slice is parsed on its own; "160" and "185" have no unit and
        // "210lb" is a valid token only in the last slice.
        let result = parse_progressive("160/185/210lb");
        assert_eq!(result.len(), 3);
        assert_eq!(result[0], None);
        assert_eq!(result[1], None);
        assert_eq!(result[2], Some(Quantity::new(210.0, MassUnit::Pound)));
    }

    #[test]
    fn test_combined_and_progressive() {
        let result = parse_progressive("24kg+32kg/48kg+56kg");
        assert_eq!(result.len(), 2);
        assert_eq!(result[0], Some(Quantity::new(56.0, MassUnit::Kilogram)));
        assert_eq!(result[1], Some(Quantity::new(104.0, MassUnit::Kilogram)));
    }

    #[test]
    fn test_rep_schemes() {
        assert_eq!(parse_rep_scheme("5x5"), Some(vec![5; 5]));
        assert_eq!(parse_rep_scheme("3x10"), Some(vec![10, 10, 10]));
        assert_eq!(parse_rep_scheme("5/3/1"), Some(vec![5, 3, 1]));
        assert_eq!(parse_rep_scheme("12"), Some(vec![12]));
    }

    #[test]
    fn test_rep_scheme_failures() {
        assert_eq!(parse_rep_scheme("5x"), None);
        assert_eq!(parse_rep_scheme("5/a/1"), None);
        assert_eq!(parse_rep_scheme("3x0"), None);
        assert_eq!(parse_rep_scheme("0x5"), None);
        assert_eq!(parse_rep_scheme("abc"), None);
    }

    #[test]
    fn test_rep_scheme_set_count_is_capped() {
        assert_eq!(parse_rep_scheme("1000x1").map(|r| r.len()), Some(1000));
        assert_eq!(parse_rep_scheme("1001x5"), None);
        assert_eq!(parse_rep_scheme("3000000000000000000x5"), None);
    }
}

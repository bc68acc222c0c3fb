//! Set shorthand parser.
//!
//! Turns text like `"2x9x5, 3x12+2+1x30"` into individual sets. Each entry
//! is `AMOUNTxREPSxWEIGHT`; entries are separated by commas, semicolons or
//! whitespace. Reps may carry struggle reps (`BASE+S1+S2...`), credited at
//! half value rounded up.

use crate::error::ParseError;
use crate::types::{format_weight, RecordedSet, SetEntry};
use rust_decimal::Decimal;

/// Weights must stay below this (7 digits, 2 decimal places)
pub(crate) const WEIGHT_LIMIT: i64 = 100_000;

/// Most sets one input may expand to
const SET_LIMIT: u32 = 1_000;

/// Parse shorthand into sets with a running `set_number` starting at 1.
///
/// Either every entry parses or the whole input is rejected.
pub fn parse_sets(text: &str) -> Result<Vec<SetEntry>, ParseError> {
    let mut sets = Vec::new();
    let mut set_number = 1;

    for entry in text
        .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .filter(|e| !e.is_empty())
    {
        let (amount, reps, weight) = parse_entry(entry)?;
        if amount > SET_LIMIT - (set_number - 1) {
            return Err(ParseError::new(format!(
                "Too many sets in '{}'. At most {} sets at once.",
                entry, SET_LIMIT
            )));
        }
        for _ in 0..amount {
            sets.push(SetEntry {
                set_number,
                reps,
                weight,
            });
            set_number += 1;
        }
    }

    tracing::debug!("Parsed {} sets from {:?}", sets.len(), text);
    Ok(sets)
}

fn parse_entry(entry: &str) -> Result<(u32, u32, Decimal), ParseError> {
    let lowered = entry.to_lowercase();
    let parts: Vec<&str> = lowered.split('x').collect();
    let [amount, reps, weight] = parts.as_slice() else {
        return Err(ParseError::new(format!(
            "Invalid format: '{}'. Use AMOUNTxREPSxWEIGHT.",
            entry
        )));
    };

    let non_numeric = || ParseError::new(format!("Non-numeric value in '{}'.", entry));

    let amount: u32 = amount.parse().map_err(|_| non_numeric())?;
    let reps = parse_reps(reps).ok_or_else(non_numeric)?;
    let weight: f64 = weight.parse().map_err(|_| non_numeric())?;
    if !weight.is_finite() {
        return Err(non_numeric());
    }

    if reps == 0 {
        return Err(ParseError::new(format!(
            "Reps must be at least 1 in '{}'.",
            entry
        )));
    }

    let weight = to_storage_weight(weight).ok_or_else(|| {
        ParseError::new(format!(
            "Weight must be 0 or more and below {} in '{}'.",
            WEIGHT_LIMIT, entry
        ))
    })?;

    Ok((amount, reps, weight))
}

/// `BASE` or `BASE+S1+S2...`, where struggle reps count half, rounded up
fn parse_reps(text: &str) -> Option<u32> {
    let mut tokens = text.split('+');
    let base: u64 = tokens.next()?.parse().ok()?;

    let mut struggle: u64 = 0;
    for token in tokens {
        struggle = struggle.checked_add(token.parse().ok()?)?;
    }

    u32::try_from(base.checked_add(struggle.div_ceil(2))?).ok()
}

/// Round to cents and reject what the store cannot hold
fn to_storage_weight(weight: f64) -> Option<Decimal> {
    if weight < 0.0 {
        return None;
    }
    let weight = Decimal::from_f64_retain(weight)?.round_dp(2).normalize();
    (weight < Decimal::from(WEIGHT_LIMIT)).then_some(weight)
}

/// Render stored sets as `SETNUMxREPSxWEIGHT`, comma separated
pub fn format_compact<'a>(sets: impl IntoIterator<Item = &'a RecordedSet>) -> String {
    sets.into_iter()
        .map(|s| format!("{}x{}x{}", s.set_number, s.reps, format_weight(s.weight)))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn numbers(sets: &[SetEntry]) -> Vec<u32> {
        sets.iter().map(|s| s.set_number).collect()
    }

    #[test]
    fn test_single_entry() {
        let sets = parse_sets("2x9x5").unwrap();
        assert_eq!(sets.len(), 2);
        assert_eq!(numbers(&sets), vec![1, 2]);
        for set in &sets {
            assert_eq!(set.reps, 9);
            assert_eq!(set.weight, Decimal::from(5));
        }
    }

    #[test]
    fn test_set_numbers_run_across_entries() {
        let sets = parse_sets("2x9x5, 3x12x30").unwrap();
        assert_eq!(numbers(&sets), vec![1, 2, 3, 4, 5]);
        assert_eq!(sets[2].reps, 12);
        assert_eq!(sets[2].weight, Decimal::from(30));
    }

    #[test]
    fn test_struggle_reps_round_up() {
        let sets = parse_sets("1x15+5+3+4x20").unwrap();
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].reps, 21);
        assert_eq!(sets[0].weight, Decimal::from(20));

        // a single struggle rep still earns one credited rep
        assert_eq!(parse_sets("1x8+1x20").unwrap()[0].reps, 9);
    }

    #[test]
    fn test_mixed_separators_and_case() {
        let sets = parse_sets("  1X5X100;2x3x110\n\t1x1x120,, ").unwrap();
        assert_eq!(sets.len(), 4);
        assert_eq!(sets[3].weight, Decimal::from(120));
    }

    #[test]
    fn test_fractional_weight() {
        let sets = parse_sets("1x10x12.5").unwrap();
        assert_eq!(sets[0].weight, Decimal::new(125, 1));

        let sets = parse_sets("1x10x0.1").unwrap();
        assert_eq!(sets[0].weight.to_string(), "0.1");
    }

    #[test]
    fn test_zero_amount_emits_nothing() {
        let sets = parse_sets("0x9x5, 1x5x5").unwrap();
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].set_number, 1);
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_sets("").unwrap().is_empty());
        assert!(parse_sets(" , ; ").unwrap().is_empty());
    }

    #[test]
    fn test_wrong_shape_rejected() {
        let err = parse_sets("2x9").unwrap_err();
        assert_eq!(
            err.message(),
            "Invalid format: '2x9'. Use AMOUNTxREPSxWEIGHT."
        );
        assert!(parse_sets("1x2x3x4").is_err());
    }

    #[test]
    fn test_non_numeric_rejected() {
        let err = parse_sets("ax9x5").unwrap_err();
        assert_eq!(err.message(), "Non-numeric value in 'ax9x5'.");

        assert!(parse_sets("2x9xheavy").is_err());
        assert!(parse_sets("-2x9x5").is_err());
        assert!(parse_sets("1x15+x20").is_err());
        assert!(parse_sets("1x10xinf").is_err());
    }

    #[test]
    fn test_one_bad_entry_rejects_everything() {
        let err = parse_sets("2x9x5, 3x12").unwrap_err();
        assert!(err.message().contains("'3x12'"));
    }

    #[test]
    fn test_zero_reps_and_negative_weight_rejected() {
        assert!(parse_sets("1x0x50").is_err());
        assert!(parse_sets("1x5x-10").is_err());
        assert!(parse_sets("1x5x100000").is_err());
    }

    #[test]
    fn test_set_count_is_bounded() {
        let err = parse_sets("4000000000x1x1").unwrap_err();
        assert_eq!(
            err.message(),
            "Too many sets in '4000000000x1x1'. At most 1000 sets at once."
        );

        assert_eq!(parse_sets("1000x1x1").unwrap().len(), 1000);

        // the limit covers the whole input, not each entry alone
        let err = parse_sets("600x5x20 500x5x20").unwrap_err();
        assert!(err.message().contains("'500x5x20'"));
    }

    #[test]
    fn test_weight_limit_message() {
        let err = parse_sets("1x5x100000").unwrap_err();
        assert_eq!(
            err.message(),
            "Weight must be 0 or more and below 100000 in '1x5x100000'."
        );
        assert!(parse_sets("1x5x99999.99").is_ok());
    }

    #[test]
    fn test_format_compact() {
        let workout_id = Uuid::new_v4();
        let exercise_id = Uuid::new_v4();
        let sets: Vec<RecordedSet> = [(1, 9, Decimal::from(5)), (2, 12, Decimal::new(3250, 2))]
            .into_iter()
            .map(|(set_number, reps, weight)| RecordedSet {
                id: Uuid::new_v4(),
                workout_id,
                exercise_id,
                set_number,
                reps,
                weight,
            })
            .collect();

        assert_eq!(format_compact(&sets), "1x9x5, 2x12x32.5");
    }
}

//! Personal record recalculation.
//!
//! Auto-detected PRs are never patched in place. Every recalculation for a
//! (user, exercise) pair throws the old auto PRs away and replays the whole
//! set history in date order:
//!
//! 1. Sets are grouped by workout date.
//! 2. Each day is reduced to per-key candidates: max weight per rep count,
//!    max reps per weight, and set count per (reps, weight).
//! 3. A candidate that strictly beats the running best for its key becomes
//!    a new record pointing back at the best it replaced.
//! 4. Per key, the latest-dated record is current; earlier ones are history.
//!
//! Manual records are invisible to all of this.

use crate::store::RecordStore;
use crate::types::{ContextKey, DatedSet, PersonalRecord, PrType};
use crate::Result;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

/// A running best for one key
#[derive(Clone, Copy, Debug)]
struct Best<T> {
    value: T,
    date: NaiveDate,
}

/// Bests seen so far during one replay
#[derive(Debug, Default)]
struct RunningBests {
    weight_by_reps: HashMap<u32, Best<Decimal>>,
    reps_by_weight: HashMap<Decimal, Best<u32>>,
    sets_by_pair: HashMap<(u32, Decimal), Best<u32>>,
}

/// One day's candidates, aggregated before comparing against the bests
#[derive(Debug, Default)]
struct DayCandidates {
    max_weight: BTreeMap<u32, Decimal>,
    max_reps: BTreeMap<Decimal, u32>,
    set_counts: BTreeMap<(u32, Decimal), u32>,
}

impl DayCandidates {
    fn collect<'a>(sets: impl IntoIterator<Item = &'a DatedSet>) -> Self {
        let mut day = Self::default();
        for set in sets {
            day.max_weight
                .entry(set.reps)
                .and_modify(|w| *w = (*w).max(set.weight))
                .or_insert(set.weight);
            day.max_reps
                .entry(set.weight)
                .and_modify(|r| *r = (*r).max(set.reps))
                .or_insert(set.reps);
            *day.set_counts.entry((set.reps, set.weight)).or_insert(0) += 1;
        }
        day
    }
}

/// Rebuild the auto PR ledger for one user and exercise.
///
/// Deletes the existing auto PRs and inserts the replayed ones inside a
/// single store transaction, so a failure leaves the previous ledger intact.
/// Returns the records that ended up current.
pub fn recalculate_prs<S: RecordStore>(
    store: &mut S,
    user: &str,
    exercise_id: Uuid,
) -> Result<Vec<PersonalRecord>> {
    store.transaction(|store| {
        let removed = store.delete_auto_records(user, exercise_id)?;
        let sets = store.sets_for(user, exercise_id)?;

        let records = replay(user, exercise_id, &sets);
        let current: Vec<PersonalRecord> =
            records.iter().filter(|r| r.is_current).cloned().collect();

        tracing::info!(
            "Recalculated PRs for {} / {}: {} sets, {} removed, {} created, {} current",
            user,
            exercise_id,
            sets.len(),
            removed,
            records.len(),
            current.len()
        );

        store.insert_records(records)?;
        Ok(current)
    })
}

/// Replay sets (any order) into a fresh ledger of auto PRs with `is_current` resolved
pub fn replay(user: &str, exercise_id: Uuid, sets: &[DatedSet]) -> Vec<PersonalRecord> {
    let mut by_date: BTreeMap<NaiveDate, Vec<&DatedSet>> = BTreeMap::new();
    for set in sets {
        by_date.entry(set.date).or_default().push(set);
    }

    let emit = |pr_type, reps, weight, sets, date, previous: Option<(Decimal, NaiveDate)>| {
        PersonalRecord {
            id: Uuid::new_v4(),
            user: user.to_string(),
            exercise_id,
            pr_type,
            reps,
            weight,
            sets,
            date,
            previous_value: previous.map(|(value, _)| value),
            previous_date: previous.map(|(_, date)| date),
            is_current: true,
            is_manual: false,
            created_at: Utc::now(),
        }
    };

    let mut bests = RunningBests::default();
    let mut records = Vec::new();

    for (date, day_sets) in by_date {
        let day = DayCandidates::collect(day_sets);

        for (reps, weight) in day.max_weight {
            let prev = bests.weight_by_reps.get(&reps).copied();
            if prev.map_or(true, |best| weight > best.value) {
                let previous = prev.map(|best| (best.value, best.date));
                records.push(emit(PrType::Weight, reps, weight, 1, date, previous));
                bests
                    .weight_by_reps
                    .insert(reps, Best { value: weight, date });
            }
        }

        for (weight, reps) in day.max_reps {
            let prev = bests.reps_by_weight.get(&weight).copied();
            if prev.map_or(true, |best| reps > best.value) {
                let previous = prev.map(|best| (Decimal::from(best.value), best.date));
                records.push(emit(PrType::Reps, reps, weight, 1, date, previous));
                bests
                    .reps_by_weight
                    .insert(weight, Best { value: reps, date });
            }
        }

        for ((reps, weight), count) in day.set_counts {
            let prev = bests.sets_by_pair.get(&(reps, weight)).copied();
            if prev.map_or(true, |best| count > best.value) {
                let previous = prev.map(|best| (Decimal::from(best.value), best.date));
                records.push(emit(PrType::Sets, reps, weight, count, date, previous));
                bests
                    .sets_by_pair
                    .insert((reps, weight), Best { value: count, date });
            }
        }
    }

    mark_current(&mut records);
    records
}

/// Keep `is_current` only on the latest-dated record per (pr_type, key).
///
/// Equal dates go to the record that comes later in the list.
pub fn mark_current(records: &mut [PersonalRecord]) {
    let mut latest: HashMap<(PrType, ContextKey), usize> = HashMap::new();
    for (idx, record) in records.iter().enumerate() {
        let key = (record.pr_type, record.context_key());
        let newer = match latest.get(&key) {
            Some(&seen) => records[seen].date <= record.date,
            None => true,
        };
        if newer {
            latest.insert(key, idx);
        }
    }

    for record in records.iter_mut() {
        record.is_current = false;
    }
    for idx in latest.into_values() {
        records[idx].is_current = true;
    }
}

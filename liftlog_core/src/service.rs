//! Operations behind the user-facing commands.
//!
//! Every mutation of recorded sets is followed by a full PR recalculation
//! for the affected exercise. Those operations (`add_sets`, `delete_set`,
//! `recalculate_all`) run inside a ledger transaction, so a failure anywhere
//! leaves the ledger as it was. The remaining operations validate first
//! and only then make their change, which cannot fail.

use crate::error::ParseError;
use crate::parser::{parse_sets, WEIGHT_LIMIT};
use crate::records::recalculate_prs;
use crate::store::{Ledger, RecordStore};
use crate::types::{
    format_weight, Exercise, PersonalRecord, PrType, RecordSignature, RecordedSet, Workout,
};
use crate::{Error, Result};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashSet;
use uuid::Uuid;

/// A "new PR!" event for display
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct PrNotification {
    pub pr_type: PrType,
    pub label: &'static str,
    pub exercise: String,
    pub reps: u32,
    pub weight: String,
    pub sets: u32,
    pub date: String,
    pub previous_value: Option<String>,
    pub previous_date: Option<String>,
}

impl PrNotification {
    fn new(record: &PersonalRecord, exercise: &str) -> Self {
        Self {
            pr_type: record.pr_type,
            label: record.pr_type.label(),
            exercise: exercise.to_string(),
            reps: record.reps,
            weight: format_weight(record.weight),
            sets: record.sets,
            date: record.date.to_string(),
            previous_value: record.previous_value.map(format_weight),
            previous_date: record.previous_date.map(|d| d.to_string()),
        }
    }
}

/// Result of recording a batch of sets
#[derive(Clone, Debug)]
pub struct AddSetsOutcome {
    pub workout_id: Uuid,
    pub sets: Vec<RecordedSet>,
    pub notifications: Vec<PrNotification>,
}

/// Result of deleting a set
#[derive(Clone, Debug)]
pub struct SetDeleted {
    pub exercise_id: Uuid,
    pub workout_removed: bool,
}

/// A user-entered PR, bypassing detection
#[derive(Clone, Debug)]
pub struct ManualPr {
    pub exercise_id: Uuid,
    pub pr_type: PrType,
    pub reps: u32,
    pub weight: Decimal,
    pub sets: u32,
    pub date: NaiveDate,
}

fn visible_exercise<'a>(
    ledger: &'a Ledger,
    user: &str,
    exercise_id: Uuid,
) -> Result<&'a Exercise> {
    ledger
        .exercise(exercise_id)
        .filter(|e| e.is_visible_to(user))
        .ok_or_else(|| Error::NotFound(format!("exercise {}", exercise_id)))
}

/// A set together with its workout, if both belong to `user`
fn owned_set(ledger: &Ledger, user: &str, set_id: Uuid) -> Result<(RecordedSet, Workout)> {
    ledger
        .set(set_id)
        .and_then(|set| {
            ledger
                .workout(set.workout_id)
                .filter(|w| w.user == user)
                .map(|w| (set.clone(), w.clone()))
        })
        .ok_or_else(|| Error::NotFound(format!("set {}", set_id)))
}

/// Parse `text`, store the sets in the user's workout on `date` and
/// recalculate PRs for the exercise.
///
/// Notifications cover the current PRs dated `date` that did not already
/// exist with the same values before this call.
pub fn add_sets(
    ledger: &mut Ledger,
    user: &str,
    exercise_id: Uuid,
    date: NaiveDate,
    text: &str,
) -> Result<AddSetsOutcome> {
    let exercise_name = visible_exercise(ledger, user, exercise_id)?.name.clone();

    let parsed = parse_sets(text)?;
    if parsed.is_empty() {
        return Err(ParseError::new("No sets given. Use AMOUNTxREPSxWEIGHT.").into());
    }

    ledger.transaction(|ledger| {
        let workout_id = match ledger.workout_on(user, date) {
            Some(workout) => workout.id,
            None => {
                let workout = Workout {
                    id: Uuid::new_v4(),
                    user: user.to_string(),
                    date,
                    notes: String::new(),
                    created_at: Utc::now(),
                };
                tracing::info!("Created workout for {} on {}", user, date);
                let id = workout.id;
                ledger.workouts.push(workout);
                id
            }
        };

        let sets: Vec<RecordedSet> = parsed
            .into_iter()
            .map(|entry| RecordedSet {
                id: Uuid::new_v4(),
                workout_id,
                exercise_id,
                set_number: entry.set_number,
                reps: entry.reps,
                weight: entry.weight,
            })
            .collect();
        ledger.sets.extend(sets.iter().cloned());
        tracing::info!(
            "Recorded {} sets of {} for {} on {}",
            sets.len(),
            exercise_name,
            user,
            date
        );

        let existing: HashSet<RecordSignature> = ledger
            .records
            .iter()
            .filter(|r| {
                r.user == user && r.exercise_id == exercise_id && r.date == date && !r.is_manual
            })
            .map(|r| r.signature())
            .collect();

        let current = recalculate_prs(ledger, user, exercise_id)?;
        let notifications = current
            .iter()
            .filter(|r| r.date == date && !existing.contains(&r.signature()))
            .map(|r| PrNotification::new(r, &exercise_name))
            .collect();

        Ok(AddSetsOutcome {
            workout_id,
            sets,
            notifications,
        })
    })
}

/// Delete one of the user's sets, drop its workout if now empty and
/// recalculate PRs for the set's exercise.
pub fn delete_set(ledger: &mut Ledger, user: &str, set_id: Uuid) -> Result<SetDeleted> {
    let (set, workout) = owned_set(ledger, user, set_id)?;

    ledger.transaction(|ledger| {
        ledger.sets.retain(|s| s.id != set_id);
        let workout_removed = ledger.sets_in_workout(workout.id).next().is_none();
        if workout_removed {
            ledger.workouts.retain(|w| w.id != workout.id);
            tracing::info!("Removed empty workout on {}", workout.date);
        }

        recalculate_prs(ledger, user, set.exercise_id)?;
        Ok(SetDeleted {
            exercise_id: set.exercise_id,
            workout_removed,
        })
    })
}

/// Store a manual PR. Recalculation never touches it.
pub fn add_manual_pr(ledger: &mut Ledger, user: &str, pr: ManualPr) -> Result<PersonalRecord> {
    visible_exercise(ledger, user, pr.exercise_id)?;
    if pr.reps == 0 {
        return Err(Error::Invalid("reps must be at least 1".into()));
    }
    if pr.sets == 0 {
        return Err(Error::Invalid("sets must be at least 1".into()));
    }
    let weight = pr.weight.round_dp(2).normalize();
    if weight < Decimal::ZERO || weight >= Decimal::from(WEIGHT_LIMIT) {
        return Err(Error::Invalid(format!(
            "weight must be 0 or more and below {}",
            WEIGHT_LIMIT
        )));
    }

    let record = PersonalRecord {
        id: Uuid::new_v4(),
        user: user.to_string(),
        exercise_id: pr.exercise_id,
        pr_type: pr.pr_type,
        reps: pr.reps,
        weight,
        sets: pr.sets,
        date: pr.date,
        previous_value: None,
        previous_date: None,
        is_current: true,
        is_manual: true,
        created_at: Utc::now(),
    };
    ledger.records.push(record.clone());
    tracing::info!("Added manual {} for {}", pr.pr_type.label(), user);
    Ok(record)
}

/// Flip a manual weight PR for the given set. Returns whether one is now active.
pub fn toggle_manual_pr(ledger: &mut Ledger, user: &str, set_id: Uuid) -> Result<bool> {
    let (set, workout) = owned_set(ledger, user, set_id)?;

    let matches = |r: &PersonalRecord| {
        r.is_manual
            && r.user == user
            && r.exercise_id == set.exercise_id
            && r.pr_type == PrType::Weight
            && r.reps == set.reps
            && r.weight == set.weight
            && r.date == workout.date
    };

    if let Some(pos) = ledger.records.iter().position(matches) {
        ledger.records.remove(pos);
        tracing::info!("Removed manual weight PR for set {}", set_id);
        return Ok(false);
    }

    add_manual_pr(
        ledger,
        user,
        ManualPr {
            exercise_id: set.exercise_id,
            pr_type: PrType::Weight,
            reps: set.reps,
            weight: set.weight,
            sets: 1,
            date: workout.date,
        },
    )?;
    Ok(true)
}

/// Delete a manual PR. Auto-detected records can only change through their sets.
pub fn delete_manual_pr(ledger: &mut Ledger, user: &str, record_id: Uuid) -> Result<()> {
    let record = ledger
        .record(record_id)
        .filter(|r| r.user == user)
        .ok_or_else(|| Error::NotFound(format!("record {}", record_id)))?;
    if !record.is_manual {
        return Err(Error::Invalid(
            "auto-detected records are rebuilt from sets and cannot be deleted".into(),
        ));
    }

    ledger.records.retain(|r| r.id != record_id);
    Ok(())
}

/// Create a private exercise for `user`
pub fn create_exercise(
    ledger: &mut Ledger,
    user: &str,
    name: &str,
    description: &str,
) -> Result<Exercise> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Invalid("exercise name is required".into()));
    }
    if ledger.find_exercise(user, name).is_some() {
        return Err(Error::AlreadyExists(format!("exercise '{}'", name)));
    }

    let exercise = Exercise {
        id: Uuid::new_v4(),
        owner: Some(user.to_string()),
        name: name.to_string(),
        description: description.trim().to_string(),
    };
    ledger.exercises.push(exercise.clone());
    tracing::info!("Created exercise '{}' for {}", exercise.name, user);
    Ok(exercise)
}

/// Rename and/or redescribe one of the user's own exercises.
///
/// `None` leaves a field as it is. Global exercises are read-only.
pub fn update_exercise(
    ledger: &mut Ledger,
    user: &str,
    exercise_id: Uuid,
    name: Option<&str>,
    description: Option<&str>,
) -> Result<Exercise> {
    let owned = ledger
        .exercise(exercise_id)
        .is_some_and(|e| e.owner.as_deref() == Some(user));
    if !owned {
        return Err(Error::NotFound(format!("exercise {}", exercise_id)));
    }

    let name = name.map(str::trim);
    if let Some(name) = name {
        if name.is_empty() {
            return Err(Error::Invalid("exercise name is required".into()));
        }
        let lowered = name.to_lowercase();
        let taken = ledger.exercises.iter().any(|e| {
            e.id != exercise_id && e.is_visible_to(user) && e.name.to_lowercase() == lowered
        });
        if taken {
            return Err(Error::AlreadyExists(format!("exercise '{}'", name)));
        }
    }

    let exercise = ledger
        .exercises
        .iter_mut()
        .find(|e| e.id == exercise_id)
        .ok_or_else(|| Error::NotFound(format!("exercise {}", exercise_id)))?;
    if let Some(name) = name {
        exercise.name = name.to_string();
    }
    if let Some(description) = description {
        exercise.description = description.trim().to_string();
    }
    tracing::info!("Updated exercise {} for {}", exercise_id, user);
    Ok(exercise.clone())
}

/// Delete one of the user's own exercises with its sets and records
pub fn delete_exercise(ledger: &mut Ledger, user: &str, exercise_id: Uuid) -> Result<()> {
    let owned = ledger
        .exercise(exercise_id)
        .is_some_and(|e| e.owner.as_deref() == Some(user));
    if !owned {
        return Err(Error::NotFound(format!("exercise {}", exercise_id)));
    }

    ledger.exercises.retain(|e| e.id != exercise_id);
    ledger.sets.retain(|s| s.exercise_id != exercise_id);
    ledger.records.retain(|r| r.exercise_id != exercise_id);
    ledger.remove_empty_workouts();
    tracing::info!("Deleted exercise {} for {}", exercise_id, user);
    Ok(())
}

/// Current records (manual and auto), ordered by exercise name then type
pub fn current_records<'a>(
    ledger: &'a Ledger,
    user: &str,
    exercise_id: Option<Uuid>,
    pr_type: Option<PrType>,
) -> Vec<(&'a Exercise, &'a PersonalRecord)> {
    let mut records: Vec<_> = ledger
        .records
        .iter()
        .filter(|r| r.user == user && r.is_current)
        .filter(|r| exercise_id.map_or(true, |id| r.exercise_id == id))
        .filter(|r| pr_type.map_or(true, |t| r.pr_type == t))
        .filter_map(|r| ledger.exercise(r.exercise_id).map(|e| (e, r)))
        .collect();

    records.sort_by(|(ea, ra), (eb, rb)| {
        ea.name
            .to_lowercase()
            .cmp(&eb.name.to_lowercase())
            .then(ra.pr_type.cmp(&rb.pr_type))
            .then(ra.reps.cmp(&rb.reps))
            .then(ra.weight.cmp(&rb.weight))
    });
    records
}

/// Every record for one exercise, oldest first, showing the progression
pub fn record_history<'a>(
    ledger: &'a Ledger,
    user: &str,
    exercise_id: Uuid,
) -> Result<Vec<&'a PersonalRecord>> {
    visible_exercise(ledger, user, exercise_id)?;
    let mut records: Vec<_> = ledger
        .records
        .iter()
        .filter(|r| r.user == user && r.exercise_id == exercise_id)
        .collect();
    records.sort_by_key(|r| (r.date, r.pr_type));
    Ok(records)
}

/// Rebuild auto PRs for every exercise the user has sets for
pub fn recalculate_all(ledger: &mut Ledger, user: &str) -> Result<usize> {
    let exercises = ledger.exercises_with_sets(user);
    ledger.transaction(|ledger| {
        for &exercise_id in &exercises {
            recalculate_prs(ledger, user, exercise_id)?;
        }
        Ok(exercises.len())
    })
}

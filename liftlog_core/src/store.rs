//! Record storage.
//!
//! [`RecordStore`] is the narrow surface PR recalculation needs. [`Ledger`]
//! is the in-memory data model (exercises, workouts, sets, records) that
//! implements it; see `state.rs` for how a ledger is persisted.

use crate::types::{DatedSet, Exercise, PersonalRecord, RecordedSet, Workout};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Storage operations used by PR recalculation
pub trait RecordStore {
    /// All sets of `user` for `exercise_id`, ordered by workout date then set number
    fn sets_for(&self, user: &str, exercise_id: Uuid) -> Result<Vec<DatedSet>>;

    /// Delete every non-manual record for (user, exercise). Returns how many went.
    fn delete_auto_records(&mut self, user: &str, exercise_id: Uuid) -> Result<usize>;

    /// Insert a batch of records
    fn insert_records(&mut self, records: Vec<PersonalRecord>) -> Result<()>;

    /// Run `f` as one unit: its changes are kept on `Ok` and discarded on `Err`
    fn transaction<T, F>(&mut self, f: F) -> Result<T>
    where
        Self: Sized,
        F: FnOnce(&mut Self) -> Result<T>;
}

/// Everything liftlog stores, for all users
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct Ledger {
    #[serde(default)]
    pub exercises: Vec<Exercise>,
    #[serde(default)]
    pub workouts: Vec<Workout>,
    #[serde(default)]
    pub sets: Vec<RecordedSet>,
    #[serde(default)]
    pub records: Vec<PersonalRecord>,
}

impl Ledger {
    pub fn exercise(&self, id: Uuid) -> Option<&Exercise> {
        self.exercises.iter().find(|e| e.id == id)
    }

    pub fn workout(&self, id: Uuid) -> Option<&Workout> {
        self.workouts.iter().find(|w| w.id == id)
    }

    pub fn set(&self, id: Uuid) -> Option<&RecordedSet> {
        self.sets.iter().find(|s| s.id == id)
    }

    pub fn record(&self, id: Uuid) -> Option<&PersonalRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Exercises `user` can see, sorted by name
    pub fn visible_exercises(&self, user: &str) -> Vec<&Exercise> {
        let mut exercises: Vec<_> = self
            .exercises
            .iter()
            .filter(|e| e.is_visible_to(user))
            .collect();
        exercises.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        exercises
    }

    /// Case-insensitive name lookup among exercises visible to `user`.
    ///
    /// The user's own exercise wins over a global one with the same name.
    pub fn find_exercise(&self, user: &str, name: &str) -> Option<&Exercise> {
        let name = name.trim().to_lowercase();
        self.exercises
            .iter()
            .filter(|e| e.is_visible_to(user) && e.name.to_lowercase() == name)
            .max_by_key(|e| !e.is_global())
    }

    pub fn workout_on(&self, user: &str, date: chrono::NaiveDate) -> Option<&Workout> {
        self.workouts
            .iter()
            .find(|w| w.user == user && w.date == date)
    }

    pub fn sets_in_workout(&self, workout_id: Uuid) -> impl Iterator<Item = &RecordedSet> {
        self.sets.iter().filter(move |s| s.workout_id == workout_id)
    }

    /// Drop workouts that no longer own any set
    pub fn remove_empty_workouts(&mut self) -> usize {
        let before = self.workouts.len();
        let sets = &self.sets;
        self.workouts
            .retain(|w| sets.iter().any(|s| s.workout_id == w.id));
        let removed = before - self.workouts.len();
        if removed > 0 {
            tracing::debug!("Removed {} empty workouts", removed);
        }
        removed
    }

    /// Exercises `user` has at least one set for
    pub fn exercises_with_sets(&self, user: &str) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = Vec::new();
        for set in &self.sets {
            let owned = self
                .workout(set.workout_id)
                .is_some_and(|w| w.user == user);
            if owned && !ids.contains(&set.exercise_id) {
                ids.push(set.exercise_id);
            }
        }
        ids
    }
}

impl RecordStore for Ledger {
    fn sets_for(&self, user: &str, exercise_id: Uuid) -> Result<Vec<DatedSet>> {
        let dates: HashMap<Uuid, chrono::NaiveDate> = self
            .workouts
            .iter()
            .filter(|w| w.user == user)
            .map(|w| (w.id, w.date))
            .collect();

        let mut sets: Vec<DatedSet> = self
            .sets
            .iter()
            .filter(|s| s.exercise_id == exercise_id)
            .filter_map(|s| {
                dates.get(&s.workout_id).map(|&date| DatedSet {
                    date,
                    set_number: s.set_number,
                    reps: s.reps,
                    weight: s.weight,
                })
            })
            .collect();
        sets.sort_by_key(|s| (s.date, s.set_number));
        Ok(sets)
    }

    fn delete_auto_records(&mut self, user: &str, exercise_id: Uuid) -> Result<usize> {
        let before = self.records.len();
        self.records
            .retain(|r| r.is_manual || r.user != user || r.exercise_id != exercise_id);
        Ok(before - self.records.len())
    }

    fn insert_records(&mut self, records: Vec<PersonalRecord>) -> Result<()> {
        self.records.extend(records);
        Ok(())
    }

    fn transaction<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        let snapshot = self.clone();
        match f(self) {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::warn!("Rolling back ledger transaction: {}", e);
                *self = snapshot;
                Err(e)
            }
        }
    }
}

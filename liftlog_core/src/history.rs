//! Workout history listing.
//!
//! Groups each workout's sets by exercise and renders them compactly, the
//! way the history screen shows them.

use crate::parser::format_compact;
use crate::store::Ledger;
use crate::types::{RecordedSet, Workout};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// One exercise's sets inside a workout
#[derive(Clone, Debug)]
pub struct ExerciseSets {
    pub exercise: String,
    pub sets: Vec<RecordedSet>,
    /// e.g. `"1x9x5, 2x9x5"`
    pub compact: String,
}

/// A workout with its sets grouped by exercise name
#[derive(Clone, Debug)]
pub struct WorkoutSummary {
    pub workout: Workout,
    pub exercises: Vec<ExerciseSets>,
}

impl WorkoutSummary {
    pub fn set_count(&self) -> usize {
        self.exercises.iter().map(|e| e.sets.len()).sum()
    }
}

/// The user's workouts that have at least one set, newest first
pub fn workout_history(ledger: &Ledger, user: &str) -> Vec<WorkoutSummary> {
    let mut workouts: Vec<&Workout> = ledger.workouts.iter().filter(|w| w.user == user).collect();
    workouts.sort_by(|a, b| b.date.cmp(&a.date));

    let summaries: Vec<WorkoutSummary> = workouts
        .into_iter()
        .filter_map(|workout| summarize(ledger, workout))
        .collect();

    tracing::debug!("Built history of {} workouts for {}", summaries.len(), user);
    summaries
}

/// The user's workout on `date` with its saved sets, if it has any.
///
/// This is the view set ids are taken from for deleting or marking sets.
pub fn workout_on_date(ledger: &Ledger, user: &str, date: NaiveDate) -> Option<WorkoutSummary> {
    ledger
        .workout_on(user, date)
        .and_then(|workout| summarize(ledger, workout))
}

/// Group a workout's sets by exercise name, sets in set-number order
fn summarize(ledger: &Ledger, workout: &Workout) -> Option<WorkoutSummary> {
    let mut grouped: BTreeMap<String, Vec<RecordedSet>> = BTreeMap::new();
    for set in ledger.sets_in_workout(workout.id) {
        let name = ledger
            .exercise(set.exercise_id)
            .map(|e| e.name.clone())
            .unwrap_or_else(|| format!("<missing {}>", set.exercise_id));
        grouped.entry(name).or_default().push(set.clone());
    }
    if grouped.is_empty() {
        return None;
    }

    let exercises = grouped
        .into_iter()
        .map(|(exercise, mut sets)| {
            sets.sort_by_key(|s| s.set_number);
            let compact = format_compact(&sets);
            ExerciseSets {
                exercise,
                sets,
                compact,
            }
        })
        .collect();

    Some(WorkoutSummary {
        workout: workout.clone(),
        exercises,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::seed_default_exercises;
    use crate::service::add_sets;
    use chrono::Utc;
    use uuid::Uuid;

    fn day(n: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, n).unwrap()
    }

    #[test]
    fn test_history_newest_first_and_grouped() {
        let mut ledger = Ledger::default();
        seed_default_exercises(&mut ledger);
        let squat = ledger.find_exercise("me", "Squat").unwrap().id;
        let bench = ledger.find_exercise("me", "Bench Press").unwrap().id;

        add_sets(&mut ledger, "me", squat, day(1), "2x5x100").unwrap();
        add_sets(&mut ledger, "me", squat, day(3), "1x5x105").unwrap();
        add_sets(&mut ledger, "me", bench, day(3), "2x8x62.5").unwrap();
        add_sets(&mut ledger, "bob", bench, day(2), "1x1x1").unwrap();

        let history = workout_history(&ledger, "me");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].workout.date, day(3));
        assert_eq!(history[0].set_count(), 3);

        let names: Vec<_> = history[0].exercises.iter().map(|e| e.exercise.as_str()).collect();
        assert_eq!(names, vec!["Bench Press", "Squat"]);
        assert_eq!(history[0].exercises[0].compact, "1x8x62.5, 2x8x62.5");
        assert_eq!(history[1].exercises[0].compact, "1x5x100, 2x5x100");
    }

    #[test]
    fn test_history_skips_empty_workouts() {
        let mut ledger = Ledger::default();
        ledger.workouts.push(Workout {
            id: Uuid::new_v4(),
            user: "me".into(),
            date: day(1),
            notes: String::new(),
            created_at: Utc::now(),
        });

        assert!(workout_history(&ledger, "me").is_empty());
    }

    #[test]
    fn test_workout_on_date_lists_set_ids() {
        let mut ledger = Ledger::default();
        seed_default_exercises(&mut ledger);
        let squat = ledger.find_exercise("me", "Squat").unwrap().id;
        let bench = ledger.find_exercise("me", "Bench Press").unwrap().id;

        let squats = add_sets(&mut ledger, "me", squat, day(4), "2x5x100").unwrap();
        add_sets(&mut ledger, "me", bench, day(4), "1x8x60").unwrap();
        add_sets(&mut ledger, "me", squat, day(5), "1x5x105").unwrap();

        let workout = workout_on_date(&ledger, "me", day(4)).unwrap();
        assert_eq!(workout.workout.id, squats.workout_id);
        assert_eq!(workout.set_count(), 3);
        assert_eq!(workout.exercises[1].exercise, "Squat");
        let ids: Vec<Uuid> = workout.exercises[1].sets.iter().map(|s| s.id).collect();
        let logged: Vec<Uuid> = squats.sets.iter().map(|s| s.id).collect();
        assert_eq!(ids, logged);

        assert!(workout_on_date(&ledger, "me", day(6)).is_none());
        assert!(workout_on_date(&ledger, "bob", day(4)).is_none());
    }
}

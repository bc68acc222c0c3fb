//! Default catalog of global exercises.
//!
//! Built-in exercises have no owner and are visible to every user.

use crate::store::Ledger;
use crate::types::Exercise;
use once_cell::sync::Lazy;
use uuid::Uuid;

/// A built-in exercise definition
#[derive(Clone, Copy, Debug)]
pub struct DefaultExercise {
    pub name: &'static str,
    pub description: &'static str,
}

/// Cached default catalog
static DEFAULT_EXERCISES: Lazy<Vec<DefaultExercise>> = Lazy::new(|| {
    [
        ("Bench Press", "Barbell chest press on a flat bench."),
        ("Squat", "Barbell back squat."),
        ("Deadlift", "Barbell deadlift from the floor."),
        ("Overhead Press", "Standing barbell shoulder press."),
        ("Barbell Row", "Bent-over barbell row."),
        ("Pull-Up", "Bodyweight pull-up."),
        ("Dip", "Bodyweight or weighted dip."),
        ("Leg Press", "Machine leg press."),
        ("Romanian Deadlift", "Barbell RDL targeting hamstrings."),
        ("Lat Pulldown", "Cable lat pulldown."),
        ("Incline Bench Press", "Barbell press on an incline bench."),
        ("Lunges", "Dumbbell or barbell lunges."),
        ("Bicep Curl", "Dumbbell or barbell curl."),
        ("Tricep Extension", "Cable or dumbbell tricep extension."),
        ("Leg Curl", "Machine hamstring curl."),
        ("Leg Extension", "Machine quad extension."),
        ("Calf Raise", "Standing or seated calf raise."),
        ("Face Pull", "Cable face pull for rear delts."),
        ("Plank", "Core isometric hold."),
        ("Cable Fly", "Cable chest fly."),
    ]
    .into_iter()
    .map(|(name, description)| DefaultExercise { name, description })
    .collect()
});

/// The built-in exercises
pub fn default_exercises() -> &'static [DefaultExercise] {
    &DEFAULT_EXERCISES
}

/// Add every missing built-in exercise as a global exercise.
///
/// A global exercise with the same name (any case) counts as present.
/// Returns how many were created.
pub fn seed_default_exercises(ledger: &mut Ledger) -> usize {
    let mut created = 0;
    for default in default_exercises() {
        let exists = ledger
            .exercises
            .iter()
            .any(|e| e.is_global() && e.name.eq_ignore_ascii_case(default.name));
        if exists {
            continue;
        }

        ledger.exercises.push(Exercise {
            id: Uuid::new_v4(),
            owner: None,
            name: default.name.into(),
            description: default.description.into(),
        });
        created += 1;
    }

    tracing::info!(
        "Seeded {} default exercises ({} already present)",
        created,
        default_exercises().len() - created
    );
    created
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_names_are_unique() {
        let mut names: Vec<_> = default_exercises()
            .iter()
            .map(|d| d.name.to_lowercase())
            .collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), default_exercises().len());
    }

    #[test]
    fn test_seed_is_idempotent() {
        let mut ledger = Ledger::default();

        assert_eq!(seed_default_exercises(&mut ledger), 20);
        assert_eq!(seed_default_exercises(&mut ledger), 0);
        assert_eq!(ledger.exercises.len(), 20);
        assert!(ledger.exercises.iter().all(|e| e.is_global()));
    }

    #[test]
    fn test_seed_skips_existing_global_name() {
        let mut ledger = Ledger::default();
        ledger.exercises.push(Exercise {
            id: Uuid::new_v4(),
            owner: None,
            name: "SQUAT".into(),
            description: String::new(),
        });

        assert_eq!(seed_default_exercises(&mut ledger), 19);
    }
}

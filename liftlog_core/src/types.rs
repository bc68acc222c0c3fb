//! Core domain types for liftlog.
//!
//! This module defines the fundamental types used throughout the system:
//! - Exercises and the workouts they are performed in
//! - Parsed and recorded sets
//! - Personal records and the context key they compete under

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Exercises and Workouts
// ============================================================================

/// An exercise a user can perform (e.g., "Bench Press")
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Exercise {
    pub id: Uuid,
    /// `None` for built-in exercises shared by every user
    pub owner: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl Exercise {
    pub fn is_global(&self) -> bool {
        self.owner.is_none()
    }

    /// Global exercises are visible to everyone, others only to their owner
    pub fn is_visible_to(&self, user: &str) -> bool {
        match &self.owner {
            None => true,
            Some(owner) => owner == user,
        }
    }
}

/// A workout on a specific date. One per (user, date).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Workout {
    pub id: Uuid,
    pub user: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Sets
// ============================================================================

/// A single set produced by the shorthand parser, not yet stored
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SetEntry {
    pub set_number: u32,
    pub reps: u32,
    pub weight: Decimal,
}

/// A stored set, owned by exactly one workout
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordedSet {
    pub id: Uuid,
    pub workout_id: Uuid,
    pub exercise_id: Uuid,
    pub set_number: u32,
    pub reps: u32,
    pub weight: Decimal,
}

/// A recorded set joined with its workout date, as fed to PR recalculation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatedSet {
    pub date: NaiveDate,
    pub set_number: u32,
    pub reps: u32,
    pub weight: Decimal,
}

// ============================================================================
// Personal Records
// ============================================================================

/// Dimension a personal record is measured in
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum PrType {
    /// Heaviest weight for a given rep count
    Weight,
    /// Most reps at a given weight
    Reps,
    /// Most sets of the same reps+weight in one workout
    Sets,
}

impl PrType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrType::Weight => "weight",
            PrType::Reps => "reps",
            PrType::Sets => "sets",
        }
    }

    /// Human-readable label used in notifications and listings
    pub fn label(&self) -> &'static str {
        match self {
            PrType::Weight => "Weight PR",
            PrType::Reps => "Rep PR",
            PrType::Sets => "Set PR",
        }
    }
}

impl fmt::Display for PrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrType {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "weight" => Ok(PrType::Weight),
            "reps" | "rep" => Ok(PrType::Reps),
            "sets" | "set" => Ok(PrType::Sets),
            other => Err(crate::Error::Invalid(format!(
                "unknown PR type '{}', expected weight, reps or sets",
                other
            ))),
        }
    }
}

/// The dimension held constant while searching for a best.
///
/// At most one non-manual record per (user, exercise, pr_type, key) is current.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContextKey {
    /// Weight PRs compete per rep count
    Reps(u32),
    /// Rep PRs compete per weight
    Weight(Decimal),
    /// Set PRs compete per exact (reps, weight) pair
    RepsAtWeight(u32, Decimal),
}

/// A live or superseded best for one user and exercise
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PersonalRecord {
    pub id: Uuid,
    pub user: String,
    pub exercise_id: Uuid,
    pub pr_type: PrType,
    pub reps: u32,
    pub weight: Decimal,
    pub sets: u32,
    /// When this record was achieved
    pub date: NaiveDate,
    /// The best this record beat; unit follows `pr_type`
    pub previous_value: Option<Decimal>,
    pub previous_date: Option<NaiveDate>,
    pub is_current: bool,
    pub is_manual: bool,
    pub created_at: DateTime<Utc>,
}

impl PersonalRecord {
    pub fn context_key(&self) -> ContextKey {
        match self.pr_type {
            PrType::Weight => ContextKey::Reps(self.reps),
            PrType::Reps => ContextKey::Weight(self.weight),
            PrType::Sets => ContextKey::RepsAtWeight(self.reps, self.weight),
        }
    }

    /// The measured values, used to tell whether a record already existed
    pub fn signature(&self) -> RecordSignature {
        RecordSignature {
            pr_type: self.pr_type,
            reps: self.reps,
            weight: self.weight,
            sets: self.sets,
        }
    }
}

/// (pr_type, reps, weight, sets) of a record
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RecordSignature {
    pub pr_type: PrType,
    pub reps: u32,
    pub weight: Decimal,
    pub sets: u32,
}

/// Render a weight without trailing zeros ("50", "12.5")
pub fn format_weight(weight: Decimal) -> String {
    weight.normalize().to_string()
}

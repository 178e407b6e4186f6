//! Core domain types for the FitTrack system.
//!
//! This module defines the fundamental types used throughout the system:
//! - Workout catalog, exercises and sets
//! - Manual schedule overrides
//! - Per-day workout progress snapshots
//! - Food logs and the food library
//! - User identity used to partition storage

use crate::{DateKey, Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Label of the rest sentinel, both in the rotation and in overrides
pub const REST_LABEL: &str = "Rest";

// ============================================================================
// Workout Types
// ============================================================================

/// One set of an exercise. `weight` and `reps` are display strings
/// ("BW", "8-12"); no arithmetic is ever applied to them.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkoutSet {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(default)]
    pub weight: String,
    #[serde(default)]
    pub reps: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub notes: String,
}

impl WorkoutSet {
    pub fn new(weight: impl Into<String>, reps: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            weight: weight.into(),
            reps: reps.into(),
            completed: false,
            notes: String::new(),
        }
    }
}

/// A named exercise with its ordered sets
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Exercise {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub sets: Vec<WorkoutSet>,
}

impl Exercise {
    /// Build an exercise with `count` identical sets
    pub fn with_sets(name: impl Into<String>, count: usize, weight: &str, reps: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            sets: (0..count).map(|_| WorkoutSet::new(weight, reps)).collect(),
        }
    }

    pub fn set_mut(&mut self, set_id: Uuid) -> Option<&mut WorkoutSet> {
        self.sets.iter_mut().find(|s| s.id == set_id)
    }

    pub fn is_complete(&self) -> bool {
        !self.sets.is_empty() && self.sets.iter().all(|s| s.completed)
    }
}

/// Partial update applied to a set; `None` fields are left untouched
#[derive(Clone, Debug, Default)]
pub struct SetEdit {
    pub weight: Option<String>,
    pub reps: Option<String>,
    pub notes: Option<String>,
}

impl SetEdit {
    pub fn apply(&self, set: &mut WorkoutSet) {
        if let Some(ref weight) = self.weight {
            set.weight = weight.clone();
        }
        if let Some(ref reps) = self.reps {
            set.reps = reps.clone();
        }
        if let Some(ref notes) = self.notes {
            set.notes = notes.clone();
        }
    }
}

/// Mapping from workout label to its ordered exercises.
///
/// Serialized as the bare `{label: [exercise, ...]}` document.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
#[serde(transparent)]
pub struct WorkoutCatalog {
    pub workouts: BTreeMap<String, Vec<Exercise>>,
}

// ============================================================================
// Schedule Types
// ============================================================================

/// Manual day pins: date key -> workout label (including `"Rest"`)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
#[serde(transparent)]
pub struct WorkoutOverrides {
    pins: BTreeMap<DateKey, String>,
}

impl WorkoutOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &DateKey) -> Option<&str> {
        self.pins.get(key).map(String::as_str)
    }

    pub fn is_rest(&self, key: &DateKey) -> bool {
        self.get(key) == Some(REST_LABEL)
    }

    /// Pin a label to a day, replacing any earlier pin
    pub fn pin(&mut self, key: DateKey, label: impl Into<String>) {
        self.pins.insert(key, label.into());
    }

    pub fn unpin(&mut self, key: &DateKey) -> Option<String> {
        self.pins.remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DateKey, &str)> {
        self.pins.iter().map(|(k, v)| (k, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }
}

impl<L: Into<String>> FromIterator<(DateKey, L)> for WorkoutOverrides {
    fn from_iter<I: IntoIterator<Item = (DateKey, L)>>(iter: I) -> Self {
        Self {
            pins: iter.into_iter().map(|(k, v)| (k, v.into())).collect(),
        }
    }
}

// ============================================================================
// Progress Types
// ============================================================================

/// Frozen per-day copy of a workout's exercises with completion state
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DailyProgress {
    pub workout: String,
    pub exercises: Vec<Exercise>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateKey>,
}

/// Progress state for one day.
///
/// Starts `Absent`; the first edit materializes a `Snapshot` copied from the
/// catalog. Later catalog edits never reach an existing snapshot.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum DayProgress {
    #[default]
    Absent,
    Snapshot(DailyProgress),
}

// ============================================================================
// Food Types
// ============================================================================

/// One logged food item
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FoodItem {
    pub name: String,
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub eaten: bool,
}

/// Food log for a single day
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FoodLog {
    #[serde(default)]
    pub items: Vec<FoodItem>,
    #[serde(default = "default_calorie_goal")]
    pub calorie_goal: f64,
    #[serde(default = "default_protein_goal")]
    pub protein_goal: f64,
}

pub(crate) fn default_calorie_goal() -> f64 {
    2000.0
}

pub(crate) fn default_protein_goal() -> f64 {
    150.0
}

/// Reusable food entry, independent of any date
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FoodTemplate {
    pub name: String,
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub protein: f64,
}

/// User-curated list of food templates
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct FoodLibrary {
    #[serde(default)]
    pub items: Vec<FoodTemplate>,
}

/// Eaten totals for a food log
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct NutritionTotals {
    pub calories: f64,
    pub protein: f64,
}

// ============================================================================
// Identity
// ============================================================================

/// Authenticated user identity; every storage key is scoped by it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UserId(String);

impl UserId {
    /// Rejects ids that are empty or could escape their `users/{id}` namespace.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() || id.contains('/') || id == "." || id == ".." {
            return Err(Error::InvalidUserId(id));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_validation() {
        assert!(UserId::new("alice").is_ok());
        assert!(UserId::new("").is_err());
        assert!(UserId::new("   ").is_err());
        assert!(UserId::new("../bob").is_err());
        assert!(UserId::new("..").is_err());
    }

    #[test]
    fn test_legacy_set_without_id_gets_one() {
        let json = r#"{"name": "Dips", "sets": [{"weight": "BW", "reps": "10-12", "completed": false, "notes": ""}]}"#;
        let exercise: Exercise = serde_json::from_str(json).unwrap();
        assert_eq!(exercise.sets.len(), 1);
        assert_eq!(exercise.sets[0].weight, "BW");
        assert!(!exercise.sets[0].id.is_nil());
    }

    #[test]
    fn test_food_log_wire_format() {
        let log = FoodLog {
            items: vec![FoodItem {
                name: "Eggs".into(),
                calories: 140.0,
                protein: 12.0,
                eaten: true,
            }],
            calorie_goal: 2200.0,
            protein_goal: 160.0,
        };
        let value = serde_json::to_value(&log).unwrap();
        assert_eq!(value["calorieGoal"], 2200.0);
        assert_eq!(value["proteinGoal"], 160.0);
        assert_eq!(value["items"][0]["eaten"], true);
    }

    #[test]
    fn test_food_log_missing_goals_use_defaults() {
        let log: FoodLog = serde_json::from_str(r#"{"items": []}"#).unwrap();
        assert_eq!(log.calorie_goal, 2000.0);
        assert_eq!(log.protein_goal, 150.0);
    }

    #[test]
    fn test_overrides_rest_detection() {
        let key = DateKey::parse("2025-01-02").unwrap();
        let mut overrides = WorkoutOverrides::new();
        assert!(!overrides.is_rest(&key));
        overrides.pin(key, REST_LABEL);
        assert!(overrides.is_rest(&key));
        overrides.pin(key, "Legs");
        assert_eq!(overrides.get(&key), Some("Legs"));
        assert_eq!(overrides.len(), 1);
    }
}

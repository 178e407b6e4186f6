//! Default workout catalog and catalog edit operations.
//!
//! The catalog is only ever changed through the explicit edits below; it is
//! never pruned automatically and edits never reach saved progress snapshots.

use crate::types::*;
use crate::{Error, Result};
use once_cell::sync::Lazy;
use uuid::Uuid;

/// Default catalog, built once so its ids are the same for every caller
static DEFAULT_CATALOG: Lazy<WorkoutCatalog> = Lazy::new(build_default_catalog);

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static WorkoutCatalog {
    &DEFAULT_CATALOG
}

/// Builds a fresh default catalog (new ids on every call)
pub fn build_default_catalog() -> WorkoutCatalog {
    let mut catalog = WorkoutCatalog::default();

    catalog.workouts.insert(
        "Chest & Triceps".into(),
        vec![
            Exercise::with_sets("Warmup/Stretch", 1, "", "5-10 min"),
            Exercise::with_sets("Bench Press", 3, "", "8-12"),
            Exercise::with_sets("Chest Machine Press", 3, "", "10"),
            Exercise::with_sets("Dips", 3, "BW", "10-12"),
            Exercise::with_sets("Seated Triceps Extension Machine", 3, "", "12"),
            Exercise::with_sets("Chest Flys", 3, "", "12"),
            Exercise::with_sets("Tricep Rope Pushdown", 3, "", "12"),
        ],
    );

    catalog.workouts.insert(
        "Back & Biceps".into(),
        vec![
            Exercise::with_sets("Lat Pulldown", 3, "", "10"),
            Exercise::with_sets("Seated Row", 3, "", "10"),
            Exercise::with_sets("Barbell Row", 3, "", "8-10"),
            Exercise::with_sets("Dumbbell Bicep Curls", 3, "", "12"),
            Exercise::with_sets("Hammer Curls", 3, "", "12"),
        ],
    );

    catalog.workouts.insert(
        "Legs".into(),
        vec![
            Exercise::with_sets("Warmup", 1, "", "5-10 min"),
            Exercise::with_sets("Squats", 3, "", "8-12"),
            Exercise::with_sets("Romanian Deadlifts", 3, "", "10"),
            Exercise::with_sets("Leg Extensions", 3, "", "12"),
            Exercise::with_sets("Hamstring Curls", 3, "", "12"),
            Exercise::with_sets("Calf Raises", 3, "", "15"),
        ],
    );

    catalog.workouts.insert(REST_LABEL.into(), Vec::new());

    catalog
}

impl WorkoutCatalog {
    /// Exercises for a label; unknown labels have none
    pub fn exercises(&self, label: &str) -> &[Exercise] {
        self.workouts.get(label).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.workouts.keys().map(String::as_str)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.workouts.contains_key(label)
    }

    pub fn add_workout(&mut self, label: &str) -> Result<()> {
        let label = label.trim();
        if label.is_empty() {
            return Err(Error::Catalog("Workout name must not be empty".into()));
        }
        if self.contains(label) {
            return Err(Error::Catalog(format!("Workout {:?} already exists", label)));
        }
        self.workouts.insert(label.to_string(), Vec::new());
        Ok(())
    }

    pub fn remove_workout(&mut self, label: &str) -> Result<Vec<Exercise>> {
        self.workouts
            .remove(label)
            .ok_or_else(|| Error::Catalog(format!("No workout named {:?}", label)))
    }

    pub fn rename_workout(&mut self, from: &str, to: &str) -> Result<()> {
        let to = to.trim();
        if to.is_empty() {
            return Err(Error::Catalog("Workout name must not be empty".into()));
        }
        if self.contains(to) {
            return Err(Error::Catalog(format!("Workout {:?} already exists", to)));
        }
        let exercises = self.remove_workout(from)?;
        self.workouts.insert(to.to_string(), exercises);
        Ok(())
    }

    /// Append an exercise with `sets` identical sets; returns its id
    pub fn add_exercise(
        &mut self,
        label: &str,
        name: &str,
        sets: usize,
        weight: &str,
        reps: &str,
    ) -> Result<Uuid> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Catalog("Exercise name must not be empty".into()));
        }
        let exercises = self.workout_mut(label)?;
        let exercise = Exercise::with_sets(name, sets, weight, reps);
        let id = exercise.id;
        exercises.push(exercise);
        Ok(id)
    }

    pub fn remove_exercise(&mut self, label: &str, exercise_id: Uuid) -> Result<Exercise> {
        let exercises = self.workout_mut(label)?;
        let idx = position_of(exercises, exercise_id)?;
        Ok(exercises.remove(idx))
    }

    /// Move an exercise to `to_index` (clamped to the end of the list)
    pub fn move_exercise(&mut self, label: &str, exercise_id: Uuid, to_index: usize) -> Result<()> {
        let exercises = self.workout_mut(label)?;
        let from = position_of(exercises, exercise_id)?;
        let exercise = exercises.remove(from);
        let to = to_index.min(exercises.len());
        exercises.insert(to, exercise);
        Ok(())
    }

    pub fn edit_set(
        &mut self,
        label: &str,
        exercise_id: Uuid,
        set_id: Uuid,
        edit: &SetEdit,
    ) -> Result<()> {
        let exercises = self.workout_mut(label)?;
        let set = find_set_mut(exercises, exercise_id, set_id)
            .ok_or_else(|| Error::Catalog(format!("No set {} in exercise {}", set_id, exercise_id)))?;
        edit.apply(set);
        Ok(())
    }

    fn workout_mut(&mut self, label: &str) -> Result<&mut Vec<Exercise>> {
        self.workouts
            .get_mut(label)
            .ok_or_else(|| Error::Catalog(format!("No workout named {:?}", label)))
    }
}

fn position_of(exercises: &[Exercise], exercise_id: Uuid) -> Result<usize> {
    exercises
        .iter()
        .position(|e| e.id == exercise_id)
        .ok_or_else(|| Error::Catalog(format!("No exercise with id {}", exercise_id)))
}

/// Locate a set by stable ids within an exercise list
pub(crate) fn find_set_mut(
    exercises: &mut [Exercise],
    exercise_id: Uuid,
    set_id: Uuid,
) -> Option<&mut WorkoutSet> {
    exercises
        .iter_mut()
        .find(|e| e.id == exercise_id)
        .and_then(|e| e.set_mut(set_id))
}

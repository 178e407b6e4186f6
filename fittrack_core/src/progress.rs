//! Per-day workout progress with copy-on-first-edit snapshots.
//!
//! A day has no progress record until the first set is edited. At that point
//! the catalog's exercise list for the day's workout is copied into a
//! snapshot, and all further edits for that day go to the snapshot only.

use crate::catalog::find_set_mut;
use crate::types::{DailyProgress, DayProgress, Exercise, SetEdit, WorkoutCatalog};
use crate::{DateKey, Error, Result};
use uuid::Uuid;

impl DailyProgress {
    /// Copy the catalog's current exercises for `label` into a new snapshot
    pub fn materialize(catalog: &WorkoutCatalog, label: &str, date: DateKey) -> Self {
        Self {
            workout: label.to_string(),
            exercises: catalog.exercises(label).to_vec(),
            date: Some(date),
        }
    }

    pub fn completion_percent(&self) -> u8 {
        completion_percent(&self.exercises)
    }
}

impl DayProgress {
    pub fn from_saved(saved: Option<DailyProgress>) -> Self {
        match saved {
            Some(progress) => DayProgress::Snapshot(progress),
            None => DayProgress::Absent,
        }
    }

    pub fn snapshot(&self) -> Option<&DailyProgress> {
        match self {
            DayProgress::Snapshot(progress) => Some(progress),
            DayProgress::Absent => None,
        }
    }

    /// Exercises to show for a day resolved to `label`.
    ///
    /// A snapshot only applies while its workout matches the resolved label;
    /// after an override changes the day's workout the catalog list is shown.
    pub fn exercises<'a>(&'a self, catalog: &'a WorkoutCatalog, label: &str) -> &'a [Exercise] {
        match self {
            DayProgress::Snapshot(progress) if progress.workout == label => &progress.exercises,
            _ => catalog.exercises(label),
        }
    }

    /// Flip a set's completion, materializing the snapshot first if needed.
    /// Returns the set's new completion state.
    pub fn toggle_set(
        &mut self,
        catalog: &WorkoutCatalog,
        label: &str,
        date: DateKey,
        exercise_id: Uuid,
        set_id: Uuid,
    ) -> Result<bool> {
        let progress = self.materialized(catalog, label, date);
        let set = find_set_mut(&mut progress.exercises, exercise_id, set_id).ok_or_else(|| {
            Error::Progress(format!("No set {} in exercise {} for {}", set_id, exercise_id, label))
        })?;
        set.completed = !set.completed;
        Ok(set.completed)
    }

    /// Record weight/reps/notes for a set on this day only
    pub fn edit_set(
        &mut self,
        catalog: &WorkoutCatalog,
        label: &str,
        date: DateKey,
        exercise_id: Uuid,
        set_id: Uuid,
        edit: &SetEdit,
    ) -> Result<()> {
        let progress = self.materialized(catalog, label, date);
        let set = find_set_mut(&mut progress.exercises, exercise_id, set_id).ok_or_else(|| {
            Error::Progress(format!("No set {} in exercise {} for {}", set_id, exercise_id, label))
        })?;
        edit.apply(set);
        Ok(())
    }

    fn materialized(&mut self, catalog: &WorkoutCatalog, label: &str, date: DateKey) -> &mut DailyProgress {
        let stale = match self {
            DayProgress::Snapshot(progress) => progress.workout != label,
            DayProgress::Absent => true,
        };
        if stale {
            tracing::debug!("Materializing {} snapshot for {}", label, date);
            *self = DayProgress::Snapshot(DailyProgress::materialize(catalog, label, date));
        }
        match self {
            DayProgress::Snapshot(progress) => progress,
            DayProgress::Absent => unreachable!("snapshot materialized above"),
        }
    }
}

/// Completed sets over total sets, rounded to a whole percent (0 with no sets)
pub fn completion_percent(exercises: &[Exercise]) -> u8 {
    let (done, total) = exercises
        .iter()
        .flat_map(|e| e.sets.iter())
        .fold((0usize, 0usize), |(done, total), set| {
            (done + usize::from(set.completed), total + 1)
        });
    if total == 0 {
        return 0;
    }
    ((done as f64 / total as f64) * 100.0).round() as u8
}

//! A resolved day: its workout label, the catalog and the day's progress.

use crate::local_cache::LocalCache;
use crate::progress::completion_percent;
use crate::schedule::Rotation;
use crate::store::RemoteStore;
use crate::sync::SyncCache;
use crate::types::{DayProgress, Exercise, SetEdit, UserId, WorkoutCatalog};
use crate::{DateKey, Result};
use uuid::Uuid;

#[derive(Clone, Debug)]
pub struct DayPlan {
    pub date_key: DateKey,
    pub workout: String,
    pub is_manual_override: bool,
    pub catalog: WorkoutCatalog,
    pub progress: DayProgress,
}

impl DayPlan {
    /// Resolve the day's workout and load everything needed to show it
    pub fn load<S: RemoteStore, C: LocalCache>(
        sync: &mut SyncCache<S, C>,
        identity: Option<&UserId>,
        rotation: &Rotation,
        date_key: DateKey,
    ) -> Self {
        let overrides = sync.load_overrides(identity);
        let catalog = sync.load_workouts(identity);
        let workout = rotation.resolve(date_key.date(), &overrides);
        let progress = sync.load_progress(identity, &date_key);
        tracing::debug!("Planned {} as {}", date_key, workout);

        Self {
            date_key,
            is_manual_override: overrides.get(&date_key).is_some(),
            workout,
            catalog,
            progress,
        }
    }

    pub fn exercises(&self) -> &[Exercise] {
        self.progress.exercises(&self.catalog, &self.workout)
    }

    pub fn completion_percent(&self) -> u8 {
        completion_percent(self.exercises())
    }

    /// Toggle a set and persist the day's snapshot; returns the new state
    pub fn toggle_set<S: RemoteStore, C: LocalCache>(
        &mut self,
        sync: &mut SyncCache<S, C>,
        identity: Option<&UserId>,
        exercise_id: Uuid,
        set_id: Uuid,
    ) -> Result<bool> {
        let completed = self.progress.toggle_set(
            &self.catalog,
            &self.workout,
            self.date_key,
            exercise_id,
            set_id,
        )?;
        self.persist(sync, identity)?;
        Ok(completed)
    }

    /// Record weight/reps/notes for this day and persist the snapshot
    pub fn edit_set<S: RemoteStore, C: LocalCache>(
        &mut self,
        sync: &mut SyncCache<S, C>,
        identity: Option<&UserId>,
        exercise_id: Uuid,
        set_id: Uuid,
        edit: &SetEdit,
    ) -> Result<()> {
        self.progress.edit_set(
            &self.catalog,
            &self.workout,
            self.date_key,
            exercise_id,
            set_id,
            edit,
        )?;
        self.persist(sync, identity)
    }

    fn persist<S: RemoteStore, C: LocalCache>(
        &self,
        sync: &mut SyncCache<S, C>,
        identity: Option<&UserId>,
    ) -> Result<()> {
        match self.progress.snapshot() {
            Some(snapshot) => sync.save_progress(identity, &self.date_key, snapshot),
            None => Ok(()),
        }
    }
}

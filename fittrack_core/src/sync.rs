//! Read-through / write-through cache between the local cache and the
//! remote document store.
//!
//! Every operation takes the caller's identity explicitly. Without an
//! identity, loads return the documented default and saves do nothing.
//!
//! Faults are handled asymmetrically:
//! - a remote fault on load is logged and the default is returned;
//! - a remote fault on save is returned to the caller, after the local
//!   cache has already been updated;
//! - a cache entry that no longer parses is treated as a miss.

use crate::config::NutritionConfig;
use crate::local_cache::LocalCache;
use crate::store::{Collection, DocPath, Fetched, RemoteStore};
use crate::types::*;
use crate::{get_default_catalog, DateKey, Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Prefix shared by every cache key this crate writes
pub const CACHE_NAMESPACE: &str = "fittrack";

/// Prefix of un-namespaced progress entries written by older versions
const LEGACY_PROGRESS_PREFIX: &str = "workout_progress_";
const LEGACY_FOOD_PREFIX: &str = "fittrack_food_";

/// Kinds of entity the sync cache manages
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityKind {
    /// Workout catalog (singleton)
    Workouts,
    /// Manual schedule overrides (singleton)
    Overrides,
    /// Food library (singleton)
    FoodLibrary,
    /// Food log per date key
    Food,
    /// Workout progress snapshot per date key
    WorkoutProgress,
}

impl EntityKind {
    /// Document name, also used as the cache key segment
    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::Workouts => "workouts",
            EntityKind::Overrides => "workoutOverrides",
            EntityKind::FoodLibrary => "foodList",
            EntityKind::Food => "food",
            EntityKind::WorkoutProgress => "workoutProgress",
        }
    }

    pub fn collection(&self) -> Collection {
        match self {
            EntityKind::Workouts | EntityKind::Overrides | EntityKind::FoodLibrary => {
                Collection::Data
            }
            EntityKind::Food => Collection::Food,
            EntityKind::WorkoutProgress => Collection::WorkoutProgress,
        }
    }

    pub fn is_singleton(&self) -> bool {
        self.collection() == Collection::Data
    }

    fn cache_key(&self, user: &UserId, date: Option<&DateKey>) -> String {
        match date {
            Some(date) => format!("{}/{}/{}/{}", CACHE_NAMESPACE, user, self.name(), date),
            None => format!("{}/{}/{}", CACHE_NAMESPACE, user, self.name()),
        }
    }

    fn doc_path(&self, user: &UserId, date: Option<&DateKey>) -> DocPath {
        match date {
            Some(date) if !self.is_singleton() => {
                DocPath::new(user, self.collection(), date.to_string())
            }
            _ => DocPath::new(user, self.collection(), self.name()),
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of a cache-then-remote lookup
enum Lookup<T> {
    Hit(T),
    /// Remote confirmed the document does not exist
    Missing,
    /// Remote failed or returned something unusable
    Fault,
}

/// Sync cache over an injected remote store and local cache
pub struct SyncCache<S, C> {
    store: S,
    cache: C,
    nutrition: NutritionConfig,
}

impl<S: RemoteStore, C: LocalCache> SyncCache<S, C> {
    pub fn new(store: S, cache: C) -> Self {
        Self {
            store,
            cache,
            nutrition: NutritionConfig::default(),
        }
    }

    /// Goals used for food logs that have never been written
    pub fn with_nutrition(mut self, nutrition: NutritionConfig) -> Self {
        self.nutrition = nutrition;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut C {
        &mut self.cache
    }

    // ------------------------------------------------------------------------
    // Singletons
    // ------------------------------------------------------------------------

    /// Load the workout catalog; a user without one gets the shared default
    /// catalog, which is written back so its ids stay stable.
    pub fn load_workouts(&mut self, identity: Option<&UserId>) -> WorkoutCatalog {
        self.load_singleton(identity, EntityKind::Workouts, || get_default_catalog().clone())
    }

    pub fn save_workouts(&mut self, identity: Option<&UserId>, catalog: &WorkoutCatalog) -> Result<()> {
        self.save_entity(identity, EntityKind::Workouts, None, catalog)
    }

    pub fn load_overrides(&mut self, identity: Option<&UserId>) -> WorkoutOverrides {
        self.load_singleton(identity, EntityKind::Overrides, WorkoutOverrides::default)
    }

    pub fn save_overrides(&mut self, identity: Option<&UserId>, overrides: &WorkoutOverrides) -> Result<()> {
        self.save_entity(identity, EntityKind::Overrides, None, overrides)
    }

    pub fn load_food_library(&mut self, identity: Option<&UserId>) -> FoodLibrary {
        self.load_singleton(identity, EntityKind::FoodLibrary, FoodLibrary::default)
    }

    pub fn save_food_library(&mut self, identity: Option<&UserId>, library: &FoodLibrary) -> Result<()> {
        self.save_entity(identity, EntityKind::FoodLibrary, None, library)
    }

    // ------------------------------------------------------------------------
    // Per-day entities
    // ------------------------------------------------------------------------

    /// Load a day's food log; an unwritten day gets an empty log with the
    /// configured goals (not written back)
    pub fn load_food(&mut self, identity: Option<&UserId>, date: &DateKey) -> FoodLog {
        self.load_dated(identity, EntityKind::Food, date)
            .unwrap_or_else(|| FoodLog::empty(&self.nutrition))
    }

    pub fn save_food(&mut self, identity: Option<&UserId>, date: &DateKey, log: &FoodLog) -> Result<()> {
        self.save_entity(identity, EntityKind::Food, Some(date), log)
    }

    /// Load a day's progress; `Absent` until something was saved for the day
    pub fn load_progress(&mut self, identity: Option<&UserId>, date: &DateKey) -> DayProgress {
        DayProgress::from_saved(self.load_dated(identity, EntityKind::WorkoutProgress, date))
    }

    pub fn save_progress(
        &mut self,
        identity: Option<&UserId>,
        date: &DateKey,
        progress: &DailyProgress,
    ) -> Result<()> {
        self.save_entity(identity, EntityKind::WorkoutProgress, Some(date), progress)
    }

    /// Every food log on the remote store, re-cached per entry
    pub fn load_all_food(&mut self, identity: Option<&UserId>) -> BTreeMap<DateKey, FoodLog> {
        self.load_collection(identity, EntityKind::Food)
    }

    /// Every progress snapshot on the remote store, re-cached per entry
    pub fn load_all_progress(&mut self, identity: Option<&UserId>) -> BTreeMap<DateKey, DailyProgress> {
        self.load_collection(identity, EntityKind::WorkoutProgress)
    }

    // ------------------------------------------------------------------------
    // Session management
    // ------------------------------------------------------------------------

    /// Purge every cached entry this crate owns, for all users
    pub fn logout(&mut self) -> Result<usize> {
        let mut purged = self.cache.purge_prefix(CACHE_NAMESPACE)?;
        purged += self.cache.purge_prefix(LEGACY_PROGRESS_PREFIX)?;
        tracing::info!("Purged {} cached entries", purged);
        Ok(purged)
    }

    /// Push un-namespaced cache entries left by older versions to the user's
    /// remote namespace. Each entry is re-cached under its namespaced key and
    /// the legacy key is removed once the remote write succeeded.
    pub fn migrate_legacy_cache(&mut self, identity: Option<&UserId>) -> Result<usize> {
        let Some(user) = identity else {
            tracing::warn!("Cannot migrate cache: no user logged in");
            return Ok(0);
        };

        let mut migrated = 0;
        for key in self.cache.keys() {
            let Some((kind, date)) = legacy_target(&key) else {
                continue;
            };
            let Some(raw) = self.cache.get(&key) else {
                continue;
            };
            let value: Value = match serde_json::from_str(&raw) {
                Ok(value) => value,
                Err(e) => {
                    tracing::warn!("Skipping malformed legacy entry {}: {}", key, e);
                    continue;
                }
            };
            // The food list used to be cached as a bare array
            let value = match (kind, value) {
                (EntityKind::FoodLibrary, Value::Array(items)) => json!({ "items": items }),
                (_, value) => value,
            };

            self.write_value(user, kind, date.as_ref(), &value)?;
            self.cache.remove(&key)?;
            tracing::info!("Migrated legacy entry {} for user {}", key, user);
            migrated += 1;
        }

        Ok(migrated)
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn load_singleton<T, F>(&mut self, identity: Option<&UserId>, kind: EntityKind, default: F) -> T
    where
        T: DeserializeOwned + Serialize,
        F: FnOnce() -> T,
    {
        let Some(user) = identity else {
            tracing::warn!("Cannot load {}: no user logged in", kind);
            return default();
        };

        match self.lookup(user, kind, None) {
            Lookup::Hit(value) => value,
            Lookup::Missing => {
                tracing::info!("Initializing default {} for user {}", kind, user);
                let value = default();
                if let Err(e) = self.write(user, kind, None, &value) {
                    tracing::warn!("Failed to store default {} for {}: {}", kind, user, e);
                }
                value
            }
            Lookup::Fault => default(),
        }
    }

    fn load_dated<T>(&mut self, identity: Option<&UserId>, kind: EntityKind, date: &DateKey) -> Option<T>
    where
        T: DeserializeOwned + Serialize,
    {
        let Some(user) = identity else {
            tracing::warn!("Cannot load {}: no user logged in", kind);
            return None;
        };
        match self.lookup(user, kind, Some(date)) {
            Lookup::Hit(value) => Some(value),
            Lookup::Missing | Lookup::Fault => None,
        }
    }

    fn load_collection<T>(&mut self, identity: Option<&UserId>, kind: EntityKind) -> BTreeMap<DateKey, T>
    where
        T: DeserializeOwned + Serialize,
    {
        let mut all = BTreeMap::new();
        let Some(user) = identity else {
            tracing::warn!("Cannot load all {}: no user logged in", kind);
            return all;
        };

        let docs = match self.store.list(user, kind.collection()) {
            Ok(docs) => docs,
            Err(e) => {
                tracing::warn!("Error loading all {} for {}: {}", kind, user, e);
                return all;
            }
        };

        for (id, value) in docs {
            let date = match DateKey::parse(&id) {
                Ok(date) => date,
                Err(_) => {
                    tracing::warn!("Skipping {} document with non-date id {:?}", kind, id);
                    continue;
                }
            };
            match serde_json::from_value::<T>(value) {
                Ok(entity) => {
                    self.cache_entity(&kind.cache_key(user, Some(&date)), &entity);
                    all.insert(date, entity);
                }
                Err(e) => tracing::warn!("Skipping malformed {} for {}: {}", kind, date, e),
            }
        }

        tracing::info!("Loaded {} {} entries for user {}", all.len(), kind, user);
        all
    }

    fn lookup<T>(&mut self, user: &UserId, kind: EntityKind, date: Option<&DateKey>) -> Lookup<T>
    where
        T: DeserializeOwned + Serialize,
    {
        let key = kind.cache_key(user, date);
        if let Some(raw) = self.cache.get(&key) {
            match serde_json::from_str(&raw) {
                Ok(value) => {
                    tracing::debug!("Loaded {} from cache", key);
                    return Lookup::Hit(value);
                }
                Err(e) => tracing::debug!("Discarding malformed cache entry {}: {}", key, e),
            }
        }

        let path = kind.doc_path(user, date);
        match self.store.get(&path) {
            Ok(Fetched::Found(value)) => match serde_json::from_value::<T>(value) {
                Ok(entity) => {
                    self.cache_entity(&key, &entity);
                    tracing::info!("Loaded {} from remote store", path);
                    Lookup::Hit(entity)
                }
                Err(e) => {
                    tracing::warn!("Remote document {} is malformed: {}", path, e);
                    Lookup::Fault
                }
            },
            Ok(Fetched::NotFound) => {
                tracing::debug!("No remote document at {}", path);
                Lookup::Missing
            }
            Err(e) => {
                tracing::warn!("Error loading {} from remote store: {}", path, e);
                Lookup::Fault
            }
        }
    }

    fn save_entity<T: Serialize>(
        &mut self,
        identity: Option<&UserId>,
        kind: EntityKind,
        date: Option<&DateKey>,
        entity: &T,
    ) -> Result<()> {
        let Some(user) = identity else {
            tracing::warn!("Cannot save {}: no user logged in", kind);
            return Ok(());
        };
        self.write(user, kind, date, entity)
    }

    fn write<T: Serialize>(
        &mut self,
        user: &UserId,
        kind: EntityKind,
        date: Option<&DateKey>,
        entity: &T,
    ) -> Result<()> {
        let value = serde_json::to_value(entity)?;
        self.write_value(user, kind, date, &value)
    }

    /// Local cache first, then the remote store
    fn write_value(
        &mut self,
        user: &UserId,
        kind: EntityKind,
        date: Option<&DateKey>,
        value: &Value,
    ) -> Result<()> {
        self.cache_entity(&kind.cache_key(user, date), value);

        let path = kind.doc_path(user, date);
        self.store.set(&path, value).map_err(|e| {
            tracing::warn!("Failed to write {} to remote store: {}", path, e);
            Error::from(e)
        })?;
        tracing::debug!("Wrote {}", path);
        Ok(())
    }

    /// Best-effort cache write; a cache that cannot persist is not fatal
    fn cache_entity<T: Serialize>(&mut self, key: &str, entity: &T) {
        let raw = match serde_json::to_string(entity) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Failed to serialize cache entry {}: {}", key, e);
                return;
            }
        };
        if let Err(e) = self.cache.set(key, raw) {
            tracing::warn!("Failed to persist cache entry {}: {}", key, e);
        }
    }
}

/// Map a legacy cache key to the entity it held
fn legacy_target(key: &str) -> Option<(EntityKind, Option<DateKey>)> {
    match key {
        "fittrack_workouts" => Some((EntityKind::Workouts, None)),
        "fittrack_workout_overrides" => Some((EntityKind::Overrides, None)),
        "fittrack_food_list" => Some((EntityKind::FoodLibrary, None)),
        _ => {
            if let Some(rest) = key.strip_prefix(LEGACY_FOOD_PREFIX) {
                DateKey::parse(rest).ok().map(|d| (EntityKind::Food, Some(d)))
            } else if let Some(rest) = key.strip_prefix(LEGACY_PROGRESS_PREFIX) {
                DateKey::parse(rest)
                    .ok()
                    .map(|d| (EntityKind::WorkoutProgress, Some(d)))
            } else {
                None
            }
        }
    }
}

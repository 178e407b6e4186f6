//! Remote document store collaborator.
//!
//! Documents live at `users/{userId}/{collection}/{documentId}`. The store
//! offers `get`, `set` and collection listing only; there is no delete and
//! no query.

use crate::UserId;
use fs2::FileExt;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Remote store fault
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Backend unreachable or refused the request
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Per-user document collections
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Collection {
    /// Singleton documents: `workouts`, `workoutOverrides`, `foodList`
    Data,
    /// Food logs keyed by date key
    Food,
    /// Workout progress snapshots keyed by date key
    WorkoutProgress,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Data => "data",
            Collection::Food => "food",
            Collection::WorkoutProgress => "workoutProgress",
        }
    }
}

/// Fully qualified document address
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DocPath {
    pub user: UserId,
    pub collection: Collection,
    pub id: String,
}

impl DocPath {
    pub fn new(user: &UserId, collection: Collection, id: impl Into<String>) -> Self {
        Self {
            user: user.clone(),
            collection,
            id: id.into(),
        }
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "users/{}/{}/{}", self.user, self.collection.as_str(), self.id)
    }
}

/// Result of a document read
#[derive(Clone, Debug, PartialEq)]
pub enum Fetched {
    Found(Value),
    NotFound,
}

/// Remote store trait for reading and writing user documents
pub trait RemoteStore {
    fn get(&self, path: &DocPath) -> StoreResult<Fetched>;

    fn set(&mut self, path: &DocPath, value: &Value) -> StoreResult<()>;

    /// All documents in one of the user's collections as `(id, value)` pairs
    fn list(&self, user: &UserId, collection: Collection) -> StoreResult<Vec<(String, Value)>>;
}

/// In-memory store for tests and embedding
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    docs: BTreeMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

impl RemoteStore for MemoryStore {
    fn get(&self, path: &DocPath) -> StoreResult<Fetched> {
        Ok(match self.docs.get(&path.to_string()) {
            Some(value) => Fetched::Found(value.clone()),
            None => Fetched::NotFound,
        })
    }

    fn set(&mut self, path: &DocPath, value: &Value) -> StoreResult<()> {
        self.docs.insert(path.to_string(), value.clone());
        Ok(())
    }

    fn list(&self, user: &UserId, collection: Collection) -> StoreResult<Vec<(String, Value)>> {
        let prefix = format!("users/{}/{}/", user, collection.as_str());
        Ok(self
            .docs
            .range(prefix.clone()..)
            .take_while(|(path, _)| path.starts_with(&prefix))
            .map(|(path, value)| (path[prefix.len()..].to_string(), value.clone()))
            .collect())
    }
}

/// Directory-backed store: one JSON file per document.
///
/// Writes go to a locked temp file that is synced and renamed into place,
/// so a reader never sees a half-written document.
#[derive(Clone, Debug)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn collection_dir(&self, user: &UserId, collection: Collection) -> PathBuf {
        self.root
            .join("users")
            .join(user.as_str())
            .join(collection.as_str())
    }

    fn doc_file(&self, path: &DocPath) -> PathBuf {
        self.collection_dir(&path.user, path.collection)
            .join(format!("{}.json", path.id))
    }
}

fn read_locked(path: &Path) -> StoreResult<String> {
    let file = File::open(path)?;
    file.lock_shared()?;
    let mut contents = String::new();
    let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
    file.unlock()?;
    read?;
    Ok(contents)
}

impl RemoteStore for FileStore {
    fn get(&self, path: &DocPath) -> StoreResult<Fetched> {
        let file = self.doc_file(path);
        if !file.exists() {
            return Ok(Fetched::NotFound);
        }
        let contents = read_locked(&file)?;
        let value = serde_json::from_str(&contents)?;
        tracing::debug!("Read {} from {:?}", path, file);
        Ok(Fetched::Found(value))
    }

    fn set(&mut self, path: &DocPath, value: &Value) -> StoreResult<()> {
        let dir = self.collection_dir(&path.user, path.collection);
        std::fs::create_dir_all(&dir)?;

        let temp = NamedTempFile::new_in(&dir)?;
        temp.as_file().lock_exclusive()?;
        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            serde_json::to_writer(&mut writer, value)?;
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        let target = self.doc_file(path);
        temp.persist(&target).map_err(|e| StoreError::Io(e.error))?;
        tracing::debug!("Wrote {} to {:?}", path, target);
        Ok(())
    }

    fn list(&self, user: &UserId, collection: Collection) -> StoreResult<Vec<(String, Value)>> {
        let dir = self.collection_dir(user, collection);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut docs = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let file = entry?.path();
            if file.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(id) = file.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match read_locked(&file).and_then(|c| Ok(serde_json::from_str::<Value>(&c)?)) {
                Ok(value) => docs.push((id.to_string(), value)),
                Err(e) => tracing::warn!("Skipping unreadable document {:?}: {}", file, e),
            }
        }
        docs.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(docs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn alice() -> UserId {
        UserId::new("alice").unwrap()
    }

    #[test]
    fn test_doc_path_rendering() {
        let path = DocPath::new(&alice(), Collection::WorkoutProgress, "2025-02-10");
        assert_eq!(path.to_string(), "users/alice/workoutProgress/2025-02-10");
        let path = DocPath::new(&alice(), Collection::Data, "workouts");
        assert_eq!(path.to_string(), "users/alice/data/workouts");
    }

    #[test]
    fn test_memory_store_get_set_list() {
        let mut store = MemoryStore::new();
        let path = DocPath::new(&alice(), Collection::Food, "2025-01-01");
        assert_eq!(store.get(&path).unwrap(), Fetched::NotFound);

        store.set(&path, &json!({"items": []})).unwrap();
        assert_eq!(store.get(&path).unwrap(), Fetched::Found(json!({"items": []})));

        let bob = UserId::new("bob").unwrap();
        store
            .set(&DocPath::new(&bob, Collection::Food, "2025-01-02"), &json!({}))
            .unwrap();
        store
            .set(&DocPath::new(&alice(), Collection::Data, "workouts"), &json!({}))
            .unwrap();

        let listed = store.list(&alice(), Collection::Food).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].0, "2025-01-01");
    }

    #[test]
    fn test_file_store_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(temp_dir.path());
        let path = DocPath::new(&alice(), Collection::Data, "workoutOverrides");

        assert_eq!(store.get(&path).unwrap(), Fetched::NotFound);
        store.set(&path, &json!({"2025-01-02": "Legs"})).unwrap();
        assert_eq!(
            store.get(&path).unwrap(),
            Fetched::Found(json!({"2025-01-02": "Legs"}))
        );
        assert!(temp_dir
            .path()
            .join("users/alice/data/workoutOverrides.json")
            .exists());
    }

    #[test]
    fn test_file_store_list_skips_corrupt_documents() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(temp_dir.path());
        store
            .set(&DocPath::new(&alice(), Collection::Food, "2025-01-01"), &json!({"items": []}))
            .unwrap();
        let dir = temp_dir.path().join("users/alice/food");
        std::fs::write(dir.join("2025-01-02.json"), "{ invalid json").unwrap();

        let listed = store.list(&alice(), Collection::Food).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].0, "2025-01-01");
    }

    #[test]
    fn test_file_store_corrupt_document_is_an_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(temp_dir.path());
        let dir = temp_dir.path().join("users/alice/data");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("workouts.json"), "not json").unwrap();

        let result = store.get(&DocPath::new(&alice(), Collection::Data, "workouts"));
        assert!(matches!(result, Err(StoreError::Json(_))));
    }

    #[test]
    fn test_file_store_list_missing_collection() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(temp_dir.path());
        assert!(store
            .list(&alice(), Collection::WorkoutProgress)
            .unwrap()
            .is_empty());
    }
}

//! # Persistence Boundary
//!
//! A small key-value contract over logical collections, with two concrete
//! backends and a tiered wrapper that degrades from the primary tier to a
//! fallback tier instead of surfacing failures.
//!
//! Values are stored as JSON documents addressable by id. Ordering guarantees
//! beyond per-collection enumeration are not part of the contract; callers
//! that need an order sort after loading. Writes are individually atomic at
//! best — there is no transaction spanning two `put` calls, and multi-write
//! operations in the service layer accept that crash window.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::PathBuf;
use tokio::sync::{Mutex, RwLock};
use tracing::warn;

/// Logical collections of the assistant's store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    Recipes,
    Inventory,
    GroceryLists,
    GroceryItems,
    ChatHistory,
    Notes,
    Timers,
    AiConfig,
}

impl Collection {
    pub const ALL: [Collection; 9] = [
        Collection::Users,
        Collection::Recipes,
        Collection::Inventory,
        Collection::GroceryLists,
        Collection::GroceryItems,
        Collection::ChatHistory,
        Collection::Notes,
        Collection::Timers,
        Collection::AiConfig,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Recipes => "recipes",
            Collection::Inventory => "inventory",
            Collection::GroceryLists => "grocery_lists",
            Collection::GroceryItems => "grocery_items",
            Collection::ChatHistory => "chat_history",
            Collection::Notes => "notes",
            Collection::Timers => "timers",
            Collection::AiConfig => "ai_config",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Failures raised by a storage backend.
#[derive(Debug)]
pub enum StorageError {
    /// The backing store could not be reached or refused the operation.
    Unavailable(String),
    /// A persisted document could not be read or written as JSON.
    Serialization(String),
    Io(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Unavailable(msg) => write!(f, "store unavailable: {msg}"),
            StorageError::Serialization(msg) => write!(f, "serialization error: {msg}"),
            StorageError::Io(msg) => write!(f, "io error: {msg}"),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err.to_string())
    }
}

/// The persistence contract the core is written against.
///
/// Implementations must be cheap to clone behind an `Arc` and safe to call
/// from concurrent tasks; the core itself issues at most one logical
/// operation per user at a time.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Value>, StorageError>;
    async fn get_all(&self, collection: Collection) -> Result<Vec<Value>, StorageError>;
    async fn put(&self, collection: Collection, id: &str, value: Value)
        -> Result<(), StorageError>;
    async fn delete(&self, collection: Collection, id: &str) -> Result<bool, StorageError>;
    async fn clear(&self, collection: Collection) -> Result<(), StorageError>;
}

/// Wipe every collection. Collections that fail to clear are reported but do
/// not stop the remaining ones from being cleared.
pub async fn clear_all(store: &dyn KeyValueStore) -> Result<(), StorageError> {
    let mut first_error = None;
    for collection in Collection::ALL {
        if let Err(err) = store.clear(collection).await {
            warn!(collection = %collection, error = %err, "failed to clear collection");
            first_error.get_or_insert(err);
        }
    }
    match first_error {
        None => Ok(()),
        Some(err) => Err(err),
    }
}

/// In-memory store, the default for tests and the line-mode binary.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, BTreeMap<String, Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Value>, StorageError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .and_then(|entries| entries.get(id))
            .cloned())
    }

    async fn get_all(&self, collection: Collection) -> Result<Vec<Value>, StorageError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .map(|entries| entries.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn put(
        &self,
        collection: Collection,
        id: &str,
        value: Value,
    ) -> Result<(), StorageError> {
        let mut collections = self.collections.write().await;
        collections
            .entry(collection)
            .or_default()
            .insert(id.to_string(), value);
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<bool, StorageError> {
        let mut collections = self.collections.write().await;
        Ok(collections
            .get_mut(&collection)
            .map(|entries| entries.remove(id).is_some())
            .unwrap_or(false))
    }

    async fn clear(&self, collection: Collection) -> Result<(), StorageError> {
        let mut collections = self.collections.write().await;
        collections.remove(&collection);
        Ok(())
    }
}

/// File-backed store: one JSON document per collection under a data
/// directory. The local analogue of a browser's string-keyed storage.
pub struct JsonFileStore {
    dir: PathBuf,
    /// Serializes read-modify-write cycles on the collection files.
    write_guard: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_guard: Mutex::new(()),
        }
    }

    fn path_for(&self, collection: Collection) -> PathBuf {
        self.dir.join(format!("{}.json", collection.name()))
    }

    /// Load a collection file. A missing file is an empty collection; an
    /// unreadable or malformed file is recovered as empty with a warning
    /// rather than propagated.
    async fn load(&self, collection: Collection) -> Result<BTreeMap<String, Value>, StorageError> {
        let path = self.path_for(collection);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => return Err(err.into()),
        };

        match serde_json::from_slice(&bytes) {
            Ok(entries) => Ok(entries),
            Err(err) => {
                warn!(collection = %collection, error = %err, "malformed collection file, starting empty");
                Ok(BTreeMap::new())
            }
        }
    }

    async fn save(
        &self,
        collection: Collection,
        entries: &BTreeMap<String, Value>,
    ) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let bytes = serde_json::to_vec_pretty(entries)?;
        tokio::fs::write(self.path_for(collection), bytes).await?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Value>, StorageError> {
        let entries = self.load(collection).await?;
        Ok(entries.get(id).cloned())
    }

    async fn get_all(&self, collection: Collection) -> Result<Vec<Value>, StorageError> {
        let entries = self.load(collection).await?;
        Ok(entries.into_values().collect())
    }

    async fn put(
        &self,
        collection: Collection,
        id: &str,
        value: Value,
    ) -> Result<(), StorageError> {
        let _guard = self.write_guard.lock().await;
        let mut entries = self.load(collection).await?;
        entries.insert(id.to_string(), value);
        self.save(collection, &entries).await
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<bool, StorageError> {
        let _guard = self.write_guard.lock().await;
        let mut entries = self.load(collection).await?;
        let removed = entries.remove(id).is_some();
        if removed {
            self.save(collection, &entries).await?;
        }
        Ok(removed)
    }

    async fn clear(&self, collection: Collection) -> Result<(), StorageError> {
        let _guard = self.write_guard.lock().await;
        match tokio::fs::remove_file(self.path_for(collection)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Primary store with a fallback tier.
///
/// Every operation tries the primary first and degrades to the fallback on
/// failure, logging the degradation. Reads served from the fallback may lag
/// writes that only reached the primary; availability wins over strictness
/// at this boundary.
pub struct TieredStore {
    primary: std::sync::Arc<dyn KeyValueStore>,
    fallback: std::sync::Arc<dyn KeyValueStore>,
}

impl TieredStore {
    pub fn new(
        primary: std::sync::Arc<dyn KeyValueStore>,
        fallback: std::sync::Arc<dyn KeyValueStore>,
    ) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl KeyValueStore for TieredStore {
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Value>, StorageError> {
        match self.primary.get(collection, id).await {
            Ok(value) => Ok(value),
            Err(err) => {
                warn!(collection = %collection, error = %err, "primary store get failed, using fallback");
                self.fallback.get(collection, id).await
            }
        }
    }

    async fn get_all(&self, collection: Collection) -> Result<Vec<Value>, StorageError> {
        match self.primary.get_all(collection).await {
            Ok(values) => Ok(values),
            Err(err) => {
                warn!(collection = %collection, error = %err, "primary store get_all failed, using fallback");
                self.fallback.get_all(collection).await
            }
        }
    }

    async fn put(
        &self,
        collection: Collection,
        id: &str,
        value: Value,
    ) -> Result<(), StorageError> {
        match self.primary.put(collection, id, value.clone()).await {
            Ok(()) => Ok(()),
            Err(err) => {
                warn!(collection = %collection, error = %err, "primary store put failed, using fallback");
                self.fallback.put(collection, id, value).await
            }
        }
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<bool, StorageError> {
        match self.primary.delete(collection, id).await {
            Ok(removed) => Ok(removed),
            Err(err) => {
                warn!(collection = %collection, error = %err, "primary store delete failed, using fallback");
                self.fallback.delete(collection, id).await
            }
        }
    }

    async fn clear(&self, collection: Collection) -> Result<(), StorageError> {
        match self.primary.clear(collection).await {
            Ok(()) => Ok(()),
            Err(err) => {
                warn!(collection = %collection, error = %err, "primary store clear failed, using fallback");
                self.fallback.clear(collection).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    /// Backend that always fails, for exercising the fallback tier.
    struct BrokenStore;

    #[async_trait]
    impl KeyValueStore for BrokenStore {
        async fn get(&self, _: Collection, _: &str) -> Result<Option<Value>, StorageError> {
            Err(StorageError::Unavailable("broken".into()))
        }
        async fn get_all(&self, _: Collection) -> Result<Vec<Value>, StorageError> {
            Err(StorageError::Unavailable("broken".into()))
        }
        async fn put(&self, _: Collection, _: &str, _: Value) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("broken".into()))
        }
        async fn delete(&self, _: Collection, _: &str) -> Result<bool, StorageError> {
            Err(StorageError::Unavailable("broken".into()))
        }
        async fn clear(&self, _: Collection) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("broken".into()))
        }
    }

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        store
            .put(Collection::Inventory, "1", json!({"ingredient_name": "Eggs"}))
            .await
            .unwrap();

        let value = store.get(Collection::Inventory, "1").await.unwrap().unwrap();
        assert_eq!(value["ingredient_name"], "Eggs");

        assert!(store.delete(Collection::Inventory, "1").await.unwrap());
        assert!(!store.delete(Collection::Inventory, "1").await.unwrap());
        assert!(store.get(Collection::Inventory, "1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_store_collections_are_isolated() {
        let store = MemoryStore::new();
        store.put(Collection::Recipes, "1", json!({"title": "Soup"})).await.unwrap();
        assert!(store.get(Collection::Inventory, "1").await.unwrap().is_none());
        assert_eq!(store.get_all(Collection::Recipes).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_json_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());

        store
            .put(Collection::Inventory, "1", json!({"ingredient_name": "Milk"}))
            .await
            .unwrap();
        store
            .put(Collection::Inventory, "2", json!({"ingredient_name": "Eggs"}))
            .await
            .unwrap();

        let all = store.get_all(Collection::Inventory).await.unwrap();
        assert_eq!(all.len(), 2);

        assert!(store.delete(Collection::Inventory, "1").await.unwrap());
        let all = store.get_all(Collection::Inventory).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_json_file_store_recovers_from_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        tokio::fs::write(dir.path().join("inventory.json"), b"{not json")
            .await
            .unwrap();

        // Malformed persisted state degrades to an empty collection.
        let all = store.get_all(Collection::Inventory).await.unwrap();
        assert!(all.is_empty());
    }

    #[tokio::test]
    async fn test_tiered_store_degrades_to_fallback() {
        let fallback = Arc::new(MemoryStore::new());
        let store = TieredStore::new(Arc::new(BrokenStore), fallback.clone());

        store
            .put(Collection::Notes, "n1", json!({"content": "2 eggs"}))
            .await
            .unwrap();

        // The write landed in the fallback tier.
        assert!(fallback.get(Collection::Notes, "n1").await.unwrap().is_some());
        assert!(store.get(Collection::Notes, "n1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_clear_all_empties_every_collection() {
        let store = MemoryStore::new();
        store.put(Collection::Recipes, "1", json!({"title": "Soup"})).await.unwrap();
        store.put(Collection::Inventory, "1", json!({"ingredient_name": "Salt"})).await.unwrap();

        clear_all(&store).await.unwrap();

        for collection in Collection::ALL {
            assert!(store.get_all(collection).await.unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_tiered_store_prefers_primary() {
        let primary = Arc::new(MemoryStore::new());
        let fallback = Arc::new(MemoryStore::new());
        let store = TieredStore::new(primary.clone(), fallback.clone());

        store.put(Collection::Notes, "n1", json!({"content": "milk"})).await.unwrap();
        assert!(primary.get(Collection::Notes, "n1").await.unwrap().is_some());
        assert!(fallback.get(Collection::Notes, "n1").await.unwrap().is_none());
    }
}

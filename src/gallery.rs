//! Saved renders, persisted as one JSON document in a key-value store.
//!
//! The list is read once when the repository is created and rewritten in
//! full after every change.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::GalleryError;
use crate::snapshot::Snapshot;

/// Key the gallery list is stored under
pub const GALLERY_KEY: &str = "sketch_render.gallery";

/// A sketch, the render made from it, and the prompt used
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedItem {
    pub id: Uuid,
    pub sketch: Snapshot,
    pub result: Snapshot,
    pub prompt: String,
    /// Unix timestamp in milliseconds
    pub created_at: u64,
}

impl SavedItem {
    /// Create an item with a freshly generated id
    pub fn new(sketch: Snapshot, result: Snapshot, prompt: String, created_at: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            sketch,
            result,
            prompt,
            created_at,
        }
    }
}

/// Minimal string key-value storage
pub trait KeyValueStore {
    fn get_string(&self, key: &str) -> Option<String>;
    fn set_string(&mut self, key: &str, value: String) -> Result<(), GalleryError>;
}

/// In-memory store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_string(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }

    fn set_string(&mut self, key: &str, value: String) -> Result<(), GalleryError> {
        self.values.lock().insert(key.to_owned(), value);
        Ok(())
    }
}

/// Store backed by a single JSON file holding every key
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FileStore {
    /// Open the store at `path`. A missing or unreadable file yields an
    /// empty store.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(json) => serde_json::from_str(&json).unwrap_or_else(|err| {
                log::warn!("Ignoring unreadable store {}: {}", path.display(), err);
                BTreeMap::new()
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => {
                log::warn!("Failed to read store {}: {}", path.display(), err);
                BTreeMap::new()
            }
        };

        Self { path, values }
    }

    /// `gallery.json` in eframe's per-app data directory
    pub fn default_path(app_id: &str) -> Option<PathBuf> {
        eframe::storage_dir(app_id).map(|dir| dir.join("gallery.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get_string(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    /// Writes the file first; the in-memory values only change once the
    /// write succeeded.
    fn set_string(&mut self, key: &str, value: String) -> Result<(), GalleryError> {
        let mut values = self.values.clone();
        values.insert(key.to_owned(), value);

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string(&values)?;
        fs::write(&self.path, json)?;

        self.values = values;
        Ok(())
    }
}

/// The saved items, newest first
pub struct GalleryRepository {
    store: Box<dyn KeyValueStore>,
    items: Vec<SavedItem>,
}

impl std::fmt::Debug for GalleryRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GalleryRepository")
            .field("items", &self.items.len())
            .finish_non_exhaustive()
    }
}

impl GalleryRepository {
    /// Read the gallery from `store`. Corrupt data is logged and treated as
    /// an empty gallery.
    pub fn load(store: impl KeyValueStore + 'static) -> Self {
        let items = match store.get_string(GALLERY_KEY) {
            None => Vec::new(),
            Some(json) => match serde_json::from_str::<Vec<SavedItem>>(&json) {
                Ok(items) => {
                    log::info!("Loaded {} saved items", items.len());
                    items
                }
                Err(err) => {
                    log::warn!("Discarding unreadable gallery data: {}", err);
                    Vec::new()
                }
            },
        };

        Self {
            store: Box::new(store),
            items,
        }
    }

    pub fn items(&self) -> &[SavedItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&SavedItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Put `item` at the front of the list and persist. Nothing changes if
    /// the store cannot be written.
    pub fn add(&mut self, item: SavedItem) -> Result<(), GalleryError> {
        log::info!("Saving gallery item {}", item.id);
        let mut items = Vec::with_capacity(self.items.len() + 1);
        items.push(item);
        items.extend(self.items.iter().cloned());
        self.commit(items)
    }

    /// Remove the item with `id` and persist
    pub fn remove(&mut self, id: Uuid) -> Result<SavedItem, GalleryError> {
        let index = self
            .items
            .iter()
            .position(|item| item.id == id)
            .ok_or(GalleryError::NotFound(id))?;

        let mut items = self.items.clone();
        let removed = items.remove(index);
        self.commit(items)?;
        log::info!("Deleted gallery item {}", id);
        Ok(removed)
    }

    /// Persist `items` and make them current only once the store accepted them
    fn commit(&mut self, items: Vec<SavedItem>) -> Result<(), GalleryError> {
        let json = serde_json::to_string(&items)?;
        self.store.set_string(GALLERY_KEY, json)?;
        self.items = items;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn item(shade: u8) -> SavedItem {
        let snapshot =
            Snapshot::capture(&RgbaImage::from_pixel(2, 2, Rgba([shade, shade, shade, 255])))
                .unwrap();
        SavedItem::new(snapshot.clone(), snapshot, format!("prompt {shade}"), 1_700_000_000_000)
    }

    #[test]
    fn test_add_puts_newest_first_and_persists() {
        let store = MemoryStore::new();
        let mut gallery = GalleryRepository::load(store.clone());

        let first = item(1);
        let second = item(2);
        gallery.add(first.clone()).unwrap();
        gallery.add(second.clone()).unwrap();

        assert_eq!(gallery.items(), &[second.clone(), first.clone()]);

        let reloaded = GalleryRepository::load(store);
        assert_eq!(reloaded.items(), &[second, first]);
    }

    #[test]
    fn test_remove_unknown_id() {
        let mut gallery = GalleryRepository::load(MemoryStore::new());
        gallery.add(item(1)).unwrap();

        let missing = Uuid::new_v4();
        assert!(matches!(gallery.remove(missing), Err(GalleryError::NotFound(id)) if id == missing));
        assert_eq!(gallery.len(), 1);
    }

    #[test]
    fn test_corrupt_data_is_treated_as_empty() {
        let mut store = MemoryStore::new();
        store.set_string(GALLERY_KEY, "{not json".to_owned()).unwrap();

        let gallery = GalleryRepository::load(store);
        assert!(gallery.is_empty());
    }

    /// Accepts writes until `writable` is switched off
    #[derive(Clone)]
    struct FlakyStore {
        inner: MemoryStore,
        writable: Arc<Mutex<bool>>,
    }

    impl KeyValueStore for FlakyStore {
        fn get_string(&self, key: &str) -> Option<String> {
            self.inner.get_string(key)
        }

        fn set_string(&mut self, key: &str, value: String) -> Result<(), GalleryError> {
            if !*self.writable.lock() {
                return Err(std::io::Error::other("disk full").into());
            }
            self.inner.set_string(key, value)
        }
    }

    #[test]
    fn test_failed_write_leaves_gallery_unchanged() {
        let store = FlakyStore {
            inner: MemoryStore::new(),
            writable: Arc::new(Mutex::new(true)),
        };
        let mut gallery = GalleryRepository::load(store.clone());
        let kept = item(1);
        gallery.add(kept.clone()).unwrap();

        *store.writable.lock() = false;
        assert!(matches!(gallery.add(item(2)), Err(GalleryError::Write(_))));
        assert_eq!(gallery.items(), &[kept.clone()]);

        assert!(matches!(gallery.remove(kept.id), Err(GalleryError::Write(_))));
        assert_eq!(gallery.items(), &[kept.clone()]);

        // The store still matches what is shown
        assert_eq!(GalleryRepository::load(store).items(), &[kept]);
    }

    #[test]
    fn test_items_get_unique_ids() {
        assert_ne!(item(1).id, item(1).id);
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = std::env::temp_dir().join(format!("sketch_render_test_{}", Uuid::new_v4()));
        let path = dir.join("nested").join("gallery.json");

        let mut store = FileStore::open(&path);
        assert_eq!(store.get_string("a"), None);
        store.set_string("a", "1".to_owned()).unwrap();

        let reopened = FileStore::open(&path);
        assert_eq!(reopened.get_string("a"), Some("1".to_owned()));

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_file_store_keeps_values_when_write_fails() {
        let dir = std::env::temp_dir().join(format!("sketch_render_test_{}", Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();

        // A directory where the file should be makes every write fail
        let mut store = FileStore::open(&dir);
        assert!(matches!(store.set_string("a", "1".to_owned()), Err(GalleryError::Write(_))));
        assert_eq!(store.get_string("a"), None);

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_file_store_ignores_corrupt_file() {
        let dir = std::env::temp_dir().join(format!("sketch_render_test_{}", Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("gallery.json");
        fs::write(&path, "][").unwrap();

        let store = FileStore::open(&path);
        assert_eq!(store.get_string(GALLERY_KEY), None);

        let _ = fs::remove_dir_all(dir);
    }
}

//! Whole-document persistence for the item catalog.
//!
//! Every read parses the full file and every write replaces it. There is no
//! index and no partial update. Writes inside one process are serialized by
//! a mutex; separate processes sharing the file still race (last writer wins).

use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use catalog_protocol::Item;
use serde_json::Map;
use serde_json::Value;

/// Errors from the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("invalid item: {0}")]
    InvalidItem(#[source] serde_json::Error),
}

/// Cheap change-detection signal for the backing document.
///
/// Compares modification time and byte length, not content. A rewrite that
/// keeps both unchanged goes unnoticed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreMarker {
    modified: SystemTime,
    len: u64,
}

/// JSON-file backed item collection.
pub struct ItemStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl ItemStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every item. Fails when the document is missing or malformed.
    pub fn read(&self) -> Result<Vec<Item>, StoreError> {
        let raw = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Replace the document with `items`.
    pub fn write(&self, items: &[Item]) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(items)?;
        self.atomic_write(json.as_bytes())?;
        tracing::debug!("wrote {} items to {}", items.len(), self.path.display());
        Ok(())
    }

    /// Current freshness marker of the document.
    pub fn marker(&self) -> Result<StoreMarker, StoreError> {
        let meta = std::fs::metadata(&self.path)?;
        Ok(StoreMarker {
            modified: meta.modified()?,
            len: meta.len(),
        })
    }

    /// Append a new item built from `fields` and persist the collection.
    ///
    /// The id is the current time in milliseconds, bumped past the largest
    /// existing id when the clock has not moved far enough. Existing entries
    /// and the new fields are written back exactly as they were given.
    pub fn create(&self, mut fields: Map<String, Value>) -> Result<Item, StoreError> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let raw = std::fs::read_to_string(&self.path)?;
        let mut documents: Vec<Value> = serde_json::from_str(&raw)?;
        let existing = documents
            .iter()
            .filter_map(|doc| doc.get("id").and_then(Value::as_i64));
        let id = next_id(existing, now_millis());

        fields.insert("id".to_string(), Value::from(id));
        let item = Item::from_fields(fields.clone(), id).map_err(StoreError::InvalidItem)?;
        documents.push(Value::Object(fields));
        let json = serde_json::to_string_pretty(&documents)?;
        self.atomic_write(json.as_bytes())?;

        tracing::info!("created item {} ({} items total)", item.id, documents.len());
        Ok(item)
    }

    /// Write `seed` when no document exists yet. Returns whether it wrote.
    pub fn init_if_missing(&self, seed: &[Item]) -> Result<bool, StoreError> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if self.path.exists() {
            return Ok(false);
        }
        self.write(seed)?;
        tracing::info!("initialized catalog at {}", self.path.display());
        Ok(true)
    }

    /// Write `data` to a `.tmp` sibling and rename it over the document.
    fn atomic_write(&self, data: &[u8]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, data)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or_default()
}

fn next_id(existing: impl IntoIterator<Item = i64>, now: i64) -> i64 {
    match existing.into_iter().max() {
        Some(max) if max >= now => max.saturating_add(1),
        _ => now,
    }
}

use dashmap::mapref::entry::Entry;
use dashmap::{DashMap, DashSet};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::error::{Result, WizardError};
use crate::path::{self, FieldPath};

/// Callback invoked after every notifying write. Receives the written path,
/// the new value (`Null` for removals) and the store itself so derived
/// fields can be recomputed.
pub type Watcher = Arc<dyn Fn(&FieldPath, &Value, &FormStore) + Send + Sync>;

/// Handle returned by [`FormStore::watch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(u64);

/// Controls the side effects of a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetOptions {
    /// Re-run the owning step's rules for the written field.
    pub validate: bool,
    /// Record the field as touched by the user.
    pub dirty: bool,
    /// Invoke the registered watchers.
    pub notify: bool,
}

impl Default for SetOptions {
    fn default() -> Self {
        Self {
            validate: false,
            dirty: true,
            notify: true,
        }
    }
}

impl SetOptions {
    pub fn validated() -> Self {
        Self {
            validate: true,
            ..Self::default()
        }
    }

    /// For derived values: no dirty tracking, no watcher round trip.
    pub fn silent() -> Self {
        Self {
            validate: false,
            dirty: false,
            notify: false,
        }
    }
}

/// The answer tree of one wizard session.
///
/// Sections are stored side by side, so a write under one section can never
/// drop another. Cloning shares the same underlying tree; use
/// [`FormStore::detached`] for an independent copy.
#[derive(Clone)]
pub struct FormStore {
    sections: Arc<DashMap<String, Value>>,
    dirty: Arc<DashSet<String>>,
    watchers: Arc<RwLock<Vec<(WatchId, Watcher)>>>,
    next_watch_id: Arc<AtomicU64>,
}

impl FormStore {
    pub fn new() -> Self {
        Self {
            sections: Arc::new(DashMap::new()),
            dirty: Arc::new(DashSet::new()),
            watchers: Arc::new(RwLock::new(Vec::new())),
            next_watch_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Builds a store from an object of sections, e.g. the partial defaults
    /// a wizard starts with or a serialized snapshot.
    pub fn from_snapshot(snapshot: Value) -> Result<Self> {
        let store = Self::new();
        match snapshot {
            Value::Object(sections) => {
                for (name, value) in sections {
                    store.sections.insert(name, value);
                }
                Ok(store)
            }
            Value::Null => Ok(store),
            other => Err(WizardError::InvalidPath {
                path: other.to_string(),
                reason: "answer snapshot must be an object of sections".to_string(),
            }),
        }
    }

    pub async fn set(&self, path: &str, value: impl Serialize) -> Result<()> {
        self.set_sync(path, value)
    }

    pub fn set_sync(&self, path: &str, value: impl Serialize) -> Result<()> {
        let path = FieldPath::parse(path)?;
        let value = serde_json::to_value(value)?;
        self.set_with(&path, value, SetOptions::default())
    }

    /// Core write. Only the addressed field changes; a path that does not
    /// fit the stored shape is rejected and nothing is written.
    pub fn set_with(&self, path: &FieldPath, value: Value, options: SetOptions) -> Result<()> {
        let invalid = |reason: &str| WizardError::InvalidPath {
            path: path.to_string(),
            reason: reason.to_string(),
        };
        match self.sections.entry(path.section().to_string()) {
            Entry::Occupied(mut section) => {
                path::assign(section.get_mut(), path.rest(), value.clone()).map_err(invalid)?;
            }
            Entry::Vacant(slot) => {
                let mut section = Value::Null;
                path::assign(&mut section, path.rest(), value.clone()).map_err(invalid)?;
                slot.insert(section);
            }
        }

        if options.dirty {
            self.dirty.insert(path.to_string());
        }
        if options.notify {
            self.notify(path, &value);
        }
        Ok(())
    }

    pub async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Option<T> {
        self.get_sync(path)
    }

    pub fn get_sync<T: serde::de::DeserializeOwned>(&self, path: &str) -> Option<T> {
        let path = FieldPath::parse(path).ok()?;
        self.value(&path)
            .and_then(|value| serde_json::from_value(value).ok())
    }

    /// Typed read falling back to the type's default when the field is
    /// absent or holds something else.
    pub fn get_or_default<T>(&self, path: &str) -> T
    where
        T: serde::de::DeserializeOwned + Default,
    {
        self.get_sync(path).unwrap_or_default()
    }

    /// Raw read. Explicit `null`s read as absent.
    pub fn value(&self, path: &FieldPath) -> Option<Value> {
        let section = self.sections.get(path.section())?;
        path::lookup(section.value(), path.rest())
            .filter(|value| !value.is_null())
            .cloned()
    }

    /// Appends an entry to the list at `path` and returns its index.
    pub fn append(&self, path: &FieldPath, item: Value) -> Result<usize> {
        let index = self.len(path);
        self.set_with(&path.index(index), item, SetOptions::default())?;
        Ok(index)
    }

    /// Number of entries of the list at `path`, 0 when absent.
    pub fn len(&self, path: &FieldPath) -> usize {
        match self.value(path) {
            Some(Value::Array(items)) => items.len(),
            _ => 0,
        }
    }

    pub fn remove(&self, path: &FieldPath) -> Option<Value> {
        let removed = if path.rest().is_empty() {
            self.sections.remove(path.section()).map(|(_, value)| value)
        } else {
            let mut section = self.sections.get_mut(path.section())?;
            path::remove(section.value_mut(), path.rest())
        };

        if removed.is_some() {
            let prefix = format!("{path}.");
            self.dirty
                .retain(|field| field != path.as_str() && !field.starts_with(&prefix));
            self.notify(path, &Value::Null);
        }
        removed
    }

    /// Independent copy of the answers, dirty set and watchers.
    pub fn detached(&self) -> Self {
        let copy = Self::new();
        for entry in self.sections.iter() {
            copy.sections.insert(entry.key().clone(), entry.value().clone());
        }
        for field in self.dirty.iter() {
            copy.dirty.insert(field.key().clone());
        }
        let watchers = self
            .watchers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        *copy
            .watchers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = watchers;
        copy.next_watch_id
            .store(self.next_watch_id.load(Ordering::Relaxed), Ordering::Relaxed);
        copy
    }

    pub fn is_dirty(&self, path: &str) -> bool {
        self.dirty.contains(path)
    }

    pub fn dirty_fields(&self) -> Vec<String> {
        let mut fields: Vec<String> = self.dirty.iter().map(|field| field.key().clone()).collect();
        fields.sort();
        fields
    }

    pub fn section_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.sections.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// The full answer tree, sections in name order.
    pub fn snapshot(&self) -> Value {
        let mut sections: Vec<(String, Value)> = self
            .sections
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        sections.sort_by(|a, b| a.0.cmp(&b.0));
        Value::Object(sections.into_iter().collect::<Map<String, Value>>())
    }

    /// Registers a callback invoked on every notifying write.
    pub fn watch<F>(&self, callback: F) -> WatchId
    where
        F: Fn(&FieldPath, &Value, &FormStore) + Send + Sync + 'static,
    {
        let id = WatchId(self.next_watch_id.fetch_add(1, Ordering::Relaxed));
        self.watchers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((id, Arc::new(callback)));
        id
    }

    pub fn unwatch(&self, id: WatchId) -> bool {
        let mut watchers = self
            .watchers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let before = watchers.len();
        watchers.retain(|(watch_id, _)| *watch_id != id);
        watchers.len() != before
    }

    fn notify(&self, path: &FieldPath, value: &Value) {
        // Snapshot the registry so callbacks may write back into the store.
        let watchers: Vec<Watcher> = self
            .watchers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .map(|(_, watcher)| watcher.clone())
            .collect();
        for watcher in watchers {
            watcher(path, value, self);
        }
    }
}

impl Default for FormStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FormStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormStore")
            .field("sections", &self.snapshot())
            .field("dirty", &self.dirty_fields())
            .finish()
    }
}

impl Serialize for FormStore {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.snapshot().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FormStore {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let snapshot = Value::deserialize(deserializer)?;
        Self::from_snapshot(snapshot).map_err(serde::de::Error::custom)
    }
}

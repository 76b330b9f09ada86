//! Persisted key-value state with change notification.
//!
//! A JSON object on disk fronted by an in-memory map. Every mutation lands
//! on disk and fans out to subscribers; [`KvStore::reload`] picks up writes
//! made through another handle over the same file and notifies subscribers
//! of exactly the keys that differ.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;

use anyhow::{Context, Result};
use log::warn;
use serde_json::Value;
use tokio::sync::broadcast;

const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// A single key change as seen by subscribers. `value: None` means removal.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreChange {
    pub key: String,
    pub value: Option<Value>,
}

pub struct KvStore {
    path: PathBuf,
    data: RwLock<BTreeMap<String, Value>>,
    changes: broadcast::Sender<StoreChange>,
}

impl KvStore {
    /// Opens the store at `path`. A missing file starts empty; unreadable
    /// content is discarded with a warning rather than failing.
    pub fn open(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("failed to read store from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!("discarding unreadable store {}: {err}", path.display());
                BTreeMap::new()
            })
        } else {
            BTreeMap::new()
        };

        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Ok(Self {
            path,
            data: RwLock::new(data),
            changes,
        })
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.data.read().unwrap().get(key).cloned()
    }

    /// Returns the stored value, seeding `default` (on disk too) when the
    /// key is absent.
    pub fn get_or_seed(&self, key: &str, default: Value) -> Result<Value> {
        {
            let guard = self.data.read().unwrap();
            if let Some(value) = guard.get(key) {
                return Ok(value.clone());
            }
        }
        self.set(key, default.clone())?;
        Ok(default)
    }

    /// Stores `value` under `key`, persists, and notifies subscribers.
    pub fn set(&self, key: &str, value: Value) -> Result<()> {
        {
            let mut guard = self.data.write().unwrap();
            guard.insert(key.to_string(), value.clone());
            self.persist(&guard)?;
        }
        self.notify(key, Some(value));
        Ok(())
    }

    /// Removes `key`, persists, and notifies subscribers. Removing an absent
    /// key is a no-op.
    pub fn remove(&self, key: &str) -> Result<()> {
        let removed = {
            let mut guard = self.data.write().unwrap();
            let removed = guard.remove(key).is_some();
            if removed {
                self.persist(&guard)?;
            }
            removed
        };
        if removed {
            self.notify(key, None);
        }
        Ok(())
    }

    /// Applies `update` to the current value; returning `None` removes the
    /// key.
    pub fn update(
        &self,
        key: &str,
        update: impl FnOnce(Option<Value>) -> Option<Value>,
    ) -> Result<()> {
        match update(self.get(key)) {
            Some(next) => self.set(key, next),
            None => self.remove(key),
        }
    }

    /// Re-reads the backing file and notifies subscribers of every key that
    /// differs, so writes from another handle over the same file propagate.
    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read store from {}", self.path.display()))?;
        let fresh: BTreeMap<String, Value> = serde_json::from_str(&contents).unwrap_or_default();

        let changed = {
            let mut guard = self.data.write().unwrap();
            let mut changed = Vec::new();
            for (key, value) in &fresh {
                if guard.get(key) != Some(value) {
                    changed.push(StoreChange {
                        key: key.clone(),
                        value: Some(value.clone()),
                    });
                }
            }
            for key in guard.keys() {
                if !fresh.contains_key(key) {
                    changed.push(StoreChange {
                        key: key.clone(),
                        value: None,
                    });
                }
            }
            *guard = fresh;
            changed
        };

        for change in changed {
            let _ = self.changes.send(change);
        }
        Ok(())
    }

    /// Subscribes to key changes. Lagging subscribers skip to newer events.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }

    fn notify(&self, key: &str, value: Option<Value>) {
        let _ = self.changes.send(StoreChange {
            key: key.to_string(),
            value,
        });
    }

    fn persist(&self, data: &BTreeMap<String, Value>) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("failed to write store to {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn temp_store_path(tag: &str) -> PathBuf {
        static SEQ: AtomicUsize = AtomicUsize::new(0);
        let seq = SEQ.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!(
            "devicesense-store-{tag}-{}-{seq}.json",
            std::process::id()
        ))
    }

    #[test]
    fn set_persists_across_reopen() {
        let path = temp_store_path("reopen");
        let store = KvStore::open(path.clone()).unwrap();
        store.set("theme", json!("dark")).unwrap();

        let reopened = KvStore::open(path.clone()).unwrap();
        assert_eq!(reopened.get("theme"), Some(json!("dark")));

        let _ = fs::remove_file(path);
    }

    #[test]
    fn subscribers_see_sets_and_removes_in_order() {
        let path = temp_store_path("notify");
        let store = KvStore::open(path.clone()).unwrap();
        let mut changes = store.subscribe();

        store.set("count", json!(1)).unwrap();
        store.remove("count").unwrap();

        assert_eq!(
            changes.try_recv().unwrap(),
            StoreChange {
                key: "count".to_string(),
                value: Some(json!(1)),
            }
        );
        assert_eq!(
            changes.try_recv().unwrap(),
            StoreChange {
                key: "count".to_string(),
                value: None,
            }
        );

        let _ = fs::remove_file(path);
    }

    #[test]
    fn removing_an_absent_key_notifies_nobody() {
        let path = temp_store_path("absent");
        let store = KvStore::open(path.clone()).unwrap();
        let mut changes = store.subscribe();

        store.remove("ghost").unwrap();
        assert!(changes.try_recv().is_err());

        let _ = fs::remove_file(path);
    }

    #[test]
    fn get_or_seed_writes_the_default_once() {
        let path = temp_store_path("seed");
        let store = KvStore::open(path.clone()).unwrap();

        let value = store.get_or_seed("volume", json!(0.5)).unwrap();
        assert_eq!(value, json!(0.5));

        // Seeded to disk, and a later seed does not clobber a real value.
        store.set("volume", json!(0.9)).unwrap();
        assert_eq!(store.get_or_seed("volume", json!(0.5)).unwrap(), json!(0.9));

        let _ = fs::remove_file(path);
    }

    #[test]
    fn update_with_none_removes() {
        let path = temp_store_path("update");
        let store = KvStore::open(path.clone()).unwrap();

        store.set("count", json!(1)).unwrap();
        store
            .update("count", |prev| {
                prev.and_then(|v| v.as_i64()).map(|n| json!(n + 1))
            })
            .unwrap();
        assert_eq!(store.get("count"), Some(json!(2)));

        store.update("count", |_| None).unwrap();
        assert_eq!(store.get("count"), None);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn reload_propagates_writes_from_another_handle() {
        let path = temp_store_path("reload");
        let store_a = KvStore::open(path.clone()).unwrap();
        let store_b = KvStore::open(path.clone()).unwrap();
        let mut changes_b = store_b.subscribe();

        store_a.set("theme", json!("dark")).unwrap();
        assert_eq!(store_b.get("theme"), None);

        store_b.reload().unwrap();
        assert_eq!(store_b.get("theme"), Some(json!("dark")));
        assert_eq!(
            changes_b.try_recv().unwrap(),
            StoreChange {
                key: "theme".to_string(),
                value: Some(json!("dark")),
            }
        );

        // Unchanged content reloads quietly.
        store_b.reload().unwrap();
        assert!(changes_b.try_recv().is_err());

        let _ = fs::remove_file(path);
    }

    #[test]
    fn corrupt_content_opens_empty() {
        let path = temp_store_path("corrupt");
        fs::write(&path, "not json at all").unwrap();

        let store = KvStore::open(path.clone()).unwrap();
        assert_eq!(store.get("anything"), None);

        let _ = fs::remove_file(path);
    }
}

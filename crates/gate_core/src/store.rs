use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::error::GateError;
use crate::settings::{RawSettings, Settings, SettingsChange, SettingsPatch};

const CHANGE_CHANNEL_CAPACITY: usize = 32;

/// External key-value settings store.
///
/// `get` overlays stored values on the supplied defaults. `set` merges a
/// partial patch and notifies subscribers with the keys whose values changed.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get(&self, defaults: RawSettings) -> Result<RawSettings, GateError>;

    async fn set(&self, patch: SettingsPatch) -> Result<(), GateError>;

    fn subscribe(&self) -> broadcast::Receiver<SettingsChange>;
}

fn overlay(mut defaults: RawSettings, stored: &RawSettings) -> RawSettings {
    for (key, value) in stored {
        defaults.insert(key.clone(), value.clone());
    }
    defaults
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Process-local store. Used by tests and embedders that persist elsewhere.
pub struct MemorySettingsStore {
    values: Mutex<RawSettings>,
    changes: broadcast::Sender<SettingsChange>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::with_values(RawSettings::new())
    }

    pub fn with_values(values: RawSettings) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            values: Mutex::new(values),
            changes,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::with_values(settings.to_raw())
    }

    /// Copy of the stored values without defaults applied.
    pub fn raw(&self) -> RawSettings {
        self.values.lock().clone()
    }
}

impl Default for MemorySettingsStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn get(&self, defaults: RawSettings) -> Result<RawSettings, GateError> {
        let stored = self.values.lock().clone();
        Ok(overlay(defaults, &stored))
    }

    async fn set(&self, patch: SettingsPatch) -> Result<(), GateError> {
        let change = {
            let mut values = self.values.lock();
            let before = values.clone();
            for (key, value) in patch.0 {
                values.insert(key, value);
            }
            SettingsChange::between(&before, &values)
        };
        if !change.is_empty() {
            // No receivers is fine.
            let _ = self.changes.send(change);
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<SettingsChange> {
        self.changes.subscribe()
    }
}

// ---------------------------------------------------------------------------
// File-backed store
// ---------------------------------------------------------------------------

/// JSON file store with an optional watcher for external edits.
pub struct FileSettingsStore {
    path: PathBuf,
    snapshot: Arc<RwLock<RawSettings>>,
    changes: broadcast::Sender<SettingsChange>,
    _watcher: Option<RecommendedWatcher>,
}

impl FileSettingsStore {
    /// Opens the store at `path`. A missing file reads as empty.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, GateError> {
        let path = path.into();
        let snapshot = read_raw(&path)?;
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Ok(Self {
            path,
            snapshot: Arc::new(RwLock::new(snapshot)),
            changes,
            _watcher: None,
        })
    }

    /// Opens `~/.promptgate/settings.json`.
    pub fn open_default() -> Result<Self, GateError> {
        let path = Settings::settings_path().map_err(|e| GateError::Config(e.to_string()))?;
        Self::open(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Starts watching the settings file so external edits reach subscribers.
    pub fn watch(mut self) -> Result<Self, GateError> {
        let watch_dir = self
            .path
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| GateError::Config("settings path has no parent".into()))?;
        std::fs::create_dir_all(&watch_dir)?;

        let path = self.path.clone();
        let file_name = path.file_name().map(|n| n.to_os_string());
        let snapshot = Arc::clone(&self.snapshot);
        let changes = self.changes.clone();

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, _>| {
            let Ok(event) = res else { return };
            let touched = event
                .paths
                .iter()
                .any(|p| file_name.as_deref().is_some_and(|n| p.file_name() == Some(n)));
            if !touched {
                return;
            }
            match read_raw(&path) {
                Ok(after) => {
                    let change = {
                        let mut current = snapshot.write();
                        let change = SettingsChange::between(&current, &after);
                        *current = after;
                        change
                    };
                    if !change.is_empty() {
                        info!("Settings reloaded ({} keys changed)", change.keys.len());
                        let _ = changes.send(change);
                    }
                }
                Err(e) => warn!("Failed to reload settings: {e}"),
            }
        })?;

        watcher.watch(&watch_dir, RecursiveMode::NonRecursive)?;
        self._watcher = Some(watcher);
        Ok(self)
    }
}

#[async_trait]
impl SettingsStore for FileSettingsStore {
    async fn get(&self, defaults: RawSettings) -> Result<RawSettings, GateError> {
        let stored = read_raw(&self.path)?;
        *self.snapshot.write() = stored.clone();
        Ok(overlay(defaults, &stored))
    }

    async fn set(&self, patch: SettingsPatch) -> Result<(), GateError> {
        let before = read_raw(&self.path)?;
        let mut after = before.clone();
        for (key, value) in patch.0 {
            after.insert(key, value);
        }

        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let content = serde_json::to_string_pretty(&after)?;
        std::fs::write(&self.path, content)?;
        debug!("Wrote settings to {}", self.path.display());

        let change = SettingsChange::between(&before, &after);
        *self.snapshot.write() = after;
        if !change.is_empty() {
            let _ = self.changes.send(change);
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<SettingsChange> {
        self.changes.subscribe()
    }
}

fn read_raw(path: &Path) -> Result<RawSettings, GateError> {
    if !path.exists() {
        return Ok(RawSettings::new());
    }
    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(RawSettings::new());
    }
    match serde_json::from_str::<serde_json::Value>(&content)? {
        serde_json::Value::Object(map) => Ok(map),
        _ => Err(GateError::Config(format!(
            "{} must contain a JSON object",
            path.display()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{KEY_MODE, PolicyMode};
    use serde_json::json;

    #[tokio::test]
    async fn memory_get_overlays_defaults() {
        let store = MemorySettingsStore::new();
        store
            .set(SettingsPatch::default().mode(PolicyMode::Warn))
            .await
            .unwrap();
        let raw = store.get(Settings::defaults_raw()).await.unwrap();
        let settings = Settings::from_raw(&raw);
        assert_eq!(settings.mode, PolicyMode::Warn);
        assert!(settings.enabled);
    }

    #[tokio::test]
    async fn memory_set_notifies_changed_keys_only() {
        let store = MemorySettingsStore::from_settings(&Settings::default());
        let mut rx = store.subscribe();
        store
            .set(SettingsPatch::default().enabled(true).mode(PolicyMode::Warn))
            .await
            .unwrap();
        let change = rx.recv().await.unwrap();
        assert_eq!(change.keys, vec![KEY_MODE.to_string()]);
    }

    #[tokio::test]
    async fn memory_noop_set_is_silent() {
        let store = MemorySettingsStore::from_settings(&Settings::default());
        let mut rx = store.subscribe();
        store.set(SettingsPatch::default().enabled(true)).await.unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn file_store_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("settings.json");
        let store = FileSettingsStore::open(&path).unwrap();

        let raw = store.get(Settings::defaults_raw()).await.unwrap();
        assert_eq!(Settings::from_raw(&raw), Settings::default());

        let mut rx = store.subscribe();
        store
            .set(SettingsPatch::default().trusted_hosts(&["example.com".into()]))
            .await
            .unwrap();
        assert_eq!(rx.recv().await.unwrap().keys, vec!["trustedHosts".to_string()]);

        let reopened = FileSettingsStore::open(&path).unwrap();
        let raw = reopened.get(Settings::defaults_raw()).await.unwrap();
        assert_eq!(Settings::from_raw(&raw).trusted_hosts, vec!["example.com"]);
    }

    #[tokio::test]
    async fn file_store_rejects_non_object() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("settings.json");
        std::fs::write(&path, "[1, 2]").unwrap();
        assert!(matches!(
            FileSettingsStore::open(&path),
            Err(GateError::Config(_))
        ));
    }

    #[tokio::test]
    async fn watched_file_reports_external_edits() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("settings.json");
        let store = FileSettingsStore::open(&path).unwrap().watch().unwrap();
        let mut rx = store.subscribe();

        std::fs::write(&path, json!({"mode": "warn"}).to_string()).unwrap();

        let change = tokio::time::timeout(std::time::Duration::from_secs(5), rx.recv())
            .await
            .expect("no change notification from the watcher")
            .unwrap();
        assert_eq!(change.keys, vec![KEY_MODE.to_string()]);

        let raw = store.get(Settings::defaults_raw()).await.unwrap();
        assert_eq!(Settings::from_raw(&raw).mode, PolicyMode::Warn);
    }

    #[tokio::test]
    async fn file_store_reads_external_values() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("settings.json");
        std::fs::write(&path, json!({"enabled": false}).to_string()).unwrap();
        let store = FileSettingsStore::open(&path).unwrap();
        let raw = store.get(Settings::defaults_raw()).await.unwrap();
        assert!(!Settings::from_raw(&raw).enabled);
    }
}

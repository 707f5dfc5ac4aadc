use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::GateError;
use crate::settings::Settings;
use crate::store::SettingsStore;

/// Process-wide settings snapshot injected into the gate.
///
/// Readers get an `Arc<Settings>` that is replaced whole on refresh, so a
/// decision never sees half of an update.
#[derive(Clone)]
pub struct SettingsCache {
    current: Arc<RwLock<Arc<Settings>>>,
}

impl SettingsCache {
    pub fn new(settings: Settings) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(settings))),
        }
    }

    /// First load from the store.
    pub async fn load(store: &dyn SettingsStore) -> Result<Self, GateError> {
        let raw = store.get(Settings::defaults_raw()).await?;
        Ok(Self::new(Settings::from_raw(&raw)))
    }

    /// Re-read the store. On failure the previous snapshot stays in place.
    pub async fn refresh(&self, store: &dyn SettingsStore) -> Result<(), GateError> {
        match store.get(Settings::defaults_raw()).await {
            Ok(raw) => {
                self.replace(Settings::from_raw(&raw));
                debug!("Settings cache refreshed");
                Ok(())
            }
            Err(e) => {
                warn!("Settings refresh failed, keeping previous values: {e}");
                Err(e)
            }
        }
    }

    pub fn snapshot(&self) -> Arc<Settings> {
        Arc::clone(&self.current.read())
    }

    pub fn replace(&self, settings: Settings) {
        *self.current.write() = Arc::new(settings);
    }

    /// Refreshes the cache whenever the store reports a change to a gate
    /// key. A lagged receiver refreshes once; a closed channel ends the task.
    pub fn spawn_refresh(&self, store: Arc<dyn SettingsStore>) -> JoinHandle<()> {
        let cache = self.clone();
        let mut changes = store.subscribe();
        tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(change) if change.touches_settings() => {
                        let _ = cache.refresh(store.as_ref()).await;
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        debug!("Missed {skipped} settings notifications");
                        let _ = cache.refresh(store.as_ref()).await;
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}

impl Default for SettingsCache {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

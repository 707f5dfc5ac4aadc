use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use gate_core::{Settings, SettingsCache, SettingsPatch, SettingsStore, normalize_host};
use gate_shield::{DetectionLevel, DetectionResult, detect_sensitive_info};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info};
use url::Url;

use crate::cli::{SettingsCommand, TrustCommand};

async fn load_settings(store: &dyn SettingsStore) -> Result<Settings> {
    let raw = store
        .get(Settings::defaults_raw())
        .await
        .context("Failed to read settings")?;
    Ok(Settings::from_raw(&raw))
}

async fn resolve_level(store: &dyn SettingsStore, level: Option<DetectionLevel>) -> Result<DetectionLevel> {
    match level {
        Some(level) => Ok(level),
        None => Ok(load_settings(store).await?.detection_level),
    }
}

pub async fn scan(
    store: &dyn SettingsStore,
    text: &str,
    level: Option<DetectionLevel>,
) -> Result<DetectionResult> {
    let level = resolve_level(store, level).await?;
    let result = detect_sensitive_info(text, level);
    info!(
        findings = result.findings.len(),
        score = result.meta.total_score,
        sensitive = result.is_sensitive,
        "Scanned text"
    );
    Ok(result)
}

pub async fn settings(store: &dyn SettingsStore, command: Option<SettingsCommand>) -> Result<String> {
    match command.unwrap_or(SettingsCommand::Show) {
        SettingsCommand::Show => {
            let settings = load_settings(store).await?;
            Ok(serde_json::to_string_pretty(&settings)?)
        }
        SettingsCommand::Set {
            enabled,
            mode,
            level,
        } => {
            let mut patch = SettingsPatch::default();
            if let Some(enabled) = enabled {
                patch = patch.enabled(enabled);
            }
            if let Some(mode) = mode {
                patch = patch.mode(mode.into());
            }
            if let Some(level) = level {
                patch = patch.detection_level(level.into());
            }
            if patch.is_empty() {
                return Ok("Nothing to update.".into());
            }
            store.set(patch).await.context("Failed to save settings")?;
            Ok("Settings updated.".into())
        }
    }
}

/// Host of a URL, or the argument itself as a hostname.
pub fn site_host(site: &str) -> String {
    let site = site.trim();
    if !site.contains("://") {
        return normalize_host(site);
    }
    Url::parse(site)
        .ok()
        .and_then(|url| url.host_str().map(normalize_host))
        .unwrap_or_default()
}

pub async fn trust(store: &dyn SettingsStore, command: TrustCommand) -> Result<String> {
    let settings = load_settings(store).await?;
    match command {
        TrustCommand::List => {
            if settings.trusted_hosts.is_empty() {
                return Ok("No trusted sites".into());
            }
            Ok(settings.trusted_hosts.join("\n"))
        }
        TrustCommand::Add { site } => {
            let host = site_host(&site);
            if host.is_empty() {
                return Ok("Unable to detect site.".into());
            }
            if settings.trusted_hosts.contains(&host) {
                return Ok(format!("{host} is already trusted."));
            }
            let mut hosts = settings.trusted_hosts;
            hosts.push(host.clone());
            store
                .set(SettingsPatch::default().trusted_hosts(&hosts))
                .await
                .context("Failed to save trusted sites")?;
            Ok(format!("Added {host} to trusted sites."))
        }
        TrustCommand::Remove { host } => {
            let host = normalize_host(&host);
            let hosts: Vec<String> = settings
                .trusted_hosts
                .iter()
                .filter(|h| **h != host)
                .cloned()
                .collect();
            if hosts.len() == settings.trusted_hosts.len() {
                return Ok(format!("{host} is not trusted."));
            }
            store
                .set(SettingsPatch::default().trusted_hosts(&hosts))
                .await
                .context("Failed to save trusted sites")?;
            Ok(format!("Removed {host} from trusted sites."))
        }
    }
}

/// Emits the effective settings once, then again after every change the
/// store reports, until `shutdown` resolves or the store goes away.
pub async fn watch_settings(
    store: Arc<dyn SettingsStore>,
    shutdown: impl Future<Output = ()>,
    mut emit: impl FnMut(String),
) -> Result<()> {
    let mut changes = store.subscribe();
    let cache = SettingsCache::load(store.as_ref())
        .await
        .context("Failed to read settings")?;
    emit(serde_json::to_string_pretty(&*cache.snapshot())?);

    tokio::pin!(shutdown);
    loop {
        let refresh = tokio::select! {
            _ = &mut shutdown => break,
            change = changes.recv() => match change {
                Ok(change) => change.touches_settings(),
                Err(RecvError::Lagged(skipped)) => {
                    debug!("Missed {skipped} settings notifications");
                    true
                }
                Err(RecvError::Closed) => break,
            },
        };
        if refresh && cache.refresh(store.as_ref()).await.is_ok() {
            emit(serde_json::to_string_pretty(&*cache.snapshot())?);
        }
    }
    Ok(())
}

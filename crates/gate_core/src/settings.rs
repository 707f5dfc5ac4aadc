use anyhow::{Context, Result};
use gate_shield::DetectionLevel;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::path::PathBuf;

pub const KEY_ENABLED: &str = "enabled";
pub const KEY_MODE: &str = "mode";
pub const KEY_DETECTION_LEVEL: &str = "detectionLevel";
pub const KEY_TRUSTED_HOSTS: &str = "trustedHosts";

/// Keys the gate reacts to when the store reports a change.
pub const SETTINGS_KEYS: [&str; 4] = [KEY_ENABLED, KEY_MODE, KEY_DETECTION_LEVEL, KEY_TRUSTED_HOSTS];

/// Raw key-value shape of the settings store.
pub type RawSettings = Map<String, Value>;

// ---------------------------------------------------------------------------
// Policy mode
// ---------------------------------------------------------------------------

/// What happens when a prompt is judged sensitive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyMode {
    /// Stop the submission and open the decision surface.
    #[default]
    Block,
    /// Ask for a synchronous accept/decline confirmation.
    Warn,
}

impl PolicyMode {
    /// Only the exact string `warn` selects warn mode.
    pub fn normalize(value: Option<&str>) -> Self {
        match value {
            Some("warn") => Self::Warn,
            _ => Self::Block,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Block => "block",
            Self::Warn => "warn",
        }
    }
}

impl std::fmt::Display for PolicyMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Gate settings, read from the external store and coerced to safe values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub enabled: bool,
    pub mode: PolicyMode,
    pub detection_level: DetectionLevel,
    /// Normalized hostnames, in insertion order.
    pub trusted_hosts: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: PolicyMode::Block,
            detection_level: DetectionLevel::Balanced,
            trusted_hosts: Vec::new(),
        }
    }
}

impl Settings {
    /// Returns the base directory: `~/.promptgate/`
    pub fn base_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".promptgate"))
    }

    /// Returns the settings file path: `~/.promptgate/settings.json`
    pub fn settings_path() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("settings.json"))
    }

    /// Returns the logs directory: `~/.promptgate/logs/`
    pub fn logs_dir() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("logs"))
    }

    /// Defaults in the store's raw shape, passed to `SettingsStore::get`.
    pub fn defaults_raw() -> RawSettings {
        Self::default().to_raw()
    }

    pub fn to_raw(&self) -> RawSettings {
        let mut raw = Map::new();
        raw.insert(KEY_ENABLED.into(), json!(self.enabled));
        raw.insert(KEY_MODE.into(), json!(self.mode.as_str()));
        raw.insert(KEY_DETECTION_LEVEL.into(), json!(self.detection_level.as_str()));
        raw.insert(KEY_TRUSTED_HOSTS.into(), json!(self.trusted_hosts));
        raw
    }

    /// Coerce raw store values. Wrong shapes never fail: `enabled` follows
    /// JSON truthiness, unknown modes are `block`, unknown levels are
    /// `balanced`, and a non-array host list is empty.
    pub fn from_raw(raw: &RawSettings) -> Self {
        let enabled = raw.get(KEY_ENABLED).is_some_and(is_truthy);
        let mode = PolicyMode::normalize(raw.get(KEY_MODE).and_then(Value::as_str));
        let detection_level =
            DetectionLevel::normalize(raw.get(KEY_DETECTION_LEVEL).and_then(Value::as_str));
        let trusted_hosts = match raw.get(KEY_TRUSTED_HOSTS) {
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| normalize_host(&stringify(item)))
                .filter(|host| !host.is_empty())
                .collect(),
            _ => Vec::new(),
        };

        Self {
            enabled,
            mode,
            detection_level,
            trusted_hosts,
        }
    }

    /// Exact or subdomain match against the trusted set.
    pub fn is_trusted_host(&self, hostname: &str) -> bool {
        is_trusted_host(hostname, &self.trusted_hosts)
    }
}

// ---------------------------------------------------------------------------
// Host helpers
// ---------------------------------------------------------------------------

/// Trimmed, lower-cased hostname.
pub fn normalize_host(host: &str) -> String {
    host.trim().to_lowercase()
}

/// `sub.example.com` is trusted when `example.com` is; `notexample.com` is not.
pub fn is_trusted_host(hostname: &str, trusted: &[String]) -> bool {
    let host = normalize_host(hostname);
    trusted.iter().any(|entry| {
        let entry = normalize_host(entry);
        host == entry || host.ends_with(&format!(".{entry}"))
    })
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Patches and change notifications
// ---------------------------------------------------------------------------

/// Partial update written through `SettingsStore::set`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsPatch(pub RawSettings);

impl SettingsPatch {
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.0.insert(KEY_ENABLED.into(), json!(enabled));
        self
    }

    pub fn mode(mut self, mode: PolicyMode) -> Self {
        self.0.insert(KEY_MODE.into(), json!(mode.as_str()));
        self
    }

    pub fn detection_level(mut self, level: DetectionLevel) -> Self {
        self.0.insert(KEY_DETECTION_LEVEL.into(), json!(level.as_str()));
        self
    }

    pub fn trusted_hosts(mut self, hosts: &[String]) -> Self {
        self.0.insert(KEY_TRUSTED_HOSTS.into(), json!(hosts));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Keys whose stored values changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsChange {
    pub keys: Vec<String>,
}

impl SettingsChange {
    /// Keys present in `after` whose values differ from `before`, plus keys
    /// removed from `before`.
    pub fn between(before: &RawSettings, after: &RawSettings) -> Self {
        let mut keys: Vec<String> = after
            .iter()
            .filter(|(k, v)| before.get(*k) != Some(*v))
            .map(|(k, _)| k.clone())
            .collect();
        keys.extend(before.keys().filter(|k| !after.contains_key(*k)).cloned());
        Self { keys }
    }

    /// Whether any gate-relevant key changed.
    pub fn touches_settings(&self) -> bool {
        self.keys.iter().any(|k| SETTINGS_KEYS.contains(&k.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

pub mod cache;
pub mod error;
pub mod logging;
pub mod settings;
pub mod store;

pub use cache::SettingsCache;
pub use error::{ErrorCategory, GateError};
pub use settings::{
    PolicyMode, RawSettings, Settings, SettingsChange, SettingsPatch, is_trusted_host,
    normalize_host,
};
pub use store::{FileSettingsStore, MemorySettingsStore, SettingsStore};

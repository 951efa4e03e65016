// Settings service module
// Interaction settings persisted as TOML in the user's config directory

mod service;

pub use service::{SettingsService, SETTINGS_FILE_NAME};

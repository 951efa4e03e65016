use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;

use crate::models::settings::InteractionSettings;

pub const SETTINGS_FILE_NAME: &str = "interaction.toml";

/// Reads and writes [`InteractionSettings`] as a TOML file.
#[derive(Debug, Clone)]
pub struct SettingsService {
    path: PathBuf,
}

impl SettingsService {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `interaction.toml` in the platform config directory, if the platform
    /// has one.
    pub fn default_location() -> Option<Self> {
        ProjectDirs::from("com", "RustPlanner", "Planner")
            .map(|dirs| Self::new(dirs.config_dir().join(SETTINGS_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load and validate the settings file. Keys missing from the file take
    /// their default values.
    pub fn load(&self) -> Result<InteractionSettings> {
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read settings from {}", self.path.display()))?;
        let settings: InteractionSettings = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse settings in {}", self.path.display()))?;
        settings
            .validate()
            .map_err(|e| anyhow!("Invalid settings: {}", e))?;
        Ok(settings)
    }

    pub fn save(&self, settings: &InteractionSettings) -> Result<()> {
        settings
            .validate()
            .map_err(|e| anyhow!("Invalid settings: {}", e))?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create settings directory {}", parent.display())
            })?;
        }

        let contents =
            toml::to_string_pretty(settings).context("Failed to serialize settings")?;
        fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))?;
        Ok(())
    }

    /// Settings from disk, or the defaults if the file is missing or bad.
    pub fn load_or_default(&self) -> InteractionSettings {
        if !self.exists() {
            log::info!(
                "No settings file at {}, using defaults",
                self.path.display()
            );
            return InteractionSettings::default();
        }

        match self.load() {
            Ok(settings) => {
                log::info!("Loaded interaction settings from {}", self.path.display());
                settings
            }
            Err(e) => {
                log::warn!("Failed to load settings: {:#}, using defaults", e);
                InteractionSettings::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn service_in(dir: &tempfile::TempDir) -> SettingsService {
        SettingsService::new(dir.path().join("nested").join(SETTINGS_FILE_NAME))
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_in(&dir);

        assert!(!service.exists());
        assert!(service.load().is_err());
        assert_eq!(service.load_or_default(), InteractionSettings::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_in(&dir);

        let settings = InteractionSettings {
            snap_minutes: 30,
            timezone: "Europe/Berlin".to_string(),
            ..InteractionSettings::default()
        };
        service.save(&settings).unwrap();

        assert!(service.exists());
        assert_eq!(service.load().unwrap(), settings);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let service = SettingsService::new(dir.path().join(SETTINGS_FILE_NAME));
        fs::write(service.path(), "drag_threshold_px = 8.0\n").unwrap();

        let settings = service.load().unwrap();
        assert_eq!(settings.drag_threshold_px, 8.0);
        assert_eq!(settings.snap_minutes, 15);
    }

    #[test]
    fn test_invalid_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let service = SettingsService::new(dir.path().join(SETTINGS_FILE_NAME));
        fs::write(service.path(), "snap_minutes = 7\n").unwrap();

        assert!(service.load().is_err());
        assert_eq!(service.load_or_default().snap_minutes, 15);
    }

    #[test]
    fn test_garbage_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let service = SettingsService::new(dir.path().join(SETTINGS_FILE_NAME));
        fs::write(service.path(), "this is = = not toml").unwrap();

        assert_eq!(service.load_or_default(), InteractionSettings::default());
    }

    #[test]
    fn test_save_rejects_invalid_settings() {
        let dir = tempfile::tempdir().unwrap();
        let service = service_in(&dir);
        let settings = InteractionSettings {
            timezone: "Mars/Olympus".to_string(),
            ..InteractionSettings::default()
        };

        assert!(service.save(&settings).is_err());
        assert!(!service.exists());
    }
}

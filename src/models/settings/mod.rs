// Settings module
// Tunable constants for the drag/resize engine and the reference grid

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionSettings {
    /// Pointer travel (px, per axis) before a press becomes a drag
    pub drag_threshold_px: f32,
    /// Hold time before a touch press starts a gesture
    pub long_press_delay_ms: u64,
    /// Touch movement tolerated while waiting for the long-press
    pub touch_jitter_px: f32,
    pub snap_minutes: u32,
    pub min_duration_minutes: i64,
    /// Pixel height of one hour in the reference grid
    pub hour_height_px: f32,
    /// How long a finished gesture keeps suppressing clicks on its event
    pub completion_cooldown_ms: u64,
    pub snap_back_duration_ms: u64,
    /// Upper bound on waiting for the commit collaborator
    pub commit_timeout_ms: u64,
    /// IANA zone used to turn grid wall-clock times into instants
    pub timezone: String,
}

impl Default for InteractionSettings {
    fn default() -> Self {
        Self {
            drag_threshold_px: 5.0,
            long_press_delay_ms: 500,
            touch_jitter_px: 10.0,
            snap_minutes: 15,
            min_duration_minutes: 15,
            hour_height_px: 60.0,
            completion_cooldown_ms: 300,
            snap_back_duration_ms: 250,
            commit_timeout_ms: 10_000,
            timezone: "UTC".to_string(),
        }
    }
}

impl InteractionSettings {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.drag_threshold_px.is_finite() && self.drag_threshold_px > 0.0) {
            return Err("Drag threshold must be a positive number of pixels".to_string());
        }

        if !(self.touch_jitter_px.is_finite() && self.touch_jitter_px >= 0.0) {
            return Err("Touch jitter tolerance cannot be negative".to_string());
        }

        if self.snap_minutes == 0 || 60 % self.snap_minutes != 0 {
            return Err("Snap interval must divide an hour evenly".to_string());
        }

        if self.min_duration_minutes <= 0 {
            return Err("Minimum duration must be positive".to_string());
        }

        if !(self.hour_height_px.is_finite() && self.hour_height_px > 0.0) {
            return Err("Hour height must be a positive number of pixels".to_string());
        }

        if self.commit_timeout_ms == 0 {
            return Err("Commit timeout must be positive".to_string());
        }

        if chrono_tz::Tz::from_str(&self.timezone).is_err() {
            return Err(format!("Unknown timezone '{}'", self.timezone));
        }

        Ok(())
    }

    pub fn long_press_delay(&self) -> Duration {
        Duration::from_millis(self.long_press_delay_ms)
    }

    pub fn completion_cooldown(&self) -> Duration {
        Duration::from_millis(self.completion_cooldown_ms)
    }

    pub fn snap_back_duration(&self) -> Duration {
        Duration::from_millis(self.snap_back_duration_ms)
    }

    pub fn commit_timeout(&self) -> Duration {
        Duration::from_millis(self.commit_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = InteractionSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.drag_threshold_px, 5.0);
        assert_eq!(settings.long_press_delay(), Duration::from_millis(500));
        assert_eq!(settings.snap_minutes, 15);
        assert_eq!(settings.min_duration_minutes, 15);
    }

    #[test]
    fn test_snap_must_divide_hour() {
        let settings = InteractionSettings {
            snap_minutes: 7,
            ..Default::default()
        };
        assert!(settings.validate().unwrap_err().contains("divide an hour"));
    }

    #[test]
    fn test_unknown_timezone_rejected() {
        let settings = InteractionSettings {
            timezone: "Mars/Olympus_Mons".to_string(),
            ..Default::default()
        };
        assert!(settings.validate().unwrap_err().contains("Unknown timezone"));
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let settings: InteractionSettings =
            toml::from_str("snap_minutes = 30\ntimezone = \"Europe/Berlin\"\n").unwrap();
        assert_eq!(settings.snap_minutes, 30);
        assert_eq!(settings.timezone, "Europe/Berlin");
        assert_eq!(settings.long_press_delay_ms, 500);
        assert!(settings.validate().is_ok());
    }
}

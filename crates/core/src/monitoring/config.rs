use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::camera::domain::camera_source::CameraIndex;
use crate::monitoring::settings::MonitorSettings;
use crate::shared::config_error::ConfigError;
use crate::shared::constants::{
    ALARM_SIGNAL_THRESHOLD, DEFAULT_AUTO_ALARM_THRESHOLD, DEFAULT_CONFIDENCE_THRESHOLD,
    DISPLAY_CHANNEL_CAPACITY, EVIDENCE_DIR_NAME, FRAME_HEIGHT, FRAME_WIDTH,
};

const DEFAULT_FRAME_INTERVAL_MS: u64 = 33;

/// Persistent monitor configuration. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub camera: CameraIndex,
    pub frame_width: u32,
    pub frame_height: u32,
    pub frame_interval_ms: u64,
    pub tracking_enabled: bool,
    pub recognition_enabled: bool,
    pub alarms_enabled: bool,
    pub debug_mode: bool,
    pub confidence_threshold: f64,
    pub auto_alarm_threshold: f64,
    pub equalize_histogram: bool,
    pub bell_enabled: bool,
    pub push_enabled: bool,
    pub alarm_signal_threshold: usize,
    pub display_capacity: usize,
    pub evidence_dir: PathBuf,
    pub identity_store: Option<PathBuf>,
    pub push_config: Option<PathBuf>,
    /// Font for name tags; tags are painted without text when unset.
    pub label_font: Option<PathBuf>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        let settings = MonitorSettings::default();
        Self {
            camera: CameraIndex::Local,
            frame_width: FRAME_WIDTH,
            frame_height: FRAME_HEIGHT,
            frame_interval_ms: DEFAULT_FRAME_INTERVAL_MS,
            tracking_enabled: settings.tracking_enabled,
            recognition_enabled: settings.recognition_enabled,
            alarms_enabled: settings.alarms_enabled,
            debug_mode: settings.debug_mode,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            auto_alarm_threshold: DEFAULT_AUTO_ALARM_THRESHOLD,
            equalize_histogram: settings.equalize_histogram,
            bell_enabled: settings.bell_enabled,
            push_enabled: settings.push_enabled,
            alarm_signal_threshold: ALARM_SIGNAL_THRESHOLD,
            display_capacity: DISPLAY_CHANNEL_CAPACITY,
            evidence_dir: PathBuf::from(EVIDENCE_DIR_NAME),
            identity_store: None,
            push_config: None,
            label_font: None,
        }
    }
}

impl MonitorConfig {
    /// `<config dir>/facewatch/config.json`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("facewatch").join("config.json"))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self = serde_json::from_str(&json).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` when given (it must exist), otherwise the default location,
    /// falling back to built-in defaults when no file is there.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => {
                log::info!("Loading config from {}", path.display());
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        fs::write(path, json).map_err(|e| ConfigError::Write {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frame_width == 0 || self.frame_height == 0 {
            return Err(ConfigError::Invalid(format!(
                "frame size must be non-zero, got {}x{}",
                self.frame_width, self.frame_height
            )));
        }
        if self.display_capacity == 0 {
            return Err(ConfigError::Invalid(
                "display capacity must be at least 1".into(),
            ));
        }
        for (name, value) in [
            ("confidence_threshold", self.confidence_threshold),
            ("auto_alarm_threshold", self.auto_alarm_threshold),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a finite, non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Initial toggles. Rule violations are repaired by
    /// [`SettingsHandle::new`](crate::monitoring::settings::SettingsHandle::new).
    pub fn to_settings(&self) -> MonitorSettings {
        MonitorSettings {
            tracking_enabled: self.tracking_enabled,
            recognition_enabled: self.recognition_enabled,
            alarms_enabled: self.alarms_enabled,
            debug_mode: self.debug_mode,
            confidence_threshold: self.confidence_threshold,
            auto_alarm_threshold: self.auto_alarm_threshold,
            equalize_histogram: self.equalize_histogram,
            bell_enabled: self.bell_enabled,
            push_enabled: self.push_enabled,
        }
    }
}

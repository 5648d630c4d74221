use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use thiserror::Error;

use crate::shared::constants::{DEFAULT_AUTO_ALARM_THRESHOLD, DEFAULT_CONFIDENCE_THRESHOLD};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SettingsError {
    #[error("recognition requires tracking to be enabled")]
    RecognitionRequiresTracking,
    #[error("tracking cannot be disabled while recognition is enabled")]
    TrackingRequiredByRecognition,
    #[error("thresholds can only be changed in debug mode")]
    DebugModeRequired,
    #[error("threshold must be a finite, non-negative number, got {0}")]
    InvalidThreshold(f64),
    #[error("at least one alarm channel must stay enabled")]
    NoAlarmChannel,
}

/// Point-in-time copy of the operator toggles, taken once per frame cycle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MonitorSettings {
    pub tracking_enabled: bool,
    pub recognition_enabled: bool,
    pub alarms_enabled: bool,
    pub debug_mode: bool,
    pub confidence_threshold: f64,
    pub auto_alarm_threshold: f64,
    pub equalize_histogram: bool,
    pub bell_enabled: bool,
    pub push_enabled: bool,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            tracking_enabled: true,
            recognition_enabled: false,
            alarms_enabled: true,
            debug_mode: false,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            auto_alarm_threshold: DEFAULT_AUTO_ALARM_THRESHOLD,
            equalize_histogram: false,
            bell_enabled: true,
            push_enabled: false,
        }
    }
}

struct SharedSettings {
    tracking_enabled: AtomicBool,
    recognition_enabled: AtomicBool,
    alarms_enabled: AtomicBool,
    debug_mode: AtomicBool,
    confidence_threshold: AtomicU64,
    auto_alarm_threshold: AtomicU64,
    equalize_histogram: AtomicBool,
    bell_enabled: AtomicBool,
    push_enabled: AtomicBool,
}

/// Thread-safe holder for the operator toggles.
///
/// Written by the control surface, read by the workers through
/// [`SettingsHandle::snapshot`]. Individual fields are atomic; a snapshot may
/// mix values from two consecutive writes, which at worst delays a change by
/// one frame cycle. Setters enforce the cross-field rules and leave the state
/// unchanged when they reject a change.
#[derive(Clone)]
pub struct SettingsHandle {
    inner: Arc<SharedSettings>,
}

impl SettingsHandle {
    /// Builds a handle from `initial`, repairing rule violations instead of
    /// rejecting them: recognition is dropped without tracking, and the bell is
    /// turned on when no alarm channel is enabled.
    pub fn new(initial: MonitorSettings) -> Self {
        let recognition = initial.recognition_enabled && initial.tracking_enabled;
        let bell = initial.bell_enabled || !initial.push_enabled;
        Self {
            inner: Arc::new(SharedSettings {
                tracking_enabled: AtomicBool::new(initial.tracking_enabled),
                recognition_enabled: AtomicBool::new(recognition),
                alarms_enabled: AtomicBool::new(initial.alarms_enabled),
                debug_mode: AtomicBool::new(initial.debug_mode),
                confidence_threshold: AtomicU64::new(initial.confidence_threshold.to_bits()),
                auto_alarm_threshold: AtomicU64::new(initial.auto_alarm_threshold.to_bits()),
                equalize_histogram: AtomicBool::new(initial.equalize_histogram),
                bell_enabled: AtomicBool::new(bell),
                push_enabled: AtomicBool::new(initial.push_enabled),
            }),
        }
    }

    pub fn snapshot(&self) -> MonitorSettings {
        let s = &self.inner;
        MonitorSettings {
            tracking_enabled: s.tracking_enabled.load(Ordering::Acquire),
            recognition_enabled: s.recognition_enabled.load(Ordering::Acquire),
            alarms_enabled: s.alarms_enabled.load(Ordering::Acquire),
            debug_mode: s.debug_mode.load(Ordering::Acquire),
            confidence_threshold: f64::from_bits(s.confidence_threshold.load(Ordering::Acquire)),
            auto_alarm_threshold: f64::from_bits(s.auto_alarm_threshold.load(Ordering::Acquire)),
            equalize_histogram: s.equalize_histogram.load(Ordering::Acquire),
            bell_enabled: s.bell_enabled.load(Ordering::Acquire),
            push_enabled: s.push_enabled.load(Ordering::Acquire),
        }
    }

    pub fn set_tracking(&self, enabled: bool) -> Result<(), SettingsError> {
        if !enabled && self.inner.recognition_enabled.load(Ordering::Acquire) {
            return Err(SettingsError::TrackingRequiredByRecognition);
        }
        self.inner.tracking_enabled.store(enabled, Ordering::Release);
        Ok(())
    }

    pub fn set_recognition(&self, enabled: bool) -> Result<(), SettingsError> {
        if enabled && !self.inner.tracking_enabled.load(Ordering::Acquire) {
            return Err(SettingsError::RecognitionRequiresTracking);
        }
        self.inner.recognition_enabled.store(enabled, Ordering::Release);
        Ok(())
    }

    pub fn set_alarms(&self, enabled: bool) {
        self.inner.alarms_enabled.store(enabled, Ordering::Release);
    }

    pub fn set_debug_mode(&self, enabled: bool) {
        self.inner.debug_mode.store(enabled, Ordering::Release);
    }

    pub fn set_equalize_histogram(&self, enabled: bool) {
        self.inner.equalize_histogram.store(enabled, Ordering::Release);
    }

    pub fn set_confidence_threshold(&self, value: f64) -> Result<(), SettingsError> {
        self.check_threshold(value)?;
        self.inner
            .confidence_threshold
            .store(value.to_bits(), Ordering::Release);
        Ok(())
    }

    pub fn set_auto_alarm_threshold(&self, value: f64) -> Result<(), SettingsError> {
        self.check_threshold(value)?;
        self.inner
            .auto_alarm_threshold
            .store(value.to_bits(), Ordering::Release);
        Ok(())
    }

    pub fn set_bell(&self, enabled: bool) -> Result<(), SettingsError> {
        if !enabled && !self.inner.push_enabled.load(Ordering::Acquire) {
            return Err(SettingsError::NoAlarmChannel);
        }
        self.inner.bell_enabled.store(enabled, Ordering::Release);
        Ok(())
    }

    pub fn set_push(&self, enabled: bool) -> Result<(), SettingsError> {
        if !enabled && !self.inner.bell_enabled.load(Ordering::Acquire) {
            return Err(SettingsError::NoAlarmChannel);
        }
        self.inner.push_enabled.store(enabled, Ordering::Release);
        Ok(())
    }

    fn check_threshold(&self, value: f64) -> Result<(), SettingsError> {
        if !self.inner.debug_mode.load(Ordering::Acquire) {
            return Err(SettingsError::DebugModeRequired);
        }
        if !value.is_finite() || value < 0.0 {
            return Err(SettingsError::InvalidThreshold(value));
        }
        Ok(())
    }
}

impl Default for SettingsHandle {
    fn default() -> Self {
        Self::new(MonitorSettings::default())
    }
}

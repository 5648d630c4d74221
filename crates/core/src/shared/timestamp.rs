use std::fmt;

use chrono::{Local, NaiveDateTime, Timelike};

const KEY_FORMAT: &str = "%Y%m%d%H%M%S";

/// Wall-clock instant truncated to whole seconds.
///
/// Alarm evidence is addressed by this key, so two candidates raised in the
/// same second share a storage slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AlarmTimestamp(NaiveDateTime);

impl AlarmTimestamp {
    pub fn now() -> Self {
        Self::from_datetime(Local::now().naive_local())
    }

    pub fn from_datetime(at: NaiveDateTime) -> Self {
        Self(at.with_nanosecond(0).unwrap_or(at))
    }

    /// `YYYYMMDDhhmmss`, e.g. `20240131235959`.
    pub fn key(&self) -> String {
        self.0.format(KEY_FORMAT).to_string()
    }
}

impl fmt::Display for AlarmTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d %H:%M:%S"))
    }
}

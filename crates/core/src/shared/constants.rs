/// Tracks whose re-localization quality drops below this are evicted.
pub const EVICTION_QUALITY_FLOOR: f64 = 7.0;

/// Detections are associated with existing tracks on every Nth processed frame.
pub const REASSOCIATION_INTERVAL: u64 = 10;

/// Margin added around a detection when seeding a new track.
pub const TRACK_PADDING_X: i32 = 5;
pub const TRACK_PADDING_Y: i32 = 10;

/// A burst is dispatched once more than this many alarm candidates are pending.
pub const ALARM_SIGNAL_THRESHOLD: usize = 10;

pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 50.0;
pub const DEFAULT_AUTO_ALARM_THRESHOLD: f64 = 65.0;

pub const FRAME_WIDTH: u32 = 640;
pub const FRAME_HEIGHT: u32 = 480;

pub const DISPLAY_CHANNEL_CAPACITY: usize = 8;

pub const EVIDENCE_DIR_NAME: &str = "unknown";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];

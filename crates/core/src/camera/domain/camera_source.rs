use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::frame::Frame;

/// Which physical camera to open.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraIndex {
    Local,
    External,
}

impl CameraIndex {
    pub fn index(&self) -> u32 {
        match self {
            CameraIndex::Local => 0,
            CameraIndex::External => 1,
        }
    }
}

impl fmt::Display for CameraIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

#[derive(Error, Debug)]
pub enum CameraError {
    #[error("no device configured for camera {0}")]
    NoDevice(CameraIndex),
    #[error("camera {0} produced no first frame")]
    NoFirstFrame(CameraIndex),
    #[error("camera is not open")]
    NotOpened,
    #[error("no images found in {0}")]
    NoFrames(PathBuf),
    #[error("failed to list {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Live frame source.
///
/// Implementations deliver frames at the size requested in `open`.
pub trait CameraSource: Send {
    fn open(
        &mut self,
        index: CameraIndex,
        width: u32,
        height: u32,
    ) -> Result<(), Box<dyn std::error::Error>>;

    /// Next frame, or `None` when no frame is ready yet.
    fn read(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>>;

    fn is_opened(&self) -> bool;

    /// Releases the device. Safe to call more than once.
    fn release(&mut self);
}

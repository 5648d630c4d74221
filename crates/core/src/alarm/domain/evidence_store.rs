use std::path::PathBuf;

use thiserror::Error;

use crate::shared::frame::Frame;
use crate::shared::timestamp::AlarmTimestamp;

#[derive(Error, Debug)]
pub enum EvidenceError {
    #[error("failed to create evidence directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("snapshot cannot be encoded as an image")]
    InvalidFrame,
    #[error("failed to write evidence {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to read evidence {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Durable storage for alarm snapshots, addressed by second-granularity
/// timestamp. Writing twice in the same second overwrites.
pub trait EvidenceStore: Send + Sync {
    fn persist(&self, timestamp: &AlarmTimestamp, frame: &Frame) -> Result<PathBuf, EvidenceError>;

    fn load(&self, timestamp: &AlarmTimestamp) -> Result<Frame, EvidenceError>;
}

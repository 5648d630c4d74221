use std::path::{Path, PathBuf};

use crate::alarm::domain::evidence_store::{EvidenceError, EvidenceStore};
use crate::shared::frame::Frame;
use crate::shared::timestamp::AlarmTimestamp;

/// Stores each snapshot as `<dir>/<YYYYmmddHHMMSS>.png`.
///
/// PNG is lossless, so a loaded snapshot equals the persisted one. The
/// directory is created on first write.
pub struct ImageEvidenceStore {
    dir: PathBuf,
}

impl ImageEvidenceStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, timestamp: &AlarmTimestamp) -> PathBuf {
        self.dir.join(format!("{}.png", timestamp.key()))
    }
}

impl EvidenceStore for ImageEvidenceStore {
    fn persist(&self, timestamp: &AlarmTimestamp, frame: &Frame) -> Result<PathBuf, EvidenceError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| EvidenceError::CreateDir {
            path: self.dir.clone(),
            source: e,
        })?;

        let img = frame.to_rgb_image().ok_or(EvidenceError::InvalidFrame)?;
        let path = self.path_for(timestamp);
        img.save(&path).map_err(|e| EvidenceError::Write {
            path: path.clone(),
            source: e,
        })?;
        Ok(path)
    }

    fn load(&self, timestamp: &AlarmTimestamp) -> Result<Frame, EvidenceError> {
        let path = self.path_for(timestamp);
        let img = image::open(&path)
            .map_err(|e| EvidenceError::Read { path, source: e })?
            .to_rgb8();
        Ok(Frame::from_rgb_image(img, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn timestamp(s: u32) -> AlarmTimestamp {
        AlarmTimestamp::from_datetime(
            NaiveDate::from_ymd_opt(2024, 5, 17)
                .unwrap()
                .and_hms_opt(14, 3, s)
                .unwrap(),
        )
    }

    fn gradient(width: u32, height: u32) -> Frame {
        let img = image::RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x * 7) as u8, (y * 11) as u8, ((x + y) * 3) as u8])
        });
        Frame::from_rgb_image(img, 0)
    }

    #[test]
    fn test_persist_creates_directory_and_names_by_key() {
        let root = tempfile::tempdir().unwrap();
        let store = ImageEvidenceStore::new(root.path().join("unknown"));

        let path = store.persist(&timestamp(9), &gradient(8, 6)).unwrap();

        assert_eq!(path, root.path().join("unknown").join("20240517140309.png"));
        assert!(path.exists());
    }

    #[test]
    fn test_load_returns_persisted_image() {
        let root = tempfile::tempdir().unwrap();
        let store = ImageEvidenceStore::new(root.path());
        let frame = gradient(32, 24);

        store.persist(&timestamp(1), &frame).unwrap();
        let loaded = store.load(&timestamp(1)).unwrap();

        assert_eq!(loaded.data(), frame.data());
        assert_eq!((loaded.width(), loaded.height()), (32, 24));
    }

    #[test]
    fn test_same_second_overwrites() {
        let root = tempfile::tempdir().unwrap();
        let store = ImageEvidenceStore::new(root.path());

        store.persist(&timestamp(5), &gradient(4, 4)).unwrap();
        let second = Frame::new(vec![200; 4 * 4 * 3], 4, 4, 3, 0);
        store.persist(&timestamp(5), &second).unwrap();

        assert_eq!(store.load(&timestamp(5)).unwrap().data(), second.data());
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_load_missing_fails() {
        let root = tempfile::tempdir().unwrap();
        let store = ImageEvidenceStore::new(root.path());
        assert!(matches!(
            store.load(&timestamp(0)),
            Err(EvidenceError::Read { .. })
        ));
    }

    #[test]
    fn test_persist_unwritable_dir_fails() {
        let root = tempfile::tempdir().unwrap();
        let blocker = root.path().join("file");
        std::fs::write(&blocker, b"not a dir").unwrap();
        let store = ImageEvidenceStore::new(&blocker);

        assert!(store.persist(&timestamp(0), &gradient(2, 2)).is_err());
    }
}

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::detection::domain::face_detector::FaceDetector;
use crate::shared::config_error::ConfigError;
use crate::shared::frame::GrayFrame;
use crate::shared::region::Region;

/// Replays pre-computed detection results by frame index.
///
/// Lets the monitor run against recorded footage whose faces were located
/// offline. Frames with no entry yield no detections.
pub struct ReplayFaceDetector {
    detections: HashMap<usize, Vec<Region>>,
}

impl ReplayFaceDetector {
    pub fn new(detections: HashMap<usize, Vec<Region>>) -> Self {
        Self { detections }
    }

    /// Loads `{ "<frame index>": [ { "x":.., "y":.., "width":.., "height":.. } ] }`.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let detections = serde_json::from_str(&json).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(Self::new(detections))
    }
}

impl FaceDetector for ReplayFaceDetector {
    fn detect(&mut self, frame: &GrayFrame) -> Result<Vec<Region>, Box<dyn std::error::Error>> {
        Ok(self
            .detections
            .get(&frame.index())
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn frame(index: usize) -> GrayFrame {
        GrayFrame::new(vec![0u8; 100 * 100], 100, 100, index)
    }

    #[test]
    fn test_returns_recorded_regions_for_known_frame() {
        let regions = vec![Region::new(10, 20, 50, 50), Region::new(60, 20, 30, 30)];
        let mut detector = ReplayFaceDetector::new(HashMap::from([(0, regions.clone())]));

        assert_eq!(detector.detect(&frame(0)).unwrap(), regions);
    }

    #[test]
    fn test_returns_empty_for_unknown_frame() {
        let mut detector =
            ReplayFaceDetector::new(HashMap::from([(0, vec![Region::new(0, 0, 5, 5)])]));

        assert!(detector.detect(&frame(99)).unwrap().is_empty());
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"3": [{{"x": 1, "y": 2, "width": 30, "height": 40}}]}}"#
        )
        .unwrap();

        let mut detector = ReplayFaceDetector::from_json_file(file.path()).unwrap();

        assert_eq!(
            detector.detect(&frame(3)).unwrap(),
            vec![Region::new(1, 2, 30, 40)]
        );
    }

    #[test]
    fn test_from_json_file_missing_is_read_error() {
        let result = ReplayFaceDetector::from_json_file(Path::new("/nonexistent/detections.json"));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_from_json_file_malformed_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[not a map").unwrap();
        let result = ReplayFaceDetector::from_json_file(file.path());
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }
}

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::detection::domain::face_recognizer::{FaceRecognizer, Prediction};
use crate::shared::config_error::ConfigError;
use crate::shared::frame::GrayFrame;

/// Replays recorded predictions, in detection order, for each frame index.
///
/// The n-th `predict` call for a frame returns the n-th recorded prediction
/// of that frame. Detections with no pixels inside the frame are dropped
/// before recognition and take no slot. Asking for more predictions than were
/// recorded is an error.
pub struct ReplayFaceRecognizer {
    predictions: HashMap<usize, Vec<Prediction>>,
    current_frame: Option<usize>,
    cursor: usize,
}

impl ReplayFaceRecognizer {
    pub fn new(predictions: HashMap<usize, Vec<Prediction>>) -> Self {
        Self {
            predictions,
            current_frame: None,
            cursor: 0,
        }
    }

    /// Loads `{ "<frame index>": [ { "face_id": 1, "confidence": 42.0 } ] }`.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let predictions = serde_json::from_str(&json).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(Self::new(predictions))
    }
}

impl FaceRecognizer for ReplayFaceRecognizer {
    fn predict(&mut self, face: &GrayFrame) -> Result<Prediction, Box<dyn std::error::Error>> {
        let index = face.index();
        if self.current_frame != Some(index) {
            self.current_frame = Some(index);
            self.cursor = 0;
        }
        let slot = self.cursor;
        self.cursor += 1;

        self.predictions
            .get(&index)
            .and_then(|p| p.get(slot))
            .copied()
            .ok_or_else(|| format!("no prediction #{slot} recorded for frame {index}").into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn face(index: usize) -> GrayFrame {
        GrayFrame::new(vec![0u8; 16], 4, 4, index)
    }

    fn prediction(face_id: i64, confidence: f64) -> Prediction {
        Prediction {
            face_id,
            confidence,
        }
    }

    #[test]
    fn test_returns_predictions_in_detection_order() {
        let mut recognizer = ReplayFaceRecognizer::new(HashMap::from([(
            0,
            vec![prediction(1, 20.0), prediction(2, 80.0)],
        )]));

        assert_eq!(recognizer.predict(&face(0)).unwrap(), prediction(1, 20.0));
        assert_eq!(recognizer.predict(&face(0)).unwrap(), prediction(2, 80.0));
    }

    #[test]
    fn test_cursor_resets_on_new_frame() {
        let mut recognizer = ReplayFaceRecognizer::new(HashMap::from([
            (0, vec![prediction(1, 20.0)]),
            (1, vec![prediction(3, 30.0)]),
        ]));

        recognizer.predict(&face(0)).unwrap();
        assert_eq!(recognizer.predict(&face(1)).unwrap(), prediction(3, 30.0));
    }

    #[test]
    fn test_exhausted_frame_is_error() {
        let mut recognizer =
            ReplayFaceRecognizer::new(HashMap::from([(0, vec![prediction(1, 20.0)])]));

        recognizer.predict(&face(0)).unwrap();
        assert!(recognizer.predict(&face(0)).is_err());
    }

    #[test]
    fn test_unrecorded_frame_is_error() {
        let mut recognizer = ReplayFaceRecognizer::new(HashMap::new());
        assert!(recognizer.predict(&face(5)).is_err());
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"2": [{{"face_id": 7, "confidence": 41.5}}]}}"#).unwrap();

        let mut recognizer = ReplayFaceRecognizer::from_json_file(file.path()).unwrap();

        assert_eq!(recognizer.predict(&face(2)).unwrap(), prediction(7, 41.5));
    }
}

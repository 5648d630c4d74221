use serde::{Deserialize, Serialize};

use crate::shared::frame::GrayFrame;

/// Identity guess for one face crop.
///
/// `confidence` is distance-like: lower means a more certain match.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub face_id: i64,
    pub confidence: f64,
}

/// Domain interface for face recognition.
pub trait FaceRecognizer: Send {
    fn predict(&mut self, face: &GrayFrame) -> Result<Prediction, Box<dyn std::error::Error>>;
}

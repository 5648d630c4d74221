use crate::shared::frame::GrayFrame;
use crate::shared::region::Region;

/// Domain interface for face detection.
///
/// Receives the grayscale (optionally equalized) frame and returns one
/// rectangle per face. Implementations may be stateful, hence `&mut self`.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &GrayFrame) -> Result<Vec<Region>, Box<dyn std::error::Error>>;
}

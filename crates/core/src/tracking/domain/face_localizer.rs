use crate::shared::frame::GrayFrame;
use crate::shared::region::Region;

/// Result of re-localizing one tracked face in a new frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Localization {
    pub region: Region,
    /// Higher is better; tracks are evicted below a fixed floor.
    pub quality: f64,
}

/// Follows a single face from frame to frame.
pub trait FaceLocalizer: Send {
    fn update(&mut self, frame: &GrayFrame) -> Result<Localization, Box<dyn std::error::Error>>;
}

/// Starts a new localizer locked onto `region` of `frame`.
pub trait LocalizerFactory: Send {
    fn start(&self, frame: &GrayFrame, region: Region) -> Box<dyn FaceLocalizer>;
}

use std::fs;
use std::path::Path;
use std::sync::Arc;

use ab_glyph::{FontVec, PxScale};
use image::Rgb;
use imageproc::drawing::draw_text_mut;

use crate::shared::frame::Frame;
use crate::shared::region::Region;

pub const DETECTION_COLOR: [u8; 3] = [30, 138, 255];
pub const TRACK_COLOR: [u8; 3] = [255, 0, 0];
pub const KNOWN_LABEL_COLOR: [u8; 3] = [255, 97, 0];
pub const UNKNOWN_LABEL_COLOR: [u8; 3] = [255, 0, 0];
pub const LABEL_TEXT_COLOR: [u8; 3] = [255, 255, 255];
pub const OUTLINE_THICKNESS: i32 = 2;
pub const LABEL_HEIGHT: i32 = 18;
const LABEL_SCALE: f32 = 16.0;

pub const UNKNOWN_LABEL: &str = "unknown";
pub const TRACKING_LABEL: &str = "tracking...";

/// Reads a TrueType/OpenType font used to print labels on frames.
pub fn load_label_font(path: &Path) -> Result<FontVec, Box<dyn std::error::Error>> {
    let bytes = fs::read(path)?;
    Ok(FontVec::try_from_vec(bytes)?)
}

/// Label tag above a face: the padded face width, sitting just over the box,
/// or tucked inside its top edge when there is no room above.
pub fn label_band(region: &Region) -> Region {
    let above = region.y.saturating_sub(10 + LABEL_HEIGHT);
    Region::new(
        region.x.saturating_sub(5),
        if above < 0 { region.y } else { above },
        region.width.saturating_add(10),
        LABEL_HEIGHT,
    )
}

/// Something drawn on top of a frame.
///
/// Every overlay is burned into [`FramePacket::annotated`]: outlines for
/// detections and tracks, a colored tag per label (with its text when a label
/// font is loaded). The display also receives the overlays in drawing order.
#[derive(Clone, Debug, PartialEq)]
pub enum Overlay {
    /// Raw detector output, shown while recognition is on.
    Detection(Region),
    Track { id: u64, region: Region },
    /// Identity under a detection: a display name, or [`UNKNOWN_LABEL`].
    Label {
        region: Region,
        text: String,
        known: bool,
    },
    /// At least one track is alive this frame.
    TrackingActive,
}

impl Overlay {
    pub fn known(region: Region, name: impl Into<String>) -> Self {
        Overlay::Label {
            region,
            text: name.into(),
            known: true,
        }
    }

    pub fn unknown(region: Region) -> Self {
        Overlay::Label {
            region,
            text: UNKNOWN_LABEL.to_string(),
            known: false,
        }
    }
}

/// One processed frame as handed to the display.
#[derive(Clone, Debug, PartialEq)]
pub struct FramePacket {
    pub original: Frame,
    pub annotated: Frame,
    pub overlays: Vec<Overlay>,
}

impl FramePacket {
    pub fn tracked_ids(&self) -> Vec<u64> {
        self.overlays
            .iter()
            .filter_map(|o| match o {
                Overlay::Track { id, .. } => Some(*id),
                _ => None,
            })
            .collect()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.overlays
            .iter()
            .filter_map(|o| match o {
                Overlay::Label { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Accumulates overlays while burning them into a copy of the frame.
pub(crate) struct Annotator {
    frame: Frame,
    overlays: Vec<Overlay>,
    font: Option<Arc<FontVec>>,
}

impl Annotator {
    pub(crate) fn new(original: &Frame) -> Self {
        Self {
            frame: original.clone(),
            overlays: Vec::new(),
            font: None,
        }
    }

    pub(crate) fn with_font(mut self, font: Option<Arc<FontVec>>) -> Self {
        self.font = font;
        self
    }

    pub(crate) fn detection(&mut self, region: Region) {
        self.frame
            .draw_rectangle(&region, DETECTION_COLOR, OUTLINE_THICKNESS);
        self.overlays.push(Overlay::Detection(region));
    }

    pub(crate) fn track(&mut self, id: u64, region: Region) {
        self.frame.draw_rectangle(&region, TRACK_COLOR, OUTLINE_THICKNESS);
        self.overlays.push(Overlay::Track { id, region });
    }

    pub(crate) fn label(&mut self, overlay: Overlay) {
        if let Overlay::Label {
            region,
            text,
            known,
        } = &overlay
        {
            let band = label_band(region);
            let color = if *known {
                KNOWN_LABEL_COLOR
            } else {
                UNKNOWN_LABEL_COLOR
            };
            self.frame.fill_rectangle(&band, color);
            self.text(band.x + 2, band.y + 1, LABEL_TEXT_COLOR, text);
        }
        self.overlays.push(overlay);
    }

    pub(crate) fn tracking_active(&mut self) {
        self.text(15, 12, TRACK_COLOR, TRACKING_LABEL);
        self.overlays.push(Overlay::TrackingActive);
    }

    fn text(&mut self, x: i32, y: i32, color: [u8; 3], text: &str) {
        let Some(font) = self.font.as_deref() else {
            return;
        };
        if text.is_empty() {
            return;
        }
        self.frame.draw_rgb(|img| {
            draw_text_mut(img, Rgb(color), x, y, PxScale::from(LABEL_SCALE), font, text);
        });
    }

    pub(crate) fn frame(&self) -> &Frame {
        &self.frame
    }

    pub(crate) fn finish(self, original: Frame) -> FramePacket {
        FramePacket {
            original,
            annotated: self.frame,
            overlays: self.overlays,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank() -> Frame {
        Frame::new(vec![0u8; 20 * 20 * 3], 20, 20, 3, 0)
    }

    #[test]
    fn test_original_is_left_untouched() {
        let original = blank();
        let mut annotator = Annotator::new(&original);
        annotator.track(0, Region::new(2, 2, 10, 10));
        let packet = annotator.finish(original.clone());

        assert_eq!(packet.original, original);
        assert_ne!(packet.annotated, original);
        assert_eq!(packet.annotated.as_ndarray()[[2, 2, 0]], TRACK_COLOR[0]);
    }

    #[test]
    fn test_overlays_keep_drawing_order() {
        let original = blank();
        let mut annotator = Annotator::new(&original);
        let r = Region::new(1, 1, 5, 5);
        annotator.detection(r);
        annotator.label(Overlay::unknown(r));
        annotator.track(3, r);
        annotator.tracking_active();
        let packet = annotator.finish(original);

        assert_eq!(
            packet.overlays,
            vec![
                Overlay::Detection(r),
                Overlay::unknown(r),
                Overlay::Track { id: 3, region: r },
                Overlay::TrackingActive,
            ]
        );
        assert_eq!(packet.tracked_ids(), vec![3]);
        assert_eq!(packet.labels(), vec![UNKNOWN_LABEL]);
    }

    fn pixel(frame: &Frame, x: i32, y: i32) -> [u8; 3] {
        let arr = frame.as_ndarray();
        let (x, y) = (x as usize, y as usize);
        [arr[[y, x, 0]], arr[[y, x, 1]], arr[[y, x, 2]]]
    }

    fn big_blank() -> Frame {
        Frame::new(vec![0u8; 120 * 100 * 3], 120, 100, 3, 0)
    }

    #[test]
    fn test_unknown_label_paints_tag_above_face() {
        let original = big_blank();
        let face = Region::new(40, 50, 30, 30);
        let mut annotator = Annotator::new(&original);
        annotator.label(Overlay::unknown(face));
        let packet = annotator.finish(original);

        let band = label_band(&face);
        assert_eq!(band, Region::new(35, 22, 40, LABEL_HEIGHT));
        assert_eq!(pixel(&packet.annotated, band.x, band.y), UNKNOWN_LABEL_COLOR);
        assert_eq!(pixel(&packet.annotated, 74, 39), UNKNOWN_LABEL_COLOR);
        assert_eq!(pixel(&packet.annotated, 50, 60), [0, 0, 0]);
    }

    #[test]
    fn test_known_and_unknown_tags_differ() {
        let original = big_blank();
        let face = Region::new(40, 50, 30, 30);

        let mut known = Annotator::new(&original);
        known.label(Overlay::known(face, "Alice"));
        let mut unknown = Annotator::new(&original);
        unknown.label(Overlay::unknown(face));

        let at = (face.x, face.y - 15);
        assert_eq!(pixel(known.frame(), at.0, at.1), KNOWN_LABEL_COLOR);
        assert_ne!(known.frame(), unknown.frame());
    }

    #[test]
    fn test_label_near_top_edge_moves_inside_the_box() {
        let face = Region::new(10, 5, 30, 30);
        assert_eq!(label_band(&face), Region::new(5, 5, 40, LABEL_HEIGHT));
    }

    #[test]
    fn test_tracking_marker_without_font_leaves_pixels() {
        let original = blank();
        let mut annotator = Annotator::new(&original);
        annotator.tracking_active();
        assert_eq!(annotator.frame(), &original);
    }

    #[test]
    fn test_load_label_font_rejects_non_font_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"not a font").unwrap();
        assert!(load_label_font(file.path()).is_err());
        assert!(load_label_font(Path::new("/nonexistent/font.ttf")).is_err());
    }
}

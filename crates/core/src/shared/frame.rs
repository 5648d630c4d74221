use image::Rgb;
use imageproc::contrast::equalize_histogram;
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;
use ndarray::{s, ArrayView2, ArrayView3};

use crate::shared::region::Region;

/// A single camera frame: contiguous RGB bytes in row-major order.
///
/// Format conversion happens at I/O boundaries only; the domain layer
/// treats pixel data as opaque.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    pub fn from_rgb_image(img: image::RgbImage, index: usize) -> Self {
        let (width, height) = img.dimensions();
        Self::new(img.into_raw(), width, height, 3, index)
    }

    /// Copies the pixels into an `image::RgbImage` (grayscale frames are expanded).
    pub fn to_rgb_image(&self) -> Option<image::RgbImage> {
        let rgb = match self.channels {
            3 => self.data.clone(),
            1 => self.data.iter().flat_map(|&v| [v, v, v]).collect(),
            4 => self
                .data
                .chunks_exact(4)
                .flat_map(|px| [px[0], px[1], px[2]])
                .collect(),
            _ => return None,
        };
        image::RgbImage::from_raw(self.width, self.height, rgb)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Luma conversion through `image::imageops::grayscale`. Alpha is ignored.
    pub fn to_gray(&self) -> GrayFrame {
        let data = match (self.channels, self.to_rgb_image()) {
            (1, _) => self.data.clone(),
            (_, Some(rgb)) => image::imageops::grayscale(&rgb).into_raw(),
            (c, None) => self.data.iter().step_by(c.max(1) as usize).copied().collect(),
        };
        GrayFrame::new(data, self.width, self.height, self.index)
    }

    /// Lends the pixels to `draw` as an `image::RgbImage`, in place.
    ///
    /// Frames that are not 3-channel RGB are left untouched.
    pub fn draw_rgb(&mut self, draw: impl FnOnce(&mut image::RgbImage)) {
        if self.channels != 3 || self.data.len() != self.shape_len() {
            return;
        }
        let data = std::mem::take(&mut self.data);
        if let Some(mut img) = image::RgbImage::from_raw(self.width, self.height, data) {
            draw(&mut img);
            self.data = img.into_raw();
        }
    }

    /// Draws a `thickness`-pixel outline of `region`, clipped to the frame.
    pub fn draw_rectangle(&mut self, region: &Region, color: [u8; 3], thickness: i32) {
        let Some(bounds) = region.clamp_to(self.width, self.height) else {
            return;
        };
        self.draw_rgb(|img| {
            for inset in 0..thickness.max(0) {
                let (w, h) = (bounds.width - 2 * inset, bounds.height - 2 * inset);
                if w <= 0 || h <= 0 {
                    break;
                }
                let rect = Rect::at(bounds.x + inset, bounds.y + inset).of_size(w as u32, h as u32);
                draw_hollow_rect_mut(img, rect, Rgb(color));
            }
        });
    }

    /// Paints the visible part of `region` solid.
    pub fn fill_rectangle(&mut self, region: &Region, color: [u8; 3]) {
        let Some(bounds) = region.clamp_to(self.width, self.height) else {
            return;
        };
        self.draw_rgb(|img| {
            let rect = Rect::at(bounds.x, bounds.y).of_size(bounds.width as u32, bounds.height as u32);
            draw_filled_rect_mut(img, rect, Rgb(color));
        });
    }

    fn shape_len(&self) -> usize {
        (self.width as usize) * (self.height as usize) * (self.channels as usize)
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}

/// Single-channel 8-bit frame fed to detection, recognition and tracking.
#[derive(Clone, Debug, PartialEq)]
pub struct GrayFrame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    index: usize,
}

impl GrayFrame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize),
            "data length must equal width * height"
        );
        Self {
            data,
            width,
            height,
            index,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Index of the camera frame this was derived from.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.data[(y * self.width + x) as usize]
    }

    pub fn as_ndarray(&self) -> ArrayView2<'_, u8> {
        ArrayView2::from_shape((self.height as usize, self.width as usize), &self.data)
            .expect("GrayFrame data length must match dimensions")
    }

    /// Histogram equalization (`imageproc::contrast::equalize_histogram`).
    pub fn equalized(&self) -> GrayFrame {
        match image::GrayImage::from_raw(self.width, self.height, self.data.clone()) {
            Some(img) if !self.data.is_empty() => GrayFrame::new(
                equalize_histogram(&img).into_raw(),
                self.width,
                self.height,
                self.index,
            ),
            _ => self.clone(),
        }
    }

    /// Copies the visible part of `region`, or `None` if it lies off-frame.
    pub fn crop(&self, region: &Region) -> Option<GrayFrame> {
        let r = region.clamp_to(self.width, self.height)?;
        let view = self.as_ndarray();
        let patch = view.slice(s![
            r.y as usize..r.bottom() as usize,
            r.x as usize..r.right() as usize
        ]);
        let data = patch.iter().copied().collect();
        Some(GrayFrame::new(
            data,
            r.width as u32,
            r.height as u32,
            self.index,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_and_accessors() {
        let data = vec![0u8; 12]; // 2x2x3
        let frame = Frame::new(data.clone(), 2, 2, 3, 5);
        assert_eq!(frame.width(), 2);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.channels(), 3);
        assert_eq!(frame.index(), 5);
        assert_eq!(frame.data(), &data[..]);
    }

    #[test]
    fn test_clone_is_independent() {
        let frame = Frame::new(vec![100u8; 12], 2, 2, 3, 0);
        let mut cloned = frame.clone();
        cloned.fill_rectangle(&Region::new(0, 0, 1, 1), [0, 0, 0]);
        assert_eq!(frame.data()[0], 100);
        assert_eq!(cloned.data()[0], 0);
    }

    #[test]
    #[should_panic(expected = "data length must equal width * height * channels")]
    fn test_mismatched_data_length_panics_in_debug() {
        Frame::new(vec![0u8; 10], 2, 2, 3, 0);
    }

    #[test]
    fn test_to_gray_weights() {
        // red, green, blue, white, black
        let data = vec![255, 0, 0, 0, 255, 0, 0, 0, 255, 255, 255, 255, 0, 0, 0];
        let gray = Frame::new(data, 5, 1, 3, 7).to_gray();
        let [red, green, blue, white, black] = [0, 1, 2, 3, 4].map(|i| gray.data()[i]);
        assert!(green > red && red > blue, "{:?}", gray.data());
        assert_eq!((white, black), (255, 0));
        assert_eq!(gray.index(), 7);
    }

    #[test]
    fn test_to_gray_drops_alpha() {
        let frame = Frame::new(vec![255, 255, 255, 0, 0, 0, 0, 255], 2, 1, 4, 0);
        assert_eq!(frame.to_gray().data(), &[255, 0]);
    }

    #[test]
    fn test_to_gray_single_channel_is_copy() {
        let frame = Frame::new(vec![1, 2, 3, 4], 2, 2, 1, 0);
        assert_eq!(frame.to_gray().data(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_rgb_image_roundtrip() {
        let img = image::RgbImage::from_fn(3, 2, |x, y| image::Rgb([x as u8, y as u8, 9]));
        let frame = Frame::from_rgb_image(img.clone(), 4);
        assert_eq!(frame.width(), 3);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.to_rgb_image().unwrap(), img);
    }

    #[test]
    fn test_draw_rectangle_outline_only() {
        let mut frame = Frame::new(vec![0u8; 6 * 6 * 3], 6, 6, 3, 0);
        frame.draw_rectangle(&Region::new(1, 1, 4, 4), [255, 0, 0], 1);
        let arr = frame.as_ndarray();
        assert_eq!(arr[[1, 1, 0]], 255); // corner
        assert_eq!(arr[[4, 2, 0]], 255); // bottom edge
        assert_eq!(arr[[2, 4, 0]], 255); // right edge
        assert_eq!(arr[[2, 2, 0]], 0); // interior
        assert_eq!(arr[[0, 0, 0]], 0); // outside
        assert_eq!(arr[[1, 1, 1]], 0);
    }

    #[test]
    fn test_draw_rectangle_clipped_to_frame() {
        let mut frame = Frame::new(vec![0u8; 4 * 4 * 3], 4, 4, 3, 0);
        frame.draw_rectangle(&Region::new(-2, -2, 4, 4), [0, 255, 0], 1);
        let arr = frame.as_ndarray();
        assert_eq!(arr[[0, 0, 1]], 255);
        assert_eq!(arr[[1, 1, 1]], 255);
        assert_eq!(arr[[3, 3, 1]], 0);
    }

    #[test]
    fn test_draw_rectangle_thickness_insets() {
        let mut frame = Frame::new(vec![0u8; 8 * 8 * 3], 8, 8, 3, 0);
        frame.draw_rectangle(&Region::new(0, 0, 8, 8), [0, 0, 255], 2);
        let arr = frame.as_ndarray();
        assert_eq!(arr[[1, 1, 2]], 255);
        assert_eq!(arr[[6, 3, 2]], 255);
        assert_eq!(arr[[2, 2, 2]], 0);
    }

    #[test]
    fn test_draw_rectangle_ignores_gray_frames() {
        let mut frame = Frame::new(vec![0u8; 16], 4, 4, 1, 0);
        frame.draw_rectangle(&Region::new(0, 0, 4, 4), [255, 255, 255], 1);
        assert!(frame.data().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_fill_rectangle_clipped() {
        let mut frame = Frame::new(vec![0u8; 4 * 4 * 3], 4, 4, 3, 0);
        frame.fill_rectangle(&Region::new(2, -3, 10, 5), [9, 8, 7]);
        let arr = frame.as_ndarray();
        assert_eq!([arr[[1, 3, 0]], arr[[1, 3, 1]], arr[[1, 3, 2]]], [9, 8, 7]);
        assert_eq!(arr[[1, 2, 0]], 9);
        assert_eq!(arr[[2, 2, 0]], 0);
        assert_eq!(arr[[0, 1, 0]], 0);
    }

    #[test]
    fn test_draw_rectangle_off_frame_is_noop() {
        let mut frame = Frame::new(vec![7u8; 4 * 4 * 3], 4, 4, 3, 0);
        let before = frame.clone();
        frame.draw_rectangle(&Region::new(10, 10, 4, 4), [255, 255, 255], 2);
        assert_eq!(frame, before);
    }

    #[test]
    fn test_gray_equalized_spreads_levels() {
        let gray = GrayFrame::new(vec![10, 10, 20, 30], 2, 2, 3);
        let eq = gray.equalized();
        let d = eq.data();
        assert_eq!(d[0], d[1]);
        assert!(d[1] < d[2] && d[2] < d[3], "{d:?}");
        assert_eq!(d[3], 255);
        assert!(d[2] - d[1] > 20 - 10);
        assert_eq!(eq.index(), 3);
    }

    #[test]
    fn test_gray_equalized_uniform_frame_stays_uniform() {
        let eq = GrayFrame::new(vec![42; 9], 3, 3, 0).equalized();
        assert!(eq.data().iter().all(|&v| v == eq.data()[0]));
    }

    #[test]
    fn test_gray_crop() {
        let data: Vec<u8> = (0..16).collect();
        let gray = GrayFrame::new(data, 4, 4, 2);
        let crop = gray.crop(&Region::new(1, 1, 2, 2)).unwrap();
        assert_eq!(crop.width(), 2);
        assert_eq!(crop.height(), 2);
        assert_eq!(crop.data(), &[5, 6, 9, 10]);
        assert_eq!(crop.index(), 2);
    }

    #[test]
    fn test_gray_crop_clamps_to_frame() {
        let gray = GrayFrame::new((0..16).collect(), 4, 4, 0);
        let crop = gray.crop(&Region::new(-2, 2, 4, 10)).unwrap();
        assert_eq!((crop.width(), crop.height()), (2, 2));
        assert_eq!(crop.data(), &[8, 9, 12, 13]);
    }

    #[test]
    fn test_gray_crop_outside_is_none() {
        let gray = GrayFrame::new(vec![0; 16], 4, 4, 0);
        assert!(gray.crop(&Region::new(10, 10, 2, 2)).is_none());
    }
}

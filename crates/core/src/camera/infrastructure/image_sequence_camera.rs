use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::camera::domain::camera_source::{CameraError, CameraIndex, CameraSource};
use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::frame::Frame;

/// Adapts a directory of still images to the [`CameraSource`] interface.
///
/// Each camera index maps to its own directory. Images are replayed in file
/// name order, looping forever, and resized to the requested frame size.
pub struct ImageSequenceCamera {
    devices: HashMap<CameraIndex, PathBuf>,
    files: Vec<PathBuf>,
    size: (u32, u32),
    cursor: usize,
    frame_index: usize,
    opened: bool,
}

impl ImageSequenceCamera {
    pub fn new() -> Self {
        Self {
            devices: HashMap::new(),
            files: Vec::new(),
            size: (0, 0),
            cursor: 0,
            frame_index: 0,
            opened: false,
        }
    }

    pub fn with_device(mut self, index: CameraIndex, dir: impl Into<PathBuf>) -> Self {
        self.devices.insert(index, dir.into());
        self
    }

    fn decode(&self, path: &Path, index: usize) -> Result<Frame, CameraError> {
        let img = image::open(path)
            .map_err(|e| CameraError::Decode {
                path: path.to_path_buf(),
                source: e,
            })?
            .to_rgb8();

        let (w, h) = self.size;
        let img = if img.dimensions() != (w, h) {
            image::imageops::resize(&img, w, h, image::imageops::FilterType::Triangle)
        } else {
            img
        };
        Ok(Frame::from_rgb_image(img, index))
    }
}

impl Default for ImageSequenceCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraSource for ImageSequenceCamera {
    fn open(
        &mut self,
        index: CameraIndex,
        width: u32,
        height: u32,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let dir = self
            .devices
            .get(&index)
            .ok_or(CameraError::NoDevice(index))?;
        let files = list_images(dir)?;
        if files.is_empty() {
            return Err(CameraError::NoFrames(dir.clone()).into());
        }

        log::info!(
            "Opened camera {index} from {} ({} images, {width}x{height})",
            dir.display(),
            files.len()
        );
        self.files = files;
        self.size = (width, height);
        self.cursor = 0;
        self.frame_index = 0;
        self.opened = true;
        Ok(())
    }

    fn read(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        if !self.opened {
            return Err(CameraError::NotOpened.into());
        }
        // Advance first so an unreadable file is skipped on the next read.
        let path = self.files[self.cursor].clone();
        let index = self.frame_index;
        self.cursor = (self.cursor + 1) % self.files.len();
        self.frame_index += 1;
        Ok(Some(self.decode(&path, index)?))
    }

    fn is_opened(&self) -> bool {
        self.opened
    }

    fn release(&mut self) {
        if self.opened {
            log::info!("Camera released");
        }
        self.opened = false;
        self.files.clear();
    }
}

fn list_images(dir: &Path) -> Result<Vec<PathBuf>, CameraError> {
    let entries = fs::read_dir(dir).map_err(|e| CameraError::ReadDir {
        path: dir.to_path_buf(),
        source: e,
    })?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| is_image(path))
        .collect();
    files.sort();
    Ok(files)
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

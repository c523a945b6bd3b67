//! # V4L2 Camera Backend
//!
//! Camera capture through [`rscam`](https://github.com/loyd/rscam), Linux only. Device index
//! `N` maps to `/dev/videoN`. Video files are not supported by this backend.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::path::Path;

use image::{DynamicImage, ImageFormat};
use log::{debug, warn};
use rscam::{Camera, Config, Frame};

use crate::capture::{Backend, Capture};
use crate::error::{Error, Result};

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// Opens V4L2 cameras with a fixed capture configuration.
#[derive(Clone, Debug)]
pub struct V4l2Backend {
    interval: (u32, u32),
    resolution: (u32, u32),
    format: &'static [u8],
    num_buffers: u32
}

struct V4l2Capture {
    camera: Camera,

    img_format: ImageFormat,

    interval: (u32, u32),
    resolution: (u32, u32)
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl Default for V4l2Backend {
    fn default() -> Self {
        Self {
            interval: (1, 30),
            resolution: (640, 480),
            format: b"MJPG",
            num_buffers: 2
        }
    }
}

impl V4l2Backend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the interval of the camera.
    ///
    /// V4L2 uses intervals rather than framerates, default value is `(1, 30)`.
    pub fn interval(mut self, interval: (u32, u32)) -> Self {
        self.interval = interval;

        self
    }

    /// Set the resolution of the camera.
    ///
    /// Default value is `(640, 480)`.
    pub fn resolution(mut self, resolution: (u32, u32)) -> Self {
        self.resolution = resolution;

        self
    }

    /// Set the format of the images.
    ///
    /// Uses the FourCC notation, only `b"MJPG"` can currently be decoded.
    pub fn format(mut self, format: &'static [u8]) -> Result<Self> {
        if format_from_fourcc(format).is_none() {
            return Err(Error::CameraOpenError(
                0,
                format!("unsupported FourCC {}", String::from_utf8_lossy(format))
            ));
        }

        self.format = format;

        Ok(self)
    }

    /// Set the number of buffers in the queue for this camera.
    ///
    /// Default value is 2.
    pub fn num_buffers(mut self, num_buffers: u32) -> Self {
        self.num_buffers = num_buffers;

        self
    }
}

impl Backend for V4l2Backend {
    fn open_camera(&self, index: u32) -> Result<Box<dyn Capture>> {
        let path = format!("/dev/video{}", index);

        if !Path::new(&path).exists() {
            return Err(Error::CameraOpenError(index, format!("{} does not exist", path)));
        }

        let img_format = format_from_fourcc(self.format).ok_or_else(|| Error::CameraOpenError(
            index,
            format!("unsupported FourCC {}", String::from_utf8_lossy(self.format))
        ))?;

        let mut camera = Camera::new(&path)
            .map_err(|e| Error::CameraOpenError(index, format!("{}", e)))?;

        camera.start(&Config {
            interval: self.interval,
            resolution: self.resolution,
            format: self.format,
            nbuffers: self.num_buffers,
            ..Config::default()
        }).map_err(Error::CamStartError)?;

        debug!("Started V4L2 camera {} at {:?}", path, self.resolution);

        Ok(Box::new(V4l2Capture {
            camera,
            img_format,
            interval: self.interval,
            resolution: self.resolution
        }))
    }

    fn open_video(&self, path: &Path) -> Result<Box<dyn Capture>> {
        Err(Error::VideoOpenError(
            path.to_path_buf(),
            String::from("the V4L2 backend cannot decode video files")
        ))
    }
}

impl Capture for V4l2Capture {
    fn read(&mut self) -> Result<Option<DynamicImage>> {
        let frame = self.camera.capture()
            .map_err(Error::CameraCaptureError)?;

        rscam_frame_to_dynamic_image(frame, self.img_format).map(Some)
    }

    fn seek(&mut self, _position: u64) -> Result<()> {
        Err(Error::SeekUnsupported)
    }

    fn fps(&self) -> Option<f64> {
        let (num, den) = self.interval;

        if num == 0 {
            None
        }
        else {
            Some(den as f64 / num as f64)
        }
    }

    fn frame_count(&self) -> Option<u64> {
        None
    }

    fn frame_size(&self) -> Option<(u32, u32)> {
        Some(self.resolution)
    }

    fn release(&mut self) {
        if let Err(e) = self.camera.stop() {
            warn!("Error stopping V4L2 camera: {}", e);
        }
    }
}

// -----------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Convert an `rscam::Frame` struct into an `image::DynamicImage` struct.
fn rscam_frame_to_dynamic_image(frame: Frame, format: ImageFormat) -> Result<DynamicImage> {
    image::load_from_memory_with_format(&frame, format)
        .map_err(Error::ImageConversionError)
}

fn format_from_fourcc(format: &[u8]) -> Option<ImageFormat> {
    match format {
        b"MJPG" => Some(ImageFormat::Jpeg),
        _ => None
    }
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn test_fourcc() {
        assert_eq!(format_from_fourcc(b"MJPG"), Some(ImageFormat::Jpeg));
        assert_eq!(format_from_fourcc(b"YUYV"), None);
        assert!(V4l2Backend::new().format(b"YUYV").is_err());
    }

    #[test]
    fn test_videos_unsupported() {
        assert!(V4l2Backend::new().open_video(Path::new("clip.mp4")).is_err());
    }
}

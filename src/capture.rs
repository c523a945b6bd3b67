//! # Capture Backend Module
//!
//! The capabilities an `ImageSource` needs from a video library: opening a numbered camera or a
//! video file, and reading, seeking and querying the opened handle.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::path::Path;

use image::DynamicImage;

use crate::error::{Error, Result};

// -----------------------------------------------------------------------------------------------
// TRAITS
// -----------------------------------------------------------------------------------------------

/// Opens capture handles for cameras and video files.
pub trait Backend {
    /// Open the numbered camera device.
    fn open_camera(&self, index: u32) -> Result<Box<dyn Capture>>;

    /// Open the video file at `path`.
    fn open_video(&self, path: &Path) -> Result<Box<dyn Capture>>;
}

/// An opened camera or video decoder.
pub trait Capture {
    /// Read the next frame.
    ///
    /// `Ok(None)` means the device gave no frame this time, which for a video is the end of the
    /// stream and for a camera is usually transient.
    fn read(&mut self) -> Result<Option<DynamicImage>>;

    /// Move the decode position to the absolute frame index `position`.
    fn seek(&mut self, position: u64) -> Result<()>;

    /// Frame rate reported by the device, if any.
    fn fps(&self) -> Option<f64>;

    /// Total number of frames, if the handle is finite and knows it.
    fn frame_count(&self) -> Option<u64>;

    /// Size of the frames the handle produces, `(width, height)`.
    fn frame_size(&self) -> Option<(u32, u32)>;

    /// Close the handle. Called exactly once before the handle is dropped.
    fn release(&mut self);
}

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// Backend used when no video library is compiled in, every open fails.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullBackend;

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl Backend for NullBackend {
    fn open_camera(&self, index: u32) -> Result<Box<dyn Capture>> {
        Err(Error::CameraOpenError(index, String::from("no capture backend compiled in")))
    }

    fn open_video(&self, path: &Path) -> Result<Box<dyn Capture>> {
        Err(Error::VideoOpenError(
            path.to_path_buf(),
            String::from("no capture backend compiled in")
        ))
    }
}

// -----------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// The most capable backend compiled into this build.
///
/// OpenCV handles both cameras and videos, V4L2 only cameras.
#[cfg(feature = "opencv")]
pub fn default_backend() -> Box<dyn Backend> {
    Box::new(crate::opencv_capture::OpencvBackend::default())
}

/// The most capable backend compiled into this build.
///
/// OpenCV handles both cameras and videos, V4L2 only cameras.
#[cfg(all(feature = "v4l2", not(feature = "opencv")))]
pub fn default_backend() -> Box<dyn Backend> {
    Box::new(crate::v4l2::V4l2Backend::default())
}

/// The most capable backend compiled into this build.
///
/// Without the `opencv` or `v4l2` features this is a `NullBackend`, so only image directories
/// can be read.
#[cfg(not(any(feature = "opencv", feature = "v4l2")))]
pub fn default_backend() -> Box<dyn Backend> {
    Box::new(NullBackend)
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

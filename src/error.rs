//! # `cv_imgsource` Error module
//!
//! Provides abstractions over errors which can occur during this crate's use.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::path::PathBuf;

use serde_any;
use thiserror;

// -----------------------------------------------------------------------------------------------
// ENUMERATIONS
// -----------------------------------------------------------------------------------------------

/// Result type used by faillible functions inside the `cv_imgsource` crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents errors which can occur during use of the `cv_imgsource` crate.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Cannot find file at {0:?}")]
    FileNotFound(PathBuf),

    #[error("Error deserialising data: {0}")]
    DeserialisationError(serde_any::Error),

    #[error(
        "Cannot resolve origin {0:?}: it is neither a device index, an existing file, nor an \
        existing directory"
    )]
    UnresolvedOrigin(String),

    #[error("Device index {0} is out of range")]
    DeviceIndexOutOfRange(String),

    #[error("Scale factor must be a positive finite number, got {0}")]
    InvalidScale(f64),

    #[error("Cannot open camera device {0}: {1}")]
    CameraOpenError(u32, String),

    #[error("Cannot open video file {0:?}: {1}")]
    VideoOpenError(PathBuf, String),

    #[error("Error listing directory {0:?}: {1}")]
    DirectoryListError(PathBuf, std::io::Error),

    #[error("Error capturing camera image: {0}")]
    CameraCaptureError(std::io::Error),

    #[cfg(feature = "v4l2")]
    #[error("Error starting camera: {0}")]
    CamStartError(rscam::Error),

    #[cfg(feature = "opencv")]
    #[error("OpenCV error: {0}")]
    OpencvError(opencv::Error),

    #[error("Capture handle does not support seeking")]
    SeekUnsupported,

    #[error("Error occured while converting an image: {0}")]
    ImageConversionError(image::ImageError)
}

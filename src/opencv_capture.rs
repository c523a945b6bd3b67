//! # OpenCV Capture Backend
//!
//! Camera and video file capture through OpenCV's `videoio` module. Frames are converted from
//! OpenCV's BGR layout into `image::DynamicImage::ImageRgb8`.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::path::Path;

use image::{DynamicImage, RgbImage};
use log::{debug, warn};
use opencv::core::Mat;
use opencv::imgproc;
use opencv::prelude::*;
use opencv::videoio::{self, VideoCapture};

use crate::capture::{Backend, Capture};
use crate::error::{Error, Result};

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// Opens cameras and video files with OpenCV.
#[derive(Clone, Copy, Debug)]
pub struct OpencvBackend {
    api_preference: i32
}

struct OpencvCapture {
    cap: VideoCapture,

    frame: Mat,
    rgb: Mat
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl Default for OpencvBackend {
    fn default() -> Self {
        Self {
            api_preference: videoio::CAP_ANY
        }
    }
}

impl OpencvBackend {
    /// Use a specific `videoio` API, e.g. `videoio::CAP_V4L2` or `videoio::CAP_FFMPEG`.
    pub fn with_api_preference(api_preference: i32) -> Self {
        Self { api_preference }
    }
}

impl Backend for OpencvBackend {
    fn open_camera(&self, index: u32) -> Result<Box<dyn Capture>> {
        let cap = VideoCapture::new(index as i32, self.api_preference)
            .map_err(|e| Error::CameraOpenError(index, format!("{}", e)))?;

        if !cap.is_opened().map_err(Error::OpencvError)? {
            return Err(Error::CameraOpenError(index, String::from("device did not open")));
        }

        debug!("Opened camera {} with OpenCV", index);

        Ok(Box::new(OpencvCapture::new(cap)))
    }

    fn open_video(&self, path: &Path) -> Result<Box<dyn Capture>> {
        let filename = path.to_str().ok_or_else(|| Error::VideoOpenError(
            path.to_path_buf(),
            String::from("path is not valid UTF-8")
        ))?;

        let cap = VideoCapture::from_file(filename, self.api_preference)
            .map_err(|e| Error::VideoOpenError(path.to_path_buf(), format!("{}", e)))?;

        if !cap.is_opened().map_err(Error::OpencvError)? {
            return Err(Error::VideoOpenError(
                path.to_path_buf(),
                String::from("decoder did not open")
            ));
        }

        debug!("Opened video {:?} with OpenCV", path);

        Ok(Box::new(OpencvCapture::new(cap)))
    }
}

impl OpencvCapture {
    fn new(cap: VideoCapture) -> Self {
        Self {
            cap,
            frame: Mat::default(),
            rgb: Mat::default()
        }
    }

    fn prop(&self, prop_id: i32) -> Option<f64> {
        match self.cap.get(prop_id) {
            Ok(v) if v.is_finite() && v > 0.0 => Some(v),
            _ => None
        }
    }
}

impl Capture for OpencvCapture {
    fn read(&mut self) -> Result<Option<DynamicImage>> {
        if !self.cap.read(&mut self.frame).map_err(Error::OpencvError)? || self.frame.empty() {
            return Ok(None);
        }

        imgproc::cvt_color(&self.frame, &mut self.rgb, imgproc::COLOR_BGR2RGB, 0)
            .map_err(Error::OpencvError)?;

        mat_to_dynamic_image(&self.rgb).map(Some)
    }

    fn seek(&mut self, position: u64) -> Result<()> {
        let moved = self.cap.set(videoio::CAP_PROP_POS_FRAMES, position as f64)
            .map_err(Error::OpencvError)?;

        if moved {
            Ok(())
        }
        else {
            Err(Error::SeekUnsupported)
        }
    }

    fn fps(&self) -> Option<f64> {
        self.prop(videoio::CAP_PROP_FPS)
    }

    fn frame_count(&self) -> Option<u64> {
        self.prop(videoio::CAP_PROP_FRAME_COUNT).map(|n| n as u64)
    }

    fn frame_size(&self) -> Option<(u32, u32)> {
        let width = self.prop(videoio::CAP_PROP_FRAME_WIDTH)?;
        let height = self.prop(videoio::CAP_PROP_FRAME_HEIGHT)?;

        Some((width as u32, height as u32))
    }

    fn release(&mut self) {
        if let Err(e) = self.cap.release() {
            warn!("Error releasing OpenCV capture: {}", e);
        }
    }
}

// -----------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Copy a continuous 8-bit, 3 channel RGB `Mat` into an `image::DynamicImage`.
fn mat_to_dynamic_image(mat: &Mat) -> Result<DynamicImage> {
    let cols = mat.cols() as u32;
    let rows = mat.rows() as u32;

    let bytes = if mat.is_continuous() {
        mat.data_bytes().map_err(Error::OpencvError)?.to_vec()
    }
    else {
        let owned = mat.try_clone().map_err(Error::OpencvError)?;
        owned.data_bytes().map_err(Error::OpencvError)?.to_vec()
    };

    RgbImage::from_raw(cols, rows, bytes)
        .map(DynamicImage::ImageRgb8)
        .ok_or_else(|| Error::ImageConversionError(image::ImageError::Parameter(
            image::error::ParameterError::from_kind(
                image::error::ParameterErrorKind::DimensionMismatch
            )
        )))
}

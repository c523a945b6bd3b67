//! # `ImageSourceBuilder` implementation
//!
//! This module implements the builder for image source objects.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::path::Path;

use serde_any;

use crate::capture::{default_backend, Backend};
use crate::config::SourceConfig;
use crate::error::{Error, Result};
use crate::origin::Origin;
use crate::source::ImageSource;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// Builder for `ImageSource`.
///
/// ```no_run
/// use cv_imgsource::prelude::*;
///
/// let source = ImageSourceBuilder::new("captures/")
///     .extensions(&["jpg", "png"])
///     .frame_skip(1)
///     .scale(0.5)
///     .build()
///     .expect("Cannot open image source");
///
/// for frame in source {
///     if let Some(img) = frame.image {
///         println!("{}: {:?}", frame.position, img.color());
///     }
/// }
/// ```
pub struct ImageSourceBuilder {
    origin: Origin,

    config: SourceConfig,

    backend: Option<Box<dyn Backend>>
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl ImageSourceBuilder {
    /// Start building a source for `origin`.
    ///
    /// The origin can be a device index (`0`, `"0"`), a path to a video file, or a path to a
    /// directory of images. It is only checked when `build` is called.
    pub fn new<O: Into<Origin>>(origin: O) -> Self {
        Self {
            origin: origin.into(),
            config: SourceConfig::default(),
            backend: None
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: SourceConfig) -> Self {
        self.config = config;

        self
    }

    /// Load the configuration from a file.
    ///
    /// The file type will be guessed at runtime, any file type supported by
    /// [`serde_any`](https://docs.rs/serde_any/0.5.0/serde_any/) is supported.
    pub fn config_from_file<P: AsRef<Path>>(self, path: P) -> Result<Self> {
        if !path.as_ref().exists() {
            return Err(Error::FileNotFound(path.as_ref().to_path_buf()));
        }

        let config = serde_any::from_file(path)
            .map_err(Error::DeserialisationError)?;

        Ok(self.config(config))
    }

    /// Set the number of frames discarded between two produced frames.
    ///
    /// Default value is 0.
    pub fn frame_skip(mut self, frame_skip: u32) -> Self {
        self.config.frame_skip = frame_skip;

        self
    }

    /// Set the scale factor applied to every produced image.
    ///
    /// Default value is 1, which leaves images untouched.
    pub fn scale(mut self, scale: f64) -> Self {
        self.config.scale = scale;

        self
    }

    /// Set the single extension of files read from an image directory.
    ///
    /// Default value is `"jpg"`.
    pub fn extension(self, extension: &str) -> Self {
        self.extensions(&[extension])
    }

    /// Set the extensions of files read from an image directory.
    pub fn extensions<S: AsRef<str>>(mut self, extensions: &[S]) -> Self {
        self.config.extensions = extensions.iter().map(|e| e.as_ref().to_string()).collect();

        self
    }

    /// Set the maximum number of camera warm-up reads.
    ///
    /// `0` disables warm-up, negative values use the automatic limit. Default value is `-1`.
    pub fn warmup(mut self, attempts: i32) -> Self {
        self.config.warmup = attempts;

        self
    }

    /// Set the number of consecutive non-blank frames which ends camera warm-up.
    ///
    /// Default value is 5.
    pub fn warmup_stable(mut self, frames: u32) -> Self {
        self.config.warmup_stable = frames;

        self
    }

    /// Set whether the device is released as soon as the source is exhausted.
    ///
    /// Default value is `true`.
    pub fn auto_release(mut self, auto_release: bool) -> Self {
        self.config.auto_release = auto_release;

        self
    }

    /// Use a specific capture backend instead of `capture::default_backend()`.
    pub fn backend<B: Backend + 'static>(mut self, backend: B) -> Self {
        self.backend = Some(Box::new(backend));

        self
    }

    /// Build the image source.
    ///
    /// This fails only if the configuration is invalid or the origin cannot be classified.
    /// A device, video or directory which cannot be opened is logged as a warning and gives a
    /// source which is not available.
    pub fn build(self) -> Result<ImageSource> {
        let settings = self.config.validate()?;
        let backend = self.backend.unwrap_or_else(default_backend);

        ImageSource::open(self.origin, settings, backend)
    }
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

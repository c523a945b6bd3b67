//! # Image source iterator for use in the CV system
//!
//! This crate provides a single way to pull a sequence of images out of a camera, a video file,
//! or a directory of still images, with optional frame skipping and rescaling applied to all of
//! them.
//!
//! ## Backends
//!
//! Directories of images are read with the [`image`](https://docs.rs/image/0.23.6/image/) crate
//! and always work. Cameras and video files need a capture backend, selected with features:
//!
//! - `opencv` - cameras and video files through OpenCV's `videoio`, requires OpenCV and its dev
//!   headers
//! - `v4l2` - cameras only, through [`rscam`](https://github.com/loyd/rscam), Linux only
//!
//! ### Ubuntu
//!
//! ```shell
//! sudo apt install v4l-utils libv4l-dev libopencv-dev clang libclang-dev
//! ```
//!
//! Without either feature, cameras and videos resolve but never open, and the resulting source
//! is not available.
//!
//! ## Usage
//!
//! ```no_run
//! use cv_imgsource::prelude::*;
//!
//! let mut source = ImageSourceBuilder::new(0u32)
//!     // Discard every other frame
//!     .frame_skip(1)
//!     // Halve the images
//!     .scale(0.5)
//!     // Try up to 10 reads for the camera to settle
//!     .warmup(10)
//!     .build()
//!     .expect("Cannot resolve the origin");
//!
//! while let Some(frame) = source.next() {
//!     match frame.image {
//!         Some(img) => { /* process */ },
//!         None => continue
//!     }
//!
//!     std::thread::sleep(source.frame_delay());
//! }
//! ```
//!
//! Origins that cannot be opened, empty directories and camera read failures are reported
//! through the [`log`](https://docs.rs/log) facade rather than as errors.

// -----------------------------------------------------------------------------------------------
// EXPORTS
// -----------------------------------------------------------------------------------------------

pub use builder::ImageSourceBuilder;
pub use capture::{default_backend, Backend, Capture, NullBackend};
pub use config::{SourceConfig, AUTO_WARMUP_ATTEMPTS};
pub use directory::IMAGE_EXTENSIONS;
pub use error::{Error, Result};
pub use origin::{Origin, SourceKind};
pub use source::{Frame, FrameCount, ImageSource, DEFAULT_FRAME_DELAY_MS};

#[cfg(feature = "opencv")]
pub use opencv_capture::OpencvBackend;
#[cfg(feature = "v4l2")]
pub use v4l2::V4l2Backend;

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

mod builder;
mod capture;
mod config;
mod directory;
mod error;
#[cfg(feature = "opencv")]
mod opencv_capture;
mod origin;
mod scale;
mod source;
#[cfg(feature = "v4l2")]
mod v4l2;

/// Commonly used types.
pub mod prelude {
    pub use crate::{ImageSourceBuilder, SourceConfig};
    pub use crate::{Frame, FrameCount, ImageSource, Origin, SourceKind};
    pub use crate::{Backend, Capture};
}

//! # Origin Resolution Module
//!
//! Classifies a user supplied origin (device index, video path, or image directory) into the
//! mode an `ImageSource` will run in.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

// -----------------------------------------------------------------------------------------------
// ENUMERATIONS
// -----------------------------------------------------------------------------------------------

/// Where a stream of images comes from, as given by the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Origin {
    /// A numbered capture device, e.g. `0` for the first camera
    Device(u32),

    /// A path which may point at a video file or at a directory of images
    Path(PathBuf)
}

/// The mode an origin resolved to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceKind {
    /// Live camera device, unbounded
    Camera,

    /// Decoded video file
    VideoFile,

    /// Directory of still images
    ImageDirectory
}

/// An origin which has been checked against the filesystem.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Resolved {
    Camera(u32),
    VideoFile(PathBuf),
    ImageDirectory(PathBuf)
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl Origin {
    /// Resolve the origin into a concrete mode.
    ///
    /// Device indices always resolve to a camera. Paths resolve to a video if they point at a
    /// regular file and to an image directory if they point at a directory, anything else is a
    /// configuration error.
    pub(crate) fn resolve(&self) -> Result<Resolved> {
        match self {
            Origin::Device(index) => Ok(Resolved::Camera(*index)),
            Origin::Path(path) => {
                // A digit string only ends up here if it overflowed the index type
                if let Some(digits) = path.to_str().filter(|s| is_digit_string(s)) {
                    return Err(Error::DeviceIndexOutOfRange(digits.to_string()));
                }

                if path.is_file() {
                    Ok(Resolved::VideoFile(path.clone()))
                }
                else if path.is_dir() {
                    Ok(Resolved::ImageDirectory(path.clone()))
                }
                else {
                    Err(Error::UnresolvedOrigin(path.display().to_string()))
                }
            }
        }
    }
}

impl Resolved {
    pub(crate) fn kind(&self) -> SourceKind {
        match self {
            Resolved::Camera(_) => SourceKind::Camera,
            Resolved::VideoFile(_) => SourceKind::VideoFile,
            Resolved::ImageDirectory(_) => SourceKind::ImageDirectory
        }
    }
}

impl From<u32> for Origin {
    fn from(index: u32) -> Self {
        Origin::Device(index)
    }
}

/// Strings made only of decimal digits are device indices, everything else is a path.
impl From<&str> for Origin {
    fn from(s: &str) -> Self {
        match parse_device_index(s) {
            Some(index) => Origin::Device(index),
            None => Origin::Path(PathBuf::from(s))
        }
    }
}

impl From<String> for Origin {
    fn from(s: String) -> Self {
        Origin::from(s.as_str())
    }
}

impl From<PathBuf> for Origin {
    fn from(path: PathBuf) -> Self {
        Origin::Path(path)
    }
}

impl From<&Path> for Origin {
    fn from(path: &Path) -> Self {
        Origin::Path(path.to_path_buf())
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Device(index) => write!(f, "camera {}", index),
            Origin::Path(path) => write!(f, "{}", path.display())
        }
    }
}

// -----------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// -----------------------------------------------------------------------------------------------

fn is_digit_string(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn parse_device_index(s: &str) -> Option<u32> {
    if !is_digit_string(s) {
        return None;
    }

    s.parse().ok()
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

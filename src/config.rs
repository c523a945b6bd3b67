//! # Source Configuration Module
//!
//! Parameters controlling how an `ImageSource` reads its origin. These can be given in code
//! through the builder or loaded from a file.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use serde::Deserialize;

use crate::error::Result;
use crate::scale::Rescale;

// -----------------------------------------------------------------------------------------------
// CONSTANTS
// -----------------------------------------------------------------------------------------------

/// Number of warm-up reads used when the configured warm-up is negative.
pub const AUTO_WARMUP_ATTEMPTS: u32 = 1000;

// -----------------------------------------------------------------------------------------------
// DATA STRUCTURES
// -----------------------------------------------------------------------------------------------

/// Configuration of an image source.
///
/// Missing fields take their default values, so a file only needs to list what it changes:
///
/// ```toml
/// frame_skip = 4
/// scale = 0.5
/// extensions = ["jpg", "png"]
/// ```
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct SourceConfig {
    /// Number of frames discarded between two produced frames
    pub frame_skip: u32,

    /// Scale factor applied to every produced image, must be positive
    pub scale: f64,

    /// Extensions of the files read from an image directory, with or without the leading dot
    pub extensions: Vec<String>,

    /// Maximum number of throwaway camera reads before iteration starts.
    ///
    /// `0` disables warm-up, a negative value uses `AUTO_WARMUP_ATTEMPTS`.
    pub warmup: i32,

    /// Number of consecutive non-blank camera frames after which warm-up stops early
    pub warmup_stable: u32,

    /// Release the device as soon as the source is exhausted
    pub auto_release: bool
}

/// Validated form of `SourceConfig` used by the source itself.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Settings {
    pub frame_skip: u64,
    pub rescale: Rescale,
    pub extensions: Vec<String>,
    pub warmup_attempts: u32,
    pub warmup_stable: u32,
    pub auto_release: bool
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            frame_skip: 0,
            scale: 1.0,
            extensions: vec![String::from("jpg")],
            warmup: -1,
            warmup_stable: 5,
            auto_release: true
        }
    }
}

impl SourceConfig {
    pub(crate) fn validate(&self) -> Result<Settings> {
        let warmup_attempts = if self.warmup < 0 {
            AUTO_WARMUP_ATTEMPTS
        }
        else {
            self.warmup as u32
        };

        Ok(Settings {
            frame_skip: self.frame_skip as u64,
            rescale: Rescale::new(self.scale)?,
            extensions: self.extensions.clone(),
            warmup_attempts,
            warmup_stable: self.warmup_stable.max(1),
            auto_release: self.auto_release
        })
    }
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {

    use super::*;
    use crate::error::Error;

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("source.toml");
        std::fs::write(&path, "frame_skip = 4\nscale = 0.5\n").unwrap();

        let config: SourceConfig = serde_any::from_file(&path).unwrap();

        assert_eq!(config.frame_skip, 4);
        assert_eq!(config.scale, 0.5);
        assert_eq!(config.extensions, vec![String::from("jpg")]);
        assert!(config.auto_release);
    }

    #[test]
    fn test_warmup_values() {
        let auto = SourceConfig::default().validate().unwrap();
        assert_eq!(auto.warmup_attempts, AUTO_WARMUP_ATTEMPTS);

        let off = SourceConfig { warmup: 0, ..SourceConfig::default() }.validate().unwrap();
        assert_eq!(off.warmup_attempts, 0);

        let ten = SourceConfig { warmup: 10, ..SourceConfig::default() }.validate().unwrap();
        assert_eq!(ten.warmup_attempts, 10);
    }

    #[test]
    fn test_rejects_bad_scale() {
        match (SourceConfig { scale: 0.0, ..SourceConfig::default() }).validate() {
            Err(Error::InvalidScale(_)) => (),
            other => panic!("Expected an invalid scale error, got {:?}", other)
        }
    }
}

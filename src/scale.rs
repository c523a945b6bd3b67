//! # Image Rescaling Module
//!
//! The resize step applied to every image an `ImageSource` produces. The interpolation is
//! chosen once from the scale factor: cubic when upsampling, area averaging when downsampling.

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use image::{imageops::FilterType, DynamicImage, GenericImageView};

use crate::error::{Error, Result};

// -----------------------------------------------------------------------------------------------
// ENUMERATIONS
// -----------------------------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Rescale {
    Identity,
    Upsample(f64),
    Downsample(f64)
}

// -----------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// -----------------------------------------------------------------------------------------------

impl Rescale {
    /// Select the resize step for the given scale factor.
    pub(crate) fn new(factor: f64) -> Result<Self> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(Error::InvalidScale(factor));
        }

        if factor > 1.0 {
            Ok(Rescale::Upsample(factor))
        }
        else if factor < 1.0 {
            Ok(Rescale::Downsample(factor))
        }
        else {
            Ok(Rescale::Identity)
        }
    }

    pub(crate) fn factor(&self) -> f64 {
        match *self {
            Rescale::Identity => 1.0,
            Rescale::Upsample(f) | Rescale::Downsample(f) => f
        }
    }

    /// The size an image of `(width, height)` will have after this step, or `None` if a side
    /// would not fit in a `u32`.
    pub(crate) fn output_size(&self, (width, height): (u32, u32)) -> Option<(u32, u32)> {
        match *self {
            Rescale::Identity => Some((width, height)),
            Rescale::Upsample(f) | Rescale::Downsample(f) => {
                Some((scale_dim(width, f)?, scale_dim(height, f)?))
            }
        }
    }

    /// Resize `img`. `None` when the output size is out of range, nothing is allocated then.
    pub(crate) fn apply(&self, img: DynamicImage) -> Option<DynamicImage> {
        let (width, height) = self.output_size(img.dimensions())?;

        Some(match self {
            Rescale::Identity => img,
            Rescale::Upsample(_) => img.resize_exact(width, height, FilterType::CatmullRom),
            // thumbnail_exact averages every source pixel into the target pixel it covers
            Rescale::Downsample(_) => img.thumbnail_exact(width, height)
        })
    }
}

// -----------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// -----------------------------------------------------------------------------------------------

fn scale_dim(dim: u32, factor: f64) -> Option<u32> {
    let scaled = (dim as f64 * factor).round();

    if scaled > u32::MAX as f64 {
        return None;
    }

    Some((scaled as u32).max(1))
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

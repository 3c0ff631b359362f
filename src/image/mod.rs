//! image — pixel buffers and resampling.
//!
//! [`ImageData`] stores an image as equally shaped `ndarray` channel planes;
//! [`InterpolationMode`] selects how images are resampled between grids.
//! Observations are aligned on the high-resolution grid with
//! `InterpolationMode::Nearest`.

pub mod image_data;
pub mod interpolation;

pub use image_data::{ImageData, ImageSize};
pub use interpolation::InterpolationMode;

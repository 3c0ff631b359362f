//! image::image_data — multi-channel pixel buffers on a fixed grid.
//!
//! Purpose
//! -------
//! Hold one image as a list of equally shaped `f64` channel planes and provide
//! the handful of operations the MAP solver needs: resizing onto the
//! high-resolution grid, channel extraction, and conversion to and from the
//! flat parameter vector that argmin optimizes.
//!
//! Invariants
//! ----------
//! - At least one channel.
//! - Every channel is `height × width` (rows × cols) with `width, height > 0`.
//!
//! Conventions
//! -----------
//! - Planes are indexed `[[row, col]]`.
//! - [`ImageData::to_theta`] flattens channel-major, then row-major:
//!   `index = c·H·W + r·W + col`.
use crate::{
    image::interpolation::InterpolationMode,
    optimization::{
        errors::{SolverError, SolverResult},
        types::Theta,
    },
};
use ndarray::{s, Array1, Array2};
use std::fmt;

/// Width and height of an image in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageSize {
    pub width: usize,
    pub height: usize,
}

impl ImageSize {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// `width × height`, or `None` on overflow.
    pub fn num_pixels(&self) -> Option<usize> {
        self.width.checked_mul(self.height)
    }

    /// Size multiplied by an integer scale on both axes.
    ///
    /// # Errors
    /// [`SolverError::DimensionOverflow`] if either product overflows.
    pub fn scaled(&self, scale: usize) -> SolverResult<Self> {
        let width = self
            .width
            .checked_mul(scale)
            .ok_or(SolverError::DimensionOverflow { dimension: self.width, scale })?;
        let height = self
            .height
            .checked_mul(scale)
            .ok_or(SolverError::DimensionOverflow { dimension: self.height, scale })?;
        Ok(Self { width, height })
    }

    fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A multi-channel image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageData {
    channels: Vec<Array2<f64>>,
}

impl ImageData {
    /// Build an image from its channel planes.
    ///
    /// # Errors
    /// - [`SolverError::NoChannels`] for an empty list.
    /// - [`SolverError::InvalidImageSize`] if the planes are empty.
    /// - [`SolverError::ChannelShapeMismatch`] if a plane differs from the
    ///   first one.
    pub fn new(channels: Vec<Array2<f64>>) -> SolverResult<Self> {
        let first = channels.first().ok_or(SolverError::NoChannels)?;
        let expected = first.dim();
        if expected.0 == 0 || expected.1 == 0 {
            return Err(SolverError::InvalidImageSize { width: expected.1, height: expected.0 });
        }
        for (channel, plane) in channels.iter().enumerate().skip(1) {
            if plane.dim() != expected {
                return Err(SolverError::ChannelShapeMismatch {
                    channel,
                    expected,
                    found: plane.dim(),
                });
            }
        }
        Ok(Self { channels })
    }

    /// All-zero image.
    ///
    /// # Errors
    /// [`SolverError::NoChannels`] or [`SolverError::InvalidImageSize`].
    pub fn zeros(size: ImageSize, num_channels: usize) -> SolverResult<Self> {
        Self::new(vec![Array2::zeros(size.shape()); num_channels])
    }

    /// Image whose channels are all `value`.
    ///
    /// # Errors
    /// Same as [`ImageData::zeros`].
    pub fn filled(size: ImageSize, num_channels: usize, value: f64) -> SolverResult<Self> {
        Self::new(vec![Array2::from_elem(size.shape(), value); num_channels])
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    pub fn image_size(&self) -> ImageSize {
        let (height, width) = self.channels[0].dim();
        ImageSize { width, height }
    }

    pub fn channels(&self) -> &[Array2<f64>] {
        &self.channels
    }

    /// Borrow one channel plane.
    ///
    /// # Errors
    /// [`SolverError::ChannelOutOfRange`].
    pub fn channel(&self, channel: usize) -> SolverResult<&Array2<f64>> {
        self.channels.get(channel).ok_or(SolverError::ChannelOutOfRange {
            channel,
            num_channels: self.channels.len(),
        })
    }

    /// Single-channel copy of one channel.
    ///
    /// # Errors
    /// [`SolverError::ChannelOutOfRange`].
    pub fn channel_subset(&self, channel: usize) -> SolverResult<ImageData> {
        Ok(ImageData { channels: vec![self.channel(channel)?.clone()] })
    }

    /// Resample every channel onto `size` in place.
    ///
    /// # Errors
    /// [`SolverError::InvalidImageSize`] for a zero width or height.
    pub fn resize(&mut self, size: ImageSize, mode: InterpolationMode) -> SolverResult<()> {
        *self = self.resized(size, mode)?;
        Ok(())
    }

    /// Resampled copy; `self` is left untouched.
    ///
    /// # Errors
    /// [`SolverError::InvalidImageSize`] for a zero width or height.
    pub fn resized(&self, size: ImageSize, mode: InterpolationMode) -> SolverResult<ImageData> {
        if size.width == 0 || size.height == 0 {
            return Err(SolverError::InvalidImageSize { width: size.width, height: size.height });
        }
        if size == self.image_size() {
            return Ok(self.clone());
        }
        let channels = self.channels.iter().map(|plane| mode.resample(plane, size)).collect();
        Ok(ImageData { channels })
    }

    /// Flatten into the optimizer's parameter layout.
    pub fn to_theta(&self) -> Theta {
        self.channels.iter().flat_map(|plane| plane.iter().copied()).collect::<Array1<f64>>()
    }

    /// Rebuild an image from a flat parameter vector.
    ///
    /// # Errors
    /// - [`SolverError::ThetaLengthMismatch`] if `theta` does not hold exactly
    ///   `num_channels × width × height` values.
    /// - Any error from [`ImageData::new`].
    pub fn from_theta(theta: &Theta, size: ImageSize, num_channels: usize) -> SolverResult<Self> {
        let plane_len = size.num_pixels().ok_or(SolverError::DataPointOverflow {
            width: size.width,
            height: size.height,
            channels: num_channels,
        })?;
        let expected = plane_len.checked_mul(num_channels).ok_or(SolverError::DataPointOverflow {
            width: size.width,
            height: size.height,
            channels: num_channels,
        })?;
        if theta.len() != expected {
            return Err(SolverError::ThetaLengthMismatch { expected, found: theta.len() });
        }
        let channels = (0..num_channels)
            .map(|c| {
                let slice = theta.slice(s![c * plane_len..(c + 1) * plane_len]);
                Array2::from_shape_fn(size.shape(), |(r, col)| slice[r * size.width + col])
            })
            .collect();
        Self::new(channels)
    }
}

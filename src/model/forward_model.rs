//! model::forward_model — image-formation operators on the high-resolution grid.
//!
//! Purpose
//! -------
//! Describe how a high-resolution estimate produces each observation. The
//! solver compares `F_k(x)` against observation `y_k` on the high-resolution
//! grid (observations are upsampled first), so every operator here maps an
//! HR image to an HR image of the same size.
//!
//! Key behaviors
//! -------------
//! - [`ForwardModel::downsampling_scale`] fixes the HR size as
//!   `scale × low-res size`.
//! - [`ForwardModel::apply`] and [`ForwardModel::apply_transpose`] provide the
//!   operator and its adjoint, which the analytic data-term gradient needs.
//!
//! Invariants
//! ----------
//! - `downsampling_scale() >= 1`.
//! - `apply_transpose` is the exact adjoint of `apply`:
//!   `⟨F x, y⟩ = ⟨x, Fᵀ y⟩` for all `x`, `y` of the HR shape.
use crate::{
    image::{ImageData, ImageSize},
    optimization::errors::{SolverError, SolverResult},
};
use ndarray::Array2;

/// Image-formation model shared by all observations of one solve.
///
/// `index` identifies the observation (input order), so a model may apply a
/// different operator per observation.
pub trait ForwardModel {
    fn downsampling_scale(&self) -> usize;

    /// `F_index(estimate)` on the high-resolution grid.
    fn apply(&self, estimate: &ImageData, index: usize) -> SolverResult<ImageData>;

    /// `F_indexᵀ(residual)` on the high-resolution grid.
    fn apply_transpose(&self, residual: &ImageData, index: usize) -> SolverResult<ImageData>;
}

/// Plain decimation by an integer factor, expressed on the HR grid.
///
/// Keeps the scale-aligned sample of every `s×s` block and spreads it over
/// the block (decimate, then nearest-neighbor upsample).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecimationModel {
    scale: usize,
    num_observations: Option<usize>,
}

impl DecimationModel {
    /// # Errors
    /// [`SolverError::InvalidScale`] if `scale == 0`.
    pub fn new(scale: usize) -> SolverResult<Self> {
        if scale == 0 {
            return Err(SolverError::InvalidScale { scale });
        }
        Ok(Self { scale, num_observations: None })
    }

    /// Restrict the model to observation indices `0..num_observations`.
    pub fn with_num_observations(mut self, num_observations: usize) -> Self {
        self.num_observations = Some(num_observations);
        self
    }

    fn check(&self, image: &ImageData, index: usize) -> SolverResult<ImageSize> {
        if let Some(num_observations) = self.num_observations {
            if index >= num_observations {
                return Err(SolverError::ObservationOutOfRange { index, num_observations });
            }
        }
        let size = image.image_size();
        if size.width % self.scale != 0 || size.height % self.scale != 0 {
            return Err(SolverError::IncompatibleImageSize {
                width: size.width,
                height: size.height,
                scale: self.scale,
            });
        }
        Ok(size)
    }
}

impl ForwardModel for DecimationModel {
    fn downsampling_scale(&self) -> usize {
        self.scale
    }

    fn apply(&self, estimate: &ImageData, index: usize) -> SolverResult<ImageData> {
        let size = self.check(estimate, index)?;
        let s = self.scale;
        let channels = estimate
            .channels()
            .iter()
            .map(|plane| {
                Array2::from_shape_fn((size.height, size.width), |(r, c)| {
                    plane[[(r / s) * s, (c / s) * s]]
                })
            })
            .collect();
        ImageData::new(channels)
    }

    fn apply_transpose(&self, residual: &ImageData, index: usize) -> SolverResult<ImageData> {
        let size = self.check(residual, index)?;
        let s = self.scale;
        let channels = residual
            .channels()
            .iter()
            .map(|plane| {
                let mut out = Array2::zeros((size.height, size.width));
                for ((r, c), &v) in plane.indexed_iter() {
                    out[[(r / s) * s, (c / s) * s]] += v;
                }
                out
            })
            .collect();
        ImageData::new(channels)
    }
}

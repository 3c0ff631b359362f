//! Regularizer capability shared by every prior term.
//!
//! - [`Regularizer`]: trait concrete prior terms implement.
//! - [`EstimateShape`]: layout of the flat estimate a term is evaluated on.
//!
//! Convention: terms receive the flat [`Theta`] (channel-major, row-major)
//! together with its [`EstimateShape`], and return an unweighted cost. The
//! owning [`RegularizationSet`](crate::regularization::RegularizationSet)
//! applies the weights.
use crate::{
    image::ImageSize,
    optimization::{
        errors::{SolverError, SolverResult},
        types::{Grad, Theta},
    },
};

/// Size and channel count of the estimate a regularizer sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EstimateShape {
    pub size: ImageSize,
    pub num_channels: usize,
}

impl EstimateShape {
    pub fn new(size: ImageSize, num_channels: usize) -> Self {
        Self { size, num_channels }
    }

    /// Pixels per channel.
    pub fn plane_len(&self) -> usize {
        self.size.width * self.size.height
    }

    /// Expected length of a flat estimate.
    pub fn len(&self) -> usize {
        self.plane_len() * self.num_channels
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flat index of `(channel, row, col)`.
    pub fn index(&self, channel: usize, row: usize, col: usize) -> usize {
        channel * self.plane_len() + row * self.size.width + col
    }

    /// # Errors
    /// [`SolverError::ThetaLengthMismatch`] if `estimate` has the wrong length.
    pub fn check(&self, estimate: &Theta) -> SolverResult<()> {
        if estimate.len() != self.len() {
            return Err(SolverError::ThetaLengthMismatch {
                expected: self.len(),
                found: estimate.len(),
            });
        }
        Ok(())
    }
}

/// Prior term `R(x)` added to the MAP objective.
///
/// Required:
/// - `name() -> &str`: label used in logs.
/// - `cost(&Theta, EstimateShape) -> SolverResult<f64>`: evaluate `R(x)`.
///
/// Optional:
/// - `gradient(&Theta, EstimateShape) -> SolverResult<Grad>`: analytic
///   `∇R(x)`. When left unimplemented the set falls back to finite
///   differences of `cost`.
///
/// Terms are shared through `Arc` and must be `Send + Sync`.
pub trait Regularizer: Send + Sync {
    fn name(&self) -> &str;

    fn cost(&self, estimate: &Theta, shape: EstimateShape) -> SolverResult<f64>;

    fn gradient(&self, _estimate: &Theta, _shape: EstimateShape) -> SolverResult<Grad> {
        Err(SolverError::GradientNotImplemented)
    }
}

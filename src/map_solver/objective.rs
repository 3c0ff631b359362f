//! Argmin adapter for the MAP objective.
//!
//! `c(x) = Σ_k ‖F_k(x) − y_k‖² + Σ_r w_r·R_r(x)`
//!
//! with observations `y_k` already resampled onto the high-resolution grid.
//! The analytic gradient is `Σ_k 2·F_kᵀ(F_k(x) − y_k) + Σ_r w_r·∇R_r(x)`;
//! in numerical mode the whole of `c` is differenced with the configured
//! step instead.
use crate::{
    image::{ImageData, ImageSize},
    model::ForwardModel,
    optimization::{
        errors::{SolverError, SolverResult},
        finite_diff::stepped_central_gradient,
        options::Differentiation,
        types::{Cost, Grad, Theta},
        validation::{validate_cost, validate_grad},
    },
    regularization::{EstimateShape, RegularizationSet},
};
use argmin::core::{CostFunction, Error, Gradient};

pub struct MapObjective<'a, M: ForwardModel + ?Sized> {
    model: &'a M,
    targets: Vec<Theta>,
    regularizers: &'a RegularizationSet,
    shape: EstimateShape,
    differentiation: Differentiation,
}

impl<'a, M: ForwardModel + ?Sized> MapObjective<'a, M> {
    /// Objective over every channel of `observations`.
    ///
    /// # Errors
    /// [`SolverError::EstimateShapeMismatch`] if an observation does not have
    /// `shape`.
    pub fn new(
        model: &'a M, observations: &[ImageData], regularizers: &'a RegularizationSet,
        shape: EstimateShape, differentiation: Differentiation,
    ) -> SolverResult<Self> {
        let targets = observations
            .iter()
            .map(|obs| {
                check_shape(obs, shape)?;
                Ok(obs.to_theta())
            })
            .collect::<SolverResult<Vec<_>>>()?;
        Ok(Self { model, targets, regularizers, shape, differentiation })
    }

    /// Objective restricted to one channel of `observations`.
    ///
    /// # Errors
    /// [`SolverError::ChannelOutOfRange`] or
    /// [`SolverError::EstimateShapeMismatch`].
    pub fn for_channel(
        model: &'a M, observations: &[ImageData], channel: usize,
        regularizers: &'a RegularizationSet, size: ImageSize,
        differentiation: Differentiation,
    ) -> SolverResult<Self> {
        let subsets = observations
            .iter()
            .map(|obs| obs.channel_subset(channel))
            .collect::<SolverResult<Vec<_>>>()?;
        Self::new(model, &subsets, regularizers, EstimateShape::new(size, 1), differentiation)
    }

    pub fn shape(&self) -> EstimateShape {
        self.shape
    }

    /// Evaluate `c(x)`.
    ///
    /// # Errors
    /// Length mismatches, forward-model and regularizer errors, and
    /// [`SolverError::NonFiniteCost`].
    pub fn total_cost(&self, theta: &Theta) -> SolverResult<Cost> {
        let mut total = 0.0;
        for (_, residual) in self.residuals(theta)? {
            total += residual.dot(&residual);
        }
        total += self.regularizers.weighted_cost(theta, self.shape)?;
        validate_cost(total)?;
        Ok(total)
    }

    /// Analytic `∇c(x)`.
    ///
    /// # Errors
    /// Same as [`MapObjective::total_cost`], plus gradient validation.
    pub fn analytic_gradient(&self, theta: &Theta) -> SolverResult<Grad> {
        let mut grad = self.regularizers.weighted_gradient(theta, self.shape)?;
        for (k, residual) in self.residuals(theta)? {
            let residual = self.to_image(&residual)?;
            let back = self.model.apply_transpose(&residual, k)?;
            check_shape(&back, self.shape)?;
            grad.scaled_add(2.0, &back.to_theta());
        }
        validate_grad(&grad, theta.len())?;
        Ok(grad)
    }

    /// `∇c(x)` according to the configured differentiation mode.
    ///
    /// # Errors
    /// See [`MapObjective::analytic_gradient`] and
    /// [`stepped_central_gradient`].
    pub fn gradient_of(&self, theta: &Theta) -> SolverResult<Grad> {
        match self.differentiation {
            Differentiation::Analytical => self.analytic_gradient(theta),
            Differentiation::Numerical { step } => {
                stepped_central_gradient(theta, step, |x| self.total_cost(x))
            }
        }
    }

    // ---- Helper methods ----

    fn to_image(&self, theta: &Theta) -> SolverResult<ImageData> {
        ImageData::from_theta(theta, self.shape.size, self.shape.num_channels)
    }

    // (observation index, F_k(x) − y_k) for every observation.
    fn residuals(&self, theta: &Theta) -> SolverResult<Vec<(usize, Theta)>> {
        let estimate = self.to_image(theta)?;
        self.targets
            .iter()
            .enumerate()
            .map(|(k, target)| {
                let predicted = self.model.apply(&estimate, k)?;
                check_shape(&predicted, self.shape)?;
                Ok((k, predicted.to_theta() - target))
            })
            .collect()
    }
}

impl<'a, M: ForwardModel + ?Sized> CostFunction for MapObjective<'a, M> {
    type Param = Theta;
    type Output = Cost;

    fn cost(&self, theta: &Self::Param) -> Result<Self::Output, Error> {
        Ok(self.total_cost(theta)?)
    }
}

impl<'a, M: ForwardModel + ?Sized> Gradient for MapObjective<'a, M> {
    type Param = Theta;
    type Gradient = Grad;

    fn gradient(&self, theta: &Self::Param) -> Result<Self::Gradient, Error> {
        Ok(self.gradient_of(theta)?)
    }
}

fn check_shape(image: &ImageData, shape: EstimateShape) -> SolverResult<()> {
    let size = image.image_size();
    if size != shape.size || image.num_channels() != shape.num_channels {
        return Err(SolverError::EstimateShapeMismatch {
            expected: (shape.size.width, shape.size.height, shape.num_channels),
            found: (size.width, size.height, image.num_channels()),
        });
    }
    Ok(())
}

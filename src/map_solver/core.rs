//! map_solver::core — MAP problem assembly and the solve entrypoint.
//!
//! Purpose
//! -------
//! Own everything one MAP super-resolution problem needs: the borrowed
//! forward model, the observations aligned on the high-resolution grid, the
//! registered regularizers, and the solver options. Validate multi-image and
//! multi-channel consistency once at construction so that later stages can
//! assume a coherent problem.
//!
//! Key behaviors
//! -------------
//! - [`MapSolver::new`] derives the channel count from the first image, the
//!   high-resolution size as `scale × size(first image)`, and resamples
//!   every low-resolution input onto that size with nearest-neighbor
//!   interpolation.
//! - [`MapSolver::add_regularizer`] and
//!   [`MapSolver::regularization_parameter_sum`] manage the weighted prior
//!   terms.
//! - [`MapSolver::num_data_points`] reports `width × height × channels`,
//!   refusing counts beyond the signed 32-bit range.
//! - [`MapSolver::solve`] scales a copy of the thresholds to the problem and
//!   runs the configured argmin solver, jointly or one channel at a time.
//!
//! Invariants
//! ----------
//! - `observations` is non-empty, keeps input order, and every entry has
//!   `num_channels` channels of size `image_size`.
//! - `num_channels` and `image_size` never change after construction.
//! - The regularizer list only grows.
//!
//! Conventions
//! -----------
//! - Raw low-resolution sizes are not cross-checked; only the first image
//!   determines the high-resolution size. Others are resampled to match.
//! - Observations are compared with `F_k(x)` on the high-resolution grid.
use crate::{
    image::{ImageData, ImageSize, InterpolationMode},
    map_solver::{objective::MapObjective, outcome::SolveOutcome},
    model::ForwardModel,
    optimization::{
        errors::{SolverError, SolverResult},
        options::MapSolverOptions,
        outcome::RunOutcome,
        run::run_solver,
    },
    regularization::{EstimateShape, RegularizationSet, Regularizer},
};
use std::sync::Arc;

/// Total unknowns of an estimate with `size` and `num_channels`.
///
/// # Errors
/// [`SolverError::DataPointOverflow`] if the count overflows `usize` or
/// exceeds `i32::MAX`.
pub fn num_data_points(size: ImageSize, num_channels: usize) -> SolverResult<usize> {
    let overflow = || SolverError::DataPointOverflow {
        width: size.width,
        height: size.height,
        channels: num_channels,
    };
    let count = size
        .num_pixels()
        .and_then(|pixels| pixels.checked_mul(num_channels))
        .ok_or_else(overflow)?;
    if count > i32::MAX as usize {
        return Err(overflow());
    }
    Ok(count)
}

pub struct MapSolver<'m, M: ForwardModel + ?Sized> {
    model: &'m M,
    observations: Vec<ImageData>,
    regularizers: RegularizationSet,
    num_channels: usize,
    image_size: ImageSize,
    options: MapSolverOptions,
}

impl<'m, M: ForwardModel + ?Sized> MapSolver<'m, M> {
    /// Assemble a MAP problem from low-resolution observations.
    ///
    /// # Errors
    /// - [`SolverError::EmptyObservations`] if `low_res_images` is empty.
    /// - [`SolverError::ChannelCountMismatch`] for the first image whose
    ///   channel count differs from image 0.
    /// - [`SolverError::InvalidScale`] if the model reports scale 0.
    /// - [`SolverError::DimensionOverflow`] if the scaled size overflows.
    pub fn new(
        model: &'m M, low_res_images: &[ImageData], options: MapSolverOptions,
    ) -> SolverResult<Self> {
        let first = low_res_images.first().ok_or(SolverError::EmptyObservations)?;
        let num_channels = first.num_channels();
        for (index, image) in low_res_images.iter().enumerate().skip(1) {
            if image.num_channels() != num_channels {
                return Err(SolverError::ChannelCountMismatch {
                    index,
                    expected: num_channels,
                    found: image.num_channels(),
                });
            }
        }

        let scale = model.downsampling_scale();
        if scale == 0 {
            return Err(SolverError::InvalidScale { scale });
        }
        let image_size = first.image_size().scaled(scale)?;
        let observations = low_res_images
            .iter()
            .map(|image| image.resized(image_size, InterpolationMode::Nearest))
            .collect::<SolverResult<Vec<_>>>()?;

        tracing::debug!(
            num_observations = observations.len(),
            num_channels,
            scale,
            %image_size,
            "assembled MAP problem"
        );
        Ok(Self {
            model,
            observations,
            regularizers: RegularizationSet::new(),
            num_channels,
            image_size,
            options,
        })
    }

    /// Register a prior term with `weight`. Weights are not validated.
    pub fn add_regularizer(&mut self, term: Arc<dyn Regularizer>, weight: f64) {
        self.regularizers.add_regularizer(term, weight);
    }

    pub fn regularization_parameter_sum(&self) -> f64 {
        self.regularizers.regularization_parameter_sum()
    }

    pub fn regularizers(&self) -> &RegularizationSet {
        &self.regularizers
    }

    /// `width × height × channels` of the high-resolution estimate.
    ///
    /// # Errors
    /// [`SolverError::DataPointOverflow`], see [`num_data_points`].
    pub fn num_data_points(&self) -> SolverResult<usize> {
        num_data_points(self.image_size, self.num_channels)
    }

    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    pub fn image_size(&self) -> ImageSize {
        self.image_size
    }

    pub fn observations(&self) -> &[ImageData] {
        &self.observations
    }

    pub fn options(&self) -> &MapSolverOptions {
        &self.options
    }

    pub fn model(&self) -> &M {
        self.model
    }

    pub fn estimate_shape(&self) -> EstimateShape {
        EstimateShape::new(self.image_size, self.num_channels)
    }

    /// Objective value `c(x)` for a full high-resolution estimate.
    ///
    /// # Errors
    /// [`SolverError::EstimateShapeMismatch`] plus any objective error.
    pub fn objective_cost(&self, estimate: &ImageData) -> SolverResult<f64> {
        self.check_estimate(estimate)?;
        let objective = MapObjective::new(
            self.model,
            &self.observations,
            &self.regularizers,
            self.estimate_shape(),
            self.options.differentiation,
        )?;
        objective.total_cost(&estimate.to_theta())
    }

    /// Run the configured solver starting from `initial_estimate`.
    ///
    /// Copies and validates the stored options, applies
    /// [`MapSolverOptions::adjust_thresholds_adaptively`] with
    /// `(num_data_points, regularization_parameter_sum)`, then runs one solve
    /// (or one per channel when `split_channels` is set). The stored options
    /// are never modified.
    ///
    /// # Errors
    /// - [`SolverError::EstimateShapeMismatch`] for a wrongly shaped start.
    /// - Option validation errors, [`SolverError::DataPointOverflow`], and any
    ///   error raised while iterating.
    pub fn solve(&self, initial_estimate: &ImageData) -> SolverResult<SolveOutcome> {
        self.check_estimate(initial_estimate)?;
        let mut options = self.options.clone();
        options.validate()?;
        options.adjust_thresholds_adaptively(
            self.num_data_points()?,
            self.regularization_parameter_sum(),
        );
        if options.verbose {
            tracing::info!("MAP solver configuration:\n{options}");
        }

        let (estimate, runs) = if options.split_channels {
            self.solve_split(initial_estimate, &options)?
        } else {
            self.solve_joint(initial_estimate, &options)?
        };
        Ok(SolveOutcome { estimate, runs, options })
    }

    // ---- Helper methods ----

    fn solve_joint(
        &self, initial_estimate: &ImageData, options: &MapSolverOptions,
    ) -> SolverResult<(ImageData, Vec<RunOutcome>)> {
        let objective = MapObjective::new(
            self.model,
            &self.observations,
            &self.regularizers,
            self.estimate_shape(),
            options.differentiation,
        )?;
        let run = run_solver(initial_estimate.to_theta(), options, objective)?;
        let estimate = ImageData::from_theta(&run.theta_hat, self.image_size, self.num_channels)?;
        Ok((estimate, vec![run]))
    }

    fn solve_split(
        &self, initial_estimate: &ImageData, options: &MapSolverOptions,
    ) -> SolverResult<(ImageData, Vec<RunOutcome>)> {
        let mut planes = Vec::with_capacity(self.num_channels);
        let mut runs = Vec::with_capacity(self.num_channels);
        for channel in 0..self.num_channels {
            tracing::debug!(channel, "solving channel");
            let objective = MapObjective::for_channel(
                self.model,
                &self.observations,
                channel,
                &self.regularizers,
                self.image_size,
                options.differentiation,
            )?;
            let theta0 = initial_estimate.channel_subset(channel)?.to_theta();
            let run = run_solver(theta0, options, objective)?;
            let plane = ImageData::from_theta(&run.theta_hat, self.image_size, 1)?;
            planes.push(plane.channel(0)?.clone());
            runs.push(run);
        }
        Ok((ImageData::new(planes)?, runs))
    }

    fn check_estimate(&self, estimate: &ImageData) -> SolverResult<()> {
        let size = estimate.image_size();
        if size != self.image_size || estimate.num_channels() != self.num_channels {
            return Err(SolverError::EstimateShapeMismatch {
                expected: (self.image_size.width, self.image_size.height, self.num_channels),
                found: (size.width, size.height, estimate.num_channels()),
            });
        }
        Ok(())
    }
}

impl<M: ForwardModel + ?Sized> std::fmt::Debug for MapSolver<'_, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapSolver")
            .field("num_observations", &self.observations.len())
            .field("num_channels", &self.num_channels)
            .field("image_size", &self.image_size)
            .field("regularizers", &self.regularizers)
            .field("options", &self.options)
            .finish()
    }
}

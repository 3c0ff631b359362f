//! Integration tests for MAP super-resolution problem assembly and solving.
//!
//! Purpose
//! -------
//! - Validate the end-to-end pipeline: low-resolution images and a forward
//!   model, through `MapSolver` construction and regularizer registration,
//!   to adaptive threshold scaling and a full argmin solve.
//!
//! Coverage
//! --------
//! - `map_solver::MapSolver`:
//!   - Construction errors (empty input, channel mismatch).
//!   - Derived high-resolution size and observation alignment.
//!   - Data-point counts and regularization weight sums.
//!   - `solve` with nonlinear CG, L-BFGS, numerical differentiation, and
//!     split channels.
//! - `optimization::options::MapSolverOptions`:
//!   - Adaptive threshold scaling and the configuration summary.
//!
//! Exclusions
//! ----------
//! - Low-level validation, resampling, and gradient checks; those are covered
//!   by unit tests.
//! - Python bindings.
use map_superres::{
    image::{ImageData, ImageSize, InterpolationMode},
    map_solver::{num_data_points, MapSolver},
    model::DecimationModel,
    optimization::{
        errors::SolverError,
        options::{Differentiation, MapSolverOptions, SolverAlgorithm},
    },
    regularization::{Regularizer, SmoothnessRegularizer, TotalVariationRegularizer},
};
use ndarray::Array2;
use std::sync::Arc;

/// Purpose
/// -------
/// Deterministic low-resolution image with distinct values per pixel and
/// channel.
fn low_res(width: usize, height: usize, channels: usize, phase: f64) -> ImageData {
    let planes = (0..channels)
        .map(|c| {
            Array2::from_shape_fn((height, width), |(r, col)| {
                0.5 + 0.4 * ((r * width + col) as f64 * 0.9 + c as f64 * 1.7 + phase).sin()
            })
        })
        .collect();
    ImageData::new(planes).expect("valid low-res image")
}

fn options(algorithm: SolverAlgorithm, differentiation: Differentiation, split: bool) -> MapSolverOptions {
    MapSolverOptions::new(algorithm, differentiation, split, 1e-6, 1e-9, 1e-9, false)
        .and_then(|opts| opts.with_limits(200, None))
        .expect("valid options")
}

/// Purpose
/// -------
/// Solve a small two-channel problem and check that the objective at the
/// returned estimate never exceeds the objective at the start.
fn assert_solve_does_not_increase_cost(opts: MapSolverOptions) {
    let model = DecimationModel::new(2).expect("valid scale");
    let images = [low_res(3, 3, 2, 0.0), low_res(3, 3, 2, 0.3)];
    let mut solver = MapSolver::new(&model, &images, opts).expect("valid problem");
    solver.add_regularizer(Arc::new(SmoothnessRegularizer::new()), 0.05);
    solver.add_regularizer(
        Arc::new(TotalVariationRegularizer::new(0.1).expect("valid epsilon")),
        0.01,
    );

    let start = ImageData::zeros(solver.image_size(), 2).expect("valid start");
    let initial_cost = solver.objective_cost(&start).expect("initial cost");
    let outcome = solver.solve(&start).expect("solve should succeed");
    let final_cost = solver.objective_cost(&outcome.estimate).expect("final cost");

    assert_eq!(outcome.estimate.image_size(), ImageSize::new(6, 6));
    assert_eq!(outcome.estimate.num_channels(), 2);
    assert!(
        final_cost <= initial_cost,
        "cost increased from {initial_cost} to {final_cost}"
    );
    assert!(final_cost < 0.5 * initial_cost, "solver made no progress: {final_cost}");
}

#[test]
// Purpose
// -------
// No input images means no problem.
fn empty_input_is_rejected() {
    let model = DecimationModel::new(2).expect("valid scale");
    let result = MapSolver::new(&model, &[], MapSolverOptions::default());
    assert!(matches!(result, Err(SolverError::EmptyObservations)));
}

#[test]
// Purpose
// -------
// Mixed channel counts fail construction and name the offending image.
fn channel_mismatch_is_rejected() {
    let model = DecimationModel::new(2).expect("valid scale");
    let images = [low_res(4, 4, 3, 0.0), low_res(4, 4, 1, 0.0)];
    let err = MapSolver::new(&model, &images, MapSolverOptions::default()).unwrap_err();
    assert_eq!(err, SolverError::ChannelCountMismatch { index: 1, expected: 3, found: 1 });
    assert!(err.to_string().contains("channel"));
}

#[test]
// Purpose
// -------
// Size derivation and observation alignment.
//
// Given
// -----
// - Three 10×5 single-channel images, scale 4.
//
// Expect
// ------
// - HR size 40×20; three observations of that size; one channel.
fn derived_size_and_observations() {
    let model = DecimationModel::new(4).expect("valid scale");
    let images = [low_res(10, 5, 1, 0.0), low_res(10, 5, 1, 0.1), low_res(10, 5, 1, 0.2)];
    let solver = MapSolver::new(&model, &images, MapSolverOptions::default()).expect("valid problem");

    assert_eq!(solver.image_size(), ImageSize::new(40, 20));
    assert_eq!(solver.num_channels(), 1);
    assert_eq!(solver.observations().len(), 3);
    for obs in solver.observations() {
        assert_eq!(obs.image_size(), ImageSize::new(40, 20));
        assert_eq!(obs.num_channels(), 1);
    }
}

#[test]
// Purpose
// -------
// Nearest-neighbor alignment reproduces each low-resolution sample at its
// scale-aligned high-resolution position.
fn observations_match_low_res_at_aligned_positions() {
    let scale = 3;
    let model = DecimationModel::new(scale).expect("valid scale");
    let image = low_res(4, 3, 2, 0.5);
    let solver = MapSolver::new(&model, std::slice::from_ref(&image), MapSolverOptions::default())
        .expect("valid problem");
    let obs = &solver.observations()[0];

    for c in 0..2 {
        let lr = image.channel(c).expect("lr channel");
        let hr = obs.channel(c).expect("hr channel");
        for ((r, col), &value) in lr.indexed_iter() {
            assert_eq!(hr[[r * scale, col * scale]], value);
        }
    }
}

#[test]
// Purpose
// -------
// Weight sums follow registrations; data-point counts follow dimensions.
//
// Given
// -----
// - 50×50 three-channel input, scale 2 → 100×100×3.
//
// Expect
// ------
// - 30000 data points; weight sum 0.0, then 1.0 after 0.25 + 0.75.
fn data_points_and_weight_sum() {
    let model = DecimationModel::new(2).expect("valid scale");
    let images = [low_res(50, 50, 3, 0.0)];
    let mut solver =
        MapSolver::new(&model, &images, MapSolverOptions::default()).expect("valid problem");

    assert_eq!(solver.num_data_points(), Ok(30_000));
    assert_eq!(solver.regularization_parameter_sum(), 0.0);

    let smooth: Arc<dyn Regularizer> = Arc::new(SmoothnessRegularizer::new());
    solver.add_regularizer(Arc::clone(&smooth), 0.25);
    solver.add_regularizer(smooth, 0.75);
    assert_eq!(solver.regularization_parameter_sum(), 1.0);
    assert_eq!(solver.regularizers().len(), 2);
}

#[test]
// Purpose
// -------
// Weights that are inexact in binary still sum to 1.0 within rounding.
fn inexact_weights_sum_to_one() {
    let model = DecimationModel::new(2).expect("valid scale");
    let images = [low_res(4, 4, 1, 0.0)];
    let mut solver =
        MapSolver::new(&model, &images, MapSolverOptions::default()).expect("valid problem");
    for weight in [0.1, 0.2, 0.7] {
        solver.add_regularizer(Arc::new(SmoothnessRegularizer::new()), weight);
    }
    let sum = solver.regularization_parameter_sum();
    assert!((sum - 1.0).abs() < 1e-12, "weight sum {sum}");
}

#[test]
fn data_point_overflow_is_reported() {
    let err = num_data_points(ImageSize::new(65_536, 65_536), 1).unwrap_err();
    assert!(matches!(err, SolverError::DataPointOverflow { .. }));
}

#[test]
// Purpose
// -------
// The signed 32-bit bound is inclusive.
//
// Given
// -----
// - A single-channel strip of `i32::MAX` pixels, then one pixel wider.
//
// Expect
// ------
// - `Ok(i32::MAX)` for the first; `DataPointOverflow` for the second.
fn data_point_limit_is_i32_max() {
    let max = i32::MAX as usize;
    assert_eq!(num_data_points(ImageSize::new(max, 1), 1), Ok(max));
    let err = num_data_points(ImageSize::new(max + 1, 1), 1).unwrap_err();
    assert!(matches!(err, SolverError::DataPointOverflow { .. }));
}

#[test]
// Purpose
// -------
// Threshold scaling is a no-op below 1.0 and exact above it, and the
// summary reflects the adjusted values.
fn threshold_scaling_and_summary() {
    let mut opts = MapSolverOptions::new(
        SolverAlgorithm::Lbfgs,
        Differentiation::Numerical { step: 1e-6 },
        true,
        1e-6,
        1e-6,
        1e-6,
        false,
    )
    .expect("valid options");

    let before = opts.clone();
    opts.adjust_thresholds_adaptively(10, 0.05);
    assert_eq!(opts, before);

    opts.adjust_thresholds_adaptively(1000, 0.01);
    assert!((opts.gradient_norm_threshold - 1e-5).abs() < 1e-18);
    assert!((opts.cost_decrease_threshold - 1e-5).abs() < 1e-18);
    assert!((opts.parameter_variation_threshold - 1e-5).abs() < 1e-18);

    let summary = opts.describe();
    assert!(summary.contains("LBFGS (numerical differentiation [step = "));
    assert!(summary.contains("Channel splitting enabled."));
    assert!(summary.contains("Threshold 1 (gradient norm):"));
    assert_eq!(summary.lines().count(), 5);
}

#[test]
fn nonlinear_cg_solve_reduces_cost() {
    assert_solve_does_not_increase_cost(options(
        SolverAlgorithm::NonlinearConjugateGradient,
        Differentiation::Analytical,
        false,
    ));
}

#[test]
fn lbfgs_solve_reduces_cost() {
    assert_solve_does_not_increase_cost(options(
        SolverAlgorithm::Lbfgs,
        Differentiation::Analytical,
        false,
    ));
}

#[test]
fn numerical_differentiation_solve_reduces_cost() {
    assert_solve_does_not_increase_cost(options(
        SolverAlgorithm::Lbfgs,
        Differentiation::Numerical { step: 1e-6 },
        false,
    ));
}

#[test]
// Purpose
// -------
// Split-channel solves run once per channel and still reduce the joint
// objective.
fn split_channel_solve_reduces_cost() {
    let opts = options(SolverAlgorithm::Lbfgs, Differentiation::Analytical, true);
    assert_solve_does_not_increase_cost(opts.clone());

    let model = DecimationModel::new(2).expect("valid scale");
    let images = [low_res(2, 2, 3, 0.0)];
    let solver = MapSolver::new(&model, &images, opts).expect("valid problem");
    let start = images[0]
        .resized(solver.image_size(), InterpolationMode::Linear)
        .expect("valid start");
    let outcome = solver.solve(&start).expect("solve should succeed");
    assert_eq!(outcome.runs.len(), 3);
}

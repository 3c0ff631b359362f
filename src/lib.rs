//! map_superres — MAP multi-frame super-resolution with optional Python bindings.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers and, behind the `python-bindings`
//! feature, as the PyO3 bridge exposing the solver configuration layer to
//! Python via the `_map_superres` extension module.
//!
//! Key behaviors
//! -------------
//! - Re-export the core modules: `image` (pixel buffers), `model` (forward
//!   models), `regularization` (prior terms), `optimization` (options,
//!   errors, argmin wiring) and `map_solver` (problem assembly and solve).
//! - Define the `#[pyclass]` wrapper for solver options and the
//!   `#[pymodule]` initializer.
//!
//! Invariants & assumptions
//! ------------------------
//! - All numerical work lives in the inner modules; the PyO3 items perform
//!   only argument conversion and error mapping.
//! - Errors cross the Python boundary as `ValueError` built from
//!   [`optimization::errors::SolverError`].
//!
//! Conventions
//! -----------
//! - Images are `width × height` with channel planes indexed `[[row, col]]`.
//! - The flat parameter vector is channel-major, then row-major.
//!
//! Downstream usage
//! ----------------
//! - Rust code builds a [`map_solver::MapSolver`] from a
//!   [`model::ForwardModel`] and a slice of [`image::ImageData`], registers
//!   regularizers, and calls `solve`.
//! - Python code imports `_map_superres.MapSolverOptions` to build, scale, and
//!   print solver configurations.
//!
//! Testing notes
//! -------------
//! - Unit tests sit next to each module; `tests/integration_map_pipeline.rs`
//!   exercises construction, dimensionality queries, and full solves.

pub mod image;
pub mod map_solver;
pub mod model;
pub mod optimization;
pub mod regularization;

#[cfg(feature = "python-bindings")]
use pyo3::prelude::*;

#[cfg(feature = "python-bindings")]
use crate::optimization::options::{
    Differentiation, MapSolverOptions as CoreOptions, SolverAlgorithm,
};

/// MapSolverOptions — Python-facing wrapper for solver configuration.
///
/// Constructed from Python via
/// `MapSolverOptions(solver="cg", numerical_step=None, split_channels=False,
/// gradient_norm_threshold=1e-6, cost_decrease_threshold=1e-6,
/// parameter_variation_threshold=1e-6, max_iterations=50, lbfgs_memory=None,
/// verbose=False)`:
/// - `solver`: algorithm name, parsed case-insensitively.
/// - `numerical_step`: `None` for analytical differentiation, otherwise the
///   finite-difference step.
///
/// Errors
/// ------
/// - `ValueError` for unknown solver names or invalid numeric settings.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "map_superres", name = "MapSolverOptions")]
#[derive(Debug, Clone)]
pub struct PyMapSolverOptions {
    inner: CoreOptions,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl PyMapSolverOptions {
    #[new]
    #[pyo3(signature = (
        solver = "cg",
        numerical_step = None,
        split_channels = false,
        gradient_norm_threshold = 1e-6,
        cost_decrease_threshold = 1e-6,
        parameter_variation_threshold = 1e-6,
        max_iterations = 50,
        lbfgs_memory = None,
        verbose = false
    ))]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        solver: &str, numerical_step: Option<f64>, split_channels: bool,
        gradient_norm_threshold: f64, cost_decrease_threshold: f64,
        parameter_variation_threshold: f64, max_iterations: usize, lbfgs_memory: Option<usize>,
        verbose: bool,
    ) -> PyResult<Self> {
        let algorithm: SolverAlgorithm = solver.parse()?;
        let differentiation = match numerical_step {
            Some(step) => Differentiation::Numerical { step },
            None => Differentiation::Analytical,
        };
        let inner = CoreOptions::new(
            algorithm,
            differentiation,
            split_channels,
            gradient_norm_threshold,
            cost_decrease_threshold,
            parameter_variation_threshold,
            verbose,
        )?
        .with_limits(max_iterations, lbfgs_memory)?;
        Ok(Self { inner })
    }

    /// Scale the thresholds by `num_parameters × regularization_parameter_sum`
    /// when that product is at least 1.0.
    pub fn adjust_thresholds_adaptively(
        &mut self, num_parameters: usize, regularization_parameter_sum: f64,
    ) {
        self.inner.adjust_thresholds_adaptively(num_parameters, regularization_parameter_sum);
    }

    /// Configuration summary, one setting per line.
    pub fn describe(&self) -> String {
        self.inner.describe()
    }

    #[getter]
    pub fn gradient_norm_threshold(&self) -> f64 {
        self.inner.gradient_norm_threshold
    }

    #[getter]
    pub fn cost_decrease_threshold(&self) -> f64 {
        self.inner.cost_decrease_threshold
    }

    #[getter]
    pub fn parameter_variation_threshold(&self) -> f64 {
        self.inner.parameter_variation_threshold
    }

    #[getter]
    pub fn split_channels(&self) -> bool {
        self.inner.split_channels
    }

    #[getter]
    pub fn solver(&self) -> &'static str {
        self.inner.solver_algorithm.display_name()
    }

    fn __repr__(&self) -> String {
        format!("MapSolverOptions(\n{}\n)", self.inner)
    }
}

/// Number of unknowns for a `width × height × channels` estimate.
///
/// Raises `ValueError` if the count exceeds the signed 32-bit range.
#[cfg(feature = "python-bindings")]
#[pyfunction]
fn num_data_points(width: usize, height: usize, channels: usize) -> PyResult<usize> {
    Ok(map_solver::num_data_points(image::ImageSize::new(width, height), channels)?)
}

/// _map_superres — PyO3 module initializer for the Python extension.
#[cfg(feature = "python-bindings")]
#[pymodule]
fn _map_superres(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyMapSolverOptions>()?;
    m.add_function(wrap_pyfunction!(num_data_points, m)?)?;
    Ok(())
}

//! optimization — solver options, argmin wiring, and the shared error surface.
//!
//! Purpose
//! -------
//! Provide everything the MAP solver needs to turn an objective into an
//! estimate: validated configuration ([`options::MapSolverOptions`]), solver
//! construction for the two supported backends, threshold-based stopping,
//! finite-difference gradients, and a single error enum
//! ([`errors::SolverError`]) with its result alias.
//!
//! Key behaviors
//! -------------
//! - Build L-BFGS or Polak–Ribière nonlinear conjugate gradient (both with a
//!   More–Thuente line search) and wrap them in
//!   [`stopping::ThresholdStop`] so the gradient-norm, cost-decrease, and
//!   parameter-variation thresholds apply to either backend.
//! - Rescale the thresholds to problem size and regularization weight via
//!   [`options::MapSolverOptions::adjust_thresholds_adaptively`].
//! - Run a configured solver through argmin's `Executor` and normalize the
//!   final state into a [`outcome::RunOutcome`].
//!
//! Invariants & assumptions
//! ------------------------
//! - Thresholds and the numerical step are finite and strictly positive;
//!   the iteration cap is `>= 1`. Violations are reported as
//!   `SolverError`, never panics.
//! - Costs are minimized directly. No sign flips happen anywhere in this
//!   layer.
//!
//! Conventions
//! -----------
//! - Parameter vectors use the [`types::Theta`] layout: channel-major, then
//!   row-major within each channel.
//! - Fallible public functions return [`errors::SolverResult`]; raw argmin
//!   errors never escape.
//!
//! Downstream usage
//! ----------------
//! - [`crate::map_solver`] builds a `MapObjective`, adjusts a copy of its
//!   options, and calls [`run::run_solver`] once per solve (or once per
//!   channel when channels are split).
//! - Front-ends usually import `optimization::prelude::*`.
//!
//! Testing notes
//! -------------
//! - Unit tests live next to each submodule: option validation and threshold
//!   scaling, stopping rules on hand-built states, finite-difference accuracy,
//!   and end-to-end runs on small quadratics.

pub mod builders;
pub mod errors;
pub mod finite_diff;
pub mod options;
pub mod outcome;
pub mod run;
pub mod stopping;
pub mod types;
pub mod validation;

pub mod prelude {
    pub use super::errors::{SolverError, SolverResult};
    pub use super::options::{Differentiation, MapSolverOptions, SolverAlgorithm};
    pub use super::outcome::RunOutcome;
    pub use super::run::run_solver;
    pub use super::types::{Cost, Grad, Theta};
}

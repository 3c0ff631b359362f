//! optimization::types — shared numeric aliases and solver wiring.
//!
//! Purpose
//! -------
//! Centralize the numeric types and argmin solver aliases used when solving
//! MAP super-resolution problems, so the rest of the crate stays agnostic to
//! `ndarray` and argmin generics.
//!
//! Conventions
//! -----------
//! - A high-resolution estimate is flattened into a [`Theta`] in
//!   channel-major, row-major order (`index = c·H·W + r·W + col`).
//! - [`Grad`] always has the same length and layout as [`Theta`].
//! - [`Cost`] is the scalar MAP objective (data fidelity plus weighted
//!   regularization); it is minimized directly, no sign flips.
use argmin::core::IterState;
use argmin::solver::{
    conjugategradient::{beta::PolakRibierePlus, NonlinearConjugateGradient},
    linesearch::MoreThuenteLineSearch,
    quasinewton::LBFGS,
};
use ndarray::Array1;
use std::collections::HashMap;

/// Flattened high-resolution estimate.
pub type Theta = Array1<f64>;

/// Gradient of the objective with respect to [`Theta`].
pub type Grad = Array1<f64>;

/// Scalar objective value.
pub type Cost = f64;

/// Function-evaluation counters as reported by argmin (e.g. `"cost_count"`).
pub type FnEvalMap = HashMap<String, u64>;

/// Iteration state shared by every solver the crate runs.
pub type MapState = IterState<Theta, Grad, (), (), (), Cost>;

/// Default history size (`m`) for L-BFGS runs.
pub const DEFAULT_LBFGS_MEM: usize = 7;

/// More–Thuente line search specialized to this crate's numeric types.
pub type MoreThuenteLS = MoreThuenteLineSearch<Theta, Grad, Cost>;

/// L-BFGS solver wired to the More–Thuente line search.
pub type LbfgsMoreThuente = LBFGS<MoreThuenteLS, Theta, Grad, Cost>;

/// Nonlinear conjugate gradient (Polak–Ribière, clamped at zero) with
/// More–Thuente line search.
pub type NcgMoreThuente = NonlinearConjugateGradient<Theta, MoreThuenteLS, PolakRibierePlus, Cost>;

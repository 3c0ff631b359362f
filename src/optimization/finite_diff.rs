//! optimization::finite_diff — numerical gradients of fallible objectives.
//!
//! Purpose
//! -------
//! Provide gradient approximations for objectives that return
//! `SolverResult<f64>`, so that regularizers without an analytic gradient and
//! the numerical-differentiation mode can share one validated path.
//!
//! Key behaviors
//! -------------
//! - [`numerical_gradient`] wraps `finitediff`'s central differences, capturing
//!   the first error raised inside the objective and retrying once with
//!   forward differences when the central result fails validation.
//! - [`stepped_central_gradient`] evaluates central differences with a
//!   caller-chosen step, as configured through
//!   [`Differentiation::Numerical`](crate::optimization::options::Differentiation).
//!
//! Conventions
//! -----------
//! - `finitediff` closures must return a plain `f64`; errors are routed into
//!   a `RefCell` slot and the closure returns `NaN`, then the captured error
//!   is surfaced after differencing.
//! - Every returned gradient satisfies [`validate_grad`].
use crate::optimization::{
    errors::{SolverError, SolverResult},
    types::{Grad, Theta},
    validation::validate_grad,
};
use finitediff::FiniteDiff;
use std::cell::RefCell;

/// Gradient of `cost` at `theta` using `finitediff`'s automatic step.
///
/// Tries central differences first. If any evaluation failed, or the
/// result contains non-finite entries, retries once with forward
/// differences.
///
/// # Errors
/// - The first error raised by `cost` during the forward-difference retry.
/// - [`SolverError::InvalidGradient`] if the forward result is non-finite.
pub fn numerical_gradient<F>(theta: &Theta, cost: F) -> SolverResult<Grad>
where
    F: Fn(&Theta) -> SolverResult<f64>,
{
    let dim = theta.len();
    let closure_err: RefCell<Option<SolverError>> = RefCell::new(None);
    let cost_func = |x: &Theta| -> f64 {
        match cost(x) {
            Ok(val) => val,
            Err(e) => {
                let mut slot = closure_err.borrow_mut();
                if slot.is_none() {
                    *slot = Some(e);
                }
                f64::NAN
            }
        }
    };
    let central = theta.central_diff(&cost_func);
    if closure_err.borrow().is_none() && validate_grad(&central, dim).is_ok() {
        return Ok(central);
    }
    run_forward_diff(theta, &cost_func, &closure_err)
}

/// Central-difference gradient of `cost` at `theta` with an explicit step.
///
/// `g_i = (c(θ + h·e_i) − c(θ − h·e_i)) / 2h`. One scratch copy of `theta`
/// is reused for every coordinate.
///
/// # Errors
/// - [`SolverError::InvalidNumericalStep`] for a non-finite or non-positive
///   step.
/// - Any error raised by `cost`.
/// - [`SolverError::InvalidGradient`] if a difference is non-finite.
pub fn stepped_central_gradient<F>(theta: &Theta, step: f64, cost: F) -> SolverResult<Grad>
where
    F: Fn(&Theta) -> SolverResult<f64>,
{
    if !step.is_finite() || step <= 0.0 {
        return Err(SolverError::InvalidNumericalStep { step });
    }
    let mut scratch = theta.clone();
    let mut grad = Grad::zeros(theta.len());
    for i in 0..theta.len() {
        let original = scratch[i];
        scratch[i] = original + step;
        let plus = cost(&scratch)?;
        scratch[i] = original - step;
        let minus = cost(&scratch)?;
        scratch[i] = original;
        grad[i] = (plus - minus) / (2.0 * step);
    }
    validate_grad(&grad, theta.len())?;
    Ok(grad)
}

// ---- Helper methods ----

fn run_forward_diff<G: Fn(&Theta) -> f64>(
    theta: &Theta, func: &G, closure_err: &RefCell<Option<SolverError>>,
) -> SolverResult<Grad> {
    closure_err.replace(None);
    let fd_grad = theta.forward_diff(func);
    if let Some(err) = closure_err.take() {
        return Err(err);
    }
    validate_grad(&fd_grad, theta.len())?;
    Ok(fd_grad)
}

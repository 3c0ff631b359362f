//! Validation helpers for solver configuration and objective outputs.
//!
//! - **Option checks**: [`verify_threshold`], [`verify_numerical_step`],
//!   [`verify_max_iterations`], [`verify_lbfgs_memory`] reject non-finite or
//!   non-positive settings before a solve starts.
//! - **Objective checks**: [`validate_grad`], [`validate_cost`] enforce
//!   shape and finiteness on values handed back to argmin.
//! - **Outcome checks**: [`validate_theta_hat`] unwraps the solver's best
//!   parameter vector.
use crate::optimization::{
    errors::{SolverError, SolverResult},
    types::{Cost, Grad, Theta},
};

/// Validate a convergence threshold.
///
/// # Errors
/// Returns [`SolverError::InvalidThreshold`] if `value` is non-finite or
/// not strictly positive.
pub fn verify_threshold(name: &'static str, value: f64) -> SolverResult<()> {
    if !value.is_finite() {
        return Err(SolverError::InvalidThreshold {
            name,
            value,
            reason: "Threshold must be finite.",
        });
    }
    if value <= 0.0 {
        return Err(SolverError::InvalidThreshold {
            name,
            value,
            reason: "Threshold must be positive.",
        });
    }
    Ok(())
}

/// Validate a finite-difference step.
///
/// # Errors
/// Returns [`SolverError::InvalidNumericalStep`] if `step` is non-finite
/// or ≤ 0.0.
pub fn verify_numerical_step(step: f64) -> SolverResult<()> {
    if !step.is_finite() || step <= 0.0 {
        return Err(SolverError::InvalidNumericalStep { step });
    }
    Ok(())
}

pub fn verify_max_iterations(max_iterations: usize) -> SolverResult<()> {
    if max_iterations == 0 {
        return Err(SolverError::InvalidMaxIterations { max_iterations });
    }
    Ok(())
}

pub fn verify_lbfgs_memory(memory: Option<usize>) -> SolverResult<()> {
    if let Some(memory) = memory {
        if memory == 0 {
            return Err(SolverError::InvalidLbfgsMemory { memory });
        }
    }
    Ok(())
}

/// Validate a gradient vector against dimension and finiteness.
///
/// # Errors
/// - [`SolverError::GradientDimMismatch`] if `grad.len() != dim`.
/// - [`SolverError::InvalidGradient`] for the first non-finite element.
pub fn validate_grad(grad: &Grad, dim: usize) -> SolverResult<()> {
    if grad.len() != dim {
        return Err(SolverError::GradientDimMismatch { expected: dim, found: grad.len() });
    }
    for (index, &value) in grad.iter().enumerate() {
        if !value.is_finite() {
            return Err(SolverError::InvalidGradient { index, value });
        }
    }
    Ok(())
}

/// Validate that an objective value is finite.
pub fn validate_cost(value: Cost) -> SolverResult<()> {
    if !value.is_finite() {
        return Err(SolverError::NonFiniteCost { value });
    }
    Ok(())
}

/// Validate and unwrap the solver's best parameter vector.
///
/// # Errors
/// - [`SolverError::MissingEstimate`] if no vector was produced.
/// - [`SolverError::InvalidEstimate`] for the first non-finite entry.
pub fn validate_theta_hat(theta_hat: Option<Theta>) -> SolverResult<Theta> {
    match theta_hat {
        Some(theta) => {
            for (index, &value) in theta.iter().enumerate() {
                if !value.is_finite() {
                    return Err(SolverError::InvalidEstimate { index, value });
                }
            }
            Ok(theta)
        }
        None => Err(SolverError::MissingEstimate),
    }
}

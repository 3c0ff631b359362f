//! optimization::builders — solver construction helpers.
//!
//! Build the two argmin solvers the MAP solver can run, apply the
//! crate-level options that each backend understands natively, and wrap
//! both in [`ThresholdStop`] so the three convergence thresholds are
//! enforced uniformly regardless of the backend.
//!
//! The builders never set the initial parameter vector or `max_iters`;
//! those are applied by the runner in [`run`](crate::optimization::run).
use crate::optimization::{
    errors::SolverResult,
    options::MapSolverOptions,
    stopping::ThresholdStop,
    types::{LbfgsMoreThuente, MoreThuenteLS, NcgMoreThuente, DEFAULT_LBFGS_MEM},
};
use argmin::solver::conjugategradient::beta::PolakRibierePlus;

/// Construct L-BFGS with More–Thuente line search.
///
/// The history size comes from `opts.lbfgs_memory` (default
/// [`DEFAULT_LBFGS_MEM`]). The gradient-norm and cost-decrease thresholds are
/// also handed to argmin's own L-BFGS tolerances.
///
/// # Errors
/// Returns a [`SolverError`](crate::optimization::errors::SolverError) if argmin
/// rejects a tolerance.
pub fn build_lbfgs(opts: &MapSolverOptions) -> SolverResult<ThresholdStop<LbfgsMoreThuente>> {
    let mem = opts.lbfgs_memory.unwrap_or(DEFAULT_LBFGS_MEM);
    let lbfgs = LbfgsMoreThuente::new(MoreThuenteLS::new(), mem)
        .with_tolerance_grad(opts.gradient_norm_threshold)?
        .with_tolerance_cost(opts.cost_decrease_threshold)?;
    Ok(ThresholdStop::from_options(lbfgs, opts))
}

/// Sufficient-decrease constant of the CG line search.
const NCG_LINESEARCH_C1: f64 = 1e-4;

/// Curvature constant of the CG line search. Must stay below 0.5 for PR+
/// directions to remain descent directions.
const NCG_LINESEARCH_C2: f64 = 0.1;

/// Restart with steepest descent once consecutive gradients stop being
/// close to orthogonal (Powell's criterion).
const NCG_RESTART_ORTHOGONALITY: f64 = 0.1;

/// Construct Polak–Ribière (PR+) nonlinear conjugate gradient with a
/// More–Thuente line search.
///
/// argmin's NCG has no tolerance settings of its own, so stopping relies
/// entirely on the [`ThresholdStop`] wrapper and the iteration cap.
///
/// # Errors
/// Returns a [`SolverError`](crate::optimization::errors::SolverError) if argmin
/// rejects the line-search constants.
pub fn build_nonlinear_cg(opts: &MapSolverOptions) -> SolverResult<ThresholdStop<NcgMoreThuente>> {
    let linesearch = MoreThuenteLS::new().with_c(NCG_LINESEARCH_C1, NCG_LINESEARCH_C2)?;
    let ncg = NcgMoreThuente::new(linesearch, PolakRibierePlus::new())
        .restart_orthogonality(NCG_RESTART_ORTHOGONALITY);
    Ok(ThresholdStop::from_options(ncg, opts))
}

//! Normalized result of a single argmin run.
use crate::optimization::{
    errors::SolverResult,
    types::{Cost, FnEvalMap, Grad, Theta},
    validation::{validate_cost, validate_theta_hat},
};
use argmin::core::{TerminationReason, TerminationStatus};
use argmin_math::ArgminL2Norm;

/// Outcome of one optimization run (one per channel when channels are split).
///
/// - `theta_hat`: best flattened estimate found.
/// - `cost`: objective value at `theta_hat`.
/// - `converged`: `true` when a convergence rule (threshold or target cost)
///   ended the run; `false` for iteration caps, interrupts, or an
///   unterminated state.
/// - `status`: human-readable termination status.
/// - `iterations`: iterations performed.
/// - `fn_evals`: argmin's function-evaluation counters.
/// - `grad_norm`: norm of the gradient held by the final solver state, if
///   one was computed. This is the gradient at the last iterate, which may
///   differ from `theta_hat` when the last step did not improve the cost.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub theta_hat: Theta,
    pub cost: Cost,
    pub converged: bool,
    pub status: String,
    pub iterations: usize,
    pub fn_evals: FnEvalMap,
    pub grad_norm: Option<f64>,
}

impl RunOutcome {
    /// Build a validated outcome from raw solver state.
    ///
    /// # Errors
    /// Propagates [`validate_theta_hat`] and [`validate_cost`] failures.
    pub fn new(
        theta_hat_opt: Option<Theta>, cost: Cost, termination: TerminationStatus, iterations: u64,
        fn_evals: FnEvalMap, grad: Option<Grad>,
    ) -> SolverResult<Self> {
        let theta_hat = validate_theta_hat(theta_hat_opt)?;
        validate_cost(cost)?;
        let (converged, status) = match &termination {
            TerminationStatus::NotTerminated => (false, "Not terminated".to_string()),
            TerminationStatus::Terminated(reason) => {
                let converged = matches!(
                    reason,
                    TerminationReason::SolverConverged | TerminationReason::TargetCostReached
                );
                (converged, format!("{reason:?}"))
            }
        };
        let grad_norm = grad.map(|g| g.l2_norm());
        Ok(Self {
            theta_hat,
            cost,
            converged,
            status,
            iterations: iterations as usize,
            fn_evals,
            grad_norm,
        })
    }
}

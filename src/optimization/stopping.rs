//! optimization::stopping — threshold-based termination for argmin solvers.
//!
//! [`ThresholdStop`] wraps any argmin solver operating on [`MapState`] and
//! adds the MAP solver's three stopping rules on top of whatever the inner
//! solver already checks:
//!
//! 1. gradient norm `‖∇c(x_k)‖ < gradient_norm_threshold`,
//! 2. cost decrease `|c(x_{k-1}) − c(x_k)| < cost_decrease_threshold`,
//! 3. parameter variation `‖x_k − x_{k-1}‖ < parameter_variation_threshold`.
//!
//! Rules 2 and 3 need a previous iterate and are skipped until one exists.
//! Iteration caps and target costs remain argmin's responsibility.
use crate::optimization::{options::MapSolverOptions, types::MapState};
use argmin::core::{
    Error, Problem, Solver, State, TerminationReason, TerminationStatus, KV,
};
use argmin_math::ArgminL2Norm;

#[derive(Debug, Clone)]
pub struct ThresholdStop<S> {
    inner: S,
    gradient_norm_threshold: f64,
    cost_decrease_threshold: f64,
    parameter_variation_threshold: f64,
}

impl<S> ThresholdStop<S> {
    pub fn new(
        inner: S, gradient_norm_threshold: f64, cost_decrease_threshold: f64,
        parameter_variation_threshold: f64,
    ) -> Self {
        Self { inner, gradient_norm_threshold, cost_decrease_threshold, parameter_variation_threshold }
    }

    /// Wrap `inner` with the (already adjusted) thresholds from `opts`.
    pub fn from_options(inner: S, opts: &MapSolverOptions) -> Self {
        Self::new(
            inner,
            opts.gradient_norm_threshold,
            opts.cost_decrease_threshold,
            opts.parameter_variation_threshold,
        )
    }

    pub fn gradient_norm_threshold(&self) -> f64 {
        self.gradient_norm_threshold
    }

    pub fn cost_decrease_threshold(&self) -> f64 {
        self.cost_decrease_threshold
    }

    pub fn parameter_variation_threshold(&self) -> f64 {
        self.parameter_variation_threshold
    }

    /// True once any available measure falls below its threshold.
    pub fn threshold_reached(
        &self, grad_norm: Option<f64>, cost_decrease: Option<f64>, param_variation: Option<f64>,
    ) -> bool {
        grad_norm.is_some_and(|g| g < self.gradient_norm_threshold)
            || cost_decrease.is_some_and(|d| d < self.cost_decrease_threshold)
            || param_variation.is_some_and(|v| v < self.parameter_variation_threshold)
    }

    fn measures(state: &MapState) -> (Option<f64>, Option<f64>, Option<f64>) {
        let grad_norm = state.get_gradient().map(|g| g.l2_norm());
        let prev_cost = state.get_prev_cost();
        let cost_decrease =
            prev_cost.is_finite().then(|| (prev_cost - state.get_cost()).abs());
        let param_variation = match (state.get_param(), state.get_prev_param()) {
            (Some(x), Some(prev)) => Some((x - prev).l2_norm()),
            _ => None,
        };
        (grad_norm, cost_decrease, param_variation)
    }
}

impl<O, S> Solver<O, MapState> for ThresholdStop<S>
where
    S: Solver<O, MapState>,
{
    const NAME: &'static str = "ThresholdStop";

    fn init(&mut self, problem: &mut Problem<O>, state: MapState) -> Result<(MapState, Option<KV>), Error> {
        self.inner.init(problem, state)
    }

    fn next_iter(
        &mut self, problem: &mut Problem<O>, state: MapState,
    ) -> Result<(MapState, Option<KV>), Error> {
        self.inner.next_iter(problem, state)
    }

    fn terminate(&mut self, state: &MapState) -> TerminationStatus {
        let inner_status = self.inner.terminate(state);
        if inner_status.terminated() {
            return inner_status;
        }
        let (grad_norm, cost_decrease, param_variation) = Self::measures(state);
        if self.threshold_reached(grad_norm, cost_decrease, param_variation) {
            tracing::debug!(
                iteration = state.get_iter(),
                ?grad_norm,
                ?cost_decrease,
                ?param_variation,
                "convergence threshold reached"
            );
            return TerminationStatus::Terminated(TerminationReason::SolverConverged);
        }
        TerminationStatus::NotTerminated
    }
}

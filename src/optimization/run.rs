//! Execution helpers that run an argmin solver on a MAP objective and return
//! a crate-level [`RunOutcome`].
use crate::optimization::{
    builders::{build_lbfgs, build_nonlinear_cg},
    errors::SolverResult,
    options::{MapSolverOptions, SolverAlgorithm},
    outcome::RunOutcome,
    types::{Cost, Grad, MapState, Theta},
};
use argmin::core::{CostFunction, Executor, Gradient, Solver, State};
use argmin_math::ArgminL2Norm;

/// Run the solver selected by `opts.solver_algorithm` on `problem`.
///
/// `opts` must already carry the adjusted thresholds; this function does not
/// rescale anything.
///
/// # Errors
/// Propagates builder failures, argmin runtime errors (via
/// `From<argmin::core::Error>`), and outcome validation errors.
pub fn run_solver<O>(theta0: Theta, opts: &MapSolverOptions, problem: O) -> SolverResult<RunOutcome>
where
    O: CostFunction<Param = Theta, Output = Cost> + Gradient<Param = Theta, Gradient = Grad>,
{
    match opts.solver_algorithm {
        SolverAlgorithm::Lbfgs => {
            let solver = build_lbfgs(opts)?;
            execute(theta0, opts, problem, solver)
        }
        SolverAlgorithm::NonlinearConjugateGradient => {
            let solver = build_nonlinear_cg(opts)?;
            execute(theta0, opts, problem, solver)
        }
    }
}

/// Run any argmin solver on `problem`, starting from `theta0`.
///
/// Wires the initial parameter and `max_iters` into the executor and, when the
/// `obs_slog` feature is enabled and `opts.verbose` is set, attaches a
/// terminal slog observer that reports every iteration.
///
/// # Errors
/// - Any argmin runtime error (line-search failures, errors raised inside the
///   objective) converted through `From<argmin::core::Error>`.
/// - Validation errors from [`RunOutcome::new`].
pub fn execute<O, S>(
    theta0: Theta, opts: &MapSolverOptions, problem: O, solver: S,
) -> SolverResult<RunOutcome>
where
    O: CostFunction<Param = Theta, Output = Cost> + Gradient<Param = Theta, Gradient = Grad>,
    S: Solver<O, MapState>,
{
    if opts.verbose {
        log_initial_state(&theta0, &problem)?;
    }
    let max_iters = opts.max_iterations as u64;
    let mut executor = Executor::new(problem, solver);
    executor = executor.configure(|state| state.param(theta0).max_iters(max_iters));
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        let observer = argmin_observer_slog::SlogLogger::term_noblock();
        executor = executor.add_observer(observer, argmin::core::observers::ObserverMode::Always);
    }

    let mut result = executor.run()?.state().clone();
    let iterations = result.get_iter();
    let function_counts = result.get_func_counts().clone();
    let termination = result.get_termination_status().clone();
    let grad = result.take_gradient();
    let outcome = RunOutcome::new(
        result.take_best_param(),
        result.get_best_cost(),
        termination,
        iterations,
        function_counts,
        grad,
    )?;
    tracing::debug!(
        iterations = outcome.iterations,
        cost = outcome.cost,
        converged = outcome.converged,
        status = %outcome.status,
        "solver finished"
    );
    Ok(outcome)
}

// ---- Helper Methods ----

fn log_initial_state<O>(theta0: &Theta, problem: &O) -> SolverResult<()>
where
    O: CostFunction<Param = Theta, Output = Cost> + Gradient<Param = Theta, Gradient = Grad>,
{
    let cost0 = problem.cost(theta0)?;
    let grad_norm0 = problem.gradient(theta0).ok().map(|g| g.l2_norm());
    tracing::info!(cost = cost0, grad_norm = ?grad_norm0, "initial estimate");
    Ok(())
}

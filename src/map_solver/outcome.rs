//! Result of a full MAP solve.
use crate::{
    image::ImageData,
    optimization::{options::MapSolverOptions, outcome::RunOutcome},
};

/// Reconstructed image plus per-run diagnostics.
///
/// - `estimate`: high-resolution reconstruction.
/// - `runs`: one [`RunOutcome`] for a joint solve, or one per channel (in
///   channel order) when channels are split.
/// - `options`: the options actually used, with adjusted thresholds.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveOutcome {
    pub estimate: ImageData,
    pub runs: Vec<RunOutcome>,
    pub options: MapSolverOptions,
}

impl SolveOutcome {
    /// Sum of the final objective values over all runs.
    pub fn total_cost(&self) -> f64 {
        self.runs.iter().map(|run| run.cost).sum()
    }

    /// `true` when every run stopped on a convergence rule.
    pub fn converged(&self) -> bool {
        self.runs.iter().all(|run| run.converged)
    }

    pub fn iterations(&self) -> usize {
        self.runs.iter().map(|run| run.iterations).sum()
    }
}

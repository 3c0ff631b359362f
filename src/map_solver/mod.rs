//! map_solver — MAP super-resolution problem assembly and solving.
//!
//! Purpose
//! -------
//! Tie the pieces together: a [`MapSolver`] owns the aligned observations,
//! the weighted regularizers, and the options; a [`MapObjective`] exposes the
//! composite cost to argmin; a [`SolveOutcome`] carries the reconstruction
//! and diagnostics back to the caller.
//!
//! Downstream usage
//! ----------------
//! ```ignore
//! let model = DecimationModel::new(2)?;
//! let mut solver = MapSolver::new(&model, &low_res_images, MapSolverOptions::default())?;
//! solver.add_regularizer(Arc::new(TotalVariationRegularizer::new(1e-3)?), 0.01);
//! let start = low_res_images[0].resized(solver.image_size(), InterpolationMode::Linear)?;
//! let outcome = solver.solve(&start)?;
//! ```

pub mod core;
pub mod objective;
pub mod outcome;

pub use self::core::{num_data_points, MapSolver};
pub use objective::MapObjective;
pub use outcome::SolveOutcome;

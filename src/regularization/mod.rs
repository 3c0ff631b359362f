//! regularization — prior terms and their weighted aggregation.
//!
//! Purpose
//! -------
//! Supply the regularization half of the MAP objective: the [`Regularizer`]
//! capability, the ordered [`RegularizationSet`] a solver owns, and two
//! ready-made priors ([`SmoothnessRegularizer`],
//! [`TotalVariationRegularizer`]).
//!
//! Conventions
//! -----------
//! - Terms evaluate unweighted; weights live in the set.
//! - The sum of weights feeds adaptive threshold scaling in
//!   [`MapSolverOptions`](crate::optimization::options::MapSolverOptions).

pub mod set;
pub mod smoothness;
pub mod total_variation;
pub mod traits;

pub use set::{RegularizationEntry, RegularizationSet};
pub use smoothness::SmoothnessRegularizer;
pub use total_variation::TotalVariationRegularizer;
pub use traits::{EstimateShape, Regularizer};

//! regularization::set — ordered, weighted collection of prior terms.
//!
//! Purpose
//! -------
//! Hold every regularizer registered with a solver together with its weight,
//! and evaluate the weighted sum `Σ wᵢ·Rᵢ(x)` and its gradient.
//!
//! Invariants
//! ----------
//! - Entries keep insertion order and are never removed.
//! - Weights are stored as given. Zero, negative, and non-finite weights
//!   are accepted.
//! - Terms are shared (`Arc`), so the same term may sit in several sets.
use crate::{
    optimization::{
        errors::{SolverError, SolverResult},
        finite_diff::numerical_gradient,
        types::{Grad, Theta},
    },
    regularization::traits::{EstimateShape, Regularizer},
};
use std::{fmt, sync::Arc};

/// One registered term and its weight.
#[derive(Clone)]
pub struct RegularizationEntry {
    pub term: Arc<dyn Regularizer>,
    pub weight: f64,
}

impl fmt::Debug for RegularizationEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegularizationEntry")
            .field("term", &self.term.name())
            .field("weight", &self.weight)
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct RegularizationSet {
    entries: Vec<RegularizationEntry>,
}

impl RegularizationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `term` with `weight`. Never fails.
    pub fn add_regularizer(&mut self, term: Arc<dyn Regularizer>, weight: f64) {
        tracing::debug!(term = term.name(), weight, "registered regularizer");
        self.entries.push(RegularizationEntry { term, weight });
    }

    /// Sum of all weights, `0.0` for an empty set.
    pub fn regularization_parameter_sum(&self) -> f64 {
        self.entries.iter().map(|entry| entry.weight).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegularizationEntry> {
        self.entries.iter()
    }

    /// `Σ wᵢ·Rᵢ(estimate)`.
    ///
    /// # Errors
    /// The first error raised by a term.
    pub fn weighted_cost(&self, estimate: &Theta, shape: EstimateShape) -> SolverResult<f64> {
        self.entries.iter().try_fold(0.0, |acc, entry| {
            Ok(acc + entry.weight * entry.term.cost(estimate, shape)?)
        })
    }

    /// `Σ wᵢ·∇Rᵢ(estimate)`.
    ///
    /// Terms that return [`SolverError::GradientNotImplemented`] are
    /// differentiated numerically from their cost.
    ///
    /// # Errors
    /// Any other error raised by a term or by the finite-difference fallback.
    pub fn weighted_gradient(&self, estimate: &Theta, shape: EstimateShape) -> SolverResult<Grad> {
        let mut total = Grad::zeros(estimate.len());
        for entry in &self.entries {
            let grad = match entry.term.gradient(estimate, shape) {
                Ok(grad) => grad,
                Err(SolverError::GradientNotImplemented) => {
                    numerical_gradient(estimate, |x| entry.term.cost(x, shape))?
                }
                Err(err) => return Err(err),
            };
            if grad.len() != total.len() {
                return Err(SolverError::GradientDimMismatch {
                    expected: total.len(),
                    found: grad.len(),
                });
            }
            total.scaled_add(entry.weight, &grad);
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{image::ImageSize, regularization::SmoothnessRegularizer};
    use ndarray::array;

    // R(x) = Σ x², without an analytic gradient.
    struct SumOfSquares;

    impl Regularizer for SumOfSquares {
        fn name(&self) -> &str {
            "sum of squares"
        }

        fn cost(&self, estimate: &Theta, shape: EstimateShape) -> SolverResult<f64> {
            shape.check(estimate)?;
            Ok(estimate.mapv(|v| v * v).sum())
        }
    }

    #[test]
    // Purpose
    // -------
    // Weight sums follow registration, including negative weights.
    //
    // Given
    // -----
    // - Weights 0.25, 0.75 then -0.5.
    //
    // Expect
    // ------
    // - 0.0 before any term, 1.0 after two, 0.5 after three.
    fn parameter_sum_tracks_weights() {
        let mut set = RegularizationSet::new();
        assert_eq!(set.regularization_parameter_sum(), 0.0);
        assert!(set.is_empty());

        let shared: Arc<dyn Regularizer> = Arc::new(SmoothnessRegularizer::new());
        set.add_regularizer(Arc::clone(&shared), 0.25);
        set.add_regularizer(shared, 0.75);
        assert_eq!(set.regularization_parameter_sum(), 1.0);

        set.add_regularizer(Arc::new(SumOfSquares), -0.5);
        assert_eq!(set.regularization_parameter_sum(), 0.5);
        assert_eq!(set.len(), 3);
        let weights: Vec<f64> = set.iter().map(|e| e.weight).collect();
        assert_eq!(weights, vec![0.25, 0.75, -0.5]);
    }

    #[test]
    // Purpose
    // -------
    // Weights without an exact binary form sum within rounding error.
    //
    // Given
    // -----
    // - Weights 0.1, 0.2, 0.7.
    //
    // Expect
    // ------
    // - |sum − 1.0| < 1e-12.
    fn parameter_sum_within_rounding() {
        let mut set = RegularizationSet::new();
        for weight in [0.1, 0.2, 0.7] {
            set.add_regularizer(Arc::new(SmoothnessRegularizer::new()), weight);
        }
        let sum = set.regularization_parameter_sum();
        assert!((sum - 1.0).abs() < 1e-12, "weight sum {sum}");
    }

    #[test]
    // Purpose
    // -------
    // Weighted cost and gradient combine terms, with the finite-difference
    // fallback for terms lacking an analytic gradient.
    fn weighted_cost_and_gradient_with_fallback() {
        let shape = EstimateShape::new(ImageSize::new(2, 1), 1);
        let mut set = RegularizationSet::new();
        set.add_regularizer(Arc::new(SumOfSquares), 2.0);
        set.add_regularizer(Arc::new(SmoothnessRegularizer::new()), 1.0);

        let x = array![1.0, 3.0];
        // 2·(1 + 9) + (3 − 1)² = 24
        assert!((set.weighted_cost(&x, shape).expect("cost") - 24.0).abs() < 1e-12);

        // 2·(2, 6) + (−4, 4) = (0, 16)
        let grad = set.weighted_gradient(&x, shape).expect("gradient");
        assert!((grad[0] - 0.0).abs() < 1e-5);
        assert!((grad[1] - 16.0).abs() < 1e-5);
    }

    #[test]
    fn term_errors_propagate() {
        let shape = EstimateShape::new(ImageSize::new(2, 2), 1);
        let mut set = RegularizationSet::new();
        set.add_regularizer(Arc::new(SumOfSquares), 1.0);
        assert_eq!(
            set.weighted_cost(&array![1.0], shape),
            Err(SolverError::ThetaLengthMismatch { expected: 4, found: 1 })
        );
    }
}

//! Quadratic smoothness prior on neighboring pixel differences.
use crate::{
    optimization::{
        errors::SolverResult,
        types::{Grad, Theta},
    },
    regularization::traits::{EstimateShape, Regularizer},
};

/// `R(x) = Σ (x[r,c+1] − x[r,c])² + (x[r+1,c] − x[r,c])²`, summed over
/// every channel. Differences past the border are zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SmoothnessRegularizer;

impl SmoothnessRegularizer {
    pub fn new() -> Self {
        Self
    }
}

impl Regularizer for SmoothnessRegularizer {
    fn name(&self) -> &str {
        "smoothness"
    }

    fn cost(&self, estimate: &Theta, shape: EstimateShape) -> SolverResult<f64> {
        shape.check(estimate)?;
        let (w, h) = (shape.size.width, shape.size.height);
        let mut total = 0.0;
        for ch in 0..shape.num_channels {
            for r in 0..h {
                for c in 0..w {
                    let v = estimate[shape.index(ch, r, c)];
                    if c + 1 < w {
                        total += (estimate[shape.index(ch, r, c + 1)] - v).powi(2);
                    }
                    if r + 1 < h {
                        total += (estimate[shape.index(ch, r + 1, c)] - v).powi(2);
                    }
                }
            }
        }
        Ok(total)
    }

    fn gradient(&self, estimate: &Theta, shape: EstimateShape) -> SolverResult<Grad> {
        shape.check(estimate)?;
        let (w, h) = (shape.size.width, shape.size.height);
        let mut grad = Grad::zeros(estimate.len());
        for ch in 0..shape.num_channels {
            for r in 0..h {
                for c in 0..w {
                    let i = shape.index(ch, r, c);
                    if c + 1 < w {
                        let j = shape.index(ch, r, c + 1);
                        let d = 2.0 * (estimate[j] - estimate[i]);
                        grad[j] += d;
                        grad[i] -= d;
                    }
                    if r + 1 < h {
                        let j = shape.index(ch, r + 1, c);
                        let d = 2.0 * (estimate[j] - estimate[i]);
                        grad[j] += d;
                        grad[i] -= d;
                    }
                }
            }
        }
        Ok(grad)
    }
}

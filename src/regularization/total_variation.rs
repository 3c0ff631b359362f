//! Smoothed (Charbonnier) total-variation prior.
use crate::{
    optimization::{
        errors::{SolverError, SolverResult},
        types::{Grad, Theta},
    },
    regularization::traits::{EstimateShape, Regularizer},
};

/// `R(x) = Σ sqrt(dx² + dy² + ε²)` with forward differences `dx`, `dy`
/// (zero past the right and bottom borders), summed over every channel.
///
/// `ε > 0` keeps the term differentiable at flat regions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TotalVariationRegularizer {
    epsilon: f64,
}

impl TotalVariationRegularizer {
    /// # Errors
    /// [`SolverError::InvalidRegularizerParameter`] unless `epsilon` is finite
    /// and strictly positive.
    pub fn new(epsilon: f64) -> SolverResult<Self> {
        if !epsilon.is_finite() || epsilon <= 0.0 {
            return Err(SolverError::InvalidRegularizerParameter { name: "epsilon", value: epsilon });
        }
        Ok(Self { epsilon })
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    // (flat index, dx, dy, magnitude) for every pixel.
    fn for_each_pixel<F>(&self, estimate: &Theta, shape: EstimateShape, mut visit: F)
    where
        F: FnMut(usize, Option<(usize, f64)>, Option<(usize, f64)>, f64),
    {
        let (w, h) = (shape.size.width, shape.size.height);
        let eps2 = self.epsilon * self.epsilon;
        for ch in 0..shape.num_channels {
            for r in 0..h {
                for c in 0..w {
                    let i = shape.index(ch, r, c);
                    let right = (c + 1 < w).then(|| {
                        let j = shape.index(ch, r, c + 1);
                        (j, estimate[j] - estimate[i])
                    });
                    let down = (r + 1 < h).then(|| {
                        let j = shape.index(ch, r + 1, c);
                        (j, estimate[j] - estimate[i])
                    });
                    let dx = right.map_or(0.0, |(_, d)| d);
                    let dy = down.map_or(0.0, |(_, d)| d);
                    visit(i, right, down, (dx * dx + dy * dy + eps2).sqrt());
                }
            }
        }
    }
}

impl Regularizer for TotalVariationRegularizer {
    fn name(&self) -> &str {
        "total variation"
    }

    fn cost(&self, estimate: &Theta, shape: EstimateShape) -> SolverResult<f64> {
        shape.check(estimate)?;
        let mut total = 0.0;
        self.for_each_pixel(estimate, shape, |_, _, _, magnitude| total += magnitude);
        Ok(total)
    }

    fn gradient(&self, estimate: &Theta, shape: EstimateShape) -> SolverResult<Grad> {
        shape.check(estimate)?;
        let mut grad = Grad::zeros(estimate.len());
        self.for_each_pixel(estimate, shape, |i, right, down, magnitude| {
            for (j, d) in right.into_iter().chain(down) {
                grad[j] += d / magnitude;
                grad[i] -= d / magnitude;
            }
        });
        Ok(grad)
    }
}

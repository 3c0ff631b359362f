//! MAP solver options — algorithm choice, differentiation, and stopping rules.
//!
//! Purpose
//! -------
//! Collect every knob the optimization backend consumes when solving a MAP
//! super-resolution problem: which iterative solver to run, how gradients
//! are obtained, whether channels are solved independently, and the three
//! convergence thresholds. Also owns adaptive threshold scaling, which keeps
//! the stopping rules meaningful across problems of very different size and
//! regularization strength.
//!
//! Key behaviors
//! -------------
//! - [`MapSolverOptions::new`] and [`MapSolverOptions::validate`] reject
//!   non-finite or non-positive thresholds, steps, and limits.
//! - [`MapSolverOptions::adjust_thresholds_adaptively`] multiplies all three
//!   thresholds by `num_parameters × regularization_parameter_sum` when that
//!   product is at least 1.0, and otherwise leaves them untouched.
//! - [`MapSolverOptions::describe`] (and `Display`) render the human-readable
//!   configuration summary.
//! - [`SolverAlgorithm`] parses case-insensitively via `FromStr`, and the
//!   whole options struct deserializes with `serde` so host applications can
//!   load it from a config file.
//!
//! Invariants & assumptions
//! ------------------------
//! - Thresholds only ever grow: the adaptive step never relaxes them
//!   downward.
//! - The solver applies the adaptive step to a copy of the options exactly
//!   once per solve, before iterating; options stored on a solver are never
//!   compounded across solves.
//!
//! Testing notes
//! -------------
//! - Unit tests cover the scaling rule on both sides of 1.0, validation of
//!   every numeric field, string parsing, the configuration summary, and
//!   loading from JSON.
use crate::optimization::{
    errors::{SolverError, SolverResult},
    validation::{
        verify_lbfgs_memory, verify_max_iterations, verify_numerical_step, verify_threshold,
    },
};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Default cap on solver iterations.
pub const DEFAULT_MAX_ITERATIONS: usize = 50;

/// Default value of each convergence threshold before adaptive scaling.
pub const DEFAULT_THRESHOLD: f64 = 1e-6;

/// Default finite-difference step for [`Differentiation::Numerical`].
pub const DEFAULT_NUMERICAL_STEP: f64 = 1e-6;

/// Iterative least-squares algorithm run by the backend.
///
/// Parsing accepts (case-insensitive) `"cg"`, `"ncg"`,
/// `"conjugate_gradient"`, `"nonlinear_conjugate_gradient"`, `"lbfgs"`, and
/// `"l-bfgs"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverAlgorithm {
    #[default]
    NonlinearConjugateGradient,
    Lbfgs,
}

impl SolverAlgorithm {
    /// Name used in the configuration summary.
    pub fn display_name(&self) -> &'static str {
        match self {
            SolverAlgorithm::NonlinearConjugateGradient => "conjugate gradient",
            SolverAlgorithm::Lbfgs => "LBFGS",
        }
    }
}

impl FromStr for SolverAlgorithm {
    type Err = SolverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "cg" | "ncg" | "conjugate_gradient" | "nonlinear_conjugate_gradient" => {
                Ok(SolverAlgorithm::NonlinearConjugateGradient)
            }
            "lbfgs" | "l_bfgs" => Ok(SolverAlgorithm::Lbfgs),
            _ => Err(SolverError::InvalidSolverAlgorithm { name: s.to_string() }),
        }
    }
}

/// How the objective gradient is obtained.
///
/// - `Analytical`: closed-form data-term gradient plus each regularizer's
///   analytic gradient (finite differences only for regularizers that do not
///   provide one).
/// - `Numerical { step }`: central differences of the full objective with
///   the given step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Differentiation {
    #[default]
    Analytical,
    Numerical { step: f64 },
}

/// Configuration consumed by the MAP solver and its optimization backend.
///
/// Fields
/// ------
/// - `solver_algorithm`: nonlinear conjugate gradient (default) or L-BFGS.
/// - `differentiation`: analytical (default) or numerical with a step.
/// - `split_channels`: solve each channel as an independent problem.
/// - `gradient_norm_threshold`: stop once `‖∇c‖` falls below this value.
/// - `cost_decrease_threshold`: stop once `|c_{k-1} − c_k|` falls below this
///   value.
/// - `parameter_variation_threshold`: stop once `‖x_k − x_{k-1}‖` falls
///   below this value.
/// - `max_iterations`: hard cap on iterations per run.
/// - `lbfgs_memory`: optional L-BFGS history size; `None` uses
///   [`DEFAULT_LBFGS_MEM`](crate::optimization::types::DEFAULT_LBFGS_MEM).
/// - `verbose`: log the configuration summary (and, with the `obs_slog`
///   feature, per-iteration progress).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapSolverOptions {
    pub solver_algorithm: SolverAlgorithm,
    pub differentiation: Differentiation,
    pub split_channels: bool,
    pub gradient_norm_threshold: f64,
    pub cost_decrease_threshold: f64,
    pub parameter_variation_threshold: f64,
    pub max_iterations: usize,
    pub lbfgs_memory: Option<usize>,
    pub verbose: bool,
}

impl Default for MapSolverOptions {
    fn default() -> Self {
        Self {
            solver_algorithm: SolverAlgorithm::default(),
            differentiation: Differentiation::default(),
            split_channels: false,
            gradient_norm_threshold: DEFAULT_THRESHOLD,
            cost_decrease_threshold: DEFAULT_THRESHOLD,
            parameter_variation_threshold: DEFAULT_THRESHOLD,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            lbfgs_memory: None,
            verbose: false,
        }
    }
}

impl MapSolverOptions {
    /// Build validated options with default iteration limits.
    ///
    /// # Errors
    /// Any error from [`MapSolverOptions::validate`].
    pub fn new(
        solver_algorithm: SolverAlgorithm, differentiation: Differentiation, split_channels: bool,
        gradient_norm_threshold: f64, cost_decrease_threshold: f64,
        parameter_variation_threshold: f64, verbose: bool,
    ) -> SolverResult<Self> {
        let opts = Self {
            solver_algorithm,
            differentiation,
            split_channels,
            gradient_norm_threshold,
            cost_decrease_threshold,
            parameter_variation_threshold,
            verbose,
            ..Self::default()
        };
        opts.validate()?;
        Ok(opts)
    }

    /// Override the iteration cap and L-BFGS memory.
    ///
    /// # Errors
    /// [`SolverError::InvalidMaxIterations`] or
    /// [`SolverError::InvalidLbfgsMemory`].
    pub fn with_limits(
        mut self, max_iterations: usize, lbfgs_memory: Option<usize>,
    ) -> SolverResult<Self> {
        verify_max_iterations(max_iterations)?;
        verify_lbfgs_memory(lbfgs_memory)?;
        self.max_iterations = max_iterations;
        self.lbfgs_memory = lbfgs_memory;
        Ok(self)
    }

    /// Check every numeric field.
    ///
    /// Options built through `Default` or deserialization bypass [`new`], so
    /// the solver calls this again before each run.
    ///
    /// [`new`]: MapSolverOptions::new
    pub fn validate(&self) -> SolverResult<()> {
        verify_threshold("gradient norm", self.gradient_norm_threshold)?;
        verify_threshold("cost decrease", self.cost_decrease_threshold)?;
        verify_threshold("parameter variation", self.parameter_variation_threshold)?;
        if let Differentiation::Numerical { step } = self.differentiation {
            verify_numerical_step(step)?;
        }
        verify_max_iterations(self.max_iterations)?;
        verify_lbfgs_memory(self.lbfgs_memory)?;
        Ok(())
    }

    /// Rescale the convergence thresholds to the problem size and the total
    /// regularization weight.
    ///
    /// Computes `scale = num_parameters × regularization_parameter_sum`. When
    /// `scale < 1.0` (or is NaN) the thresholds are left unchanged; they are
    /// only ever scaled up. Otherwise the gradient-norm, cost-decrease, and
    /// parameter-variation thresholds are each multiplied by `scale`.
    ///
    /// A NaN weight sum is treated as "no scaling" rather than propagated
    /// into the thresholds, which would disable every threshold test.
    pub fn adjust_thresholds_adaptively(
        &mut self, num_parameters: usize, regularization_parameter_sum: f64,
    ) {
        let threshold_scale = num_parameters as f64 * regularization_parameter_sum;
        if threshold_scale.is_nan() || threshold_scale < 1.0 {
            tracing::debug!(threshold_scale, "thresholds left unscaled");
            return;
        }
        self.gradient_norm_threshold *= threshold_scale;
        self.cost_decrease_threshold *= threshold_scale;
        self.parameter_variation_threshold *= threshold_scale;
        tracing::debug!(
            threshold_scale,
            gradient_norm = self.gradient_norm_threshold,
            cost_decrease = self.cost_decrease_threshold,
            parameter_variation = self.parameter_variation_threshold,
            "scaled convergence thresholds"
        );
    }

    /// Human-readable configuration summary, one setting per line.
    pub fn describe(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for MapSolverOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "  Least squares solver:                {}", self.solver_algorithm.display_name())?;
        match self.differentiation {
            Differentiation::Numerical { step } => {
                writeln!(f, " (numerical differentiation [step = {step}])")?
            }
            Differentiation::Analytical => writeln!(f, " (analytical differentiation)")?,
        }
        if self.split_channels {
            writeln!(f, "  Channel splitting enabled.")?;
        }
        writeln!(f, "  Threshold 1 (gradient norm):         {}", self.gradient_norm_threshold)?;
        writeln!(f, "  Threshold 2 (cost decrease):         {}", self.cost_decrease_threshold)?;
        write!(f, "  Threshold 3 (parameter variation):   {}", self.parameter_variation_threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options_with_thresholds(g: f64, c: f64, p: f64) -> MapSolverOptions {
        MapSolverOptions::new(
            SolverAlgorithm::Lbfgs,
            Differentiation::Analytical,
            false,
            g,
            c,
            p,
            false,
        )
        .expect("options should be valid")
    }

    #[test]
    // Purpose
    // -------
    // When `num_parameters × weight_sum < 1`, the adaptive step is a no-op.
    //
    // Given
    // -----
    // - Thresholds (1e-3, 2e-3, 3e-3).
    // - Several (n, sum) pairs whose product is below 1.0, including a zero
    //   weight sum and a negative one.
    //
    // Expect
    // ------
    // - All three thresholds are bit-for-bit unchanged.
    fn adjust_thresholds_is_noop_below_unit_scale() {
        for (n, sum) in [(0usize, 5.0), (10, 0.0), (10, 0.05), (3, 0.3), (100, -2.0)] {
            let mut opts = options_with_thresholds(1e-3, 2e-3, 3e-3);
            opts.adjust_thresholds_adaptively(n, sum);
            assert_eq!(opts.gradient_norm_threshold, 1e-3);
            assert_eq!(opts.cost_decrease_threshold, 2e-3);
            assert_eq!(opts.parameter_variation_threshold, 3e-3);
        }
    }

    #[test]
    // Purpose
    // -------
    // When the scale is at least 1, every threshold is multiplied by exactly
    // `num_parameters × weight_sum`.
    //
    // Given
    // -----
    // - n = 30000, sum = 0.5 → scale = 15000.
    // - n = 4, sum = 0.25 → scale = 1 (boundary).
    //
    // Expect
    // ------
    // - Each threshold equals its prior value times the scale.
    fn adjust_thresholds_scales_by_exact_product() {
        let mut opts = options_with_thresholds(1e-3, 2e-3, 3e-3);
        opts.adjust_thresholds_adaptively(30_000, 0.5);
        let scale = 30_000.0 * 0.5;
        assert_eq!(opts.gradient_norm_threshold, 1e-3 * scale);
        assert_eq!(opts.cost_decrease_threshold, 2e-3 * scale);
        assert_eq!(opts.parameter_variation_threshold, 3e-3 * scale);

        let mut boundary = options_with_thresholds(1e-3, 2e-3, 3e-3);
        boundary.adjust_thresholds_adaptively(4, 0.25);
        assert_eq!(boundary.gradient_norm_threshold, 1e-3);
        assert_eq!(boundary.parameter_variation_threshold, 3e-3);
    }

    #[test]
    fn adjust_thresholds_never_decreases() {
        let mut opts = options_with_thresholds(1e-3, 1e-3, 1e-3);
        let before = opts.clone();
        opts.adjust_thresholds_adaptively(7, 0.9);
        assert!(opts.gradient_norm_threshold >= before.gradient_norm_threshold);
        assert!(opts.cost_decrease_threshold >= before.cost_decrease_threshold);
        assert!(opts.parameter_variation_threshold >= before.parameter_variation_threshold);
    }

    #[test]
    // Purpose
    // -------
    // A NaN weight sum leaves the thresholds finite and unchanged.
    fn adjust_thresholds_ignores_nan_scale() {
        let mut opts = options_with_thresholds(1e-6, 2e-6, 3e-6);
        opts.adjust_thresholds_adaptively(1000, f64::NAN);
        assert_eq!(opts.gradient_norm_threshold, 1e-6);
        assert_eq!(opts.cost_decrease_threshold, 2e-6);
        assert_eq!(opts.parameter_variation_threshold, 3e-6);
    }

    #[test]
    // Purpose
    // -------
    // `new` rejects invalid thresholds and numerical steps.
    fn new_rejects_invalid_numeric_fields() {
        let bad_threshold = MapSolverOptions::new(
            SolverAlgorithm::Lbfgs,
            Differentiation::Analytical,
            false,
            0.0,
            1e-6,
            1e-6,
            false,
        );
        assert!(matches!(
            bad_threshold,
            Err(SolverError::InvalidThreshold { name: "gradient norm", .. })
        ));

        let bad_step = MapSolverOptions::new(
            SolverAlgorithm::Lbfgs,
            Differentiation::Numerical { step: -1e-3 },
            false,
            1e-6,
            1e-6,
            1e-6,
            false,
        );
        assert_eq!(bad_step, Err(SolverError::InvalidNumericalStep { step: -1e-3 }));
    }

    #[test]
    fn with_limits_rejects_zero_iterations_and_memory() {
        let opts = MapSolverOptions::default();
        assert!(matches!(
            opts.clone().with_limits(0, None),
            Err(SolverError::InvalidMaxIterations { .. })
        ));
        assert!(matches!(
            opts.clone().with_limits(10, Some(0)),
            Err(SolverError::InvalidLbfgsMemory { .. })
        ));
        let ok = opts.with_limits(10, Some(4)).expect("limits should be valid");
        assert_eq!(ok.max_iterations, 10);
        assert_eq!(ok.lbfgs_memory, Some(4));
    }

    #[test]
    fn solver_algorithm_parses_case_insensitively() {
        assert_eq!("LBFGS".parse::<SolverAlgorithm>(), Ok(SolverAlgorithm::Lbfgs));
        assert_eq!("l-bfgs".parse::<SolverAlgorithm>(), Ok(SolverAlgorithm::Lbfgs));
        assert_eq!(
            "Conjugate_Gradient".parse::<SolverAlgorithm>(),
            Ok(SolverAlgorithm::NonlinearConjugateGradient)
        );
        assert!(matches!(
            "newton".parse::<SolverAlgorithm>(),
            Err(SolverError::InvalidSolverAlgorithm { .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // The summary reports solver, differentiation mode with step, the
    // channel-split flag, and all three thresholds.
    fn describe_reports_every_setting() {
        let mut opts = MapSolverOptions::new(
            SolverAlgorithm::Lbfgs,
            Differentiation::Numerical { step: 0.5 },
            true,
            0.25,
            0.125,
            2.0,
            true,
        )
        .expect("options should be valid");
        let text = opts.describe();
        assert!(text.contains("LBFGS (numerical differentiation [step = 0.5])"));
        assert!(text.contains("Channel splitting enabled."));
        assert!(text.contains("Threshold 1 (gradient norm):         0.25"));
        assert!(text.contains("Threshold 2 (cost decrease):         0.125"));
        assert!(text.contains("Threshold 3 (parameter variation):   2"));

        opts.solver_algorithm = SolverAlgorithm::NonlinearConjugateGradient;
        opts.differentiation = Differentiation::Analytical;
        opts.split_channels = false;
        let text = opts.describe();
        assert!(text.contains("conjugate gradient (analytical differentiation)"));
        assert!(!text.contains("Channel splitting"));
    }

    #[test]
    // Purpose
    // -------
    // Options load from JSON; missing fields fall back to defaults.
    fn options_deserialize_with_defaults() {
        let json = r#"{
            "solver_algorithm": "lbfgs",
            "differentiation": { "mode": "numerical", "step": 0.001 },
            "gradient_norm_threshold": 0.01
        }"#;
        let opts: MapSolverOptions = serde_json::from_str(json).expect("valid JSON options");
        assert_eq!(opts.solver_algorithm, SolverAlgorithm::Lbfgs);
        assert_eq!(opts.differentiation, Differentiation::Numerical { step: 0.001 });
        assert_eq!(opts.gradient_norm_threshold, 0.01);
        assert_eq!(opts.cost_decrease_threshold, DEFAULT_THRESHOLD);
        assert_eq!(opts.max_iterations, DEFAULT_MAX_ITERATIONS);
        assert!(opts.validate().is_ok());
    }
}

//! optimization::errors — unified error surface for MAP super-resolution.
//!
//! Every fallible operation in the crate (problem assembly, option
//! validation, objective evaluation, and the argmin backend) reports a
//! [`SolverError`] through the [`SolverResult<T>`] alias. Backend errors are
//! normalized here so callers never see raw `argmin::core::Error` values.
use argmin::core::{ArgminError, Error};

/// Crate-wide result alias.
pub type SolverResult<T> = Result<T, SolverError>;

#[derive(Debug, Clone, PartialEq)]
pub enum SolverError {
    // ---- Problem assembly ----
    /// No low-resolution images were supplied.
    EmptyObservations,

    /// A low-resolution image disagrees with the first image's channel count.
    ChannelCountMismatch {
        index: usize,
        expected: usize,
        found: usize,
    },

    /// Forward model reported an unusable downsampling scale.
    InvalidScale {
        scale: usize,
    },

    /// Scaling a dimension by the model scale overflowed.
    DimensionOverflow {
        dimension: usize,
        scale: usize,
    },

    /// Number of unknowns exceeds the optimizer's signed 32-bit index range.
    DataPointOverflow {
        width: usize,
        height: usize,
        channels: usize,
    },

    // ---- Pixel buffers ----
    /// An image must have at least one channel.
    NoChannels,

    /// Image width and height must both be non-zero.
    InvalidImageSize {
        width: usize,
        height: usize,
    },

    /// Channel planes within one image must share a shape.
    ChannelShapeMismatch {
        channel: usize,
        expected: (usize, usize),
        found: (usize, usize),
    },

    /// Channel index out of range.
    ChannelOutOfRange {
        channel: usize,
        num_channels: usize,
    },

    /// Flat parameter vector does not match the image layout.
    ThetaLengthMismatch {
        expected: usize,
        found: usize,
    },

    /// Estimate passed to the solver does not match the problem shape.
    EstimateShapeMismatch {
        expected: (usize, usize, usize),
        found: (usize, usize, usize),
    },

    /// Unknown interpolation name.
    InvalidInterpolation {
        name: String,
    },

    // ---- Forward model ----
    /// Observation index not known to the forward model.
    ObservationOutOfRange {
        index: usize,
        num_observations: usize,
    },

    /// Image size is not a multiple of the model scale.
    IncompatibleImageSize {
        width: usize,
        height: usize,
        scale: usize,
    },

    // ---- MapSolverOptions ----
    /// Convergence thresholds must be finite and strictly positive.
    InvalidThreshold {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    /// Finite-difference step must be finite and strictly positive.
    InvalidNumericalStep {
        step: f64,
    },

    /// Maximum iterations must be positive.
    InvalidMaxIterations {
        max_iterations: usize,
    },

    /// L-BFGS memory must be at least one.
    InvalidLbfgsMemory {
        memory: usize,
    },

    /// Unknown solver algorithm name.
    InvalidSolverAlgorithm {
        name: String,
    },

    // ---- Regularization ----
    /// Regularizer hyper-parameter must be finite and strictly positive.
    InvalidRegularizerParameter {
        name: &'static str,
        value: f64,
    },

    // ---- Objective ----
    /// Regularizer does not provide an analytic gradient.
    GradientNotImplemented,

    /// Gradient dimensions do not match parameter dimensions.
    GradientDimMismatch {
        expected: usize,
        found: usize,
    },

    /// Gradient elements need to be finite.
    InvalidGradient {
        index: usize,
        value: f64,
    },

    /// Objective evaluated to NaN or infinity.
    NonFiniteCost {
        value: f64,
    },

    /// Solver finished without a best parameter vector.
    MissingEstimate,

    /// Best parameter vector contains a non-finite entry.
    InvalidEstimate {
        index: usize,
        value: f64,
    },

    // ---- Argmin ----
    /// Wrapper for argmin::InvalidParameter
    InvalidParameter {
        text: String,
    },
    /// Wrapper for argmin::NotImplemented
    NotImplemented {
        text: String,
    },
    /// Wrapper for argmin::NotInitialized
    NotInitialized {
        text: String,
    },
    /// Wrapper for argmin::ConditionViolated
    ConditionViolated {
        text: String,
    },
    /// Wrapper for argmin::PotentialBug
    PotentialBug {
        text: String,
    },
    /// Any other backend failure.
    BackendError {
        text: String,
    },

    // ---- Fallback ----
    UnknownError,
}

impl std::error::Error for SolverError {}

impl std::fmt::Display for SolverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Problem assembly ----
            SolverError::EmptyObservations => {
                write!(f, "Cannot super-resolve with 0 low-res images")
            }
            SolverError::ChannelCountMismatch { index, expected, found } => {
                write!(
                    f,
                    "Image channel counts do not match up: image {index} has {found}, expected {expected}"
                )
            }
            SolverError::InvalidScale { scale } => {
                write!(f, "Invalid downsampling scale {scale}: must be at least 1")
            }
            SolverError::DimensionOverflow { dimension, scale } => {
                write!(f, "Image dimension {dimension} overflows when scaled by {scale}")
            }
            SolverError::DataPointOverflow { width, height, channels } => {
                write!(
                    f,
                    "Number of data points exceeds maximum size: {width} x {height} x {channels} > {}",
                    i32::MAX
                )
            }

            // ---- Pixel buffers ----
            SolverError::NoChannels => write!(f, "Image must have at least one channel"),
            SolverError::InvalidImageSize { width, height } => {
                write!(f, "Invalid image size {width} x {height}: dimensions must be non-zero")
            }
            SolverError::ChannelShapeMismatch { channel, expected, found } => {
                write!(
                    f,
                    "Channel {channel} has shape {found:?}, expected {expected:?} (rows, cols)"
                )
            }
            SolverError::ChannelOutOfRange { channel, num_channels } => {
                write!(f, "Channel {channel} out of range for image with {num_channels} channels")
            }
            SolverError::ThetaLengthMismatch { expected, found } => {
                write!(f, "Parameter vector length mismatch: expected {expected}, found {found}")
            }
            SolverError::EstimateShapeMismatch { expected, found } => {
                write!(
                    f,
                    "Estimate shape mismatch: expected {expected:?}, found {found:?} (width, height, channels)"
                )
            }
            SolverError::InvalidInterpolation { name } => {
                write!(
                    f,
                    "Invalid interpolation mode '{name}': valid options are 'nearest' or 'linear'"
                )
            }

            // ---- Forward model ----
            SolverError::ObservationOutOfRange { index, num_observations } => {
                write!(
                    f,
                    "Observation index {index} out of range for model with {num_observations} observations"
                )
            }
            SolverError::IncompatibleImageSize { width, height, scale } => {
                write!(f, "Image size {width} x {height} is not divisible by scale {scale}")
            }

            // ---- MapSolverOptions ----
            SolverError::InvalidThreshold { name, value, reason } => {
                write!(f, "Invalid {name} threshold {value}: {reason}")
            }
            SolverError::InvalidNumericalStep { step } => {
                write!(f, "Invalid numerical differentiation step {step}: must be finite and > 0")
            }
            SolverError::InvalidMaxIterations { max_iterations } => {
                write!(f, "Invalid maximum iterations {max_iterations}: must be greater than zero")
            }
            SolverError::InvalidLbfgsMemory { memory } => {
                write!(f, "Invalid L-BFGS memory {memory}: must be greater than zero")
            }
            SolverError::InvalidSolverAlgorithm { name } => {
                write!(
                    f,
                    "Invalid solver algorithm '{name}': valid options are 'cg' or 'lbfgs'"
                )
            }

            // ---- Regularization ----
            SolverError::InvalidRegularizerParameter { name, value } => {
                write!(f, "Invalid regularizer parameter {name} = {value}: must be finite and > 0")
            }

            // ---- Objective ----
            SolverError::GradientNotImplemented => {
                write!(f, "Analytic gradient not implemented")
            }
            SolverError::GradientDimMismatch { expected, found } => {
                write!(f, "Gradient dimension mismatch: expected {expected}, found {found}")
            }
            SolverError::InvalidGradient { index, value } => {
                write!(f, "Invalid gradient at index {index}: {value}, must be finite")
            }
            SolverError::NonFiniteCost { value } => {
                write!(f, "Non-finite cost value: {value}")
            }
            SolverError::MissingEstimate => {
                write!(f, "Solver returned no estimate")
            }
            SolverError::InvalidEstimate { index, value } => {
                write!(f, "Invalid estimate at index {index}: {value}, must be finite")
            }

            // ---- Argmin ----
            SolverError::InvalidParameter { text } => write!(f, "Invalid parameter: {text}"),
            SolverError::NotImplemented { text } => write!(f, "Not implemented: {text}"),
            SolverError::NotInitialized { text } => write!(f, "Not initialized: {text}"),
            SolverError::ConditionViolated { text } => write!(f, "Condition violated: {text}"),
            SolverError::PotentialBug { text } => write!(f, "Potential bug: {text}"),
            SolverError::BackendError { text } => write!(f, "Backend error: {text}"),

            // ---- Fallback ----
            SolverError::UnknownError => write!(f, "Unknown error"),
        }
    }
}

impl From<Error> for SolverError {
    fn from(original_err: Error) -> Self {
        // Errors raised by our own objective travel through argmin boxed.
        let original_err = match original_err.downcast::<SolverError>() {
            Ok(err) => return err,
            Err(err) => err,
        };
        match original_err.downcast() {
            Ok(opt_err) => match opt_err {
                ArgminError::InvalidParameter { text } => SolverError::InvalidParameter { text },
                ArgminError::NotImplemented { text } => SolverError::NotImplemented { text },
                ArgminError::NotInitialized { text } => SolverError::NotInitialized { text },
                ArgminError::ConditionViolated { text } => SolverError::ConditionViolated { text },
                ArgminError::PotentialBug { text } => SolverError::PotentialBug { text },
                _ => SolverError::UnknownError,
            },
            Err(err) => SolverError::BackendError { text: err.to_string() },
        }
    }
}

#[cfg(feature = "python-bindings")]
impl From<SolverError> for pyo3::PyErr {
    fn from(err: SolverError) -> pyo3::PyErr {
        pyo3::exceptions::PyValueError::new_err(format!("SolverError: {err}"))
    }
}

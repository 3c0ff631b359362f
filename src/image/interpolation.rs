//! Resampling of single channel planes between grid sizes.
use crate::{
    image::image_data::ImageSize,
    optimization::errors::{SolverError, SolverResult},
};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// How samples are taken when an image changes size.
///
/// - `Nearest`: destination index `d` reads source index `⌊d·src/dst⌋`. An
///   integer upscale by `s` therefore copies each source sample into the
///   `s×s` block whose top-left corner is the aligned grid position.
/// - `Linear`: bilinear interpolation on pixel centres, clamped at the
///   border.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpolationMode {
    #[default]
    Nearest,
    Linear,
}

impl InterpolationMode {
    /// Resample `plane` (rows × cols) onto `size`.
    pub fn resample(&self, plane: &Array2<f64>, size: ImageSize) -> Array2<f64> {
        match self {
            InterpolationMode::Nearest => resample_nearest(plane, size),
            InterpolationMode::Linear => resample_linear(plane, size),
        }
    }
}

impl fmt::Display for InterpolationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterpolationMode::Nearest => write!(f, "nearest"),
            InterpolationMode::Linear => write!(f, "linear"),
        }
    }
}

impl FromStr for InterpolationMode {
    type Err = SolverError;

    fn from_str(s: &str) -> SolverResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nearest" | "nearest_neighbor" | "nn" => Ok(InterpolationMode::Nearest),
            "linear" | "bilinear" => Ok(InterpolationMode::Linear),
            _ => Err(SolverError::InvalidInterpolation { name: s.to_string() }),
        }
    }
}

// ---- Helper methods ----

fn resample_nearest(plane: &Array2<f64>, size: ImageSize) -> Array2<f64> {
    let (src_rows, src_cols) = plane.dim();
    Array2::from_shape_fn((size.height, size.width), |(r, c)| {
        plane[[r * src_rows / size.height, c * src_cols / size.width]]
    })
}

fn resample_linear(plane: &Array2<f64>, size: ImageSize) -> Array2<f64> {
    let (src_rows, src_cols) = plane.dim();
    let rows: Vec<(usize, usize, f64)> =
        (0..size.height).map(|r| linear_taps(r, src_rows, size.height)).collect();
    let cols: Vec<(usize, usize, f64)> =
        (0..size.width).map(|c| linear_taps(c, src_cols, size.width)).collect();
    Array2::from_shape_fn((size.height, size.width), |(r, c)| {
        let (r0, r1, tr) = rows[r];
        let (c0, c1, tc) = cols[c];
        let top = plane[[r0, c0]] * (1.0 - tc) + plane[[r0, c1]] * tc;
        let bottom = plane[[r1, c0]] * (1.0 - tc) + plane[[r1, c1]] * tc;
        top * (1.0 - tr) + bottom * tr
    })
}

// Lower index, upper index, and weight of the upper index for destination `d`.
fn linear_taps(d: usize, src: usize, dst: usize) -> (usize, usize, f64) {
    let last = (src - 1) as f64;
    let pos = ((d as f64 + 0.5) * src as f64 / dst as f64 - 0.5).clamp(0.0, last);
    let lo = pos.floor() as usize;
    let hi = (lo + 1).min(src - 1);
    (lo, hi, pos - lo as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn parses_mode_names() {
        assert_eq!("Nearest".parse::<InterpolationMode>(), Ok(InterpolationMode::Nearest));
        assert_eq!("nn".parse::<InterpolationMode>(), Ok(InterpolationMode::Nearest));
        assert_eq!(" bilinear ".parse::<InterpolationMode>(), Ok(InterpolationMode::Linear));
        assert!(matches!(
            "cubic".parse::<InterpolationMode>(),
            Err(SolverError::InvalidInterpolation { .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Integer nearest upscaling replicates each sample over its block.
    fn nearest_upscale_replicates_blocks() {
        let plane = array![[1.0, 2.0], [3.0, 4.0]];
        let up = InterpolationMode::Nearest.resample(&plane, ImageSize::new(4, 4));
        assert_eq!(
            up,
            array![
                [1.0, 1.0, 2.0, 2.0],
                [1.0, 1.0, 2.0, 2.0],
                [3.0, 3.0, 4.0, 4.0],
                [3.0, 3.0, 4.0, 4.0]
            ]
        );
    }

    #[test]
    // Purpose
    // -------
    // Linear resampling preserves constants and stays within the source
    // range.
    fn linear_preserves_constant_and_bounds() {
        let flat = Array2::from_elem((3, 5), 2.5);
        let up = InterpolationMode::Linear.resample(&flat, ImageSize::new(10, 6));
        assert!(up.iter().all(|&v| (v - 2.5).abs() < 1e-12));

        let ramp = array![[0.0, 1.0]];
        let up = InterpolationMode::Linear.resample(&ramp, ImageSize::new(4, 1));
        assert_eq!(up[[0, 0]], 0.0);
        assert_eq!(up[[0, 3]], 1.0);
        assert!((up[[0, 1]] - 0.25).abs() < 1e-12);
        assert!((up[[0, 2]] - 0.75).abs() < 1e-12);
    }
}

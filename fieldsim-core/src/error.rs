//! Error types for the field simulation core.
//!
//! Two failure kinds exist: configuration problems detected before the
//! first tick (fatal), and renderer failures that stop a running animation.

use std::error::Error;
use std::fmt;

/// Malformed or missing simulation parameters, detected at startup.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// `nx` or `ny` is zero.
    EmptyGrid { nx: usize, ny: usize },
    /// `nx * ny` samples cannot be allocated as one array.
    GridTooLarge { nx: usize, ny: usize },
    /// The initial hotspot region selects no cells (`x0 >= x1` or `y0 >= y1`).
    EmptyRegion {
        x0: usize,
        x1: usize,
        y0: usize,
        y1: usize,
    },
    /// The initial hotspot region reaches past the grid.
    RegionOutOfBounds {
        x1: usize,
        y1: usize,
        nx: usize,
        ny: usize,
    },
    /// `init_value` is NaN or infinite.
    InvalidInitValue(f32),
    /// `dt` is zero, negative or not finite.
    InvalidTimeStep(f32),
    /// Diffusivity or wave speed is negative or not finite.
    InvalidCoefficient { name: &'static str, value: f32 },
    /// `sub_steps_per_frame` is zero.
    ZeroSubSteps,
    /// `tick_interval_ms` is zero.
    ZeroTickInterval,
    /// A caller-supplied initial field does not match `(nx, ny)`.
    ShapeMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyGrid { nx, ny } => {
                write!(f, "grid dimensions must be positive (nx={nx}, ny={ny})")
            }
            Self::GridTooLarge { nx, ny } => {
                write!(f, "grid {nx} x {ny} is too large to allocate")
            }
            Self::EmptyRegion { x0, x1, y0, y1 } => {
                write!(f, "initial region {x0}..{x1} x {y0}..{y1} is empty")
            }
            Self::RegionOutOfBounds { x1, y1, nx, ny } => write!(
                f,
                "initial region end ({x1}, {y1}) exceeds grid ({nx}, {ny})"
            ),
            Self::InvalidInitValue(v) => write!(f, "init_value must be finite, got {v}"),
            Self::InvalidTimeStep(dt) => write!(f, "dt must be positive and finite, got {dt}"),
            Self::InvalidCoefficient { name, value } => {
                write!(f, "{name} must be non-negative and finite, got {value}")
            }
            Self::ZeroSubSteps => write!(f, "sub_steps_per_frame must be at least 1"),
            Self::ZeroTickInterval => write!(f, "tick_interval_ms must be at least 1"),
            Self::ShapeMismatch { expected, found } => write!(
                f,
                "initial field has shape {found:?}, expected {expected:?}"
            ),
        }
    }
}

impl Error for ConfigError {}

/// A failure reported by the render callback.
///
/// The controller never retries: it drops to `Idle` and hands this back
/// to the embedding application.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderError {
    reason: String,
}

impl RenderError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "render failed: {}", self.reason)
    }
}

impl Error for RenderError {}

impl From<std::io::Error> for RenderError {
    fn from(err: std::io::Error) -> Self {
        Self::new(err.to_string())
    }
}

//! The scalar field buffer and its boundary policy.
//!
//! A field is an `Array2<f32>` of shape `(nx, ny)`, indexed `[[i, j]]` with
//! `i` running along x and `j` along y.

use ndarray::{s, Array2};
use serde::{Deserialize, Serialize};

pub type Field = Array2<f32>;

/// How the stencil treats neighbours that fall off the grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Boundary {
    /// Edges wrap around; the grid is a torus.
    #[default]
    Periodic,
    /// Cells outside the grid are held at zero (cold walls).
    Dirichlet,
}

/// Half-open rectangle `x0..x1` by `y0..y1` in cell indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x0: usize,
    pub x1: usize,
    pub y0: usize,
    pub y1: usize,
}

impl Region {
    pub fn new(x0: usize, x1: usize, y0: usize, y1: usize) -> Self {
        Self { x0, x1, y0, y1 }
    }

    pub fn is_empty(&self) -> bool {
        self.x0 >= self.x1 || self.y0 >= self.y1
    }

    pub fn contains(&self, i: usize, j: usize) -> bool {
        (self.x0..self.x1).contains(&i) && (self.y0..self.y1).contains(&j)
    }
}

/// Zero field with `value` written into every cell of `region`.
///
/// The region must already lie inside the grid; see
/// [`SimulationParams::validate`](crate::SimulationParams::validate).
pub fn hotspot(nx: usize, ny: usize, region: Region, value: f32) -> Field {
    let mut u = Field::zeros((nx, ny));
    u.slice_mut(s![region.x0..region.x1, region.y0..region.y1])
        .fill(value);
    u
}

/// Summary statistics of a field, used for logging and frame metadata.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct FieldStats {
    pub min: f32,
    pub max: f32,
    pub mean: f32,
    pub total: f64,
}

impl FieldStats {
    pub fn of(u: &Field) -> Self {
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        let mut total = 0.0f64;
        for &v in u.iter() {
            min = min.min(v);
            max = max.max(v);
            total += v as f64;
        }
        let mean = if u.is_empty() {
            0.0
        } else {
            (total / u.len() as f64) as f32
        };
        Self {
            min,
            max,
            mean,
            total,
        }
    }

    /// True when every sample was finite.
    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }
}

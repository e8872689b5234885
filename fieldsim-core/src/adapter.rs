//! Conversion from a field to the flat layouts a structured-grid renderer
//! consumes.
//!
//! Both layouts are column-major: `x` varies fastest, so flat index
//! `i + j * nx` holds cell `[[i, j]]`.

use crate::field::Field;

/// Scalars in column-major order.
pub fn flatten_column_major(u: &Field) -> Vec<f32> {
    u.t().iter().copied().collect()
}

/// Grid points `[x, y, z]` with the height `z` taken from the field, in the
/// same order as [`flatten_column_major`].
pub fn structured_points(u: &Field) -> Vec<[f32; 3]> {
    u.t()
        .indexed_iter()
        .map(|((j, i), &z)| [i as f32, j as f32, z])
        .collect()
}

/// Overwrites the heights of `points` in place, keeping `x` and `y`.
///
/// Panics if `points` was built for a grid of a different size.
pub fn update_heights(points: &mut [[f32; 3]], u: &Field) {
    assert_eq!(points.len(), u.len(), "point count does not match field");
    for (p, &z) in points.iter_mut().zip(u.t().iter()) {
        p[2] = z;
    }
}

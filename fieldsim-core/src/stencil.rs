//! Five-point discrete Laplacian.
//!
//! ```text
//!          [0  1  0]
//! kernel = [1 -4  1]      unit grid spacing
//!          [0  1  0]
//! ```

use crate::field::{Boundary, Field};

/// Discrete Laplacian of `u`, same shape as `u`.
///
/// Each neighbour contributes `(neighbour - centre)`, so a uniform field
/// maps to exact zeros.
pub fn laplacian(u: &Field, boundary: Boundary) -> Field {
    let mut out = Field::zeros(u.dim());
    laplacian_into(&mut out, u, boundary);
    out
}

/// Writes the Laplacian of `u` into `out`.
///
/// Panics if `out` and `u` differ in shape.
pub fn laplacian_into(out: &mut Field, u: &Field, boundary: Boundary) {
    assert_eq!(out.dim(), u.dim(), "laplacian output shape mismatch");
    let (nx, ny) = u.dim();
    if nx == 0 || ny == 0 {
        return;
    }

    match boundary {
        Boundary::Periodic => {
            for i in 0..nx {
                let left = (i + nx - 1) % nx;
                let right = (i + 1) % nx;
                for j in 0..ny {
                    let down = (j + ny - 1) % ny;
                    let up = (j + 1) % ny;
                    let c = u[[i, j]];
                    out[[i, j]] = (u[[left, j]] - c)
                        + (u[[right, j]] - c)
                        + (u[[i, down]] - c)
                        + (u[[i, up]] - c);
                }
            }
        }
        Boundary::Dirichlet => {
            let at = |i: isize, j: isize| -> f32 {
                if i < 0 || j < 0 || i >= nx as isize || j >= ny as isize {
                    0.0
                } else {
                    u[[i as usize, j as usize]]
                }
            };
            for i in 0..nx as isize {
                for j in 0..ny as isize {
                    let c = at(i, j);
                    out[[i as usize, j as usize]] = (at(i - 1, j) - c)
                        + (at(i + 1, j) - c)
                        + (at(i, j - 1) - c)
                        + (at(i, j + 1) - c);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array2};
    use proptest::prelude::*;

    #[test]
    fn point_source_spreads_to_neighbours() {
        let mut u = Field::zeros((5, 5));
        u[[2, 2]] = 1.0;
        let lap = laplacian(&u, Boundary::Periodic);
        assert_eq!(lap[[2, 2]], -4.0);
        assert_eq!(lap[[1, 2]], 1.0);
        assert_eq!(lap[[3, 2]], 1.0);
        assert_eq!(lap[[2, 1]], 1.0);
        assert_eq!(lap[[2, 3]], 1.0);
        assert_eq!(lap[[0, 0]], 0.0);
    }

    #[test]
    fn corner_wraps_around_torus() {
        let mut u = Field::zeros((4, 3));
        u[[0, 0]] = 1.0;
        let lap = laplacian(&u, Boundary::Periodic);
        assert_eq!(lap[[3, 0]], 1.0);
        assert_eq!(lap[[0, 2]], 1.0);
        assert_eq!(lap[[1, 0]], 1.0);
        assert_eq!(lap[[0, 1]], 1.0);
    }

    #[test]
    fn dirichlet_does_not_wrap() {
        let mut u = Field::zeros((4, 4));
        u[[0, 0]] = 1.0;
        let lap = laplacian(&u, Boundary::Dirichlet);
        assert_eq!(lap[[0, 0]], -4.0);
        assert_eq!(lap[[3, 0]], 0.0);
        assert_eq!(lap[[0, 3]], 0.0);
        assert_eq!(lap[[1, 0]], 1.0);
    }

    #[test]
    fn dirichlet_uniform_field_leaks_at_walls() {
        let u = Array2::from_elem((3, 3), 2.0f32);
        let lap = laplacian(&u, Boundary::Dirichlet);
        assert_eq!(lap[[1, 1]], 0.0);
        assert_eq!(lap[[0, 1]], -2.0);
        assert_eq!(lap[[0, 0]], -4.0);
    }

    #[test]
    fn single_row_grid_wraps_onto_itself() {
        let u = array![[1.0f32, 2.0, 3.0]];
        let lap = laplacian(&u, Boundary::Periodic);
        // along x both neighbours are the cell itself
        assert_eq!(lap, array![[3.0f32, 0.0, -3.0]]);
    }

    #[test]
    #[should_panic(expected = "shape mismatch")]
    fn into_rejects_wrong_shape() {
        let u = Field::zeros((3, 3));
        let mut out = Field::zeros((3, 4));
        laplacian_into(&mut out, &u, Boundary::Periodic);
    }

    fn grid() -> impl Strategy<Value = Field> {
        (1usize..12, 1usize..12).prop_flat_map(|(nx, ny)| {
            prop::collection::vec(-100.0f32..100.0, nx * ny).prop_map(move |data| {
                Array2::from_shape_vec((nx, ny), data).unwrap()
            })
        })
    }

    proptest! {
        #[test]
        fn periodic_laplacian_conserves_total(u in grid()) {
            let lap = laplacian(&u, Boundary::Periodic);
            prop_assert_eq!(lap.dim(), u.dim());
            let sum: f64 = lap.iter().map(|&v| v as f64).sum();
            let scale: f64 = u.iter().map(|&v| v.abs() as f64).sum::<f64>().max(1.0);
            prop_assert!(sum.abs() <= 1e-5 * scale, "sum = {}", sum);
        }

        #[test]
        fn uniform_field_has_zero_laplacian(nx in 1usize..10, ny in 1usize..10, k in -50.0f32..50.0) {
            let u = Array2::from_elem((nx, ny), k);
            let lap = laplacian(&u, Boundary::Periodic);
            for &v in lap.iter() {
                prop_assert_eq!(v, 0.0);
            }
        }

        #[test]
        fn laplacian_is_deterministic(u in grid()) {
            let a = laplacian(&u, Boundary::Periodic);
            let b = laplacian(&u, Boundary::Periodic);
            prop_assert_eq!(a, b);
        }
    }

    #[test]
    fn linear_ramp_has_zero_interior_laplacian() {
        let u = Array2::from_shape_fn((6, 6), |(i, _)| i as f32);
        let lap = laplacian(&u, Boundary::Periodic);
        for i in 1..5 {
            for j in 0..6 {
                assert_abs_diff_eq!(lap[[i, j]], 0.0);
            }
        }
        // the seam where 5 wraps to 0
        assert_abs_diff_eq!(lap[[0, 0]], 6.0);
        assert_abs_diff_eq!(lap[[5, 0]], -6.0);
    }
}

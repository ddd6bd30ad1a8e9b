//! Small dense solver for the model's normal equations.

use crate::error::ModelFitError;

const PIVOT_EPSILON: f64 = 1e-12;

/// Solve `a * x = b` for a square row-major `n x n` matrix using Gaussian
/// elimination with partial pivoting.
pub(crate) fn solve(mut a: Vec<f64>, mut b: Vec<f64>, n: usize) -> Result<Vec<f64>, ModelFitError> {
    debug_assert_eq!(a.len(), n * n);
    debug_assert_eq!(b.len(), n);

    for col in 0..n {
        let mut max_row = col;
        for row in (col + 1)..n {
            if a[row * n + col].abs() > a[max_row * n + col].abs() {
                max_row = row;
            }
        }

        if a[max_row * n + col].abs() < PIVOT_EPSILON {
            return Err(ModelFitError::Singular);
        }

        if max_row != col {
            for j in 0..n {
                a.swap(col * n + j, max_row * n + j);
            }
            b.swap(col, max_row);
        }

        let pivot = a[col * n + col];
        for row in (col + 1)..n {
            let factor = a[row * n + col] / pivot;
            if factor == 0.0 {
                continue;
            }
            for j in col..n {
                a[row * n + j] -= factor * a[col * n + j];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let mut acc = b[row];
        for j in (row + 1)..n {
            acc -= a[row * n + j] * x[j];
        }
        x[row] = acc / a[row * n + row];
    }

    if x.iter().all(|v| v.is_finite()) {
        Ok(x)
    } else {
        Err(ModelFitError::NonFinite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solves_small_system() {
        // 2x + y = 5, x + 3y = 10  =>  x = 1, y = 3
        let x = solve(vec![2.0, 1.0, 1.0, 3.0], vec![5.0, 10.0], 2).unwrap();
        assert!((x[0] - 1.0).abs() < 1e-12);
        assert!((x[1] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn pivots_around_zero_diagonal() {
        // 0x + y = 2, x + 0y = 4
        let x = solve(vec![0.0, 1.0, 1.0, 0.0], vec![2.0, 4.0], 2).unwrap();
        assert!((x[0] - 4.0).abs() < 1e-12);
        assert!((x[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_singular_matrix() {
        let err = solve(vec![1.0, 2.0, 2.0, 4.0], vec![1.0, 2.0], 2).unwrap_err();
        assert_eq!(err, ModelFitError::Singular);
    }
}

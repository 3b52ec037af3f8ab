use ndarray::{Array1, Array2, ArrayView2};

use crate::error::{Error, Result};

/// Solve `A x = b` for a symmetric positive-definite `A` via Cholesky
/// factorization (`A = L Lᵀ`, then forward/back substitution).
///
/// # Arguments
///
/// * `a` - Symmetric positive-definite matrix.
/// * `b` - Right-hand side vector of matching length.
///
/// # Returns
///
/// The solution vector, or `Error::Numerical` when a non-positive pivot is
/// encountered (the matrix is not positive definite).
pub fn cholesky_solve(a: &ArrayView2<f64>, b: &Array1<f64>) -> Result<Array1<f64>> {
    let n = a.nrows();
    assert_eq!(n, a.ncols(), "cholesky_solve requires a square matrix");
    assert_eq!(n, b.len(), "cholesky_solve requires matching rhs length");

    let mut l = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[(i, j)];
            for k in 0..j {
                sum -= l[(i, k)] * l[(j, k)];
            }
            if i == j {
                if sum <= 0.0 {
                    return Err(Error::Numerical(format!(
                        "matrix is not positive definite (pivot {} at row {})",
                        sum, i
                    )));
                }
                l[(i, j)] = sum.sqrt();
            } else {
                l[(i, j)] = sum / l[(j, j)];
            }
        }
    }

    // forward substitution: L z = b
    let mut z = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut sum = b[i];
        for k in 0..i {
            sum -= l[(i, k)] * z[k];
        }
        z[i] = sum / l[(i, i)];
    }

    // back substitution: Lᵀ x = z
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut sum = z[i];
        for k in (i + 1)..n {
            sum -= l[(k, i)] * x[k];
        }
        x[i] = sum / l[(i, i)];
    }
    Ok(x)
}

/// Eigendecomposition of a symmetric matrix by the cyclic Jacobi method.
///
/// Returns eigenvalues sorted in descending order and the matching
/// eigenvectors as columns. `max_sweeps` caps the number of full rotation
/// sweeps; on a well-conditioned matrix the method converges in far fewer.
pub fn symmetric_eigen(a: &ArrayView2<f64>, max_sweeps: usize) -> (Array1<f64>, Array2<f64>) {
    let n = a.nrows();
    assert_eq!(n, a.ncols(), "symmetric_eigen requires a square matrix");

    let mut m = a.to_owned();
    let mut v = Array2::<f64>::eye(n);
    let tol = 1e-12 * off_diagonal_norm(&m).max(1.0);

    for _ in 0..max_sweeps.max(1) {
        if off_diagonal_norm(&m) <= tol {
            break;
        }
        for p in 0..n {
            for q in (p + 1)..n {
                let apq = m[(p, q)];
                if apq.abs() <= f64::EPSILON {
                    continue;
                }
                let theta = (m[(q, q)] - m[(p, p)]) / (2.0 * apq);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for k in 0..n {
                    let mkp = m[(k, p)];
                    let mkq = m[(k, q)];
                    m[(k, p)] = c * mkp - s * mkq;
                    m[(k, q)] = s * mkp + c * mkq;
                }
                for k in 0..n {
                    let mpk = m[(p, k)];
                    let mqk = m[(q, k)];
                    m[(p, k)] = c * mpk - s * mqk;
                    m[(q, k)] = s * mpk + c * mqk;
                }
                for k in 0..n {
                    let vkp = v[(k, p)];
                    let vkq = v[(k, q)];
                    v[(k, p)] = c * vkp - s * vkq;
                    v[(k, q)] = s * vkp + c * vkq;
                }
            }
        }
    }

    // sort eigenpairs by descending eigenvalue
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| {
        m[(j, j)]
            .partial_cmp(&m[(i, i)])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut eigenvalues = Array1::<f64>::zeros(n);
    let mut eigenvectors = Array2::<f64>::zeros((n, n));
    for (rank, &idx) in order.iter().enumerate() {
        eigenvalues[rank] = m[(idx, idx)];
        eigenvectors.column_mut(rank).assign(&v.column(idx));
    }
    (eigenvalues, eigenvectors)
}

fn off_diagonal_norm(m: &Array2<f64>) -> f64 {
    let n = m.nrows();
    let mut sum = 0.0;
    for i in 0..n {
        for j in 0..n {
            if i != j {
                sum += m[(i, j)] * m[(i, j)];
            }
        }
    }
    sum.sqrt()
}

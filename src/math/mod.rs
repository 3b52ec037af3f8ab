//! Small linear-algebra kernels used throughout the crate.
//!
//! `ndarray` supplies the vector/matrix types and products; this module adds
//! the handful of operations it lacks (pairwise distances, sort
//! permutations, per-column argmax, an SPD solve and a symmetric
//! eigendecomposition). The kernels are intentionally small and
//! dependency-free to keep the crate portable and easy to test.
pub mod linalg;
pub mod solve;

pub use linalg::{
    argmax, argmax_columns, col_norms_sq, normalize_columns, normalized, pairwise_sq_distances,
    sort_perm,
};
pub use solve::{cholesky_solve, symmetric_eigen};

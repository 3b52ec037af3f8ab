use std::cmp::Ordering;

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

/// Squared Euclidean norm of each column.
pub fn col_norms_sq(x: &ArrayView2<f64>) -> Array1<f64> {
    let mut norms = Array1::zeros(x.ncols());
    for (j, col) in x.columns().into_iter().enumerate() {
        norms[j] = col.dot(&col);
    }
    norms
}

/// Pairwise squared Euclidean distances between the columns of `a` and the
/// columns of `b`: the result has `a.ncols()` rows and `b.ncols()` columns.
///
/// Computed as `|a_i|^2 - 2 a_i.b_j + |b_j|^2`; tiny negative values from
/// cancellation are clamped to zero.
pub fn pairwise_sq_distances(a: &ArrayView2<f64>, b: &ArrayView2<f64>) -> Array2<f64> {
    assert_eq!(
        a.nrows(),
        b.nrows(),
        "pairwise_sq_distances requires matching dimensions"
    );
    let na = col_norms_sq(a);
    let nb = col_norms_sq(b);
    let cross = a.t().dot(b);
    let mut d = Array2::zeros((a.ncols(), b.ncols()));
    for i in 0..a.ncols() {
        for j in 0..b.ncols() {
            d[(i, j)] = (na[i] - 2.0 * cross[(i, j)] + nb[j]).max(0.0);
        }
    }
    d
}

/// Stable sort returning the sorted values together with the permutation
/// that produced them: `perm[rank]` is the original index of the value at
/// `rank`. NaN values compare as equal and keep their relative order.
pub fn sort_perm(values: &[f64], ascending: bool) -> (Vec<f64>, Vec<usize>) {
    let mut perm: Vec<usize> = (0..values.len()).collect();
    perm.sort_by(|&a, &b| {
        let ord = values[a]
            .partial_cmp(&values[b])
            .unwrap_or(Ordering::Equal);
        if ascending {
            ord
        } else {
            ord.reverse()
        }
    });
    let sorted = perm.iter().map(|&i| values[i]).collect();
    (sorted, perm)
}

/// Index of the largest element. The first maximum wins on ties.
pub fn argmax(values: &ArrayView1<f64>) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}

/// Row index of the largest element in each column.
pub fn argmax_columns(d: &ArrayView2<f64>) -> Vec<usize> {
    d.columns().into_iter().map(|col| argmax(&col)).collect()
}

/// Scale every column to unit Euclidean norm. Zero columns are left alone.
pub fn normalize_columns(x: &mut Array2<f64>) {
    for mut col in x.columns_mut() {
        let norm = col.dot(&col).sqrt();
        if norm > 0.0 {
            col.mapv_inplace(|v| v / norm);
        }
    }
}

/// Unit-norm copy of a vector. A zero vector is returned unchanged.
pub fn normalized(v: &ArrayView1<f64>) -> Array1<f64> {
    let norm = v.dot(v).sqrt();
    if norm > 0.0 {
        v.mapv(|x| x / norm)
    } else {
        v.to_owned()
    }
}

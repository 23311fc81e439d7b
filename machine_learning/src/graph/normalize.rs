use ndarray::{Array1, Array2, ArrayView2, Axis};

/// Computes the reciprocal of every degree, treating a zero degree as infinite so its
/// reciprocal is zero instead of `inf`.
///
/// # Arguments
/// * `degrees` - Row or column sums of an adjacency matrix.
/// * `f` - Transform applied to each non-zero degree before inverting it.
///
/// # Returns
/// The element-wise `1 / f(degree)`, with zero for zero degrees.
fn inverse_degrees(degrees: Array1<f32>, f: impl Fn(f32) -> f32) -> Array1<f32> {
    degrees.mapv_into(|d| if d == 0. { 0. } else { 1. / f(d) })
}

/// Degree-normalizes a single (possibly bipartite) adjacency matrix.
///
/// * `symmetric == false`: `D_row^-1 · A`, every non-isolated row sums to one.
/// * `symmetric == true`: `D_row^-1/2 · A · D_col^-1/2`.
///
/// Rows or columns summing to zero stay all-zero rather than becoming `NaN`.
///
/// # Arguments
/// * `adj` - The raw adjacency counts.
/// * `symmetric` - Whether to use symmetric normalization.
///
/// # Returns
/// A new matrix with the same shape as `adj`.
pub fn normalize_adjacency(adj: ArrayView2<f32>, symmetric: bool) -> Array2<f32> {
    let row_sum = adj.sum_axis(Axis(1));
    let isolated = row_sum.iter().filter(|&&d| d == 0.).count();
    if isolated > 0 {
        log::debug!("{isolated} zero-degree row(s) normalize to zero");
    }

    let mut out = adj.to_owned();

    if symmetric {
        let col_sum = adj.sum_axis(Axis(0));
        let row_inv_sqrt = inverse_degrees(row_sum, f32::sqrt);
        let col_inv_sqrt = inverse_degrees(col_sum, f32::sqrt);

        for (mut row, &r) in out.rows_mut().into_iter().zip(&row_inv_sqrt) {
            row.zip_mut_with(&col_inv_sqrt, |a, &c| *a *= r * c);
        }
    } else {
        let row_inv = inverse_degrees(row_sum, |d| d);

        for (mut row, &r) in out.rows_mut().into_iter().zip(&row_inv) {
            row *= r;
        }
    }

    out
}

/// Degree-normalizes every adjacency matrix of a batch, see [`normalize_adjacency`].
///
/// # Arguments
/// * `adjacencies` - The raw adjacency matrices, left untouched.
/// * `symmetric` - Whether to use symmetric normalization.
///
/// # Returns
/// The normalized matrices, in the same order and with identical shapes.
pub fn normalize_adjacencies(adjacencies: &[Array2<f32>], symmetric: bool) -> Vec<Array2<f32>> {
    adjacencies
        .iter()
        .map(|adj| normalize_adjacency(adj.view(), symmetric))
        .collect()
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    const EPS: f32 = 1e-6;

    #[test]
    fn row_normalization_is_row_stochastic() {
        let adj = array![[1., 3., 0.], [2., 2., 4.], [0., 0., 5.]];
        let norm = normalize_adjacency(adj.view(), false);

        for row in norm.rows() {
            assert!((row.sum() - 1.).abs() < EPS, "row sums to {}", row.sum());
        }
        assert!((norm[[0, 1]] - 0.75).abs() < EPS);
    }

    #[test]
    fn zero_degree_rows_and_columns_stay_zero() {
        let adj = array![[0., 0., 0.], [1., 0., 1.], [2., 0., 0.]];

        for symmetric in [false, true] {
            let norm = normalize_adjacency(adj.view(), symmetric);

            assert!(norm.iter().all(|x| x.is_finite()));
            assert!(norm.row(0).iter().all(|&x| x == 0.));
            assert!(norm.column(1).iter().all(|&x| x == 0.));
        }
    }

    #[test]
    fn symmetric_normalization_scales_by_both_degrees() {
        // row sums [2, 8], column sums [4, 6]
        let adj = array![[1., 1.], [3., 5.]];
        let norm = normalize_adjacency(adj.view(), true);

        let expected = array![
            [1. / (2f32.sqrt() * 2.), 1. / (2f32.sqrt() * 6f32.sqrt())],
            [3. / (8f32.sqrt() * 2.), 5. / (8f32.sqrt() * 6f32.sqrt())],
        ];

        for (a, b) in norm.iter().zip(&expected) {
            assert!((a - b).abs() < EPS, "{a} != {b}");
        }
    }

    #[test]
    fn bipartite_shapes_are_preserved_and_inputs_untouched() {
        let adjs = vec![
            array![[1., 0., 2., 0.], [0., 0., 0., 0.]],
            array![[4.], [1.], [0.]],
        ];
        let before = adjs.clone();

        let normalized = normalize_adjacencies(&adjs, true);

        assert_eq!(adjs, before);
        assert_eq!(normalized.len(), 2);
        assert_eq!(normalized[0].dim(), (2, 4));
        assert_eq!(normalized[1].dim(), (3, 1));
    }
}

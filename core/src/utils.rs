use nalgebra::{DMatrix, DVector, SymmetricEigen};

use crate::device::EvaluationContext;

#[inline(always)]
/// Create a symmetric, square matrix. Function is only run for upper triangle of the matrix
pub(crate) fn symmetric_matrix(
    n: usize,
    mut func: impl FnMut(usize, usize) -> f64,
) -> DMatrix<f64> {
    let mut matrix = DMatrix::zeros(n, n);
    for i in 0..n {
        for j in i..n {
            let value = func(i, j);
            matrix[(i, j)] = value;
            matrix[(j, i)] = value;
        }
    }
    matrix
}

/// Same as [`symmetric_matrix`], with the rows of the upper triangle spread over the device of
/// `context`.
pub(crate) fn symmetric_matrix_on(
    context: &EvaluationContext,
    n: usize,
    func: impl Fn(usize, usize) -> f64 + Sync + Send,
) -> DMatrix<f64> {
    let rows = context.map_indexed(n, |i| (i..n).map(|j| func(i, j)).collect::<Vec<_>>());

    let mut matrix = DMatrix::zeros(n, n);
    for (i, row) in rows.into_iter().enumerate() {
        for (offset, value) in row.into_iter().enumerate() {
            matrix[(i, i + offset)] = value;
            matrix[(i + offset, i)] = value;
        }
    }
    matrix
}

pub(crate) fn eigs(matrix: DMatrix<f64>) -> (DMatrix<f64>, DVector<f64>) {
    let eigs = SymmetricEigen::new(matrix);
    (eigs.eigenvectors, eigs.eigenvalues)
}

/// Eigenvectors (as columns) and eigenvalues of a symmetric matrix, by ascending eigenvalue.
pub(crate) fn sorted_eigs(matrix: DMatrix<f64>) -> (DMatrix<f64>, DVector<f64>) {
    let (eigenvectors, eigenvalues) = eigs(matrix);

    let mut val_vec_pairs = eigenvalues
        .into_iter()
        .zip(eigenvectors.column_iter())
        .collect::<Vec<_>>();

    val_vec_pairs.sort_unstable_by(|(a, _), (b, _)| a.total_cmp(b));

    let (values, vectors): (Vec<_>, Vec<_>) = val_vec_pairs.into_iter().unzip();

    (
        DMatrix::from_columns(&vectors),
        DVector::from_column_slice(&values),
    )
}

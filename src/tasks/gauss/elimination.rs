/* ************************************************************************ **
** This file is part of hgauss, and is licensed under EITHER the MIT        **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
**                                                                          **
** Be aware that not all of hgauss is provided under this permissive        **
** license, and that the project as a whole is licensed under the GPL 3.0.  **
** ************************************************************************ */

//! The arithmetic of Gaussian elimination.
//!
//! Everything that touches a matrix element lives here, and both solvers call into it.
//! Rows are stored augmented: a row of an `n x n` system has `n + 1` elements, the last
//! being its entry of the right-hand side.

use super::PivotStrategy;

/// A square system with its right-hand side appended as an extra column.
#[derive(Debug, Clone, PartialEq)]
pub struct AugmentedSystem {
    dim: usize,
    // row-major, dim rows of dim + 1
    data: Vec<f64>,
}

impl AugmentedSystem {
    /// Copy a row-major matrix and a right-hand side into a new augmented system.
    ///
    /// # Panics
    /// Panics if `matrix.len() != rhs.len() * rhs.len()`.
    pub fn new(matrix: &[f64], rhs: &[f64]) -> Self {
        let dim = rhs.len();
        assert_eq!(matrix.len(), dim * dim, "matrix is not {} x {}", dim, dim);

        let mut data = Vec::with_capacity(dim * (dim + 1));
        // (max(1) because chunks(0) panics; the matrix is empty anyway when dim is 0)
        for (row, &b) in matrix.chunks(dim.max(1)).zip(rhs) {
            data.extend_from_slice(row);
            data.push(b);
        }
        AugmentedSystem { dim, data }
    }

    /// Reassemble a system from its augmented rows, concatenated in order.
    ///
    /// # Panics
    /// Panics if `data.len() != dim * (dim + 1)`.
    pub fn from_rows(dim: usize, data: Vec<f64>) -> Self {
        assert_eq!(data.len(), dim * (dim + 1), "wrong amount of data for {} augmented rows", dim);
        AugmentedSystem { dim, data }
    }

    pub fn dim(&self) -> usize { self.dim }

    /// Number of elements in each augmented row.
    pub fn width(&self) -> usize { self.dim + 1 }

    pub fn row(&self, i: usize) -> &[f64]
    { &self.data[i * self.width()..(i + 1) * self.width()] }

    /// Augmented rows `start..end`, concatenated.
    pub fn rows(&self, start: usize, end: usize) -> &[f64]
    { &self.data[start * self.width()..end * self.width()] }

    pub fn swap_rows(&mut self, a: usize, b: usize) {
        swap_rows(&mut self.data, self.dim + 1, a, b);
    }

    /// Reduce the system to upper triangular form, in place.
    pub fn forward_eliminate(&mut self, strategy: PivotStrategy) {
        let n = self.dim;
        let width = self.width();

        for k in 0..n {
            if strategy == PivotStrategy::Partial {
                let candidates = (k..n).map(|i| (i, self.data[i * width + k]));
                if let Some((best, _)) = best_candidate(candidates) {
                    self.swap_rows(k, best);
                }
            }

            let (upper, lower) = self.data.split_at_mut((k + 1) * width);
            let pivot = &upper[k * width..];
            for row in lower.chunks_mut(width) {
                eliminate_row(row, pivot, k);
            }
        }
    }

    /// Solve an upper triangular system.
    ///
    /// Only the elements on and above the diagonal are read.
    pub fn back_substitute(&self) -> Vec<f64> {
        let n = self.dim;
        let mut x = vec![0.0; n];
        for i in (0..n).rev() {
            let row = self.row(i);
            let sum: f64 = (i + 1..n).map(|j| row[j] * x[j]).sum();
            x[i] = (row[n] - sum) / row[i];
        }
        x
    }
}

/// Subtract the multiple of `pivot` that zeroes out column `k` of `row`.
///
/// Columns before `k` are left alone; they are already zero in both rows.
pub(crate) fn eliminate_row(row: &mut [f64], pivot: &[f64], k: usize) {
    debug_assert_eq!(row.len(), pivot.len());
    let factor = row[k] / pivot[k];
    for (x, &p) in row[k..].iter_mut().zip(&pivot[k..]) {
        *x -= factor * p;
    }
}

/// Swap two rows of a flat row-major buffer.
pub(crate) fn swap_rows(data: &mut [f64], width: usize, a: usize, b: usize) {
    if a == b {
        return;
    }
    let (lo, hi) = (a.min(b), a.max(b));
    let (head, tail) = data.split_at_mut(hi * width);
    head[lo * width..(lo + 1) * width].swap_with_slice(&mut tail[..width]);
}

/// Choose a pivot among `(row index, value in the pivot column)` pairs.
///
/// The largest magnitude wins.  Ties go to whichever came first, and NaN loses to
/// everything, so folding over candidates in row order gives the same answer no matter
/// how the rows were grouped beforehand.
pub(crate) fn best_candidate<I>(candidates: I) -> Option<(usize, f64)>
where I: IntoIterator<Item=(usize, f64)>,
{
    let mut iter = candidates.into_iter().map(|(i, x)| (i, x.abs()));
    let first = iter.next()?;
    Some(iter.fold(first, |best, cand| match beats(cand.1, best.1) {
        true => cand,
        false => best,
    }))
}

// Does magnitude `a` strictly beat magnitude `b`?
fn beats(a: f64, b: f64) -> bool {
    match (a.is_nan(), b.is_nan()) {
        (true, _) => false,
        (false, true) => true,
        (false, false) => a > b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solve(matrix: &[f64], rhs: &[f64], strategy: PivotStrategy) -> Vec<f64> {
        let mut system = AugmentedSystem::new(matrix, rhs);
        system.forward_eliminate(strategy);
        system.back_substitute()
    }

    #[test]
    fn small_system() {
        let x = solve(
            &[2.0, 1.0, 0.0, -3.0, -1.0, 2.0, 0.0, 1.0, 2.0],
            &[8.0, -11.0, -3.0],
            PivotStrategy::Natural,
        );
        assert_close!(abs=1e-9, x, vec![8.0, -8.0, 2.5]);
    }

    #[test]
    fn identity_is_exact() {
        let n = 6;
        let mut matrix = vec![0.0; n * n];
        for i in 0..n {
            matrix[i * n + i] = 1.0;
        }
        let rhs = vec![1.5, -2.0, 0.0, 1e10, -3.25, 7.0];
        assert_eq!(solve(&matrix, &rhs, PivotStrategy::Natural), rhs);
        assert_eq!(solve(&matrix, &rhs, PivotStrategy::Partial), rhs);
    }

    #[test]
    fn negative_values() {
        let x = solve(
            &[-2.0, -1.0, -1.0, -1.0, -1.0, -1.0, -1.0, -2.0, -1.0],
            &[-1.0, -2.0, -3.0],
            PivotStrategy::Natural,
        );
        assert_close!(abs=1e-9, x, vec![-1.0, 1.0, 2.0]);
    }

    #[test]
    fn zero_on_the_diagonal() {
        // a[1][1] is zero, but not by the time row 1 becomes the pivot row
        let x = solve(
            &[1.0, 1.0, 2.0, 1.0, 0.0, 1.0, 1.0, 1.0, 1.0],
            &[1.0, 2.0, 3.0],
            PivotStrategy::Natural,
        );
        assert_close!(abs=1e-9, x, vec![4.0, 1.0, -2.0]);
    }

    #[test]
    fn zero_leading_pivot() {
        let matrix = [0.0, 1.0, 1.0, 0.0];
        let rhs = [2.0, 3.0];
        assert_eq!(solve(&matrix, &rhs, PivotStrategy::Partial), vec![3.0, 2.0]);

        let x = solve(&matrix, &rhs, PivotStrategy::Natural);
        assert!(x.iter().any(|x| !x.is_finite()), "{:?}", x);
    }

    #[test]
    fn partial_pivoting_on_a_larger_system() {
        let matrix = [
            1e-12, 2.0, 3.0,
            4.0, 5.0, 6.0,
            7.0, 8.0, 10.0,
        ];
        let expected = [1.0, -2.0, 0.5];
        let rhs = (0..3)
            .map(|i| (0..3).map(|j| matrix[i * 3 + j] * expected[j]).sum())
            .collect::<Vec<f64>>();
        let x = solve(&matrix, &rhs, PivotStrategy::Partial);
        assert_close!(abs=1e-10, x, expected.to_vec());
    }

    #[test]
    fn row_swapping() {
        let mut system = AugmentedSystem::new(&[1.0, 2.0, 3.0, 4.0], &[5.0, 6.0]);
        system.swap_rows(1, 0);
        assert_eq!(system.row(0), &[3.0, 4.0, 6.0]);
        assert_eq!(system.row(1), &[1.0, 2.0, 5.0]);
        system.swap_rows(1, 1);
        assert_eq!(system.rows(0, 2), &[3.0, 4.0, 6.0, 1.0, 2.0, 5.0]);
    }

    #[test]
    fn candidates() {
        let nan = ::std::f64::NAN;
        assert_eq!(best_candidate(vec![]), None);
        assert_eq!(best_candidate(vec![(3, -2.0), (4, 1.0)]), Some((3, 2.0)));
        // ties keep the first
        assert_eq!(best_candidate(vec![(0, 1.0), (1, -3.0), (2, 3.0)]), Some((1, 3.0)));
        // NaN never wins...
        assert_eq!(best_candidate(vec![(0, 0.0), (1, nan), (2, 0.0)]), Some((0, 0.0)));
        // ...and is replaced by anything
        assert_eq!(best_candidate(vec![(5, nan), (6, 0.0)]), Some((6, 0.0)));
        assert_eq!(best_candidate(vec![(5, nan), (6, nan)]).map(|(i, _)| i), Some(5));
    }
}

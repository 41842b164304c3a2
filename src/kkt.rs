use faer::linalg::matmul::matmul;
use faer::mat::{from_column_major_slice, from_column_major_slice_mut};
use faer::{MatRef, Parallelism};

/// Checks the Karush-Kuhn-Tucker conditions for min `||a x - b||_2`,
/// `x >= 0`, at the candidate `x`.
///
/// Returns true iff, with `w = a^T (b - a x)`:
/// - every entry of `x` is at least `-eps`,
/// - `|w[i]| <= eps` for every entry with `x[i] > eps`,
/// - `w[i] <= eps` for every other entry.
///
/// This is a pure diagnostic, independent of the solver's own bookkeeping.
///
/// # Panics
///
/// Panics when `b` or `x` do not match the dimensions of `a`.
pub fn check(a: MatRef<'_, f64>, b: &[f64], x: &[f64], eps: f64) -> bool {
    let m = a.nrows();
    let n = a.ncols();
    assert_eq!(b.len(), m, "b length does not match matrix rows");
    assert_eq!(x.len(), n, "x length does not match matrix columns");

    if x.iter().any(|&v| v < -eps) {
        return false;
    }

    let mut residual = b.to_vec();
    {
        let r = from_column_major_slice_mut::<f64>(&mut residual, m, 1);
        let x_mat = from_column_major_slice::<f64>(x, n, 1);
        matmul(r, a, x_mat, Some(1.0), -1.0, Parallelism::None);
    }
    let mut gradient = vec![0.0; n];
    {
        let g = from_column_major_slice_mut::<f64>(&mut gradient, n, 1);
        let r = from_column_major_slice::<f64>(&residual, m, 1);
        matmul(g, a.transpose(), r, None, 1.0, Parallelism::None);
    }

    for (i, &w) in gradient.iter().enumerate() {
        if x[i] > eps {
            // Stationarity on the free variables.
            if w.abs() > eps {
                return false;
            }
        } else if w > eps {
            // An improving direction remains at a pinned variable.
            return false;
        }
    }
    true
}

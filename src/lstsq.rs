use dyn_stack::{GlobalPodBuffer, PodStack, ReborrowMut};
use faer::linalg::householder::{
    apply_block_householder_sequence_transpose_on_the_left_in_place_req,
    apply_block_householder_sequence_transpose_on_the_left_in_place_with_conj,
};
use faer::linalg::qr::no_pivoting::compute::{qr_in_place, qr_in_place_req, QrComputeParams};
use faer::{Conj, Mat, MatRef, Parallelism};

use crate::solver::SolverError;

// Unblocked Householder reflectors; the subproblems are small and the
// factorization is redone whenever the passive set changes.
const BLOCKSIZE: usize = 1;

/// Unconstrained least-squares solves restricted to a column subset of a
/// fixed-size matrix.
///
/// Factorizes the gathered columns by Householder QR and back-substitutes
/// with a rank guard, so a rank-deficient subset yields a finite degenerate
/// solution instead of infinities. All buffers are sized for the full matrix
/// at construction and reused across calls.
pub(crate) struct RestrictedLstsq<'a> {
    packed: Mat<f64>,
    householder: Mat<f64>,
    rhs: Mat<f64>,
    stack: GlobalPodBuffer,
    parallelism: Parallelism<'a>,
}

impl<'a> RestrictedLstsq<'a> {
    pub(crate) fn new(
        nrows: usize,
        ncols: usize,
        parallelism: Parallelism<'a>,
    ) -> Result<Self, SolverError> {
        let factor_req = qr_in_place_req::<f64>(
            nrows,
            ncols,
            BLOCKSIZE,
            parallelism,
            QrComputeParams::default(),
        )
        .map_err(|_| SolverError::WorkspaceOverflow)?;
        let apply_req = apply_block_householder_sequence_transpose_on_the_left_in_place_req::<f64>(
            nrows, BLOCKSIZE, 1,
        )
        .map_err(|_| SolverError::WorkspaceOverflow)?;
        let req = factor_req
            .try_or(apply_req)
            .map_err(|_| SolverError::WorkspaceOverflow)?;
        let stack = GlobalPodBuffer::try_new(req).map_err(|_| SolverError::WorkspaceAlloc)?;

        Ok(Self {
            packed: Mat::zeros(nrows, ncols),
            householder: Mat::zeros(BLOCKSIZE, nrows.min(ncols)),
            rhs: Mat::zeros(nrows, 1),
            stack,
            parallelism,
        })
    }

    /// Minimizes `||A[:, cols] z - b||_2`, writing one entry of `z` per
    /// entry of `cols`.
    pub(crate) fn solve(&mut self, a: MatRef<'_, f64>, cols: &[usize], b: &[f64], z: &mut [f64]) {
        let m = a.nrows();
        let k = cols.len();
        debug_assert_eq!(b.len(), m);
        debug_assert_eq!(z.len(), k);
        if k == 0 {
            return;
        }
        let reflectors = m.min(k);

        // Gather the selected columns and factorize them in place.
        {
            let mut qr = self.packed.as_mut().submatrix_mut(0, 0, m, k);
            for (j, &col) in cols.iter().enumerate() {
                for i in 0..m {
                    qr.write(i, j, a.read(i, col));
                }
            }
            let hh = self
                .householder
                .as_mut()
                .submatrix_mut(0, 0, BLOCKSIZE, reflectors);
            let mut stack = PodStack::new(&mut self.stack);
            qr_in_place(
                qr,
                hh,
                self.parallelism,
                stack.rb_mut(),
                QrComputeParams::default(),
            );
        }

        for i in 0..m {
            self.rhs.write(i, 0, b[i]);
        }
        let qr = self.packed.as_ref().submatrix(0, 0, m, k);
        let hh = self
            .householder
            .as_ref()
            .submatrix(0, 0, BLOCKSIZE, reflectors);
        {
            let mut stack = PodStack::new(&mut self.stack);
            apply_block_householder_sequence_transpose_on_the_left_in_place_with_conj(
                qr.submatrix(0, 0, m, reflectors),
                hh,
                Conj::No,
                self.rhs.as_mut(),
                self.parallelism,
                stack.rb_mut(),
            );
        }

        // Back-substitute on the upper-trapezoidal factor. Diagonal entries
        // below the rank threshold zero their component instead of dividing.
        let mut diag_max = 0.0f64;
        for j in 0..reflectors {
            diag_max = diag_max.max(qr.read(j, j).abs());
        }
        let tiny = diag_max * f64::EPSILON * m.max(k) as f64;
        for entry in z[reflectors..k].iter_mut() {
            *entry = 0.0;
        }
        for j in (0..reflectors).rev() {
            let mut sum = self.rhs.read(j, 0);
            for l in (j + 1)..k {
                sum -= qr.read(j, l) * z[l];
            }
            let diag = qr.read(j, j);
            z[j] = if diag.abs() > tiny { sum / diag } else { 0.0 };
        }
    }
}

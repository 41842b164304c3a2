use core::fmt;

use faer::{Mat, MatRef, Parallelism};

use crate::report::SolveStatus;
use crate::solver::{NnlsSolver, SolveError, SolverError, SolverOptions};

/// Errors from the multi-column driver.
#[derive(Debug)]
pub enum BatchError {
    /// Constructing the shared solver failed.
    Solver(SolverError),
    /// The right-hand-side matrix was rejected.
    Solve(SolveError),
    /// A column did not converge. No partial result is returned.
    Column { col: usize, status: SolveStatus },
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Solver(err) => write!(f, "solver construction failed: {err}"),
            Self::Solve(err) => write!(f, "right-hand side rejected: {err}"),
            Self::Column { col, status } => {
                write!(f, "column {col} failed with status {status:?}")
            }
        }
    }
}

impl std::error::Error for BatchError {}

impl From<SolverError> for BatchError {
    fn from(err: SolverError) -> Self {
        Self::Solver(err)
    }
}

impl From<SolveError> for BatchError {
    fn from(err: SolveError) -> Self {
        Self::Solve(err)
    }
}

/// Solves one NNLS problem per column of `b`, sharing a single solver.
///
/// Returns the n-by-p solution matrix whose column j minimizes
/// `||a x - b[:, j]||_2` over `x >= 0`. The first column that fails to
/// converge aborts the whole batch.
pub fn solve_columns(
    a: MatRef<'_, f64>,
    b: MatRef<'_, f64>,
    options: &SolverOptions,
) -> Result<Mat<f64>, BatchError> {
    let n = a.ncols();
    let p = b.ncols();
    let mut solver = NnlsSolver::new(a, Parallelism::None)?;
    let mut out = Mat::zeros(n, p);
    let mut rhs = vec![0.0; b.nrows()];
    let mut x = vec![0.0; n];

    for col in 0..p {
        for (i, entry) in rhs.iter_mut().enumerate() {
            *entry = b.read(i, col);
        }
        let stats = solver.solve(&rhs, &mut x, options, None)?;
        if !stats.status.converged() {
            return Err(BatchError::Column {
                col,
                status: stats.status,
            });
        }
        for (i, &value) in x.iter().enumerate() {
            out.write(i, col, value);
        }
    }
    Ok(out)
}

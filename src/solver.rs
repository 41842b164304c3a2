use core::fmt;

use std::time::{Duration, Instant};

use faer::linalg::matmul::matmul;
use faer::mat::{from_column_major_slice, from_column_major_slice_mut};
use faer::{Mat, MatRef, Parallelism};

use crate::lstsq::RestrictedLstsq;
use crate::partition::IndexPartition;
use crate::report::{emit_line, IterationReport, Reporter, SolveStatus, SolverStats, StdoutReporter};

/// Errors while constructing the solver.
#[derive(Debug)]
pub enum SolverError {
    /// The matrix has zero rows or columns.
    InvalidDimensions { nrows: usize, ncols: usize },
    /// Workspace requirement overflowed.
    WorkspaceOverflow,
    /// Workspace allocation failed.
    WorkspaceAlloc,
    /// A solve call rejected its right-hand side or solution buffer.
    Solve(SolveError),
}

impl fmt::Display for SolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDimensions { nrows, ncols } => {
                write!(f, "invalid dimensions: nrows={nrows}, ncols={ncols}")
            }
            Self::WorkspaceOverflow => write!(f, "workspace size overflow"),
            Self::WorkspaceAlloc => write!(f, "workspace allocation failed"),
            Self::Solve(err) => write!(f, "solve rejected: {err}"),
        }
    }
}

impl std::error::Error for SolverError {}

/// Errors specific to a solve call.
#[derive(Debug)]
pub enum SolveError {
    /// The provided right-hand side has the wrong length.
    RhsDimensionMismatch { expected: usize, actual: usize },
    /// The provided x has the wrong length.
    DimensionMismatch { expected: usize, actual: usize },
}

impl fmt::Display for SolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RhsDimensionMismatch { expected, actual } => {
                write!(f, "b length {actual} does not match expected {expected}")
            }
            Self::DimensionMismatch { expected, actual } => {
                write!(f, "x length {actual} does not match expected {expected}")
            }
        }
    }
}

impl std::error::Error for SolveError {}

/// Options controlling the active-set solve.
#[derive(Debug, Clone)]
pub struct SolverOptions {
    /// Maximum number of outer iterations.
    pub max_iters: usize,
    /// Tolerance used for zero, optimality and feasibility comparisons.
    pub eps: f64,
    /// Emit per-iteration diagnostics to stdout by default.
    pub verbose: bool,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            max_iters: 30,
            eps: 1e-10,
            verbose: false,
        }
    }
}

/// Dense non-negative least-squares solver for min `||A x - b||_2`, `x >= 0`.
///
/// The matrix is copied at construction and every buffer the solve touches
/// is preallocated, so one solver can serve many right-hand sides without
/// reallocating.
pub struct NnlsSolver<'a> {
    a: Mat<f64>,
    partition: IndexPartition,
    lstsq: RestrictedLstsq<'a>,
    parallelism: Parallelism<'a>,
    residual: Vec<f64>,
    gradient: Vec<f64>,
    candidate: Vec<f64>,
    fractions: Vec<f64>,
    leaving: Vec<usize>,
}

enum ReporterSlot<'a> {
    External(&'a mut dyn Reporter),
    Local(StdoutReporter),
    None,
}

impl<'a> ReporterSlot<'a> {
    fn new(reporter: Option<&'a mut dyn Reporter>, verbose: bool) -> Self {
        match reporter {
            Some(r) => Self::External(r),
            None if verbose => Self::Local(StdoutReporter::new()),
            None => Self::None,
        }
    }

    fn as_mut(&mut self) -> Option<&mut dyn Reporter> {
        match self {
            Self::External(r) => Some(*r),
            Self::Local(r) => Some(r),
            Self::None => None,
        }
    }
}

impl<'a> NnlsSolver<'a> {
    /// Create a solver for the given matrix and parallelism mode.
    pub fn new(a: MatRef<'_, f64>, parallelism: Parallelism<'a>) -> Result<Self, SolverError> {
        let m = a.nrows();
        let n = a.ncols();
        if m == 0 || n == 0 {
            return Err(SolverError::InvalidDimensions { nrows: m, ncols: n });
        }

        let lstsq = RestrictedLstsq::new(m, n, parallelism)?;

        Ok(Self {
            a: a.to_owned(),
            partition: IndexPartition::new(n),
            lstsq,
            parallelism,
            residual: vec![0.0; m],
            gradient: vec![0.0; n],
            candidate: vec![0.0; n],
            fractions: vec![0.0; n],
            leaving: Vec::with_capacity(n),
        })
    }

    /// The matrix this solver was built for.
    pub fn matrix(&self) -> MatRef<'_, f64> {
        self.a.as_ref()
    }

    /// Solve for x >= 0 in-place using the Lawson-Hanson active-set method.
    ///
    /// On a non-converged status x holds the best iterate found.
    pub fn solve(
        &mut self,
        b: &[f64],
        x: &mut [f64],
        options: &SolverOptions,
        reporter: Option<&mut dyn Reporter>,
    ) -> Result<SolverStats, SolveError> {
        let m = self.a.nrows();
        let n = self.a.ncols();
        if b.len() != m {
            return Err(SolveError::RhsDimensionMismatch {
                expected: m,
                actual: b.len(),
            });
        }
        if x.len() != n {
            return Err(SolveError::DimensionMismatch {
                expected: n,
                actual: x.len(),
            });
        }
        let start_time = options.verbose.then(Instant::now);
        let mut reporter = ReporterSlot::new(reporter, options.verbose);
        let eps = options.eps;

        // All variables start pinned at zero, so r = b and w = A^T b.
        self.partition.reset();
        x.fill(0.0);
        self.residual.copy_from_slice(b);
        self.refresh_gradient();

        let mut residual_norm = l2_norm(&self.residual);
        let mut lstsq_solves = 0usize;
        let mut status = SolveStatus::MaxIterations;
        let mut iterations = options.max_iters;

        'outer: for iter in 0..options.max_iters {
            // Optimality test: the active index with the largest positive
            // gradient component enters the passive set. Ties go to the
            // lowest index.
            let mut entering = None;
            let mut best = eps;
            for (i, &w) in self.gradient.iter().enumerate() {
                if !self.partition.is_passive(i) && w > best {
                    best = w;
                    entering = Some(i);
                }
            }
            let Some(entering) = entering else {
                status = SolveStatus::Converged;
                iterations = iter;
                break;
            };
            self.partition.make_passive(entering);

            // Feasibility repair: re-solve the restricted problem until the
            // candidate is componentwise positive, stepping back toward the
            // previous iterate and re-pinning every coordinate that hits
            // zero on the way.
            let mut repairs = 0usize;
            loop {
                let k = self.partition.passive().len();
                self.lstsq.solve(
                    self.a.as_ref(),
                    self.partition.passive(),
                    b,
                    &mut self.candidate[..k],
                );
                lstsq_solves += 1;

                let candidate = &self.candidate[..k];
                if candidate.iter().any(|v| !v.is_finite()) {
                    status = SolveStatus::NumericalStall;
                    iterations = iter + 1;
                    break 'outer;
                }
                if candidate.iter().all(|&z| z > eps) {
                    for (j, &idx) in self.partition.passive().iter().enumerate() {
                        x[idx] = self.candidate[j];
                    }
                    break;
                }

                // Largest step toward the candidate that keeps x feasible:
                // the smallest fraction at which some coordinate reaches
                // zero.
                let passive = self.partition.passive();
                let mut alpha = f64::INFINITY;
                for (j, &idx) in passive.iter().enumerate() {
                    let z = self.candidate[j];
                    self.fractions[j] = if z <= eps {
                        x[idx] / (x[idx] - z)
                    } else {
                        f64::INFINITY
                    };
                    if self.fractions[j] < alpha {
                        alpha = self.fractions[j];
                    }
                }
                if !alpha.is_finite() {
                    status = SolveStatus::NumericalStall;
                    iterations = iter + 1;
                    break 'outer;
                }

                // Every coordinate tied at the minimal fraction leaves
                // together; dropping only one can cycle on degenerate
                // inputs.
                self.leaving.clear();
                for (j, &idx) in passive.iter().enumerate() {
                    if self.fractions[j] == alpha {
                        self.leaving.push(idx);
                    }
                }
                for (j, &idx) in passive.iter().enumerate() {
                    x[idx] += alpha * (self.candidate[j] - x[idx]);
                }

                let expelled_entering = alpha == 0.0 && self.leaving.contains(&entering);
                for &idx in &self.leaving {
                    x[idx] = 0.0;
                    self.partition.make_active(idx);
                }
                repairs += 1;

                if expelled_entering {
                    // The freed variable was pushed straight back to zero;
                    // no descent direction remains.
                    status = SolveStatus::NumericalStall;
                    iterations = iter + 1;
                    break 'outer;
                }
            }

            self.refresh_residual(b, x);
            residual_norm = l2_norm(&self.residual);
            self.refresh_gradient();

            if let Some(reporter) = reporter.as_mut() {
                reporter.on_iteration(&IterationReport {
                    iteration: iter,
                    entering,
                    passive: self.partition.passive().len(),
                    repairs,
                    residual_norm,
                    grad_max: dual_infeasibility(&self.gradient, &self.partition),
                });
            }
        }

        let stats = SolverStats {
            status,
            iterations,
            lstsq_solves,
            residual_norm,
            grad_max: dual_infeasibility(&self.gradient, &self.partition),
        };
        Ok(finish_stats(stats, start_time, &mut reporter))
    }

    fn refresh_residual(&mut self, b: &[f64], x: &[f64]) {
        let m = self.a.nrows();
        let n = self.a.ncols();
        self.residual.copy_from_slice(b);
        let r = from_column_major_slice_mut::<f64>(&mut self.residual, m, 1);
        let x_mat = from_column_major_slice::<f64>(x, n, 1);
        matmul(r, self.a.as_ref(), x_mat, Some(1.0), -1.0, self.parallelism);
    }

    fn refresh_gradient(&mut self) {
        let m = self.a.nrows();
        let n = self.a.ncols();
        let g = from_column_major_slice_mut::<f64>(&mut self.gradient, n, 1);
        let r = from_column_major_slice::<f64>(&self.residual, m, 1);
        matmul(
            g,
            self.a.as_ref().transpose(),
            r,
            None,
            1.0,
            self.parallelism,
        );
    }
}

/// Solves min `||a x - b||_2` subject to `x >= 0` with library defaults.
///
/// The iteration bound scales with the number of columns (three outer
/// iterations per variable); for finer control build an [`NnlsSolver`].
pub fn solve(a: MatRef<'_, f64>, b: &[f64]) -> Result<(SolverStats, Vec<f64>), SolverError> {
    let mut solver = NnlsSolver::new(a, Parallelism::None)?;
    let options = SolverOptions {
        max_iters: 3 * a.ncols(),
        ..SolverOptions::default()
    };
    let mut x = vec![0.0; a.ncols()];
    let stats = solver.solve(b, &mut x, &options, None)?;
    Ok((stats, x))
}

impl From<SolveError> for SolverError {
    fn from(err: SolveError) -> Self {
        Self::Solve(err)
    }
}

fn dual_infeasibility(gradient: &[f64], partition: &IndexPartition) -> f64 {
    let mut worst = 0.0;
    for (i, &w) in gradient.iter().enumerate() {
        if !partition.is_passive(i) && w > worst {
            worst = w;
        }
    }
    worst
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    let mut sum = 0.0;
    for (x, y) in a.iter().zip(b.iter()) {
        sum += x * y;
    }
    sum
}

fn l2_norm(x: &[f64]) -> f64 {
    dot(x, x).sqrt()
}

fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs_f64();
    if secs >= 1.0 {
        format!("{:.3} s", secs)
    } else if secs >= 1e-3 {
        format!("{:.3} ms", secs * 1e3)
    } else if secs >= 1e-6 {
        format!("{:.3} us", secs * 1e6)
    } else {
        format!("{:.0} ns", secs * 1e9)
    }
}

fn finish_stats(
    stats: SolverStats,
    start_time: Option<Instant>,
    reporter: &mut ReporterSlot<'_>,
) -> SolverStats {
    if let Some(reporter) = reporter.as_mut() {
        reporter.on_finish();
    }
    if let Some(start) = start_time {
        let elapsed = format_duration(start.elapsed());
        emit_line(&format!("time: {elapsed}"));
    }
    stats
}

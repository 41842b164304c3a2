//! Dense non-negative least squares (NNLS) solved with the Lawson-Hanson
//! active-set method.
//!
//! This crate minimizes `||A x - b||_2` subject to `x >= 0` for a dense
//! matrix `A`. It partitions the variables into an active set (pinned at
//! zero) and a passive set (free to vary) and reuses allocations across
//! solves.
//!
//! How it works (high level):
//! - Free the active variable with the largest positive gradient component.
//! - Solve the unconstrained problem restricted to the free columns with
//!   Householder QR.
//! - If the candidate leaves the feasible region, step back along the line
//!   toward it and re-pin every variable that hits zero.
//! - Stop once no active variable offers an improving direction.
//!
//! Calling it:
//! - Create an `NnlsSolver` from the matrix; it is reusable across
//!   right-hand sides.
//! - Call `NnlsSolver::solve` and inspect `SolverStats`, or use the
//!   one-shot `solve` / multi-column `solve_columns` forms.
//! - `check` independently verifies the optimality conditions of any
//!   candidate solution.
//!
//! Example:
//! ```rust,no_run
//! use faer::{mat, Parallelism};
//! use nnls_rs::{NnlsSolver, SolverOptions};
//!
//! let a = mat![
//!     [1.0, 1.0],
//!     [2.0, 4.0],
//!     [3.0, 9.0],
//!     [4.0, 16.0],
//! ];
//! let b = [0.6, 2.2, 4.8, 8.4];
//!
//! let mut solver = NnlsSolver::new(a.as_ref(), Parallelism::None).unwrap();
//! let mut x = vec![0.0; 2];
//! let stats = solver
//!     .solve(&b, &mut x, &SolverOptions::default(), None)
//!     .unwrap();
//! assert!(stats.status.converged());
//! ```

mod batch;
mod kkt;
mod lstsq;
mod partition;
mod report;
mod solver;

pub use batch::{solve_columns, BatchError};
pub use kkt::check;
pub use report::{IterationReport, Reporter, SolveStatus, SolverStats, StdoutReporter};
pub use solver::{solve, NnlsSolver, SolveError, SolverError, SolverOptions};

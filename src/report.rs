use comfy_table::{Cell, CellAlignment, ContentArrangement, Table, presets};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    /// The KKT conditions hold within tolerance.
    Converged,
    /// The outer iteration bound was exhausted first.
    MaxIterations,
    /// The feasibility-repair loop could not make progress.
    NumericalStall,
}

impl SolveStatus {
    /// True when the solve produced an optimal solution.
    pub fn converged(self) -> bool {
        matches!(self, Self::Converged)
    }
}

#[derive(Debug, Clone)]
pub struct SolverStats {
    pub status: SolveStatus,
    /// Completed outer iterations.
    pub iterations: usize,
    /// Restricted least-squares subproblems solved.
    pub lstsq_solves: usize,
    /// `||A x - b||_2` at the final iterate.
    pub residual_norm: f64,
    /// Largest positive gradient component over the active set.
    pub grad_max: f64,
}

#[derive(Debug, Clone)]
pub struct IterationReport {
    pub iteration: usize,
    /// Index freed at the start of this iteration.
    pub entering: usize,
    /// Passive-set size after the iteration.
    pub passive: usize,
    /// Feasibility-repair steps taken inside this iteration.
    pub repairs: usize,
    pub residual_norm: f64,
    pub grad_max: f64,
}

pub(crate) fn emit_line(line: &str) {
    if log::log_enabled!(log::Level::Info) {
        log::info!("{line}");
    } else {
        println!("{line}");
    }
}

pub trait Reporter {
    fn on_iteration(&mut self, report: &IterationReport);
    fn on_finish(&mut self) {}
}

pub struct StdoutReporter {
    rows: Vec<IterationReport>,
}

impl StdoutReporter {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }
}

impl Default for StdoutReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for StdoutReporter {
    fn on_iteration(&mut self, report: &IterationReport) {
        self.rows.push(report.clone());
    }

    fn on_finish(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        if !log::log_enabled!(log::Level::Info) {
            println!();
        }
        let mut table = Table::new();
        table.load_preset(presets::UTF8_FULL);
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec![
            Cell::new("iter").set_alignment(CellAlignment::Right),
            Cell::new("enter").set_alignment(CellAlignment::Right),
            Cell::new("passive").set_alignment(CellAlignment::Right),
            Cell::new("repairs").set_alignment(CellAlignment::Right),
            Cell::new("resid").set_alignment(CellAlignment::Right),
            Cell::new("grad").set_alignment(CellAlignment::Right),
        ]);
        for row in &self.rows {
            table.add_row(vec![
                Cell::new(row.iteration).set_alignment(CellAlignment::Right),
                Cell::new(row.entering).set_alignment(CellAlignment::Right),
                Cell::new(row.passive).set_alignment(CellAlignment::Right),
                Cell::new(row.repairs).set_alignment(CellAlignment::Right),
                Cell::new(format!("{:.4e}", row.residual_norm)).set_alignment(CellAlignment::Right),
                Cell::new(format!("{:.1e}", row.grad_max)).set_alignment(CellAlignment::Right),
            ]);
        }

        for line in table.to_string().lines() {
            emit_line(line);
        }
        self.rows.clear();
    }
}

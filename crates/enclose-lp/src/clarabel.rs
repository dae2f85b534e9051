// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! Interior-point backend built on the Clarabel conic solver.
//!
//! Every finite side of a range row and every finite column bound becomes a
//! row of `A x <= b` in a single nonnegative cone. Row duals are folded back
//! into one signed multiplier per range row; column bound duals are reduced
//! costs and are not reported.

use crate::{
    error::LpError,
    solver::{LinearSolver, LpModel, LpSense, LpStatus},
};
use clarabel::algebra::CscMatrix;
use clarabel::solver::implementations::default::DefaultSettingsBuilder;
use clarabel::solver::SupportedConeT::NonnegativeConeT;
use clarabel::solver::{DefaultSolver, IPSolver, SolverStatus};

/// Where a row of the conic problem comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    /// `a_i · x <= rhs_i`.
    RowUpper(usize),
    /// `-a_i · x <= -lhs_i`.
    RowLower(usize),
    /// A column bound.
    Bound,
}

/// Column-major sparse matrix assembly, one row at a time.
struct CscBuilder {
    rowval: Vec<Vec<usize>>,
    nzval: Vec<Vec<f64>>,
    n_rows: usize,
}

impl CscBuilder {
    fn new(n_cols: usize) -> Self {
        Self {
            rowval: vec![Vec::new(); n_cols],
            nzval: vec![Vec::new(); n_cols],
            n_rows: 0,
        }
    }

    fn push_row<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (usize, f64)>,
    {
        for (col, value) in entries {
            if value != 0.0 {
                self.rowval[col].push(self.n_rows);
                self.nzval[col].push(value);
            }
        }
        self.n_rows += 1;
    }

    fn build(self) -> CscMatrix<f64> {
        let n_cols = self.rowval.len();
        let mut colptr = Vec::with_capacity(n_cols + 1);
        colptr.push(0);
        for col in &self.rowval {
            let last = colptr.last().copied().unwrap_or(0);
            colptr.push(last + col.len());
        }
        CscMatrix::new(
            self.n_rows,
            n_cols,
            colptr,
            self.rowval.into_iter().flatten().collect(),
            self.nzval.into_iter().flatten().collect(),
        )
    }
}

/// An LP backend running Clarabel's homogeneous interior-point method.
///
/// Interior-point solutions are only accurate up to the solver tolerances,
/// which is fine here: callers certify every answer before using it.
pub struct ClarabelSolver {
    model: LpModel,
    max_iter: u32,
    time_limit: f64,
    tol_feas: f64,
    status: Option<LpStatus>,
    primal: Vec<f64>,
    dual: Vec<f64>,
    objective_value: Option<f64>,
}

impl Default for ClarabelSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ClarabelSolver {
    /// Creates a backend with an iteration limit of 100 and no time limit.
    pub fn new() -> Self {
        Self {
            model: LpModel::new(),
            max_iter: 100,
            time_limit: f64::INFINITY,
            tol_feas: 1e-9,
            status: None,
            primal: Vec::new(),
            dual: Vec::new(),
            objective_value: None,
        }
    }

    /// Sets the interior-point iteration limit.
    pub fn with_max_iter(mut self, max_iter: u32) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Sets the wall-clock limit of a single solve, in seconds.
    pub fn with_time_limit(mut self, seconds: f64) -> Self {
        self.time_limit = seconds;
        self
    }

    /// Sets the primal/dual feasibility tolerance.
    pub fn with_feasibility_tolerance(mut self, tol: f64) -> Self {
        self.tol_feas = tol;
        self
    }

    /// Returns the status of the last solve.
    #[inline]
    pub fn status(&self) -> Option<LpStatus> {
        self.status
    }

    fn reset_solution(&mut self) {
        self.status = None;
        self.primal.clear();
        self.dual.clear();
        self.objective_value = None;
    }

    /// Folds conic duals `z >= 0` into one signed multiplier per range row.
    fn fold_duals(&self, origins: &[Origin], z: &[f64]) -> Vec<f64> {
        let mut y = vec![0.0; self.model.rows().len()];
        for (origin, &zk) in origins.iter().zip(z) {
            match *origin {
                Origin::RowUpper(i) => y[i] -= zk,
                Origin::RowLower(i) => y[i] += zk,
                Origin::Bound => {}
            }
        }
        y
    }

    /// Handles a model with no finite row side and no finite bound, which
    /// Clarabel cannot take as input.
    fn solve_unconstrained(&mut self, sense: LpSense) -> LpStatus {
        let n = self.model.columns().len();
        if self.model.columns().iter().all(|c| c.obj == 0.0) {
            self.primal = vec![0.0; n];
            self.dual = vec![0.0; self.model.rows().len()];
            self.objective_value = Some(0.0);
            log::trace!("ClarabelSolver: trivial {sense} problem with zero objective");
            LpStatus::Optimal
        } else {
            LpStatus::Unbounded
        }
    }
}

impl LinearSolver for ClarabelSolver {
    fn name(&self) -> &str {
        "Clarabel"
    }

    #[inline]
    fn model(&self) -> &LpModel {
        &self.model
    }

    #[inline]
    fn model_mut(&mut self) -> &mut LpModel {
        &mut self.model
    }

    fn solve(&mut self, sense: LpSense) -> Result<LpStatus, LpError> {
        self.reset_solution();
        let n = self.model.columns().len();
        let sign = sense.sign();

        let mut a = CscBuilder::new(n);
        let mut b = Vec::new();
        let mut origins = Vec::new();

        for (i, row) in self.model.rows().iter().enumerate() {
            if row.rhs.is_finite() {
                a.push_row(row.coeffs.iter().copied().enumerate());
                b.push(row.rhs);
                origins.push(Origin::RowUpper(i));
            }
            if row.lhs.is_finite() {
                a.push_row(row.coeffs.iter().map(|&c| -c).enumerate());
                b.push(-row.lhs);
                origins.push(Origin::RowLower(i));
            }
        }
        for (j, col) in self.model.columns().iter().enumerate() {
            if col.ub.is_finite() {
                a.push_row([(j, 1.0)]);
                b.push(col.ub);
                origins.push(Origin::Bound);
            }
            if col.lb.is_finite() {
                a.push_row([(j, -1.0)]);
                b.push(-col.lb);
                origins.push(Origin::Bound);
            }
        }

        let m = b.len();
        if m == 0 {
            let status = self.solve_unconstrained(sense);
            self.status = Some(status);
            return Ok(status);
        }

        let q: Vec<f64> = self.model.columns().iter().map(|c| sign * c.obj).collect();
        let p = CscMatrix::zeros((n, n));
        let a = a.build();
        let cones = [NonnegativeConeT(m)];

        let mut settings = DefaultSettingsBuilder::<f64>::default();
        settings
            .verbose(false)
            .max_iter(self.max_iter)
            .time_limit(self.time_limit)
            .tol_feas(self.tol_feas);
        let settings = settings
            .build()
            .map_err(|e| LpError::Backend(format!("invalid settings: {e:?}")))?;

        let mut solver = DefaultSolver::new(&p, &q, &a, &b, &cones, settings)
            .map_err(|e| LpError::Backend(format!("{e:?}")))?;
        solver.solve();

        let status = match solver.solution.status {
            SolverStatus::Solved | SolverStatus::AlmostSolved => LpStatus::Optimal,
            SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
                LpStatus::Infeasible
            }
            SolverStatus::DualInfeasible | SolverStatus::AlmostDualInfeasible => {
                LpStatus::Unbounded
            }
            SolverStatus::MaxIterations | SolverStatus::MaxTime => LpStatus::LimitReached,
            _ => LpStatus::Unknown,
        };
        log::trace!(
            "ClarabelSolver: {sense} over {n} columns and {m} conic rows -> {status} ({:?})",
            solver.solution.status
        );

        match status {
            LpStatus::Optimal => {
                self.primal = solver.solution.x.clone();
                self.dual = self.fold_duals(&origins, &solver.solution.z);
                self.objective_value = Some(
                    self.model
                        .columns()
                        .iter()
                        .zip(&self.primal)
                        .map(|(c, x)| c.obj * x)
                        .sum(),
                );
            }
            LpStatus::Infeasible => {
                self.dual = self.fold_duals(&origins, &solver.solution.z);
            }
            _ => {}
        }

        self.status = Some(status);
        Ok(status)
    }

    fn objective_value(&self) -> Option<f64> {
        self.objective_value
    }

    fn primal(&self) -> Option<&[f64]> {
        match self.status {
            Some(LpStatus::Optimal) => Some(&self.primal),
            _ => None,
        }
    }

    fn dual(&self) -> Option<&[f64]> {
        match self.status {
            Some(LpStatus::Optimal) => Some(&self.dual),
            _ => None,
        }
    }

    fn infeasibility_direction(&self) -> Option<&[f64]> {
        match self.status {
            Some(LpStatus::Infeasible) => Some(&self.dual),
            _ => None,
        }
    }
}

impl std::fmt::Debug for ClarabelSolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClarabelSolver")
            .field("columns", &self.model.columns().len())
            .field("rows", &self.model.rows().len())
            .field("max_iter", &self.max_iter)
            .field("time_limit", &self.time_limit)
            .field("status", &self.status)
            .finish()
    }
}

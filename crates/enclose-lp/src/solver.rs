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

//! The LP oracle interface.
//!
//! An LP is stored as columns `lb_j <= x_j <= ub_j` with objective
//! coefficients `c_j`, and range rows `lhs_i <= a_i · x <= rhs_i` where
//! either side may be infinite. Backends keep this data in an `LpModel` and
//! expose their last solve through `primal`, `dual` and
//! `infeasibility_direction`.
//!
//! Dual convention: the dual vector `y` refers to the minimization form of
//! the objective (`c` for `Minimize`, `-c` for `Maximize`). At an optimum
//! `y_i >= 0` when the lower side of row `i` is active and `y_i <= 0` when
//! the upper side is, so that `c_min - Aᵀy` is the vector of reduced costs.

use crate::error::LpError;

/// Optimization direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LpSense {
    Minimize,
    Maximize,
}

impl LpSense {
    /// Returns `1` for minimization and `-1` for maximization.
    #[inline]
    pub fn sign(self) -> f64 {
        match self {
            LpSense::Minimize => 1.0,
            LpSense::Maximize => -1.0,
        }
    }
}

impl std::fmt::Display for LpSense {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LpSense::Minimize => write!(f, "Minimize"),
            LpSense::Maximize => write!(f, "Maximize"),
        }
    }
}

/// Outcome of an LP solve as reported by the (uncertified) backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LpStatus {
    /// An optimal primal/dual pair is available.
    Optimal,
    /// The backend claims infeasibility; a Farkas direction may be available.
    Infeasible,
    /// The objective is unbounded in the optimization direction.
    Unbounded,
    /// An iteration or time limit stopped the backend.
    LimitReached,
    /// Numerical trouble or any other undetermined outcome.
    Unknown,
}

impl std::fmt::Display for LpStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LpStatus::Optimal => write!(f, "Optimal"),
            LpStatus::Infeasible => write!(f, "Infeasible"),
            LpStatus::Unbounded => write!(f, "Unbounded"),
            LpStatus::LimitReached => write!(f, "LimitReached"),
            LpStatus::Unknown => write!(f, "Unknown"),
        }
    }
}

/// A range row `lhs <= coeffs · x <= rhs` with dense coefficients.
#[derive(Debug, Clone, PartialEq)]
pub struct LpRow {
    pub lhs: f64,
    pub coeffs: Vec<f64>,
    pub rhs: f64,
}

/// A column `lb <= x <= ub` with objective coefficient `obj`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LpColumn {
    pub obj: f64,
    pub lb: f64,
    pub ub: f64,
}

/// Backend-independent storage of an LP.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LpModel {
    columns: Vec<LpColumn>,
    rows: Vec<LpRow>,
}

impl LpModel {
    #[inline(always)]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline(always)]
    pub fn columns(&self) -> &[LpColumn] {
        &self.columns
    }

    #[inline(always)]
    pub fn rows(&self) -> &[LpRow] {
        &self.rows
    }

    /// Returns the objective coefficients.
    pub fn objective(&self) -> Vec<f64> {
        self.columns.iter().map(|c| c.obj).collect()
    }

    #[inline]
    pub fn add_column(&mut self, obj: f64, lb: f64, ub: f64) -> usize {
        self.columns.push(LpColumn { obj, lb, ub });
        self.columns.len() - 1
    }

    pub fn add_row(&mut self, lhs: f64, coeffs: &[f64], rhs: f64) -> Result<usize, LpError> {
        if coeffs.len() != self.columns.len() {
            return Err(LpError::DimensionMismatch {
                expected: self.columns.len(),
                found: coeffs.len(),
            });
        }
        self.rows.push(LpRow {
            lhs,
            coeffs: coeffs.to_vec(),
            rhs,
        });
        Ok(self.rows.len() - 1)
    }

    pub fn column_mut(&mut self, col: usize) -> Result<&mut LpColumn, LpError> {
        let len = self.columns.len();
        self.columns.get_mut(col).ok_or(LpError::IndexOutOfBounds {
            kind: "column",
            index: col,
            len,
        })
    }

    pub fn row_mut(&mut self, row: usize) -> Result<&mut LpRow, LpError> {
        let len = self.rows.len();
        self.rows.get_mut(row).ok_or(LpError::IndexOutOfBounds {
            kind: "row",
            index: row,
            len,
        })
    }

    /// Removes every row and keeps the columns.
    #[inline(always)]
    pub fn clear_rows(&mut self) {
        self.rows.clear();
    }

    /// Removes every row and column.
    #[inline]
    pub fn clear(&mut self) {
        self.rows.clear();
        self.columns.clear();
    }
}

/// An LP solver. All mutations go through the stored `LpModel`; a call to
/// `solve` refreshes the solution accessors.
pub trait LinearSolver {
    /// Returns the name of the backend.
    fn name(&self) -> &str;

    fn model(&self) -> &LpModel;

    fn model_mut(&mut self) -> &mut LpModel;

    /// Solves the current model.
    fn solve(&mut self, sense: LpSense) -> Result<LpStatus, LpError>;

    /// Returns `c · x` for the primal point of the last `Optimal` solve.
    fn objective_value(&self) -> Option<f64>;

    /// Returns the primal point of the last `Optimal` solve.
    fn primal(&self) -> Option<&[f64]>;

    /// Returns the row duals of the last `Optimal` solve (see the module
    /// documentation for the sign convention).
    fn dual(&self) -> Option<&[f64]>;

    /// Returns a row direction `y` proving infeasibility of the last
    /// `Infeasible` solve, if the backend provides one.
    fn infeasibility_direction(&self) -> Option<&[f64]>;

    #[inline(always)]
    fn nb_columns(&self) -> usize {
        self.model().columns().len()
    }

    #[inline(always)]
    fn nb_rows(&self) -> usize {
        self.model().rows().len()
    }

    #[inline(always)]
    fn add_column(&mut self, obj: f64, lb: f64, ub: f64) -> usize {
        self.model_mut().add_column(obj, lb, ub)
    }

    #[inline(always)]
    fn add_row(&mut self, lhs: f64, coeffs: &[f64], rhs: f64) -> Result<usize, LpError> {
        self.model_mut().add_row(lhs, coeffs, rhs)
    }

    #[inline]
    fn change_objective(&mut self, col: usize, coeff: f64) -> Result<(), LpError> {
        self.model_mut().column_mut(col)?.obj = coeff;
        Ok(())
    }

    /// Sets every objective coefficient to zero except `coeff` on `col`.
    fn set_single_objective(&mut self, col: usize, coeff: f64) -> Result<(), LpError> {
        let n = self.nb_columns();
        for j in 0..n {
            self.change_objective(j, 0.0)?;
        }
        self.change_objective(col, coeff)
    }

    #[inline]
    fn set_column_bounds(&mut self, col: usize, lb: f64, ub: f64) -> Result<(), LpError> {
        let column = self.model_mut().column_mut(col)?;
        column.lb = lb;
        column.ub = ub;
        Ok(())
    }

    #[inline]
    fn change_row_bounds(&mut self, row: usize, lhs: f64, rhs: f64) -> Result<(), LpError> {
        let r = self.model_mut().row_mut(row)?;
        r.lhs = lhs;
        r.rhs = rhs;
        Ok(())
    }

    #[inline(always)]
    fn clear_rows(&mut self) {
        self.model_mut().clear_rows();
    }

    #[inline(always)]
    fn clear(&mut self) {
        self.model_mut().clear();
    }
}

impl std::fmt::Debug for dyn LinearSolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LinearSolver({})", self.name())
    }
}

impl std::fmt::Display for dyn LinearSolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "LinearSolver({}, columns: {}, rows: {})",
            self.name(),
            self.nb_columns(),
            self.nb_rows()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_rejects_bad_row_dimension() {
        let mut m = LpModel::new();
        m.add_column(0.0, 0.0, 1.0);
        m.add_column(0.0, 0.0, 1.0);
        assert_eq!(
            m.add_row(f64::NEG_INFINITY, &[1.0], 1.0),
            Err(LpError::DimensionMismatch {
                expected: 2,
                found: 1
            })
        );
        assert_eq!(m.add_row(f64::NEG_INFINITY, &[1.0, 1.0], 1.0), Ok(0));
        assert_eq!(m.rows().len(), 1);
    }

    #[test]
    fn test_model_index_errors() {
        let mut m = LpModel::new();
        assert!(matches!(
            m.column_mut(0),
            Err(LpError::IndexOutOfBounds { kind: "column", .. })
        ));
        assert!(matches!(
            m.row_mut(3),
            Err(LpError::IndexOutOfBounds { kind: "row", index: 3, .. })
        ));
    }

    #[test]
    fn test_clear_rows_keeps_columns() {
        let mut m = LpModel::new();
        m.add_column(1.0, -1.0, 1.0);
        m.add_row(0.0, &[1.0], 1.0).unwrap();
        m.clear_rows();
        assert!(m.rows().is_empty());
        assert_eq!(m.columns().len(), 1);
        assert_eq!(m.objective(), vec![1.0]);
        m.clear();
        assert!(m.columns().is_empty());
    }

    #[test]
    fn test_sense_sign() {
        assert_eq!(LpSense::Minimize.sign(), 1.0);
        assert_eq!(LpSense::Maximize.sign(), -1.0);
        assert_eq!(format!("{}", LpStatus::LimitReached), "LimitReached");
    }
}

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

use crate::buffer::heap::CellCriterion;

/// Settings of the `Optimizer`.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizerConfig {
    /// Cells whose widest component is below `prec` are not split further.
    pub prec: f64,
    /// Relative precision on the objective.
    pub goal_rel_prec: f64,
    /// Absolute precision on the objective.
    pub goal_abs_prec: f64,
    /// Random points probed per cell when looking for a better incumbent.
    pub sample_size: usize,
    /// Smallest step, as a fraction of the distance to the cell border, tried
    /// by line probing.
    pub loup_tolerance: f64,
    /// Equalities `g = 0` are accepted at a point when `|g| <= eq_tolerance`.
    pub eq_tolerance: f64,
    /// Seed of the probing generator.
    pub seed: u64,
    /// Maximum number of open cells, unlimited when `None`.
    pub buffer_capacity: Option<usize>,
    /// Second order of the open cells. When set, the cells are kept in a
    /// `CellDoubleHeap` and popped under this criterion with probability
    /// `critpr / 100`, under the objective lower bound otherwise.
    pub secondary_criterion: Option<CellCriterion>,
    /// Percentage of pops taken from the secondary order.
    pub critpr: u8,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            prec: 1e-7,
            goal_rel_prec: 1e-7,
            goal_abs_prec: 1e-7,
            sample_size: 10,
            loup_tolerance: 0.1,
            eq_tolerance: 1e-8,
            seed: 1,
            buffer_capacity: None,
            secondary_criterion: None,
            critpr: 50,
        }
    }
}

impl OptimizerConfig {
    #[inline]
    pub fn with_prec(mut self, prec: f64) -> Self {
        self.prec = prec;
        self
    }

    #[inline]
    pub fn with_goal_rel_prec(mut self, goal_rel_prec: f64) -> Self {
        self.goal_rel_prec = goal_rel_prec;
        self
    }

    #[inline]
    pub fn with_goal_abs_prec(mut self, goal_abs_prec: f64) -> Self {
        self.goal_abs_prec = goal_abs_prec;
        self
    }

    #[inline]
    pub fn with_sample_size(mut self, sample_size: usize) -> Self {
        self.sample_size = sample_size;
        self
    }

    #[inline]
    pub fn with_loup_tolerance(mut self, loup_tolerance: f64) -> Self {
        self.loup_tolerance = loup_tolerance;
        self
    }

    #[inline]
    pub fn with_eq_tolerance(mut self, eq_tolerance: f64) -> Self {
        self.eq_tolerance = eq_tolerance;
        self
    }

    #[inline]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[inline]
    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = Some(capacity);
        self
    }

    /// Keeps the open cells in two orders and pops from the `criterion` order
    /// with probability `critpr / 100`.
    #[inline]
    pub fn with_secondary_criterion(mut self, criterion: CellCriterion, critpr: u8) -> Self {
        self.secondary_criterion = Some(criterion);
        self.critpr = critpr;
        self
    }

    /// Returns the objective value below which a new incumbent must fall to
    /// count as an improvement over `loup`.
    ///
    /// Cells whose objective lower bound exceeds this value cannot improve
    /// the incumbent by more than the requested precision.
    pub fn ymax(&self, loup: f64) -> f64 {
        if !loup.is_finite() {
            return loup;
        }
        let rel = loup - self.goal_rel_prec * loup.abs();
        let abs = loup - self.goal_abs_prec;
        rel.min(abs)
    }

    /// Returns `true` if `[uplo, loup]` is narrow enough to stop.
    pub fn is_gap_closed(&self, loup: f64, uplo: f64) -> bool {
        if !loup.is_finite() || uplo.is_nan() {
            return false;
        }
        let gap = loup - uplo;
        gap <= self.goal_abs_prec || gap <= self.goal_rel_prec * loup.abs()
    }
}

impl std::fmt::Display for OptimizerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "OptimizerConfig(prec: {:e}, goal_rel_prec: {:e}, goal_abs_prec: {:e}, sample_size: {}, seed: {})",
            self.prec, self.goal_rel_prec, self.goal_abs_prec, self.sample_size, self.seed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ymax_uses_the_larger_margin() {
        let config = OptimizerConfig::default()
            .with_goal_rel_prec(0.1)
            .with_goal_abs_prec(0.5);
        assert_eq!(config.ymax(100.0), 90.0);
        assert_eq!(config.ymax(1.0), 0.5);
        assert_eq!(config.ymax(f64::INFINITY), f64::INFINITY);
    }

    #[test]
    fn test_gap_closed() {
        let config = OptimizerConfig::default()
            .with_goal_rel_prec(1e-3)
            .with_goal_abs_prec(1e-6);
        assert!(config.is_gap_closed(1000.0, 999.5));
        assert!(config.is_gap_closed(0.0, -1e-7));
        assert!(!config.is_gap_closed(1.0, 0.5));
        assert!(!config.is_gap_closed(f64::INFINITY, 0.0));
        assert!(!config.is_gap_closed(f64::INFINITY, f64::INFINITY));
    }
}

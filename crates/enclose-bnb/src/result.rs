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

use crate::stats::OptimizerStatistics;

/// State of the optimizer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OptimizerStatus {
    /// No search has started since the last (re)start.
    #[default]
    Init,
    /// A search is in progress.
    Running,
    /// `loup - uplo` reached the requested precision.
    Converged,
    /// Every cell was processed without reaching the requested precision,
    /// either because no feasible point was found or because cells too small
    /// to split still hold a lower bound below `loup`.
    Exhausted,
    /// A monitor stopped the search or the buffer overflowed. The bounds are
    /// valid but not tight.
    LimitReached(String),
}

impl OptimizerStatus {
    /// Returns `true` for the three final states.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OptimizerStatus::Converged
                | OptimizerStatus::Exhausted
                | OptimizerStatus::LimitReached(_)
        )
    }
}

impl std::fmt::Display for OptimizerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptimizerStatus::Init => write!(f, "Init"),
            OptimizerStatus::Running => write!(f, "Running"),
            OptimizerStatus::Converged => write!(f, "Converged"),
            OptimizerStatus::Exhausted => write!(f, "Exhausted"),
            OptimizerStatus::LimitReached(reason) => write!(f, "LimitReached({reason})"),
        }
    }
}

/// Result of a search: the certified bracket `[uplo, loup]` of the global
/// minimum and the point achieving `loup`.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizerOutcome {
    status: OptimizerStatus,
    loup: f64,
    uplo: f64,
    loup_point: Option<Vec<f64>>,
    statistics: OptimizerStatistics,
}

impl OptimizerOutcome {
    #[inline]
    pub fn new(
        status: OptimizerStatus,
        loup: f64,
        uplo: f64,
        loup_point: Option<Vec<f64>>,
        statistics: OptimizerStatistics,
    ) -> Self {
        Self {
            status,
            loup,
            uplo,
            loup_point,
            statistics,
        }
    }

    #[inline(always)]
    pub fn status(&self) -> &OptimizerStatus {
        &self.status
    }

    /// Returns the lowest objective value proved at a feasible point, `+inf`
    /// if none was found.
    #[inline(always)]
    pub fn loup(&self) -> f64 {
        self.loup
    }

    /// Returns a certified lower bound of the global minimum.
    #[inline(always)]
    pub fn uplo(&self) -> f64 {
        self.uplo
    }

    #[inline(always)]
    pub fn loup_point(&self) -> Option<&[f64]> {
        self.loup_point.as_deref()
    }

    #[inline(always)]
    pub fn statistics(&self) -> &OptimizerStatistics {
        &self.statistics
    }

    #[inline(always)]
    pub fn is_converged(&self) -> bool {
        self.status == OptimizerStatus::Converged
    }

    /// Returns `true` if the search proved that no feasible point exists.
    #[inline]
    pub fn is_infeasible(&self) -> bool {
        self.status == OptimizerStatus::Exhausted
            && self.loup_point.is_none()
            && self.uplo == f64::INFINITY
    }

    /// Returns `loup - uplo`, `+inf` without an incumbent.
    pub fn absolute_gap(&self) -> f64 {
        if self.loup == f64::INFINITY {
            return f64::INFINITY;
        }
        (self.loup - self.uplo).max(0.0)
    }

    /// Returns `(loup - uplo) / |loup|`, `0` when both are equal.
    pub fn relative_gap(&self) -> f64 {
        let gap = self.absolute_gap();
        if gap == 0.0 {
            0.0
        } else {
            gap / self.loup.abs()
        }
    }

    /// Returns a human readable summary of the run.
    pub fn report(&self) -> String {
        let point = match &self.loup_point {
            Some(p) => format!("{p:?}"),
            None => "none".to_string(),
        };
        format!(
            "status: {}\nf* in [{}, {}] (gap: {:e})\nx*: {}\n{}",
            self.status,
            self.uplo,
            self.loup,
            self.absolute_gap(),
            point,
            self.statistics
        )
    }
}

impl std::fmt::Display for OptimizerOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "OptimizerOutcome({}, [{}, {}])",
            self.status, self.uplo, self.loup
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(status: OptimizerStatus, loup: f64, uplo: f64, point: Option<Vec<f64>>) -> OptimizerOutcome {
        OptimizerOutcome::new(status, loup, uplo, point, OptimizerStatistics::default())
    }

    #[test]
    fn test_gaps() {
        let o = outcome(OptimizerStatus::Converged, 2.0, 1.5, Some(vec![0.0]));
        assert_eq!(o.absolute_gap(), 0.5);
        assert_eq!(o.relative_gap(), 0.25);
        assert!(o.is_converged());
        assert!(!o.is_infeasible());

        let exact = outcome(OptimizerStatus::Converged, 0.0, 0.0, Some(vec![0.0]));
        assert_eq!(exact.relative_gap(), 0.0);
    }

    #[test]
    fn test_infeasible() {
        let o = outcome(OptimizerStatus::Exhausted, f64::INFINITY, f64::INFINITY, None);
        assert!(o.is_infeasible());
        assert_eq!(o.absolute_gap(), f64::INFINITY);

        let limited = outcome(
            OptimizerStatus::LimitReached("iterations".into()),
            f64::INFINITY,
            -1.0,
            None,
        );
        assert!(!limited.is_infeasible());
        assert!(limited.status().is_terminal());
    }

    #[test]
    fn test_report_mentions_status_and_bounds() {
        let o = outcome(OptimizerStatus::Converged, 1.0, 0.5, Some(vec![1.0, 2.0]));
        let report = o.report();
        assert!(report.contains("status: Converged"));
        assert!(report.contains("[0.5, 1]"));
        assert!(report.contains("[1.0, 2.0]"));
        assert!(report.contains("Enclose Optimizer Statistics:"));
    }
}

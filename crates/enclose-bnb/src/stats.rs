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

use std::time::Duration;

/// Statistics collected during one run of the optimizer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OptimizerStatistics {
    /// Cells popped from the buffer.
    pub iterations: u64,
    /// Cells proved empty by the contractor.
    pub cells_infeasible: u64,
    /// Cells discarded because their objective lower bound exceeded `ymax`.
    pub cells_cut: u64,
    /// Cells discarded by the first-order test.
    pub cells_first_order: u64,
    /// Cells dropped from the buffer by `contract_heap`.
    pub cells_evicted: u64,
    /// Cells too small to split.
    pub eps_boxes: u64,
    /// Incumbent improvements.
    pub loup_updates: u64,
    /// Deepest cell popped.
    pub max_depth: u64,
    /// Largest number of open cells observed.
    pub max_buffer_size: u64,
    /// Wall-clock time of the run.
    pub time_total: Duration,
}

impl OptimizerStatistics {
    #[inline]
    pub fn on_iteration(&mut self, depth: usize) {
        self.iterations = self.iterations.saturating_add(1);
        self.max_depth = self.max_depth.max(depth as u64);
    }

    #[inline]
    pub fn on_infeasible(&mut self) {
        self.cells_infeasible = self.cells_infeasible.saturating_add(1);
    }

    #[inline(always)]
    pub fn on_cut(&mut self) {
        self.cells_cut = self.cells_cut.saturating_add(1);
    }

    #[inline]
    pub fn on_first_order(&mut self) {
        self.cells_first_order = self.cells_first_order.saturating_add(1);
    }

    #[inline]
    pub fn on_evicted(&mut self, count: usize) {
        self.cells_evicted = self.cells_evicted.saturating_add(count as u64);
    }

    #[inline(always)]
    pub fn on_eps_box(&mut self) {
        self.eps_boxes = self.eps_boxes.saturating_add(1);
    }

    #[inline(always)]
    pub fn on_loup_update(&mut self) {
        self.loup_updates = self.loup_updates.saturating_add(1);
    }

    #[inline]
    pub fn on_buffer_size(&mut self, size: usize) {
        self.max_buffer_size = self.max_buffer_size.max(size as u64);
    }

    #[inline(always)]
    pub fn set_total_time(&mut self, duration: Duration) {
        self.time_total = duration;
    }

    /// Returns the number of cells discarded for any reason.
    #[inline]
    pub fn cells_discarded(&self) -> u64 {
        self.cells_infeasible
            .saturating_add(self.cells_cut)
            .saturating_add(self.cells_first_order)
            .saturating_add(self.cells_evicted)
    }
}

impl std::fmt::Display for OptimizerStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Enclose Optimizer Statistics:")?;
        writeln!(f, "  Iterations:            {}", self.iterations)?;
        writeln!(f, "  Max depth reached:     {}", self.max_depth)?;
        writeln!(f, "  Max buffer size:       {}", self.max_buffer_size)?;
        writeln!(f, "  Cells infeasible:      {}", self.cells_infeasible)?;
        writeln!(f, "  Cells cut (objective): {}", self.cells_cut)?;
        writeln!(f, "  Cells cut (gradient):  {}", self.cells_first_order)?;
        writeln!(f, "  Cells evicted:         {}", self.cells_evicted)?;
        writeln!(f, "  Eps boxes:             {}", self.eps_boxes)?;
        writeln!(f, "  Loup updates:          {}", self.loup_updates)?;
        writeln!(f, "  Total time:            {:.2?}", self.time_total)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let mut stats = OptimizerStatistics::default();
        stats.on_iteration(3);
        stats.on_iteration(1);
        stats.on_infeasible();
        stats.on_cut();
        stats.on_evicted(4);
        stats.on_buffer_size(7);
        stats.on_buffer_size(2);
        assert_eq!(stats.iterations, 2);
        assert_eq!(stats.max_depth, 3);
        assert_eq!(stats.max_buffer_size, 7);
        assert_eq!(stats.cells_discarded(), 6);

        stats.cells_evicted = u64::MAX;
        stats.on_evicted(1);
        assert_eq!(stats.cells_evicted, u64::MAX);
    }

    #[test]
    fn test_display_report() {
        let report = OptimizerStatistics::default().to_string();
        assert!(report.starts_with("Enclose Optimizer Statistics:"));
        assert!(report.contains("Loup updates:          0"));
    }
}

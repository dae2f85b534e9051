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

use crate::{
    cell::Cell,
    monitor::search_monitor::{PruneReason, SearchCommand, SearchMonitor, SearchProgress},
    stats::OptimizerStatistics,
};
use enclose_model::system::System;

/// A monitor that stops the search after a number of iterations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IterationLimitMonitor {
    max_iterations: u64,
}

impl IterationLimitMonitor {
    #[inline(always)]
    pub fn new(max_iterations: u64) -> Self {
        Self { max_iterations }
    }

    #[inline(always)]
    pub fn max_iterations(&self) -> u64 {
        self.max_iterations
    }
}

impl SearchMonitor for IterationLimitMonitor {
    fn name(&self) -> &str {
        "IterationLimitMonitor"
    }

    fn on_enter_search(&mut self, _system: &System, _statistics: &OptimizerStatistics) {}

    fn on_exit_search(&mut self, _statistics: &OptimizerStatistics) {}

    fn search_command(
        &mut self,
        _progress: &SearchProgress,
        statistics: &OptimizerStatistics,
    ) -> SearchCommand {
        if statistics.iterations >= self.max_iterations {
            return SearchCommand::Terminate(format!(
                "Iteration limit of {} reached",
                self.max_iterations
            ));
        }
        SearchCommand::Continue
    }

    fn on_step(&mut self, _progress: &SearchProgress, _statistics: &OptimizerStatistics) {}

    fn on_prune(&mut self, _cell: &Cell, _reason: PruneReason, _statistics: &OptimizerStatistics) {
    }

    fn on_loup_found(&mut self, _loup: f64, _point: &[f64], _statistics: &OptimizerStatistics) {}
}

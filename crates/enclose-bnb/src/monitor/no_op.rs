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
    monitor::search_monitor::{PruneReason, SearchMonitor, SearchProgress},
    stats::OptimizerStatistics,
};
use enclose_model::system::System;

/// A monitor that does nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoOpMonitor;

impl NoOpMonitor {
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl SearchMonitor for NoOpMonitor {
    fn name(&self) -> &str {
        "NoOpMonitor"
    }

    #[inline(always)]
    fn on_enter_search(&mut self, _system: &System, _statistics: &OptimizerStatistics) {}

    #[inline(always)]
    fn on_exit_search(&mut self, _statistics: &OptimizerStatistics) {}

    #[inline(always)]
    fn on_step(&mut self, _progress: &SearchProgress, _statistics: &OptimizerStatistics) {}

    #[inline(always)]
    fn on_prune(&mut self, _cell: &Cell, _reason: PruneReason, _statistics: &OptimizerStatistics) {
    }

    #[inline(always)]
    fn on_loup_found(&mut self, _loup: f64, _point: &[f64], _statistics: &OptimizerStatistics) {}
}

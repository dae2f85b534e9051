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

//! Search monitoring interface
//!
//! Declares the `SearchMonitor` trait for observing and controlling the
//! optimizer. Callbacks follow the lifecycle of a run, and a monitor can stop
//! the search through `search_command` (default: Continue).
//!
//! Lifecycle
//! - enter → {step → prune | loup found}* → exit
//! - `OptimizerStatistics` is passed to every callback.
//!
//! Methods take `&mut self`; keep callbacks light, they run on every
//! iteration.

use crate::{cell::Cell, stats::OptimizerStatistics};
use enclose_model::system::System;

/// What the search should do next.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SearchCommand {
    #[default]
    Continue,
    /// Stop the search, reporting the reason.
    Terminate(String),
}

/// Why a cell left the search without being split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PruneReason {
    /// The contractor proved the cell empty.
    Infeasible,
    /// The objective lower bound exceeds the current `ymax`.
    ObjectiveCut,
    /// The objective gradient excludes zero inside the domain.
    FirstOrder,
    /// The cell is too small to split.
    Precision,
}

impl std::fmt::Display for PruneReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PruneReason::Infeasible => write!(f, "Infeasible"),
            PruneReason::ObjectiveCut => write!(f, "ObjectiveCut"),
            PruneReason::FirstOrder => write!(f, "FirstOrder"),
            PruneReason::Precision => write!(f, "Precision"),
        }
    }
}

/// Snapshot of the search bounds, passed to per-iteration callbacks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchProgress {
    pub loup: f64,
    pub uplo: f64,
    pub buffer_size: usize,
}

/// Trait for monitoring and controlling the optimizer.
pub trait SearchMonitor {
    /// Returns the name of the monitor.
    fn name(&self) -> &str;
    /// Called when a run starts.
    fn on_enter_search(&mut self, system: &System, statistics: &OptimizerStatistics);
    /// Called when a run ends, whatever the reason.
    fn on_exit_search(&mut self, statistics: &OptimizerStatistics);
    /// Called once per iteration, before a cell is popped.
    fn search_command(
        &mut self,
        _progress: &SearchProgress,
        _statistics: &OptimizerStatistics,
    ) -> SearchCommand {
        SearchCommand::Continue
    }
    /// Called once per iteration.
    fn on_step(&mut self, progress: &SearchProgress, statistics: &OptimizerStatistics);
    /// Called when a cell is discarded.
    fn on_prune(&mut self, cell: &Cell, reason: PruneReason, statistics: &OptimizerStatistics);
    /// Called when the incumbent improves.
    fn on_loup_found(&mut self, loup: f64, point: &[f64], statistics: &OptimizerStatistics);
}

impl std::fmt::Debug for dyn SearchMonitor + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SearchMonitor({})", self.name())
    }
}

impl std::fmt::Display for dyn SearchMonitor + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SearchMonitor({})", self.name())
    }
}

impl<M> SearchMonitor for &mut M
where
    M: SearchMonitor + ?Sized,
{
    fn name(&self) -> &str {
        (**self).name()
    }

    fn on_enter_search(&mut self, system: &System, statistics: &OptimizerStatistics) {
        (**self).on_enter_search(system, statistics)
    }

    fn on_exit_search(&mut self, statistics: &OptimizerStatistics) {
        (**self).on_exit_search(statistics)
    }

    fn search_command(
        &mut self,
        progress: &SearchProgress,
        statistics: &OptimizerStatistics,
    ) -> SearchCommand {
        (**self).search_command(progress, statistics)
    }

    fn on_step(&mut self, progress: &SearchProgress, statistics: &OptimizerStatistics) {
        (**self).on_step(progress, statistics)
    }

    fn on_prune(&mut self, cell: &Cell, reason: PruneReason, statistics: &OptimizerStatistics) {
        (**self).on_prune(cell, reason, statistics)
    }

    fn on_loup_found(&mut self, loup: f64, point: &[f64], statistics: &OptimizerStatistics) {
        (**self).on_loup_found(loup, point, statistics)
    }
}

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

//! Fan-out monitor
//!
//! `CompositeMonitor` forwards every event to its children in insertion
//! order. `search_command` returns the first non-`Continue` answer, so put
//! the strictest stop condition first.

use crate::{
    cell::Cell,
    monitor::search_monitor::{PruneReason, SearchCommand, SearchMonitor, SearchProgress},
    stats::OptimizerStatistics,
};
use enclose_model::system::System;

/// A monitor that forwards events to several monitors.
#[derive(Default)]
pub struct CompositeMonitor<'a> {
    monitors: Vec<Box<dyn SearchMonitor + 'a>>,
}

impl<'a> CompositeMonitor<'a> {
    #[inline]
    pub fn new() -> Self {
        Self {
            monitors: Vec::new(),
        }
    }

    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            monitors: Vec::with_capacity(capacity),
        }
    }

    /// Adds a monitor.
    #[inline]
    pub fn add_monitor<M>(&mut self, monitor: M)
    where
        M: SearchMonitor + 'a,
    {
        self.monitors.push(Box::new(monitor));
    }

    /// Adds a monitor, builder style.
    #[inline]
    pub fn with<M>(mut self, monitor: M) -> Self
    where
        M: SearchMonitor + 'a,
    {
        self.add_monitor(monitor);
        self
    }

    #[inline]
    pub fn monitors(&self) -> &[Box<dyn SearchMonitor + 'a>] {
        &self.monitors
    }

    #[inline]
    pub fn clear(&mut self) {
        self.monitors.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.monitors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.monitors.is_empty()
    }
}

impl<'a> FromIterator<Box<dyn SearchMonitor + 'a>> for CompositeMonitor<'a> {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = Box<dyn SearchMonitor + 'a>>,
    {
        Self {
            monitors: iter.into_iter().collect(),
        }
    }
}

impl SearchMonitor for CompositeMonitor<'_> {
    fn name(&self) -> &str {
        "CompositeMonitor"
    }

    fn on_enter_search(&mut self, system: &System, statistics: &OptimizerStatistics) {
        for monitor in &mut self.monitors {
            monitor.on_enter_search(system, statistics);
        }
    }

    fn on_exit_search(&mut self, statistics: &OptimizerStatistics) {
        for monitor in &mut self.monitors {
            monitor.on_exit_search(statistics);
        }
    }

    fn search_command(
        &mut self,
        progress: &SearchProgress,
        statistics: &OptimizerStatistics,
    ) -> SearchCommand {
        for monitor in &mut self.monitors {
            let cmd = monitor.search_command(progress, statistics);
            if !matches!(cmd, SearchCommand::Continue) {
                return cmd;
            }
        }
        SearchCommand::Continue
    }

    fn on_step(&mut self, progress: &SearchProgress, statistics: &OptimizerStatistics) {
        for monitor in &mut self.monitors {
            monitor.on_step(progress, statistics);
        }
    }

    fn on_prune(&mut self, cell: &Cell, reason: PruneReason, statistics: &OptimizerStatistics) {
        for monitor in &mut self.monitors {
            monitor.on_prune(cell, reason, statistics);
        }
    }

    fn on_loup_found(&mut self, loup: f64, point: &[f64], statistics: &OptimizerStatistics) {
        for monitor in &mut self.monitors {
            monitor.on_loup_found(loup, point, statistics);
        }
    }
}

impl std::fmt::Debug for CompositeMonitor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.monitors.iter().map(|m| m.name()))
            .finish()
    }
}

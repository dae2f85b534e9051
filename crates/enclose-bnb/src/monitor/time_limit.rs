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
use std::time::{Duration, Instant};

/// A monitor that stops the search after a wall-clock duration.
///
/// The clock is read only every `check_interval` iterations.
#[derive(Debug, Clone)]
pub struct TimeLimitMonitor {
    time_limit: Duration,
    start_time: Option<Instant>,
    check_interval: u64,
    steps_since_last_check: u64,
}

impl TimeLimitMonitor {
    /// Creates a monitor with the given limit, checking the clock every
    /// `check_interval` iterations.
    pub fn new(time_limit: Duration, check_interval: u64) -> Self {
        Self {
            time_limit,
            start_time: None,
            check_interval: check_interval.max(1),
            steps_since_last_check: 0,
        }
    }

    /// Creates a monitor checking the clock every 64 iterations.
    pub fn with_default_check_interval(time_limit: Duration) -> Self {
        Self::new(time_limit, 64)
    }
}

impl SearchMonitor for TimeLimitMonitor {
    fn name(&self) -> &str {
        "TimeLimitMonitor"
    }

    fn on_enter_search(&mut self, _system: &System, _statistics: &OptimizerStatistics) {
        self.start_time = Some(Instant::now());
        self.steps_since_last_check = 0;
    }

    fn on_exit_search(&mut self, _statistics: &OptimizerStatistics) {
        self.start_time = None;
    }

    fn search_command(
        &mut self,
        _progress: &SearchProgress,
        _statistics: &OptimizerStatistics,
    ) -> SearchCommand {
        self.steps_since_last_check = self.steps_since_last_check.saturating_add(1);
        if self.steps_since_last_check >= self.check_interval {
            self.steps_since_last_check = 0;
            if let Some(start) = self.start_time
                && start.elapsed() > self.time_limit
            {
                return SearchCommand::Terminate(format!(
                    "Time limit of {:.3}s exceeded",
                    self.time_limit.as_secs_f64()
                ));
            }
        }
        SearchCommand::Continue
    }

    fn on_step(&mut self, _progress: &SearchProgress, _statistics: &OptimizerStatistics) {}

    fn on_prune(&mut self, _cell: &Cell, _reason: PruneReason, _statistics: &OptimizerStatistics) {
    }

    fn on_loup_found(&mut self, _loup: f64, _point: &[f64], _statistics: &OptimizerStatistics) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use enclose_model::system::SystemBuilder;

    #[test]
    fn test_zero_limit_terminates_at_first_check() {
        let system = SystemBuilder::new(1).build();
        let stats = OptimizerStatistics::default();
        let progress = SearchProgress {
            loup: f64::INFINITY,
            uplo: f64::NEG_INFINITY,
            buffer_size: 0,
        };
        let mut monitor = TimeLimitMonitor::new(Duration::ZERO, 2);
        monitor.on_enter_search(&system, &stats);
        std::thread::sleep(Duration::from_millis(2));
        assert_eq!(
            monitor.search_command(&progress, &stats),
            SearchCommand::Continue
        );
        assert!(matches!(
            monitor.search_command(&progress, &stats),
            SearchCommand::Terminate(_)
        ));
    }

    #[test]
    fn test_inactive_outside_search() {
        let stats = OptimizerStatistics::default();
        let progress = SearchProgress {
            loup: 0.0,
            uplo: 0.0,
            buffer_size: 0,
        };
        let mut monitor = TimeLimitMonitor::new(Duration::ZERO, 1);
        assert_eq!(
            monitor.search_command(&progress, &stats),
            SearchCommand::Continue
        );
    }
}

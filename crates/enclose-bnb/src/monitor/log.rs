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
use std::time::{Duration, Instant};

/// Prints a progress table to stdout at a fixed time interval.
///
/// The clock is read only on iterations whose count has all bits of
/// `clock_check_mask` cleared.
#[derive(Debug, Clone)]
pub struct LogMonitor {
    start_time: Instant,
    last_log_time: Instant,
    log_interval: Duration,
    clock_check_mask: u64,
}

impl LogMonitor {
    pub fn new(log_interval: Duration, clock_check_mask: u64) -> Self {
        Self {
            start_time: Instant::now(),
            last_log_time: Instant::now(),
            log_interval,
            clock_check_mask,
        }
    }

    #[inline(always)]
    fn print_header(&self) {
        println!(
            "{:<9} | {:<12} | {:<23} | {:<23} | {:<10} | {:<10}",
            "Elapsed", "Iterations", "Uplo", "Loup", "Buffer", "Discarded"
        );
        println!("{}", "-".repeat(100));
    }

    #[inline(always)]
    fn log_line(&mut self, progress: &SearchProgress, stats: &OptimizerStatistics) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.start_time).as_secs_f32();
        let elapsed_field = format!("{:.1}s", elapsed);
        println!(
            "{:<9} | {:<12} | {:<23e} | {:<23e} | {:<10} | {:<10}",
            elapsed_field,
            stats.iterations,
            progress.uplo,
            progress.loup,
            progress.buffer_size,
            stats.cells_discarded()
        );
        self.last_log_time = now;
    }
}

impl Default for LogMonitor {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), 255)
    }
}

impl std::fmt::Display for LogMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "LogMonitor(log_interval: {}s, clock_check_mask: {})",
            self.log_interval.as_secs(),
            self.clock_check_mask
        )
    }
}

impl SearchMonitor for LogMonitor {
    fn name(&self) -> &str {
        "LogMonitor"
    }

    fn on_enter_search(&mut self, _system: &System, _statistics: &OptimizerStatistics) {
        self.start_time = Instant::now();
        self.last_log_time = self.start_time;
        self.print_header();
    }

    fn on_exit_search(&mut self, statistics: &OptimizerStatistics) {
        println!("{}", "-".repeat(100));
        println!("Search finished after {} iterations.", statistics.iterations);
    }

    fn on_step(&mut self, progress: &SearchProgress, statistics: &OptimizerStatistics) {
        if (statistics.iterations & self.clock_check_mask) == 0
            && self.last_log_time.elapsed() >= self.log_interval
        {
            self.log_line(progress, statistics);
        }
    }

    fn on_prune(&mut self, _cell: &Cell, _reason: PruneReason, _statistics: &OptimizerStatistics) {
    }

    fn on_loup_found(&mut self, loup: f64, _point: &[f64], statistics: &OptimizerStatistics) {
        println!(
            "{:<9} | new loup {:e} at iteration {}",
            format!("{:.1}s", self.start_time.elapsed().as_secs_f32()),
            loup,
            statistics.iterations
        );
    }
}

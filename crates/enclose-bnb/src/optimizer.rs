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

//! Best-first interval branch-and-bound
//!
//! The optimizer keeps open cells in an `OptimizationHeap` ordered by the
//! lower bound of the objective over each cell, or in a `CellDoubleHeap`
//! that also orders them by a secondary criterion when the configuration
//! names one. Every iteration pops the most promising cell and
//! 1. contracts it, discarding it if it is proved empty,
//! 2. discards it if its objective lower bound exceeds `ymax`,
//! 3. discards it (unconstrained problems only) if the gradient excludes
//!    zero along a variable strictly inside the initial domain,
//! 4. looks for a better feasible point (`loup`),
//! 5. splits it, or records it as an eps-box when it is too small to split.
//!
//! Bounds
//! - `loup` is the objective upper bound at the best certified feasible
//!   point. It only decreases.
//! - `uplo` is a certified lower bound of the global minimum. It only
//!   increases and never exceeds `loup`.
//! - `uplo_of_epsboxes` is the smallest objective lower bound among the
//!   cells dropped for being too small.
//!
//! Every incumbent improvement evicts the cells whose cost reaches the new
//! `ymax` and forwards `ymax` to the contractor.
//!
//! States
//! - `Init` → `Running` → `Converged` | `Exhausted` | `LimitReached`.
//! - `restart` returns to `Init` with the same initial domain; `run` after a
//!   `LimitReached` resumes with the open cells kept.

use crate::{
    bisector::{Bisector, LargestFirst},
    buffer::{
        CellBuffer, CellBufferError,
        double_heap::CellDoubleHeap,
        heap::{ObjectiveLowerBound, OptimCost, OptimizationHeap},
    },
    cell::Cell,
    config::OptimizerConfig,
    error::OptimizerError,
    loup::{Candidate, LoupFinder},
    monitor::search_monitor::{PruneReason, SearchCommand, SearchMonitor, SearchProgress},
    result::{OptimizerOutcome, OptimizerStatus},
    stats::OptimizerStatistics,
};
use enclose_core::math::interval_box::IntervalBox;
use enclose_ctc::contractor::{ContractError, Contractor};
use enclose_model::{eval_box::Evaluable, system::System};

/// Global minimizer of the objective of a `System` over a box.
pub struct Optimizer<'a, C, B = LargestFirst>
where
    C: Contractor,
    B: Bisector,
{
    system: &'a System,
    contractor: C,
    bisector: B,
    config: OptimizerConfig,
    buffer: Box<dyn CellBuffer>,
    loup_finder: LoupFinder,
    initial_domain: Option<IntervalBox>,
    status: OptimizerStatus,
    loup: f64,
    uplo: f64,
    uplo_of_epsboxes: f64,
    loup_point: Option<Vec<f64>>,
    pending_limit: Option<String>,
    stats: OptimizerStatistics,
}

impl<'a, C> Optimizer<'a, C, LargestFirst>
where
    C: Contractor,
{
    /// Creates an optimizer with the default bisector and settings.
    #[inline]
    pub fn with_contractor(system: &'a System, contractor: C) -> Result<Self, OptimizerError> {
        Self::new(
            system,
            contractor,
            LargestFirst::default(),
            OptimizerConfig::default(),
        )
    }
}

impl<'a, C, B> Optimizer<'a, C, B>
where
    C: Contractor,
    B: Bisector,
{
    /// Creates an optimizer for `system`.
    ///
    /// Returns `OptimizerError::MissingObjective` if the system has nothing
    /// to minimize and `OptimizerError::InvalidCritpr` if the secondary heap
    /// probability exceeds 100.
    pub fn new(
        system: &'a System,
        contractor: C,
        bisector: B,
        config: OptimizerConfig,
    ) -> Result<Self, OptimizerError> {
        if system.objective().is_none() {
            return Err(OptimizerError::MissingObjective);
        }
        let buffer = Self::make_buffer(&config)?;
        let loup_finder = LoupFinder::from_config(&config);

        Ok(Self {
            system,
            contractor,
            bisector,
            config,
            buffer,
            loup_finder,
            initial_domain: None,
            status: OptimizerStatus::Init,
            loup: f64::INFINITY,
            uplo: f64::NEG_INFINITY,
            uplo_of_epsboxes: f64::INFINITY,
            loup_point: None,
            pending_limit: None,
            stats: OptimizerStatistics::default(),
        })
    }

    #[inline(always)]
    pub fn system(&self) -> &System {
        self.system
    }

    #[inline(always)]
    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    #[inline(always)]
    pub fn contractor(&self) -> &C {
        &self.contractor
    }

    #[inline(always)]
    pub fn bisector(&self) -> &B {
        &self.bisector
    }

    #[inline(always)]
    pub fn status(&self) -> &OptimizerStatus {
        &self.status
    }

    #[inline(always)]
    pub fn loup(&self) -> f64 {
        self.loup
    }

    #[inline(always)]
    pub fn uplo(&self) -> f64 {
        self.uplo
    }

    #[inline(always)]
    pub fn uplo_of_epsboxes(&self) -> f64 {
        self.uplo_of_epsboxes
    }

    #[inline(always)]
    pub fn loup_point(&self) -> Option<&[f64]> {
        self.loup_point.as_deref()
    }

    #[inline(always)]
    pub fn statistics(&self) -> &OptimizerStatistics {
        &self.stats
    }

    #[inline(always)]
    pub fn initial_domain(&self) -> Option<&IntervalBox> {
        self.initial_domain.as_ref()
    }

    /// Returns the cell buffer.
    #[inline(always)]
    pub fn buffer(&self) -> &dyn CellBuffer {
        self.buffer.as_ref()
    }

    /// Returns the number of open cells.
    #[inline(always)]
    pub fn buffer_size(&self) -> usize {
        self.buffer.len()
    }

    /// Minimizes the objective over `domain`, starting from scratch.
    pub fn optimize<M>(
        &mut self,
        domain: IntervalBox,
        monitor: M,
    ) -> Result<OptimizerOutcome, OptimizerError>
    where
        M: SearchMonitor,
    {
        self.system.check_domain(&domain)?;
        self.initial_domain = Some(domain);
        self.restart()?;
        self.run(monitor)
    }

    /// Drops all search state and returns to `Init`. The initial domain is
    /// kept, so the next `run` repeats the search from the root.
    pub fn restart(&mut self) -> Result<(), OptimizerError> {
        if self.initial_domain.is_none() {
            return Err(OptimizerError::MissingDomain);
        }
        self.buffer.flush();
        self.buffer.set_loup(f64::INFINITY);
        self.status = OptimizerStatus::Init;
        self.loup = f64::INFINITY;
        self.uplo = f64::NEG_INFINITY;
        self.uplo_of_epsboxes = f64::INFINITY;
        self.loup_point = None;
        self.pending_limit = None;
        self.stats = OptimizerStatistics::default();
        self.loup_finder.reseed();
        self.contractor.restart();
        self.bisector.restart();
        Ok(())
    }

    /// Runs the search until it converges, runs out of cells, or `monitor`
    /// stops it.
    pub fn run<M>(&mut self, mut monitor: M) -> Result<OptimizerOutcome, OptimizerError>
    where
        M: SearchMonitor,
    {
        let Some(domain) = self.initial_domain.clone() else {
            return Err(OptimizerError::MissingDomain);
        };
        match self.status {
            OptimizerStatus::Converged | OptimizerStatus::Exhausted => return Ok(self.outcome()),
            OptimizerStatus::Init => self.push_root(domain)?,
            OptimizerStatus::Running | OptimizerStatus::LimitReached(_) => {}
        }

        let start_time = std::time::Instant::now();
        let elapsed_before = self.stats.time_total;
        self.status = OptimizerStatus::Running;
        monitor.on_enter_search(self.system, &self.stats);

        let status = loop {
            if self.config.is_gap_closed(self.loup, self.uplo) {
                break OptimizerStatus::Converged;
            }
            if let Some(reason) = self.pending_limit.take() {
                break OptimizerStatus::LimitReached(reason);
            }
            if self.buffer.is_empty() {
                break self.close_empty_buffer();
            }

            let progress = self.progress();
            monitor.on_step(&progress, &self.stats);
            if let SearchCommand::Terminate(msg) = monitor.search_command(&progress, &self.stats) {
                break OptimizerStatus::LimitReached(msg);
            }

            if let Err(e) = self.step(&mut monitor) {
                self.stats.set_total_time(elapsed_before + start_time.elapsed());
                monitor.on_exit_search(&self.stats);
                return Err(e);
            }
        };

        log::debug!(
            "Optimizer: {status} after {} iterations, f* in [{}, {}]",
            self.stats.iterations,
            self.uplo,
            self.loup
        );
        self.status = status;
        self.stats.set_total_time(elapsed_before + start_time.elapsed());
        monitor.on_exit_search(&self.stats);
        Ok(self.outcome())
    }

    /// Snapshot of the current bounds and statistics.
    pub fn outcome(&self) -> OptimizerOutcome {
        OptimizerOutcome::new(
            self.status.clone(),
            self.loup,
            self.uplo,
            self.loup_point.clone(),
            self.stats.clone(),
        )
    }

    fn progress(&self) -> SearchProgress {
        SearchProgress {
            loup: self.loup,
            uplo: self.uplo,
            buffer_size: self.buffer.len(),
        }
    }

    fn make_buffer(config: &OptimizerConfig) -> Result<Box<dyn CellBuffer>, OptimizerError> {
        let Some(criterion) = config.secondary_criterion else {
            let heap = match config.buffer_capacity {
                Some(capacity) => OptimizationHeap::with_capacity(ObjectiveLowerBound, capacity),
                None => OptimizationHeap::new(ObjectiveLowerBound),
            };
            return Ok(Box::new(heap));
        };
        if config.critpr > 100 {
            return Err(OptimizerError::InvalidCritpr(config.critpr));
        }
        let second = OptimCost::new(criterion);
        let heap = match config.buffer_capacity {
            Some(capacity) => CellDoubleHeap::with_capacity(
                ObjectiveLowerBound,
                second,
                config.critpr,
                config.seed,
                capacity,
            ),
            None => CellDoubleHeap::new(ObjectiveLowerBound, second, config.critpr, config.seed),
        };
        Ok(Box::new(heap))
    }

    fn push_root(&mut self, domain: IntervalBox) -> Result<(), OptimizerError> {
        let mut root = Cell::root(domain);
        if root.domain().is_empty() {
            return Ok(());
        }
        let lb = root.objective(self.system).lb();
        self.push_cell(root, lb)
    }

    /// Pushes `cell`. On overflow the cell is kept as an eps-box, so its
    /// lower bound still counts, and the search stops at the next iteration.
    fn push_cell(&mut self, mut cell: Cell, lb: f64) -> Result<(), OptimizerError> {
        if self.buffer.needs_feasibility() {
            cell.feasibility(self.system, self.config.eq_tolerance);
        }
        match self.buffer.push(cell) {
            Ok(()) => {
                self.stats.on_buffer_size(self.buffer.len());
                Ok(())
            }
            Err(CellBufferError::Overflow { capacity }) => {
                self.record_eps_box(lb);
                self.pending_limit
                    .get_or_insert_with(|| format!("Buffer capacity of {capacity} cells reached"));
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn step<M>(&mut self, monitor: &mut M) -> Result<(), OptimizerError>
    where
        M: SearchMonitor,
    {
        // The popped cell may come from the secondary order, so the lower
        // bound is read before the pop.
        let floor = self.buffer.minimum().unwrap_or(f64::NEG_INFINITY);
        let mut cell = self.buffer.pop()?;
        self.stats.on_iteration(cell.depth());
        self.raise_uplo(floor.min(self.uplo_of_epsboxes));

        match self.contractor.contract(cell.domain_mut()) {
            Ok(()) | Err(ContractError::Unavailable) => {}
            Err(ContractError::EmptyBox) => {
                self.prune(&cell, PruneReason::Infeasible, monitor);
                return Ok(());
            }
            Err(ContractError::Lp(e)) => return Err(e.into()),
        }
        if cell.domain().is_empty() || cell.evaluable_mut().is_certainly_infeasible(self.system) {
            self.prune(&cell, PruneReason::Infeasible, monitor);
            return Ok(());
        }

        let image = cell.objective(self.system);
        if image.is_empty() || image.lb() > self.config.ymax(self.loup) {
            self.prune(&cell, PruneReason::ObjectiveCut, monitor);
            return Ok(());
        }

        if self.system.nb_ctr() == 0 && self.gradient_excludes_zero(cell.domain()) {
            self.prune(&cell, PruneReason::FirstOrder, monitor);
            return Ok(());
        }

        if let Some(candidate) = self.loup_finder.find(self.system, cell.domain(), self.loup) {
            self.update_loup(candidate, monitor);
            if image.lb() > self.config.ymax(self.loup) {
                self.prune(&cell, PruneReason::ObjectiveCut, monitor);
                return Ok(());
            }
        }

        let Some(var) = self.bisector.choose_var(cell.domain(), self.config.prec) else {
            self.record_eps_box(image.lb());
            self.prune(&cell, PruneReason::Precision, monitor);
            return Ok(());
        };

        let (left, right) = self.bisector.bisect(cell, var);
        for mut child in [left, right] {
            let image = child.objective(self.system);
            if image.is_empty() || image.lb() > self.config.ymax(self.loup) {
                self.prune(&child, PruneReason::ObjectiveCut, monitor);
            } else if child.domain().max_diam() < self.config.prec {
                self.record_eps_box(image.lb());
                self.prune(&child, PruneReason::Precision, monitor);
            } else {
                self.push_cell(child, image.lb())?;
            }
        }
        Ok(())
    }

    /// Returns `true` if some variable lies strictly inside the initial
    /// domain over `bx` while the partial derivative of the objective
    /// excludes zero there. No local minimum of the unconstrained problem can
    /// lie in such a box.
    fn gradient_excludes_zero(&self, bx: &IntervalBox) -> bool {
        let (Some(objective), Some(initial)) = (self.system.objective(), &self.initial_domain)
        else {
            return false;
        };
        let gradient = objective.gradient(bx);
        if gradient.is_empty() {
            return false;
        }
        bx.iter()
            .zip(initial.iter())
            .zip(gradient.iter())
            .any(|((iv, init), g)| {
                iv.lb() > init.lb() && iv.ub() < init.ub() && !g.contains(0.0)
            })
    }

    fn update_loup<M>(&mut self, candidate: Candidate, monitor: &mut M)
    where
        M: SearchMonitor,
    {
        let Candidate { value, point } = candidate;
        log::debug!("Optimizer: loup {} -> {value} at {point:?}", self.loup);
        self.loup = value;
        self.uplo = self.uplo.min(self.loup);
        self.stats.on_loup_update();

        let ymax = self.config.ymax(self.loup);
        self.buffer.set_loup(self.loup);
        let evicted = self.buffer.contract(ymax);
        if evicted > 0 {
            log::trace!("Optimizer: {evicted} cells evicted below ymax {ymax}");
        }
        self.stats.on_evicted(evicted);
        self.contractor.on_incumbent(ymax);
        monitor.on_loup_found(self.loup, &point, &self.stats);
        self.loup_point = Some(point);
    }

    #[inline]
    fn record_eps_box(&mut self, lb: f64) {
        self.stats.on_eps_box();
        if lb < self.uplo_of_epsboxes {
            self.uplo_of_epsboxes = lb;
        }
    }

    /// Raises `uplo` to `value`, never above `loup`.
    #[inline]
    fn raise_uplo(&mut self, value: f64) {
        let value = value.min(self.loup);
        if value > self.uplo {
            self.uplo = value;
        }
    }

    /// Closes the bounds once every cell has been processed.
    fn close_empty_buffer(&mut self) -> OptimizerStatus {
        if self.loup.is_finite() {
            let ymax = self.config.ymax(self.loup);
            self.raise_uplo(ymax.min(self.uplo_of_epsboxes));
            if self.uplo_of_epsboxes >= ymax || self.config.is_gap_closed(self.loup, self.uplo) {
                OptimizerStatus::Converged
            } else {
                OptimizerStatus::Exhausted
            }
        } else {
            self.raise_uplo(self.uplo_of_epsboxes);
            OptimizerStatus::Exhausted
        }
    }

    fn prune<M>(&mut self, cell: &Cell, reason: PruneReason, monitor: &mut M)
    where
        M: SearchMonitor,
    {
        match reason {
            PruneReason::Infeasible => self.stats.on_infeasible(),
            PruneReason::ObjectiveCut => self.stats.on_cut(),
            PruneReason::FirstOrder => self.stats.on_first_order(),
            PruneReason::Precision => {}
        }
        log::trace!("Optimizer: {cell} pruned ({reason})");
        monitor.on_prune(cell, reason, &self.stats);
    }
}

impl<C, B> std::fmt::Debug for Optimizer<'_, C, B>
where
    C: Contractor,
    B: Bisector,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Optimizer")
            .field("contractor", &self.contractor.name())
            .field("bisector", &self.bisector.name())
            .field("config", &self.config)
            .field("status", &self.status)
            .field("loup", &self.loup)
            .field("uplo", &self.uplo)
            .field("buffer", &self.buffer)
            .finish()
    }
}

impl<C, B> std::fmt::Display for Optimizer<'_, C, B>
where
    C: Contractor,
    B: Bisector,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Optimizer({}, f* in [{}, {}], {} open cells)",
            self.status,
            self.uplo,
            self.loup,
            self.buffer.len()
        )
    }
}

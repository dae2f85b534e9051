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

//! Best-first cell heap
//!
//! `CellHeap<C>` pops the cell of smallest `C::cost`. The cost is computed
//! once on push and stored next to the cell, so costs must only depend on
//! data the cell already carries (typically its cached objective image and
//! feasibility ratio) and on the incumbent. Criteria that read the incumbent
//! report it through `depends_on_loup`; `set_loup` then re-keys the heap.
//!
//! Ties are broken by `C::tie_break` and then by insertion order, which makes
//! the pop order fully deterministic.
//!
//! `contract_heap(bound)` drops every cell with `cost >= bound`. The optimizer
//! calls it each time the incumbent improves.

use crate::{
    buffer::{CellBuffer, CellBufferError},
    cell::Cell,
};
use std::{cmp::Ordering, collections::BinaryHeap};

/// A cost function ordering cells in a `CellHeap`. Smaller is explored first.
pub trait CellCost {
    /// Returns the name of the criterion.
    fn name(&self) -> &str;

    /// Returns the cost of `cell`.
    fn cost(&self, cell: &Cell) -> f64;

    /// Secondary key for cells of equal cost. Smaller first.
    #[inline]
    fn tie_break(&self, _cell: &Cell) -> f64 {
        0.0
    }

    /// Returns `true` if the cost reads the incumbent value.
    #[inline(always)]
    fn depends_on_loup(&self) -> bool {
        false
    }

    /// Informs the criterion of a new incumbent value.
    #[inline]
    fn set_loup(&mut self, _loup: f64) {}

    /// Returns `true` if the cost reads `Cell::cached_feasibility`.
    #[inline(always)]
    fn needs_feasibility(&self) -> bool {
        false
    }
}

impl<F> CellCost for F
where
    F: Fn(&Cell) -> f64,
{
    fn name(&self) -> &str {
        "Closure"
    }

    #[inline]
    fn cost(&self, cell: &Cell) -> f64 {
        self(cell)
    }
}

/// Lower bound of the cached objective image ("LB"). Cells without a cached
/// image cost `-inf` and are explored first.
///
/// Ties are broken by the upper bound of the image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObjectiveLowerBound;

impl CellCost for ObjectiveLowerBound {
    fn name(&self) -> &str {
        "LB"
    }

    #[inline]
    fn cost(&self, cell: &Cell) -> f64 {
        match cell.cached_objective() {
            Some(image) if !image.is_empty() => image.lb(),
            _ => f64::NEG_INFINITY,
        }
    }

    #[inline]
    fn tie_break(&self, cell: &Cell) -> f64 {
        match cell.cached_objective() {
            Some(image) if !image.is_empty() => image.ub(),
            _ => f64::NEG_INFINITY,
        }
    }
}

/// Upper bound of the cached objective image ("UB").
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObjectiveUpperBound;

impl CellCost for ObjectiveUpperBound {
    fn name(&self) -> &str {
        "UB"
    }

    #[inline]
    fn cost(&self, cell: &Cell) -> f64 {
        match cell.cached_objective() {
            Some(image) if !image.is_empty() => image.ub(),
            _ => f64::NEG_INFINITY,
        }
    }
}

/// Deepest cell first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DepthCost;

impl CellCost for DepthCost {
    fn name(&self) -> &str {
        "Depth"
    }

    #[inline]
    fn cost(&self, cell: &Cell) -> f64 {
        -(cell.depth() as f64)
    }
}

/// The cell orderings available to the optimizer, named after the cost they
/// minimize. `pf` is the cached objective image, `pu` the feasibility ratio
/// and `loup` the incumbent value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellCriterion {
    /// `pf.lb`.
    LowerBound,
    /// `pf.ub`.
    UpperBound,
    /// `-(loup - pf.lb) / pf.diam`: the share of the image below the
    /// incumbent, largest first.
    LoupGap,
    /// `-pu * (loup - pf.lb) / pf.diam`: the loup gap weighted by the
    /// feasibility ratio.
    FeasibleLoupGap,
    /// `pf.lb / (pu * (loup - pf.lb) / pf.diam)`.
    LowerBoundOverGap,
    /// `-pu`: most feasible first.
    Feasibility,
}

impl CellCriterion {
    /// Returns the short name of the criterion.
    pub fn code(&self) -> &'static str {
        match self {
            CellCriterion::LowerBound => "LB",
            CellCriterion::UpperBound => "UB",
            CellCriterion::LoupGap => "C3",
            CellCriterion::FeasibleLoupGap => "C5",
            CellCriterion::LowerBoundOverGap => "C7",
            CellCriterion::Feasibility => "PU",
        }
    }

    #[inline(always)]
    pub fn depends_on_loup(&self) -> bool {
        matches!(
            self,
            CellCriterion::LoupGap | CellCriterion::FeasibleLoupGap | CellCriterion::LowerBoundOverGap
        )
    }

    #[inline(always)]
    pub fn needs_feasibility(&self) -> bool {
        matches!(
            self,
            CellCriterion::FeasibleLoupGap
                | CellCriterion::LowerBoundOverGap
                | CellCriterion::Feasibility
        )
    }
}

impl std::fmt::Display for CellCriterion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// A `CellCriterion` together with the incumbent it reads.
///
/// Cells without a cached objective image cost `-inf`. While no incumbent is
/// known the incumbent-based criteria order by `pf.lb`. A cell without a
/// cached feasibility ratio counts as fully feasible.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptimCost {
    criterion: CellCriterion,
    loup: f64,
}

impl OptimCost {
    #[inline]
    pub fn new(criterion: CellCriterion) -> Self {
        Self {
            criterion,
            loup: f64::INFINITY,
        }
    }

    #[inline(always)]
    pub fn criterion(&self) -> CellCriterion {
        self.criterion
    }

    #[inline(always)]
    pub fn loup(&self) -> f64 {
        self.loup
    }

    /// Returns `pu * (loup - lb) / diam`, infinite for a degenerate image.
    fn weighted_gap(&self, lb: f64, diam: f64, pu: f64) -> f64 {
        let gap = self.loup - lb;
        if diam > 0.0 {
            pu * gap / diam
        } else if gap > 0.0 && pu > 0.0 {
            f64::INFINITY
        } else {
            0.0
        }
    }
}

impl From<CellCriterion> for OptimCost {
    fn from(criterion: CellCriterion) -> Self {
        Self::new(criterion)
    }
}

impl CellCost for OptimCost {
    fn name(&self) -> &str {
        self.criterion.code()
    }

    fn cost(&self, cell: &Cell) -> f64 {
        let image = match cell.cached_objective() {
            Some(image) if !image.is_empty() => image,
            _ => return f64::NEG_INFINITY,
        };
        let pu = cell.cached_feasibility().unwrap_or(1.0);
        let (lb, diam) = (image.lb(), image.diam());
        if self.criterion.depends_on_loup() && !self.loup.is_finite() {
            return lb;
        }
        match self.criterion {
            CellCriterion::LowerBound => lb,
            CellCriterion::UpperBound => image.ub(),
            CellCriterion::LoupGap => -self.weighted_gap(lb, diam, 1.0),
            CellCriterion::FeasibleLoupGap => -self.weighted_gap(lb, diam, pu),
            CellCriterion::LowerBoundOverGap => {
                let gap = self.weighted_gap(lb, diam, pu);
                if gap > 0.0 {
                    lb / gap
                } else {
                    f64::INFINITY
                }
            }
            CellCriterion::Feasibility => -pu,
        }
    }

    #[inline]
    fn tie_break(&self, cell: &Cell) -> f64 {
        ObjectiveLowerBound.cost(cell)
    }

    #[inline(always)]
    fn depends_on_loup(&self) -> bool {
        self.criterion.depends_on_loup()
    }

    #[inline]
    fn set_loup(&mut self, loup: f64) {
        self.loup = loup;
    }

    #[inline(always)]
    fn needs_feasibility(&self) -> bool {
        self.criterion.needs_feasibility()
    }
}

/// A cell with its precomputed keys.
#[derive(Debug)]
struct Entry {
    cost: f64,
    tie: f64,
    seq: u64,
    cell: Cell,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    // Reversed: `BinaryHeap` is a max-heap.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.tie.total_cmp(&self.tie))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// A binary min-heap of cells under the cost function `C`.
pub struct CellHeap<C>
where
    C: CellCost,
{
    criterion: C,
    entries: BinaryHeap<Entry>,
    next_seq: u64,
    capacity: Option<usize>,
}

/// The heap used by the optimizer: best objective lower bound first.
pub type OptimizationHeap = CellHeap<ObjectiveLowerBound>;

impl<C> Default for CellHeap<C>
where
    C: CellCost + Default,
{
    fn default() -> Self {
        Self::new(C::default())
    }
}

impl<C> CellHeap<C>
where
    C: CellCost,
{
    #[inline]
    pub fn new(criterion: C) -> Self {
        Self {
            criterion,
            entries: BinaryHeap::new(),
            next_seq: 0,
            capacity: None,
        }
    }

    /// Creates a heap that refuses cells beyond `capacity`.
    #[inline]
    pub fn with_capacity(criterion: C, capacity: usize) -> Self {
        Self {
            criterion,
            entries: BinaryHeap::with_capacity(capacity),
            next_seq: 0,
            capacity: Some(capacity),
        }
    }

    #[inline]
    pub fn criterion(&self) -> &C {
        &self.criterion
    }

    #[inline]
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Returns the cost stored for the top cell.
    #[inline]
    pub fn top_cost(&self) -> Option<f64> {
        self.entries.peek().map(|e| e.cost)
    }

    /// Pops the top cell together with its stored cost.
    #[inline]
    pub fn pop_with_cost(&mut self) -> Result<(f64, Cell), CellBufferError> {
        self.entries
            .pop()
            .map(|e| (e.cost, e.cell))
            .ok_or(CellBufferError::Underflow)
    }

    /// Drops every cell with `cost >= bound` and returns how many were
    /// dropped. The remaining cells keep heap order.
    pub fn contract_heap(&mut self, bound: f64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.cost < bound);
        before - self.entries.len()
    }

    /// Recomputes every stored cost, keeping insertion order for ties.
    fn rekey(&mut self) {
        let criterion = &self.criterion;
        let entries = std::mem::take(&mut self.entries).into_vec();
        self.entries = entries
            .into_iter()
            .map(|e| Entry {
                cost: criterion.cost(&e.cell),
                tie: criterion.tie_break(&e.cell),
                ..e
            })
            .collect();
    }
}

impl<C> CellBuffer for CellHeap<C>
where
    C: CellCost,
{
    fn name(&self) -> &str {
        "CellHeap"
    }

    fn push(&mut self, cell: Cell) -> Result<(), CellBufferError> {
        if let Some(capacity) = self.capacity
            && self.entries.len() >= capacity
        {
            return Err(CellBufferError::Overflow { capacity });
        }
        let entry = Entry {
            cost: self.criterion.cost(&cell),
            tie: self.criterion.tie_break(&cell),
            seq: self.next_seq,
            cell,
        };
        self.next_seq = self.next_seq.wrapping_add(1);
        self.entries.push(entry);
        Ok(())
    }

    #[inline]
    fn pop(&mut self) -> Result<Cell, CellBufferError> {
        self.pop_with_cost().map(|(_, cell)| cell)
    }

    #[inline]
    fn top(&self) -> Result<&Cell, CellBufferError> {
        self.entries
            .peek()
            .map(|e| &e.cell)
            .ok_or(CellBufferError::Underflow)
    }

    #[inline]
    fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    fn flush(&mut self) {
        self.entries.clear();
        self.next_seq = 0;
    }

    #[inline]
    fn contract(&mut self, bound: f64) -> usize {
        self.contract_heap(bound)
    }

    #[inline]
    fn minimum(&self) -> Option<f64> {
        self.top_cost()
    }

    fn set_loup(&mut self, loup: f64) {
        self.criterion.set_loup(loup);
        if self.criterion.depends_on_loup() {
            self.rekey();
        }
    }

    #[inline(always)]
    fn needs_feasibility(&self) -> bool {
        self.criterion.needs_feasibility()
    }
}

impl<C> std::fmt::Debug for CellHeap<C>
where
    C: CellCost,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CellHeap")
            .field("criterion", &self.criterion.name())
            .field("len", &self.entries.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl<C> std::fmt::Display for CellHeap<C>
where
    C: CellCost,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "CellHeap(criterion: {}, {} cells)",
            self.criterion.name(),
            self.entries.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use enclose_core::math::{interval::Interval, interval_box::IntervalBox};
    use enclose_model::{
        function::AffineFunction,
        system::{CmpOp, SystemBuilder},
    };
    use rand::{Rng, SeedableRng, rngs::StdRng};

    /// A cell whose box is `[cost, cost + 1]`, used with a cost closure.
    fn cell(cost: f64) -> Cell {
        Cell::root(IntervalBox::from_bounds(&[(cost, cost + 1.0)]))
    }

    fn lower_bound(cell: &Cell) -> f64 {
        cell.domain()[0].lb()
    }

    fn drain<C: CellCost>(heap: &mut CellHeap<C>) -> Vec<f64> {
        std::iter::from_fn(|| heap.pop().ok())
            .map(|c| lower_bound(&c))
            .collect()
    }

    #[test]
    fn test_pops_in_cost_order() {
        let mut heap = CellHeap::new(lower_bound);
        for cost in [5.0, 3.0, 8.0, 1.0] {
            heap.push(cell(cost)).unwrap();
        }
        assert_eq!(heap.len(), 4);
        assert_eq!(heap.minimum(), Some(1.0));
        assert_eq!(lower_bound(heap.top().unwrap()), 1.0);
        assert_eq!(drain(&mut heap), vec![1.0, 3.0, 5.0, 8.0]);
        assert_eq!(heap.pop().unwrap_err(), CellBufferError::Underflow);
        assert_eq!(heap.top().unwrap_err(), CellBufferError::Underflow);
    }

    #[test]
    fn test_random_costs_pop_sorted() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut heap = CellHeap::new(lower_bound);
        let mut costs: Vec<f64> = (0..200).map(|_| rng.gen_range(-50.0..50.0)).collect();
        for &c in &costs {
            heap.push(cell(c)).unwrap();
        }
        costs.sort_by(f64::total_cmp);
        assert_eq!(drain(&mut heap), costs);
    }

    #[test]
    fn test_contract_heap_evicts_exactly_dominated_cells() {
        let mut heap = CellHeap::new(lower_bound);
        for cost in [5.0, 3.0, 8.0, 1.0, 4.0, 4.0, 7.0] {
            heap.push(cell(cost)).unwrap();
        }
        // Cells of cost exactly 4 are dominated too.
        let evicted = heap.contract_heap(4.0);
        assert_eq!(evicted, 5);
        assert_eq!(heap.len(), 2);
        assert_eq!(drain(&mut heap), vec![1.0, 3.0]);
    }

    #[test]
    fn test_heap_order_survives_eviction() {
        let mut heap = CellHeap::new(lower_bound);
        for cost in [9.0, 2.0, 6.0, 0.5, 7.5, 3.0] {
            heap.push(cell(cost)).unwrap();
        }
        assert_eq!(heap.contract(6.0), 3);
        heap.push(cell(1.0)).unwrap();
        assert_eq!(drain(&mut heap), vec![0.5, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_ties_break_by_insertion_order() {
        let mut heap = CellHeap::new(|_: &Cell| 0.0);
        for lb in [3.0, 1.0, 2.0] {
            heap.push(cell(lb)).unwrap();
        }
        assert_eq!(drain(&mut heap), vec![3.0, 1.0, 2.0]);
    }

    #[test]
    fn test_overflow() {
        let mut heap = CellHeap::with_capacity(lower_bound, 1);
        heap.push(cell(0.0)).unwrap();
        assert_eq!(
            heap.push(cell(1.0)),
            Err(CellBufferError::Overflow { capacity: 1 })
        );
        assert_eq!(heap.len(), 1);
        heap.flush();
        assert!(heap.is_empty());
        heap.push(cell(1.0)).unwrap();
    }

    #[test]
    fn test_optimization_heap_orders_by_objective_lower_bound() {
        // f(x) = -x
        let mut builder = SystemBuilder::new(1);
        builder
            .set_objective(AffineFunction::new(vec![-1.0], 0.0))
            .unwrap();
        let system = builder.build();

        let mut heap = OptimizationHeap::default();
        assert_eq!(heap.criterion().name(), "LB");
        for lb in [0.0, 5.0, 2.0] {
            let mut c = cell(lb);
            c.objective(&system);
            heap.push(c).unwrap();
        }
        // The cell [5, 6] has the smallest objective lower bound -6.
        assert_eq!(heap.minimum(), Some(-6.0));
        assert_eq!(drain(&mut heap), vec![5.0, 2.0, 0.0]);
    }

    #[test]
    fn test_lower_bound_ties_break_by_upper_bound() {
        // f(x, y) = x + y
        let mut builder = SystemBuilder::new(2);
        builder
            .set_objective(AffineFunction::new(vec![1.0, 1.0], 0.0))
            .unwrap();
        let system = builder.build();

        let mut heap = OptimizationHeap::default();
        let mut wide = Cell::root(IntervalBox::from_bounds(&[(0.0, 4.0), (0.0, 1.0)]));
        let mut narrow = Cell::root(IntervalBox::from_bounds(&[(0.0, 1.0), (0.0, 1.0)]));
        wide.objective(&system);
        narrow.objective(&system);
        heap.push(wide).unwrap();
        heap.push(narrow).unwrap();
        assert_eq!(heap.pop().unwrap().domain()[0].ub(), 1.0);
    }

    #[test]
    fn test_incumbent_criteria_costs() {
        // min x s.t. x - 1 <= 0
        let mut builder = SystemBuilder::new(1);
        builder
            .set_objective(AffineFunction::variable(1, 0))
            .unwrap()
            .add_constraint(AffineFunction::new(vec![1.0], -1.0), CmpOp::Leq)
            .unwrap();
        let system = builder.build();

        // pf = [0, 4], pu = 1/4.
        let mut c = cell(0.0);
        c.domain_mut()[0] = Interval::new(0.0, 4.0);
        c.objective(&system);
        c.feasibility(&system, 1e-8);

        let cost = |criterion: CellCriterion, loup: f64| {
            let mut cost = OptimCost::new(criterion);
            cost.set_loup(loup);
            cost.cost(&c)
        };
        assert_eq!(cost(CellCriterion::LowerBound, 2.0), 0.0);
        assert_eq!(cost(CellCriterion::UpperBound, 2.0), 4.0);
        assert_eq!(cost(CellCriterion::LoupGap, 2.0), -0.5);
        assert_eq!(cost(CellCriterion::FeasibleLoupGap, 2.0), -0.125);
        assert_eq!(cost(CellCriterion::LowerBoundOverGap, 2.0), 0.0);
        assert_eq!(cost(CellCriterion::Feasibility, 2.0), -0.25);
        // No incumbent yet.
        assert_eq!(cost(CellCriterion::LoupGap, f64::INFINITY), 0.0);
        assert_eq!(cost(CellCriterion::LowerBoundOverGap, f64::INFINITY), 0.0);

        // pf = [1, 3], the constraint image [0, 2] only touches the feasible
        // set, so pu = 0 and the cell goes last under C7.
        let mut touching = cell(1.0);
        touching.domain_mut()[0] = Interval::new(1.0, 3.0);
        touching.objective(&system);
        assert_eq!(touching.feasibility(&system, 1e-8), 0.0);
        let mut c7 = OptimCost::new(CellCriterion::LowerBoundOverGap);
        c7.set_loup(2.0);
        assert_eq!(c7.cost(&touching), f64::INFINITY);

        assert!(CellCriterion::FeasibleLoupGap.needs_feasibility());
        assert!(!CellCriterion::LoupGap.needs_feasibility());
        assert!(CellCriterion::LowerBoundOverGap.depends_on_loup());
        assert!(!CellCriterion::Feasibility.depends_on_loup());
        assert_eq!(CellCriterion::LowerBoundOverGap.to_string(), "C7");
    }

    #[test]
    fn test_set_loup_rekeys_incumbent_criteria() {
        // f(x) = x
        let mut builder = SystemBuilder::new(1);
        builder
            .set_objective(AffineFunction::variable(1, 0))
            .unwrap();
        let system = builder.build();

        let mut heap = CellHeap::new(OptimCost::new(CellCriterion::LoupGap));
        for (lb, ub) in [(2.0, 10.0), (0.0, 4.0), (1.0, 2.0)] {
            let mut c = Cell::root(IntervalBox::from_bounds(&[(lb, ub)]));
            c.objective(&system);
            heap.push(c).unwrap();
        }
        assert_eq!(lower_bound(heap.top().unwrap()), 0.0);
        heap.set_loup(3.0);
        assert_eq!(heap.minimum(), Some(-2.0));
        assert_eq!(drain(&mut heap), vec![1.0, 0.0, 2.0]);
    }
}

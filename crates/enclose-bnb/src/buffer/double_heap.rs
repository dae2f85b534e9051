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
//! Two cost orders over one set of cells
//!
//! `CellDoubleHeap<C1, C2>` keeps every open cell exactly once, in a slot
//! store, and indexes the store with two heaps of keys: one under `C1`, one
//! under `C2`. A pop takes the top of the second order with probability
//! `critpr / 100` and the top of the first order otherwise; the cell leaves
//! the store, and its key in the other heap becomes stale.
//!
//! Stale keys carry the sequence number of a cell that is gone. They are
//! discarded lazily whenever they reach the top of their heap, so both tops
//! always name live cells, and dropped in bulk when the heaps are rebuilt.
//!
//! `minimum` reports the smallest `C1` cost, which is the certified lower
//! bound when `C1` is the objective lower bound. `contract_heap(bound)` drops
//! every cell whose `C1` cost reaches `bound`.

use crate::{
    buffer::{
        CellBuffer, CellBufferError,
        heap::{CellCost, ObjectiveLowerBound, OptimCost},
    },
    cell::Cell,
};
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::{cmp::Ordering, collections::BinaryHeap};

/// Heaps are rebuilt once stale keys outnumber live cells by this factor.
const STALE_FACTOR: usize = 2;

/// A live cell of the store.
#[derive(Debug)]
struct Slot {
    seq: u64,
    cost: f64,
    cell: Cell,
}

/// The position of a cell in one of the two orders.
#[derive(Debug, Clone, Copy)]
struct Key {
    cost: f64,
    tie: f64,
    seq: u64,
    slot: usize,
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Key {}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Key {
    // Reversed: `BinaryHeap` is a max-heap.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.tie.total_cmp(&self.tie))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Which order the next pop uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    First,
    Second,
}

/// A cell buffer ordered by two criteria at once.
pub struct CellDoubleHeap<C1 = ObjectiveLowerBound, C2 = OptimCost>
where
    C1: CellCost,
    C2: CellCost,
{
    first: C1,
    second: C2,
    slots: Vec<Option<Slot>>,
    free: Vec<usize>,
    first_keys: BinaryHeap<Key>,
    second_keys: BinaryHeap<Key>,
    len: usize,
    next_seq: u64,
    capacity: Option<usize>,
    critpr: u8,
    seed: u64,
    rng: StdRng,
    next_side: Side,
}

impl<C1, C2> CellDoubleHeap<C1, C2>
where
    C1: CellCost,
    C2: CellCost,
{
    /// Creates a double heap that pops from the `second` order with
    /// probability `critpr / 100`.
    ///
    /// # Panics
    ///
    /// Panics if `critpr` exceeds 100.
    pub fn new(first: C1, second: C2, critpr: u8, seed: u64) -> Self {
        assert!(
            critpr <= 100,
            "called `CellDoubleHeap::new` with critpr {critpr}, expected at most 100"
        );
        let mut heap = Self {
            first,
            second,
            slots: Vec::new(),
            free: Vec::new(),
            first_keys: BinaryHeap::new(),
            second_keys: BinaryHeap::new(),
            len: 0,
            next_seq: 0,
            capacity: None,
            critpr,
            seed,
            rng: StdRng::seed_from_u64(seed),
            next_side: Side::First,
        };
        heap.draw_side();
        heap
    }

    /// Creates a double heap that refuses cells beyond `capacity`.
    pub fn with_capacity(first: C1, second: C2, critpr: u8, seed: u64, capacity: usize) -> Self {
        let mut heap = Self::new(first, second, critpr, seed);
        heap.slots.reserve(capacity);
        heap.capacity = Some(capacity);
        heap
    }

    #[inline(always)]
    pub fn first_criterion(&self) -> &C1 {
        &self.first
    }

    #[inline(always)]
    pub fn second_criterion(&self) -> &C2 {
        &self.second
    }

    /// Returns the probability, in percent, of popping from the second order.
    #[inline(always)]
    pub fn critpr(&self) -> u8 {
        self.critpr
    }

    #[inline(always)]
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Returns `true` if the next `pop` uses the second order.
    #[inline]
    pub fn next_from_second(&self) -> bool {
        self.next_side == Side::Second
    }

    /// Pops the next cell together with its cost under the first criterion.
    pub fn pop_with_cost(&mut self) -> Result<(f64, Cell), CellBufferError> {
        let slot = loop {
            let key = match self.next_side {
                Side::First => self.first_keys.pop(),
                Side::Second => self.second_keys.pop(),
            }
            .ok_or(CellBufferError::Underflow)?;
            if Self::is_live(&self.slots, &key)
                && let Some(slot) = self.slots[key.slot].take()
            {
                self.free.push(key.slot);
                break slot;
            }
        };
        self.len -= 1;
        self.discard_stale_tops();
        let stale = (self.first_keys.len() + self.second_keys.len()).saturating_sub(2 * self.len);
        if stale > STALE_FACTOR * self.len + 16 {
            self.rebuild();
        }
        self.draw_side();
        Ok((slot.cost, slot.cell))
    }

    /// Drops every cell whose first cost is at least `bound` and returns how
    /// many were dropped.
    pub fn contract_heap(&mut self, bound: f64) -> usize {
        let mut evicted = 0;
        for (index, entry) in self.slots.iter_mut().enumerate() {
            if entry.as_ref().is_some_and(|s| s.cost >= bound) {
                *entry = None;
                self.free.push(index);
                evicted += 1;
            }
        }
        if evicted > 0 {
            self.len -= evicted;
            self.rebuild();
        }
        evicted
    }

    fn draw_side(&mut self) {
        self.next_side = match self.critpr {
            0 => Side::First,
            100 => Side::Second,
            p if self.rng.gen_range(0..100u8) < p => Side::Second,
            _ => Side::First,
        };
    }

    #[inline]
    fn is_live(slots: &[Option<Slot>], key: &Key) -> bool {
        matches!(slots.get(key.slot), Some(Some(s)) if s.seq == key.seq)
    }

    fn discard_stale_tops(&mut self) {
        while let Some(key) = self.first_keys.peek()
            && !Self::is_live(&self.slots, key)
        {
            self.first_keys.pop();
        }
        while let Some(key) = self.second_keys.peek()
            && !Self::is_live(&self.slots, key)
        {
            self.second_keys.pop();
        }
    }

    /// Recomputes both orders from the live cells.
    fn rebuild(&mut self) {
        let mut first_keys = Vec::with_capacity(self.len);
        let mut second_keys = Vec::with_capacity(self.len);
        for (index, entry) in self.slots.iter_mut().enumerate() {
            let Some(slot) = entry else { continue };
            slot.cost = self.first.cost(&slot.cell);
            first_keys.push(Key {
                cost: slot.cost,
                tie: self.first.tie_break(&slot.cell),
                seq: slot.seq,
                slot: index,
            });
            second_keys.push(Key {
                cost: self.second.cost(&slot.cell),
                tie: self.second.tie_break(&slot.cell),
                seq: slot.seq,
                slot: index,
            });
        }
        self.first_keys = BinaryHeap::from(first_keys);
        self.second_keys = BinaryHeap::from(second_keys);
    }
}

impl<C1, C2> CellBuffer for CellDoubleHeap<C1, C2>
where
    C1: CellCost,
    C2: CellCost,
{
    fn name(&self) -> &str {
        "CellDoubleHeap"
    }

    fn push(&mut self, cell: Cell) -> Result<(), CellBufferError> {
        if let Some(capacity) = self.capacity
            && self.len >= capacity
        {
            return Err(CellBufferError::Overflow { capacity });
        }
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        let cost = self.first.cost(&cell);
        let first = Key {
            cost,
            tie: self.first.tie_break(&cell),
            seq,
            slot: 0,
        };
        let second = Key {
            cost: self.second.cost(&cell),
            tie: self.second.tie_break(&cell),
            seq,
            slot: 0,
        };
        let slot = Slot { seq, cost, cell };
        let index = match self.free.pop() {
            Some(index) => {
                self.slots[index] = Some(slot);
                index
            }
            None => {
                self.slots.push(Some(slot));
                self.slots.len() - 1
            }
        };
        self.first_keys.push(Key { slot: index, ..first });
        self.second_keys.push(Key {
            slot: index,
            ..second
        });
        self.len += 1;
        Ok(())
    }

    #[inline]
    fn pop(&mut self) -> Result<Cell, CellBufferError> {
        self.pop_with_cost().map(|(_, cell)| cell)
    }

    fn top(&self) -> Result<&Cell, CellBufferError> {
        let key = match self.next_side {
            Side::First => self.first_keys.peek(),
            Side::Second => self.second_keys.peek(),
        };
        key.and_then(|k| self.slots.get(k.slot))
            .and_then(Option::as_ref)
            .map(|s| &s.cell)
            .ok_or(CellBufferError::Underflow)
    }

    #[inline(always)]
    fn len(&self) -> usize {
        self.len
    }

    fn flush(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.first_keys.clear();
        self.second_keys.clear();
        self.len = 0;
        self.next_seq = 0;
        self.rng = StdRng::seed_from_u64(self.seed);
        self.draw_side();
    }

    #[inline]
    fn contract(&mut self, bound: f64) -> usize {
        self.contract_heap(bound)
    }

    #[inline]
    fn minimum(&self) -> Option<f64> {
        self.first_keys.peek().map(|k| k.cost)
    }

    fn set_loup(&mut self, loup: f64) {
        self.first.set_loup(loup);
        self.second.set_loup(loup);
        if self.first.depends_on_loup() || self.second.depends_on_loup() {
            self.rebuild();
        }
    }

    #[inline]
    fn needs_feasibility(&self) -> bool {
        self.first.needs_feasibility() || self.second.needs_feasibility()
    }
}

impl<C1, C2> std::fmt::Debug for CellDoubleHeap<C1, C2>
where
    C1: CellCost,
    C2: CellCost,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CellDoubleHeap")
            .field("first", &self.first.name())
            .field("second", &self.second.name())
            .field("critpr", &self.critpr)
            .field("len", &self.len)
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl<C1, C2> std::fmt::Display for CellDoubleHeap<C1, C2>
where
    C1: CellCost,
    C2: CellCost,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "CellDoubleHeap(criteria: {}/{}, critpr: {}, {} cells)",
            self.first.name(),
            self.second.name(),
            self.critpr,
            self.len
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::heap::CellCriterion;
    use enclose_core::math::interval_box::IntervalBox;
    use enclose_model::{function::AffineFunction, system::SystemBuilder};

    fn cell(lb: f64) -> Cell {
        Cell::root(IntervalBox::from_bounds(&[(lb, lb + 1.0)]))
    }

    fn lower_bound(cell: &Cell) -> f64 {
        cell.domain()[0].lb()
    }

    fn upper_first(cell: &Cell) -> f64 {
        -cell.domain()[0].lb()
    }

    type TestHeap = CellDoubleHeap<fn(&Cell) -> f64, fn(&Cell) -> f64>;

    fn heap(critpr: u8, seed: u64) -> TestHeap {
        CellDoubleHeap::new(lower_bound as fn(&Cell) -> f64, upper_first as fn(&Cell) -> f64, critpr, seed)
    }

    fn drain(heap: &mut TestHeap) -> Vec<f64> {
        std::iter::from_fn(|| heap.pop().ok())
            .map(|c| lower_bound(&c))
            .collect()
    }

    #[test]
    fn test_critpr_extremes_follow_a_single_order() {
        let mut first = heap(0, 3);
        let mut second = heap(100, 3);
        for lb in [5.0, 3.0, 8.0, 1.0, 4.0] {
            first.push(cell(lb)).unwrap();
            second.push(cell(lb)).unwrap();
        }
        assert!(!first.next_from_second());
        assert!(second.next_from_second());
        assert_eq!(drain(&mut first), vec![1.0, 3.0, 4.0, 5.0, 8.0]);
        assert_eq!(drain(&mut second), vec![8.0, 5.0, 4.0, 3.0, 1.0]);
        assert_eq!(first.pop().unwrap_err(), CellBufferError::Underflow);
        assert_eq!(second.top().unwrap_err(), CellBufferError::Underflow);
    }

    #[test]
    fn test_mixed_pops_take_each_cell_once_from_the_announced_order() {
        let mut heap = heap(50, 17);
        let mut open: Vec<f64> = (0..200).map(|i| ((i * 37) % 200) as f64).collect();
        for &lb in &open {
            heap.push(cell(lb)).unwrap();
        }
        let (mut from_first, mut from_second) = (0, 0);
        while !heap.is_empty() {
            let expected = if heap.next_from_second() {
                from_second += 1;
                open.iter().copied().fold(f64::NEG_INFINITY, f64::max)
            } else {
                from_first += 1;
                open.iter().copied().fold(f64::INFINITY, f64::min)
            };
            assert_eq!(heap.minimum(), open.iter().copied().reduce(f64::min));
            assert_eq!(lower_bound(heap.top().unwrap()), expected);
            let (cost, popped) = heap.pop_with_cost().unwrap();
            assert_eq!(lower_bound(&popped), expected);
            assert_eq!(cost, expected);
            open.retain(|&lb| lb != expected);
            assert_eq!(heap.len(), open.len());
        }
        assert!(from_first > 50 && from_second > 50);
        assert!(heap.first_keys.len() + heap.second_keys.len() <= 16);
    }

    #[test]
    fn test_contract_heap_evicts_from_both_orders() {
        let mut heap = heap(100, 0);
        for lb in [5.0, 3.0, 8.0, 1.0, 4.0, 7.0] {
            heap.push(cell(lb)).unwrap();
        }
        assert_eq!(heap.contract_heap(4.0), 4);
        assert_eq!(heap.len(), 2);
        assert_eq!(heap.minimum(), Some(1.0));
        assert_eq!(lower_bound(heap.top().unwrap()), 3.0);

        // Freed slots are reused without resurrecting evicted cells.
        heap.push(cell(2.0)).unwrap();
        assert_eq!(drain(&mut heap), vec![3.0, 2.0, 1.0]);
    }

    #[test]
    fn test_flush_replays_the_same_choices() {
        let mut heap = heap(30, 5);
        let fill = |heap: &mut TestHeap| {
            for lb in 0..40 {
                heap.push(cell(lb as f64)).unwrap();
            }
        };
        fill(&mut heap);
        let once = drain(&mut heap);
        fill(&mut heap);
        heap.pop().unwrap();
        heap.flush();
        assert!(heap.is_empty());
        assert_eq!(heap.minimum(), None);
        fill(&mut heap);
        assert_eq!(drain(&mut heap), once);
    }

    #[test]
    fn test_overflow() {
        let mut heap = TestHeap::with_capacity(lower_bound, upper_first, 50, 0, 2);
        heap.push(cell(0.0)).unwrap();
        heap.push(cell(1.0)).unwrap();
        assert_eq!(
            heap.push(cell(2.0)),
            Err(CellBufferError::Overflow { capacity: 2 })
        );
        heap.pop().unwrap();
        heap.push(cell(2.0)).unwrap();
        assert_eq!(heap.len(), 2);
    }

    #[test]
    fn test_new_incumbent_reorders_the_second_heap() {
        // f(x) = x
        let mut builder = SystemBuilder::new(1);
        builder
            .set_objective(AffineFunction::variable(1, 0))
            .unwrap();
        let system = builder.build();

        let mut heap = CellDoubleHeap::new(
            ObjectiveLowerBound,
            OptimCost::new(CellCriterion::LoupGap),
            100,
            0,
        );
        assert!(!heap.needs_feasibility());
        for (lb, ub) in [(2.0, 10.0), (0.0, 4.0), (1.0, 2.0)] {
            let mut c = Cell::root(IntervalBox::from_bounds(&[(lb, ub)]));
            c.objective(&system);
            heap.push(c).unwrap();
        }
        // Without an incumbent the gap criterion orders by lower bound.
        assert_eq!(lower_bound(heap.top().unwrap()), 0.0);

        // Gaps below 3: 1/8, 3/4 and 2/1 of the image.
        heap.set_loup(3.0);
        assert_eq!(heap.second_criterion().loup(), 3.0);
        assert_eq!(drain_domains(&mut heap), vec![1.0, 0.0, 2.0]);
    }

    fn drain_domains<C1: CellCost, C2: CellCost>(heap: &mut CellDoubleHeap<C1, C2>) -> Vec<f64> {
        std::iter::from_fn(|| heap.pop().ok())
            .map(|c| lower_bound(&c))
            .collect()
    }
}

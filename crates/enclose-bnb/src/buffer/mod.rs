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

//! Scheduling containers for open cells
//!
//! A `CellBuffer` owns the cells that still have to be explored. `push`
//! moves a cell in, `pop` moves the next one out. The variant decides what
//! "next" means:
//! - `stack`: last in, first out (depth-first).
//! - `heap`: smallest cost first, with bulk eviction of cells whose cost can
//!   no longer beat an incumbent (best-first).
//! - `double_heap`: two cost orders over one set of cells, popping from the
//!   second one with a fixed probability.
//!
//! Releasing a cell is dropping it; `flush` drops everything at once.

pub mod double_heap;
pub mod heap;
pub mod stack;

use crate::cell::Cell;

/// Errors raised by cell buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CellBufferError {
    /// `pop` or `top` on an empty buffer.
    #[error("the cell buffer is empty")]
    Underflow,
    /// `push` on a buffer that reached its configured capacity. The cell
    /// was dropped.
    #[error("the cell buffer reached its capacity of {capacity} cells")]
    Overflow { capacity: usize },
}

/// A container of open cells.
pub trait CellBuffer {
    /// Returns the name of the buffer.
    fn name(&self) -> &str;

    /// Moves `cell` into the buffer.
    fn push(&mut self, cell: Cell) -> Result<(), CellBufferError>;

    /// Moves the next cell out of the buffer.
    fn pop(&mut self) -> Result<Cell, CellBufferError>;

    /// Returns the cell `pop` would return, without removing it.
    fn top(&self) -> Result<&Cell, CellBufferError>;

    fn len(&self) -> usize;

    #[inline]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every cell.
    fn flush(&mut self);

    /// Drops every cell whose cost is not below `bound` and returns how many
    /// were dropped. Buffers without a cost keep everything.
    #[inline]
    fn contract(&mut self, _bound: f64) -> usize {
        0
    }

    /// Returns the smallest cost in the buffer, if the buffer orders by cost.
    #[inline]
    fn minimum(&self) -> Option<f64> {
        None
    }

    /// Informs the buffer of a new incumbent value. Buffers whose order reads
    /// the incumbent re-key their cells.
    #[inline]
    fn set_loup(&mut self, _loup: f64) {}

    /// Returns `true` if pushed cells should carry their feasibility ratio.
    #[inline(always)]
    fn needs_feasibility(&self) -> bool {
        false
    }
}

impl std::fmt::Debug for dyn CellBuffer + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CellBuffer({}, {} cells)", self.name(), self.len())
    }
}

impl std::fmt::Display for dyn CellBuffer + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CellBuffer({}, {} cells)", self.name(), self.len())
    }
}

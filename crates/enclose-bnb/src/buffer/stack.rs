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
    buffer::{CellBuffer, CellBufferError},
    cell::Cell,
};

/// A LIFO buffer: the most recently pushed cell is explored first.
#[derive(Debug, Clone, Default)]
pub struct CellStack {
    cells: Vec<Cell>,
    capacity: Option<usize>,
}

impl CellStack {
    #[inline]
    pub fn new() -> Self {
        Self {
            cells: Vec::new(),
            capacity: None,
        }
    }

    /// Creates a stack that refuses cells beyond `capacity`.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cells: Vec::with_capacity(capacity),
            capacity: Some(capacity),
        }
    }

    #[inline(always)]
    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Returns an iterator over the cells, bottom first.
    #[inline(always)]
    pub fn iter(&self) -> std::slice::Iter<'_, Cell> {
        self.cells.iter()
    }
}

impl CellBuffer for CellStack {
    fn name(&self) -> &str {
        "CellStack"
    }

    fn push(&mut self, cell: Cell) -> Result<(), CellBufferError> {
        if let Some(capacity) = self.capacity
            && self.cells.len() >= capacity
        {
            return Err(CellBufferError::Overflow { capacity });
        }
        self.cells.push(cell);
        Ok(())
    }

    #[inline(always)]
    fn pop(&mut self) -> Result<Cell, CellBufferError> {
        self.cells.pop().ok_or(CellBufferError::Underflow)
    }

    #[inline(always)]
    fn top(&self) -> Result<&Cell, CellBufferError> {
        self.cells.last().ok_or(CellBufferError::Underflow)
    }

    #[inline(always)]
    fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline(always)]
    fn flush(&mut self) {
        self.cells.clear();
    }
}

impl std::fmt::Display for CellStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CellStack({} cells)", self.cells.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use enclose_core::math::interval_box::IntervalBox;

    fn cell(lb: f64) -> Cell {
        Cell::root(IntervalBox::from_bounds(&[(lb, lb + 1.0)]))
    }

    #[test]
    fn test_lifo_order() {
        let mut stack = CellStack::new();
        for lb in [1.0, 2.0, 3.0] {
            stack.push(cell(lb)).unwrap();
        }
        assert_eq!(stack.len(), 3);
        assert_eq!(stack.top().unwrap().domain()[0].lb(), 3.0);
        let order: Vec<f64> = std::iter::from_fn(|| stack.pop().ok())
            .map(|c| c.domain()[0].lb())
            .collect();
        assert_eq!(order, vec![3.0, 2.0, 1.0]);
        assert!(stack.is_empty());
    }

    #[test]
    fn test_underflow() {
        let mut stack = CellStack::new();
        assert_eq!(stack.pop().unwrap_err(), CellBufferError::Underflow);
        assert_eq!(stack.top().unwrap_err(), CellBufferError::Underflow);
    }

    #[test]
    fn test_overflow_and_flush() {
        let mut stack = CellStack::with_capacity(2);
        stack.push(cell(0.0)).unwrap();
        stack.push(cell(1.0)).unwrap();
        assert_eq!(
            stack.push(cell(2.0)),
            Err(CellBufferError::Overflow { capacity: 2 })
        );
        assert_eq!(stack.contract(0.0), 0);
        assert_eq!(stack.minimum(), None);
        stack.flush();
        assert!(stack.is_empty());
    }
}

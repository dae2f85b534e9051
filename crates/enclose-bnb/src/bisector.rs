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

//! Variable selection for splitting cells.

use crate::cell::Cell;
use enclose_core::math::interval_box::IntervalBox;

/// Chooses the variable along which a cell is split.
pub trait Bisector {
    /// Returns the name of the bisector.
    fn name(&self) -> &str;

    /// Returns the variable to split, or `None` if no component is wider
    /// than `min_width`.
    fn choose_var(&mut self, bx: &IntervalBox, min_width: f64) -> Option<usize>;

    /// Split point as a fraction of the chosen component.
    #[inline]
    fn ratio(&self) -> f64 {
        0.5
    }

    /// Splits `cell` along `var`, consuming it.
    #[inline]
    fn bisect(&mut self, cell: Cell, var: usize) -> (Cell, Cell) {
        cell.bisect(var, self.ratio())
    }

    /// Resets internal state before a new search.
    #[inline]
    fn restart(&mut self) {}
}

impl std::fmt::Debug for dyn Bisector + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Bisector({})", self.name())
    }
}

/// Splits the widest component that still has a float strictly inside.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LargestFirst {
    ratio: f64,
}

impl Default for LargestFirst {
    fn default() -> Self {
        Self { ratio: 0.5 }
    }
}

impl LargestFirst {
    /// Creates a bisector splitting at `ratio` of the widest component.
    ///
    /// # Panics
    ///
    /// Panics if `ratio` is not in `(0, 1)`.
    pub fn new(ratio: f64) -> Self {
        assert!(
            ratio > 0.0 && ratio < 1.0,
            "called `LargestFirst::new` with ratio {ratio} outside (0, 1)"
        );
        Self { ratio }
    }
}

impl Bisector for LargestFirst {
    fn name(&self) -> &str {
        "LargestFirst"
    }

    fn choose_var(&mut self, bx: &IntervalBox, min_width: f64) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (var, iv) in bx.iter().enumerate() {
            let width = iv.diam();
            if width <= min_width || !iv.is_bisectable() {
                continue;
            }
            match best {
                Some((_, w)) if w >= width => {}
                _ => best = Some((var, width)),
            }
        }
        best.map(|(var, _)| var)
    }

    #[inline]
    fn ratio(&self) -> f64 {
        self.ratio
    }
}

/// Cycles through the variables, skipping components not wider than the
/// minimum width.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoundRobin {
    next: usize,
}

impl RoundRobin {
    #[inline]
    pub fn new() -> Self {
        Self { next: 0 }
    }
}

impl Bisector for RoundRobin {
    fn name(&self) -> &str {
        "RoundRobin"
    }

    fn choose_var(&mut self, bx: &IntervalBox, min_width: f64) -> Option<usize> {
        let n = bx.len();
        (0..n)
            .map(|k| (self.next + k) % n)
            .find(|&var| bx[var].diam() > min_width && bx[var].is_bisectable())
            .inspect(|&var| self.next = (var + 1) % n)
    }

    #[inline]
    fn restart(&mut self) {
        self.next = 0;
    }
}

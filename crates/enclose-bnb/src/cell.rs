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

//! Search nodes.
//!
//! A `Cell` owns its box outright. It is moved into a buffer on push and moved
//! back out on pop; bisection consumes the parent and returns two fresh
//! children, so a box is never reachable from two places at once.

use enclose_core::math::{interval::Interval, interval_box::IntervalBox};
use enclose_model::{
    eval_box::{CachedBox, Evaluable},
    system::System,
};

/// A node of the branch-and-bound tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    bx: CachedBox,
    depth: usize,
    feasibility: Option<f64>,
}

impl Cell {
    /// Creates the root cell of a search over `domain`.
    #[inline(always)]
    pub fn root(domain: IntervalBox) -> Self {
        Self::new(domain, 0)
    }

    #[inline]
    pub fn new(domain: IntervalBox, depth: usize) -> Self {
        Self {
            bx: CachedBox::new(domain),
            depth,
            feasibility: None,
        }
    }

    #[inline(always)]
    pub fn domain(&self) -> &IntervalBox {
        self.bx.domain()
    }

    /// Gives mutable access to the box. Cached images are dropped.
    #[inline]
    pub fn domain_mut(&mut self) -> &mut IntervalBox {
        self.feasibility = None;
        self.bx.domain_mut()
    }

    /// Returns the number of bisections between the root and this cell.
    #[inline(always)]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Returns the objective enclosure over the box, computing it on first use.
    #[inline(always)]
    pub fn objective(&mut self, system: &System) -> Interval {
        self.bx.objective_image(system)
    }

    /// Returns the objective enclosure if it is cached.
    #[inline(always)]
    pub fn cached_objective(&self) -> Option<Interval> {
        self.bx.cached_objective()
    }

    /// Returns the product over all constraints of the share of the
    /// constraint image that is feasible, computing it on first use.
    ///
    /// A constraint whose image is a single feasible value or unbounded
    /// counts 1, one whose image misses the feasible set counts 0. Equalities are relaxed
    /// to `|g| <= eps_eq`.
    pub fn feasibility(&mut self, system: &System, eps_eq: f64) -> f64 {
        if let Some(pu) = self.feasibility {
            return pu;
        }
        let mut pu = 1.0;
        for i in 0..system.nb_ctr() {
            let image = self.bx.constraint_image(system, i);
            let feasible = system.constraint(i).feasible_image(eps_eq);
            let overlap = image.intersect(&feasible);
            let share = if overlap.is_empty() {
                0.0
            } else if image.diam() > 0.0 && image.diam().is_finite() {
                (overlap.diam() / image.diam()).clamp(0.0, 1.0)
            } else {
                1.0
            };
            pu *= share;
        }
        self.feasibility = Some(pu);
        pu
    }

    /// Returns the feasibility ratio if it is cached.
    #[inline(always)]
    pub fn cached_feasibility(&self) -> Option<f64> {
        self.feasibility
    }

    /// Returns the evaluable box, for constraint checks that should share the
    /// cache of the cell.
    #[inline]
    pub fn evaluable_mut(&mut self) -> &mut CachedBox {
        self.feasibility = None;
        &mut self.bx
    }

    #[inline(always)]
    pub fn into_domain(self) -> IntervalBox {
        self.bx.into_domain()
    }

    /// Splits the cell along `var`, consuming it.
    ///
    /// # Panics
    ///
    /// Panics if component `var` cannot be split.
    pub fn bisect(self, var: usize, ratio: f64) -> (Cell, Cell) {
        let depth = self.depth + 1;
        let (left, right) = self.into_domain().bisect(var, ratio);
        (Cell::new(left, depth), Cell::new(right, depth))
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Cell(depth: {}, box: {})", self.depth, self.domain())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use enclose_model::{
        function::AffineFunction,
        system::{CmpOp, SystemBuilder},
    };

    #[test]
    fn test_bisect_increments_depth_and_covers_parent() {
        let cell = Cell::root(IntervalBox::from_bounds(&[(0.0, 4.0), (1.0, 2.0)]));
        let (left, right) = cell.bisect(0, 0.5);
        assert_eq!(left.depth(), 1);
        assert_eq!(right.depth(), 1);
        assert_eq!(left.domain()[0], Interval::new(0.0, 2.0));
        assert_eq!(right.domain()[0], Interval::new(2.0, 4.0));
        assert_eq!(left.domain()[1], right.domain()[1]);
    }

    #[test]
    fn test_objective_is_cached_until_mutation() {
        let mut builder = SystemBuilder::new(1);
        builder
            .set_objective(AffineFunction::new(vec![2.0], 1.0))
            .unwrap();
        let system = builder.build();

        let mut cell = Cell::root(IntervalBox::from_bounds(&[(0.0, 1.0)]));
        assert_eq!(cell.cached_objective(), None);
        assert_eq!(cell.objective(&system), Interval::new(1.0, 3.0));
        assert_eq!(cell.cached_objective(), Some(Interval::new(1.0, 3.0)));

        cell.domain_mut()[0] = Interval::new(0.0, 0.5);
        assert_eq!(cell.cached_objective(), None);
        assert_eq!(cell.objective(&system), Interval::new(1.0, 2.0));
    }

    #[test]
    fn test_feasibility_is_the_product_of_feasible_shares() {
        // x - 1 <= 0 and y >= 0 over [0, 4] x [-1, 3].
        let mut builder = SystemBuilder::new(2);
        builder
            .add_constraint(AffineFunction::new(vec![1.0, 0.0], -1.0), CmpOp::Leq)
            .unwrap()
            .add_constraint(AffineFunction::variable(2, 1), CmpOp::Geq)
            .unwrap();
        let system = builder.build();

        let mut cell = Cell::root(IntervalBox::from_bounds(&[(0.0, 4.0), (-1.0, 3.0)]));
        assert_eq!(cell.cached_feasibility(), None);
        assert_eq!(cell.feasibility(&system, 1e-8), 0.25 * 0.75);
        assert_eq!(cell.cached_feasibility(), Some(0.1875));

        // Entailed on both constraints.
        cell.domain_mut()[0] = Interval::new(0.0, 1.0);
        cell.domain_mut()[1] = Interval::new(0.0, 3.0);
        assert_eq!(cell.cached_feasibility(), None);
        assert_eq!(cell.feasibility(&system, 1e-8), 1.0);

        cell.domain_mut()[0] = Interval::new(2.0, 3.0);
        assert_eq!(cell.feasibility(&system, 1e-8), 0.0);
    }
}

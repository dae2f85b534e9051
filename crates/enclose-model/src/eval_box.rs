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

//! Boxes that can be evaluated against a `System`.
//!
//! The search evaluates the same box several times (cost for the heap,
//! objective cut, feasibility of the incumbent candidate). `CachedBox` keeps
//! every image it has computed until its domain is mutated; `PlainBox`
//! recomputes on every call and is meant for throw-away boxes such as sample
//! points.

use crate::system::System;
use enclose_core::math::{interval::Interval, interval_box::IntervalBox};

/// A box together with a way of evaluating the objective and constraints of
/// a `System` over it.
pub trait Evaluable {
    /// Returns the underlying box.
    fn domain(&self) -> &IntervalBox;

    /// Returns an enclosure of the objective over the domain.
    fn objective_image(&mut self, system: &System) -> Interval;

    /// Returns an enclosure of constraint `index` over the domain.
    fn constraint_image(&mut self, system: &System, index: usize) -> Interval;

    /// Returns `true` if every point of the domain satisfies every constraint
    /// (equalities relaxed to `|g| <= eps_eq`).
    fn is_certainly_feasible(&mut self, system: &System, eps_eq: f64) -> bool {
        (0..system.nb_ctr()).all(|i| {
            let image = self.constraint_image(system, i);
            system.constraint(i).is_certainly_satisfied(image, eps_eq)
        })
    }

    /// Returns `true` if some constraint is violated by every point of the
    /// domain.
    fn is_certainly_infeasible(&mut self, system: &System) -> bool {
        self.domain().is_empty()
            || (0..system.nb_ctr()).any(|i| {
                let image = self.constraint_image(system, i);
                system.constraint(i).is_certainly_violated(image)
            })
    }
}

/// A box without memory: every evaluation goes to the functions.
#[derive(Debug, Clone, PartialEq)]
pub struct PlainBox {
    domain: IntervalBox,
}

impl PlainBox {
    #[inline]
    pub fn new(domain: IntervalBox) -> Self {
        Self { domain }
    }

    /// Creates the degenerate box of a point.
    #[inline]
    pub fn point(point: &[f64]) -> Self {
        Self::new(IntervalBox::point(point))
    }

    #[inline]
    pub fn into_domain(self) -> IntervalBox {
        self.domain
    }
}

impl Evaluable for PlainBox {
    #[inline]
    fn domain(&self) -> &IntervalBox {
        &self.domain
    }

    fn objective_image(&mut self, system: &System) -> Interval {
        system.eval_objective(&self.domain)
    }

    fn constraint_image(&mut self, system: &System, index: usize) -> Interval {
        system.constraint(index).function().eval(&self.domain)
    }
}

/// A box that memoizes the images it computed.
///
/// The cache is dropped whenever the domain is accessed mutably, so it can
/// never describe another box than the current domain.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedBox {
    domain: IntervalBox,
    objective: Option<Interval>,
    constraints: Vec<Option<Interval>>,
}

impl CachedBox {
    #[inline]
    pub fn new(domain: IntervalBox) -> Self {
        Self {
            domain,
            objective: None,
            constraints: Vec::new(),
        }
    }

    /// Gives mutable access to the domain and invalidates every cached image.
    #[inline]
    pub fn domain_mut(&mut self) -> &mut IntervalBox {
        self.invalidate();
        &mut self.domain
    }

    /// Replaces the domain and invalidates every cached image.
    #[inline]
    pub fn set_domain(&mut self, domain: IntervalBox) {
        self.invalidate();
        self.domain = domain;
    }

    #[inline]
    pub fn into_domain(self) -> IntervalBox {
        self.domain
    }

    /// Returns the cached objective image, if it has been computed.
    #[inline]
    pub fn cached_objective(&self) -> Option<Interval> {
        self.objective
    }

    #[inline]
    fn invalidate(&mut self) {
        self.objective = None;
        self.constraints.clear();
    }
}

impl Evaluable for CachedBox {
    #[inline]
    fn domain(&self) -> &IntervalBox {
        &self.domain
    }

    fn objective_image(&mut self, system: &System) -> Interval {
        if let Some(image) = self.objective {
            return image;
        }
        let image = system.eval_objective(&self.domain);
        self.objective = Some(image);
        image
    }

    fn constraint_image(&mut self, system: &System, index: usize) -> Interval {
        if self.constraints.len() != system.nb_ctr() {
            self.constraints = vec![None; system.nb_ctr()];
        }
        if let Some(image) = self.constraints[index] {
            return image;
        }
        let image = system.constraint(index).function().eval(&self.domain);
        self.constraints[index] = Some(image);
        image
    }
}

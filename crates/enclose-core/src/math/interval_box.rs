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

use super::interval::Interval;
use std::ops::{BitAnd, BitOr, Index, IndexMut};

/// A Cartesian product of `n` intervals.
///
/// The dimension is fixed at construction. A box is empty as soon as one of
/// its components is empty; `set_empty` makes every component empty so that
/// empty boxes compare equal.
///
/// # Examples
///
/// ```rust
/// # use enclose_core::math::{interval::Interval, interval_box::IntervalBox};
///
/// let b = IntervalBox::from_bounds(&[(0.0, 2.0), (-1.0, 1.0)]);
/// assert_eq!(b.len(), 2);
/// assert_eq!(b.max_diam(), 2.0);
/// assert!(b.contains_point(&[1.0, 0.0]));
/// ```
#[derive(Clone, PartialEq)]
pub struct IntervalBox {
    components: Vec<Interval>,
}

impl IntervalBox {
    /// Creates a box from its components.
    #[inline(always)]
    pub fn new(components: Vec<Interval>) -> Self {
        Self { components }
    }

    /// Creates an `n`-dimensional box whose components are all `iv`.
    #[inline]
    pub fn filled(n: usize, iv: Interval) -> Self {
        Self {
            components: vec![iv; n],
        }
    }

    /// Creates the box `(-inf, +inf)^n`.
    #[inline(always)]
    pub fn entire(n: usize) -> Self {
        Self::filled(n, Interval::ENTIRE)
    }

    /// Creates the canonical empty box of dimension `n`.
    #[inline(always)]
    pub fn empty(n: usize) -> Self {
        Self::filled(n, Interval::EMPTY)
    }

    /// Creates a box from `(lb, ub)` pairs.
    ///
    /// # Panics
    ///
    /// Panics if a pair does not describe a valid interval.
    pub fn from_bounds(bounds: &[(f64, f64)]) -> Self {
        Self {
            components: bounds
                .iter()
                .map(|&(lb, ub)| Interval::new(lb, ub))
                .collect(),
        }
    }

    /// Creates the degenerate box containing only `point`.
    pub fn point(point: &[f64]) -> Self {
        Self {
            components: point.iter().map(|&x| Interval::point(x)).collect(),
        }
    }

    /// Returns the dimension.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Returns `true` if the box has no component (dimension zero).
    #[inline(always)]
    pub fn is_zero_dimensional(&self) -> bool {
        self.components.is_empty()
    }

    /// Returns `true` if any component is empty.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.components.iter().any(Interval::is_empty)
    }

    /// Makes every component empty.
    #[inline(always)]
    pub fn set_empty(&mut self) {
        self.components.fill(Interval::EMPTY);
    }

    #[inline(always)]
    pub fn as_slice(&self) -> &[Interval] {
        &self.components
    }

    #[inline(always)]
    pub fn iter(&self) -> std::slice::Iter<'_, Interval> {
        self.components.iter()
    }

    #[inline(always)]
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Interval> {
        self.components.iter_mut()
    }

    /// Returns the vector of lower bounds.
    pub fn lb(&self) -> Vec<f64> {
        self.components.iter().map(Interval::lb).collect()
    }

    /// Returns the vector of upper bounds.
    pub fn ub(&self) -> Vec<f64> {
        self.components.iter().map(Interval::ub).collect()
    }

    /// Returns the vector of representative points (see `Interval::mid`).
    ///
    /// # Panics
    ///
    /// Panics if the box is empty.
    pub fn mid(&self) -> Vec<f64> {
        self.components.iter().map(Interval::mid).collect()
    }

    /// Returns the vector of component widths.
    pub fn diam(&self) -> Vec<f64> {
        self.components.iter().map(Interval::diam).collect()
    }

    /// Returns the largest component width (`0` for a zero-dimensional box).
    pub fn max_diam(&self) -> f64 {
        self.components
            .iter()
            .map(Interval::diam)
            .fold(0.0, f64::max)
    }

    /// Returns the smallest component width (`+inf` for a zero-dimensional box).
    pub fn min_diam(&self) -> f64 {
        self.components
            .iter()
            .map(Interval::diam)
            .fold(f64::INFINITY, f64::min)
    }

    /// Returns the index of the widest component, or `None` for a
    /// zero-dimensional box. Ties resolve to the smallest index.
    pub fn widest_component(&self) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (i, iv) in self.components.iter().enumerate() {
            let d = iv.diam();
            match best {
                Some((_, bd)) if bd >= d => {}
                _ => best = Some((i, d)),
            }
        }
        best.map(|(i, _)| i)
    }

    /// Returns the product of all widths (an upper bound of the volume).
    pub fn volume(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        self.components.iter().map(Interval::diam).product()
    }

    /// Returns `true` if `point` (of matching dimension) lies in the box.
    pub fn contains_point(&self, point: &[f64]) -> bool {
        point.len() == self.len()
            && self
                .components
                .iter()
                .zip(point)
                .all(|(iv, &x)| iv.contains(x))
    }

    /// Returns `true` if `self ⊆ other`.
    pub fn is_subset(&self, other: &IntervalBox) -> bool {
        debug_assert_eq!(
            self.len(),
            other.len(),
            "called `IntervalBox::is_subset` with boxes of different dimensions"
        );
        self.is_empty()
            || self
                .components
                .iter()
                .zip(&other.components)
                .all(|(a, b)| a.is_subset(b))
    }

    /// Returns `true` if every component of `self` is in the interior of the
    /// matching component of `other`.
    pub fn is_interior_subset(&self, other: &IntervalBox) -> bool {
        self.components
            .iter()
            .zip(&other.components)
            .all(|(a, b)| a.is_interior_subset(b))
    }

    /// Returns `true` if both boxes share at least one point.
    pub fn intersects(&self, other: &IntervalBox) -> bool {
        self.components
            .iter()
            .zip(&other.components)
            .all(|(a, b)| a.intersects(b))
    }

    /// Intersects `self` with `other` in place. If the result is empty the box
    /// becomes the canonical empty box.
    pub fn intersect_with(&mut self, other: &IntervalBox) {
        debug_assert_eq!(
            self.len(),
            other.len(),
            "called `IntervalBox::intersect_with` with boxes of different dimensions"
        );
        for (a, b) in self.components.iter_mut().zip(&other.components) {
            *a = a.intersect(b);
        }
        if self.is_empty() {
            self.set_empty();
        }
    }

    /// Returns the hull of both boxes. An empty operand is neutral.
    pub fn hull(&self, other: &IntervalBox) -> IntervalBox {
        if self.is_empty() {
            return other.clone();
        }
        if other.is_empty() {
            return self.clone();
        }
        IntervalBox {
            components: self
                .components
                .iter()
                .zip(&other.components)
                .map(|(a, b)| a.hull(b))
                .collect(),
        }
    }

    /// Splits the box along `var` at the given ratio, consuming it.
    ///
    /// # Panics
    ///
    /// Panics if `var` is out of bounds or if component `var` cannot be split.
    pub fn bisect(self, var: usize, ratio: f64) -> (IntervalBox, IntervalBox) {
        let (left_iv, right_iv) = self.components[var].bisect(ratio);
        let mut left = self;
        let mut right = left.clone();
        left.components[var] = left_iv;
        right.components[var] = right_iv;
        (left, right)
    }

    /// Returns the largest relative width reduction of any component from
    /// `before` to `self` (see `Interval::rel_reduction`).
    pub fn max_rel_reduction(&self, before: &IntervalBox) -> f64 {
        self.components
            .iter()
            .zip(&before.components)
            .map(|(now, old)| now.rel_reduction(old))
            .fold(0.0, f64::max)
    }

    /// Returns an enclosure of `Σ coeffs[j] * self[j]`.
    pub fn dot(&self, coeffs: &[f64]) -> Interval {
        debug_assert_eq!(
            self.len(),
            coeffs.len(),
            "called `IntervalBox::dot` with {} coefficients for a box of dimension {}",
            coeffs.len(),
            self.len()
        );
        self.components
            .iter()
            .zip(coeffs)
            .filter(|(_, c)| **c != 0.0)
            .map(|(iv, &c)| *iv * c)
            .sum()
    }
}

impl Index<usize> for IntervalBox {
    type Output = Interval;

    #[inline(always)]
    fn index(&self, index: usize) -> &Interval {
        &self.components[index]
    }
}

impl IndexMut<usize> for IntervalBox {
    #[inline(always)]
    fn index_mut(&mut self, index: usize) -> &mut Interval {
        &mut self.components[index]
    }
}

impl BitAnd for &IntervalBox {
    type Output = IntervalBox;

    fn bitand(self, rhs: &IntervalBox) -> IntervalBox {
        let mut out = self.clone();
        out.intersect_with(rhs);
        out
    }
}

impl BitOr for &IntervalBox {
    type Output = IntervalBox;

    fn bitor(self, rhs: &IntervalBox) -> IntervalBox {
        self.hull(rhs)
    }
}

impl From<Vec<Interval>> for IntervalBox {
    fn from(components: Vec<Interval>) -> Self {
        Self::new(components)
    }
}

impl<'a> IntoIterator for &'a IntervalBox {
    type Item = &'a Interval;
    type IntoIter = std::slice::Iter<'a, Interval>;

    fn into_iter(self) -> Self::IntoIter {
        self.components.iter()
    }
}

impl std::fmt::Debug for IntervalBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(self, f)
    }
}

impl std::fmt::Display for IntervalBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(")?;
        for (i, iv) in self.components.iter().enumerate() {
            if i > 0 {
                write!(f, " ; ")?;
            }
            write!(f, "{iv}")?;
        }
        write!(f, ")")
    }
}

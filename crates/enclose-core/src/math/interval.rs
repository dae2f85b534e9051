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

use super::round::{
    add_dn, add_up, div_dn, div_up, mul_dn, mul_up, next_dn, next_up, sub_dn, sub_up,
};
use num_traits::{One, Zero};
use std::{
    iter::Sum,
    ops::{Add, AddAssign, BitAnd, BitOr, Div, Mul, Neg, Sub, SubAssign},
};

/// A closed interval `[lb, ub]` of extended reals.
///
/// Bounds may be infinite. The canonical empty interval is stored as
/// `[+inf, -inf]`, so every empty interval compares equal to `Interval::EMPTY`.
///
/// All arithmetic is outward rounded: the computed interval always contains
/// the exact real result for every choice of operands in the input intervals.
///
/// # Invariants
///
/// Either `lb <= ub` (with `lb != +inf` and `ub != -inf`) or the interval is
/// the canonical empty interval.
#[derive(Clone, Copy, PartialEq)]
pub struct Interval {
    lb: f64,
    ub: f64,
}

impl Interval {
    /// The canonical empty interval.
    pub const EMPTY: Interval = Interval {
        lb: f64::INFINITY,
        ub: f64::NEG_INFINITY,
    };

    /// The whole real line `(-inf, +inf)`.
    pub const ENTIRE: Interval = Interval {
        lb: f64::NEG_INFINITY,
        ub: f64::INFINITY,
    };

    /// Creates a new interval `[lb, ub]`.
    ///
    /// # Panics
    ///
    /// Panics if `lb > ub`, if either bound is `NaN`, or if the bounds describe
    /// an interval containing no real number (`[+inf, +inf]`).
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use enclose_core::math::interval::Interval;
    ///
    /// let iv = Interval::new(-1.0, 2.0);
    /// assert_eq!(iv.lb(), -1.0);
    /// assert_eq!(iv.ub(), 2.0);
    /// assert_eq!(iv.diam(), 3.0);
    /// ```
    #[inline]
    pub fn new(lb: f64, ub: f64) -> Self {
        Self::try_new(lb, ub).expect("Invalid interval: bounds must satisfy lb <= ub")
    }

    /// Creates a new interval `[lb, ub]`, returning `None` if the bounds do not
    /// describe a non-empty set of reals.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use enclose_core::math::interval::Interval;
    ///
    /// assert!(Interval::try_new(0.0, 1.0).is_some());
    /// assert!(Interval::try_new(1.0, 0.0).is_none());
    /// assert!(Interval::try_new(f64::NAN, 0.0).is_none());
    /// ```
    #[inline]
    pub fn try_new(lb: f64, ub: f64) -> Option<Self> {
        if lb.is_nan() || ub.is_nan() || lb > ub || lb == f64::INFINITY || ub == f64::NEG_INFINITY
        {
            return None;
        }
        Some(Self { lb, ub })
    }

    /// Creates the degenerate interval `[x, x]`.
    ///
    /// # Panics
    ///
    /// Panics if `x` is not finite.
    #[inline]
    pub fn point(x: f64) -> Self {
        assert!(x.is_finite(), "called `Interval::point` with non-finite value {x}");
        Self { lb: x, ub: x }
    }

    /// Creates an interval from possibly unordered or `NaN` bounds, mapping
    /// every invalid combination to the empty interval.
    #[inline(always)]
    fn normalized(lb: f64, ub: f64) -> Self {
        Self::try_new(lb, ub).unwrap_or(Self::EMPTY)
    }

    /// Returns the lower bound.
    #[inline(always)]
    pub fn lb(&self) -> f64 {
        self.lb
    }

    /// Returns the upper bound.
    #[inline(always)]
    pub fn ub(&self) -> f64 {
        self.ub
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.lb > self.ub
    }

    /// Returns `true` if `lb == ub`.
    #[inline(always)]
    pub fn is_degenerated(&self) -> bool {
        self.lb == self.ub
    }

    /// Returns `true` if some float lies strictly between the bounds, so
    /// that `bisect` yields two children narrower than `self`.
    #[inline(always)]
    pub fn is_bisectable(&self) -> bool {
        !self.is_empty() && self.lb.next_up() < self.ub
    }

    /// Returns `true` if at least one bound is infinite.
    #[inline]
    pub fn is_unbounded(&self) -> bool {
        !self.is_empty() && (self.lb == f64::NEG_INFINITY || self.ub == f64::INFINITY)
    }

    /// Returns a representative point of the interval.
    ///
    /// For bounded intervals this is the midpoint (always inside the interval).
    /// Half-unbounded intervals return `-f64::MAX` or `f64::MAX` respectively
    /// and the whole line returns `0.0`.
    ///
    /// # Panics
    ///
    /// Panics if the interval is empty.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use enclose_core::math::interval::Interval;
    ///
    /// assert_eq!(Interval::new(1.0, 3.0).mid(), 2.0);
    /// assert_eq!(Interval::ENTIRE.mid(), 0.0);
    /// assert_eq!(Interval::new(f64::NEG_INFINITY, 0.0).mid(), -f64::MAX);
    /// ```
    #[inline]
    pub fn mid(&self) -> f64 {
        assert!(!self.is_empty(), "called `Interval::mid` on an empty interval");
        match (self.lb == f64::NEG_INFINITY, self.ub == f64::INFINITY) {
            (true, true) => 0.0,
            (true, false) => -f64::MAX,
            (false, true) => f64::MAX,
            (false, false) => {
                if self.lb == self.ub {
                    return self.lb;
                }
                (0.5 * self.lb + 0.5 * self.ub).clamp(self.lb, self.ub)
            }
        }
    }

    /// Returns an upper bound of the width `ub - lb` (exact whenever the
    /// difference is representable). The empty interval has width `0`.
    #[inline]
    pub fn diam(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            sub_up(self.ub, self.lb)
        }
    }

    /// Returns an upper bound of the radius.
    #[inline(always)]
    pub fn rad(&self) -> f64 {
        next_up(0.5 * self.diam())
    }

    /// Returns the magnitude `max |x|`.
    #[inline]
    pub fn mag(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        self.lb.abs().max(self.ub.abs())
    }

    /// Returns the mignitude `min |x|`.
    #[inline]
    pub fn mig(&self) -> f64 {
        if self.is_empty() || self.contains(0.0) {
            return 0.0;
        }
        self.lb.abs().min(self.ub.abs())
    }

    /// Returns `true` if `x` lies within the interval.
    #[inline(always)]
    pub fn contains(&self, x: f64) -> bool {
        self.lb <= x && x <= self.ub
    }

    /// Returns `true` if `self ⊆ other`. The empty interval is a subset of
    /// every interval.
    #[inline]
    pub fn is_subset(&self, other: &Interval) -> bool {
        self.is_empty() || (other.lb <= self.lb && self.ub <= other.ub)
    }

    /// Returns `true` if `self` lies in the interior of `other`.
    ///
    /// Infinite bounds of `other` count as interior.
    #[inline]
    pub fn is_interior_subset(&self, other: &Interval) -> bool {
        if self.is_empty() {
            return true;
        }
        (other.lb == f64::NEG_INFINITY || other.lb < self.lb)
            && (other.ub == f64::INFINITY || self.ub < other.ub)
    }

    /// Returns `true` if both intervals share at least one point.
    #[inline]
    pub fn intersects(&self, other: &Interval) -> bool {
        !self.is_empty() && !other.is_empty() && self.lb <= other.ub && other.lb <= self.ub
    }

    /// Returns the intersection of both intervals.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use enclose_core::math::interval::Interval;
    ///
    /// let a = Interval::new(0.0, 2.0);
    /// let b = Interval::new(1.0, 3.0);
    /// assert_eq!(a.intersect(&b), Interval::new(1.0, 2.0));
    /// assert!(a.intersect(&Interval::new(5.0, 6.0)).is_empty());
    /// ```
    #[inline]
    pub fn intersect(&self, other: &Interval) -> Interval {
        if self.is_empty() || other.is_empty() {
            return Self::EMPTY;
        }
        Self::normalized(self.lb.max(other.lb), self.ub.min(other.ub))
    }

    /// Returns the smallest interval containing both intervals.
    #[inline]
    pub fn hull(&self, other: &Interval) -> Interval {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Self {
            lb: self.lb.min(other.lb),
            ub: self.ub.max(other.ub),
        }
    }

    /// Splits the interval at `lb + ratio * diam` (at the representative point
    /// `mid()` when unbounded).
    ///
    /// # Panics
    ///
    /// Panics if the interval is not bisectable (see `is_bisectable`), or if
    /// `ratio` is not in the open range `(0, 1)`.
    pub fn bisect(&self, ratio: f64) -> (Interval, Interval) {
        assert!(
            self.is_bisectable(),
            "called `Interval::bisect` on an interval that cannot be split: {self}"
        );
        assert!(
            ratio > 0.0 && ratio < 1.0,
            "called `Interval::bisect` with ratio {ratio} outside (0, 1)"
        );
        let split = if self.is_unbounded() {
            self.mid()
        } else {
            (self.lb + ratio * (self.ub - self.lb)).clamp(self.lb, self.ub)
        };
        // Floating splits of tiny intervals may land on a bound.
        let split = if split <= self.lb || split >= self.ub {
            let mid = 0.5 * self.lb + 0.5 * self.ub;
            if mid > self.lb && mid < self.ub {
                mid
            } else {
                self.lb.next_up()
            }
        } else {
            split
        };
        (
            Self {
                lb: self.lb,
                ub: split,
            },
            Self {
                lb: split,
                ub: self.ub,
            },
        )
    }

    /// Returns the relative width reduction from `before` to `self`, in
    /// `[0, 1]`. An unbounded interval that became bounded counts as a full
    /// reduction.
    #[inline]
    pub fn rel_reduction(&self, before: &Interval) -> f64 {
        if self.is_empty() {
            return 1.0;
        }
        let old = before.diam();
        let new = self.diam();
        if old == f64::INFINITY {
            return if new == f64::INFINITY { 0.0 } else { 1.0 };
        }
        if old <= 0.0 {
            return 0.0;
        }
        (1.0 - new / old).clamp(0.0, 1.0)
    }

    /// Returns `x²`, tighter than `x * x` when `0 ∈ x`.
    pub fn sqr(&self) -> Interval {
        if self.is_empty() {
            return Self::EMPTY;
        }
        if self.lb >= 0.0 {
            Self::normalized(mul_dn(self.lb, self.lb), mul_up(self.ub, self.ub))
        } else if self.ub <= 0.0 {
            Self::normalized(mul_dn(self.ub, self.ub), mul_up(self.lb, self.lb))
        } else {
            let m = self.mag();
            Self::normalized(0.0, mul_up(m, m))
        }
    }

    /// Returns `x^n` for a non-negative integer exponent.
    pub fn powi(&self, n: u32) -> Interval {
        if self.is_empty() {
            return Self::EMPTY;
        }
        match n {
            0 => Self::point(1.0),
            1 => *self,
            2 => self.sqr(),
            _ if n % 2 == 0 => {
                let a = self.abs();
                Self::normalized(pow_dn(a.lb, n).max(0.0), pow_up(a.ub, n))
            }
            _ => {
                let lb = if self.lb >= 0.0 {
                    pow_dn(self.lb, n)
                } else {
                    -pow_up(-self.lb, n)
                };
                let ub = if self.ub >= 0.0 {
                    pow_up(self.ub, n)
                } else {
                    -pow_dn(-self.ub, n)
                };
                Self::normalized(lb, ub)
            }
        }
    }

    /// Returns `|x|`.
    pub fn abs(&self) -> Interval {
        if self.is_empty() {
            return Self::EMPTY;
        }
        Self::normalized(self.mig(), self.mag())
    }

    /// Returns `sqrt(x ∩ [0, +inf))`.
    pub fn sqrt(&self) -> Interval {
        let x = self.intersect(&Self::new(0.0, f64::INFINITY));
        if x.is_empty() {
            return Self::EMPTY;
        }
        Self::normalized(next_dn(x.lb.sqrt()).max(0.0), next_up(x.ub.sqrt()))
    }

    /// Returns `exp(x)`.
    pub fn exp(&self) -> Interval {
        if self.is_empty() {
            return Self::EMPTY;
        }
        Self::normalized(next_dn(self.lb.exp()).max(0.0), next_up(self.ub.exp()))
    }

    /// Returns `ln(x ∩ (0, +inf))`.
    pub fn ln(&self) -> Interval {
        if self.is_empty() || self.ub <= 0.0 {
            return Self::EMPTY;
        }
        let lb = if self.lb <= 0.0 {
            f64::NEG_INFINITY
        } else {
            next_dn(self.lb.ln())
        };
        Self::normalized(lb, next_up(self.ub.ln()))
    }

    /// Returns `min(x, y)` over both intervals.
    pub fn min(&self, other: &Interval) -> Interval {
        if self.is_empty() || other.is_empty() {
            return Self::EMPTY;
        }
        Self::normalized(self.lb.min(other.lb), self.ub.min(other.ub))
    }

    /// Returns `max(x, y)` over both intervals.
    pub fn max(&self, other: &Interval) -> Interval {
        if self.is_empty() || other.is_empty() {
            return Self::EMPTY;
        }
        Self::normalized(self.lb.max(other.lb), self.ub.max(other.ub))
    }
}

#[inline(always)]
fn pow_dn(x: f64, n: u32) -> f64 {
    (0..n).fold(1.0, |acc, _| mul_dn(acc, x))
}

#[inline(always)]
fn pow_up(x: f64, n: u32) -> f64 {
    (0..n).fold(1.0, |acc, _| mul_up(acc, x))
}

impl Default for Interval {
    /// The whole real line.
    fn default() -> Self {
        Self::ENTIRE
    }
}

impl From<f64> for Interval {
    #[inline(always)]
    fn from(x: f64) -> Self {
        Self::point(x)
    }
}

impl From<(f64, f64)> for Interval {
    #[inline(always)]
    fn from((lb, ub): (f64, f64)) -> Self {
        Self::new(lb, ub)
    }
}

impl std::fmt::Debug for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(self, f)
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            write!(f, "[empty]")
        } else {
            write!(f, "[{}, {}]", self.lb, self.ub)
        }
    }
}

impl Add for Interval {
    type Output = Interval;

    #[inline]
    fn add(self, rhs: Interval) -> Interval {
        if self.is_empty() || rhs.is_empty() {
            return Interval::EMPTY;
        }
        Interval::normalized(add_dn(self.lb, rhs.lb), add_up(self.ub, rhs.ub))
    }
}

impl Sub for Interval {
    type Output = Interval;

    #[inline]
    fn sub(self, rhs: Interval) -> Interval {
        if self.is_empty() || rhs.is_empty() {
            return Interval::EMPTY;
        }
        Interval::normalized(sub_dn(self.lb, rhs.ub), sub_up(self.ub, rhs.lb))
    }
}

impl Mul for Interval {
    type Output = Interval;

    fn mul(self, rhs: Interval) -> Interval {
        if self.is_empty() || rhs.is_empty() {
            return Interval::EMPTY;
        }
        let candidates = [
            (self.lb, rhs.lb),
            (self.lb, rhs.ub),
            (self.ub, rhs.lb),
            (self.ub, rhs.ub),
        ];
        let lb = candidates
            .iter()
            .map(|&(a, b)| mul_dn(a, b))
            .fold(f64::INFINITY, f64::min);
        let ub = candidates
            .iter()
            .map(|&(a, b)| mul_up(a, b))
            .fold(f64::NEG_INFINITY, f64::max);
        Interval::normalized(lb, ub)
    }
}

impl Div for Interval {
    type Output = Interval;

    /// Division; a divisor containing zero yields the whole line (or the
    /// empty interval when the divisor is exactly `[0, 0]`).
    fn div(self, rhs: Interval) -> Interval {
        if self.is_empty() || rhs.is_empty() {
            return Interval::EMPTY;
        }
        if rhs.lb == 0.0 && rhs.ub == 0.0 {
            return Interval::EMPTY;
        }
        if rhs.contains(0.0) {
            return Interval::ENTIRE;
        }
        let candidates = [
            (self.lb, rhs.lb),
            (self.lb, rhs.ub),
            (self.ub, rhs.lb),
            (self.ub, rhs.ub),
        ];
        let lb = candidates
            .iter()
            .map(|&(a, b)| div_dn(a, b))
            .fold(f64::INFINITY, f64::min);
        let ub = candidates
            .iter()
            .map(|&(a, b)| div_up(a, b))
            .fold(f64::NEG_INFINITY, f64::max);
        Interval::normalized(lb, ub)
    }
}

impl Neg for Interval {
    type Output = Interval;

    #[inline]
    fn neg(self) -> Interval {
        if self.is_empty() {
            return Interval::EMPTY;
        }
        Interval {
            lb: -self.ub,
            ub: -self.lb,
        }
    }
}

impl Add<f64> for Interval {
    type Output = Interval;

    #[inline(always)]
    fn add(self, rhs: f64) -> Interval {
        self + Interval::point(rhs)
    }
}

impl Sub<f64> for Interval {
    type Output = Interval;

    #[inline(always)]
    fn sub(self, rhs: f64) -> Interval {
        self - Interval::point(rhs)
    }
}

impl Mul<f64> for Interval {
    type Output = Interval;

    #[inline(always)]
    fn mul(self, rhs: f64) -> Interval {
        self * Interval::point(rhs)
    }
}

impl Mul<Interval> for f64 {
    type Output = Interval;

    #[inline(always)]
    fn mul(self, rhs: Interval) -> Interval {
        Interval::point(self) * rhs
    }
}

impl AddAssign for Interval {
    #[inline(always)]
    fn add_assign(&mut self, rhs: Interval) {
        *self = *self + rhs;
    }
}

impl SubAssign for Interval {
    #[inline(always)]
    fn sub_assign(&mut self, rhs: Interval) {
        *self = *self - rhs;
    }
}

impl BitAnd for Interval {
    type Output = Interval;

    #[inline(always)]
    fn bitand(self, rhs: Interval) -> Interval {
        self.intersect(&rhs)
    }
}

impl BitOr for Interval {
    type Output = Interval;

    #[inline(always)]
    fn bitor(self, rhs: Interval) -> Interval {
        self.hull(&rhs)
    }
}

impl Zero for Interval {
    #[inline(always)]
    fn zero() -> Self {
        Interval { lb: 0.0, ub: 0.0 }
    }

    #[inline(always)]
    fn is_zero(&self) -> bool {
        self.lb == 0.0 && self.ub == 0.0
    }
}

impl One for Interval {
    #[inline(always)]
    fn one() -> Self {
        Interval { lb: 1.0, ub: 1.0 }
    }
}

impl Sum for Interval {
    fn sum<I: Iterator<Item = Interval>>(iter: I) -> Interval {
        iter.fold(Interval::zero(), Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn iv(lb: f64, ub: f64) -> Interval {
        Interval::new(lb, ub)
    }

    #[test]
    fn test_construction_and_accessors() {
        let a = iv(-1.0, 3.0);
        assert_eq!(a.lb(), -1.0);
        assert_eq!(a.ub(), 3.0);
        assert_eq!(a.mid(), 1.0);
        assert_eq!(a.diam(), 4.0);
        assert_eq!(a.mag(), 3.0);
        assert_eq!(a.mig(), 0.0);
        assert!(!a.is_empty());
        assert!(!a.is_degenerated());
        assert!(Interval::point(2.0).is_degenerated());
    }

    #[test]
    #[should_panic(expected = "Invalid interval")]
    fn test_new_rejects_reversed_bounds() {
        let _ = iv(2.0, 1.0);
    }

    #[test]
    fn test_empty_is_canonical() {
        let a = iv(0.0, 1.0) & iv(2.0, 3.0);
        assert!(a.is_empty());
        assert_eq!(a, Interval::EMPTY);
        assert_eq!(a.diam(), 0.0);
        assert!(Interval::EMPTY.is_subset(&iv(5.0, 6.0)));
        assert!((Interval::EMPTY + iv(0.0, 1.0)).is_empty());
        assert_eq!(format!("{}", Interval::EMPTY), "[empty]");
    }

    #[test]
    fn test_add_sub_enclose_exact_results() {
        let a = iv(0.1, 0.2);
        let b = iv(0.2, 0.3);
        let s = a + b;
        // 0.1 + 0.2 rounds up in binary, the lower bound must step below it.
        assert!(s.lb() < 0.1 + 0.2);
        assert!(s.ub() >= 0.5);
        let d = a - b;
        assert!(d.lb() < -0.19 && d.ub() == 0.0);

        let exact = iv(1.0, 2.0) + iv(3.0, 4.0);
        assert_eq!(exact, iv(4.0, 6.0));
    }

    #[test]
    fn test_mul_sign_cases() {
        let r = iv(-2.0, 3.0) * iv(-1.0, 4.0);
        assert!(r.lb() <= -8.0 && r.ub() >= 12.0);
        assert_relative_eq!(r.lb(), -8.0, max_relative = 1e-15);
        assert_relative_eq!(r.ub(), 12.0, max_relative = 1e-15);

        let z = iv(0.0, 0.0) * Interval::ENTIRE;
        assert_eq!(z, iv(0.0, 0.0));
    }

    #[test]
    fn test_div_by_interval_containing_zero() {
        assert_eq!(iv(1.0, 2.0) / iv(-1.0, 1.0), Interval::ENTIRE);
        assert!((iv(1.0, 2.0) / iv(0.0, 0.0)).is_empty());
        let q = iv(1.0, 2.0) / iv(4.0, 8.0);
        assert!(q.lb() <= 0.125 && q.ub() >= 0.5);
    }

    #[test]
    fn test_sqr_is_tighter_than_mul() {
        let x = iv(-2.0, 3.0);
        assert_eq!(x.sqr().lb(), 0.0);
        assert!(x.sqr().ub() >= 9.0);
        assert!((x * x).lb() < 0.0);
        assert_eq!(Interval::point(0.0).sqr(), iv(0.0, 0.0));
    }

    #[test]
    fn test_powi_odd_and_even() {
        let x = iv(-2.0, 1.0);
        let cube = x.powi(3);
        assert!(cube.lb() <= -8.0 && cube.ub() >= 1.0);
        let quad = x.powi(4);
        assert_eq!(quad.lb(), 0.0);
        assert!(quad.ub() >= 16.0);
    }

    #[test]
    fn test_elementary_functions_enclose() {
        let s = iv(4.0, 9.0).sqrt();
        assert!(s.contains(2.0) && s.contains(3.0));
        assert!(iv(-4.0, -1.0).sqrt().is_empty());
        let e = iv(0.0, 1.0).exp();
        assert!(e.contains(1.0) && e.contains(std::f64::consts::E));
        let l = iv(0.0, 1.0).ln();
        assert_eq!(l.lb(), f64::NEG_INFINITY);
        assert!(l.contains(0.0));
    }

    #[test]
    fn test_set_operations() {
        let a = iv(0.0, 2.0);
        let b = iv(1.0, 3.0);
        assert_eq!(a | b, iv(0.0, 3.0));
        assert!(a.intersects(&b));
        assert!(iv(0.5, 1.5).is_interior_subset(&a));
        assert!(!iv(0.0, 1.5).is_interior_subset(&a));
        assert!(iv(0.0, 1.5).is_subset(&a));
        assert!(iv(5.0, 6.0).is_interior_subset(&Interval::ENTIRE));
    }

    #[test]
    fn test_bisect_and_reduction() {
        let (l, r) = iv(0.0, 4.0).bisect(0.5);
        assert_eq!(l, iv(0.0, 2.0));
        assert_eq!(r, iv(2.0, 4.0));
        assert_relative_eq!(l.rel_reduction(&iv(0.0, 4.0)), 0.5);
        assert_eq!(iv(0.0, 4.0).rel_reduction(&Interval::ENTIRE), 1.0);

        let (ul, ur) = Interval::ENTIRE.bisect(0.5);
        assert_eq!(ul.ub(), 0.0);
        assert_eq!(ur.lb(), 0.0);
    }

    #[test]
    fn test_adjacent_floats_are_not_bisectable() {
        let x = 1e10_f64;
        let two_floats = iv(x, x.next_up());
        assert!(two_floats.diam() > 1e-7);
        assert!(!two_floats.is_bisectable());
        assert!(!Interval::point(x).is_bisectable());
        assert!(!Interval::EMPTY.is_bisectable());
        assert!(Interval::ENTIRE.is_bisectable());

        let three_floats = iv(x, x.next_up().next_up());
        assert!(three_floats.is_bisectable());
        let (l, r) = three_floats.bisect(0.5);
        assert_eq!(l.ub(), x.next_up());
        assert_eq!(r.lb(), x.next_up());
        assert!(l.diam() < three_floats.diam() && r.diam() < three_floats.diam());
    }

    #[test]
    #[should_panic]
    fn test_bisect_rejects_adjacent_floats() {
        let x = 1e10_f64;
        let _ = iv(x, x.next_up()).bisect(0.5);
    }

    #[test]
    fn test_sum_uses_zero() {
        let total: Interval = [iv(1.0, 2.0), iv(3.0, 4.0)].into_iter().sum();
        assert!(total.contains(4.0) && total.contains(6.0));
        assert!(Interval::zero().is_zero());
    }
}

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

//! Directed rounding without touching the FPU rounding mode.
//!
//! Sums and products recover their exact rounding error (TwoSum and a fused
//! multiply-add) and step one ulp outward only when the floating result lies
//! on the wrong side of the exact one. Quotients and libm results are always
//! stepped.

/// Products below this magnitude may have lost bits to gradual underflow, so
/// their fma residual is not trusted.
const UNDERFLOW_GUARD: f64 = 1e-290;

/// Steps `x` one ulp towards `-inf`. `NaN` becomes `-inf`.
#[inline]
pub(crate) fn next_dn(x: f64) -> f64 {
    if x.is_nan() {
        f64::NEG_INFINITY
    } else {
        x.next_down()
    }
}

/// Steps `x` one ulp towards `+inf`. `NaN` becomes `+inf`.
#[inline]
pub(crate) fn next_up(x: f64) -> f64 {
    if x.is_nan() {
        f64::INFINITY
    } else {
        x.next_up()
    }
}

/// Exact error of `a + b` (Knuth's TwoSum). Only valid for finite sums.
#[inline]
fn two_sum_err(a: f64, b: f64, s: f64) -> f64 {
    let bb = s - a;
    (a - (s - bb)) + (b - bb)
}

#[inline]
pub(crate) fn add_dn(a: f64, b: f64) -> f64 {
    let s = a + b;
    if !s.is_finite() {
        return next_dn(s).min(s);
    }
    if two_sum_err(a, b, s) < 0.0 {
        s.next_down()
    } else {
        s
    }
}

#[inline]
pub(crate) fn add_up(a: f64, b: f64) -> f64 {
    let s = a + b;
    if !s.is_finite() {
        return next_up(s).max(s);
    }
    if two_sum_err(a, b, s) > 0.0 {
        s.next_up()
    } else {
        s
    }
}

#[inline(always)]
pub(crate) fn sub_dn(a: f64, b: f64) -> f64 {
    add_dn(a, -b)
}

#[inline(always)]
pub(crate) fn sub_up(a: f64, b: f64) -> f64 {
    add_up(a, -b)
}

// Interval convention: 0 * inf = 0.

#[inline]
pub(crate) fn mul_dn(a: f64, b: f64) -> f64 {
    if a == 0.0 || b == 0.0 {
        return 0.0;
    }
    let p = a * b;
    if !p.is_finite() || p.abs() < UNDERFLOW_GUARD {
        return next_dn(p);
    }
    if a.mul_add(b, -p) < 0.0 {
        p.next_down()
    } else {
        p
    }
}

#[inline]
pub(crate) fn mul_up(a: f64, b: f64) -> f64 {
    if a == 0.0 || b == 0.0 {
        return 0.0;
    }
    let p = a * b;
    if !p.is_finite() || p.abs() < UNDERFLOW_GUARD {
        return next_up(p);
    }
    if a.mul_add(b, -p) > 0.0 {
        p.next_up()
    } else {
        p
    }
}

#[inline]
pub(crate) fn div_dn(a: f64, b: f64) -> f64 {
    if a == 0.0 { 0.0 } else { next_dn(a / b) }
}

#[inline]
pub(crate) fn div_up(a: f64, b: f64) -> f64 {
    if a == 0.0 { 0.0 } else { next_up(a / b) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inexact_results_step_outward() {
        // 0.1 + 0.2 rounds up, so only the lower bound needs a step.
        assert!(add_dn(0.1, 0.2) < 0.1 + 0.2);
        assert!(add_up(0.1, 0.2) >= 0.1 + 0.2);
        assert!(mul_dn(3.0, 0.1) < 3.0 * 0.1);
        assert!(mul_up(3.0, 0.1) >= 3.0 * 0.1);
        assert!(div_dn(1.0, 3.0) < 1.0 / 3.0);
        assert!(div_up(1.0, 3.0) > 1.0 / 3.0);
    }

    #[test]
    fn test_exact_results_are_kept() {
        assert_eq!(add_dn(1.0, 2.0), 3.0);
        assert_eq!(add_up(1.0, 2.0), 3.0);
        assert_eq!(add_dn(1.5, -1.5), 0.0);
        assert_eq!(mul_dn(3.0, 2.0), 6.0);
        assert_eq!(mul_up(-0.5, 4.0), -2.0);
        assert_eq!(mul_dn(0.0, f64::INFINITY), 0.0);
        assert_eq!(mul_up(f64::NEG_INFINITY, 0.0), 0.0);
    }

    #[test]
    fn test_overflow_and_infinities() {
        assert_eq!(add_dn(f64::MAX, f64::MAX), f64::MAX);
        assert_eq!(add_up(f64::MAX, f64::MAX), f64::INFINITY);
        assert_eq!(add_dn(f64::NEG_INFINITY, 1.0), f64::NEG_INFINITY);
        assert_eq!(next_dn(f64::NAN), f64::NEG_INFINITY);
        assert_eq!(next_up(f64::NAN), f64::INFINITY);
    }
}

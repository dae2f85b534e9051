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

//! Rigorous bounds from untrusted LP answers.
//!
//! Given rows `B_i = [lhs_i, rhs_i] ∋ a_i · x` and a box `X`, any vector `y`
//! gives, for every feasible `x ∈ X`,
//!
//! ```text
//! c · x = y · (A x) + (c - Aᵀy) · x  ∈  y · B + (c - Aᵀy) · X
//! ```
//!
//! so the lower end of the right-hand side, computed in interval arithmetic,
//! is a certified lower bound of `min c · x` whatever the quality of `y`
//! (Neumaier and Shcherbina). A good `y` from the LP solver only makes the
//! bound tight. Multipliers pointing at an infinite row side would make the
//! bound useless and are zeroed first.
//!
//! The same identity with `c = 0` certifies infeasibility: if
//! `0 ∉ (Aᵀy) · X - y · B`, no point of `X` satisfies every row.

use crate::linearizer::LinearRow;
use enclose_core::math::{interval::Interval, interval_box::IntervalBox};
use num_traits::Zero;

/// Zeroes a multiplier that points at an infinite side of its row.
#[inline]
fn corrected_multiplier(row: &LinearRow, y: f64) -> f64 {
    if !y.is_finite()
        || (y > 0.0 && row.lhs == f64::NEG_INFINITY)
        || (y < 0.0 && row.rhs == f64::INFINITY)
    {
        0.0
    } else {
        y
    }
}

/// Returns an enclosure of `y · B` and `Aᵀy` over the rows.
fn dual_combination(rows: &[LinearRow], y: &[f64], n: usize) -> (Interval, Vec<Interval>) {
    debug_assert_eq!(
        rows.len(),
        y.len(),
        "called `dual_combination` with {} multipliers for {} rows",
        y.len(),
        rows.len()
    );
    let mut rhs = Interval::zero();
    let mut aty = vec![Interval::zero(); n];
    for (row, &yi) in rows.iter().zip(y) {
        let yi = corrected_multiplier(row, yi);
        if yi == 0.0 {
            continue;
        }
        rhs += row.bounds() * yi;
        for (acc, &a) in aty.iter_mut().zip(&row.coeffs) {
            if a != 0.0 {
                *acc += Interval::point(a) * yi;
            }
        }
    }
    (rhs, aty)
}

/// Returns a certified lower bound of `min objective · x` over the points of
/// `bx` satisfying `rows`, using the approximate multipliers `dual`.
///
/// The multipliers follow the minimization convention: positive on rows
/// whose lower side is active, negative on rows whose upper side is active.
/// The result may be `-inf`; it is never above the true minimum.
pub fn certified_lower_bound(
    rows: &[LinearRow],
    objective: &[f64],
    bx: &IntervalBox,
    dual: &[f64],
) -> f64 {
    debug_assert_eq!(
        objective.len(),
        bx.len(),
        "called `certified_lower_bound` with {} objective coefficients for a box of dimension {}",
        objective.len(),
        bx.len()
    );
    let (mut bound, aty) = dual_combination(rows, dual, bx.len());
    for ((&c, aty_j), x) in objective.iter().zip(aty).zip(bx.iter()) {
        let reduced = Interval::point(c) - aty_j;
        if !reduced.is_zero() {
            bound += reduced * *x;
        }
    }
    if bound.is_empty() {
        f64::NEG_INFINITY
    } else {
        bound.lb()
    }
}

/// Returns `true` if `direction` proves that no point of `bx` satisfies
/// every row.
pub fn certifies_infeasibility(rows: &[LinearRow], bx: &IntervalBox, direction: &[f64]) -> bool {
    if direction.len() != rows.len() {
        return false;
    }
    let (rhs, aty) = dual_combination(rows, direction, bx.len());
    let activity: Interval = aty
        .into_iter()
        .zip(bx.iter())
        .filter(|(a, _)| !a.is_zero())
        .map(|(a, x)| a * *x)
        .sum();
    let gap = activity - rhs;
    !gap.is_empty() && !gap.contains(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> IntervalBox {
        IntervalBox::from_bounds(&[(0.0, 10.0), (0.0, 10.0)])
    }

    /// x + y <= 1
    fn budget() -> Vec<LinearRow> {
        vec![LinearRow::leq(vec![1.0, 1.0], 1.0)]
    }

    #[test]
    fn test_exact_dual_gives_exact_bound() {
        // max x = -min(-x); the multiplier of the active upper side is -1.
        let lb = certified_lower_bound(&budget(), &[-1.0, 0.0], &unit_box(), &[-1.0]);
        assert_eq!(lb, -1.0);
    }

    #[test]
    fn test_perturbed_dual_stays_sound() {
        for y in [-1.1, -0.9, -0.5, -1e-3, -1.0 + 1e-9] {
            let lb = certified_lower_bound(&budget(), &[-1.0, 0.0], &unit_box(), &[y]);
            assert!(lb <= -1.0, "y = {y} gives {lb}");
        }
    }

    #[test]
    fn test_wrong_sign_multiplier_is_zeroed() {
        // A positive multiplier on a row without lower side would multiply
        // -inf; it is dropped and only the box bound remains.
        let lb = certified_lower_bound(&budget(), &[-1.0, 0.0], &unit_box(), &[2.0]);
        assert_eq!(lb, -10.0);
    }

    #[test]
    fn test_nan_multiplier_is_ignored() {
        let lb = certified_lower_bound(&budget(), &[1.0, 0.0], &unit_box(), &[f64::NAN]);
        assert_eq!(lb, 0.0);
    }

    #[test]
    fn test_infeasibility_certificate() {
        // x - y >= 0.5 and y - x >= 0.5
        let rows = vec![
            LinearRow::geq(vec![1.0, -1.0], 0.5),
            LinearRow::geq(vec![-1.0, 1.0], 0.5),
        ];
        assert!(certifies_infeasibility(&rows, &unit_box(), &[1.0, 1.0]));
        assert!(certifies_infeasibility(&rows, &unit_box(), &[1.0 + 1e-10, 1.0]));
        assert!(!certifies_infeasibility(&rows, &unit_box(), &[1.0, 0.0]));
        assert!(!certifies_infeasibility(&rows, &unit_box(), &[1.0]));
    }

    #[test]
    fn test_feasible_rows_are_never_certified_infeasible() {
        let rows = vec![
            LinearRow::leq(vec![1.0, 1.0], 1.0),
            LinearRow::geq(vec![1.0, -1.0], -0.5),
        ];
        for y in [[-1.0, 1.0], [-0.5, 2.0], [-3.0, 0.1]] {
            assert!(!certifies_infeasibility(&rows, &unit_box(), &y));
        }
    }
}

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

//! Corner-based linear relaxations
//!
//! A `Linearizer` turns a constraint `f(x) op 0` into affine rows that hold
//! for every solution inside the current box. `CornerLinearizer` builds them
//! from an expansion point `x̂` taken at a corner of the box:
//!
//! - With `x̂j` at the lower bound, `xj - x̂j >= 0` over the box, so the
//!   lower end of the derivative enclosure gives an underestimator of `f`;
//!   at the upper bound the upper end does. Which end is used also depends
//!   on the side of the row (`<=` needs an underestimator, `>=` an
//!   overestimator).
//! - `LinearizationMode::Taylor` uses the gradient enclosure over the whole
//!   box. `LinearizationMode::Hansen` evaluates the partial derivative of
//!   `xj` with the previous variables already fixed at their corner, which
//!   is never wider.
//!
//! Which corners to use is decided per constraint by one or several
//! `CornerPolicy` values. Each policy of an ensemble produces its own rows.

use crate::contractor::ContractError;
use enclose_core::math::{interval::Interval, interval_box::IntervalBox};
use enclose_model::{
    function::Function,
    system::{CmpOp, Constraint},
};
use fixedbitset::FixedBitSet;
use rand::{Rng, SeedableRng, rngs::StdRng};
use smallvec::{SmallVec, smallvec};

/// An affine row `lhs <= coeffs · x <= rhs`. Rows produced by linearizers
/// have exactly one finite side.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearRow {
    pub coeffs: Vec<f64>,
    pub lhs: f64,
    pub rhs: f64,
}

impl LinearRow {
    /// Creates the row `coeffs · x <= rhs`.
    #[inline]
    pub fn leq(coeffs: Vec<f64>, rhs: f64) -> Self {
        Self {
            coeffs,
            lhs: f64::NEG_INFINITY,
            rhs,
        }
    }

    /// Creates the row `coeffs · x >= lhs`.
    #[inline]
    pub fn geq(coeffs: Vec<f64>, lhs: f64) -> Self {
        Self {
            coeffs,
            lhs,
            rhs: f64::INFINITY,
        }
    }

    /// Returns the range of `coeffs · x` over `bx`.
    #[inline]
    pub fn activity(&self, bx: &IntervalBox) -> Interval {
        bx.dot(&self.coeffs)
    }

    /// Returns `true` if every point of `bx` satisfies the row.
    pub fn is_implied(&self, bx: &IntervalBox) -> bool {
        let activity = self.activity(bx);
        activity.lb() >= self.lhs && activity.ub() <= self.rhs
    }

    /// Returns `true` if no point of `bx` satisfies the row.
    pub fn is_crossed(&self, bx: &IntervalBox) -> bool {
        let activity = self.activity(bx);
        activity.is_empty() || activity.ub() < self.lhs || activity.lb() > self.rhs
    }

    /// Returns the side interval `[lhs, rhs]`.
    #[inline]
    pub fn bounds(&self) -> Interval {
        Interval::new(self.lhs, self.rhs)
    }
}

impl std::fmt::Display for LinearRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} <= ", self.lhs)?;
        for (j, c) in self.coeffs.iter().enumerate() {
            if *c != 0.0 {
                write!(f, "{c:+}*x{j} ")?;
            }
        }
        write!(f, "<= {}", self.rhs)
    }
}

/// Rows produced for a single constraint.
pub type RowBatch = SmallVec<[LinearRow; 4]>;

/// Produces affine outer relaxations of constraints.
///
/// Every row appended to `rows` must be satisfied by every point of `bx`
/// that satisfies the constraint.
pub trait Linearizer {
    /// Returns the name of the linearizer.
    fn name(&self) -> &str;

    /// Appends rows relaxing `function(x) op 0` over `bx` and returns how
    /// many were added. Fails with `EmptyBox` when the constraint cannot be
    /// satisfied in `bx`.
    fn linearize(
        &mut self,
        function: &dyn Function,
        op: CmpOp,
        bx: &IntervalBox,
        rows: &mut RowBatch,
    ) -> Result<usize, ContractError>;

    /// Appends rows relaxing `constraint` over `bx`.
    fn linearize_constraint(
        &mut self,
        constraint: &Constraint,
        bx: &IntervalBox,
        rows: &mut RowBatch,
    ) -> Result<usize, ContractError> {
        self.linearize(constraint.function(), constraint.op(), bx, rows)
    }

    /// Resets internal random state.
    fn restart(&mut self) {}
}

impl std::fmt::Debug for dyn Linearizer + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Linearizer({})", self.name())
    }
}

/// How the slopes of a corner linearization are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LinearizationMode {
    /// Gradient enclosure over the whole box.
    #[default]
    Taylor,
    /// Partial derivatives with previous variables fixed at the corner.
    Hansen,
}

impl std::fmt::Display for LinearizationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinearizationMode::Taylor => write!(f, "Taylor"),
            LinearizationMode::Hansen => write!(f, "Hansen"),
        }
    }
}

/// Strategy choosing the corners a constraint is expanded at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CornerPolicy {
    /// Every variable at its lower bound.
    Lower,
    /// Every variable at its upper bound.
    Upper,
    /// A random corner.
    Random,
    /// The corner opposite to the last random draw.
    RandomOpposite,
    /// The best of all `2^k` corners (`k` nonlinear variables) by a
    /// midpoint proxy, or a random corner when `k > cutoff`.
    Best { cutoff: usize },
    /// The corner given by the sign of each derivative, random where the
    /// sign is not definite.
    Monotonicity,
    /// Up to four complementary corners around a random one.
    K4,
}

impl std::fmt::Display for CornerPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CornerPolicy::Lower => write!(f, "Lower"),
            CornerPolicy::Upper => write!(f, "Upper"),
            CornerPolicy::Random => write!(f, "Random"),
            CornerPolicy::RandomOpposite => write!(f, "RandomOpposite"),
            CornerPolicy::Best { cutoff } => write!(f, "Best(cutoff: {cutoff})"),
            CornerPolicy::Monotonicity => write!(f, "Monotonicity"),
            CornerPolicy::K4 => write!(f, "K4"),
        }
    }
}

/// Configuration of a `CornerLinearizer`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CornerLinearizerConfig {
    /// Slope computation.
    pub mode: LinearizationMode,
    /// Constraints with a wider derivative enclosure are skipped.
    pub max_diam_deriv: f64,
    /// Variables whose derivative enclosure is at most this wide need no
    /// corner choice.
    pub linear_tolerance: f64,
    /// Seed of the random corner draws.
    pub seed: u64,
}

impl Default for CornerLinearizerConfig {
    fn default() -> Self {
        Self {
            mode: LinearizationMode::Taylor,
            max_diam_deriv: 1e6,
            linear_tolerance: 1e-10,
            seed: 1,
        }
    }
}

/// The side of a row: `f <= 0` needs an underestimator of `f`, `f >= 0` an
/// overestimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Leq,
    Geq,
}

impl Side {
    /// Returns `true` if the slope of a variable expanded at the given corner
    /// is the lower end of its derivative enclosure.
    #[inline]
    fn uses_lower_slope(self, upper_corner: bool) -> bool {
        matches!(
            (self, upper_corner),
            (Side::Leq, false) | (Side::Geq, true)
        )
    }
}

/// What is known about a constraint over the current box.
struct Expansion<'f> {
    function: &'f dyn Function,
    bx: &'f IntervalBox,
    gradient: IntervalBox,
    nonlinear: SmallVec<[usize; 8]>,
}

/// A corner linearizer running one or several `CornerPolicy` values.
///
/// A corner is a bit set over the variables: a set bit puts the variable at
/// its upper bound.
///
/// # Examples
///
/// ```rust
/// # use enclose_core::math::{interval::Interval, interval_box::IntervalBox};
/// # use enclose_ctc::linearizer::{CornerLinearizer, CornerPolicy, Linearizer, RowBatch};
/// # use enclose_model::function::ClosureFunction;
/// # use enclose_model::system::CmpOp;
///
/// // x² + y - 1 <= 0
/// let f = ClosureFunction::new(
///     2,
///     |b: &IntervalBox| b[0].sqr() + b[1] - 1.0,
///     |b: &IntervalBox| IntervalBox::new(vec![b[0] * 2.0, Interval::point(1.0)]),
/// );
/// let bx = IntervalBox::from_bounds(&[(0.0, 2.0), (0.0, 2.0)]);
/// let mut lin = CornerLinearizer::new(CornerPolicy::Upper);
/// let mut rows = RowBatch::new();
/// assert_eq!(lin.linearize(&f, CmpOp::Leq, &bx, &mut rows), Ok(1));
/// // 4x + y <= 5
/// assert_eq!(rows[0].coeffs, vec![4.0, 1.0]);
/// assert_eq!(rows[0].rhs, 5.0);
/// ```
#[derive(Debug, Clone)]
pub struct CornerLinearizer {
    config: CornerLinearizerConfig,
    policies: SmallVec<[CornerPolicy; 2]>,
    rng: StdRng,
    last_random: Option<FixedBitSet>,
}

impl Default for CornerLinearizer {
    fn default() -> Self {
        Self::ensemble([CornerPolicy::Lower, CornerPolicy::Upper])
    }
}

impl CornerLinearizer {
    /// Creates a linearizer running a single policy.
    pub fn new(policy: CornerPolicy) -> Self {
        Self::ensemble([policy])
    }

    /// Creates a linearizer running every policy of `policies`.
    ///
    /// # Panics
    ///
    /// Panics if `policies` is empty.
    pub fn ensemble<I>(policies: I) -> Self
    where
        I: IntoIterator<Item = CornerPolicy>,
    {
        let policies: SmallVec<[CornerPolicy; 2]> = policies.into_iter().collect();
        assert!(
            !policies.is_empty(),
            "called `CornerLinearizer::ensemble` without any policy"
        );
        let config = CornerLinearizerConfig::default();
        Self {
            rng: StdRng::seed_from_u64(config.seed),
            config,
            policies,
            last_random: None,
        }
    }

    /// Replaces the configuration and reseeds the random draws.
    pub fn with_config(mut self, config: CornerLinearizerConfig) -> Self {
        self.rng = StdRng::seed_from_u64(config.seed);
        self.config = config;
        self.last_random = None;
        self
    }

    pub fn with_mode(mut self, mode: LinearizationMode) -> Self {
        self.config.mode = mode;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self.rng = StdRng::seed_from_u64(seed);
        self.last_random = None;
        self
    }

    #[inline]
    pub fn config(&self) -> &CornerLinearizerConfig {
        &self.config
    }

    #[inline]
    pub fn policies(&self) -> &[CornerPolicy] {
        &self.policies
    }

    /// Resets the random draws to the configured seed.
    pub fn reseed(&mut self) {
        self.rng = StdRng::seed_from_u64(self.config.seed);
        self.last_random = None;
    }

    fn random_corner(&mut self, ex: &Expansion<'_>) -> FixedBitSet {
        let mut corner = FixedBitSet::with_capacity(ex.bx.len());
        for &j in &ex.nonlinear {
            corner.set(j, self.rng.gen_bool(0.5));
        }
        self.last_random = Some(corner.clone());
        corner
    }

    fn opposite(corner: &FixedBitSet, vars: &[usize]) -> FixedBitSet {
        let mut flipped = corner.clone();
        for &j in vars {
            flipped.toggle(j);
        }
        flipped
    }

    fn corners(
        &mut self,
        policy: CornerPolicy,
        side: Side,
        ex: &Expansion<'_>,
    ) -> SmallVec<[FixedBitSet; 4]> {
        let n = ex.bx.len();
        match policy {
            CornerPolicy::Lower => smallvec![FixedBitSet::with_capacity(n)],
            CornerPolicy::Upper => {
                let mut corner = FixedBitSet::with_capacity(n);
                corner.insert_range(..);
                smallvec![corner]
            }
            CornerPolicy::Random => smallvec![self.random_corner(ex)],
            CornerPolicy::RandomOpposite => {
                let base = match self.last_random.clone() {
                    Some(base) if base.len() == n => base,
                    _ => self.random_corner(ex),
                };
                smallvec![Self::opposite(&base, &ex.nonlinear)]
            }
            CornerPolicy::Best { cutoff } => {
                if ex.nonlinear.len() > cutoff || ex.nonlinear.len() >= usize::BITS as usize {
                    return smallvec![self.random_corner(ex)];
                }
                smallvec![Self::best_corner(side, ex)]
            }
            CornerPolicy::Monotonicity => {
                let mut corner = FixedBitSet::with_capacity(n);
                for &j in &ex.nonlinear {
                    let g = ex.gradient[j];
                    let upper = match side {
                        Side::Leq if g.lb() > 0.0 => false,
                        Side::Leq if g.ub() < 0.0 => true,
                        Side::Geq if g.ub() < 0.0 => false,
                        Side::Geq if g.lb() > 0.0 => true,
                        _ => self.rng.gen_bool(0.5),
                    };
                    corner.set(j, upper);
                }
                smallvec![corner]
            }
            CornerPolicy::K4 => {
                let base = self.random_corner(ex);
                let k = ex.nonlinear.len();
                let mut out: SmallVec<[FixedBitSet; 4]> = smallvec![base.clone()];
                if k < 3 {
                    out.push(Self::opposite(&base, &ex.nonlinear));
                } else {
                    for third in 0..3 {
                        let vars = &ex.nonlinear[third * k / 3..(third + 1) * k / 3];
                        out.push(Self::opposite(&base, vars));
                    }
                }
                out
            }
        }
    }

    /// Enumerates every assignment of the nonlinear variables and keeps the
    /// one whose affine bound is tightest at the box midpoint.
    fn best_corner(side: Side, ex: &Expansion<'_>) -> FixedBitSet {
        let n = ex.bx.len();
        let k = ex.nonlinear.len();
        let mid = ex.bx.mid();
        let mut best: Option<(f64, FixedBitSet)> = None;
        for mask in 0..(1usize << k) {
            let mut corner = FixedBitSet::with_capacity(n);
            for (bit, &j) in ex.nonlinear.iter().enumerate() {
                corner.set(j, mask & (1 << bit) != 0);
            }
            let Some(xhat) = expansion_point(ex, &corner) else {
                continue;
            };
            let fx = ex.function.eval_point(&xhat);
            if fx.is_empty() {
                continue;
            }
            let mut proxy = fx.mid();
            for j in 0..n {
                if !ex.function.depends_on(j) {
                    continue;
                }
                let g = ex.gradient[j];
                let a = if side.uses_lower_slope(corner.contains(j)) {
                    g.lb()
                } else {
                    g.ub()
                };
                proxy += a * (mid[j] - xhat[j]);
            }
            let better = match &best {
                None => true,
                Some((score, _)) => match side {
                    Side::Leq => proxy > *score,
                    Side::Geq => proxy < *score,
                },
            };
            if better {
                best = Some((proxy, corner));
            }
        }
        best.map(|(_, corner)| corner)
            .unwrap_or_else(|| FixedBitSet::with_capacity(n))
    }

    /// Builds the row of `side` expanded at `corner`. Returns `None` when the
    /// row is useless (implied by the box or not computable).
    fn row_at(
        &self,
        corner: &FixedBitSet,
        side: Side,
        ex: &Expansion<'_>,
    ) -> Result<Option<LinearRow>, ContractError> {
        let n = ex.bx.len();
        let Some(xhat) = expansion_point(ex, corner) else {
            return Ok(None);
        };

        let slopes = match self.config.mode {
            LinearizationMode::Taylor => ex.gradient.clone(),
            LinearizationMode::Hansen => {
                let mut partial_box = ex.bx.clone();
                let mut slopes = Vec::with_capacity(n);
                for (j, &xj) in xhat.iter().enumerate() {
                    if ex.function.depends_on(j) {
                        slopes.push(ex.function.partial(j, &partial_box));
                    } else {
                        slopes.push(Interval::point(0.0));
                    }
                    partial_box[j] = Interval::point(xj);
                }
                IntervalBox::new(slopes)
            }
        };

        let mut coeffs = vec![0.0; n];
        let mut ev = ex.function.eval_point(&xhat);
        for j in 0..n {
            if !ex.function.depends_on(j) {
                continue;
            }
            let g = slopes[j];
            if g.is_empty() || g.is_unbounded() {
                return Ok(None);
            }
            coeffs[j] = if side.uses_lower_slope(corner.contains(j)) {
                g.lb()
            } else {
                g.ub()
            };
            ev -= Interval::point(coeffs[j]) * xhat[j];
        }
        if ev.is_empty() {
            return Ok(None);
        }

        let row = match side {
            Side::Leq => LinearRow::leq(coeffs, (-ev).ub()),
            Side::Geq => LinearRow::geq(coeffs, (-ev).lb()),
        };
        if !row.lhs.is_finite() && !row.rhs.is_finite() {
            return Ok(None);
        }
        if row.is_crossed(ex.bx) {
            return Err(ContractError::EmptyBox);
        }
        if row.is_implied(ex.bx) {
            return Ok(None);
        }
        Ok(Some(row))
    }
}

/// Returns the expansion point of `corner`, or `None` when a variable with
/// an inexact slope has no finite bound on the requested side.
fn expansion_point(ex: &Expansion<'_>, corner: &FixedBitSet) -> Option<Vec<f64>> {
    ex.bx
        .iter()
        .enumerate()
        .map(|(j, iv)| {
            let exact_slope = !ex.function.depends_on(j) || ex.gradient[j].is_degenerated();
            anchor(*iv, corner.contains(j), exact_slope)
        })
        .collect()
}

/// Picks the bound of `iv` a variable is expanded at. With an exact slope
/// any point of `iv` will do.
fn anchor(iv: Interval, upper: bool, exact_slope: bool) -> Option<f64> {
    let (preferred, other) = if upper {
        (iv.ub(), iv.lb())
    } else {
        (iv.lb(), iv.ub())
    };
    if preferred.is_finite() {
        return Some(preferred);
    }
    if !exact_slope {
        return None;
    }
    if other.is_finite() {
        Some(other)
    } else {
        Some(0.0)
    }
}

impl Linearizer for CornerLinearizer {
    fn name(&self) -> &str {
        "CornerLinearizer"
    }

    fn restart(&mut self) {
        self.reseed();
    }

    fn linearize(
        &mut self,
        function: &dyn Function,
        op: CmpOp,
        bx: &IntervalBox,
        rows: &mut RowBatch,
    ) -> Result<usize, ContractError> {
        if bx.is_empty() {
            return Err(ContractError::EmptyBox);
        }
        let image = function.eval(bx);
        let feasible = match op {
            CmpOp::Leq => Interval::new(f64::NEG_INFINITY, 0.0),
            CmpOp::Geq => Interval::new(0.0, f64::INFINITY),
            CmpOp::Eq => Interval::point(0.0),
        };
        if image.is_empty() || !image.intersects(&feasible) {
            return Err(ContractError::EmptyBox);
        }
        if image.is_subset(&feasible) {
            return Ok(0);
        }

        let gradient = function.gradient(bx);
        let mut nonlinear = SmallVec::new();
        for j in 0..bx.len() {
            if !function.depends_on(j) {
                continue;
            }
            let g = gradient[j];
            if g.is_empty() || g.is_unbounded() || g.diam() > self.config.max_diam_deriv {
                log::trace!("CornerLinearizer: derivative {j} too wide ({g}), constraint skipped");
                return Ok(0);
            }
            if g.diam() > self.config.linear_tolerance {
                nonlinear.push(j);
            }
        }
        let linear = function.is_linear() || nonlinear.is_empty();
        let ex = Expansion {
            function,
            bx,
            gradient,
            nonlinear,
        };

        let sides: &[Side] = match op {
            CmpOp::Leq => &[Side::Leq],
            CmpOp::Geq => &[Side::Geq],
            CmpOp::Eq => &[Side::Leq, Side::Geq],
        };

        let start = rows.len();
        for &side in sides {
            let mut corners: SmallVec<[FixedBitSet; 4]> = SmallVec::new();
            if linear {
                corners.push(FixedBitSet::with_capacity(bx.len()));
            } else {
                for k in 0..self.policies.len() {
                    let policy = self.policies[k];
                    for corner in self.corners(policy, side, &ex) {
                        if !corners.contains(&corner) {
                            corners.push(corner);
                        }
                    }
                }
            }
            for corner in &corners {
                if let Some(row) = self.row_at(corner, side, &ex)? {
                    rows.push(row);
                }
            }
        }
        Ok(rows.len() - start)
    }
}

impl std::fmt::Display for CornerLinearizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CornerLinearizer(mode: {}, policies: [", self.config.mode)?;
        for (i, p) in self.policies.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{p}")?;
        }
        write!(f, "])")
    }
}

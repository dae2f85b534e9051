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

//! Linear relaxation contractor
//!
//! Each round linearizes the constraints over the current box, then bounds
//! every variable with at most `2n` LP solves. LP answers are never applied
//! as such: each bound is re-derived from the returned multipliers with
//! `certify::certified_lower_bound`, and an infeasible status only counts
//! once `certify::certifies_infeasibility` accepts the returned direction.
//!
//! Round structure
//! - linearize (constraints, plus the objective row `f(x) <= goal` when a
//!   goal is set) → load LP → bound variables → measure the reduction
//! - bounds are processed closest-first with respect to the last primal
//!   point; bounds the primal point already touches are skipped
//! - rounds repeat while the largest relative reduction exceeds
//!   `ratio_fp`; the pre-contractor runs again when it exceeds `ratio_fp2`

use crate::{
    certify,
    contractor::{ContractError, Contractor},
    linearizer::{CornerLinearizer, LinearRow, Linearizer, RowBatch},
};
use enclose_core::math::{interval::Interval, interval_box::IntervalBox};
use enclose_lp::{
    clarabel::ClarabelSolver,
    solver::{LinearSolver, LpSense, LpStatus},
};
use enclose_model::{function::Function, system::CmpOp, system::System};
use fixedbitset::FixedBitSet;

/// Configuration of a `LinearRelaxationContractor`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelaxationConfig {
    /// Boxes wider than this are left alone.
    pub max_diam_box: f64,
    /// Another round runs while the relative reduction exceeds this ratio.
    pub ratio_fp: f64,
    /// The pre-contractor runs again while the reduction exceeds this ratio.
    pub ratio_fp2: f64,
    /// Hard limit on the number of rounds per call.
    pub max_rounds: usize,
    /// Distance under which the last primal point proves a bound tight.
    pub skip_tolerance: f64,
}

impl Default for RelaxationConfig {
    fn default() -> Self {
        Self {
            max_diam_box: 1e4,
            ratio_fp: 0.1,
            ratio_fp2: 0.01,
            max_rounds: 50,
            skip_tolerance: 1e-8,
        }
    }
}

impl RelaxationConfig {
    pub fn with_max_diam_box(mut self, max_diam_box: f64) -> Self {
        self.max_diam_box = max_diam_box;
        self
    }

    pub fn with_ratio_fp(mut self, ratio_fp: f64) -> Self {
        self.ratio_fp = ratio_fp;
        self
    }

    pub fn with_ratio_fp2(mut self, ratio_fp2: f64) -> Self {
        self.ratio_fp2 = ratio_fp2;
        self
    }

    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn with_skip_tolerance(mut self, skip_tolerance: f64) -> Self {
        self.skip_tolerance = skip_tolerance;
        self
    }
}

impl std::fmt::Display for RelaxationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "RelaxationConfig(max_diam_box: {}, ratio_fp: {}, ratio_fp2: {}, max_rounds: {}, skip_tolerance: {})",
            self.max_diam_box, self.ratio_fp, self.ratio_fp2, self.max_rounds, self.skip_tolerance
        )
    }
}

/// The objective shifted by the goal, `f(x) - goal`.
struct GoalFunction<'f> {
    objective: &'f dyn Function,
    goal: f64,
}

impl Function for GoalFunction<'_> {
    fn nb_var(&self) -> usize {
        self.objective.nb_var()
    }

    fn eval(&self, bx: &IntervalBox) -> Interval {
        self.objective.eval(bx) - self.goal
    }

    fn eval_point(&self, point: &[f64]) -> Interval {
        self.objective.eval_point(point) - self.goal
    }

    fn gradient(&self, bx: &IntervalBox) -> IntervalBox {
        self.objective.gradient(bx)
    }

    fn partial(&self, var: usize, bx: &IntervalBox) -> Interval {
        self.objective.partial(var, bx)
    }

    fn is_linear(&self) -> bool {
        self.objective.is_linear()
    }

    fn depends_on(&self, var: usize) -> bool {
        self.objective.depends_on(var)
    }
}

/// How a round of bound computations ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RoundOutcome {
    /// Every bound was either solved or skipped.
    Completed,
    /// The LP claimed infeasibility without a usable certificate.
    Stopped,
}

/// Which side of which variable a bound computation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BoundRef {
    var: usize,
    upper: bool,
}

impl BoundRef {
    #[inline]
    fn from_index(index: usize) -> Self {
        Self {
            var: index / 2,
            upper: index % 2 == 1,
        }
    }

    #[inline]
    fn value(self, bx: &IntervalBox) -> f64 {
        if self.upper {
            bx[self.var].ub()
        } else {
            bx[self.var].lb()
        }
    }
}

/// Returns `true` if `delta` is small with respect to `bound`: absolute
/// distance for small bounds, relative distance otherwise.
#[inline]
fn is_within(bound: f64, delta: f64, tolerance: f64) -> bool {
    if bound.abs() < 1.0 {
        delta < tolerance
    } else {
        delta / bound.abs() < tolerance
    }
}

/// Contracts boxes with certified LP bounds over linear relaxations of a
/// system.
///
/// # Examples
///
/// ```rust
/// # use enclose_core::math::interval_box::IntervalBox;
/// # use enclose_ctc::contractor::Contractor;
/// # use enclose_ctc::relaxation::LinearRelaxationContractor;
/// # use enclose_model::function::AffineFunction;
/// # use enclose_model::system::{CmpOp, SystemBuilder};
///
/// // x + y <= 1
/// let mut builder = SystemBuilder::new(2);
/// builder.add_constraint(AffineFunction::new(vec![1.0, 1.0], -1.0), CmpOp::Leq)?;
/// let system = builder.build();
///
/// let mut ctc = LinearRelaxationContractor::new(&system);
/// let mut bx = IntervalBox::from_bounds(&[(0.0, 10.0), (0.0, 10.0)]);
/// ctc.contract(&mut bx)?;
/// assert!(bx[0].ub() < 1.001 && bx[1].ub() < 1.001);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct LinearRelaxationContractor<'a, L = CornerLinearizer, S = ClarabelSolver>
where
    L: Linearizer,
    S: LinearSolver,
{
    system: &'a System,
    linearizer: L,
    solver: S,
    config: RelaxationConfig,
    use_goal: bool,
    goal: f64,
    pre_contractor: Option<Box<dyn Contractor + 'a>>,
    rows: Vec<LinearRow>,
    batch: RowBatch,
}

impl<'a> LinearRelaxationContractor<'a> {
    /// Creates a contractor with the default corner linearizer (lower and
    /// upper corners) and a Clarabel backend.
    pub fn new(system: &'a System) -> Self {
        Self::with_parts(system, CornerLinearizer::default(), ClarabelSolver::default())
    }
}

impl<'a, L, S> LinearRelaxationContractor<'a, L, S>
where
    L: Linearizer,
    S: LinearSolver,
{
    /// Creates a contractor from an explicit linearizer and LP backend.
    pub fn with_parts(system: &'a System, linearizer: L, solver: S) -> Self {
        Self {
            system,
            linearizer,
            solver,
            config: RelaxationConfig::default(),
            use_goal: false,
            goal: f64::INFINITY,
            pre_contractor: None,
            rows: Vec::new(),
            batch: RowBatch::new(),
        }
    }

    pub fn with_config(mut self, config: RelaxationConfig) -> Self {
        self.config = config;
        self
    }

    /// Adds the row `f(x) <= goal` for the objective `f` of the system. The
    /// goal is set through `Contractor::on_incumbent`.
    pub fn with_goal(mut self) -> Self {
        self.use_goal = self.system.objective().is_some();
        self
    }

    /// Runs `contractor` before the first round and between rounds that
    /// reduced the box by more than `ratio_fp2`.
    pub fn with_pre_contractor<C>(mut self, contractor: C) -> Self
    where
        C: Contractor + 'a,
    {
        self.pre_contractor = Some(Box::new(contractor));
        self
    }

    #[inline]
    pub fn config(&self) -> &RelaxationConfig {
        &self.config
    }

    /// Returns the current goal bound (`+inf` if none).
    #[inline]
    pub fn goal(&self) -> f64 {
        self.goal
    }

    /// Returns the rows of the last linearization.
    #[inline]
    pub fn rows(&self) -> &[LinearRow] {
        &self.rows
    }

    #[inline]
    pub fn solver(&self) -> &S {
        &self.solver
    }

    fn run_pre_contractor(&mut self, bx: &mut IntervalBox) -> Result<(), ContractError> {
        let Some(pre) = self.pre_contractor.as_mut() else {
            return Ok(());
        };
        match pre.contract(bx) {
            Ok(()) | Err(ContractError::Unavailable) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Collects the rows of every constraint (and of the goal) over `bx`.
    fn linearize(&mut self, bx: &IntervalBox) -> Result<(), ContractError> {
        self.rows.clear();
        for constraint in self.system.constraints() {
            self.batch.clear();
            self.linearizer
                .linearize_constraint(constraint, bx, &mut self.batch)?;
            self.rows.extend(self.batch.drain(..));
        }
        if self.use_goal
            && self.goal.is_finite()
            && let Some(objective) = self.system.objective()
        {
            let goal = GoalFunction {
                objective,
                goal: self.goal,
            };
            self.batch.clear();
            self.linearizer
                .linearize(&goal, CmpOp::Leq, bx, &mut self.batch)?;
            self.rows.extend(self.batch.drain(..));
        }
        Ok(())
    }

    fn load_lp(&mut self, bx: &IntervalBox) -> Result<(), ContractError> {
        self.solver.clear();
        for iv in bx.iter() {
            self.solver.add_column(0.0, iv.lb(), iv.ub());
        }
        for row in &self.rows {
            self.solver.add_row(row.lhs, &row.coeffs, row.rhs)?;
        }
        Ok(())
    }

    /// Picks the unprocessed bound closest to the last primal point, marking
    /// every bound the point already touches as processed.
    fn next_bound(
        &self,
        bx: &IntervalBox,
        done: &mut FixedBitSet,
        primal: Option<&[f64]>,
    ) -> Option<BoundRef> {
        let mut best: Option<(usize, f64)> = None;
        for index in 0..2 * bx.len() {
            if done.contains(index) {
                continue;
            }
            let bound = BoundRef::from_index(index);
            let value = bound.value(bx);
            let delta = match primal {
                Some(x) => (x[bound.var] - value).abs(),
                None => f64::INFINITY,
            };
            if primal.is_some() && is_within(value, delta, self.config.skip_tolerance) {
                log::trace!(
                    "LinearRelaxation: bound {} of x{} already tight",
                    if bound.upper { "ub" } else { "lb" },
                    bound.var
                );
                done.insert(index);
                continue;
            }
            if best.is_none_or(|(_, d)| delta < d) {
                best = Some((index, delta));
            }
        }
        best.map(|(index, _)| BoundRef::from_index(index))
    }

    /// Bounds every variable of `bx` over the loaded LP.
    fn optimize_bounds(&mut self, bx: &mut IntervalBox) -> Result<RoundOutcome, ContractError> {
        let n = bx.len();
        let mut done = FixedBitSet::with_capacity(2 * n);
        let mut primal: Option<Vec<f64>> = None;
        let mut objective = vec![0.0; n];

        for _ in 0..2 * n {
            let Some(bound) = self.next_bound(bx, &mut done, primal.as_deref()) else {
                break;
            };
            done.insert(2 * bound.var + usize::from(bound.upper));

            let sense = if bound.upper {
                LpSense::Maximize
            } else {
                LpSense::Minimize
            };
            self.solver.set_single_objective(bound.var, 1.0)?;
            let status = match self.solver.solve(sense) {
                Ok(status) => status,
                Err(e) => {
                    log::warn!("LinearRelaxation: LP failed on x{}: {e}", bound.var);
                    continue;
                }
            };

            match status {
                LpStatus::Optimal => {
                    if let Some(x) = self.solver.primal() {
                        primal = Some(x.to_vec());
                    }
                    let current = bx[bound.var];
                    let improves = match self.solver.objective_value() {
                        Some(v) if bound.upper => v < current.ub(),
                        Some(v) => v > current.lb(),
                        None => false,
                    };
                    if !improves {
                        continue;
                    }
                    let Some(dual) = self.solver.dual() else {
                        continue;
                    };

                    // Minimization form: min x_j, or min -x_j for the upper bound.
                    objective.fill(0.0);
                    objective[bound.var] = if bound.upper { -1.0 } else { 1.0 };
                    let certified = certify::certified_lower_bound(&self.rows, &objective, bx, dual);

                    let tightened = if bound.upper {
                        let ub = -certified;
                        if ub < current.lb() {
                            return Err(ContractError::EmptyBox);
                        }
                        (ub < current.ub()).then(|| Interval::new(current.lb(), ub))
                    } else {
                        if certified > current.ub() {
                            return Err(ContractError::EmptyBox);
                        }
                        (certified > current.lb()).then(|| Interval::new(certified, current.ub()))
                    };
                    if let Some(iv) = tightened {
                        log::trace!("LinearRelaxation: x{} {current} -> {iv}", bound.var);
                        bx[bound.var] = iv;
                        self.solver.set_column_bounds(bound.var, iv.lb(), iv.ub())?;
                    }
                }
                LpStatus::Infeasible => {
                    if let Some(direction) = self.solver.infeasibility_direction()
                        && certify::certifies_infeasibility(&self.rows, bx, direction)
                    {
                        return Err(ContractError::EmptyBox);
                    }
                    log::debug!("LinearRelaxation: uncertified LP infeasibility, round stopped");
                    return Ok(RoundOutcome::Stopped);
                }
                LpStatus::Unbounded | LpStatus::LimitReached | LpStatus::Unknown => {
                    log::trace!("LinearRelaxation: no information on x{} ({status})", bound.var);
                }
            }
        }
        Ok(RoundOutcome::Completed)
    }
}

impl<L, S> Contractor for LinearRelaxationContractor<'_, L, S>
where
    L: Linearizer,
    S: LinearSolver,
{
    fn name(&self) -> &str {
        "LinearRelaxation"
    }

    fn contract(&mut self, bx: &mut IntervalBox) -> Result<(), ContractError> {
        if bx.is_empty() {
            return Err(ContractError::EmptyBox);
        }
        if bx.max_diam() > self.config.max_diam_box {
            return Err(ContractError::Unavailable);
        }

        self.run_pre_contractor(bx)?;

        for round in 0..self.config.max_rounds {
            let before = bx.clone();
            self.linearize(bx)?;
            if self.rows.is_empty() {
                break;
            }
            self.load_lp(bx)?;
            let outcome = self.optimize_bounds(bx)?;

            let gain = bx.max_rel_reduction(&before);
            log::debug!(
                "LinearRelaxation: round {round}, {} rows, reduction {gain:.3}",
                self.rows.len()
            );
            if gain > self.config.ratio_fp2 {
                self.run_pre_contractor(bx)?;
            }
            if outcome == RoundOutcome::Stopped || gain <= self.config.ratio_fp {
                break;
            }
        }
        Ok(())
    }

    fn on_incumbent(&mut self, loup: f64) {
        if loup < self.goal {
            self.goal = loup;
        }
        if let Some(pre) = self.pre_contractor.as_mut() {
            pre.on_incumbent(loup);
        }
    }

    fn restart(&mut self) {
        self.goal = f64::INFINITY;
        self.linearizer.restart();
        if let Some(pre) = self.pre_contractor.as_mut() {
            pre.restart();
        }
    }
}

impl<L, S> std::fmt::Debug for LinearRelaxationContractor<'_, L, S>
where
    L: Linearizer,
    S: LinearSolver,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinearRelaxationContractor")
            .field("linearizer", &self.linearizer.name())
            .field("solver", &self.solver.name())
            .field("config", &self.config)
            .field("use_goal", &self.use_goal)
            .field("goal", &self.goal)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        contractor::BoxIntersection,
        linearizer::{CornerPolicy, LinearizationMode},
    };
    use approx::assert_abs_diff_eq;
    use enclose_lp::{error::LpError, solver::LpModel};
    use enclose_model::{
        function::{AffineFunction, ClosureFunction},
        system::SystemBuilder,
    };
    use rand::{Rng, SeedableRng, rngs::StdRng};

    /// x² + y - 1 <= 0
    fn parabola_system() -> System {
        let mut builder = SystemBuilder::new(2);
        builder
            .add_constraint(
                ClosureFunction::new(
                    2,
                    |b: &IntervalBox| b[0].sqr() + b[1] - 1.0,
                    |b: &IntervalBox| IntervalBox::new(vec![b[0] * 2.0, Interval::point(1.0)]),
                ),
                CmpOp::Leq,
            )
            .unwrap();
        builder.build()
    }

    /// A backend returning deliberately wrong multipliers.
    struct NoisyDuals {
        inner: ClarabelSolver,
        rng: StdRng,
        noisy: Vec<f64>,
    }

    impl LinearSolver for NoisyDuals {
        fn name(&self) -> &str {
            "NoisyDuals"
        }
        fn model(&self) -> &LpModel {
            self.inner.model()
        }
        fn model_mut(&mut self) -> &mut LpModel {
            self.inner.model_mut()
        }
        fn solve(&mut self, sense: LpSense) -> Result<LpStatus, LpError> {
            let status = self.inner.solve(sense)?;
            self.noisy = self
                .inner
                .dual()
                .unwrap_or(&[])
                .iter()
                .map(|y| y * self.rng.gen_range(0.5..1.5) + self.rng.gen_range(-0.1..0.1))
                .collect();
            Ok(status)
        }
        fn objective_value(&self) -> Option<f64> {
            // Claims every bound can be improved a lot.
            self.inner.objective_value().map(|v| v * 0.5)
        }
        fn primal(&self) -> Option<&[f64]> {
            self.inner.primal()
        }
        fn dual(&self) -> Option<&[f64]> {
            self.inner.dual().map(|_| self.noisy.as_slice())
        }
        fn infeasibility_direction(&self) -> Option<&[f64]> {
            self.inner.infeasibility_direction()
        }
    }

    /// One scripted LP answer.
    #[derive(Debug, Clone, Default)]
    struct Reply {
        status: Option<LpStatus>,
        value: Option<f64>,
        primal: Option<Vec<f64>>,
        dual: Option<Vec<f64>>,
        direction: Option<Vec<f64>>,
    }

    impl Reply {
        fn status(status: LpStatus) -> Self {
            Self {
                status: Some(status),
                ..Self::default()
            }
        }
    }

    /// A backend answering each solve from a script keyed by the optimized
    /// column and the sense. Records every solve.
    struct Scripted {
        model: LpModel,
        script: fn(usize, LpSense) -> Reply,
        reply: Reply,
        solves: Vec<(usize, LpSense)>,
    }

    impl Scripted {
        fn new(script: fn(usize, LpSense) -> Reply) -> Self {
            Self {
                model: LpModel::new(),
                script,
                reply: Reply::default(),
                solves: Vec::new(),
            }
        }
    }

    impl LinearSolver for Scripted {
        fn name(&self) -> &str {
            "Scripted"
        }
        fn model(&self) -> &LpModel {
            &self.model
        }
        fn model_mut(&mut self) -> &mut LpModel {
            &mut self.model
        }
        fn solve(&mut self, sense: LpSense) -> Result<LpStatus, LpError> {
            let column = self
                .model
                .objective()
                .iter()
                .position(|&c| c != 0.0)
                .unwrap_or(0);
            self.solves.push((column, sense));
            self.reply = (self.script)(column, sense);
            Ok(self.reply.status.unwrap_or(LpStatus::Unknown))
        }
        fn objective_value(&self) -> Option<f64> {
            self.reply.value
        }
        fn primal(&self) -> Option<&[f64]> {
            self.reply.primal.as_deref()
        }
        fn dual(&self) -> Option<&[f64]> {
            self.reply.dual.as_deref()
        }
        fn infeasibility_direction(&self) -> Option<&[f64]> {
            self.reply.direction.as_deref()
        }
    }

    /// Counts its calls and leaves the box alone.
    struct CountingContractor(std::rc::Rc<std::cell::Cell<usize>>);

    impl Contractor for CountingContractor {
        fn name(&self) -> &str {
            "Counting"
        }
        fn contract(&mut self, _bx: &mut IntervalBox) -> Result<(), ContractError> {
            self.0.set(self.0.get() + 1);
            Ok(())
        }
    }

    /// x + y <= 1
    fn budget_system() -> System {
        let mut builder = SystemBuilder::new(2);
        builder
            .add_constraint(AffineFunction::new(vec![1.0, 1.0], -1.0), CmpOp::Leq)
            .unwrap();
        builder.build()
    }

    fn scripted<'a>(
        system: &'a System,
        script: fn(usize, LpSense) -> Reply,
    ) -> LinearRelaxationContractor<'a, CornerLinearizer, Scripted> {
        LinearRelaxationContractor::with_parts(system, CornerLinearizer::default(), Scripted::new(script))
    }

    #[test]
    fn test_limit_and_unknown_statuses_leave_bounds_alone() {
        let system = budget_system();
        let mut ctc = scripted(&system, |column, _| {
            if column == 0 {
                Reply::status(LpStatus::LimitReached)
            } else {
                Reply::status(LpStatus::Unknown)
            }
        });
        let mut bx = IntervalBox::from_bounds(&[(0.0, 10.0), (0.0, 10.0)]);
        let before = bx.clone();
        ctc.contract(&mut bx).unwrap();
        assert_eq!(bx, before);
        // Every bound was still tried once, in index order.
        assert_eq!(
            ctc.solver().solves,
            vec![
                (0, LpSense::Minimize),
                (0, LpSense::Maximize),
                (1, LpSense::Minimize),
                (1, LpSense::Maximize),
            ]
        );
    }

    #[test]
    fn test_uncertified_infeasibility_stops_the_round() {
        let system = budget_system();
        // A zero direction proves nothing.
        let mut ctc = scripted(&system, |_, _| Reply {
            direction: Some(vec![0.0]),
            ..Reply::status(LpStatus::Infeasible)
        });
        let mut bx = IntervalBox::from_bounds(&[(0.0, 10.0), (0.0, 10.0)]);
        let before = bx.clone();
        assert_eq!(ctc.contract(&mut bx), Ok(()));
        assert_eq!(bx, before);
        assert_eq!(ctc.solver().solves, vec![(0, LpSense::Minimize)]);

        // Without any direction the outcome is the same.
        let mut ctc = scripted(&system, |_, _| Reply::status(LpStatus::Infeasible));
        assert_eq!(ctc.contract(&mut bx), Ok(()));
        assert_eq!(bx, before);
        assert_eq!(ctc.solver().solves.len(), 1);
    }

    #[test]
    fn test_bounds_touched_by_the_primal_point_are_skipped() {
        let system = budget_system();
        // The first answer (min x0) does not improve x0 >= 0 but its primal
        // point sits on x1 = 10 within the relative tolerance. The other
        // bounds follow closest first: x1 >= 0 is nearer than x0 <= 10.
        let mut ctc = scripted(&system, |column, sense| {
            if (column, sense) == (0, LpSense::Minimize) {
                Reply {
                    value: Some(0.0),
                    primal: Some(vec![0.0, 10.0 - 5e-8]),
                    dual: Some(vec![0.0]),
                    ..Reply::status(LpStatus::Optimal)
                }
            } else {
                Reply::status(LpStatus::Unknown)
            }
        });
        let mut bx = IntervalBox::from_bounds(&[(0.0, 10.0), (0.0, 10.0)]);
        ctc.contract(&mut bx).unwrap();
        assert_eq!(
            ctc.solver().solves,
            vec![
                (0, LpSense::Minimize),
                (1, LpSense::Minimize),
                (0, LpSense::Maximize),
            ]
        );
        assert_eq!(bx, IntervalBox::from_bounds(&[(0.0, 10.0), (0.0, 10.0)]));
    }

    /// x0 <= 9.5, with a script that finds it when maximizing x0.
    fn cap_contractor<'a>(
        system: &'a System,
        config: RelaxationConfig,
        calls: std::rc::Rc<std::cell::Cell<usize>>,
    ) -> LinearRelaxationContractor<'a, CornerLinearizer, Scripted> {
        scripted(system, |column, sense| {
            if (column, sense) == (0, LpSense::Maximize) {
                Reply {
                    value: Some(9.5),
                    primal: Some(vec![9.5, 5.0]),
                    dual: Some(vec![-1.0]),
                    ..Reply::status(LpStatus::Optimal)
                }
            } else {
                Reply::status(LpStatus::Unknown)
            }
        })
        .with_config(config)
        .with_pre_contractor(CountingContractor(calls))
    }

    #[test]
    fn test_pre_contractor_reruns_after_large_reductions() {
        let mut builder = SystemBuilder::new(2);
        builder
            .add_constraint(AffineFunction::new(vec![1.0, 0.0], -9.5), CmpOp::Leq)
            .unwrap();
        let system = builder.build();

        // A 5% reduction: above ratio_fp2 (1%), below ratio_fp (10%).
        let calls = std::rc::Rc::new(std::cell::Cell::new(0));
        let mut ctc = cap_contractor(&system, RelaxationConfig::default(), calls.clone());
        let mut bx = IntervalBox::from_bounds(&[(0.0, 10.0), (0.0, 10.0)]);
        ctc.contract(&mut bx).unwrap();
        assert_eq!(bx, IntervalBox::from_bounds(&[(0.0, 9.5), (0.0, 10.0)]));
        assert_eq!(calls.get(), 2);

        // The same reduction no longer exceeds a raised ratio_fp2.
        let calls = std::rc::Rc::new(std::cell::Cell::new(0));
        let config = RelaxationConfig::default().with_ratio_fp2(0.1);
        let mut ctc = cap_contractor(&system, config, calls.clone());
        let mut bx = IntervalBox::from_bounds(&[(0.0, 10.0), (0.0, 10.0)]);
        ctc.contract(&mut bx).unwrap();
        assert_eq!(bx[0].ub(), 9.5);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_linear_budget_is_contracted() {
        let mut builder = SystemBuilder::new(2);
        builder
            .add_constraint(AffineFunction::new(vec![1.0, 1.0], -1.0), CmpOp::Leq)
            .unwrap();
        let system = builder.build();
        let mut ctc = LinearRelaxationContractor::new(&system);
        let mut bx = IntervalBox::from_bounds(&[(0.0, 10.0), (0.0, 10.0)]);
        ctc.contract(&mut bx).unwrap();
        assert_eq!(bx[0].lb(), 0.0);
        assert!(bx[0].ub() >= 1.0);
        assert_abs_diff_eq!(bx[0].ub(), 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(bx[1].ub(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_parabola_is_contracted_soundly() {
        let system = parabola_system();
        let mut ctc = LinearRelaxationContractor::new(&system);
        let mut bx = IntervalBox::from_bounds(&[(0.0, 2.0), (0.0, 2.0)]);
        ctc.contract(&mut bx).unwrap();
        // y <= 1 from the lower corner, x <= 1.25 and below from the upper one.
        assert!(bx[1].ub() < 1.0 + 1e-6);
        assert!(bx[0].ub() < 1.25);
        assert!(bx[0].ub() >= 1.0);
        assert!(bx.contains_point(&[1.0, 0.0]));
        assert!(bx.contains_point(&[0.0, 1.0]));
    }

    #[test]
    fn test_contraction_is_idempotent_at_fixed_point() {
        let system = parabola_system();
        let config = RelaxationConfig::default().with_ratio_fp(1e-9);
        let mut ctc = LinearRelaxationContractor::new(&system).with_config(config);
        let mut bx = IntervalBox::from_bounds(&[(0.0, 2.0), (0.0, 2.0)]);
        ctc.contract(&mut bx).unwrap();
        let fixed = bx.clone();
        ctc.contract(&mut bx).unwrap();
        for j in 0..2 {
            assert_abs_diff_eq!(bx[j].lb(), fixed[j].lb(), epsilon = 1e-6);
            assert_abs_diff_eq!(bx[j].ub(), fixed[j].ub(), epsilon = 1e-6);
            assert!(bx[j].is_subset(&fixed[j]));
        }
    }

    #[test]
    fn test_infeasible_lp_proves_empty_box() {
        // x - y >= 0.5 and y - x >= 0.5: each row alone is satisfiable.
        let mut builder = SystemBuilder::new(2);
        builder
            .add_constraint(AffineFunction::new(vec![1.0, -1.0], -0.5), CmpOp::Geq)
            .unwrap()
            .add_constraint(AffineFunction::new(vec![-1.0, 1.0], -0.5), CmpOp::Geq)
            .unwrap();
        let system = builder.build();
        let mut ctc = LinearRelaxationContractor::new(&system);
        let mut bx = IntervalBox::from_bounds(&[(0.0, 1.0), (0.0, 1.0)]);
        assert_eq!(ctc.contract(&mut bx), Err(ContractError::EmptyBox));
    }

    #[test]
    fn test_huge_box_is_unavailable_and_unchanged() {
        let system = parabola_system();
        let mut ctc = LinearRelaxationContractor::new(&system);
        let mut bx = IntervalBox::from_bounds(&[(0.0, 1e5), (0.0, 2.0)]);
        let before = bx.clone();
        assert_eq!(ctc.contract(&mut bx), Err(ContractError::Unavailable));
        assert_eq!(bx, before);
    }

    #[test]
    fn test_goal_row_cuts_with_incumbent() {
        // min x + y over [0, 4]^2 with no constraint; goal x + y <= 1.
        let mut builder = SystemBuilder::new(2);
        builder
            .set_objective(AffineFunction::new(vec![1.0, 1.0], 0.0))
            .unwrap();
        let system = builder.build();
        let mut ctc = LinearRelaxationContractor::new(&system).with_goal();

        let mut bx = IntervalBox::from_bounds(&[(0.0, 4.0), (0.0, 4.0)]);
        ctc.contract(&mut bx).unwrap();
        assert_eq!(bx, IntervalBox::from_bounds(&[(0.0, 4.0), (0.0, 4.0)]));

        ctc.on_incumbent(1.0);
        ctc.on_incumbent(3.0);
        assert_eq!(ctc.goal(), 1.0);
        ctc.contract(&mut bx).unwrap();
        assert_abs_diff_eq!(bx[0].ub(), 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(bx[1].ub(), 1.0, epsilon = 1e-6);

        ctc.restart();
        assert_eq!(ctc.goal(), f64::INFINITY);
    }

    #[test]
    fn test_pre_contractor_runs_first() {
        let system = parabola_system();
        let mut ctc = LinearRelaxationContractor::new(&system).with_pre_contractor(
            BoxIntersection::new(IntervalBox::from_bounds(&[(0.5, 2.0), (0.0, 2.0)])),
        );
        let mut bx = IntervalBox::from_bounds(&[(0.0, 2.0), (0.0, 2.0)]);
        ctc.contract(&mut bx).unwrap();
        assert_eq!(bx[0].lb(), 0.5);
        // With x >= 0.5 the lower corner row is 1x + y <= 1.25.
        assert!(bx[1].ub() < 1.0);
    }

    #[test]
    fn test_noisy_duals_never_remove_solutions() {
        let system = parabola_system();
        let solver = NoisyDuals {
            inner: ClarabelSolver::default(),
            rng: StdRng::seed_from_u64(3),
            noisy: Vec::new(),
        };
        let mut ctc = LinearRelaxationContractor::with_parts(&system, CornerLinearizer::default(), solver);
        let mut bx = IntervalBox::from_bounds(&[(0.0, 2.0), (0.0, 2.0)]);
        ctc.contract(&mut bx).unwrap();
        for &(x, y) in &[(1.0, 0.0), (0.0, 1.0), (0.5, 0.75), (0.999, 0.0)] {
            assert!(bx.contains_point(&[x, y]), "({x}, {y}) removed from {bx}");
        }
    }

    #[test]
    fn test_random_feasible_points_survive() {
        let mut rng = StdRng::seed_from_u64(11);
        for trial in 0..15 {
            // A hidden point and random constraints it satisfies.
            let n = 3;
            let point: Vec<f64> = (0..n).map(|_| rng.gen_range(-1.0..1.0)).collect();
            let mut builder = SystemBuilder::new(n);
            for _ in 0..3 {
                let coeffs: Vec<f64> = (0..n).map(|_| rng.gen_range(-2.0..2.0)).collect();
                let at_point: f64 = coeffs.iter().zip(&point).map(|(a, x)| a * x).sum();
                let slack = rng.gen_range(1e-6..0.5);
                builder
                    .add_constraint(AffineFunction::new(coeffs, -(at_point + slack)), CmpOp::Leq)
                    .unwrap();
            }
            // A convex quadratic constraint the point satisfies too.
            let radius = point.iter().map(|x| x * x).sum::<f64>() + rng.gen_range(1e-6..0.5);
            builder
                .add_constraint(
                    ClosureFunction::new(
                        n,
                        move |b: &IntervalBox| {
                            b.iter().map(|x| x.sqr()).sum::<Interval>() - radius
                        },
                        |b: &IntervalBox| IntervalBox::new(b.iter().map(|x| *x * 2.0).collect()),
                    ),
                    CmpOp::Leq,
                )
                .unwrap();
            let system = builder.build();

            let linearizer = CornerLinearizer::ensemble([CornerPolicy::Random, CornerPolicy::RandomOpposite])
                .with_mode(if trial % 2 == 0 {
                    LinearizationMode::Taylor
                } else {
                    LinearizationMode::Hansen
                })
                .with_seed(trial);
            let mut ctc = LinearRelaxationContractor::with_parts(&system, linearizer, ClarabelSolver::default());
            let mut bx = IntervalBox::filled(n, Interval::new(-2.0, 2.0));
            ctc.contract(&mut bx).unwrap();
            assert!(bx.contains_point(&point), "trial {trial}: {point:?} removed from {bx}");
        }
    }
}

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

//! Incumbent search
//!
//! The upper bound `loup` only moves when a point is found whose objective
//! enclosure lies below it and whose constraint enclosures are all certainly
//! satisfied. Points come from three sources inside the current cell:
//! - the midpoint,
//! - `sample_size` uniform random points,
//! - a line probe from the best point found along the negative gradient,
//!   trying shorter steps down to `loup_tolerance` of the distance to the
//!   cell border.
//!
//! For unconstrained problems, variables along which the objective is
//! monotone over the cell are first pinned to the improving bound.

use crate::config::OptimizerConfig;
use enclose_core::math::{interval::Interval, interval_box::IntervalBox};
use enclose_model::{
    eval_box::{Evaluable, PlainBox},
    function::Function,
    system::System,
};
use rand::{Rng, SeedableRng, rngs::StdRng};

/// A feasible point and a rigorous upper bound of its objective value.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub value: f64,
    pub point: Vec<f64>,
}

/// Searches cells for feasible points that improve the incumbent.
#[derive(Debug, Clone)]
pub struct LoupFinder {
    sample_size: usize,
    loup_tolerance: f64,
    eq_tolerance: f64,
    seed: u64,
    rng: StdRng,
}

impl LoupFinder {
    pub fn new(sample_size: usize, loup_tolerance: f64, eq_tolerance: f64, seed: u64) -> Self {
        Self {
            sample_size,
            loup_tolerance,
            eq_tolerance,
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_config(config: &OptimizerConfig) -> Self {
        Self::new(
            config.sample_size,
            config.loup_tolerance,
            config.eq_tolerance,
            config.seed,
        )
    }

    /// Restores the generator to its initial seed.
    #[inline]
    pub fn reseed(&mut self) {
        self.rng = StdRng::seed_from_u64(self.seed);
    }

    /// Returns the best candidate of `bx` whose value is below `loup`.
    pub fn find(&mut self, system: &System, bx: &IntervalBox, loup: f64) -> Option<Candidate> {
        let objective = system.objective()?;
        if bx.is_empty() {
            return None;
        }
        let region = if system.nb_ctr() == 0 {
            pin_monotone(objective, bx)
        } else {
            bx.clone()
        };

        let mut best: Option<Candidate> = None;
        let mut bound = loup;

        let mid = region.mid();
        if let Some(value) = self.check(system, objective, &mid, bound) {
            bound = value;
            best = Some(Candidate { value, point: mid });
        }
        for _ in 0..self.sample_size {
            let point = self.sample(&region);
            if let Some(value) = self.check(system, objective, &point, bound) {
                bound = value;
                best = Some(Candidate { value, point });
            }
        }

        if let Some(start) = best.take() {
            best = Some(self.line_probe(system, objective, &region, start));
        }
        best
    }

    /// Returns the objective upper bound at `point` if the point is feasible
    /// and strictly better than `bound`.
    fn check(&self, system: &System, objective: &dyn Function, point: &[f64], bound: f64) -> Option<f64> {
        let value = objective.eval_point(point);
        if value.is_empty() || !(value.ub() < bound) {
            return None;
        }
        if system.nb_ctr() > 0
            && !PlainBox::point(point).is_certainly_feasible(system, self.eq_tolerance)
        {
            return None;
        }
        Some(value.ub())
    }

    fn sample(&mut self, region: &IntervalBox) -> Vec<f64> {
        region
            .iter()
            .map(|iv| {
                let (lb, ub) = (iv.lb(), iv.ub());
                if lb < ub && (ub - lb).is_finite() {
                    self.rng.gen_range(lb..=ub)
                } else {
                    iv.mid()
                }
            })
            .collect()
    }

    /// Moves from `start` along the negative gradient, keeping the first
    /// improving step.
    fn line_probe(
        &self,
        system: &System,
        objective: &dyn Function,
        region: &IntervalBox,
        start: Candidate,
    ) -> Candidate {
        let gradient = objective.gradient(&IntervalBox::point(&start.point));
        if gradient.is_empty() || gradient.iter().any(Interval::is_unbounded) {
            return start;
        }
        let direction: Vec<f64> = gradient.iter().map(|g| -g.mid()).collect();

        let mut t_max = f64::INFINITY;
        for ((&d, &x), iv) in direction.iter().zip(&start.point).zip(region.iter()) {
            if d > 0.0 {
                t_max = t_max.min((iv.ub() - x) / d);
            } else if d < 0.0 {
                t_max = t_max.min((iv.lb() - x) / d);
            }
        }
        if !t_max.is_finite() || t_max <= 0.0 {
            return start;
        }

        let mut factor = 1.0;
        while factor >= self.loup_tolerance {
            let step = factor * t_max;
            let point: Vec<f64> = start
                .point
                .iter()
                .zip(&direction)
                .zip(region.iter())
                .map(|((&x, &d), iv)| (x + step * d).clamp(iv.lb(), iv.ub()))
                .collect();
            if let Some(value) = self.check(system, objective, &point, start.value) {
                return Candidate { value, point };
            }
            factor *= 0.5;
        }
        start
    }
}

/// Pins every variable along which `objective` is monotone over `bx` to the
/// bound where it is smallest.
fn pin_monotone(objective: &dyn Function, bx: &IntervalBox) -> IntervalBox {
    let gradient = objective.gradient(bx);
    let mut region = bx.clone();
    if gradient.is_empty() {
        return region;
    }
    for (iv, g) in region.iter_mut().zip(gradient.iter()) {
        if g.lb() >= 0.0 && iv.lb().is_finite() {
            *iv = Interval::point(iv.lb());
        } else if g.ub() <= 0.0 && iv.ub().is_finite() {
            *iv = Interval::point(iv.ub());
        }
    }
    region
}

#[cfg(test)]
mod tests {
    use super::*;
    use enclose_model::{
        function::{AffineFunction, ClosureFunction},
        system::{CmpOp, SystemBuilder},
    };

    fn shifted_square(shift: f64) -> ClosureFunction {
        ClosureFunction::new(
            1,
            move |b: &IntervalBox| (b[0] - shift).sqr(),
            move |b: &IntervalBox| IntervalBox::new(vec![(b[0] - shift) * 2.0]),
        )
    }

    #[test]
    fn test_midpoint_of_symmetric_box_is_exact() {
        let mut builder = SystemBuilder::new(1);
        builder.set_objective(shifted_square(0.0)).unwrap();
        let system = builder.build();
        let mut finder = LoupFinder::new(10, 0.1, 1e-8, 1);

        let found = finder
            .find(&system, &IntervalBox::from_bounds(&[(-10.0, 10.0)]), f64::INFINITY)
            .unwrap();
        assert_eq!(found.value, 0.0);
        assert_eq!(found.point, vec![0.0]);
        assert!(finder.find(&system, &IntervalBox::from_bounds(&[(-10.0, 10.0)]), 0.0).is_none());
    }

    #[test]
    fn test_monotone_variable_is_pinned() {
        // f(x) = (x - 5)² on [1, 2] is decreasing; the best point is x = 2.
        let mut builder = SystemBuilder::new(1);
        builder.set_objective(shifted_square(5.0)).unwrap();
        let system = builder.build();
        let mut finder = LoupFinder::new(3, 0.1, 1e-8, 1);

        let found = finder
            .find(&system, &IntervalBox::from_bounds(&[(1.0, 2.0)]), f64::INFINITY)
            .unwrap();
        assert_eq!(found.point, vec![2.0]);
        assert_eq!(found.value, 9.0);
    }

    #[test]
    fn test_only_feasible_points_are_accepted() {
        // min x s.t. x >= 1.5, over [0, 2]
        let mut builder = SystemBuilder::new(1);
        builder
            .set_objective(AffineFunction::variable(1, 0))
            .unwrap()
            .add_constraint(AffineFunction::new(vec![1.0], -1.5), CmpOp::Geq)
            .unwrap();
        let system = builder.build();
        let mut finder = LoupFinder::new(50, 0.1, 1e-8, 3);

        let found = finder
            .find(&system, &IntervalBox::from_bounds(&[(0.0, 2.0)]), f64::INFINITY)
            .unwrap();
        assert!(found.point[0] >= 1.5);
        assert!(found.value >= 1.5 && found.value <= 2.0);

        assert!(finder
            .find(&system, &IntervalBox::from_bounds(&[(0.0, 1.0)]), f64::INFINITY)
            .is_none());
    }

    #[test]
    fn test_line_probe_improves_on_samples() {
        // f(x, y) = x + y over [0, 1]² with a slack constraint: nothing is
        // pinned, so the corner comes from the line probe.
        let mut builder = SystemBuilder::new(2);
        builder
            .set_objective(AffineFunction::new(vec![1.0, 1.0], 0.0))
            .unwrap()
            .add_constraint(AffineFunction::new(vec![1.0, 1.0], -10.0), CmpOp::Leq)
            .unwrap();
        let system = builder.build();
        let mut finder = LoupFinder::new(0, 0.1, 1e-8, 1);

        let found = finder
            .find(
                &system,
                &IntervalBox::from_bounds(&[(0.0, 1.0), (0.0, 1.0)]),
                f64::INFINITY,
            )
            .unwrap();
        // From the midpoint (0.5, 0.5) the full step reaches the corner.
        assert_eq!(found.point, vec![0.0, 0.0]);
        assert_eq!(found.value, 0.0);
    }

    #[test]
    fn test_reseed_replays_samples() {
        let mut builder = SystemBuilder::new(1);
        builder
            .set_objective(AffineFunction::variable(1, 0))
            .unwrap()
            .add_constraint(AffineFunction::new(vec![1.0], -0.5), CmpOp::Geq)
            .unwrap();
        let system = builder.build();
        let bx = IntervalBox::from_bounds(&[(0.0, 1.0)]);
        let mut finder = LoupFinder::new(5, 0.1, 1e-8, 42);

        let first = finder.find(&system, &bx, f64::INFINITY);
        finder.reseed();
        let second = finder.find(&system, &bx, f64::INFINITY);
        assert_eq!(first, second);
    }
}

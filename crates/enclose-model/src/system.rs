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

//! Constraint systems.
//!
//! A `System` is an optional objective `f` (to be minimized) and a list of
//! constraints `g_i(x) op 0` over a fixed number of variables. Systems are
//! immutable once built; use `SystemBuilder` to assemble them.

use crate::{error::ModelError, function::Function};
use enclose_core::math::{interval::Interval, interval_box::IntervalBox};

/// The comparison of a constraint `f(x) op 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CmpOp {
    /// `f(x) <= 0`.
    Leq,
    /// `f(x) >= 0`.
    Geq,
    /// `f(x) = 0`.
    Eq,
}

impl std::fmt::Display for CmpOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CmpOp::Leq => write!(f, "<="),
            CmpOp::Geq => write!(f, ">="),
            CmpOp::Eq => write!(f, "="),
        }
    }
}

/// A constraint `f(x) op 0`.
pub struct Constraint {
    function: Box<dyn Function>,
    op: CmpOp,
}

impl Constraint {
    /// Creates the constraint `function(x) op 0`.
    pub fn new<F>(function: F, op: CmpOp) -> Self
    where
        F: Function + 'static,
    {
        Self {
            function: Box::new(function),
            op,
        }
    }

    #[inline(always)]
    pub fn function(&self) -> &dyn Function {
        self.function.as_ref()
    }

    #[inline(always)]
    pub fn op(&self) -> CmpOp {
        self.op
    }

    #[inline(always)]
    pub fn is_linear(&self) -> bool {
        self.function.is_linear()
    }

    /// Returns the set of values of `f` that satisfy the constraint, with
    /// equalities relaxed to `|f| <= eps_eq`.
    #[inline]
    pub fn feasible_image(&self, eps_eq: f64) -> Interval {
        match self.op {
            CmpOp::Leq => Interval::new(f64::NEG_INFINITY, 0.0),
            CmpOp::Geq => Interval::new(0.0, f64::INFINITY),
            CmpOp::Eq => Interval::new(-eps_eq, eps_eq),
        }
    }

    /// Returns `true` if every value in `image` satisfies the constraint
    /// (equalities relaxed by `eps_eq`).
    #[inline]
    pub fn is_certainly_satisfied(&self, image: Interval, eps_eq: f64) -> bool {
        !image.is_empty() && image.is_subset(&self.feasible_image(eps_eq))
    }

    /// Returns `true` if no value in `image` satisfies the exact constraint.
    #[inline]
    pub fn is_certainly_violated(&self, image: Interval) -> bool {
        image.is_empty() || !image.intersects(&self.feasible_image(0.0))
    }
}

impl std::fmt::Debug for Constraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Constraint(nb_var: {}, linear: {}, f(x) {} 0)",
            self.function.nb_var(),
            self.function.is_linear(),
            self.op
        )
    }
}

/// A minimization problem (or a pure constraint system when no objective is
/// set) over `nb_var()` real variables.
pub struct System {
    nb_var: usize,
    objective: Option<Box<dyn Function>>,
    constraints: Vec<Constraint>,
}

impl System {
    #[inline(always)]
    pub fn nb_var(&self) -> usize {
        self.nb_var
    }

    #[inline(always)]
    pub fn nb_ctr(&self) -> usize {
        self.constraints.len()
    }

    #[inline(always)]
    pub fn objective(&self) -> Option<&dyn Function> {
        self.objective.as_deref()
    }

    #[inline(always)]
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    #[inline(always)]
    pub fn constraint(&self, index: usize) -> &Constraint {
        &self.constraints[index]
    }

    /// Returns one enclosure per constraint function over `bx`.
    pub fn eval_constraints(&self, bx: &IntervalBox) -> IntervalBox {
        IntervalBox::new(
            self.constraints
                .iter()
                .map(|c| c.function().eval(bx))
                .collect(),
        )
    }

    /// Returns an enclosure of the objective over `bx`, or the whole line when
    /// the system has no objective.
    pub fn eval_objective(&self, bx: &IntervalBox) -> Interval {
        match &self.objective {
            Some(f) => f.eval(bx),
            None if bx.is_empty() => Interval::EMPTY,
            None => Interval::ENTIRE,
        }
    }

    /// Checks that `bx` has the dimension of the system.
    pub fn check_domain(&self, bx: &IntervalBox) -> Result<(), ModelError> {
        if bx.len() != self.nb_var {
            return Err(ModelError::DomainMismatch {
                expected: self.nb_var,
                found: bx.len(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for System {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("System")
            .field("nb_var", &self.nb_var)
            .field("has_objective", &self.objective.is_some())
            .field("constraints", &self.constraints)
            .finish()
    }
}

impl std::fmt::Display for System {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "System(nb_var: {}, nb_ctr: {}, objective: {})",
            self.nb_var,
            self.constraints.len(),
            if self.objective.is_some() { "yes" } else { "no" }
        )
    }
}

/// Builder for `System`. Every function is checked against the number of
/// variables when it is added.
///
/// # Examples
///
/// ```rust
/// # use enclose_model::function::AffineFunction;
/// # use enclose_model::system::{CmpOp, SystemBuilder};
///
/// let mut builder = SystemBuilder::new(2);
/// builder
///     .set_objective(AffineFunction::new(vec![1.0, 1.0], 0.0))?
///     .add_constraint(AffineFunction::new(vec![1.0, -1.0], 0.0), CmpOp::Leq)?;
/// let system = builder.build();
/// assert_eq!(system.nb_var(), 2);
/// assert_eq!(system.nb_ctr(), 1);
/// # Ok::<(), enclose_model::error::ModelError>(())
/// ```
pub struct SystemBuilder {
    nb_var: usize,
    objective: Option<Box<dyn Function>>,
    constraints: Vec<Constraint>,
}

impl SystemBuilder {
    /// Creates a builder for a system over `nb_var` variables without objective
    /// or constraints.
    pub fn new(nb_var: usize) -> Self {
        Self {
            nb_var,
            objective: None,
            constraints: Vec::new(),
        }
    }

    #[inline(always)]
    pub fn nb_var(&self) -> usize {
        self.nb_var
    }

    fn check(&self, function: &dyn Function) -> Result<(), ModelError> {
        if function.nb_var() != self.nb_var {
            return Err(ModelError::DimensionMismatch {
                expected: self.nb_var,
                found: function.nb_var(),
            });
        }
        Ok(())
    }

    /// Sets the objective to minimize.
    pub fn set_objective<F>(&mut self, objective: F) -> Result<&mut Self, ModelError>
    where
        F: Function + 'static,
    {
        self.check(&objective)?;
        self.objective = Some(Box::new(objective));
        Ok(self)
    }

    /// Adds the constraint `function(x) op 0`.
    pub fn add_constraint<F>(&mut self, function: F, op: CmpOp) -> Result<&mut Self, ModelError>
    where
        F: Function + 'static,
    {
        self.check(&function)?;
        self.constraints.push(Constraint::new(function, op));
        Ok(self)
    }

    pub fn build(self) -> System {
        System {
            nb_var: self.nb_var,
            objective: self.objective,
            constraints: self.constraints,
        }
    }
}

impl std::fmt::Display for SystemBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SystemBuilder(nb_var: {}, nb_ctr: {})",
            self.nb_var,
            self.constraints.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::{AffineFunction, ClosureFunction};

    fn circle() -> ClosureFunction {
        // x² + y² - 1
        ClosureFunction::new(
            2,
            |b: &IntervalBox| b[0].sqr() + b[1].sqr() - 1.0,
            |b: &IntervalBox| IntervalBox::new(vec![b[0] * 2.0, b[1] * 2.0]),
        )
    }

    #[test]
    fn test_builder_rejects_dimension_mismatch() {
        let mut builder = SystemBuilder::new(2);
        let err = builder
            .add_constraint(AffineFunction::new(vec![1.0], 0.0), CmpOp::Leq)
            .err();
        assert_eq!(
            err,
            Some(ModelError::DimensionMismatch {
                expected: 2,
                found: 1
            })
        );
        assert!(builder.set_objective(AffineFunction::variable(3, 0)).is_err());
    }

    #[test]
    fn test_eval_constraints_and_objective() {
        let mut builder = SystemBuilder::new(2);
        builder
            .set_objective(AffineFunction::variable(2, 0))
            .unwrap()
            .add_constraint(circle(), CmpOp::Leq)
            .unwrap();
        let system = builder.build();

        let b = IntervalBox::from_bounds(&[(0.0, 1.0), (0.0, 1.0)]);
        let images = system.eval_constraints(&b);
        assert_eq!(images.len(), 1);
        assert_eq!(images[0], Interval::new(-1.0, 1.0));
        assert_eq!(system.eval_objective(&b), Interval::new(0.0, 1.0));
    }

    #[test]
    fn test_system_without_objective_evaluates_to_entire() {
        let system = SystemBuilder::new(1).build();
        let b = IntervalBox::from_bounds(&[(0.0, 1.0)]);
        assert_eq!(system.eval_objective(&b), Interval::ENTIRE);
        assert!(system.objective().is_none());
    }

    #[test]
    fn test_satisfaction_predicates() {
        let leq = Constraint::new(circle(), CmpOp::Leq);
        assert!(leq.is_certainly_satisfied(Interval::new(-2.0, -1.0), 0.0));
        assert!(!leq.is_certainly_satisfied(Interval::new(-1.0, 1.0), 0.0));
        assert!(leq.is_certainly_violated(Interval::new(0.5, 1.0)));

        let eq = Constraint::new(circle(), CmpOp::Eq);
        assert!(eq.is_certainly_satisfied(Interval::new(-1e-9, 1e-9), 1e-8));
        assert!(!eq.is_certainly_satisfied(Interval::new(-1e-9, 1e-9), 0.0));
        assert!(eq.is_certainly_violated(Interval::new(1.0, 2.0)));
        assert!(!eq.is_certainly_violated(Interval::new(-1.0, 2.0)));
    }

    #[test]
    fn test_check_domain() {
        let system = SystemBuilder::new(2).build();
        assert!(system.check_domain(&IntervalBox::entire(2)).is_ok());
        assert_eq!(
            system.check_domain(&IntervalBox::entire(3)),
            Err(ModelError::DomainMismatch {
                expected: 2,
                found: 3
            })
        );
    }
}

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

//! Contractor interface
//!
//! A contractor narrows a box without removing any solution it contains.
//! Failing to contract is never an error in itself: a contractor that cannot
//! do anything useful leaves the box untouched and returns `Ok(())` or
//! `Err(ContractError::Unavailable)`.
//!
//! Outcomes
//! - `Ok(())`: the box may have shrunk; every solution is still inside.
//! - `Err(EmptyBox)`: the box provably contains no solution. The box is left
//!   in an unspecified state and must be discarded.
//! - `Err(Unavailable)`: no information was gained; the box is unchanged.
//! - `Err(Lp(_))`: the LP could not be assembled (dimension or index errors,
//!   backend setup failure). This is a genuine error and propagates.

use enclose_core::math::interval_box::IntervalBox;
use enclose_lp::error::LpError;
use enclose_model::{
    eval_box::{Evaluable, PlainBox},
    system::System,
};

/// Errors raised by contractors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ContractError {
    /// The box contains no solution.
    #[error("the box contains no solution")]
    EmptyBox,
    /// The contractor could not be applied to this box.
    #[error("the contractor is unavailable on this box")]
    Unavailable,
    /// The LP backend failed.
    #[error(transparent)]
    Lp(#[from] LpError),
}

impl ContractError {
    /// Returns `true` if the error proves the box empty.
    #[inline]
    pub fn is_empty_box(&self) -> bool {
        matches!(self, ContractError::EmptyBox)
    }
}

/// An operator that narrows boxes without removing solutions.
pub trait Contractor {
    /// Returns the name of the contractor.
    fn name(&self) -> &str;

    /// Contracts `bx` in place.
    fn contract(&mut self, bx: &mut IntervalBox) -> Result<(), ContractError>;

    /// Called by the optimizer when the best known objective value improves.
    /// Contractors that cut with the objective use it as their goal bound.
    fn on_incumbent(&mut self, _loup: f64) {}

    /// Called when the search restarts: forget every incumbent and reset
    /// internal random state.
    fn restart(&mut self) {}
}

impl std::fmt::Debug for dyn Contractor + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Contractor({})", self.name())
    }
}

impl std::fmt::Display for dyn Contractor + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Contractor({})", self.name())
    }
}

impl<C> Contractor for Box<C>
where
    C: Contractor + ?Sized,
{
    fn name(&self) -> &str {
        (**self).name()
    }

    fn contract(&mut self, bx: &mut IntervalBox) -> Result<(), ContractError> {
        (**self).contract(bx)
    }

    fn on_incumbent(&mut self, loup: f64) {
        (**self).on_incumbent(loup)
    }

    fn restart(&mut self) {
        (**self).restart()
    }
}

/// Intersects the box with a fixed measurement box.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxIntersection {
    measurement: IntervalBox,
}

impl BoxIntersection {
    #[inline]
    pub fn new(measurement: IntervalBox) -> Self {
        Self { measurement }
    }

    #[inline]
    pub fn measurement(&self) -> &IntervalBox {
        &self.measurement
    }
}

impl Contractor for BoxIntersection {
    fn name(&self) -> &str {
        "BoxIntersection"
    }

    fn contract(&mut self, bx: &mut IntervalBox) -> Result<(), ContractError> {
        debug_assert_eq!(
            bx.len(),
            self.measurement.len(),
            "called `BoxIntersection::contract` with a box of dimension {} on a measurement of dimension {}",
            bx.len(),
            self.measurement.len()
        );
        bx.intersect_with(&self.measurement);
        if bx.is_empty() {
            return Err(ContractError::EmptyBox);
        }
        Ok(())
    }
}

/// Proves emptiness when some constraint of a system is violated over the
/// whole box. Never shrinks a box.
#[derive(Debug, Clone, Copy)]
pub struct ConstraintCheck<'a> {
    system: &'a System,
}

impl<'a> ConstraintCheck<'a> {
    #[inline]
    pub fn new(system: &'a System) -> Self {
        Self { system }
    }
}

impl Contractor for ConstraintCheck<'_> {
    fn name(&self) -> &str {
        "ConstraintCheck"
    }

    fn contract(&mut self, bx: &mut IntervalBox) -> Result<(), ContractError> {
        let mut probe = PlainBox::new(bx.clone());
        if probe.is_certainly_infeasible(self.system) {
            return Err(ContractError::EmptyBox);
        }
        Ok(())
    }
}

/// Applies a list of contractors in sequence. Unavailable members are
/// skipped; the first other error stops the sequence.
#[derive(Default)]
pub struct Sequence<'a> {
    contractors: Vec<Box<dyn Contractor + 'a>>,
}

impl<'a> Sequence<'a> {
    #[inline]
    pub fn new() -> Self {
        Self {
            contractors: Vec::new(),
        }
    }

    pub fn with<C>(mut self, contractor: C) -> Self
    where
        C: Contractor + 'a,
    {
        self.contractors.push(Box::new(contractor));
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.contractors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.contractors.is_empty()
    }
}

impl Contractor for Sequence<'_> {
    fn name(&self) -> &str {
        "Sequence"
    }

    fn contract(&mut self, bx: &mut IntervalBox) -> Result<(), ContractError> {
        for contractor in self.contractors.iter_mut() {
            match contractor.contract(bx) {
                Ok(()) | Err(ContractError::Unavailable) => {}
                Err(e) => {
                    log::trace!("{} stopped the sequence: {e}", contractor.name());
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    fn on_incumbent(&mut self, loup: f64) {
        for contractor in self.contractors.iter_mut() {
            contractor.on_incumbent(loup);
        }
    }

    fn restart(&mut self) {
        for contractor in self.contractors.iter_mut() {
            contractor.restart();
        }
    }
}

impl std::fmt::Debug for Sequence<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.contractors.iter().map(|c| c.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use enclose_core::math::interval::Interval;
    use enclose_model::{
        function::AffineFunction,
        system::{CmpOp, SystemBuilder},
    };

    #[test]
    fn test_box_intersection() {
        let mut ctc = BoxIntersection::new(IntervalBox::from_bounds(&[(0.0, 2.0), (1.0, 3.0)]));
        let mut bx = IntervalBox::from_bounds(&[(1.0, 5.0), (-1.0, 2.0)]);
        ctc.contract(&mut bx).unwrap();
        assert_eq!(bx, IntervalBox::from_bounds(&[(1.0, 2.0), (1.0, 2.0)]));

        let mut far = IntervalBox::from_bounds(&[(4.0, 5.0), (1.0, 2.0)]);
        assert_eq!(ctc.contract(&mut far), Err(ContractError::EmptyBox));
    }

    #[test]
    fn test_constraint_check_detects_violation() {
        // x - 1 >= 0
        let mut builder = SystemBuilder::new(1);
        builder
            .add_constraint(AffineFunction::new(vec![1.0], -1.0), CmpOp::Geq)
            .unwrap();
        let system = builder.build();
        let mut ctc = ConstraintCheck::new(&system);

        let mut straddling = IntervalBox::from_bounds(&[(0.0, 2.0)]);
        assert_eq!(ctc.contract(&mut straddling), Ok(()));
        assert_eq!(straddling[0], Interval::new(0.0, 2.0));

        let mut below = IntervalBox::from_bounds(&[(-1.0, 0.5)]);
        assert!(ctc.contract(&mut below).unwrap_err().is_empty_box());
    }

    #[test]
    fn test_sequence_stops_on_empty_box() {
        let mut seq = Sequence::new()
            .with(BoxIntersection::new(IntervalBox::from_bounds(&[(0.0, 1.0)])))
            .with(BoxIntersection::new(IntervalBox::from_bounds(&[(2.0, 3.0)])));
        assert_eq!(seq.len(), 2);
        let mut bx = IntervalBox::from_bounds(&[(-5.0, 5.0)]);
        assert_eq!(seq.contract(&mut bx), Err(ContractError::EmptyBox));
    }
}

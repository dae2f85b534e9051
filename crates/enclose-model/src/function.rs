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

//! Function evaluators.
//!
//! A `Function` maps a box of `nb_var()` variables to an interval enclosing
//! the range of a real function over that box, and does the same for its
//! partial derivatives. The solver never looks inside a function; symbolic
//! processing is the business of whoever implements the trait.

use enclose_core::math::{interval::Interval, interval_box::IntervalBox};

/// A real function of `nb_var()` variables with sound interval extensions.
pub trait Function {
    /// Returns the number of variables the function is defined over.
    fn nb_var(&self) -> usize;

    /// Returns an enclosure of the range of the function over `bx`.
    fn eval(&self, bx: &IntervalBox) -> Interval;

    /// Returns an enclosure of the function value at `point`.
    fn eval_point(&self, point: &[f64]) -> Interval {
        self.eval(&IntervalBox::point(point))
    }

    /// Returns one enclosure per variable of the partial derivatives over `bx`.
    fn gradient(&self, bx: &IntervalBox) -> IntervalBox;

    /// Returns an enclosure of the partial derivative with respect to `var`
    /// over `bx`.
    fn partial(&self, var: usize, bx: &IntervalBox) -> Interval {
        self.gradient(bx)[var]
    }

    /// Returns `true` if the function is affine.
    fn is_linear(&self) -> bool {
        false
    }

    /// Returns `false` if the function is known not to depend on `var`.
    fn depends_on(&self, _var: usize) -> bool {
        true
    }
}

impl<F> Function for Box<F>
where
    F: Function + ?Sized,
{
    fn nb_var(&self) -> usize {
        (**self).nb_var()
    }
    fn eval(&self, bx: &IntervalBox) -> Interval {
        (**self).eval(bx)
    }
    fn eval_point(&self, point: &[f64]) -> Interval {
        (**self).eval_point(point)
    }
    fn gradient(&self, bx: &IntervalBox) -> IntervalBox {
        (**self).gradient(bx)
    }
    fn partial(&self, var: usize, bx: &IntervalBox) -> Interval {
        (**self).partial(var, bx)
    }
    fn is_linear(&self) -> bool {
        (**self).is_linear()
    }
    fn depends_on(&self, var: usize) -> bool {
        (**self).depends_on(var)
    }
}

/// The affine function `Σ coeffs[j] * x[j] + constant`.
///
/// # Examples
///
/// ```rust
/// # use enclose_core::math::interval_box::IntervalBox;
/// # use enclose_model::function::{AffineFunction, Function};
///
/// let f = AffineFunction::new(vec![1.0, -2.0], 3.0);
/// let range = f.eval(&IntervalBox::from_bounds(&[(0.0, 1.0), (0.0, 1.0)]));
/// assert_eq!(range.lb(), 1.0);
/// assert_eq!(range.ub(), 4.0);
/// assert!(f.is_linear());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AffineFunction {
    coeffs: Vec<f64>,
    constant: f64,
}

impl AffineFunction {
    /// Creates the affine function with the given coefficients and constant.
    ///
    /// # Panics
    ///
    /// Panics if a coefficient or the constant is not finite.
    pub fn new(coeffs: Vec<f64>, constant: f64) -> Self {
        assert!(
            constant.is_finite() && coeffs.iter().all(|c| c.is_finite()),
            "called `AffineFunction::new` with non-finite coefficients"
        );
        Self { coeffs, constant }
    }

    /// Creates the projection `x[var]` in a space of `nb_var` variables.
    pub fn variable(nb_var: usize, var: usize) -> Self {
        let mut coeffs = vec![0.0; nb_var];
        coeffs[var] = 1.0;
        Self::new(coeffs, 0.0)
    }

    #[inline]
    pub fn coeffs(&self) -> &[f64] {
        &self.coeffs
    }

    #[inline]
    pub fn constant(&self) -> f64 {
        self.constant
    }
}

impl Function for AffineFunction {
    fn nb_var(&self) -> usize {
        self.coeffs.len()
    }

    fn eval(&self, bx: &IntervalBox) -> Interval {
        if bx.is_empty() {
            return Interval::EMPTY;
        }
        bx.dot(&self.coeffs) + self.constant
    }

    fn gradient(&self, _bx: &IntervalBox) -> IntervalBox {
        IntervalBox::point(&self.coeffs)
    }

    fn partial(&self, var: usize, _bx: &IntervalBox) -> Interval {
        Interval::point(self.coeffs[var])
    }

    fn is_linear(&self) -> bool {
        true
    }

    fn depends_on(&self, var: usize) -> bool {
        self.coeffs[var] != 0.0
    }
}

type EvalFn = dyn Fn(&IntervalBox) -> Interval;
type GradientFn = dyn Fn(&IntervalBox) -> IntervalBox;

/// A function assembled from closures computing its interval extension and
/// the interval extension of its gradient.
///
/// The closures are trusted to be sound.
///
/// # Examples
///
/// ```rust
/// # use enclose_core::math::interval_box::IntervalBox;
/// # use enclose_model::function::{ClosureFunction, Function};
///
/// // f(x) = x²
/// let f = ClosureFunction::new(
///     1,
///     |b: &IntervalBox| b[0].sqr(),
///     |b: &IntervalBox| IntervalBox::new(vec![b[0] * 2.0]),
/// );
/// let range = f.eval(&IntervalBox::from_bounds(&[(-1.0, 2.0)]));
/// assert_eq!(range.lb(), 0.0);
/// assert!(range.ub() >= 4.0);
/// ```
pub struct ClosureFunction {
    nb_var: usize,
    eval: Box<EvalFn>,
    gradient: Box<GradientFn>,
    linear: bool,
    support: Option<Vec<bool>>,
}

impl ClosureFunction {
    /// Creates a function over `nb_var` variables from its evaluation and
    /// gradient closures.
    pub fn new<E, G>(nb_var: usize, eval: E, gradient: G) -> Self
    where
        E: Fn(&IntervalBox) -> Interval + 'static,
        G: Fn(&IntervalBox) -> IntervalBox + 'static,
    {
        Self {
            nb_var,
            eval: Box::new(eval),
            gradient: Box::new(gradient),
            linear: false,
            support: None,
        }
    }

    /// Declares the function affine.
    pub fn with_linear(mut self, linear: bool) -> Self {
        self.linear = linear;
        self
    }

    /// Declares the variables the function depends on. Variables outside the
    /// support are skipped by linearizations.
    ///
    /// # Panics
    ///
    /// Panics if a variable index is out of bounds.
    pub fn with_support(mut self, vars: &[usize]) -> Self {
        let mut support = vec![false; self.nb_var];
        for &v in vars {
            assert!(
                v < self.nb_var,
                "called `ClosureFunction::with_support` with variable {v} out of bounds for {} variables",
                self.nb_var
            );
            support[v] = true;
        }
        self.support = Some(support);
        self
    }
}

impl Function for ClosureFunction {
    fn nb_var(&self) -> usize {
        self.nb_var
    }

    fn eval(&self, bx: &IntervalBox) -> Interval {
        if bx.is_empty() {
            return Interval::EMPTY;
        }
        (self.eval)(bx)
    }

    fn gradient(&self, bx: &IntervalBox) -> IntervalBox {
        if bx.is_empty() {
            return IntervalBox::empty(self.nb_var);
        }
        (self.gradient)(bx)
    }

    fn is_linear(&self) -> bool {
        self.linear
    }

    fn depends_on(&self, var: usize) -> bool {
        self.support.as_ref().is_none_or(|s| s[var])
    }
}

impl std::fmt::Debug for ClosureFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClosureFunction")
            .field("nb_var", &self.nb_var)
            .field("linear", &self.linear)
            .field("support", &self.support)
            .finish()
    }
}

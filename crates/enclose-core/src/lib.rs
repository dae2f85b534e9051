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

//! # Enclose Core
//!
//! Numeric primitives for rigorous global optimization. Everything in the
//! solver stack is expressed in terms of two value types defined here:
//!
//! - `math::interval::Interval`: a closed interval of `f64` with a canonical
//!   empty value. Every arithmetic operation rounds outward so that the
//!   result encloses the exact real result.
//! - `math::interval_box::IntervalBox`: a fixed-dimension vector of intervals,
//!   the domain representation used by contractors and the search.
//!
//! Rounding is performed by stepping computed bounds to the adjacent float
//! (`f64::next_down` / `f64::next_up`), which keeps the crate free of any
//! global rounding-mode state.

pub mod math;

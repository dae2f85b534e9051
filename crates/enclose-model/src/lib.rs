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

//! # Enclose Model
//!
//! The problem description consumed by contractors and the optimizer.
//!
//! ## Architecture
//!
//! * **`function`**: the `Function` evaluator trait (sound interval
//!   evaluation, gradient, partial derivatives) plus two ready-made
//!   implementations, `AffineFunction` and `ClosureFunction`.
//! * **`system`**: `Constraint`s of the form `f(x) op 0`, the `System` that
//!   groups them with an optional objective, and its `SystemBuilder`.
//! * **`eval_box`**: the `Evaluable` trait for boxes that can be evaluated
//!   against a system, with a plain and a caching implementation.
//! * **`error`**: `ModelError`.
//!
//! ## Soundness contract
//!
//! Every `Function` must return outer enclosures: for all `x` in the input
//! box, the exact value (or derivative) at `x` lies in the returned interval.
//! The whole solver stack relies on this without re-checking it.

pub mod error;
pub mod eval_box;
pub mod function;
pub mod system;

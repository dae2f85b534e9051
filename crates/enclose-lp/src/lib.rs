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

//! # Enclose LP
//!
//! The linear programming oracle used by the linear relaxation contractor.
//!
//! LP solvers compute in plain floating-point arithmetic, so nothing they
//! return is trusted by the rest of the workspace: the contractor re-derives
//! rigorous bounds from the returned dual vectors. This crate therefore only
//! has to provide a convenient model API and access to the raw row data the
//! certification step needs.
//!
//! ## Modules
//!
//! - `solver`: the `LinearSolver` trait, `LpRow`, `LpSense`, `LpStatus`.
//! - `clarabel`: `ClarabelSolver`, an interior-point backend.
//! - `error`: `LpError`.

pub mod clarabel;
pub mod error;
pub mod solver;

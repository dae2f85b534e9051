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

//! Enclose-Ctc: contractors for interval global optimization
//!
//! A contractor narrows a box while keeping every feasible point. This crate
//! provides the contractors the optimizer applies to each cell.
//!
//! Core flow
//! - A `linearizer::Linearizer` turns each constraint into outer affine rows
//!   over the current box.
//! - `relaxation::LinearRelaxationContractor` loads the rows into an LP,
//!   minimizes and maximizes every variable, and applies only the bounds
//!   rebuilt by `certify` from the LP multipliers.
//! - `qinter::QInterContractor` fuses redundant contractors while tolerating
//!   outliers.
//!
//! Assumptions and guarantees
//! - Linearizers produce sound rows; the LP itself is never trusted.
//! - `ContractError::EmptyBox` is ordinary control flow and means "discard".
//!
//! Module map
//! - `contractor`: the `Contractor` trait, errors and small combinators.
//! - `linearizer`: affine row generation and corner policies.
//! - `certify`: Neumaier-Shcherbina bounds from approximate duals.
//! - `relaxation`: the LP-based fixed-point contractor.
//! - `qinter`: q-relaxed intersection of boxes.

pub mod certify;
pub mod contractor;
pub mod linearizer;
pub mod qinter;
pub mod relaxation;

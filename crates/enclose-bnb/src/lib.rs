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

//! Enclose-BnB: interval branch-and-bound global optimization
//!
//! Minimizes the objective of an `enclose_model::system::System` over a box
//! and returns a certified bracket `[uplo, loup]` of the global minimum,
//! together with a feasible point achieving `loup`.
//!
//! Core flow
//! - Build a `System` with an objective and constraints.
//! - Choose a `enclose_ctc::contractor::Contractor` (for example the linear
//!   relaxation contractor) and a `bisector::Bisector`.
//! - Tune `config::OptimizerConfig` and attach monitors.
//! - Call `optimizer::Optimizer::optimize`, then `run` again to resume after
//!   a limit or `restart` to repeat the search.
//!
//! Assumptions and guarantees
//! - Objective and constraint enclosures are inclusion-isotone and sound.
//! - `uplo` never exceeds the global minimum; `loup` is only lowered by
//!   points whose constraints are certainly satisfied.
//! - Deterministic for a given seed.
//!
//! Module map
//! - `optimizer`: the search engine and its state machine.
//! - `buffer`: cell buffers (stack, cost heaps, the optimization heap and
//!   the double heap with a secondary criterion).
//! - `cell`: search nodes with cached objective enclosures.
//! - `bisector`: variable selection for splitting.
//! - `loup`: incumbent search inside a cell.
//! - `monitor`: search monitors (log, limits, interrupt, composite).
//! - `result`: outcomes and status.
//! - `stats`: counters and timing.
//! - `config`: precision and probing settings.

pub mod bisector;
pub mod buffer;
pub mod cell;
pub mod config;
pub mod error;
pub mod loup;
pub mod monitor;
pub mod optimizer;
pub mod result;
pub mod stats;

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

use crate::buffer::CellBufferError;
use enclose_lp::error::LpError;
use enclose_model::error::ModelError;

/// Errors that escape `Optimizer::optimize`.
///
/// Infeasible or unavailable contractions are handled inside the search and
/// never show up here.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OptimizerError {
    /// The system has no objective to minimize.
    #[error("the system has no objective function")]
    MissingObjective,
    /// `run` or `restart` was called before any domain was given.
    #[error("the optimizer has no initial domain; call `optimize` first")]
    MissingDomain,
    /// The probability of popping from the secondary heap is a percentage.
    #[error("critpr must be at most 100, got {0}")]
    InvalidCritpr(u8),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Buffer(#[from] CellBufferError),
    #[error(transparent)]
    Lp(#[from] LpError),
}

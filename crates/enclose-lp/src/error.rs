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

/// Errors raised by an LP backend. Solver outcomes such as infeasibility or
/// iteration limits are statuses, not errors; an `LpError` means the backend
/// could not be set up or run at all.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LpError {
    /// A row was given with a number of coefficients different from the number
    /// of columns.
    #[error("row with {found} coefficients added to an LP with {expected} columns")]
    DimensionMismatch { expected: usize, found: usize },
    /// A row or column index is out of bounds.
    #[error("{kind} index {index} out of bounds for {len} entries")]
    IndexOutOfBounds {
        kind: &'static str,
        index: usize,
        len: usize,
    },
    /// The backend rejected the problem or its settings.
    #[error("LP backend failure: {0}")]
    Backend(String),
}

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

//! q-relaxed intersection of boxes
//!
//! Given `p` boxes that each claim to enclose the same unknown point, the
//! q-intersection is the hull of every region covered by at least `q` of them.
//! It still encloses the point when up to `p - q` boxes are wrong.
//!
//! The computation works on a grid. Along each dimension the finite bounds of
//! all boxes are sorted; the grid cells are the bound values themselves and the
//! open gaps between them. A cell is inside or outside each box as a whole, so
//! membership is decided by one representative point per cell: the value for
//! point cells, the midpoint for bounded gaps, and the nearest float past the
//! outer bound for unbounded gaps. For every dimension the cells are swept
//! from both ends; the first cell that completes into an admissible
//! combination over the remaining dimensions fixes that side of the result.
//!
//! The representative test is an approximation: it is exact for boxes with
//! closed bounds but does not prove membership for every point of a gap.
//!
//! Cost grows like `p · (2p)^n` per sweep, so this suits few boxes in few
//! dimensions.

use crate::contractor::{ContractError, Contractor};
use enclose_core::math::{interval::Interval, interval_box::IntervalBox};
use fixedbitset::FixedBitSet;

/// Invalid arguments to a q-intersection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum QInterError {
    #[error("q must be at least 1")]
    ZeroQ,
    /// More boxes are required to agree than there are boxes.
    #[error("q = {q} exceeds the number of boxes {p}")]
    QTooLarge { q: usize, p: usize },
    #[error("box {index} has dimension {found}, expected {expected}")]
    DimensionMismatch {
        index: usize,
        expected: usize,
        found: usize,
    },
}

/// One grid cell along a dimension.
#[derive(Debug, Clone)]
struct GridCell {
    extent: Interval,
    /// Boxes containing the representative point of the cell.
    members: FixedBitSet,
}

/// The per-dimension grids of a set of boxes.
struct Grid {
    q: usize,
    cells: Vec<Vec<GridCell>>,
}

impl Grid {
    fn new(boxes: &[&IntervalBox], q: usize) -> Self {
        let n = boxes.first().map_or(0, |b| b.len());
        let cells = (0..n).map(|d| Self::build_dimension(boxes, d, q)).collect();
        Self { q, cells }
    }

    fn build_dimension(boxes: &[&IntervalBox], d: usize, q: usize) -> Vec<GridCell> {
        let mut values: Vec<f64> = boxes
            .iter()
            .flat_map(|b| [b[d].lb(), b[d].ub()])
            .filter(|v| v.is_finite())
            .collect();
        values.sort_by(f64::total_cmp);
        values.dedup();

        let mut cells = Vec::with_capacity(2 * values.len() + 1);
        let mut push = |extent: Interval, rep: f64| {
            let mut members = FixedBitSet::with_capacity(boxes.len());
            for (i, b) in boxes.iter().enumerate() {
                if b[d].contains(rep) {
                    members.insert(i);
                }
            }
            if members.count_ones(..) >= q {
                cells.push(GridCell { extent, members });
            }
        };

        let (Some(&first), Some(&last)) = (values.first(), values.last()) else {
            push(Interval::ENTIRE, 0.0);
            return cells;
        };

        push(Interval::new(f64::NEG_INFINITY, first), first.next_down());
        for (i, &v) in values.iter().enumerate() {
            push(Interval::point(v), v);
            if let Some(&next) = values.get(i + 1) {
                let mid = 0.5 * v + 0.5 * next;
                if v < mid && mid < next {
                    push(Interval::new(v, next), mid);
                }
            }
        }
        push(Interval::new(last, f64::INFINITY), last.next_up());
        cells
    }

    /// Returns `true` if some choice of one cell per dimension in `dims`
    /// keeps at least `q` of the `candidates`.
    fn completes(&self, dims: &[usize], candidates: &FixedBitSet) -> bool {
        if candidates.count_ones(..) < self.q {
            return false;
        }
        let Some((&d, rest)) = dims.split_first() else {
            return true;
        };
        self.cells[d].iter().any(|cell| {
            let mut next = candidates.clone();
            next.intersect_with(&cell.members);
            self.completes(rest, &next)
        })
    }

    /// Returns the q-consistent range of dimension `d`, or `None` if no
    /// admissible combination exists.
    fn sweep(&self, d: usize) -> Option<Interval> {
        let others: Vec<usize> = (0..self.cells.len()).filter(|&k| k != d).collect();
        let admissible = |cell: &&GridCell| self.completes(&others, &cell.members);

        let lower = self.cells[d].iter().find(admissible)?;
        let upper = self.cells[d].iter().rev().find(admissible)?;
        Some(Interval::new(lower.extent.lb(), upper.extent.ub()))
    }

    fn hull(&self) -> IntervalBox {
        let n = self.cells.len();
        let mut components = Vec::with_capacity(n);
        for d in 0..n {
            match self.sweep(d) {
                Some(range) => components.push(range),
                None => return IntervalBox::empty(n),
            }
        }
        IntervalBox::new(components)
    }
}

/// Returns the hull of all points covered by at least `q` of `boxes`.
///
/// Empty boxes never cover anything. When fewer than `q` boxes cover a common
/// point the result is the empty box.
///
/// # Panics
///
/// Panics if `q` is zero or if the boxes do not share the same dimension.
///
/// # Examples
///
/// ```
/// use enclose_core::math::interval_box::IntervalBox;
/// use enclose_ctc::qinter::q_intersection;
///
/// let boxes = [
///     IntervalBox::from_bounds(&[(0.0, 2.0)]),
///     IntervalBox::from_bounds(&[(1.0, 3.0)]),
///     IntervalBox::from_bounds(&[(10.0, 11.0)]),
/// ];
/// let hull = q_intersection(&boxes, 2).unwrap();
/// assert_eq!(hull, IntervalBox::from_bounds(&[(1.0, 2.0)]));
/// ```
///
/// # Errors
///
/// Returns `QInterError` if `q` is zero or exceeds the number of boxes, or if
/// the boxes differ in dimension.
pub fn q_intersection(boxes: &[IntervalBox], q: usize) -> Result<IntervalBox, QInterError> {
    if q == 0 {
        return Err(QInterError::ZeroQ);
    }
    if q > boxes.len() {
        return Err(QInterError::QTooLarge { q, p: boxes.len() });
    }
    let n = boxes.first().map_or(0, |b| b.len());
    if let Some((index, b)) = boxes.iter().enumerate().find(|(_, b)| b.len() != n) {
        return Err(QInterError::DimensionMismatch {
            index,
            expected: n,
            found: b.len(),
        });
    }

    let live: Vec<&IntervalBox> = boxes.iter().filter(|b| !b.is_empty()).collect();
    if live.len() < q {
        return Ok(IntervalBox::empty(n));
    }
    Ok(Grid::new(&live, q).hull())
}

/// Fuses the boxes produced by several contractors by q-intersection.
///
/// Each member contracts its own copy of the box. A member proving emptiness
/// contributes nothing; a member that is unavailable contributes the
/// unchanged box; LP errors propagate. The fused hull is then intersected
/// with the input.
pub struct QInterContractor<'a> {
    contractors: Vec<Box<dyn Contractor + 'a>>,
    q: usize,
}

impl<'a> QInterContractor<'a> {
    /// Creates a q-intersection over `contractors`.
    ///
    /// # Errors
    ///
    /// Returns `QInterError` unless `1 <= q <= contractors.len()`.
    pub fn new(contractors: Vec<Box<dyn Contractor + 'a>>, q: usize) -> Result<Self, QInterError> {
        if q == 0 {
            return Err(QInterError::ZeroQ);
        }
        if q > contractors.len() {
            return Err(QInterError::QTooLarge {
                q,
                p: contractors.len(),
            });
        }
        Ok(Self { contractors, q })
    }

    #[inline]
    pub fn q(&self) -> usize {
        self.q
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

impl Contractor for QInterContractor<'_> {
    fn name(&self) -> &str {
        "QInterContractor"
    }

    fn contract(&mut self, bx: &mut IntervalBox) -> Result<(), ContractError> {
        if bx.is_empty() {
            return Err(ContractError::EmptyBox);
        }
        let mut images = Vec::with_capacity(self.contractors.len());
        for contractor in self.contractors.iter_mut() {
            let mut image = bx.clone();
            match contractor.contract(&mut image) {
                Ok(()) => images.push(image),
                Err(ContractError::EmptyBox) => {}
                Err(ContractError::Unavailable) => images.push(bx.clone()),
                Err(e) => return Err(e),
            }
        }

        if images.len() < self.q {
            return Err(ContractError::EmptyBox);
        }
        let fused = match q_intersection(&images, self.q) {
            Ok(fused) => fused,
            Err(e) => {
                log::warn!("QInterContractor: {e}, box left unchanged");
                return Err(ContractError::Unavailable);
            }
        };
        bx.intersect_with(&fused);
        if bx.is_empty() {
            return Err(ContractError::EmptyBox);
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

impl std::fmt::Debug for QInterContractor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QInterContractor")
            .field("q", &self.q)
            .field(
                "contractors",
                &self.contractors.iter().map(|c| c.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contractor::BoxIntersection;

    fn measurements() -> Vec<IntervalBox> {
        vec![
            IntervalBox::from_bounds(&[(1.0, 5.0), (2.0, 4.0)]),
            IntervalBox::from_bounds(&[(0.0, 8.0), (6.0, 7.0)]),
            IntervalBox::from_bounds(&[(3.0, 6.0), (0.0, 8.0)]),
            IntervalBox::from_bounds(&[(2.0, 7.0), (3.0, 5.0)]),
        ]
    }

    #[test]
    fn test_two_out_of_four() {
        let hull = q_intersection(&measurements(), 2).unwrap();
        assert_eq!(hull, IntervalBox::from_bounds(&[(2.0, 6.0), (2.0, 7.0)]));
    }

    #[test]
    fn test_three_out_of_four() {
        // Only y1, y3, y4 share a point: ([3,5], [3,4]).
        let hull = q_intersection(&measurements(), 3).unwrap();
        assert_eq!(hull, IntervalBox::from_bounds(&[(3.0, 5.0), (3.0, 4.0)]));
    }

    #[test]
    fn test_q_equal_p_is_plain_intersection() {
        let boxes = vec![
            IntervalBox::from_bounds(&[(0.0, 4.0), (1.0, 3.0)]),
            IntervalBox::from_bounds(&[(1.0, 5.0), (0.0, 2.0)]),
            IntervalBox::from_bounds(&[(-1.0, 3.0), (0.5, 9.0)]),
        ];
        let expected = boxes
            .iter()
            .skip(1)
            .fold(boxes[0].clone(), |acc, b| &acc & b);
        assert_eq!(q_intersection(&boxes, 3).unwrap(), expected);

        assert!(q_intersection(&measurements(), 4).unwrap().is_empty());
    }

    #[test]
    fn test_q_one_is_hull() {
        let hull = q_intersection(&measurements(), 1).unwrap();
        assert_eq!(hull, IntervalBox::from_bounds(&[(0.0, 8.0), (0.0, 8.0)]));
    }

    #[test]
    fn test_empty_boxes_are_ignored() {
        let mut boxes = measurements();
        boxes.push(IntervalBox::empty(2));
        assert_eq!(
            q_intersection(&boxes, 2).unwrap(),
            IntervalBox::from_bounds(&[(2.0, 6.0), (2.0, 7.0)])
        );
        assert!(q_intersection(&[IntervalBox::empty(2)], 1).unwrap().is_empty());
    }

    #[test]
    fn test_unbounded_boxes() {
        let boxes = vec![
            IntervalBox::new(vec![Interval::new(f64::NEG_INFINITY, 2.0)]),
            IntervalBox::new(vec![Interval::new(1.0, f64::INFINITY)]),
            IntervalBox::new(vec![Interval::ENTIRE]),
        ];
        assert_eq!(q_intersection(&boxes, 3).unwrap(), IntervalBox::from_bounds(&[(1.0, 2.0)]));
        assert_eq!(q_intersection(&boxes, 2).unwrap(), IntervalBox::entire(1));
        assert_eq!(
            q_intersection(&[IntervalBox::entire(2), IntervalBox::entire(2)], 2).unwrap(),
            IntervalBox::entire(2)
        );
    }

    #[test]
    fn test_disjoint_cells_in_other_dimension() {
        // Dimension 0 overlaps everywhere, dimension 1 never for two boxes.
        let boxes = vec![
            IntervalBox::from_bounds(&[(0.0, 1.0), (0.0, 1.0)]),
            IntervalBox::from_bounds(&[(0.0, 1.0), (2.0, 3.0)]),
        ];
        assert!(q_intersection(&boxes, 2).unwrap().is_empty());
    }

    #[test]
    fn test_contractor_tolerates_outlier() {
        let members: Vec<Box<dyn Contractor>> = measurements()
            .into_iter()
            .map(|m| Box::new(BoxIntersection::new(m)) as Box<dyn Contractor>)
            .collect();
        let mut ctc = QInterContractor::new(members, 2).unwrap();
        assert_eq!(ctc.q(), 2);
        assert_eq!(ctc.len(), 4);

        let mut bx = IntervalBox::from_bounds(&[(-10.0, 10.0), (-10.0, 10.0)]);
        ctc.contract(&mut bx).unwrap();
        assert_eq!(bx, IntervalBox::from_bounds(&[(2.0, 6.0), (2.0, 7.0)]));

        let mut far = IntervalBox::from_bounds(&[(20.0, 30.0), (20.0, 30.0)]);
        assert_eq!(ctc.contract(&mut far), Err(ContractError::EmptyBox));
    }

    #[test]
    fn test_invalid_arguments_are_rejected() {
        let boxes = measurements();
        assert_eq!(q_intersection(&boxes, 0), Err(QInterError::ZeroQ));
        assert_eq!(
            q_intersection(&boxes, 5),
            Err(QInterError::QTooLarge { q: 5, p: 4 })
        );
        assert_eq!(
            q_intersection(&[], 1),
            Err(QInterError::QTooLarge { q: 1, p: 0 })
        );

        let mixed = vec![
            IntervalBox::from_bounds(&[(0.0, 1.0), (0.0, 1.0)]),
            IntervalBox::from_bounds(&[(0.0, 1.0), (0.0, 1.0)]),
            IntervalBox::from_bounds(&[(0.0, 1.0)]),
        ];
        assert_eq!(
            q_intersection(&mixed, 2),
            Err(QInterError::DimensionMismatch {
                index: 2,
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn test_contractor_rejects_invalid_q() {
        let members = || -> Vec<Box<dyn Contractor>> {
            vec![Box::new(BoxIntersection::new(IntervalBox::entire(1)))]
        };
        assert_eq!(
            QInterContractor::new(members(), 2).unwrap_err(),
            QInterError::QTooLarge { q: 2, p: 1 }
        );
        assert_eq!(
            QInterContractor::new(members(), 0).unwrap_err(),
            QInterError::ZeroQ
        );
        assert!(QInterContractor::new(members(), 1).is_ok());
    }
}

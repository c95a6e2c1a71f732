//! Slice planning and the frame iterator it drives.
//!
//! Slice arguments follow the usual sequence-slicing rules: omitted bounds
//! default to the relevant end, negative values count from the end, bounds
//! are clamped rather than rejected, and only a zero step is an error.

use crate::error::{Result, TrajError};
use crate::types::Frame;

use super::ChainReader;

/// A fully normalized slice: the first global frame, the signed stride,
/// and how many frames the traversal yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SlicePlan {
    pub start: isize,
    pub step: isize,
    pub count: usize,
}

pub(crate) fn plan(
    start: Option<isize>,
    stop: Option<isize>,
    step: Option<isize>,
    len: usize,
) -> Result<SlicePlan> {
    let step = step.unwrap_or(1);
    if step == 0 {
        return Err(TrajError::InvalidSlice {
            reason: "step must not be zero".to_string(),
        });
    }
    let len = len as isize;

    if step > 0 {
        let start = clamp(start.unwrap_or(0), len, 0, len);
        let stop = clamp(stop.unwrap_or(len), len, 0, len);
        let count = if stop > start {
            ((stop - start - 1) / step + 1) as usize
        } else {
            0
        };
        Ok(SlicePlan { start, step, count })
    } else {
        let start = clamp(start.unwrap_or(len - 1), len, -1, len - 1);
        // the exclusive stop of a reversed slice may sit one before frame 0
        let stop = match stop {
            Some(stop) => clamp(stop, len, -1, len - 1),
            None => -1,
        };
        let count = if start > stop {
            ((start - stop - 1) / (-step) + 1) as usize
        } else {
            0
        };
        Ok(SlicePlan { start, step, count })
    }
}

/// Normalize one bound: negative values count from the end, then the
/// result is clamped into `[lo, hi]`.
fn clamp(bound: isize, len: isize, lo: isize, hi: isize) -> isize {
    let adjusted = if bound < 0 { bound + len } else { bound };
    adjusted.clamp(lo, hi)
}

/// Iterator over a slice of the chain, yielding owned frames.
///
/// Borrows the reader mutably because each step seeks the underlying
/// segment; a read failure is yielded once and ends the iteration.
pub struct ChainSlice<'a> {
    chain: &'a mut ChainReader,
    next: isize,
    step: isize,
    remaining: usize,
}

impl<'a> ChainSlice<'a> {
    pub(crate) fn new(chain: &'a mut ChainReader, plan: SlicePlan) -> Self {
        Self {
            chain,
            next: plan.start,
            step: plan.step,
            remaining: plan.count,
        }
    }
}

impl Iterator for ChainSlice<'_> {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        match self.chain.seek(self.next) {
            Ok(frame) => {
                let frame = frame.clone();
                self.next += self.step;
                Some(Ok(frame))
            }
            Err(err) => {
                self.remaining = 0;
                Some(Err(err))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for ChainSlice<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn indices(start: Option<isize>, stop: Option<isize>, step: Option<isize>) -> Vec<isize> {
        let plan = plan(start, stop, step, 20).expect("plan");
        (0..plan.count)
            .map(|i| plan.start + i as isize * plan.step)
            .collect()
    }

    #[test]
    fn strided_forward_slice() {
        assert_eq!(indices(Some(5), Some(17), Some(3)), vec![5, 8, 11, 14]);
    }

    #[test]
    fn defaults_cover_everything() {
        assert_eq!(indices(None, None, None), (0..20).collect::<Vec<_>>());
    }

    #[test]
    fn negative_bounds_count_from_the_end() {
        assert_eq!(indices(Some(-3), None, None), vec![17, 18, 19]);
        assert_eq!(indices(Some(0), Some(-15), None), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn reversed_slice() {
        assert_eq!(indices(None, None, Some(-7)), vec![19, 12, 5]);
        assert_eq!(indices(Some(3), None, Some(-1)), vec![3, 2, 1, 0]);
    }

    #[test]
    fn out_of_range_bounds_clamp_to_empty() {
        assert!(indices(Some(25), None, None).is_empty());
        assert!(indices(Some(5), Some(5), None).is_empty());
        assert_eq!(indices(Some(15), Some(1000), None).len(), 5);
    }

    #[test]
    fn zero_step_rejected() {
        assert!(matches!(
            plan(None, None, Some(0), 20),
            Err(TrajError::InvalidSlice { .. })
        ));
    }
}

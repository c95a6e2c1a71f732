//! Precomputed mapping between global frame numbers and (span, local frame).

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrajError};
use crate::types::SegmentMeta;

/// The contiguous local-frame range of one segment that survives overlap
/// pruning. `first` and `last` are inclusive local frame numbers;
/// `segment` indexes the chain's segment list in caller order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentSpan {
    pub segment: usize,
    pub first: usize,
    pub last: usize,
}

impl SegmentSpan {
    #[must_use]
    pub fn len(&self) -> usize {
        self.last - self.first + 1
    }
}

/// Immutable lookup table built once at construction.
///
/// Spans partition `[0, n_frames)` with no gaps; the parallel prefix table
/// holds the global frame number of each span's first frame (plus one
/// trailing entry with the total), so a lookup is one binary search.
#[derive(Debug, Clone)]
pub struct ChainIndex {
    spans: Vec<SegmentSpan>,
    prefix: Vec<usize>,
    /// Trajectory-relative time of each span's first included frame,
    /// assuming uniform spacing across stitched boundaries.
    time_offsets: Vec<f64>,
    n_frames: usize,
}

impl ChainIndex {
    pub(crate) fn build(spans: Vec<SegmentSpan>, metas: &[SegmentMeta]) -> Self {
        let mut prefix = Vec::with_capacity(spans.len() + 1);
        let mut total = 0usize;
        prefix.push(0);
        for span in &spans {
            total += span.len();
            prefix.push(total);
        }

        let time_offsets = Self::compute_time_offsets(&spans, metas);

        Self {
            spans,
            prefix,
            time_offsets,
            n_frames: total,
        }
    }

    /// Per-span frame spacing is estimated from the span's own included
    /// times; single-frame spans inherit the nearest earlier estimate,
    /// falling back to the nearest later one, then to 1.0.
    fn compute_time_offsets(spans: &[SegmentSpan], metas: &[SegmentMeta]) -> Vec<f64> {
        let mut spacings: Vec<Option<f64>> = spans
            .iter()
            .map(|span| {
                if span.len() > 1 {
                    let times = &metas[span.segment].times;
                    Some((times[span.last] - times[span.first]) / (span.len() - 1) as f64)
                } else {
                    None
                }
            })
            .collect();

        let mut carry = None;
        for spacing in &mut spacings {
            match spacing {
                Some(value) => carry = Some(*value),
                None => *spacing = carry,
            }
        }
        let mut carry = None;
        for spacing in spacings.iter_mut().rev() {
            match spacing {
                Some(value) => carry = Some(*value),
                None => *spacing = carry,
            }
        }

        let mut offsets = Vec::with_capacity(spans.len());
        let mut offset = 0.0;
        for (span, spacing) in spans.iter().zip(&spacings) {
            offsets.push(offset);
            let times = &metas[span.segment].times;
            let duration = times[span.last] - times[span.first];
            offset += duration + spacing.unwrap_or(1.0);
        }
        offsets
    }

    #[must_use]
    pub fn n_frames(&self) -> usize {
        self.n_frames
    }

    #[must_use]
    pub fn spans(&self) -> &[SegmentSpan] {
        &self.spans
    }

    /// Normalize a possibly negative frame number into `[0, n_frames)`.
    /// `-1` addresses the last frame.
    pub fn resolve(&self, frame: isize) -> Result<usize> {
        let n = self.n_frames as isize;
        let adjusted = if frame < 0 { frame + n } else { frame };
        if adjusted < 0 || adjusted >= n {
            return Err(TrajError::FrameOutOfRange {
                frame,
                n_frames: self.n_frames,
            });
        }
        Ok(adjusted as usize)
    }

    /// Map a global frame number (negative counts from the end) to
    /// (span index, local frame number).
    pub fn locate(&self, frame: isize) -> Result<(usize, usize)> {
        Ok(self.locate_resolved(self.resolve(frame)?))
    }

    pub(crate) fn locate_resolved(&self, global: usize) -> (usize, usize) {
        debug_assert!(global < self.n_frames);
        let span_idx = self.prefix.partition_point(|&p| p <= global) - 1;
        let span = self.spans[span_idx];
        (span_idx, span.first + (global - self.prefix[span_idx]))
    }

    pub(crate) fn time_offset(&self, span_idx: usize) -> f64 {
        self.time_offsets[span_idx]
    }
}

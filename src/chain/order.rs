//! Segment ordering and continuous-mode overlap resolution.

use crate::error::{Result, TrajError};
use crate::types::SegmentMeta;

use super::index::SegmentSpan;

/// Stable multi-key argsort of segments by (first order key, last order
/// key), both ascending. Ties keep input order, which makes the resulting
/// chain reproducible regardless of how the caller shuffled its sources.
pub(crate) fn sort_segments(metas: &[SegmentMeta]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..metas.len()).collect();
    order.sort_by(|&a, &b| {
        metas[a]
            .start_key()
            .total_cmp(&metas[b].start_key())
            .then_with(|| metas[a].end_key().total_cmp(&metas[b].end_key()))
    });
    order
}

/// Resolve which local frame range each segment contributes to a
/// continuous trajectory.
///
/// Single greedy pass over the sorted segments, keeping the end key of the
/// interval covered so far. Each case is an isolated branch:
///
/// * a later start strictly beyond the running end is a gap and fatal;
/// * an interval entirely inside the running one contributes nothing and
///   the segment is dropped from the chain;
/// * a partial overlap contributes exactly the frames whose key lies
///   beyond the running end;
/// * a single-frame segment (point interval) is dropped when its key is
///   already covered, otherwise it contributes its one frame and extends
///   the running interval to that key.
pub(crate) fn stitch(metas: &[SegmentMeta]) -> Result<Vec<SegmentSpan>> {
    for meta in metas {
        meta.validate_monotonic()?;
    }

    let order = sort_segments(metas);
    let mut spans: Vec<SegmentSpan> = Vec::with_capacity(order.len());

    let mut running_end = f64::NEG_INFINITY;
    let mut contributor: Option<usize> = None;

    for &segment in &order {
        let meta = &metas[segment];

        let Some(previous) = contributor else {
            spans.push(SegmentSpan {
                segment,
                first: 0,
                last: meta.n_frames - 1,
            });
            running_end = meta.end_key();
            contributor = Some(segment);
            tracing::debug!(segment = %meta.uri, frames = meta.n_frames, "segment anchors the chain");
            continue;
        };

        if meta.n_frames == 1 {
            if meta.start_key() <= running_end {
                tracing::debug!(segment = %meta.uri, "single-frame segment already covered, dropped");
            } else {
                spans.push(SegmentSpan {
                    segment,
                    first: 0,
                    last: 0,
                });
                running_end = meta.start_key();
                contributor = Some(segment);
            }
            continue;
        }

        if meta.start_key() > running_end {
            return Err(TrajError::Discontinuous {
                earlier: metas[previous].uri.clone(),
                earlier_end: running_end,
                later: meta.uri.clone(),
                later_start: meta.start_key(),
            });
        }

        if meta.end_key() <= running_end {
            tracing::debug!(segment = %meta.uri, "segment entirely covered, dropped");
            continue;
        }

        let first = meta.order_keys.partition_point(|&key| key <= running_end);
        tracing::debug!(
            segment = %meta.uri,
            skipped = first,
            contributed = meta.n_frames - first,
            "segment overlaps the running interval"
        );
        spans.push(SegmentSpan {
            segment,
            first,
            last: meta.n_frames - 1,
        });
        running_end = meta.end_key();
        contributor = Some(segment);
    }

    Ok(spans)
}

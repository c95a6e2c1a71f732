//! Per-segment construction inputs and the metadata captured from them.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrajError};

/// One segment source supplied to the chain: a path, optionally paired
/// with an explicit format label that overrides extension probing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentSource {
    pub path: PathBuf,
    pub format: Option<String>,
}

impl SegmentSource {
    #[must_use]
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            format: None,
        }
    }

    /// Pair a path with an explicit format label (e.g. `"frm"`).
    #[must_use]
    pub fn with_format<P: Into<PathBuf>, S: Into<String>>(path: P, format: S) -> Self {
        Self {
            path: path.into(),
            format: Some(format.into()),
        }
    }

    #[must_use]
    pub fn uri(&self) -> String {
        self.path.display().to_string()
    }
}

impl From<&str> for SegmentSource {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for SegmentSource {
    fn from(path: String) -> Self {
        Self::new(path)
    }
}

impl From<&Path> for SegmentSource {
    fn from(path: &Path) -> Self {
        Self::new(path)
    }
}

impl From<PathBuf> for SegmentSource {
    fn from(path: PathBuf) -> Self {
        Self::new(path)
    }
}

impl From<&SegmentSource> for SegmentSource {
    fn from(source: &SegmentSource) -> Self {
        source.clone()
    }
}

/// Immutable metadata captured from one segment during the construction
/// scan: the segment is opened, its order-key and time sequences read, and
/// the handle closed again before the next segment is touched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentMeta {
    pub uri: String,
    pub format: String,
    pub n_atoms: usize,
    pub n_frames: usize,
    pub order_keys: Vec<f64>,
    pub times: Vec<f64>,
}

impl SegmentMeta {
    /// First order key of the segment.
    #[must_use]
    pub fn start_key(&self) -> f64 {
        self.order_keys.first().copied().unwrap_or(f64::NAN)
    }

    /// Last order key of the segment.
    #[must_use]
    pub fn end_key(&self) -> f64 {
        self.order_keys.last().copied().unwrap_or(f64::NAN)
    }

    /// Reject segments whose captured metadata is internally inconsistent.
    pub fn validate(&self) -> Result<()> {
        if self.n_frames == 0 {
            return Err(self.malformed("segment has no frames"));
        }
        if self.order_keys.len() != self.n_frames || self.times.len() != self.n_frames {
            return Err(self.malformed("frame count disagrees with captured key/time sequences"));
        }
        if self.end_key() < self.start_key() {
            return Err(self.malformed("end order key precedes start order key"));
        }
        Ok(())
    }

    /// Continuous stitching additionally assumes keys grow strictly within
    /// a segment.
    pub(crate) fn validate_monotonic(&self) -> Result<()> {
        if self.order_keys.windows(2).any(|pair| pair[1] <= pair[0]) {
            return Err(self.malformed("order keys are not strictly increasing"));
        }
        Ok(())
    }

    fn malformed(&self, reason: &str) -> TrajError {
        TrajError::MalformedSegment {
            uri: self.uri.clone(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(keys: &[f64]) -> SegmentMeta {
        SegmentMeta {
            uri: "test.frm".to_string(),
            format: "frm".to_string(),
            n_atoms: 3,
            n_frames: keys.len(),
            order_keys: keys.to_vec(),
            times: keys.to_vec(),
        }
    }

    #[test]
    fn start_end_keys() {
        let m = meta(&[2.0, 3.0, 4.0]);
        assert_eq!(m.start_key(), 2.0);
        assert_eq!(m.end_key(), 4.0);
        assert!(m.validate().is_ok());
        assert!(m.validate_monotonic().is_ok());
    }

    #[test]
    fn empty_segment_rejected() {
        let m = meta(&[]);
        assert!(matches!(
            m.validate(),
            Err(TrajError::MalformedSegment { .. })
        ));
    }

    #[test]
    fn reversed_interval_rejected() {
        let m = meta(&[5.0, 4.0, 3.0]);
        assert!(matches!(
            m.validate(),
            Err(TrajError::MalformedSegment { .. })
        ));
    }

    #[test]
    fn non_monotonic_keys_rejected_for_stitching() {
        let m = meta(&[0.0, 2.0, 2.0, 3.0]);
        assert!(m.validate().is_ok());
        assert!(matches!(
            m.validate_monotonic(),
            Err(TrajError::MalformedSegment { .. })
        ));
    }

    #[test]
    fn source_from_path_forms() {
        let a = SegmentSource::from("run1.frm");
        assert_eq!(a.uri(), "run1.frm");
        assert!(a.format.is_none());

        let b = SegmentSource::with_format("run1.dat", "xyz");
        assert_eq!(b.format.as_deref(), Some("xyz"));
    }
}

//! The decoded per-frame coordinate payload.

use serde::{Deserialize, Serialize};

/// One decoded trajectory frame.
///
/// `step` is the per-frame order key as stored by the format (a logical
/// step counter or frame number); `time` is the frame's time stamp in the
/// segment's own unit. Coordinates are plain data to this crate; no
/// physical interpretation is attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub step: i64,
    pub time: f64,
    /// Cartesian coordinates, one `[x, y, z]` triple per atom.
    pub positions: Vec<[f32; 3]>,
}

impl Frame {
    #[must_use]
    pub fn new(step: i64, time: f64, positions: Vec<[f32; 3]>) -> Self {
        Self {
            step,
            time,
            positions,
        }
    }

    #[must_use]
    pub fn n_atoms(&self) -> usize {
        self.positions.len()
    }
}

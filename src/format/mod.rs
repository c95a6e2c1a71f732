//! Trajectory format traits and the registry that routes sources to them.
//!
//! A format owns all byte-level knowledge about one on-disk layout. The
//! chain reader only ever talks to the [`SegmentReader`] / [`SegmentWriter`]
//! traits, so new formats plug in without touching the chain logic.

mod frm;
mod xyz;

pub use frm::FrmFormat;
pub use xyz::XyzFormat;

use std::path::Path;

use crate::error::Result;
use crate::types::Frame;

/// Hint provided to formats before opening a source. An explicit label
/// supplied by the caller wins over extension probing.
#[derive(Debug, Clone, Copy)]
pub struct FormatHint<'a> {
    pub extension: Option<&'a str>,
    pub format: Option<&'a str>,
}

impl<'a> FormatHint<'a> {
    #[must_use]
    pub fn for_path(path: &'a Path, format: Option<&'a str>) -> Self {
        Self {
            extension: path.extension().and_then(|ext| ext.to_str()),
            format,
        }
    }

    /// True if this hint names `label`, either explicitly or by extension.
    #[must_use]
    pub fn names(&self, label: &str) -> bool {
        match self.format {
            Some(explicit) => explicit.eq_ignore_ascii_case(label),
            None => self
                .extension
                .is_some_and(|ext| ext.eq_ignore_ascii_case(label)),
        }
    }
}

/// Sequential and random access over one physically distinct trajectory
/// segment. Dropping the reader releases the underlying file handle.
pub trait SegmentReader {
    fn n_atoms(&self) -> usize;

    fn n_frames(&self) -> usize;

    /// Per-frame order key used for overlap detection between segments.
    fn order_key(&self, local_frame: usize) -> f64;

    /// Per-frame time stamp in the segment's own unit.
    fn time(&self, local_frame: usize) -> f64;

    /// Decode the frame at `local_frame` and position the reader on it.
    fn read_frame(&mut self, local_frame: usize) -> Result<Frame>;

    /// Decode the frame after the last one read; `Ok(None)` past the end.
    fn next_frame(&mut self) -> Result<Option<Frame>>;
}

/// Append-only frame sink. Writers flush on drop; call [`finish`] to
/// surface flush errors instead of swallowing them.
///
/// [`finish`]: SegmentWriter::finish
pub trait SegmentWriter {
    fn n_atoms(&self) -> usize;

    fn write_frame(&mut self, frame: &Frame) -> Result<()>;

    fn finish(&mut self) -> Result<()>;
}

/// Trait implemented by concrete trajectory formats.
pub trait TrajectoryFormat: Send + Sync {
    /// Short lowercase label, also the conventional file extension.
    fn name(&self) -> &'static str;

    /// Return true if this format is a match for the provided hint.
    fn supports(&self, hint: &FormatHint<'_>) -> bool;

    fn open(&self, path: &Path) -> Result<Box<dyn SegmentReader>>;

    fn create(&self, path: &Path, n_atoms: usize) -> Result<Box<dyn SegmentWriter>>;
}

/// Registry of trajectory formats probed in registration order.
pub struct FormatRegistry {
    formats: Vec<Box<dyn TrajectoryFormat>>,
}

impl FormatRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            formats: Vec::new(),
        }
    }

    pub fn register<F>(&mut self, format: F)
    where
        F: TrajectoryFormat + 'static,
    {
        self.formats.push(Box::new(format));
    }

    #[must_use]
    pub fn formats(&self) -> &[Box<dyn TrajectoryFormat>] {
        &self.formats
    }

    #[must_use]
    pub fn find_format<'a>(&'a self, hint: &FormatHint<'_>) -> Option<&'a dyn TrajectoryFormat> {
        self.formats
            .iter()
            .map(std::convert::AsRef::as_ref)
            .find(|format| format.supports(hint))
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register(FrmFormat);
        registry.register(XyzFormat);
        registry
    }
}

//! The chain reader: many on-disk segments presented as one logical
//! trajectory with global frame numbers.
//!
//! Construction scans every source once to capture its order keys and
//! times, closing each handle before the next is opened. After that the
//! reader keeps at most one segment open at a time and swaps it lazily as
//! seeks cross span boundaries.

mod index;
mod order;
mod slice;

pub use index::{ChainIndex, SegmentSpan};
pub use slice::ChainSlice;

use crate::error::{Result, TrajError};
use crate::format::{FormatHint, FormatRegistry, SegmentReader, SegmentWriter};
use crate::types::{ChainOptions, Frame, SegmentMeta, SegmentSource};

use slice::SlicePlan;

/// Sequential position of the reader between calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    /// No frame has been read yet; the next sequential frame is 0.
    Unopened,
    /// The frame last read, as a global frame number.
    At(usize),
    /// Sequential access ran past the last frame.
    Exhausted,
}

/// The one segment currently held open, if any.
struct ActiveSegment {
    span_idx: usize,
    reader: Box<dyn SegmentReader>,
}

/// Random-access reader over a chain of trajectory segments.
pub struct ChainReader {
    sources: Vec<SegmentSource>,
    metas: Vec<SegmentMeta>,
    index: ChainIndex,
    registry: FormatRegistry,
    options: ChainOptions,
    n_atoms: usize,
    active: Option<ActiveSegment>,
    current: Option<Frame>,
    position: Position,
}

impl std::fmt::Debug for ChainReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainReader")
            .field("sources", &self.sources)
            .field("metas", &self.metas)
            .field("index", &self.index)
            .field("options", &self.options)
            .field("n_atoms", &self.n_atoms)
            .field("current", &self.current)
            .field("position", &self.position)
            .finish_non_exhaustive()
    }
}

impl ChainReader {
    /// Assemble a chain from `sources` using the built-in formats.
    pub fn open<I, S>(sources: I, options: ChainOptions) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<SegmentSource>,
    {
        Self::open_with_registry(sources, options, FormatRegistry::default())
    }

    /// Assemble a chain, routing sources through a caller-built registry.
    pub fn open_with_registry<I, S>(
        sources: I,
        options: ChainOptions,
        registry: FormatRegistry,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<SegmentSource>,
    {
        let sources: Vec<SegmentSource> = sources.into_iter().map(Into::into).collect();
        if sources.is_empty() {
            return Err(TrajError::EmptyChain);
        }

        let mut metas = Vec::with_capacity(sources.len());
        for source in &sources {
            let (reader, format) = open_source(&registry, source)?;
            let n_frames = reader.n_frames();
            let meta = SegmentMeta {
                uri: source.uri(),
                format: format.to_string(),
                n_atoms: reader.n_atoms(),
                n_frames,
                order_keys: (0..n_frames).map(|i| reader.order_key(i)).collect(),
                times: (0..n_frames).map(|i| reader.time(i)).collect(),
            };
            meta.validate()?;
            metas.push(meta);
            // reader handle closes here, before the next source opens
        }

        let n_atoms = metas[0].n_atoms;
        for meta in &metas[1..] {
            if meta.n_atoms != n_atoms {
                return Err(TrajError::AtomCountMismatch {
                    uri: meta.uri.clone(),
                    expected: n_atoms,
                    got: meta.n_atoms,
                });
            }
        }

        let spans = if options.continuous {
            order::stitch(&metas)?
        } else {
            metas
                .iter()
                .enumerate()
                .map(|(segment, meta)| SegmentSpan {
                    segment,
                    first: 0,
                    last: meta.n_frames - 1,
                })
                .collect()
        };
        let index = ChainIndex::build(spans, &metas);

        tracing::debug!(
            segments = metas.len(),
            spans = index.spans().len(),
            frames = index.n_frames(),
            continuous = options.continuous,
            "chain assembled"
        );

        Ok(Self {
            sources,
            metas,
            index,
            registry,
            options,
            n_atoms,
            active: None,
            current: None,
            position: Position::Unopened,
        })
    }

    /// Total number of frames in the chain after overlap resolution.
    #[must_use]
    pub fn n_frames(&self) -> usize {
        self.index.n_frames()
    }

    #[must_use]
    pub fn n_atoms(&self) -> usize {
        self.n_atoms
    }

    /// Number of segments supplied at construction, dropped ones included.
    #[must_use]
    pub fn n_segments(&self) -> usize {
        self.metas.len()
    }

    /// Metadata captured per segment, in caller order.
    #[must_use]
    pub fn segments(&self) -> &[SegmentMeta] {
        &self.metas
    }

    #[must_use]
    pub fn sources(&self) -> &[SegmentSource] {
        &self.sources
    }

    #[must_use]
    pub fn index(&self) -> &ChainIndex {
        &self.index
    }

    #[must_use]
    pub fn options(&self) -> ChainOptions {
        self.options
    }

    /// Global frame number of the frame last read, if any.
    #[must_use]
    pub fn current_frame(&self) -> Option<usize> {
        match self.position {
            Position::At(global) => Some(global),
            Position::Unopened | Position::Exhausted => None,
        }
    }

    /// The frame last read, if any.
    #[must_use]
    pub fn current(&self) -> Option<&Frame> {
        self.current.as_ref()
    }

    /// Trajectory time of the frame last read, if any.
    #[must_use]
    pub fn current_time(&self) -> Option<f64> {
        self.current_frame()
            .and_then(|global| self.time(global as isize).ok())
    }

    /// Trajectory time of a frame without reading its coordinates.
    ///
    /// With a `dt` override this is `frame * dt`; otherwise it is the
    /// segment's own time, shifted so time keeps growing across stitched
    /// boundaries.
    pub fn time(&self, frame: isize) -> Result<f64> {
        let global = self.index.resolve(frame)?;
        if let Some(dt) = self.options.dt {
            return Ok(global as f64 * dt);
        }
        let (span_idx, local) = self.index.locate_resolved(global);
        let span = self.index.spans()[span_idx];
        let times = &self.metas[span.segment].times;
        Ok(self.index.time_offset(span_idx) + (times[local] - times[span.first]))
    }

    /// Read the frame at `frame`. Negative numbers count from the end;
    /// `seek(-1)` reads the last frame. Out-of-range seeks fail without
    /// disturbing the current position.
    pub fn seek(&mut self, frame: isize) -> Result<&Frame> {
        let global = self.index.resolve(frame)?;
        self.seek_resolved(global)
    }

    /// Reposition on frame 0.
    pub fn rewind(&mut self) -> Result<&Frame> {
        self.seek(0)
    }

    /// Read the next sequential frame; `Ok(None)` once the chain is
    /// exhausted, on this and every later call.
    pub fn advance(&mut self) -> Result<Option<&Frame>> {
        let next = match self.position {
            Position::Unopened => 0,
            Position::At(global) => global + 1,
            Position::Exhausted => return Ok(None),
        };
        if next >= self.index.n_frames() {
            self.position = Position::Exhausted;
            self.active = None;
            self.current = None;
            return Ok(None);
        }

        let (span_idx, local) = self.index.locate_resolved(next);
        let sequential = matches!(self.position, Position::At(_));

        let frame = match self.active.take() {
            // the active span continues, so stay on the decode path
            Some(mut active) if active.span_idx == span_idx && sequential => {
                let frame = match active.reader.next_frame()? {
                    Some(frame) => frame,
                    None => {
                        return Err(TrajError::Format {
                            uri: self.metas[self.index.spans()[span_idx].segment].uri.clone(),
                            reason: format!("segment ended before indexed frame {local}"),
                        });
                    }
                };
                self.active = Some(active);
                frame
            }
            Some(mut active) if active.span_idx == span_idx => {
                let frame = active.reader.read_frame(local)?;
                self.active = Some(active);
                frame
            }
            _ => {
                let mut active = self.open_span(span_idx)?;
                let frame = active.reader.read_frame(local)?;
                self.active = Some(active);
                frame
            }
        };

        self.position = Position::At(next);
        Ok(Some(self.current.insert(frame)))
    }

    /// Iterate over every frame in order. Equivalent to `slice(None, None,
    /// None)` but cannot fail to start.
    pub fn iter(&mut self) -> ChainSlice<'_> {
        let plan = SlicePlan {
            start: 0,
            step: 1,
            count: self.index.n_frames(),
        };
        ChainSlice::new(self, plan)
    }

    /// Iterate over a strided sub-range of the chain. Bounds follow
    /// sequence-slicing rules; only a zero step is rejected.
    pub fn slice(
        &mut self,
        start: Option<isize>,
        stop: Option<isize>,
        step: Option<isize>,
    ) -> Result<ChainSlice<'_>> {
        let plan = slice::plan(start, stop, step, self.index.n_frames())?;
        Ok(ChainSlice::new(self, plan))
    }

    /// Copy every frame of the chain into `writer`, finishing it. Returns
    /// the number of frames written.
    pub fn write_through(&mut self, writer: &mut dyn SegmentWriter) -> Result<usize> {
        let mut written = 0usize;
        for global in 0..self.index.n_frames() {
            let frame = self.seek_resolved(global)?.clone();
            writer.write_frame(&frame)?;
            written += 1;
        }
        writer.finish()?;
        tracing::debug!(frames = written, "chain copied through writer");
        Ok(written)
    }

    fn seek_resolved(&mut self, global: usize) -> Result<&Frame> {
        let (span_idx, local) = self.index.locate_resolved(global);
        let mut active = match self.active.take() {
            Some(active) if active.span_idx == span_idx => active,
            _ => self.open_span(span_idx)?,
        };
        let frame = active.reader.read_frame(local)?;
        self.active = Some(active);
        self.position = Position::At(global);
        Ok(self.current.insert(frame))
    }

    fn open_span(&self, span_idx: usize) -> Result<ActiveSegment> {
        let span = self.index.spans()[span_idx];
        let source = &self.sources[span.segment];
        tracing::debug!(segment = %source.uri(), span = span_idx, "switching active segment");
        let (reader, _) = open_source(&self.registry, source)?;
        Ok(ActiveSegment { span_idx, reader })
    }
}

fn open_source(
    registry: &FormatRegistry,
    source: &SegmentSource,
) -> Result<(Box<dyn SegmentReader>, &'static str)> {
    let hint = FormatHint::for_path(&source.path, source.format.as_deref());
    let Some(format) = registry.find_format(&hint) else {
        return Err(TrajError::UnknownFormat { uri: source.uri() });
    };
    Ok((format.open(&source.path)?, format.name()))
}

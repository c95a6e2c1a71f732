//! Plain-text XYZ-flavored trajectory format (`.xyz`).
//!
//! Each frame block is: a line with the atom count, a comment line
//! carrying `step=<int> time=<float>`, then one `X <x> <y> <z>` line per
//! atom. Records have variable byte length, so the reader indexes the
//! byte offset of every block on open and seeks through that table.

use std::io::{BufRead, BufReader, BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

use fs_err::File;

use crate::error::{Result, TrajError};
use crate::types::Frame;

use super::{FormatHint, SegmentReader, SegmentWriter, TrajectoryFormat};

/// The built-in text format.
pub struct XyzFormat;

impl TrajectoryFormat for XyzFormat {
    fn name(&self) -> &'static str {
        "xyz"
    }

    fn supports(&self, hint: &FormatHint<'_>) -> bool {
        hint.names(self.name())
    }

    fn open(&self, path: &Path) -> Result<Box<dyn SegmentReader>> {
        Ok(Box::new(XyzReader::open(path)?))
    }

    fn create(&self, path: &Path, n_atoms: usize) -> Result<Box<dyn SegmentWriter>> {
        Ok(Box::new(XyzWriter::create(path, n_atoms)?))
    }
}

/// Random-access reader over one `.xyz` file, backed by a frame offset
/// table built during a single indexing pass at open.
#[derive(Debug)]
pub struct XyzReader {
    reader: BufReader<File>,
    uri: String,
    n_atoms: usize,
    offsets: Vec<u64>,
    steps: Vec<i64>,
    times: Vec<f64>,
    cursor: usize,
}

impl XyzReader {
    pub fn open(path: &Path) -> Result<Self> {
        let uri = path.display().to_string();
        let mut reader = BufReader::new(File::open(path)?);

        let mut offsets = Vec::new();
        let mut steps = Vec::new();
        let mut times = Vec::new();
        let mut n_atoms = None;

        let mut pos = 0u64;
        let mut line = String::new();
        loop {
            let block_start = pos;
            line.clear();
            let read = reader.read_line(&mut line)?;
            if read == 0 {
                break;
            }
            pos += read as u64;
            let header = line.trim();
            if header.is_empty() {
                // tolerate trailing blank lines
                continue;
            }
            let count: usize = header
                .parse()
                .map_err(|_| format_err(&uri, "invalid atom count line"))?;
            match n_atoms {
                None => n_atoms = Some(count),
                Some(expected) if expected != count => {
                    return Err(TrajError::AtomCountMismatch {
                        uri,
                        expected,
                        got: count,
                    });
                }
                Some(_) => {}
            }

            line.clear();
            let read = reader.read_line(&mut line)?;
            if read == 0 {
                return Err(format_err(&uri, "truncated frame: missing comment line"));
            }
            pos += read as u64;
            let (step, time) = parse_comment(line.trim(), &uri)?;

            for _ in 0..count {
                line.clear();
                let read = reader.read_line(&mut line)?;
                if read == 0 {
                    return Err(format_err(&uri, "truncated frame: missing atom line"));
                }
                pos += read as u64;
            }

            offsets.push(block_start);
            steps.push(step);
            times.push(time);
        }

        Ok(Self {
            reader,
            uri,
            n_atoms: n_atoms.unwrap_or(0),
            offsets,
            steps,
            times,
            cursor: 0,
        })
    }
}

impl SegmentReader for XyzReader {
    fn n_atoms(&self) -> usize {
        self.n_atoms
    }

    fn n_frames(&self) -> usize {
        self.offsets.len()
    }

    fn order_key(&self, local_frame: usize) -> f64 {
        self.steps[local_frame] as f64
    }

    fn time(&self, local_frame: usize) -> f64 {
        self.times[local_frame]
    }

    fn read_frame(&mut self, local_frame: usize) -> Result<Frame> {
        let Some(&offset) = self.offsets.get(local_frame) else {
            return Err(format_err(
                &self.uri,
                &format!("frame {local_frame} beyond segment end"),
            ));
        };
        self.reader.seek(SeekFrom::Start(offset))?;

        let mut line = String::new();
        self.reader.read_line(&mut line)?;
        let count: usize = line
            .trim()
            .parse()
            .map_err(|_| format_err(&self.uri, "invalid atom count line"))?;

        line.clear();
        self.reader.read_line(&mut line)?;
        let (step, time) = parse_comment(line.trim(), &self.uri)?;

        let mut positions = Vec::with_capacity(count);
        for _ in 0..count {
            line.clear();
            if self.reader.read_line(&mut line)? == 0 {
                return Err(format_err(&self.uri, "truncated frame: missing atom line"));
            }
            positions.push(parse_atom_line(line.trim(), &self.uri)?);
        }

        self.cursor = local_frame + 1;
        Ok(Frame::new(step, time, positions))
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.cursor >= self.offsets.len() {
            return Ok(None);
        }
        self.read_frame(self.cursor).map(Some)
    }
}

/// Append-only writer producing an `.xyz` file.
///
/// Floats are written with Rust's shortest round-trip formatting, so a
/// write/read cycle reproduces coordinates bit-exactly.
pub struct XyzWriter {
    out: BufWriter<File>,
    uri: String,
    n_atoms: usize,
}

impl XyzWriter {
    pub fn create(path: &Path, n_atoms: usize) -> Result<Self> {
        let uri = path.display().to_string();
        let file = File::create(path)?;
        Ok(Self {
            out: BufWriter::new(file),
            uri,
            n_atoms,
        })
    }
}

impl SegmentWriter for XyzWriter {
    fn n_atoms(&self) -> usize {
        self.n_atoms
    }

    fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        if frame.n_atoms() != self.n_atoms {
            return Err(TrajError::AtomCountMismatch {
                uri: self.uri.clone(),
                expected: self.n_atoms,
                got: frame.n_atoms(),
            });
        }
        writeln!(self.out, "{}", self.n_atoms)?;
        writeln!(self.out, "step={} time={}", frame.step, frame.time)?;
        for [x, y, z] in &frame.positions {
            writeln!(self.out, "X {x} {y} {z}")?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.out.flush()?;
        self.out.get_ref().sync_all()?;
        Ok(())
    }
}

fn parse_comment(line: &str, uri: &str) -> Result<(i64, f64)> {
    let mut step = None;
    let mut time = None;
    for token in line.split_whitespace() {
        if let Some(value) = token.strip_prefix("step=") {
            step = value.parse::<i64>().ok();
        } else if let Some(value) = token.strip_prefix("time=") {
            time = value.parse::<f64>().ok();
        }
    }
    if let (Some(step), Some(time)) = (step, time) {
        Ok((step, time))
    } else {
        Err(format_err(uri, "comment line missing step=/time="))
    }
}

fn parse_atom_line(line: &str, uri: &str) -> Result<[f32; 3]> {
    let mut fields = line.split_whitespace();
    let _symbol = fields
        .next()
        .ok_or_else(|| format_err(uri, "empty atom line"))?;
    let mut triple = [0.0f32; 3];
    for slot in &mut triple {
        *slot = fields
            .next()
            .and_then(|field| field.parse().ok())
            .ok_or_else(|| format_err(uri, "atom line does not hold three coordinates"))?;
    }
    Ok(triple)
}

fn format_err(uri: &str, reason: &str) -> TrajError {
    TrajError::Format {
        uri: uri.to_string(),
        reason: reason.to_string(),
    }
}

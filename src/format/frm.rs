//! Fixed-record binary trajectory format (`.frm`).
//!
//! Layout: a 10-byte header `[magic "TRJ1"][version: u16][n_atoms: u32]`,
//! then one fixed-size record per frame: `[step: i64][time: f64]` followed
//! by `3 * n_atoms` coordinates as `f32`. Everything little-endian. The
//! fixed record size gives O(1) seeks without an offset table.

use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use fs_err::File;

use crate::error::{Result, TrajError};
use crate::types::Frame;

use super::{FormatHint, SegmentReader, SegmentWriter, TrajectoryFormat};

const MAGIC: [u8; 4] = *b"TRJ1";
const VERSION: u16 = 1;
const HEADER_SIZE: u64 = 10;
// step + time prefix of each record
const RECORD_PREFIX: u64 = 16;

/// The built-in binary format.
pub struct FrmFormat;

impl TrajectoryFormat for FrmFormat {
    fn name(&self) -> &'static str {
        "frm"
    }

    fn supports(&self, hint: &FormatHint<'_>) -> bool {
        hint.names(self.name())
    }

    fn open(&self, path: &Path) -> Result<Box<dyn SegmentReader>> {
        Ok(Box::new(FrmReader::open(path)?))
    }

    fn create(&self, path: &Path, n_atoms: usize) -> Result<Box<dyn SegmentWriter>> {
        Ok(Box::new(FrmWriter::create(path, n_atoms)?))
    }
}

/// Random-access reader over one `.frm` file.
///
/// The step and time of every frame are scanned once at open so overlap
/// resolution never needs to reopen the file; coordinates stay on disk
/// until a frame is actually requested.
#[derive(Debug)]
pub struct FrmReader {
    file: File,
    uri: String,
    n_atoms: usize,
    steps: Vec<i64>,
    times: Vec<f64>,
    cursor: usize,
}

impl FrmReader {
    pub fn open(path: &Path) -> Result<Self> {
        let uri = path.display().to_string();
        let mut file = File::open(path)?;

        let mut header = [0u8; HEADER_SIZE as usize];
        file.read_exact(&mut header)?;
        if header[..4] != MAGIC {
            return Err(format_err(&uri, "bad magic, not a frm trajectory"));
        }
        let version = u16::from_le_bytes([header[4], header[5]]);
        if version != VERSION {
            return Err(format_err(&uri, &format!("unsupported version {version}")));
        }
        let n_atoms = u32::from_le_bytes([header[6], header[7], header[8], header[9]]) as usize;

        let record_size = RECORD_PREFIX + 12 * n_atoms as u64;
        let body = file.metadata()?.len().saturating_sub(HEADER_SIZE);
        if body % record_size != 0 {
            return Err(format_err(&uri, "truncated frame record"));
        }
        let n_frames = (body / record_size) as usize;

        // One pass over the record prefixes; coordinate payloads are
        // skipped, not read.
        let mut steps = Vec::with_capacity(n_frames);
        let mut times = Vec::with_capacity(n_frames);
        file.seek(SeekFrom::Start(HEADER_SIZE))?;
        for _ in 0..n_frames {
            let mut prefix = [0u8; RECORD_PREFIX as usize];
            file.read_exact(&mut prefix)?;
            steps.push(i64::from_le_bytes([
                prefix[0], prefix[1], prefix[2], prefix[3], prefix[4], prefix[5], prefix[6],
                prefix[7],
            ]));
            times.push(f64::from_le_bytes([
                prefix[8], prefix[9], prefix[10], prefix[11], prefix[12], prefix[13], prefix[14],
                prefix[15],
            ]));
            file.seek(SeekFrom::Current(12 * n_atoms as i64))?;
        }

        Ok(Self {
            file,
            uri,
            n_atoms,
            steps,
            times,
            cursor: 0,
        })
    }

    fn record_offset(&self, local_frame: usize) -> u64 {
        HEADER_SIZE + local_frame as u64 * (RECORD_PREFIX + 12 * self.n_atoms as u64)
    }
}

impl SegmentReader for FrmReader {
    fn n_atoms(&self) -> usize {
        self.n_atoms
    }

    fn n_frames(&self) -> usize {
        self.steps.len()
    }

    fn order_key(&self, local_frame: usize) -> f64 {
        self.steps[local_frame] as f64
    }

    fn time(&self, local_frame: usize) -> f64 {
        self.times[local_frame]
    }

    fn read_frame(&mut self, local_frame: usize) -> Result<Frame> {
        if local_frame >= self.steps.len() {
            return Err(format_err(
                &self.uri,
                &format!("frame {local_frame} beyond segment end"),
            ));
        }
        self.file
            .seek(SeekFrom::Start(self.record_offset(local_frame) + RECORD_PREFIX))?;
        let mut buf = vec![0u8; self.n_atoms * 12];
        self.file.read_exact(&mut buf)?;

        let mut positions = Vec::with_capacity(self.n_atoms);
        for atom in buf.chunks_exact(12) {
            let mut triple = [0.0f32; 3];
            for (slot, word) in triple.iter_mut().zip(atom.chunks_exact(4)) {
                *slot = f32::from_le_bytes([word[0], word[1], word[2], word[3]]);
            }
            positions.push(triple);
        }

        self.cursor = local_frame + 1;
        Ok(Frame::new(
            self.steps[local_frame],
            self.times[local_frame],
            positions,
        ))
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.cursor >= self.steps.len() {
            return Ok(None);
        }
        self.read_frame(self.cursor).map(Some)
    }
}

/// Append-only writer producing a `.frm` file.
pub struct FrmWriter {
    out: BufWriter<File>,
    uri: String,
    n_atoms: usize,
}

impl FrmWriter {
    pub fn create(path: &Path, n_atoms: usize) -> Result<Self> {
        let uri = path.display().to_string();
        let file = File::create(path)?;
        let mut out = BufWriter::new(file);
        out.write_all(&MAGIC)?;
        out.write_all(&VERSION.to_le_bytes())?;
        out.write_all(&(n_atoms as u32).to_le_bytes())?;
        Ok(Self { out, uri, n_atoms })
    }
}

impl SegmentWriter for FrmWriter {
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
        self.out.write_all(&frame.step.to_le_bytes())?;
        self.out.write_all(&frame.time.to_le_bytes())?;
        for triple in &frame.positions {
            for coord in triple {
                self.out.write_all(&coord.to_le_bytes())?;
            }
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.out.flush()?;
        self.out.get_ref().sync_all()?;
        Ok(())
    }
}

fn format_err(uri: &str, reason: &str) -> TrajError {
    TrajError::Format {
        uri: uri.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_fixture(path: &Path, steps: &[i64]) {
        let mut writer = FrmWriter::create(path, 2).expect("create");
        for &step in steps {
            let frame = Frame::new(
                step,
                step as f64,
                vec![[step as f32, 0.0, 1.0], [0.5, step as f32, -1.0]],
            );
            writer.write_frame(&frame).expect("write frame");
        }
        writer.finish().expect("finish");
    }

    #[test]
    fn round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("seg.frm");
        write_fixture(&path, &[0, 1, 2, 3]);

        let mut reader = FrmReader::open(&path).expect("open");
        assert_eq!(reader.n_atoms(), 2);
        assert_eq!(reader.n_frames(), 4);
        assert_eq!(reader.order_key(3), 3.0);
        assert_eq!(reader.time(2), 2.0);

        let frame = reader.read_frame(2).expect("read");
        assert_eq!(frame.step, 2);
        assert_eq!(frame.positions[0], [2.0, 0.0, 1.0]);

        // sequential decode continues after the seek
        let next = reader.next_frame().expect("next").expect("frame");
        assert_eq!(next.step, 3);
        assert!(reader.next_frame().expect("next").is_none());
    }

    #[test]
    fn rejects_bad_magic() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bogus.frm");
        std::fs::write(&path, b"NOPE........").unwrap();

        let err = FrmReader::open(&path).expect_err("should fail");
        assert!(matches!(err, TrajError::Format { .. }));
    }

    #[test]
    fn writer_rejects_wrong_atom_count() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("seg.frm");
        let mut writer = FrmWriter::create(&path, 2).expect("create");

        let frame = Frame::new(0, 0.0, vec![[0.0, 0.0, 0.0]]);
        let err = writer.write_frame(&frame).expect_err("should fail");
        assert!(matches!(err, TrajError::AtomCountMismatch { .. }));
    }

    #[test]
    fn truncated_file_detected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("seg.frm");
        write_fixture(&path, &[0, 1]);

        let full = std::fs::read(&path).unwrap();
        std::fs::write(&path, &full[..full.len() - 5]).unwrap();

        let err = FrmReader::open(&path).expect_err("should fail");
        assert!(matches!(err, TrajError::Format { .. }));
    }
}

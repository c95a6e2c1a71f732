#![deny(clippy::all, clippy::pedantic)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![cfg_attr(
    test,
    allow(
        clippy::useless_vec,
        clippy::uninlined_format_args,
        clippy::cast_possible_truncation,
        clippy::float_cmp,
        clippy::cast_precision_loss
    )
)]
#![allow(clippy::module_name_repetitions)]
//
// Strategic lint exceptions, allowed project-wide:
//
// Documentation lints: self-documenting internal functions don't need
// extensive docs. Public APIs should still carry proper documentation.
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
//
// Cast safety: casts between frame counts, byte offsets and signed frame
// numbers are bounded by real file sizes; try_into() everywhere would add
// noise without a safety benefit here.
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
//
// Low-value pedantic lints that add noise:
#![allow(clippy::needless_range_loop)]
#![allow(clippy::len_without_is_empty)] // Span and index types don't need is_empty()
#![allow(clippy::iter_without_into_iter)] // iter() seeks, so it needs &mut self
#![allow(clippy::return_self_not_must_use)] // Builder methods don't need must_use each
#![allow(clippy::unnecessary_wraps)] // Some functions keep Result for API consistency

//! Read a set of trajectory segment files as one logical trajectory.
//!
//! Long simulations land on disk as many segment files, often with
//! overlapping restart frames. [`ChainReader`] presents them as a single
//! trajectory addressed by global frame number: verbatim concatenation by
//! default, or continuous stitching that drops every duplicated frame when
//! [`ChainOptions::continuous`] is set.
//!
//! ```no_run
//! use trajchain::{ChainOptions, ChainReader};
//!
//! # fn main() -> trajchain::Result<()> {
//! let options = ChainOptions::builder().continuous(true).build();
//! let mut chain = ChainReader::open(["part1.frm", "part2.frm"], options)?;
//!
//! let last_step = chain.seek(-1)?.step;
//! println!("{} frames, last step {}", chain.n_frames(), last_step);
//!
//! for frame in chain.slice(Some(0), None, Some(10))? {
//!     let frame = frame?;
//!     println!("step {} at time {}", frame.step, frame.time);
//! }
//! # Ok(())
//! # }
//! ```

/// The trajchain crate version (matches `Cargo.toml`).
pub const TRAJCHAIN_VERSION: &str = env!("CARGO_PKG_VERSION");

mod chain;
mod error;
pub mod format;
mod types;

pub use chain::{ChainIndex, ChainReader, ChainSlice, SegmentSpan};
pub use error::{Result, TrajError};
pub use format::{FormatHint, FormatRegistry, SegmentReader, SegmentWriter, TrajectoryFormat};
pub use types::{ChainOptions, ChainOptionsBuilder, Frame, SegmentMeta, SegmentSource};

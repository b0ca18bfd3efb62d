//! # mp4stream
//!
//! A reader for the ISO Base Media File Format (ISO/IEC 14496-12), better
//! known as the MP4 container.
//!
//! Given any seekable byte source, the crate walks the hierarchical box
//! structure, decodes the well-known metadata boxes, and fuses each track's
//! compressed sample tables (`stco`/`stsc`/`stsz`/`stts`/`ctts`) into dense
//! per-sample records: byte offset, size, decoding timestamp, duration, and
//! composition-time offset.
//!
//! ## Features
//! - Box walker over any `Read + Seek` source via the [`ByteSource`] trait
//! - Typed parsers for the common `moov` metadata subtree
//! - Per-track [`Chunk`] and [`Sample`] tables materialized after parsing
//! - Strict validation: truncated tables, malformed sizes, and inconsistent
//!   sample counts are all reported as typed errors
//!
//! Fragmented MP4 (`moof`), 64-bit `largesize` boxes, and `uuid` boxes are
//! out of scope and rejected or skipped.
//!
//! # Quick start
//!
//! ```no_run
//! use mp4stream::Mp4File;
//!
//! fn main() -> mp4stream::Result<()> {
//!     let mp4 = Mp4File::open("video.mp4")?;
//!     println!("brand: {}", mp4.ftyp.major_brand);
//!
//!     for trak in &mp4.moov.traks {
//!         println!(
//!             "track {:?}: {} chunks, {} samples",
//!             trak.track_id(),
//!             trak.chunks.len(),
//!             trak.samples.len()
//!         );
//!         if let Some(first) = trak.samples.first() {
//!             println!("  first sample: {} bytes at offset {}", first.size, first.offset);
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod boxes;
pub mod error;
pub mod file;
pub mod fixed;
pub mod parser;
pub mod samples;
pub mod source;

pub use boxes::{BoxHeader, FourCC};
pub use error::{Error, Result};
pub use file::Mp4File;
pub use fixed::{Fixed16, Fixed32};
pub use parser::{BoxWalker, read_box_header};
pub use samples::{Chunk, Sample};
pub use source::{ByteSource, ReaderSource};

use std::io;

use crate::boxes::FourCC;

/// Errors surfaced by box parsing and sample-table materialization.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("io: {0}")]
    Io(io::Error),

    /// A read came up short of the requested length.
    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("malformed box at offset {offset}: {reason}")]
    MalformedBox { offset: u64, reason: String },

    /// Size 0 (to-EOF) and size 1 (64-bit largesize follows) box forms.
    #[error("unsupported size {size} for {typ} box at offset {offset}")]
    UnsupportedBoxSize {
        typ: FourCC,
        offset: u64,
        size: u32,
    },

    #[error("{typ} table needs {needed} payload bytes, only {have} present")]
    TruncatedTable { typ: FourCC, needed: u64, have: u64 },

    #[error("fixed-point value needs {expected} bytes, got {got}")]
    LengthMismatch { expected: usize, got: usize },

    #[error("missing required box: {0}")]
    MissingRequiredBox(&'static str),

    #[error("inconsistent sample tables in track {track_id}: {detail}")]
    InconsistentSampleTables { track_id: u32, detail: String },
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            Error::UnexpectedEof
        } else {
            Error::Io(e)
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

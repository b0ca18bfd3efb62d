use std::fs::File;
use std::path::Path;

use log::{debug, warn};

use crate::boxes::{BoxHeader, FtypBox, MoovBox, UdtaBox};
use crate::error::{Error, Result};
use crate::parser::{BoxWalker, read_payload};
use crate::samples::{Sample, build_track_tables};
use crate::source::{ByteSource, ReaderSource};

/// A fully parsed MP4 file: the box tree plus per-track chunk and sample
/// tables.
///
/// Parsing is all-or-nothing; any failure drops the partially built tree
/// along with the source. The tree is immutable once `parse` returns.
#[derive(Debug)]
pub struct Mp4File<S> {
    src: S,
    size: u64,
    pub ftyp: FtypBox,
    pub moov: MoovBox,
    /// Header only; the media payload is never read during parsing.
    pub mdat: BoxHeader,
    /// Top-level user data, distinct from `moov.udta`.
    pub udta: Option<UdtaBox>,
}

impl Mp4File<ReaderSource<File>> {
    /// Open and parse a file on disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::parse(ReaderSource::open(path)?)
    }
}

impl<S: ByteSource> Mp4File<S> {
    /// Parse the whole top-level box sequence, then materialize the sample
    /// tables of every track.
    pub fn parse(mut src: S) -> Result<Self> {
        let size = src.size();
        debug!("parsing {size} byte source");

        let mut ftyp = None;
        let mut moov = None;
        let mut mdat = None;
        let mut udta = None;

        let headers: Vec<BoxHeader> = BoxWalker::new(&mut src, 0, size).collect::<Result<_>>()?;
        for hdr in headers {
            match &hdr.typ.0 {
                b"ftyp" => {
                    reject_duplicate(ftyp.is_none(), &hdr)?;
                    let data = read_payload(&mut src, &hdr)?;
                    ftyp = Some(FtypBox::parse(hdr, &data)?);
                }
                b"moov" => {
                    reject_duplicate(moov.is_none(), &hdr)?;
                    moov = Some(MoovBox::parse(&mut src, hdr)?);
                }
                b"mdat" => {
                    reject_duplicate(mdat.is_none(), &hdr)?;
                    mdat = Some(hdr);
                }
                b"udta" => udta = Some(UdtaBox::parse(&mut src, hdr)?),
                _ => warn!("skipping unhandled top-level box: {}", hdr.typ),
            }
        }

        let mut file = Self {
            src,
            size,
            ftyp: ftyp.ok_or(Error::MissingRequiredBox("ftyp"))?,
            moov: moov.ok_or(Error::MissingRequiredBox("moov"))?,
            mdat: mdat.ok_or(Error::MissingRequiredBox("mdat"))?,
            udta,
        };

        for trak in &mut file.moov.traks {
            build_track_tables(trak)?;
        }
        debug!(
            "materialized sample tables for {} track(s)",
            file.moov.traks.len()
        );

        Ok(file)
    }

    /// Total size of the underlying source in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Read the raw bytes of one materialized sample.
    pub fn sample_data(&mut self, sample: &Sample) -> Result<Vec<u8>> {
        self.src.read_at(sample.size as u64, sample.offset as u64)
    }
}

fn reject_duplicate(absent: bool, hdr: &BoxHeader) -> Result<()> {
    if absent {
        Ok(())
    } else {
        Err(Error::MalformedBox {
            offset: hdr.start,
            reason: format!("duplicate top-level {} box", hdr.typ),
        })
    }
}

//! Typed views over the recognized ISO BMFF box set.
//!
//! Leaf boxes parse from `(BoxHeader, payload bytes)`; container boxes take
//! the byte source and recurse through the walker. Unknown children are
//! logged and skipped, never fatal.

use std::fmt;
use std::io::{Cursor, Read};

use byteorder::{BigEndian, ReadBytesExt};
use log::warn;

use crate::error::{Error, Result};
use crate::fixed::{Fixed16, Fixed32};
use crate::parser::{BoxWalker, read_payload, walk_children};
use crate::samples::{Chunk, Sample};
use crate::source::ByteSource;

pub const BOX_HEADER_SIZE: u64 = 8;

#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    pub fn as_str_lossy(&self) -> String {
        self.0
            .iter()
            .map(|&c| if (32..=126).contains(&c) { c as char } else { '.' })
            .collect()
    }

    pub fn is_printable(&self) -> bool {
        self.0.iter().all(|c| (32..=126).contains(c))
    }
}

impl fmt::Debug for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str_lossy())
    }
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str_lossy())
    }
}

/// The 8-byte header every box starts with, plus where it sits in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxHeader {
    pub typ: FourCC,
    /// Total box size in bytes, header included.
    pub size: u32,
    /// Absolute file offset of the header.
    pub start: u64,
}

impl BoxHeader {
    pub fn payload_offset(&self) -> u64 {
        self.start + BOX_HEADER_SIZE
    }

    pub fn payload_len(&self) -> u64 {
        self.size as u64 - BOX_HEADER_SIZE
    }

    pub fn end(&self) -> u64 {
        self.start + self.size as u64
    }
}

// ---------- decode helpers ----------

fn read_version_flags(cur: &mut Cursor<&[u8]>) -> Result<(u8, [u8; 3])> {
    let version = cur.read_u8()?;
    let mut flags = [0u8; 3];
    cur.read_exact(&mut flags)?;
    Ok((version, flags))
}

fn read_fixed16(cur: &mut Cursor<&[u8]>) -> Result<Fixed16> {
    let mut raw = [0u8; 2];
    cur.read_exact(&mut raw)?;
    Fixed16::from_bytes(&raw)
}

fn read_fixed32(cur: &mut Cursor<&[u8]>) -> Result<Fixed32> {
    let mut raw = [0u8; 4];
    cur.read_exact(&mut raw)?;
    Fixed32::from_bytes(&raw)
}

/// Entry-count tables must fit their payload: `fixed` header bytes plus
/// `entries * stride`.
fn check_table(typ: FourCC, have: usize, fixed: u64, entries: u32, stride: u64) -> Result<()> {
    let needed = fixed + entries as u64 * stride;
    if (have as u64) < needed {
        return Err(Error::TruncatedTable {
            typ,
            needed,
            have: have as u64,
        });
    }
    Ok(())
}

fn rest(cur: &mut Cursor<&[u8]>) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    cur.read_to_end(&mut buf)?;
    Ok(buf)
}

// ---------- leaf boxes ----------

/// `ftyp`: major/minor brand plus compatible brand list.
#[derive(Debug, Clone)]
pub struct FtypBox {
    pub header: BoxHeader,
    pub major_brand: FourCC,
    pub minor_version: [u8; 4],
    pub compatible_brands: Vec<FourCC>,
}

impl FtypBox {
    pub fn parse(header: BoxHeader, data: &[u8]) -> Result<Self> {
        if data.len() < 8 || data.len() % 4 != 0 {
            return Err(Error::MalformedBox {
                offset: header.start,
                reason: format!("ftyp payload of {} bytes is not 8 + 4n", data.len()),
            });
        }
        let mut cur = Cursor::new(data);
        let mut major = [0u8; 4];
        cur.read_exact(&mut major)?;
        let mut minor = [0u8; 4];
        cur.read_exact(&mut minor)?;

        let compatible_brands = data[8..]
            .chunks_exact(4)
            .map(|b| FourCC([b[0], b[1], b[2], b[3]]))
            .collect();

        Ok(Self {
            header,
            major_brand: FourCC(major),
            minor_version: minor,
            compatible_brands,
        })
    }
}

/// `mvhd`: movie-wide timescale, duration, rate, volume.
#[derive(Debug, Clone)]
pub struct MvhdBox {
    pub header: BoxHeader,
    pub version: u8,
    pub flags: [u8; 3],
    pub creation_time: u32,
    pub modification_time: u32,
    pub timescale: u32,
    pub duration: u32,
    pub rate: Fixed32,
    pub volume: Fixed16,
    /// Reserved words, matrix, and next_track_id, kept raw.
    pub remainder: Vec<u8>,
}

impl MvhdBox {
    pub fn parse(header: BoxHeader, data: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(data);
        let (version, flags) = read_version_flags(&mut cur)?;
        let creation_time = cur.read_u32::<BigEndian>()?;
        let modification_time = cur.read_u32::<BigEndian>()?;
        let timescale = cur.read_u32::<BigEndian>()?;
        let duration = cur.read_u32::<BigEndian>()?;
        let rate = read_fixed32(&mut cur)?;
        let volume = read_fixed16(&mut cur)?;
        let remainder = rest(&mut cur)?;

        Ok(Self {
            header,
            version,
            flags,
            creation_time,
            modification_time,
            timescale,
            duration,
            rate,
            volume,
            remainder,
        })
    }
}

/// `iods`: object descriptor, payload kept opaque.
#[derive(Debug, Clone)]
pub struct IodsBox {
    pub header: BoxHeader,
    pub data: Vec<u8>,
}

impl IodsBox {
    pub fn parse(header: BoxHeader, data: &[u8]) -> Result<Self> {
        Ok(Self {
            header,
            data: data.to_vec(),
        })
    }
}

/// `tkhd`: per-track header.
#[derive(Debug, Clone)]
pub struct TkhdBox {
    pub header: BoxHeader,
    pub version: u8,
    pub flags: [u8; 3],
    pub creation_time: u32,
    pub modification_time: u32,
    pub track_id: u32,
    pub duration: u32,
    pub layer: i16,
    pub alternate_group: i16,
    pub volume: Fixed16,
    pub matrix: [u8; 36],
    pub width: Fixed32,
    pub height: Fixed32,
}

impl TkhdBox {
    pub fn parse(header: BoxHeader, data: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(data);
        let (version, flags) = read_version_flags(&mut cur)?;
        let creation_time = cur.read_u32::<BigEndian>()?;
        let modification_time = cur.read_u32::<BigEndian>()?;
        let track_id = cur.read_u32::<BigEndian>()?;
        let _reserved = cur.read_u32::<BigEndian>()?;
        let duration = cur.read_u32::<BigEndian>()?;
        let _reserved = cur.read_u64::<BigEndian>()?;
        let layer = cur.read_i16::<BigEndian>()?;
        let alternate_group = cur.read_i16::<BigEndian>()?;
        let volume = read_fixed16(&mut cur)?;
        let _reserved = cur.read_u16::<BigEndian>()?;
        let mut matrix = [0u8; 36];
        cur.read_exact(&mut matrix)?;
        let width = read_fixed32(&mut cur)?;
        let height = read_fixed32(&mut cur)?;

        Ok(Self {
            header,
            version,
            flags,
            creation_time,
            modification_time,
            track_id,
            duration,
            layer,
            alternate_group,
            volume,
            matrix,
            width,
            height,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElstEntry {
    pub segment_duration: u32,
    pub media_time: u32,
    pub media_rate_integer: i16,
    pub media_rate_fraction: i16,
}

/// `elst`: edit list.
#[derive(Debug, Clone)]
pub struct ElstBox {
    pub header: BoxHeader,
    pub version: u8,
    pub flags: [u8; 3],
    pub entry_count: u32,
    pub entries: Vec<ElstEntry>,
}

impl ElstBox {
    pub fn parse(header: BoxHeader, data: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(data);
        let (version, flags) = read_version_flags(&mut cur)?;
        let entry_count = cur.read_u32::<BigEndian>()?;
        check_table(header.typ, data.len(), 8, entry_count, 12)?;

        let mut entries = Vec::with_capacity(entry_count as usize);
        for _ in 0..entry_count {
            entries.push(ElstEntry {
                segment_duration: cur.read_u32::<BigEndian>()?,
                media_time: cur.read_u32::<BigEndian>()?,
                media_rate_integer: cur.read_i16::<BigEndian>()?,
                media_rate_fraction: cur.read_i16::<BigEndian>()?,
            });
        }

        Ok(Self {
            header,
            version,
            flags,
            entry_count,
            entries,
        })
    }
}

/// `mdhd`: media timescale, duration, packed language.
#[derive(Debug, Clone)]
pub struct MdhdBox {
    pub header: BoxHeader,
    pub version: u8,
    pub flags: [u8; 3],
    pub creation_time: u32,
    pub modification_time: u32,
    pub timescale: u32,
    pub duration: u32,
    /// 1 pad bit + 15-bit packed ISO-639 code.
    pub language: u16,
}

impl MdhdBox {
    pub fn parse(header: BoxHeader, data: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(data);
        let (version, flags) = read_version_flags(&mut cur)?;
        let creation_time = cur.read_u32::<BigEndian>()?;
        let modification_time = cur.read_u32::<BigEndian>()?;
        let timescale = cur.read_u32::<BigEndian>()?;
        let duration = cur.read_u32::<BigEndian>()?;
        let language = cur.read_u16::<BigEndian>()?;

        Ok(Self {
            header,
            version,
            flags,
            creation_time,
            modification_time,
            timescale,
            duration,
            language,
        })
    }

    /// Unpack the 15-bit language field into its three-letter code.
    pub fn language_code(&self) -> String {
        let c1 = ((self.language >> 10) & 0x1F) as u8 + 0x60;
        let c2 = ((self.language >> 5) & 0x1F) as u8 + 0x60;
        let c3 = (self.language & 0x1F) as u8 + 0x60;
        format!("{}{}{}", c1 as char, c2 as char, c3 as char)
    }
}

/// `hdlr`: media handler type and name.
#[derive(Debug, Clone)]
pub struct HdlrBox {
    pub header: BoxHeader,
    pub version: u8,
    pub flags: [u8; 3],
    pub pre_defined: u32,
    pub handler_type: FourCC,
    pub track_name: String,
}

impl HdlrBox {
    pub fn parse(header: BoxHeader, data: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(data);
        let (version, flags) = read_version_flags(&mut cur)?;
        let pre_defined = cur.read_u32::<BigEndian>()?;
        let mut handler = [0u8; 4];
        cur.read_exact(&mut handler)?;
        let mut reserved = [0u8; 12];
        cur.read_exact(&mut reserved)?;
        let name_bytes = rest(&mut cur)?;
        let track_name = String::from_utf8_lossy(&name_bytes)
            .trim_end_matches('\0')
            .to_string();

        Ok(Self {
            header,
            version,
            flags,
            pre_defined,
            handler_type: FourCC(handler),
            track_name,
        })
    }
}

/// `vmhd`: video media header.
#[derive(Debug, Clone)]
pub struct VmhdBox {
    pub header: BoxHeader,
    pub version: u8,
    pub flags: [u8; 3],
    pub graphicsmode: u16,
    pub opcolor: [u16; 3],
}

impl VmhdBox {
    pub fn parse(header: BoxHeader, data: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(data);
        let (version, flags) = read_version_flags(&mut cur)?;
        let graphicsmode = cur.read_u16::<BigEndian>()?;
        let mut opcolor = [0u16; 3];
        for c in &mut opcolor {
            *c = cur.read_u16::<BigEndian>()?;
        }

        Ok(Self {
            header,
            version,
            flags,
            graphicsmode,
            opcolor,
        })
    }
}

/// `smhd`: sound media header.
#[derive(Debug, Clone)]
pub struct SmhdBox {
    pub header: BoxHeader,
    pub version: u8,
    pub flags: [u8; 3],
    pub balance: i16,
}

impl SmhdBox {
    pub fn parse(header: BoxHeader, data: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(data);
        let (version, flags) = read_version_flags(&mut cur)?;
        let balance = cur.read_i16::<BigEndian>()?;

        Ok(Self {
            header,
            version,
            flags,
            balance,
        })
    }
}

/// `dref`: data references; entries kept opaque.
#[derive(Debug, Clone)]
pub struct DrefBox {
    pub header: BoxHeader,
    pub version: u8,
    pub flags: [u8; 3],
    pub entry_count: u32,
    pub remainder: Vec<u8>,
}

impl DrefBox {
    pub fn parse(header: BoxHeader, data: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(data);
        let (version, flags) = read_version_flags(&mut cur)?;
        let entry_count = cur.read_u32::<BigEndian>()?;
        let remainder = rest(&mut cur)?;

        Ok(Self {
            header,
            version,
            flags,
            entry_count,
            remainder,
        })
    }
}

/// `stsd`: sample descriptions; codec-config payload kept opaque.
#[derive(Debug, Clone)]
pub struct StsdBox {
    pub header: BoxHeader,
    pub version: u8,
    pub flags: [u8; 3],
    pub entry_count: u32,
    pub remainder: Vec<u8>,
}

impl StsdBox {
    pub fn parse(header: BoxHeader, data: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(data);
        let (version, flags) = read_version_flags(&mut cur)?;
        let entry_count = cur.read_u32::<BigEndian>()?;
        let remainder = rest(&mut cur)?;

        Ok(Self {
            header,
            version,
            flags,
            entry_count,
            remainder,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SttsEntry {
    pub sample_count: u32,
    pub sample_delta: u32,
}

/// `stts`: decoding time-to-sample runs.
#[derive(Debug, Clone)]
pub struct SttsBox {
    pub header: BoxHeader,
    pub version: u8,
    pub flags: [u8; 3],
    pub entry_count: u32,
    pub entries: Vec<SttsEntry>,
}

impl SttsBox {
    pub fn parse(header: BoxHeader, data: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(data);
        let (version, flags) = read_version_flags(&mut cur)?;
        let entry_count = cur.read_u32::<BigEndian>()?;
        check_table(header.typ, data.len(), 8, entry_count, 8)?;

        let mut entries = Vec::with_capacity(entry_count as usize);
        for _ in 0..entry_count {
            entries.push(SttsEntry {
                sample_count: cur.read_u32::<BigEndian>()?,
                sample_delta: cur.read_u32::<BigEndian>()?,
            });
        }

        Ok(Self {
            header,
            version,
            flags,
            entry_count,
            entries,
        })
    }
}

/// `stss`: sync (key frame) sample numbers, 1-based.
#[derive(Debug, Clone)]
pub struct StssBox {
    pub header: BoxHeader,
    pub version: u8,
    pub flags: [u8; 3],
    pub entry_count: u32,
    pub sample_numbers: Vec<u32>,
}

impl StssBox {
    pub fn parse(header: BoxHeader, data: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(data);
        let (version, flags) = read_version_flags(&mut cur)?;
        let entry_count = cur.read_u32::<BigEndian>()?;
        check_table(header.typ, data.len(), 8, entry_count, 4)?;

        let mut sample_numbers = Vec::with_capacity(entry_count as usize);
        for _ in 0..entry_count {
            sample_numbers.push(cur.read_u32::<BigEndian>()?);
        }

        Ok(Self {
            header,
            version,
            flags,
            entry_count,
            sample_numbers,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StscEntry {
    pub first_chunk: u32,
    pub samples_per_chunk: u32,
    pub sample_description_index: u32,
}

/// `stsc`: sample-to-chunk runs.
#[derive(Debug, Clone)]
pub struct StscBox {
    pub header: BoxHeader,
    pub version: u8,
    pub flags: [u8; 3],
    pub entry_count: u32,
    pub entries: Vec<StscEntry>,
}

impl StscBox {
    pub fn parse(header: BoxHeader, data: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(data);
        let (version, flags) = read_version_flags(&mut cur)?;
        let entry_count = cur.read_u32::<BigEndian>()?;
        check_table(header.typ, data.len(), 8, entry_count, 12)?;

        let mut entries = Vec::with_capacity(entry_count as usize);
        for _ in 0..entry_count {
            entries.push(StscEntry {
                first_chunk: cur.read_u32::<BigEndian>()?,
                samples_per_chunk: cur.read_u32::<BigEndian>()?,
                sample_description_index: cur.read_u32::<BigEndian>()?,
            });
        }

        Ok(Self {
            header,
            version,
            flags,
            entry_count,
            entries,
        })
    }
}

/// `stsz`: sample sizes, either uniform or one entry per sample.
#[derive(Debug, Clone)]
pub struct StszBox {
    pub header: BoxHeader,
    pub version: u8,
    pub flags: [u8; 3],
    /// Shared size for every sample, or 0 when `entry_sizes` applies.
    pub sample_size: u32,
    pub sample_count: u32,
    pub entry_sizes: Vec<u32>,
}

impl StszBox {
    pub fn parse(header: BoxHeader, data: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(data);
        let (version, flags) = read_version_flags(&mut cur)?;
        let sample_size = cur.read_u32::<BigEndian>()?;
        let sample_count = cur.read_u32::<BigEndian>()?;

        let mut entry_sizes = Vec::new();
        if sample_size == 0 {
            check_table(header.typ, data.len(), 12, sample_count, 4)?;
            entry_sizes.reserve(sample_count as usize);
            for _ in 0..sample_count {
                entry_sizes.push(cur.read_u32::<BigEndian>()?);
            }
        }

        Ok(Self {
            header,
            version,
            flags,
            sample_size,
            sample_count,
            entry_sizes,
        })
    }
}

/// `stco`: 32-bit chunk offsets.
#[derive(Debug, Clone)]
pub struct StcoBox {
    pub header: BoxHeader,
    pub version: u8,
    pub flags: [u8; 3],
    pub entry_count: u32,
    pub chunk_offsets: Vec<u32>,
}

impl StcoBox {
    pub fn parse(header: BoxHeader, data: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(data);
        let (version, flags) = read_version_flags(&mut cur)?;
        let entry_count = cur.read_u32::<BigEndian>()?;
        check_table(header.typ, data.len(), 8, entry_count, 4)?;

        let mut chunk_offsets = Vec::with_capacity(entry_count as usize);
        for _ in 0..entry_count {
            chunk_offsets.push(cur.read_u32::<BigEndian>()?);
        }

        Ok(Self {
            header,
            version,
            flags,
            entry_count,
            chunk_offsets,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CttsEntry {
    pub sample_count: u32,
    pub sample_offset: u32,
}

/// `ctts`: composition-time offset runs.
#[derive(Debug, Clone)]
pub struct CttsBox {
    pub header: BoxHeader,
    pub version: u8,
    pub flags: [u8; 3],
    pub entry_count: u32,
    pub entries: Vec<CttsEntry>,
}

impl CttsBox {
    pub fn parse(header: BoxHeader, data: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(data);
        let (version, flags) = read_version_flags(&mut cur)?;
        let entry_count = cur.read_u32::<BigEndian>()?;
        check_table(header.typ, data.len(), 8, entry_count, 8)?;

        let mut entries = Vec::with_capacity(entry_count as usize);
        for _ in 0..entry_count {
            entries.push(CttsEntry {
                sample_count: cur.read_u32::<BigEndian>()?,
                sample_offset: cur.read_u32::<BigEndian>()?,
            });
        }

        Ok(Self {
            header,
            version,
            flags,
            entry_count,
            entries,
        })
    }
}

// ---------- container boxes ----------

/// `moov`: the movie metadata tree.
#[derive(Debug, Clone)]
pub struct MoovBox {
    pub header: BoxHeader,
    pub mvhd: Option<MvhdBox>,
    pub iods: Option<IodsBox>,
    pub traks: Vec<TrakBox>,
    pub udta: Option<UdtaBox>,
}

impl MoovBox {
    pub fn parse<S: ByteSource>(src: &mut S, header: BoxHeader) -> Result<Self> {
        let mut mvhd = None;
        let mut iods = None;
        let mut traks = Vec::new();
        let mut udta = None;

        for child in walk_children(src, &header)? {
            match &child.typ.0 {
                b"mvhd" => {
                    let data = read_payload(src, &child)?;
                    mvhd = Some(MvhdBox::parse(child, &data)?);
                }
                b"iods" => {
                    let data = read_payload(src, &child)?;
                    iods = Some(IodsBox::parse(child, &data)?);
                }
                b"trak" => traks.push(TrakBox::parse(src, child)?),
                b"udta" => udta = Some(UdtaBox::parse(src, child)?),
                _ => warn!("unhandled moov sub-box: {}", child.typ),
            }
        }

        Ok(Self {
            header,
            mvhd,
            iods,
            traks,
            udta,
        })
    }
}

/// `trak`: one media track. `chunks` and `samples` start empty and are
/// filled once by the materializer after the subtree is parsed.
#[derive(Debug, Clone)]
pub struct TrakBox {
    pub header: BoxHeader,
    pub tkhd: Option<TkhdBox>,
    pub edts: Option<EdtsBox>,
    pub mdia: Option<MdiaBox>,
    pub chunks: Vec<Chunk>,
    pub samples: Vec<Sample>,
}

impl TrakBox {
    pub fn parse<S: ByteSource>(src: &mut S, header: BoxHeader) -> Result<Self> {
        let mut tkhd = None;
        let mut edts = None;
        let mut mdia = None;

        for child in walk_children(src, &header)? {
            match &child.typ.0 {
                b"tkhd" => {
                    let data = read_payload(src, &child)?;
                    tkhd = Some(TkhdBox::parse(child, &data)?);
                }
                b"edts" => edts = Some(EdtsBox::parse(src, child)?),
                b"mdia" => mdia = Some(MdiaBox::parse(src, child)?),
                _ => warn!("unhandled trak sub-box: {}", child.typ),
            }
        }

        Ok(Self {
            header,
            tkhd,
            edts,
            mdia,
            chunks: Vec::new(),
            samples: Vec::new(),
        })
    }

    pub fn track_id(&self) -> Option<u32> {
        self.tkhd.as_ref().map(|t| t.track_id)
    }

    /// Handler fourcc from `mdia/hdlr` ("vide", "soun", ...).
    pub fn handler(&self) -> Option<FourCC> {
        self.mdia
            .as_ref()
            .and_then(|m| m.hdlr.as_ref())
            .map(|h| h.handler_type)
    }

    pub fn timescale(&self) -> Option<u32> {
        self.mdia.as_ref().and_then(|m| m.mdhd.as_ref()).map(|m| m.timescale)
    }

    pub fn duration(&self) -> Option<u32> {
        self.mdia.as_ref().and_then(|m| m.mdhd.as_ref()).map(|m| m.duration)
    }
}

/// `edts`: edit container.
#[derive(Debug, Clone)]
pub struct EdtsBox {
    pub header: BoxHeader,
    pub elst: Option<ElstBox>,
}

impl EdtsBox {
    pub fn parse<S: ByteSource>(src: &mut S, header: BoxHeader) -> Result<Self> {
        let mut elst = None;

        for child in walk_children(src, &header)? {
            match &child.typ.0 {
                b"elst" => {
                    let data = read_payload(src, &child)?;
                    elst = Some(ElstBox::parse(child, &data)?);
                }
                _ => warn!("unhandled edts sub-box: {}", child.typ),
            }
        }

        Ok(Self { header, elst })
    }
}

/// `mdia`: media container.
#[derive(Debug, Clone)]
pub struct MdiaBox {
    pub header: BoxHeader,
    pub mdhd: Option<MdhdBox>,
    pub hdlr: Option<HdlrBox>,
    pub minf: Option<MinfBox>,
}

impl MdiaBox {
    pub fn parse<S: ByteSource>(src: &mut S, header: BoxHeader) -> Result<Self> {
        let mut mdhd = None;
        let mut hdlr = None;
        let mut minf = None;

        for child in walk_children(src, &header)? {
            match &child.typ.0 {
                b"mdhd" => {
                    let data = read_payload(src, &child)?;
                    mdhd = Some(MdhdBox::parse(child, &data)?);
                }
                b"hdlr" => {
                    let data = read_payload(src, &child)?;
                    hdlr = Some(HdlrBox::parse(child, &data)?);
                }
                b"minf" => minf = Some(MinfBox::parse(src, child)?),
                _ => warn!("unhandled mdia sub-box: {}", child.typ),
            }
        }

        Ok(Self {
            header,
            mdhd,
            hdlr,
            minf,
        })
    }
}

/// `minf`: media information container.
#[derive(Debug, Clone)]
pub struct MinfBox {
    pub header: BoxHeader,
    pub vmhd: Option<VmhdBox>,
    pub smhd: Option<SmhdBox>,
    pub hdlr: Option<HdlrBox>,
    pub dinf: Option<DinfBox>,
    pub stbl: Option<StblBox>,
}

impl MinfBox {
    pub fn parse<S: ByteSource>(src: &mut S, header: BoxHeader) -> Result<Self> {
        let mut vmhd = None;
        let mut smhd = None;
        let mut hdlr = None;
        let mut dinf = None;
        let mut stbl = None;

        for child in walk_children(src, &header)? {
            match &child.typ.0 {
                b"vmhd" => {
                    let data = read_payload(src, &child)?;
                    vmhd = Some(VmhdBox::parse(child, &data)?);
                }
                b"smhd" => {
                    let data = read_payload(src, &child)?;
                    smhd = Some(SmhdBox::parse(child, &data)?);
                }
                b"hdlr" => {
                    let data = read_payload(src, &child)?;
                    hdlr = Some(HdlrBox::parse(child, &data)?);
                }
                b"dinf" => dinf = Some(DinfBox::parse(src, child)?),
                b"stbl" => stbl = Some(StblBox::parse(src, child)?),
                _ => warn!("unhandled minf sub-box: {}", child.typ),
            }
        }

        Ok(Self {
            header,
            vmhd,
            smhd,
            hdlr,
            dinf,
            stbl,
        })
    }
}

/// `dinf`: data information container.
#[derive(Debug, Clone)]
pub struct DinfBox {
    pub header: BoxHeader,
    pub dref: Option<DrefBox>,
}

impl DinfBox {
    pub fn parse<S: ByteSource>(src: &mut S, header: BoxHeader) -> Result<Self> {
        let mut dref = None;

        for child in walk_children(src, &header)? {
            match &child.typ.0 {
                b"dref" => {
                    let data = read_payload(src, &child)?;
                    dref = Some(DrefBox::parse(child, &data)?);
                }
                _ => warn!("unhandled dinf sub-box: {}", child.typ),
            }
        }

        Ok(Self { header, dref })
    }
}

/// `stbl`: the five compressed sample tables (plus `stss`/`ctts`).
#[derive(Debug, Clone)]
pub struct StblBox {
    pub header: BoxHeader,
    pub stsd: Option<StsdBox>,
    pub stts: Option<SttsBox>,
    pub stss: Option<StssBox>,
    pub stsc: Option<StscBox>,
    pub stsz: Option<StszBox>,
    pub stco: Option<StcoBox>,
    pub ctts: Option<CttsBox>,
}

impl StblBox {
    pub fn parse<S: ByteSource>(src: &mut S, header: BoxHeader) -> Result<Self> {
        let mut stsd = None;
        let mut stts = None;
        let mut stss = None;
        let mut stsc = None;
        let mut stsz = None;
        let mut stco = None;
        let mut ctts = None;

        for child in walk_children(src, &header)? {
            let data = read_payload(src, &child)?;
            match &child.typ.0 {
                b"stsd" => stsd = Some(StsdBox::parse(child, &data)?),
                b"stts" => stts = Some(SttsBox::parse(child, &data)?),
                b"stss" => stss = Some(StssBox::parse(child, &data)?),
                b"stsc" => stsc = Some(StscBox::parse(child, &data)?),
                b"stsz" => stsz = Some(StszBox::parse(child, &data)?),
                b"stco" => stco = Some(StcoBox::parse(child, &data)?),
                b"ctts" => ctts = Some(CttsBox::parse(child, &data)?),
                _ => warn!("unhandled stbl sub-box: {}", child.typ),
            }
        }

        Ok(Self {
            header,
            stsd,
            stts,
            stss,
            stsc,
            stsz,
            stco,
            ctts,
        })
    }
}

/// `udta`: user data container.
#[derive(Debug, Clone)]
pub struct UdtaBox {
    pub header: BoxHeader,
    pub meta: Option<MetaBox>,
}

impl UdtaBox {
    pub fn parse<S: ByteSource>(src: &mut S, header: BoxHeader) -> Result<Self> {
        let mut meta = None;

        for child in walk_children(src, &header)? {
            match &child.typ.0 {
                b"meta" => meta = Some(MetaBox::parse(src, child)?),
                _ => warn!("unhandled udta sub-box: {}", child.typ),
            }
        }

        Ok(Self { header, meta })
    }
}

/// `meta`: a full box whose payload is itself a box sequence. The sub-walk
/// starts 4 bytes in, past the version+flags prefix.
#[derive(Debug, Clone)]
pub struct MetaBox {
    pub header: BoxHeader,
    pub version: u8,
    pub flags: [u8; 3],
    pub hdlr: Option<HdlrBox>,
}

impl MetaBox {
    pub fn parse<S: ByteSource>(src: &mut S, header: BoxHeader) -> Result<Self> {
        if header.size < 12 {
            return Err(Error::MalformedBox {
                offset: header.start,
                reason: format!("meta box of size {} cannot hold version+flags", header.size),
            });
        }
        let prefix = src.read_at(4, header.payload_offset())?;
        let version = prefix[0];
        let flags = [prefix[1], prefix[2], prefix[3]];

        let mut hdlr = None;
        let children: Vec<BoxHeader> =
            BoxWalker::new(src, header.start + 12, header.size as u64 - 12).collect::<Result<_>>()?;
        for child in children {
            match &child.typ.0 {
                b"hdlr" => {
                    let data = read_payload(src, &child)?;
                    hdlr = Some(HdlrBox::parse(child, &data)?);
                }
                _ => warn!("unhandled meta sub-box: {}", child.typ),
            }
        }

        Ok(Self {
            header,
            version,
            flags,
            hdlr,
        })
    }
}

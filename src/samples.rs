//! Sample-table materialization: fuse a track's compact `stco`/`stsc`/
//! `stsz`/`stts`/`ctts` tables into dense per-chunk and per-sample records.

use serde::Serialize;

use crate::boxes::{StblBox, TrakBox};
use crate::error::{Error, Result};

/// A contiguous run of samples stored at a single file offset.
///
/// One per entry in the track's `stco`. `start_sample` is 1-based, matching
/// the numbering `stsc` and `stss` use on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Chunk {
    pub sample_description_index: u32,
    pub start_sample: u32,
    pub sample_count: u32,
    pub offset: u32,
}

/// One media sample: where it lives in the file and when it plays.
///
/// `start_time` is the decoding timestamp in track timescale units; `cto` is
/// the composition-time offset to add to it for the presentation timestamp.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Sample {
    pub size: u32,
    pub offset: u32,
    pub start_time: u32,
    pub duration: u32,
    pub cto: u32,
}

/// Build `trak.chunks` and `trak.samples` from the parsed sample tables.
///
/// Runs once per track after the `moov` subtree is parsed; the resulting
/// vectors are not touched again. Fails with `MissingRequiredBox` when the
/// `mdia/minf/stbl` path or one of the four mandatory tables is absent, and
/// with `InconsistentSampleTables` when the per-table sample totals
/// disagree.
pub(crate) fn build_track_tables(trak: &mut TrakBox) -> Result<()> {
    let track_id = trak.track_id().unwrap_or(0);
    let stbl = trak
        .mdia
        .as_ref()
        .ok_or(Error::MissingRequiredBox("mdia"))?
        .minf
        .as_ref()
        .ok_or(Error::MissingRequiredBox("minf"))?
        .stbl
        .as_ref()
        .ok_or(Error::MissingRequiredBox("stbl"))?;

    let stco = stbl.stco.as_ref().ok_or(Error::MissingRequiredBox("stco"))?;
    let stsc = stbl.stsc.as_ref().ok_or(Error::MissingRequiredBox("stsc"))?;
    let stsz = stbl.stsz.as_ref().ok_or(Error::MissingRequiredBox("stsz"))?;
    let stts = stbl.stts.as_ref().ok_or(Error::MissingRequiredBox("stts"))?;

    // (a) one chunk per stco entry, sample runs assigned from stsc
    let mut chunks = vec![Chunk::default(); stco.chunk_offsets.len()];
    for (chunk, &offset) in chunks.iter_mut().zip(&stco.chunk_offsets) {
        chunk.offset = offset;
    }

    let mut sample_num = 1u32;
    for (i, entry) in stsc.entries.iter().enumerate() {
        // A run covers first_chunk up to (exclusive) the next run's first
        // chunk; the final run extends to the last chunk.
        let last = match stsc.entries.get(i + 1) {
            Some(next) => next.first_chunk.saturating_sub(1),
            None => chunks.len() as u32,
        };
        let lo = entry.first_chunk.saturating_sub(1) as usize;
        let hi = (last as usize).min(chunks.len());
        for chunk in chunks.get_mut(lo..hi).unwrap_or_default() {
            chunk.sample_count = entry.samples_per_chunk;
            chunk.sample_description_index = entry.sample_description_index;
            chunk.start_sample = sample_num;
            sample_num += entry.samples_per_chunk;
        }
    }

    // (b) sizes, uniform or per-sample
    let mut samples = vec![Sample::default(); stsz.sample_count as usize];
    if stsz.sample_size == 0 {
        for (sample, &size) in samples.iter_mut().zip(&stsz.entry_sizes) {
            sample.size = size;
        }
    } else {
        for sample in &mut samples {
            sample.size = stsz.sample_size;
        }
    }

    // (c) file offsets: record the running offset, then advance it
    let mut sample_id = 0usize;
    for chunk in &chunks {
        let mut offset = chunk.offset;
        for _ in 0..chunk.sample_count {
            let Some(sample) = samples.get_mut(sample_id) else {
                break;
            };
            sample.offset = offset;
            offset += sample.size;
            sample_id += 1;
        }
    }

    // (d) decoding timestamps from stts runs
    let mut sample_id = 0usize;
    let mut time = 0u32;
    for entry in &stts.entries {
        for _ in 0..entry.sample_count {
            let Some(sample) = samples.get_mut(sample_id) else {
                break;
            };
            sample.start_time = time;
            sample.duration = entry.sample_delta;
            time += entry.sample_delta;
            sample_id += 1;
        }
    }

    // (e) composition-time offsets; absent ctts leaves them 0
    if let Some(ctts) = &stbl.ctts {
        let mut sample_id = 0usize;
        for entry in &ctts.entries {
            for _ in 0..entry.sample_count {
                let Some(sample) = samples.get_mut(sample_id) else {
                    break;
                };
                sample.cto = entry.sample_offset;
                sample_id += 1;
            }
        }
    }

    verify_totals(track_id, &chunks, stbl, stsz.sample_count)?;

    trak.chunks = chunks;
    trak.samples = samples;
    Ok(())
}

/// Every compressed table must account for exactly the stsz sample count.
fn verify_totals(
    track_id: u32,
    chunks: &[Chunk],
    stbl: &StblBox,
    sample_count: u32,
) -> Result<()> {
    let inconsistent = |detail: String| Error::InconsistentSampleTables { track_id, detail };

    let chunk_total: u64 = chunks.iter().map(|c| c.sample_count as u64).sum();
    if chunk_total != sample_count as u64 {
        return Err(inconsistent(format!(
            "stsc assigns {chunk_total} samples across chunks, stsz declares {sample_count}"
        )));
    }

    if let Some(stts) = &stbl.stts {
        let stts_total: u64 = stts.entries.iter().map(|e| e.sample_count as u64).sum();
        if stts_total != sample_count as u64 {
            return Err(inconsistent(format!(
                "stts covers {stts_total} samples, stsz declares {sample_count}"
            )));
        }
    }

    if let Some(ctts) = &stbl.ctts {
        let ctts_total: u64 = ctts.entries.iter().map(|e| e.sample_count as u64).sum();
        if ctts_total != sample_count as u64 {
            return Err(inconsistent(format!(
                "ctts covers {ctts_total} samples, stsz declares {sample_count}"
            )));
        }
    }

    Ok(())
}

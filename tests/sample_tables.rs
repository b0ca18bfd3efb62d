//! Materializer coverage: chunk runs, sample offsets, timing, and the
//! cross-table consistency checks.

use mp4stream::{Error, Mp4File, ReaderSource};
use std::io::Cursor;

fn boxed(typ: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut v = Vec::with_capacity(8 + payload.len());
    v.extend_from_slice(&(payload.len() as u32 + 8).to_be_bytes());
    v.extend_from_slice(typ);
    v.extend_from_slice(payload);
    v
}

/// Full box: 4-byte version+flags prefix, then `body` as u32 words.
fn fullbox(typ: &[u8; 4], body: &[u32]) -> Vec<u8> {
    let mut payload = vec![0u8; 4];
    for word in body {
        payload.extend_from_slice(&word.to_be_bytes());
    }
    boxed(typ, &payload)
}

fn tkhd(track_id: u32) -> Vec<u8> {
    let mut body = vec![0u8; 4];
    body.extend_from_slice(&0u32.to_be_bytes()); // creation
    body.extend_from_slice(&0u32.to_be_bytes()); // modification
    body.extend_from_slice(&track_id.to_be_bytes());
    body.extend_from_slice(&[0u8; 4]); // reserved
    body.extend_from_slice(&0u32.to_be_bytes()); // duration
    body.extend_from_slice(&[0u8; 8]); // reserved
    body.extend_from_slice(&[0u8; 4]); // layer + alternate_group
    body.extend_from_slice(&[0x01, 0x00]); // volume
    body.extend_from_slice(&[0u8; 2]); // reserved
    body.extend_from_slice(&[0u8; 36]); // matrix
    body.extend_from_slice(&[0u8; 8]); // width + height
    boxed(b"tkhd", &body)
}

fn mdhd(timescale: u32) -> Vec<u8> {
    let mut body = vec![0u8; 4];
    body.extend_from_slice(&0u32.to_be_bytes());
    body.extend_from_slice(&0u32.to_be_bytes());
    body.extend_from_slice(&timescale.to_be_bytes());
    body.extend_from_slice(&0u32.to_be_bytes());
    let packed: u16 = (21 << 10) | (14 << 5) | 4; // "und"
    body.extend_from_slice(&packed.to_be_bytes());
    body.extend_from_slice(&[0u8; 2]); // pre_defined
    boxed(b"mdhd", &body)
}

fn hdlr() -> Vec<u8> {
    let mut body = vec![0u8; 4];
    body.extend_from_slice(&0u32.to_be_bytes());
    body.extend_from_slice(b"vide");
    body.extend_from_slice(&[0u8; 12]);
    body.extend_from_slice(b"VideoHandler\0");
    boxed(b"hdlr", &body)
}

/// Assemble ftyp + moov(trak(tkhd, mdia(mdhd, hdlr, minf(dinf(dref), stbl)))) + mdat.
fn movie(stbl_children: &[Vec<u8>]) -> Vec<u8> {
    let stbl = boxed(b"stbl", &stbl_children.concat());
    let dinf = boxed(b"dinf", &fullbox(b"dref", &[0]));
    let minf = boxed(b"minf", &[dinf, stbl].concat());
    let mdia = boxed(b"mdia", &[mdhd(1000), hdlr(), minf].concat());
    let trak = boxed(b"trak", &[tkhd(1), mdia].concat());

    let mut bytes = boxed(b"ftyp", b"isom\x00\x00\x00\x00");
    bytes.extend(boxed(b"moov", &trak));
    bytes.extend(boxed(b"mdat", &[0u8; 16]));
    bytes
}

fn parse(bytes: Vec<u8>) -> mp4stream::Result<Mp4File<ReaderSource<Cursor<Vec<u8>>>>> {
    Mp4File::parse(ReaderSource::new(Cursor::new(bytes))?)
}

#[test]
fn single_chunk_uniform_sizes() {
    let bytes = movie(&[
        fullbox(b"stsd", &[0]),
        fullbox(b"stts", &[1, 4, 512]),
        fullbox(b"stsc", &[1, 1, 4, 1]),
        fullbox(b"stsz", &[100, 4]),
        fullbox(b"stco", &[1, 1024]),
    ]);

    let mp4 = parse(bytes).unwrap();
    let trak = &mp4.moov.traks[0];

    assert_eq!(trak.chunks.len(), 1);
    assert_eq!(trak.chunks[0].offset, 1024);
    assert_eq!(trak.chunks[0].sample_count, 4);
    assert_eq!(trak.chunks[0].start_sample, 1);
    assert_eq!(trak.chunks[0].sample_description_index, 1);

    assert_eq!(trak.samples.len(), 4);
    for (i, sample) in trak.samples.iter().enumerate() {
        let i = i as u32;
        assert_eq!(sample.offset, 1024 + 100 * i);
        assert_eq!(sample.size, 100);
        assert_eq!(sample.start_time, 512 * i);
        assert_eq!(sample.duration, 512);
        assert_eq!(sample.cto, 0);
    }
}

#[test]
fn final_stsc_run_extends_to_last_chunk() {
    let bytes = movie(&[
        fullbox(b"stts", &[1, 7, 100]),
        fullbox(b"stsc", &[2, 1, 2, 1, 3, 3, 1]),
        fullbox(b"stsz", &[10, 7]),
        fullbox(b"stco", &[3, 64, 128, 256]),
    ]);

    let mp4 = parse(bytes).unwrap();
    let chunks = &mp4.moov.traks[0].chunks;

    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[0].sample_count, 2);
    assert_eq!(chunks[1].sample_count, 2);
    assert_eq!(chunks[2].sample_count, 3);
    assert_eq!(chunks[0].start_sample, 1);
    assert_eq!(chunks[1].start_sample, 3);
    assert_eq!(chunks[2].start_sample, 5);
}

#[test]
fn ctts_runs_assign_composition_offsets() {
    let bytes = movie(&[
        fullbox(b"stts", &[1, 5, 100]),
        fullbox(b"stsc", &[1, 1, 5, 1]),
        fullbox(b"stsz", &[10, 5]),
        fullbox(b"stco", &[1, 64]),
        fullbox(b"ctts", &[2, 2, 10, 3, 0]),
    ]);

    let mp4 = parse(bytes).unwrap();
    let samples = &mp4.moov.traks[0].samples;

    assert_eq!(samples[0].cto, 10);
    assert_eq!(samples[1].cto, 10);
    assert_eq!(samples[2].cto, 0);
    assert_eq!(samples[3].cto, 0);
    assert_eq!(samples[4].cto, 0);
}

#[test]
fn variable_sizes_record_then_advance() {
    let bytes = movie(&[
        fullbox(b"stts", &[1, 4, 100]),
        fullbox(b"stsc", &[1, 1, 4, 1]),
        fullbox(b"stsz", &[0, 4, 100, 200, 300, 400]),
        fullbox(b"stco", &[1, 2048]),
    ]);

    let mp4 = parse(bytes).unwrap();
    let samples = &mp4.moov.traks[0].samples;

    // The first sample lands on the chunk offset itself; each following
    // sample starts where the previous one ended.
    assert_eq!(samples[0].offset, 2048);
    assert_eq!(samples[1].offset, 2148);
    assert_eq!(samples[2].offset, 2348);
    assert_eq!(samples[3].offset, 2648);

    for pair in samples.windows(2) {
        assert_eq!(pair[1].offset, pair[0].offset + pair[0].size);
    }
}

#[test]
fn offsets_restart_at_each_chunk() {
    let bytes = movie(&[
        fullbox(b"stts", &[1, 4, 100]),
        fullbox(b"stsc", &[1, 1, 2, 1]),
        fullbox(b"stsz", &[50, 4]),
        fullbox(b"stco", &[2, 100, 1000]),
    ]);

    let mp4 = parse(bytes).unwrap();
    let samples = &mp4.moov.traks[0].samples;

    assert_eq!(samples[0].offset, 100);
    assert_eq!(samples[1].offset, 150);
    assert_eq!(samples[2].offset, 1000);
    assert_eq!(samples[3].offset, 1050);
}

#[test]
fn timestamps_accumulate_across_stts_runs() {
    let bytes = movie(&[
        fullbox(b"stts", &[2, 3, 100, 2, 250]),
        fullbox(b"stsc", &[1, 1, 5, 1]),
        fullbox(b"stsz", &[10, 5]),
        fullbox(b"stco", &[1, 64]),
    ]);

    let mp4 = parse(bytes).unwrap();
    let samples = &mp4.moov.traks[0].samples;

    let times: Vec<u32> = samples.iter().map(|s| s.start_time).collect();
    assert_eq!(times, vec![0, 100, 200, 300, 550]);

    for pair in samples.windows(2) {
        assert_eq!(pair[1].start_time, pair[0].start_time + pair[0].duration);
    }
}

#[test]
fn stts_total_mismatch_is_inconsistent() {
    let bytes = movie(&[
        fullbox(b"stts", &[1, 3, 100]), // covers 3 samples
        fullbox(b"stsc", &[1, 1, 4, 1]),
        fullbox(b"stsz", &[10, 4]), // declares 4
        fullbox(b"stco", &[1, 64]),
    ]);

    match parse(bytes) {
        Err(Error::InconsistentSampleTables { track_id: 1, .. }) => {}
        other => panic!("expected InconsistentSampleTables, got {other:?}"),
    }
}

#[test]
fn stsc_total_mismatch_is_inconsistent() {
    let bytes = movie(&[
        fullbox(b"stts", &[1, 4, 100]),
        fullbox(b"stsc", &[1, 1, 3, 1]), // 3 samples in the only chunk
        fullbox(b"stsz", &[10, 4]),
        fullbox(b"stco", &[1, 64]),
    ]);

    assert!(matches!(
        parse(bytes),
        Err(Error::InconsistentSampleTables { .. })
    ));
}

#[test]
fn ctts_total_mismatch_is_inconsistent() {
    let bytes = movie(&[
        fullbox(b"stts", &[1, 4, 100]),
        fullbox(b"stsc", &[1, 1, 4, 1]),
        fullbox(b"stsz", &[10, 4]),
        fullbox(b"stco", &[1, 64]),
        fullbox(b"ctts", &[1, 2, 10]), // covers only 2
    ]);

    assert!(matches!(
        parse(bytes),
        Err(Error::InconsistentSampleTables { .. })
    ));
}

#[test]
fn track_without_stco_is_missing_required_box() {
    let bytes = movie(&[
        fullbox(b"stts", &[1, 4, 100]),
        fullbox(b"stsc", &[1, 1, 4, 1]),
        fullbox(b"stsz", &[10, 4]),
    ]);

    assert!(matches!(
        parse(bytes),
        Err(Error::MissingRequiredBox("stco"))
    ));
}

#[test]
fn sample_data_reads_mdat_payload() {
    // Two 4-byte samples stored back to back inside mdat. The chunk offset
    // depends on the moov length, so build the metadata twice: once to
    // measure, once with the real offset filled in.
    let build = |chunk_offset: u32| -> (Vec<u8>, u32) {
        let stbl = [
            fullbox(b"stts", &[1, 2, 100]),
            fullbox(b"stsc", &[1, 1, 2, 1]),
            fullbox(b"stsz", &[4, 2]),
            fullbox(b"stco", &[1, chunk_offset]),
        ];
        let stbl = boxed(b"stbl", &stbl.concat());
        let minf = boxed(b"minf", &stbl);
        let mdia = boxed(b"mdia", &[mdhd(1000), hdlr(), minf].concat());
        let trak = boxed(b"trak", &[tkhd(1), mdia].concat());

        let mut bytes = boxed(b"ftyp", b"isom\x00\x00\x00\x00");
        bytes.extend(boxed(b"moov", &trak));
        let payload_start = bytes.len() as u32 + 8;
        bytes.extend(boxed(b"mdat", b"AAAABBBB"));
        (bytes, payload_start)
    };

    let (_, payload_start) = build(0);
    let (bytes, confirmed) = build(payload_start);
    assert_eq!(payload_start, confirmed);

    let mut mp4 = parse(bytes).unwrap();
    let samples = mp4.moov.traks[0].samples.clone();
    assert_eq!(mp4.sample_data(&samples[0]).unwrap(), b"AAAA");
    assert_eq!(mp4.sample_data(&samples[1]).unwrap(), b"BBBB");
}

#[test]
fn track_metadata_accessors() {
    let bytes = movie(&[
        fullbox(b"stts", &[1, 1, 100]),
        fullbox(b"stsc", &[1, 1, 1, 1]),
        fullbox(b"stsz", &[10, 1]),
        fullbox(b"stco", &[1, 64]),
    ]);

    let mp4 = parse(bytes).unwrap();
    let trak = &mp4.moov.traks[0];
    assert_eq!(trak.track_id(), Some(1));
    assert_eq!(trak.handler().map(|h| h.to_string()), Some("vide".into()));
    assert_eq!(trak.timescale(), Some(1000));
}

use anyhow::Context;
use clap::Parser;
use mp4stream::{Mp4File, Sample};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about = "Inspect an MP4 file's box tree and sample tables")]
struct Args {
    /// MP4/ISOBMFF input file
    #[arg(short = 'i', value_name = "PATH")]
    input: PathBuf,

    /// Output as JSON instead of human-readable text
    #[arg(long)]
    json: bool,

    /// Also dump the first N materialized samples of each track
    #[arg(long, value_name = "N", default_value_t = 0)]
    samples: usize,
}

#[derive(Debug, Serialize)]
struct TrackReport {
    index: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    track_id: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    handler: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    language: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    timescale: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    duration_ticks: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    duration_seconds: Option<f64>,

    chunk_count: usize,
    sample_count: usize,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    samples: Vec<Sample>,
}

#[derive(Debug, Serialize)]
struct FileReport {
    file: String,
    file_size: u64,

    major_brand: String,
    compatible_brands: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    movie_timescale: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    movie_duration_ticks: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    movie_duration_seconds: Option<f64>,

    mdat_offset: u64,
    mdat_size: u32,

    tracks: Vec<TrackReport>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mp4 = Mp4File::open(&args.input)
        .with_context(|| format!("parsing {}", args.input.display()))?;

    let report = build_report(&args, &mp4);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_human(&report);
    }

    Ok(())
}

fn build_report<S: mp4stream::ByteSource>(args: &Args, mp4: &Mp4File<S>) -> FileReport {
    let (movie_timescale, movie_duration_ticks) = match &mp4.moov.mvhd {
        Some(mvhd) => (Some(mvhd.timescale), Some(mvhd.duration)),
        None => (None, None),
    };
    let movie_duration_seconds = seconds(movie_duration_ticks, movie_timescale);

    let tracks = mp4
        .moov
        .traks
        .iter()
        .enumerate()
        .map(|(index, trak)| {
            let timescale = trak.timescale();
            let duration_ticks = trak.duration();
            TrackReport {
                index,
                track_id: trak.track_id(),
                handler: trak.handler().map(|h| h.to_string()),
                language: trak
                    .mdia
                    .as_ref()
                    .and_then(|m| m.mdhd.as_ref())
                    .map(|m| m.language_code()),
                timescale,
                duration_ticks,
                duration_seconds: seconds(duration_ticks, timescale),
                chunk_count: trak.chunks.len(),
                sample_count: trak.samples.len(),
                samples: trak.samples.iter().take(args.samples).copied().collect(),
            }
        })
        .collect();

    FileReport {
        file: args.input.display().to_string(),
        file_size: mp4.size(),
        major_brand: mp4.ftyp.major_brand.to_string(),
        compatible_brands: mp4
            .ftyp
            .compatible_brands
            .iter()
            .map(|b| b.to_string())
            .collect(),
        movie_timescale,
        movie_duration_ticks,
        movie_duration_seconds,
        mdat_offset: mp4.mdat.start,
        mdat_size: mp4.mdat.size,
        tracks,
    }
}

fn seconds(ticks: Option<u32>, timescale: Option<u32>) -> Option<f64> {
    match (ticks, timescale) {
        (Some(t), Some(ts)) if ts > 0 => Some(t as f64 / ts as f64),
        _ => None,
    }
}

fn print_human(report: &FileReport) {
    println!("File: {} ({} bytes)", report.file, report.file_size);
    println!(
        "Brand: {} (compatible: {})",
        report.major_brand,
        report.compatible_brands.join(", ")
    );
    if let (Some(ticks), Some(secs)) =
        (report.movie_duration_ticks, report.movie_duration_seconds)
    {
        println!("Movie duration: {ticks} ticks ({secs:.2}s)");
    }
    println!(
        "mdat: {} bytes at offset {}",
        report.mdat_size, report.mdat_offset
    );

    for track in &report.tracks {
        println!();
        println!(
            "Track #{} (id {})",
            track.index,
            track
                .track_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "?".into())
        );
        if let Some(handler) = &track.handler {
            println!("  handler:  {handler}");
        }
        if let Some(language) = &track.language {
            println!("  language: {language}");
        }
        if let (Some(ticks), Some(secs)) = (track.duration_ticks, track.duration_seconds) {
            println!("  duration: {ticks} ticks ({secs:.2}s)");
        }
        println!("  chunks:   {}", track.chunk_count);
        println!("  samples:  {}", track.sample_count);

        for (i, sample) in track.samples.iter().enumerate() {
            println!(
                "  [{}] offset={} size={} dts={} dur={} cto={}",
                i, sample.offset, sample.size, sample.start_time, sample.duration, sample.cto
            );
        }
    }
}

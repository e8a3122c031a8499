use std::path::{Path, PathBuf};

use ffmpeg_next::format::context::Output;
use ffmpeg_next::rescale::TIME_BASE;
use ffmpeg_next::{Packet, Rational, Rescale};

use crate::alignment::domain::clip_boundaries::ClipBoundaries;
use crate::media::domain::segment_extractor::SegmentExtractor;
use crate::shared::error::CollaboratorError;

/// Packets buffered while waiting for every stream's first timestamp.
const MAX_PENDING_PACKETS: usize = 512;

/// Cuts clips by stream-copying packets with ffmpeg-next (no re-encode).
///
/// `video_id` is the path of the source video. The clip is written to
/// `<output_dir>/<stem>_<start_ms>_<end_ms>.<ext>`, keeping the source
/// container. Because packets are copied, the clip starts on the keyframe at
/// or before `boundaries.start`.
#[derive(Debug, Clone)]
pub struct FfmpegSegmentExtractor {
    output_dir: PathBuf,
}

impl FfmpegSegmentExtractor {
    pub fn new(output_dir: &Path) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
        }
    }

    pub fn clip_path(&self, video_id: &str, boundaries: &ClipBoundaries) -> PathBuf {
        let source = Path::new(video_id);
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "clip".to_string());
        let ext = source
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("mp4");
        self.output_dir.join(format!(
            "{stem}_{}_{}.{ext}",
            boundaries.start().as_millis(),
            boundaries.end().as_millis()
        ))
    }
}

impl SegmentExtractor for FfmpegSegmentExtractor {
    fn extract_segment(
        &self,
        video_id: &str,
        boundaries: &ClipBoundaries,
    ) -> Result<PathBuf, CollaboratorError> {
        let output = self.clip_path(video_id, boundaries);
        std::fs::create_dir_all(&self.output_dir)?;

        if let Err(e) = copy_range(Path::new(video_id), &output, boundaries) {
            let _ = std::fs::remove_file(&output);
            return Err(e);
        }

        log::info!(
            "Wrote clip {:.2}s-{:.2}s to {}",
            boundaries.start().as_secs_f64(),
            boundaries.end().as_secs_f64(),
            output.display()
        );
        Ok(output)
    }
}

fn copy_range(
    source: &Path,
    output: &Path,
    boundaries: &ClipBoundaries,
) -> Result<(), CollaboratorError> {
    ffmpeg_next::init()?;

    let mut ictx = ffmpeg_next::format::input(source)?;
    let mut octx = ffmpeg_next::format::output(output)?;

    let mut stream_map: Vec<Option<usize>> = vec![None; ictx.nb_streams() as usize];
    let mut ost_index = 0;
    for (idx, stream) in ictx.streams().enumerate() {
        let medium = stream.parameters().medium();
        if medium != ffmpeg_next::media::Type::Video && medium != ffmpeg_next::media::Type::Audio {
            continue;
        }
        let mut ost = octx.add_stream(ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::None))?;
        ost.set_parameters(stream.parameters());
        // Let the output muxer choose its own tag for the copied codec.
        unsafe {
            (*ost.parameters().as_mut_ptr()).codec_tag = 0;
        }
        stream_map[idx] = Some(ost_index);
        ost_index += 1;
    }
    if ost_index == 0 {
        return Err(format!("{} has no audio or video streams", source.display()).into());
    }

    let input_time_bases: Vec<_> = ictx.streams().map(|s| s.time_base()).collect();

    // Timestamps below are in AV_TIME_BASE (microseconds).
    let start_us = i64::try_from(boundaries.start().as_micros())?;
    ictx.seek(start_us, ..start_us)?;

    octx.write_header()?;

    let end_secs = boundaries.end().as_secs_f64();
    let mut first_us: Vec<Option<i64>> = vec![None; stream_map.len()];
    let mut finished: Vec<bool> = stream_map.iter().map(Option::is_none).collect();
    let mut origin_us: Option<i64> = None;
    let mut pending: Vec<(usize, Packet)> = Vec::new();
    let mut written = 0usize;

    for (stream, packet) in ictx.packets() {
        let ist = stream.index();
        let Some(ost) = stream_map[ist] else {
            continue;
        };
        if finished[ist] {
            if finished.iter().all(|f| *f) {
                break;
            }
            continue;
        }

        let time_base = input_time_bases[ist];
        let Some(ts) = packet.pts().or(packet.dts()) else {
            continue;
        };
        if ts as f64 * f64::from(time_base) >= end_secs {
            finished[ist] = true;
            continue;
        }

        if let Some(origin) = origin_us {
            write_shifted(&mut octx, packet, time_base, ost, origin)?;
            written += 1;
            continue;
        }

        // Hold packets back until every stream has shown its first
        // timestamp, so all streams are shifted by the same origin.
        first_us[ist].get_or_insert(packet.dts().unwrap_or(ts).rescale(time_base, TIME_BASE));
        pending.push((ist, packet));
        let all_started = (0..stream_map.len()).all(|i| finished[i] || first_us[i].is_some());
        if all_started || pending.len() >= MAX_PENDING_PACKETS {
            let origin = shared_origin(&first_us).unwrap_or(0);
            origin_us = Some(origin);
            written += flush_pending(&mut octx, &mut pending, &input_time_bases, &stream_map, origin)?;
        }
    }

    if !pending.is_empty() {
        let origin = shared_origin(&first_us).unwrap_or(0);
        written += flush_pending(&mut octx, &mut pending, &input_time_bases, &stream_map, origin)?;
    }

    if written == 0 {
        return Err(format!(
            "no packets between {:.2}s and {:.2}s in {}",
            boundaries.start().as_secs_f64(),
            end_secs,
            source.display()
        )
        .into());
    }

    octx.write_trailer()?;
    Ok(())
}

/// Earliest first timestamp across streams, in microseconds.
fn shared_origin(first_us: &[Option<i64>]) -> Option<i64> {
    first_us.iter().flatten().min().copied()
}

/// `ts` re-expressed relative to `origin_us`, in the same time base.
fn shift(ts: i64, time_base: Rational, origin_us: i64) -> i64 {
    ts - origin_us.rescale(TIME_BASE, time_base)
}

fn flush_pending(
    octx: &mut Output,
    pending: &mut Vec<(usize, Packet)>,
    time_bases: &[Rational],
    stream_map: &[Option<usize>],
    origin_us: i64,
) -> Result<usize, CollaboratorError> {
    let count = pending.len();
    for (ist, packet) in pending.drain(..) {
        let ost = stream_map[ist].ok_or("unmapped stream in pending packets")?;
        write_shifted(octx, packet, time_bases[ist], ost, origin_us)?;
    }
    Ok(count)
}

fn write_shifted(
    octx: &mut Output,
    mut packet: Packet,
    time_base: Rational,
    ost: usize,
    origin_us: i64,
) -> Result<(), CollaboratorError> {
    packet.set_pts(packet.pts().map(|p| shift(p, time_base, origin_us)));
    packet.set_dts(packet.dts().map(|d| shift(d, time_base, origin_us)));

    let ost_time_base = octx
        .stream(ost)
        .map(|s| s.time_base())
        .ok_or("output stream disappeared")?;
    packet.rescale_ts(time_base, ost_time_base);
    packet.set_position(-1);
    packet.set_stream(ost);
    packet.write_interleaved(octx)?;
    Ok(())
}

//! Render plan to FFmpeg command translation.
//!
//! Covers the common local case: trim, speed change, punch-in, concat,
//! scale, image overlays and a faded music bed. Captions and crossfades are
//! left to engines that declare those capabilities.

use std::path::Path;

use adforge_models::{AudioTrackKind, RenderPlan, TimelineEntry, VideoFilter};
use url::Url;

use crate::command::FfmpegCommand;
use crate::error::{MediaError, MediaResult};

/// Zoom factor of the punch-in filter.
const PUNCH_IN_ZOOM: f64 = 1.08;
/// Zoom applied after a hard cut so the cut is visible.
const JUMP_CUT_ZOOM: f64 = 1.12;

/// Build the FFmpeg command that renders `plan` to `output`.
pub fn plan_command(plan: &RenderPlan, output: impl AsRef<Path>) -> MediaResult<FfmpegCommand> {
    if let Some(reason) = plan.uncompilable_reason() {
        return Err(MediaError::plan_not_ready(reason));
    }
    if plan.timeline.is_empty() {
        return Err(MediaError::plan_not_ready("timeline is empty"));
    }

    let (width, height) = (plan.output.resolution.width, plan.output.resolution.height);
    let mut cmd = FfmpegCommand::new(local_path(&plan.source_uri), output);
    let mut graph: Vec<String> = Vec::new();

    // Cut list: one piece per entry, two for a split entry
    let mut pieces = 0usize;
    for entry in &plan.timeline {
        for (start, end, jump) in entry_pieces(entry) {
            let mut video = format!(
                "[0:v]trim=start={}:end={},setpts=PTS-STARTPTS",
                secs(start),
                secs(end)
            );
            let mut audio = format!(
                "[0:a]atrim=start={}:end={},asetpts=PTS-STARTPTS",
                secs(start),
                secs(end)
            );
            if entry.has_speed_change() {
                video.push_str(&format!(",setpts=PTS/{:.4}", entry.speed));
                audio.push_str(&format!(",atempo={:.4}", entry.speed));
            }
            let mut zoom = 1.0;
            if entry.filters.contains(&VideoFilter::PunchIn) {
                zoom *= PUNCH_IN_ZOOM;
            }
            if jump {
                zoom *= JUMP_CUT_ZOOM;
            }
            if zoom > 1.0 {
                video.push_str(&format!(",crop=iw/{:.3}:ih/{:.3}", zoom, zoom));
            }
            video.push_str(&format!(
                ",scale={w}:{h}:force_original_aspect_ratio=increase,crop={w}:{h},setsar=1[v{n}]",
                w = width,
                h = height,
                n = pieces
            ));
            audio.push_str(&format!("[a{}]", pieces));
            graph.push(video);
            graph.push(audio);
            pieces += 1;
        }
    }

    let inputs: String = (0..pieces).map(|n| format!("[v{n}][a{n}]")).collect();
    graph.push(format!("{}concat=n={}:v=1:a=1[vcat][acat]", inputs, pieces));

    let mut video_label = "vcat".to_string();
    for (index, overlay) in plan.overlays.iter().enumerate() {
        let input = cmd.input_count();
        cmd = cmd.add_looped_image(local_path(&overlay.asset));
        graph.push(format!("[{}:v]scale={}:-2[ov{}]", input, width / 2, index));
        graph.push(format!(
            "[{}][ov{}]overlay=x=(W-w)/2:y=H-h-{}:shortest=1:enable='between(t,{},{})'[vo{}]",
            video_label,
            index,
            height / 12,
            secs(overlay.start_ms),
            secs(overlay.end_ms),
            index
        ));
        video_label = format!("vo{}", index);
    }

    let total_ms = plan.total_duration_ms();
    let mut audio_label = "acat".to_string();
    if let Some(source) = plan
        .audio_tracks
        .iter()
        .find(|t| t.kind == AudioTrackKind::Source)
    {
        let chain = audio_chain(source.gain_db, source.fade_in_ms, source.fade_out_ms, total_ms);
        if !chain.is_empty() {
            graph.push(format!("[acat]{}[asrc]", chain));
            audio_label = "asrc".to_string();
        }
    }

    let music: Vec<_> = plan
        .audio_tracks
        .iter()
        .filter(|t| t.kind == AudioTrackKind::Music)
        .collect();
    if !music.is_empty() {
        let mut mix_inputs = format!("[{}]", audio_label);
        for (index, track) in music.iter().enumerate() {
            let input = cmd.input_count();
            cmd = cmd.add_input(local_path(&track.source_uri));
            let chain = audio_chain(track.gain_db, track.fade_in_ms, track.fade_out_ms, total_ms);
            let chain = if chain.is_empty() { "anull".to_string() } else { chain };
            graph.push(format!("[{}:a]{}[mus{}]", input, chain, index));
            mix_inputs.push_str(&format!("[mus{}]", index));
        }
        graph.push(format!(
            "{}amix=inputs={}:duration=first:normalize=0[amix]",
            mix_inputs,
            music.len() + 1
        ));
        audio_label = "amix".to_string();
    }

    Ok(cmd
        .filter_complex(graph.join(";"))
        .map(format!("[{}]", video_label))
        .map(format!("[{}]", audio_label))
        .video_codec("libx264")
        .preset("medium")
        .video_bitrate_kbps(plan.output.bitrate_kbps)
        .frame_rate(plan.output.fps)
        .audio_codec("aac"))
}

/// Literal command line for manual rendering, or `None` when the plan is not
/// renderable.
pub fn manual_command(plan: &RenderPlan) -> Option<String> {
    let output = format!("{}.{}", plan.plan_id, plan.output.container.extension());
    plan_command(plan, output)
        .ok()
        .map(|cmd| cmd.without_progress().to_command_string())
}

/// Source ranges to cut for an entry, with whether the piece follows a hard cut.
fn entry_pieces(entry: &TimelineEntry) -> Vec<(u64, u64, bool)> {
    match entry.split_at_ms {
        Some(split) if split > entry.trim_start_ms && split < entry.trim_end_ms => vec![
            (entry.trim_start_ms, split, false),
            (split, entry.trim_end_ms, true),
        ],
        _ => vec![(entry.trim_start_ms, entry.trim_end_ms, false)],
    }
}

fn audio_chain(gain_db: f64, fade_in_ms: u64, fade_out_ms: u64, total_ms: u64) -> String {
    let mut filters = Vec::new();
    if gain_db.abs() > f64::EPSILON {
        filters.push(format!("volume={:.1}dB", gain_db));
    }
    if fade_in_ms > 0 {
        filters.push(format!("afade=t=in:st=0:d={}", secs(fade_in_ms)));
    }
    if fade_out_ms > 0 {
        let start = total_ms.saturating_sub(fade_out_ms);
        filters.push(format!("afade=t=out:st={}:d={}", secs(start), secs(fade_out_ms)));
    }
    filters.join(",")
}

fn secs(ms: u64) -> String {
    format!("{:.3}", ms as f64 / 1000.0)
}

/// Filesystem path for `file://` URIs; anything else is passed through.
pub fn local_path(uri: &str) -> String {
    match Url::parse(uri) {
        Ok(url) if url.scheme() == "file" => url
            .to_file_path()
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_else(|_| uri.to_string()),
        _ => uri.to_string(),
    }
}

use std::path::{Path, PathBuf};

use crate::audio::buffer::AudioBuffer;
use crate::foundation::error::{ReelError, ReelResult};

#[derive(Clone, Debug)]
/// Basic metadata about a source video file.
pub struct VideoSourceInfo {
    /// Absolute source path used for probing/decoding.
    #[cfg_attr(not(feature = "media-ffmpeg"), allow(dead_code))]
    pub source_path: PathBuf,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Container duration, when ffprobe reports one.
    pub duration_secs: Option<f64>,
}

/// Parse raw little-endian `f32` PCM bytes.
pub(crate) fn parse_f32le(bytes: &[u8]) -> ReelResult<Vec<f32>> {
    if !bytes.len().is_multiple_of(4) {
        return Err(ReelError::asset_load(
            "decoded audio byte length is not aligned to f32 samples",
        ));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

/// Probe source video metadata through `ffprobe`.
#[cfg(feature = "media-ffmpeg")]
pub fn probe_video(source_path: &Path) -> ReelResult<VideoSourceInfo> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        streams: Vec<ProbeStream>,
        format: Option<ProbeFormat>,
    }

    let out = std::process::Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(source_path)
        .output()
        .map_err(|e| ReelError::asset_load(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(ReelError::asset_load(format!(
            "ffprobe failed for '{}': {}",
            source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
        .map_err(|e| ReelError::asset_load(format!("ffprobe json parse failed: {e}")))?;
    let video_stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| ReelError::asset_load("no video stream found"))?;
    let (Some(width), Some(height)) = (video_stream.width, video_stream.height) else {
        return Err(ReelError::asset_load("missing video dimensions from ffprobe"));
    };
    let duration_secs = parsed
        .format
        .and_then(|f| f.duration)
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0);

    Ok(VideoSourceInfo {
        source_path: source_path.to_path_buf(),
        width,
        height,
        duration_secs,
    })
}

#[cfg(not(feature = "media-ffmpeg"))]
/// Probe source video metadata through `ffprobe`.
///
/// Returns an error when `media-ffmpeg` feature is disabled.
pub fn probe_video(_source_path: &Path) -> ReelResult<VideoSourceInfo> {
    Err(ReelError::asset_load(
        "video/audio assets require the 'media-ffmpeg' feature",
    ))
}

#[cfg(feature = "media-ffmpeg")]
/// Decode a single straight-alpha RGBA frame from source video at `source_time_sec`.
pub fn decode_video_frame_rgba8(source: &VideoSourceInfo, source_time_sec: f64) -> ReelResult<Vec<u8>> {
    let out = std::process::Command::new("ffmpeg")
        .args(["-v", "error", "-ss", &format!("{:.6}", source_time_sec.max(0.0))])
        .arg("-i")
        .arg(&source.source_path)
        .args(["-frames:v", "1", "-f", "rawvideo", "-pix_fmt", "rgba", "pipe:1"])
        .output()
        .map_err(|e| ReelError::asset_load(format!("failed to run ffmpeg for video decode: {e}")))?;

    if !out.status.success() {
        return Err(ReelError::asset_load(format!(
            "ffmpeg video decode failed for '{}': {}",
            source.source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let expected_len = source.width as usize * source.height as usize * 4;
    if expected_len == 0 || out.stdout.len() < expected_len {
        return Err(ReelError::asset_load(format!(
            "decoded video frame has invalid size: got {} bytes, expected {expected_len}",
            out.stdout.len()
        )));
    }
    let mut frame = out.stdout;
    frame.truncate(expected_len);
    Ok(frame)
}

#[cfg(not(feature = "media-ffmpeg"))]
/// Decode a single straight-alpha RGBA frame from source video at `source_time_sec`.
///
/// Returns an error when `media-ffmpeg` feature is disabled.
pub fn decode_video_frame_rgba8(_source: &VideoSourceInfo, _source_time_sec: f64) -> ReelResult<Vec<u8>> {
    Err(ReelError::asset_load(
        "video/audio assets require the 'media-ffmpeg' feature",
    ))
}

/// Decode audio from a media file to stereo interleaved `f32` PCM at `sample_rate`.
///
/// Raw `.f32le` files are taken as stereo at `sample_rate` and read directly; everything else
/// goes through ffmpeg.
pub fn decode_audio_f32_stereo(path: &Path, sample_rate: u32) -> ReelResult<AudioBuffer> {
    if path.extension().and_then(|e| e.to_str()) == Some("f32le") {
        let bytes = std::fs::read(path)
            .map_err(|e| ReelError::asset_load(format!("read '{}': {e}", path.display())))?;
        return Ok(AudioBuffer::new(sample_rate, 2, parse_f32le(&bytes)?));
    }
    decode_audio_ffmpeg(path, sample_rate)
}

#[cfg(feature = "media-ffmpeg")]
fn decode_audio_ffmpeg(path: &Path, sample_rate: u32) -> ReelResult<AudioBuffer> {
    let out = std::process::Command::new("ffmpeg")
        .args(["-v", "error", "-i"])
        .arg(path)
        .args([
            "-vn",
            "-f",
            "f32le",
            "-acodec",
            "pcm_f32le",
            "-ac",
            "2",
            "-ar",
            &sample_rate.to_string(),
            "pipe:1",
        ])
        .output()
        .map_err(|e| ReelError::asset_load(format!("failed to run ffmpeg for audio decode: {e}")))?;

    if !out.status.success() {
        return Err(ReelError::asset_load(format!(
            "ffmpeg audio decode failed for '{}': {}",
            path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    Ok(AudioBuffer::new(sample_rate, 2, parse_f32le(&out.stdout)?))
}

#[cfg(not(feature = "media-ffmpeg"))]
fn decode_audio_ffmpeg(_path: &Path, _sample_rate: u32) -> ReelResult<AudioBuffer> {
    Err(ReelError::asset_load(
        "video/audio assets require the 'media-ffmpeg' feature",
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/media.rs"]
mod tests;

use std::io::{BufWriter, Read, Write as _};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

use crate::encode::sink::{AudioStreamConfig, FrameSink, SinkConfig};
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::mul_div255_u16;
use crate::render::backend::FrameRGBA;

/// Options for [`FfmpegSink`].
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    /// Also write the finished MP4 here.
    pub out_path: Option<PathBuf>,
    /// Overwrite `out_path` if it already exists.
    pub overwrite: bool,
    /// Background used to flatten alpha (straight RGBA8).
    pub bg_rgba: [u8; 4],
}

impl Default for FfmpegSinkOpts {
    fn default() -> Self {
        Self {
            out_path: None,
            overwrite: true,
            bg_rgba: [0, 0, 0, 255],
        }
    }
}

impl FfmpegSinkOpts {
    pub fn to_file(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: Some(out_path.into()),
            ..Self::default()
        }
    }
}

/// Sink that streams frames into the system `ffmpeg` (H.264) and muxes pushed audio (AAC).
///
/// Video is encoded to a temporary MP4 while frames arrive; audio is spooled to a temporary
/// `f32le` file and muxed in a second `ffmpeg` pass during `end`.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,

    video_tmp: TempFileGuard,
    audio_tmp: TempFileGuard,
    audio_out: Option<BufWriter<std::fs::File>>,
    audio_cfg: Option<AudioStreamConfig>,
    audio_samples: u64,

    scratch: Vec<u8>,
    cfg: Option<SinkConfig>,
    last_idx: Option<FrameIndex>,
}

impl FfmpegSink {
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            child: None,
            stdin: None,
            stderr_drain: None,
            video_tmp: TempFileGuard(None),
            audio_tmp: TempFileGuard(None),
            audio_out: None,
            audio_cfg: None,
            audio_samples: 0,
            scratch: Vec::new(),
            cfg: None,
            last_idx: None,
        }
    }

    fn finish_video(&mut self) -> ReelResult<()> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| ReelError::encoder("ffmpeg sink not started"))?;
        let status = child
            .wait()
            .map_err(|e| ReelError::encoder(format!("failed to wait for ffmpeg to finish: {e}")))?;
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| ReelError::encoder("ffmpeg stderr drain thread panicked"))?
                .map_err(|e| ReelError::encoder(format!("ffmpeg stderr read failed: {e}")))?,
            None => Vec::new(),
        };
        if !status.success() {
            return Err(ReelError::encoder(format!(
                "ffmpeg exited with status {}: {}",
                status,
                String::from_utf8_lossy(&stderr_bytes).trim()
            )));
        }
        Ok(())
    }

    fn mux_audio(&mut self, video: &Path) -> ReelResult<Option<PathBuf>> {
        let (Some(mut out), Some(audio)) = (self.audio_out.take(), self.audio_cfg) else {
            return Ok(None);
        };
        out.flush()
            .map_err(|e| ReelError::encoder(format!("failed to flush audio spool: {e}")))?;
        drop(out);
        if self.audio_samples == 0 {
            return Ok(None);
        }
        let Some(audio_path) = self.audio_tmp.0.clone() else {
            return Ok(None);
        };

        let muxed = temp_path("mux", "mp4");
        let output = Command::new("ffmpeg")
            .args(["-y", "-loglevel", "error", "-i"])
            .arg(video)
            .args([
                "-f",
                "f32le",
                "-ar",
                &audio.sample_rate.to_string(),
                "-ac",
                &audio.channels.to_string(),
                "-i",
            ])
            .arg(&audio_path)
            .args([
                "-map", "0:v:0", "-map", "1:a:0", "-c:v", "copy", "-c:a", "aac", "-shortest",
                "-movflags", "+faststart",
            ])
            .arg(&muxed)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| ReelError::encoder(format!("failed to spawn ffmpeg mux pass: {e}")))?;
        if !output.status.success() {
            let _ = std::fs::remove_file(&muxed);
            return Err(ReelError::encoder(format!(
                "ffmpeg mux pass exited with status {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(Some(muxed))
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> ReelResult<()> {
        if cfg.fps.num == 0 || cfg.fps.den == 0 {
            return Err(ReelError::validation("fps must be non-zero"));
        }
        if cfg.width == 0 || cfg.height == 0 {
            return Err(ReelError::validation(
                "ffmpeg sink width/height must be non-zero",
            ));
        }
        if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
            return Err(ReelError::validation(
                "ffmpeg sink width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        if let Some(out) = &self.opts.out_path {
            ensure_parent_dir(out)?;
            if !self.opts.overwrite && out.exists() {
                return Err(ReelError::validation(format!(
                    "output file '{}' already exists",
                    out.display()
                )));
            }
        }
        if cfg
            .audio
            .is_some_and(|a| a.sample_rate == 0 || a.channels == 0)
        {
            return Err(ReelError::validation(
                "audio sample_rate and channels must be non-zero when audio is enabled",
            ));
        }
        if !is_ffmpeg_on_path() {
            return Err(ReelError::encoder(
                "ffmpeg is required for MP4 encoding, but was not found on PATH",
            ));
        }

        let video = temp_path("video", "mp4");
        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        // Raw frames are flattened to opaque RGBA in push_frame.
        cmd.args([
            "-y",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
        ]);
        push_input_fps(&mut cmd, cfg.fps);
        cmd.args([
            "-i",
            "pipe:0",
            "-an",
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
        ])
        .arg(&video);

        let mut child = cmd.spawn().map_err(|e| {
            ReelError::encoder(format!(
                "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
            ))
        })?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ReelError::encoder("failed to open ffmpeg stdin"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| ReelError::encoder("failed to open ffmpeg stderr"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        if let Some(audio) = cfg.audio {
            let path = temp_path("audio", "f32le");
            let file = std::fs::File::create(&path).map_err(|e| {
                ReelError::encoder(format!("failed to create audio spool '{}': {e}", path.display()))
            })?;
            self.audio_tmp = TempFileGuard(Some(path));
            self.audio_out = Some(BufWriter::new(file));
            self.audio_cfg = Some(audio);
        }

        self.scratch = vec![0u8; (cfg.width * cfg.height * 4) as usize];
        self.video_tmp = TempFileGuard(Some(video));
        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stderr_drain = Some(stderr_drain);
        self.audio_samples = 0;
        self.cfg = Some(cfg);
        self.last_idx = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> ReelResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| ReelError::encoder("ffmpeg sink not started"))?;
        if let Some(last) = self.last_idx
            && idx.0 <= last.0
        {
            return Err(ReelError::encoder(
                "ffmpeg sink received out-of-order frame index",
            ));
        }
        self.last_idx = Some(idx);

        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(ReelError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }
        if frame.data.len() != self.scratch.len() {
            return Err(ReelError::validation(
                "frame.data size mismatch with width*height*4",
            ));
        }

        flatten_premul_over_bg(&mut self.scratch, &frame.data, self.opts.bg_rgba)?;

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(ReelError::encoder("ffmpeg sink is already finalized"));
        };
        stdin
            .write_all(&self.scratch)
            .map_err(|e| ReelError::encoder(format!("failed to write frame to ffmpeg stdin: {e}")))
    }

    fn push_audio(&mut self, samples: &[f32]) -> ReelResult<()> {
        let Some(out) = self.audio_out.as_mut() else {
            return Ok(());
        };
        for s in samples {
            out.write_all(&s.to_le_bytes())
                .map_err(|e| ReelError::encoder(format!("failed to spool audio: {e}")))?;
        }
        self.audio_samples += samples.len() as u64;
        Ok(())
    }

    fn end(&mut self) -> ReelResult<Vec<u8>> {
        self.finish_video()?;
        let video = self
            .video_tmp
            .0
            .clone()
            .ok_or_else(|| ReelError::encoder("ffmpeg sink lost its video output"))?;
        let muxed = TempFileGuard(self.mux_audio(&video)?);
        let final_path = muxed.0.as_deref().unwrap_or(&video);

        let bytes = std::fs::read(final_path).map_err(|e| {
            ReelError::encoder(format!("failed to read encoded output '{}': {e}", final_path.display()))
        })?;
        if let Some(out) = &self.opts.out_path {
            std::fs::write(out, &bytes).map_err(|e| {
                ReelError::encoder(format!("failed to write '{}': {e}", out.display()))
            })?;
        }
        tracing::info!(
            bytes = bytes.len(),
            audio_samples = self.audio_samples,
            "ffmpeg sink finalized"
        );

        self.video_tmp = TempFileGuard(None);
        self.audio_tmp = TempFileGuard(None);
        self.audio_cfg = None;
        self.cfg = None;
        Ok(bytes)
    }
}

fn push_input_fps(cmd: &mut Command, fps: Fps) {
    // `-r` before `-i` sets the rawvideo input rate; rational fps passes through as num/den.
    cmd.args(["-r", &format!("{}/{}", fps.num, fps.den)]);
}

/// Composite premultiplied pixels over an opaque background.
fn flatten_premul_over_bg(dst: &mut [u8], src_premul: &[u8], bg_rgba: [u8; 4]) -> ReelResult<()> {
    if dst.len() != src_premul.len() || !dst.len().is_multiple_of(4) {
        return Err(ReelError::validation(
            "flatten expects equal-length rgba8 buffers",
        ));
    }
    let bg = [
        u16::from(bg_rgba[0]),
        u16::from(bg_rgba[1]),
        u16::from(bg_rgba[2]),
    ];
    for (d, s) in dst.chunks_exact_mut(4).zip(src_premul.chunks_exact(4)) {
        let inv = 255u16 - u16::from(s[3]);
        for ((dc, &sc), &bc) in d.iter_mut().zip(s).zip(&bg) {
            *dc = (u16::from(sc) + mul_div255_u16(bc, inv)).min(255) as u8;
        }
        d[3] = 255;
    }
    Ok(())
}

fn temp_path(tag: &str, ext: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "reelcast_{tag}_{}_{}.{ext}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0)
    ))
}

struct TempFileGuard(Option<PathBuf>);

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if let Some(path) = self.0.take() {
            let _ = std::fs::remove_file(path);
        }
    }
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> ReelResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// `true` when `ffmpeg -version` runs successfully.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;

//! Offline export driver.

use std::path::Path;

use crate::assets::store::{AssetIssue, AssetResolver};
use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
use crate::encode::sink::FrameSink;
use crate::foundation::core::Fps;
use crate::foundation::error::{ReelError, ReelResult};
use crate::scene::model::Project;
use crate::session::render_session::{FrameResult, RenderSession, SessionMode, SessionOpts};

/// Options for [`export`].
#[derive(Clone, Debug)]
pub struct ExportOpts {
    /// Mix narration and music into the output.
    pub enable_audio: bool,
    /// Overrides the project's frame rate.
    pub fps: Option<Fps>,
}

impl Default for ExportOpts {
    fn default() -> Self {
        Self {
            enable_audio: true,
            fps: None,
        }
    }
}

/// Result of a finished export.
#[derive(Clone, Debug)]
pub struct ExportOutput {
    /// Encoded container bytes returned by the sink.
    pub bytes: Vec<u8>,
    pub frames: u64,
    pub duration_secs: f64,
    /// Session log (scene enter/exit, seeks, stop).
    pub log: Vec<String>,
    pub issues: Vec<AssetIssue>,
}

/// Render the whole programme into `sink`, driving the session at the output frame rate.
///
/// `progress` receives `(elapsed, total)` after every tick.
pub fn export(
    project: Project,
    resolver: &AssetResolver,
    opts: ExportOpts,
    sink: Box<dyn FrameSink>,
    progress: Option<Box<dyn FnMut(f64, f64) + Send>>,
) -> ReelResult<ExportOutput> {
    let mut session = RenderSession::new(
        project,
        resolver,
        SessionOpts {
            mode: SessionMode::Export,
            enable_audio: opts.enable_audio,
            throttle_vfx: false,
            fps: opts.fps,
        },
    )?;
    if let Some(cb) = progress {
        session.on_progress(cb);
    }
    session.capture(sink)?;

    let fps = session.fps();
    let total = session.total_duration();
    // The audio clock can trail the wall clock by rounding; a couple of extra ticks absorb it.
    let max_ticks = fps.secs_to_frames_ceil(total) + 2;
    tracing::info!(total, fps = fps.as_f64(), audio = session.has_audio(), "export started");

    let mut frames = 0u64;
    for k in 0..max_ticks {
        match session.tick(fps.frames_to_secs(k)) {
            Ok(FrameResult::Frame(_)) => frames += 1,
            Ok(FrameResult::Finished | FrameResult::Stopped) => break,
            Ok(FrameResult::Paused { .. }) => {
                return Err(ReelError::evaluation("export session paused unexpectedly"));
            }
            Err(e) => {
                if let Err(stop_err) = session.stop() {
                    tracing::warn!(error = %stop_err, "sink finalize after failed tick");
                }
                return Err(e);
            }
        }
    }

    let bytes = session.stop()?.unwrap_or_default();
    tracing::info!(frames, bytes = bytes.len(), "export finished");
    Ok(ExportOutput {
        bytes,
        frames,
        duration_secs: total,
        log: session.log().to_vec(),
        issues: session.issues().to_vec(),
    })
}

/// [`export`] into an MP4 at `out_path` through the system `ffmpeg`.
pub fn export_to_file(
    project: Project,
    resolver: &AssetResolver,
    out_path: &Path,
    opts: ExportOpts,
) -> ReelResult<ExportOutput> {
    let bg = project.background_color.to_straight_rgba8();
    let sink = FfmpegSink::new(FfmpegSinkOpts {
        bg_rgba: [bg[0], bg[1], bg[2], 255],
        ..FfmpegSinkOpts::to_file(out_path)
    });
    export(project, resolver, opts, Box::new(sink), None)
}

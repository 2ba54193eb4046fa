use std::sync::Arc;

use crate::assets::store::{AssetIssue, AssetResolver, PreparedAssets};
use crate::audio::mix::{GraphState, MixGraph, frame_to_sample};
use crate::audio::prepare::PreparedAudio;
use crate::encode::sink::{AudioStreamConfig, FrameSink, SinkConfig};
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::ReelResult;
use crate::render::backend::FrameRGBA;
use crate::render::compositor::Compositor;
use crate::scene::model::Project;
use crate::session::clock::{ClockMode, RenderClock};
use crate::session::transport::{Transport, TransportState};
use crate::timeline::builder::{Phase, Timeline, TimelineOpts, build_timeline};

/// How the session advances time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionMode {
    /// Wall clock, wraps at the end of the programme.
    #[default]
    Preview,
    /// Audio clock when a mix graph exists; finishes at the end of the programme.
    Export,
}

/// Options for [`RenderSession::new`].
#[derive(Clone, Debug)]
pub struct SessionOpts {
    pub mode: SessionMode,
    /// Build the narration/music mix graph.
    pub enable_audio: bool,
    /// Halve grain and dust counts in preview.
    pub throttle_vfx: bool,
    /// Overrides the project's frame rate.
    pub fps: Option<Fps>,
}

impl Default for SessionOpts {
    fn default() -> Self {
        Self {
            mode: SessionMode::Preview,
            enable_audio: true,
            throttle_vfx: true,
            fps: None,
        }
    }
}

/// One rendered tick. The pixels stay in the session; read them with
/// [`RenderSession::last_frame`] before the next tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderedFrame {
    /// Session time the frame was drawn at.
    pub time: f64,
    /// Topmost scene entry, if the scene phase is showing.
    pub scene: Option<usize>,
}

/// Outcome of [`RenderSession::tick`].
#[derive(Clone, Debug, PartialEq)]
pub enum FrameResult {
    Frame(RenderedFrame),
    /// Paused; nothing was drawn.
    Paused { time: f64 },
    /// Export reached the end of the programme. Call [`RenderSession::stop`] to finalize.
    Finished,
    Stopped,
}

type ProgressFn = Box<dyn FnMut(f64, f64) + Send>;

/// Owns all mutable render state for one project: timeline, assets, compositor, mix graph,
/// clock, transport and the optional capture sink.
///
/// Drive it with [`RenderSession::tick`]. Within a tick a queued seek is applied first, then the
/// active entries are resolved, then the frame is drawn.
pub struct RenderSession {
    project: Arc<Project>,
    timeline: Timeline,
    assets: PreparedAssets,
    compositor: Compositor,
    mix: Option<MixGraph>,
    clock: RenderClock,
    /// The clock origin is taken from the first call that supplies a time.
    started: bool,
    transport: Transport,
    mode: SessionMode,
    fps: Fps,
    progress: f64,
    /// Completed preview loops; the mix is realigned whenever this changes.
    lap: u64,
    on_progress: Option<ProgressFn>,
    log: Vec<String>,
    current_scene: Option<usize>,
    sink: Option<Box<dyn FrameSink>>,
    next_frame: u64,
    issues: Vec<AssetIssue>,
}

impl RenderSession {
    /// Prepare audio and assets, build the timeline and the mix graph.
    ///
    /// Asset failures are recovered and listed in [`RenderSession::issues`]. A mix graph that
    /// cannot be built downgrades the session to silent output.
    pub fn new(mut project: Project, resolver: &AssetResolver, opts: SessionOpts) -> ReelResult<Self> {
        project.validate()?;
        let fps = opts.fps.unwrap_or(project.fps);
        Fps::new(fps.num, fps.den)?;

        let audio = PreparedAudio::prepare(&project, resolver);
        audio.fill_missing_durations(&mut project);
        let mut assets = PreparedAssets::prepare(&project, resolver);
        let timeline = build_timeline(
            &project.scenes,
            &TimelineOpts::from_project(&project),
            &mut assets.text,
        );

        let mut log = Vec::new();
        let mix = if opts.enable_audio {
            let schedule = audio.schedule(&timeline, &project);
            if schedule.clips.is_empty() {
                None
            } else {
                match MixGraph::new(schedule) {
                    Ok(graph) => Some(graph),
                    Err(e) => {
                        tracing::warn!(error = %e, "audio graph unavailable, rendering silent");
                        log.push(format!("audio disabled: {e}"));
                        None
                    }
                }
            }
        } else {
            None
        };

        let mut issues = assets.issues.clone();
        issues.extend(audio.issues.iter().cloned());

        let project = Arc::new(project);
        let mut compositor = Compositor::new(Arc::clone(&project), &assets)?;
        compositor.set_vfx_throttled(opts.throttle_vfx && opts.mode == SessionMode::Preview);

        let clock_mode = if opts.mode == SessionMode::Export && mix.is_some() {
            ClockMode::Audio
        } else {
            ClockMode::Wall
        };
        let clock_origin = mix.as_ref().map_or(0.0, MixGraph::current_time);
        tracing::info!(
            scenes = timeline.entries.len(),
            total = timeline.total_duration,
            issues = issues.len(),
            clock = ?clock_mode,
            "render session ready"
        );

        Ok(Self {
            project,
            timeline,
            assets,
            compositor,
            mix,
            clock: RenderClock::new(clock_mode, clock_origin),
            started: false,
            transport: Transport::new(),
            mode: opts.mode,
            fps,
            progress: 0.0,
            lap: 0,
            on_progress: None,
            log,
            current_scene: None,
            sink: None,
            next_frame: 0,
            issues,
        })
    }

    /// Register the `(elapsed, total)` callback fired on every tick.
    pub fn on_progress(&mut self, f: impl FnMut(f64, f64) + Send + 'static) {
        self.on_progress = Some(Box::new(f));
    }

    /// Start capturing into `sink`. Frames and mixed audio are pushed from the next tick on.
    pub fn capture(&mut self, mut sink: Box<dyn FrameSink>) -> ReelResult<()> {
        let cfg = SinkConfig {
            width: self.project.canvas.width,
            height: self.project.canvas.height,
            fps: self.fps,
            audio: self
                .mix
                .as_ref()
                .filter(|_| self.clock.mode() == ClockMode::Audio)
                .map(|m| AudioStreamConfig {
                    sample_rate: m.sample_rate(),
                    channels: m.channels(),
                }),
        };
        sink.begin(cfg)
            .map_err(|e| e.into_encoder_failure(self.log.clone()))?;
        self.record(format!("capture started at {:.3}s", self.progress));
        self.sink = Some(sink);
        Ok(())
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn fps(&self) -> Fps {
        self.fps
    }

    pub fn total_duration(&self) -> f64 {
        self.timeline.total_duration
    }

    pub fn state(&self) -> TransportState {
        self.transport.state()
    }

    /// Last elapsed time reported by a tick.
    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Scene enter/exit history.
    pub fn log(&self) -> &[String] {
        &self.log
    }

    pub fn issues(&self) -> &[AssetIssue] {
        &self.issues
    }

    pub fn has_audio(&self) -> bool {
        self.mix.is_some()
    }

    fn source_now(&self, now: f64) -> f64 {
        match (self.clock.mode(), self.mix.as_ref()) {
            (ClockMode::Audio, Some(mix)) => mix.current_time(),
            _ => now,
        }
    }

    fn ensure_started(&mut self, source_now: f64) {
        if !self.started {
            self.clock.reset(source_now);
            self.started = true;
        }
    }

    fn record(&mut self, line: String) {
        tracing::info!("{line}");
        self.log.push(line);
    }

    pub fn pause(&mut self, now: f64) {
        if !self.transport.pause() {
            return;
        }
        let now = self.source_now(now);
        self.ensure_started(now);
        self.clock.pause(now);
        if let Some(mix) = self.mix.as_mut() {
            mix.suspend();
        }
        tracing::debug!(at = self.progress, "paused");
    }

    pub fn resume(&mut self, now: f64) {
        if !self.transport.resume() {
            return;
        }
        if let Some(mix) = self.mix.as_mut() {
            mix.resume();
        }
        let now = self.source_now(now);
        self.ensure_started(now);
        self.clock.resume(now);
        tracing::debug!(at = self.progress, "resumed");
    }

    /// Queue a seek, applied at the top of the next tick.
    pub fn seek(&mut self, t: f64) {
        let t = t.clamp(0.0, self.timeline.total_duration);
        self.transport.seek(t, self.progress);
    }

    /// Back to time zero, running.
    pub fn restart(&mut self, now: f64) {
        if !self.transport.restart() {
            return;
        }
        if let Some(mix) = self.mix.as_mut() {
            mix.resume();
        }
        let now = self.source_now(now);
        self.started = true;
        self.clock.reset(now);
        if let Some(mix) = self.mix.as_mut() {
            let ctx = mix.current_time();
            mix.align_timeline(ctx);
        }
        self.progress = 0.0;
        self.lap = 0;
        self.current_scene = None;
        self.record("restart".to_owned());
    }

    /// Close the mix graph and finalize the capture sink. Returns the encoded bytes when
    /// capturing. A second call returns `Ok(None)`.
    pub fn stop(&mut self) -> ReelResult<Option<Vec<u8>>> {
        if !self.transport.stop() {
            return Ok(None);
        }
        if let Some(mix) = self.mix.as_mut() {
            mix.close();
        }
        if let Some(scene) = self.current_scene.take() {
            self.record(format!("scene {scene} exit at {:.3}s", self.progress));
        }
        self.record(format!("stopped at {:.3}s", self.progress));
        let Some(mut sink) = self.sink.take() else {
            return Ok(None);
        };
        let bytes = sink
            .end()
            .map_err(|e| e.into_encoder_failure(self.log.clone()))?;
        tracing::info!(frames = self.next_frame, bytes = bytes.len(), "capture finalized");
        Ok(Some(bytes))
    }

    /// Advance one frame. `now` is wall time in seconds; ignored under the audio clock.
    pub fn tick(&mut self, now: f64) -> ReelResult<FrameResult> {
        if self.transport.is_stopped() {
            return Ok(FrameResult::Stopped);
        }
        let source_now = self.source_now(now);
        self.ensure_started(source_now);

        if let Some(t) = self.transport.take_seek() {
            self.clock.seek(t, source_now);
            if let Some(mix) = self.mix.as_mut() {
                mix.align_timeline(mix.current_time() - t);
            }
            self.lap = 0;
            self.record(format!("seek to {t:.3}s"));
        }

        let total = self.timeline.total_duration;
        let elapsed = self.clock.elapsed(source_now);
        let time = match self.mode {
            SessionMode::Preview => self.wrap_preview(elapsed, total),
            SessionMode::Export => elapsed,
        };
        if self.transport.is_paused() {
            self.report_progress(time, total);
            return Ok(FrameResult::Paused { time });
        }
        if self.mode == SessionMode::Export && time >= total {
            self.report_progress(total, total);
            return Ok(FrameResult::Finished);
        }

        let scene = match self.timeline.phase_at(time) {
            Phase::Scene { local } => self.timeline.current_entry(local),
            Phase::Intro { .. } | Phase::Outro { .. } => None,
        };
        self.track_scene(scene, time);

        self.compositor.render(&self.timeline, &mut self.assets, time)?;
        self.push_capture()?;
        self.report_progress(time, total);

        Ok(FrameResult::Frame(RenderedFrame { time, scene }))
    }

    /// Fold `elapsed` into `[0, total)`. Entering a new loop moves the mix timeline back to the
    /// wrapped time so narration replays in step with the pictures.
    fn wrap_preview(&mut self, elapsed: f64, total: f64) -> f64 {
        if total <= 0.0 || elapsed < total {
            return elapsed;
        }
        let lap = (elapsed / total).floor() as u64;
        let time = elapsed - lap as f64 * total;
        if lap != self.lap {
            self.lap = lap;
            if let Some(mix) = self.mix.as_mut() {
                let ctx = mix.current_time();
                mix.align_timeline(ctx - time);
            }
            tracing::debug!(lap, "preview looped");
        }
        time
    }

    /// Draw the programme at `t` without touching the clock or the sink.
    pub fn render_at(&mut self, t: f64) -> ReelResult<&FrameRGBA> {
        let t = t.clamp(0.0, self.timeline.total_duration);
        self.compositor.render(&self.timeline, &mut self.assets, t)
    }

    /// Pixels of the most recent tick or [`RenderSession::render_at`] call.
    pub fn last_frame(&self) -> &FrameRGBA {
        self.compositor.frame()
    }

    /// Pull the next block of mixed audio for a live output. Silence when there is no graph.
    pub fn pull_audio(&mut self, out: &mut [f32]) -> usize {
        match self.mix.as_mut() {
            Some(mix) => mix.render_block(out),
            None => {
                out.fill(0.0);
                0
            }
        }
    }

    fn track_scene(&mut self, scene: Option<usize>, time: f64) {
        if scene == self.current_scene {
            return;
        }
        if let Some(prev) = self.current_scene {
            self.record(format!("scene {prev} exit at {time:.3}s"));
        }
        if let Some(next) = scene {
            self.record(format!("scene {next} enter at {time:.3}s"));
        }
        self.current_scene = scene;
    }

    /// Hand the frame to the sink and, under the audio clock, pull the matching audio block.
    fn push_capture(&mut self) -> ReelResult<()> {
        let idx = self.next_frame;
        self.next_frame += 1;

        // Pulling one frame of audio is what advances the audio clock.
        let block = match (self.clock.mode(), self.mix.as_mut()) {
            (ClockMode::Audio, Some(mix)) if mix.state() == GraphState::Running => {
                let sr = mix.sample_rate();
                let frames = frame_to_sample(idx + 1, self.fps, sr) - frame_to_sample(idx, self.fps, sr);
                Some(mix.render_frames(frames as usize))
            }
            _ => None,
        };

        let Some(sink) = self.sink.as_mut() else {
            return Ok(());
        };
        let frame = self.compositor.frame();
        let result = sink.push_frame(FrameIndex(idx), frame).and_then(|()| match &block {
            Some(samples) => sink.push_audio(samples),
            None => Ok(()),
        });
        result.map_err(|e| e.into_encoder_failure(self.log.clone()))
    }

    fn report_progress(&mut self, elapsed: f64, total: f64) {
        self.progress = elapsed;
        if let Some(cb) = self.on_progress.as_mut() {
            cb(elapsed, total);
        }
    }
}

impl std::fmt::Debug for RenderSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderSession")
            .field("state", &self.transport.state())
            .field("mode", &self.mode)
            .field("progress", &self.progress)
            .field("total", &self.timeline.total_duration)
            .field("frames_captured", &self.next_frame)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/render_session.rs"]
mod tests;

use std::{path::Path, sync::Arc};

use crate::{
    audio::buffer::AudioBuffer,
    foundation::core::Fps,
    foundation::error::{ReelError, ReelResult},
};

/// Output rate of the mix graph.
pub const MIX_SAMPLE_RATE: u32 = 48_000;
/// Output channel count of the mix graph.
pub const MIX_CHANNELS: u16 = 2;

/// What a scheduled clip carries; music is ducked under narration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClipRole {
    Narration,
    Music,
}

#[derive(Clone, Debug)]
pub struct ScheduledClip {
    pub role: ClipRole,
    /// First timeline sample the clip plays at.
    pub start_sample: u64,
    /// Exclusive end on the timeline.
    pub end_sample: u64,
    pub looping: bool,
    pub gain: f32,
    pub fade_in_sec: f64,
    pub fade_out_sec: f64,
    pub buffer: Arc<AudioBuffer>,
}

/// Everything the mix graph plays, in timeline samples at `sample_rate`.
#[derive(Clone, Debug)]
pub struct MixSchedule {
    pub sample_rate: u32,
    pub channels: u16,
    pub total_samples: u64,
    /// Music gain multiplier while narration is audible (1.0 disables ducking).
    pub ducking: f32,
    pub clips: Vec<ScheduledClip>,
}

impl MixSchedule {
    /// Empty schedule covering `total_secs` of timeline.
    pub fn new(total_secs: f64) -> Self {
        Self {
            sample_rate: MIX_SAMPLE_RATE,
            channels: MIX_CHANNELS,
            total_samples: secs_to_sample(total_secs, MIX_SAMPLE_RATE),
            ducking: 1.0,
            clips: Vec::new(),
        }
    }

    /// Schedule a one-shot narration clip at `start_secs` on the timeline.
    pub fn schedule_narration(&mut self, start_secs: f64, buffer: Arc<AudioBuffer>, gain: f32) {
        let start_sample = secs_to_sample(start_secs, self.sample_rate);
        let len = secs_to_sample(buffer.duration_secs(), self.sample_rate);
        self.clips.push(ScheduledClip {
            role: ClipRole::Narration,
            start_sample,
            end_sample: start_sample + len,
            looping: false,
            gain,
            fade_in_sec: 0.0,
            fade_out_sec: 0.0,
            buffer,
        });
    }

    /// Schedule background music from timeline zero to the end (looped) or its own length.
    pub fn schedule_music(
        &mut self,
        buffer: Arc<AudioBuffer>,
        gain: f32,
        looping: bool,
        fade_out_sec: f64,
    ) {
        let own_len = secs_to_sample(buffer.duration_secs(), self.sample_rate);
        let end_sample = if looping {
            self.total_samples
        } else {
            own_len.min(self.total_samples)
        };
        self.clips.push(ScheduledClip {
            role: ClipRole::Music,
            start_sample: 0,
            end_sample,
            looping,
            gain,
            fade_in_sec: 0.0,
            fade_out_sec,
            buffer,
        });
    }

    pub fn narration_count(&self) -> usize {
        self.clips
            .iter()
            .filter(|c| c.role == ClipRole::Narration)
            .count()
    }

    pub fn duration_secs(&self) -> f64 {
        self.total_samples as f64 / f64::from(self.sample_rate)
    }
}

/// Lifecycle of the audio context.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GraphState {
    Running,
    Suspended,
    Closed,
}

/// Pull-driven audio context playing a [`MixSchedule`].
///
/// The context clock (`current_time`) only advances while running. The timeline origin maps
/// context time to schedule time, so a seek realigns playback without rescheduling clips.
#[derive(Debug)]
pub struct MixGraph {
    schedule: MixSchedule,
    narration_spans: Vec<(u64, u64)>,
    state: GraphState,
    context_frames: u64,
    origin_frames: i64,
}

impl MixGraph {
    pub fn new(schedule: MixSchedule) -> ReelResult<Self> {
        if schedule.sample_rate == 0 {
            return Err(ReelError::audio_graph("mix sample rate must be > 0"));
        }
        if !(1..=2).contains(&schedule.channels) {
            return Err(ReelError::audio_graph(format!(
                "mix supports 1 or 2 channels, got {}",
                schedule.channels
            )));
        }
        for clip in &schedule.clips {
            if clip.buffer.channels == 0 || clip.buffer.sample_rate == 0 {
                return Err(ReelError::audio_graph(
                    "scheduled clip has no channels or zero sample rate",
                ));
            }
        }
        let narration_spans = merged_spans(&schedule);
        Ok(Self {
            schedule,
            narration_spans,
            state: GraphState::Running,
            context_frames: 0,
            origin_frames: 0,
        })
    }

    pub fn schedule(&self) -> &MixSchedule {
        &self.schedule
    }

    pub fn state(&self) -> GraphState {
        self.state
    }

    pub fn sample_rate(&self) -> u32 {
        self.schedule.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.schedule.channels
    }

    /// Context time in seconds (advances only while running).
    pub fn current_time(&self) -> f64 {
        self.context_frames as f64 / f64::from(self.schedule.sample_rate)
    }

    /// Schedule position currently being played.
    pub fn timeline_time(&self) -> f64 {
        (self.context_frames as i64 - self.origin_frames) as f64
            / f64::from(self.schedule.sample_rate)
    }

    /// Make timeline zero coincide with context time `origin_secs`.
    pub fn align_timeline(&mut self, origin_secs: f64) {
        let sr = f64::from(self.schedule.sample_rate);
        self.origin_frames = if origin_secs.is_finite() {
            (origin_secs * sr).round() as i64
        } else {
            0
        };
    }

    pub fn suspend(&mut self) {
        if self.state == GraphState::Running {
            self.state = GraphState::Suspended;
        }
    }

    pub fn resume(&mut self) {
        if self.state == GraphState::Suspended {
            self.state = GraphState::Running;
        }
    }

    pub fn close(&mut self) {
        self.state = GraphState::Closed;
    }

    /// Fill `out` (interleaved) with the next block and advance the context clock.
    ///
    /// Suspended or closed graphs output silence and do not advance. Returns frames advanced.
    pub fn render_block(&mut self, out: &mut [f32]) -> usize {
        out.fill(0.0);
        if self.state != GraphState::Running {
            return 0;
        }
        let frames = out.len() / usize::from(self.schedule.channels);
        let start = self.context_frames as i64 - self.origin_frames;
        self.mix_range(start, &mut out[..frames * usize::from(self.schedule.channels)]);
        self.context_frames += frames as u64;
        frames
    }

    /// Pull `frames` frames into a fresh vector.
    pub fn render_frames(&mut self, frames: usize) -> Vec<f32> {
        let mut out = vec![0.0f32; frames * usize::from(self.schedule.channels)];
        self.render_block(&mut out);
        out
    }

    /// Mix the whole schedule offline. Does not touch the context clock.
    pub fn mix_all(&self) -> Vec<f32> {
        let frames = self.schedule.total_samples as usize;
        let mut out = vec![0.0f32; frames * usize::from(self.schedule.channels)];
        self.mix_range(0, &mut out);
        out
    }

    /// Mix schedule samples `[start, start + frames)` into `out` (overwritten), clamped to ±1.
    pub fn mix_range(&self, start: i64, out: &mut [f32]) {
        out.fill(0.0);
        let channels = usize::from(self.schedule.channels);
        let frames = out.len() / channels;
        let block_end = start + frames as i64;
        let sr = f64::from(self.schedule.sample_rate);

        for clip in &self.schedule.clips {
            let clip_end = clip.end_sample.min(self.schedule.total_samples) as i64;
            let s0 = start.max(clip.start_sample as i64);
            let s1 = block_end.min(clip_end);
            if s0 >= s1 {
                continue;
            }
            let src = clip.buffer.as_ref();
            let src_frames = src.frames();
            if src_frames == 0 {
                continue;
            }
            let src_rate = f64::from(src.sample_rate);
            let clip_len_sec = (clip_end - clip.start_sample as i64) as f64 / sr;

            for dst in s0..s1 {
                let rel = (dst - clip.start_sample as i64) as u64;
                let rel_sec = rel as f64 / sr;
                let mut src_pos = rel_sec * src_rate;
                if clip.looping {
                    src_pos %= src_frames as f64;
                }
                let src_frame0 = src_pos.floor() as usize;
                if src_frame0 >= src_frames {
                    break;
                }
                let src_frame1 = (src_frame0 + 1).min(src_frames - 1);
                let frac = (src_pos - src_frame0 as f64) as f32;

                let mut gain = clip.gain * fade_gain(clip, rel_sec, clip_len_sec);
                if clip.role == ClipRole::Music && self.narration_active(dst as u64) {
                    gain *= self.schedule.ducking;
                }

                let idx = (dst - start) as usize * channels;
                for c in 0..channels {
                    let v0 = src.sample(src_frame0, c);
                    let v1 = src.sample(src_frame1, c);
                    out[idx + c] += (v0 + (v1 - v0) * frac) * gain;
                }
            }
        }

        for s in out.iter_mut() {
            *s = s.clamp(-1.0, 1.0);
        }
    }

    fn narration_active(&self, sample: u64) -> bool {
        let i = self.narration_spans.partition_point(|&(s, _)| s <= sample);
        i > 0 && self.narration_spans[i - 1].1 > sample
    }
}

pub fn write_mix_to_f32le_file(samples_interleaved: &[f32], out_path: &Path) -> ReelResult<()> {
    if let Some(parent) = out_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| {
            ReelError::evaluation(format!(
                "failed to create audio mix output directory '{}': {e}",
                parent.display()
            ))
        })?;
    }

    let mut bytes = Vec::<u8>::with_capacity(samples_interleaved.len() * 4);
    for &sample in samples_interleaved {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    std::fs::write(out_path, bytes).map_err(|e| {
        ReelError::evaluation(format!(
            "failed to write mixed audio file '{}': {e}",
            out_path.display()
        ))
    })
}

pub fn secs_to_sample(secs: f64, sample_rate: u32) -> u64 {
    if !secs.is_finite() || secs <= 0.0 {
        return 0;
    }
    (secs * f64::from(sample_rate)).round() as u64
}

pub fn frame_to_sample(frame_delta: u64, fps: Fps, sample_rate: u32) -> u64 {
    let num = u128::from(frame_delta) * u128::from(sample_rate) * u128::from(fps.den);
    let den = u128::from(fps.num);
    ((num + (den / 2)) / den) as u64
}

fn fade_gain(clip: &ScheduledClip, rel_sec: f64, clip_len_sec: f64) -> f32 {
    let mut gain = 1.0f32;
    if clip.fade_in_sec > 0.0 {
        gain *= (rel_sec / clip.fade_in_sec).clamp(0.0, 1.0) as f32;
    }
    if clip.fade_out_sec > 0.0 {
        let rem = (clip_len_sec - rel_sec).max(0.0);
        gain *= (rem / clip.fade_out_sec).clamp(0.0, 1.0) as f32;
    }
    gain
}

fn merged_spans(schedule: &MixSchedule) -> Vec<(u64, u64)> {
    let mut spans: Vec<(u64, u64)> = schedule
        .clips
        .iter()
        .filter(|c| c.role == ClipRole::Narration && c.end_sample > c.start_sample)
        .map(|c| (c.start_sample, c.end_sample))
        .collect();
    spans.sort_unstable();
    let mut merged: Vec<(u64, u64)> = Vec::with_capacity(spans.len());
    for (s, e) in spans {
        match merged.last_mut() {
            Some(last) if s <= last.1 => last.1 = last.1.max(e),
            _ => merged.push((s, e)),
        }
    }
    merged
}

#[cfg(test)]
#[path = "../../tests/unit/audio/mix.rs"]
mod tests;

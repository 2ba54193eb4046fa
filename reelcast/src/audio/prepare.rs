//! Decode and process every narration clip before the render loop starts.

use std::sync::Arc;

use rayon::prelude::*;

use crate::assets::media::decode_audio_f32_stereo;
use crate::assets::store::{AssetIssue, AssetKind, AssetResolver};
use crate::audio::buffer::AudioBuffer;
use crate::audio::dsp::{resample_to_rate, shift_pitch, stretch_audio};
use crate::audio::mix::{MIX_SAMPLE_RATE, MixSchedule};
use crate::foundation::error::ReelResult;
use crate::scene::model::Project;
use crate::timeline::builder::Timeline;

/// One scene's narration after speed and pitch processing.
#[derive(Clone, Debug)]
pub struct SceneAudio {
    pub buffer: Arc<AudioBuffer>,
    /// Length of the decoded clip before speed scaling.
    pub source_secs: f64,
    pub gain: f32,
}

/// Narration and music buffers, immutable once prepared.
#[derive(Clone, Debug, Default)]
pub struct PreparedAudio {
    pub narration: Vec<Option<SceneAudio>>,
    pub music: Option<Arc<AudioBuffer>>,
    pub issues: Vec<AssetIssue>,
}

/// Bring a decoded clip to the mix rate, then apply speed and pitch.
pub fn process_narration(buffer: AudioBuffer, speed: f64, semitones: f64) -> AudioBuffer {
    let buffer = resample_to_rate(buffer, MIX_SAMPLE_RATE);
    let buffer = stretch_audio(buffer, speed);
    shift_pitch(buffer, semitones)
}

impl PreparedAudio {
    /// Decode and process all clips, one rayon task per scene.
    ///
    /// Failed clips become silence and are listed in `issues`.
    #[tracing::instrument(level = "debug", skip_all, fields(scenes = project.scenes.len()))]
    pub fn prepare(project: &Project, resolver: &AssetResolver) -> Self {
        let results: Vec<ReelResult<Option<SceneAudio>>> = (0..project.scenes.len())
            .into_par_iter()
            .map(|i| prepare_scene(project, i, resolver))
            .collect();

        let mut issues = Vec::new();
        let mut narration = Vec::with_capacity(results.len());
        for (i, r) in results.into_iter().enumerate() {
            match r {
                Ok(clip) => narration.push(clip),
                Err(e) => {
                    let url = project.scenes[i].audio_url.as_deref().unwrap_or_default();
                    issues.push(AssetIssue::record(AssetKind::Audio, url, &e));
                    narration.push(None);
                }
            }
        }

        let music = project.background_music.as_ref().and_then(|m| {
            resolver
                .resolve(&m.url)
                .and_then(|p| decode_audio_f32_stereo(&p, MIX_SAMPLE_RATE))
                .map(|b| Arc::new(resample_to_rate(b, MIX_SAMPLE_RATE)))
                .map_err(|e| issues.push(AssetIssue::record(AssetKind::Audio, &m.url, &e)))
                .ok()
        });

        Self {
            narration,
            music,
            issues,
        }
    }

    /// Use decoded lengths for scenes whose `audioDuration` was not supplied.
    pub fn fill_missing_durations(&self, project: &mut Project) {
        for (scene, clip) in project.scenes.iter_mut().zip(&self.narration) {
            if let Some(clip) = clip
                && scene.audio_secs() <= 0.0
                && clip.source_secs > 0.0
            {
                scene.audio_duration = Some(clip.source_secs);
            }
        }
    }

    /// Place narration at each entry's trigger time and lay music under the whole programme.
    pub fn schedule(&self, timeline: &Timeline, project: &Project) -> MixSchedule {
        let mut schedule = MixSchedule::new(timeline.total_duration);
        for (i, entry) in timeline.entries.iter().enumerate() {
            let Some(Some(clip)) = self.narration.get(entry.scene_index) else {
                continue;
            };
            if let Some(start) = timeline.narration_start(i) {
                schedule.schedule_narration(start, Arc::clone(&clip.buffer), clip.gain);
            }
        }
        if let (Some(music), Some(cfg)) = (&self.music, &project.background_music) {
            schedule.ducking = cfg.ducking.clamp(0.0, 1.0) as f32;
            schedule.schedule_music(
                Arc::clone(music),
                cfg.volume.clamp(0.0, 2.0) as f32,
                cfg.looping,
                cfg.fade_out.max(0.0),
            );
        }
        schedule
    }
}

fn prepare_scene(project: &Project, index: usize, resolver: &AssetResolver) -> ReelResult<Option<SceneAudio>> {
    let Some(url) = project.scenes[index].audio_url.as_deref() else {
        return Ok(None);
    };
    let path = resolver.resolve(url)?;
    let decoded = decode_audio_f32_stereo(&path, MIX_SAMPLE_RATE)?;
    let source_secs = decoded.duration_secs();
    let buffer = process_narration(
        decoded,
        project.effective_speed(index),
        project.effective_pitch(index),
    );
    tracing::debug!(scene = index, source_secs, out_secs = buffer.duration_secs(), "narration prepared");
    Ok(Some(SceneAudio {
        buffer: Arc::new(buffer),
        source_secs,
        gain: project.effective_volume(index) as f32,
    }))
}

#[cfg(test)]
#[path = "../../tests/unit/audio/prepare.rs"]
mod tests;

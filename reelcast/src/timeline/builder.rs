use serde::Serialize;
use smallvec::SmallVec;

use crate::scene::model::{CaptionMode, Project, Scene, Transition};
use crate::scene::project::sanitize_speed;
use crate::timeline::caption_layout::{
    CaptionLayout, CaptionLayoutOpts, FIT_STEP_PX, FitParams, TextMeasure, layout_captions,
};

/// Seconds adjacent entries share for any transition other than a cut.
pub const TRANSITION_OVERLAP_SECS: f64 = 1.0;
/// Delay between an entry becoming visible and its narration starting.
pub const NARRATION_PRE_ROLL_SECS: f64 = 1.0;
/// Silence kept after narration ends.
pub const NARRATION_SETTLE_SECS: f64 = 2.0;
/// Minimum duration of a scene without narration.
pub const MIN_SILENT_SCENE_SECS: f64 = 4.0;

/// Resolved window of one scene. Times are relative to the start of the scene phase.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    pub scene_index: usize,
    pub visual_start: f64,
    pub visual_end: f64,
    /// Where the audio cursor stood when this scene began.
    pub audio_start: f64,
    pub audio_trigger_time: f64,
    /// Speed-scaled duration.
    pub duration: f64,
    /// Overlap with the previous entry.
    pub overlap: f64,
    pub speed: f64,
    pub transition: Transition,
    pub caption: CaptionLayout,
}

impl TimelineEntry {
    pub fn visual_len(&self) -> f64 {
        self.visual_end - self.visual_start
    }

    /// Seconds since this entry became visible.
    pub fn local(&self, t: f64) -> f64 {
        t - self.visual_start
    }
}

/// Phase of the programme at a session time, with phase-local time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Phase {
    Intro { local: f64 },
    Scene { local: f64 },
    Outro { local: f64 },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeline {
    pub entries: Vec<TimelineEntry>,
    pub intro_duration: f64,
    pub outro_duration: f64,
    /// Final audio cursor: length of the scene phase.
    pub scene_span: f64,
    pub total_duration: f64,
}

impl Timeline {
    pub fn phase_at(&self, t: f64) -> Phase {
        let t = if t.is_finite() { t.max(0.0) } else { 0.0 };
        if t < self.intro_duration {
            return Phase::Intro { local: t };
        }
        let local = t - self.intro_duration;
        if local < self.scene_span || self.outro_duration <= 0.0 {
            return Phase::Scene {
                local: local.min(self.scene_span),
            };
        }
        Phase::Outro {
            local: (local - self.scene_span).min(self.outro_duration),
        }
    }

    /// Indices of entries visible at scene-phase time `local`, in draw order.
    ///
    /// Windows are half-open except the last entry, which stays visible at the very end.
    pub fn active_entries(&self, local: f64) -> SmallVec<[usize; 2]> {
        let last = self.entries.len().saturating_sub(1);
        self.entries
            .iter()
            .enumerate()
            .filter(|(i, e)| {
                local >= e.visual_start
                    && (local < e.visual_end || (*i == last && local <= e.visual_end))
            })
            .map(|(i, _)| i)
            .collect()
    }

    /// Topmost entry at `local`.
    pub fn current_entry(&self, local: f64) -> Option<usize> {
        self.active_entries(local).last().copied()
    }

    /// Session time of a scene-phase time.
    pub fn to_session_time(&self, local: f64) -> f64 {
        self.intro_duration + local
    }

    /// Session time at which each entry's narration should start.
    pub fn narration_start(&self, entry: usize) -> Option<f64> {
        self.entries
            .get(entry)
            .map(|e| self.to_session_time(e.audio_trigger_time))
    }

    pub fn scene_phase_start(&self) -> f64 {
        self.intro_duration
    }
}

/// Global timing and caption inputs.
#[derive(Clone, Debug, PartialEq)]
pub struct TimelineOpts {
    pub speed: f64,
    pub intro_secs: f64,
    pub outro_secs: f64,
    pub captions: CaptionLayoutOpts,
}

impl TimelineOpts {
    pub fn from_project(project: &Project) -> Self {
        let c = &project.settings.captions;
        let max_width = f64::from(project.canvas.width) * c.max_width.clamp(0.1, 1.0);
        let narration = FitParams {
            max_width,
            max_lines: c.max_lines.max(1) as usize,
            max_size: c.font_size,
            min_size: c.min_font_size,
            step: FIT_STEP_PX,
        };
        let subtitle = FitParams {
            max_size: c.subtitle_font_size.max(1.0),
            min_size: c.min_font_size.min(c.subtitle_font_size.max(1.0)),
            ..narration
        };
        Self {
            speed: project.settings.speed,
            intro_secs: project.intro_secs(),
            outro_secs: project.outro_secs(),
            captions: CaptionLayoutOpts {
                narration,
                subtitle,
                words_per_chunk: c.layout.words_per_line.max(1) as usize,
                dynamic: c.mode == CaptionMode::Dynamic,
            },
        }
    }
}

/// Scene duration before speed scaling, floored at the scene minimum.
pub fn base_duration(scene: &Scene) -> f64 {
    let audio = scene.audio_secs();
    let min = if audio > 0.0 {
        audio + NARRATION_PRE_ROLL_SECS + NARRATION_SETTLE_SECS
    } else {
        MIN_SILENT_SCENE_SECS
    };
    let authored = if scene.duration.is_finite() {
        scene.duration
    } else {
        0.0
    };
    authored.max(min)
}

/// Resolve scenes into absolute windows and precompute caption layout.
#[tracing::instrument(level = "debug", skip_all, fields(scenes = scenes.len()))]
pub fn build_timeline(
    scenes: &[Scene],
    opts: &TimelineOpts,
    measure: &mut dyn TextMeasure,
) -> Timeline {
    let global_speed = sanitize_speed(opts.speed);
    let mut audio_cursor = 0.0f64;
    let mut entries = Vec::with_capacity(scenes.len());

    for (i, scene) in scenes.iter().enumerate() {
        let speed = scene
            .narration_settings
            .as_ref()
            .and_then(|n| n.speed)
            .map_or(global_speed, sanitize_speed);
        let duration = base_duration(scene) / speed;
        let audio_start = audio_cursor;
        audio_cursor += duration;

        let overlap = if i == 0 {
            0.0
        } else {
            scene.transition.overlap_secs()
        };
        let visual_start = (audio_start - overlap).max(0.0);
        let visual_end = audio_start + duration;

        tracing::debug!(
            scene = i,
            visual_start,
            visual_end,
            duration,
            speed,
            transition = ?scene.transition,
            "timeline entry"
        );

        entries.push(TimelineEntry {
            scene_index: i,
            visual_start,
            visual_end,
            audio_start,
            audio_trigger_time: visual_start + NARRATION_PRE_ROLL_SECS,
            duration,
            overlap,
            speed,
            transition: scene.transition,
            caption: layout_captions(&scene.text, &scene.subtitle, &opts.captions, measure),
        });
    }

    let intro = finite_non_negative(opts.intro_secs);
    let outro = finite_non_negative(opts.outro_secs);
    Timeline {
        entries,
        intro_duration: intro,
        outro_duration: outro,
        scene_span: audio_cursor,
        total_duration: intro + audio_cursor + outro,
    }
}

fn finite_non_negative(v: f64) -> f64 {
    if v.is_finite() { v.max(0.0) } else { 0.0 }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/builder.rs"]
mod tests;

use std::path::Path;

use crate::foundation::core::Fps;
use crate::foundation::error::{ReelError, ReelResult};
use crate::scene::model::Project;

pub const MIN_SPEED: f64 = 0.25;
pub const MAX_SPEED: f64 = 4.0;

/// Non-finite or non-positive speeds fall back to 1.0; the rest are clamped to the supported range.
pub fn sanitize_speed(speed: f64) -> f64 {
    if !speed.is_finite() || speed <= 0.0 {
        return 1.0;
    }
    speed.clamp(MIN_SPEED, MAX_SPEED)
}

fn finite_or(v: f64, fallback: f64) -> f64 {
    if v.is_finite() { v } else { fallback }
}

impl Project {
    pub fn from_json_str(s: &str) -> ReelResult<Self> {
        serde_json::from_str(s).map_err(|e| ReelError::serde(format!("project json: {e}")))
    }

    pub fn from_path(path: &Path) -> ReelResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ReelError::validation(format!("failed to read project '{}': {e}", path.display()))
        })?;
        Self::from_json_str(&text)
    }

    /// Structural checks. Timing values are never rejected here; they are clamped when the
    /// timeline is built.
    pub fn validate(&self) -> ReelResult<()> {
        if self.scenes.is_empty() {
            return Err(ReelError::validation("project must contain at least one scene"));
        }
        self.canvas.validate()?;
        Fps::new(self.fps.num, self.fps.den)?;
        for (i, scene) in self.scenes.iter().enumerate() {
            if scene.image_url.trim().is_empty() {
                return Err(ReelError::validation(format!("scene {i}: imageUrl is empty")));
            }
        }
        let captions = &self.settings.captions;
        if !(captions.font_size.is_finite() && captions.font_size > 0.0) {
            return Err(ReelError::validation("captions.fontSize must be > 0"));
        }
        if !(captions.min_font_size.is_finite() && captions.min_font_size > 0.0) {
            return Err(ReelError::validation("captions.minFontSize must be > 0"));
        }
        Ok(())
    }

    /// Scene override speed, else the global speed, sanitized.
    pub fn effective_speed(&self, scene: usize) -> f64 {
        let raw = self
            .scenes
            .get(scene)
            .and_then(|s| s.narration_settings.as_ref())
            .and_then(|n| n.speed)
            .unwrap_or(self.settings.speed);
        sanitize_speed(raw)
    }

    /// Pitch shift in semitones.
    pub fn effective_pitch(&self, scene: usize) -> f64 {
        let raw = self
            .scenes
            .get(scene)
            .and_then(|s| s.narration_settings.as_ref())
            .and_then(|n| n.pitch)
            .unwrap_or(self.settings.pitch);
        finite_or(raw, 0.0).clamp(-12.0, 12.0)
    }

    /// Narration gain in `[0, 2]`.
    pub fn effective_volume(&self, scene: usize) -> f64 {
        let raw = self
            .scenes
            .get(scene)
            .and_then(|s| s.narration_settings.as_ref())
            .and_then(|n| n.volume)
            .unwrap_or(self.settings.volume);
        finite_or(raw, 1.0).clamp(0.0, 2.0)
    }

    pub fn intro_secs(&self) -> f64 {
        self.intro.as_ref().map_or(0.0, |m| m.duration_secs())
    }

    pub fn outro_secs(&self) -> f64 {
        self.outro.as_ref().map_or(0.0, |m| m.duration_secs())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/project.rs"]
mod tests;

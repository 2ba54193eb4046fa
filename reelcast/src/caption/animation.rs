//! Caption animation families as pure functions of progress.
//!
//! Offsets of word ops are in ems (multiples of the chunk font size); static caption offsets are
//! in pixels scaled by the caller-supplied travel distance.

use std::f64::consts::PI;

use crate::animation::ease::{Ease, window_progress};
use crate::caption::chunk::WordState;
use crate::foundation::core::Vec2;
use crate::scene::model::{DynamicAnimation, StaticCaptionAnimation};

/// How to draw one word of a dynamic chunk.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WordOp {
    pub visible: bool,
    pub alpha: f64,
    pub scale: f64,
    /// Offset in ems.
    pub offset: Vec2,
    /// Radians.
    pub rotation: f64,
    /// Draw the whole word in the highlight colour.
    pub highlight: bool,
    /// Reveal only the first `n` characters.
    pub chars: Option<usize>,
    /// Overlay the highlight colour on the left `fill` fraction of the word.
    pub fill: Option<f64>,
    /// Clip the word to its resting box.
    pub masked: bool,
}

impl WordOp {
    pub const REST: Self = Self {
        visible: true,
        alpha: 1.0,
        scale: 1.0,
        offset: Vec2::ZERO,
        rotation: 0.0,
        highlight: false,
        chars: None,
        fill: None,
        masked: false,
    };

    pub const HIDDEN: Self = Self {
        visible: false,
        alpha: 0.0,
        ..Self::REST
    };

    fn highlighted(self) -> Self {
        Self {
            highlight: true,
            ..self
        }
    }
}

/// Word op for one dynamic-mode word.
///
/// `word_progress` is progress through the current word's full duration (karaoke sweep); `t`
/// is scene time, used for jitter.
pub fn dynamic_word_op(
    animation: DynamicAnimation,
    state: WordState,
    word_chars: usize,
    word_progress: f64,
    t: f64,
) -> WordOp {
    match animation {
        DynamicAnimation::None => match state {
            WordState::Entering { .. } | WordState::Active => WordOp::REST.highlighted(),
            _ => WordOp::REST,
        },
        DynamicAnimation::Pop => match state {
            WordState::Entering { progress } => WordOp {
                scale: 0.7 + 0.45 * Ease::OutBack.apply(progress),
                ..WordOp::REST.highlighted()
            },
            WordState::Active => WordOp {
                scale: 1.15,
                ..WordOp::REST.highlighted()
            },
            _ => WordOp::REST,
        },
        DynamicAnimation::Shake => match state {
            WordState::Entering { progress } => {
                let amp = 1.0 - progress;
                WordOp {
                    offset: Vec2::new((t * 70.0).sin() * 0.08 * amp, (t * 53.0).cos() * 0.05 * amp),
                    rotation: (t * 61.0).sin() * 0.06 * amp,
                    ..WordOp::REST.highlighted()
                }
            }
            WordState::Active => WordOp::REST.highlighted(),
            _ => WordOp::REST,
        },
        DynamicAnimation::Elastic => match state {
            WordState::Entering { progress } => WordOp {
                scale: 0.4 + 0.7 * Ease::OutElastic.apply(progress),
                ..WordOp::REST.highlighted()
            },
            WordState::Active => WordOp {
                scale: 1.1,
                ..WordOp::REST.highlighted()
            },
            _ => WordOp::REST,
        },
        DynamicAnimation::Typewriter => match state {
            WordState::Inactive => WordOp::HIDDEN,
            WordState::Entering { progress } => {
                let n = ((progress * word_chars as f64).ceil() as usize).clamp(1, word_chars.max(1));
                WordOp {
                    chars: Some(n),
                    ..WordOp::REST.highlighted()
                }
            }
            WordState::Active => WordOp::REST.highlighted(),
            WordState::Settled => WordOp::REST,
        },
        DynamicAnimation::KaraokeV2 => match state {
            WordState::Inactive => WordOp {
                fill: Some(0.0),
                ..WordOp::REST
            },
            WordState::Entering { .. } | WordState::Active => WordOp {
                fill: Some(word_progress.clamp(0.0, 1.0)),
                ..WordOp::REST
            },
            WordState::Settled => WordOp {
                fill: Some(1.0),
                ..WordOp::REST
            },
        },
        DynamicAnimation::MaskReveal => match state {
            WordState::Inactive => WordOp::HIDDEN,
            WordState::Entering { progress } => WordOp {
                offset: Vec2::new(0.0, (1.0 - Ease::OutCubic.apply(progress)) * 0.9),
                masked: true,
                ..WordOp::REST.highlighted()
            },
            WordState::Active => WordOp {
                masked: true,
                ..WordOp::REST.highlighted()
            },
            WordState::Settled => WordOp::REST,
        },
        DynamicAnimation::KineticStacking => match state {
            WordState::Inactive => WordOp::HIDDEN,
            WordState::Entering { progress } => {
                let e = Ease::OutCubic.apply(progress);
                WordOp {
                    alpha: e,
                    offset: Vec2::new(0.0, -(1.0 - e) * 1.2),
                    scale: 1.3 - 0.3 * e,
                    ..WordOp::REST.highlighted()
                }
            }
            WordState::Active => WordOp::REST.highlighted(),
            WordState::Settled => WordOp::REST,
        },
    }
}

/// Transform applied to a static caption block.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CaptionOp {
    pub alpha: f64,
    pub offset: Vec2,
    pub scale: f64,
}

impl CaptionOp {
    pub const REST: Self = Self {
        alpha: 1.0,
        offset: Vec2::ZERO,
        scale: 1.0,
    };
}

/// Delay after the entry becomes visible before its captions animate in.
pub const CAPTION_ENTRANCE_DELAY_SECS: f64 = 0.5;
pub const CAPTION_ANIM_SECS: f64 = 0.5;

/// Caption at entrance `progress` (0 hidden side, 1 at rest).
pub fn entrance_op(animation: StaticCaptionAnimation, progress: f64, distance: f64) -> CaptionOp {
    let p = progress.clamp(0.0, 1.0);
    let e = Ease::OutCubic.apply(p);
    let away = 1.0 - e;
    match animation {
        StaticCaptionAnimation::None => CaptionOp::REST,
        StaticCaptionAnimation::Fade => CaptionOp {
            alpha: e,
            ..CaptionOp::REST
        },
        StaticCaptionAnimation::SlideUp => CaptionOp {
            alpha: e,
            offset: Vec2::new(0.0, away * distance),
            ..CaptionOp::REST
        },
        StaticCaptionAnimation::SlideDown => CaptionOp {
            alpha: e,
            offset: Vec2::new(0.0, -away * distance),
            ..CaptionOp::REST
        },
        StaticCaptionAnimation::SlideLeft => CaptionOp {
            alpha: e,
            offset: Vec2::new(away * distance, 0.0),
            ..CaptionOp::REST
        },
        StaticCaptionAnimation::SlideRight => CaptionOp {
            alpha: e,
            offset: Vec2::new(-away * distance, 0.0),
            ..CaptionOp::REST
        },
        StaticCaptionAnimation::Zoom => CaptionOp {
            alpha: e,
            scale: 0.5 + 0.5 * e,
            ..CaptionOp::REST
        },
        StaticCaptionAnimation::Pop => CaptionOp {
            alpha: p.min(1.0),
            scale: Ease::OutBack.apply(p).max(0.0),
            ..CaptionOp::REST
        },
    }
}

/// Caption at exit `progress` (0 at rest, 1 gone). Exits mirror entrances, moving onward.
pub fn exit_op(animation: StaticCaptionAnimation, progress: f64, distance: f64) -> CaptionOp {
    let p = progress.clamp(0.0, 1.0);
    let e = Ease::InCubic.apply(p);
    let stay = 1.0 - e;
    match animation {
        StaticCaptionAnimation::None => CaptionOp::REST,
        StaticCaptionAnimation::Fade => CaptionOp {
            alpha: stay,
            ..CaptionOp::REST
        },
        StaticCaptionAnimation::SlideUp => CaptionOp {
            alpha: stay,
            offset: Vec2::new(0.0, -e * distance),
            ..CaptionOp::REST
        },
        StaticCaptionAnimation::SlideDown => CaptionOp {
            alpha: stay,
            offset: Vec2::new(0.0, e * distance),
            ..CaptionOp::REST
        },
        StaticCaptionAnimation::SlideLeft => CaptionOp {
            alpha: stay,
            offset: Vec2::new(-e * distance, 0.0),
            ..CaptionOp::REST
        },
        StaticCaptionAnimation::SlideRight => CaptionOp {
            alpha: stay,
            offset: Vec2::new(e * distance, 0.0),
            ..CaptionOp::REST
        },
        StaticCaptionAnimation::Zoom => CaptionOp {
            alpha: stay,
            scale: 1.0 + 0.5 * e,
            ..CaptionOp::REST
        },
        StaticCaptionAnimation::Pop => CaptionOp {
            alpha: stay,
            scale: 1.0 + 0.2 * (PI * p).sin() - 0.8 * e,
            ..CaptionOp::REST
        },
    }
}

/// Visibility window of one entry's static captions (scene-phase times).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CaptionWindow {
    pub visual_start: f64,
    pub visual_end: f64,
    /// Overlap with the following entry; zero for the last entry or a cut.
    pub next_overlap: f64,
}

impl CaptionWindow {
    pub fn entrance_start(&self) -> f64 {
        self.visual_start + CAPTION_ENTRANCE_DELAY_SECS
    }

    /// Captions are gone from here on; the outgoing side of a cross-dissolve never shows them.
    pub fn exit_end(&self) -> f64 {
        self.visual_end - self.next_overlap
    }
}

/// Static caption op at scene time `t`, or `None` while hidden.
pub fn static_caption_op(
    entrance: StaticCaptionAnimation,
    exit: StaticCaptionAnimation,
    window: CaptionWindow,
    t: f64,
    distance: f64,
) -> Option<CaptionOp> {
    let start = window.entrance_start();
    let end = window.exit_end();
    if t < start || t >= end {
        return None;
    }
    let exit_start = end - CAPTION_ANIM_SECS;
    if exit != StaticCaptionAnimation::None && t >= exit_start {
        return Some(exit_op(exit, window_progress(t, exit_start, CAPTION_ANIM_SECS), distance));
    }
    Some(entrance_op(
        entrance,
        window_progress(t, start, CAPTION_ANIM_SECS),
        distance,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/caption/animation.rs"]
mod tests;

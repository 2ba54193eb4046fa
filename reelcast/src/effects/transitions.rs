//! Image-layer transitions as pure functions from entry time to draw ops.

use std::f64::consts::TAU;

use smallvec::{SmallVec, smallvec};

use crate::animation::ease::{Ease, window_progress};
use crate::effects::composite::BlendMode;
use crate::foundation::core::{Affine, Rect, Vec2};
use crate::foundation::math::{hash_u32, hash_unit, lerp, time_seed};
use crate::scene::model::{Transition, TransitionKind};

/// Length of an entrance effect.
pub const ENTRANCE_SECS: f64 = 1.0;

const ZOOM_BLUR_PASSES: usize = 6;
const MOTION_GHOSTS: usize = 4;
const LUMA_CELL_PX: u32 = 24;
const SHAKE_STEPS_PER_SEC: f64 = 30.0;
const GLITCH_STEPS_PER_SEC: f64 = 24.0;

/// One draw of the scene image. `transform` applies on top of the cover-fit placement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImageDraw {
    pub transform: Affine,
    pub opacity: f64,
    pub clip: Option<Rect>,
    pub blend: BlendMode,
}

impl ImageDraw {
    pub const BASE: Self = Self {
        transform: Affine::IDENTITY,
        opacity: 1.0,
        clip: None,
        blend: BlendMode::Normal,
    };
}

/// Pixel pass run on the entry layer after its draws.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PostFx {
    /// Keep each `cell`-pixel block whose hash falls below `progress`.
    LumaDissolve { progress: f64, cell: u32, seed: u64 },
    /// RGB split plus horizontal slice displacement.
    Glitch {
        strength: f64,
        split_px: i32,
        seed: u64,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct TransitionOp {
    pub draws: SmallVec<[ImageDraw; 8]>,
    pub post: Option<PostFx>,
}

impl TransitionOp {
    fn single(draw: ImageDraw) -> Self {
        Self {
            draws: smallvec![draw],
            post: None,
        }
    }

    pub fn is_rest(&self) -> bool {
        self.post.is_none() && self.draws.as_slice() == [ImageDraw::BASE]
    }
}

/// Geometry and timing of one active entry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransitionInput {
    /// Output frame.
    pub frame: Rect,
    /// Cover-fit image placement.
    pub base: Rect,
    /// Seconds since the entry became visible.
    pub local: f64,
    /// Visible length of the entry.
    pub duration: f64,
    /// Per-scene seed for deterministic randomness.
    pub seed: u64,
}

fn about(center: Vec2, m: Affine) -> Affine {
    Affine::translate(center) * m * Affine::translate(-center)
}

fn scaled(center: Vec2, s: f64) -> Affine {
    about(center, Affine::scale(s))
}

/// Draw ops for `transition` at `input.local`.
pub fn transition_op(transition: Transition, input: &TransitionInput) -> TransitionOp {
    match transition.kind() {
        TransitionKind::Cut => TransitionOp::single(ImageDraw::BASE),
        TransitionKind::Entrance => {
            let p = window_progress(input.local, 0.0, ENTRANCE_SECS);
            if p >= 1.0 {
                return TransitionOp::single(ImageDraw::BASE);
            }
            entrance_op(transition, p, input)
        }
        TransitionKind::Continuous => continuous_op(transition, input),
    }
}

fn entrance_op(transition: Transition, p: f64, input: &TransitionInput) -> TransitionOp {
    let f = input.frame;
    let c = input.base.center().to_vec2();
    let e = Ease::OutCubic.apply(p);
    let away = 1.0 - e;
    let slide = |d: Vec2| {
        TransitionOp::single(ImageDraw {
            transform: Affine::translate(d * away),
            ..ImageDraw::BASE
        })
    };
    let wipe = |clip: Rect| {
        TransitionOp::single(ImageDraw {
            clip: Some(clip),
            ..ImageDraw::BASE
        })
    };

    match transition {
        Transition::Fade => TransitionOp::single(ImageDraw {
            opacity: Ease::InOutSine.apply(p),
            ..ImageDraw::BASE
        }),
        Transition::ScaleUp => TransitionOp::single(ImageDraw {
            transform: scaled(c, lerp(0.6, 1.0, e)),
            opacity: e,
            ..ImageDraw::BASE
        }),
        Transition::PopIn => TransitionOp::single(ImageDraw {
            transform: scaled(c, Ease::OutBack.apply(p).max(0.0)),
            opacity: (p * 3.0).min(1.0),
            ..ImageDraw::BASE
        }),
        Transition::Blink => {
            let on = ((p * 6.0).floor() as i64) % 2 == 1;
            TransitionOp::single(ImageDraw {
                opacity: if on { 1.0 } else { 0.0 },
                ..ImageDraw::BASE
            })
        }
        Transition::SlideLeft => slide(Vec2::new(f.width(), 0.0)),
        Transition::SlideRight => slide(Vec2::new(-f.width(), 0.0)),
        Transition::SlideUp => slide(Vec2::new(0.0, f.height())),
        Transition::SlideDown => slide(Vec2::new(0.0, -f.height())),
        Transition::WipeRight => wipe(Rect::new(f.x0, f.y0, lerp(f.x0, f.x1, e), f.y1)),
        Transition::WipeLeft => wipe(Rect::new(lerp(f.x1, f.x0, e), f.y0, f.x1, f.y1)),
        Transition::WipeDown => wipe(Rect::new(f.x0, f.y0, f.x1, lerp(f.y0, f.y1, e))),
        Transition::WipeUp => wipe(Rect::new(f.x0, lerp(f.y1, f.y0, e), f.x1, f.y1)),
        Transition::DropIn => TransitionOp::single(ImageDraw {
            transform: Affine::translate((0.0, -(1.0 - Ease::OutBounce.apply(p)) * f.height())),
            ..ImageDraw::BASE
        }),
        Transition::SpinIn => TransitionOp::single(ImageDraw {
            transform: about(c, Affine::rotate(away * TAU) * Affine::scale(e.max(0.01))),
            opacity: e,
            ..ImageDraw::BASE
        }),
        Transition::ZoomBlur => {
            let mut draws: SmallVec<[ImageDraw; 8]> = smallvec![ImageDraw {
                opacity: e,
                ..ImageDraw::BASE
            }];
            let glow = 0.6 * away / ZOOM_BLUR_PASSES as f64;
            for k in 1..=ZOOM_BLUR_PASSES {
                draws.push(ImageDraw {
                    transform: scaled(c, 1.0 + k as f64 * 0.05 * away),
                    opacity: glow,
                    clip: None,
                    blend: BlendMode::Add,
                });
            }
            TransitionOp { draws, post: None }
        }
        Transition::MotionWipe => {
            let lead = f.width() * away;
            let mut draws: SmallVec<[ImageDraw; 8]> = SmallVec::new();
            for k in (1..=MOTION_GHOSTS).rev() {
                let trail = lead + k as f64 * 0.12 * f.width() * away;
                draws.push(ImageDraw {
                    transform: Affine::translate((trail, 0.0)),
                    opacity: 0.35 / k as f64,
                    ..ImageDraw::BASE
                });
            }
            draws.push(ImageDraw {
                transform: Affine::translate((lead, 0.0)),
                ..ImageDraw::BASE
            });
            TransitionOp { draws, post: None }
        }
        Transition::LumaFade => TransitionOp {
            draws: smallvec![ImageDraw::BASE],
            post: Some(PostFx::LumaDissolve {
                progress: p,
                cell: LUMA_CELL_PX,
                seed: input.seed,
            }),
        },
        Transition::Glitch => {
            let strength = 1.0 - p;
            TransitionOp {
                draws: smallvec![ImageDraw {
                    opacity: (p * 4.0).min(1.0),
                    ..ImageDraw::BASE
                }],
                post: Some(PostFx::Glitch {
                    strength,
                    split_px: (strength * f.width() * 0.02).round() as i32,
                    seed: time_seed(input.local, GLITCH_STEPS_PER_SEC) ^ input.seed,
                }),
            }
        }
        // Cut and continuous families are handled by the caller.
        Transition::None
        | Transition::Shake
        | Transition::Panorama
        | Transition::ZoomIn
        | Transition::ZoomOut
        | Transition::PanLeft
        | Transition::PanRight => TransitionOp::single(ImageDraw::BASE),
    }
}

fn continuous_op(transition: Transition, input: &TransitionInput) -> TransitionOp {
    let f = input.frame;
    let c = input.base.center().to_vec2();
    let u = if input.duration > 0.0 {
        (input.local / input.duration).clamp(0.0, 1.0)
    } else {
        1.0
    };
    // Continuous entries still cross-dissolve over their overlap.
    let opacity = Ease::InOutSine.apply(window_progress(input.local, 0.0, ENTRANCE_SECS));

    let transform = match transition {
        Transition::Shake => {
            let s = time_seed(input.local, SHAKE_STEPS_PER_SEC) ^ input.seed;
            let amp = 0.015 * f.width();
            let dx = (hash_unit(s, 1, 0) - 0.5) * 2.0 * amp;
            let dy = (hash_unit(s, 2, 0) - 0.5) * 2.0 * amp;
            Affine::translate((dx, dy)) * scaled(c, 1.06)
        }
        Transition::Panorama => {
            let s = lerp(1.1, 1.25, u);
            let dx = lerp(-0.05, 0.05, u) * f.width();
            let dy = lerp(0.03, -0.03, u) * f.height();
            Affine::translate((dx, dy)) * scaled(c, s)
        }
        Transition::ZoomIn => scaled(c, lerp(1.0, 1.2, u)),
        Transition::ZoomOut => scaled(c, lerp(1.2, 1.0, u)),
        Transition::PanLeft => {
            Affine::translate((lerp(0.07, -0.07, u) * f.width(), 0.0)) * scaled(c, 1.15)
        }
        Transition::PanRight => {
            Affine::translate((lerp(-0.07, 0.07, u) * f.width(), 0.0)) * scaled(c, 1.15)
        }
        Transition::None
        | Transition::Fade
        | Transition::ScaleUp
        | Transition::PopIn
        | Transition::Blink
        | Transition::SlideLeft
        | Transition::SlideRight
        | Transition::SlideUp
        | Transition::SlideDown
        | Transition::WipeLeft
        | Transition::WipeRight
        | Transition::WipeUp
        | Transition::WipeDown
        | Transition::DropIn
        | Transition::SpinIn
        | Transition::ZoomBlur
        | Transition::MotionWipe
        | Transition::LumaFade
        | Transition::Glitch => Affine::IDENTITY,
    };
    TransitionOp::single(ImageDraw {
        transform,
        opacity,
        ..ImageDraw::BASE
    })
}

/// Zero every `cell`-sized block whose hash is at or above `progress`.
pub fn apply_luma_dissolve(buf: &mut [u8], width: u32, height: u32, progress: f64, cell: u32, seed: u64) {
    let cell = cell.max(1);
    if progress >= 1.0 {
        return;
    }
    let cols = width.div_ceil(cell);
    for y in 0..height {
        let cy = y / cell;
        let row = (y * width) as usize * 4;
        for cx in 0..cols {
            if hash_unit(seed, cx, cy) < progress {
                continue;
            }
            let x0 = cx * cell;
            let x1 = (x0 + cell).min(width);
            buf[row + x0 as usize * 4..row + x1 as usize * 4].fill(0);
        }
    }
}

/// RGB split and slice displacement; `scratch` is resized to match `buf`.
pub fn apply_glitch(
    buf: &mut [u8],
    scratch: &mut Vec<u8>,
    width: u32,
    height: u32,
    strength: f64,
    split_px: i32,
    seed: u64,
) {
    if strength <= 0.0 || width == 0 || height == 0 {
        return;
    }
    scratch.clear();
    scratch.extend_from_slice(buf);
    let w = width as i32;

    // Horizontal bands displaced by a per-band random shift.
    let bands = 6 + (hash_u32(seed, 0, 0) % 6) as i32;
    let mut shifts = vec![0i32; height as usize];
    for b in 0..bands {
        let y0 = (hash_unit(seed, 1, b as u32) * f64::from(height)) as u32;
        let bh = 2 + (hash_unit(seed, 2, b as u32) * f64::from(height) * 0.06) as u32;
        let shift = ((hash_unit(seed, 3, b as u32) - 0.5) * 2.0 * strength * f64::from(width) * 0.08)
            .round() as i32;
        for y in y0..(y0 + bh).min(height) {
            shifts[y as usize] = shift;
        }
    }

    for y in 0..height as i32 {
        let shift = shifts[y as usize];
        let row = (y * w) as usize * 4;
        for x in 0..w {
            let sample = |dx: i32, c: usize| -> u8 {
                let sx = (x - shift + dx).clamp(0, w - 1);
                scratch[row + sx as usize * 4 + c]
            };
            let a = sample(0, 3);
            let o = row + x as usize * 4;
            buf[o] = sample(split_px, 0).min(a);
            buf[o + 1] = sample(0, 1).min(a);
            buf[o + 2] = sample(-split_px, 2).min(a);
            buf[o + 3] = a;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/transitions.rs"]
mod tests;

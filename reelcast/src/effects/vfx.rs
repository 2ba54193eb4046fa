//! Film-look overlay: light leaks, grain, dust, vignette.
//!
//! Everything is a function of `(t, canvas)` so frames render identically on re-seek.

use crate::effects::composite::{PremulRgba8, over, screen};
use crate::foundation::math::{hash_unit, smoothstep, time_seed};
use crate::scene::model::VfxConfig;

const GRAIN_DENSITY: f64 = 0.02;
const GRAIN_STEPS_PER_SEC: f64 = 24.0;
const DUST_PARTICLES: f64 = 48.0;
const LEAK_COLORS: [[u8; 3]; 3] = [[255, 150, 60], [255, 90, 120], [255, 210, 120]];

/// Per-session VFX state; only the vignette mask is cached.
#[derive(Debug, Default)]
pub struct VfxLayer {
    vignette: Option<VignetteMask>,
}

#[derive(Debug)]
struct VignetteMask {
    width: u32,
    height: u32,
    intensity_bits: u64,
    /// Per-pixel multiplier in `0..=256`.
    scale: Vec<u16>,
}

impl VfxLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw every enabled effect onto `frame` at time `t`.
    pub fn apply(&mut self, frame: &mut [u8], width: u32, height: u32, cfg: &VfxConfig, t: f64) {
        if width == 0 || height == 0 {
            return;
        }
        let leaks = cfg.light_leaks.level();
        if leaks > 0.0 {
            light_leaks(frame, width, height, leaks, t);
        }
        let grain_level = cfg.grain.level();
        if grain_level > 0.0 {
            grain(frame, width, height, grain_level, t, cfg.throttled);
        }
        let dust_level = cfg.dust.level();
        if dust_level > 0.0 {
            dust(frame, width, height, dust_level, t, cfg.throttled);
        }
        let vignette = cfg.vignette.level();
        if vignette > 0.0 {
            self.vignette(frame, width, height, vignette);
        }
    }

    fn vignette(&mut self, frame: &mut [u8], width: u32, height: u32, intensity: f64) {
        let bits = intensity.to_bits();
        let stale = self
            .vignette
            .as_ref()
            .is_none_or(|m| m.width != width || m.height != height || m.intensity_bits != bits);
        if stale {
            self.vignette = Some(VignetteMask::build(width, height, intensity));
        }
        let Some(mask) = self.vignette.as_ref() else {
            return;
        };
        for (px, &s) in frame.chunks_exact_mut(4).zip(&mask.scale) {
            for c in &mut px[..3] {
                *c = ((u32::from(*c) * u32::from(s)) >> 8) as u8;
            }
        }
    }
}

impl VignetteMask {
    fn build(width: u32, height: u32, intensity: f64) -> Self {
        let cx = f64::from(width) * 0.5;
        let cy = f64::from(height) * 0.5;
        let max_d = (cx * cx + cy * cy).sqrt();
        let mut scale = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                let dx = f64::from(x) + 0.5 - cx;
                let dy = f64::from(y) + 0.5 - cy;
                let d = ((dx * dx + dy * dy).sqrt() / max_d) as f32;
                let dark = f64::from(smoothstep(0.45, 1.0, d)) * intensity * 0.85;
                scale.push(((1.0 - dark) * 256.0).round().clamp(0.0, 256.0) as u16);
            }
        }
        Self {
            width,
            height,
            intensity_bits: intensity.to_bits(),
            scale,
        }
    }
}

/// Warm radial blobs drifting slowly across the frame, screen-blended.
fn light_leaks(frame: &mut [u8], width: u32, height: u32, intensity: f64, t: f64) {
    let (w, h) = (f64::from(width), f64::from(height));
    let radius = w.max(h) * 0.45;
    for (i, color) in LEAK_COLORS.iter().enumerate() {
        let k = i as f64;
        let cx = w * (0.5 + 0.45 * (t * (0.11 + 0.04 * k) + k * 2.1).sin());
        let cy = h * (0.5 + 0.40 * (t * (0.07 + 0.03 * k) + k * 1.3).cos());
        let pulse = 0.75 + 0.25 * (t * 0.9 + k).sin();
        let peak = (intensity * 0.55 * pulse) as f32;

        let x0 = (cx - radius).floor().max(0.0) as u32;
        let x1 = ((cx + radius).ceil().max(0.0) as u32).min(width);
        let y0 = (cy - radius).floor().max(0.0) as u32;
        let y1 = ((cy + radius).ceil().max(0.0) as u32).min(height);
        for y in y0..y1 {
            let dy = f64::from(y) + 0.5 - cy;
            for x in x0..x1 {
                let dx = f64::from(x) + 0.5 - cx;
                let d = (dx * dx + dy * dy).sqrt() / radius;
                if d >= 1.0 {
                    continue;
                }
                let falloff = ((1.0 - d) * (1.0 - d)) as f32;
                let o = (y as usize * width as usize + x as usize) * 4;
                let dst: PremulRgba8 = [frame[o], frame[o + 1], frame[o + 2], frame[o + 3]];
                let src = [color[0], color[1], color[2], 255];
                frame[o..o + 4].copy_from_slice(&screen(dst, src, peak * falloff));
            }
        }
    }
}

fn grain(frame: &mut [u8], width: u32, height: u32, intensity: f64, t: f64, throttled: bool) {
    let mut count = (f64::from(width) * f64::from(height) * GRAIN_DENSITY * intensity) as u32;
    if throttled {
        count /= 2;
    }
    let seed = time_seed(t, GRAIN_STEPS_PER_SEC);
    let alpha = (0.2 + 0.3 * intensity) as f32;
    for i in 0..count {
        let x = (hash_unit(seed, i, 0) * f64::from(width)) as u32;
        let y = (hash_unit(seed, i, 1) * f64::from(height)) as u32;
        let speck = if hash_unit(seed, i, 2) < 0.5 {
            [0, 0, 0, 255]
        } else {
            [255, 255, 255, 255]
        };
        plot(frame, width, x.min(width - 1), y.min(height - 1), speck, alpha);
    }
}

/// Dust motes on fixed sinusoidal paths; position depends only on `t`.
fn dust(frame: &mut [u8], width: u32, height: u32, intensity: f64, t: f64, throttled: bool) {
    let mut count = (DUST_PARTICLES * intensity).ceil() as u32;
    if throttled {
        count = count.div_ceil(2);
    }
    let (w, h) = (f64::from(width), f64::from(height));
    for i in 0..count {
        let bx = hash_unit(0xD057, i, 0);
        let by = hash_unit(0xD057, i, 1);
        let phase = hash_unit(0xD057, i, 2) * std::f64::consts::TAU;
        let speed = 0.2 + hash_unit(0xD057, i, 3) * 0.6;
        let x = (bx + 0.08 * (t * speed + phase).sin()).rem_euclid(1.0) * w;
        let y = (by + 0.06 * (t * speed * 0.7 + phase * 1.7).cos() + t * 0.01 * speed)
            .rem_euclid(1.0)
            * h;
        let r = 1.0 + hash_unit(0xD057, i, 4) * 2.0 * (h / 720.0).max(0.5);
        let alpha = (intensity * (0.35 + 0.4 * hash_unit(0xD057, i, 5))) as f32;
        disc(frame, width, height, x, y, r, [235, 230, 220, 255], alpha);
    }
}

fn plot(frame: &mut [u8], width: u32, x: u32, y: u32, src: PremulRgba8, opacity: f32) {
    let o = (y as usize * width as usize + x as usize) * 4;
    let dst = [frame[o], frame[o + 1], frame[o + 2], frame[o + 3]];
    frame[o..o + 4].copy_from_slice(&over(dst, src, opacity));
}

#[allow(clippy::too_many_arguments)]
fn disc(frame: &mut [u8], width: u32, height: u32, cx: f64, cy: f64, r: f64, src: PremulRgba8, opacity: f32) {
    let x0 = (cx - r).floor().max(0.0) as u32;
    let x1 = ((cx + r).ceil().max(0.0) as u32).min(width);
    let y0 = (cy - r).floor().max(0.0) as u32;
    let y1 = ((cy + r).ceil().max(0.0) as u32).min(height);
    for y in y0..y1 {
        for x in x0..x1 {
            let dx = f64::from(x) + 0.5 - cx;
            let dy = f64::from(y) + 0.5 - cy;
            let d = (dx * dx + dy * dy).sqrt();
            // One-pixel soft edge.
            let cover = (r - d + 0.5).clamp(0.0, 1.0) as f32;
            if cover > 0.0 {
                plot(frame, width, x, y, src, opacity * cover);
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/vfx.rs"]
mod tests;

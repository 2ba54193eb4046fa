//! Pure PCM transforms: resampling, SOLA time-stretch and pitch shift.
//!
//! None of these functions fail. Degenerate input (no channels, zero sample rate, fewer frames
//! than one analysis frame, non-finite parameters) is returned unchanged.

use crate::audio::buffer::AudioBuffer;

/// SOLA analysis/synthesis frame length.
pub const SOLA_FRAME_SECS: f64 = 0.060;
/// Cross-correlation search window.
pub const SOLA_SEARCH_SECS: f64 = 0.015;

/// SOLA parameters resolved for a sample rate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SolaParams {
    /// Frame length `W` in sample frames.
    pub frame: usize,
    /// Overlap `Ov` in sample frames (half the frame).
    pub overlap: usize,
    /// Search window `S` in sample frames.
    pub search: usize,
}

impl SolaParams {
    pub fn for_rate(sample_rate: u32) -> Self {
        let sr = f64::from(sample_rate);
        let frame = ((SOLA_FRAME_SECS * sr).round() as usize).max(4);
        let overlap = frame / 2;
        let search = ((SOLA_SEARCH_SECS * sr).round() as usize).max(1);
        Self {
            frame,
            overlap,
            search,
        }
    }

    /// Synthesis hop `Hs = W - Ov`.
    pub fn synthesis_hop(self) -> usize {
        self.frame - self.overlap
    }
}

/// Time-stretch `buffer` by `speed` without changing pitch.
///
/// `speed > 1` shortens, `speed < 1` lengthens. The output holds exactly
/// `round(frames / speed)` sample frames. Speeds within 1% of 1.0 are an identity.
pub fn stretch_audio(buffer: AudioBuffer, speed: f64) -> AudioBuffer {
    if !speed.is_finite() || speed <= 0.0 || (speed - 1.0).abs() < 0.01 {
        return buffer;
    }
    if buffer.channels == 0 || buffer.sample_rate == 0 {
        return buffer;
    }
    let params = SolaParams::for_rate(buffer.sample_rate);
    let n = buffer.frames();
    if n < params.frame {
        return buffer;
    }

    let ch = usize::from(buffer.channels);
    let w = params.frame;
    let ov = params.overlap;
    let hs = params.synthesis_hop();
    let ha = hs as f64 * speed;
    let target = ((n as f64) / speed).round() as usize;
    let stride = correlation_stride(buffer.sample_rate);

    let mono = buffer.mixdown();
    let src = &buffer.samples;
    let mut out = vec![0.0f32; (target + w) * ch];
    let mut out_mono = vec![0.0f32; target + w];
    let fade = hann_fade(ov);

    out[..w * ch].copy_from_slice(&src[..w * ch]);
    out_mono[..w].copy_from_slice(&mono[..w]);
    let mut written = w;
    let mut src_end = w;

    let mut k = 1usize;
    loop {
        let syn = k * hs;
        if syn >= target {
            break;
        }
        let nominal = (k as f64 * ha).round() as usize;
        if nominal + w > n {
            break;
        }
        let max_offset = params.search.min(n - w - nominal + 1);
        let offset = best_offset(&mono, nominal, max_offset, &out_mono[syn..syn + ov], stride);
        let pos = nominal + offset;

        for (i, &g) in fade.iter().enumerate() {
            let o = syn + i;
            let s = pos + i;
            for c in 0..ch {
                let d = &mut out[o * ch + c];
                *d = *d * (1.0 - g) + src[s * ch + c] * g;
            }
            out_mono[o] = out_mono[o] * (1.0 - g) + mono[s] * g;
        }
        let rest = w - ov;
        let o0 = syn + ov;
        let s0 = pos + ov;
        out[o0 * ch..(o0 + rest) * ch].copy_from_slice(&src[s0 * ch..(s0 + rest) * ch]);
        out_mono[o0..o0 + rest].copy_from_slice(&mono[s0..s0 + rest]);

        written = syn + w;
        src_end = pos + w;
        k += 1;
    }

    // Input ran out before the synthesis side reached its target: continue with the remaining
    // input tail so the clip does not end in an abrupt gap.
    if written < target && src_end < n {
        let len = (target - written).min(n - src_end);
        out[written * ch..(written + len) * ch]
            .copy_from_slice(&src[src_end * ch..(src_end + len) * ch]);
    }

    out.truncate(target * ch);
    AudioBuffer {
        sample_rate: buffer.sample_rate,
        channels: buffer.channels,
        samples: out,
    }
}

/// Change pitch and duration together by playing `buffer` back at `rate`.
///
/// `rate > 1` raises pitch and shortens the clip. The sample rate tag is unchanged.
pub fn resample_buffer(buffer: AudioBuffer, rate: f64) -> AudioBuffer {
    if !rate.is_finite() || rate <= 0.0 || rate == 1.0 {
        return buffer;
    }
    if buffer.channels == 0 || buffer.is_empty() {
        return buffer;
    }
    let out_frames = ((buffer.frames() as f64) / rate).round() as usize;
    let samples = interpolate(&buffer, out_frames, rate);
    AudioBuffer {
        sample_rate: buffer.sample_rate,
        channels: buffer.channels,
        samples,
    }
}

/// Convert `buffer` to `sample_rate` preserving pitch and duration.
pub fn resample_to_rate(buffer: AudioBuffer, sample_rate: u32) -> AudioBuffer {
    if sample_rate == 0 || buffer.sample_rate == 0 || buffer.sample_rate == sample_rate {
        return buffer;
    }
    if buffer.channels == 0 || buffer.is_empty() {
        return AudioBuffer {
            sample_rate,
            ..buffer
        };
    }
    let step = f64::from(buffer.sample_rate) / f64::from(sample_rate);
    let out_frames = ((buffer.frames() as f64) / step).round() as usize;
    let samples = interpolate(&buffer, out_frames, step);
    AudioBuffer {
        sample_rate,
        channels: buffer.channels,
        samples,
    }
}

/// Shift pitch by `semitones` while preserving duration.
///
/// Resampling changes pitch and speed together; SOLA then restores the original duration.
pub fn shift_pitch(buffer: AudioBuffer, semitones: f64) -> AudioBuffer {
    if !semitones.is_finite() || semitones == 0.0 {
        return buffer;
    }
    let rate = 2f64.powf(semitones / 12.0);
    stretch_audio(resample_buffer(buffer, rate), 1.0 / rate)
}

fn correlation_stride(sample_rate: u32) -> usize {
    ((sample_rate / 16_000) as usize).max(1)
}

/// Offset in `[0, max_offset)` whose input frame head best matches `tail`.
///
/// Exhaustive; ties resolve to the smallest offset.
fn best_offset(mono: &[f32], nominal: usize, max_offset: usize, tail: &[f32], stride: usize) -> usize {
    let mut best = 0usize;
    let mut best_cost = f32::INFINITY;
    for off in 0..max_offset.max(1) {
        let start = nominal + off;
        let cand = &mono[start..start + tail.len()];
        let mut cost = 0.0f32;
        let mut i = 0;
        while i < tail.len() {
            cost += (cand[i] - tail[i]).abs();
            if cost >= best_cost {
                break;
            }
            i += stride;
        }
        if cost < best_cost {
            best_cost = cost;
            best = off;
        }
    }
    best
}

/// Rising half of a Hann window, `len` weights from ~0 to ~1.
fn hann_fade(len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| {
            let x = (i as f64 + 0.5) / len as f64;
            (0.5 - 0.5 * (std::f64::consts::PI * x).cos()) as f32
        })
        .collect()
}

/// 4-point cubic Hermite resampler reading the source at `j * step`.
fn interpolate(buffer: &AudioBuffer, out_frames: usize, step: f64) -> Vec<f32> {
    let ch = usize::from(buffer.channels);
    let n = buffer.frames();
    let last = n.saturating_sub(1) as isize;
    let at = |i: isize, c: usize| -> f32 { buffer.sample(i.clamp(0, last) as usize, c) };

    let mut out = Vec::with_capacity(out_frames * ch);
    for j in 0..out_frames {
        let pos = j as f64 * step;
        let i1 = pos.floor() as isize;
        let t = (pos - i1 as f64) as f32;
        for c in 0..ch {
            let y0 = at(i1 - 1, c);
            let y1 = at(i1, c);
            let y2 = at(i1 + 1, c);
            let y3 = at(i1 + 2, c);
            out.push(hermite(y0, y1, y2, y3, t));
        }
    }
    out
}

#[inline]
fn hermite(y0: f32, y1: f32, y2: f32, y3: f32, t: f32) -> f32 {
    let c0 = y1;
    let c1 = 0.5 * (y2 - y0);
    let c2 = y0 - 2.5 * y1 + 2.0 * y2 - 0.5 * y3;
    let c3 = 0.5 * (y3 - y0) + 1.5 * (y1 - y2);
    ((c3 * t + c2) * t + c1) * t + c0
}

#[cfg(test)]
#[path = "../../tests/unit/audio/dsp.rs"]
mod tests;

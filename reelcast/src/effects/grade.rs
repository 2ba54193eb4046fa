use crate::foundation::error::{ReelError, ReelResult};
use crate::scene::model::{Bloom, ColorGrade};

/// Row-major 4x5 colour matrix over straight RGBA in `[0, 1]`.
pub type ColorMatrix = [f32; 20];

pub const IDENTITY: ColorMatrix = [
    1.0, 0.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 0.0, 1.0, 0.0,
];

const LUMA: [f32; 3] = [0.2126, 0.7152, 0.0722];

pub fn brightness_matrix(b: f32) -> ColorMatrix {
    let mut m = IDENTITY;
    m[0] = b;
    m[6] = b;
    m[12] = b;
    m
}

pub fn contrast_matrix(c: f32) -> ColorMatrix {
    let o = 0.5 * (1.0 - c);
    let mut m = IDENTITY;
    m[0] = c;
    m[6] = c;
    m[12] = c;
    m[4] = o;
    m[9] = o;
    m[14] = o;
    m
}

pub fn saturation_matrix(s: f32) -> ColorMatrix {
    let [lr, lg, lb] = LUMA;
    let i = 1.0 - s;
    [
        lr * i + s, lg * i, lb * i, 0.0, 0.0, //
        lr * i, lg * i + s, lb * i, 0.0, 0.0, //
        lr * i, lg * i, lb * i + s, 0.0, 0.0, //
        0.0, 0.0, 0.0, 1.0, 0.0,
    ]
}

pub fn sepia_matrix(amount: f32) -> ColorMatrix {
    let a = amount.clamp(0.0, 1.0);
    let full: ColorMatrix = [
        0.393, 0.769, 0.189, 0.0, 0.0, //
        0.349, 0.686, 0.168, 0.0, 0.0, //
        0.272, 0.534, 0.131, 0.0, 0.0, //
        0.0, 0.0, 0.0, 1.0, 0.0,
    ];
    let mut m = IDENTITY;
    for (o, f) in m.iter_mut().zip(full) {
        *o += (f - *o) * a;
    }
    m
}

/// `outer ∘ inner`: apply `inner` first.
pub fn compose(outer: &ColorMatrix, inner: &ColorMatrix) -> ColorMatrix {
    let mut out = [0.0f32; 20];
    for r in 0..4 {
        for c in 0..5 {
            let mut v = 0.0;
            for k in 0..4 {
                v += outer[r * 5 + k] * inner[k * 5 + c];
            }
            if c == 4 {
                v += outer[r * 5 + 4];
            }
            out[r * 5 + c] = v;
        }
    }
    out
}

/// Brightness, then contrast, then saturation, then sepia.
pub fn grade_matrix(grade: &ColorGrade) -> ColorMatrix {
    let f = |v: f64, fallback: f32| -> f32 {
        if v.is_finite() { v as f32 } else { fallback }
    };
    let m = brightness_matrix(f(grade.brightness, 1.0).max(0.0));
    let m = compose(&contrast_matrix(f(grade.contrast, 1.0).max(0.0)), &m);
    let m = compose(&saturation_matrix(f(grade.saturation, 1.0).max(0.0)), &m);
    compose(&sepia_matrix(f(grade.sepia, 0.0)), &m)
}

pub fn color_matrix_in_place(buf: &mut [u8], m: &ColorMatrix) {
    for d in buf.chunks_exact_mut(4) {
        let pa = f32::from(d[3]) / 255.0;
        if pa <= 0.0 {
            continue;
        }
        let inv_a = 1.0 / pa;
        let r = f32::from(d[0]) / 255.0 * inv_a;
        let g = f32::from(d[1]) / 255.0 * inv_a;
        let b = f32::from(d[2]) / 255.0 * inv_a;
        let a = pa;

        let out_r = (m[0] * r + m[1] * g + m[2] * b + m[3] * a + m[4]).clamp(0.0, 1.0);
        let out_g = (m[5] * r + m[6] * g + m[7] * b + m[8] * a + m[9]).clamp(0.0, 1.0);
        let out_b = (m[10] * r + m[11] * g + m[12] * b + m[13] * a + m[14]).clamp(0.0, 1.0);
        let out_a = (m[15] * r + m[16] * g + m[17] * b + m[18] * a + m[19]).clamp(0.0, 1.0);

        d[0] = (out_r * out_a * 255.0).round().clamp(0.0, 255.0) as u8;
        d[1] = (out_g * out_a * 255.0).round().clamp(0.0, 255.0) as u8;
        d[2] = (out_b * out_a * 255.0).round().clamp(0.0, 255.0) as u8;
        d[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    }
}

pub fn gaussian_kernel_q16(radius: u32, sigma: f32) -> ReelResult<Vec<u32>> {
    if radius == 0 {
        return Ok(vec![1 << 16]);
    }
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(ReelError::validation("blur sigma must be finite and > 0"));
    }

    let r = radius as i32;
    let denom = 2.0 * f64::from(sigma) * f64::from(sigma);
    let weights_f: Vec<f64> = (-r..=r)
        .map(|i| (-f64::from(i * i) / denom).exp())
        .collect();
    let sum: f64 = weights_f.iter().sum();
    if sum <= 0.0 {
        return Err(ReelError::evaluation("gaussian kernel sum is zero"));
    }

    let mut weights: Vec<u32> = weights_f
        .iter()
        .map(|wf| ((wf / sum) * 65536.0).round().clamp(0.0, 65536.0) as u32)
        .collect();
    let acc: i64 = weights.iter().map(|&w| i64::from(w)).sum();
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        weights[mid] = (i64::from(weights[mid]) + delta).clamp(0, 65536) as u32;
    }
    Ok(weights)
}

/// Separable gaussian blur; `tmp` must match `src`.
pub fn blur_rgba8_premul_q16(
    src: &[u8],
    dst: &mut [u8],
    tmp: &mut [u8],
    width: u32,
    height: u32,
    kernel_q16: &[u32],
) {
    if kernel_q16.len() == 1 {
        dst.copy_from_slice(src);
        return;
    }
    blur_pass(src, tmp, width, height, kernel_q16, true);
    blur_pass(tmp, dst, width, height, kernel_q16, false);
}

fn blur_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32], horizontal: bool) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    let h = height as i32;
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let d = ki as i32 - radius;
                let (sx, sy) = if horizontal {
                    ((x + d).clamp(0, w - 1), y)
                } else {
                    (x, (y + d).clamp(0, h - 1))
                };
                let idx = ((sy * w + sx) as usize) * 4;
                for c in 0..4 {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out_idx = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                dst[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn q16_to_u8(acc: u64) -> u8 {
    ((acc + 32768) >> 16).min(255) as u8
}

/// Bloom working set, reused across frames.
///
/// The bright pass and blur run at quarter resolution and are added back bilinearly.
#[derive(Debug, Default)]
pub struct BloomPass {
    small: Vec<u8>,
    blurred: Vec<u8>,
    tmp: Vec<u8>,
    kernel: Vec<u32>,
    kernel_radius: Option<u32>,
}

pub const BLOOM_DOWNSCALE: u32 = 4;

impl BloomPass {
    pub fn apply(&mut self, frame: &mut [u8], width: u32, height: u32, bloom: &Bloom) -> ReelResult<()> {
        let intensity = if bloom.intensity.is_finite() {
            bloom.intensity.clamp(0.0, 4.0) as f32
        } else {
            0.0
        };
        if intensity <= 0.0 || width == 0 || height == 0 {
            return Ok(());
        }
        if frame.len() != (width as usize) * (height as usize) * 4 {
            return Err(ReelError::evaluation("bloom frame size mismatch"));
        }
        let threshold = if bloom.threshold.is_finite() {
            bloom.threshold.clamp(0.0, 1.0) as f32
        } else {
            0.7
        };
        let sw = width.div_ceil(BLOOM_DOWNSCALE);
        let sh = height.div_ceil(BLOOM_DOWNSCALE);
        let len = (sw as usize) * (sh as usize) * 4;
        self.small.resize(len, 0);
        self.blurred.resize(len, 0);
        self.tmp.resize(len, 0);

        let radius = (bloom.radius / BLOOM_DOWNSCALE).max(1);
        if self.kernel_radius != Some(radius) {
            self.kernel = gaussian_kernel_q16(radius, radius as f32 / 2.0)?;
            self.kernel_radius = Some(radius);
        }

        bright_pass_downsample(frame, width, height, &mut self.small, sw, sh, threshold);
        blur_rgba8_premul_q16(&self.small, &mut self.blurred, &mut self.tmp, sw, sh, &self.kernel);
        add_upsampled(frame, width, height, &self.blurred, sw, sh, intensity);
        Ok(())
    }
}

fn bright_pass_downsample(
    src: &[u8],
    width: u32,
    height: u32,
    dst: &mut [u8],
    sw: u32,
    sh: u32,
    threshold: f32,
) {
    let f = BLOOM_DOWNSCALE;
    let knee = 0.1f32;
    for sy in 0..sh {
        for sx in 0..sw {
            let mut acc = [0f32; 4];
            let mut n = 0f32;
            for y in (sy * f)..((sy + 1) * f).min(height) {
                for x in (sx * f)..((sx + 1) * f).min(width) {
                    let i = ((y * width + x) as usize) * 4;
                    let p = &src[i..i + 4];
                    let a = f32::from(p[3]);
                    if a <= 0.0 {
                        n += 1.0;
                        continue;
                    }
                    let luma = (LUMA[0] * f32::from(p[0])
                        + LUMA[1] * f32::from(p[1])
                        + LUMA[2] * f32::from(p[2]))
                        / a;
                    let keep = ((luma - threshold) / knee).clamp(0.0, 1.0);
                    for c in 0..4 {
                        acc[c] += f32::from(p[c]) * keep;
                    }
                    n += 1.0;
                }
            }
            let o = ((sy * sw + sx) as usize) * 4;
            for c in 0..4 {
                dst[o + c] = if n > 0.0 {
                    (acc[c] / n).round().clamp(0.0, 255.0) as u8
                } else {
                    0
                };
            }
        }
    }
}

fn add_upsampled(dst: &mut [u8], width: u32, height: u32, small: &[u8], sw: u32, sh: u32, gain: f32) {
    let f = BLOOM_DOWNSCALE as f32;
    for y in 0..height {
        let fy = ((y as f32 + 0.5) / f - 0.5).clamp(0.0, (sh - 1) as f32);
        let y0 = fy.floor() as u32;
        let y1 = (y0 + 1).min(sh - 1);
        let ty = fy - y0 as f32;
        for x in 0..width {
            let fx = ((x as f32 + 0.5) / f - 0.5).clamp(0.0, (sw - 1) as f32);
            let x0 = fx.floor() as u32;
            let x1 = (x0 + 1).min(sw - 1);
            let tx = fx - x0 as f32;
            let at =
                |xx: u32, yy: u32, c: usize| f32::from(small[((yy * sw + xx) as usize) * 4 + c]);
            let o = ((y * width + x) as usize) * 4;
            for c in 0..3 {
                let top = at(x0, y0, c) * (1.0 - tx) + at(x1, y0, c) * tx;
                let bottom = at(x0, y1, c) * (1.0 - tx) + at(x1, y1, c) * tx;
                let v = (top * (1.0 - ty) + bottom * ty) * gain;
                // Colour may not exceed alpha in premultiplied form.
                dst[o + c] = (f32::from(dst[o + c]) + v).round().min(f32::from(dst[o + 3])) as u8;
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/grade.rs"]
mod tests;

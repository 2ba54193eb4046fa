use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::mul_div255_u8;

pub type PremulRgba8 = [u8; 4];

/// How a layer combines with what is already on the frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BlendMode {
    #[default]
    Normal,
    Screen,
    /// Additive (`plus-lighter`).
    Add,
}

pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    let sa = mul_div255(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }

    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = add_sat_u8(sa, mul_div255(u16::from(dst[3]), inv));

    for i in 0..3 {
        let sc = mul_div255(u16::from(src[i]), op);
        let dc = mul_div255(u16::from(dst[i]), inv);
        out[i] = add_sat_u8(sc, dc);
    }
    out
}

/// Premultiplied screen: `s + d - s*d` on every channel.
pub fn screen(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let op = opacity_u16(opacity);
    if op == 0 || src[3] == 0 {
        return dst;
    }
    let mut out = [0u8; 4];
    for i in 0..4 {
        let s = u16::from(mul_div255(u16::from(src[i]), op));
        let d = u16::from(dst[i]);
        let sd = u16::from(mul_div255(s, d));
        out[i] = (s + d - sd).min(255) as u8;
    }
    out
}

/// Saturating premultiplied add.
pub fn add(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let op = opacity_u16(opacity);
    if op == 0 {
        return dst;
    }
    let mut out = [0u8; 4];
    for i in 0..4 {
        out[i] = add_sat_u8(dst[i], mul_div255(u16::from(src[i]), op));
    }
    out
}

/// Composite `src` onto `dst` (equal-size premultiplied RGBA8 buffers).
pub fn blend_in_place(
    dst: &mut [u8],
    src: &[u8],
    opacity: f32,
    mode: BlendMode,
) -> ReelResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(ReelError::evaluation(
            "blend_in_place expects equal-length rgba8 buffers",
        ));
    }
    // Dispatch once per call, not per pixel.
    match mode {
        BlendMode::Normal => blend_with(dst, src, opacity, over),
        BlendMode::Screen => blend_with(dst, src, opacity, screen),
        BlendMode::Add => blend_with(dst, src, opacity, add),
    }
    Ok(())
}

/// [`blend_in_place`] restricted to the pixel box `[x0, y0, x1, y1)` of a `width`-wide buffer.
pub fn blend_region(
    dst: &mut [u8],
    src: &[u8],
    width: u32,
    region: [u32; 4],
    opacity: f32,
    mode: BlendMode,
) -> ReelResult<()> {
    if dst.len() != src.len() || width == 0 {
        return Err(ReelError::evaluation(
            "blend_region expects equal-length rgba8 buffers",
        ));
    }
    let height = (dst.len() / 4 / width as usize) as u32;
    let [x0, y0, x1, y1] = region;
    let (x1, y1) = (x1.min(width), y1.min(height));
    if x0 >= x1 || y0 >= y1 {
        return Ok(());
    }
    for y in y0..y1 {
        let a = (y as usize * width as usize + x0 as usize) * 4;
        let b = (y as usize * width as usize + x1 as usize) * 4;
        blend_in_place(&mut dst[a..b], &src[a..b], opacity, mode)?;
    }
    Ok(())
}

pub fn over_in_place(dst: &mut [u8], src: &[u8], opacity: f32) -> ReelResult<()> {
    blend_in_place(dst, src, opacity, BlendMode::Normal)
}

#[inline(always)]
fn blend_with<F>(dst: &mut [u8], src: &[u8], opacity: f32, f: F)
where
    F: Fn(PremulRgba8, PremulRgba8, f32) -> PremulRgba8,
{
    if opacity <= 0.0 {
        return;
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        if s[3] == 0 && s[0] == 0 && s[1] == 0 && s[2] == 0 {
            continue;
        }
        let out = f([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], opacity);
        d.copy_from_slice(&out);
    }
}

/// Fill a buffer with one premultiplied pixel.
pub fn fill(dst: &mut [u8], px: PremulRgba8) {
    for d in dst.chunks_exact_mut(4) {
        d.copy_from_slice(&px);
    }
}

fn opacity_u16(opacity: f32) -> u16 {
    ((opacity.clamp(0.0, 1.0) * 255.0).round() as i32).clamp(0, 255) as u16
}

fn mul_div255(x: u16, y: u16) -> u8 {
    mul_div255_u8(x, y)
}

fn add_sat_u8(a: u8, b: u8) -> u8 {
    a.saturating_add(b)
}

#[cfg(test)]
#[path = "../../tests/unit/effects/composite.rs"]
mod tests;

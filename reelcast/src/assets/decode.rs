use std::sync::Arc;

use anyhow::Context;

use crate::{assets::store::PreparedImage, foundation::error::ReelResult};

/// Decode encoded image bytes and convert to premultiplied RGBA8.
pub fn decode_image(bytes: &[u8]) -> ReelResult<PreparedImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(PreparedImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

/// Neutral stand-in for an image that failed to load: a dark diagonal gradient.
pub fn placeholder_image(width: u32, height: u32) -> PreparedImage {
    let (w, h) = (width.max(1), height.max(1));
    let span = f64::from(w + h);
    let mut px = Vec::with_capacity(w as usize * h as usize * 4);
    for y in 0..h {
        for x in 0..w {
            let v = 28.0 + 36.0 * f64::from(x + y) / span;
            let v = v.round() as u8;
            px.extend_from_slice(&[v, v, v.saturating_add(8), 255]);
        }
    }
    PreparedImage {
        width: w,
        height: h,
        rgba8_premul: Arc::new(px),
    }
}

pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;

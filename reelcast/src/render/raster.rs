//! Thin layer over `vello_cpu`: one reusable context plus a transparent scratch layer.
//!
//! Callers queue draws between [`Raster::begin`] and [`Raster::finish`], then composite the
//! finished layer onto their own buffers with the blend helpers in `effects::composite`.

use std::sync::Arc;

use crate::assets::store::{PreparedImage, TextBrushRgba8};
use crate::foundation::core::{Affine, Canvas, Rect};
use crate::foundation::error::{ReelError, ReelResult};

/// Image ready to be used as a `vello_cpu` paint.
#[derive(Clone)]
pub(crate) struct ImagePaint {
    paint: vello_cpu::Image,
    pub(crate) width: u32,
    pub(crate) height: u32,
}

impl ImagePaint {
    pub(crate) fn from_prepared(img: &PreparedImage) -> ReelResult<Self> {
        let pixmap = pixmap_from_premul_bytes(&img.rgba8_premul, img.width, img.height)?;
        Ok(Self {
            paint: vello_cpu::Image {
                image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
                sampler: vello_cpu::peniko::ImageSampler::default(),
            },
            width: img.width,
            height: img.height,
        })
    }
}

pub(crate) struct Raster {
    ctx: vello_cpu::RenderContext,
    layer: vello_cpu::Pixmap,
}

impl Raster {
    pub(crate) fn new(canvas: Canvas) -> ReelResult<Self> {
        let width: u16 = canvas
            .width
            .try_into()
            .map_err(|_| ReelError::evaluation("surface width exceeds u16"))?;
        let height: u16 = canvas
            .height
            .try_into()
            .map_err(|_| ReelError::evaluation("surface height exceeds u16"))?;
        Ok(Self {
            ctx: vello_cpu::RenderContext::new(width, height),
            layer: vello_cpu::Pixmap::new(width, height),
        })
    }

    /// Start a new layer.
    pub(crate) fn begin(&mut self) {
        self.ctx.reset();
        self.ctx
            .set_blend_mode(vello_cpu::peniko::BlendMode::default());
        self.ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
    }

    /// Draw `paint` with its pixel rect mapped through `transform`.
    pub(crate) fn image(&mut self, paint: &ImagePaint, transform: Affine, opacity: f32) {
        let opacity = opacity.clamp(0.0, 1.0);
        if opacity <= 0.0 {
            return;
        }
        self.ctx.set_transform(affine_to_cpu(transform));
        self.ctx.set_paint(paint.paint.clone());
        with_opacity(&mut self.ctx, opacity, |ctx| {
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                0.0,
                0.0,
                f64::from(paint.width),
                f64::from(paint.height),
            ));
        });
    }

    /// Solid rectangle in straight RGBA.
    pub(crate) fn rect(&mut self, rect: Rect, transform: Affine, rgba: [u8; 4], opacity: f32) {
        let opacity = opacity.clamp(0.0, 1.0);
        if opacity <= 0.0 || rgba[3] == 0 {
            return;
        }
        self.ctx.set_transform(affine_to_cpu(transform));
        self.ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
            rgba[0], rgba[1], rgba[2], rgba[3],
        ));
        with_opacity(&mut self.ctx, opacity, |ctx| {
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(rect.x0, rect.y0, rect.x1, rect.y1));
        });
    }

    /// Draw a shaped layout whose top-left sits at the origin of `transform`.
    ///
    /// `color` overrides the layout's brush when set.
    pub(crate) fn glyphs(
        &mut self,
        layout: &parley::Layout<TextBrushRgba8>,
        font: &vello_cpu::peniko::FontData,
        transform: Affine,
        color: Option<[u8; 4]>,
        opacity: f32,
    ) {
        let opacity = opacity.clamp(0.0, 1.0);
        if opacity <= 0.0 {
            return;
        }
        self.ctx.set_transform(affine_to_cpu(transform));
        with_opacity(&mut self.ctx, opacity, |ctx| {
            for line in layout.lines() {
                for item in line.items() {
                    let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                        continue;
                    };
                    let [r, g, b, a] = color.unwrap_or_else(|| {
                        let brush = run.style().brush;
                        [brush.r, brush.g, brush.b, brush.a]
                    });
                    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
                    let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                        id: g.id,
                        x: g.x,
                        y: g.y,
                    });
                    ctx.glyph_run(font)
                        .font_size(run.run().font_size())
                        .fill_glyphs(glyphs);
                }
            }
        });
    }

    /// Rasterize the queued draws and return the layer's premultiplied bytes.
    pub(crate) fn finish(&mut self) -> &[u8] {
        self.layer.data_as_u8_slice_mut().fill(0);
        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut self.layer);
        self.layer.data_as_u8_slice()
    }
}

fn with_opacity(ctx: &mut vello_cpu::RenderContext, opacity: f32, f: impl FnOnce(&mut vello_cpu::RenderContext)) {
    if opacity < 1.0 {
        ctx.push_opacity_layer(opacity);
    }
    f(ctx);
    if opacity < 1.0 {
        ctx.pop_layer();
    }
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

/// Integer pixel box covering `rect`, clamped to `width x height`.
pub(crate) fn pixel_box(rect: Rect, width: u32, height: u32) -> [u32; 4] {
    let clamp = |v: f64, max: u32| -> u32 {
        if v.is_nan() {
            0
        } else {
            v.clamp(0.0, f64::from(max)) as u32
        }
    };
    [
        clamp(rect.x0.floor(), width),
        clamp(rect.y0.floor(), height),
        clamp(rect.x1.ceil(), width),
        clamp(rect.y1.ceil(), height),
    ]
}

fn pixmap_from_premul_bytes(bytes: &[u8], width: u32, height: u32) -> ReelResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| ReelError::evaluation("pixmap width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| ReelError::evaluation("pixmap height exceeds u16"))?;
    if bytes.len() != (width as usize).saturating_mul(height as usize).saturating_mul(4) {
        return Err(ReelError::evaluation("pixmap byte len mismatch"));
    }
    let pixels = bytes
        .chunks_exact(4)
        .map(|px| vello_cpu::peniko::color::PremulRgba8::from_u8_array([px[0], px[1], px[2], px[3]]))
        .collect();
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, true))
}

#[cfg(test)]
#[path = "../../tests/unit/render/raster.rs"]
mod tests;

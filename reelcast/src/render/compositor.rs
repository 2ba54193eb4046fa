//! Per-frame draw routine.
//!
//! Z-order: background, phase media or scene entries, grade, bloom, captions, VFX, overlay,
//! AI badge, watermark, QR.

use std::collections::HashMap;
use std::sync::Arc;

use crate::animation::ease::window_progress;
use crate::assets::store::{MediaSource, PreparedAssets, PreparedImage, TextBrushRgba8, TextLayoutEngine};
use crate::caption::animation::{CaptionOp, CaptionWindow, dynamic_word_op, static_caption_op};
use crate::caption::chunk::WordClock;
use crate::effects::composite::{BlendMode, blend_region, fill, over_in_place};
use crate::effects::grade::{BloomPass, ColorMatrix, color_matrix_in_place, grade_matrix};
use crate::effects::transitions::{
    ImageDraw, PostFx, TransitionInput, apply_glitch, apply_luma_dissolve, transition_op,
};
use crate::effects::vfx::VfxLayer;
use crate::foundation::core::{Affine, Canvas, Rect, Vec2, cover_rect};
use crate::foundation::error::ReelResult;
use crate::render::backend::FrameRGBA;
use crate::render::raster::{ImagePaint, Raster, pixel_box};
use crate::scene::color::Color;
use crate::scene::model::{CaptionMode, Position, Project, VfxConfig};
use crate::timeline::builder::{Phase, Timeline, TimelineEntry};
use crate::timeline::caption_layout::TextBlock;

/// Fade length at both ends of intro/outro media.
const MEDIA_FADE_SECS: f64 = 0.5;
/// Subtitle block centre as a fraction of frame height.
const SUBTITLE_CENTER_Y: f64 = 0.14;
/// Static caption travel as a fraction of frame height.
const CAPTION_TRAVEL: f64 = 0.04;
const MARGIN_FRAC: f64 = 0.03;
const TEXT_CACHE_LIMIT: usize = 512;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct TextKey {
    text: String,
    size_bits: u32,
}

/// Last paint built for a media slot, reused while the pixels are the same `Arc`.
#[derive(Default)]
struct PaintSlot(Option<(Arc<Vec<u8>>, ImagePaint)>);

impl PaintSlot {
    fn get(&mut self, img: &PreparedImage) -> ReelResult<ImagePaint> {
        if let Some((px, paint)) = &self.0
            && Arc::ptr_eq(px, &img.rgba8_premul)
        {
            return Ok(paint.clone());
        }
        let paint = ImagePaint::from_prepared(img)?;
        self.0 = Some((Arc::clone(&img.rgba8_premul), paint.clone()));
        Ok(paint)
    }
}

/// Owns every per-frame buffer and cache; `render` performs no asset IO except video decode.
pub(crate) struct Compositor {
    project: Arc<Project>,
    canvas: Canvas,
    raster: Raster,
    /// Lent to callers by `render`; overwritten by the next frame.
    frame: FrameRGBA,
    entry_layer: Vec<u8>,
    scratch: Vec<u8>,
    background: [u8; 4],
    scene_paints: Vec<PaintSlot>,
    intro_paint: PaintSlot,
    outro_paint: PaintSlot,
    overlay_paint: PaintSlot,
    watermark: Option<ImagePaint>,
    qr: Option<ImagePaint>,
    text_layouts: HashMap<TextKey, Arc<parley::Layout<TextBrushRgba8>>>,
    vfx_cfg: VfxConfig,
    vfx: VfxLayer,
    grade: Option<ColorMatrix>,
    bloom: BloomPass,
}

impl Compositor {
    pub(crate) fn new(project: Arc<Project>, assets: &PreparedAssets) -> ReelResult<Self> {
        let canvas = project.canvas;
        canvas.validate()?;
        let len = canvas.width as usize * canvas.height as usize * 4;
        let p = project.background_color.to_rgba8_premul();
        let watermark = assets
            .watermark
            .as_ref()
            .map(ImagePaint::from_prepared)
            .transpose()?;
        let qr = assets.qr.as_ref().map(ImagePaint::from_prepared).transpose()?;
        let grade = project
            .grade
            .filter(|g| !g.is_identity())
            .map(|g| grade_matrix(&g));
        Ok(Self {
            canvas,
            raster: Raster::new(canvas)?,
            frame: FrameRGBA {
                width: canvas.width,
                height: canvas.height,
                data: vec![0; len],
                premultiplied: true,
            },
            entry_layer: vec![0; len],
            scratch: Vec::new(),
            background: [p.r, p.g, p.b, p.a],
            scene_paints: (0..project.scenes.len()).map(|_| PaintSlot::default()).collect(),
            intro_paint: PaintSlot::default(),
            outro_paint: PaintSlot::default(),
            overlay_paint: PaintSlot::default(),
            watermark,
            qr,
            text_layouts: HashMap::new(),
            vfx_cfg: project.vfx,
            vfx: VfxLayer::new(),
            grade,
            bloom: BloomPass::default(),
            project,
        })
    }

    /// Halve grain and dust for interactive preview.
    pub(crate) fn set_vfx_throttled(&mut self, throttled: bool) {
        self.vfx_cfg.throttled = throttled;
    }

    /// Draw the programme at session time `t`.
    pub(crate) fn render(
        &mut self,
        timeline: &Timeline,
        assets: &mut PreparedAssets,
        t: f64,
    ) -> ReelResult<&FrameRGBA> {
        fill(&mut self.frame.data, self.background);
        let phase = timeline.phase_at(t);

        match phase {
            Phase::Intro { local } => {
                let len = timeline.intro_duration;
                self.draw_phase_media(assets.intro.as_mut(), PhaseSlot::Intro, local, len)?;
            }
            Phase::Scene { local } => {
                for i in timeline.active_entries(local) {
                    self.draw_entry(&timeline.entries[i], assets, local)?;
                }
            }
            Phase::Outro { local } => {
                let len = timeline.outro_duration;
                self.draw_phase_media(assets.outro.as_mut(), PhaseSlot::Outro, local, len)?;
            }
        }

        if let Some(m) = &self.grade {
            color_matrix_in_place(&mut self.frame.data, m);
        }
        if let Some(b) = self.project.bloom {
            self.bloom
                .apply(&mut self.frame.data, self.canvas.width, self.canvas.height, &b)?;
        }

        if let Phase::Scene { local } = phase {
            for i in timeline.active_entries(local) {
                self.draw_captions(timeline, i, &mut assets.text, local)?;
            }
        }

        self.vfx.apply(
            &mut self.frame.data,
            self.canvas.width,
            self.canvas.height,
            &self.vfx_cfg,
            t,
        );
        self.draw_overlay(assets, t)?;
        self.draw_badge(&mut assets.text)?;
        self.draw_watermark()?;
        self.draw_qr(&mut assets.text)?;

        Ok(&self.frame)
    }

    /// The frame drawn by the last `render` call.
    pub(crate) fn frame(&self) -> &FrameRGBA {
        &self.frame
    }

    fn full_box(&self) -> [u32; 4] {
        [0, 0, self.canvas.width, self.canvas.height]
    }

    /// Map an image's pixel rect onto its cover-fit placement.
    fn cover_transform(&self, w: u32, h: u32) -> Affine {
        let base = cover_rect(f64::from(w), f64::from(h), self.canvas.rect());
        Affine::translate(Vec2::new(base.x0, base.y0))
            * Affine::scale_non_uniform(base.width() / f64::from(w), base.height() / f64::from(h))
    }

    fn draw_entry(&mut self, entry: &TimelineEntry, assets: &PreparedAssets, local: f64) -> ReelResult<()> {
        let Some(img) = assets.scene_images.get(entry.scene_index) else {
            return Ok(());
        };
        let Some(slot) = self.scene_paints.get_mut(entry.scene_index) else {
            return Ok(());
        };
        let paint = slot.get(img)?;
        let place = self.cover_transform(paint.width, paint.height);
        let input = TransitionInput {
            frame: self.canvas.rect(),
            base: cover_rect(f64::from(paint.width), f64::from(paint.height), self.canvas.rect()),
            local: entry.local(local),
            duration: entry.visual_len(),
            seed: entry.scene_index as u64,
        };
        let op = transition_op(entry.transition, &input);

        if let ([draw], None) = (op.draws.as_slice(), op.post)
            && draw.blend == BlendMode::Normal
            && draw.clip.is_none()
        {
            self.raster.begin();
            self.raster.image(&paint, draw.transform * place, 1.0);
            let layer = self.raster.finish();
            return over_in_place(&mut self.frame.data, layer, draw.opacity as f32);
        }

        self.entry_layer.fill(0);
        for draw in &op.draws {
            self.image_into_entry_layer(&paint, place, draw)?;
        }
        let (w, h) = (self.canvas.width, self.canvas.height);
        match op.post {
            Some(PostFx::LumaDissolve { progress, cell, seed }) => {
                apply_luma_dissolve(&mut self.entry_layer, w, h, progress, cell, seed);
            }
            Some(PostFx::Glitch {
                strength,
                split_px,
                seed,
            }) => {
                apply_glitch(&mut self.entry_layer, &mut self.scratch, w, h, strength, split_px, seed);
            }
            None => {}
        }
        over_in_place(&mut self.frame.data, &self.entry_layer, 1.0)
    }

    fn image_into_entry_layer(&mut self, paint: &ImagePaint, place: Affine, draw: &ImageDraw) -> ReelResult<()> {
        let region = draw
            .clip
            .map_or_else(|| self.full_box(), |c| pixel_box(c, self.canvas.width, self.canvas.height));
        self.raster.begin();
        self.raster.image(paint, draw.transform * place, 1.0);
        let layer = self.raster.finish();
        blend_region(
            &mut self.entry_layer,
            layer,
            self.canvas.width,
            region,
            draw.opacity as f32,
            draw.blend,
        )
    }

    fn draw_phase_media(
        &mut self,
        source: Option<&mut MediaSource>,
        slot: PhaseSlot,
        local: f64,
        len: f64,
    ) -> ReelResult<()> {
        let Some(img) = source.and_then(|s| s.frame_at(local)) else {
            return Ok(());
        };
        let fade_in = window_progress(local, 0.0, MEDIA_FADE_SECS);
        let fade_out = 1.0 - window_progress(local, len - MEDIA_FADE_SECS, MEDIA_FADE_SECS);
        let opacity = fade_in.min(fade_out);
        let paint = match slot {
            PhaseSlot::Intro => self.intro_paint.get(&img)?,
            PhaseSlot::Outro => self.outro_paint.get(&img)?,
        };
        let place = self.cover_transform(paint.width, paint.height);
        self.raster.begin();
        self.raster.image(&paint, place, 1.0);
        let layer = self.raster.finish();
        over_in_place(&mut self.frame.data, layer, opacity as f32)
    }

    fn draw_overlay(&mut self, assets: &mut PreparedAssets, t: f64) -> ReelResult<()> {
        let Some(cfg) = self.project.overlay.as_ref() else {
            return Ok(());
        };
        let opacity = cfg.opacity.clamp(0.0, 1.0) as f32;
        let Some(img) = assets.overlay.as_mut().and_then(|s| s.frame_at(t)) else {
            return Ok(());
        };
        let paint = self.overlay_paint.get(&img)?;
        let place = self.cover_transform(paint.width, paint.height);
        self.raster.begin();
        self.raster.image(&paint, place, 1.0);
        let layer = self.raster.finish();
        blend_region(
            &mut self.frame.data,
            layer,
            self.canvas.width,
            [0, 0, self.canvas.width, self.canvas.height],
            opacity,
            BlendMode::Screen,
        )
    }

    fn text_layout(
        &mut self,
        engine: &mut TextLayoutEngine,
        text: &str,
        size: f64,
    ) -> Option<Arc<parley::Layout<TextBrushRgba8>>> {
        let key = TextKey {
            text: text.to_owned(),
            size_bits: (size as f32).to_bits(),
        };
        if let Some(l) = self.text_layouts.get(&key) {
            return Some(Arc::clone(l));
        }
        let layout = match engine.layout_plain(text, size as f32, TextBrushRgba8::default()) {
            Ok(l) => Arc::new(l),
            Err(e) => {
                tracing::debug!(error = %e, "caption layout failed");
                return None;
            }
        };
        if self.text_layouts.len() >= TEXT_CACHE_LIMIT {
            self.text_layouts.clear();
        }
        self.text_layouts.insert(key, Arc::clone(&layout));
        Some(layout)
    }

    fn draw_captions(
        &mut self,
        timeline: &Timeline,
        index: usize,
        engine: &mut TextLayoutEngine,
        local: f64,
    ) -> ReelResult<()> {
        let Some(font) = engine.font().cloned() else {
            return Ok(());
        };
        let entry = &timeline.entries[index];
        let window = CaptionWindow {
            visual_start: entry.visual_start,
            visual_end: entry.visual_end,
            next_overlap: timeline.entries.get(index + 1).map_or(0.0, |n| n.overlap),
        };
        let project = Arc::clone(&self.project);
        let cfg = &project.settings.captions;
        let h = f64::from(self.canvas.height);
        let narration_y = cfg.layout.vertical_position.clamp(0.0, 1.0) * h;

        if cfg.mode == CaptionMode::Dynamic {
            if local < entry.visual_start || local >= window.exit_end() {
                return Ok(());
            }
            return self.draw_dynamic_chunk(entry, engine, &font, local, narration_y);
        }

        let distance = CAPTION_TRAVEL * h;
        let blocks = [
            (&entry.caption.subtitle, SUBTITLE_CENTER_Y * h, cfg.subtitle_entrance, cfg.subtitle_exit),
            (&entry.caption.narration, narration_y, cfg.narration_entrance, cfg.narration_exit),
        ];
        for (block, cy, entrance, exit) in blocks {
            if block.is_empty() {
                continue;
            }
            let Some(op) = static_caption_op(entrance, exit, window, local, distance) else {
                continue;
            };
            self.draw_text_block(block, cy, op, &cfg.color, cfg.background_color, engine, &font)?;
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_text_block(
        &mut self,
        block: &TextBlock,
        cy: f64,
        op: CaptionOp,
        color: &Color,
        background: Option<Color>,
        engine: &mut TextLayoutEngine,
        font: &vello_cpu::peniko::FontData,
    ) -> ReelResult<()> {
        let cx = f64::from(self.canvas.width) / 2.0;
        let top = cy - block.height / 2.0;
        let center = Vec2::new(cx, cy);
        let block_tr = Affine::translate(op.offset)
            * Affine::translate(center)
            * Affine::scale(op.scale.max(0.0))
            * Affine::translate(-center);

        let mut lines = Vec::with_capacity(block.lines.len());
        for line in &block.lines {
            if let Some(layout) = self.text_layout(engine, &line.text, block.font_size) {
                lines.push((layout, line.width));
            }
        }

        self.raster.begin();
        if let Some(bg) = background {
            let pad = block.font_size * 0.3;
            let r = Rect::new(
                cx - block.width / 2.0 - pad,
                top - pad,
                cx + block.width / 2.0 + pad,
                top + block.height + pad,
            );
            self.raster.rect(r, block_tr, bg.to_straight_rgba8(), 1.0);
        }
        let rgba = color.to_straight_rgba8();
        for (i, (layout, width)) in lines.iter().enumerate() {
            let pos = Vec2::new(cx - width / 2.0, top + i as f64 * block.line_height);
            self.raster
                .glyphs(layout, font, block_tr * Affine::translate(pos), Some(rgba), 1.0);
        }
        let layer = self.raster.finish();
        over_in_place(&mut self.frame.data, layer, op.alpha as f32)
    }

    fn draw_dynamic_chunk(
        &mut self,
        entry: &TimelineEntry,
        engine: &mut TextLayoutEngine,
        font: &vello_cpu::peniko::FontData,
        local: f64,
        cy: f64,
    ) -> ReelResult<()> {
        let project = Arc::clone(&self.project);
        let cfg = &project.settings.captions;
        let words_per_chunk = cfg.layout.words_per_line.max(1) as usize;
        let words = &entry.caption.words;
        let clock = WordClock::at(local - entry.visual_start, entry.duration, words.len(), words_per_chunk);
        let Some(chunk) = entry.caption.chunks.get(clock.chunk) else {
            return Ok(());
        };
        let base = cfg.color.to_straight_rgba8();
        let highlight = cfg.highlight_color.to_straight_rgba8();
        let cx = f64::from(self.canvas.width) / 2.0;
        let size = chunk.font_size;
        let first = clock.chunk * words_per_chunk;

        // Clipped words each need their own layer; everything else shares one.
        let mut clipped: Vec<(Arc<parley::Layout<TextBrushRgba8>>, Affine, [u8; 4], f32, Rect)> = Vec::new();
        self.raster.begin();
        if let Some(bg) = cfg.background_color {
            let pad = size * 0.3;
            let r = Rect::new(
                cx - chunk.width / 2.0 - pad,
                cy - chunk.height / 2.0 - pad,
                cx + chunk.width / 2.0 + pad,
                cy + chunk.height / 2.0 + pad,
            );
            self.raster.rect(r, Affine::IDENTITY, bg.to_straight_rgba8(), 1.0);
        }
        for (j, word) in chunk.words.iter().enumerate() {
            let op = dynamic_word_op(
                cfg.animation,
                clock.state_of(first + j),
                word.text.chars().count(),
                clock.word_progress,
                local,
            );
            if !op.visible {
                continue;
            }
            let text: String = match op.chars {
                Some(n) => word.text.chars().take(n).collect(),
                None => word.text.clone(),
            };
            let Some(layout) = self.text_layout(engine, &text, size) else {
                continue;
            };
            let rest = Rect::new(
                cx + word.x,
                cy + word.y,
                cx + word.x + word.width,
                cy + word.y + chunk.line_height,
            );
            let pivot = Vec2::new(word.width / 2.0, chunk.line_height / 2.0);
            let tr = Affine::translate(rest.center().to_vec2() + op.offset * size)
                * Affine::rotate(op.rotation)
                * Affine::scale(op.scale.max(0.0))
                * Affine::translate(-pivot);
            let color = if op.highlight { highlight } else { base };
            let alpha = op.alpha as f32;

            if op.masked {
                clipped.push((layout, tr, color, alpha, rest));
                continue;
            }
            self.raster.glyphs(&layout, font, tr, Some(color), alpha);
            if let Some(f) = op.fill.filter(|f| *f > 0.0) {
                let sweep = Rect::new(rest.x0, rest.y0 - size, rest.x0 + rest.width() * f, rest.y1 + size);
                clipped.push((layout, tr, highlight, alpha, sweep));
            }
        }
        let layer = self.raster.finish();
        over_in_place(&mut self.frame.data, layer, 1.0)?;

        for (layout, tr, color, alpha, clip) in clipped {
            self.raster.begin();
            self.raster.glyphs(&layout, font, tr, Some(color), 1.0);
            let layer = self.raster.finish();
            let region = pixel_box(clip, self.canvas.width, self.canvas.height);
            blend_region(&mut self.frame.data, layer, self.canvas.width, region, alpha, BlendMode::Normal)?;
        }
        Ok(())
    }

    /// Top-left corner of a `w x h` box at `position`.
    fn anchor(&self, position: Position, x: f64, y: f64, w: f64, h: f64) -> Vec2 {
        let (cw, ch) = (f64::from(self.canvas.width), f64::from(self.canvas.height));
        let m = MARGIN_FRAC * cw.min(ch);
        match position {
            Position::TopLeft => Vec2::new(m, m),
            Position::TopRight => Vec2::new(cw - m - w, m),
            Position::BottomRight => Vec2::new(cw - m - w, ch - m - h),
            Position::BottomLeft => Vec2::new(m, ch - m - h),
            Position::Center => Vec2::new((cw - w) / 2.0, (ch - h) / 2.0),
            Position::Custom => Vec2::new(x * cw, y * ch),
        }
    }

    fn draw_badge(&mut self, engine: &mut TextLayoutEngine) -> ReelResult<()> {
        let Some(badge) = self.project.ai_badge.clone() else {
            return Ok(());
        };
        let Some(font) = engine.font().cloned() else {
            return Ok(());
        };
        let size = (f64::from(self.canvas.height) * 0.022).max(12.0);
        let Some(layout) = self.text_layout(engine, &badge.text, size) else {
            return Ok(());
        };
        let pad = size * 0.45;
        let (w, h) = (f64::from(layout.width()) + 2.0 * pad, size * 1.25 + 2.0 * pad);
        let at = self.anchor(badge.position, 0.0, 0.0, w, h);

        self.raster.begin();
        self.raster.rect(
            Rect::new(at.x, at.y, at.x + w, at.y + h),
            Affine::IDENTITY,
            [0, 0, 0, 150],
            1.0,
        );
        self.raster.glyphs(
            &layout,
            &font,
            Affine::translate(at + Vec2::new(pad, pad)),
            Some([255, 255, 255, 255]),
            1.0,
        );
        let layer = self.raster.finish();
        over_in_place(&mut self.frame.data, layer, badge.opacity.clamp(0.0, 1.0) as f32)
    }

    fn draw_watermark(&mut self) -> ReelResult<()> {
        let (Some(cfg), Some(paint)) = (self.project.watermark.as_ref(), self.watermark.as_ref()) else {
            return Ok(());
        };
        let w = f64::from(self.canvas.width) * cfg.scale.clamp(0.01, 1.0);
        let h = w * f64::from(paint.height) / f64::from(paint.width.max(1));
        let at = self.anchor(cfg.position, cfg.x, cfg.y, w, h);
        let tr = Affine::translate(at) * Affine::scale(w / f64::from(paint.width.max(1)));
        let opacity = cfg.opacity.clamp(0.0, 1.0) as f32;

        self.raster.begin();
        self.raster.image(paint, tr, 1.0);
        let layer = self.raster.finish();
        over_in_place(&mut self.frame.data, layer, opacity)
    }

    fn draw_qr(&mut self, engine: &mut TextLayoutEngine) -> ReelResult<()> {
        let (Some(cfg), Some(paint)) = (self.project.qr.clone(), self.qr.clone()) else {
            return Ok(());
        };
        let side = cfg
            .size
            .min(f64::from(self.canvas.width.min(self.canvas.height)))
            .max(1.0);
        let strip = if cfg.label.is_empty() { 0.0 } else { side * 0.22 };
        let at = self.anchor(cfg.position, cfg.x, cfg.y, side, side + strip);
        let font = engine.font().cloned();
        let label = if strip > 0.0 {
            self.text_layout(engine, &cfg.label, strip * 0.55)
        } else {
            None
        };

        self.raster.begin();
        let scale = Affine::scale_non_uniform(
            side / f64::from(paint.width.max(1)),
            side / f64::from(paint.height.max(1)),
        );
        self.raster.image(&paint, Affine::translate(at) * scale, 1.0);
        if strip > 0.0 {
            let band = Rect::new(at.x, at.y + side, at.x + side, at.y + side + strip);
            self.raster.rect(band, Affine::IDENTITY, [255, 255, 255, 255], 1.0);
            if let (Some(layout), Some(font)) = (label, font) {
                let lw = f64::from(layout.width());
                let pos = Vec2::new(
                    band.center().x - lw / 2.0,
                    band.y0 + (strip - strip * 0.55 * 1.25) / 2.0,
                );
                self.raster
                    .glyphs(&layout, &font, Affine::translate(pos), Some([0, 0, 0, 255]), 1.0);
            }
        }
        let layer = self.raster.finish();
        over_in_place(&mut self.frame.data, layer, 1.0)
    }
}

#[derive(Clone, Copy)]
enum PhaseSlot {
    Intro,
    Outro,
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use rayon::prelude::*;
use serde::Serialize;

use crate::assets::decode::{decode_image, placeholder_image};
use crate::assets::media;
use crate::assets::video::VideoFrameCache;
use crate::foundation::error::{ReelError, ReelResult};
use crate::scene::model::{MediaKind, Project};
use crate::timeline::caption_layout::{ApproxMeasure, TextMeasure};

#[derive(Clone, Debug)]
/// Prepared raster image in premultiplied RGBA8 form.
pub struct PreparedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes in row-major premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
}

/// What kind of asset an [`AssetIssue`] concerns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Image,
    Video,
    Audio,
    Font,
}

/// A recovered asset failure. The engine substituted a placeholder, silence, or nothing.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AssetIssue {
    pub kind: AssetKind,
    pub url: String,
    pub message: String,
}

impl AssetIssue {
    pub(crate) fn record(kind: AssetKind, url: &str, err: &ReelError) -> Self {
        tracing::warn!(?kind, url, error = %err, "asset failed to load; using fallback");
        Self {
            kind,
            url: url.to_owned(),
            message: err.to_string(),
        }
    }
}

/// Maps project asset URLs onto the local filesystem.
#[derive(Clone, Debug)]
pub struct AssetResolver {
    root: PathBuf,
}

impl AssetResolver {
    /// Resolve relative URLs against `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Local path for `url`.
    ///
    /// Remote URLs are rejected; fetching them is up to the caller.
    pub fn resolve(&self, url: &str) -> ReelResult<PathBuf> {
        let url = url.trim();
        let lower = url.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            return Err(ReelError::asset_load(format!(
                "remote asset '{url}' must be fetched before rendering"
            )));
        }
        if let Some(path) = url.strip_prefix("file://") {
            return Ok(PathBuf::from(path));
        }
        if Path::new(url).is_absolute() {
            return Ok(PathBuf::from(url));
        }
        let rel = normalize_rel_path(url).map_err(|e| ReelError::asset_load(e.to_string()))?;
        Ok(self.root.join(Path::new(&rel)))
    }

    pub fn read_bytes(&self, url: &str) -> ReelResult<Vec<u8>> {
        let path = self.resolve(url)?;
        std::fs::read(&path)
            .with_context(|| format!("read asset bytes from '{}'", path.display()))
            .map_err(|e| ReelError::asset_load(format!("{e:#}")))
    }

    pub fn load_image(&self, url: &str) -> ReelResult<PreparedImage> {
        let bytes = self.read_bytes(url)?;
        decode_image(&bytes).map_err(|e| ReelError::asset_load(format!("'{url}': {e}")))
    }
}

/// Normalize and validate project-relative asset paths.
///
/// The normalized result uses `/` separators, removes `.` segments, and rejects absolute paths or
/// parent traversals (`..`).
pub(crate) fn normalize_rel_path(source: &str) -> ReelResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(ReelError::validation("asset paths must be relative"));
    }
    if s.is_empty() {
        return Err(ReelError::validation("asset path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(ReelError::validation("asset paths must not contain '..'"));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(ReelError::validation("asset path must contain a file name"));
    }

    Ok(out.join("/"))
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// RGBA8 brush color used by Parley text layout.
pub(crate) struct TextBrushRgba8 {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

impl From<[u8; 4]> for TextBrushRgba8 {
    fn from([r, g, b, a]: [u8; 4]) -> Self {
        Self { r, g, b, a }
    }
}

/// Parley layout engine bound to the single caption font.
pub(crate) struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    family_name: Option<String>,
    font: Option<vello_cpu::peniko::FontData>,
    fallback: ApproxMeasure,
}

impl Default for TextLayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextLayoutEngine {
    pub(crate) fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            family_name: None,
            font: None,
            fallback: ApproxMeasure::default(),
        }
    }

    /// Register `font_bytes` as the caption font.
    pub(crate) fn load_font(&mut self, font_bytes: Vec<u8>) -> ReelResult<()> {
        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.clone()), None);
        let family_id = families
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| ReelError::asset_load("no font families registered from font bytes"))?;

        let family_name = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| ReelError::asset_load("registered font family has no name"))?
            .to_string();

        self.family_name = Some(family_name);
        self.font = Some(vello_cpu::peniko::FontData::new(
            vello_cpu::peniko::Blob::from(font_bytes),
            0,
        ));
        Ok(())
    }

    pub(crate) fn font(&self) -> Option<&vello_cpu::peniko::FontData> {
        self.font.as_ref()
    }

    /// Shape and lay out a single line of plain text.
    pub(crate) fn layout_plain(
        &mut self,
        text: &str,
        size_px: f32,
        brush: TextBrushRgba8,
    ) -> ReelResult<parley::Layout<TextBrushRgba8>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(ReelError::validation("text size_px must be finite and > 0"));
        }
        let family_name = self
            .family_name
            .clone()
            .ok_or_else(|| ReelError::evaluation("no caption font loaded"))?;

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family_name)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);
        layout.align(
            None,
            parley::Alignment::Start,
            parley::AlignmentOptions::default(),
        );
        Ok(layout)
    }
}

impl TextMeasure for TextLayoutEngine {
    fn advance(&mut self, text: &str, size: f64) -> f64 {
        if self.family_name.is_none() {
            return self.fallback.advance(text, size);
        }
        match self.layout_plain(text, size as f32, TextBrushRgba8::default()) {
            Ok(layout) => f64::from(layout.width()),
            Err(_) => self.fallback.advance(text, size),
        }
    }
}

/// Intro, outro or overlay media after loading.
pub(crate) enum MediaSource {
    Image(PreparedImage),
    Video(VideoFrameCache),
}

impl MediaSource {
    /// Frame to draw at media-local time `t`.
    pub(crate) fn frame_at(&mut self, t: f64) -> Option<PreparedImage> {
        match self {
            Self::Image(img) => Some(img.clone()),
            Self::Video(cache) => match cache.frame_at(t) {
                Ok(img) => Some(img),
                Err(e) => {
                    tracing::debug!(error = %e, "video frame unavailable");
                    None
                }
            },
        }
    }
}

/// Every bitmap, video source and font a render session needs, loaded up front.
///
/// Loading never fails: each broken asset is replaced by its fallback and reported in `issues`.
pub(crate) struct PreparedAssets {
    pub(crate) scene_images: Vec<PreparedImage>,
    pub(crate) intro: Option<MediaSource>,
    pub(crate) outro: Option<MediaSource>,
    pub(crate) overlay: Option<MediaSource>,
    pub(crate) watermark: Option<PreparedImage>,
    pub(crate) qr: Option<PreparedImage>,
    pub(crate) text: TextLayoutEngine,
    pub(crate) issues: Vec<AssetIssue>,
}

impl PreparedAssets {
    #[tracing::instrument(level = "debug", skip_all, fields(scenes = project.scenes.len()))]
    pub(crate) fn prepare(project: &Project, resolver: &AssetResolver) -> Self {
        let canvas = project.canvas;
        let loaded: Vec<(PreparedImage, Option<AssetIssue>)> = project
            .scenes
            .par_iter()
            .map(|scene| match resolver.load_image(&scene.image_url) {
                Ok(img) => (img, None),
                Err(e) => (
                    placeholder_image(canvas.width, canvas.height),
                    Some(AssetIssue::record(AssetKind::Image, &scene.image_url, &e)),
                ),
            })
            .collect();

        let mut issues = Vec::new();
        let mut scene_images = Vec::with_capacity(loaded.len());
        for (img, issue) in loaded {
            scene_images.push(img);
            issues.extend(issue);
        }

        let mut media = |url: &str, kind: MediaKind| -> Option<MediaSource> {
            let loaded = match kind {
                MediaKind::Image => resolver.load_image(url).map(MediaSource::Image),
                MediaKind::Video => resolver
                    .resolve(url)
                    .and_then(|p| media::probe_video(&p))
                    .map(|info| MediaSource::Video(VideoFrameCache::new(Arc::new(info)))),
            };
            loaded
                .map_err(|e| {
                    let asset = match kind {
                        MediaKind::Image => AssetKind::Image,
                        MediaKind::Video => AssetKind::Video,
                    };
                    issues.push(AssetIssue::record(asset, url, &e));
                })
                .ok()
        };
        let intro = project.intro.as_ref().and_then(|m| media(&m.url, m.kind));
        let outro = project.outro.as_ref().and_then(|m| media(&m.url, m.kind));
        let overlay = project.overlay.as_ref().and_then(|o| media(&o.url, o.kind));
        let watermark = project
            .watermark
            .as_ref()
            .and_then(|w| match media(&w.url, MediaKind::Image)? {
                MediaSource::Image(img) => Some(img),
                MediaSource::Video(_) => None,
            });
        let qr = project
            .qr
            .as_ref()
            .and_then(|q| match media(&q.url, MediaKind::Image)? {
                MediaSource::Image(img) => Some(img),
                MediaSource::Video(_) => None,
            });

        let mut text = TextLayoutEngine::new();
        if let Some(font_url) = project.settings.captions.font.as_deref() {
            if let Err(e) = resolver
                .read_bytes(font_url)
                .and_then(|bytes| text.load_font(bytes))
            {
                issues.push(AssetIssue::record(AssetKind::Font, font_url, &e));
            }
        } else {
            tracing::debug!("no caption font configured; captions are laid out but not drawn");
        }

        Self {
            scene_images,
            intro,
            outro,
            overlay,
            watermark,
            qr,
            text,
            issues,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/store.rs"]
mod tests;

use serde::{Deserialize, Serialize};

use crate::foundation::core::{Canvas, Fps};
use crate::scene::color::Color;

/// Visual transition applied to a scene's image layer.
///
/// `slide` and `zoom` are accepted on input as legacy names for `slide_left` and `scale_up`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    #[serde(alias = "cut")]
    None,
    #[default]
    Fade,
    #[serde(alias = "zoom")]
    ScaleUp,
    PopIn,
    Blink,
    #[serde(alias = "slide")]
    SlideLeft,
    SlideRight,
    SlideUp,
    SlideDown,
    WipeLeft,
    WipeRight,
    WipeUp,
    WipeDown,
    DropIn,
    SpinIn,
    ZoomBlur,
    MotionWipe,
    LumaFade,
    Glitch,
    Shake,
    Panorama,
    ZoomIn,
    ZoomOut,
    PanLeft,
    PanRight,
}

/// Effect family of a [`Transition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    /// Hard cut, no effect and no overlap.
    Cut,
    /// Runs during the first second of the entry, then rests at the base fit.
    Entrance,
    /// Runs over the whole entry and never settles.
    Continuous,
}

impl Transition {
    pub const ALL: [Self; 25] = [
        Self::None,
        Self::Fade,
        Self::ScaleUp,
        Self::PopIn,
        Self::Blink,
        Self::SlideLeft,
        Self::SlideRight,
        Self::SlideUp,
        Self::SlideDown,
        Self::WipeLeft,
        Self::WipeRight,
        Self::WipeUp,
        Self::WipeDown,
        Self::DropIn,
        Self::SpinIn,
        Self::ZoomBlur,
        Self::MotionWipe,
        Self::LumaFade,
        Self::Glitch,
        Self::Shake,
        Self::Panorama,
        Self::ZoomIn,
        Self::ZoomOut,
        Self::PanLeft,
        Self::PanRight,
    ];

    pub fn kind(self) -> TransitionKind {
        match self {
            Self::None => TransitionKind::Cut,
            Self::Shake
            | Self::Panorama
            | Self::ZoomIn
            | Self::ZoomOut
            | Self::PanLeft
            | Self::PanRight => TransitionKind::Continuous,
            Self::Fade
            | Self::ScaleUp
            | Self::PopIn
            | Self::Blink
            | Self::SlideLeft
            | Self::SlideRight
            | Self::SlideUp
            | Self::SlideDown
            | Self::WipeLeft
            | Self::WipeRight
            | Self::WipeUp
            | Self::WipeDown
            | Self::DropIn
            | Self::SpinIn
            | Self::ZoomBlur
            | Self::MotionWipe
            | Self::LumaFade
            | Self::Glitch => TransitionKind::Entrance,
        }
    }

    /// Seconds this entry overlaps the previous one.
    pub fn overlap_secs(self) -> f64 {
        match self.kind() {
            TransitionKind::Cut => 0.0,
            TransitionKind::Entrance | TransitionKind::Continuous => 1.0,
        }
    }
}

/// Per-scene override of the global narration settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NarrationSettings {
    pub voice_id: Option<String>,
    pub speed: Option<f64>,
    /// Semitones.
    pub pitch: Option<f64>,
    pub volume: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub image_url: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub subtitle: String,
    /// Author-specified visual duration in seconds; raised to the scene minimum.
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub transition: Transition,
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub audio_duration: Option<f64>,
    #[serde(default)]
    pub narration_settings: Option<NarrationSettings>,
}

impl Scene {
    /// Narration clip length, zero when the scene has no usable audio duration.
    pub fn audio_secs(&self) -> f64 {
        match self.audio_duration {
            Some(d) if d.is_finite() && d > 0.0 => d,
            _ => 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptionMode {
    #[default]
    Standard,
    Dynamic,
}

/// Per-word animation used in dynamic caption mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DynamicAnimation {
    None,
    #[default]
    Pop,
    Shake,
    Elastic,
    MaskReveal,
    Typewriter,
    #[serde(rename = "karaoke_v2")]
    KaraokeV2,
    KineticStacking,
}

/// Entrance/exit animation for static subtitle and narration captions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaticCaptionAnimation {
    #[default]
    None,
    Fade,
    SlideUp,
    SlideDown,
    SlideLeft,
    SlideRight,
    Zoom,
    Pop,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CaptionLayoutConfig {
    /// Words per dynamic chunk.
    pub words_per_line: u32,
    /// Caption centre as a fraction of frame height.
    pub vertical_position: f64,
}

impl Default for CaptionLayoutConfig {
    fn default() -> Self {
        Self {
            words_per_line: 3,
            vertical_position: 0.75,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CaptionConfig {
    pub mode: CaptionMode,
    pub animation: DynamicAnimation,
    pub layout: CaptionLayoutConfig,
    /// Font file path; the approximate measurer and a fallback face are used when absent.
    pub font: Option<String>,
    /// Largest narration font size tried by the fit search.
    pub font_size: f64,
    pub min_font_size: f64,
    pub subtitle_font_size: f64,
    /// Maximum caption width as a fraction of frame width.
    pub max_width: f64,
    pub max_lines: u32,
    pub color: Color,
    pub highlight_color: Color,
    /// Backing box behind caption text; none when absent.
    pub background_color: Option<Color>,
    pub subtitle_entrance: StaticCaptionAnimation,
    pub subtitle_exit: StaticCaptionAnimation,
    pub narration_entrance: StaticCaptionAnimation,
    pub narration_exit: StaticCaptionAnimation,
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            mode: CaptionMode::Standard,
            animation: DynamicAnimation::Pop,
            layout: CaptionLayoutConfig::default(),
            font: None,
            font_size: 64.0,
            min_font_size: 24.0,
            subtitle_font_size: 44.0,
            max_width: 0.86,
            max_lines: 3,
            color: Color::WHITE,
            highlight_color: Color::rgba(1.0, 0.83, 0.0, 1.0),
            background_color: None,
            subtitle_entrance: StaticCaptionAnimation::Fade,
            subtitle_exit: StaticCaptionAnimation::None,
            narration_entrance: StaticCaptionAnimation::Fade,
            narration_exit: StaticCaptionAnimation::None,
        }
    }
}

/// Global defaults for narration and captions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub voice_id: String,
    pub speed: f64,
    /// Semitones.
    pub pitch: f64,
    pub volume: f64,
    pub captions: CaptionConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            voice_id: String::new(),
            speed: 1.0,
            pitch: 0.0,
            volume: 1.0,
            captions: CaptionConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    #[default]
    Image,
    Video,
}

/// Intro/outro media.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaDescriptor {
    pub url: String,
    #[serde(rename = "type", default)]
    pub kind: MediaKind,
    pub duration: f64,
}

impl MediaDescriptor {
    pub fn duration_secs(&self) -> f64 {
        if self.duration.is_finite() {
            self.duration.max(0.0)
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackgroundMusic {
    pub url: String,
    #[serde(default = "default_music_volume")]
    pub volume: f64,
    #[serde(rename = "loop", default = "default_true")]
    pub looping: bool,
    /// Fade at the end of the programme, seconds.
    #[serde(default = "default_music_fade")]
    pub fade_out: f64,
    /// Music gain multiplier while narration plays.
    #[serde(default = "default_ducking")]
    pub ducking: f64,
}

/// External overlay media composited in screen blend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Overlay {
    pub url: String,
    #[serde(rename = "type", default)]
    pub kind: MediaKind,
    #[serde(default = "default_one")]
    pub opacity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EffectToggle {
    pub enabled: bool,
    pub intensity: f64,
}

impl Default for EffectToggle {
    fn default() -> Self {
        Self {
            enabled: false,
            intensity: 0.5,
        }
    }
}

impl EffectToggle {
    /// Intensity clamped to `[0, 1]`, zero when disabled.
    pub fn level(self) -> f64 {
        if self.enabled && self.intensity.is_finite() {
            self.intensity.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// Procedural VFX overlay configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VfxConfig {
    pub light_leaks: EffectToggle,
    pub grain: EffectToggle,
    pub dust: EffectToggle,
    pub vignette: EffectToggle,
    /// Low-cost mode for interactive preview.
    pub throttled: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Position {
    TopLeft,
    TopRight,
    #[default]
    BottomRight,
    BottomLeft,
    Center,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Watermark {
    pub url: String,
    #[serde(default)]
    pub position: Position,
    /// Custom position, fractions of the frame (top-left corner of the mark).
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    /// Width as a fraction of frame width.
    #[serde(default = "default_watermark_scale")]
    pub scale: f64,
    #[serde(default = "default_watermark_opacity")]
    pub opacity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrCode {
    /// Pre-rendered QR image.
    pub url: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    /// Side length in pixels.
    #[serde(default = "default_qr_size")]
    pub size: f64,
}

/// Colour-matrix grade applied after the image layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ColorGrade {
    pub brightness: f64,
    pub contrast: f64,
    pub saturation: f64,
    pub sepia: f64,
}

impl Default for ColorGrade {
    fn default() -> Self {
        Self {
            brightness: 1.0,
            contrast: 1.0,
            saturation: 1.0,
            sepia: 0.0,
        }
    }
}

impl ColorGrade {
    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Bloom {
    /// Luminance threshold in `[0, 1]`.
    pub threshold: f64,
    pub intensity: f64,
    /// Blur radius in pixels.
    pub radius: u32,
}

impl Default for Bloom {
    fn default() -> Self {
        Self {
            threshold: 0.7,
            intensity: 0.6,
            radius: 12,
        }
    }
}

/// AI-disclosure badge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AiBadge {
    pub text: String,
    pub position: Position,
    pub opacity: f64,
}

impl Default for AiBadge {
    fn default() -> Self {
        Self {
            text: "AI-generated".to_owned(),
            position: Position::TopLeft,
            opacity: 0.85,
        }
    }
}

/// A complete render request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub scenes: Vec<Scene>,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub intro: Option<MediaDescriptor>,
    #[serde(default)]
    pub outro: Option<MediaDescriptor>,
    #[serde(default)]
    pub background_music: Option<BackgroundMusic>,
    #[serde(default)]
    pub overlay: Option<Overlay>,
    #[serde(default)]
    pub vfx: VfxConfig,
    #[serde(default)]
    pub watermark: Option<Watermark>,
    #[serde(default)]
    pub qr: Option<QrCode>,
    #[serde(default)]
    pub grade: Option<ColorGrade>,
    #[serde(default)]
    pub bloom: Option<Bloom>,
    #[serde(default)]
    pub ai_badge: Option<AiBadge>,
    #[serde(default)]
    pub canvas: Canvas,
    #[serde(default)]
    pub fps: Fps,
    #[serde(default = "default_background")]
    pub background_color: Color,
}

fn default_true() -> bool {
    true
}

fn default_one() -> f64 {
    1.0
}

fn default_music_volume() -> f64 {
    0.3
}

fn default_music_fade() -> f64 {
    2.0
}

fn default_ducking() -> f64 {
    0.6
}

fn default_watermark_scale() -> f64 {
    0.15
}

fn default_watermark_opacity() -> f64 {
    0.8
}

fn default_qr_size() -> f64 {
    180.0
}

fn default_background() -> Color {
    Color::BLACK
}

#[cfg(test)]
#[path = "../../tests/unit/scene/model.rs"]
mod tests;

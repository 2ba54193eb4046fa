//! reelcast turns a list of scenes (image, narration, captions, transition) into a timed,
//! frame-accurate video with a sample-aligned narration and music mix.
//!
//! The public API is session-oriented:
//!
//! - Load and validate a [`Project`]
//! - Create a [`RenderSession`] (assets, audio and the [`Timeline`] are prepared up front)
//! - Drive it with [`RenderSession::tick`], or [`export`] the whole programme into a [`FrameSink`]
//!
//! Audio DSP helpers ([`stretch_audio`], [`shift_pitch`], [`resample_buffer`]) are usable on
//! their own.
#![forbid(unsafe_code)]

mod assets;
mod foundation;

pub(crate) mod animation;
pub(crate) mod audio;
pub(crate) mod caption;
pub(crate) mod effects;
/// Capture sinks.
pub mod encode;
pub(crate) mod render;
pub(crate) mod scene;
/// Transport, clock and render session.
pub mod session;
pub(crate) mod timeline;

pub use crate::foundation::core::{
    Affine, Canvas, Fps, FrameIndex, Point, Rect, Rgba8Premul, Vec2, contain_rect, cover_rect,
};
pub use crate::foundation::error::{ReelError, ReelResult};

pub use crate::animation::ease::{Ease, window_progress};
pub use crate::assets::media::{VideoSourceInfo, decode_audio_f32_stereo};
pub use crate::assets::store::{AssetIssue, AssetKind, AssetResolver};
pub use crate::assets::video::VIDEO_CACHE_CAPACITY_ENV;
pub use crate::audio::buffer::AudioBuffer;
pub use crate::audio::dsp::{
    SOLA_FRAME_SECS, SOLA_SEARCH_SECS, SolaParams, resample_buffer, resample_to_rate, shift_pitch,
    stretch_audio,
};
pub use crate::audio::mix::{
    GraphState, MIX_CHANNELS, MIX_SAMPLE_RATE, MixGraph, MixSchedule, write_mix_to_f32le_file,
};
pub use crate::caption::animation::{
    CaptionOp, CaptionWindow, WordOp, dynamic_word_op, static_caption_op,
};
pub use crate::caption::chunk::{WordClock, WordState};
pub use crate::effects::composite::BlendMode;
pub use crate::effects::transitions::{ImageDraw, PostFx, TransitionInput, TransitionOp, transition_op};
pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts, is_ffmpeg_on_path};
pub use crate::encode::sink::{AudioStreamConfig, FrameSink, InMemorySink, SinkConfig};
pub use crate::render::backend::FrameRGBA;
pub use crate::scene::color::Color;
pub use crate::scene::model::{
    AiBadge, BackgroundMusic, Bloom, CaptionConfig, CaptionLayoutConfig, CaptionMode, ColorGrade,
    DynamicAnimation, EffectToggle, MediaDescriptor, MediaKind, NarrationSettings, Overlay,
    Position, Project, QrCode, Scene, Settings, StaticCaptionAnimation, Transition,
    TransitionKind, VfxConfig, Watermark,
};
pub use crate::scene::project::sanitize_speed;
pub use crate::session::export::{ExportOpts, ExportOutput, export, export_to_file};
pub use crate::session::render_session::{
    FrameResult, RenderSession, RenderedFrame, SessionMode, SessionOpts,
};
pub use crate::session::transport::TransportState;
pub use crate::timeline::builder::{Phase, Timeline, TimelineEntry, TimelineOpts, build_timeline};
pub use crate::timeline::caption_layout::{
    ApproxMeasure, CaptionLayout, ChunkLayout, PlacedWord, TextBlock, TextLine, TextMeasure,
};

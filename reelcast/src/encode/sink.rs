use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::backend::FrameRGBA;

/// Configuration handed to a [`FrameSink`] before the first frame.
#[derive(Debug, Clone, PartialEq)]
pub struct SinkConfig {
    pub width: u32,
    pub height: u32,
    pub fps: Fps,
    /// Present when the session will push interleaved audio.
    pub audio: Option<AudioStreamConfig>,
}

/// Layout of the interleaved `f32` samples passed to [`FrameSink::push_audio`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioStreamConfig {
    pub sample_rate: u32,
    pub channels: u16,
}

/// Consumer of a capture stream.
///
/// Ordering contract: `push_frame` is called with strictly increasing [`FrameIndex`] values, and
/// audio blocks arrive in playback order interleaved with the frames they accompany.
pub trait FrameSink: Send {
    /// Called once before any frame or audio block.
    fn begin(&mut self, cfg: SinkConfig) -> ReelResult<()>;
    /// Push one frame.
    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> ReelResult<()>;
    /// Push one block of interleaved samples. Sinks without an audio track ignore it.
    fn push_audio(&mut self, _samples: &[f32]) -> ReelResult<()> {
        Ok(())
    }
    /// Finalize and return the encoded bytes.
    fn end(&mut self) -> ReelResult<Vec<u8>>;
}

/// Sink that keeps everything in memory, for tests and previews.
///
/// `end` returns the concatenated premultiplied frame bytes.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(FrameIndex, FrameRGBA)>,
    audio: Vec<f32>,
    finished: bool,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration captured in `begin`.
    pub fn config(&self) -> Option<&SinkConfig> {
        self.cfg.as_ref()
    }

    pub fn frames(&self) -> &[(FrameIndex, FrameRGBA)] {
        &self.frames
    }

    /// Interleaved samples received so far.
    pub fn audio(&self) -> &[f32] {
        &self.audio
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> ReelResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.audio.clear();
        self.finished = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> ReelResult<()> {
        if self.cfg.is_none() || self.finished {
            return Err(ReelError::encoder("in-memory sink is not accepting frames"));
        }
        if let Some((last, _)) = self.frames.last()
            && idx <= *last
        {
            return Err(ReelError::encoder("in-memory sink received out-of-order frame index"));
        }
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn push_audio(&mut self, samples: &[f32]) -> ReelResult<()> {
        if self.cfg.as_ref().is_some_and(|c| c.audio.is_some()) {
            self.audio.extend_from_slice(samples);
        }
        Ok(())
    }

    fn end(&mut self) -> ReelResult<Vec<u8>> {
        if self.cfg.is_none() {
            return Err(ReelError::encoder("in-memory sink was never started"));
        }
        self.finished = true;
        Ok(self
            .frames
            .iter()
            .flat_map(|(_, f)| f.data.iter().copied())
            .collect())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;

//! Capture sinks.
//!
//! Sinks consume rendered frames and mixed audio in session order and hand back the finished
//! container bytes from `end`.

/// `ffmpeg`-based MP4 sink.
pub mod ffmpeg;
/// Sink trait and the in-memory sink.
pub mod sink;

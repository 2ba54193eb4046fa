/// Convenience result type used across reelcast.
pub type ReelResult<T> = Result<T, ReelError>;

/// Top-level error taxonomy used by engine APIs.
///
/// Asset and audio-graph failures are normally recovered inside the engine and only surface
/// through [`crate::AssetIssue`] records and logs; they are still representable here so helpers
/// can report them with `?` before the caller decides to substitute a fallback.
#[derive(thiserror::Error, Debug)]
pub enum ReelError {
    /// Invalid user-provided project data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Image or audio fetch/decode failed.
    #[error("asset load failure: {0}")]
    AssetLoad(String),

    /// The audio mix graph could not be constructed.
    #[error("audio graph failure: {0}")]
    AudioGraph(String),

    /// The capture sink could not finalize. Carries the session log collected so far.
    #[error("encoder failure: {message}")]
    Encoder {
        /// Human-readable failure description.
        message: String,
        /// Session log lines recorded before the failure.
        log: Vec<String>,
    },

    /// Errors while evaluating per-frame state or driving external tools.
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReelError {
    /// Build a [`ReelError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ReelError::AssetLoad`] value.
    pub fn asset_load(msg: impl Into<String>) -> Self {
        Self::AssetLoad(msg.into())
    }

    /// Build a [`ReelError::AudioGraph`] value.
    pub fn audio_graph(msg: impl Into<String>) -> Self {
        Self::AudioGraph(msg.into())
    }

    /// Build a [`ReelError::Encoder`] value without log history.
    pub fn encoder(msg: impl Into<String>) -> Self {
        Self::Encoder {
            message: msg.into(),
            log: Vec::new(),
        }
    }

    /// Build a [`ReelError::Evaluation`] value.
    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation(msg.into())
    }

    /// Build a [`ReelError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Attach session log history to an error, converting it into an encoder failure.
    ///
    /// Errors that are already encoder failures keep their message and gain the log.
    pub fn into_encoder_failure(self, log: Vec<String>) -> Self {
        match self {
            Self::Encoder { message, .. } => Self::Encoder { message, log },
            other => Self::Encoder {
                message: other.to_string(),
                log,
            },
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;

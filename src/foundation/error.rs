/// Convenience result type used across storyreel.
pub type ReelResult<T> = Result<T, ReelError>;

/// Top-level error taxonomy used by pipeline APIs.
///
/// The variants map onto how far a failure reaches: `Setup` ends the session, `Synthesis` is
/// scoped to one frame, `Encode` and `Narration` degrade the session without discarding work.
#[derive(thiserror::Error, Debug)]
pub enum ReelError {
    /// Invalid user-provided data (script, frame rate, strength, sizes, naming overflow).
    #[error("validation error: {0}")]
    Validation(String),

    /// The character identity or its reference image could not be created.
    #[error("setup error: {0}")]
    Setup(String),

    /// A single frame generation call failed.
    #[error("synthesis error: {0}")]
    Synthesis(String),

    /// Frame serialization, video encoding or muxing failed.
    #[error("encode error: {0}")]
    Encode(String),

    /// The narration capability failed to produce an audio track.
    #[error("narration error: {0}")]
    Narration(String),

    /// Errors when serializing or deserializing project data.
    #[error("serialization error: {0}")]
    Serde(String),

    /// A cooperative cancellation request was observed.
    #[error("cancelled: {0}")]
    Cancelled(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReelError {
    /// Build a [`ReelError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ReelError::Setup`] value.
    pub fn setup(msg: impl Into<String>) -> Self {
        Self::Setup(msg.into())
    }

    /// Build a [`ReelError::Synthesis`] value.
    pub fn synthesis(msg: impl Into<String>) -> Self {
        Self::Synthesis(msg.into())
    }

    /// Build a [`ReelError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`ReelError::Narration`] value.
    pub fn narration(msg: impl Into<String>) -> Self {
        Self::Narration(msg.into())
    }

    /// Build a [`ReelError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Build a [`ReelError::Cancelled`] value.
    pub fn cancelled(msg: impl Into<String>) -> Self {
        Self::Cancelled(msg.into())
    }
}

impl From<serde_json::Error> for ReelError {
    fn from(e: serde_json::Error) -> Self {
        Self::serde(e.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;

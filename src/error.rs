use crate::extract::ExtractError;
use crate::EngineError;

/// Errors surfaced by the narration pipeline.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Text extraction failed: {0}")]
    Extraction(#[from] ExtractError),
    #[error("No readable text found")]
    EmptyContent,
    #[error("No TTS engine available")]
    SynthesisUnavailable,
    #[error("Speech synthesis failed: {0}")]
    Synthesis(EngineError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// True when the failure was caused by the submitted document rather
    /// than by the service.
    pub fn is_user_error(&self) -> bool {
        matches!(self, Error::EmptyContent)
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

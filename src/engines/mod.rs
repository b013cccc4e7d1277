//! Speech synthesis engines.
//!
//! # Available Engines
//!
//! Enable engines via Cargo features:
//! - `gtts` (default) - Google Translate TTS over HTTPS, returns MP3
//! - `kokoro` - Kokoro TTS (ONNX format, espeak-ng required), returns 24 kHz PCM

#[cfg(feature = "gtts")]
pub mod gtts;
#[cfg(feature = "kokoro")]
pub mod kokoro;

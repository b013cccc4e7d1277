//! # narrate-rs
//!
//! A Rust library that turns documents into short, humanized spoken narrations.
//!
//! ## Pipeline
//!
//! 1. **Extract**: PDF, DOCX or plain text into a single string
//! 2. **Summarize**: keyword-driven extractive summary, bounded in words
//! 3. **Humanize**: language-specific conversational framing and flavor
//! 4. **Synthesize**: network (Google Translate) or local Kokoro TTS
//!
//! ## Features
//!
//! - `gtts` (default): network-backed speech through the Google Translate TTS endpoint
//! - `kokoro`: local neural speech with the Kokoro-82M ONNX model
//!
//! ## Quick Start
//!
//! ```no_run
//! use narrate_rs::{Config, Document, Pipeline};
//!
//! let pipeline = Pipeline::from_config(Config::from_env()?)?;
//! let bytes = std::fs::read("paper.pdf")?;
//! let narration = pipeline.process(&Document::new(&bytes, "paper.pdf"), "Spanish")?;
//!
//! println!("{}", narration.summary);
//! println!("audio at {}", narration.audio.url);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cache;
pub mod config;
pub mod engines;
pub mod error;
pub mod extract;
pub mod humanize;
pub mod pipeline;
pub mod summarize;
pub mod synthesizer;

pub use cache::EngineCache;
pub use config::{Config, ConfigBuilder, LanguageConfig};
pub use error::{Error, Result};
pub use extract::{extract, Document, DocumentKind, ExtractError};
pub use humanize::{Humanizer, StyleProfile, StyleTable, Substitution};
pub use pipeline::{Narration, Pipeline, ProcessResponse};
pub use summarize::{summarize, DEFAULT_MAX_WORDS};
pub use synthesizer::{
    select_backend, AudioArtifact, Backend, Capabilities, LocaleTable, SynthesisRequest,
    Synthesizer,
};

use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Error type returned by synthesis engines.
pub type EngineError = Box<dyn std::error::Error + Send + Sync>;

/// The result of a synthesis (text-to-speech) operation.
#[derive(Debug)]
pub enum SynthesisResult {
    /// Raw f32 samples, as produced by local neural engines.
    Pcm {
        /// Raw audio samples as f32 values
        samples: Vec<f32>,
        /// Sample rate of the audio (24000 for Kokoro)
        sample_rate: u32,
    },
    /// An already encoded MP3 stream, as returned by network engines.
    Mp3(Vec<u8>),
}

impl SynthesisResult {
    /// File extension matching the audio encoding, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            SynthesisResult::Pcm { .. } => "wav",
            SynthesisResult::Mp3(_) => "mp3",
        }
    }

    /// Write the audio to `path`.
    ///
    /// PCM audio is written as a 32-bit float mono WAV file, MP3 data is
    /// written as-is.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        match self {
            SynthesisResult::Pcm {
                samples,
                sample_rate,
            } => write_wav(path, samples, *sample_rate),
            SynthesisResult::Mp3(bytes) => {
                let mut file = File::create(path)?;
                file.write_all(bytes)?;
                file.sync_all()?;
                Ok(())
            }
        }
    }

    /// Duration of the audio in seconds, when it can be known without decoding.
    pub fn duration_secs(&self) -> Option<f64> {
        match self {
            SynthesisResult::Pcm {
                samples,
                sample_rate,
            } if *sample_rate > 0 => Some(samples.len() as f64 / *sample_rate as f64),
            _ => None,
        }
    }
}

fn write_wav(path: &Path, samples: &[f32], sample_rate: u32) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let wav_err = |e: hound::Error| Error::Synthesis(Box::new(e));
    let mut writer = hound::WavWriter::create(path, spec).map_err(wav_err)?;
    for &sample in samples {
        writer.write_sample(sample).map_err(wav_err)?;
    }
    writer.finalize().map_err(wav_err)?;
    Ok(())
}

/// Common interface for text-to-speech synthesis engines.
///
/// Each engine has its own parameter type; the [`Synthesizer`] translates a
/// resolved locale into those parameters.
pub trait SynthesisEngine {
    /// Parameters for configuring inference behavior (language, voice, speed, etc.)
    type SynthesisParams: Default;

    /// Synthesize speech from the given text.
    fn synthesize(
        &mut self,
        text: &str,
        params: Option<Self::SynthesisParams>,
    ) -> std::result::Result<SynthesisResult, EngineError>;

    /// Synthesize speech from the given text and write it to `path`.
    ///
    /// Default implementation calls `synthesize()` then `SynthesisResult::write_to()`.
    fn synthesize_to_file(
        &mut self,
        text: &str,
        path: &Path,
        params: Option<Self::SynthesisParams>,
    ) -> std::result::Result<(), EngineError> {
        self.synthesize(text, params)?
            .write_to(path)
            .map_err(|e| Box::new(e) as EngineError)
    }
}

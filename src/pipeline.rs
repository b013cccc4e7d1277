//! The end-to-end narration flow: extract, summarize, humanize, speak.

use serde::Serialize;

use crate::config::{Config, LanguageConfig};
use crate::error::{Error, Result};
use crate::extract::{extract, Document};
use crate::humanize::Humanizer;
use crate::summarize::summarize;
use crate::synthesizer::{AudioArtifact, Capabilities, Synthesizer};

/// A finished narration: the humanized summary and its audio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Narration {
    pub summary: String,
    pub audio: AudioArtifact,
}

/// The outward-facing result of one request.
///
/// Serializes as `{"summary": ..., "audio_url": ...}` or `{"error": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ProcessResponse {
    Success {
        summary: String,
        audio_url: String,
    },
    Failure {
        error: String,
        #[serde(skip)]
        user_error: bool,
    },
}

impl ProcessResponse {
    /// HTTP-style status: 200 on success, 400 for unusable documents,
    /// 500 for everything else.
    pub fn status_code(&self) -> u16 {
        match self {
            ProcessResponse::Success { .. } => 200,
            ProcessResponse::Failure {
                user_error: true, ..
            } => 400,
            ProcessResponse::Failure { .. } => 500,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ProcessResponse::Success { .. })
    }
}

impl From<Narration> for ProcessResponse {
    fn from(narration: Narration) -> Self {
        ProcessResponse::Success {
            summary: narration.summary,
            audio_url: narration.audio.url,
        }
    }
}

impl From<&Error> for ProcessResponse {
    fn from(err: &Error) -> Self {
        ProcessResponse::Failure {
            error: err.to_string(),
            user_error: err.is_user_error(),
        }
    }
}

/// Document-to-narration pipeline. Build once, share across requests.
pub struct Pipeline {
    config: Config,
    humanizer: Humanizer,
    synthesizer: Synthesizer,
}

impl Pipeline {
    /// Build a pipeline, discovering the available speech backends.
    pub fn from_config(config: Config) -> Result<Self> {
        let languages = config.language_config()?;
        let capabilities = Capabilities::discover(&config);
        Self::with_capabilities(config, languages, capabilities)
    }

    /// Build a pipeline with explicit language tables and backends.
    pub fn with_capabilities(
        config: Config,
        languages: LanguageConfig,
        capabilities: Capabilities,
    ) -> Result<Self> {
        config.validate()?;
        std::fs::create_dir_all(&config.work_dir)?;
        let humanizer = Humanizer::new(languages.styles)?;
        let synthesizer = Synthesizer::new(&config, languages.locales, capabilities)?;

        log::info!(
            "Pipeline ready (work dir {}, backends {:?})",
            config.work_dir.display(),
            synthesizer.capabilities().backends()
        );
        Ok(Self {
            config,
            humanizer,
            synthesizer,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn synthesizer(&self) -> &Synthesizer {
        &self.synthesizer
    }

    /// Produce the humanized summary of `document` without speaking it.
    ///
    /// Fails with [`Error::EmptyContent`] when the document has no
    /// non-whitespace text.
    pub fn summarize(&self, document: &Document<'_>, language: &str) -> Result<String> {
        let text = extract(document, &self.config.work_dir)?;
        if text.trim().is_empty() {
            return Err(Error::EmptyContent);
        }

        let summary = summarize(&text, self.config.max_summary_words);
        Ok(self.humanizer.humanize(&summary, language))
    }

    /// Narrate `document` in `language`.
    pub fn process(&self, document: &Document<'_>, language: &str) -> Result<Narration> {
        let summary = self.summarize(document, language)?;
        let request = self.synthesizer.request(summary.as_str(), language);
        let audio = self.synthesizer.synthesize(&request)?;
        Ok(Narration { summary, audio })
    }

    /// [`Pipeline::process`] mapped to a response; failures are logged.
    pub fn respond(&self, document: &Document<'_>, language: &str) -> ProcessResponse {
        match self.process(document, language) {
            Ok(narration) => narration.into(),
            Err(err) => {
                log::warn!("Failed to narrate {:?}: {err}", document.filename);
                ProcessResponse::from(&err)
            }
        }
    }
}

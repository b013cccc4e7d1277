//! Speech synthesis: locale resolution, backend selection and audio storage.
//!
//! Two backends exist:
//!
//! - [`Backend::Network`]: Google Translate TTS (feature `gtts`)
//! - [`Backend::LocalNeural`]: Kokoro ONNX models (feature `kokoro`)
//!
//! Which of them can be used is decided once, at startup, by
//! [`Capabilities::discover`]. Each request then picks one with
//! [`select_backend`].

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[cfg(feature = "gtts")]
use crate::engines::gtts::{GttsEngine, GttsParams};
#[cfg(feature = "kokoro")]
use crate::engines::kokoro::{KokoroEngine, KokoroInferenceParams, KokoroModelParams};
#[cfg(feature = "kokoro")]
use crate::EngineCache;
#[cfg(any(feature = "gtts", feature = "kokoro"))]
use crate::SynthesisEngine;
use crate::{Config, Error, Result, SynthesisResult};

/// Language label to speech locale code, with a default for unknown labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocaleTable {
    pub default_locale: String,
    pub locales: BTreeMap<String, String>,
}

impl Default for LocaleTable {
    fn default() -> Self {
        let locales = [
            ("English", "en"),
            // No Tamil voice on either backend
            ("Tamil", "en"),
            ("Hindi", "hi"),
            ("Telugu", "te"),
            ("Kannada", "kn"),
            ("Malayalam", "ml"),
            ("Bengali", "bn"),
            ("Marathi", "mr"),
            ("Gujarati", "gu"),
            ("Punjabi", "pa"),
            ("Urdu", "ur"),
            ("Spanish", "es"),
            ("French", "fr"),
            ("German", "de"),
        ];

        Self {
            default_locale: "en".to_string(),
            locales: locales
                .into_iter()
                .map(|(label, code)| (label.to_string(), code.to_string()))
                .collect(),
        }
    }
}

impl LocaleTable {
    /// Locale code for `language`. Labels match exactly, case included.
    pub fn resolve(&self, language: &str) -> &str {
        self.locales
            .get(language)
            .map(String::as_str)
            .unwrap_or(&self.default_locale)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Google Translate TTS over HTTPS.
    Network,
    /// Kokoro running in-process.
    LocalNeural,
}

/// The set of backends usable by this process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities {
    backends: Vec<Backend>,
}

impl Capabilities {
    /// Probe compiled-in features and configuration.
    ///
    /// The neural backend needs the `kokoro` feature and an existing
    /// `models_dir`; the network backend needs the `gtts` feature and
    /// `network_tts`.
    pub fn discover(config: &Config) -> Self {
        let mut backends = Vec::new();

        if cfg!(feature = "kokoro") {
            match &config.models_dir {
                Some(dir) if dir.is_dir() => backends.push(Backend::LocalNeural),
                Some(dir) => log::warn!(
                    "Models directory {} not found, local neural speech disabled",
                    dir.display()
                ),
                None => log::debug!("No models directory configured"),
            }
        }
        if cfg!(feature = "gtts") && config.network_tts {
            backends.push(Backend::Network);
        }

        log::info!("Available TTS backends: {backends:?}");
        Self { backends }
    }

    /// No backend at all; every synthesis request fails.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn from_backends(backends: impl IntoIterator<Item = Backend>) -> Self {
        let mut caps = Self::default();
        for backend in backends {
            if !caps.has(backend) {
                caps.backends.push(backend);
            }
        }
        caps
    }

    pub fn has(&self, backend: Backend) -> bool {
        self.backends.contains(&backend)
    }

    pub fn backends(&self) -> &[Backend] {
        &self.backends
    }
}

/// Pick the backend for one request.
///
/// The neural backend wins when it is preferred and present. Otherwise the
/// network backend is used, and the neural one is the last resort.
pub fn select_backend(capabilities: &Capabilities, prefer_neural: bool) -> Result<Backend> {
    if prefer_neural && capabilities.has(Backend::LocalNeural) {
        Ok(Backend::LocalNeural)
    } else if capabilities.has(Backend::Network) {
        Ok(Backend::Network)
    } else if capabilities.has(Backend::LocalNeural) {
        Ok(Backend::LocalNeural)
    } else {
        Err(Error::SynthesisUnavailable)
    }
}

/// Text to speak, in a resolved locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisRequest {
    pub text: String,
    /// Locale code such as `"en"` or `"hi"`.
    pub locale: String,
    pub prefer_neural: bool,
    /// Neural model id; `None` uses the configured default.
    pub model: Option<String>,
}

/// A stored audio file and the URL it is served under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AudioArtifact {
    pub file_name: String,
    pub path: PathBuf,
    pub url: String,
    pub backend: Backend,
}

#[cfg(feature = "kokoro")]
struct NeuralBackend {
    engines: EngineCache<parking_lot::Mutex<KokoroEngine>>,
    models_dir: Option<PathBuf>,
    default_model: String,
    params: KokoroModelParams,
}

/// Turns text into stored audio with whichever backend is available.
///
/// Shared by all requests: network clients are pooled and neural models are
/// loaded once per model id.
pub struct Synthesizer {
    capabilities: Capabilities,
    locales: LocaleTable,
    work_dir: PathBuf,
    url_prefix: String,
    prefer_neural: bool,
    #[cfg(feature = "gtts")]
    network: Option<GttsEngine>,
    #[cfg(feature = "kokoro")]
    neural: NeuralBackend,
    /// MP3 returned instead of calling a backend.
    #[cfg(test)]
    canned_mp3: Option<Vec<u8>>,
}

impl Synthesizer {
    pub fn new(config: &Config, locales: LocaleTable, capabilities: Capabilities) -> Result<Self> {
        #[cfg(feature = "gtts")]
        let network = if capabilities.has(Backend::Network) {
            let engine = GttsEngine::new(&config.gtts_tld)
                .map_err(|e| Error::Config(format!("network TTS client: {e}")))?;
            Some(engine)
        } else {
            None
        };

        #[cfg(feature = "kokoro")]
        let neural = NeuralBackend {
            engines: EngineCache::new(),
            models_dir: config.models_dir.clone(),
            default_model: config.default_model.clone(),
            params: KokoroModelParams {
                num_threads: config.num_threads,
                ..Default::default()
            },
        };

        Ok(Self {
            capabilities,
            locales,
            work_dir: config.work_dir.clone(),
            url_prefix: config.audio_url_prefix.clone(),
            prefer_neural: config.prefer_neural,
            #[cfg(feature = "gtts")]
            network,
            #[cfg(feature = "kokoro")]
            neural,
            #[cfg(test)]
            canned_mp3: None,
        })
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn locales(&self) -> &LocaleTable {
        &self.locales
    }

    /// Build a request for `text` spoken in `language`, using the configured
    /// backend preference and default model.
    pub fn request(&self, text: impl Into<String>, language: &str) -> SynthesisRequest {
        SynthesisRequest {
            text: text.into(),
            locale: self.locales.resolve(language).to_string(),
            prefer_neural: self.prefer_neural,
            model: None,
        }
    }

    /// Speak `request` and store the audio under the working directory.
    pub fn synthesize(&self, request: &SynthesisRequest) -> Result<AudioArtifact> {
        let backend = select_backend(&self.capabilities, request.prefer_neural)?;
        log::debug!(
            "Synthesizing {} chars ({}) with {backend:?}",
            request.text.chars().count(),
            request.locale
        );

        let audio = match self.canned_audio() {
            Some(audio) => audio,
            None => match backend {
                Backend::Network => self.speak_network(&request.text, &request.locale)?,
                Backend::LocalNeural => {
                    self.speak_neural(&request.text, &request.locale, request.model.as_deref())?
                }
            },
        };
        self.store(&audio, backend)
    }

    #[cfg(feature = "gtts")]
    fn speak_network(&self, text: &str, locale: &str) -> Result<SynthesisResult> {
        let mut engine = self.network.clone().ok_or(Error::SynthesisUnavailable)?;
        let params = GttsParams {
            lang: locale.to_string(),
            slow: false,
        };
        engine.synthesize(text, Some(params)).map_err(Error::Synthesis)
    }

    #[cfg(not(feature = "gtts"))]
    fn speak_network(&self, _text: &str, _locale: &str) -> Result<SynthesisResult> {
        Err(Error::SynthesisUnavailable)
    }

    #[cfg(feature = "kokoro")]
    fn speak_neural(&self, text: &str, locale: &str, model: Option<&str>) -> Result<SynthesisResult> {
        let neural = &self.neural;
        let models_dir = neural
            .models_dir
            .as_deref()
            .ok_or(Error::SynthesisUnavailable)?;
        let model_id = model.unwrap_or(&neural.default_model);
        if model_id.is_empty() || model_id == ".." || model_id.contains(['/', '\\']) {
            return Err(Error::Synthesis(
                format!("invalid model id {model_id:?}").into(),
            ));
        }

        let params =
            KokoroInferenceParams::for_locale(locale).map_err(|e| Error::Synthesis(Box::new(e)))?;
        let engine = neural
            .engines
            .get_or_try_load(model_id, || {
                KokoroEngine::load(&models_dir.join(model_id), neural.params.clone())
                    .map(parking_lot::Mutex::new)
            })
            .map_err(|e| Error::Synthesis(Box::new(e)))?;

        let mut engine = engine.lock();
        engine.synthesize(text, Some(params)).map_err(Error::Synthesis)
    }

    #[cfg(not(feature = "kokoro"))]
    fn speak_neural(
        &self,
        _text: &str,
        _locale: &str,
        _model: Option<&str>,
    ) -> Result<SynthesisResult> {
        Err(Error::SynthesisUnavailable)
    }

    #[cfg(test)]
    pub(crate) fn set_canned_mp3(&mut self, mp3: Vec<u8>) {
        self.canned_mp3 = Some(mp3);
    }

    #[cfg(test)]
    fn canned_audio(&self) -> Option<SynthesisResult> {
        self.canned_mp3.clone().map(SynthesisResult::Mp3)
    }

    #[cfg(not(test))]
    fn canned_audio(&self) -> Option<SynthesisResult> {
        None
    }

    fn store(&self, audio: &SynthesisResult, backend: Backend) -> Result<AudioArtifact> {
        let file_name = format!("{}.{}", uuid::Uuid::new_v4(), audio.extension());
        let path = self.work_dir.join(&file_name);
        audio.write_to(&path)?;

        let url = format!("{}/{}", self.url_prefix.trim_end_matches('/'), file_name);
        match audio.duration_secs() {
            Some(secs) => log::info!("Wrote {:.1}s of audio to {}", secs, path.display()),
            None => log::info!("Wrote audio to {}", path.display()),
        }
        Ok(AudioArtifact {
            file_name,
            path,
            url,
            backend,
        })
    }
}

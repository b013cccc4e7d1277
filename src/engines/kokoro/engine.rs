use std::path::{Path, PathBuf};

use crate::{EngineError, SynthesisEngine, SynthesisResult};

use super::model::{KokoroError, KokoroModel, SAMPLE_RATE};
use super::phonemizer::EspeakConfig;

/// Default voice for each supported locale.
const LOCALE_VOICES: &[(&str, &str)] = &[
    ("en", "af_heart"),
    ("es", "ef_dora"),
    ("fr", "ff_siwis"),
    ("hi", "hf_alpha"),
    ("it", "if_sara"),
    ("ja", "jf_alpha"),
    ("pt", "pf_dora"),
    ("zh", "zf_xiaobei"),
];

/// Parameters for configuring Kokoro model loading.
#[derive(Debug, Clone, Default)]
pub struct KokoroModelParams {
    /// Number of intra-op CPU threads. `None` uses the ORT default.
    pub num_threads: Option<usize>,
    /// Where to find espeak-ng. Defaults to `espeak-ng` on PATH.
    pub espeak: EspeakConfig,
}

/// Parameters for configuring a Kokoro synthesis request.
#[derive(Debug, Clone)]
pub struct KokoroInferenceParams {
    /// Voice name (e.g. `"af_heart"`, `"ff_siwis"`).
    pub voice: String,
    /// Speech speed multiplier. Range: 0.5–2.0, default 1.0.
    pub speed: f32,
}

impl Default for KokoroInferenceParams {
    fn default() -> Self {
        Self {
            voice: "af_heart".to_string(),
            speed: 1.0,
        }
    }
}

impl KokoroInferenceParams {
    /// Pick the default voice for a locale code such as `"fr"` or `"pt-BR"`.
    pub fn for_locale(locale: &str) -> Result<Self, KokoroError> {
        let base = locale
            .split(['-', '_'])
            .next()
            .unwrap_or(locale)
            .to_ascii_lowercase();
        let voice = LOCALE_VOICES
            .iter()
            .find(|(code, _)| *code == base)
            .map(|(_, voice)| *voice)
            .ok_or_else(|| KokoroError::UnsupportedLocale(locale.to_string()))?;

        Ok(Self {
            voice: voice.to_string(),
            ..Default::default()
        })
    }
}

/// Kokoro text-to-speech engine bound to one model directory.
pub struct KokoroEngine {
    model: KokoroModel,
    model_dir: PathBuf,
    espeak: EspeakConfig,
}

impl KokoroEngine {
    /// Load the model found in `model_dir`.
    pub fn load(model_dir: &Path, params: KokoroModelParams) -> Result<Self, KokoroError> {
        let model = KokoroModel::load(model_dir, params.num_threads)?;
        Ok(Self {
            model,
            model_dir: model_dir.to_path_buf(),
            espeak: params.espeak,
        })
    }

    pub fn model_dir(&self) -> &Path {
        &self.model_dir
    }

    /// List all available voice names.
    pub fn list_voices(&self) -> Vec<&str> {
        self.model.list_voices()
    }
}

impl SynthesisEngine for KokoroEngine {
    type SynthesisParams = KokoroInferenceParams;

    fn synthesize(
        &mut self,
        text: &str,
        params: Option<Self::SynthesisParams>,
    ) -> Result<SynthesisResult, EngineError> {
        let p = params.unwrap_or_default();
        let samples = self
            .model
            .synthesize_text(text, &p.voice, p.speed, &self.espeak)?;

        Ok(SynthesisResult::Pcm {
            samples,
            sample_rate: SAMPLE_RATE,
        })
    }
}

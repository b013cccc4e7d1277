//! Runtime configuration.
//!
//! Build a [`Config`] with [`ConfigBuilder`] or read it from `NARRATE_*`
//! environment variables (a `.env` file is honored) with
//! [`Config::from_env`].

use std::path::PathBuf;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::humanize::StyleTable;
use crate::summarize::DEFAULT_MAX_WORDS;
use crate::synthesizer::LocaleTable;

#[derive(Debug, Clone, PartialEq, Builder)]
#[builder(default, setter(into))]
pub struct Config {
    /// Where audio artifacts and staged uploads are written.
    pub work_dir: PathBuf,
    /// Prefix under which the transport layer serves `work_dir`.
    pub audio_url_prefix: String,
    pub max_summary_words: usize,
    /// JSON [`LanguageConfig`] replacing the built-in tables.
    #[builder(setter(into, strip_option))]
    pub languages_path: Option<PathBuf>,
    /// Allow the Google Translate backend.
    pub network_tts: bool,
    /// Google domain suffix, e.g. `com` or `co.in`.
    pub gtts_tld: String,
    /// Directory holding one sub-directory per Kokoro model id.
    #[builder(setter(into, strip_option))]
    pub models_dir: Option<PathBuf>,
    /// Model id used when a request does not name one.
    pub default_model: String,
    #[builder(setter(into, strip_option))]
    pub num_threads: Option<usize>,
    /// Route requests to the local neural backend when it is available.
    pub prefer_neural: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("tmp"),
            audio_url_prefix: "/tmp".to_string(),
            max_summary_words: DEFAULT_MAX_WORDS,
            languages_path: None,
            network_tts: true,
            gtts_tld: "com".to_string(),
            models_dir: None,
            default_model: "kokoro".to_string(),
            num_threads: None,
            prefer_neural: false,
        }
    }
}

impl Config {
    /// Read configuration from the environment, loading `.env` first if present.
    pub fn from_env() -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(path) => log::debug!("Loaded environment from {}", path.display()),
            Err(e) if e.not_found() => {}
            Err(e) => return Err(Error::Config(format!(".env: {e}"))),
        }
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build a config from a variable lookup; unset variables keep defaults.
    pub fn from_vars<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();
        if let Some(v) = var("NARRATE_WORK_DIR") {
            config.work_dir = v.into();
        }
        if let Some(v) = var("NARRATE_AUDIO_URL_PREFIX") {
            config.audio_url_prefix = v;
        }
        if let Some(v) = var("NARRATE_MAX_WORDS") {
            config.max_summary_words = parse_number("NARRATE_MAX_WORDS", &v)?;
        }
        if let Some(v) = var("NARRATE_LANGUAGES") {
            config.languages_path = Some(v.into());
        }
        if let Some(v) = var("NARRATE_NETWORK_TTS") {
            config.network_tts = parse_flag("NARRATE_NETWORK_TTS", &v)?;
        }
        if let Some(v) = var("NARRATE_GTTS_TLD") {
            config.gtts_tld = v;
        }
        if let Some(v) = var("NARRATE_MODELS_DIR") {
            config.models_dir = Some(v.into());
        }
        if let Some(v) = var("NARRATE_DEFAULT_MODEL") {
            config.default_model = v;
        }
        if let Some(v) = var("NARRATE_NUM_THREADS") {
            config.num_threads = Some(parse_number("NARRATE_NUM_THREADS", &v)?);
        }
        if let Some(v) = var("NARRATE_PREFER_NEURAL") {
            config.prefer_neural = parse_flag("NARRATE_PREFER_NEURAL", &v)?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Reject values no pipeline can run with.
    pub fn validate(&self) -> Result<()> {
        if self.max_summary_words == 0 {
            return Err(Error::Config(
                "max_summary_words must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// The language tables: from `languages_path` when set, built-in otherwise.
    pub fn language_config(&self) -> Result<LanguageConfig> {
        let Some(path) = &self.languages_path else {
            return Ok(LanguageConfig::default());
        };
        let json = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        let languages = serde_json::from_str(&json)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        log::info!("Loaded language tables from {}", path.display());
        Ok(languages)
    }
}

/// Declarative per-language behavior: framing/flavor and speech locale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageConfig {
    #[serde(default)]
    pub styles: StyleTable,
    #[serde(default)]
    pub locales: LocaleTable,
}

fn parse_number(key: &str, value: &str) -> Result<usize> {
    value
        .trim()
        .parse()
        .map_err(|e| Error::Config(format!("{key}={value:?}: {e}")))
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::Config(format!("{key}={value:?}: expected a boolean"))),
    }
}

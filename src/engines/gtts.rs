//! Network speech through the Google Translate TTS endpoint.
//!
//! Lightweight: nothing to load, one HTTP round trip per 100 characters.
//! The endpoint returns MP3; chunk responses are concatenated, which MP3
//! players handle as a single stream.

use reqwest::blocking::Client;

use crate::{EngineError, SynthesisEngine, SynthesisResult};

/// The endpoint rejects requests longer than this many characters.
pub const MAX_CHUNK_CHARS: usize = 100;

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// Language codes the endpoint is known to speak.
const SUPPORTED_LANGUAGES: &[&str] = &[
    "af", "ar", "bg", "bn", "bs", "ca", "cs", "cy", "da", "de", "el", "en", "eo", "es", "et", "fi",
    "fr", "gu", "hi", "hr", "hu", "hy", "id", "is", "it", "iw", "ja", "jw", "km", "kn", "ko", "la",
    "lv", "mk", "ml", "mr", "my", "ne", "nl", "no", "pa", "pl", "pt", "ro", "ru", "si", "sk", "sq",
    "sr", "su", "sv", "sw", "ta", "te", "th", "tl", "tr", "uk", "ur", "vi", "zh", "zh-CN", "zh-TW",
];

#[derive(thiserror::Error, Debug)]
pub enum GttsError {
    #[error("Language '{0}' is not supported by Google Translate TTS")]
    UnsupportedLanguage(String),
    #[error("No text to speak")]
    EmptyText,
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Parameters for a Google Translate TTS request.
#[derive(Debug, Clone)]
pub struct GttsParams {
    /// Language code, e.g. `"en"`, `"hi"`, `"es"`.
    pub lang: String,
    /// Read more slowly.
    pub slow: bool,
}

impl Default for GttsParams {
    fn default() -> Self {
        Self {
            lang: "en".to_string(),
            slow: false,
        }
    }
}

/// Google Translate TTS client. Cheap to clone; clones share a connection pool.
#[derive(Debug, Clone)]
pub struct GttsEngine {
    client: Client,
    tld: String,
}

impl GttsEngine {
    /// Create a client for `translate.google.{tld}`.
    pub fn new(tld: &str) -> Result<Self, GttsError> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            client,
            tld: tld.to_string(),
        })
    }

    pub fn is_supported(lang: &str) -> bool {
        SUPPORTED_LANGUAGES.contains(&lang)
    }

    fn endpoint(&self) -> String {
        format!("https://translate.google.{}/translate_tts", self.tld)
    }

    fn speak(&self, text: &str, params: &GttsParams) -> Result<Vec<u8>, GttsError> {
        if !Self::is_supported(&params.lang) {
            return Err(GttsError::UnsupportedLanguage(params.lang.clone()));
        }

        let chunks = split_text(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(GttsError::EmptyText);
        }

        let total = chunks.len().to_string();
        let speed = if params.slow { "0.3" } else { "1" };
        let mut audio = Vec::new();
        for (idx, chunk) in chunks.iter().enumerate() {
            let idx = idx.to_string();
            let textlen = chunk.chars().count().to_string();
            let bytes = self
                .client
                .get(self.endpoint())
                .query(&[
                    ("ie", "UTF-8"),
                    ("q", chunk.as_str()),
                    ("tl", params.lang.as_str()),
                    ("client", "tw-ob"),
                    ("ttsspeed", speed),
                    ("total", total.as_str()),
                    ("idx", idx.as_str()),
                    ("textlen", textlen.as_str()),
                ])
                .send()?
                .error_for_status()?
                .bytes()?;
            audio.extend_from_slice(&bytes);
        }

        log::debug!(
            "Google TTS returned {} bytes for {} chunks ({})",
            audio.len(),
            chunks.len(),
            params.lang
        );
        Ok(audio)
    }
}

impl SynthesisEngine for GttsEngine {
    type SynthesisParams = GttsParams;

    fn synthesize(
        &mut self,
        text: &str,
        params: Option<Self::SynthesisParams>,
    ) -> Result<SynthesisResult, EngineError> {
        let params = params.unwrap_or_default();
        Ok(SynthesisResult::Mp3(self.speak(text, &params)?))
    }
}

/// Split `text` into pieces of at most `max_chars` characters on word
/// boundaries. Words longer than `max_chars` are cut.
pub fn split_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = word.chars().collect();
            chunks.extend(chars.chunks(max_chars).map(|c| c.iter().collect::<String>()));
            continue;
        }

        let needed = if current.is_empty() { word_len } else { current_len + 1 + word_len };
        if needed > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if !current.is_empty() {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::{split_text, GttsEngine, GttsError, GttsParams, MAX_CHUNK_CHARS};

    #[test]
    fn short_text_is_one_chunk() {
        assert_eq!(split_text("  Hello   world. ", 100), vec!["Hello world."]);
    }

    #[test]
    fn chunks_respect_the_limit_and_keep_every_word() {
        let text = "The important result of this study is significant. ".repeat(12);
        let chunks = split_text(&text, MAX_CHUNK_CHARS);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chars().count() <= MAX_CHUNK_CHARS));
        assert_eq!(chunks.join(" "), text.trim());
    }

    #[test]
    fn overlong_words_are_cut() {
        let chunks = split_text("ab abcdefgh cd", 3);
        assert_eq!(chunks, vec!["ab", "abc", "def", "gh", "cd"]);
    }

    #[test]
    fn limit_counts_characters_not_bytes() {
        let chunks = split_text("ñññ ééé", 7);
        assert_eq!(chunks, vec!["ñññ ééé"]);
    }

    #[test]
    fn unsupported_language_fails_before_any_request() {
        let engine = GttsEngine::new("com").expect("client");
        let params = GttsParams {
            lang: "xx".to_string(),
            slow: false,
        };
        assert!(matches!(
            engine.speak("Hello", &params),
            Err(GttsError::UnsupportedLanguage(lang)) if lang == "xx"
        ));
    }

    #[test]
    fn blank_text_fails_before_any_request() {
        let engine = GttsEngine::new("com").expect("client");
        assert!(matches!(
            engine.speak("   ", &GttsParams::default()),
            Err(GttsError::EmptyText)
        ));
    }

    #[test]
    fn every_mapped_locale_is_supported() {
        for code in ["en", "hi", "te", "kn", "ml", "bn", "mr", "gu", "pa", "ur", "es", "fr", "de"] {
            assert!(GttsEngine::is_supported(code), "{code}");
        }
    }
}

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use ndarray::Array2;
use ort::execution_providers::CPUExecutionProvider;
use ort::inputs;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::TensorRef;

use super::phonemizer::{espeak_lang, phonemize, EspeakConfig};
use super::voices::VoiceStore;

/// Longest token sequence the model accepts, excluding the two pad tokens.
pub const MAX_PHONEME_LEN: usize = 510;

/// Style vector dimension for Kokoro.
pub const STYLE_DIM: usize = 256;

/// Output sample rate from the Kokoro model.
pub const SAMPLE_RATE: u32 = 24_000;

/// 10ms overlap when stitching chunk audio together.
const CROSSFADE_SAMPLES: usize = 240;

/// Marks that make a good place to cut an over-long token sequence.
const CHUNK_BREAKS: &[char] = &['.', '!', '?', ';', ':', ','];

const VOICES_FILE: &str = "voices-v1.0.bin";
const VOCAB_FILE: &str = "config.json";
const PREFERRED_ONNX: &str = "kokoro-quant-convinteger.onnx";

#[derive(thiserror::Error, Debug)]
pub enum KokoroError {
    #[error("ONNX runtime error: {0}")]
    Ort(#[from] ort::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
    #[error("Required model file missing: {}", .0.display())]
    MissingFile(PathBuf),
    #[error(
        "espeak-ng not found. Install: Linux: `sudo apt-get install espeak-ng`, \
         macOS: `brew install espeak-ng`, Windows: https://espeak-ng.org/download"
    )]
    EspeakNotFound,
    #[error("Phonemization failed: {0}")]
    PhonemizerFailed(String),
    #[error("Voice '{0}' not found")]
    VoiceNotFound(String),
    #[error("Locale '{0}' has no Kokoro voice")]
    UnsupportedLocale(String),
    #[error("Invalid config.json: {0}")]
    Vocab(String),
    #[error("Failed to parse voice file: {0}")]
    VoiceParse(String),
    #[error("Inference produced no output")]
    NoOutput,
}

/// A loaded Kokoro ONNX session with its voices and vocabulary.
pub struct KokoroModel {
    session: Session,
    voices: VoiceStore,
    vocab: HashMap<char, i64>,
    break_ids: Vec<i64>,
    /// "input_ids" or "tokens", depending on the export
    tokens_input: String,
    /// Newer exports take speed as int32, older ones as float32
    speed_is_int32: bool,
}

impl KokoroModel {
    /// Load the model files from `model_dir`.
    pub fn load(model_dir: &Path, num_threads: Option<usize>) -> Result<Self, KokoroError> {
        let onnx_path = find_onnx_file(model_dir)?;
        log::info!("Loading Kokoro model from {}", onnx_path.display());
        let session = open_session(&onnx_path, num_threads)?;

        let (tokens_input, speed_is_int32) = inspect_inputs(&session);
        log::debug!("Kokoro inputs: tokens='{tokens_input}', int32 speed={speed_is_int32}");

        let voices_path = model_dir.join(VOICES_FILE);
        if !voices_path.exists() {
            return Err(KokoroError::MissingFile(voices_path));
        }
        let voices = VoiceStore::load(&voices_path)?;

        let vocab_path = model_dir.join(VOCAB_FILE);
        if !vocab_path.exists() {
            return Err(KokoroError::MissingFile(vocab_path));
        }
        let vocab = load_vocab(&vocab_path)?;
        let break_ids = CHUNK_BREAKS
            .iter()
            .filter_map(|c| vocab.get(c).copied())
            .collect();

        Ok(Self {
            session,
            voices,
            vocab,
            break_ids,
            tokens_input,
            speed_is_int32,
        })
    }

    /// Synthesize `text` with `voice`, returning mono samples at [`SAMPLE_RATE`].
    pub fn synthesize_text(
        &mut self,
        text: &str,
        voice: &str,
        speed: f32,
        espeak: &EspeakConfig,
    ) -> Result<Vec<f32>, KokoroError> {
        if !self.voices.contains(voice) {
            return Err(KokoroError::VoiceNotFound(voice.to_string()));
        }

        let ids = phonemize(text, espeak_lang(voice), &self.vocab, espeak)?;
        if ids.is_empty() {
            log::warn!("No phoneme tokens produced for text: {text:?}");
            return Ok(Vec::new());
        }

        // One style row for the whole text keeps prosody steady across chunks.
        let style = self.voices.style(voice, ids.len())?;
        let chunks = split_at_breaks(&ids, &self.break_ids, MAX_PHONEME_LEN);
        log::debug!("Kokoro: {} tokens in {} chunks", ids.len(), chunks.len());

        let mut audio = Vec::with_capacity(ids.len() * 300);
        for chunk in chunks {
            let piece = self.infer(chunk, &style, speed)?;
            append_crossfaded(&mut audio, &piece, CROSSFADE_SAMPLES);
        }
        Ok(audio)
    }

    fn infer(
        &mut self,
        tokens: &[i64],
        style: &[f32; STYLE_DIM],
        speed: f32,
    ) -> Result<Vec<f32>, KokoroError> {
        // [[0, t1..tN, 0]]
        let mut padded = Vec::with_capacity(tokens.len() + 2);
        padded.push(0);
        padded.extend_from_slice(tokens);
        padded.push(0);
        let tokens_arr = Array2::from_shape_vec((1, padded.len()), padded)?;
        let style_view = ndarray::ArrayView2::from_shape((1, STYLE_DIM), style.as_slice())?;

        let outputs = if self.speed_is_int32 {
            let speed_arr = ndarray::arr1(&[speed.round() as i32]);
            let feed = inputs![
                self.tokens_input.as_str() => TensorRef::from_array_view(tokens_arr.view())?,
                "style" => TensorRef::from_array_view(style_view)?,
                "speed" => TensorRef::from_array_view(speed_arr.view())?,
            ];
            self.session.run(feed)?
        } else {
            let speed_arr = ndarray::arr1(&[speed]);
            let feed = inputs![
                self.tokens_input.as_str() => TensorRef::from_array_view(tokens_arr.view())?,
                "style" => TensorRef::from_array_view(style_view)?,
                "speed" => TensorRef::from_array_view(speed_arr.view())?,
            ];
            self.session.run(feed)?
        };

        let (_, waveform) = outputs.iter().next().ok_or(KokoroError::NoOutput)?;
        let waveform = waveform.try_extract_array::<f32>()?;
        Ok(waveform.iter().copied().collect())
    }

    pub fn list_voices(&self) -> Vec<&str> {
        self.voices.names()
    }
}

fn find_onnx_file(model_dir: &Path) -> Result<PathBuf, KokoroError> {
    let preferred = model_dir.join(PREFERRED_ONNX);
    if preferred.exists() {
        return Ok(preferred);
    }

    let mut candidates: Vec<PathBuf> = std::fs::read_dir(model_dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "onnx"))
        .collect();
    candidates.sort();
    candidates
        .into_iter()
        .next()
        .ok_or_else(|| KokoroError::MissingFile(model_dir.join("*.onnx")))
}

fn open_session(onnx_path: &Path, num_threads: Option<usize>) -> Result<Session, KokoroError> {
    let providers = vec![CPUExecutionProvider::default().build()];
    let mut builder = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_execution_providers(providers)?;

    if let Some(threads) = num_threads {
        builder = builder.with_intra_threads(threads)?;
    }

    Ok(builder.commit_from_file(onnx_path)?)
}

/// Returns the token input name and whether speed is fed as int32.
fn inspect_inputs(session: &Session) -> (String, bool) {
    let mut tokens_input = "input_ids".to_string();
    let mut speed_is_int32 = true;
    for input in session.inputs() {
        match input.name() {
            "input_ids" | "tokens" => tokens_input = input.name().to_string(),
            "speed" => {
                let dtype = format!("{:?}", input.dtype()).to_ascii_lowercase();
                speed_is_int32 = dtype.contains("int32");
            }
            _ => {}
        }
    }
    (tokens_input, speed_is_int32)
}

/// Read the `"vocab"` object of `config.json`: single characters to token ids.
fn load_vocab(path: &Path) -> Result<HashMap<char, i64>, KokoroError> {
    let content = std::fs::read_to_string(path)?;
    parse_vocab(&content)
}

fn parse_vocab(json: &str) -> Result<HashMap<char, i64>, KokoroError> {
    let value: serde_json::Value =
        serde_json::from_str(json).map_err(|e| KokoroError::Vocab(e.to_string()))?;
    let entries = value
        .get("vocab")
        .and_then(|v| v.as_object())
        .ok_or_else(|| KokoroError::Vocab("missing \"vocab\" object".to_string()))?;

    entries
        .iter()
        .map(|(key, id)| {
            let mut chars = key.chars();
            let ch = match (chars.next(), chars.next()) {
                (Some(ch), None) => ch,
                _ => return Err(KokoroError::Vocab(format!("key {key:?} is not one character"))),
            };
            let id = id
                .as_i64()
                .ok_or_else(|| KokoroError::Vocab(format!("id for {key:?} is not an integer")))?;
            Ok((ch, id))
        })
        .collect()
}

/// Cut `ids` into chunks of at most `max_len`, ending each chunk just after
/// the last break token when there is one.
fn split_at_breaks<'a>(ids: &'a [i64], break_ids: &[i64], max_len: usize) -> Vec<&'a [i64]> {
    let mut chunks = Vec::new();
    let mut rest = ids;
    while rest.len() > max_len {
        let cut = rest[..max_len]
            .iter()
            .rposition(|id| break_ids.contains(id))
            .map_or(max_len, |pos| pos + 1);
        let (head, tail) = rest.split_at(cut);
        chunks.push(head);
        rest = tail;
    }
    if !rest.is_empty() {
        chunks.push(rest);
    }
    chunks
}

/// Append `src` to `dst`, blending the first `overlap` samples of `src` with
/// the tail of `dst`.
fn append_crossfaded(dst: &mut Vec<f32>, src: &[f32], overlap: usize) {
    let overlap = overlap.min(dst.len()).min(src.len());
    let start = dst.len() - overlap;
    for (i, (out, &incoming)) in dst[start..].iter_mut().zip(src).enumerate() {
        let t = (i + 1) as f32 / (overlap + 1) as f32;
        *out = *out * (1.0 - t) + incoming * t;
    }
    dst.extend_from_slice(&src[overlap..]);
}

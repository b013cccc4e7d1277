//! Local neural speech with Kokoro-82M.
//!
//! The engine runs the Kokoro ONNX model through `ort` and phonemizes text
//! with espeak-ng. Loading takes seconds, so engines are shared through the
//! crate's [`EngineCache`](crate::EngineCache), one per model directory.
//!
//! # System Requirements
//!
//! **espeak-ng** must be installed (`apt-get install espeak-ng`,
//! `brew install espeak-ng`) or bundled and passed via [`EspeakConfig`].
//!
//! # Model Directory Layout
//!
//! ```text
//! models/kokoro/
//! ├── kokoro-quant-convinteger.onnx   # any *.onnx file is accepted
//! ├── voices-v1.0.bin                 # voice style archive (.npz)
//! └── config.json                     # phoneme vocabulary ("vocab" object)
//! ```
//!
//! # Locales
//!
//! | Locale | Voice | espeak-ng |
//! |---|---|---|
//! | `en` | `af_heart` | `en-us` |
//! | `es` | `ef_dora` | `es` |
//! | `fr` | `ff_siwis` | `fr` |
//! | `hi` | `hf_alpha` | `hi` |
//! | `it` | `if_sara` | `it` |
//! | `ja` | `jf_alpha` | `ja` |
//! | `pt` | `pf_dora` | `pt-br` |
//! | `zh` | `zf_xiaobei` | `cmn` |
//!
//! Other locales are rejected with [`KokoroError::UnsupportedLocale`].
//!
//! ```rust,no_run
//! use narrate_rs::{SynthesisEngine, engines::kokoro::{KokoroEngine, KokoroInferenceParams, KokoroModelParams}};
//! use std::path::Path;
//!
//! let mut engine = KokoroEngine::load(Path::new("models/kokoro"), KokoroModelParams::default())?;
//! let params = KokoroInferenceParams::for_locale("fr")?;
//! engine.synthesize_to_file("Bonjour tout le monde!", Path::new("out.wav"), Some(params))?;
//! # Ok::<(), Box<dyn std::error::Error + Send + Sync>>(())
//! ```

pub mod engine;
pub mod model;
pub mod phonemizer;
pub mod voices;

pub use engine::{KokoroEngine, KokoroInferenceParams, KokoroModelParams};
pub use model::KokoroError;
pub use phonemizer::EspeakConfig;

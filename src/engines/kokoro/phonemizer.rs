use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use super::model::KokoroError;

/// Location of the espeak-ng binary and its data directory.
///
/// Either field can be `None` to use the system default.
#[derive(Debug, Clone, Default)]
pub struct EspeakConfig {
    pub bin_path: Option<PathBuf>,
    pub data_path: Option<PathBuf>,
}

impl EspeakConfig {
    fn command(&self) -> Command {
        let program = self
            .bin_path
            .as_deref()
            .unwrap_or_else(|| Path::new("espeak-ng"));
        let mut cmd = Command::new(program);
        if let Some(data) = &self.data_path {
            cmd.env("ESPEAK_DATA_PATH", data);
        }
        cmd
    }

    /// Whether the configured espeak-ng can be executed.
    pub fn is_available(&self) -> bool {
        self.command()
            .arg("--version")
            .output()
            .is_ok_and(|out| out.status.success())
    }

    /// Phonemize each line of `lines` to IPA, one output line per input line.
    pub fn to_ipa(&self, lines: &[&str], lang: &str) -> Result<Vec<String>, KokoroError> {
        let output = self.run(&lines.join("\n"), lang)?;
        let ipa: Vec<String> = output.lines().map(str::to_string).collect();
        if ipa.len() == lines.len() {
            return Ok(ipa);
        }

        // espeak-ng occasionally merges or splits lines; redo them one by one.
        log::debug!(
            "espeak-ng returned {} lines for {}, phonemizing individually",
            ipa.len(),
            lines.len()
        );
        lines
            .iter()
            .map(|line| Ok(self.run(line, lang)?.lines().collect::<Vec<_>>().join(" ")))
            .collect()
    }

    fn run(&self, input: &str, lang: &str) -> Result<String, KokoroError> {
        let mut child = self
            .command()
            .args(["--ipa", "--stdin", "-q", "-v", lang])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => KokoroError::EspeakNotFound,
                _ => KokoroError::Io(e),
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            // Without a trailing newline espeak-ng drops the end of the last line.
            stdin.write_all(input.as_bytes())?;
            if !input.ends_with('\n') {
                stdin.write_all(b"\n")?;
            }
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(KokoroError::PhonemizerFailed(format!(
                "espeak-ng exited with {:?}: {}",
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// espeak-ng language for a Kokoro voice, from its two-letter prefix.
pub fn espeak_lang(voice: &str) -> &'static str {
    match voice.get(..2).unwrap_or("") {
        "af" | "am" => "en-us",
        "bf" | "bm" => "en-gb",
        "ef" | "em" => "es",
        "ff" => "fr",
        "hf" | "hm" => "hi",
        "if" | "im" => "it",
        "jf" | "jm" => "ja",
        "pf" | "pm" => "pt-br",
        "zf" | "zm" => "cmn",
        _ => "en-us",
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Words(String),
    Mark(char),
}

/// Convert `text` to Kokoro token ids.
///
/// Word runs go through espeak-ng in a single batch; punctuation is mapped
/// straight to its token so pauses survive. Characters missing from `vocab`
/// are dropped.
pub fn phonemize(
    text: &str,
    lang: &str,
    vocab: &HashMap<char, i64>,
    espeak: &EspeakConfig,
) -> Result<Vec<i64>, KokoroError> {
    let pieces = segment(text);
    let word_runs: Vec<&str> = pieces
        .iter()
        .filter_map(|p| match p {
            Piece::Words(w) => Some(w.as_str()),
            Piece::Mark(_) => None,
        })
        .collect();

    let mut ipa = if word_runs.is_empty() {
        Vec::new()
    } else {
        espeak.to_ipa(&word_runs, lang)?
    }
    .into_iter();

    let mut ids = Vec::new();
    for piece in &pieces {
        match piece {
            Piece::Words(_) => {
                if let Some(line) = ipa.next() {
                    ids.extend(ipa_ids(&line, vocab));
                }
            }
            Piece::Mark(mark) => ids.extend(vocab.get(mark).copied()),
        }
    }
    Ok(ids)
}

/// Split text into word runs and punctuation marks.
///
/// Line breaks count as full stops. `.` and `,` between digits stay inside
/// the word run so numbers like `2.5` and `1,000` are read whole.
fn segment(text: &str) -> Vec<Piece> {
    let chars: Vec<char> = text.chars().collect();
    let mut pieces = Vec::new();
    let mut words = String::new();

    for (i, &ch) in chars.iter().enumerate() {
        let numeric_separator = matches!(ch, '.' | ',')
            && i > 0
            && chars[i - 1].is_ascii_digit()
            && chars.get(i + 1).is_some_and(char::is_ascii_digit);

        match pause_mark(ch) {
            Some(mark) if !numeric_separator => {
                flush_words(&mut pieces, &mut words);
                pieces.push(Piece::Mark(mark));
            }
            _ if ch.is_whitespace() => {
                if !words.is_empty() && !words.ends_with(' ') {
                    words.push(' ');
                }
            }
            _ => words.push(ch),
        }
    }
    flush_words(&mut pieces, &mut words);
    pieces
}

fn pause_mark(ch: char) -> Option<char> {
    match ch {
        '\n' | '\r' => Some('.'),
        '.' | '!' | '?' | ',' | ';' | ':' | '—' | '…' | '"' | '(' | ')' | '\u{201c}' | '\u{201d}' => {
            Some(ch)
        }
        _ => None,
    }
}

fn flush_words(pieces: &mut Vec<Piece>, words: &mut String) {
    let trimmed = words.trim();
    if !trimmed.is_empty() {
        pieces.push(Piece::Words(trimmed.to_string()));
    }
    words.clear();
}

fn ipa_ids<'a>(ipa: &'a str, vocab: &'a HashMap<char, i64>) -> impl Iterator<Item = i64> + 'a {
    ipa.trim()
        .chars()
        .filter(|&c| c != '_')
        .filter_map(|c| vocab.get(&c).copied())
}

#[cfg(test)]
mod tests {
    use super::{espeak_lang, ipa_ids, phonemize, segment, EspeakConfig, Piece};
    use std::collections::HashMap;

    fn words(s: &str) -> Piece {
        Piece::Words(s.to_string())
    }

    #[test]
    fn separates_words_from_pauses() {
        assert_eq!(
            segment("Hey there! I’ll tell you:\nmain points."),
            vec![
                words("Hey there"),
                Piece::Mark('!'),
                words("I’ll tell you"),
                Piece::Mark(':'),
                Piece::Mark('.'),
                words("main points"),
                Piece::Mark('.'),
            ]
        );
    }

    #[test]
    fn numbers_keep_their_separators() {
        assert_eq!(
            segment("Scores rose 2.5 points, to 1,000."),
            vec![
                words("Scores rose 2.5 points"),
                Piece::Mark(','),
                words("to 1,000"),
                Piece::Mark('.'),
            ]
        );
    }

    #[test]
    fn voice_prefix_selects_language() {
        assert_eq!(espeak_lang("ff_siwis"), "fr");
        assert_eq!(espeak_lang("zf_xiaobei"), "cmn");
        assert_eq!(espeak_lang("x"), "en-us");
    }

    #[test]
    fn ipa_ids_skip_unknown_and_word_joiners() {
        let vocab: HashMap<char, i64> = [('h', 50), ('ə', 83), ('l', 54)].into_iter().collect();
        let ids: Vec<i64> = ipa_ids(" hə_lˈoʊ ", &vocab).collect();
        assert_eq!(ids, vec![50, 83, 54]);
    }

    #[test]
    fn punctuation_only_text_needs_no_espeak() {
        let vocab: HashMap<char, i64> = [('.', 4), ('!', 5)].into_iter().collect();
        let espeak = EspeakConfig {
            bin_path: Some("/nonexistent/espeak-ng".into()),
            data_path: None,
        };
        assert_eq!(phonemize("!.", "en-us", &vocab, &espeak).unwrap(), vec![5, 4]);
    }

    #[test]
    fn espeak_batches_one_line_per_run() {
        let espeak = EspeakConfig::default();
        if !espeak.is_available() {
            return;
        }

        let ipa = espeak
            .to_ipa(&["hello", "America"], "en-us")
            .expect("espeak should succeed");
        assert_eq!(ipa.len(), 2);
        assert!(ipa[1].trim_end().ends_with('ə'), "terminal schwa kept: {ipa:?}");
    }
}

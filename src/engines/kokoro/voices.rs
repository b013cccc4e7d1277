use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use super::model::{KokoroError, STYLE_DIM};

const NPY_MAGIC: &[u8] = b"\x93NUMPY";

type StyleRow = [f32; STYLE_DIM];

/// Style vectors for every voice in a `voices-*.bin` archive.
///
/// Each voice holds one row per phoneme-sequence length; the row matching
/// the input length is used as the style for that utterance.
pub struct VoiceStore {
    voices: HashMap<String, Vec<StyleRow>>,
}

impl VoiceStore {
    /// Load a numpy `.npz` archive whose entries are `<voice>.npy` arrays of
    /// shape `[N, 256]` (or `[N, 1, 256]`), float32 little-endian.
    pub fn load(path: &Path) -> Result<Self, KokoroError> {
        Self::from_reader(File::open(path)?)
    }

    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self, KokoroError> {
        let mut archive = zip::ZipArchive::new(reader)
            .map_err(|e| KokoroError::VoiceParse(format!("not an npz archive: {e}")))?;

        let mut voices = HashMap::new();
        for i in 0..archive.len() {
            let mut entry = archive
                .by_index(i)
                .map_err(|e| KokoroError::VoiceParse(format!("entry {i}: {e}")))?;
            if entry.is_dir() {
                continue;
            }

            let entry_name = entry.name().to_string();
            let Some(voice) = entry_name.strip_suffix(".npy").filter(|v| !v.is_empty()) else {
                continue;
            };

            let mut data = Vec::with_capacity(entry.size() as usize);
            entry
                .read_to_end(&mut data)
                .map_err(|e| KokoroError::VoiceParse(format!("{entry_name}: {e}")))?;
            voices.insert(voice.to_string(), parse_npy_rows(&data, &entry_name)?);
        }

        log::info!("Loaded {} voices", voices.len());
        Ok(Self { voices })
    }

    pub fn contains(&self, voice: &str) -> bool {
        self.voices.contains_key(voice)
    }

    /// Style row for `voice` at `index`, clamped to the last row.
    pub fn style(&self, voice: &str, index: usize) -> Result<StyleRow, KokoroError> {
        let rows = self
            .voices
            .get(voice)
            .ok_or_else(|| KokoroError::VoiceNotFound(voice.to_string()))?;
        let last = rows
            .len()
            .checked_sub(1)
            .ok_or_else(|| KokoroError::VoiceParse(format!("{voice}: no style rows")))?;
        Ok(rows[index.min(last)])
    }

    /// Voice names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.voices.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Decode an `.npy` payload into 256-float rows.
fn parse_npy_rows(data: &[u8], name: &str) -> Result<Vec<StyleRow>, KokoroError> {
    let bad = |msg: String| KokoroError::VoiceParse(format!("{name}: {msg}"));

    if data.len() < 10 || !data.starts_with(NPY_MAGIC) {
        return Err(bad("not an .npy array".to_string()));
    }
    // v1 headers use a u16 length at [8..10], v2+ a u32 at [8..12]
    let (header_len, prefix_len) = if data[6] == 1 {
        (u16::from_le_bytes([data[8], data[9]]) as usize, 10)
    } else if data.len() >= 12 {
        (u32::from_le_bytes([data[8], data[9], data[10], data[11]]) as usize, 12)
    } else {
        return Err(bad("truncated header".to_string()));
    };

    let payload = data
        .get(prefix_len + header_len..)
        .ok_or_else(|| bad("truncated header".to_string()))?;
    if payload.len() % (4 * STYLE_DIM) != 0 {
        return Err(bad(format!(
            "{} payload bytes is not a whole number of {STYLE_DIM}-float rows",
            payload.len()
        )));
    }

    Ok(payload
        .chunks_exact(4 * STYLE_DIM)
        .map(|row_bytes| {
            let mut row = [0f32; STYLE_DIM];
            for (slot, bytes) in row.iter_mut().zip(row_bytes.chunks_exact(4)) {
                *slot = f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
            }
            row
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::{parse_npy_rows, VoiceStore, STYLE_DIM};
    use crate::engines::kokoro::KokoroError;
    use std::io::{Cursor, Write};

    fn npy(rows: usize) -> Vec<u8> {
        let header = format!(
            "{{'descr': '<f4', 'fortran_order': False, 'shape': ({rows}, 1, {STYLE_DIM}), }}\n"
        );
        let mut data = b"\x93NUMPY\x01\x00".to_vec();
        data.extend_from_slice(&(header.len() as u16).to_le_bytes());
        data.extend_from_slice(header.as_bytes());
        for r in 0..rows {
            for _ in 0..STYLE_DIM {
                data.extend_from_slice(&(r as f32).to_le_bytes());
            }
        }
        data
    }

    #[test]
    fn reads_rows_from_npy() {
        let rows = parse_npy_rows(&npy(3), "af_heart.npy").expect("parse");
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2][0], 2.0);
        assert_eq!(rows[2][STYLE_DIM - 1], 2.0);
    }

    #[test]
    fn rejects_partial_rows() {
        let mut data = npy(1);
        data.pop();
        assert!(matches!(
            parse_npy_rows(&data, "x.npy"),
            Err(KokoroError::VoiceParse(_))
        ));
        assert!(parse_npy_rows(b"PK\x03\x04", "x.npy").is_err());
    }

    #[test]
    fn store_clamps_style_index_and_lists_names() {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, rows) in [("bf_emma.npy", 2), ("af_heart.npy", 4)] {
            writer
                .start_file(name, zip::write::SimpleFileOptions::default())
                .unwrap();
            writer.write_all(&npy(rows)).unwrap();
        }
        let archive = writer.finish().unwrap();

        let store = VoiceStore::from_reader(archive).expect("load store");
        assert_eq!(store.names(), vec!["af_heart", "bf_emma"]);
        assert_eq!(store.style("bf_emma", 99).unwrap()[0], 1.0);
        assert_eq!(store.style("af_heart", 2).unwrap()[0], 2.0);
        assert!(matches!(
            store.style("zz_nobody", 0),
            Err(KokoroError::VoiceNotFound(_))
        ));
    }
}

//! Conversational framing and language flavor.
//!
//! A [`StyleTable`] maps a language label to an intro/outro pair, optional
//! whole-word substitutions and an optional closing phrase. The table is
//! plain data (serde), compiled once into a [`Humanizer`].

use std::collections::BTreeMap;

use regex::{NoExpand, Regex};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A case-insensitive whole-word replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Substitution {
    pub word: String,
    pub replacement: String,
}

impl Substitution {
    pub fn new(word: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            replacement: replacement.into(),
        }
    }
}

/// Framing and flavor rules for one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleProfile {
    pub intro: String,
    pub outro: String,
    #[serde(default)]
    pub substitutions: Vec<Substitution>,
    /// Colloquial closing phrase appended after the outro.
    #[serde(default)]
    pub flavor: Option<String>,
}

impl StyleProfile {
    pub fn new(intro: impl Into<String>, outro: impl Into<String>) -> Self {
        Self {
            intro: intro.into(),
            outro: outro.into(),
            substitutions: Vec::new(),
            flavor: None,
        }
    }

    pub fn with_flavor(mut self, substitutions: Vec<Substitution>, flavor: &str) -> Self {
        self.substitutions = substitutions;
        self.flavor = Some(flavor.to_string());
        self
    }
}

/// Language label to [`StyleProfile`], with a default for unknown labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleTable {
    pub default_language: String,
    pub profiles: BTreeMap<String, StyleProfile>,
}

impl Default for StyleTable {
    fn default() -> Self {
        let profiles = [
            (
                "English",
                StyleProfile::new(
                    "Hey there! I’ll tell you the main points: ",
                    "And that’s the main idea — hope it helps!",
                ),
            ),
            (
                "Tamil",
                StyleProfile::new(
                    "Hey da! Ippo naan unga kitte short-a sollren: ",
                    "Idha dha main idea da 😄 Ippo unakku purinjurukkum la da?",
                )
                .with_flavor(
                    vec![Substitution::new("important", "mukkiyam")],
                    "😄 Ippo unakku purinjurukkum la da?",
                ),
            ),
            (
                "Hindi",
                StyleProfile::new(
                    "Arre yaar! Sun, main tujhe short mein batata hoon: ",
                    "Bas yehi main idea tha bhai 😄",
                )
                .with_flavor(
                    vec![Substitution::new("important", "bahut zaroori")],
                    "😄 Samjha na?",
                ),
            ),
            (
                "Spanish",
                StyleProfile::new("¡Oye! Te cuento rápido: ", "¡Y eso es todo, amigo!").with_flavor(
                    vec![Substitution::new("important", "importante")],
                    "😄 ¡Espero que te guste!",
                ),
            ),
            (
                "French",
                StyleProfile::new(
                    "Salut! Voici les points principaux: ",
                    "Et voilà l'idée principale 😄",
                ),
            ),
            (
                "German",
                StyleProfile::new(
                    "Hey! Ich erzähle dir die Hauptpunkte: ",
                    "Das war die Hauptidee 😄",
                ),
            ),
        ];

        Self {
            default_language: "English".to_string(),
            profiles: profiles
                .into_iter()
                .map(|(label, profile)| (label.to_string(), profile))
                .collect(),
        }
    }
}

struct CompiledProfile {
    profile: StyleProfile,
    rules: Vec<(Regex, String)>,
}

impl CompiledProfile {
    fn compile(profile: StyleProfile) -> Result<Self> {
        let rules = profile
            .substitutions
            .iter()
            .map(|sub| {
                let pattern = format!(r"(?i)\b{}\b", regex::escape(&sub.word));
                Regex::new(&pattern)
                    .map(|re| (re, sub.replacement.clone()))
                    .map_err(|e| Error::Config(format!("substitution {:?}: {e}", sub.word)))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { profile, rules })
    }
}

/// Applies a compiled [`StyleTable`] to summaries.
pub struct Humanizer {
    entries: Vec<CompiledProfile>,
    by_language: BTreeMap<String, usize>,
    default_index: usize,
}

impl Humanizer {
    /// Compile `table`. Fails if the default language has no profile or a
    /// substitution cannot be compiled.
    pub fn new(table: StyleTable) -> Result<Self> {
        let mut entries = Vec::with_capacity(table.profiles.len());
        let mut by_language = BTreeMap::new();
        for (label, profile) in table.profiles {
            by_language.insert(label, entries.len());
            entries.push(CompiledProfile::compile(profile)?);
        }

        let default_index = *by_language.get(&table.default_language).ok_or_else(|| {
            Error::Config(format!(
                "default language {:?} has no style profile",
                table.default_language
            ))
        })?;

        Ok(Self {
            entries,
            by_language,
            default_index,
        })
    }

    /// The profile used for `language`, falling back to the default.
    pub fn profile(&self, language: &str) -> &StyleProfile {
        &self.compiled(language).profile
    }

    /// Frame `summary` for `language` and apply its flavor rules.
    ///
    /// Unknown languages get the default framing and no flavor. Never fails.
    pub fn humanize(&self, summary: &str, language: &str) -> String {
        let compiled = self.compiled(language);
        let profile = &compiled.profile;

        let mut text = format!("{}{} {}", profile.intro, summary, profile.outro);
        for (pattern, replacement) in &compiled.rules {
            text = pattern
                .replace_all(&text, NoExpand(replacement.as_str()))
                .into_owned();
        }
        if let Some(flavor) = &profile.flavor {
            text.push(' ');
            text.push_str(flavor);
        }
        text
    }

    fn compiled(&self, language: &str) -> &CompiledProfile {
        let index = self
            .by_language
            .get(language)
            .copied()
            .unwrap_or(self.default_index);
        &self.entries[index]
    }
}

impl Default for Humanizer {
    fn default() -> Self {
        Self::new(StyleTable::default()).expect("built-in style table is valid")
    }
}

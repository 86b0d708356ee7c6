//! Tokenization, lemmatization and stop-word lookup.
//!
//! The [`LinguisticModel`] is built once at startup and is read-only
//! afterwards; share it behind an `Arc` between normalizers.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::error::{Error, Result};

/// Embedded French stop-word list.
const FRENCH_STOP_WORDS: &str = include_str!("../../resources/fr/stop_words.txt");

/// Embedded French lemma lexicon.
const FRENCH_LEMMAS: &str = include_str!("../../resources/fr/lemmas.tsv");

/// File names expected by [`LinguisticModel::load_dir`].
pub const STOP_WORDS_FILE: &str = "stop_words.txt";
pub const LEMMAS_FILE: &str = "lemmas.tsv";

/// Elided article or pronoun, a word (letters, digits, underscore, marks,
/// with internal hyphens), or any other single non-space character.
const TOKEN_PATTERN: &str =
    r"(?:jusqu|lorsqu|puisqu|qu|[cdjlmnst])'|[\p{L}\p{M}\p{N}_]+(?:-[\p{L}\p{M}\p{N}_]+)*|\S";

/// One token produced by a [`Tokenizer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Surface form as it appears in the text
    pub text: String,
    /// Dictionary form
    pub lemma: String,
    /// True when the token has no letter, digit or underscore
    pub is_punct: bool,
    /// True when the lemma is a stop word
    pub is_stop: bool,
}

/// Splits text into lemmatized tokens.
pub trait Tokenizer: Send + Sync {
    /// Tokenize lower-cased text.
    fn tokenize(&self, text: &str) -> Vec<Token>;

    /// Whether a lemma is in the stop-word table.
    fn is_stop_word(&self, lemma: &str) -> bool;
}

/// Rule- and lexicon-based French tokenizer and lemmatizer.
#[derive(Debug, Clone)]
pub struct LinguisticModel {
    token_pattern: Regex,
    lexicon: HashMap<String, String>,
    stop_words: HashSet<String>,
}

impl LinguisticModel {
    /// Build the model from the embedded French resources.
    pub fn french() -> Result<Self> {
        Self::from_sources(FRENCH_STOP_WORDS, FRENCH_LEMMAS)
    }

    /// Load `stop_words.txt` and `lemmas.tsv` from a directory.
    pub fn load_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let read = |name: &str| {
            let path = dir.join(name);
            fs::read_to_string(&path)
                .map_err(|e| Error::LinguisticInit(format!("{}: {}", path.display(), e)))
        };
        let stop_words = read(STOP_WORDS_FILE)?;
        let lemmas = read(LEMMAS_FILE)?;
        let model = Self::from_sources(&stop_words, &lemmas)?;
        log::info!(
            "Loaded linguistic model from {} ({} lemmas, {} stop words)",
            dir.display(),
            model.lexicon.len(),
            model.stop_words.len()
        );
        Ok(model)
    }

    /// Build the model from the text of a stop-word list and a lexicon.
    ///
    /// Lines starting with `#` and blank lines are ignored in both. Lexicon
    /// lines are `form<TAB>lemma`; every lemma must map to itself.
    pub fn from_sources(stop_words: &str, lemmas: &str) -> Result<Self> {
        let token_pattern =
            Regex::new(TOKEN_PATTERN).map_err(|e| Error::LinguisticInit(e.to_string()))?;

        let stop_words: HashSet<String> = content_lines(stop_words)
            .map(|(_, line)| nfc(line))
            .collect();
        if stop_words.is_empty() {
            return Err(Error::LinguisticInit("stop-word list is empty".to_string()));
        }

        let mut lexicon = HashMap::new();
        for (number, line) in content_lines(lemmas) {
            let (form, lemma) = line.split_once('\t').ok_or_else(|| {
                Error::LinguisticInit(format!("lexicon line {}: expected form<TAB>lemma", number))
            })?;
            let (form, lemma) = (nfc(form.trim()), nfc(lemma.trim()));
            if form.is_empty() || lemma.is_empty() {
                return Err(Error::LinguisticInit(format!(
                    "lexicon line {}: empty form or lemma",
                    number
                )));
            }
            lexicon.insert(form, lemma);
        }

        // Lemmas are their own lemma, so lemmatizing twice changes nothing.
        let lemmas: Vec<String> = lexicon.values().cloned().collect();
        for lemma in lemmas {
            let mapped = lexicon.entry(lemma.clone()).or_insert_with(|| lemma.clone());
            if *mapped != lemma {
                return Err(Error::LinguisticInit(format!(
                    "lemma '{}' maps to '{}'",
                    lemma, mapped
                )));
            }
        }

        Ok(Self {
            token_pattern,
            lexicon,
            stop_words,
        })
    }

    /// Dictionary form of a lower-cased word.
    ///
    /// Lexicon entries win; a surface stop word is its own lemma; otherwise
    /// light plural rules apply (`-aux` → `-al`, final `-s` dropped unless
    /// preceded by `s`, `u` or `i`) until nothing changes. Hyphenated
    /// compounds take the plural rules part by part.
    pub fn lemmatize(&self, word: &str) -> String {
        let word = nfc(word);
        if let Some(lemma) = self.lexicon.get(&word) {
            return lemma.clone();
        }
        if self.stop_words.contains(&word) {
            return word;
        }
        if word.contains('-') {
            return word
                .split('-')
                .map(|part| self.lemmatize_part(part))
                .collect::<Vec<_>>()
                .join("-");
        }
        if !word.chars().all(char::is_alphabetic) {
            return word;
        }
        self.strip_plurals(word)
    }

    /// One part of a compound. Known lemmas and stop words stay; inflected
    /// lexicon forms are not expanded, so `est-ouest` keeps its `est`.
    fn lemmatize_part(&self, part: &str) -> String {
        let is_lemma = self.lexicon.get(part).is_some_and(|lemma| lemma == part);
        if part.is_empty()
            || is_lemma
            || self.stop_words.contains(part)
            || !part.chars().all(char::is_alphabetic)
        {
            return part.to_string();
        }
        self.strip_plurals(part.to_string())
    }

    fn strip_plurals(&self, word: String) -> String {
        let mut lemma = word;
        while let Some(next) = strip_plural(&lemma) {
            if let Some(known) = self.lexicon.get(&next) {
                return known.clone();
            }
            if self.stop_words.contains(&next) {
                return next;
            }
            lemma = next;
        }
        lemma
    }

    /// Number of lexicon entries, identity entries included.
    pub fn lexicon_len(&self) -> usize {
        self.lexicon.len()
    }

    /// Number of stop words.
    pub fn stop_word_count(&self) -> usize {
        self.stop_words.len()
    }
}

impl Tokenizer for LinguisticModel {
    fn tokenize(&self, text: &str) -> Vec<Token> {
        self.token_pattern
            .find_iter(text)
            .map(|m| {
                let surface = m.as_str();
                let is_punct = !surface.chars().any(|c| c.is_alphanumeric() || c == '_');
                let lemma = if is_punct {
                    surface.to_string()
                } else {
                    self.lemmatize(surface)
                };
                let is_stop = self.is_stop_word(&lemma);
                Token {
                    text: surface.to_string(),
                    lemma,
                    is_punct,
                    is_stop,
                }
            })
            .collect()
    }

    fn is_stop_word(&self, lemma: &str) -> bool {
        self.stop_words.contains(lemma)
    }
}

/// One plural rule step, or `None` when no rule applies.
fn strip_plural(word: &str) -> Option<String> {
    let chars: Vec<char> = word.chars().collect();
    let n = chars.len();
    if n > 4 && word.ends_with("aux") {
        return Some(format!("{}al", &word[..word.len() - 3]));
    }
    if n > 3 && chars[n - 1] == 's' && !matches!(chars[n - 2], 's' | 'u' | 'i') {
        return Some(chars[..n - 1].iter().collect());
    }
    None
}

fn nfc(s: &str) -> String {
    s.nfc().collect()
}

/// Non-blank, non-comment lines with their 1-based line numbers.
fn content_lines(src: &str) -> impl Iterator<Item = (usize, &str)> {
    src.lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim_end_matches('\r')))
        .filter(|(_, line)| !line.trim().is_empty() && !line.trim_start().starts_with('#'))
}

//! Text normalization for indexing.
//!
//! Turns extracted page text into a lower-cased sequence of lemmas with
//! stop words and punctuation removed. The output is meant for a retrieval
//! index, not for display.

pub mod linguistic;

use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::error::Result;

pub use linguistic::{LinguisticModel, Token, Tokenizer};

/// Fixed normalization pipeline around a shared [`Tokenizer`].
///
/// Clones share the tokenizer.
#[derive(Clone)]
pub struct TextNormalizer {
    tokenizer: Arc<dyn Tokenizer>,
    whitespace_regex: Regex,
    newline_regex: Regex,
    disallowed_regex: Regex,
    space_before_punct_regex: Regex,
    space_after_punct_regex: Regex,
    double_space_regex: Regex,
}

impl TextNormalizer {
    /// Create a normalizer around an initialized tokenizer.
    pub fn new(tokenizer: Arc<dyn Tokenizer>) -> Self {
        Self {
            tokenizer,
            whitespace_regex: Regex::new(r"\s+").unwrap(),
            newline_regex: Regex::new(r"\n+").unwrap(),
            disallowed_regex: Regex::new(r#"[^\w\s.,;:!?()\[\]'"\-]"#).unwrap(),
            space_before_punct_regex: Regex::new(r"\s+([.,;:!?])").unwrap(),
            space_after_punct_regex: Regex::new(r"([.,;:!?])\s+").unwrap(),
            double_space_regex: Regex::new(r"\s{2,}").unwrap(),
        }
    }

    /// Normalizer backed by the embedded French model.
    pub fn french() -> Result<Self> {
        Ok(Self::new(Arc::new(LinguisticModel::french()?)))
    }

    /// The tokenizer this normalizer delegates to.
    pub fn tokenizer(&self) -> &Arc<dyn Tokenizer> {
        &self.tokenizer
    }

    /// Character-level cleanup: whitespace, allowed characters, punctuation
    /// spacing, lower-casing.
    pub fn clean(&self, text: &str) -> String {
        // Stage 1: whitespace runs (newlines included)
        let mut result = self.whitespace_regex.replace_all(text, " ").into_owned();
        result = self.newline_regex.replace_all(&result, "\n").into_owned();

        // Stage 2: characters outside the allowed set
        result = self.disallowed_regex.replace_all(&result, "").into_owned();

        // Stage 3: punctuation spacing
        result = self
            .space_before_punct_regex
            .replace_all(&result, "$1")
            .into_owned();
        result = self
            .space_after_punct_regex
            .replace_all(&result, "${1} ")
            .into_owned();
        result = self.double_space_regex.replace_all(&result, " ").into_owned();

        result.to_lowercase()
    }

    /// Full pipeline: [`clean`](Self::clean), then keep the lemmas of tokens
    /// that are neither punctuation nor stop words.
    pub fn normalize(&self, text: &str) -> String {
        let cleaned = self.clean(text);
        let lemmas: Vec<String> = self
            .tokenizer
            .tokenize(&cleaned)
            .into_iter()
            .filter(|token| !token.is_punct && !token.is_stop)
            .map(|token| token.lemma)
            .collect();
        lemmas.join(" ").trim().to_string()
    }
}

impl fmt::Debug for TextNormalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextNormalizer").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> TextNormalizer {
        TextNormalizer::french().unwrap()
    }

    #[test]
    fn test_clean_whitespace_and_punctuation() {
        let n = normalizer();
        assert_eq!(n.clean("Bail   commercial ,\n\n conclu ."), "bail commercial, conclu.");
        assert_eq!(n.clean("Article 3:le preneur"), "article 3:le preneur");
        assert_eq!(n.clean("a ;  b"), "a; b");
    }

    #[test]
    fn test_clean_removes_disallowed_characters() {
        let n = normalizer();
        assert_eq!(n.clean("Prix : 100 € / mois"), "prix: 100 mois");
        assert_eq!(n.clean("§ 2 – « clause »"), " 2 clause ");
        assert_eq!(n.clean("(art. [12])"), "(art. [12])");
    }

    #[test]
    fn test_normalize_sentence() {
        let n = normalizer();
        assert_eq!(
            n.normalize("Le Contrat de bail est conclu pour une durée de neuf ans."),
            "contrat bail conclure durée an"
        );
        assert_eq!(
            n.normalize(
                "L'article 1134 du Code civil dispose que les conventions \
                 légalement formées tiennent lieu de loi."
            ),
            "article 1134 code civil disposer convention légalement former tenir lieu loi"
        );
    }

    #[test]
    fn test_normalize_output_has_no_uppercase_or_stop_words() {
        let n = normalizer();
        let out = n.normalize("LES PARTIES CONVIENNENT DE CE QUI SUIT : Le Bailleur loue au Preneur.");
        assert!(!out.chars().any(char::is_uppercase));
        for word in out.split(' ') {
            assert!(!n.tokenizer().is_stop_word(word), "stop word {} in {}", word, out);
        }
    }

    /// Flags stop words on the token only; the table lookup knows nothing.
    struct FlaggingTokenizer;

    impl Tokenizer for FlaggingTokenizer {
        fn tokenize(&self, text: &str) -> Vec<Token> {
            text.split_whitespace()
                .map(|word| Token {
                    text: word.to_string(),
                    lemma: word.to_string(),
                    is_punct: false,
                    is_stop: word.len() <= 2,
                })
                .collect()
        }

        fn is_stop_word(&self, _lemma: &str) -> bool {
            false
        }
    }

    #[test]
    fn test_normalize_honors_token_stop_flag() {
        let n = TextNormalizer::new(Arc::new(FlaggingTokenizer));
        assert_eq!(n.normalize("le bail de la location"), "bail location");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let n = normalizer();
        let inputs = [
            "Le Contrat de bail est conclu pour une durée de neuf ans.",
            "Les travaux seront à la charge du preneur; les baux commerciaux sont régis par le Code.",
            "Article 12 - Résiliation : le contrat pourra être résilié de plein droit.",
            "   ",
            "",
        ];
        for input in inputs {
            let once = n.normalize(input);
            assert_eq!(n.normalize(&once), once, "input: {}", input);
        }
    }

    #[test]
    fn test_normalize_empty_and_punctuation_only() {
        let n = normalizer();
        assert_eq!(n.normalize(""), "");
        assert_eq!(n.normalize(" \n\t "), "");
        assert_eq!(n.normalize("... ; ! ?"), "");
    }

    #[test]
    fn test_normalize_collapses_column_gap() {
        let n = normalizer();
        assert_eq!(
            n.normalize("Bailleur      Preneur"),
            n.normalize("Bailleur Preneur")
        );
    }
}

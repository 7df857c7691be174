//! Heading detection over extracted blocks.

use std::sync::Arc;

use regex::Regex;
use tracing::debug;

use crate::config::HeadingRules;
use crate::keyphrases::KeyPhraseExtractor;
use crate::types::TextBlock;

/// Decides whether a block functions as a structural heading.
///
/// Detection is an ordered predicate chain returning at the first hit:
/// role metadata, then the surface patterns (uppercase line, numbered
/// section, chapter prefix, short colon-terminated line), and finally a
/// key-phrase lookup for short title-like lines none of the patterns catch.
/// The lookup is fail-open: any collaborator error classifies the block as
/// not a heading.
pub struct HeadingDetector {
    rules: HeadingRules,
    uppercase: Regex,
    numbered: Regex,
    chapter: Regex,
    colon: Regex,
    extractor: Arc<dyn KeyPhraseExtractor>,
}

impl HeadingDetector {
    pub fn new(rules: HeadingRules, extractor: Arc<dyn KeyPhraseExtractor>) -> Self {
        let uppercase = Regex::new(&format!(
            r"^[A-ZÁÉÍÓÚÑ\s]{{{},}}$",
            rules.uppercase_min_len
        ))
        .expect("uppercase heading pattern is valid");
        let numbered = Regex::new(r"^\d+(?:\.\d+)*\s").expect("section pattern is valid");
        let chapter =
            Regex::new(r"(?i)^(?:cap[ií]tulo|chapter)\s+\d+").expect("chapter pattern is valid");
        let colon = Regex::new(&format!(r"^.{{1,{}}}:$", rules.colon_max_len))
            .expect("colon pattern is valid");
        Self {
            rules,
            uppercase,
            numbered,
            chapter,
            colon,
            extractor,
        }
    }

    /// Classifies one block. Role metadata always wins; pattern rules are
    /// OR'd, so a block matching several still counts once.
    pub async fn is_heading(&self, block: &TextBlock) -> bool {
        if block.has_heading_role() {
            return true;
        }
        let text = block.content.as_str();
        if self.uppercase.is_match(text)
            || self.numbered.is_match(text)
            || self.chapter.is_match(text)
            || self.colon.is_match(text)
        {
            return true;
        }
        self.keyphrase_fallback(text).await
    }

    /// A line that boils down to exactly one key phrase reads as a title.
    async fn keyphrase_fallback(&self, text: &str) -> bool {
        if text.split_whitespace().count() < 2 {
            return false;
        }
        match self
            .extractor
            .key_phrases(text, &self.rules.language)
            .await
        {
            Ok(phrases) => !phrases.is_empty() && phrases.len() < self.rules.keyphrase_limit,
            Err(err) => {
                debug!(error = %err, "key-phrase lookup failed, treating as non-heading");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyphrases::MockKeyPhraseExtractor;
    use crate::types::roles;

    fn detector(extractor: MockKeyPhraseExtractor) -> HeadingDetector {
        HeadingDetector::new(HeadingRules::default(), Arc::new(extractor))
    }

    fn no_phrases() -> HeadingDetector {
        detector(MockKeyPhraseExtractor::returning(vec![]))
    }

    #[tokio::test]
    async fn role_metadata_always_wins() {
        let detector = no_phrases();
        let block = TextBlock::paragraph("just an ordinary sentence here", 1)
            .with_role(roles::TITLE);
        assert!(detector.is_heading(&block).await);

        let section = TextBlock::paragraph("another plain sentence", 1)
            .with_role(roles::SECTION_HEADING);
        assert!(detector.is_heading(&section).await);
    }

    #[tokio::test]
    async fn uppercase_lines_need_minimum_length() {
        let detector = no_phrases();
        assert!(
            detector
                .is_heading(&TextBlock::paragraph("INTRODUCCIÓN", 1))
                .await
        );
        assert!(!detector.is_heading(&TextBlock::paragraph("ABC", 1)).await);
        assert!(
            !detector
                .is_heading(&TextBlock::paragraph("MIXED case line", 1))
                .await
        );
    }

    #[tokio::test]
    async fn numbered_sections_and_chapters_match() {
        let detector = no_phrases();
        assert!(
            detector
                .is_heading(&TextBlock::paragraph("2.1 Alcance del sistema", 1))
                .await
        );
        assert!(
            detector
                .is_heading(&TextBlock::paragraph("Capítulo 3", 1))
                .await
        );
        assert!(
            detector
                .is_heading(&TextBlock::paragraph("Chapter 12 overview", 1))
                .await
        );
        assert!(
            !detector
                .is_heading(&TextBlock::paragraph("3sin espacio", 1))
                .await
        );
    }

    #[tokio::test]
    async fn short_colon_lines_match_within_limit() {
        let detector = no_phrases();
        assert!(
            detector
                .is_heading(&TextBlock::paragraph("Requisitos:", 1))
                .await
        );
        let long = format!("{}:", "x".repeat(60));
        assert!(!detector.is_heading(&TextBlock::paragraph(long, 1)).await);
    }

    #[tokio::test]
    async fn single_key_phrase_marks_a_heading() {
        let detector = detector(MockKeyPhraseExtractor::returning(vec![
            "sistemas distribuidos".to_string(),
        ]));
        let block = TextBlock::paragraph("Sistemas distribuidos", 1);
        assert!(detector.is_heading(&block).await);
    }

    #[tokio::test]
    async fn multiple_key_phrases_do_not() {
        let detector = detector(MockKeyPhraseExtractor::returning(vec![
            "uno".to_string(),
            "dos".to_string(),
        ]));
        let block = TextBlock::paragraph("una frase con varios temas", 1);
        assert!(!detector.is_heading(&block).await);
    }

    #[tokio::test]
    async fn single_word_skips_the_lookup() {
        let detector = detector(MockKeyPhraseExtractor::failing());
        assert!(!detector.is_heading(&TextBlock::paragraph("hola", 1)).await);
    }

    #[tokio::test]
    async fn extractor_failure_is_fail_open() {
        let detector = detector(MockKeyPhraseExtractor::failing());
        let block = TextBlock::paragraph("una frase cualquiera", 1);
        assert!(!detector.is_heading(&block).await);
    }
}

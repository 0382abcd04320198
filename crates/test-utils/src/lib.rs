//! langcheck test utilities.
//!
//! Stub engines and registries that count what the dispatcher asks of them,
//! plus assertion helpers for XML and JSON responses.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use langcheck_kernel::engine::{
    BitextRule, CheckEngine, EngineError, EngineFactory, Language, LanguageRegistry, RuleMatch,
};

/// Rule id reported for every flagged word.
pub const FLAGGED_WORD_RULE: &str = "STUB_FLAGGED_WORD";

/// Rule id reported when the target text equals the source text.
pub const UNTRANSLATED_RULE: &str = "STUB_UNTRANSLATED";

/// Languages known to [`StubRegistry`].
pub fn stub_languages() -> Vec<Language> {
    vec![
        Language::new("English", "en"),
        Language::new("English (US)", "en-US"),
        Language::new("German", "de"),
        Language::new("French", "fr"),
        Language::synthetic("Testlanguage", "xx"),
    ]
}

/// Registry over [`stub_languages`] that counts lookups.
#[derive(Debug)]
pub struct StubRegistry {
    languages: Vec<Language>,
    resolves: AtomicUsize,
    listings: AtomicUsize,
}

impl StubRegistry {
    pub fn new() -> Self {
        Self {
            languages: stub_languages(),
            resolves: AtomicUsize::new(0),
            listings: AtomicUsize::new(0),
        }
    }

    /// Total registry calls of any kind.
    pub fn calls(&self) -> usize {
        self.resolves.load(Ordering::SeqCst) + self.listings.load(Ordering::SeqCst)
    }
}

impl Default for StubRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageRegistry for StubRegistry {
    fn resolve(&self, code: &str) -> Option<Language> {
        self.resolves.fetch_add(1, Ordering::SeqCst);
        self.languages.iter().find(|l| l.code() == code).cloned()
    }

    fn languages(&self) -> Vec<Language> {
        self.listings.fetch_add(1, Ordering::SeqCst);
        self.languages.clone()
    }

    fn bitext_rules(&self, _source: &Language, _target: &Language) -> Vec<Arc<dyn BitextRule>> {
        vec![Arc::new(UntranslatedRule)]
    }
}

/// Flags a target that is identical to its source.
#[derive(Debug)]
pub struct UntranslatedRule;

impl BitextRule for UntranslatedRule {
    fn id(&self) -> &str {
        UNTRANSLATED_RULE
    }

    fn check(&self, source_text: &str, target_text: &str) -> Result<Vec<RuleMatch>, EngineError> {
        if source_text.trim().is_empty() || source_text.trim() != target_text.trim() {
            return Ok(Vec::new());
        }
        Ok(vec![RuleMatch::new(
            0,
            target_text.chars().count(),
            UNTRANSLATED_RULE,
            "Target text is identical to the source",
        )])
    }
}

/// Factory building [`StubEngine`]s.
///
/// Counts constructions, can fail the next build, and can stall each build to
/// widen race windows in concurrency tests.
#[derive(Debug, Default)]
pub struct StubFactory {
    created: AtomicUsize,
    fail_next: AtomicBool,
    build_delay: Duration,
    flagged_word: Option<String>,
}

impl StubFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report every occurrence of `word` as a match.
    pub fn flagging(mut self, word: impl Into<String>) -> Self {
        self.flagged_word = Some(word.into());
        self
    }

    /// Sleep this long inside every build.
    pub fn with_build_delay(mut self, delay: Duration) -> Self {
        self.build_delay = delay;
        self
    }

    /// Make the next build fail.
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Engines built so far.
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl EngineFactory for StubFactory {
    fn create(
        &self,
        language: &Language,
        mother_tongue: Option<&Language>,
    ) -> Result<Box<dyn CheckEngine>, EngineError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(EngineError::Construction {
                language: language.code().to_string(),
                details: "stub build failure".into(),
            });
        }
        if !self.build_delay.is_zero() {
            std::thread::sleep(self.build_delay);
        }
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(StubEngine {
            language: language.clone(),
            mother_tongue: mother_tongue.cloned(),
            flagged_word: self.flagged_word.clone(),
            rules_active: false,
        }))
    }
}

/// Engine matching one configured word, case-sensitively.
#[derive(Debug)]
pub struct StubEngine {
    language: Language,
    mother_tongue: Option<Language>,
    flagged_word: Option<String>,
    rules_active: bool,
}

impl CheckEngine for StubEngine {
    fn language(&self) -> &Language {
        &self.language
    }

    fn mother_tongue(&self) -> Option<&Language> {
        self.mother_tongue.as_ref()
    }

    fn activate_default_pattern_rules(&mut self) -> Result<(), EngineError> {
        self.rules_active = true;
        Ok(())
    }

    fn activate_default_false_friend_rules(&mut self) -> Result<(), EngineError> {
        Ok(())
    }

    fn check(&self, text: &str) -> Result<Vec<RuleMatch>, EngineError> {
        let Some(word) = self.flagged_word.as_deref().filter(|w| !w.is_empty()) else {
            return Ok(Vec::new());
        };
        if !self.rules_active {
            return Err(EngineError::Check("pattern rules not activated".into()));
        }

        let word_len = word.chars().count();
        Ok(text
            .match_indices(word)
            .map(|(byte_offset, _)| {
                let from = text[..byte_offset].chars().count();
                RuleMatch::new(
                    from,
                    from + word_len,
                    FLAGGED_WORD_RULE,
                    format!("Possible typo: '{word}'"),
                )
                .with_replacements(["the"])
            })
            .collect())
    }
}

/// Assertion helpers for response bodies.
pub mod assert {
    use quick_xml::Reader;
    use quick_xml::events::Event;
    use serde_json::Value;

    /// Assert that a JSON value has a specific key.
    pub fn has_key(value: &Value, key: &str) {
        assert!(
            value.get(key).is_some(),
            "Expected JSON to have key '{key}', got: {value}"
        );
    }

    /// Assert that a string contains a substring.
    pub fn contains(haystack: &str, needle: &str) {
        assert!(
            haystack.contains(needle),
            "Expected string to contain '{needle}'\nActual: {haystack}"
        );
    }

    /// Assert that a string does not contain a substring.
    pub fn not_contains(haystack: &str, needle: &str) {
        assert!(
            !haystack.contains(needle),
            "Expected string NOT to contain '{needle}'\nActual: {haystack}"
        );
    }

    /// Assert that `xml` parses to the end and return its element names in order.
    pub fn well_formed_xml(xml: &str) -> Vec<String> {
        let mut reader = Reader::from_str(xml);
        let mut elements = Vec::new();
        loop {
            match reader.read_event() {
                Ok(Event::Start(e) | Event::Empty(e)) => {
                    elements.push(String::from_utf8_lossy(e.name().as_ref()).into_owned());
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => panic!(
                    "XML is not well-formed at {}: {e}\n{xml}",
                    reader.buffer_position()
                ),
            }
        }
        elements
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn stub_engine_reports_char_offsets() {
        let factory = StubFactory::new().flagging("teh");
        let mut engine = factory.create(&Language::new("English", "en"), None).unwrap();
        engine.activate_default_pattern_rules().unwrap();

        let matches = engine.check("ünd teh end, teh").unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!((matches[0].from, matches[0].to), (4, 7));
        assert_eq!((matches[1].from, matches[1].to), (13, 16));
        assert_eq!(factory.created(), 1);
    }

    #[test]
    fn fail_next_fails_once() {
        let factory = StubFactory::new();
        factory.fail_next();
        let en = Language::new("English", "en");
        assert!(factory.create(&en, None).is_err());
        assert!(factory.create(&en, None).is_ok());
        assert_eq!(factory.created(), 1);
    }

    #[test]
    fn untranslated_rule() {
        let rule = UntranslatedRule;
        assert_eq!(rule.check("Hallo", "Hallo").unwrap().len(), 1);
        assert!(rule.check("Hallo", "Hello").unwrap().is_empty());
        assert!(rule.check("", "").unwrap().is_empty());
    }

    #[test]
    fn registry_counts_calls() {
        let registry = StubRegistry::new();
        assert_eq!(registry.calls(), 0);
        assert!(registry.resolve("de").is_some());
        assert!(registry.resolve("tlh").is_none());
        assert_eq!(registry.languages().len(), 5);
        assert_eq!(registry.calls(), 3);
    }

    #[test]
    fn well_formed_xml_lists_elements() {
        let names = assert::well_formed_xml("<a><b x=\"1\"/></a>");
        assert_eq!(names, vec!["a", "b"]);
    }
}

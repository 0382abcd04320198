//! Built-in backend used when no analysis library is linked.
//!
//! [`BuiltinRegistry`] knows the supported languages. [`BuiltinEngineFactory`]
//! builds engines that carry no rules and therefore report no matches, which
//! keeps the server usable for integration work and protocol testing.

use std::sync::Arc;

use tracing::debug;

use super::{
    BitextRule, CheckEngine, EngineError, EngineFactory, Language, LanguageRegistry, RuleMatch,
};

/// (display name, short code) of every listed language.
const LANGUAGES: &[(&str, &str)] = &[
    ("Belarusian", "be"),
    ("Catalan", "ca"),
    ("Danish", "da"),
    ("Dutch", "nl"),
    ("English", "en"),
    ("English (GB)", "en-GB"),
    ("English (US)", "en-US"),
    ("Esperanto", "eo"),
    ("French", "fr"),
    ("Galician", "gl"),
    ("German", "de"),
    ("Icelandic", "is"),
    ("Italian", "it"),
    ("Lithuanian", "lt"),
    ("Malayalam", "ml"),
    ("Polish", "pl"),
    ("Romanian", "ro"),
    ("Russian", "ru"),
    ("Slovak", "sk"),
    ("Slovenian", "sl"),
    ("Spanish", "es"),
    ("Swedish", "sv"),
    ("Ukrainian", "uk"),
];

/// Static language table plus one synthetic test language.
#[derive(Debug, Clone)]
pub struct BuiltinRegistry {
    languages: Vec<Language>,
}

impl BuiltinRegistry {
    pub fn new() -> Self {
        let mut languages: Vec<Language> = LANGUAGES
            .iter()
            .map(|(name, code)| Language::new(*name, *code))
            .collect();
        languages.push(Language::synthetic("Testlanguage", "xx"));
        Self { languages }
    }
}

impl Default for BuiltinRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageRegistry for BuiltinRegistry {
    fn resolve(&self, code: &str) -> Option<Language> {
        self.languages.iter().find(|l| l.code() == code).cloned()
    }

    fn languages(&self) -> Vec<Language> {
        self.languages.clone()
    }

    fn bitext_rules(&self, _source: &Language, _target: &Language) -> Vec<Arc<dyn BitextRule>> {
        Vec::new()
    }
}

/// Factory for [`BuiltinEngine`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinEngineFactory;

impl EngineFactory for BuiltinEngineFactory {
    fn create(
        &self,
        language: &Language,
        mother_tongue: Option<&Language>,
    ) -> Result<Box<dyn CheckEngine>, EngineError> {
        Ok(Box::new(BuiltinEngine {
            language: language.clone(),
            mother_tongue: mother_tongue.cloned(),
            pattern_rules: false,
            false_friend_rules: false,
        }))
    }
}

/// An engine without rules.
#[derive(Debug)]
pub struct BuiltinEngine {
    language: Language,
    mother_tongue: Option<Language>,
    pattern_rules: bool,
    false_friend_rules: bool,
}

impl CheckEngine for BuiltinEngine {
    fn language(&self) -> &Language {
        &self.language
    }

    fn mother_tongue(&self) -> Option<&Language> {
        self.mother_tongue.as_ref()
    }

    fn activate_default_pattern_rules(&mut self) -> Result<(), EngineError> {
        self.pattern_rules = true;
        Ok(())
    }

    fn activate_default_false_friend_rules(&mut self) -> Result<(), EngineError> {
        self.false_friend_rules = true;
        Ok(())
    }

    fn check(&self, text: &str) -> Result<Vec<RuleMatch>, EngineError> {
        debug!(
            language = %self.language.code(),
            chars = text.chars().count(),
            pattern_rules = self.pattern_rules,
            false_friend_rules = self.false_friend_rules,
            "builtin engine has no rules to apply"
        );
        Ok(Vec::new())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn resolves_regional_codes() {
        let registry = BuiltinRegistry::new();
        assert_eq!(registry.resolve("en-US").unwrap().name(), "English (US)");
        assert!(registry.resolve("EN-us").is_none());
        assert!(registry.resolve("").is_none());
    }

    #[test]
    fn synthetic_language_resolves_but_is_flagged() {
        let registry = BuiltinRegistry::new();
        let test = registry.resolve("xx").unwrap();
        assert!(test.is_synthetic());
        assert_eq!(
            registry.languages().iter().filter(|l| l.is_synthetic()).count(),
            1
        );
    }

    #[test]
    fn codes_are_unique() {
        let registry = BuiltinRegistry::new();
        let mut codes: Vec<String> = registry
            .languages()
            .iter()
            .map(|l| l.code().to_string())
            .collect();
        let total = codes.len();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), total);
    }

    #[test]
    fn builtin_engine_keeps_mother_tongue_and_finds_nothing() {
        let de = Language::new("German", "de");
        let en = Language::new("English", "en");
        let mut engine = BuiltinEngineFactory.create(&en, Some(&de)).unwrap();
        engine.activate_default_pattern_rules().unwrap();
        engine.activate_default_false_friend_rules().unwrap();

        assert_eq!(engine.mother_tongue(), Some(&de));
        assert!(engine.check("This is a test.").unwrap().is_empty());
    }
}

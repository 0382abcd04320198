//! Contract of the external analysis engine.
//!
//! The kernel never analyses text itself. It resolves language codes through a
//! [`LanguageRegistry`], builds engines through an [`EngineFactory`], and hands
//! texts to the resulting [`CheckEngine`]s. Rule matching, tagging and
//! dictionaries all live behind these traits.

pub mod builtin;

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use thiserror::Error;

/// A language known to the registry.
///
/// Two languages are equal when their short codes are equal; the display name
/// and the synthetic flag are descriptive only.
#[derive(Debug, Clone)]
pub struct Language {
    name: String,
    code: String,
    synthetic: bool,
}

impl Language {
    /// Create a real, user-facing language.
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
            synthetic: false,
        }
    }

    /// Create a demo/test language that is resolvable but never listed.
    pub fn synthetic(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            synthetic: true,
            ..Self::new(name, code)
        }
    }

    /// Display name, e.g. "German".
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Short code, e.g. "de" or "en-US".
    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn is_synthetic(&self) -> bool {
        self.synthetic
    }
}

impl PartialEq for Language {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
    }
}

impl Eq for Language {}

impl Hash for Language {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.code.hash(state);
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A flagged span of the checked text plus the rule that flagged it.
///
/// `from` and `to` are character offsets (not bytes) into the checked text,
/// `to` exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch {
    pub from: usize,
    pub to: usize,
    pub rule_id: String,
    pub sub_id: Option<String>,
    /// Human-readable message; may contain `<suggestion>` markup.
    pub message: String,
    pub replacements: Vec<String>,
}

impl RuleMatch {
    pub fn new(
        from: usize,
        to: usize,
        rule_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            from,
            to,
            rule_id: rule_id.into(),
            sub_id: None,
            message: message.into(),
            replacements: Vec::new(),
        }
    }

    pub fn with_sub_id(mut self, sub_id: impl Into<String>) -> Self {
        self.sub_id = Some(sub_id.into());
        self
    }

    pub fn with_replacements<I, S>(mut self, replacements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.replacements = replacements.into_iter().map(Into::into).collect();
        self
    }
}

/// Failures reported by the analysis engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine could not be built (missing rule files, dictionaries, ...).
    #[error("cannot create engine for {language}: {details}")]
    Construction { language: String, details: String },

    /// A default rule set could not be activated on a fresh engine.
    #[error("cannot activate {rule_set} rules for {language}: {details}")]
    RuleActivation {
        language: String,
        rule_set: &'static str,
        details: String,
    },

    /// Analysis of a text failed.
    #[error("check failed: {0}")]
    Check(String),
}

/// A configured analysis engine for one (language, mother tongue) pair.
///
/// Rule activation happens once, right after construction, while the engine is
/// still exclusively owned. After that it is only ever shared immutably.
pub trait CheckEngine: Send + Sync {
    fn language(&self) -> &Language;

    fn mother_tongue(&self) -> Option<&Language>;

    fn activate_default_pattern_rules(&mut self) -> Result<(), EngineError>;

    fn activate_default_false_friend_rules(&mut self) -> Result<(), EngineError>;

    /// Analyse `text`, returning matches in the order the engine found them.
    fn check(&self, text: &str) -> Result<Vec<RuleMatch>, EngineError>;
}

/// Builds engines. Construction is the expensive path.
pub trait EngineFactory: Send + Sync {
    fn create(
        &self,
        language: &Language,
        mother_tongue: Option<&Language>,
    ) -> Result<Box<dyn CheckEngine>, EngineError>;
}

/// A rule comparing a source text with its translation.
pub trait BitextRule: Send + Sync {
    fn id(&self) -> &str;

    /// Returns matches whose spans reference `target_text`.
    fn check(&self, source_text: &str, target_text: &str) -> Result<Vec<RuleMatch>, EngineError>;
}

/// Resolves short codes and enumerates supported languages.
pub trait LanguageRegistry: Send + Sync {
    /// Look up a language by short code. Synthetic languages resolve too.
    fn resolve(&self, code: &str) -> Option<Language>;

    /// Every known language, synthetic ones included, in no particular order.
    fn languages(&self) -> Vec<Language>;

    /// Bitext rules registered for translating `source` into `target`.
    fn bitext_rules(&self, source: &Language, target: &Language) -> Vec<Arc<dyn BitextRule>>;
}

/// Check a translation against its source text.
///
/// The target engine's own matches come first, followed by the matches of each
/// bitext rule in registration order. The whole source is aligned with the
/// whole target; no sentence segmentation is attempted here.
pub fn check_bitext(
    source_text: &str,
    target_text: &str,
    source: &dyn CheckEngine,
    target: &dyn CheckEngine,
    rules: &[Arc<dyn BitextRule>],
) -> Result<Vec<RuleMatch>, EngineError> {
    tracing::debug!(
        source = %source.language(),
        target = %target.language(),
        rules = rules.len(),
        "running bitext check"
    );

    let mut matches = target.check(target_text)?;
    for rule in rules {
        matches.extend(rule.check(source_text, target_text)?);
    }
    Ok(matches)
}

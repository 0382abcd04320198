//! Checking invoker: turns request parameters into an engine run.
//!
//! The presence of `srctext` selects a bilingual check; otherwise the text is
//! checked on its own, optionally with the writer's mother tongue.

use tracing::info;

use crate::cache::EngineCache;
use crate::engine::{Language, LanguageRegistry, RuleMatch, check_bitext};
use crate::error::{CheckError, CheckResult};
use crate::params::ParameterMap;

/// Parameter names understood by the checker.
pub mod param {
    pub const TEXT: &str = "text";
    pub const LANGUAGE: &str = "language";
    pub const MOTHER_TONGUE: &str = "motherTongue";
    pub const SOURCE_TEXT: &str = "srctext";
}

/// A validated check request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckRequest {
    Monolingual {
        text: String,
        language: Language,
        mother_tongue: Option<Language>,
    },
    Bilingual {
        source_text: String,
        target_text: String,
        source: Language,
        target: Language,
    },
}

impl CheckRequest {
    /// Validate parameters and resolve language codes.
    ///
    /// Checks run in order: `text`, `language`, resolution of `language`,
    /// resolution of `motherTongue`, then the bilingual requirements.
    pub fn from_params(params: &ParameterMap, registry: &dyn LanguageRegistry) -> CheckResult<Self> {
        let text = params.require(param::TEXT)?;
        let language = resolve(registry, params.require(param::LANGUAGE)?)?;
        let mother_tongue = params
            .get(param::MOTHER_TONGUE)
            .map(|code| resolve(registry, code))
            .transpose()?;

        match params.get(param::SOURCE_TEXT) {
            None => Ok(Self::Monolingual {
                text: text.to_string(),
                language,
                mother_tongue,
            }),
            Some(source_text) => {
                let source = mother_tongue.ok_or(CheckError::MissingBitextParameter {
                    name: param::MOTHER_TONGUE,
                })?;
                Ok(Self::Bilingual {
                    source_text: source_text.to_string(),
                    target_text: text.to_string(),
                    source,
                    target: language,
                })
            }
        }
    }

    /// "monolingual" or "bilingual", for logs and metrics.
    pub fn mode(&self) -> &'static str {
        match self {
            Self::Monolingual { .. } => "monolingual",
            Self::Bilingual { .. } => "bilingual",
        }
    }

    /// The text match spans refer to.
    pub fn checked_text(&self) -> &str {
        match self {
            Self::Monolingual { text, .. } => text,
            Self::Bilingual { target_text, .. } => target_text,
        }
    }

    /// Run the check with engines from `cache`.
    pub fn run(
        &self,
        registry: &dyn LanguageRegistry,
        cache: &EngineCache,
    ) -> CheckResult<Vec<RuleMatch>> {
        match self {
            Self::Monolingual {
                text,
                language,
                mother_tongue,
            } => {
                let engine = cache.get_or_create(language, mother_tongue.as_ref())?;
                info!(
                    chars = text.chars().count(),
                    language = %language.code(),
                    "checking text"
                );
                Ok(engine.check(text)?)
            }
            Self::Bilingual {
                source_text,
                target_text,
                source,
                target,
            } => {
                info!(
                    source_chars = source_text.chars().count(),
                    target_chars = target_text.chars().count(),
                    source = %source.code(),
                    target = %target.code(),
                    "checking bilingual text"
                );
                let source_engine = cache.get_or_create(source, None)?;
                let target_engine = cache.get_or_create(target, None)?;
                let rules = registry.bitext_rules(source, target);
                Ok(check_bitext(
                    source_text,
                    target_text,
                    source_engine.as_ref(),
                    target_engine.as_ref(),
                    &rules,
                )?)
            }
        }
    }
}

fn resolve(registry: &dyn LanguageRegistry, code: &str) -> CheckResult<Language> {
    registry
        .resolve(code)
        .ok_or_else(|| CheckError::unknown_language(code))
}

//! Request parameter decoding.
//!
//! Parameters arrive as `key=value&key=value`, either in the URI query (GET)
//! or as the first line of the request body (POST).

use std::borrow::Cow;
use std::collections::HashMap;

use crate::error::{CheckError, CheckResult};

/// Decoded request parameters. Later duplicates overwrite earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterMap {
    values: HashMap<String, String>,
}

impl ParameterMap {
    /// Decode a query string.
    ///
    /// Empty segments are ignored. A non-empty segment without `=` fails the
    /// whole request rather than being dropped.
    pub fn parse(query: &str) -> CheckResult<Self> {
        let mut values = HashMap::new();
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let Some((raw_key, raw_value)) = pair.split_once('=') else {
                return Err(CheckError::MalformedParameter {
                    pair: pair.to_string(),
                });
            };
            let key = decode(&raw_key.replace('+', " "))?.into_owned();
            let value = if raw_value.is_empty() {
                String::new()
            } else {
                decode(raw_value)?.replace('+', " ")
            };
            values.insert(key, value);
        }
        Ok(Self { values })
    }

    /// Decode the first line of a POST body. Further lines are ignored.
    pub fn parse_body(body: &str) -> CheckResult<Self> {
        Self::parse(first_line(body))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Fetch a parameter the request cannot do without.
    pub fn require(&self, key: &'static str) -> CheckResult<&str> {
        self.get(key).ok_or_else(|| CheckError::missing(key))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ParameterMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

fn decode(raw: &str) -> CheckResult<Cow<'_, str>> {
    urlencoding::decode(raw).map_err(|e| CheckError::MalformedRequest {
        reason: format!("parameter is not valid UTF-8 after decoding: {e}"),
    })
}

/// Everything before the first line break, without a trailing `\r`.
fn first_line(body: &str) -> &str {
    let line = body.split('\n').next().unwrap_or_default();
    line.strip_suffix('\r').unwrap_or(line)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn parses_simple_pairs() {
        let params = ParameterMap::parse("text=hello&language=en-US").unwrap();
        assert_eq!(params.get("text"), Some("hello"));
        assert_eq!(params.get("language"), Some("en-US"));
    }

    #[test]
    fn decodes_percent_escapes_and_plus() {
        let params = ParameterMap::parse("text=Caf%C3%A9+au+lait&my+key=x").unwrap();
        assert_eq!(params.get("text"), Some("Café au lait"));
        assert_eq!(params.get("my key"), Some("x"));
    }

    #[test]
    fn encoded_plus_in_value_also_becomes_space() {
        let params = ParameterMap::parse("text=1%2B1").unwrap();
        assert_eq!(params.get("text"), Some("1 1"));
    }

    #[test]
    fn splits_at_first_equals_only() {
        let params = ParameterMap::parse("text=a=b").unwrap();
        assert_eq!(params.get("text"), Some("a=b"));
    }

    #[test]
    fn missing_value_is_empty_string() {
        let params = ParameterMap::parse("text=&language=de").unwrap();
        assert_eq!(params.get("text"), Some(""));
        assert_eq!(params.get("motherTongue"), None);
    }

    #[test]
    fn last_duplicate_wins() {
        let params = ParameterMap::parse("language=de&language=fr").unwrap();
        assert_eq!(params.get("language"), Some("fr"));
    }

    #[test]
    fn empty_segments_are_skipped() {
        let params = ParameterMap::parse("&text=a&&language=de&").unwrap();
        let expected: ParameterMap = [("text", "a"), ("language", "de")].into_iter().collect();
        assert_eq!(params, expected);
        assert_eq!(ParameterMap::parse("").unwrap(), ParameterMap::default());
    }

    #[test]
    fn pair_without_equals_is_rejected() {
        let err = ParameterMap::parse("text=a&oops&language=de").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedParameter);
        assert!(err.to_string().contains("oops"));
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        let err = ParameterMap::parse("text=%FF%FE").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedParameter);
    }

    #[test]
    fn body_uses_first_line_only() {
        let params = ParameterMap::parse_body("text=hello&language=en\r\nignored=1\n").unwrap();
        assert_eq!(params.get("language"), Some("en"));
        assert_eq!(params.get("ignored"), None);
        assert_eq!(ParameterMap::parse_body("").unwrap(), ParameterMap::default());
    }

    #[test]
    fn require_reports_the_missing_key() {
        let params: ParameterMap = [("text", "x")].into_iter().collect();
        assert_eq!(params.require("text").unwrap(), "x");
        let err = params.require("language").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingParameter);
        assert!(err.to_string().contains("language"));
    }
}

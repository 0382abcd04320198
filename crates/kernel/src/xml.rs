//! XML rendering of language listings and check results.

use std::fmt::Write;

use crate::engine::{Language, RuleMatch};

/// Content type of successful responses.
pub const XML_CONTENT_TYPE: &str = "text/xml; charset=UTF-8";

/// Characters of surrounding text shown on each side of a match.
pub const CONTEXT_SIZE: usize = 40;

const ELLIPSIS: &str = "...";

/// Escape the five XML special characters.
pub fn escape_xml(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render the supported languages.
///
/// Synthetic languages are skipped; the rest are sorted by display name.
pub fn languages_xml(languages: &[Language]) -> String {
    let mut listed: Vec<&Language> = languages.iter().filter(|l| !l.is_synthetic()).collect();
    listed.sort_by(|a, b| a.name().cmp(b.name()));

    let mut xml = String::from("<?xml version='1.0' encoding='UTF-8'?>\n<languages>\n");
    for language in listed {
        let _ = writeln!(
            xml,
            "\t<language name=\"{}\" abbr=\"{}\" />",
            escape_xml(language.name()),
            escape_xml(language.code())
        );
    }
    xml.push_str("</languages>\n");
    xml
}

/// Render matches against the text they were found in.
pub fn matches_xml(matches: &[RuleMatch], text: &str, context_size: usize) -> String {
    let chars: Vec<char> = text.chars().collect();

    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<matches>\n");
    for m in matches {
        let from = m.from.min(chars.len());
        let to = m.to.clamp(from, chars.len());
        let (from_line, from_col) = line_and_column(&chars, from);
        let (to_line, to_col) = line_and_column(&chars, to);
        let context = Context::around(&chars, from, to, context_size);
        let message = m
            .message
            .replace("<suggestion>", "'")
            .replace("</suggestion>", "'");

        let _ = write!(
            xml,
            "<error fromy=\"{from_line}\" fromx=\"{from_col}\" toy=\"{to_line}\" tox=\"{to_col}\" ruleId=\"{}\"",
            escape_xml(&m.rule_id)
        );
        if let Some(sub_id) = &m.sub_id {
            let _ = write!(xml, " subId=\"{}\"", escape_xml(sub_id));
        }
        let _ = writeln!(
            xml,
            " msg=\"{}\" replacements=\"{}\" context=\"{}\" contextoffset=\"{}\" errorlength=\"{}\"/>",
            escape_xml(&message),
            escape_xml(&m.replacements.join("#")),
            escape_xml(&context.text),
            context.offset,
            to - from
        );
    }
    xml.push_str("</matches>\n");
    xml
}

/// Zero-based (line, column) of a character offset.
fn line_and_column(chars: &[char], offset: usize) -> (usize, usize) {
    let mut line = 0;
    let mut column = 0;
    for &c in &chars[..offset] {
        if c == '\n' {
            line += 1;
            column = 0;
        } else {
            column += 1;
        }
    }
    (line, column)
}

/// Text surrounding a match, with the match start located inside it.
#[derive(Debug, PartialEq, Eq)]
struct Context {
    text: String,
    /// Character offset of the match start within `text`.
    offset: usize,
}

impl Context {
    fn around(chars: &[char], from: usize, to: usize, size: usize) -> Self {
        let start = from.saturating_sub(size);
        let end = to.saturating_add(size).min(chars.len());

        let mut text = String::new();
        let mut offset = from - start;
        if start > 0 {
            text.push_str(ELLIPSIS);
            offset += ELLIPSIS.len();
        }
        text.extend(chars[start..end].iter().map(|&c| match c {
            '\n' | '\r' => ' ',
            c => c,
        }));
        if end < chars.len() {
            text.push_str(ELLIPSIS);
        }
        Self { text, offset }
    }
}

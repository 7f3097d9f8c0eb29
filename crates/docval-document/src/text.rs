//! Visible text extraction from WordprocessingML.

use std::borrow::Cow;

use docval_core::{Error, ErrorKind, Result};
use regex::Regex;

/// Matches `<w:t>` and `<w:t xml:space="preserve">` runs, but not `<w:tab/>` or `<w:tbl>`.
const TEXT_RUN_PATTERN: &str = r"<w:t(?:\s[^>]*)?>([^<]*)</w:t>";

/// Concatenates the contents of every text run, discarding markup.
#[derive(Debug, Clone)]
pub struct TextExtractor {
    text_run: Regex,
}

impl TextExtractor {
    /// Compiles the text run pattern.
    pub fn new() -> Result<Self> {
        let text_run = Regex::new(TEXT_RUN_PATTERN)
            .map_err(|e| Error::from_source(ErrorKind::Internal, e))?;
        Ok(Self { text_run })
    }

    /// Returns the visible text of a `word/document.xml` body.
    pub fn extract(&self, xml: &str) -> String {
        self.text_run
            .captures_iter(xml)
            .filter_map(|captures| captures.get(1))
            .map(|run| unescape(run.as_str()))
            .collect()
    }
}

/// Resolves the predefined XML entities. Anything else is kept verbatim.
fn unescape(run: &str) -> Cow<'_, str> {
    if !run.contains('&') {
        return Cow::Borrowed(run);
    }

    let mut out = String::with_capacity(run.len());
    let mut rest = run;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        rest = &rest[start..];

        let replacement = [
            ("&amp;", '&'),
            ("&lt;", '<'),
            ("&gt;", '>'),
            ("&quot;", '"'),
            ("&apos;", '\''),
        ]
        .into_iter()
        .find(|(entity, _)| rest.starts_with(entity));

        match replacement {
            Some((entity, c)) => {
                out.push(c);
                rest = &rest[entity.len()..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_runs_in_order() {
        let extractor = TextExtractor::new().unwrap();
        let xml = r#"<w:document><w:body><w:p><w:r><w:t>Привет</w:t></w:r><w:r><w:t xml:space="preserve"> мир</w:t></w:r></w:p></w:body></w:document>"#;
        assert_eq!(extractor.extract(xml), "Привет мир");
    }

    #[test]
    fn test_ignores_similar_tags() {
        let extractor = TextExtractor::new().unwrap();
        let xml = r#"<w:tbl><w:tr><w:tc><w:p><w:r><w:tab/><w:t>ячейка</w:t></w:r></w:p></w:tc></w:tr></w:tbl>"#;
        assert_eq!(extractor.extract(xml), "ячейка");
    }

    #[test]
    fn test_no_runs() {
        let extractor = TextExtractor::new().unwrap();
        assert_eq!(extractor.extract("<w:document><w:body/></w:document>"), "");
    }

    #[test]
    fn test_unescapes_entities() {
        assert_eq!(unescape("A &amp; B &lt;C&gt;"), "A & B <C>");
        assert_eq!(unescape("&unknown; &"), "&unknown; &");
        assert!(matches!(unescape("plain"), Cow::Borrowed("plain")));
    }
}

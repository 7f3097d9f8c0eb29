//! In-memory DOCX fixtures.

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Minimal `[Content_Types].xml` for a word-processing package.
pub const CONTENT_TYPES_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
    r#"<Default Extension="xml" ContentType="application/xml"/>"#,
    r#"<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#,
    r#"</Types>"#,
);

/// Minimal `_rels/.rels` pointing at the main document.
pub const RELS_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>"#,
    r#"</Relationships>"#,
);

const DOCUMENT_ENTRY: &str = "word/document.xml";

/// Wraps `text` in a single-run `word/document.xml` body.
///
/// The text is XML-escaped, so it is extracted back verbatim.
pub fn document_xml(text: &str) -> String {
    let escaped = text
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;");

    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
            r#"<w:body><w:p><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p></w:body>"#,
            r#"</w:document>"#,
        ),
        escaped
    )
}

/// Builds DOCX packages in memory.
///
/// Starts with `[Content_Types].xml`, `_rels/.rels` and an empty
/// `word/document.xml`; entries are written in insertion order.
#[derive(Debug, Clone)]
pub struct DocxBuilder {
    entries: Vec<(String, Vec<u8>)>,
}

impl Default for DocxBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DocxBuilder {
    /// Creates a builder holding the three required entries.
    pub fn new() -> Self {
        Self {
            entries: vec![
                ("[Content_Types].xml".to_owned(), CONTENT_TYPES_XML.into()),
                ("_rels/.rels".to_owned(), RELS_XML.into()),
                (DOCUMENT_ENTRY.to_owned(), document_xml("").into_bytes()),
            ],
        }
    }

    /// Sets the document text.
    #[must_use]
    pub fn text(self, text: &str) -> Self {
        self.document_xml(&document_xml(text))
    }

    /// Replaces the raw `word/document.xml` content.
    #[must_use]
    pub fn document_xml(self, content: &str) -> Self {
        self.entry(DOCUMENT_ENTRY, content)
    }

    /// Adds or replaces an entry, keeping the position of a replaced one.
    #[must_use]
    pub fn entry(mut self, name: &str, content: impl AsRef<[u8]>) -> Self {
        let content = content.as_ref().to_vec();
        match self.entries.iter_mut().find(|(existing, _)| existing == name) {
            Some((_, slot)) => *slot = content,
            None => self.entries.push((name.to_owned(), content)),
        }
        self
    }

    /// Drops an entry.
    #[must_use]
    pub fn without_entry(mut self, name: &str) -> Self {
        self.entries.retain(|(existing, _)| existing != name);
        self
    }

    /// Returns the entry names in archive order.
    pub fn entry_names(&self) -> Vec<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Writes the archive.
    pub fn try_build(&self) -> zip::result::ZipResult<Vec<u8>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for (name, content) in &self.entries {
            writer.start_file(name.as_str(), options)?;
            writer.write_all(content)?;
        }

        Ok(writer.finish()?.into_inner())
    }

    /// Writes the archive.
    ///
    /// # Panics
    ///
    /// Panics if the zip writer fails, which does not happen for in-memory
    /// buffers.
    pub fn build(&self) -> Vec<u8> {
        self.try_build().expect("in-memory zip archive")
    }
}

#[cfg(test)]
mod tests {
    use zip::ZipArchive;

    use super::*;

    #[test]
    fn test_default_entries() {
        let builder = DocxBuilder::new();
        assert_eq!(
            builder.entry_names(),
            vec!["[Content_Types].xml", "_rels/.rels", "word/document.xml"]
        );
    }

    #[test]
    fn test_build_is_readable() {
        let data = DocxBuilder::new()
            .text("a < b & c")
            .entry("word/media/image1.png", b"png")
            .build();

        let mut archive = ZipArchive::new(Cursor::new(data)).unwrap();
        assert_eq!(archive.len(), 4);

        let mut document = String::new();
        std::io::Read::read_to_string(&mut archive.by_name("word/document.xml").unwrap(), &mut document)
            .unwrap();
        assert!(document.contains("<w:t xml:space=\"preserve\">a &lt; b &amp; c</w:t>"));
    }

    #[test]
    fn test_replace_keeps_position() {
        let builder = DocxBuilder::new()
            .entry("extra.xml", "x")
            .document_xml("raw")
            .without_entry("_rels/.rels");
        assert_eq!(
            builder.entry_names(),
            vec!["[Content_Types].xml", "word/document.xml", "extra.xml"]
        );
    }
}

//! The document validation engine.

use std::collections::HashSet;
use std::io::{Cursor, Read};

use docval_core::Result;
use zip::ZipArchive;

use crate::{
    DateScanner, ScriptRatio, TRACING_TARGET, TextExtractor, ValidationConfig, ValidationError,
    ValidationResult,
};

/// Main document body.
pub const DOCUMENT_ENTRY: &str = "word/document.xml";

/// Entries every package must contain, in the order they are checked.
pub const REQUIRED_ENTRIES: [&str; 3] = ["[Content_Types].xml", "_rels/.rels", DOCUMENT_ENTRY];

/// Largest document body read into memory. Larger bodies are unreadable.
pub const MAX_DOCUMENT_BYTES: u64 = 64 * 1024 * 1024;

/// Entries under this prefix must not contain parent-directory tokens.
const DOCUMENT_NAMESPACE: &str = "word/";
const PARENT_TOKEN: &str = "..";

/// Validates DOCX packages against structural and content rules.
///
/// Checks run in a fixed order and the first failure is returned. The
/// validator holds only compiled patterns and thresholds, so it can be
/// shared freely between tasks.
#[derive(Debug, Clone)]
pub struct DocumentValidator {
    config: ValidationConfig,
    extractor: TextExtractor,
    dates: DateScanner,
}

impl DocumentValidator {
    /// Creates a validator for the given thresholds.
    pub fn new(config: ValidationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            extractor: TextExtractor::new()?,
            dates: DateScanner::new()?,
        })
    }

    /// Returns the active thresholds.
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Runs every rule against the raw package bytes.
    pub fn validate(&self, data: &[u8]) -> ValidationResult {
        let mut archive = ZipArchive::new(Cursor::new(data))
            .map_err(|e| ValidationError::MalformedContainer(e.to_string()))?;

        {
            let names: HashSet<&str> = archive.file_names().collect();
            if let Some(missing) = REQUIRED_ENTRIES.into_iter().find(|name| !names.contains(*name)) {
                return Err(ValidationError::MissingRequiredEntry(missing));
            }

            let suspicious = archive
                .file_names()
                .find(|name| name.starts_with(DOCUMENT_NAMESPACE) && name.contains(PARENT_TOKEN));
            if let Some(name) = suspicious {
                return Err(ValidationError::SuspiciousPath(name.to_owned()));
            }
        }

        let content = read_entry(&mut archive, DOCUMENT_ENTRY, MAX_DOCUMENT_BYTES)?;
        if !content.trim_start().starts_with("<?xml") && !content.contains("<w:document") {
            return Err(ValidationError::NotWellFormed);
        }

        let text = self.extractor.extract(&content);
        self.check_script(&text)?;
        self.check_dates(&text)?;

        tracing::trace!(
            target: TRACING_TARGET,
            size = data.len(),
            text_len = text.len(),
            "Document passed validation"
        );
        Ok(())
    }

    fn check_script(&self, text: &str) -> ValidationResult {
        if text.is_empty() {
            return Err(ValidationError::NoText);
        }

        let script = self.config.target_script;
        let ratio = ScriptRatio::measure(text, script);
        if ratio.letters == 0 {
            return Err(ValidationError::NoLetters);
        }
        if !ratio.meets(self.config.min_script_percent) {
            return Err(ValidationError::LowScriptRatio {
                script: script.into(),
                percent: ratio.percent(),
                required: self.config.min_script_percent,
            });
        }
        Ok(())
    }

    fn check_dates(&self, text: &str) -> ValidationResult {
        let dates = self.dates.scan(text);
        let (Some(min), Some(max)) = (dates.iter().min(), dates.iter().max()) else {
            return Err(ValidationError::NoDatesFound);
        };

        let days = max.duration_since(*min).as_hours() / 24;
        if days > i64::from(self.config.max_date_spread_days) {
            return Err(ValidationError::DateSpreadExceeded {
                min: min.strftime("%d.%m.%Y").to_string(),
                max: max.strftime("%d.%m.%Y").to_string(),
                days,
                max_days: self.config.max_date_spread_days,
            });
        }
        Ok(())
    }
}

/// Reads at most `limit` bytes of an entry.
///
/// The size declared in the archive is ignored. Invalid UTF-8 is replaced
/// with U+FFFD.
fn read_entry(
    archive: &mut ZipArchive<Cursor<&[u8]>>,
    name: &str,
    limit: u64,
) -> ValidationResult<String> {
    let entry = archive
        .by_name(name)
        .map_err(|e| ValidationError::UnreadableDocument(e.to_string()))?;

    let mut buffer = Vec::new();
    entry
        .take(limit.saturating_add(1))
        .read_to_end(&mut buffer)
        .map_err(|e| ValidationError::UnreadableDocument(e.to_string()))?;

    if buffer.len() as u64 > limit {
        return Err(ValidationError::UnreadableDocument(format!(
            "{name} is larger than {limit} bytes"
        )));
    }

    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

#[cfg(test)]
mod tests {
    use docval_core::FailureCategory;
    use docval_test::DocxBuilder;

    use super::*;
    use crate::TargetScript;

    fn validator() -> DocumentValidator {
        DocumentValidator::new(ValidationConfig::default()).unwrap()
    }

    fn crc32(data: &[u8]) -> u32 {
        let mut crc = !0u32;
        for &byte in data {
            crc ^= u32::from(byte);
            for _ in 0..8 {
                let mask = (crc & 1).wrapping_neg();
                crc = (crc >> 1) ^ (0xEDB8_8320 & mask);
            }
        }
        !crc
    }

    /// Hand-written stored package. When `declared_size` is set, the central
    /// directory claims that uncompressed size for the body through a ZIP64
    /// extra field.
    fn stored_package(body: &[u8], declared_size: Option<u64>) -> Vec<u8> {
        let entries: [(&str, &[u8], Option<u64>); 3] = [
            ("[Content_Types].xml", b"<Types/>", None),
            ("_rels/.rels", b"<Relationships/>", None),
            (DOCUMENT_ENTRY, body, declared_size),
        ];

        let mut out = Vec::new();
        let mut central = Vec::new();
        for (name, data, declared) in entries {
            let offset = out.len() as u32;
            let crc = crc32(data);
            let size = data.len() as u32;

            out.extend_from_slice(&0x0403_4b50u32.to_le_bytes());
            for field in [20u16, 0, 0, 0, 0x21] {
                out.extend_from_slice(&field.to_le_bytes());
            }
            out.extend_from_slice(&crc.to_le_bytes());
            out.extend_from_slice(&size.to_le_bytes());
            out.extend_from_slice(&size.to_le_bytes());
            out.extend_from_slice(&(name.len() as u16).to_le_bytes());
            out.extend_from_slice(&0u16.to_le_bytes());
            out.extend_from_slice(name.as_bytes());
            out.extend_from_slice(data);

            let mut extra = Vec::new();
            let mut uncompressed = size;
            if let Some(declared) = declared {
                uncompressed = u32::MAX;
                extra.extend_from_slice(&1u16.to_le_bytes());
                extra.extend_from_slice(&8u16.to_le_bytes());
                extra.extend_from_slice(&declared.to_le_bytes());
            }

            central.extend_from_slice(&0x0201_4b50u32.to_le_bytes());
            for field in [45u16, 45, 0, 0, 0, 0x21] {
                central.extend_from_slice(&field.to_le_bytes());
            }
            central.extend_from_slice(&crc.to_le_bytes());
            central.extend_from_slice(&size.to_le_bytes());
            central.extend_from_slice(&uncompressed.to_le_bytes());
            for field in [name.len() as u16, extra.len() as u16, 0, 0, 0] {
                central.extend_from_slice(&field.to_le_bytes());
            }
            central.extend_from_slice(&0u32.to_le_bytes());
            central.extend_from_slice(&offset.to_le_bytes());
            central.extend_from_slice(name.as_bytes());
            central.extend_from_slice(&extra);
        }

        let central_offset = out.len() as u32;
        let central_size = central.len() as u32;
        out.extend_from_slice(&central);
        out.extend_from_slice(&0x0605_4b50u32.to_le_bytes());
        for field in [0u16, 0, 3, 3] {
            out.extend_from_slice(&field.to_le_bytes());
        }
        out.extend_from_slice(&central_size.to_le_bytes());
        out.extend_from_slice(&central_offset.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out
    }

    #[test]
    fn test_valid_document() {
        let docx = DocxBuilder::new()
            .text("Пример текста на кириллице с датой 27.12.2025")
            .build();
        assert_eq!(validator().validate(&docx), Ok(()));
    }

    #[test]
    fn test_non_zip_inputs_are_malformed() {
        let validator = validator();
        let inputs: [&[u8]; 4] = [b"", b"invalid", b"PK\x03\x04garbage", &[0u8; 64]];
        for input in inputs {
            let error = validator.validate(input).unwrap_err();
            assert!(
                matches!(error, ValidationError::MalformedContainer(_)),
                "{input:?} gave {error:?}"
            );
            assert_eq!(error.category(), FailureCategory::CorruptFile);
        }
    }

    #[test]
    fn test_missing_entry_is_named() {
        let validator = validator();
        for missing in REQUIRED_ENTRIES {
            let docx = DocxBuilder::new()
                .text("Текст 01.01.2020")
                .without_entry(missing)
                .build();
            assert_eq!(
                validator.validate(&docx),
                Err(ValidationError::MissingRequiredEntry(missing))
            );
        }
    }

    #[test]
    fn test_first_missing_entry_wins() {
        let docx = DocxBuilder::new()
            .without_entry("_rels/.rels")
            .without_entry(DOCUMENT_ENTRY)
            .build();
        assert_eq!(
            validator().validate(&docx),
            Err(ValidationError::MissingRequiredEntry("_rels/.rels"))
        );
    }

    #[test]
    fn test_suspicious_path_before_content_checks() {
        let docx = DocxBuilder::new()
            .document_xml("not xml at all")
            .entry("word/../evil.txt", "malicious content")
            .build();
        assert_eq!(
            validator().validate(&docx),
            Err(ValidationError::SuspiciousPath("word/../evil.txt".into()))
        );
    }

    #[test]
    fn test_traversal_outside_namespace_is_ignored() {
        let docx = DocxBuilder::new()
            .text("Текст 01.01.2020")
            .entry("media/../x.png", "png")
            .build();
        assert_eq!(validator().validate(&docx), Ok(()));
    }

    #[test]
    fn test_not_well_formed() {
        let validator = validator();
        let plain = DocxBuilder::new().document_xml("This is not XML at all").build();
        assert_eq!(validator.validate(&plain), Err(ValidationError::NotWellFormed));

        let empty = DocxBuilder::new().document_xml("").build();
        assert_eq!(validator.validate(&empty), Err(ValidationError::NotWellFormed));
    }

    #[test]
    fn test_xml_without_runs_has_no_text() {
        let validator = validator();
        let docx = DocxBuilder::new()
            .document_xml(r#"<?xml version="1.0"?><root>Not a document</root>"#)
            .build();
        assert_eq!(validator.validate(&docx), Err(ValidationError::NoText));

        let docx = DocxBuilder::new().text("1234567890").build();
        assert_eq!(validator.validate(&docx), Err(ValidationError::NoLetters));
    }

    #[test]
    fn test_script_ratio_boundary() {
        let validator = validator();
        let date = " 01.01.2020";

        let exact = format!("{}{}{date}", "ж".repeat(9000), "z".repeat(1000));
        let docx = DocxBuilder::new().text(&exact).build();
        assert_eq!(validator.validate(&docx), Ok(()));

        let below = format!("{}{}{date}", "ж".repeat(8999), "z".repeat(1001));
        let docx = DocxBuilder::new().text(&below).build();
        let error = validator.validate(&docx).unwrap_err();
        assert!(matches!(error, ValidationError::LowScriptRatio { .. }));
    }

    #[test]
    fn test_latin_target() {
        let validator =
            DocumentValidator::new(ValidationConfig::default().with_target_script(TargetScript::Latin))
                .unwrap();
        let docx = DocxBuilder::new().text("Signed on 2024-03-01").build();
        assert_eq!(validator.validate(&docx), Ok(()));
    }

    #[test]
    fn test_no_dates() {
        let docx = DocxBuilder::new().text("Пример текста без даты").build();
        assert_eq!(validator().validate(&docx), Err(ValidationError::NoDatesFound));

        let docx = DocxBuilder::new().text("Невалидная дата 32.13.2025").build();
        assert_eq!(validator().validate(&docx), Err(ValidationError::NoDatesFound));
    }

    #[test]
    fn test_date_spread_boundary() {
        let validator = validator();

        let docx = DocxBuilder::new().text("Даты 01.01.2020 и 2022-12-31").build();
        assert_eq!(validator.validate(&docx), Ok(()));

        let docx = DocxBuilder::new().text("Даты 01.01.2020 и 2023-01-01").build();
        let error = validator.validate(&docx).unwrap_err();
        assert!(matches!(
            error,
            ValidationError::DateSpreadExceeded { days: 1096, .. }
        ));
        assert_eq!(error.category(), FailureCategory::InvalidFile);
    }

    #[test]
    fn test_declared_size_is_not_trusted() {
        let docx = stored_package(b"not xml at all", Some(1 << 62));
        let error = validator().validate(&docx).unwrap_err();
        assert_eq!(error.category(), FailureCategory::CorruptFile, "{error:?}");
    }

    #[test]
    fn test_oversized_body_is_unreadable() {
        let body = b"<w:document><w:t>Text 01.01.2020</w:t></w:document>";
        let docx = stored_package(body, None);
        let mut archive = ZipArchive::new(Cursor::new(docx.as_slice())).unwrap();

        let limit = body.len() as u64;
        assert!(read_entry(&mut archive, DOCUMENT_ENTRY, limit).is_ok());
        assert!(matches!(
            read_entry(&mut archive, DOCUMENT_ENTRY, limit - 1),
            Err(ValidationError::UnreadableDocument(_))
        ));
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let mut body = "<w:document><w:t>Пример ".as_bytes().to_vec();
        body.push(0xFF);
        body.extend_from_slice(" 01.01.2020</w:t></w:document>".as_bytes());
        let docx = stored_package(&body, None);

        let mut archive = ZipArchive::new(Cursor::new(docx.as_slice())).unwrap();
        let content = read_entry(&mut archive, DOCUMENT_ENTRY, MAX_DOCUMENT_BYTES).unwrap();
        assert!(content.contains("Пример \u{FFFD} 01.01.2020"));
        assert_eq!(validator().validate(&docx), Ok(()));
    }
}

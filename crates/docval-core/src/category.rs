//! Failure categories recorded in metrics.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumCount, EnumIter, EnumString, IntoStaticStr};

/// Category attached to every failed event.
///
/// Categories are coarse on purpose: they label metric counters, while the
/// precise reason travels in the response and the logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumString, IntoStaticStr, EnumIter, EnumCount)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FailureCategory {
    /// The event or document content is not acceptable.
    InvalidFile,
    /// A required part of the document package is absent.
    MissingParts,
    /// The document bytes are damaged or unreachable.
    CorruptFile,
    /// Anything that does not fit the categories above.
    #[default]
    Unknown,
}

impl FailureCategory {
    /// Position of this category in per-category counter arrays.
    #[inline]
    pub(crate) const fn index(self) -> usize {
        match self {
            Self::InvalidFile => 0,
            Self::MissingParts => 1,
            Self::CorruptFile => 2,
            Self::Unknown => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn test_indices_are_dense() {
        let mut seen = [false; FailureCategory::COUNT];
        for category in FailureCategory::iter() {
            assert!(!seen[category.index()]);
            seen[category.index()] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn test_snake_case_names() {
        assert_eq!(FailureCategory::InvalidFile.as_ref(), "invalid_file");
        assert_eq!(FailureCategory::MissingParts.as_ref(), "missing_parts");
        assert_eq!(FailureCategory::CorruptFile.as_ref(), "corrupt_file");
        assert_eq!(
            serde_json::to_string(&FailureCategory::Unknown).unwrap(),
            "\"unknown\""
        );
    }
}

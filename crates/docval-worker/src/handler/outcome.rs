use docval_core::{FailureCategory, OutboundResponse};

/// Response code for an event without an object name.
pub(crate) const MISSING_OBJECT_NAME: &str = "missing_object_name";
/// Response code for an event without a document id.
pub(crate) const MISSING_DOCUMENT_ID: &str = "missing_document_id";
/// Response code when the object store request fails.
pub(crate) const OBJECT_FETCH_FAILED: &str = "object_fetch_failed";
/// Response code when the object body cannot be read.
pub(crate) const OBJECT_READ_FAILED: &str = "object_read_failed";

/// Terminal state of a single event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The document passed validation and was persisted.
    Valid,
    /// A stage rejected the event.
    Invalid {
        /// Metric category the failure is counted under.
        category: FailureCategory,
        /// Text sent back in the `error` field of the response.
        reason: String,
    },
}

impl Outcome {
    pub(crate) fn invalid(category: FailureCategory, reason: impl Into<String>) -> Self {
        Self::Invalid {
            category,
            reason: reason.into(),
        }
    }

    /// Returns true for [`Outcome::Valid`].
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Builds the response for `request_id`.
    pub fn response(&self, request_id: &str) -> OutboundResponse {
        match self {
            Self::Valid => OutboundResponse::valid(request_id),
            Self::Invalid { reason, .. } => OutboundResponse::invalid(request_id, reason.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use docval_core::ResponseStatus;

    use super::*;

    #[test]
    fn test_response_for_outcome() {
        let response = Outcome::Valid.response("r-1");
        assert_eq!(response.status, ResponseStatus::Valid);
        assert_eq!(response.error, None);

        let response =
            Outcome::invalid(FailureCategory::CorruptFile, OBJECT_FETCH_FAILED).response("r-2");
        assert_eq!(response.status, ResponseStatus::Invalid);
        assert_eq!(response.error.as_deref(), Some("object_fetch_failed"));
    }
}

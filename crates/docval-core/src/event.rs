//! Inbound event and outbound response wire types.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString, IntoStaticStr};

use crate::{Error, Result};

/// A validation request delivered by the inbound queue.
///
/// Decoded once at ingress. Missing string fields decode as empty and are
/// rejected by the pipeline with a dedicated response code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundEvent {
    /// Correlation id echoed in the response. Events without one get no response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Object name inside the configured bucket.
    #[serde(default)]
    pub object_name: String,
    /// Storage key for the accepted document.
    #[serde(default)]
    pub document_id: String,
}

impl InboundEvent {
    /// Decodes an event from its JSON payload.
    pub fn from_slice(payload: &[u8]) -> Result<Self> {
        serde_json::from_slice(payload)
            .map_err(|e| Error::from(e).with_message("inbound event is not valid JSON"))
    }

    /// Returns the request id, treating an empty string as absent.
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// Final verdict carried by an [`OutboundResponse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumString, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ResponseStatus {
    /// Document accepted and persisted.
    Valid,
    /// Document rejected at some stage.
    Invalid,
}

/// Response published for every event that carries a request id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundResponse {
    pub request_id: String,
    pub status: ResponseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OutboundResponse {
    /// Creates a `valid` response.
    pub fn valid(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            status: ResponseStatus::Valid,
            error: None,
        }
    }

    /// Creates an `invalid` response with the given error text.
    pub fn invalid(request_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            status: ResponseStatus::Invalid,
            error: Some(error.into()),
        }
    }

    /// Encodes the response as JSON.
    pub fn to_vec(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| Error::from_source(crate::ErrorKind::Internal, e))
    }
}

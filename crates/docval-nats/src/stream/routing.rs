//! Routing key propagation between requests and responses.

use async_nats::HeaderMap;

/// Header carrying the routing key of a request and its response.
pub const ROUTING_KEY_HEADER: &str = "Docval-Routing-Key";

/// Returns the routing key for an inbound message.
///
/// Prefers a non-empty [`ROUTING_KEY_HEADER`], falling back to the subject.
pub fn routing_key(headers: Option<&HeaderMap>, subject: &str) -> String {
    headers
        .and_then(|headers| headers.get(ROUTING_KEY_HEADER))
        .map(|value| value.as_str())
        .filter(|value| !value.is_empty())
        .unwrap_or(subject)
        .to_owned()
}

/// Builds the headers for an outbound message.
pub(crate) fn routing_headers(routing_key: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Some(key) = routing_key.filter(|key| !key.is_empty()) {
        headers.insert(ROUTING_KEY_HEADER, key);
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_wins() {
        let mut headers = HeaderMap::new();
        headers.insert(ROUTING_KEY_HEADER, "tenant-42");
        assert_eq!(
            routing_key(Some(&headers), "documents.validate"),
            "tenant-42"
        );
    }

    #[test]
    fn test_subject_fallback() {
        assert_eq!(routing_key(None, "documents.validate"), "documents.validate");

        let mut headers = HeaderMap::new();
        headers.insert("Other", "value");
        assert_eq!(
            routing_key(Some(&headers), "documents.validate"),
            "documents.validate"
        );

        let mut headers = HeaderMap::new();
        headers.insert(ROUTING_KEY_HEADER, "");
        assert_eq!(
            routing_key(Some(&headers), "documents.validate"),
            "documents.validate"
        );
    }

    #[test]
    fn test_outbound_headers() {
        let headers = routing_headers(Some("tenant-42"));
        assert_eq!(
            headers.get(ROUTING_KEY_HEADER).map(|v| v.as_str()),
            Some("tenant-42")
        );

        let headers = routing_headers(None);
        assert!(headers.get(ROUTING_KEY_HEADER).is_none());
    }
}

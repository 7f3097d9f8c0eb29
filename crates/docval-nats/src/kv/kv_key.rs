use crate::{Error, Result};

const ESCAPE: char = '=';

/// Maps an arbitrary key onto the NATS key alphabet.
///
/// Letters, digits, `-`, `_` and `/` pass through. Every other byte, the
/// escape character included, becomes `=XX` in upper-case hex, so distinct
/// inputs never share a normalised key.
pub fn normalize_key(key: &str) -> Result<String> {
    if key.is_empty() {
        return Err(Error::InvalidKey(key.to_owned()));
    }

    let mut normalized = String::with_capacity(key.len());
    for byte in key.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' | b'/' => {
                normalized.push(char::from(byte));
            }
            _ => {
                normalized.push(ESCAPE);
                normalized.push_str(&format!("{byte:02X}"));
            }
        }
    }

    Ok(normalized)
}

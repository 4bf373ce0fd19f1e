//! Stored value encoding.
//!
//! Values are written as JSON, so a level lands in the store as `"DEBUG"`.
//! Writers outside this crate sometimes quote twice; decoding unwraps every
//! layer of string quoting before use.

use serde::Serialize;

/// Serialize a value the way it is persisted.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(value)
}

/// Decode a stored payload into its plain string form.
///
/// Returns `None` for payloads that are not UTF-8 or are empty once unwrapped.
pub fn decode_str(raw: &[u8]) -> Option<String> {
    let text = std::str::from_utf8(raw).ok()?;
    let mut current = text.trim().to_string();

    while let Ok(inner) = serde_json::from_str::<String>(&current) {
        let inner = inner.trim().to_string();
        if inner == current {
            break;
        }
        current = inner;
    }

    let unquoted = current.trim_matches('"').trim();
    if unquoted.is_empty() {
        None
    } else {
        Some(unquoted.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_plain_and_quoted() {
        assert_eq!(decode_str(b"DEBUG").as_deref(), Some("DEBUG"));
        assert_eq!(decode_str(b"\"DEBUG\"").as_deref(), Some("DEBUG"));
        assert_eq!(decode_str(b" \"WARN\"\n").as_deref(), Some("WARN"));
    }

    #[test]
    fn test_decode_double_encoded() {
        let twice = serde_json::to_vec(&serde_json::to_string("INFO").unwrap()).unwrap();
        assert_eq!(decode_str(&twice).as_deref(), Some("INFO"));
    }

    #[test]
    fn test_decode_rejects_empty_and_binary() {
        assert_eq!(decode_str(b""), None);
        assert_eq!(decode_str(b"\"\""), None);
        assert_eq!(decode_str(&[0xff, 0xfe]), None);
    }

    #[test]
    fn test_encode_matches_decode() {
        let raw = encode("ERROR").unwrap();
        assert_eq!(raw, b"\"ERROR\"");
        assert_eq!(decode_str(&raw).as_deref(), Some("ERROR"));
    }
}

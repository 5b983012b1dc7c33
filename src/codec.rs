//! Base64 encode/decode helpers.
//!
//! Unrelated to the mailing pipeline except that the SMTP password is
//! stored base64-encoded in the configuration file.

use base64::{engine::general_purpose, Engine as _};
use serde::Serialize;

use crate::error::{FileMailerError, Result};

/// Both sides of a base64 transform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncodedPair {
    pub encoded: String,
    pub decoded: String,
}

/// Encode UTF-8 text as standard padded base64.
pub fn encode(plain: &str) -> EncodedPair {
    EncodedPair {
        encoded: general_purpose::STANDARD.encode(plain.as_bytes()),
        decoded: plain.to_string(),
    }
}

/// Decode standard base64 into UTF-8 text.
///
/// Surrounding whitespace is ignored. Invalid base64 or a payload that is not
/// valid UTF-8 is an error.
pub fn decode(encoded: &str) -> Result<EncodedPair> {
    let trimmed = encoded.trim();
    let bytes = general_purpose::STANDARD
        .decode(trimmed)
        .map_err(|e| FileMailerError::Decode(e.to_string()))?;
    let decoded = String::from_utf8(bytes)
        .map_err(|e| FileMailerError::Decode(format!("payload is not UTF-8: {e}")))?;
    Ok(EncodedPair {
        encoded: trimmed.to_string(),
        decoded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode() {
        let pair = encode("secret");
        assert_eq!(pair.encoded, "c2VjcmV0");
        assert_eq!(pair.decoded, "secret");
    }

    #[test]
    fn test_decode_non_ascii() {
        let pair = decode("ZW52w61v").unwrap();
        assert_eq!(pair.decoded, "env\u{ed}o");
    }

    #[test]
    fn test_decode_trims_whitespace() {
        let pair = decode("  c2VjcmV0\n").unwrap();
        assert_eq!(pair.decoded, "secret");
        assert_eq!(pair.encoded, "c2VjcmV0");
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(decode("@@@"), Err(FileMailerError::Decode(_))));
    }

    #[test]
    fn test_decode_rejects_invalid_utf8() {
        // 0xff 0xfe
        assert!(decode("//4=").is_err());
    }

    #[test]
    fn test_empty_string() {
        assert_eq!(encode("").encoded, "");
        assert_eq!(decode("").unwrap().decoded, "");
    }
}

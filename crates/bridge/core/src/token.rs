//! Registration and device token types.

use crate::BridgeError;

/// Backend-issued registration token.
///
/// Opaque to the bridge. A new value replaces the old one wholesale; there is
/// no expiry, a token stays valid until superseded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct RegistrationToken(String);

impl RegistrationToken {
    /// Wrap a token value. Empty values are treated as "no token".
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return None;
        }
        Some(Self(value))
    }

    /// Token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RegistrationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Raw device token handed over by the OS after remote-notification
/// registration.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DeviceToken(Vec<u8>);

impl DeviceToken {
    /// Wrap raw token bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Parse a hex-encoded device token.
    pub fn from_hex(hex: &str) -> Result<Self, BridgeError> {
        let hex = hex.trim();
        let digits = hex.as_bytes();
        if digits.is_empty()
            || digits.len() % 2 != 0
            || !digits.iter().all(u8::is_ascii_hexdigit)
        {
            return Err(BridgeError::malformed(
                "device token must be non-empty even-length hex",
            ));
        }

        let bytes = digits
            .chunks(2)
            .map(|pair| (hex_digit(pair[0]) << 4) | hex_digit(pair[1]))
            .collect();

        Ok(Self(bytes))
    }

    /// Raw token bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Get device token as lowercase hex string.
    pub fn hex(&self) -> String {
        hex_encode(&self.0)
    }
}

/// Value of an ASCII hex digit. Callers check `is_ascii_hexdigit` first.
fn hex_digit(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        _ => digit.to_ascii_lowercase() - b'a' + 10,
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_token_is_absent() {
        assert!(RegistrationToken::new("").is_none());
        assert!(RegistrationToken::new("   ").is_none());
        assert_eq!(RegistrationToken::new("T1").unwrap().as_str(), "T1");
    }

    #[test]
    fn test_device_token_hex() {
        let token = DeviceToken::from_hex("00ABff10").unwrap();
        assert_eq!(token.as_bytes(), &[0x00, 0xab, 0xff, 0x10]);
        assert_eq!(token.hex(), "00abff10");
    }

    #[test]
    fn test_device_token_rejects_bad_hex() {
        assert!(DeviceToken::from_hex("abc").is_err());
        assert!(DeviceToken::from_hex("zz").is_err());
        assert!(DeviceToken::from_hex("").is_err());
    }

    #[test]
    fn test_device_token_rejects_non_ascii() {
        // Even byte length, but 'é' straddles a two-byte chunk boundary.
        let err = DeviceToken::from_hex("a\u{e9}a").unwrap_err();
        assert!(matches!(err, BridgeError::MalformedPayload(_)));

        assert!(DeviceToken::from_hex("\u{e9}\u{e9}").is_err());
        assert!(DeviceToken::from_hex("+f").is_err());
    }
}

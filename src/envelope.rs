///////////////////////////////////////////////////////////////////////////////
//
//  Copyright 2018-2025 Robonomics Network <research@robonomics.network>
//
//  Licensed under the Apache License, Version 2.0 (the "License");
//  you may not use this file except in compliance with the License.
//  You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.
//
///////////////////////////////////////////////////////////////////////////////
//! The plaintext envelope wrapped around every message before encryption.
//!
//! An envelope carries the UTC capture timestamp, the percent-encoded message
//! text, and a base64 SHA-256 checksum. The checksum is always computed over
//! the raw (decoded) message bytes; percent-encoding is a transport encoding
//! applied after hashing on build and reversed before hashing on verify, so
//! both sides hash identical bytes.
//!
//! Envelopes are created fresh per outbound message immediately before
//! encryption, never persisted, and serialized as a canonical JSON object
//! with fixed key order:
//!
//! ```text
//! {"TIMESTAMP":"<ISO-8601 UTC>","MESSAGE":"<percent-encoded>","CHECKSUM":"<base64 SHA-256>"}
//! ```

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{SecondsFormat, Utc};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// Characters escaped the way JavaScript `encodeURIComponent` does:
/// everything except alphanumerics and `- _ . ! ~ * ' ( )`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Plaintext envelope prepared for encryption.
///
/// # Examples
///
/// ```
/// use smqtt::Envelope;
///
/// let envelope = Envelope::build("Hello, World!");
/// assert_eq!(envelope.verify().unwrap(), "Hello, World!");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Capture time, ISO-8601 UTC.
    #[serde(rename = "TIMESTAMP")]
    pub timestamp: String,
    /// Percent-encoded message text.
    #[serde(rename = "MESSAGE")]
    pub message: String,
    /// Base64 SHA-256 digest of the raw message text.
    #[serde(rename = "CHECKSUM")]
    pub checksum: String,
}

impl Envelope {
    /// Build an envelope around `message`, capturing the current UTC time.
    pub fn build(message: &str) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            message: utf8_percent_encode(message, COMPONENT).to_string(),
            checksum: checksum_of(message),
        }
    }

    /// Verify the checksum and return the raw (decoded) message.
    ///
    /// The comparison is not constant-time: the checksum is an integrity
    /// check against transport corruption, not a MAC. Anyone holding the
    /// public key can craft a validly checksummed envelope.
    ///
    /// # Errors
    ///
    /// [`Error::Format`] if the `MESSAGE` field is not valid percent-encoded
    /// UTF-8, [`Error::IntegrityMismatch`] if the recomputed checksum
    /// differs.
    pub fn verify(&self) -> Result<String> {
        let raw = percent_decode_str(&self.message)
            .decode_utf8()
            .map_err(|e| Error::Format(format!("message is not valid UTF-8: {e}")))?;

        if checksum_of(&raw) != self.checksum {
            return Err(Error::IntegrityMismatch);
        }
        Ok(raw.into_owned())
    }

    /// Serialize to canonical JSON bytes for encryption.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| Error::Format(format!("cannot serialize envelope: {e}")))
    }

    /// Parse an envelope from decrypted JSON bytes.
    ///
    /// # Errors
    ///
    /// [`Error::Format`] on malformed JSON or missing fields.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| Error::Format(format!("invalid envelope: {e}")))
    }
}

/// `base64(SHA-256(message))` over the raw message text.
fn checksum_of(message: &str) -> String {
    BASE64.encode(Sha256::digest(message.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_verify_roundtrip() {
        let envelope = Envelope::build("Hello, World!");
        assert_eq!(envelope.verify().unwrap(), "Hello, World!");
    }

    #[test]
    fn test_checksum_over_raw_message() {
        // Known vector: base64(sha256("Hello, World!"))
        let envelope = Envelope::build("Hello, World!");
        assert_eq!(envelope.checksum, "3/1gIbsr1bCvZ2KQgJ7DpTGR3YHH9wpLKGiKNiGCmG8=");
    }

    #[test]
    fn test_message_is_percent_encoded() {
        let envelope = Envelope::build("héllo & wörld / 100% !*'()~");
        assert_eq!(
            envelope.message,
            "h%C3%A9llo%20%26%20w%C3%B6rld%20%2F%20100%25%20!*'()~"
        );
        // Verification sees through the transport encoding.
        assert_eq!(envelope.verify().unwrap(), "héllo & wörld / 100% !*'()~");
    }

    #[test]
    fn test_tampered_checksum_rejected() {
        let mut envelope = Envelope::build("Hello, World!");
        envelope.checksum = checksum_of("Goodbye, World!");
        assert!(matches!(envelope.verify(), Err(Error::IntegrityMismatch)));
    }

    #[test]
    fn test_tampered_message_rejected() {
        let mut envelope = Envelope::build("Hello, World!");
        envelope.message = "Hello%2C%20Mallory!".to_string();
        assert!(matches!(envelope.verify(), Err(Error::IntegrityMismatch)));
    }

    #[test]
    fn test_canonical_key_order() {
        let envelope = Envelope::build("hi");
        let json = String::from_utf8(envelope.to_bytes().unwrap()).unwrap();
        let timestamp = json.find("\"TIMESTAMP\"").unwrap();
        let message = json.find("\"MESSAGE\"").unwrap();
        let checksum = json.find("\"CHECKSUM\"").unwrap();
        assert!(timestamp < message && message < checksum);
    }

    #[test]
    fn test_serialization_roundtrip() {
        let envelope = Envelope::build("payload");
        let parsed = Envelope::from_bytes(&envelope.to_bytes().unwrap()).unwrap();
        assert_eq!(parsed, envelope);
    }

    #[test]
    fn test_malformed_bytes_rejected() {
        assert!(matches!(
            Envelope::from_bytes(b"not json at all"),
            Err(Error::Format(_))
        ));
        // Valid JSON but missing fields is equally malformed.
        assert!(matches!(
            Envelope::from_bytes(b"{\"TIMESTAMP\":\"2024-01-01T00:00:00.000Z\"}"),
            Err(Error::Format(_))
        ));
    }

    #[test]
    fn test_timestamp_is_utc_iso8601() {
        let envelope = Envelope::build("x");
        assert!(envelope.timestamp.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&envelope.timestamp).is_ok());
    }
}

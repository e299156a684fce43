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
//! The wire-level frame carried as the MQTT message body.
//!
//! A frame wraps an ordered sequence of base64 RSA-encrypted envelopes under
//! a single field:
//!
//! ```text
//! {"SMQTT":["<base64 ciphertext>", ...]}
//! ```
//!
//! A frame may batch multiple envelopes, though typical usage carries exactly
//! one. Insertion order is preserved through pack and unpack. Frames have no
//! identity beyond a single publish/receive transaction.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Wire frame holding one or more encrypted envelopes.
///
/// # Examples
///
/// ```
/// use smqtt::Frame;
///
/// let frame = Frame::pack(vec!["ciphertext".to_string()]);
/// let bytes = frame.to_bytes().unwrap();
/// let unpacked = Frame::unpack(&bytes).unwrap();
/// assert_eq!(unpacked.sealed(), frame.sealed());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    /// Ordered base64 ciphertexts, one per envelope.
    #[serde(rename = "SMQTT")]
    sealed: Vec<String>,
}

impl Frame {
    /// Wrap an ordered sequence of sealed envelopes.
    pub fn pack(sealed: Vec<String>) -> Self {
        Self { sealed }
    }

    /// The sealed envelopes, in packing order.
    pub fn sealed(&self) -> &[String] {
        &self.sealed
    }

    /// Serialize the frame as the MQTT wire payload.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| Error::Format(format!("cannot serialize frame: {e}")))
    }

    /// Parse a frame from a raw MQTT payload.
    ///
    /// # Errors
    ///
    /// [`Error::Format`] on invalid JSON or a missing `SMQTT` field. The
    /// subscriber treats this as a recoverable per-message failure.
    pub fn unpack(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| Error::Format(format!("invalid frame: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_unpack_preserves_order() {
        let sealed = vec!["one".to_string(), "two".to_string(), "three".to_string()];
        let frame = Frame::pack(sealed.clone());

        let unpacked = Frame::unpack(&frame.to_bytes().unwrap()).unwrap();
        assert_eq!(unpacked.sealed(), sealed.as_slice());
    }

    #[test]
    fn test_wire_format() {
        let frame = Frame::pack(vec!["abc".to_string()]);
        let json = String::from_utf8(frame.to_bytes().unwrap()).unwrap();
        assert_eq!(json, r#"{"SMQTT":["abc"]}"#);
    }

    #[test]
    fn test_unpack_invalid_json() {
        assert!(matches!(
            Frame::unpack(b"{{{ not json"),
            Err(Error::Format(_))
        ));
    }

    #[test]
    fn test_unpack_missing_field() {
        assert!(matches!(
            Frame::unpack(br#"{"OTHER":["abc"]}"#),
            Err(Error::Format(_))
        ));
    }

    #[test]
    fn test_empty_frame_roundtrip() {
        let frame = Frame::pack(Vec::new());
        let unpacked = Frame::unpack(&frame.to_bytes().unwrap()).unwrap();
        assert!(unpacked.sealed().is_empty());
    }
}

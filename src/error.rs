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
//! Errors that can occur during secure envelope operations.
//!
//! Connection-level failures are fatal to the publish or subscribe call that
//! hit them and propagate to the caller. Per-element failures on the
//! subscriber side ([`Error::Decrypt`], [`Error::Format`],
//! [`Error::IntegrityMismatch`]) are recoverable: the subscriber logs them,
//! drops the offending element, and keeps the subscription alive.

/// SMQTT Result typedef.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the secure envelope protocol and its MQTT transport.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Cannot reach or maintain the broker connection.
    #[error("broker connection failed: {0}")]
    Connection(String),

    /// Broker rejected a publish or the connection dropped mid-publish.
    #[error("publish failed: {0}")]
    Publish(String),

    /// Serialized envelope exceeds the RSA-OAEP plaintext capacity.
    #[error("message too large: {size} bytes exceeds encryption capacity of {limit} bytes")]
    MessageTooLarge {
        /// Serialized envelope size in bytes.
        size: usize,
        /// Usable plaintext capacity of the key in bytes.
        limit: usize,
    },

    /// Ciphertext could not be decrypted: wrong key, invalid padding,
    /// or not valid base64.
    #[error("decryption failed: {0}")]
    Decrypt(String),

    /// Inbound data is not a valid frame or envelope.
    #[error("malformed payload: {0}")]
    Format(String),

    /// Checksum of a decrypted envelope does not match its message.
    #[error("checksum mismatch: envelope corrupted or forged")]
    IntegrityMismatch,

    /// Key generation, encoding, or parsing failed.
    #[error("key error: {0}")]
    Key(String),

    /// Filesystem error while persisting or loading key material.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::MessageTooLarge {
            size: 215,
            limit: 214,
        };
        assert_eq!(
            err.to_string(),
            "message too large: 215 bytes exceeds encryption capacity of 214 bytes"
        );

        let err = Error::IntegrityMismatch;
        assert_eq!(
            err.to_string(),
            "checksum mismatch: envelope corrupted or forged"
        );

        let err = Error::Connection("refused".to_string());
        assert_eq!(err.to_string(), "broker connection failed: refused");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such key file");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}

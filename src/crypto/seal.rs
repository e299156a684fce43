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
//! RSA-OAEP sealing of serialized envelopes.
//!
//! Envelopes are encrypted directly under the recipient's RSA public key with
//! OAEP/SHA-1 padding and carried on the wire as base64 text. Direct RSA
//! bounds the plaintext by the modulus size minus the padding overhead: for a
//! 2048-bit key that is 214 bytes. Oversized envelopes are rejected with
//! [`Error::MessageTooLarge`] before touching the cipher, so the failure is
//! deterministic rather than key-dependent.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use log::{debug, trace};
use rsa::traits::PublicKeyParts;
use rsa::Oaep;
use sha1::Sha1;

use super::keys::{PrivateKey, PublicKey};
use crate::error::{Error, Result};

/// OAEP padding overhead in bytes: two SHA-1 digests plus two.
const OAEP_OVERHEAD: usize = 2 * 20 + 2;

/// Usable plaintext capacity of `public_key` in bytes.
///
/// For a 2048-bit modulus with OAEP/SHA-1 padding this is 214.
pub fn max_plaintext_len(public_key: &PublicKey) -> usize {
    public_key.0.size() - OAEP_OVERHEAD
}

/// Encrypt `plaintext` under `public_key` and return base64 ciphertext.
///
/// # Errors
///
/// Returns [`Error::MessageTooLarge`] when the plaintext exceeds
/// [`max_plaintext_len`] for the key.
pub fn encrypt(plaintext: &[u8], public_key: &PublicKey) -> Result<String> {
    let limit = max_plaintext_len(public_key);
    if plaintext.len() > limit {
        return Err(Error::MessageTooLarge {
            size: plaintext.len(),
            limit,
        });
    }

    trace!("Encrypting {} bytes (capacity {})", plaintext.len(), limit);
    let mut rng = rand::thread_rng();
    let ciphertext = public_key
        .0
        .encrypt(&mut rng, Oaep::new::<Sha1>(), plaintext)
        .map_err(|e| Error::Key(format!("RSA encryption failed: {e}")))?;

    debug!(
        "Encrypted {} bytes plaintext -> {} bytes ciphertext",
        plaintext.len(),
        ciphertext.len()
    );
    Ok(BASE64.encode(ciphertext))
}

/// Decrypt base64 `ciphertext` with `private_key`.
///
/// # Errors
///
/// Returns [`Error::Decrypt`] if the input is not valid base64, the key does
/// not match, or the OAEP padding is invalid. This is the expected outcome
/// for a subscriber holding the wrong private key and must not crash the
/// subscription.
pub fn decrypt(ciphertext: &str, private_key: &PrivateKey) -> Result<Vec<u8>> {
    let raw = BASE64
        .decode(ciphertext)
        .map_err(|e| Error::Decrypt(format!("invalid base64 ciphertext: {e}")))?;

    let plaintext = private_key
        .0
        .decrypt(Oaep::new::<Sha1>(), &raw)
        .map_err(|e| Error::Decrypt(format!("RSA decryption failed: {e}")))?;

    trace!(
        "Decrypted {} bytes ciphertext -> {} bytes plaintext",
        raw.len(),
        plaintext.len()
    );
    Ok(plaintext)
}

#[cfg(test)]
mod tests {
    use super::super::keys::test_support::{keypair, other_keypair};
    use super::*;

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let pair = keypair();
        let plaintext = b"secret message";

        let sealed = encrypt(plaintext, pair.public()).unwrap();
        let opened = decrypt(&sealed, pair.private()).unwrap();

        assert_eq!(opened, plaintext);
    }

    #[test]
    fn test_capacity_boundary() {
        let pair = keypair();
        let limit = max_plaintext_len(pair.public());
        assert_eq!(limit, 214);

        // Exactly at the limit succeeds.
        let at_limit = vec![0x42u8; limit];
        assert!(encrypt(&at_limit, pair.public()).is_ok());

        // One byte over fails deterministically.
        let over_limit = vec![0x42u8; limit + 1];
        match encrypt(&over_limit, pair.public()) {
            Err(Error::MessageTooLarge { size, limit }) => {
                assert_eq!(size, 215);
                assert_eq!(limit, 214);
            }
            other => panic!("expected MessageTooLarge, got {:?}", other),
        }
    }

    #[test]
    fn test_wrong_key_fails() {
        let sealed = encrypt(b"for the other party", keypair().public()).unwrap();

        let result = decrypt(&sealed, other_keypair().private());
        assert!(matches!(result, Err(Error::Decrypt(_))));
    }

    #[test]
    fn test_corrupted_ciphertext_fails() {
        let pair = keypair();
        let sealed = encrypt(b"fragile", pair.public()).unwrap();

        // Flip one byte of the raw ciphertext and re-encode.
        let mut raw = BASE64.decode(&sealed).unwrap();
        raw[10] ^= 0xff;
        let corrupted = BASE64.encode(raw);

        let result = decrypt(&corrupted, pair.private());
        assert!(matches!(result, Err(Error::Decrypt(_))));
    }

    #[test]
    fn test_invalid_base64_fails() {
        let result = decrypt("not base64!!!", keypair().private());
        assert!(matches!(result, Err(Error::Decrypt(_))));
    }
}

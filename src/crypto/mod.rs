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
//! Key management and RSA-OAEP envelope sealing.
//!
//! # Cryptographic architecture
//!
//! 1. **Key pairs**: 2048-bit RSA, public half SPKI/PEM, private half
//!    PKCS8/PEM ([`keys`]).
//! 2. **Sealing**: serialized envelopes are encrypted directly with
//!    RSA-OAEP/SHA-1 under the recipient's public key and transported as
//!    base64 text ([`seal`]).
//!
//! Direct RSA gives confidentiality in transit but not authenticity: the
//! public key is, by definition, public, so any holder can produce a validly
//! checksummed envelope. The envelope checksum guards against corruption,
//! not against a capable adversary.

pub mod keys;
pub mod seal;

pub use keys::{KeyPair, PrivateKey, PublicKey, RSA_BITS};

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
//! # smqtt - Secure Envelope Messaging over MQTT
//!
//! `smqtt` provides message-level confidentiality and integrity over ordinary,
//! unencrypted MQTT brokers. Each message is wrapped in a timestamped,
//! checksummed envelope, encrypted with the recipient's RSA public key, and
//! published as part of a JSON frame. Only the holder of the matching private
//! key can recover the plaintext; the broker, the network, and other topic
//! subscribers see ciphertext.
//!
//! ## Features
//!
//! - **RSA-2048 key management**: generation, PEM import/export, key files
//!   with restricted permissions
//! - **Envelope codec**: ISO-8601 timestamps, percent-encoded payloads, and
//!   SHA-256 integrity checksums
//! - **Frame batching**: multiple sealed messages per MQTT publish
//! - **Fault-tolerant subscriber**: undecodable messages are logged and
//!   skipped, never fatal
//!
//! ## Quick Start
//!
//! ```no_run
//! use smqtt::crypto::KeyPair;
//! use smqtt::mqtt::{self, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let pair = KeyPair::generate()?;
//!     let config = Config {
//!         broker: "mqtt://localhost:1883".to_string(),
//!         ..Config::default()
//!     };
//!
//!     // Publishers only need the public key.
//!     mqtt::publish(
//!         &config,
//!         "sensors/garden",
//!         pair.public(),
//!         &["21.4C".to_string()],
//!     )
//!     .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`crypto`]: RSA key management and the sealing cipher
//! - [`envelope`]: the timestamped, checksummed message envelope
//! - [`frame`]: the on-wire JSON frame carrying sealed envelopes
//! - [`mqtt`]: broker configuration, publisher, and subscriber
//! - [`config`]: JSON configuration file support for the CLI
//!
//! ## Security Model
//!
//! The scheme provides confidentiality and accidental-corruption detection,
//! not sender authentication: anyone holding the public key can publish a
//! well-formed frame. Pair it with broker-level authentication if senders
//! must be trusted. Plaintext capacity is bounded by the RSA modulus; see
//! [`crypto::seal::max_plaintext_len`].
//!
//! ## Safety
//!
//! This crate uses `#![forbid(unsafe_code)]` to ensure memory safety.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod crypto;
pub mod envelope;
pub mod error;
pub mod frame;
pub mod mqtt;

// Re-export commonly used types for convenience
pub use envelope::Envelope;
pub use error::{Error, Result};
pub use frame::Frame;

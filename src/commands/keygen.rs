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
//! `smqtt keygen` - generate and store a fresh RSA key pair.

use std::path::Path;

use anyhow::{bail, Result};

use smqtt::crypto::KeyPair;

/// Generate a new key pair and write both PEM files under `key_dir`.
///
/// Refuses to overwrite existing key files.
pub fn execute(key_dir: &Path, name: &str) -> Result<()> {
    let public_path = key_dir.join(format!("{name}.pub.pem"));
    let private_path = key_dir.join(format!("{name}.priv.pem"));
    if public_path.exists() || private_path.exists() {
        bail!(
            "key files for '{}' already exist in {}; remove them first",
            name,
            key_dir.display()
        );
    }

    let pair = KeyPair::generate()?;
    let (public_path, private_path) = pair.save(key_dir, name)?;

    println!("Public key:  {}", public_path.display());
    println!("Private key: {}", private_path.display());
    println!("Share the public key with publishers; keep the private key on the subscriber only.");
    Ok(())
}

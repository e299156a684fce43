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
//! `smqtt pub` - seal messages and publish them to a topic.

use anyhow::{Context, Result};
use log::info;
use tokio::io::{AsyncBufReadExt, BufReader};

use smqtt::crypto::PublicKey;
use smqtt::mqtt::{self, Config};

/// Seal `messages` to `public_key` and publish them as one frame.
///
/// A single message of `-` switches to stdin mode: each line read from
/// standard input is published as its own frame until EOF.
pub async fn execute(
    config: &Config,
    topic: &str,
    public_key: &PublicKey,
    messages: Vec<String>,
) -> Result<()> {
    if messages.len() == 1 && messages[0] == "-" {
        return execute_stdin(config, topic, public_key).await;
    }

    mqtt::publish(config, topic, public_key, &messages)
        .await
        .with_context(|| format!("cannot publish to topic '{topic}'"))?;
    info!("published {} message(s) to '{}'", messages.len(), topic);
    Ok(())
}

/// Read lines from stdin and publish each as a single-message frame.
async fn execute_stdin(config: &Config, topic: &str, public_key: &PublicKey) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        if line.is_empty() {
            continue;
        }
        mqtt::publish(config, topic, public_key, &[line])
            .await
            .with_context(|| format!("cannot publish to topic '{topic}'"))?;
        info!("published 1 message to '{}'", topic);
    }
    Ok(())
}

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
//! `smqtt sub` - subscribe to a topic and print recovered messages.

use anyhow::{Context, Result};

use smqtt::crypto::PrivateKey;
use smqtt::mqtt::{self, Config};

/// Subscribe to `topic` and print each recovered message to stdout.
///
/// Runs until interrupted or until the broker connection is lost for good.
pub async fn execute(config: &Config, topic: &str, private_key: &PrivateKey) -> Result<()> {
    mqtt::subscribe(
        config,
        topic,
        private_key,
        Box::new(|delivery| {
            println!("{} [{}] {}", delivery.timestamp, delivery.topic, delivery.message);
        }),
    )
    .await
    .with_context(|| format!("subscription to topic '{topic}' failed"))
}

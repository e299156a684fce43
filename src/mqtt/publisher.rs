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
//! Sealing and publishing of message batches as a single frame.

use log::{debug, trace};
use rumqttc::{AsyncClient, Event, Outgoing, Packet, QoS};

use crate::crypto::{seal, PublicKey};
use crate::envelope::Envelope;
use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::mqtt::Config;

/// Seal a batch of messages and publish them as one frame to `topic`.
///
/// Each message is wrapped in an [`Envelope`] and encrypted to `public_key`;
/// the sealed elements are packed into a single frame in input order and
/// published in one MQTT message. If any message fails to seal (for example
/// because its envelope exceeds the RSA capacity), nothing is published and
/// the failing message's error is returned.
///
/// The connection is opened for this call and closed before it returns, once
/// the broker has acknowledged the publish at the configured QoS level.
///
/// # Errors
///
/// Returns [`Error::MessageTooLarge`] when an envelope exceeds the cipher
/// capacity, [`Error::Connection`] when the broker is unreachable, and
/// [`Error::Publish`] when the publish itself is rejected.
pub async fn publish(
    config: &Config,
    topic: &str,
    public_key: &PublicKey,
    messages: &[String],
) -> Result<()> {
    // Seal everything before touching the network: a frame is all-or-nothing.
    let mut sealed = Vec::with_capacity(messages.len());
    for message in messages {
        let envelope = Envelope::build(message);
        sealed.push(seal::encrypt(&envelope.to_bytes()?, public_key)?);
    }
    let payload = Frame::pack(sealed).to_bytes()?;

    let qos = config.qos()?;
    let options = config.options("smqtt-pub")?;
    debug!("publishing {} message(s) to topic '{}'", messages.len(), topic);

    let (client, mut eventloop) = AsyncClient::new(options, 10);

    client
        .publish(topic, qos, false, payload)
        .await
        .map_err(|e| Error::Publish(e.to_string()))?;

    // Drive the eventloop until the broker has the frame, then disconnect.
    // At QoS 0 the handshake ends when the packet leaves the socket; at
    // higher levels we wait for the broker's acknowledgement.
    let mut acked = false;
    loop {
        let event = eventloop
            .poll()
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;
        trace!("publisher event: {:?}", event);

        match event {
            Event::Outgoing(Outgoing::Publish(_)) if qos == QoS::AtMostOnce => {
                acked = true;
            }
            Event::Incoming(Packet::PubAck(_)) if qos == QoS::AtLeastOnce => {
                acked = true;
            }
            Event::Incoming(Packet::PubComp(_)) if qos == QoS::ExactlyOnce => {
                acked = true;
            }
            Event::Outgoing(Outgoing::Disconnect) => {
                debug!("publish complete, disconnected");
                return Ok(());
            }
            _ => {}
        }

        if acked {
            acked = false;
            client
                .disconnect()
                .await
                .map_err(|e| Error::Connection(e.to_string()))?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::test_support::keypair;
    use crate::crypto::seal::max_plaintext_len;
    use crate::error::Error;

    #[tokio::test]
    async fn test_publish_oversized_message_fails_before_connect() {
        let pair = keypair();
        let config = Config {
            // Sealing fails first, so the broker is never contacted.
            broker: "mqtt://127.0.0.1:1".to_string(),
            ..Config::default()
        };

        let oversized = "x".repeat(max_plaintext_len(pair.public()) + 1);
        let result = publish(&config, "smqtt/test", pair.public(), &[oversized]).await;
        assert!(matches!(result, Err(Error::MessageTooLarge { .. })));
    }

    #[tokio::test]
    async fn test_publish_unreachable_broker() {
        let pair = keypair();
        let config = Config {
            broker: "mqtt://127.0.0.1:1".to_string(),
            ..Config::default()
        };

        let result = publish(&config, "smqtt/test", pair.public(), &["hello".to_string()]).await;
        assert!(matches!(result, Err(Error::Connection(_))));
    }

    #[tokio::test]
    async fn test_publish_invalid_qos() {
        let pair = keypair();
        let config = Config {
            qos: 7,
            ..Config::default()
        };

        let result = publish(&config, "smqtt/test", pair.public(), &["hello".to_string()]).await;
        assert!(matches!(result, Err(Error::Connection(_))));
    }
}

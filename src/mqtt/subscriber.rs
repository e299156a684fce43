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
//! Subscription loop: frame unpacking, decryption, and delivery.

use log::{debug, trace, warn};
use rumqttc::{AsyncClient, Event, Packet};
use tokio::time::{sleep, Duration};

use crate::crypto::{seal, PrivateKey};
use crate::envelope::Envelope;
use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::mqtt::Config;

/// A decrypted and verified message handed to the delivery handler.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Delivery {
    /// The recovered plaintext message.
    pub message: String,
    /// The sender's envelope timestamp (ISO-8601 UTC).
    pub timestamp: String,
    /// The topic the frame arrived on.
    pub topic: String,
}

/// Callback invoked once per successfully recovered message.
pub type DeliveryHandler = Box<dyn FnMut(Delivery) + Send>;

/// Subscribe to `topic` and deliver every message sealed to `private_key`.
///
/// Runs until the connection is lost and cannot be re-established within the
/// configured reconnect budget. Malformed frames and undecryptable or
/// tampered elements are logged and skipped; they never terminate the loop.
/// Frames from other senders on a shared topic simply fail decryption and
/// are dropped the same way.
///
/// # Errors
///
/// Returns [`Error::Connection`] once `config.reconnect_attempts` consecutive
/// connection failures have been exhausted.
pub async fn subscribe(
    config: &Config,
    topic: &str,
    private_key: &PrivateKey,
    mut handler: DeliveryHandler,
) -> Result<()> {
    let qos = config.qos()?;
    let options = config.options("smqtt-sub")?;
    debug!("subscribing to topic '{}'", topic);

    let (client, mut eventloop) = AsyncClient::new(options, 10);

    let mut failures: u32 = 0;
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                failures = 0;
                // Subscribe on every ConnAck so the session survives broker
                // restarts that drop subscription state.
                debug!("connected, subscribing to '{}'", topic);
                client
                    .subscribe(topic, qos)
                    .await
                    .map_err(|e| Error::Connection(e.to_string()))?;
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                deliver_frame(&publish.topic, &publish.payload, private_key, &mut handler);
            }
            Ok(event) => trace!("subscriber event: {:?}", event),
            Err(e) => {
                failures += 1;
                if failures > config.reconnect_attempts {
                    return Err(Error::Connection(format!(
                        "gave up after {} attempts: {}",
                        config.reconnect_attempts, e
                    )));
                }
                // Exponential backoff, capped at 64x the base delay.
                let delay = config.reconnect_delay_secs << (failures - 1).min(6);
                warn!("connection error: {}, retrying in {}s", e, delay);
                sleep(Duration::from_secs(delay)).await;
            }
        }
    }
}

/// Unpack a raw frame payload and deliver each recoverable message.
///
/// Processes elements independently: a failure to decrypt, parse, or verify
/// one element is logged and does not affect the others.
pub(crate) fn deliver_frame(
    topic: &str,
    payload: &[u8],
    private_key: &PrivateKey,
    handler: &mut DeliveryHandler,
) {
    let frame = match Frame::unpack(payload) {
        Ok(frame) => frame,
        Err(e) => {
            warn!("discarding malformed frame on '{}': {}", topic, e);
            return;
        }
    };
    trace!("frame with {} element(s) on '{}'", frame.sealed().len(), topic);

    for element in frame.sealed() {
        match recover(element, private_key) {
            Ok((message, timestamp)) => handler(Delivery {
                message,
                timestamp,
                topic: topic.to_string(),
            }),
            Err(e) => warn!("skipping undeliverable element on '{}': {}", topic, e),
        }
    }
}

/// Decrypt one sealed element and verify its envelope.
fn recover(element: &str, private_key: &PrivateKey) -> Result<(String, String)> {
    let plaintext = seal::decrypt(element, private_key)?;
    let envelope = Envelope::from_bytes(&plaintext)?;
    let message = envelope.verify()?;
    Ok((message, envelope.timestamp))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::test_support::{keypair, other_keypair};

    fn seal_message(message: &str) -> String {
        let pair = keypair();
        let envelope = Envelope::build(message);
        seal::encrypt(&envelope.to_bytes().unwrap(), pair.public()).unwrap()
    }

    fn collecting_handler() -> (DeliveryHandler, std::sync::mpsc::Receiver<Delivery>) {
        let (tx, rx) = std::sync::mpsc::channel();
        (Box::new(move |d| tx.send(d).unwrap()), rx)
    }

    #[test]
    fn test_deliver_frame_roundtrip() {
        let pair = keypair();
        let sealed = vec![seal_message("Hello, World!"), seal_message("second")];
        let payload = Frame::pack(sealed).to_bytes().unwrap();

        let (mut handler, rx) = collecting_handler();
        deliver_frame("smqtt/test", &payload, pair.private(), &mut handler);

        let first = rx.try_recv().unwrap();
        assert_eq!(first.message, "Hello, World!");
        assert_eq!(first.topic, "smqtt/test");
        assert!(!first.timestamp.is_empty());
        assert_eq!(rx.try_recv().unwrap().message, "second");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_deliver_frame_malformed_payload_is_skipped() {
        let pair = keypair();
        let (mut handler, rx) = collecting_handler();

        deliver_frame("smqtt/test", b"not json at all", pair.private(), &mut handler);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_deliver_frame_bad_element_does_not_block_good_one() {
        let pair = keypair();
        let sealed = vec!["@@not-base64@@".to_string(), seal_message("survivor")];
        let payload = Frame::pack(sealed).to_bytes().unwrap();

        let (mut handler, rx) = collecting_handler();
        deliver_frame("smqtt/test", &payload, pair.private(), &mut handler);

        assert_eq!(rx.try_recv().unwrap().message, "survivor");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_deliver_frame_wrong_key_element_is_skipped() {
        let stranger = other_keypair();
        let envelope = Envelope::build("not for you");
        let sealed = vec![
            seal::encrypt(&envelope.to_bytes().unwrap(), stranger.public()).unwrap(),
            seal_message("for me"),
        ];
        let payload = Frame::pack(sealed).to_bytes().unwrap();

        let pair = keypair();
        let (mut handler, rx) = collecting_handler();
        deliver_frame("smqtt/test", &payload, pair.private(), &mut handler);

        assert_eq!(rx.try_recv().unwrap().message, "for me");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_subscribe_unreachable_broker_gives_up() {
        let pair = keypair();
        let config = Config {
            broker: "mqtt://127.0.0.1:1".to_string(),
            reconnect_attempts: 1,
            reconnect_delay_secs: 0,
            ..Config::default()
        };

        let (handler, _rx) = collecting_handler();
        let result = subscribe(&config, "smqtt/test", pair.private(), handler).await;
        assert!(matches!(result, Err(Error::Connection(_))));
    }
}

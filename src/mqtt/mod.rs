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
//! MQTT transport: broker configuration, publisher, and subscriber.
//!
//! The broker is an external collaborator; this module only moves sealed
//! frames through it. Topics are opaque strings passed through to the broker
//! unvalidated. A connection is exclusively owned by the publish or subscribe
//! call that opened it and is closed on every exit path.

pub mod publisher;
pub mod subscriber;

use rumqttc::{MqttOptions, QoS};
use serde::{Deserialize, Serialize};
use tokio::time::Duration;

use crate::error::{Error, Result};

pub use publisher::publish;
pub use subscriber::{subscribe, Delivery, DeliveryHandler};

/// MQTT keep-alive interval.
const KEEP_ALIVE_SECS: u64 = 30;

/// Default delay before the first reconnect attempt.
const DEFAULT_RECONNECT_DELAY_SECS: u64 = 5;

/// Default bound on consecutive reconnect attempts.
const DEFAULT_RECONNECT_ATTEMPTS: u32 = 10;

/// Configuration for an MQTT broker connection.
///
/// Constructed once at startup and passed by reference into the publisher
/// and subscriber; there is no process-wide configuration state.
///
/// # Examples
///
/// ```
/// use smqtt::mqtt::Config;
///
/// let config = Config {
///     broker: "mqtt://localhost:1883".to_string(),
///     ..Config::default()
/// };
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Broker URL or `host:port` (e.g. "mqtt://localhost:1883").
    pub broker: String,
    /// Optional username for authentication.
    #[serde(default)]
    pub username: Option<String>,
    /// Optional password for authentication.
    #[serde(default)]
    pub password: Option<String>,
    /// Optional client ID; derived from the operation when absent.
    #[serde(default)]
    pub client_id: Option<String>,
    /// Quality of service level (0, 1, or 2).
    #[serde(default)]
    pub qos: u8,
    /// Upper bound on consecutive subscriber reconnect attempts.
    #[serde(default = "default_reconnect_attempts")]
    pub reconnect_attempts: u32,
    /// Base delay for subscriber reconnect backoff, in seconds.
    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,
}

fn default_reconnect_attempts() -> u32 {
    DEFAULT_RECONNECT_ATTEMPTS
}

fn default_reconnect_delay_secs() -> u64 {
    DEFAULT_RECONNECT_DELAY_SECS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            broker: "mqtt://localhost:1883".to_string(),
            username: None,
            password: None,
            client_id: None,
            qos: 0,
            reconnect_attempts: DEFAULT_RECONNECT_ATTEMPTS,
            reconnect_delay_secs: DEFAULT_RECONNECT_DELAY_SECS,
        }
    }
}

impl Config {
    /// Map the configured QoS number to the rumqttc level.
    pub fn qos(&self) -> Result<QoS> {
        match self.qos {
            0 => Ok(QoS::AtMostOnce),
            1 => Ok(QoS::AtLeastOnce),
            2 => Ok(QoS::ExactlyOnce),
            other => Err(Error::Connection(format!("invalid QoS level: {other}"))),
        }
    }

    /// Build `MqttOptions` for this broker, using `fallback_id` when no
    /// client ID is configured.
    pub(crate) fn options(&self, fallback_id: &str) -> Result<MqttOptions> {
        let (host, port) = parse_broker_url(&self.broker)?;

        let client_id = self
            .client_id
            .clone()
            .unwrap_or_else(|| fallback_id.to_string());

        let mut options = MqttOptions::new(client_id, host, port);
        options.set_keep_alive(Duration::from_secs(KEEP_ALIVE_SECS));

        if let Some(username) = &self.username {
            options.set_credentials(username, self.password.as_deref().unwrap_or(""));
        }

        Ok(options)
    }
}

/// Parse a broker URL to extract host and port.
///
/// Supports `mqtt://` and `mqtts://` prefixes as well as bare `host:port`.
/// Defaults to port 1883 if not specified.
///
/// # Examples
///
/// ```
/// # use smqtt::mqtt::parse_broker_url;
/// let (host, port) = parse_broker_url("mqtt://localhost:1883").unwrap();
/// assert_eq!(host, "localhost");
/// assert_eq!(port, 1883);
///
/// let (host, port) = parse_broker_url("broker.example.com").unwrap();
/// assert_eq!(host, "broker.example.com");
/// assert_eq!(port, 1883);
/// ```
pub fn parse_broker_url(url: &str) -> Result<(String, u16)> {
    let url = url.trim();

    let url = url
        .strip_prefix("mqtt://")
        .or_else(|| url.strip_prefix("mqtts://"))
        .unwrap_or(url);

    if let Some((host, port_str)) = url.split_once(':') {
        let port = port_str
            .parse::<u16>()
            .map_err(|_| Error::Connection(format!("invalid port in broker URL: {port_str}")))?;
        Ok((host.to_string(), port))
    } else {
        Ok((url.to_string(), 1883))
    }
}

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
//! JSON configuration file support for the command line tools.
//!
//! Every field is optional in the file and every field can be overridden by
//! a command line flag; flags always win. A typical file:
//!
//! ```json
//! {
//!     "broker": "mqtt://broker.example.com:1883",
//!     "topic": "sensors/garden",
//!     "qos": 1,
//!     "public_key": "keys/garden.pub.pem",
//!     "private_key": "keys/garden.priv.pem"
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::mqtt;

/// Settings read from a JSON configuration file.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Broker URL or `host:port`.
    pub broker: Option<String>,
    /// Topic to publish or subscribe to.
    pub topic: Option<String>,
    /// Broker username.
    pub username: Option<String>,
    /// Broker password.
    pub password: Option<String>,
    /// MQTT client ID.
    pub client_id: Option<String>,
    /// Quality of service level (0, 1, or 2).
    pub qos: Option<u8>,
    /// Path to the recipient's public key PEM file.
    pub public_key: Option<PathBuf>,
    /// Path to the subscriber's private key PEM file.
    pub private_key: Option<PathBuf>,
    /// Upper bound on consecutive subscriber reconnect attempts.
    pub reconnect_attempts: Option<u32>,
    /// Base delay for subscriber reconnect backoff, in seconds.
    pub reconnect_delay_secs: Option<u64>,
}

impl FileConfig {
    /// Load settings from a JSON file at `path`.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] if the file cannot be read, [`Error::Format`] if it is
    /// not valid JSON or contains unknown fields.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        serde_json::from_str(&contents).map_err(|e| {
            Error::Format(format!(
                "invalid config file {}: {e}",
                path.as_ref().display()
            ))
        })
    }

    /// Build a broker [`mqtt::Config`], with any value from `overrides`
    /// taking precedence over this file.
    pub fn broker_config(&self, overrides: &FileConfig) -> Result<mqtt::Config> {
        let defaults = mqtt::Config::default();
        let pick = |a: &Option<String>, b: &Option<String>| a.clone().or_else(|| b.clone());

        Ok(mqtt::Config {
            broker: pick(&overrides.broker, &self.broker).ok_or_else(|| {
                Error::Connection("no broker configured; pass --broker or set it in the config file".to_string())
            })?,
            username: pick(&overrides.username, &self.username),
            password: pick(&overrides.password, &self.password),
            client_id: pick(&overrides.client_id, &self.client_id),
            qos: overrides.qos.or(self.qos).unwrap_or(defaults.qos),
            reconnect_attempts: overrides
                .reconnect_attempts
                .or(self.reconnect_attempts)
                .unwrap_or(defaults.reconnect_attempts),
            reconnect_delay_secs: overrides
                .reconnect_delay_secs
                .or(self.reconnect_delay_secs)
                .unwrap_or(defaults.reconnect_delay_secs),
        })
    }

    /// Resolve the topic, preferring `overrides`.
    pub fn topic(&self, overrides: &FileConfig) -> Result<String> {
        overrides
            .topic
            .clone()
            .or_else(|| self.topic.clone())
            .ok_or_else(|| {
                Error::Format("no topic configured; pass --topic or set it in the config file".to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config_file() {
        let path = std::env::temp_dir().join(format!("smqtt-config-{}.json", std::process::id()));
        fs::write(
            &path,
            r#"{"broker": "mqtt://example.com:1883", "topic": "a/b", "qos": 1}"#,
        )
        .unwrap();

        let config = FileConfig::from_file(&path).unwrap();
        assert_eq!(config.broker.as_deref(), Some("mqtt://example.com:1883"));
        assert_eq!(config.topic.as_deref(), Some("a/b"));
        assert_eq!(config.qos, Some(1));
        assert!(config.public_key.is_none());

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_unknown_field_rejected() {
        let path = std::env::temp_dir().join(format!("smqtt-config-bad-{}.json", std::process::id()));
        fs::write(&path, r#"{"borker": "typo"}"#).unwrap();

        assert!(matches!(
            FileConfig::from_file(&path),
            Err(Error::Format(_))
        ));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_overrides_win() {
        let file = FileConfig {
            broker: Some("mqtt://file:1883".to_string()),
            topic: Some("file/topic".to_string()),
            qos: Some(2),
            ..FileConfig::default()
        };
        let overrides = FileConfig {
            broker: Some("mqtt://flag:1884".to_string()),
            ..FileConfig::default()
        };

        let broker = file.broker_config(&overrides).unwrap();
        assert_eq!(broker.broker, "mqtt://flag:1884");
        assert_eq!(broker.qos, 2);
        assert_eq!(file.topic(&overrides).unwrap(), "file/topic");
    }

    #[test]
    fn test_missing_broker_rejected() {
        let empty = FileConfig::default();
        assert!(empty.broker_config(&FileConfig::default()).is_err());
        assert!(empty.topic(&FileConfig::default()).is_err());
    }
}

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
//! SMQTT CLI - secure envelope messaging over unencrypted MQTT brokers.

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};

use smqtt::config::FileConfig;
use smqtt::crypto::{PrivateKey, PublicKey};

mod commands;

#[derive(Parser)]
#[command(name = "smqtt")]
#[command(version, about = "Secure envelope messaging over unencrypted MQTT", long_about = None)]
struct Cli {
    /// Path to JSON configuration file
    #[arg(short = 'c', long, env = "SMQTT_CONFIG")]
    config: Option<PathBuf>,

    /// MQTT broker URL (overrides the config file)
    #[arg(long, env = "SMQTT_BROKER")]
    broker: Option<String>,

    /// Topic to publish or subscribe to (overrides the config file)
    #[arg(short = 't', long, env = "SMQTT_TOPIC")]
    topic: Option<String>,

    /// MQTT username
    #[arg(long, env = "SMQTT_USERNAME")]
    username: Option<String>,

    /// MQTT password
    #[arg(long, env = "SMQTT_PASSWORD")]
    password: Option<String>,

    /// MQTT client ID
    #[arg(long, env = "SMQTT_CLIENT_ID")]
    client_id: Option<String>,

    /// Quality of service level (0, 1, or 2)
    #[arg(short = 'q', long)]
    qos: Option<u8>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new RSA key pair
    #[command(long_about = "Generate a new RSA key pair.

Writes <name>.pub.pem and <name>.priv.pem under the key directory; on Unix
both files are owner-read-only. Refuses to overwrite existing keys.

EXAMPLES:
    # Generate keys/smqtt.pub.pem and keys/smqtt.priv.pem
    smqtt keygen

    # Generate a named pair in a custom directory
    smqtt keygen --key-dir /etc/smqtt --name garden")]
    Keygen {
        /// Directory to write the key files into
        #[arg(long, default_value = "keys")]
        key_dir: PathBuf,

        /// Base name for the key files
        #[arg(long, default_value = "smqtt")]
        name: String,
    },

    /// Seal messages and publish them as one frame
    #[command(long_about = "Seal messages and publish them as one frame.

Each message is timestamped, checksummed, and encrypted to the recipient's
public key; all sealed messages travel in a single MQTT publish.

EXAMPLES:
    # Publish two messages in one frame
    smqtt -t sensors/garden pub -k keys/smqtt.pub.pem -m '21.4C' -m '48%'

    # Publish one frame per line read from stdin
    tail -f sensor.log | smqtt -t sensors/garden pub -k keys/smqtt.pub.pem -m -")]
    Pub {
        /// Path to the recipient's public key PEM file
        #[arg(short = 'k', long)]
        public_key: Option<PathBuf>,

        /// Message to publish; repeatable. A single '-' reads lines from stdin
        #[arg(short = 'm', long = "message", required = true)]
        messages: Vec<String>,
    },

    /// Subscribe to a topic and print recovered messages
    #[command(long_about = "Subscribe to a topic and print recovered messages.

Messages that cannot be decrypted or fail their integrity check are logged
and skipped; the subscription keeps running.

EXAMPLES:
    smqtt -t sensors/garden sub -k keys/smqtt.priv.pem")]
    Sub {
        /// Path to the subscriber's private key PEM file
        #[arg(short = 'k', long)]
        private_key: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let file_config = match &cli.config {
        Some(path) => FileConfig::from_file(path)?,
        None => FileConfig::default(),
    };
    let overrides = FileConfig {
        broker: cli.broker.clone(),
        topic: cli.topic.clone(),
        username: cli.username.clone(),
        password: cli.password.clone(),
        client_id: cli.client_id.clone(),
        qos: cli.qos,
        ..FileConfig::default()
    };

    match cli.command {
        Commands::Keygen { key_dir, name } => commands::keygen::execute(&key_dir, &name),
        Commands::Pub {
            public_key,
            messages,
        } => {
            let broker = file_config.broker_config(&overrides)?;
            let topic = file_config.topic(&overrides)?;
            let key_path = public_key
                .or_else(|| file_config.public_key.clone())
                .ok_or_else(|| anyhow!("no public key; pass -k or set it in the config file"))?;
            let key = PublicKey::from_file(&key_path)?;
            commands::publish::execute(&broker, &topic, &key, messages).await
        }
        Commands::Sub { private_key } => {
            let broker = file_config.broker_config(&overrides)?;
            let topic = file_config.topic(&overrides)?;
            let key_path = private_key
                .or_else(|| file_config.private_key.clone())
                .ok_or_else(|| anyhow!("no private key; pass -k or set it in the config file"))?;
            let key = PrivateKey::from_file(&key_path)?;
            commands::subscribe::execute(&broker, &topic, &key).await
        }
    }
}

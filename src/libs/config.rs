//! Configuration management for taskboard.
//!
//! The configuration decides which task store the CLI talks to and tunes the
//! local mock store. It is stored as pretty-printed JSON next to the task
//! database in the application data directory.
//!
//! ## Modules
//!
//! - **Server**: REST endpoint of a remote task store. When present, every
//!   command goes through the HTTP client.
//! - **Store**: behaviour of the local store used when no server is
//!   configured (simulated latency, sample data seeding).
//!
//! ## Usage
//!
//! ```rust,no_run
//! use taskboard::libs::config::{Config, StoreConfig};
//!
//! let mut config = Config::read()?;
//! config.store = Some(StoreConfig { latency_ms: 250, seed: true });
//! config.save()?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use super::data_storage::DataStorage;
use crate::libs::messages::Message;
use crate::msg_print;
use anyhow::Result;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, MultiSelect};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};

pub const CONFIG_FILE_NAME: &str = "config.json";

/// A configurable module offered by the setup wizard.
#[derive(Debug, Clone)]
pub struct ConfigModule {
    pub key: String,
    pub name: String,
}

/// Remote task store endpoint.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ServerConfig {
    /// Base URL; request paths such as `/tasks` are appended to it.
    pub api_url: String,
    /// Sent as a bearer token when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
}

/// Local store settings.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct StoreConfig {
    /// Artificial delay applied to every request, in milliseconds.
    pub latency_ms: u64,
    /// Insert sample tasks when the store is empty.
    pub seed: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            latency_ms: 0,
            seed: false,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<StoreConfig>,
}

impl Config {
    /// Loads the configuration, or the default one when no file exists yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn read() -> Result<Config> {
        let config_file_path = DataStorage::new().get_path(CONFIG_FILE_NAME)?;
        if !config_file_path.exists() {
            return Ok(Config::default());
        }

        let config_str = fs::read_to_string(config_file_path)?;
        let config: Config = serde_json::from_str(&config_str)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_file_path = DataStorage::new().get_path(CONFIG_FILE_NAME)?;
        let config_file = File::create(config_file_path)?;
        serde_json::to_writer_pretty(&config_file, &self)?;
        Ok(())
    }

    /// Interactive setup wizard. Existing values are offered as defaults.
    pub fn init() -> Result<Self> {
        let mut config = Self::read().unwrap_or_default();

        let modules = vec![
            ConfigModule {
                key: "server".to_string(),
                name: Message::ConfigModuleServer.to_string(),
            },
            ConfigModule {
                key: "store".to_string(),
                name: Message::ConfigModuleStore.to_string(),
            },
        ];

        let selected = MultiSelect::with_theme(&ColorfulTheme::default())
            .with_prompt(Message::PromptSelectModules.to_string())
            .items(&modules.iter().map(|module| &module.name).collect::<Vec<_>>())
            .interact()?;

        for &selection in &selected {
            match modules[selection].key.as_str() {
                "server" => {
                    let default = config.server.clone().unwrap_or(ServerConfig {
                        api_url: String::new(),
                        auth_token: None,
                    });
                    msg_print!(Message::ConfigModuleServer);
                    let api_url: String = Input::with_theme(&ColorfulTheme::default())
                        .with_prompt(Message::PromptServerApiUrl.to_string())
                        .default(default.api_url)
                        .allow_empty(true)
                        .interact_text()?;
                    let auth_token: String = Input::with_theme(&ColorfulTheme::default())
                        .with_prompt(Message::PromptServerAuthToken.to_string())
                        .default(default.auth_token.unwrap_or_default())
                        .allow_empty(true)
                        .interact_text()?;

                    // An empty URL switches back to the local store.
                    config.server = if api_url.trim().is_empty() {
                        None
                    } else {
                        Some(ServerConfig {
                            api_url: api_url.trim().trim_end_matches('/').to_string(),
                            auth_token: (!auth_token.is_empty()).then_some(auth_token),
                        })
                    };
                }
                "store" => {
                    let default = config.store.clone().unwrap_or_default();
                    msg_print!(Message::ConfigModuleStore);
                    config.store = Some(StoreConfig {
                        latency_ms: Input::with_theme(&ColorfulTheme::default())
                            .with_prompt(Message::PromptStoreLatency.to_string())
                            .default(default.latency_ms)
                            .interact_text()?,
                        seed: Confirm::with_theme(&ColorfulTheme::default())
                            .with_prompt(Message::PromptStoreSeed.to_string())
                            .default(default.seed)
                            .interact()?,
                    });
                }
                _ => {}
            }
        }

        Ok(config)
    }
}

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::Deserialize;

use crate::error::Error;

/// Command line arguments.
#[derive(Parser, Debug, Clone)]
pub struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "console.toml")]
    pub config: PathBuf,
}

#[derive(Deserialize, Debug, Clone)]
pub struct AppConfig {
    #[serde(default = "default_listen_address")]
    pub listen_address: SocketAddr,
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Loads demo data into the store on startup.
    #[serde(default)]
    pub seed: bool,
    #[serde(default)]
    pub review: ReviewConfig,
    #[serde(default)]
    pub assistant: Option<AssistantConfig>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum DatabaseConfig {
    Mongo { uri: String, name: String },
    Memory,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ReviewConfig {
    /// Minimum upstream confidence for a proof to be approved automatically.
    #[serde(default = "default_ai_confidence_threshold")]
    pub ai_confidence_threshold: f64,
}

#[derive(Deserialize, Clone)]
pub struct AssistantConfig {
    /// Base URL of an OpenAI-compatible API, e.g. `https://api.openai.com/v1`.
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
}

impl std::fmt::Debug for AssistantConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssistantConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .finish()
    }
}

impl AppConfig {
    pub fn load(args: &Args) -> Result<AppConfig, Error> {
        let config = Figment::new()
            .admerge(Toml::file(&args.config))
            .admerge(Env::prefixed("CONSOLE_").split("__"))
            .extract()?;

        Ok(config)
    }
}

impl Default for AppConfig {
    fn default() -> AppConfig {
        AppConfig {
            listen_address: default_listen_address(),
            database: DatabaseConfig::default(),
            seed: false,
            review: ReviewConfig::default(),
            assistant: None,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> DatabaseConfig {
        DatabaseConfig::Mongo {
            uri: "mongodb://localhost:27017".to_string(),
            name: "campaign_console".to_string(),
        }
    }
}

impl Default for ReviewConfig {
    fn default() -> ReviewConfig {
        ReviewConfig {
            ai_confidence_threshold: default_ai_confidence_threshold(),
        }
    }
}

fn default_listen_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

fn default_ai_confidence_threshold() -> f64 {
    0.8
}

#[cfg(test)]
mod tests {
    use figment::Jail;

    use super::*;

    #[test]
    fn defaults_apply_without_a_file() {
        Jail::expect_with(|_jail| {
            let config = AppConfig::load(&Args {
                config: "missing.toml".into(),
            })
            .unwrap();

            assert_eq!(config.listen_address, default_listen_address());
            assert_eq!(config.database, DatabaseConfig::default());
            assert_eq!(config.review.ai_confidence_threshold, 0.8);
            assert!(config.assistant.is_none());
            Ok(())
        });
    }

    #[test]
    fn file_and_environment_are_merged() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "console.toml",
                r#"
                    listen_address = "0.0.0.0:9000"
                    seed = true

                    [database]
                    backend = "memory"

                    [assistant]
                    endpoint = "https://llm.example/v1"
                    api_key = "secret"
                    model = "small"
                "#,
            )?;
            jail.set_env("CONSOLE_REVIEW__AI_CONFIDENCE_THRESHOLD", "0.95");

            let config = AppConfig::load(&Args {
                config: "console.toml".into(),
            })
            .unwrap();

            assert_eq!(config.listen_address.port(), 9000);
            assert_eq!(config.database, DatabaseConfig::Memory);
            assert!(config.seed);
            assert_eq!(config.review.ai_confidence_threshold, 0.95);
            assert_eq!(config.assistant.unwrap().model, "small");
            Ok(())
        });
    }
}

use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use inquire::{Password, PasswordDisplayMode, Text};
use std::{net::SocketAddr, sync::Arc};
use weatherman_core::{Config, ProviderConfig, ProviderId, WeatherService};

use crate::http;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "weatherman",
    version,
    about = "Averages temperatures from several weather providers"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP service.
    Serve {
        /// Address to listen on; overrides the config file and WEATHERMAN_BIND.
        #[arg(long)]
        bind: Option<SocketAddr>,
    },

    /// Query the configured providers once and print the JSON result.
    Query {
        /// City name, passed to every provider as-is.
        city: String,
    },

    /// Configure credentials for a specific provider.
    Configure {
        /// Provider short name, e.g. "openweather" or "wunderground".
        provider: String,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Serve { bind } => {
                let mut config = runtime_config()?;
                if let Some(bind) = bind {
                    config.bind_address = bind;
                }

                let service = WeatherService::from_config(&config)?;
                let aggregator = service.aggregator();
                tracing::info!(
                    providers = ?aggregator.provider_ids(),
                    fan_out = ?aggregator.fan_out(),
                    timeout_secs = config.request_timeout_secs,
                    "weather service ready"
                );

                http::serve(config.bind_address, Arc::new(service)).await?;
            }
            Command::Query { city } => {
                let config = runtime_config()?;
                let service = WeatherService::from_config(&config)?;

                let result = service.query(&city).await?;
                let json = serde_json::to_string_pretty(&result)
                    .context("Failed to serialize weather result")?;
                println!("{json}");
            }
            Command::Configure { provider } => {
                let id = ProviderId::try_from(provider.as_str())?;
                configure(id)?;
            }
        }

        Ok(())
    }
}

/// Config file plus environment overrides.
fn runtime_config() -> anyhow::Result<Config> {
    let mut config = Config::load()?;
    config.apply_env()?;
    Ok(config)
}

/// Prompt for a provider's settings and persist them to the config file.
///
/// Environment overrides are not applied here so they never end up on disk.
fn configure(id: ProviderId) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    let existing = config.provider_config(id).cloned().unwrap_or_default();

    let key_prompt = if id.requires_api_key() {
        format!("{id} API key:")
    } else {
        format!("{id} API key (optional, leave empty for none):")
    };
    let api_key = Password::new(&key_prompt)
        .without_confirmation()
        .with_display_mode(PasswordDisplayMode::Masked)
        .prompt()?;
    let api_key = match api_key.trim() {
        "" if id.requires_api_key() => bail!("An API key is required for provider '{id}'"),
        "" => None,
        key => Some(key.to_string()),
    };

    let current_endpoint = existing
        .endpoint
        .as_deref()
        .unwrap_or(id.default_endpoint())
        .to_string();
    let endpoint = Text::new(&format!("{id} endpoint:"))
        .with_default(&current_endpoint)
        .prompt()?;
    let endpoint = Some(endpoint.trim().to_string())
        .filter(|e| !e.is_empty() && e.as_str() != id.default_endpoint());

    config.upsert_provider(id, ProviderConfig { api_key, endpoint });
    let path = config.save()?;

    println!("Saved {id} settings to {}", path.display());
    Ok(())
}

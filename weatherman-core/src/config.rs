use anyhow::{Context, Result, anyhow, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    net::SocketAddr,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{aggregator::FanOut, provider::ProviderId};

const ENV_PREFIX: &str = "WEATHERMAN";

/// Configuration for a single provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Overrides the provider's built-in endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bind_address: SocketAddr,

    /// Upper bound for a single outbound provider call.
    pub request_timeout_secs: u64,

    pub fan_out: FanOut,

    /// Example TOML:
    /// [providers.wunderground]
    /// api_key = "..."
    pub providers: BTreeMap<String, ProviderConfig>,
}

impl Default for Config {
    fn default() -> Self {
        let mut providers = BTreeMap::new();
        providers.insert(
            ProviderId::OpenWeather.as_str().to_string(),
            ProviderConfig::default(),
        );

        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 9111)),
            request_timeout_secs: 10,
            fan_out: FanOut::default(),
            providers,
        }
    }
}

impl Config {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let cfg: Config = toml::from_str(contents).context("Failed to parse configuration TOML")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load config from the platform config directory, or defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml_str(&contents)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Save config to the platform config directory, creating parent directories as needed.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weatherman", "weatherman")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn validate(&self) -> Result<()> {
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be greater than zero");
        }

        self.active_provider_ids().map(|_| ())
    }

    /// Apply `WEATHERMAN_*` overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Apply overrides using `lookup` as the environment.
    ///
    /// Recognised keys: `WEATHERMAN_BIND`, `WEATHERMAN_TIMEOUT_SECS`,
    /// `WEATHERMAN_<PROVIDER>_API_KEY` and `WEATHERMAN_<PROVIDER>_ENDPOINT`.
    /// Setting either provider key activates that provider.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind) = lookup(&format!("{ENV_PREFIX}_BIND")) {
            self.bind_address = bind
                .parse()
                .with_context(|| format!("Invalid {ENV_PREFIX}_BIND address: {bind}"))?;
        }

        if let Some(secs) = lookup(&format!("{ENV_PREFIX}_TIMEOUT_SECS")) {
            self.request_timeout_secs = secs
                .parse()
                .with_context(|| format!("Invalid {ENV_PREFIX}_TIMEOUT_SECS value: {secs}"))?;
        }

        for id in ProviderId::all() {
            let name = id.as_str().to_uppercase();
            let api_key = lookup(&format!("{ENV_PREFIX}_{name}_API_KEY"));
            let endpoint = lookup(&format!("{ENV_PREFIX}_{name}_ENDPOINT"));

            if api_key.is_none() && endpoint.is_none() {
                continue;
            }

            let mut settings = self.provider_config(*id).cloned().unwrap_or_default();
            if api_key.is_some() {
                settings.api_key = api_key;
            }
            if endpoint.is_some() {
                settings.endpoint = endpoint;
            }
            self.upsert_provider(*id, settings);
        }

        self.validate()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Section names are matched case-insensitively, like `ProviderId` parsing.
    fn section_name(&self, id: ProviderId) -> Option<&str> {
        self.providers
            .keys()
            .find(|name| name.eq_ignore_ascii_case(id.as_str()))
            .map(String::as_str)
    }

    pub fn provider_config(&self, id: ProviderId) -> Option<&ProviderConfig> {
        self.section_name(id).and_then(|name| self.providers.get(name))
    }

    /// Set/replace a provider section.
    pub fn upsert_provider(&mut self, id: ProviderId, settings: ProviderConfig) {
        self.remove_provider(id);
        self.providers.insert(id.as_str().to_string(), settings);
    }

    pub fn remove_provider(&mut self, id: ProviderId) -> Option<ProviderConfig> {
        let name = self.section_name(id)?.to_string();
        self.providers.remove(&name)
    }

    /// Providers that have a section, in `ProviderId::all()` order.
    pub fn active_provider_ids(&self) -> Result<Vec<ProviderId>> {
        for name in self.providers.keys() {
            ProviderId::try_from(name.as_str())?;
        }

        Ok(ProviderId::all()
            .iter()
            .copied()
            .filter(|id| self.section_name(*id).is_some())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_config_has_openweather_only() {
        let cfg = Config::default();

        assert_eq!(cfg.bind_address.port(), 9111);
        assert_eq!(cfg.request_timeout(), Duration::from_secs(10));
        assert_eq!(cfg.fan_out, FanOut::Sequential);
        assert_eq!(
            cfg.active_provider_ids().unwrap(),
            vec![ProviderId::OpenWeather]
        );
    }

    #[test]
    fn parses_full_toml() {
        let cfg = Config::from_toml_str(
            r#"
            bind_address = "127.0.0.1:8080"
            request_timeout_secs = 3
            fan_out = "concurrent"

            [providers.wunderground]
            api_key = "WU_KEY"

            [providers.openweather]
            endpoint = "http://localhost:1234/weather"
            "#,
        )
        .expect("valid config");

        assert_eq!(cfg.bind_address, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(cfg.request_timeout_secs, 3);
        assert_eq!(cfg.fan_out, FanOut::Concurrent);
        assert_eq!(
            cfg.provider_config(ProviderId::Wunderground)
                .and_then(|p| p.api_key.as_deref()),
            Some("WU_KEY")
        );
        assert_eq!(
            cfg.active_provider_ids().unwrap(),
            vec![ProviderId::OpenWeather, ProviderId::Wunderground]
        );
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let cfg = Config::from_toml_str("request_timeout_secs = 5").expect("valid config");

        assert_eq!(cfg.request_timeout_secs, 5);
        assert_eq!(cfg.bind_address.port(), 9111);
        assert!(cfg.provider_config(ProviderId::OpenWeather).is_some());
    }

    #[test]
    fn unknown_provider_section_is_rejected() {
        let err = Config::from_toml_str("[providers.accuweather]\napi_key = \"x\"").unwrap_err();
        assert!(format!("{err:#}").contains("Unknown provider 'accuweather'"));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = Config::from_toml_str("request_timeout_secs = 0").unwrap_err();
        assert!(err.to_string().contains("request_timeout_secs"));
    }

    #[test]
    fn env_overrides_bind_timeout_and_keys() {
        let mut cfg = Config::default();
        cfg.apply_env_with(env(&[
            ("WEATHERMAN_BIND", "127.0.0.1:9000"),
            ("WEATHERMAN_TIMEOUT_SECS", "2"),
            ("WEATHERMAN_WUNDERGROUND_API_KEY", "FROM_ENV"),
        ]))
        .expect("valid overrides");

        assert_eq!(cfg.bind_address, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(cfg.request_timeout_secs, 2);
        assert_eq!(
            cfg.provider_config(ProviderId::Wunderground),
            Some(&ProviderConfig {
                api_key: Some("FROM_ENV".into()),
                endpoint: None,
            })
        );
    }

    #[test]
    fn env_endpoint_keeps_file_api_key() {
        let mut cfg = Config::default();
        cfg.upsert_provider(
            ProviderId::OpenWeather,
            ProviderConfig {
                api_key: Some("FILE_KEY".into()),
                endpoint: None,
            },
        );

        cfg.apply_env_with(env(&[(
            "WEATHERMAN_OPENWEATHER_ENDPOINT",
            "http://localhost:9/weather",
        )]))
        .unwrap();

        let ow = cfg.provider_config(ProviderId::OpenWeather).unwrap();
        assert_eq!(ow.api_key.as_deref(), Some("FILE_KEY"));
        assert_eq!(ow.endpoint.as_deref(), Some("http://localhost:9/weather"));
    }

    #[test]
    fn invalid_env_values_are_errors() {
        let mut cfg = Config::default();
        let err = cfg
            .apply_env_with(env(&[("WEATHERMAN_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains("WEATHERMAN_TIMEOUT_SECS"));

        let err = cfg
            .apply_env_with(env(&[("WEATHERMAN_BIND", "not-an-addr")]))
            .unwrap_err();
        assert!(err.to_string().contains("WEATHERMAN_BIND"));
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.fan_out = FanOut::Concurrent;
        cfg.upsert_provider(
            ProviderId::Wunderground,
            ProviderConfig {
                api_key: Some("KEY".into()),
                endpoint: None,
            },
        );
        cfg.save_to(&path).expect("save");
        assert!(path.exists());

        let loaded = Config::load_from(&path).expect("load");
        assert_eq!(loaded.fan_out, FanOut::Concurrent);
        assert_eq!(loaded.providers, cfg.providers);
    }

    #[test]
    fn load_from_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).expect("defaults");
        assert_eq!(cfg.providers, Config::default().providers);
    }

    #[test]
    fn section_names_are_case_insensitive() {
        let cfg = Config::from_toml_str("[providers.WunderGround]\napi_key = \"K\"").unwrap();

        assert_eq!(
            cfg.provider_config(ProviderId::Wunderground)
                .and_then(|p| p.api_key.as_deref()),
            Some("K")
        );

        let mut cfg = cfg;
        cfg.upsert_provider(ProviderId::Wunderground, ProviderConfig::default());
        assert_eq!(cfg.providers.len(), 1);
        assert!(cfg.providers.contains_key("wunderground"));
    }

    #[test]
    fn remove_provider_deactivates_it() {
        let mut cfg = Config::default();
        assert!(cfg.remove_provider(ProviderId::OpenWeather).is_some());
        assert!(cfg.active_provider_ids().unwrap().is_empty());
    }
}

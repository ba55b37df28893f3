mod basic;
mod providers;
mod sync;

pub use basic::BasicConfig;
pub use providers::{GoogleAdsConfig, GoogleAdsResolvedConfig, ProviderDefaults, ProvidersConfig};
pub use sync::SyncConfig;

use figment::{
    Figment,
    providers::{Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, sync::LazyLock};

/// Application configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Core server configuration (see `basic` table in config.toml).
    #[serde(default)]
    pub basic: BasicConfig,

    /// Staleness and batch tuning for the metrics sync engine (see `sync` table).
    #[serde(default)]
    pub sync: SyncConfig,

    /// Provider and upstream settings (see `providers` table in config.toml).
    #[serde(default)]
    pub providers: ProvidersConfig,
}

const DEFAULT_CONFIG_FILE: &str = "config.toml";

impl Config {
    /// Builds a Figment that merges defaults and a config TOML file.
    pub fn figment() -> Figment {
        let figment = Figment::new().merge(Serialized::defaults(Config::default()));
        if PathBuf::from(DEFAULT_CONFIG_FILE).is_file() {
            figment.merge(Toml::file(DEFAULT_CONFIG_FILE))
        } else {
            figment
        }
    }

    /// Loads configuration by merging defaults and `config.toml` if present.
    ///
    /// Note: this does **not** validate required fields like `basic.adpulse_key`. Binaries should
    /// call `Config::from_toml()` instead (or validate explicitly) to avoid running with insecure
    /// defaults.
    pub fn from_optional_toml() -> Self {
        Self::figment().extract().unwrap_or_else(|err| {
            panic!("failed to extract configuration (defaults + optional config.toml): {err}")
        })
    }

    /// Loads configuration from the TOML file (with defaults) and validates required fields.
    pub fn from_toml() -> Self {
        assert!(
            PathBuf::from(DEFAULT_CONFIG_FILE).is_file(),
            "config file not found: {DEFAULT_CONFIG_FILE}"
        );
        let cfg: Self = Self::figment().extract().unwrap_or_else(|err| {
            panic!("failed to extract configuration from {DEFAULT_CONFIG_FILE}: {err}")
        });
        assert!(
            !cfg.basic.adpulse_key.trim().is_empty(),
            "basic.adpulse_key must be set and non-empty"
        );
        assert!(
            !cfg.basic.encryption_key.trim().is_empty(),
            "basic.encryption_key must be set (base64 of 32 random bytes)"
        );
        cfg
    }

    pub fn google_ads(&self) -> GoogleAdsResolvedConfig {
        self.providers.google_ads.resolve(&self.providers.defaults)
    }
}

/// Global, lazily-initialized configuration instance.
pub static CONFIG: LazyLock<Config> = LazyLock::new(Config::from_optional_toml);

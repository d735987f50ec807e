use crate::config::AppConfig;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Json, Toml},
    Figment,
};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads application configuration by merging TOML, environment variables, and JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be read or parsed.
    pub fn load() -> Result<AppConfig> {
        Self::load_from("config/Config.toml")
    }

    /// Loads application configuration from a specific TOML file path.
    ///
    /// Environment variables are prefixed with `VIGIL_`; nested fields use a
    /// `__` separator (e.g. `VIGIL_PUSHBULLET__TOKEN`).
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be read or parsed.
    pub fn load_from(path: &str) -> Result<AppConfig> {
        let config: AppConfig = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("VIGIL_").split("__"))
            .join(Json::file("config/Config.json"))
            .extract()?;

        Ok(config)
    }
}

use serde::Deserialize;

static CONFIG: OnceCell<Config> = OnceCell::const_new();

mod config_dir;
pub use config_dir::{
    CONFIG_PATH_ENV, find_config_file, read_config, read_config_file, resolve_config_path,
};

mod error;
pub use error::{ConfigError, ConfigResult};
use tokio::sync::OnceCell;

use crate::progress::CompletionBasis;

#[derive(Debug, Deserialize)]
pub struct Config {
    host: Host,
    app: App,
    #[serde(default)]
    progress: Progress,
}

#[derive(Debug, Deserialize)]
pub struct Host {
    bindto: String,
}

#[derive(Debug, Deserialize)]
pub struct App {
    jwt: String,
    database_uri: String,
    #[serde(default)]
    docs: bool,
    #[serde(default = "default_token_ttl_hours")]
    token_ttl_hours: i64,
}

/// Knobs of the progress engine.
#[derive(Debug, Default, Deserialize)]
pub struct Progress {
    #[serde(default)]
    completion_basis: CompletionBasis,
}

fn default_token_ttl_hours() -> i64 {
    24
}

impl Config {
    #[tracing::instrument]
    pub async fn get_or_init(use_local: bool) -> &'static Config {
        CONFIG
            .get_or_init(|| async {
                let read_cfg = |use_local| -> ConfigResult<Self> {
                    let bytes = read_config(use_local)?;
                    Self::from_slice(&bytes)
                };

                match read_cfg(use_local) {
                    Ok(c) => c,
                    Err(e) => {
                        crate::error::log_error(&e);
                        tracing::error!("set {} or create ./config.toml", CONFIG_PATH_ENV);
                        std::process::exit(1);
                    }
                }
            })
            .await
    }

    pub fn from_slice(bytes: &[u8]) -> ConfigResult<Self> {
        let config: Self = toml::from_slice(bytes)?;
        Ok(config)
    }

    #[inline]
    pub fn host(&self) -> &Host {
        &self.host
    }

    #[inline]
    pub fn app(&self) -> &App {
        &self.app
    }

    #[inline]
    pub fn progress(&self) -> &Progress {
        &self.progress
    }
}

impl Host {
    #[inline]
    pub fn bindto(&self) -> &str {
        &self.bindto
    }
}

impl App {
    #[inline]
    pub fn jwt(&self) -> &str {
        &self.jwt
    }

    #[inline]
    pub fn database_uri(&self) -> &str {
        &self.database_uri
    }

    #[inline]
    pub fn docs(&self) -> bool {
        self.docs
    }

    #[inline]
    pub fn token_ttl_hours(&self) -> i64 {
        self.token_ttl_hours
    }
}

impl Progress {
    #[inline]
    pub fn completion_basis(&self) -> CompletionBasis {
        self.completion_basis
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn config_test() {
        let config = Config::get_or_init(true).await;
        assert_eq!(config.host().bindto(), "127.0.0.1:5000"); // defaults
    }

    #[test]
    fn progress_section_is_optional() {
        let raw = br#"
            [host]
            bindto = "0.0.0.0:8080"

            [app]
            jwt = "secret"
            database_uri = "postgres://localhost/lexis"
        "#;

        let config = Config::from_slice(raw).unwrap();
        assert_eq!(config.progress().completion_basis(), CompletionBasis::Snapshot);
        assert!(!config.app().docs());
        assert_eq!(config.app().token_ttl_hours(), 24);
    }

    #[test]
    fn level_completion_basis_parses() {
        let raw = br#"
            [host]
            bindto = "0.0.0.0:8080"

            [app]
            jwt = "secret"
            database_uri = "postgres://localhost/lexis"
            docs = true
            token_ttl_hours = 2

            [progress]
            completion_basis = "level"
        "#;

        let config = Config::from_slice(raw).unwrap();
        assert_eq!(config.progress().completion_basis(), CompletionBasis::Level);
        assert!(config.app().docs());
        assert_eq!(config.app().token_ttl_hours(), 2);
    }

    #[test]
    fn unknown_completion_basis_is_rejected() {
        let raw = br#"
            [host]
            bindto = "0.0.0.0:8080"

            [app]
            jwt = "secret"
            database_uri = "postgres://localhost/lexis"

            [progress]
            completion_basis = "whatever"
        "#;

        assert!(matches!(
            Config::from_slice(raw),
            Err(ConfigError::TomlDeError(_))
        ));
    }
}

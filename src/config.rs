use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// sysinfo refuses to compute usage over a shorter window.
const MIN_CPU_SAMPLE_MILLIS: u64 = 200;
const MAX_CPU_SAMPLE_MILLIS: u64 = 60_000;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default = "default_listen")]
    pub listen: String,
    #[serde(default = "default_cpu_sample_millis")]
    pub cpu_sample_millis: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            cpu_sample_millis: default_cpu_sample_millis(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("не удалось прочитать файл конфигурации {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("не удалось разобрать YAML в {path}: {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },
    #[error("ошибка валидации конфигурации: {0}")]
    Validation(String),
}

impl Config {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        let path_display = path_ref.display().to_string();
        let text = fs::read_to_string(path_ref).map_err(|source| ConfigError::Read {
            path: path_display.clone(),
            source,
        })?;

        let cfg = Self::from_yaml(&text).map_err(|source| ConfigError::Parse {
            path: path_display,
            source,
        })?;

        cfg.validate()?;
        Ok(cfg)
    }

    fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        // an empty file means "all defaults"
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.listen.trim().is_empty() {
            return Err(ConfigError::Validation(
                "поле listen обязательно".to_string(),
            ));
        }
        if SocketAddr::from_str(&self.listen).is_err() {
            return Err(ConfigError::Validation(
                "поле listen должно быть корректным адресом host:port".to_string(),
            ));
        }
        if !(MIN_CPU_SAMPLE_MILLIS..=MAX_CPU_SAMPLE_MILLIS).contains(&self.cpu_sample_millis) {
            return Err(ConfigError::Validation(format!(
                "cpu_sample_millis должно быть в диапазоне {MIN_CPU_SAMPLE_MILLIS}..{MAX_CPU_SAMPLE_MILLIS}"
            )));
        }
        Ok(())
    }

    pub fn cpu_window(&self) -> Duration {
        Duration::from_millis(self.cpu_sample_millis)
    }

    pub fn example_yaml() -> &'static str {
        include_str!("../config.yaml.example")
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".to_string()
}

const fn default_cpu_sample_millis() -> u64 {
    1000
}

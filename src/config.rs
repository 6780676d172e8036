use crate::datasource::DEFAULT_IMPORT_URL;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    pub import_url: String,
    pub import_max_elapsed: Duration,
    pub seed_samples: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .unwrap_or_else(|| "grocery.db".to_string());
        if database_path.trim().is_empty() {
            return Err(ConfigError::MissingEnv("DATABASE_PATH".to_string()));
        }

        let import_url = env_map
            .get("IMPORT_URL")
            .cloned()
            .unwrap_or_else(|| DEFAULT_IMPORT_URL.to_string());
        if !(import_url.starts_with("http://") || import_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue(
                "IMPORT_URL".to_string(),
                format!("must be an http(s) URL, got {}", import_url),
            ));
        }

        let import_max_elapsed_ms = env_map
            .get("IMPORT_MAX_ELAPSED_MS")
            .map(|s| s.as_str())
            .unwrap_or("30000")
            .parse::<u64>()
            .map_err(|_| {
                ConfigError::InvalidValue(
                    "IMPORT_MAX_ELAPSED_MS".to_string(),
                    "must be a valid u64".to_string(),
                )
            })?;

        let seed_samples = match env_map
            .get("SEED_SAMPLES")
            .map(|s| s.trim().to_ascii_lowercase())
            .as_deref()
            .unwrap_or("true")
        {
            "true" | "1" | "yes" => true,
            "false" | "0" | "no" => false,
            other => {
                return Err(ConfigError::InvalidValue(
                    "SEED_SAMPLES".to_string(),
                    format!("must be true or false, got {}", other),
                ))
            }
        };

        Ok(Config {
            port,
            database_path,
            import_url,
            import_max_elapsed: Duration::from_millis(import_max_elapsed_ms),
            seed_samples,
        })
    }
}

//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load configuration from an optional TOML file, apply environment
/// overrides and validate the result.
pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
            toml::from_str(&content).map_err(ConfigError::Parse)?
        }
        None => GatewayConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay credentials and endpoints taken from the environment.
///
/// Empty variables are ignored so a blank export cannot wipe a value
/// coming from the file.
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = get("PINATA_API_KEY") {
        config.provider.api_key = v;
    }
    if let Some(v) = get("PINATA_API_SECRET") {
        config.provider.api_secret = v;
    }
    if let Some(v) = get("PINATA_JWT") {
        config.provider.jwt = v;
    }
    if let Some(v) = get("PINATA_BASE_URL") {
        config.provider.base_url = v;
    }
    if let Some(v) = get("SLACK_WEBHOOK") {
        config.audit.webhook_url = Some(v);
    }
    if let Some(v) = get("SLACK_CHANNEL") {
        config.audit.webhook_channel = Some(v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_env_overrides_credentials() {
        let env: HashMap<&str, &str> = [
            ("PINATA_API_KEY", "env-key"),
            ("PINATA_API_SECRET", "env-secret"),
            ("PINATA_JWT", ""),
            ("SLACK_WEBHOOK", "https://hooks.example.com/x"),
        ]
        .into_iter()
        .collect();

        let mut config = GatewayConfig::default();
        config.provider.jwt = "from-file".into();
        apply_env_overrides(&mut config, |k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.provider.api_key, "env-key");
        assert_eq!(config.provider.api_secret, "env-secret");
        assert_eq!(config.provider.jwt, "from-file");
        assert_eq!(config.audit.webhook_url.as_deref(), Some("https://hooks.example.com/x"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [provider]
            api_key = "k"
            api_secret = "s"
            jwt = "j"
            base_url = "http://127.0.0.1:9999"

            [retries]
            base_delay_ms = 50
            "#
        )
        .unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.retries.base_delay_ms, 50);
        assert!(config.provider.base_url.starts_with("http"));
    }

    #[test]
    fn test_load_rejects_malformed_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[provider\napi_key = ").unwrap();
        let err = load_config(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}

//! CLI configuration loading
//!
//! Sources, later ones winning: built-in defaults, the config file
//! (`--config`, or `ojt/config.toml` in the user config dir when present),
//! `OJT__`-prefixed environment variables, then `--base-url`.

use anyhow::Result;
use ojt_http::ClientConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Resolved CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// API client settings
    pub client: ClientConfig,
}

impl CliConfig {
    /// Load configuration from all sources
    pub fn load(path: Option<&Path>, base_url: Option<String>) -> Result<Self> {
        let defaults = ClientConfig::default();

        let mut builder = config::Config::builder()
            .set_default("client.base_url", defaults.base_url)?
            .set_default("client.user_agent", defaults.user_agent)?;

        builder = match path {
            Some(path) => builder.add_source(config::File::from(path)),
            None => match default_config_path() {
                Some(path) => builder.add_source(config::File::from(path).required(false)),
                None => builder,
            },
        };

        let settings = builder
            .add_source(
                config::Environment::with_prefix("OJT")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("client.base_url", base_url)?
            .build()?;

        let loaded: Self = settings.try_deserialize()?;
        loaded.client.validate()?;
        Ok(loaded)
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("ojt").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_values_override_defaults() {
        let path = std::env::temp_dir().join(format!("ojt-config-{}.toml", std::process::id()));
        std::fs::write(
            &path,
            r#"
[client]
base_url = "https://ojt.example.com/api"
timeout_secs = 15

[client.endpoints]
refresh = "/auth/token/refresh/"
"#,
        )
        .unwrap();

        let loaded = CliConfig::load(Some(&path), None).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.client.base_url, "https://ojt.example.com/api");
        assert_eq!(loaded.client.timeout_secs, Some(15));
        assert_eq!(loaded.client.endpoints.refresh, "/auth/token/refresh/");
        assert_eq!(loaded.client.endpoints.login, "/auth/login/");
    }

    #[test]
    fn command_line_base_url_wins() {
        let path = std::env::temp_dir().join(format!("ojt-config-cli-{}.toml", std::process::id()));
        std::fs::write(&path, "[client]\nbase_url = \"https://from-file.test/api\"\n").unwrap();

        let loaded =
            CliConfig::load(Some(&path), Some("http://127.0.0.1:8000/api".to_string())).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.client.base_url, "http://127.0.0.1:8000/api");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let path = std::env::temp_dir().join(format!("ojt-config-bad-{}.toml", std::process::id()));
        std::fs::write(&path, "[client]\nbase_url = \"ojt.example.com\"\n").unwrap();

        let result = CliConfig::load(Some(&path), None);
        std::fs::remove_file(&path).ok();

        assert!(result.is_err());
    }
}

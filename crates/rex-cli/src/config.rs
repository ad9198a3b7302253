use anyhow::Context;
use rex_core::{MissingFilterPolicy, ReteConfig};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const CONFIG_PATH_VAR: &str = "REX_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "rex.toml";

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub filter: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { filter: default_log_filter(), json: false }
    }
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct RexConfig {
    #[serde(default)]
    pub network: ReteConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// File the configuration was read from, `None` when defaults were used
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl RexConfig {
    /// Read the configuration from `path`, `REX_CONFIG_PATH` or `rex.toml`.
    ///
    /// A missing file yields the defaults; a file that exists but does not
    /// parse is an error.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => std::env::var(CONFIG_PATH_VAR).map(PathBuf::from).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into()),
        };

        let Ok(text) = fs::read_to_string(&path) else {
            return Ok(Self::default());
        };
        let mut config: Self = toml::from_str(&text)
            .with_context(|| format!("Failed to parse configuration file '{}'", path.display()))?;
        config.source = Some(path);
        Ok(config)
    }

    /// Apply `REX_*` environment overrides
    pub fn apply_profile(self) -> Self {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    pub fn apply_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(prefix) = lookup("REX_VARIABLE_PREFIX") {
            self.network.variable_prefix = prefix;
        }
        if let Some(policy) = lookup("REX_MISSING_FILTER") {
            match policy.as_str() {
                "reject" => self.network.missing_filter = MissingFilterPolicy::Reject,
                "accept" => self.network.missing_filter = MissingFilterPolicy::Accept,
                other => warn!(value = other, "Ignoring unknown REX_MISSING_FILTER value"),
            }
        }
        if let Some(filter) = lookup("REX_LOG") {
            self.logging.filter = filter;
        }
        if let Some(json) = lookup("REX_LOG_JSON") {
            if let Ok(json) = json.parse::<bool>() {
                self.logging.json = json;
            }
        }
        self
    }

    /// Log where the configuration came from; call once tracing is up
    pub fn report_source(&self) {
        match &self.source {
            Some(path) => info!(path = %path.display(), "Loaded configuration"),
            None => warn!("Configuration file not found. Using default configuration."),
        }
    }
}

fn default_log_filter() -> String {
    "rex=info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: RexConfig = toml::from_str(
            r#"
[network]
missing_filter = "accept"
"#,
        )
        .unwrap();
        assert_eq!(config.network.missing_filter, MissingFilterPolicy::Accept);
        assert_eq!(config.network.variable_prefix, "$");
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = RexConfig::load(Some(Path::new("/nonexistent/rex.toml"))).unwrap();
        assert_eq!(config, RexConfig::default());
        assert!(config.source.is_none());
    }

    #[test]
    fn test_environment_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("REX_VARIABLE_PREFIX", "?"),
            ("REX_MISSING_FILTER", "accept"),
            ("REX_LOG", "rex=debug"),
            ("REX_LOG_JSON", "true"),
        ]);
        let config = RexConfig::default().apply_overrides(|name| vars.get(name).map(|v| v.to_string()));
        assert_eq!(config.network.variable_prefix, "?");
        assert_eq!(config.network.missing_filter, MissingFilterPolicy::Accept);
        assert_eq!(config.logging.filter, "rex=debug");
        assert!(config.logging.json);
    }

    #[test]
    fn test_unknown_policy_ignored() {
        let config = RexConfig::default().apply_overrides(|name| {
            (name == "REX_MISSING_FILTER").then(|| "sometimes".to_string())
        });
        assert_eq!(config.network.missing_filter, MissingFilterPolicy::Reject);
    }
}

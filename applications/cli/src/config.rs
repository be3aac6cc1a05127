/// Application configuration
use crate::error::{CliError, Result};
use musify_playback::PlaybackConfig;
use musify_source::{ResolverConfig, SourceQuery, DEFAULT_FALLBACK_TEMPLATE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file picked up from the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "musify.toml";

/// Environment variable prefix; nested keys use `__`, e.g.
/// `MUSIFY_RESOLVER__TIMEOUT_MS=2000`
pub const ENV_PREFIX: &str = "MUSIFY";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub resolver: ResolverConfig,

    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default)]
    pub source: SourceSettings,

    #[serde(default)]
    pub catalog: CatalogSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Log output; `RUST_LOG` takes precedence over `filter`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

/// Where track sources come from
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceSettings {
    /// Base URL of the primary source endpoint; unset means simulated
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default = "default_source_path")]
    pub path: String,

    #[serde(default)]
    pub query: QueryKey,

    /// URL template for the secondary provider
    #[serde(default = "default_fallback_template")]
    pub fallback_template: String,

    /// Seed for the simulated endpoint
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Query shape sent to the primary source endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKey {
    #[default]
    TrackId,
    NameArtist,
}

impl From<QueryKey> for SourceQuery {
    fn from(key: QueryKey) -> Self {
        match key {
            QueryKey::TrackId => SourceQuery::TrackId,
            QueryKey::NameArtist => SourceQuery::NameArtist,
        }
    }
}

/// Catalog API access
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogSettings {
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    /// Pre-issued bearer token, used instead of logging in
    #[serde(default)]
    pub token: Option<String>,

    #[serde(default = "default_search_limit")]
    pub search_limit: usize,
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist. Without one, `musify.toml` is used
    /// when present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, environment())
    }

    fn load_with_env(path: Option<&Path>, env: config::Environment) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path.to_path_buf()).required(true));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        let config = settings.add_source(env).build()?;
        Ok(config.try_deserialize()?)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.resolver.timeout_ms == 0 {
            return Err(CliError::Config(
                "resolver.timeout_ms must be greater than zero".to_string(),
            ));
        }

        if self.resolver.backoff_base_ms > self.resolver.backoff_max_ms {
            return Err(CliError::Config(format!(
                "resolver.backoff_base_ms ({}) exceeds resolver.backoff_max_ms ({})",
                self.resolver.backoff_base_ms, self.resolver.backoff_max_ms
            )));
        }

        if self.playback.wall_clock_ms == 0 {
            return Err(CliError::Config(
                "playback.wall_clock_ms must be greater than zero".to_string(),
            ));
        }

        if !self.source.fallback_template.contains('{') {
            return Err(CliError::Config(
                "source.fallback_template needs an {id}, {name} or {artist} placeholder"
                    .to_string(),
            ));
        }

        for (key, url) in [("source.url", &self.source.url), ("catalog.url", &self.catalog.url)] {
            if let Some(url) = url {
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    return Err(CliError::Config(format!(
                        "{} must start with http:// or https:// (got {:?})",
                        key, url
                    )));
                }
            }
        }

        if self.catalog.email.is_some() != self.catalog.password.is_some() {
            return Err(CliError::Config(
                "catalog.email and catalog.password must be set together".to_string(),
            ));
        }

        Ok(())
    }
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

// Default values
fn default_source_path() -> String {
    "/source".to_string()
}

fn default_fallback_template() -> String {
    DEFAULT_FALLBACK_TEMPLATE.to_string()
}

fn default_search_limit() -> usize {
    20
}

fn default_log_filter() -> String {
    "musify=info,musify_cli=info,musify_client=info,musify_playback=info,musify_source=info"
        .to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            url: None,
            path: default_source_path(),
            query: QueryKey::default(),
            fallback_template: default_fallback_template(),
            seed: None,
        }
    }
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            url: None,
            email: None,
            password: None,
            token: None,
            search_limit: default_search_limit(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use musify_playback::RepeatMode;
    use std::io::Write;

    fn no_env() -> config::Environment {
        environment().source(Some(config::Map::new()))
    }

    fn env(vars: &[(&str, &str)]) -> config::Environment {
        let map = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        environment().source(Some(map))
    }

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_without_sources() {
        let config = AppConfig::load_with_env(None, no_env()).unwrap();

        assert_eq!(config.resolver, ResolverConfig::default());
        assert_eq!(config.playback, PlaybackConfig::default());
        assert!(config.source.url.is_none());
        assert_eq!(config.source.path, "/source");
        assert_eq!(config.source.query, QueryKey::TrackId);
        assert_eq!(config.catalog.search_limit, 20);
        assert!(config.logging.filter.starts_with("musify=info"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_file_values_override_defaults() {
        let file = write_config(
            r#"
[resolver]
timeout_ms = 1500
max_retries = 4

[playback]
repeat = "all"
shuffle = true

[source]
url = "http://localhost:9090"
query = "name_artist"
"#,
        );

        let config = AppConfig::load_with_env(Some(file.path()), no_env()).unwrap();

        assert_eq!(config.resolver.timeout_ms, 1500);
        assert_eq!(config.resolver.max_retries, 4);
        assert_eq!(config.resolver.backoff_base_ms, 250);
        assert_eq!(config.playback.repeat, RepeatMode::All);
        assert!(config.playback.shuffle);
        assert_eq!(config.source.url.as_deref(), Some("http://localhost:9090"));
        assert_eq!(config.source.query, QueryKey::NameArtist);
    }

    #[test]
    fn test_env_overrides_file() {
        let file = write_config("[resolver]\ntimeout_ms = 1500\n");

        let config = AppConfig::load_with_env(
            Some(file.path()),
            env(&[
                ("MUSIFY_RESOLVER__TIMEOUT_MS", "900"),
                ("MUSIFY_RESOLVER__BREAKER_THRESHOLD", "0"),
                ("MUSIFY_PLAYBACK__FALLBACK_ENABLED", "false"),
                ("MUSIFY_CATALOG__URL", "http://localhost:8080/api"),
            ]),
        )
        .unwrap();

        assert_eq!(config.resolver.timeout_ms, 900);
        assert_eq!(config.resolver.breaker_threshold, 0);
        assert!(!config.playback.fallback_enabled);
        assert_eq!(config.catalog.url.as_deref(), Some("http://localhost:8080/api"));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");

        assert!(AppConfig::load_with_env(Some(&missing), no_env()).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.resolver.timeout_ms = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.resolver.backoff_base_ms = 5000;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.source.fallback_template = "https://cdn.example/static.mp3".into();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.source.url = Some("localhost:9090".into());
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.catalog.email = Some("user@example.com".into());
        assert!(config.validate().is_err());
    }
}

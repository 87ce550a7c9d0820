use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError, ValidationErrors};

/// Default values for configuration
const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;
const DEFAULT_PRESTA_POLL_INTERVAL_SECS: u64 = 60;
const DEFAULT_PAGE_SIZE: usize = 10;
const CONFIG_DIR: &str = "config";
const ENV_PREFIX: &str = "ORDERFLOW";
const SESSION_DIR: &str = ".orderflow";
const SESSION_FILE: &str = "session.json";

/// Client configuration with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Root of the REST API, e.g. `http://localhost:8000/api`
    #[validate(custom = "validate_base_url")]
    pub api_base_url: String,

    /// Per-request timeout. Unset means the HTTP client default (no timeout).
    #[serde(default)]
    #[validate(range(min = 1, max = 600))]
    pub request_timeout_secs: Option<u64>,

    /// Where the session (tokens + user) is persisted between runs
    #[serde(default)]
    pub session_path: Option<String>,

    /// Application environment
    #[serde(default = "default_environment")]
    #[validate(length(min = 1))]
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Auto-refresh interval for watched boards
    #[serde(default = "default_poll_interval_secs")]
    #[validate(range(min = 1, max = 3600))]
    pub poll_interval_secs: u64,

    /// Auto-refresh interval for the shop orders feed
    #[serde(default = "default_presta_poll_interval_secs")]
    #[validate(range(min = 1, max = 3600))]
    pub presta_poll_interval_secs: u64,

    /// Rows per table page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Page sizes a table may switch between
    #[serde(default = "default_page_size_options")]
    #[validate(length(min = 1))]
    pub page_size_options: Vec<usize>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: None,
            session_path: None,
            environment: default_environment(),
            log_level: default_log_level(),
            log_json: false,
            poll_interval_secs: default_poll_interval_secs(),
            presta_poll_interval_secs: default_presta_poll_interval_secs(),
            page_size: default_page_size(),
            page_size_options: default_page_size_options(),
        }
    }
}

impl AppConfig {
    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn presta_poll_interval(&self) -> Duration {
        Duration::from_secs(self.presta_poll_interval_secs)
    }

    /// Resolved session file: explicit setting, else `$HOME/.orderflow/session.json`.
    pub fn session_file(&self) -> Option<PathBuf> {
        if let Some(path) = self.session_path.as_deref().filter(|p| !p.trim().is_empty()) {
            return Some(PathBuf::from(path));
        }

        env::var("HOME").ok().map(|home| {
            let mut path = PathBuf::from(home);
            path.push(SESSION_DIR);
            path.push(SESSION_FILE);
            path
        })
    }

    fn validate_additional_constraints(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.page_size_options.iter().any(|size| *size == 0) {
            let mut err = ValidationError::new("page_size_options_zero");
            err.message = Some("page sizes must be greater than zero".into());
            errors.add("page_size_options", err);
        }

        if !self.page_size_options.contains(&self.page_size) {
            let mut err = ValidationError::new("page_size_not_offered");
            err.message = Some("page_size must be one of page_size_options".into());
            errors.add("page_size", err);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

fn default_presta_poll_interval_secs() -> u64 {
    DEFAULT_PRESTA_POLL_INTERVAL_SECS
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_page_size_options() -> Vec<usize> {
    vec![5, 10, 25]
}

fn validate_base_url(value: &str) -> Result<(), ValidationError> {
    match url::Url::parse(value) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
        _ => Err(ValidationError::new("invalid_api_base_url")),
    }
}

fn validate_log_level(value: &str) -> Result<(), ValidationError> {
    match value.to_ascii_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ValidationError::new("invalid_log_level")),
    }
}

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ConfigError),
    #[error("Invalid configuration: {0}")]
    Validation(#[from] ValidationErrors),
}

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_directive = format!("orderflow={level},warn");
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    // The CLI writes its results to stdout, so diagnostics go to stderr.
    if json {
        let _ = fmt()
            .with_env_filter(EnvFilter::new(filter_directive))
            .with_writer(std::io::stderr)
            .json()
            .try_init();
    } else {
        let _ = fmt()
            .with_env_filter(EnvFilter::new(filter_directive))
            .with_writer(std::io::stderr)
            .try_init();
    }
}

/// Loads the client configuration
///
/// Layers configuration sources in this order:
/// 1. Built-in defaults
/// 2. `config/default.toml`
/// 3. `config/{RUN_ENV}.toml`
/// 4. Environment variables (`ORDERFLOW__*`)
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    load_config_from(Path::new(CONFIG_DIR))
}

pub fn load_config_from(config_dir: &Path) -> Result<AppConfig, AppConfigError> {
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    let default_file = config_dir.join("default");
    let env_file = config_dir.join(&run_env);

    let config = Config::builder()
        .set_default("api_base_url", DEFAULT_API_BASE_URL)?
        .set_default("environment", run_env.as_str())?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::with_name(&default_file.to_string_lossy()).required(false))
        .add_source(File::with_name(&env_file.to_string_lossy()).required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("page_size_options")
                .try_parsing(true),
        )
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    app_config.validate_additional_constraints().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!(api_base_url = %app_config.api_base_url, "Configuration loaded successfully");
    Ok(app_config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, name: &str, content: &str) {
        let mut file = std::fs::File::create(dir.path().join(name)).unwrap();
        writeln!(file, "{}", content).unwrap();
    }

    #[test]
    fn defaults_validate() {
        let cfg = AppConfig::default();
        assert!(cfg.validate().is_ok());
        assert!(cfg.validate_additional_constraints().is_ok());
        assert_eq!(cfg.request_timeout(), None);
        assert_eq!(cfg.poll_interval(), Duration::from_secs(10));
        assert_eq!(cfg.presta_poll_interval(), Duration::from_secs(60));
    }

    #[test]
    fn presta_interval_is_bounded() {
        let cfg = AppConfig {
            presta_poll_interval_secs: 0,
            ..AppConfig::default()
        };
        let errors = cfg.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("presta_poll_interval_secs"));
    }

    #[test]
    fn page_size_must_be_offered() {
        let cfg = AppConfig {
            page_size: 7,
            ..AppConfig::default()
        };
        let errors = cfg.validate_additional_constraints().unwrap_err();
        assert!(errors.field_errors().contains_key("page_size"));
    }

    #[test]
    fn base_url_requires_http_scheme() {
        let cfg = AppConfig {
            api_base_url: "ftp://warehouse.local".into(),
            ..AppConfig::default()
        };
        let errors = cfg.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("api_base_url"));
    }

    #[test]
    fn explicit_session_path_wins() {
        let cfg = AppConfig {
            session_path: Some("/tmp/orderflow-test/session.json".into()),
            ..AppConfig::default()
        };
        assert_eq!(
            cfg.session_file(),
            Some(PathBuf::from("/tmp/orderflow-test/session.json"))
        );
    }

    #[test]
    fn default_file_is_layered_over_builtins() {
        let dir = TempDir::new().unwrap();
        write_config(
            &dir,
            "default.toml",
            r#"
                api_base_url = "http://192.168.1.16:8000/api"
                poll_interval_secs = 30
                page_size = 25
            "#,
        );

        let cfg = load_config_from(dir.path()).unwrap();
        assert_eq!(cfg.api_base_url, "http://192.168.1.16:8000/api");
        assert_eq!(cfg.poll_interval_secs, 30);
        assert_eq!(cfg.page_size, 25);
        assert_eq!(cfg.log_level, DEFAULT_LOG_LEVEL);
    }

    #[test]
    fn invalid_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        write_config(
            &dir,
            "default.toml",
            r#"
                api_base_url = "not a url"
                log_level = "loud"
            "#,
        );

        let result = load_config_from(dir.path());
        match result {
            Err(AppConfigError::Validation(errors)) => {
                assert!(errors.field_errors().contains_key("api_base_url"));
                assert!(errors.field_errors().contains_key("log_level"));
            }
            other => panic!("expected validation failure, got {:?}", other.map(|_| ())),
        }
    }
}

use super::serde_helpers::{load_env_string_opt, load_env_var, parse_meta_entries};
use super::{ConfigError, LogFormat, LogLevel, PersistenceBackend};
use crate::domain::Verbosity;
use crate::sender::ClientConfig;
use crate::sender::http::DEFAULT_ROOT_URL;
use crate::shipper::ShipperConfig;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_PERSISTENCE_PATH: &str = "/tmp/rask-log-shipper/pending.json";

/// Ships stdin lines to a log ingestion endpoint.
#[derive(Parser, Debug, Clone, Serialize, Deserialize)]
#[command(author, version, about, long_about = None)]
#[serde(default)]
pub struct Config {
    /// Ingestion API key, appended to the endpoint path
    #[arg(long, env = "SHIPPER_API_KEY")]
    pub api_key: Option<String>,

    /// Ingestion root URL
    #[arg(long, env = "SHIPPER_ENDPOINT", default_value = DEFAULT_ROOT_URL)]
    pub endpoint: String,

    /// Seconds between dispatches (below 1 is allowed but warned about)
    #[arg(long, env = "SHIPPER_SENDING_FREQUENCY", default_value = "20")]
    pub sending_frequency: f64,

    /// Delivery report verbosity
    #[arg(long, env = "SHIPPER_VERBOSITY", default_value = "short")]
    pub verbosity: Verbosity,

    /// Static metadata added to every entry, as key=value (repeatable)
    #[arg(long = "meta", env = "SHIPPER_META", value_delimiter = ',')]
    pub meta: Vec<String>,

    /// Value of the IP tracking header
    #[arg(long, env = "SHIPPER_IP_TRACKING")]
    pub ip_tracking: Option<String>,

    /// Value of the user-agent tracking header
    #[arg(long, env = "SHIPPER_USER_AGENT_TRACKING")]
    pub user_agent_tracking: Option<String>,

    /// Disable local persistence of pending entries
    #[arg(long, env = "SHIPPER_NO_PERSISTENCE")]
    pub no_persistence: bool,

    /// Persistence backend
    #[arg(long, env = "SHIPPER_PERSISTENCE_BACKEND", default_value = "file")]
    pub persistence_backend: PersistenceBackend,

    /// Persistence location (file path, or directory for sled)
    #[arg(long, env = "SHIPPER_PERSISTENCE_PATH", default_value = DEFAULT_PERSISTENCE_PATH)]
    pub persistence_path: PathBuf,

    /// HTTP request timeout in seconds
    #[arg(long, env = "SHIPPER_REQUEST_TIMEOUT_SECS", default_value = "60")]
    pub request_timeout_secs: u64,

    /// Add a `host` metadata field from the machine hostname
    #[arg(long, env = "SHIPPER_HOST_META")]
    pub host_meta: bool,

    /// Agent log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Agent log output format
    #[arg(long, env = "LOG_FORMAT", default_value = "compact")]
    pub log_format: LogFormat,

    /// Configuration file path (optional)
    #[arg(long, env = "CONFIG_FILE")]
    pub config_file: Option<PathBuf>,

    /// Derived fields (not CLI arguments)
    #[serde(skip)]
    #[arg(skip)]
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: DEFAULT_ROOT_URL.to_string(),
            sending_frequency: 20.0,
            verbosity: Verbosity::Short,
            meta: Vec::new(),
            ip_tracking: None,
            user_agent_tracking: None,
            no_persistence: false,
            persistence_backend: PersistenceBackend::File,
            persistence_path: PathBuf::from(DEFAULT_PERSISTENCE_PATH),
            request_timeout_secs: 60,
            host_meta: false,
            log_level: LogLevel::Info,
            log_format: LogFormat::Compact,
            config_file: None,
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl Config {
    pub fn from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let mut config = Config::parse_from(args);
        config.post_process()?;
        config.validate()?;
        Ok(config)
    }

    /// CLI arguments, unless they name a config file, in which case the file
    /// is the whole configuration.
    pub fn load<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let config = Config::parse_from(args);
        match &config.config_file {
            Some(path) => Self::from_file(path),
            None => {
                let mut config = config;
                config.post_process()?;
                config.validate()?;
                Ok(config)
            }
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Config::default();

        load_env_string_opt("SHIPPER_API_KEY", &mut config.api_key);
        if let Ok(endpoint) = std::env::var("SHIPPER_ENDPOINT") {
            config.endpoint = endpoint;
        }
        load_env_var("SHIPPER_SENDING_FREQUENCY", &mut config.sending_frequency)?;

        if let Ok(verbosity) = std::env::var("SHIPPER_VERBOSITY") {
            config.verbosity = match verbosity.to_lowercase().as_str() {
                "none" => Verbosity::None,
                "short" => Verbosity::Short,
                "verbose" => Verbosity::Verbose,
                _ => {
                    return Err(ConfigError::EnvError(format!(
                        "Invalid SHIPPER_VERBOSITY: {verbosity}. Valid values: none, short, verbose"
                    )));
                }
            };
        }

        if let Ok(meta) = std::env::var("SHIPPER_META") {
            config.meta = meta
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string)
                .collect();
        }
        load_env_string_opt("SHIPPER_IP_TRACKING", &mut config.ip_tracking);
        load_env_string_opt("SHIPPER_USER_AGENT_TRACKING", &mut config.user_agent_tracking);
        load_env_var("SHIPPER_NO_PERSISTENCE", &mut config.no_persistence)?;
        if let Ok(path) = std::env::var("SHIPPER_PERSISTENCE_PATH") {
            config.persistence_path = PathBuf::from(path);
        }
        load_env_var("SHIPPER_REQUEST_TIMEOUT_SECS", &mut config.request_timeout_secs)?;
        load_env_var("SHIPPER_HOST_META", &mut config.host_meta)?;

        if let Ok(log_level) = std::env::var("LOG_LEVEL") {
            config.log_level = match log_level.to_lowercase().as_str() {
                "error" => LogLevel::Error,
                "warn" => LogLevel::Warn,
                "info" => LogLevel::Info,
                "debug" => LogLevel::Debug,
                "trace" => LogLevel::Trace,
                _ => {
                    return Err(ConfigError::EnvError(format!(
                        "Invalid LOG_LEVEL: {log_level}"
                    )));
                }
            };
        }

        config.post_process()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.post_process()?;
        config.validate()?;
        Ok(config)
    }

    pub fn post_process(&mut self) -> Result<(), ConfigError> {
        self.request_timeout = Duration::from_secs(self.request_timeout_secs);

        if self.host_meta && !self.meta.iter().any(|m| m.starts_with("host=")) {
            let hostname = hostname::get()
                .map_err(|e| ConfigError::InvalidConfig(format!("Cannot read hostname: {e}")))?;
            self.meta
                .push(format!("host={}", hostname.to_string_lossy()));
        }

        Ok(())
    }

    pub fn shipper_config(&self) -> Result<ShipperConfig, ConfigError> {
        Ok(ShipperConfig {
            api_key: self.api_key.clone(),
            metadata: parse_meta_entries(&self.meta)?,
            sending_frequency_secs: self.sending_frequency,
            verbosity: self.verbosity,
            ip_tracking: self.ip_tracking.clone(),
            user_agent_tracking: self.user_agent_tracking.clone(),
        })
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            root_url: self.endpoint.clone(),
            timeout: self.request_timeout,
            ..ClientConfig::default()
        }
    }
}

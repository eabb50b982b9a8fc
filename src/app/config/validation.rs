use super::serde_helpers::parse_meta_entries;
use super::{Config, ConfigError, PersistenceBackend};
use crate::shipper::sending_interval;
use url::Url;

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        // API key
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => {}
            _ => {
                return Err(ConfigError::InvalidConfig(
                    "API key is required (--api-key or SHIPPER_API_KEY)".to_string(),
                ));
            }
        }

        // Endpoint URL
        let endpoint = Url::parse(&self.endpoint).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid endpoint URL '{}': {}", self.endpoint, e))
        })?;
        if endpoint.cannot_be_a_base() {
            return Err(ConfigError::InvalidUrl(format!(
                "Endpoint URL '{}' cannot take a path",
                self.endpoint
            )));
        }

        // Sending frequency (sub-second values only warn)
        sending_interval(self.sending_frequency).map_err(|e| {
            ConfigError::InvalidConfig(format!("{e}; it must be a positive number of seconds"))
        })?;

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "Request timeout must be greater than 0".to_string(),
            ));
        }

        parse_meta_entries(&self.meta)?;

        if self.persistence_backend == PersistenceBackend::Sled
            && !self.no_persistence
            && !cfg!(feature = "disk-fallback")
        {
            return Err(ConfigError::InvalidConfig(
                "The sled persistence backend needs the disk-fallback feature".to_string(),
            ));
        }

        Ok(())
    }
}

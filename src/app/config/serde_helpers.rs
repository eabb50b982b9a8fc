use crate::domain::Fields;
use serde_json::Value;

/// Parses `key=value` metadata entries into an ordered object. Values are
/// kept as strings; later duplicates win.
pub fn parse_meta_entries(entries: &[String]) -> Result<Fields, super::ConfigError> {
    let mut metadata = Fields::new();
    for entry in entries {
        let Some((key, value)) = entry.split_once('=') else {
            return Err(super::ConfigError::InvalidConfig(format!(
                "Metadata entry '{entry}' must look like key=value"
            )));
        };
        let key = key.trim();
        if key.is_empty() {
            return Err(super::ConfigError::InvalidConfig(format!(
                "Metadata entry '{entry}' has an empty key"
            )));
        }
        metadata.insert(key.to_string(), Value::String(value.trim().to_string()));
    }
    Ok(metadata)
}

/// Helper function to load and parse an environment variable.
/// Returns Ok(()) if the variable doesn't exist (keeps default).
pub fn load_env_var<T>(name: &str, target: &mut T) -> Result<(), super::ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    if let Ok(value) = std::env::var(name) {
        *target = value
            .parse()
            .map_err(|e| super::ConfigError::EnvError(format!("Invalid {name}: {e}")))?;
    }
    Ok(())
}

/// Helper function to load an optional string environment variable.
pub fn load_env_string_opt(name: &str, target: &mut Option<String>) {
    if let Ok(value) = std::env::var(name) {
        *target = Some(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_meta_entries_keeps_order_and_trims() {
        let entries = vec!["app = demo".to_string(), "env=prod=eu".to_string()];
        let metadata = parse_meta_entries(&entries).unwrap();

        let pairs: Vec<_> = metadata
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str().unwrap_or_default()))
            .collect();
        assert_eq!(pairs, vec![("app", "demo"), ("env", "prod=eu")]);
    }

    #[test]
    fn test_parse_meta_entries_rejects_malformed() {
        assert!(parse_meta_entries(&["novalue".to_string()]).is_err());
        assert!(parse_meta_entries(&["=value".to_string()]).is_err());
    }
}

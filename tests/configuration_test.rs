use rask_log_shipper::app::{Config, ConfigError, LogFormat, LogLevel, PersistenceBackend};
use rask_log_shipper::domain::Verbosity;
use serde_json::json;
use serial_test::serial;
use std::{env, path::PathBuf, time::Duration};
use tempfile::TempDir;

// Helper function to clean all environment variables before and after tests
fn clean_all_env_vars() {
    let env_vars = [
        "SHIPPER_API_KEY",
        "SHIPPER_ENDPOINT",
        "SHIPPER_SENDING_FREQUENCY",
        "SHIPPER_VERBOSITY",
        "SHIPPER_META",
        "SHIPPER_IP_TRACKING",
        "SHIPPER_USER_AGENT_TRACKING",
        "SHIPPER_NO_PERSISTENCE",
        "SHIPPER_PERSISTENCE_BACKEND",
        "SHIPPER_PERSISTENCE_PATH",
        "SHIPPER_REQUEST_TIMEOUT_SECS",
        "SHIPPER_HOST_META",
        "LOG_LEVEL",
        "LOG_FORMAT",
        "CONFIG_FILE",
    ];

    unsafe {
        for var in &env_vars {
            env::remove_var(var);
        }
    }
}

#[test]
#[serial]
fn test_config_from_args() {
    clean_all_env_vars();

    let args = vec![
        "rask-log-shipper",
        "--api-key",
        "abc123",
        "--endpoint",
        "http://localhost:9000/ingest",
        "--sending-frequency",
        "5",
        "--verbosity",
        "verbose",
        "--meta",
        "app=checkout",
        "--meta",
        "env=prod",
        "--ip-tracking",
        "client_ip",
        "--request-timeout-secs",
        "10",
        "--log-level",
        "debug",
        "--log-format",
        "json",
    ];

    let config = Config::from_args(args).unwrap();

    assert_eq!(config.api_key.as_deref(), Some("abc123"));
    assert_eq!(config.endpoint, "http://localhost:9000/ingest");
    assert_eq!(config.sending_frequency, 5.0);
    assert_eq!(config.verbosity, Verbosity::Verbose);
    assert_eq!(config.ip_tracking.as_deref(), Some("client_ip"));
    assert_eq!(config.request_timeout, Duration::from_secs(10));
    assert_eq!(config.log_level, LogLevel::Debug);
    assert_eq!(config.log_format, LogFormat::Json);

    let shipper_config = config.shipper_config().unwrap();
    assert_eq!(shipper_config.metadata.get("app"), Some(&json!("checkout")));
    assert_eq!(shipper_config.metadata.get("env"), Some(&json!("prod")));
    assert_eq!(shipper_config.ip_tracking.as_deref(), Some("client_ip"));

    let client_config = config.client_config();
    assert_eq!(client_config.root_url, "http://localhost:9000/ingest");
    assert_eq!(client_config.timeout, Duration::from_secs(10));
}

#[test]
#[serial]
fn test_config_defaults() {
    clean_all_env_vars();

    let config = Config::from_args(vec!["rask-log-shipper", "--api-key", "k"]).unwrap();

    assert_eq!(config.endpoint, "https://api.logmatic.io/v1/input");
    assert_eq!(config.sending_frequency, 20.0);
    assert_eq!(config.verbosity, Verbosity::Short);
    assert!(config.meta.is_empty());
    assert!(!config.no_persistence);
    assert_eq!(config.persistence_backend, PersistenceBackend::File);
    assert_eq!(
        config.persistence_path,
        PathBuf::from("/tmp/rask-log-shipper/pending.json")
    );
    assert_eq!(config.request_timeout, Duration::from_secs(60));
    assert_eq!(config.log_level, LogLevel::Info);
    assert_eq!(config.log_format, LogFormat::Compact);
}

#[test]
#[serial]
fn test_missing_api_key_rejected() {
    clean_all_env_vars();

    let result = Config::from_args(vec!["rask-log-shipper"]);
    assert!(matches!(result, Err(ConfigError::InvalidConfig(_))));
}

#[test]
#[serial]
fn test_env_vars_feed_cli_parser() {
    clean_all_env_vars();
    unsafe {
        env::set_var("SHIPPER_API_KEY", "from-env");
        env::set_var("SHIPPER_META", "team=core,region=eu");
        env::set_var("SHIPPER_NO_PERSISTENCE", "true");
    }

    let config = Config::from_args(vec!["rask-log-shipper"]).unwrap();
    clean_all_env_vars();

    assert_eq!(config.api_key.as_deref(), Some("from-env"));
    assert_eq!(config.meta, vec!["team=core", "region=eu"]);
    assert!(config.no_persistence);
}

#[test]
#[serial]
fn test_config_from_env() {
    clean_all_env_vars();
    unsafe {
        env::set_var("SHIPPER_API_KEY", "env-key");
        env::set_var("SHIPPER_SENDING_FREQUENCY", "0.5");
        env::set_var("SHIPPER_VERBOSITY", "none");
        env::set_var("SHIPPER_REQUEST_TIMEOUT_SECS", "15");
        env::set_var("LOG_LEVEL", "warn");
    }

    let config = Config::from_env().unwrap();
    clean_all_env_vars();

    assert_eq!(config.api_key.as_deref(), Some("env-key"));
    assert_eq!(config.sending_frequency, 0.5);
    assert_eq!(config.verbosity, Verbosity::None);
    assert_eq!(config.request_timeout, Duration::from_secs(15));
    assert_eq!(config.log_level, LogLevel::Warn);
}

#[test]
#[serial]
fn test_config_from_env_rejects_bad_values() {
    clean_all_env_vars();
    unsafe {
        env::set_var("SHIPPER_API_KEY", "env-key");
        env::set_var("SHIPPER_VERBOSITY", "loud");
    }
    assert!(matches!(Config::from_env(), Err(ConfigError::EnvError(_))));

    unsafe {
        env::set_var("SHIPPER_VERBOSITY", "short");
        env::set_var("SHIPPER_SENDING_FREQUENCY", "often");
    }
    assert!(matches!(Config::from_env(), Err(ConfigError::EnvError(_))));

    clean_all_env_vars();
}

#[test]
#[serial]
fn test_config_from_file() {
    clean_all_env_vars();
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("shipper.toml");
    std::fs::write(
        &path,
        r#"
api_key = "file-key"
endpoint = "http://collector.internal/v1/input"
sending_frequency = 2.5
verbosity = "verbose"
meta = ["service=billing"]
persistence_backend = "file"
persistence_path = "/var/lib/shipper/pending.json"
request_timeout_secs = 30
log_level = "trace"
"#,
    )
    .unwrap();

    let config = Config::from_file(&path).unwrap();

    assert_eq!(config.api_key.as_deref(), Some("file-key"));
    assert_eq!(config.endpoint, "http://collector.internal/v1/input");
    assert_eq!(config.sending_frequency, 2.5);
    assert_eq!(config.verbosity, Verbosity::Verbose);
    assert_eq!(config.meta, vec!["service=billing"]);
    assert_eq!(
        config.persistence_path,
        PathBuf::from("/var/lib/shipper/pending.json")
    );
    assert_eq!(config.request_timeout, Duration::from_secs(30));
    assert_eq!(config.log_level, LogLevel::Trace);
    // Unset keys fall back to defaults.
    assert_eq!(config.log_format, LogFormat::Compact);
}

#[test]
#[serial]
fn test_config_file_argument_loads_file() {
    clean_all_env_vars();
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("shipper.toml");
    std::fs::write(&path, "api_key = \"via-file\"\nsending_frequency = 3.0\n").unwrap();

    let config = Config::load(vec![
        "rask-log-shipper".to_string(),
        "--config-file".to_string(),
        path.display().to_string(),
    ])
    .unwrap();

    assert_eq!(config.api_key.as_deref(), Some("via-file"));
    assert_eq!(config.sending_frequency, 3.0);
}

#[test]
#[serial]
fn test_config_file_with_invalid_toml() {
    clean_all_env_vars();
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("broken.toml");
    std::fs::write(&path, "api_key = [unterminated").unwrap();

    assert!(matches!(
        Config::from_file(&path),
        Err(ConfigError::ParseError(_))
    ));
}

#[test]
#[serial]
fn test_validation_errors() {
    clean_all_env_vars();

    let valid = Config {
        api_key: Some("k".to_string()),
        ..Config::default()
    };
    assert!(valid.validate().is_ok());

    let blank_key = Config {
        api_key: Some("   ".to_string()),
        ..valid.clone()
    };
    assert!(matches!(
        blank_key.validate(),
        Err(ConfigError::InvalidConfig(_))
    ));

    let bad_url = Config {
        endpoint: "not a url".to_string(),
        ..valid.clone()
    };
    assert!(matches!(bad_url.validate(), Err(ConfigError::InvalidUrl(_))));

    let zero_frequency = Config {
        sending_frequency: 0.0,
        ..valid.clone()
    };
    assert!(zero_frequency.validate().is_err());

    let sub_second = Config {
        sending_frequency: 0.25,
        ..valid.clone()
    };
    assert!(sub_second.validate().is_ok());

    let zero_timeout = Config {
        request_timeout_secs: 0,
        ..valid.clone()
    };
    assert!(zero_timeout.validate().is_err());

    let bad_meta = Config {
        meta: vec!["no-equals-sign".to_string()],
        ..valid
    };
    assert!(matches!(
        bad_meta.validate(),
        Err(ConfigError::InvalidConfig(_))
    ));
}

#[test]
#[serial]
fn test_host_meta_adds_hostname() {
    clean_all_env_vars();

    let config =
        Config::from_args(vec!["rask-log-shipper", "--api-key", "k", "--host-meta"]).unwrap();

    let metadata = config.shipper_config().unwrap().metadata;
    let host = metadata.get("host").and_then(|v| v.as_str()).unwrap();
    assert!(!host.is_empty());
}

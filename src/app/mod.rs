pub mod config;
pub mod logging_system;
pub mod signals;

pub use config::{Config, ConfigError, LogFormat, LogLevel, PersistenceBackend};
pub use logging_system::{LoggingError, LoggingSystem};
pub use signals::{HostSignal, SignalListener};

use crate::domain::{Fields, MESSAGE_KEY};
use crate::reliability::{FilePersistence, NoopPersistence, Persistence};
use crate::sender::HttpTransport;
use crate::shipper::LogShipper;
use anyhow::Context;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// The stdin-to-endpoint agent: one shipper, fed line by line.
pub struct App {
    config: Config,
    shipper: LogShipper,
}

impl App {
    pub async fn from_args<I, T>(args: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let config = Config::load(args)?;
        Self::from_config(config).await
    }

    pub async fn from_config(config: Config) -> anyhow::Result<Self> {
        let transport = HttpTransport::new(config.client_config())
            .context("Failed to build HTTP transport")?;
        let persistence = build_persistence(&config)?;
        let shipper = LogShipper::spawn(config.shipper_config()?, Arc::new(transport), persistence)?;

        info!("Starting rask-log-shipper v{}", crate::VERSION);
        info!(
            "Configuration: endpoint={}, sending_frequency={}s, verbosity={}, persistence={}",
            config.endpoint,
            config.sending_frequency,
            config.verbosity,
            if config.no_persistence {
                "off".to_string()
            } else {
                config.persistence_path.display().to_string()
            }
        );

        Ok(Self { config, shipper })
    }

    pub fn shipper(&self) -> &LogShipper {
        &self.shipper
    }

    /// Ships stdin until it closes or a terminate signal arrives.
    pub async fn run(self) -> anyhow::Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        self.run_with_input(stdin).await
    }

    pub async fn run_with_input<R>(self, input: R) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut signals = SignalListener::new().context("Failed to install signal handlers")?;
        let mut lines = input.lines();

        self.shipper.start_logger().await?;
        info!("rask-log-shipper is running. Reading log lines from stdin.");

        loop {
            tokio::select! {
                line = lines.next_line() => match line.context("Failed to read input")? {
                    Some(line) => self.ship_line(&line),
                    None => {
                        info!("Input closed; draining pending logs");
                        self.drain().await;
                        break;
                    }
                },
                signal = signals.recv() => match signal {
                    HostSignal::Suspend => self.shipper.did_suspend().await?,
                    HostSignal::Resume => self.shipper.will_resume().await?,
                    HostSignal::Terminate => break,
                },
            }
        }

        self.shipper.did_suspend().await?;
        info!("rask-log-shipper stopped.");
        Ok(())
    }

    fn ship_line(&self, line: &str) {
        let Some((fields, message)) = parse_line(line) else {
            return;
        };
        if let Err(e) = self.shipper.log(fields.as_ref(), &message) {
            debug!("Line not shipped: {e}");
        }
    }

    /// Gives buffered and in-flight entries one sending period plus one
    /// request timeout to leave before the shipper is suspended.
    async fn drain(&self) {
        let deadline = Instant::now()
            + Duration::from_secs_f64(self.config.sending_frequency)
            + self.config.request_timeout;

        while Instant::now() < deadline {
            match self.shipper.status().await {
                Ok(status) if status.buffered.is_empty() && status.in_flight == 0 => return,
                Ok(_) => tokio::time::sleep(DRAIN_POLL_INTERVAL).await,
                Err(_) => return,
            }
        }
        warn!("Drain timeout exceeded; remaining logs go to persistence");
    }
}

fn build_persistence(config: &Config) -> anyhow::Result<Arc<dyn Persistence>> {
    if config.no_persistence {
        return Ok(Arc::new(NoopPersistence));
    }

    match config.persistence_backend {
        PersistenceBackend::File => Ok(Arc::new(FilePersistence::new(&config.persistence_path))),
        #[cfg(feature = "disk-fallback")]
        PersistenceBackend::Sled => {
            let store = crate::reliability::SledPersistence::open(&config.persistence_path)
                .context("Failed to open sled persistence")?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "disk-fallback"))]
        PersistenceBackend::Sled => {
            anyhow::bail!("The sled persistence backend needs the disk-fallback feature")
        }
    }
}

/// Splits one input line into extra fields and a message.
///
/// A JSON object contributes its fields, with its `message` field (if any)
/// becoming the message. Anything else is the message verbatim. Blank lines
/// yield `None`.
pub fn parse_line(line: &str) -> Option<(Option<Fields>, String)> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return None;
    }

    match serde_json::from_str::<Value>(line) {
        Ok(Value::Object(mut fields)) => {
            let message = match fields.shift_remove(MESSAGE_KEY) {
                Some(Value::String(message)) => message,
                Some(other) => other.to_string(),
                None => String::new(),
            };
            Some((Some(fields), message))
        }
        _ => Some((None, line.to_string())),
    }
}

pub async fn main() -> anyhow::Result<()> {
    let config = Config::load(std::env::args_os())?;

    LoggingSystem::new(config.log_level, config.log_format)
        .init()
        .context("Failed to initialize logging")?;

    let app = App::from_config(config).await?;
    app.run().await
}

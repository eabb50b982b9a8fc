//! The log shipper: a cloneable handle in front of a single service task.
//!
//! ```text
//!   LogShipper (clone per call site)
//!       │ log() enriches on the caller, then sends Command::Append
//!       v
//!   ShipperService task ── owns LogBuffer, InFlightRequests, Lifecycle
//!       │ tick: Dispatcher snapshots the buffer, spawns the send
//!       v
//!   Transport ── Completion ──> back into ShipperService (reconcile)
//! ```
//!
//! All buffer and in-flight mutations happen inside the service task, so
//! appends, dispatches and completions are serialized without locks. Only the
//! settings (API key, metadata, verbosity, headers, frequency) are shared.

pub mod dispatcher;
pub mod lifecycle;
pub mod service;

pub use dispatcher::Dispatcher;
pub use lifecycle::{DEFAULT_SENDING_FREQUENCY_SECS, Lifecycle, LifecycleState, sending_interval};
pub use service::ShipperService;

use crate::buffer::{Clock, Enricher, SystemClock};
use crate::domain::{Fields, LogEntry, ShipperError, Verbosity};
use crate::reliability::Persistence;
use crate::sender::Transport;
use crate::sender::http::{IP_TRACKING_HEADER, USER_AGENT_TRACKING_HEADER};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::error;

/// Construction-time settings of a shipper.
#[derive(Debug, Clone)]
pub struct ShipperConfig {
    /// Required before the first `log` call; may be set later.
    pub api_key: Option<String>,
    /// Static fields merged into every entry.
    pub metadata: Fields,
    pub sending_frequency_secs: f64,
    pub verbosity: Verbosity,
    pub ip_tracking: Option<String>,
    pub user_agent_tracking: Option<String>,
}

impl Default for ShipperConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            metadata: Fields::new(),
            sending_frequency_secs: DEFAULT_SENDING_FREQUENCY_SECS,
            verbosity: Verbosity::default(),
            ip_tracking: None,
            user_agent_tracking: None,
        }
    }
}

/// Settings shared between the handle and the service task.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: Option<String>,
    pub metadata: Fields,
    pub sending_interval: Duration,
    pub verbosity: Verbosity,
    pub extra_headers: BTreeMap<String, String>,
}

impl Settings {
    fn from_config(config: ShipperConfig) -> Result<Self, ShipperError> {
        let mut extra_headers = BTreeMap::new();
        if let Some(ip) = config.ip_tracking {
            extra_headers.insert(IP_TRACKING_HEADER.to_string(), ip);
        }
        if let Some(user_agent) = config.user_agent_tracking {
            extra_headers.insert(USER_AGENT_TRACKING_HEADER.to_string(), user_agent);
        }

        Ok(Self {
            api_key: config.api_key,
            metadata: config.metadata,
            sending_interval: sending_interval(config.sending_frequency_secs)?,
            verbosity: config.verbosity,
            extra_headers,
        })
    }
}

/// Snapshot of the service state, for introspection and tests.
#[derive(Debug, Clone)]
pub struct ShipperStatus {
    pub state: LifecycleState,
    pub should_run: bool,
    pub buffered: Vec<LogEntry>,
    pub in_flight: usize,
}

#[derive(Debug)]
pub(crate) enum Command {
    Append(LogEntry),
    StartLogger(oneshot::Sender<()>),
    WillResume(oneshot::Sender<()>),
    DidSuspend(oneshot::Sender<()>),
    Status(oneshot::Sender<ShipperStatus>),
}

/// Handle used by application code to log and to forward lifecycle signals.
///
/// Cloning is cheap. When the last clone is dropped the service persists the
/// buffer and exits.
#[derive(Clone)]
pub struct LogShipper {
    commands: mpsc::UnboundedSender<Command>,
    settings: Arc<RwLock<Settings>>,
    enricher: Enricher,
}

impl LogShipper {
    /// Builds a handle and the service it drives. The caller spawns
    /// `ShipperService::run`.
    pub fn new(
        config: ShipperConfig,
        transport: Arc<dyn Transport>,
        persistence: Arc<dyn Persistence>,
    ) -> Result<(Self, ShipperService), ShipperError> {
        Self::with_clock(config, transport, persistence, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: ShipperConfig,
        transport: Arc<dyn Transport>,
        persistence: Arc<dyn Persistence>,
        clock: Arc<dyn Clock>,
    ) -> Result<(Self, ShipperService), ShipperError> {
        let settings = Arc::new(RwLock::new(Settings::from_config(config)?));
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let service = ShipperService::new(commands_rx, settings.clone(), transport, persistence);

        let shipper = Self {
            commands: commands_tx,
            settings,
            enricher: Enricher::new(clock),
        };
        Ok((shipper, service))
    }

    /// Builds the shipper and spawns its service on the current runtime.
    pub fn spawn(
        config: ShipperConfig,
        transport: Arc<dyn Transport>,
        persistence: Arc<dyn Persistence>,
    ) -> Result<Self, ShipperError> {
        let (shipper, service) = Self::new(config, transport, persistence)?;
        tokio::spawn(service.run());
        Ok(shipper)
    }

    /// Enriches and queues one entry. Never blocks and never touches the
    /// network or the disk.
    pub fn log(&self, fields: Option<&Fields>, message: &str) -> Result<(), ShipperError> {
        let entry = {
            let settings = self.settings.read();
            if settings.api_key.is_none() {
                error!("API key required before logging; entry not recorded");
                return Err(ShipperError::MissingApiKey);
            }
            self.enricher.enrich(&settings.metadata, fields, message)?
        };
        self.commands
            .send(Command::Append(entry))
            .map_err(|_| ShipperError::ServiceClosed)
    }

    pub fn log_message(&self, message: &str) -> Result<(), ShipperError> {
        self.log(None, message)
    }

    /// Marks the shipper as wanted and starts it.
    pub async fn start_logger(&self) -> Result<(), ShipperError> {
        self.request(Command::StartLogger).await
    }

    /// Host is coming back to the foreground.
    pub async fn will_resume(&self) -> Result<(), ShipperError> {
        self.request(Command::WillResume).await
    }

    /// Host went to the background: stop and persist.
    pub async fn did_suspend(&self) -> Result<(), ShipperError> {
        self.request(Command::DidSuspend).await
    }

    pub async fn status(&self) -> Result<ShipperStatus, ShipperError> {
        self.request(Command::Status).await
    }

    pub fn set_api_key(&self, api_key: impl Into<String>) {
        self.settings.write().api_key = Some(api_key.into());
    }

    pub fn set_metadata(&self, metadata: Fields) {
        self.settings.write().metadata = metadata;
    }

    pub fn set_verbosity(&self, verbosity: Verbosity) {
        self.settings.write().verbosity = verbosity;
    }

    /// Takes effect the next time the timer is armed.
    pub fn set_sending_frequency(&self, secs: f64) -> Result<(), ShipperError> {
        let period = sending_interval(secs)?;
        self.settings.write().sending_interval = period;
        Ok(())
    }

    pub fn set_ip_tracking(&self, value: impl Into<String>) {
        self.set_header(IP_TRACKING_HEADER, value.into());
    }

    pub fn set_user_agent_tracking(&self, value: impl Into<String>) {
        self.set_header(USER_AGENT_TRACKING_HEADER, value.into());
    }

    pub fn settings(&self) -> Settings {
        self.settings.read().clone()
    }

    fn set_header(&self, name: &str, value: String) {
        self.settings
            .write()
            .extra_headers
            .insert(name.to_string(), value);
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, ShipperError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(command(tx))
            .map_err(|_| ShipperError::ServiceClosed)?;
        rx.await.map_err(|_| ShipperError::ServiceClosed)
    }
}

impl std::fmt::Debug for LogShipper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogShipper")
            .field("settings", &*self.settings.read())
            .finish_non_exhaustive()
    }
}

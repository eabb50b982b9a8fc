//! Maps process signals onto host lifecycle events.
//!
//! | Signal           | Event       |
//! |------------------|-------------|
//! | SIGINT, SIGTERM  | `Terminate` |
//! | SIGUSR1          | `Suspend`   |
//! | SIGUSR2          | `Resume`    |
//!
//! Off unix only Ctrl+C is observed.

#[cfg(unix)]
use tokio::signal::unix::{Signal, SignalKind, signal};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostSignal {
    /// Host moved to the background: stop shipping and persist.
    Suspend,
    /// Host is back in the foreground.
    Resume,
    /// Persist and exit.
    Terminate,
}

#[derive(Debug)]
pub struct SignalListener {
    #[cfg(unix)]
    interrupt: Signal,
    #[cfg(unix)]
    terminate: Signal,
    #[cfg(unix)]
    suspend: Signal,
    #[cfg(unix)]
    resume: Signal,
}

impl SignalListener {
    /// Registers the handlers up front so registration errors surface to the
    /// caller instead of inside a task.
    #[cfg(unix)]
    pub fn new() -> std::io::Result<Self> {
        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
            suspend: signal(SignalKind::user_defined1())?,
            resume: signal(SignalKind::user_defined2())?,
        })
    }

    #[cfg(not(unix))]
    pub fn new() -> std::io::Result<Self> {
        Ok(Self {})
    }

    /// Waits for the next lifecycle signal.
    #[cfg(unix)]
    pub async fn recv(&mut self) -> HostSignal {
        tokio::select! {
            _ = self.interrupt.recv() => {
                info!("Received SIGINT");
                HostSignal::Terminate
            }
            _ = self.terminate.recv() => {
                info!("Received SIGTERM");
                HostSignal::Terminate
            }
            _ = self.suspend.recv() => {
                info!("Received SIGUSR1");
                HostSignal::Suspend
            }
            _ = self.resume.recv() => {
                info!("Received SIGUSR2");
                HostSignal::Resume
            }
        }
    }

    #[cfg(not(unix))]
    pub async fn recv(&mut self) -> HostSignal {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C"),
            Err(e) => tracing::error!("Failed to listen for Ctrl+C: {e}"),
        }
        HostSignal::Terminate
    }
}

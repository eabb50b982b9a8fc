use crate::domain::ShipperError;
use std::time::Duration;
use tokio::time::{Interval, MissedTickBehavior, interval};
use tracing::warn;

pub const DEFAULT_SENDING_FREQUENCY_SECS: f64 = 20.0;

/// Converts a sending frequency in seconds into the dispatch period.
///
/// Sub-second frequencies are honoured but warned about; zero, negative and
/// non-finite values cannot drive a timer and are rejected.
pub fn sending_interval(secs: f64) -> Result<Duration, ShipperError> {
    if !secs.is_finite() || secs <= 0.0 {
        return Err(ShipperError::InvalidSendingFrequency(secs));
    }
    if secs < 1.0 {
        warn!(
            "Sending frequency of {secs}s is below 1s; frequent sends deteriorate device performance"
        );
    }
    Ok(Duration::from_secs_f64(secs))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Stopped,
    Running,
}

/// Timer ownership plus the sticky run flag.
#[derive(Debug, Default)]
pub struct Lifecycle {
    ticker: Option<Interval>,
    should_run: bool,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> LifecycleState {
        if self.ticker.is_some() {
            LifecycleState::Running
        } else {
            LifecycleState::Stopped
        }
    }

    pub fn is_running(&self) -> bool {
        self.ticker.is_some()
    }

    /// Whether the owner ever asked the shipper to run.
    pub fn should_run(&self) -> bool {
        self.should_run
    }

    pub fn request_run(&mut self) {
        self.should_run = true;
    }

    /// Arms the timer; its first tick is immediate. Returns `false` when a
    /// timer is already armed.
    pub fn begin(&mut self, period: Duration) -> bool {
        if self.ticker.is_some() {
            return false;
        }
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.ticker = Some(ticker);
        true
    }

    /// Disarms the timer. Returns `false` when nothing was armed.
    pub fn end(&mut self) -> bool {
        self.ticker.take().is_some()
    }

    /// Resolves on the next tick; never resolves while stopped.
    pub async fn next_tick(&mut self) {
        match self.ticker.as_mut() {
            Some(ticker) => {
                ticker.tick().await;
            }
            None => std::future::pending().await,
        }
    }
}

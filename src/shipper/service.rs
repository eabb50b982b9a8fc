use super::dispatcher::Dispatcher;
use super::lifecycle::Lifecycle;
use super::{Command, Settings, ShipperStatus};
use crate::buffer::LogBuffer;
use crate::reliability::{Completion, InFlightRequests, Persistence, reconcile};
use crate::sender::Transport;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Owns every piece of mutable shipper state. Runs until all `LogShipper`
/// handles are dropped, then persists the buffer one last time.
pub struct ShipperService {
    commands: mpsc::UnboundedReceiver<Command>,
    completions: mpsc::UnboundedReceiver<Completion>,
    settings: Arc<RwLock<Settings>>,
    buffer: LogBuffer,
    in_flight: InFlightRequests,
    lifecycle: Lifecycle,
    dispatcher: Dispatcher,
    persistence: Arc<dyn Persistence>,
}

impl ShipperService {
    pub(crate) fn new(
        commands: mpsc::UnboundedReceiver<Command>,
        settings: Arc<RwLock<Settings>>,
        transport: Arc<dyn Transport>,
        persistence: Arc<dyn Persistence>,
    ) -> Self {
        let (completions_tx, completions) = mpsc::unbounded_channel();

        Self {
            commands,
            completions,
            settings,
            buffer: LogBuffer::new(),
            in_flight: InFlightRequests::new(),
            lifecycle: Lifecycle::new(),
            dispatcher: Dispatcher::new(transport, completions_tx),
            persistence,
        }
    }

    pub async fn run(mut self) {
        loop {
            tokio::select! {
                biased;

                () = self.lifecycle.next_tick() => self.on_tick(),
                Some(completion) = self.completions.recv() => self.on_completion(completion),
                command = self.commands.recv() => match command {
                    Some(command) => self.handle(command).await,
                    None => break,
                },
            }
        }

        debug!("All shipper handles dropped; shutting down");
        self.stop().await;
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::Append(entry) => self.buffer.push(entry),
            Command::StartLogger(ack) => {
                self.lifecycle.request_run();
                self.start().await;
                let _ = ack.send(());
            }
            Command::WillResume(ack) => {
                if self.lifecycle.should_run() {
                    self.start().await;
                } else {
                    debug!("Resume signal ignored: shipper was never started");
                }
                let _ = ack.send(());
            }
            Command::DidSuspend(ack) => {
                self.stop().await;
                let _ = ack.send(());
            }
            Command::Status(reply) => {
                let _ = reply.send(ShipperStatus {
                    state: self.lifecycle.state(),
                    should_run: self.lifecycle.should_run(),
                    buffered: self.buffer.iter().cloned().collect(),
                    in_flight: self.in_flight.len(),
                });
            }
        }
    }

    fn on_tick(&mut self) {
        let settings = self.settings.read();
        self.dispatcher
            .dispatch(&settings, &mut self.buffer, &mut self.in_flight);
    }

    fn on_completion(&mut self, completion: Completion) {
        let verbosity = self.settings.read().verbosity;
        let report = reconcile(&mut self.in_flight, &mut self.buffer, completion, verbosity);
        report.emit(verbosity);
    }

    async fn start(&mut self) {
        if self.lifecycle.is_running() {
            debug!("Start requested while already running");
            return;
        }

        self.load_saved_logs().await;

        let period = self.settings.read().sending_interval;
        self.lifecycle.begin(period);
        info!("Log shipper started; sending every {:?}", period);
    }

    async fn load_saved_logs(&mut self) {
        match self.persistence.load().await {
            Ok(Some(saved)) if !saved.is_empty() => {
                info!("Restored {} persisted log(s)", saved.size());
                self.buffer.prepend(saved);
            }
            Ok(_) => {}
            Err(e) => {
                // Leave the store untouched so the data survives to a later start.
                error!("Failed to load persisted logs: {e}");
                return;
            }
        }

        if let Err(e) = self.persistence.clear().await {
            error!("Failed to clear persisted logs: {e}");
        }
    }

    /// Disarms the timer, forgets in-flight requests and hands the buffer to
    /// persistence. While running, the store is overwritten with the buffer.
    /// When already stopped the store still holds unrestored, older data, so
    /// the buffer is appended after it instead. A failed write leaves the
    /// entries in the buffer.
    async fn stop(&mut self) {
        let was_running = self.lifecycle.end();

        let abandoned = self.in_flight.entry_count();
        if abandoned > 0 {
            warn!("Stopping with {abandoned} log(s) in flight; they are not persisted");
        }
        self.in_flight.clear();

        let pending = self.buffer.take_batch();
        let count = pending.size();
        let result = if was_running {
            self.persistence.save(pending.clone()).await
        } else if pending.is_empty() {
            Ok(())
        } else {
            self.persistence.add(pending.clone()).await
        };

        match result {
            Ok(()) if was_running => info!("Log shipper stopped; {count} pending log(s) saved"),
            Ok(()) => debug!("Stop while stopped; {count} pending log(s) saved"),
            Err(e) => {
                error!("Failed to persist {count} pending log(s), keeping them in memory: {e}");
                self.buffer.prepend(pending);
            }
        }
    }
}

impl std::fmt::Debug for ShipperService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShipperService")
            .field("state", &self.lifecycle.state())
            .field("buffered", &self.buffer.len())
            .field("in_flight", &self.in_flight.len())
            .finish_non_exhaustive()
    }
}

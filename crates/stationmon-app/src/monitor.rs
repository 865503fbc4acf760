//! Serial monitor run loop.
//!
//! Reads raw chunks from a [`SerialSource`], reassembles them into lines,
//! dispatches each line and performs a requested restart once the grace
//! delay has passed. The restart is never performed from inside dispatch.

use stationmon_core::{
    Command, CommandDispatcher, CommandInterpreter, Environment, LineFramer, MonitorConfig,
    RestartSignal,
};
use thiserror::Error;

use crate::{Restarter, SerialSource};

/// Errors that end the serial run loop.
#[derive(Debug, Error)]
pub enum MonitorError<E> {
    /// The restart collaborator failed.
    #[error("restart failed: {0}")]
    Restart(E),
}

/// Long-running serial input task.
///
/// # Type Parameters
///
/// - `S`: Serial byte source
/// - `R`: Restart collaborator
/// - `E`: Environment for sleeping
pub struct SerialMonitor<S, R, E>
where
    S: SerialSource,
    R: Restarter,
    E: Environment,
{
    source: S,
    restarter: R,
    env: E,
    config: MonitorConfig,
    framer: LineFramer,
    dispatcher: CommandDispatcher,
    buf: Vec<u8>,
    overflow_seen: u64,
}

impl<S, R, E> SerialMonitor<S, R, E>
where
    S: SerialSource,
    R: Restarter,
    E: Environment,
{
    /// Create a monitor. `restart` may be shared with other tasks that want
    /// to request a restart through the same loop.
    pub fn new(source: S, restarter: R, env: E, config: MonitorConfig, restart: RestartSignal) -> Self {
        let framer = LineFramer::new(config.line_capacity);
        let interpreter = CommandInterpreter::new(config.restart_keyword.clone());
        let dispatcher = CommandDispatcher::new(interpreter, restart);
        let buf = vec![0; config.read_chunk.max(1)];

        Self { source, restarter, env, config, framer, dispatcher, buf, overflow_seen: 0 }
    }

    /// Run until a restart is performed.
    ///
    /// Source errors are logged and the loop keeps going. Returns `Ok` only
    /// when the restarter itself returns, which real targets never do.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Restart`] if the restart collaborator fails.
    pub async fn run(mut self) -> Result<(), MonitorError<R::Error>> {
        tracing::info!("[SERIAL_TASK] Started");

        loop {
            self.poll_once().await;

            if self.dispatcher.restart_signal().is_requested() {
                tracing::warn!(">>> [SYSTEM] REBOOTING <<<");
                self.env.sleep(self.config.restart_grace).await;
                return self.restarter.restart().map_err(MonitorError::Restart);
            }

            self.env.sleep(self.config.idle_interval).await;
        }
    }

    /// Perform one bounded read and process every completed line.
    ///
    /// Returns the commands recognized in this read, in order.
    pub async fn poll_once(&mut self) -> Vec<Command> {
        let n = match self.source.read_chunk(&mut self.buf, self.config.poll_timeout).await {
            Ok(n) => n.min(self.buf.len()),
            Err(e) => {
                tracing::warn!("serial read failed: {}", e);
                return Vec::new();
            },
        };
        if n == 0 {
            return Vec::new();
        }

        let lines = self.framer.ingest(&self.buf[..n]);

        let resets = self.framer.overflow_resets();
        if resets > self.overflow_seen {
            tracing::warn!(
                dropped_resets = resets - self.overflow_seen,
                capacity = self.framer.capacity(),
                "line buffer overflow, partial line discarded"
            );
            self.overflow_seen = resets;
        }

        let mut commands = Vec::with_capacity(lines.len());
        for line in lines {
            tracing::info!("[PROCESS] Line: '{}'", line);
            let command = self.dispatcher.dispatch(&line);
            if command == Command::Restart {
                tracing::warn!("[PROCESS] Reboot requested");
            }
            commands.push(command);
        }
        commands
    }

    /// Line reassembly state.
    pub fn framer(&self) -> &LineFramer {
        &self.framer
    }

    /// Restart flag shared with the dispatcher.
    pub fn restart_signal(&self) -> &RestartSignal {
        self.dispatcher.restart_signal()
    }
}

//! Background alarm engine — periodic polling thread.
//!
//! Owns the engine on a dedicated thread and re-evaluates the dose schedule
//! against wall-clock time every 30 seconds. User actions (confirm/dismiss)
//! arrive over a channel and run between ticks, so every step is
//! run-to-completion with no interleaving. Polling rather than one-shot
//! timers keeps detection robust when the host suspends and resumes the
//! process.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::TICK_INTERVAL_SECS;
use crate::engine::MedEngine;

/// Channel poll granularity for responsive shutdown and user actions.
const SLEEP_GRANULARITY_SECS: u64 = 1;

/// User actions forwarded to the engine thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineCommand {
    /// Acknowledge the firing alarm and mark its dose taken.
    Confirm,
    /// Silence the firing alarm without marking the dose taken.
    Dismiss,
}

/// Handle for the background alarm engine thread.
///
/// Supports graceful shutdown via `shutdown()` or automatic cleanup on
/// `Drop`.
pub struct AlarmEngineHandle {
    shutdown: Arc<AtomicBool>,
    commands: Sender<EngineCommand>,
    handle: Option<std::thread::JoinHandle<()>>,
}

impl AlarmEngineHandle {
    /// Confirm the firing alarm, if any.
    pub fn confirm(&self) {
        let _ = self.commands.send(EngineCommand::Confirm);
    }

    /// Dismiss the firing alarm, if any.
    pub fn dismiss(&self) {
        let _ = self.commands.send(EngineCommand::Dismiss);
    }

    /// Request graceful shutdown; the current step completes first.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Block until the engine thread exits (normally only on shutdown).
    pub fn join(mut self) {
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
    }
}

impl Drop for AlarmEngineHandle {
    fn drop(&mut self) {
        self.shutdown();
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
    }
}

/// Start the alarm engine on a background thread.
///
/// Ticks immediately, then every [`TICK_INTERVAL_SECS`].
pub fn start_alarm_engine(engine: MedEngine) -> AlarmEngineHandle {
    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = shutdown.clone();
    let (tx, rx) = mpsc::channel();

    let handle = std::thread::spawn(move || {
        tracing::info!("Alarm engine started (tick every {TICK_INTERVAL_SECS}s)");
        engine_loop(engine, rx, &flag);
        tracing::info!("Alarm engine shut down");
    });

    AlarmEngineHandle {
        shutdown,
        commands: tx,
        handle: Some(handle),
    }
}

fn engine_loop(
    mut engine: MedEngine,
    rx: mpsc::Receiver<EngineCommand>,
    shutdown: &AtomicBool,
) {
    let tick_interval = Duration::from_secs(TICK_INTERVAL_SECS);
    let mut last_tick: Option<Instant> = None;

    while !shutdown.load(Ordering::Relaxed) {
        if last_tick.map_or(true, |t| t.elapsed() >= tick_interval) {
            engine.tick(chrono::Local::now().naive_local());
            last_tick = Some(Instant::now());
        }

        match rx.recv_timeout(Duration::from_secs(SLEEP_GRANULARITY_SECS)) {
            Ok(cmd) => apply_command(&mut engine, cmd),
            Err(RecvTimeoutError::Timeout) => {}
            // Handle dropped without shutdown; nothing can reach us anymore.
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}

fn apply_command(engine: &mut MedEngine, cmd: EngineCommand) {
    let now = chrono::Local::now().naive_local();
    match cmd {
        EngineCommand::Confirm => {
            if let Err(e) = engine.confirm_dose_from_alarm(now) {
                tracing::error!(error = %e, "Failed to confirm dose");
            }
        }
        EngineCommand::Dismiss => {
            engine.dismiss_alarm(now);
        }
    }
}

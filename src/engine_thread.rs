use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::engine::{Engine, Progress};
use crate::fitness::MetricsSnapshot;

// how long the loop naps while paused, to avoid busy-waiting
const PAUSED_POLL: Duration = Duration::from_millis(10);

// messages from a runner to the engine thread
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineCommand {
    Start,
    Pause,
    Stop,
}

// messages from the engine thread to a runner
#[derive(Clone, Debug)]
pub struct EngineUpdate {
    pub best_rgba: Arc<[u8]>, // arc to avoid expensive clones of large buffers
    pub width: u32,
    pub height: u32,
    pub generation: u64,
    pub best_fitness: f64,
    pub worst_fitness: f64,
    pub metrics: MetricsSnapshot,
    pub finished: bool, // max_iterations reached, no more steps will run
}

impl EngineUpdate {
    fn from_progress(progress: Progress, finished: bool) -> Self {
        let width = progress.best_phenotype.width();
        let height = progress.best_phenotype.height();
        Self {
            best_rgba: Arc::from(progress.best_phenotype.into_raw()),
            width,
            height,
            generation: progress.generation,
            best_fitness: progress.best_fitness,
            worst_fitness: progress.worst_fitness,
            metrics: progress.metrics,
            finished,
        }
    }
}

/// channels and join handle for a running engine thread
pub struct EngineHandle {
    command_tx: Sender<EngineCommand>,
    update_rx: Receiver<EngineUpdate>,
    thread: Option<thread::JoinHandle<()>>,
}

impl EngineHandle {
    pub fn send(&self, cmd: EngineCommand) {
        // the thread only goes away after Stop, so a failed send is harmless
        let _ = self.command_tx.send(cmd);
    }

    /// newest pending update, dropping older ones
    pub fn latest_update(&self) -> Option<EngineUpdate> {
        let mut latest = None;
        while let Ok(update) = self.update_rx.try_recv() {
            latest = Some(update);
        }
        latest
    }

    /// block until the next update (None once the thread has exited)
    pub fn recv_update(&self) -> Option<EngineUpdate> {
        self.update_rx.recv().ok()
    }

    /// stop the thread and wait for it
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let _ = self.command_tx.send(EngineCommand::Stop);
        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                log::warn!("engine thread panicked");
            }
        }
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Spawn a background thread that owns `engine` and calls `step()` while running.
///
/// Every reported generation is sent as an [`EngineUpdate`], then `notify` is
/// called (the viewer uses it to request a repaint). Steps are separated by
/// `period`. Once the engine reports `is_finished()` the thread sends a final
/// update and stops stepping, but keeps serving commands until `Stop`.
pub fn spawn_engine<N>(
    engine: Engine,
    period: Duration,
    start_running: bool,
    notify: N,
) -> std::io::Result<EngineHandle>
where
    N: Fn() + Send + 'static,
{
    let (command_tx, command_rx) = mpsc::channel();
    let (update_tx, update_rx) = mpsc::channel();

    let thread = thread::Builder::new()
        .name("engine".to_owned())
        .spawn(move || run_engine(engine, period, start_running, command_rx, update_tx, notify))?;

    Ok(EngineHandle {
        command_tx,
        update_rx,
        thread: Some(thread),
    })
}

fn run_engine<N: Fn()>(
    mut engine: Engine,
    period: Duration,
    mut running: bool,
    command_rx: Receiver<EngineCommand>,
    update_tx: Sender<EngineUpdate>,
    notify: N,
) {
    // send initial state so the viewer has something to show
    let _ = update_tx.send(EngineUpdate::from_progress(engine.progress(), engine.is_finished()));
    notify();

    loop {
        profiling::scope!("engine_thread_loop");

        // check for commands (non-blocking)
        match command_rx.try_recv() {
            Ok(EngineCommand::Start) => running = true,
            Ok(EngineCommand::Pause) => running = false,
            Ok(EngineCommand::Stop) | Err(TryRecvError::Disconnected) => break,
            Err(TryRecvError::Empty) => {}
        }

        if !running || engine.is_finished() {
            thread::sleep(PAUSED_POLL);
            continue;
        }

        let report = engine.step();
        let finished = engine.is_finished();
        let progress = match report {
            Some(progress) => Some(progress),
            None if finished => Some(engine.progress()),
            None => None,
        };
        if let Some(progress) = progress {
            if update_tx.send(EngineUpdate::from_progress(progress, finished)).is_err() {
                break;
            }
            notify();
        }
        if finished {
            log::info!("reached {} generations, engine idle", engine.generation_count());
        }

        if !period.is_zero() {
            thread::sleep(period);
        }
    }
    log::debug!("engine thread exiting at generation {}", engine.generation_count());
}

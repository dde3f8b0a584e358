//! Per-sound 3D movement update loop.
//!
//! A [`MovementController`] owns at most one background worker. While movement
//! is enabled the worker re-applies the authoritative position through an
//! apply callback (for a [`Sound`](crate::Sound), the engine's positional
//! primitive) once per update interval, so callers never touch the engine from
//! their own thread to keep a moving sound in place.
//!
//! # Lifecycle
//!
//! ```text
//!          enable(true)             enable(false) / stop()
//!   Idle ───────────────▶ Running ─────────────────────────▶ StopRequested
//!    ▲                                                            │
//!    └──────────────────── worker observes the signal ◀───────────┘
//! ```
//!
//! Stopping is cooperative: each worker waits on its own stop channel with a
//! timeout of one interval, so a stop request wakes it right away and exit
//! latency never exceeds one interval. [`MovementController::stop`] (and
//! `Drop`) block until the worker has been joined.

use crate::error::{PotatoAudioError, Result};
use crate::math::Vec3;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Callback through which the worker applies a position.
pub type ApplyPositionFn = dyn Fn(Vec3) + Send + Sync;

/// Observable state of the update loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementState {
    /// No worker is alive
    Idle,
    /// A worker is alive and applying positions
    Running,
    /// The worker has been asked to stop but has not exited yet
    StopRequested,
}

struct MovementShared {
    /// User intent
    enabled: AtomicBool,
    /// True exactly while a worker is alive
    running: AtomicBool,
    position: Mutex<Vec3>,
}

impl MovementShared {
    fn position(&self) -> Vec3 {
        *self.position.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct Worker {
    handle: JoinHandle<()>,
    stop_sender: Sender<()>,
    stop_requested: bool,
}

/// Decrements the live-worker count and clears `running` when the worker
/// exits, including by panic in the apply callback.
struct WorkerExitGuard {
    shared: Arc<MovementShared>,
    live_workers: Arc<AtomicUsize>,
}

impl Drop for WorkerExitGuard {
    fn drop(&mut self) {
        self.shared.running.store(false, Ordering::SeqCst);
        self.live_workers.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Owns the optional background worker of one sound.
pub struct MovementController {
    name: String,
    shared: Arc<MovementShared>,
    apply: Arc<ApplyPositionFn>,
    interval: Duration,
    live_workers: Arc<AtomicUsize>,
    worker: Option<Worker>,
}

impl MovementController {
    /// Creates an idle controller.
    ///
    /// `name` labels the worker thread, `live_workers` is incremented for every
    /// worker alive and decremented when it exits.
    pub fn new<F>(
        name: impl Into<String>,
        position: Vec3,
        interval: Duration,
        live_workers: Arc<AtomicUsize>,
        apply: F,
    ) -> Self
    where
        F: Fn(Vec3) + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            shared: Arc::new(MovementShared {
                enabled: AtomicBool::new(false),
                running: AtomicBool::new(false),
                position: Mutex::new(position),
            }),
            apply: Arc::new(apply),
            interval,
            live_workers,
            worker: None,
        }
    }

    pub fn state(&self) -> MovementState {
        match &self.worker {
            None => MovementState::Idle,
            Some(worker) if worker.handle.is_finished() => MovementState::Idle,
            Some(worker) if worker.stop_requested => MovementState::StopRequested,
            Some(_) => MovementState::Running,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.shared.enabled.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Last position handed to [`set_position`](Self::set_position).
    pub fn position(&self) -> Vec3 {
        self.shared.position()
    }

    /// Replaces the target position. The worker picks it up on its next tick.
    pub fn set_position(&self, position: Vec3) {
        *self
            .shared
            .position
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = position;
    }

    /// Sets the movement intent.
    ///
    /// Enabling while a worker is running is a no-op; enabling while the
    /// previous worker is still winding down joins it first, so a controller
    /// never has two workers. Disabling only signals the worker and returns
    /// without waiting; disabling an idle controller does nothing.
    ///
    /// # Errors
    ///
    /// Returns `Engine` if the worker thread could not be spawned; the
    /// controller is left idle and disabled.
    pub fn enable(&mut self, enable: bool) -> Result<()> {
        self.shared.enabled.store(enable, Ordering::SeqCst);

        if !enable {
            self.request_stop();
            return Ok(());
        }

        match self.state() {
            MovementState::Running => Ok(()),
            MovementState::Idle | MovementState::StopRequested => {
                self.join_worker();
                self.spawn_worker()
            }
        }
    }

    /// Requests termination and blocks until the worker has exited.
    ///
    /// Once this returns the apply callback is never invoked again until
    /// movement is re-enabled.
    pub fn stop(&mut self) {
        self.shared.enabled.store(false, Ordering::SeqCst);
        self.request_stop();
        self.join_worker();
    }

    fn request_stop(&mut self) {
        if let Some(worker) = self.worker.as_mut() {
            if !worker.stop_requested {
                // Capacity 1 and a single send per worker: never full.
                let _ = worker.stop_sender.try_send(());
                worker.stop_requested = true;
                log::debug!("Movement worker {} asked to stop", self.name);
            }
        }
    }

    fn join_worker(&mut self) {
        if let Some(worker) = self.worker.take() {
            if !worker.stop_requested {
                let _ = worker.stop_sender.try_send(());
            }
            if worker.handle.join().is_err() {
                log::error!("Movement worker {} panicked", self.name);
            }
        }
    }

    fn spawn_worker(&mut self) -> Result<()> {
        let (stop_sender, stop_receiver) = bounded(1);

        // Counted before the thread starts so the counter never under-reports.
        self.shared.running.store(true, Ordering::SeqCst);
        self.live_workers.fetch_add(1, Ordering::SeqCst);

        let guard = WorkerExitGuard {
            shared: self.shared.clone(),
            live_workers: self.live_workers.clone(),
        };
        let apply = self.apply.clone();
        let interval = self.interval;

        let spawned = thread::Builder::new()
            .name(format!("movement-{}", self.name))
            .spawn(move || run_worker(guard, apply, interval, stop_receiver));

        match spawned {
            Ok(handle) => {
                log::debug!("Movement worker {} started ({:?} interval)", self.name, interval);
                self.worker = Some(Worker {
                    handle,
                    stop_sender,
                    stop_requested: false,
                });
                Ok(())
            }
            Err(e) => {
                // The closure and its guard were dropped with the failed
                // spawn, which already rolled back `running` and the counter.
                self.shared.enabled.store(false, Ordering::SeqCst);
                log::error!("Failed to spawn movement worker {}: {}", self.name, e);
                Err(PotatoAudioError::Engine(format!(
                    "Failed to spawn movement worker: {}",
                    e
                )))
            }
        }
    }
}

fn run_worker(
    guard: WorkerExitGuard,
    apply: Arc<ApplyPositionFn>,
    interval: Duration,
    stop_receiver: Receiver<()>,
) {
    let shared = &guard.shared;

    while shared.enabled.load(Ordering::SeqCst) && shared.running.load(Ordering::SeqCst) {
        apply(shared.position());

        match stop_receiver.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => continue,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    drop(guard);
}

impl Drop for MovementController {
    fn drop(&mut self) {
        self.stop();
    }
}

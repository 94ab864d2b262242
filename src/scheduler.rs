//! Fixed-rate simulation scheduling, decoupled from the render rate.
//!
//! Two drivers share one pacing rule ([`TickClock`]): the threaded
//! [`Scheduler`], which owns the simulation on a worker thread while running,
//! and direct `poll` calls from a single-threaded host loop.

use crate::bridge::RenderSync;
use crate::control::ParameterControl;
use crate::error::{Result, SimError};
use crate::simulation::{SharedState, Simulation, lock};
use std::sync::atomic::Ordering;
use std::io;
use std::sync::{Arc, Condvar, Mutex, PoisonError, mpsc};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Fixed-interval pacer. Fires at most once per `poll`; a host that falls
/// behind gets one late tick, never a burst of catch-up ticks.
///
/// An interval too long to represent as an `Instant` never fires.
#[derive(Debug, Clone)]
pub struct TickClock {
    interval: Duration,
    next: Option<Instant>,
}

impl TickClock {
    pub fn new(interval: Duration, start: Instant) -> Self {
        Self {
            interval,
            next: start.checked_add(interval),
        }
    }

    #[inline]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Time left until the next tick is due (zero if overdue).
    pub fn until_next(&self, now: Instant) -> Duration {
        match self.next {
            Some(next) => next.saturating_duration_since(now),
            None => Duration::MAX,
        }
    }

    /// Returns `true` if a tick is due at `now` and advances the schedule.
    pub fn poll(&mut self, now: Instant) -> bool {
        let Some(next) = self.next else {
            return false;
        };
        if now < next {
            return false;
        }
        self.next = match next.checked_add(self.interval) {
            // Missed slots are dropped, not queued.
            Some(following) if following <= now => now.checked_add(self.interval),
            following => following,
        };
        true
    }
}

struct StopSignal {
    requested: Mutex<bool>,
    wake: Condvar,
}

// The worker receives its simulation over a channel after the thread exists,
// so a failed spawn never consumes it. `None` means it never arrived.
type WorkerBody = Box<dyn FnOnce() -> Option<Simulation> + Send + 'static>;

struct Worker {
    signal: Arc<StopSignal>,
    handle: JoinHandle<Option<Simulation>>,
}

enum SchedulerState {
    Idle(Simulation),
    Running(Worker),
    // The worker panicked and took the simulation with it.
    Lost,
}

/// Idle/Running state machine around one simulation.
pub struct Scheduler {
    state: SchedulerState,
    interval: Duration,
    shared: Arc<SharedState>,
}

impl Scheduler {
    pub fn new(simulation: Simulation) -> Self {
        let interval = simulation.tick_interval();
        let shared = Arc::clone(simulation.shared());
        Self {
            state: SchedulerState::Idle(simulation),
            interval,
            shared,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, SchedulerState::Running(_))
    }

    #[inline]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn tick_count(&self) -> u64 {
        self.shared.ticks.load(Ordering::Relaxed)
    }

    pub fn controls(&self) -> ParameterControl {
        ParameterControl::new(Arc::clone(&self.shared))
    }

    pub fn render_sync(&self) -> RenderSync {
        RenderSync::new(Arc::clone(&self.shared))
    }

    /// Idle → Running. A no-op while already running. If the worker thread
    /// cannot be spawned the scheduler stays idle with its simulation intact.
    pub fn start(&mut self) -> Result<()> {
        self.start_with(|body| {
            thread::Builder::new()
                .name("simulation-tick".to_string())
                .spawn(body)
        })
    }

    fn start_with<F>(&mut self, spawn: F) -> Result<()>
    where
        F: FnOnce(WorkerBody) -> io::Result<JoinHandle<Option<Simulation>>>,
    {
        match std::mem::replace(&mut self.state, SchedulerState::Lost) {
            SchedulerState::Idle(simulation) => {
                let signal = Arc::new(StopSignal {
                    requested: Mutex::new(false),
                    wake: Condvar::new(),
                });
                let worker_signal = Arc::clone(&signal);
                let interval = self.interval;
                let (handoff, receive) = mpsc::channel::<Simulation>();
                let body: WorkerBody = Box::new(move || {
                    let simulation = receive.recv().ok()?;
                    Some(run_worker(simulation, interval, worker_signal))
                });

                let handle = match spawn(body) {
                    Ok(handle) => handle,
                    Err(e) => {
                        log::error!("Failed to spawn simulation worker: {}", e);
                        self.state = SchedulerState::Idle(simulation);
                        return Err(SimError::Io(e));
                    }
                };
                if let Err(mpsc::SendError(simulation)) = handoff.send(simulation) {
                    log::error!("Simulation worker exited before receiving the simulation");
                    let _ = handle.join();
                    self.state = SchedulerState::Idle(simulation);
                    return Err(SimError::WorkerPanicked);
                }
                log::info!("Scheduler started ({:?} per tick)", interval);
                self.state = SchedulerState::Running(Worker { signal, handle });
                Ok(())
            }
            running @ SchedulerState::Running(_) => {
                log::debug!("Scheduler already running");
                self.state = running;
                Ok(())
            }
            SchedulerState::Lost => Err(SimError::WorkerPanicked),
        }
    }

    /// Running → Idle. Blocks until any in-flight tick finishes; no tick
    /// starts after this returns. A no-op while idle.
    pub fn stop(&mut self) -> Result<()> {
        match std::mem::replace(&mut self.state, SchedulerState::Lost) {
            SchedulerState::Running(worker) => {
                {
                    let mut requested = lock(&worker.signal.requested);
                    *requested = true;
                    worker.signal.wake.notify_all();
                }
                match worker.handle.join() {
                    Ok(Some(simulation)) => {
                        log::info!("Scheduler stopped after {} ticks", self.tick_count());
                        self.state = SchedulerState::Idle(simulation);
                        Ok(())
                    }
                    Ok(None) | Err(_) => {
                        log::error!("Simulation worker panicked; simulation lost");
                        Err(SimError::WorkerPanicked)
                    }
                }
            }
            idle @ SchedulerState::Idle(_) => {
                log::debug!("Scheduler already idle");
                self.state = idle;
                Ok(())
            }
            SchedulerState::Lost => Err(SimError::WorkerPanicked),
        }
    }

    /// The simulation, while idle.
    pub fn simulation(&self) -> Option<&Simulation> {
        match &self.state {
            SchedulerState::Idle(simulation) => Some(simulation),
            _ => None,
        }
    }

    pub fn simulation_mut(&mut self) -> Option<&mut Simulation> {
        match &mut self.state {
            SchedulerState::Idle(simulation) => Some(simulation),
            _ => None,
        }
    }

    /// Stops if needed and hands the simulation back.
    pub fn into_simulation(mut self) -> Result<Simulation> {
        self.stop()?;
        match std::mem::replace(&mut self.state, SchedulerState::Lost) {
            SchedulerState::Idle(simulation) => Ok(simulation),
            _ => Err(SimError::WorkerPanicked),
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        if self.is_running() {
            if let Err(e) = self.stop() {
                log::error!("Failed to stop scheduler on drop: {}", e);
            }
        }
    }
}

fn run_worker(mut simulation: Simulation, interval: Duration, signal: Arc<StopSignal>) -> Simulation {
    let mut clock = TickClock::new(interval, Instant::now());
    loop {
        let requested = lock(&signal.requested);
        let wait = clock.until_next(Instant::now());
        let (requested, _) = signal
            .wake
            .wait_timeout_while(requested, wait, |stop| !*stop)
            .unwrap_or_else(PoisonError::into_inner);
        // The tick decision is made under the lock: a stop that got the lock
        // first always wins.
        if *requested {
            break;
        }
        drop(requested);

        if clock.poll(Instant::now()) {
            simulation.tick();
        }
    }
    simulation
}

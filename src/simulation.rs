// File: simulation.rs
use crate::bridge::{ParticleInstance, RenderSync};
use crate::config::SimulationConfig;
use crate::control::ParameterControl;
use crate::error::Result;
use crate::particle::{Particle, ParticleStore};
use crate::physics::{self, StepParams};
use crate::rules::RuleMatrix;
use glam::{DVec3, Vec4};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

pub type SimRng = StdRng;

/// Locks a mutex, recovering the data if a panicking thread poisoned it.
/// Everything guarded here is plain data that is never left half-written.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// --- Tunable Parameters ---

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Parameters {
    pub rules: RuleMatrix,
    /// Snapshot taken at construction, restored by `reset`.
    pub original: RuleMatrix,
    pub particle_size: f64,
}

/// State reachable from the control surface and the render bridge, which
/// may live on other threads than the one ticking the simulation.
pub(crate) struct SharedState {
    pub params: Mutex<Parameters>,
    // Front half of the double buffer: the last fully completed tick.
    pub front: Mutex<Vec<ParticleInstance>>,
    // Set only by `Simulation::tick`, cleared only by `RenderSync::sync`.
    pub dirty: AtomicBool,
    pub ticks: AtomicU64,
}

impl SharedState {
    fn new(params: Parameters, front: Vec<ParticleInstance>) -> Self {
        Self {
            params: Mutex::new(params),
            front: Mutex::new(front),
            // The initial layout has never been synced.
            dirty: AtomicBool::new(true),
            ticks: AtomicU64::new(0),
        }
    }
}

/// One simulation instance. Owns the particle array exclusively; the
/// parameters and the published render snapshot are shared through handles.
pub struct Simulation {
    store: ParticleStore,
    volume: f64,
    tick_interval: Duration,
    shared: Arc<SharedState>,
    // Back half of the double buffer, filled after every tick.
    back_buffer: Vec<ParticleInstance>,
    forces_buffer: Vec<DVec3>,
}

impl Simulation {
    /// Random initial layout, seeded from `config.seed` when given.
    pub fn new(config: &SimulationConfig) -> Result<Self> {
        config.validate()?;
        let mut rng = match config.seed {
            Some(seed) => SimRng::seed_from_u64(seed),
            None => SimRng::from_entropy(),
        };
        let store = ParticleStore::populate(&mut rng, config.count_per_species, config.volume);
        Self::from_store(config, store)
    }

    /// Fixed initial layout. Particle order becomes the render index.
    pub fn with_particles(config: &SimulationConfig, particles: Vec<Particle>) -> Result<Self> {
        config.validate()?;
        Self::from_store(config, ParticleStore::from_particles(particles))
    }

    fn from_store(config: &SimulationConfig, store: ParticleStore) -> Result<Self> {
        let rules = config.initial_rules()?;
        let params = Parameters {
            rules,
            original: rules,
            particle_size: config.particle_size,
        };
        let front: Vec<ParticleInstance> = store
            .particles()
            .iter()
            .map(ParticleInstance::from_particle)
            .collect();
        let back_buffer = front.clone();

        log::info!(
            "Created simulation: {} particles, volume {:.2}, tick {:.1} Hz",
            store.len(),
            config.volume,
            config.tick_rate_hz
        );

        Ok(Self {
            store,
            volume: config.volume,
            tick_interval: config.tick_interval(),
            shared: Arc::new(SharedState::new(params, front)),
            back_buffer,
            forces_buffer: Vec::new(),
        })
    }

    /// Advances the particle state by one tick without publishing it.
    pub fn step(&mut self) {
        // Copy out so the matrix stays read-only for the whole tick.
        let (rules, particle_size) = {
            let params = lock(&self.shared.params);
            (params.rules, params.particle_size)
        };
        let step_params = StepParams {
            volume: self.volume,
            particle_size,
        };
        physics::step(&mut self.store, &rules, &step_params, &mut self.forces_buffer);
    }

    /// One scheduler tick: step, publish the finished state, raise the dirty flag.
    pub fn tick(&mut self) {
        let started = Instant::now();
        self.step();
        self.publish();
        self.shared.dirty.store(true, Ordering::Release);
        let n = self.shared.ticks.fetch_add(1, Ordering::Relaxed) + 1;
        log::trace!("Tick {} took {:?}", n, started.elapsed());
    }

    fn publish(&mut self) {
        self.back_buffer.clear();
        self.back_buffer.extend(
            self.store
                .particles()
                .iter()
                .map(ParticleInstance::from_particle),
        );
        let mut front = lock(&self.shared.front);
        std::mem::swap(&mut *front, &mut self.back_buffer);
    }

    #[inline]
    pub fn particles(&self) -> &[Particle] {
        self.store.particles()
    }

    #[inline]
    pub fn store(&self) -> &ParticleStore {
        &self.store
    }

    /// Position and species color of one particle, for buffer population.
    pub fn particle_view(&self, index: usize) -> Option<(DVec3, Vec4)> {
        self.store.get(index).map(|p| (p.position, p.color()))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    #[inline]
    pub fn volume(&self) -> f64 {
        self.volume
    }

    #[inline]
    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    pub fn is_dirty(&self) -> bool {
        self.shared.dirty.load(Ordering::Acquire)
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

    pub(crate) fn shared(&self) -> &Arc<SharedState> {
        &self.shared
    }
}

//! Multi-species particle interaction simulation.
//!
//! Particles of a few species attract or repel each other according to a
//! signed per-pair coefficient table. Physics runs on a fixed-rate clock of
//! its own, and finished ticks are handed to a renderer through a dirty-flag
//! guarded double buffer, so render rate and simulation rate stay independent.
//!
//! ```no_run
//! use particle_life::{InstanceBuffer, Scheduler, Simulation, SimulationConfig};
//!
//! let sim = Simulation::new(&SimulationConfig::new())?;
//! let sync = sim.render_sync();
//! let mut buffer = InstanceBuffer::new(sim.len());
//! let mut scheduler = Scheduler::new(sim);
//! scheduler.start()?;
//! // once per render frame:
//! if sync.sync(&mut buffer) {
//!     // upload buffer.as_bytes()
//! }
//! scheduler.stop()?;
//! # Ok::<(), particle_life::SimError>(())
//! ```

pub mod bridge;
pub mod config;
pub mod constants;
pub mod control;
pub mod error;
pub mod particle;
pub mod physics;
pub mod rules;
pub mod scheduler;
pub mod simulation;
pub mod species;

pub use bridge::{InstanceBuffer, ParticleInstance, RenderSync};
pub use config::SimulationConfig;
pub use control::ParameterControl;
pub use error::{Result, SimError};
pub use particle::{Particle, ParticleStore};
pub use rules::RuleMatrix;
pub use scheduler::{Scheduler, TickClock};
pub use simulation::Simulation;
pub use species::Species;

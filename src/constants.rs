// --- Global Simulation Constants ---

/// Number of particle species. Indexes the rule matrix on both axes.
pub const SPECIES_COUNT: usize = 4;

pub const DEFAULT_COUNT_PER_SPECIES: usize = 400;
pub const DEFAULT_VOLUME: f64 = 3.0; // Half-extent of the cubic simulation volume
pub const DEFAULT_PARTICLE_SIZE: f64 = 0.01;
pub const MIN_PARTICLE_SIZE: f64 = 0.001;
pub const MAX_PARTICLE_SIZE: f64 = 0.03;

// Physics ticks per second. Deliberately below the render rate, the step is O(S^2 * N^2).
pub const DEFAULT_TICK_RATE_HZ: f64 = 24.0;
pub const MIN_TICK_RATE_HZ: f64 = 0.001;
pub const MAX_TICK_RATE_HZ: f64 = 10_000.0;

// --- Force Law ---
// Particles farther apart than CUTOFF_FACTOR * volume do not interact at all.
pub const CUTOFF_FACTOR: f64 = 0.3;
pub const FORCE_SCALE: f64 = 2.0;
// Applied once per tick, not scaled by elapsed time.
pub const VELOCITY_DAMPING: f64 = 0.5;

// --- Control Surface ---
pub const MIN_COEFFICIENT: f64 = -1.0;
pub const MAX_COEFFICIENT: f64 = 1.0;
pub const RANDOM_COEFFICIENT_DECIMALS: i32 = 2;

// --- Demo Host ---
pub const RENDER_RATE_HZ: f64 = 60.0;
pub const STATS_INTERVAL_SECS: f64 = 4.0;
pub const DEFAULT_RUN_SECS: f64 = 10.0;

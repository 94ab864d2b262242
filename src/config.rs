use crate::constants::{
    DEFAULT_COUNT_PER_SPECIES, DEFAULT_PARTICLE_SIZE, DEFAULT_TICK_RATE_HZ, DEFAULT_VOLUME,
    MAX_TICK_RATE_HZ, MIN_TICK_RATE_HZ,
};
use crate::error::{Result, SimError};
use crate::rules::{RuleMatrix, find_preset};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub count_per_species: usize,
    /// Half-extent of the cubic volume; particles live in `[-volume, volume]^3`.
    pub volume: f64,
    pub particle_size: f64,
    pub tick_rate_hz: f64,
    /// Fixed seed for the initial layout. `None` seeds from entropy.
    pub seed: Option<u64>,
    /// Name of a built-in preset used when `rules` is not given.
    pub preset: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules: Option<RuleMatrix>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            count_per_species: DEFAULT_COUNT_PER_SPECIES,
            volume: DEFAULT_VOLUME,
            particle_size: DEFAULT_PARTICLE_SIZE,
            tick_rate_hz: DEFAULT_TICK_RATE_HZ,
            seed: None,
            preset: None,
            rules: None,
        }
    }
}

impl SimulationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_count_per_species(mut self, count: usize) -> Self {
        self.count_per_species = count;
        self
    }

    pub fn with_rules(mut self, rules: RuleMatrix) -> Self {
        self.rules = Some(rules);
        self
    }

    pub fn with_preset(mut self, name: impl Into<String>) -> Self {
        self.preset = Some(name.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.volume.is_finite() && self.volume > 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "volume must be positive and finite, got {}",
                self.volume
            )));
        }
        if !(self.particle_size.is_finite() && self.particle_size >= 0.0) {
            return Err(SimError::InvalidConfig(format!(
                "particle_size must be non-negative and finite, got {}",
                self.particle_size
            )));
        }
        if !(MIN_TICK_RATE_HZ..=MAX_TICK_RATE_HZ).contains(&self.tick_rate_hz) {
            return Err(SimError::InvalidConfig(format!(
                "tick_rate_hz must be within {}..={}, got {}",
                MIN_TICK_RATE_HZ, MAX_TICK_RATE_HZ, self.tick_rate_hz
            )));
        }
        if let Some(rules) = &self.rules {
            if !rules.is_finite() {
                return Err(SimError::InvalidConfig(
                    "rules contain a non-finite coefficient".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Explicit rules win, then the named preset, then the compiled defaults.
    pub fn initial_rules(&self) -> Result<RuleMatrix> {
        if let Some(rules) = self.rules {
            return Ok(rules);
        }
        match &self.preset {
            Some(name) => Ok((find_preset(name)?.rules)()),
            None => Ok(RuleMatrix::default()),
        }
    }

    /// Interval between ticks. Only meaningful for a config that passed
    /// `validate`; an unrepresentable rate falls back to the default rate.
    pub fn tick_interval(&self) -> Duration {
        Duration::try_from_secs_f64(1.0 / self.tick_rate_hz)
            .unwrap_or_else(|_| Duration::from_secs_f64(1.0 / DEFAULT_TICK_RATE_HZ))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

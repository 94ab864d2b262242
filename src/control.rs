//! Parameter control surface.
//!
//! A narrow handle for live tuning from a settings panel or host code. Every
//! change lands in the shared parameter block and is picked up at the start of
//! the next tick; a tick in progress keeps the values it started with.

use crate::constants::{MAX_COEFFICIENT, MAX_PARTICLE_SIZE, MIN_COEFFICIENT, MIN_PARTICLE_SIZE};
use crate::error::{Result, SimError};
use crate::rules::{PRESETS, Preset, RuleMatrix, find_preset, pair_name, parse_pair_name};
use crate::simulation::{SharedState, lock};
use crate::species::Species;
use rand::Rng;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Clone)]
pub struct ParameterControl {
    shared: Arc<SharedState>,
}

fn ensure_finite(name: impl Into<String>, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(SimError::NonFiniteValue {
            name: name.into(),
            value,
        })
    }
}

impl ParameterControl {
    pub(crate) fn new(shared: Arc<SharedState>) -> Self {
        Self { shared }
    }

    pub fn get(&self, a: Species, b: Species) -> f64 {
        lock(&self.shared.params).rules.get(a, b)
    }

    /// Stores the value as given. Only NaN and infinities are refused.
    pub fn set(&self, a: Species, b: Species, value: f64) -> Result<()> {
        ensure_finite(pair_name(a, b), value)?;
        lock(&self.shared.params).rules.set(a, b, value);
        Ok(())
    }

    /// Slider-style setter: clamps into [-1, 1] first.
    pub fn set_clamped(&self, a: Species, b: Species, value: f64) -> Result<()> {
        ensure_finite(pair_name(a, b), value)?;
        self.set(a, b, value.clamp(MIN_COEFFICIENT, MAX_COEFFICIENT))
    }

    /// Lookup by JSON field name, e.g. `"redgreen"`.
    pub fn get_by_name(&self, name: &str) -> Result<f64> {
        let (a, b) =
            parse_pair_name(name).ok_or_else(|| SimError::UnknownParameter(name.to_string()))?;
        Ok(self.get(a, b))
    }

    pub fn set_by_name(&self, name: &str, value: f64) -> Result<()> {
        let (a, b) =
            parse_pair_name(name).ok_or_else(|| SimError::UnknownParameter(name.to_string()))?;
        self.set(a, b, value)
    }

    /// Copy of the current matrix.
    pub fn rules(&self) -> RuleMatrix {
        lock(&self.shared.params).rules
    }

    pub fn randomize(&self) {
        self.randomize_with(&mut rand::thread_rng());
    }

    pub fn randomize_with<R: Rng + ?Sized>(&self, rng: &mut R) {
        lock(&self.shared.params).rules.randomize(rng);
        log::info!("Randomized interaction rules");
    }

    pub fn presets(&self) -> &'static [Preset] {
        PRESETS
    }

    pub fn apply_preset(&self, name: &str) -> Result<()> {
        let preset = find_preset(name)?;
        lock(&self.shared.params).rules = (preset.rules)();
        log::info!("Applied preset '{}'", preset.name);
        Ok(())
    }

    /// Restores the matrix the simulation was constructed with.
    pub fn reset(&self) {
        let mut params = lock(&self.shared.params);
        params.rules = params.original;
        log::info!("Reset interaction rules to original");
    }

    pub fn particle_size(&self) -> f64 {
        lock(&self.shared.params).particle_size
    }

    /// Clamped to the tunable range. Returns the value actually stored.
    pub fn set_particle_size(&self, size: f64) -> Result<f64> {
        ensure_finite("particle_size", size)?;
        let size = size.clamp(MIN_PARTICLE_SIZE, MAX_PARTICLE_SIZE);
        lock(&self.shared.params).particle_size = size;
        Ok(size)
    }

    /// Flat JSON object, one field per ordered species pair.
    pub fn serialize(&self) -> Vec<u8> {
        self.rules().to_json()
    }

    /// Writes `serialize()` to `<dir>/<epoch millis>.json` and returns the path.
    pub fn export_to_dir(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let path = dir.as_ref().join(format!("{}.json", millis));
        fs::write(&path, self.serialize())?;
        log::info!("Saved parameters to {}", path.display());
        Ok(path)
    }

    /// Replaces the whole matrix from an exported object. All pairs must be
    /// present and finite. The reset baseline is left alone.
    pub fn import(&self, bytes: &[u8]) -> Result<()> {
        let rules = RuleMatrix::from_json(bytes)?;
        lock(&self.shared.params).rules = rules;
        Ok(())
    }

    pub fn load_from(&self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = fs::read(path.as_ref())?;
        self.import(&bytes)?;
        log::info!("Loaded parameters from {}", path.as_ref().display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;
    use crate::simulation::Simulation;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn controls() -> ParameterControl {
        let config = SimulationConfig::new().with_seed(1).with_count_per_species(2);
        Simulation::new(&config).unwrap().controls()
    }

    #[test]
    fn test_set_and_get() {
        let c = controls();
        c.set(Species::Blue, Species::Yellow, 0.33).unwrap();
        assert_eq!(c.get(Species::Blue, Species::Yellow), 0.33);
        assert_eq!(c.get_by_name("blueyellow").unwrap(), 0.33);

        c.set(Species::Blue, Species::Yellow, 5.0).unwrap();
        assert_eq!(c.get(Species::Blue, Species::Yellow), 5.0);
    }

    #[test]
    fn test_set_rejects_non_finite() {
        let c = controls();
        let err = c.set(Species::Red, Species::Red, f64::NAN).unwrap_err();
        assert!(matches!(err, SimError::NonFiniteValue { ref name, .. } if name == "redred"));
        assert_eq!(c.get(Species::Red, Species::Red), 0.1);
        assert!(c.set_by_name("redred", f64::INFINITY).is_err());
    }

    #[test]
    fn test_set_clamped() {
        let c = controls();
        c.set_clamped(Species::Green, Species::Blue, -3.0).unwrap();
        assert_eq!(c.get(Species::Green, Species::Blue), -1.0);
    }

    #[test]
    fn test_unknown_name() {
        let c = controls();
        assert!(matches!(
            c.set_by_name("redmagenta", 0.1),
            Err(SimError::UnknownParameter(_))
        ));
    }

    #[test]
    fn test_randomize_then_reset_restores_original() {
        let c = controls();
        let original = c.rules();
        c.randomize_with(&mut StdRng::seed_from_u64(17));
        assert_ne!(c.rules(), original);
        for (_, _, g) in c.rules().iter() {
            assert!((-1.0..=1.0).contains(&g));
            assert!(((g * 100.0) - (g * 100.0).round()).abs() < 1e-9);
        }
        c.reset();
        assert_eq!(c.rules(), original);
    }

    #[test]
    fn test_reset_ignores_later_edits_and_imports() {
        let c = controls();
        let original = c.rules();
        c.set(Species::Red, Species::Red, 0.9).unwrap();
        c.import(&RuleMatrix::zeros().to_json()).unwrap();
        assert_eq!(c.rules(), RuleMatrix::zeros());
        c.reset();
        assert_eq!(c.rules(), original);
    }

    #[test]
    fn test_apply_preset() {
        let c = controls();
        c.apply_preset("interesting1").unwrap();
        assert_eq!(c.get(Species::Green, Species::Red), 0.78);
        assert!(c.apply_preset("missing").is_err());
        assert_eq!(c.presets().len(), 1);
    }

    #[test]
    fn test_particle_size_clamped() {
        let c = controls();
        assert_eq!(c.particle_size(), 0.01);
        assert_eq!(c.set_particle_size(1.0).unwrap(), 0.03);
        assert_eq!(c.set_particle_size(0.0).unwrap(), 0.001);
        assert!(c.set_particle_size(f64::NAN).is_err());
        assert_eq!(c.particle_size(), 0.001);
    }

    #[test]
    fn test_serialize_and_import() {
        let c = controls();
        c.randomize_with(&mut StdRng::seed_from_u64(4));
        let bytes = c.serialize();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value.as_object().unwrap().len(), 16);

        let other = controls();
        other.import(&bytes).unwrap();
        assert_eq!(other.rules(), c.rules());
        assert!(other.import(b"{\"redred\": 1.0}").is_err());
    }

    #[test]
    fn test_export_to_dir() {
        let dir = std::env::temp_dir().join(format!("particle-life-export-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let c = controls();
        let path = c.export_to_dir(&dir).unwrap();
        let name = path.file_name().unwrap().to_str().unwrap().to_string();
        assert!(name.ends_with(".json"));
        assert!(name.trim_end_matches(".json").parse::<u128>().is_ok());

        let other = controls();
        other.apply_preset("interesting1").unwrap();
        other.load_from(&path).unwrap();
        assert_eq!(other.rules(), c.rules());
        fs::remove_dir_all(&dir).ok();
    }
}

// --- Interaction Rule Matrix ---
//
// S x S table of signed coefficients. Row is the species being pushed,
// column is the species doing the pushing. Not required to be symmetric,
// and the diagonal (same-species cohesion/repulsion) is meaningful.

use crate::constants::{MAX_COEFFICIENT, MIN_COEFFICIENT, RANDOM_COEFFICIENT_DECIMALS, SPECIES_COUNT};
use crate::error::{Result, SimError};
use crate::species::Species;
use rand::Rng;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RuleMatrix {
    coefficients: [[f64; SPECIES_COUNT]; SPECIES_COUNT],
}

/// JSON field name for an ordered species pair, e.g. `redgreen`.
pub fn pair_name(a: Species, b: Species) -> String {
    format!("{}{}", a.name(), b.name())
}

/// Inverse of [`pair_name`].
pub fn parse_pair_name(name: &str) -> Option<(Species, Species)> {
    Species::ALL.into_iter().find_map(|a| {
        let rest = name.strip_prefix(a.name())?;
        Species::from_name(rest).map(|b| (a, b))
    })
}

/// Every ordered pair in canonical order: each row starts with the
/// same-species pair, followed by the other species in registry order.
pub fn pairs() -> impl Iterator<Item = (Species, Species)> {
    Species::ALL.into_iter().flat_map(|a| {
        std::iter::once((a, a)).chain(
            Species::ALL
                .into_iter()
                .filter(move |&b| b != a)
                .map(move |b| (a, b)),
        )
    })
}

/// Uniform value in [-1, 1], rounded to the control surface precision.
pub fn random_coefficient<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    let scale = 10f64.powi(RANDOM_COEFFICIENT_DECIMALS);
    let value = rng.gen_range(MIN_COEFFICIENT..=MAX_COEFFICIENT);
    (value * scale).round() / scale
}

impl RuleMatrix {
    /// All coefficients zero: no species interacts with any other.
    pub fn zeros() -> Self {
        Self {
            coefficients: [[0.0; SPECIES_COUNT]; SPECIES_COUNT],
        }
    }

    pub fn from_rows(coefficients: [[f64; SPECIES_COUNT]; SPECIES_COUNT]) -> Self {
        Self { coefficients }
    }

    #[inline]
    pub fn get(&self, a: Species, b: Species) -> f64 {
        self.coefficients[a.index()][b.index()]
    }

    /// Overwrites one entry. No range check; the integration step tolerates any finite value.
    #[inline]
    pub fn set(&mut self, a: Species, b: Species, value: f64) {
        self.coefficients[a.index()][b.index()] = value;
    }

    pub fn randomize<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        // Canonical pair order so a seeded rng always fills the same cells.
        for (a, b) in pairs() {
            self.set(a, b, random_coefficient(rng));
        }
    }

    /// Iterates every ordered pair in canonical order with its coefficient.
    pub fn iter(&self) -> impl Iterator<Item = (Species, Species, f64)> + '_ {
        pairs().map(|(a, b)| (a, b, self.get(a, b)))
    }

    pub fn is_finite(&self) -> bool {
        self.iter().all(|(_, _, g)| g.is_finite())
    }

    pub fn to_json(&self) -> Vec<u8> {
        // Serializing plain f64s into a map cannot fail; keep the signature infallible.
        serde_json::to_vec(self).unwrap_or_default()
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let fields: HashMap<String, f64> = serde_json::from_slice(bytes)?;
        Self::from_fields(&fields)
    }

    fn from_fields(fields: &HashMap<String, f64>) -> Result<Self> {
        if let Some(unknown) = fields.keys().find(|k| parse_pair_name(k).is_none()) {
            return Err(SimError::UnknownParameter(unknown.clone()));
        }
        let mut matrix = Self::zeros();
        for a in Species::ALL {
            for b in Species::ALL {
                let name = pair_name(a, b);
                let value = *fields
                    .get(&name)
                    .ok_or_else(|| SimError::MissingParameter(name.clone()))?;
                if !value.is_finite() {
                    return Err(SimError::NonFiniteValue { name, value });
                }
                matrix.set(a, b, value);
            }
        }
        Ok(matrix)
    }
}

impl Default for RuleMatrix {
    /// The coefficient set a fresh simulation starts with.
    fn default() -> Self {
        use Species::*;
        let mut m = Self::zeros();
        m.set(Red, Red, 0.1);
        m.set(Red, Green, -0.1);
        m.set(Green, Green, -0.7);
        m.set(Green, Red, -0.2);
        m.set(Blue, Blue, -0.1);
        m.set(Blue, Red, -0.2);
        m.set(Yellow, Red, 0.15);
        m
    }
}

// Flat object keyed by pair name, in canonical species order.
impl Serialize for RuleMatrix {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(SPECIES_COUNT * SPECIES_COUNT))?;
        for (a, b, g) in self.iter() {
            map.serialize_entry(&pair_name(a, b), &g)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RuleMatrix {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let fields = HashMap::<String, f64>::deserialize(deserializer)?;
        Self::from_fields(&fields).map_err(serde::de::Error::custom)
    }
}

// --- Presets ---

pub struct Preset {
    pub name: &'static str,
    pub description: &'static str,
    pub rules: fn() -> RuleMatrix,
}

pub static PRESETS: &[Preset] = &[Preset {
    name: "interesting1",
    description: "Red chases green while green flees; yellow orbits red",
    rules: || {
        use Species::*;
        let mut m = RuleMatrix::zeros();
        m.set(Red, Red, -0.1);
        m.set(Red, Green, -0.97);
        m.set(Green, Green, -0.7);
        m.set(Green, Red, 0.78);
        m.set(Green, Yellow, -0.4);
        m.set(Yellow, Yellow, 0.02);
        m.set(Yellow, Red, 0.15);
        m.set(Yellow, Green, -0.29);
        m
    },
}];

pub fn find_preset(name: &str) -> Result<&'static Preset> {
    PRESETS
        .iter()
        .find(|p| p.name == name)
        .ok_or_else(|| SimError::UnknownPreset(name.to_string()))
}

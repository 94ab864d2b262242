// --- Particle Store & Species Registry ---

use crate::constants::SPECIES_COUNT;
use crate::species::Species;
use glam::{DVec3, Vec4};
use rand::Rng;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Particle {
    pub position: DVec3,
    pub velocity: DVec3,
    pub species: Species,
}

impl Particle {
    pub fn new(position: DVec3, species: Species) -> Self {
        Self {
            position,
            velocity: DVec3::ZERO,
            species,
        }
    }

    /// Derived from the species, never stored.
    #[inline]
    pub fn color(&self) -> Vec4 {
        self.species.color()
    }
}

/// Uniform point inside the cube `[-volume, volume]^3`.
pub fn random_in_volume<R: Rng + ?Sized>(rng: &mut R, volume: f64) -> DVec3 {
    DVec3::new(
        rng.gen_range(-volume..volume),
        rng.gen_range(-volume..volume),
        rng.gen_range(-volume..volume),
    )
}

/// Authoritative particle state. The population is fixed at construction:
/// particles keep their index for the lifetime of the store.
#[derive(Debug, Clone)]
pub struct ParticleStore {
    particles: Vec<Particle>,
    // Indices of each species' members, in ascending index order.
    members: [Vec<usize>; SPECIES_COUNT],
    // Position cache per species, refreshed as each species is integrated.
    positions: [Vec<DVec3>; SPECIES_COUNT],
}

impl ParticleStore {
    /// Places `count_per_species` particles of every species at random,
    /// species-major (all red first, then green, and so on).
    pub fn populate<R: Rng + ?Sized>(rng: &mut R, count_per_species: usize, volume: f64) -> Self {
        let mut particles = Vec::with_capacity(count_per_species * SPECIES_COUNT);
        for species in Species::ALL {
            for _ in 0..count_per_species {
                particles.push(Particle::new(random_in_volume(rng, volume), species));
            }
        }
        Self::from_particles(particles)
    }

    /// Uses an explicit layout as-is. Order is preserved and becomes the render index.
    pub fn from_particles(particles: Vec<Particle>) -> Self {
        let mut members: [Vec<usize>; SPECIES_COUNT] = Default::default();
        for (i, p) in particles.iter().enumerate() {
            members[p.species.index()].push(i);
        }
        let mut store = Self {
            particles,
            members,
            positions: Default::default(),
        };
        for species in Species::ALL {
            store.refresh_positions(species);
        }
        store
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    #[inline]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Particle> {
        self.particles.get(index)
    }

    #[inline]
    pub fn members(&self, species: Species) -> &[usize] {
        &self.members[species.index()]
    }

    /// Positions of one species as of its last integration.
    #[inline]
    pub fn positions(&self, species: Species) -> &[DVec3] {
        &self.positions[species.index()]
    }

    pub fn count(&self, species: Species) -> usize {
        self.members[species.index()].len()
    }

    pub(crate) fn particle_mut(&mut self, index: usize) -> &mut Particle {
        &mut self.particles[index]
    }

    pub(crate) fn refresh_positions(&mut self, species: Species) {
        let cache = &mut self.positions[species.index()];
        cache.clear();
        cache.extend(
            self.members[species.index()]
                .iter()
                .map(|&i| self.particles[i].position),
        );
    }
}

//! Force accumulation and Euler integration for one simulation tick.
//!
//! The force law is stylised rather than physical: magnitude falls off with
//! `1 / dist` (not inverse-square), scales linearly with particle size, and is
//! cut off hard at `CUTOFF_FACTOR * volume`.

use crate::constants::{CUTOFF_FACTOR, FORCE_SCALE, VELOCITY_DAMPING};
use crate::particle::{Particle, ParticleStore};
use crate::rules::RuleMatrix;
use crate::species::Species;
use glam::DVec3;
use rayon::prelude::*;

/// Values held constant for the duration of one tick.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct StepParams {
    pub volume: f64,
    pub particle_size: f64,
}

impl StepParams {
    #[inline]
    pub fn cutoff(&self) -> f64 {
        CUTOFF_FACTOR * self.volume
    }
}

/// Contribution of one partner displaced by `d = p1 - p2`.
/// Exactly zero at zero distance or at/beyond the cutoff.
#[inline]
pub fn pair_force(d: DVec3, g: f64, particle_size: f64, cutoff: f64) -> DVec3 {
    let dist = d.length();
    if dist > 0.0 && dist < cutoff {
        let f = g * particle_size * FORCE_SCALE / dist;
        d * f
    } else {
        DVec3::ZERO
    }
}

/// Sum of pair forces on `position` from every partner, in slice order.
pub fn accumulate_force(position: DVec3, partners: &[DVec3], g: f64, params: &StepParams) -> DVec3 {
    let cutoff = params.cutoff();
    partners.iter().fold(DVec3::ZERO, |acc, &other| {
        acc + pair_force(position - other, g, params.particle_size, cutoff)
    })
}

/// Applies an accumulated force: damped velocity update, Euler move, then
/// per-axis reflection and clamping against the volume walls.
///
/// The reflected velocity only takes effect on the next tick, so a particle
/// that crosses a wall is clamped onto it this tick and pulled back after.
pub fn integrate(particle: &mut Particle, force: DVec3, volume: f64) {
    let mut velocity = (particle.velocity + force) * VELOCITY_DAMPING;
    if !velocity.is_finite() {
        // The sum overflowed before damping; damp each term first instead.
        log::warn!(
            "Velocity overflow on {} particle, damping terms separately",
            particle.species.name()
        );
        velocity = particle.velocity * VELOCITY_DAMPING + force * VELOCITY_DAMPING;
    }
    particle.velocity = velocity;
    particle.position += particle.velocity;

    for axis in 0..3 {
        let p = particle.position[axis];
        if p <= -volume || p >= volume {
            particle.velocity[axis] = -particle.velocity[axis];
        }
        particle.position[axis] = p.clamp(-volume, volume);
    }
}

/// Runs one full tick over the store.
///
/// Species are processed in canonical order. For each species, the force on
/// every member is summed over all partner species first, and only then is
/// each member integrated once. `forces` is scratch space reused across ticks.
pub fn step(
    store: &mut ParticleStore,
    rules: &RuleMatrix,
    params: &StepParams,
    forces: &mut Vec<DVec3>,
) {
    for a in Species::ALL {
        {
            let store_ref = &*store;
            store_ref
                .members(a)
                .par_iter()
                .map(|&i| {
                    let position = store_ref.particles()[i].position;
                    Species::ALL.iter().fold(DVec3::ZERO, |acc, &b| {
                        let g = rules.get(a, b);
                        acc + accumulate_force(position, store_ref.positions(b), g, params)
                    })
                })
                .collect_into_vec(forces);
        }

        for (k, force) in forces.iter().enumerate() {
            let force = if force.is_finite() {
                *force
            } else {
                log::warn!(
                    "Discarding non-finite force {:?} on {} particle {}",
                    force,
                    a.name(),
                    k
                );
                DVec3::ZERO
            };
            let index = store.members(a)[k];
            integrate(store.particle_mut(index), force, params.volume);
        }
        store.refresh_positions(a);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const PARAMS: StepParams = StepParams {
        volume: 3.0,
        particle_size: 0.01,
    };

    fn pair_store(distance: f64) -> ParticleStore {
        ParticleStore::from_particles(vec![
            Particle::new(DVec3::ZERO, Species::Red),
            Particle::new(DVec3::new(distance, 0.0, 0.0), Species::Green),
        ])
    }

    fn red_green(g: f64) -> RuleMatrix {
        let mut rules = RuleMatrix::zeros();
        rules.set(Species::Red, Species::Green, g);
        rules
    }

    #[test]
    fn test_pair_force_cutoff() {
        let cutoff = PARAMS.cutoff();
        assert_eq!(pair_force(DVec3::ZERO, 1.0, 0.01, cutoff), DVec3::ZERO);
        assert_eq!(pair_force(DVec3::new(0.9, 0.0, 0.0), 1.0, 0.01, cutoff), DVec3::ZERO);
        assert_eq!(pair_force(DVec3::new(0.0, 2.0, 0.0), 1.0, 0.01, cutoff), DVec3::ZERO);
        assert_ne!(pair_force(DVec3::new(0.0, 0.0, 0.89), 1.0, 0.01, cutoff), DVec3::ZERO);
    }

    #[test]
    fn test_pair_beyond_cutoff_is_unchanged() {
        let mut store = pair_store(1.0);
        let before = store.particles().to_vec();
        let mut forces = Vec::new();
        step(&mut store, &red_green(0.1), &PARAMS, &mut forces);
        assert_eq!(store.particles(), &before[..]);
    }

    #[test]
    fn test_pair_within_cutoff_force_value() {
        let mut store = pair_store(0.5);
        let mut forces = Vec::new();
        step(&mut store, &red_green(0.1), &PARAMS, &mut forces);

        // d = p1 - p2 = (-0.5, 0, 0); F = 0.1 * 0.01 * 2 / 0.5 = 0.004
        let d = DVec3::new(-0.5, 0.0, 0.0);
        let expected_velocity = (DVec3::ZERO + d * 0.004) * 0.5;
        let red = store.particles()[0];
        assert!((red.velocity - expected_velocity).length() < 1e-15);
        assert!((red.position - expected_velocity).length() < 1e-15);

        // green/red coefficient is zero: green only feels damping of a zero velocity
        let green = store.particles()[1];
        assert_eq!(green.velocity, DVec3::ZERO);
        assert_eq!(green.position, DVec3::new(0.5, 0.0, 0.0));
    }

    #[test]
    fn test_forces_accumulate_before_single_integration() {
        // Red feels two partner species. Integrating after each partner would
        // halve the first contribution twice; a single update halves the sum once.
        let mut store = ParticleStore::from_particles(vec![
            Particle::new(DVec3::ZERO, Species::Red),
            Particle::new(DVec3::new(0.5, 0.0, 0.0), Species::Green),
            Particle::new(DVec3::new(0.0, 0.5, 0.0), Species::Blue),
        ]);
        let mut rules = red_green(0.1);
        rules.set(Species::Red, Species::Blue, 0.1);
        let mut forces = Vec::new();
        step(&mut store, &rules, &PARAMS, &mut forces);

        let f_green = DVec3::new(-0.5, 0.0, 0.0) * 0.004;
        let f_blue = DVec3::new(0.0, -0.5, 0.0) * 0.004;
        let expected = (f_green + f_blue) * 0.5;
        assert!((store.particles()[0].velocity - expected).length() < 1e-15);
    }

    #[test]
    fn test_reflection_with_clamp_on_same_tick() {
        let mut p = Particle::new(DVec3::new(2.9, 0.0, 0.0), Species::Red);
        p.velocity = DVec3::new(0.4, 0.0, 0.0);
        integrate(&mut p, DVec3::ZERO, 3.0);
        // velocity 0.2 carries it to 3.1: flipped and clamped in the same tick
        assert_eq!(p.position.x, 3.0);
        assert_eq!(p.velocity.x, -0.2);

        integrate(&mut p, DVec3::ZERO, 3.0);
        assert_eq!(p.velocity.x, -0.1);
        assert!((p.position.x - 2.9).abs() < 1e-12);
    }

    #[test]
    fn test_reflection_at_exact_boundary() {
        let mut p = Particle::new(DVec3::new(0.0, -2.5, 0.0), Species::Red);
        p.velocity = DVec3::new(0.0, -1.0, 0.0);
        integrate(&mut p, DVec3::ZERO, 3.0);
        // lands exactly on the wall: still reflected
        assert_eq!(p.position.y, -3.0);
        assert_eq!(p.velocity.y, 0.5);
    }

    #[test]
    fn test_containment_and_population_over_many_ticks() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut store = ParticleStore::populate(&mut rng, 30, 1.0);
        let mut rules = RuleMatrix::zeros();
        rules.randomize(&mut rng);
        let params = StepParams {
            volume: 1.0,
            particle_size: 0.03,
        };
        let mut forces = Vec::new();
        for _ in 0..50 {
            step(&mut store, &rules, &params, &mut forces);
            assert_eq!(store.len(), 120);
            for species in Species::ALL {
                assert_eq!(store.count(species), 30);
            }
            for p in store.particles() {
                assert!(p.position.abs().max_element() <= 1.0);
                assert!(p.velocity.is_finite());
            }
        }
    }

    #[test]
    fn test_extreme_coefficients_stay_finite() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut store = ParticleStore::populate(&mut rng, 8, 3.0);
        let rules = RuleMatrix::from_rows([[1e300; 4]; 4]);
        let mut forces = Vec::new();
        for _ in 0..5 {
            step(&mut store, &rules, &PARAMS, &mut forces);
        }
        for p in store.particles() {
            assert!(p.position.is_finite());
            assert!(p.velocity.is_finite());
            assert!(p.position.abs().max_element() <= 3.0);
        }
    }

    #[test]
    fn test_integrate_survives_velocity_overflow() {
        let mut p = Particle::new(DVec3::ZERO, Species::Red);
        p.velocity = DVec3::new(f64::MAX, 0.0, -f64::MAX);
        integrate(&mut p, DVec3::new(f64::MAX, 0.0, -f64::MAX), 3.0);
        assert!(p.velocity.is_finite());
        assert_eq!(p.position, DVec3::new(3.0, 0.0, -3.0));
    }

    #[test]
    fn test_max_coefficients_stay_finite() {
        // 45 partners just inside the cutoff: each force is finite, but the
        // sum with an already huge velocity overflows on the second tick.
        for g in [f64::MAX, -f64::MAX] {
            let mut particles = vec![Particle::new(DVec3::new(-2.0, 0.0, 0.0), Species::Red)];
            particles.extend(
                (0..45).map(|_| Particle::new(DVec3::new(-2.5, 0.0, 0.0), Species::Green)),
            );
            let mut store = ParticleStore::from_particles(particles);
            let rules = red_green(g);
            let mut forces = Vec::new();
            for tick in 0..8 {
                step(&mut store, &rules, &PARAMS, &mut forces);
                for p in store.particles() {
                    assert!(p.velocity.is_finite(), "g {} tick {}: {:?}", g, tick, p.velocity);
                    assert!(p.position.abs().max_element() <= 3.0);
                }
            }
        }
    }

    #[test]
    fn test_step_is_deterministic() {
        let run = || {
            let mut rng = StdRng::seed_from_u64(42);
            let mut store = ParticleStore::populate(&mut rng, 25, 3.0);
            let rules = RuleMatrix::default();
            let mut forces = Vec::new();
            for _ in 0..20 {
                step(&mut store, &rules, &PARAMS, &mut forces);
            }
            store.particles().to_vec()
        };
        assert_eq!(run(), run());
    }
}

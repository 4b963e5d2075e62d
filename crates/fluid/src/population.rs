//! All the particles, and the once-per-frame update that moves them.

use glam::Vec2;
use rayon::iter::{
    IndexedParallelIterator as _, IntoParallelRefMutIterator as _, ParallelIterator as _,
};

use crate::bounds::Bounds;
use crate::errors::{FluidError, UnknownStepModeSnafu};
use crate::particle::Particle;

/// How the particles in a population see each other during a tick.
#[derive(serde::Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum StepMode {
    /// Particles are updated one at a time in population order, and each one is written back
    /// straight away. So a particle sees the already-moved positions of every particle before
    /// it in the population, and the start-of-frame positions of every particle after it.
    ///
    /// This is how the fluid is meant to behave. It isn't physically consistent, but it's cheap
    /// and it gives the fluid its character. Changing the order of the population changes the
    /// trajectories.
    #[default]
    Sequential,
    /// Every particle is updated against a copy of the population taken at the start of the
    /// frame. The order of the population doesn't matter, so the work is spread over threads.
    /// This is a different, smoother simulation, not a faster version of `Sequential`.
    Snapshot,
}

impl std::str::FromStr for StepMode {
    type Err = FluidError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "sequential" => Ok(Self::Sequential),
            "snapshot" => Ok(Self::Snapshot),
            _ => UnknownStepModeSnafu { name }.fail(),
        }
    }
}

impl std::fmt::Display for StepMode {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sequential => write!(formatter, "sequential"),
            Self::Snapshot => write!(formatter, "snapshot"),
        }
    }
}

/// Which way a point force pushes.
#[derive(serde::Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum PointForceKind {
    /// Pull particles towards the point
    Drain,
    /// Push particles away from the point
    Repel,
}

/// An external force centred on a point, like a mouse cursor with a button held down.
#[derive(Debug, Clone, Copy, PartialEq)]
#[expect(
    clippy::exhaustive_structs,
    reason = "A point force is only ever a kind and a place"
)]
pub struct PointForce {
    /// Pull or push
    pub kind: PointForceKind,
    /// Where the force is centred
    pub position: Vec2,
}

impl PointForce {
    /// Apply the force to a single particle's velocity.
    pub fn apply(&self, particle: &mut Particle) {
        match self.kind {
            PointForceKind::Drain => particle.drain(self.position),
            PointForceKind::Repel => particle.repel(self.position),
        }
    }
}

/// Every particle in the simulation, in the order that they were spawned.
#[derive(Debug, Clone, Default)]
pub struct Population {
    /// Spawn order is also update order.
    particles: Vec<Particle>,
}

impl Population {
    /// Instantiate
    #[must_use]
    pub const fn new() -> Self {
        Self {
            particles: Vec::new(),
        }
    }

    /// Instantiate with room for a known number of particles.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            particles: Vec::with_capacity(capacity),
        }
    }

    /// Add a particle to the end of the population.
    pub fn push(&mut self, particle: Particle) {
        self.particles.push(particle);
    }

    /// The number of particles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    /// Whether there are any particles at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Iterate over the particles in population order.
    pub fn iter(&self) -> std::slice::Iter<'_, Particle> {
        self.particles.iter()
    }

    /// All the particles in population order.
    #[must_use]
    pub fn as_slice(&self) -> &[Particle] {
        &self.particles
    }

    /// Advance every particle by one frame.
    ///
    /// Each particle first gets every force in `forces` applied to it, in the given order, and
    /// then does its physics step.
    pub fn tick(&mut self, bounds: &Bounds, forces: &[PointForce], mode: StepMode) {
        match mode {
            StepMode::Sequential => self.tick_sequential(bounds, forces),
            StepMode::Snapshot => self.tick_snapshot(bounds, forces),
        }

        tracing::trace!(
            "Ticked {} particles ({mode}) with {} point force(s)",
            self.particles.len(),
            forces.len()
        );
    }

    /// Particles see the already-updated state of every particle before them.
    fn tick_sequential(&mut self, bounds: &Bounds, forces: &[PointForce]) {
        for index in 0..self.particles.len() {
            let Some(mut particle) = self.particles.get(index).copied() else {
                break;
            };

            for force in forces {
                force.apply(&mut particle);
            }
            particle.act(index, &self.particles, bounds);

            if let Some(slot) = self.particles.get_mut(index) {
                *slot = particle;
            }
        }
    }

    /// Particles only see the state from the start of the frame.
    fn tick_snapshot(&mut self, bounds: &Bounds, forces: &[PointForce]) {
        let snapshot = self.particles.clone();
        self.particles
            .par_iter_mut()
            .enumerate()
            .for_each(|(index, particle)| {
                for force in forces {
                    force.apply(particle);
                }
                particle.act(index, &snapshot, bounds);
            });
    }
}

impl<'population> IntoIterator for &'population Population {
    type Item = &'population Particle;
    type IntoIter = std::slice::Iter<'population, Particle>;

    fn into_iter(self) -> Self::IntoIter {
        self.particles.iter()
    }
}

#[cfg(test)]
#[expect(
    clippy::float_cmp,
    clippy::indexing_slicing,
    clippy::unwrap_used,
    clippy::default_numeric_fallback,
    reason = "Tests aren't so strict"
)]
mod test {
    use crate::particle::Parameters;

    use super::*;

    const BOUNDS: Bounds = Bounds::new(800.0, 600.0);

    fn water() -> Parameters {
        Parameters::new(0.995, 0.85, 0.12, (0.1, 0.8, 0.9)).unwrap()
    }

    fn lava() -> Parameters {
        Parameters::new(0.95, 0.8, 0.35, (0.9, 0.1, 0.0)).unwrap()
    }

    fn pair() -> (Particle, Particle) {
        (
            Particle::new(Vec2::new(100.0, 100.0), Vec2::new(0.5, 0.0), water()),
            Particle::new(Vec2::new(103.0, 101.0), Vec2::new(-0.5, 0.0), lava()),
        )
    }

    fn population_of(particles: &[Particle]) -> Population {
        let mut population = Population::new();
        for particle in particles {
            population.push(*particle);
        }
        population
    }

    #[test]
    fn sequential_tick_sees_already_moved_neighbours() {
        let (a, b) = pair();
        let mut population = population_of(&[a, b]);
        population.tick(&BOUNDS, &[], StepMode::Sequential);

        let mut expected_a = a;
        expected_a.act(0, &[a, b], &BOUNDS);
        let mut expected_b = b;
        expected_b.act(1, &[expected_a, b], &BOUNDS);

        let mut b_against_stale_a = b;
        b_against_stale_a.act(1, &[a, b], &BOUNDS);

        assert_ne!(expected_a.position(), a.position());
        assert_eq!(population.as_slice(), &[expected_a, expected_b]);
        assert_ne!(population.as_slice()[1], b_against_stale_a);
    }

    #[test]
    fn reordering_changes_trajectories() {
        let (a, b) = pair();
        let mut forwards = population_of(&[a, b]);
        let mut backwards = population_of(&[b, a]);
        for _ in 0..10 {
            forwards.tick(&BOUNDS, &[], StepMode::Sequential);
            backwards.tick(&BOUNDS, &[], StepMode::Sequential);
        }

        assert_ne!(forwards.as_slice()[0], backwards.as_slice()[1]);
        assert_ne!(forwards.as_slice()[1], backwards.as_slice()[0]);
    }

    #[test]
    fn snapshot_tick_only_sees_start_of_frame() {
        let (a, b) = pair();
        let mut population = population_of(&[a, b]);
        population.tick(&BOUNDS, &[], StepMode::Snapshot);

        let mut expected_a = a;
        expected_a.act(0, &[a, b], &BOUNDS);
        let mut expected_b = b;
        expected_b.act(1, &[a, b], &BOUNDS);

        assert_eq!(population.as_slice(), &[expected_a, expected_b]);
    }

    #[test]
    fn snapshot_tick_ignores_order() {
        let (a, b) = pair();
        let mut forwards = population_of(&[a, b]);
        let mut backwards = population_of(&[b, a]);
        forwards.tick(&BOUNDS, &[], StepMode::Snapshot);
        backwards.tick(&BOUNDS, &[], StepMode::Snapshot);

        assert_eq!(forwards.as_slice()[0], backwards.as_slice()[1]);
        assert_eq!(forwards.as_slice()[1], backwards.as_slice()[0]);
    }

    #[test]
    fn point_forces_come_before_the_physics_step() {
        let (a, b) = pair();
        let forces = [
            PointForce {
                kind: PointForceKind::Drain,
                position: Vec2::new(300.0, 200.0),
            },
            PointForce {
                kind: PointForceKind::Repel,
                position: Vec2::new(50.0, 90.0),
            },
        ];
        let mut population = population_of(&[a, b]);
        population.tick(&BOUNDS, &forces, StepMode::Sequential);

        let mut expected_a = a;
        expected_a.drain(Vec2::new(300.0, 200.0));
        expected_a.repel(Vec2::new(50.0, 90.0));
        expected_a.act(0, &[a, b], &BOUNDS);
        let mut expected_b = b;
        expected_b.drain(Vec2::new(300.0, 200.0));
        expected_b.repel(Vec2::new(50.0, 90.0));
        expected_b.act(1, &[expected_a, b], &BOUNDS);

        assert_eq!(population.as_slice(), &[expected_a, expected_b]);
    }

    #[test]
    fn integrating_past_the_left_edge_bounces() {
        let still = Parameters::new(1.0, 1.0, 0.0, (1.0, 1.0, 1.0)).unwrap();
        let particle = Particle::new(Vec2::new(1.0, 100.0), Vec2::new(-6.0, 0.0), still);
        let mut population = population_of(&[particle]);
        population.tick(&BOUNDS, &[], StepMode::Sequential);

        let moved = population.as_slice()[0];
        assert_eq!(moved.position(), Vec2::new(5.0, 100.0));
        assert_eq!(moved.velocity(), Vec2::new(3.0, 0.0));
    }

    #[test]
    fn particles_are_never_removed() {
        let (a, b) = pair();
        let mut population = Population::with_capacity(2);
        assert!(population.is_empty());
        population.push(a);
        population.push(b);
        for _ in 0..100 {
            population.tick(&BOUNDS, &[], StepMode::Sequential);
        }
        assert_eq!(population.len(), 2);
        assert_eq!(population.iter().count(), 2);
    }

    #[test]
    fn point_force_at_nan_leaves_the_fluid_alone() {
        let (a, b) = pair();
        let drain = PointForce {
            kind: PointForceKind::Drain,
            position: Vec2::new(f32::NAN, 100.0),
        };

        let mut forced = population_of(&[a, b]);
        forced.tick(&BOUNDS, &[drain], StepMode::Sequential);
        let mut unforced = population_of(&[a, b]);
        unforced.tick(&BOUNDS, &[], StepMode::Sequential);

        assert!(forced.iter().all(|particle| particle.position().is_finite()));
        assert_eq!(forced.as_slice(), unforced.as_slice());
    }

    #[test]
    fn parse_step_modes() {
        assert_eq!("sequential".parse::<StepMode>().unwrap(), StepMode::Sequential);
        assert_eq!("snapshot".parse::<StepMode>().unwrap(), StepMode::Snapshot);
        let error = "double_buffered".parse::<StepMode>().unwrap_err();
        assert_eq!(
            error.to_string(),
            "Unknown step mode: 'double_buffered', expected 'sequential' or 'snapshot'"
        );
        assert_eq!(StepMode::default(), StepMode::Sequential);
    }
}

//! Pours new particles into the population according to a preset.

use color_eyre::eyre::Result;
use glam::Vec2;
use rand::{Rng as _, SeedableRng as _};

use fluid::bounds::Bounds;
use fluid::particle::Particle;
use fluid::population::Population;

use crate::presets::{Preset, SpawnRule};

/// Spawns particles for a preset.
#[derive(Debug)]
pub struct Spawner {
    /// Checked in order every frame
    rules: Vec<SpawnRule>,
    /// For the initial velocities
    rng: rand::rngs::StdRng,
}

impl Spawner {
    /// Instantiate. A seed makes every run spawn exactly the same particles.
    pub fn new(preset: Preset, seed: Option<u64>) -> Result<Self> {
        let rng = match seed {
            Some(seed) => rand::rngs::StdRng::seed_from_u64(seed),
            None => rand::rngs::StdRng::from_entropy(),
        };

        Ok(Self {
            rules: preset.rules()?,
            rng,
        })
    }

    /// Spawn whatever the rules say should appear on this frame. Frames start at 1.
    ///
    /// Each rule sees the particles spawned by the rules before it, so the caps are on the total
    /// population, not per fluid.
    pub fn spawn(&mut self, frame: u64, bounds: &Bounds, population: &mut Population) -> usize {
        let mut count = 0;
        for rule in &self.rules {
            if population.len() >= rule.max_particles || frame % rule.every_nth_frame != 0 {
                continue;
            }

            for emitter in &rule.emitters {
                let position = Vec2::new(emitter.x.resolve(bounds.width), emitter.y);
                let velocity = Vec2::new(
                    random_between(&mut self.rng, emitter.velocity_x),
                    random_between(&mut self.rng, emitter.velocity_y),
                );
                population.push(Particle::new(position, velocity, emitter.parameters));
                count += 1;
            }
        }

        if count > 0 {
            tracing::trace!(
                "Spawned {count} particle(s) on frame {frame}, population: {}",
                population.len()
            );
        }
        count
    }
}

/// A random number between `bottom` and `top`. It's fine for `top` to be smaller than `bottom`.
fn random_between(rng: &mut rand::rngs::StdRng, (bottom, top): (f32, f32)) -> f32 {
    rng.gen::<f32>() * (top - bottom) + bottom
}

#[cfg(test)]
#[expect(
    clippy::float_cmp,
    clippy::indexing_slicing,
    clippy::unwrap_used,
    reason = "Tests aren't so strict"
)]
mod test {
    use super::*;

    const BOUNDS: Bounds = Bounds::new(800.0, 600.0);

    fn spawn_frames(preset: Preset, frames: u64) -> Population {
        let mut spawner = Spawner::new(preset, Some(1)).unwrap();
        let mut population = Population::new();
        for frame in 1..=frames {
            spawner.spawn(frame, &BOUNDS, &mut population);
        }
        population
    }

    #[test]
    fn water_spawns_every_fourth_frame() {
        let population = spawn_frames(Preset::Water, 40);
        assert_eq!(population.len(), 10);

        let first = population.as_slice()[0];
        assert_eq!(first.position(), Vec2::new(5.0, 250.0));
        assert!((6.0..=12.0).contains(&first.velocity().x));
        assert!((-8.0..=-5.0).contains(&first.velocity().y));
        assert_eq!(first.parameters().damping(), 0.995);
    }

    #[test]
    fn water_stops_at_its_cap() {
        let population = spawn_frames(Preset::Water, 2000);
        assert_eq!(population.len(), 200);
    }

    #[test]
    fn lava_comes_from_the_right() {
        let population = spawn_frames(Preset::Lava, 7);
        assert_eq!(population.len(), 1);
        let lava = population.as_slice()[0];
        assert_eq!(lava.position(), Vec2::new(795.0, 250.0));
        assert!((-24.0..=-12.0).contains(&lava.velocity().x));
    }

    #[test]
    fn three_fluids_spawn_together() {
        let population = spawn_frames(Preset::ThreeFluids, 8);
        let xs: Vec<f32> = population.iter().map(|particle| particle.position().x).collect();
        assert_eq!(xs, vec![150.0, 400.0, 650.0]);
    }

    #[test]
    fn three_fluids_cap_is_checked_per_batch() {
        let population = spawn_frames(Preset::ThreeFluids, 8 * 200);
        assert_eq!(population.len(), 351);
    }

    #[test]
    fn same_seed_same_particles() {
        let first = spawn_frames(Preset::WaterAndLava, 100);
        let second = spawn_frames(Preset::WaterAndLava, 100);
        assert_eq!(first.as_slice(), second.as_slice());
    }
}

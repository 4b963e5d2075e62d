//! The fluids that can be poured into the screen.
//!
//! Water has little damping and a high speed scale. Its small gravity also makes it take up more
//! space vertically. Lava is heavily damped, slow and heavy.

use color_eyre::eyre::Result;
use fluid::particle::{Colour, Parameters};

/// All the available presets.
#[derive(serde::Deserialize, clap::ValueEnum, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum Preset {
    /// Only water, poured in from the left
    #[default]
    Water,
    /// Only lava, poured in from the right
    Lava,
    /// Water from the left and lava from the right
    WaterAndLava,
    /// Three fluids with different gravities that settle into layers
    ThreeFluids,
}

/// Where along the top of the screen an emitter sits. Needed because the screen width isn't
/// known until the config is loaded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Horizontal {
    /// Pixels from the left edge
    FromLeft(f32),
    /// Pixels from the right edge
    FromRight(f32),
    /// The middle of the screen
    Centre,
}

impl Horizontal {
    /// The actual x coordinate for a screen of the given width.
    #[must_use]
    pub fn resolve(self, width: f32) -> f32 {
        match self {
            Self::FromLeft(offset) => offset,
            Self::FromRight(offset) => width - offset,
            Self::Centre => width / 2.0,
        }
    }
}

/// Spawns a single particle each time its rule fires.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Emitter {
    /// Where the particle appears horizontally
    pub x: Horizontal,
    /// Where the particle appears vertically
    pub y: f32,
    /// The initial horizontal velocity is picked randomly between these two
    pub velocity_x: (f32, f32),
    /// The initial vertical velocity is picked randomly between these two
    pub velocity_y: (f32, f32),
    /// The spawned particle's attributes
    pub parameters: Parameters,
}

/// A group of emitters that all fire on the same frames.
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnRule {
    /// The rule only fires while the population is smaller than this
    pub max_particles: usize,
    /// The rule only fires on frames that are a multiple of this
    pub every_nth_frame: u64,
    /// Each emitter spawns one particle when the rule fires
    pub emitters: Vec<Emitter>,
}

/// Red
const RED: Colour = (0.9, 0.0, 0.0);
/// Green
const GREEN: Colour = (0.0, 0.9, 0.0);
/// Blue
const BLUE: Colour = (0.0, 0.0, 0.9);

impl Preset {
    /// The spawn rules for the preset, checked in order every frame.
    pub fn rules(self) -> Result<Vec<SpawnRule>> {
        let rules = match self {
            Self::Water => vec![Self::water()?],
            Self::Lava => vec![Self::lava()?],
            Self::WaterAndLava => vec![Self::water()?, Self::lava()?],
            Self::ThreeFluids => vec![Self::three_fluids()?],
        };
        Ok(rules)
    }

    /// Water
    fn water() -> Result<SpawnRule> {
        Ok(SpawnRule {
            max_particles: 200,
            every_nth_frame: 4,
            emitters: vec![Emitter {
                x: Horizontal::FromLeft(5.0),
                y: 250.0,
                velocity_x: (6.0, 12.0),
                velocity_y: (-8.0, -5.0),
                parameters: Parameters::new(0.995, 0.85, 0.12, (0.1, 0.8, 0.9))?,
            }],
        })
    }

    /// Lava
    fn lava() -> Result<SpawnRule> {
        Ok(SpawnRule {
            max_particles: 170,
            every_nth_frame: 7,
            emitters: vec![Emitter {
                x: Horizontal::FromRight(5.0),
                y: 250.0,
                velocity_x: (-12.0, -24.0),
                velocity_y: (-16.0, -10.0),
                parameters: Parameters::new(0.95, 0.8, 0.35, (0.9, 0.1, 0.0))?,
            }],
        })
    }

    /// Gravity is what mainly decides where each of these fluids ends up vertically.
    fn three_fluids() -> Result<SpawnRule> {
        let emitter = |x: Horizontal, parameters: Parameters| Emitter {
            x,
            y: 150.0,
            velocity_x: (-2.0, 2.0),
            velocity_y: (-2.0, 2.0),
            parameters,
        };

        Ok(SpawnRule {
            max_particles: 350,
            every_nth_frame: 8,
            emitters: vec![
                emitter(
                    Horizontal::FromLeft(150.0),
                    Parameters::new(0.997, 1.0, 0.1, RED)?,
                ),
                emitter(Horizontal::Centre, Parameters::new(0.994, 0.9, 0.13, GREEN)?),
                emitter(
                    Horizontal::FromRight(150.0),
                    Parameters::new(0.991, 0.8, 0.16, BLUE)?,
                ),
            ],
        })
    }
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

    #[test]
    fn every_preset_has_valid_rules() {
        for preset in [
            Preset::Water,
            Preset::Lava,
            Preset::WaterAndLava,
            Preset::ThreeFluids,
        ] {
            assert!(!preset.rules().unwrap().is_empty());
        }
    }

    #[test]
    fn water_and_lava_checks_water_first() {
        let rules = Preset::WaterAndLava.rules().unwrap();
        assert_eq!(rules[0].max_particles, 200);
        assert_eq!(rules[1].max_particles, 170);
    }

    #[test]
    fn emitters_resolve_against_screen_width() {
        assert_eq!(Horizontal::FromLeft(5.0).resolve(800.0), 5.0);
        assert_eq!(Horizontal::FromRight(150.0).resolve(800.0), 650.0);
        assert_eq!(Horizontal::Centre.resolve(800.0), 400.0);
    }

    #[test]
    fn three_fluids_get_heavier_left_to_right() {
        let rule = &Preset::ThreeFluids.rules().unwrap()[0];
        let gravities: Vec<f32> = rule
            .emitters
            .iter()
            .map(|emitter| emitter.parameters.gravity())
            .collect();
        assert_eq!(gravities, vec![0.1, 0.13, 0.16]);
    }
}

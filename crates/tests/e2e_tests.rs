//! End to end tests
#[cfg(test)]
#[expect(
    clippy::unwrap_used,
    clippy::as_conversions,
    clippy::cast_precision_loss,
    reason = "Tests aren't so strict"
)]
mod e2e {
    use fluid::population::{PointForceKind, StepMode};
    use fluid_sim::config::main::{Config, PointerEvent};
    use fluid_sim::presets::Preset;
    use glam::Vec2;

    const WIDTH: u32 = 320;
    const HEIGHT: u32 = 300;

    fn small_config(frames: u64) -> Config {
        let mut config = Config::default();
        config.width = WIDTH;
        config.height = HEIGHT;
        config.frames = frames;
        config.seed = Some(1234);
        config.render.enabled = false;
        config.render.sprite_half_size = 20.0;
        config.render.texture_size = 32;
        config
    }

    fn mean_distance_to(population: &fluid::population::Population, point: Vec2) -> f32 {
        let total: f32 = population
            .iter()
            .map(|particle| particle.position().distance(point))
            .sum();
        total / population.len() as f32
    }

    #[tokio::test]
    async fn headless_run_writes_metaball_frames() {
        let directory = tempfile::tempdir().unwrap();
        let mut config = small_config(40);
        config.render.enabled = true;
        config.render.output_directory = directory.path().join("frames");

        let summary = fluid_sim::run::simulate(&config).await.unwrap();

        assert_eq!(summary.frames, 40);
        assert_eq!(summary.population.len(), 10);
        assert_eq!(summary.frames_written, 4);
        assert_eq!(
            summary.output_directory,
            Some(directory.path().join("frames"))
        );
        for frame in [10_u64, 20, 30, 40] {
            let path = directory
                .path()
                .join("frames")
                .join(format!("frame-{frame:06}.png"));
            let image = image::open(&path).unwrap();
            assert_eq!((image.width(), image.height()), (WIDTH, HEIGHT));
        }
    }

    #[tokio::test]
    async fn same_seed_same_fluid() {
        let config = small_config(200);
        let first = fluid_sim::run::simulate(&config).await.unwrap();
        let second = fluid_sim::run::simulate(&config).await.unwrap();
        assert_eq!(first.population.as_slice(), second.population.as_slice());
        assert_eq!(first.frames_written, 0);
        assert_eq!(first.output_directory, None);
    }

    #[tokio::test]
    async fn step_modes_are_different_simulations() {
        let mut config = small_config(100);
        let sequential = fluid_sim::run::simulate(&config).await.unwrap();
        config.step_mode = StepMode::Snapshot;
        let snapshot = fluid_sim::run::simulate(&config).await.unwrap();

        assert_eq!(sequential.population.len(), snapshot.population.len());
        assert_ne!(sequential.population.as_slice(), snapshot.population.as_slice());
    }

    #[tokio::test]
    async fn fluid_stays_on_screen() {
        let mut config = small_config(600);
        config.preset = Preset::WaterAndLava;
        let summary = fluid_sim::run::simulate(&config).await.unwrap();

        assert!(!summary.population.is_empty());
        for particle in &summary.population {
            let position = particle.position();
            assert!(position.is_finite(), "{particle:?}");
            assert!((0.0..=WIDTH as f32).contains(&position.x), "{particle:?}");
            assert!(position.y <= HEIGHT as f32, "{particle:?}");
        }
    }

    #[tokio::test]
    async fn drain_pulls_the_fluid_towards_the_pointer() {
        let point = Vec2::new(160.0, 150.0);
        let mut config = small_config(300);
        let undisturbed = fluid_sim::run::simulate(&config).await.unwrap();

        config.pointer = vec![PointerEvent::new(
            PointForceKind::Drain,
            point.x,
            point.y,
            (200, 300),
        )];
        let drained = fluid_sim::run::simulate(&config).await.unwrap();

        assert!(
            mean_distance_to(&drained.population, point)
                < mean_distance_to(&undisturbed.population, point)
        );
    }
}

//! Main entrypoint for running the simulation

use clap::Parser as _;
use color_eyre::eyre::Result;
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _, Layer as _};

use fluid::population::Population;

use crate::cli_args::CliArgs;
use crate::config::main::{Config, LogLevel};
use crate::pacer::FramePacer;
use crate::render::metaballs::MetaballRenderer;
use crate::spawner::Spawner;

/// The environment variable for setting custom `RUST_LOG`-style log filters.
const LOG_FILTERS_ENV: &str = "FLUID_LOG";

/// What happened during a run.
#[derive(Debug)]
#[non_exhaustive]
pub struct Summary {
    /// How many frames were simulated
    pub frames: u64,
    /// All the particles as they were after the last frame
    pub population: Population,
    /// How many PNGs were written
    pub frames_written: usize,
    /// Where the PNGs were written, if rendering was enabled
    pub output_directory: Option<std::path::PathBuf>,
    /// Where the logs were written, if logging was enabled
    pub log_path: Option<std::path::PathBuf>,
}

/// Main entrypoint
pub async fn run() -> Result<Summary> {
    let cli_args = CliArgs::parse();
    let config = Config::from_cli_args(&cli_args)?;
    let is_logging = setup_logging(&config)?;

    let mut summary = simulate(&config).await?;
    if is_logging {
        summary.log_path = Some(config.log_path.clone());
    }
    Ok(summary)
}

/// Run the whole simulation: spawn, push, step and draw, once per frame.
pub async fn simulate(config: &Config) -> Result<Summary> {
    let bounds = config.bounds();
    let mut population = Population::new();
    let mut spawner = Spawner::new(config.preset, config.seed)?;
    let mut pacer = FramePacer::new(config.frame_rate, config.realtime);
    let mut maybe_renderer = if config.render.enabled {
        std::fs::create_dir_all(&config.render.output_directory)?;
        Some(MetaballRenderer::new(config))
    } else {
        None
    };

    tracing::debug!(
        "Starting {:?} simulation ({}) for {} frames on a {}x{} screen",
        config.preset,
        config.step_mode,
        config.frames,
        config.width,
        config.height
    );

    let mut frames_written: usize = 0;
    let mut is_drawing = true;
    for frame in 1..=config.frames {
        spawner.spawn(frame, &bounds, &mut population);

        let forces = crate::pointer::active_forces(&config.pointer, frame);
        population.tick(&bounds, &forces, config.step_mode);

        if let Some(renderer) = maybe_renderer.as_mut() {
            if is_drawing && frame % config.render.every == 0 {
                renderer.save(
                    population.as_slice(),
                    &config.render.output_directory,
                    frame,
                )?;
                frames_written += 1;
            }
        }

        is_drawing = pacer.end_frame(frame).await;
    }

    if pacer.overruns() > 0 {
        tracing::warn!(
            "{} of {} frames couldn't keep up with {} FPS",
            pacer.overruns(),
            config.frames,
            config.frame_rate
        );
    }
    tracing::debug!(
        "Simulation finished with {} particles, {frames_written} frames written",
        population.len()
    );

    Ok(Summary {
        frames: config.frames,
        population,
        frames_written,
        output_directory: config
            .render
            .enabled
            .then(|| config.render.output_directory.clone()),
        log_path: None,
    })
}

/// Setup logging to a file. Returns whether logging is enabled.
fn setup_logging(config: &Config) -> Result<bool> {
    let are_log_filters_manually_set = std::env::var(LOG_FILTERS_ENV).is_ok();
    let level_as_string = format!("{:?}", config.log_level).to_lowercase();

    let is_loggable = !matches!(config.log_level, LogLevel::Off) || are_log_filters_manually_set;
    if !is_loggable {
        return Ok(false);
    }

    std::fs::create_dir_all(config.log_directory()?)?;
    let file = std::fs::File::create(&config.log_path)?;

    let filters = if are_log_filters_manually_set {
        if let Ok(user_filters) = std::env::var(LOG_FILTERS_ENV) {
            std::env::set_var("RUST_LOG", user_filters);
        }

        tracing_subscriber::EnvFilter::builder()
            .with_default_directive("error".parse()?)
            .from_env_lossy()
    } else {
        tracing_subscriber::EnvFilter::builder()
            .with_default_directive("off".parse()?)
            .from_env_lossy()
            .add_directive(format!("fluid={level_as_string}").parse()?)
            .add_directive(format!("fluid_sim={level_as_string}").parse()?)
    };

    let logfile_layer = tracing_subscriber::fmt::layer()
        .with_writer(file)
        .with_ansi(false)
        .with_filter(filters);
    tracing_subscriber::registry().with(logfile_layer).init();

    Ok(true)
}

//! All the CLI arguments

use fluid::population::StepMode;

use crate::config::main::LogLevel;
use crate::presets::Preset;

/// A 2D particle fluid rendered as metaballs
#[derive(clap::Parser, Debug, Clone, Default)]
#[command(
    version,
    about,
    long_about = "Pour particle fluids into a box, poke them with a scripted pointer and write the \
                  metaball frames out as PNGs. Every argument overrides its config file setting."
)]
#[non_exhaustive]
pub struct CliArgs {
    /// Path to a TOML config file. The built-in defaults are used when not given.
    #[arg(short, long)]
    pub config: Option<std::path::PathBuf>,

    /// Which fluids to pour in.
    #[arg(short, long, value_enum)]
    pub preset: Option<Preset>,

    /// How many frames to simulate.
    #[arg(short, long)]
    pub frames: Option<u64>,

    /// How particles see each other during a frame: "sequential" or "snapshot".
    #[arg(long)]
    pub step_mode: Option<StepMode>,

    /// Seed for the random spawn velocities.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Where to write the rendered frames.
    #[arg(short, long)]
    pub output_directory: Option<std::path::PathBuf>,

    /// Don't render any frames, just simulate.
    #[arg(long)]
    pub no_render: bool,

    /// Pace the simulation to the configured frame rate.
    #[arg(long)]
    pub realtime: bool,

    /// Override the log level from the config file.
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Override the log path from the config file.
    #[arg(long)]
    pub log_path: Option<std::path::PathBuf>,
}

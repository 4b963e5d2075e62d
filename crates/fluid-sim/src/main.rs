//! Just `main()`. Keep as small as possible.

use color_eyre::eyre::Result;

#[expect(
    clippy::print_stdout,
    clippy::print_stderr,
    reason = "It's our central place for communicating with the user on CLI"
)]
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let result = fluid_sim::run::run().await;
    tracing::debug!("Exiting");

    match result {
        Ok(summary) => {
            println!(
                "Simulated {} frames, {} particles, {} frames written",
                summary.frames,
                summary.population.len(),
                summary.frames_written
            );
            if let Some(output_directory) = summary.output_directory {
                println!("Frames saved to {}", output_directory.display());
            }
            if let Some(log_path) = summary.log_path {
                println!("Logs saved to {}", log_path.display());
            }
        }
        Err(error) => {
            tracing::error!("{error:?}");
            eprintln!("Error: {error:?}");
            #[expect(clippy::exit, reason = "This is a valid exit point.")]
            std::process::exit(1);
        }
    }

    Ok(())
}

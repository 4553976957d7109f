use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use paint_squares::cli::{Cli, Commands, GenerateArgs};
use paint_squares::compile::{compile_project, write_all_tracks};
use paint_squares::config::GridConfig;
use paint_squares::experiment::Driver;
use paint_squares::io;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let verbose = match &cli.command {
        Commands::Generate(args) => args.verbose,
        Commands::Compile(args) => args.verbose,
    };
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    match cli.command {
        Commands::Generate(args) => run_generate(args)?,
        Commands::Compile(args) => {
            let report = compile_project(&args.project)?;
            print!("{}", io::summary::format_compile_summary(&report));
        }
    }

    Ok(())
}

fn run_generate(args: GenerateArgs) -> Result<()> {
    let base = match &args.config {
        Some(path) => GridConfig::load_json(path)?,
        None => GridConfig::default(),
    };
    let config = args.apply(base);
    config.validate()?;
    tracing::info!(
        grid_size = config.grid_size,
        min_tracks = config.min_tracks_for_decay,
        min_r_squared = config.min_r_squared,
        neighbour_mode = config.neighbour_mode.as_str(),
        "parameters"
    );

    let driver = Driver::new(config);
    let reports = match (&args.project, &args.experiment) {
        (Some(project), None) => driver.process_project(project)?,
        (None, Some(experiment)) => vec![driver.process_experiment(experiment)?],
        _ => anyhow::bail!("exactly one of --project or --experiment is required"),
    };
    print!("{}", io::summary::format_generate_summary(&reports));
    if let (true, Some(project)) = (args.all_tracks, &args.project) {
        let path = write_all_tracks(project)?;
        println!("All tracks written to {}", path.display());
    }
    Ok(())
}

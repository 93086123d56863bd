use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use maskworld::{Sandbox, SandboxConfig};

#[derive(Debug, Parser)]
#[command(author, version, about = "Headless wandering-balls sandbox")]
struct Cli {
    /// Path to the sandbox YAML file (built-in arena when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override frame count
    #[arg(long)]
    frames: Option<u64>,

    /// Override number of spawned entities
    #[arg(long)]
    entities: Option<usize>,

    /// Override the random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override the simulated seconds per frame
    #[arg(long)]
    frame_seconds: Option<f64>,

    /// Print the final frame
    #[arg(long)]
    render: bool,

    /// Print the run report as JSON
    #[arg(long)]
    json: bool,
}

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => SandboxConfig::from_yaml(path)?,
        None => SandboxConfig::arena(),
    };
    init_tracing(&config.logging.level);

    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    if let Some(entities) = cli.entities {
        config.entities = entities;
    }
    if let Some(frame_seconds) = cli.frame_seconds {
        config.frame_seconds = frame_seconds;
    }
    let frames = cli.frames.unwrap_or(config.frames);

    let mut sandbox = Sandbox::new(config)?;
    let report = sandbox.run(frames);

    if cli.render {
        println!("{}", sandbox.render());
    }
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "Scenario '{}' completed for {} frames ({:.2}s). Entities: {}, wall bounces: {}",
            report.scenario, report.frames, report.elapsed_seconds, report.entities, report.bounces
        );
    }
    Ok(())
}

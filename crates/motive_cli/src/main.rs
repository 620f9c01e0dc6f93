//! Motive CLI
//!
//! Inspect easing curves and replay recorded pointer traces against the
//! motion engine.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use motive_animation::Easing;
use motive_core::MotionConfig;
use motive_touch::MotionContext;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod trace;

use trace::Trace;

#[derive(Parser)]
#[command(name = "motive")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Motive motion engine tools", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sample an easing curve
    Easing {
        /// Curve text, e.g. "cubic-bezier(.25,.1,.25,1)"
        curve: String,

        /// Number of intervals to sample
        #[arg(short, long, default_value = "10")]
        samples: usize,
    },

    /// Replay a pointer trace against a virtual scrollable
    Replay {
        /// Trace file (TOML)
        trace: PathBuf,

        /// Motion configuration file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print the default motion configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::Easing { curve, samples } => cmd_easing(&curve, samples),
        Commands::Replay { trace, config } => cmd_replay(&trace, config.as_deref()),
        Commands::Config => cmd_config(),
    }
}

fn cmd_easing(curve: &str, samples: usize) -> Result<()> {
    if samples == 0 {
        anyhow::bail!("At least one sample interval is required");
    }
    let easing = Easing::try_parse(curve)
        .with_context(|| format!("Invalid easing curve '{}'", curve))?;

    info!("Sampling {}", easing);
    for i in 0..=samples {
        let t = i as f32 / samples as f32;
        println!("{:.4} {:.6}", t, easing.calc(t));
    }

    let bounds = easing.bounds();
    println!(
        "# time [{}, {}] value [{}, {}]",
        bounds.min_time, bounds.max_time, bounds.min_value, bounds.max_value
    );
    Ok(())
}

fn cmd_replay(path: &Path, config: Option<&Path>) -> Result<()> {
    let config = match config {
        Some(config) => MotionConfig::from_file(config)
            .with_context(|| format!("Failed to load config {}", config.display()))?,
        None => MotionConfig::default(),
    };
    let trace = Trace::load(path)?;

    info!(
        "Replaying {} events over a {}x{} scrollable",
        trace.events.len(),
        trace.viewport,
        trace.content
    );

    let context = MotionContext::new(config);
    for frame in trace::replay(&context, &trace) {
        println!(
            "{} {:.3}{}",
            frame.time,
            frame.position,
            if frame.triggered { " *" } else { "" }
        );
    }
    context.terminate();
    Ok(())
}

fn cmd_config() -> Result<()> {
    let text = MotionConfig::default()
        .to_toml_string()
        .context("Failed to serialize configuration")?;
    print!("{}", text);
    Ok(())
}

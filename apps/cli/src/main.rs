use std::{fs, path::PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use shared::{
    catalog,
    domain::Stage,
    protocol::{SequencerEvent, SimulatorCommand},
};
use simulator_core::{Simulator, SimulatorOptions};
use tokio_stream::{wrappers::BroadcastStream, StreamExt};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod render;
mod repl;

use config::{load_settings, OutputFormat, Settings};

#[derive(Parser, Debug)]
#[command(
    name = "mrsim",
    about = "Step through split, map, shuffle and reduce on a small text input"
)]
struct Cli {
    /// Config file (defaults to ./mrsim.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Auto-play step interval in milliseconds
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    interval_ms: Option<u64>,
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Default)]
struct InputArgs {
    /// Built-in preset id
    #[arg(long, conflicts_with_all = ["file", "text"])]
    preset: Option<String>,
    /// Read the input text from a file
    #[arg(long, conflicts_with = "text")]
    file: Option<PathBuf>,
    /// Literal input text
    #[arg(long)]
    text: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every stage (or one) for the input
    Run {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
        #[arg(long)]
        stage: Option<Stage>,
    },
    /// Auto-play from input to output, printing each stage as it is reached
    Play {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
    },
    /// Interactive session on stdin
    Repl {
        #[command(flatten)]
        input: InputArgs,
        /// One JSON command per line in, one JSON object per line out
        #[arg(long)]
        json: bool,
    },
    /// List the built-in presets
    Presets,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut settings = load_settings(cli.config.as_deref())?;
    if let Some(interval_ms) = cli.interval_ms {
        settings.autoplay_interval_ms = interval_ms;
    }

    match cli.command {
        Command::Run {
            input,
            format,
            stage,
        } => {
            let sim = build_simulator(&settings, &input)?;
            run_once(sim, format.unwrap_or(settings.format), stage).await?;
        }
        Command::Play { input, format } => {
            let sim = build_simulator(&settings, &input)?;
            play(sim, format.unwrap_or(settings.format)).await?;
        }
        Command::Repl { input, json } => {
            let sim = build_simulator(&settings, &input)?;
            repl::run(sim, json).await?;
        }
        Command::Presets => {
            print!("{}", render::presets(&catalog::presets(), None));
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_simulator(settings: &Settings, input: &InputArgs) -> Result<Simulator> {
    let text = resolve_input(settings, input)?;
    Ok(Simulator::new(SimulatorOptions {
        autoplay_interval: settings.autoplay_interval(),
        input: text,
    }))
}

fn resolve_input(settings: &Settings, input: &InputArgs) -> Result<String> {
    if let Some(text) = &input.text {
        return Ok(text.clone());
    }
    if let Some(path) = &input.file {
        return fs::read_to_string(path)
            .with_context(|| format!("failed to read input file '{}'", path.display()));
    }
    let preset_id = input.preset.as_deref().unwrap_or(&settings.default_preset);
    catalog::find_preset(preset_id)
        .map(|preset| preset.data)
        .ok_or_else(|| anyhow!("unknown preset '{preset_id}' (see `mrsim presets`)"))
}

async fn run_once(mut sim: Simulator, format: OutputFormat, only: Option<Stage>) -> Result<()> {
    let stages: Vec<Stage> = match only {
        Some(stage) => vec![stage],
        None => Stage::ALL.to_vec(),
    };

    match format {
        OutputFormat::Text => {
            let output = sim.pipeline();
            for stage in stages {
                println!("{}", render::stage(&output, stage));
            }
        }
        OutputFormat::Json => {
            if let Some(stage) = only {
                sim.apply(SimulatorCommand::JumpTo { stage }).await?;
            }
            println!("{}", serde_json::to_string_pretty(&sim.snapshot().await)?);
        }
    }
    Ok(())
}

async fn play(mut sim: Simulator, format: OutputFormat) -> Result<()> {
    let mut events = BroadcastStream::new(sim.subscribe());
    let interval = sim.sequencer().interval();
    print_stage(&mut sim, format).await?;

    if !sim.toggle_auto_play().await {
        return Ok(());
    }
    info!(interval_ms = interval.as_millis() as u64, "playing");

    loop {
        tokio::select! {
            event = events.next() => {
                let Some(event) = event else {
                    break;
                };
                let event = match event {
                    Ok(event) => event,
                    Err(err) => {
                        warn!(%err, "missed sequencer events");
                        continue;
                    }
                };
                if format == OutputFormat::Json {
                    println!("{}", serde_json::to_string(&event)?);
                }
                match event {
                    SequencerEvent::StageChanged { .. } => {
                        if format == OutputFormat::Text {
                            print_stage(&mut sim, format).await?;
                        }
                    }
                    SequencerEvent::AutoPlayChanged { enabled: false } => break,
                    SequencerEvent::AutoPlayChanged { enabled: true } => {}
                }
            }
            _ = tokio::signal::ctrl_c() => {
                sim.sequencer().stop_auto_play().await;
                info!("interrupted");
                break;
            }
        }
    }

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string(&sim.snapshot().await)?);
    }
    Ok(())
}

async fn print_stage(sim: &mut Simulator, format: OutputFormat) -> Result<()> {
    let stage = sim.sequencer().current().await;
    match format {
        OutputFormat::Text => {
            let output = sim.pipeline();
            println!("{}", render::stepper(stage));
            println!("{}", render::stage(&output, stage));
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string(&sim.snapshot().await)?);
        }
    }
    Ok(())
}

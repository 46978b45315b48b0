//! Line-oriented command loop over stdin.

use anyhow::{Context, Result};
use shared::{
    catalog,
    domain::{Module, Stage},
    protocol::{SequencerEvent, SimulatorCommand, Transition},
};
use simulator_core::Simulator;
use thiserror::Error;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::error::RecvError,
};
use tracing::warn;

use crate::render;

pub const HELP: &str = "\
commands:
  next | n              advance one stage
  prev | p              go back one stage
  reset | r             back to input, stop auto-play
  jump <stage>          jump to a stage by name or 1-6
  play                  toggle auto-play
  module <name>         hdfs, mapreduce, yarn, hbase, hive
  preset <id>           load a preset (see `presets`)
  presets               list presets
  input <text>          replace the input; use \\n for line breaks
  show                  print the current stage
  help                  this text
  quit | q              exit";

#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    Simulator(SimulatorCommand),
    ListPresets,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseCommandError {
    #[error("unknown command '{0}' (try `help`)")]
    Unknown(String),
    #[error("`{0}` needs an argument")]
    MissingArgument(&'static str),
    #[error(transparent)]
    Stage(#[from] shared::error::ParseStageError),
    #[error(transparent)]
    Module(#[from] shared::error::ParseModuleError),
}

pub fn parse_command(line: &str) -> Result<Option<ReplCommand>, ParseCommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let argument = |name: &'static str| {
        if rest.is_empty() {
            Err(ParseCommandError::MissingArgument(name))
        } else {
            Ok(rest)
        }
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "next" | "n" => SimulatorCommand::Next,
        "prev" | "previous" | "p" => SimulatorCommand::Previous,
        "reset" | "r" => SimulatorCommand::Reset,
        "jump" | "j" => SimulatorCommand::JumpTo {
            stage: argument("jump")?.parse::<Stage>()?,
        },
        "play" | "pause" => SimulatorCommand::ToggleAutoPlay,
        "module" | "m" => SimulatorCommand::SelectModule {
            module: argument("module")?.parse::<Module>()?,
        },
        "preset" => SimulatorCommand::SelectPreset {
            preset_id: argument("preset")?.to_owned(),
        },
        "input" => SimulatorCommand::SetInput {
            text: unescape_newlines(rest),
        },
        "show" | "s" => SimulatorCommand::Show,
        "presets" => return Ok(Some(ReplCommand::ListPresets)),
        "help" | "h" | "?" => return Ok(Some(ReplCommand::Help)),
        "quit" | "exit" | "q" => return Ok(Some(ReplCommand::Quit)),
        other => return Err(ParseCommandError::Unknown(other.to_owned())),
    };
    Ok(Some(ReplCommand::Simulator(command)))
}

fn unescape_newlines(raw: &str) -> String {
    raw.replace("\\n", "\n")
}

/// Runs until `quit` or end of input.
///
/// In JSON mode every line is a `SimulatorCommand` and every response, as
/// well as every sequencer event, is one JSON object per line.
pub async fn run(mut sim: Simulator, json: bool) -> Result<()> {
    let mut events = sim.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    if !json {
        println!("{HELP}\n");
        print_snapshot(&mut sim).await;
    }

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                let keep_going = if json {
                    handle_json_line(&mut sim, &line).await?
                } else {
                    handle_text_line(&mut sim, &line).await
                };
                if !keep_going {
                    break;
                }
            }
            event = events.recv() => match event {
                Ok(event) => report_event(&mut sim, event, json).await?,
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "event stream lagged"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    sim.sequencer().stop_auto_play().await;
    Ok(())
}

async fn handle_text_line(sim: &mut Simulator, line: &str) -> bool {
    match parse_command(line) {
        Ok(None) => {}
        Ok(Some(ReplCommand::Quit)) => return false,
        Ok(Some(ReplCommand::Help)) => println!("{HELP}"),
        Ok(Some(ReplCommand::ListPresets)) => {
            let active = sim.active_preset().map(|preset| preset.id);
            print!("{}", render::presets(&catalog::presets(), active.as_deref()));
        }
        Ok(Some(ReplCommand::Simulator(command))) => {
            // Auto-play ticks are reported through the event stream.
            let quiet = matches!(command, SimulatorCommand::ToggleAutoPlay);
            match sim.apply(command).await {
                Ok(snapshot) if quiet => {
                    let state = if snapshot.auto_play { "on" } else { "off" };
                    println!("auto-play {state}");
                }
                Ok(_) => print_snapshot(sim).await,
                Err(err) => println!("error: {err}"),
            }
        }
        Err(err) => println!("error: {err}"),
    }
    true
}

async fn handle_json_line(sim: &mut Simulator, line: &str) -> Result<bool> {
    if line.trim().is_empty() {
        return Ok(true);
    }
    let response = match serde_json::from_str::<SimulatorCommand>(line) {
        Ok(command) => match sim.apply(command).await {
            Ok(snapshot) => serde_json::json!({ "snapshot": snapshot }),
            Err(err) => serde_json::json!({ "error": err.to_string() }),
        },
        Err(err) => serde_json::json!({ "error": format!("invalid command: {err}") }),
    };
    println!("{}", serde_json::to_string(&response)?);
    Ok(true)
}

async fn report_event(sim: &mut Simulator, event: SequencerEvent, json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string(&serde_json::json!({ "event": event }))?
        );
        return Ok(());
    }
    // The final tick already carries the cleared flag in its snapshot.
    if let SequencerEvent::StageChanged {
        cause: Transition::Tick,
        ..
    } = event
    {
        print_snapshot(sim).await;
    }
    Ok(())
}

async fn print_snapshot(sim: &mut Simulator) {
    let snapshot = sim.snapshot().await;
    let output = sim.pipeline();
    print!("{}", render::snapshot(&snapshot, &output));
}

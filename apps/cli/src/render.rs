//! Plain-text rendering of stages for the terminal.

use std::fmt::Write as _;

use pipeline::{PipelineOutput, StageData};
use shared::{
    domain::{Module, Preset, Stage},
    protocol::Snapshot,
};

pub fn stepper(current: Stage) -> String {
    Stage::ALL
        .iter()
        .map(|stage| {
            let label = format!("{}. {}", stage.index() + 1, stage.title());
            if *stage == current {
                format!("[{label}]")
            } else {
                label
            }
        })
        .collect::<Vec<_>>()
        .join("  ")
}

pub fn stage_header(stage: Stage) -> String {
    format!(
        "== {}/{} {}: {}",
        stage.index() + 1,
        Stage::ALL.len(),
        stage.title(),
        stage.description()
    )
}

pub fn stage_body(output: &PipelineOutput, stage: Stage) -> String {
    let mut out = String::new();
    match output.for_stage(stage) {
        StageData::Text(text) => {
            for line in text.lines() {
                let _ = writeln!(out, "  | {line}");
            }
        }
        StageData::Lines(lines) => {
            for (idx, line) in lines.iter().enumerate() {
                let _ = writeln!(out, "  split {:>2}: {line}", idx + 1);
            }
        }
        StageData::Records(records) if stage == Stage::Map => {
            for record in records {
                let _ = writeln!(out, "  ({}, {})", record.key, record.value);
            }
        }
        StageData::Records(records) => {
            for record in records {
                let _ = writeln!(out, "  {} = {}", record.key, record.value);
            }
        }
        StageData::Groups(groups) => {
            for group in groups {
                let values: Vec<String> =
                    group.values.iter().map(|r| r.value.to_string()).collect();
                let _ = writeln!(out, "  {} -> [{}]", group.key, values.join(", "));
            }
        }
    }
    if out.is_empty() {
        out.push_str("  (empty)\n");
    }
    out
}

pub fn stage(output: &PipelineOutput, stage: Stage) -> String {
    format!("{}\n{}", stage_header(stage), stage_body(output, stage))
}

pub fn snapshot(snapshot: &Snapshot, output: &PipelineOutput) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "module: {}  auto-play: {}",
        snapshot.module,
        if snapshot.auto_play { "on" } else { "off" }
    );
    if snapshot.module.drives_pipeline() {
        let _ = writeln!(out, "{}", stepper(snapshot.stage));
        out.push_str(&stage(output, snapshot.stage));
    } else {
        out.push_str(&module_summary(snapshot.module));
    }
    out
}

pub fn module_summary(module: Module) -> String {
    format!("== {}\n  {}\n", module.title(), module.description())
}

pub fn presets(presets: &[Preset], active: Option<&str>) -> String {
    let mut out = String::new();
    for preset in presets {
        let marker = if Some(preset.id.as_str()) == active { "*" } else { " " };
        let _ = writeln!(out, "{marker} {:<12} {}: {}", preset.id, preset.name, preset.description);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stepper_marks_current_stage() {
        let line = stepper(Stage::Map);
        assert!(line.contains("[3. Mapping]"));
        assert!(line.contains("1. Input Data"));
    }

    #[test]
    fn renders_each_stage_shape() {
        let output = pipeline::run("North 100\nSouth 200\nNorth 150");
        assert!(stage_body(&output, Stage::Input).contains("| North 100"));
        assert!(stage_body(&output, Stage::Split).contains("split  2: South 200"));
        assert!(stage_body(&output, Stage::Map).contains("(North, 100)"));
        assert!(stage_body(&output, Stage::Shuffle).contains("North -> [100, 150]"));
        assert!(stage_body(&output, Stage::Output).contains("North = 250"));
    }

    #[test]
    fn empty_input_is_labelled() {
        let output = pipeline::run("");
        assert_eq!(stage_body(&output, Stage::Reduce), "  (empty)\n");
    }

    #[test]
    fn preset_listing_marks_active() {
        let listing = presets(&shared::catalog::presets(), Some("sales-agg"));
        assert!(listing.lines().any(|l| l.starts_with("* sales-agg")));
        assert!(listing.lines().any(|l| l.starts_with("  word-count")));
    }
}

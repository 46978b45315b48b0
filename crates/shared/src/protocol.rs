use serde::{Deserialize, Serialize};

use crate::domain::{Group, Line, Module, Record, Stage};

/// Commands accepted from the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum SimulatorCommand {
    Next,
    Previous,
    Reset,
    JumpTo { stage: Stage },
    ToggleAutoPlay,
    SelectModule { module: Module },
    SelectPreset { preset_id: String },
    SetInput { text: String },
    Show,
}

/// What moved the current stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    Next,
    Previous,
    JumpTo,
    Reset,
    Tick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum SequencerEvent {
    StageChanged {
        from: Stage,
        to: Stage,
        cause: Transition,
    },
    AutoPlayChanged {
        enabled: bool,
    },
}

/// Everything the renderer needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub module: Module,
    pub stage: Stage,
    pub auto_play: bool,
    pub input: String,
    pub lines: Vec<Line>,
    pub mapped: Vec<Record>,
    pub groups: Vec<Group>,
    pub reduced: Vec<Record>,
}

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ParseModuleError, ParseStageError};

/// Opaque identity handed to the renderer. Carries no meaning for the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub Uuid);

impl RecordId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A trimmed, non-blank input line produced by the split stage.
pub type Line = String;

/// Key/value pair flowing through map, shuffle and reduce.
///
/// Equality looks at `key` and `value` only; two runs over the same text
/// compare equal even though every `id` is regenerated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub key: String,
    /// Always finite after map. A reduced total can overflow to infinity,
    /// which JSON encodes as `null` and cannot decode back into a record.
    pub value: f64,
    pub id: RecordId,
}

impl Record {
    pub fn new(key: impl Into<String>, value: f64) -> Self {
        Self {
            key: key.into(),
            value,
            id: RecordId::generate(),
        }
    }

    pub fn pair(&self) -> (&str, f64) {
        (&self.key, self.value)
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.value == other.value
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub key: String,
    pub values: Vec<Record>,
}

impl Group {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.values.iter().map(|record| record.value).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Input,
    Split,
    Map,
    Shuffle,
    Reduce,
    Output,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::Input,
        Stage::Split,
        Stage::Map,
        Stage::Shuffle,
        Stage::Reduce,
        Stage::Output,
    ];

    pub const INITIAL: Stage = Stage::Input;
    pub const TERMINAL: Stage = Stage::Output;

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// The following stage, or `None` at `Output`.
    pub fn next(self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }

    /// The preceding stage, or `None` at `Input`.
    pub fn previous(self) -> Option<Self> {
        self.index().checked_sub(1).and_then(Self::from_index)
    }

    pub fn is_initial(self) -> bool {
        self == Self::INITIAL
    }

    pub fn is_terminal(self) -> bool {
        self == Self::TERMINAL
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Split => "split",
            Self::Map => "map",
            Self::Shuffle => "shuffle",
            Self::Reduce => "reduce",
            Self::Output => "output",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Input => "Input Data",
            Self::Split => "Splitting",
            Self::Map => "Mapping",
            Self::Shuffle => "Shuffling",
            Self::Reduce => "Reducing",
            Self::Output => "Final Output",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Input => {
                "Raw data ingestion. In a real cluster, this is typically a large file stored in HDFS."
            }
            Self::Split => {
                "Input data is split into fixed-size blocks (InputSplits) for parallel processing."
            }
            Self::Map => "Mappers parse data and emit <Key, Value> pairs.",
            Self::Shuffle => {
                "System sorts and groups the Mapper outputs by Key, transferring them to Reducers."
            }
            Self::Reduce => "Reducers aggregate the list of values for each unique Key.",
            Self::Output => {
                "The processed results are written back to the storage system (e.g., HDFS)."
            }
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts stage names in any case, or a 1-based position as shown in the stepper.
impl FromStr for Stage {
    type Err = ParseStageError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if let Ok(position) = trimmed.parse::<usize>() {
            return position
                .checked_sub(1)
                .and_then(Self::from_index)
                .ok_or_else(|| ParseStageError::new(raw));
        }
        Self::ALL
            .into_iter()
            .find(|stage| stage.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ParseStageError::new(raw))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Module {
    Hdfs,
    #[default]
    MapReduce,
    Yarn,
    HBase,
    Hive,
}

impl Module {
    pub const ALL: [Module; 5] = [
        Module::Hdfs,
        Module::MapReduce,
        Module::Yarn,
        Module::HBase,
        Module::Hive,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hdfs => "hdfs",
            Self::MapReduce => "map_reduce",
            Self::Yarn => "yarn",
            Self::HBase => "hbase",
            Self::Hive => "hive",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Hdfs => "HDFS",
            Self::MapReduce => "MapReduce",
            Self::Yarn => "YARN",
            Self::HBase => "HBase",
            Self::Hive => "Hive",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Hdfs => "HDFS (Hadoop Distributed File System)",
            Self::MapReduce => "MapReduce",
            Self::Yarn => "YARN (Yet Another Resource Negotiator)",
            Self::HBase => "HBase",
            Self::Hive => "Hive",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Hdfs => {
                "Distributed file system that cuts large files into blocks and stores replicas across nodes for fault tolerance."
            }
            Self::MapReduce => {
                "Distributed computation framework that processes data in a Map phase and a Reduce phase."
            }
            Self::Yarn => {
                "Resource management layer that schedules cluster resources for applications running on Hadoop."
            }
            Self::HBase => {
                "Distributed, column-oriented NoSQL store built on HDFS for random real-time reads and writes."
            }
            Self::Hive => {
                "Data warehouse layer that maps structured files to tables and compiles SQL into MapReduce jobs."
            }
        }
    }

    /// Only the MapReduce view runs the pipeline, so only it takes edits.
    pub fn accepts_input(self) -> bool {
        self == Self::MapReduce
    }

    pub fn shows_presets(self) -> bool {
        matches!(self, Self::MapReduce | Self::Hive)
    }

    pub fn drives_pipeline(self) -> bool {
        self == Self::MapReduce
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Module {
    type Err = ParseModuleError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized: String = raw
            .trim()
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect();
        Self::ALL
            .into_iter()
            .find(|module| module.label().eq_ignore_ascii_case(&normalized))
            .ok_or_else(|| ParseModuleError::new(raw))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preset {
    pub id: String,
    pub name: String,
    pub description: String,
    pub data: String,
}

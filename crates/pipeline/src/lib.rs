//! Split, map, shuffle and reduce over an in-memory text input.
//!
//! Every stage is a pure function of the previous stage's output, so the
//! whole chain can be recomputed from the raw text at any time. Only the
//! opaque [`RecordId`](shared::domain::RecordId)s differ between runs.

use std::{collections::BTreeMap, sync::Arc};

use serde::Serialize;
use shared::domain::{Group, Line, Record, Stage};
use tracing::debug;

/// How a single line is turned into records. Chosen per line, so one input
/// may mix both shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum MapMode {
    /// `"<key tokens...> <number>"`: one record carrying the number.
    KeyValue { key: String, value: f64 },
    /// Any other line: one record with value 1 per token.
    Words(Vec<String>),
}

pub fn split(text: &str) -> Vec<Line> {
    text.split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Decides the map shape for one line.
///
/// The key/value shape needs at least two tokens, so a line holding a single
/// number such as `"42"` is a one-word line, not a value without a key.
pub fn classify_line(line: &str) -> MapMode {
    let mut tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() >= 2 {
        if let Some(value) = tokens.last().and_then(|last| parse_value(last)) {
            tokens.pop();
            return MapMode::KeyValue {
                key: tokens.join(" "),
                value,
            };
        }
    }
    MapMode::Words(tokens.into_iter().map(str::to_owned).collect())
}

/// Strict decimal parse. `NaN` and the infinities are left to the word branch.
///
/// This is narrower than a JavaScript `Number()` reading of the token:
/// `Infinity`, hex such as `0x10`, and out-of-range literals such as `1e400`
/// do not count as values here.
fn parse_value(token: &str) -> Option<f64> {
    token.parse::<f64>().ok().filter(|value| value.is_finite())
}

pub fn map<S: AsRef<str>>(lines: &[S]) -> Vec<Record> {
    let mut mapped = Vec::new();
    for line in lines {
        match classify_line(line.as_ref()) {
            MapMode::KeyValue { key, value } => mapped.push(Record::new(key, value)),
            MapMode::Words(words) => {
                mapped.extend(words.into_iter().map(|word| Record::new(word, 1.0)));
            }
        }
    }
    mapped
}

/// Groups records by exact key. Groups come out in ascending ordinal key
/// order; records keep their map order inside each group.
pub fn shuffle(records: &[Record]) -> Vec<Group> {
    let mut buckets: BTreeMap<&str, Vec<Record>> = BTreeMap::new();
    for record in records {
        buckets
            .entry(record.key.as_str())
            .or_default()
            .push(record.clone());
    }
    buckets
        .into_iter()
        .map(|(key, values)| Group {
            key: key.to_owned(),
            values,
        })
        .collect()
}

pub fn reduce(groups: &[Group]) -> Vec<Record> {
    groups
        .iter()
        .map(|group| Record::new(group.key.clone(), group.total()))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineOutput {
    pub input: String,
    pub lines: Vec<Line>,
    pub mapped: Vec<Record>,
    pub groups: Vec<Group>,
    pub reduced: Vec<Record>,
}

/// The collection a stage puts on screen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "items", rename_all = "snake_case")]
pub enum StageData<'a> {
    Text(&'a str),
    Lines(&'a [Line]),
    Records(&'a [Record]),
    Groups(&'a [Group]),
}

impl PipelineOutput {
    pub fn for_stage(&self, stage: Stage) -> StageData<'_> {
        match stage {
            Stage::Input => StageData::Text(&self.input),
            Stage::Split => StageData::Lines(&self.lines),
            Stage::Map => StageData::Records(&self.mapped),
            Stage::Shuffle => StageData::Groups(&self.groups),
            Stage::Reduce | Stage::Output => StageData::Records(&self.reduced),
        }
    }
}

pub fn run(text: &str) -> PipelineOutput {
    let lines = split(text);
    let mapped = map(&lines);
    let groups = shuffle(&mapped);
    let reduced = reduce(&groups);
    debug!(
        lines = lines.len(),
        records = mapped.len(),
        groups = groups.len(),
        "pipeline run complete"
    );
    PipelineOutput {
        input: text.to_owned(),
        lines,
        mapped,
        groups,
        reduced,
    }
}

/// Keeps the output of the last run and reuses it while the text is unchanged.
#[derive(Debug, Default)]
pub struct PipelineCache {
    last: Option<Arc<PipelineOutput>>,
}

impl PipelineCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, text: &str) -> Arc<PipelineOutput> {
        if let Some(last) = &self.last {
            if last.input == text {
                debug!("pipeline cache hit");
                return Arc::clone(last);
            }
        }
        debug!(bytes = text.len(), "pipeline cache miss; recomputing");
        let output = Arc::new(run(text));
        self.last = Some(Arc::clone(&output));
        output
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

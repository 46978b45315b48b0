//! Session state behind the presentation layer: the active module, the input
//! text, the memoized pipeline and the stage sequencer.

use std::{sync::Arc, time::Duration};

use pipeline::{PipelineCache, PipelineOutput};
use sequencer::{Sequencer, DEFAULT_AUTOPLAY_INTERVAL};
use shared::{
    catalog,
    domain::{Module, Preset, Stage},
    protocol::{SequencerEvent, SimulatorCommand, Snapshot},
};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimulatorError {
    #[error("unknown preset '{0}'")]
    UnknownPreset(String),
    #[error("the {0} view does not accept input edits")]
    InputLocked(Module),
    #[error("the {0} view has no presets")]
    PresetsUnavailable(Module),
}

#[derive(Debug, Clone)]
pub struct SimulatorOptions {
    pub autoplay_interval: Duration,
    pub input: String,
}

impl Default for SimulatorOptions {
    fn default() -> Self {
        Self {
            autoplay_interval: DEFAULT_AUTOPLAY_INTERVAL,
            input: catalog::default_preset().data,
        }
    }
}

pub struct Simulator {
    module: Module,
    input: String,
    cache: PipelineCache,
    sequencer: Sequencer,
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new(SimulatorOptions::default())
    }
}

impl Simulator {
    pub fn new(options: SimulatorOptions) -> Self {
        Self {
            module: Module::MapReduce,
            input: options.input,
            cache: PipelineCache::new(),
            sequencer: Sequencer::new(options.autoplay_interval),
        }
    }

    pub fn module(&self) -> Module {
        self.module
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SequencerEvent> {
        self.sequencer.subscribe()
    }

    /// The preset whose body matches the current text, if any.
    pub fn active_preset(&self) -> Option<Preset> {
        catalog::presets()
            .into_iter()
            .find(|preset| preset.data == self.input)
    }

    pub fn pipeline(&mut self) -> Arc<PipelineOutput> {
        self.cache.get(&self.input)
    }

    pub fn set_input(&mut self, text: impl Into<String>) -> Result<(), SimulatorError> {
        if !self.module.accepts_input() {
            return Err(SimulatorError::InputLocked(self.module));
        }
        self.input = text.into();
        Ok(())
    }

    /// Loads a preset body and rewinds to `Input`.
    pub async fn select_preset(&mut self, preset_id: &str) -> Result<(), SimulatorError> {
        if !self.module.shows_presets() {
            return Err(SimulatorError::PresetsUnavailable(self.module));
        }
        let preset = catalog::find_preset(preset_id)
            .ok_or_else(|| SimulatorError::UnknownPreset(preset_id.to_owned()))?;
        info!(preset = %preset.id, "preset selected");
        self.input = preset.data;
        self.sequencer.reset().await;
        Ok(())
    }

    /// Switching views always turns auto-play off.
    pub async fn select_module(&mut self, module: Module) {
        self.sequencer.stop_auto_play().await;
        if self.module != module {
            info!(from = %self.module, to = %module, "module switched");
            self.module = module;
        }
    }

    pub async fn next(&self) -> Stage {
        self.sequencer.next().await
    }

    pub async fn previous(&self) -> Stage {
        self.sequencer.previous().await
    }

    pub async fn reset(&self) -> Stage {
        self.sequencer.reset().await
    }

    pub async fn jump_to(&self, stage: Stage) -> Stage {
        self.sequencer.jump_to(stage).await
    }

    /// Auto-play only runs in the MapReduce view; elsewhere this stays off.
    pub async fn toggle_auto_play(&self) -> bool {
        if !self.module.drives_pipeline() {
            return false;
        }
        self.sequencer.toggle_auto_play().await
    }

    pub async fn apply(&mut self, command: SimulatorCommand) -> Result<Snapshot, SimulatorError> {
        match command {
            SimulatorCommand::Next => {
                self.next().await;
            }
            SimulatorCommand::Previous => {
                self.previous().await;
            }
            SimulatorCommand::Reset => {
                self.reset().await;
            }
            SimulatorCommand::JumpTo { stage } => {
                self.jump_to(stage).await;
            }
            SimulatorCommand::ToggleAutoPlay => {
                self.toggle_auto_play().await;
            }
            SimulatorCommand::SelectModule { module } => self.select_module(module).await,
            SimulatorCommand::SelectPreset { preset_id } => self.select_preset(&preset_id).await?,
            SimulatorCommand::SetInput { text } => self.set_input(text)?,
            SimulatorCommand::Show => {}
        }
        Ok(self.snapshot().await)
    }

    pub async fn snapshot(&mut self) -> Snapshot {
        let cursor = self.sequencer.cursor().await;
        let output = self.pipeline();
        Snapshot {
            module: self.module,
            stage: cursor.stage(),
            auto_play: cursor.auto_play(),
            input: self.input.clone(),
            lines: output.lines.clone(),
            mapped: output.mapped.clone(),
            groups: output.groups.clone(),
            reduced: output.reduced.clone(),
        }
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Context};
use clap::ValueEnum;
use serde::Deserialize;
use shared::catalog;
use tracing::warn;

pub const DEFAULT_CONFIG_FILE: &str = "mrsim.toml";
const ENV_PREFIX: &str = "MRSIM__";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub autoplay_interval_ms: u64,
    pub default_preset: String,
    pub format: OutputFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            autoplay_interval_ms: 2500,
            default_preset: catalog::DEFAULT_PRESET_ID.into(),
            format: OutputFormat::Text,
        }
    }
}

impl Settings {
    pub fn autoplay_interval(&self) -> Duration {
        Duration::from_millis(self.autoplay_interval_ms)
    }

    fn validate(self) -> anyhow::Result<Self> {
        if self.autoplay_interval_ms == 0 {
            bail!("autoplay_interval_ms must be greater than zero");
        }
        if catalog::find_preset(&self.default_preset).is_none() {
            bail!("default_preset '{}' is not a known preset", self.default_preset);
        }
        Ok(self)
    }
}

/// Defaults, then the config file, then `MRSIM__*` environment variables.
///
/// An explicitly named file must exist; the default `mrsim.toml` is optional.
pub fn load_settings(explicit: Option<&Path>) -> anyhow::Result<Settings> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => Some(PathBuf::from(DEFAULT_CONFIG_FILE)).filter(|path| path.exists()),
    };

    let settings = match path {
        Some(path) => read_settings_file(&path)?,
        None => Settings::default(),
    };

    apply_env_overrides(settings, |name| std::env::var(name).ok()).validate()
}

fn read_settings_file(path: &Path) -> anyhow::Result<Settings> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file '{}'", path.display()))?;
    toml::from_str(&raw)
        .with_context(|| format!("failed to parse config file '{}'", path.display()))
}

fn apply_env_overrides(
    mut settings: Settings,
    lookup: impl Fn(&str) -> Option<String>,
) -> Settings {
    let var = |key: &str| lookup(&format!("{ENV_PREFIX}{key}"));

    if let Some(v) = var("AUTOPLAY_INTERVAL_MS") {
        match v.trim().parse::<u64>() {
            Ok(parsed) => settings.autoplay_interval_ms = parsed,
            Err(_) => warn!(value = %v, "ignoring invalid MRSIM__AUTOPLAY_INTERVAL_MS"),
        }
    }
    if let Some(v) = var("DEFAULT_PRESET") {
        settings.default_preset = v;
    }
    if let Some(v) = var("FORMAT") {
        match OutputFormat::from_str(v.trim(), true) {
            Ok(format) => settings.format = format,
            Err(_) => warn!(value = %v, "ignoring invalid MRSIM__FORMAT"),
        }
    }

    settings
}

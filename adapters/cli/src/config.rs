use std::{fs, path::Path};

use anyhow::{Context, Result};
use hop_runner_core::LaneConfig;
use serde::Deserialize;

/// Seed used when neither the config file nor the command line provides one.
pub(crate) const DEFAULT_SEED: u64 = 0x6f70_5f68_6f70_0001;

/// Contents of a run configuration file.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct RunFile {
    /// Seed for the lane generator.
    pub(crate) seed: Option<u64>,
    /// Lane tunables.
    pub(crate) lane: LaneConfig,
}

/// Reads and validates a run configuration file.
pub(crate) fn load(path: &Path) -> Result<RunFile> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read run config at {}", path.display()))?;
    parse(&contents).with_context(|| format!("invalid run config at {}", path.display()))
}

fn parse(contents: &str) -> Result<RunFile> {
    let file: RunFile = toml::from_str(contents).context("failed to parse run config toml")?;
    file.lane.validate().context("lane config out of range")?;
    Ok(file)
}

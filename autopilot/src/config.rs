use anyhow::{Context, Result};
use circus_core::{RaceConfig, RaceSetup, Run, Track};
use std::env;
use std::fs;
use std::path::Path;

pub const ENV_TOTAL_LAPS: &str = "CIRCUS_TOTAL_LAPS";
pub const ENV_DRAW_DISTANCE: &str = "CIRCUS_DRAW_DISTANCE";
pub const ENV_FRAME_CAP_MS: &str = "CIRCUS_FRAME_CAP_MS";

/// Race tunables overridable from the environment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    pub total_laps: Option<u32>,
    pub draw_distance: Option<u32>,
    pub frame_cap_ms: Option<u32>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        Self {
            total_laps: read_env_u32(ENV_TOTAL_LAPS),
            draw_distance: read_env_u32(ENV_DRAW_DISTANCE),
            frame_cap_ms: read_env_u32(ENV_FRAME_CAP_MS),
        }
    }

    pub fn apply(&self, config: &mut RaceConfig) {
        if let Some(laps) = self.total_laps {
            config.total_laps = laps;
        }
        if let Some(distance) = self.draw_distance {
            config.draw_distance = distance as usize;
        }
        if let Some(ms) = self.frame_cap_ms {
            config.frame_cap_seconds = f64::from(ms) / 1000.0;
        }
    }
}

fn read_env_u32(name: &str) -> Option<u32> {
    parse_positive_u32(name, env::var(name).ok().as_deref())
}

/// `None` when unset; warns and returns `None` when set to anything but a
/// positive integer.
pub fn parse_positive_u32(name: &str, raw: Option<&str>) -> Option<u32> {
    let raw = raw?;
    let parsed = raw
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|value| *value > 0);
    if parsed.is_none() {
        tracing::warn!("{name}={raw:?} is not a positive integer. Falling back to the default.");
    }
    parsed
}

pub fn load_race_config(path: Option<&Path>) -> Result<RaceConfig> {
    match path {
        None => Ok(RaceConfig::default()),
        Some(path) => {
            let data = fs::read(path)
                .with_context(|| format!("failed reading config {}", path.display()))?;
            serde_json::from_slice(&data)
                .with_context(|| format!("failed parsing config {}", path.display()))
        }
    }
}

pub fn load_track(path: Option<&Path>, segment_length: f64) -> Result<Track> {
    match path {
        None => Ok(Track::default_circuit(segment_length)),
        Some(path) => {
            let data = fs::read(path)
                .with_context(|| format!("failed reading track {}", path.display()))?;
            let blueprint: Vec<Run> = serde_json::from_slice(&data)
                .with_context(|| format!("failed parsing track {}", path.display()))?;
            Track::try_build(&blueprint, segment_length)
                .with_context(|| format!("invalid track blueprint {}", path.display()))
        }
    }
}

/// Config file, then environment overrides, then the track built at the
/// final segment length.
pub fn load_setup(config_path: Option<&Path>, track_path: Option<&Path>) -> Result<RaceSetup> {
    let mut config = load_race_config(config_path)?;
    EnvOverrides::from_env().apply(&mut config);
    let track = load_track(track_path, config.segment_length)?;
    RaceSetup::new(config, track).context("invalid race configuration")
}

//! Headless dig server.
//!
//! Loads `config/dig.ron` (or the file named by `DIG_CONFIG`) and runs the
//! dig plugin on a fixed schedule against in-memory collaborators.

use std::io::ErrorKind;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use bevy::app::ScheduleRunnerPlugin;
use bevy::prelude::*;
use tracing::{info, warn};

use dig_core::collab::{Collaborators, MemoryBackend};
use dig_core::logging::init_tracing_default;
use dig_core::{ConfigError, DigConfig, DigPlugin};

const DEFAULT_CONFIG_PATH: &str = "config/dig.ron";

fn load_config() -> anyhow::Result<DigConfig> {
    let path = std::env::var("DIG_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    match DigConfig::load(&path) {
        Ok(config) => {
            info!(path = %path, "dig config loaded");
            Ok(config)
        }
        Err(ConfigError::Io(e)) if e.kind() == ErrorKind::NotFound => {
            warn!(path = %path, "dig config not found, using defaults");
            Ok(DigConfig::default())
        }
        Err(e) => Err(e).with_context(|| format!("failed to load dig config from {path}")),
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing_default();
    let config = load_config()?;

    let frame = Duration::from_secs_f64(config.tick_interval_secs());
    info!(
        tick_rate = config.tick_rate,
        maps = config.tables.maps.len(),
        candidates = config.tables.candidates.len(),
        "starting dig server"
    );

    let backend = Arc::new(MemoryBackend::new());
    let exit = App::new()
        .add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(frame)))
        .add_plugins(DigPlugin::new(config, Collaborators::in_memory(backend)))
        .run();

    if let AppExit::Error(code) = exit {
        bail!("dig server exited with code {code}");
    }
    Ok(())
}

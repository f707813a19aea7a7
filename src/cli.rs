use std::{path::PathBuf, time::Duration};

use anyhow::Result;
use clap::Parser;
use tokio::sync::mpsc;

use crate::component::RunPredictionComponent;
use crate::models::Run;
use crate::replay::ReplayScript;
use crate::settings::SettingsStore;
use crate::timer::{PredictionUpdate, ReplayController, TimerState};

/// Replays a scripted speedrun attempt and prints the run prediction as it
/// changes.
#[derive(Debug, Parser)]
#[command(name = "run-prediction", version, about)]
pub struct Cli {
    /// Run file (segments and comparison times) as JSON.
    #[arg(long)]
    pub run: PathBuf,

    /// Replay script as JSON.
    #[arg(long)]
    pub script: PathBuf,

    /// Component settings file; created on first rename if missing.
    #[arg(long, env = "RUN_PREDICTION_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Interval between rendered ticks, in milliseconds.
    #[arg(long, default_value_t = 100)]
    pub tick_ms: u64,

    /// Script clock speed relative to wall time.
    #[arg(long, default_value_t = 1.0)]
    pub speed: f64,

    /// Print every tick as a JSON line instead of changed values only.
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(cli: Cli) -> Result<()> {
    let run = Run::load(&cli.run)?;
    let script = ReplayScript::load(&cli.script)?;
    let settings = match cli.settings {
        Some(path) => SettingsStore::new(path)?,
        None => SettingsStore::in_memory(Default::default()),
    };

    let controller = ReplayController::new(
        TimerState::new(run)?,
        RunPredictionComponent::new(settings),
        Duration::from_millis(cli.tick_ms),
        cli.speed,
    )?;

    let (tx, mut rx) = mpsc::channel::<PredictionUpdate>(64);
    controller.start(script, tx).await?;

    let mut previous: Option<String> = None;
    while let Some(update) = rx.recv().await {
        if cli.json {
            println!("{}", serde_json::to_string(&update)?);
            continue;
        }
        if previous.as_deref() == Some(update.state.value.as_str()) {
            continue;
        }
        println!(
            "[{:>9.1}s] {:<8} {}: {}",
            update.clock.as_secs_f64(),
            format!("{:?}", update.phase),
            update.state.name,
            update.state.value
        );
        previous = Some(update.state.value);
    }

    controller.wait().await
}

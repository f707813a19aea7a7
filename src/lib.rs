pub mod cli;
pub mod component;
pub mod models;
pub mod prediction;
pub mod replay;
pub mod settings;
pub mod timer;
pub mod utils;

pub use component::{ComponentState, RunPredictionComponent};
pub use models::{Run, Segment, Time, TimeSpan, TimingMethod};
pub use prediction::{DisplayValue, PredictionState, PredictionTracker, TimerSnapshot};
pub use settings::{ComponentSettings, SettingsStore};
pub use timer::{TimerPhase, TimerState};

use clap::Parser;

pub fn run() -> anyhow::Result<()> {
    utils::logging::init();

    let cli = cli::Cli::parse();
    log::info!("run-prediction starting up...");

    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(cli::execute(cli))
}

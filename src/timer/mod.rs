pub mod controller;
pub mod state;

pub use controller::{PredictionUpdate, ReplayController};
pub use state::{TimerPhase, TimerState};

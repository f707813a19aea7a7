pub mod snapshot;
pub mod tracker;

pub use snapshot::TimerSnapshot;
pub use tracker::{DisplayValue, PredictionState, PredictionTracker};

pub mod run;
pub mod time;

pub use run::{
    Run, Segment, AVERAGE_SEGMENTS_COMPARISON, BEST_SEGMENTS_COMPARISON,
    BEST_SPLIT_TIMES_COMPARISON, CURRENT_COMPARISON, LATEST_RUN_COMPARISON,
    PERSONAL_BEST_COMPARISON, WORST_SEGMENTS_COMPARISON,
};
pub use time::{Time, TimeSpan, TimingMethod};

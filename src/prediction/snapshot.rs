use serde::Serialize;

use crate::models::TimeSpan;
use crate::timer::{TimerPhase, TimerState};

/// Everything the tracker reads from the timer for one tick, already
/// resolved against a single comparison and timing method.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub phase: TimerPhase,
    pub current_split_index: Option<usize>,
    /// Elapsed attempt time.
    pub current_time: Option<TimeSpan>,
    /// Comparison time at the split in progress.
    pub current_split_comparison: Option<TimeSpan>,
    /// Comparison time at the last split, i.e. the comparison's finish time.
    pub final_split_comparison: Option<TimeSpan>,
    /// Most recent finalized delta at or before the current split.
    pub last_delta: Option<TimeSpan>,
    /// Recorded time of the split just before the current one.
    pub previous_split_time: Option<TimeSpan>,
    /// Recorded time of the last split, once the attempt has ended.
    pub final_time: Option<TimeSpan>,
}

impl TimerSnapshot {
    pub fn capture(timer: &TimerState, comparison: &str, clock: TimeSpan) -> Self {
        let method = timer.timing_method;
        let run = &timer.run;
        let final_segment = run.final_segment();
        let index = timer.current_split_index;
        let current_segment = index.and_then(|index| run.segments.get(index));

        Self {
            phase: timer.phase,
            current_split_index: index,
            current_time: timer.current_time(clock)[method],
            current_split_comparison: current_segment
                .and_then(|segment| segment.comparison(comparison)[method]),
            final_split_comparison: final_segment
                .and_then(|segment| segment.comparison(comparison)[method]),
            last_delta: index.and_then(|index| run.last_delta(index, comparison, method)),
            previous_split_time: index
                .and_then(|index| index.checked_sub(1))
                .and_then(|previous| run.segments.get(previous))
                .and_then(|segment| segment.split_time[method]),
            final_time: match timer.phase {
                TimerPhase::Ended => final_segment.and_then(|segment| segment.split_time[method]),
                _ => None,
            },
        }
    }
}

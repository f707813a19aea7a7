//! Finish-time prediction with per-split correction tracking.
//!
//! The predicted finish is the most recent finalized delta carried onto the
//! comparison's final time. Each time a new split boundary is crossed the
//! prediction is committed as the baseline, and the change against the
//! previous baseline becomes the correction shown next to the value.

use serde::Serialize;

use crate::component::labels;
use crate::models::TimeSpan;
use crate::timer::TimerPhase;
use crate::log_debug;

use super::snapshot::TimerSnapshot;

const ENABLE_LOGS: bool = true;

/// What the display layer should show for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum DisplayValue {
    None,
    RawPrediction {
        value: TimeSpan,
    },
    CorrectedPrediction {
        correction: TimeSpan,
        value: TimeSpan,
    },
}

impl DisplayValue {
    fn raw(value: Option<TimeSpan>) -> Self {
        match value {
            Some(value) => DisplayValue::RawPrediction { value },
            None => DisplayValue::None,
        }
    }

}

/// Cross-tick state. `baseline_split_index == 0` means no baseline yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionState {
    pub baseline_split_index: usize,
    pub baseline_prediction: TimeSpan,
    pub baseline_correction: Option<TimeSpan>,
}

#[derive(Debug, Clone, Default)]
pub struct PredictionTracker {
    state: PredictionState,
    /// Whether `baseline_prediction` holds a committed or seeded value. A
    /// comparison finishing at zero seeds a zero prediction.
    seeded: bool,
}

impl PredictionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores a tracker. Any state other than the initial tuple counts as
    /// a baseline to correct against.
    pub fn with_state(state: PredictionState) -> Self {
        Self {
            seeded: state != PredictionState::default(),
            state,
        }
    }

    pub fn state(&self) -> &PredictionState {
        &self.state
    }

    pub fn reset(&mut self) {
        self.state = PredictionState::default();
        self.seeded = false;
    }

    /// Advances the tracker by one tick. `comparison` is the already
    /// resolved comparison name the snapshot was captured against.
    pub fn update(&mut self, snapshot: &TimerSnapshot, comparison: &str) -> DisplayValue {
        match snapshot.phase {
            TimerPhase::Idle if labels::is_current_pace(&labels::displayed_name(comparison)) => {
                self.reset();
                DisplayValue::None
            }
            TimerPhase::Running | TimerPhase::Paused => self.update_active(snapshot),
            TimerPhase::Ended => self.update_ended(snapshot),
            TimerPhase::Idle => {
                // Static preview of the comparison's finish time.
                self.state.baseline_split_index = 0;
                DisplayValue::raw(snapshot.final_split_comparison)
            }
        }
    }

    fn update_active(&mut self, snapshot: &TimerSnapshot) -> DisplayValue {
        let final_reference = snapshot.final_split_comparison;

        if snapshot.current_split_index == Some(self.state.baseline_split_index) {
            if let Some(live) = Self::live_overrun(snapshot) {
                return DisplayValue::raw(final_reference.map(|reference| live + reference));
            }
        }

        let (Some(split_index), Some(delta), Some(reference)) =
            (snapshot.current_split_index, snapshot.last_delta, final_reference)
        else {
            return self.drop_baseline(final_reference);
        };

        let prediction = delta + reference;
        if split_index != self.state.baseline_split_index {
            self.commit_baseline(split_index, prediction, snapshot.previous_split_time);
        }

        match self.state.baseline_correction {
            Some(correction) => DisplayValue::CorrectedPrediction {
                correction,
                value: prediction,
            },
            None => DisplayValue::RawPrediction { value: prediction },
        }
    }

    /// Live delta of the split in progress, when it already exceeds the last
    /// finalized delta (a missing finalized delta counts as zero).
    fn live_overrun(snapshot: &TimerSnapshot) -> Option<TimeSpan> {
        let live = snapshot.current_time? - snapshot.current_split_comparison?;
        (live > snapshot.last_delta.unwrap_or_default()).then_some(live)
    }

    fn commit_baseline(
        &mut self,
        split_index: usize,
        prediction: TimeSpan,
        previous_split_time: Option<TimeSpan>,
    ) {
        let advanced = split_index > self.state.baseline_split_index;
        self.state.baseline_correction =
            if advanced && previous_split_time.is_some() && self.has_baseline() {
                Some(prediction - self.state.baseline_prediction)
            } else {
                None
            };

        log_debug!(
            "prediction baseline {} -> {} at {} (correction {:?})",
            self.state.baseline_split_index,
            split_index,
            prediction,
            self.state.baseline_correction
        );

        self.state.baseline_prediction = prediction;
        self.state.baseline_split_index = split_index;
        self.seeded = true;
    }

    /// A fresh tracker has nothing to correct against. A baseline seeded from
    /// the comparison's finish time during the first split does count.
    fn has_baseline(&self) -> bool {
        self.state.baseline_split_index > 0 || self.seeded
    }

    fn drop_baseline(&mut self, final_reference: Option<TimeSpan>) -> DisplayValue {
        self.state = PredictionState {
            baseline_split_index: 0,
            baseline_prediction: final_reference.unwrap_or_default(),
            baseline_correction: None,
        };
        self.seeded = final_reference.is_some();
        DisplayValue::raw(final_reference)
    }

    fn update_ended(&self, snapshot: &TimerSnapshot) -> DisplayValue {
        let Some(final_time) = snapshot.final_time else {
            return DisplayValue::None;
        };
        if self.state.baseline_split_index > 0 {
            DisplayValue::CorrectedPrediction {
                correction: final_time - self.state.baseline_prediction,
                value: final_time,
            }
        } else {
            DisplayValue::RawPrediction { value: final_time }
        }
    }
}

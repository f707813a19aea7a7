pub mod format;
pub mod labels;

use anyhow::Result;
use serde::Serialize;

use crate::models::{TimeSpan, CURRENT_COMPARISON};
use crate::prediction::{PredictionTracker, TimerSnapshot};
use crate::settings::{ComponentSettings, SettingsStore};
use crate::timer::TimerState;

use format::{DeltaFormatter, SplitTimeFormatter};

/// Rendered output of one tick, ready for a host to draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentState {
    pub name: String,
    pub alternate_names: Vec<String>,
    pub value: String,
    pub display_two_rows: bool,
}

/// Run prediction component: resolves the comparison, feeds the tracker and
/// formats what it reports.
pub struct RunPredictionComponent {
    settings: SettingsStore,
    tracker: PredictionTracker,
    delta_formatter: DeltaFormatter,
    previous_name: Option<String>,
    alternate_names: Vec<String>,
}

impl RunPredictionComponent {
    pub fn new(settings: SettingsStore) -> Self {
        Self {
            settings,
            tracker: PredictionTracker::new(),
            delta_formatter: DeltaFormatter::default(),
            previous_name: None,
            alternate_names: Vec::new(),
        }
    }

    pub fn with_settings(settings: ComponentSettings) -> Self {
        Self::new(SettingsStore::in_memory(settings))
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    /// The comparison this component predicts against for `timer`.
    pub fn resolve_comparison(&self, timer: &TimerState) -> String {
        let configured = self.settings.settings().comparison;
        if configured == CURRENT_COMPARISON || !timer.run.contains_comparison(&configured) {
            timer.current_comparison.clone()
        } else {
            configured
        }
    }

    pub fn update(&mut self, timer: &TimerState, clock: TimeSpan) -> ComponentState {
        let settings = self.settings.settings();
        let comparison = self.resolve_comparison(timer);
        let name = labels::displayed_name(&comparison);

        if self.previous_name.as_deref() != Some(name.as_str()) {
            self.alternate_names = labels::alternate_names(&comparison)
                .iter()
                .map(|alt| alt.to_string())
                .collect();
            self.previous_name = Some(name.clone());
        }

        let snapshot = TimerSnapshot::capture(timer, &comparison, clock);
        let value = self.tracker.update(&snapshot, &comparison);

        let split_formatter = SplitTimeFormatter::new(settings.accuracy);
        ComponentState {
            name,
            alternate_names: self.alternate_names.clone(),
            value: format::render(&value, &split_formatter, &self.delta_formatter),
            display_two_rows: settings.display_two_rows,
        }
    }

    /// To be called by the host whenever the run renames a comparison.
    pub fn on_comparison_renamed(&self, old: &str, new: &str) -> Result<bool> {
        self.settings.rename_comparison(old, new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Run, Segment, Time, BEST_SEGMENTS_COMPARISON, PERSONAL_BEST_COMPARISON,
    };
    use format::Accuracy;

    fn secs(value: i64) -> TimeSpan {
        TimeSpan::from_secs(value)
    }

    fn timer() -> TimerState {
        let segment = |name: &str, pb: i64, best: i64| {
            Segment::new(name)
                .with_comparison(PERSONAL_BEST_COMPARISON, Time::real(secs(pb)))
                .with_comparison(BEST_SEGMENTS_COMPARISON, Time::real(secs(best)))
        };
        let mut run = Run::new(vec![
            segment("A", 10, 9),
            segment("B", 40, 35),
            segment("C", 100, 90),
        ]);
        run.comparisons.push(BEST_SEGMENTS_COMPARISON.into());
        TimerState::new(run).unwrap()
    }

    fn component(comparison: &str) -> RunPredictionComponent {
        RunPredictionComponent::with_settings(ComponentSettings {
            comparison: comparison.into(),
            accuracy: Accuracy::Seconds,
            display_two_rows: false,
        })
    }

    #[test]
    fn follows_the_timer_comparison() {
        let mut timer = timer();
        let component = component(CURRENT_COMPARISON);
        assert_eq!(component.resolve_comparison(&timer), PERSONAL_BEST_COMPARISON);
        timer.switch_comparison(BEST_SEGMENTS_COMPARISON).unwrap();
        assert_eq!(component.resolve_comparison(&timer), BEST_SEGMENTS_COMPARISON);
    }

    #[test]
    fn unknown_comparison_falls_back_to_the_timer() {
        let component = component("Deleted Comparison");
        assert_eq!(component.resolve_comparison(&timer()), PERSONAL_BEST_COMPARISON);
    }

    #[test]
    fn idle_current_pace_renders_nothing() {
        let mut component = component(CURRENT_COMPARISON);
        let state = component.update(&timer(), secs(0));
        assert_eq!(state.name, "Current Pace");
        assert_eq!(state.alternate_names, vec!["Cur. Pace", "Pace"]);
        assert_eq!(state.value, "");
    }

    #[test]
    fn idle_best_segments_previews_the_finish() {
        let mut component = component(BEST_SEGMENTS_COMPARISON);
        let state = component.update(&timer(), secs(0));
        assert_eq!(state.name, "Best Possible");
        assert_eq!(state.alternate_names, vec!["Best Time", "BPT"]);
        assert_eq!(state.value, "1:30");
    }

    #[test]
    fn renders_corrections_through_an_attempt() {
        let mut timer = timer();
        let mut component = component(PERSONAL_BEST_COMPARISON);

        timer.start(secs(0)).unwrap();
        assert_eq!(component.update(&timer, secs(1)).value, "1:40");

        timer.split(secs(12)).unwrap();
        assert_eq!(component.update(&timer, secs(13)).value, "(+2.0) 1:42");

        timer.split(secs(45)).unwrap();
        assert_eq!(component.update(&timer, secs(46)).value, "(+3.0) 1:45");

        timer.split(secs(101)).unwrap();
        assert_eq!(component.update(&timer, secs(102)).value, "(-4.0) 1:41");
    }

    #[test]
    fn rename_updates_the_configured_comparison() {
        let component = component(PERSONAL_BEST_COMPARISON);
        assert!(component
            .on_comparison_renamed(PERSONAL_BEST_COMPARISON, "Old PB")
            .unwrap());
        assert_eq!(component.settings().settings().comparison, "Old PB");
    }
}

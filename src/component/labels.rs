//! Names shown for the component depending on the comparison it predicts
//! against.

use crate::models::{
    AVERAGE_SEGMENTS_COMPARISON, BEST_SEGMENTS_COMPARISON, BEST_SPLIT_TIMES_COMPARISON,
    CURRENT_COMPARISON, LATEST_RUN_COMPARISON, PERSONAL_BEST_COMPARISON,
    WORST_SEGMENTS_COMPARISON,
};

const CURRENT_PACE: &str = "Current Pace";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ComparisonKind {
    CurrentPace,
    BestPossible,
    WorstPossible,
    Predicted,
    Other,
}

impl ComparisonKind {
    fn of(comparison: &str) -> Self {
        match comparison {
            CURRENT_COMPARISON | PERSONAL_BEST_COMPARISON => ComparisonKind::CurrentPace,
            BEST_SEGMENTS_COMPARISON => ComparisonKind::BestPossible,
            WORST_SEGMENTS_COMPARISON => ComparisonKind::WorstPossible,
            AVERAGE_SEGMENTS_COMPARISON => ComparisonKind::Predicted,
            _ => ComparisonKind::Other,
        }
    }
}

pub fn displayed_name(comparison: &str) -> String {
    match ComparisonKind::of(comparison) {
        ComparisonKind::CurrentPace => CURRENT_PACE.to_string(),
        ComparisonKind::BestPossible => "Best Possible".to_string(),
        ComparisonKind::WorstPossible => "Worst Possible".to_string(),
        ComparisonKind::Predicted => "Predicted Time".to_string(),
        ComparisonKind::Other => {
            format!("{CURRENT_PACE} ({})", short_comparison_name(comparison))
        }
    }
}

/// Shorter names used when several comparisons are shown side by side.
pub fn short_comparison_name(comparison: &str) -> &str {
    match comparison {
        PERSONAL_BEST_COMPARISON => "PB",
        BEST_SEGMENTS_COMPARISON => "Best Segs",
        WORST_SEGMENTS_COMPARISON => "Worst Segs",
        AVERAGE_SEGMENTS_COMPARISON => "Average Segs",
        BEST_SPLIT_TIMES_COMPARISON => "Best Splits",
        LATEST_RUN_COMPARISON => "Latest",
        other => other,
    }
}

/// Progressively shorter fallbacks for narrow layouts.
pub fn alternate_names(comparison: &str) -> &'static [&'static str] {
    match ComparisonKind::of(comparison) {
        ComparisonKind::CurrentPace => &["Cur. Pace", "Pace"],
        ComparisonKind::BestPossible => &["Best Time", "BPT"],
        ComparisonKind::WorstPossible => &["Worst Time", "WPT"],
        ComparisonKind::Predicted => &["Predicted", "Pred."],
        ComparisonKind::Other => &["Current Pace", "Cur. Pace", "Pace"],
    }
}

pub fn is_current_pace(displayed_name: &str) -> bool {
    displayed_name.starts_with(CURRENT_PACE)
}

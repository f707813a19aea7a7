use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::Path};

use super::time::{Time, TimeSpan, TimingMethod};

pub const PERSONAL_BEST_COMPARISON: &str = "Personal Best";
pub const BEST_SEGMENTS_COMPARISON: &str = "Best Segments";
pub const WORST_SEGMENTS_COMPARISON: &str = "Worst Segments";
pub const AVERAGE_SEGMENTS_COMPARISON: &str = "Average Segments";
pub const BEST_SPLIT_TIMES_COMPARISON: &str = "Best Split Times";
pub const LATEST_RUN_COMPARISON: &str = "Latest Run";
/// Settings placeholder meaning "whatever the timer is comparing against".
pub const CURRENT_COMPARISON: &str = "Current Comparison";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub name: String,
    /// Set by the timer while an attempt is in progress.
    #[serde(default)]
    pub split_time: Time,
    #[serde(default)]
    pub comparisons: HashMap<String, Time>,
}

impl Segment {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_comparison(mut self, comparison: impl Into<String>, time: Time) -> Self {
        self.comparisons.insert(comparison.into(), time);
        self
    }

    pub fn comparison(&self, comparison: &str) -> Time {
        self.comparisons.get(comparison).copied().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Run {
    #[serde(default)]
    pub game: String,
    #[serde(default)]
    pub category: String,
    pub segments: Vec<Segment>,
    /// Ordered comparison names; the first one is the default comparison.
    #[serde(default = "default_comparisons")]
    pub comparisons: Vec<String>,
}

fn default_comparisons() -> Vec<String> {
    vec![PERSONAL_BEST_COMPARISON.to_string()]
}

impl Run {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self {
            game: String::new(),
            category: String::new(),
            segments,
            comparisons: default_comparisons(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read run from {}", path.display()))?;
        let run: Run = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse run from {}", path.display()))?;
        run.validate()?;
        Ok(run)
    }

    pub fn validate(&self) -> Result<()> {
        if self.segments.is_empty() {
            bail!("run must contain at least one segment");
        }
        if self.comparisons.is_empty() {
            bail!("run must declare at least one comparison");
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn final_segment(&self) -> Option<&Segment> {
        self.segments.last()
    }

    pub fn contains_comparison(&self, comparison: &str) -> bool {
        self.comparisons.iter().any(|name| name == comparison)
    }

    /// Most recent `split time - comparison time`, searching backwards from
    /// `split_index` inclusive. Splits missing either value are passed over.
    pub fn last_delta(
        &self,
        split_index: usize,
        comparison: &str,
        method: TimingMethod,
    ) -> Option<TimeSpan> {
        let end = split_index.min(self.segments.len().checked_sub(1)?);
        self.segments[..=end].iter().rev().find_map(|segment| {
            let split_time = segment.split_time[method]?;
            let comparison_time = segment.comparison(comparison)[method]?;
            Some(split_time - comparison_time)
        })
    }

    /// Returns `Ok(false)` when `old` is not a comparison of this run.
    pub fn rename_comparison(&mut self, old: &str, new: &str) -> Result<bool> {
        if old == new {
            return Ok(self.contains_comparison(old));
        }
        if self.contains_comparison(new) {
            bail!("comparison '{new}' already exists");
        }
        let Some(slot) = self.comparisons.iter_mut().find(|name| name.as_str() == old) else {
            return Ok(false);
        };
        *slot = new.to_string();

        for segment in &mut self.segments {
            if let Some(time) = segment.comparisons.remove(old) {
                segment.comparisons.insert(new.to_string(), time);
            }
        }
        Ok(true)
    }

    pub fn clear_split_times(&mut self) {
        for segment in &mut self.segments {
            segment.split_time = Time::default();
        }
    }
}

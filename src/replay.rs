//! Scripted attempts for driving the timer without a live runner.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::models::TimeSpan;
use crate::timer::TimerState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "action")]
pub enum ReplayAction {
    Start,
    Split,
    Skip,
    Undo,
    Pause,
    Resume,
    Reset,
    SwitchComparison { name: String },
    RenameComparison { old: String, new: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayEvent {
    /// Script clock in milliseconds.
    pub at_ms: i64,
    #[serde(flatten)]
    pub action: ReplayAction,
}

impl ReplayEvent {
    pub fn new(at: TimeSpan, action: ReplayAction) -> Self {
        Self {
            at_ms: at.as_millis(),
            action,
        }
    }

    pub fn at(&self) -> TimeSpan {
        TimeSpan::from_millis(self.at_ms)
    }

    /// Applies the event to `timer` at its own clock reading. Returns the
    /// rename, if any, so the caller can forward it to its settings.
    pub fn apply(&self, timer: &mut TimerState) -> Result<Option<(String, String)>> {
        let clock = self.at();
        match &self.action {
            ReplayAction::Start => timer.start(clock)?,
            ReplayAction::Split => timer.split(clock)?,
            ReplayAction::Skip => timer.skip_split()?,
            ReplayAction::Undo => timer.undo_split(clock)?,
            ReplayAction::Pause => timer.pause(clock)?,
            ReplayAction::Resume => timer.resume(clock)?,
            ReplayAction::Reset => timer.reset(),
            ReplayAction::SwitchComparison { name } => timer.switch_comparison(name)?,
            ReplayAction::RenameComparison { old, new } => {
                if timer.rename_comparison(old, new)? {
                    return Ok(Some((old.clone(), new.clone())));
                }
            }
        }
        Ok(None)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayScript {
    pub events: Vec<ReplayEvent>,
}

impl ReplayScript {
    pub fn new(events: Vec<ReplayEvent>) -> Result<Self> {
        let script = Self { events };
        script.validate()?;
        Ok(script)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read replay script from {}", path.display()))?;
        let script: ReplayScript = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse replay script from {}", path.display()))?;
        script.validate()?;
        Ok(script)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(event) = self.events.iter().find(|event| event.at_ms < 0) {
            bail!("event at {}ms has a negative timestamp", event.at_ms);
        }
        if let Some(pair) = self.events.windows(2).find(|pair| pair[1].at_ms < pair[0].at_ms) {
            bail!(
                "events must be sorted by time: {}ms follows {}ms",
                pair[1].at_ms,
                pair[0].at_ms
            );
        }
        Ok(())
    }

    /// Clock reading of the last event.
    pub fn duration(&self) -> TimeSpan {
        self.events.last().map(ReplayEvent::at).unwrap_or_default()
    }
}

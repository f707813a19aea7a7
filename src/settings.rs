use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use crate::component::format::Accuracy;
use crate::models::CURRENT_COMPARISON;
use crate::{log_info, log_warn};

const ENABLE_LOGS: bool = true;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ComponentSettings {
    /// Comparison to predict against, or "Current Comparison" to follow the timer.
    pub comparison: String,
    pub accuracy: Accuracy,
    pub display_two_rows: bool,
}

impl Default for ComponentSettings {
    fn default() -> Self {
        Self {
            comparison: CURRENT_COMPARISON.into(),
            accuracy: Accuracy::default(),
            display_two_rows: false,
        }
    }
}

impl ComponentSettings {
    /// Follows a comparison rename. Returns whether the setting changed.
    pub fn rename_comparison(&mut self, old: &str, new: &str) -> bool {
        if self.comparison == old {
            self.comparison = new.to_string();
            true
        } else {
            false
        }
    }
}

/// JSON-backed settings. Without a path the store is in-memory only.
pub struct SettingsStore {
    path: Option<PathBuf>,
    data: RwLock<ComponentSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                log_warn!(
                    "Ignoring unreadable settings in {}: {err}; using defaults",
                    path.display()
                );
                ComponentSettings::default()
            })
        } else {
            ComponentSettings::default()
        };

        Ok(Self {
            path: Some(path),
            data: RwLock::new(data),
        })
    }

    pub fn in_memory(settings: ComponentSettings) -> Self {
        Self {
            path: None,
            data: RwLock::new(settings),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn settings(&self) -> ComponentSettings {
        self.read().clone()
    }

    pub fn update(&self, settings: ComponentSettings) -> Result<()> {
        let mut guard = self.write();
        *guard = settings;
        self.persist(&guard)
    }

    /// Remaps the configured comparison after the run renamed it.
    pub fn rename_comparison(&self, old: &str, new: &str) -> Result<bool> {
        let mut guard = self.write();
        if !guard.rename_comparison(old, new) {
            return Ok(false);
        }
        log_info!("Comparison setting follows rename '{old}' -> '{new}'");
        self.persist(&guard)?;
        Ok(true)
    }

    pub fn reload(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        let data: ComponentSettings = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse settings from {}", path.display()))?;
        *self.write() = data;
        Ok(())
    }

    fn persist(&self, data: &ComponentSettings) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(path, serialized)
            .with_context(|| format!("Failed to write settings to {}", path.display()))
    }

    fn read(&self) -> RwLockReadGuard<'_, ComponentSettings> {
        self.data.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, ComponentSettings> {
        self.data.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

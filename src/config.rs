//! The one persisted setting: the special date the counter runs from.
//!
//! Stored as JSON, e.g. `{"special_date": "2024-02-29T00:00:00Z"}`. Read once
//! at startup, rewritten whenever a new date is picked.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// Read by the CLI's `--state` flag when the flag is not given.
pub const STATE_ENV: &str = "TOGETHER_STATE";
pub const DEFAULT_STATE_FILE: &str = "together.json";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub special_date: Option<DateTime<Utc>>,
}

impl Settings {
    /// The saved anchor on the local clock, or `now` if none was ever saved.
    pub fn anchor_or(&self, now: DateTime<Local>) -> DateTime<Local> {
        self.special_date
            .map(|d| d.with_timezone(&Local))
            .unwrap_or(now)
    }
}

#[derive(Clone, Debug)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Settings> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "No saved settings, using defaults");
                return Ok(Settings::default());
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read {}", self.path.display()));
            }
        };

        let settings: Settings = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse settings in {}", self.path.display()))?;

        tracing::debug!(
            path = %self.path.display(),
            special_date = ?settings.special_date,
            "Loaded settings"
        );
        Ok(settings)
    }

    /// Writes to a sibling temp file first, then renames over the target.
    pub fn save(&self, settings: &Settings) -> Result<()> {
        let json =
            serde_json::to_string_pretty(settings).context("Failed to serialize settings")?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).with_context(|| format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;

        tracing::info!(
            path = %self.path.display(),
            special_date = ?settings.special_date,
            "Saved settings"
        );
        Ok(())
    }

    /// Persists a newly picked anchor.
    pub fn save_anchor(&self, anchor: DateTime<Local>) -> Result<()> {
        self.save(&Settings {
            special_date: Some(anchor.with_timezone(&Utc)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("nope.json"));
        assert_eq!(store.load().unwrap(), Settings::default());
    }

    #[test]
    fn saved_anchor_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("state.json"));
        let anchor = Local.with_ymd_and_hms(2023, 10, 3, 0, 0, 0).unwrap();

        store.save_anchor(anchor).unwrap();
        let loaded = store.load().unwrap();

        assert_eq!(loaded.anchor_or(Local::now()), anchor);
        assert!(!dir.path().join("state.json.tmp").exists());
    }

    #[test]
    fn file_holds_a_timestamp_string() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let store = SettingsStore::new(&path);
        let anchor = Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap();

        store
            .save(&Settings {
                special_date: Some(anchor),
            })
            .unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["special_date"], "2024-02-29T00:00:00Z");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{ not json").unwrap();

        let err = SettingsStore::new(&path).load().unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse settings"));
    }

    #[test]
    fn empty_object_means_no_anchor() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{}").unwrap();

        let settings = SettingsStore::new(&path).load().unwrap();
        let now = Local.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
        assert_eq!(settings.anchor_or(now), now);
    }
}

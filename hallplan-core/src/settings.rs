use std::path::Path;

use serde::{Deserialize, Serialize};

pub const DEFAULT_HISTORY_CAP: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid settings: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Tunables of a planner session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerSettings {
    /// Maximum number of undo entries kept. Values below 1 act as 1.
    pub history_cap: usize,
    /// Whether edits are written to the store as they happen.
    pub autosave: bool,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            history_cap: DEFAULT_HISTORY_CAP,
            autosave: true,
        }
    }
}

impl PlannerSettings {
    pub fn from_toml_str(s: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(s)?)
    }

    pub fn with_history_cap(mut self, cap: usize) -> Self {
        self.history_cap = cap;
        self
    }

    pub fn history_cap(&self) -> usize {
        self.history_cap.max(1)
    }
}

/// Reads settings from `path`, falling back to defaults when the file is
/// missing or does not parse.
pub fn load_settings(path: impl AsRef<Path>) -> PlannerSettings {
    let path = path.as_ref();
    let Ok(content) = std::fs::read_to_string(path) else {
        return PlannerSettings::default();
    };

    match PlannerSettings::from_toml_str(&content) {
        Ok(settings) => settings,
        Err(err) => {
            log::warn!("ignoring {}: {err}", path.display());
            PlannerSettings::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_use_defaults() {
        let settings = PlannerSettings::from_toml_str("autosave = false").unwrap();
        assert_eq!(settings.history_cap, DEFAULT_HISTORY_CAP);
        assert!(!settings.autosave);
    }

    #[test]
    fn zero_cap_acts_as_one() {
        let settings = PlannerSettings::from_toml_str("history_cap = 0").unwrap();
        assert_eq!(settings.history_cap(), 1);
    }

    #[test]
    fn bad_toml_is_an_error() {
        assert!(PlannerSettings::from_toml_str("history_cap = \"many\"").is_err());
    }

    #[test]
    fn load_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            load_settings(dir.path().join("absent.toml")),
            PlannerSettings::default()
        );

        let path = dir.path().join("planner.toml");
        std::fs::write(&path, "history_cap = [").unwrap();
        assert_eq!(load_settings(&path), PlannerSettings::default());

        std::fs::write(&path, "history_cap = 7\n").unwrap();
        assert_eq!(load_settings(&path).history_cap, 7);
    }
}

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{
    DashboardError,
    provider::openf1::{DEFAULT_API_URL, DEFAULT_REQUEST_TIMEOUT_S},
    session::{SessionKind, catalog::DEFAULT_EVENT},
    views::DisplayToggles,
};

const CONFIG_DIR_NAME: &str = "paddock";
const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub api_base_url: String,
    pub request_timeout_s: u64,
    pub show_lap_times: bool,
    pub show_telemetry: bool,
    pub show_position_changes: bool,
    pub show_tire_strategy: bool,
    pub last_year: Option<i32>,
    pub last_event: String,
    pub last_session_kind: SessionKind,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            request_timeout_s: DEFAULT_REQUEST_TIMEOUT_S,
            show_lap_times: true,
            show_telemetry: true,
            show_position_changes: true,
            show_tire_strategy: true,
            last_year: None,
            last_event: DEFAULT_EVENT.to_string(),
            last_session_kind: SessionKind::Race,
        }
    }
}

impl AppConfig {
    pub fn default_path() -> Option<PathBuf> {
        Some(dirs::config_dir()?.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    pub fn from_local_file() -> Option<Self> {
        Self::from_file(&Self::default_path()?)
    }

    /// Reads a config file. A missing or unreadable file yields `None` so the
    /// caller can fall back to defaults.
    pub fn from_file(config_path: &Path) -> Option<Self> {
        if !config_path.exists() {
            return None;
        }
        let file = std::fs::File::open(config_path)
            .map_err(|e| log::warn!("Could not open config file {:?}: {}", config_path, e))
            .ok()?;
        serde_json::from_reader(file)
            .map_err(|e| log::warn!("Could not parse config file {:?}: {}", config_path, e))
            .ok()
    }

    pub fn save_to(&self, config_path: &Path) -> Result<(), DashboardError> {
        if let Some(parent) = config_path.parent()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| DashboardError::ConfigIOError { source: e })?;
        }

        let file = std::fs::File::create(config_path)
            .map_err(|e| DashboardError::ConfigIOError { source: e })?;
        serde_json::to_writer_pretty(file, self)
            .map_err(|e| DashboardError::ConfigSerializeError { source: e })
    }

    pub fn toggles(&self) -> DisplayToggles {
        DisplayToggles {
            lap_times: self.show_lap_times,
            telemetry: self.show_telemetry,
            position_changes: self.show_position_changes,
            tire_strategy: self.show_tire_strategy,
        }
    }

    pub fn set_toggles(&mut self, toggles: DisplayToggles) {
        self.show_lap_times = toggles.lap_times;
        self.show_telemetry = toggles.telemetry;
        self.show_position_changes = toggles.position_changes;
        self.show_tire_strategy = toggles.tire_strategy;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);
        let config = AppConfig {
            last_year: Some(2023),
            last_event: "Silverstone".to_string(),
            last_session_kind: SessionKind::Sprint,
            show_telemetry: false,
            ..AppConfig::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(AppConfig::from_file(&path), Some(config));
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"show_tire_strategy": false}}"#).unwrap();
        file.flush().unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert!(!config.show_tire_strategy);
        assert!(config.show_lap_times);
        assert_eq!(config.api_base_url, DEFAULT_API_URL);
        assert_eq!(config.last_event, "Monaco");
    }

    #[test]
    fn test_unparseable_file_is_ignored() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{{ not json").unwrap();
        file.flush().unwrap();
        assert!(AppConfig::from_file(file.path()).is_none());
        assert!(AppConfig::from_file(Path::new("/definitely/not/here.json")).is_none());
    }
}

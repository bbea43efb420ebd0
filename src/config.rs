use std::{fs::File, path::PathBuf};

use jiff::SignedDuration;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    coaching::DEFAULT_TIP_COOLDOWN_MS,
    errors::RepCoachError,
    exercise::ExerciseMode,
    session::{DEFAULT_COUNTDOWN_S, DEFAULT_GOAL_REPS, SessionSettings},
};

const CONFIG_FILE_NAME: &str = "config.json";
const DEFAULT_RECORDINGS_DIR: &str = "recordings";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub recordings_dir: PathBuf,
    pub countdown_s: u64,
    pub tip_cooldown_ms: u64,
    pub default_mode: ExerciseMode,
    pub default_goal_reps: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            recordings_dir: PathBuf::from(DEFAULT_RECORDINGS_DIR),
            countdown_s: DEFAULT_COUNTDOWN_S,
            tip_cooldown_ms: DEFAULT_TIP_COOLDOWN_MS,
            default_mode: ExerciseMode::default(),
            default_goal_reps: DEFAULT_GOAL_REPS,
        }
    }
}

impl AppConfig {
    pub fn config_path() -> Result<PathBuf, RepCoachError> {
        Ok(dirs::config_dir()
            .ok_or(RepCoachError::NoConfigDir)?
            .join("repcoach")
            .join(CONFIG_FILE_NAME))
    }

    /// Loads the saved configuration, `None` if nothing was saved yet.
    pub fn from_local_file() -> Result<Option<Self>, RepCoachError> {
        let config_path = Self::config_path()?;
        if !config_path.exists() {
            return Ok(None);
        }
        debug!("Loading config from {:?}", config_path);
        let file =
            File::open(config_path).map_err(|e| RepCoachError::ConfigIOError { source: e })?;
        serde_json::from_reader(file)
            .map(Some)
            .map_err(|e| RepCoachError::ConfigSerializeError { source: e })
    }

    pub fn save(&self) -> Result<PathBuf, RepCoachError> {
        let config_path = Self::config_path()?;
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| RepCoachError::ConfigIOError { source: e })?;
        }

        let file = File::create(&config_path)
            .map_err(|e| RepCoachError::ConfigIOError { source: e })?;
        serde_json::to_writer_pretty(file, self)
            .map_err(|e| RepCoachError::ConfigSerializeError { source: e })?;
        Ok(config_path)
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            countdown_s: self.countdown_s,
            tip_cooldown: SignedDuration::from_millis(self.tip_cooldown_ms as i64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_session_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.session_settings(), SessionSettings::default());
        assert_eq!(config.default_mode, ExerciseMode::Curl);
        assert_eq!(config.default_goal_reps, 10);
    }

    #[test]
    fn test_partial_config_file_uses_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"countdown_s": 3, "default_mode": "Push-up"}"#).unwrap();
        assert_eq!(config.countdown_s, 3);
        assert_eq!(config.default_mode, ExerciseMode::PushUp);
        assert_eq!(config.tip_cooldown_ms, 2000);
        assert_eq!(config.recordings_dir, PathBuf::from("recordings"));
    }
}

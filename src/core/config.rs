use crate::models::pose::PoseConfig;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Where dataset CSV files are written and discovered
    pub data_dir: PathBuf,
    /// Where the classifier and label codec are saved
    pub models_dir: PathBuf,
    /// Gesture vocabulary offered during collection
    pub gestures: Vec<String>,
    /// Frames recorded per session when the count prompt gets no usable number
    pub default_frame_count: usize,
    /// Seconds counted down before a session starts recording
    pub countdown_seconds: u32,
    /// Attempts at the gesture prompt before treating input as exit
    pub max_prompt_attempts: u32,
    /// Per-gesture total suggested in the session summary
    pub recommended_samples_per_gesture: usize,
    /// Keystroke mode: key -> gesture label
    pub keystroke_bindings: BTreeMap<char, String>,
    /// Key that ends recording (session) or the whole run (keystroke)
    pub quit_key: char,
    /// Held-out fraction for the stratified split (0.0-1.0, exclusive)
    pub test_fraction: f64,
    /// Seed for the split and the ensemble
    pub random_seed: u64,
    /// Trees in the ensemble
    pub n_estimators: usize,
    /// Maximum tree depth, unlimited when absent
    pub max_depth: Option<usize>,
    /// Minimum samples required to split a node
    pub min_samples_split: usize,
    /// Pose estimator settings
    pub pose: PoseConfig,
}

impl Default for Config {
    fn default() -> Self {
        let mut ml_dir = PathBuf::from(".");
        ml_dir.push("ml");

        let gestures: Vec<String> = ["REST", "NEXT", "PREV", "SELECT"]
            .iter()
            .map(|g| g.to_string())
            .collect();

        let mut keystroke_bindings = BTreeMap::new();
        keystroke_bindings.insert('r', "REST".to_string());
        keystroke_bindings.insert('n', "NEXT".to_string());
        keystroke_bindings.insert('p', "PREV".to_string());
        keystroke_bindings.insert('s', "SELECT".to_string());

        Self {
            data_dir: ml_dir.join("data").join("gesture_raw"),
            models_dir: ml_dir.join("models"),
            gestures,
            default_frame_count: 100,
            countdown_seconds: 3,
            max_prompt_attempts: 10,
            recommended_samples_per_gesture: 120,
            keystroke_bindings,
            quit_key: 'q',
            test_fraction: 0.2,
            random_seed: 42,
            n_estimators: 200,
            max_depth: None,
            min_samples_split: 2,
            pose: PoseConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, creating it with defaults if it doesn't exist
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = Self::get_config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Self::default();
            config.save_to(&config_path)?;
            Ok(config)
        }
    }

    /// Load and validate configuration from an explicit file
    pub fn load_from(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.save_to(&Self::get_config_path()?)
    }

    /// Save configuration to an explicit file
    pub fn save_to(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        if self.gestures.is_empty() {
            return Err("Gesture vocabulary cannot be empty".into());
        }

        let mut seen = HashSet::new();
        for gesture in &self.gestures {
            if gesture.trim().is_empty() {
                return Err("Gesture names cannot be blank".into());
            }
            if gesture.trim().eq_ignore_ascii_case("EXIT") {
                return Err("'EXIT' is reserved and cannot be a gesture name".into());
            }
            if !seen.insert(gesture.to_uppercase()) {
                return Err(format!("Duplicate gesture in vocabulary: {}", gesture).into());
            }
        }

        if self.default_frame_count == 0 {
            return Err("Default frame count must be at least 1".into());
        }

        if self.max_prompt_attempts == 0 {
            return Err("Prompt attempts must be at least 1".into());
        }

        for (key, gesture) in &self.keystroke_bindings {
            if *key == self.quit_key {
                return Err(format!("Key '{}' is bound to {} and is also the quit key", key, gesture).into());
            }
            if !self.gestures.contains(gesture) {
                return Err(format!(
                    "Key '{}' is bound to {}, which is not in the gesture vocabulary",
                    key, gesture
                )
                .into());
            }
        }

        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(format!(
                "Invalid test fraction: {}. Must be between 0.0 and 1.0 (exclusive)",
                self.test_fraction
            )
            .into());
        }

        if self.n_estimators == 0 {
            return Err("Ensemble must have at least one tree".into());
        }

        if self.max_depth == Some(0) {
            return Err("Maximum tree depth must be at least 1".into());
        }

        if self.min_samples_split < 2 {
            return Err(format!(
                "Invalid min_samples_split: {}. Must be at least 2",
                self.min_samples_split
            )
            .into());
        }

        if !(0.0..=1.0).contains(&self.pose.min_detection_confidence) {
            return Err(format!(
                "Invalid detection confidence: {}. Must be between 0.0 and 1.0",
                self.pose.min_detection_confidence
            )
            .into());
        }

        if !(0.0..=1.0).contains(&self.pose.min_tracking_confidence) {
            return Err(format!(
                "Invalid tracking confidence: {}. Must be between 0.0 and 1.0",
                self.pose.min_tracking_confidence
            )
            .into());
        }

        if self.pose.landmark_count == 0 {
            return Err("Landmark count must be at least 1".into());
        }

        Ok(())
    }

    /// Reset to default configuration
    pub fn reset() -> Result<Self, Box<dyn std::error::Error>> {
        let config = Self::default();
        config.save()?;
        Ok(config)
    }

    /// Get the configuration file path
    pub fn get_config_path() -> Result<PathBuf, Box<dyn std::error::Error>> {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .map_err(|_| "Could not determine home directory")?;

        let mut path = PathBuf::from(home);
        path.push(".gesture_lab");
        path.push("config");
        path.push("settings.json");

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn get_test_config_path() -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("gesture_lab_test_config_{}", uuid::Uuid::new_v4()));
        path.push("settings.json");
        path
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.gestures, vec!["REST", "NEXT", "PREV", "SELECT"]);
        assert_eq!(config.default_frame_count, 100);
        assert_eq!(config.countdown_seconds, 3);
        assert_eq!(config.test_fraction, 0.2);
        assert_eq!(config.random_seed, 42);
        assert_eq!(config.n_estimators, 200);
        assert_eq!(config.quit_key, 'q');
        assert_eq!(config.keystroke_bindings.get(&'n'), Some(&"NEXT".to_string()));
        assert!(config.data_dir.ends_with("ml/data/gesture_raw"));
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.gestures.push("rest".to_string());
        assert!(config.validate().is_err());
        config.gestures.pop();

        config.gestures.push("Exit".to_string());
        assert!(config.validate().is_err());
        config.gestures.pop();

        config.test_fraction = 1.0;
        assert!(config.validate().is_err());
        config.test_fraction = 0.0;
        assert!(config.validate().is_err());
        config.test_fraction = 0.2;

        config.n_estimators = 0;
        assert!(config.validate().is_err());
        config.n_estimators = 200;

        config.min_samples_split = 1;
        assert!(config.validate().is_err());
        config.min_samples_split = 2;

        config.keystroke_bindings.insert('w', "WAVE".to_string());
        assert!(config.validate().is_err());
        config.keystroke_bindings.remove(&'w');

        config.keystroke_bindings.insert('q', "REST".to_string());
        assert!(config.validate().is_err());
        config.keystroke_bindings.remove(&'q');

        config.pose.min_detection_confidence = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{"n_estimators": 10}"#).unwrap();
        assert_eq!(config.n_estimators, 10);
        assert_eq!(config.default_frame_count, 100);
    }

    #[test]
    fn test_save_and_load_from_path() {
        let path = get_test_config_path();
        let mut config = Config::default();
        config.default_frame_count = 150;

        config.save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);

        if let Some(parent) = path.parent() {
            let _ = fs::remove_dir_all(parent);
        }
    }
}

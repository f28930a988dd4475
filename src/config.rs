use serde::{Deserialize, Serialize};

use crate::constants::MAX_SPEED;
use crate::error::ConfigError;
use crate::types::PolicyKind;

/// Simulation parameters for one difficulty tier.
///
/// Ghost `i` is built from `ghost_speeds[i]` and `ghost_policies[i]`; surplus
/// entries in the longer list are ignored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DifficultyConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "ghostSpeeds")]
    pub ghost_speeds: Vec<f32>,
    #[serde(rename = "ghostPolicies")]
    pub ghost_policies: Vec<PolicyKind>,
    /// Ticks between distance field rebuilds.
    #[serde(rename = "recalcEvery")]
    pub recalc_every: u32,
}

impl DifficultyConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: DifficultyConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn ghost_count(&self) -> usize {
        self.ghost_speeds.len().min(self.ghost_policies.len())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.recalc_every == 0 {
            return Err(ConfigError::InvalidCadence);
        }
        if self.ghost_count() == 0 {
            return Err(ConfigError::NoGhosts);
        }
        for (index, &speed) in self.ghost_speeds.iter().enumerate() {
            if !speed.is_finite() || speed <= 0.0 || speed > MAX_SPEED {
                return Err(ConfigError::InvalidSpeed {
                    index,
                    speed,
                    max: MAX_SPEED,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::get_difficulty_config;
    use crate::types::Difficulty;

    #[test]
    fn builtin_tables_validate() {
        for difficulty in Difficulty::ALL {
            let config = get_difficulty_config(difficulty);
            assert!(config.validate().is_ok(), "{} failed", config.name);
            assert_eq!(config.ghost_count(), 4);
        }
    }

    #[test]
    fn parses_json_document() {
        let raw = r#"{
            "name": "Custom",
            "ghostSpeeds": [1.2, 1.0],
            "ghostPolicies": ["genius", "patrol"],
            "recalcEvery": 3
        }"#;
        let config = DifficultyConfig::from_json_str(raw).expect("valid config");
        assert_eq!(config.ghost_policies, vec![PolicyKind::Genius, PolicyKind::Patrol]);
        assert_eq!(config.recalc_every, 3);
        assert!(config.description.is_empty());
    }

    #[test]
    fn rejects_zero_cadence() {
        let raw = r#"{"name":"x","ghostSpeeds":[1.0],"ghostPolicies":["dumb"],"recalcEvery":0}"#;
        assert!(matches!(
            DifficultyConfig::from_json_str(raw),
            Err(ConfigError::InvalidCadence)
        ));
    }

    #[test]
    fn rejects_speed_above_half_tile() {
        let raw = r#"{"name":"x","ghostSpeeds":[30.0],"ghostPolicies":["dumb"],"recalcEvery":4}"#;
        assert!(matches!(
            DifficultyConfig::from_json_str(raw),
            Err(ConfigError::InvalidSpeed { index: 0, .. })
        ));
    }

    #[test]
    fn rejects_empty_roster_and_garbage() {
        let raw = r#"{"name":"x","ghostSpeeds":[],"ghostPolicies":["dumb"],"recalcEvery":4}"#;
        assert!(matches!(
            DifficultyConfig::from_json_str(raw),
            Err(ConfigError::NoGhosts)
        ));
        assert!(matches!(
            DifficultyConfig::from_json_str("{"),
            Err(ConfigError::Parse(_))
        ));
    }
}

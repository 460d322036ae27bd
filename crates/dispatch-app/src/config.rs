//! Host configuration read from the environment.

use thiserror::Error;

use dispatch_core::enums::Difficulty;
use dispatch_sim::SimConfig;

pub const SEED_VAR: &str = "DISPATCH_SEED";
pub const DIFFICULTY_VAR: &str = "DISPATCH_DIFFICULTY";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be an unsigned integer, got '{value}'")]
    InvalidSeed { name: &'static str, value: String },

    #[error("{name} must be one of easy, normal, hard; got '{value}'")]
    InvalidDifficulty { name: &'static str, value: String },
}

/// Build a `SimConfig` from `DISPATCH_SEED` and `DISPATCH_DIFFICULTY`.
/// Unset variables keep the defaults.
pub fn sim_config_from_env() -> Result<SimConfig, ConfigError> {
    sim_config_from(|name| std::env::var(name).ok())
}

pub fn sim_config_from(lookup: impl Fn(&str) -> Option<String>) -> Result<SimConfig, ConfigError> {
    let mut config = SimConfig::default();

    if let Some(value) = lookup(SEED_VAR) {
        config.seed = value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidSeed {
                name: SEED_VAR,
                value: value.clone(),
            })?;
    }

    if let Some(value) = lookup(DIFFICULTY_VAR) {
        config.difficulty =
            parse_difficulty(&value).ok_or_else(|| ConfigError::InvalidDifficulty {
                name: DIFFICULTY_VAR,
                value: value.clone(),
            })?;
    }

    Ok(config)
}

fn parse_difficulty(value: &str) -> Option<Difficulty> {
    let spelled = serde_json::Value::String(value.trim().to_ascii_lowercase());
    serde_json::from_value(spelled).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = sim_config_from(lookup(&[])).unwrap();
        assert_eq!(config.seed, SimConfig::default().seed);
        assert_eq!(config.difficulty, Difficulty::Normal);
    }

    #[test]
    fn test_reads_seed_and_difficulty() {
        let vars = [(SEED_VAR, "1234"), (DIFFICULTY_VAR, "Hard")];
        let config = sim_config_from(lookup(&vars)).unwrap();
        assert_eq!(config.seed, 1234);
        assert_eq!(config.difficulty, Difficulty::Hard);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            sim_config_from(lookup(&[(SEED_VAR, "-3")])),
            Err(ConfigError::InvalidSeed { .. })
        ));
        assert!(matches!(
            sim_config_from(lookup(&[(DIFFICULTY_VAR, "nightmare")])),
            Err(ConfigError::InvalidDifficulty { .. })
        ));
    }

    #[test]
    fn test_difficulty_uses_serialized_names() {
        for difficulty in [Difficulty::Easy, Difficulty::Normal, Difficulty::Hard] {
            let name = serde_json::to_value(difficulty).unwrap();
            let name = name.as_str().unwrap().to_string();
            let config = sim_config_from(lookup(&[(DIFFICULTY_VAR, name.as_str())])).unwrap();
            assert_eq!(config.difficulty, difficulty);
        }
        assert_eq!(parse_difficulty(" EASY "), Some(Difficulty::Easy));
    }
}

//! Engine configuration read from the environment.
//!
//! Values come from process environment variables, optionally seeded from
//! `.env.local` / `.env` at the repository root by the binary.

use std::path::PathBuf;
use std::time::Duration;

use questkeeper_domain::DmModel;

/// Default Gemini REST endpoint.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default model for portraits.
pub const DEFAULT_IMAGE_MODEL: &str = "imagen-3.0-generate-002";

/// Maximum narration round-trips per player action.
pub const DEFAULT_MAX_DICE_ROUNDS: usize = 5;

/// Narration requests can be slow.
pub const DEFAULT_NARRATION_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),
    #[error("Invalid value for {name}: '{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub gemini_api_key: String,
    pub gemini_base_url: String,
    pub dm_model: DmModel,
    pub image_model: String,
    pub max_dice_rounds: usize,
    pub narration_timeout: Duration,
    pub save_dir: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: String::new(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            dm_model: DmModel::default(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            max_dice_rounds: DEFAULT_MAX_DICE_ROUNDS,
            narration_timeout: Duration::from_secs(DEFAULT_NARRATION_TIMEOUT_SECS),
            save_dir: PathBuf::from("saves"),
        }
    }
}

impl EngineConfig {
    /// Read configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let gemini_api_key = get("GEMINI_API_KEY")
            .or_else(|| get("API_KEY"))
            .ok_or(ConfigError::Missing("GEMINI_API_KEY"))?;

        let max_dice_rounds = match get("MAX_DICE_ROUNDS") {
            Some(raw) => match raw.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "MAX_DICE_ROUNDS",
                        value: raw,
                    })
                }
            },
            None => defaults.max_dice_rounds,
        };

        let narration_timeout = match get("NARRATION_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::Invalid {
                    name: "NARRATION_TIMEOUT_SECS",
                    value: raw,
                })?,
            None => defaults.narration_timeout,
        };

        Ok(Self {
            gemini_api_key,
            gemini_base_url: get("GEMINI_BASE_URL").unwrap_or(defaults.gemini_base_url),
            dm_model: get("DM_MODEL").map(DmModel::from).unwrap_or(defaults.dm_model),
            image_model: get("IMAGE_MODEL").unwrap_or(defaults.image_model),
            max_dice_rounds,
            narration_timeout,
            save_dir: get("SAVE_DIR").map(PathBuf::from).unwrap_or(defaults.save_dir),
        })
    }
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
    fn test_defaults_apply_when_unset() {
        let config = EngineConfig::from_lookup(lookup(&[("GEMINI_API_KEY", "k")])).unwrap();
        assert_eq!(config.gemini_api_key, "k");
        assert_eq!(config.gemini_base_url, DEFAULT_GEMINI_BASE_URL);
        assert_eq!(config.dm_model, DmModel::Pro);
        assert_eq!(config.max_dice_rounds, 5);
        assert_eq!(config.save_dir, PathBuf::from("saves"));
    }

    #[test]
    fn test_missing_api_key_is_an_error() {
        assert_eq!(
            EngineConfig::from_lookup(lookup(&[])),
            Err(ConfigError::Missing("GEMINI_API_KEY"))
        );
    }

    #[test]
    fn test_overrides_are_parsed() {
        let config = EngineConfig::from_lookup(lookup(&[
            ("API_KEY", "legacy"),
            ("DM_MODEL", "gemini-2.5-flash"),
            ("MAX_DICE_ROUNDS", "3"),
            ("NARRATION_TIMEOUT_SECS", "30"),
            ("SAVE_DIR", "/tmp/qk"),
        ]))
        .unwrap();
        assert_eq!(config.gemini_api_key, "legacy");
        assert_eq!(config.dm_model, DmModel::Flash);
        assert_eq!(config.max_dice_rounds, 3);
        assert_eq!(config.narration_timeout, Duration::from_secs(30));
        assert_eq!(config.save_dir, PathBuf::from("/tmp/qk"));
    }

    #[test]
    fn test_invalid_round_limit_is_rejected() {
        let result = EngineConfig::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "k"),
            ("MAX_DICE_ROUNDS", "0"),
        ]));
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                name: "MAX_DICE_ROUNDS",
                ..
            })
        ));
    }
}

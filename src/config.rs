//! Configuration types.

use std::path::PathBuf;

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::llm::{GenerationSettings, LlmBackend, LlmConfig};

/// Application title, used for the terminal banner and exported documents.
pub const APP_TITLE: &str = "Pregnancy & Postpartum Wellness Planner";

/// Planner configuration, read from the environment at startup.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Which LLM to talk to and how to authenticate.
    pub llm: LlmConfig,
    /// Sampling settings for every generation call.
    pub generation: GenerationSettings,
    /// Directory the wellness plan PDF is written to.
    pub output_dir: PathBuf,
    /// Directory searched for the optional `background.*` image.
    pub asset_dir: PathBuf,
    /// When set, logs are written to a daily rolling file in this directory.
    pub log_dir: Option<PathBuf>,
}

impl PlannerConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let backend: LlmBackend = match var("WELLNESS_LLM_BACKEND") {
            Some(raw) => raw.parse().map_err(|message| ConfigError::InvalidValue {
                key: "WELLNESS_LLM_BACKEND".to_string(),
                message,
            })?,
            None => LlmBackend::Gemini,
        };

        let key_var = backend.api_key_var();
        let api_key = var(key_var).ok_or_else(|| ConfigError::MissingEnvVar(key_var.to_string()))?;

        let model = var("WELLNESS_MODEL").unwrap_or_else(|| backend.default_model().to_string());

        let defaults = GenerationSettings::default();
        let temperature = match var("WELLNESS_TEMPERATURE") {
            Some(raw) => {
                let value: f32 = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    key: "WELLNESS_TEMPERATURE".to_string(),
                    message: format!("'{raw}' is not a number"),
                })?;
                if !(0.0..=2.0).contains(&value) {
                    return Err(ConfigError::InvalidValue {
                        key: "WELLNESS_TEMPERATURE".to_string(),
                        message: format!("{value} is outside 0.0..=2.0"),
                    });
                }
                value
            }
            None => defaults.temperature,
        };

        let max_tokens = match var("WELLNESS_MAX_TOKENS") {
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "WELLNESS_MAX_TOKENS".to_string(),
                        message: format!("'{raw}' is not a positive integer"),
                    });
                }
            },
            None => defaults.max_tokens,
        };

        Ok(Self {
            llm: LlmConfig {
                backend,
                api_key: SecretString::from(api_key),
                model,
            },
            generation: GenerationSettings {
                temperature,
                max_tokens,
            },
            output_dir: var("WELLNESS_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
            asset_dir: var("WELLNESS_ASSET_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
            log_dir: var("WELLNESS_LOG_DIR").map(PathBuf::from),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<PlannerConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        PlannerConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_to_gemini() {
        let config = load(&[("GEMINI_API_KEY", "g-key")]).unwrap();
        assert_eq!(config.llm.backend, LlmBackend::Gemini);
        assert_eq!(config.llm.model, "gemini-1.5-flash");
        assert_eq!(config.llm.api_key.expose_secret(), "g-key");
        assert_eq!(config.generation.max_tokens, 2048);
        assert_eq!(config.output_dir, PathBuf::from("."));
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn missing_key_names_the_variable() {
        let err = load(&[("WELLNESS_LLM_BACKEND", "anthropic")]).unwrap_err();
        match err {
            ConfigError::MissingEnvVar(name) => assert_eq!(name, "ANTHROPIC_API_KEY"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn blank_values_count_as_unset() {
        let err = load(&[("GEMINI_API_KEY", "   ")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(_)));
    }

    #[test]
    fn overrides_are_applied() {
        let config = load(&[
            ("WELLNESS_LLM_BACKEND", "openai"),
            ("OPENAI_API_KEY", "sk-test"),
            ("WELLNESS_MODEL", "gpt-4o-mini"),
            ("WELLNESS_TEMPERATURE", "0.3"),
            ("WELLNESS_MAX_TOKENS", "512"),
            ("WELLNESS_OUTPUT_DIR", "/tmp/plans"),
            ("WELLNESS_ASSET_DIR", "assets"),
            ("WELLNESS_LOG_DIR", "logs"),
        ])
        .unwrap();
        assert_eq!(config.llm.backend, LlmBackend::OpenAi);
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.generation.temperature, 0.3);
        assert_eq!(config.generation.max_tokens, 512);
        assert_eq!(config.output_dir, PathBuf::from("/tmp/plans"));
        assert_eq!(config.asset_dir, PathBuf::from("assets"));
        assert_eq!(config.log_dir, Some(PathBuf::from("logs")));
    }

    #[test]
    fn rejects_bad_values() {
        for (key, value) in [
            ("WELLNESS_LLM_BACKEND", "llama"),
            ("WELLNESS_TEMPERATURE", "warm"),
            ("WELLNESS_TEMPERATURE", "3.5"),
            ("WELLNESS_MAX_TOKENS", "0"),
            ("WELLNESS_MAX_TOKENS", "-4"),
        ] {
            let err = load(&[("GEMINI_API_KEY", "k"), (key, value)]).unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidValue { .. }),
                "{key}={value} should be rejected"
            );
        }
    }
}

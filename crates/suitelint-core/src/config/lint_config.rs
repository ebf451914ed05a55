//! Lint configuration with layered resolution.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Tool configuration.
///
/// Resolution order (highest priority first):
/// 1. Environment variables (`SUITELINT_*`)
/// 2. Project config (`suitelint.toml` in project root)
/// 3. Compiled defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LintConfig {
    /// Name prefix that marks a function as a test entry point.
    pub test_prefix: String,
    /// Assertion count above which assertion roulette fires.
    pub max_assertions: usize,
    /// Combination count above which parametrize explosion fires.
    pub max_parametrize_combinations: usize,
    /// Numeric literals allowed in assertions without being "magic".
    pub magic_assert_number_allowlist: Vec<f64>,
    /// String literals allowed in assertions without being "magic".
    pub magic_assert_string_allowlist: Vec<String>,
    /// Rule symbols to suppress entirely.
    pub disabled_rules: Vec<String>,
    /// Method names counted as database commits.
    pub db_commit_methods: Vec<String>,
    /// Method names counted as database rollbacks.
    pub db_rollback_methods: Vec<String>,
    /// Path of the external validation cache, relative to the project root.
    pub cache_path: PathBuf,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            test_prefix: "test_".to_string(),
            max_assertions: 3,
            max_parametrize_combinations: 20,
            magic_assert_number_allowlist: vec![-1.0, 0.0, 1.0],
            magic_assert_string_allowlist: vec![String::new()],
            disabled_rules: Vec::new(),
            db_commit_methods: vec![
                "commit".to_string(),
                "save".to_string(),
                "create".to_string(),
                "update_or_create".to_string(),
                "bulk_create".to_string(),
                "bulk_update".to_string(),
            ],
            db_rollback_methods: vec!["rollback".to_string()],
            cache_path: PathBuf::from(".suitelint_cache.json"),
        }
    }
}

impl LintConfig {
    /// Load configuration with layered resolution.
    ///
    /// Resolution order (highest priority first):
    /// 1. Environment variables (`SUITELINT_*`)
    /// 2. Project config (`suitelint.toml` in `root`)
    /// 3. Compiled defaults
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let project_config_path = root.join("suitelint.toml");
        if project_config_path.exists() {
            let raw = std::fs::read_to_string(&project_config_path).map_err(|source| {
                ConfigError::Io {
                    path: project_config_path.display().to_string(),
                    source,
                }
            })?;
            config = toml::from_str(&raw).map_err(|e| ConfigError::ParseError {
                path: project_config_path.display().to_string(),
                message: e.to_string(),
            })?;
        }

        Self::apply_env_overrides(&mut config);
        Self::validate(&config)?;

        Ok(config)
    }

    /// Load configuration from a TOML string (for testing).
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })?;
        Self::validate(&config)?;
        Ok(config)
    }

    fn apply_env_overrides(config: &mut Self) {
        if let Ok(prefix) = std::env::var("SUITELINT_TEST_PREFIX") {
            if !prefix.is_empty() {
                config.test_prefix = prefix;
            }
        }
        if let Ok(raw) = std::env::var("SUITELINT_MAX_ASSERTIONS") {
            if let Ok(value) = raw.parse::<usize>() {
                config.max_assertions = value;
            }
        }
        if let Ok(raw) = std::env::var("SUITELINT_MAX_PARAMETRIZE_COMBINATIONS") {
            if let Ok(value) = raw.parse::<usize>() {
                config.max_parametrize_combinations = value;
            }
        }
    }

    /// Validate the configuration values.
    pub fn validate(config: &Self) -> Result<(), ConfigError> {
        if config.test_prefix.is_empty() {
            return Err(ConfigError::ValidationFailed {
                field: "test-prefix".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if config.max_assertions == 0 {
            return Err(ConfigError::ValidationFailed {
                field: "max-assertions".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if config.max_parametrize_combinations == 0 {
            return Err(ConfigError::ValidationFailed {
                field: "max-parametrize-combinations".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Whether a numeric assert operand counts as a magic constant.
    pub fn is_magic_number(&self, value: f64) -> bool {
        !self
            .magic_assert_number_allowlist
            .iter()
            .any(|allowed| (allowed - value).abs() < f64::EPSILON)
    }

    /// Whether a string assert operand counts as a magic constant.
    pub fn is_magic_string(&self, value: &str) -> bool {
        !self
            .magic_assert_string_allowlist
            .iter()
            .any(|allowed| allowed == value)
    }

    /// Whether a rule symbol is disabled.
    pub fn is_rule_disabled(&self, symbol: &str) -> bool {
        self.disabled_rules.iter().any(|s| s == symbol)
    }
}

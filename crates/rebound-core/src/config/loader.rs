//! Layered strategy configuration loader
//!
//! Loads strategies from multiple sources with the following precedence (low to high):
//! 1. Embedded presets (built into binary)
//! 2. User config (~/.rebound/strategies.yaml, or an explicit path)
//! 3. Environment variables (REBOUND_* prefix)
//!
//! Phases from a later source replace same-named phases from an earlier one.

use super::RecoveryConfig;
use crate::error::{Error, Result};
use crate::types::RetryPolicyOverrides;
use camino::{Utf8Path, Utf8PathBuf};
use rust_embed::RustEmbed;
use std::env;
use std::fs;

/// Name of the embedded preset file
const PRESETS_FILE: &str = "presets.yaml";

/// Name of the user strategy file inside the config directory
const USER_CONFIG_FILE: &str = "strategies.yaml";

/// Embedded preset strategies
#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/../../embedded/"]
struct EmbeddedPresets;

pub struct ConfigLoader {
    config_dir: Utf8PathBuf,
}

impl ConfigLoader {
    /// Loader rooted at the standard config directory (~/.rebound)
    pub fn new() -> Result<Self> {
        Ok(Self {
            config_dir: Self::default_config_dir()?,
        })
    }

    pub fn with_dir(config_dir: Utf8PathBuf) -> Self {
        Self { config_dir }
    }

    /// HOME is preferred over `dirs::home_dir()` so container overrides apply
    fn default_config_dir() -> Result<Utf8PathBuf> {
        let home = env::var("HOME")
            .ok()
            .map(Utf8PathBuf::from)
            .or_else(|| dirs::home_dir().and_then(|p| Utf8PathBuf::from_path_buf(p).ok()))
            .ok_or_else(|| Error::invalid_config("Could not determine home directory"))?;

        Ok(home.join(".rebound"))
    }

    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    pub fn user_config_path(&self) -> Utf8PathBuf {
        self.config_dir.join(USER_CONFIG_FILE)
    }

    /// Presets, then the user file if present, then environment overrides
    pub fn load(&self) -> Result<RecoveryConfig> {
        let mut config = Self::embedded_presets()?;

        let user_path = self.user_config_path();
        if user_path.exists() {
            config.merge(Self::load_yaml_file(&user_path)?);
        } else {
            tracing::debug!(path = %user_path, "no user strategy file");
        }

        self.finish(config)
    }

    /// Presets, then `path` (which must exist), then environment overrides
    pub fn load_from(&self, path: &Utf8Path) -> Result<RecoveryConfig> {
        if !path.exists() {
            return Err(Error::config_not_found(path.as_str()));
        }

        let mut config = Self::embedded_presets()?;
        config.merge(Self::load_yaml_file(path)?);
        self.finish(config)
    }

    /// The preset strategies shipped with the binary
    pub fn embedded_presets() -> Result<RecoveryConfig> {
        let embedded_file = EmbeddedPresets::get(PRESETS_FILE).ok_or_else(|| {
            Error::config_not_found(format!("Embedded presets not found: {}", PRESETS_FILE))
        })?;

        let content = std::str::from_utf8(&embedded_file.data).map_err(|_| {
            Error::invalid_config(format!("Invalid UTF-8 in embedded presets: {}", PRESETS_FILE))
        })?;

        RecoveryConfig::from_yaml(content).map_err(|e| {
            Error::invalid_config(format!("Failed to parse embedded presets: {}", e))
        })
    }

    fn load_yaml_file(path: &Utf8Path) -> Result<RecoveryConfig> {
        let content = fs::read_to_string(path)?;
        let config = RecoveryConfig::from_yaml(&content)
            .map_err(|e| Error::invalid_config(format!("Failed to parse {}: {}", path, e)))?;
        tracing::debug!(path = %path, phases = config.phases.len(), "loaded strategy file");
        Ok(config)
    }

    fn finish(&self, config: RecoveryConfig) -> Result<RecoveryConfig> {
        let config = Self::apply_env_overrides(config)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply REBOUND_* overrides to every phase's retry policy
    fn apply_env_overrides(mut config: RecoveryConfig) -> Result<RecoveryConfig> {
        let max_attempts = match env::var("REBOUND_MAX_ATTEMPTS") {
            Ok(val) => Some(val.parse::<u32>().map_err(|_| {
                Error::invalid_config("REBOUND_MAX_ATTEMPTS must be a valid number")
            })?),
            Err(_) => None,
        };

        let initial_delay_ms = match env::var("REBOUND_INITIAL_DELAY_MS") {
            Ok(val) => Some(val.parse::<u64>().map_err(|_| {
                Error::invalid_config("REBOUND_INITIAL_DELAY_MS must be a valid number")
            })?),
            Err(_) => None,
        };

        if max_attempts.is_none() && initial_delay_ms.is_none() {
            return Ok(config);
        }

        for overrides in config.phases.values_mut() {
            let policy = overrides
                .retry_policy
                .get_or_insert_with(RetryPolicyOverrides::default);
            if max_attempts.is_some() {
                policy.max_attempts = max_attempts;
            }
            if initial_delay_ms.is_some() {
                policy.initial_delay_ms = initial_delay_ms;
            }
        }

        tracing::debug!(?max_attempts, ?initial_delay_ms, "applied environment overrides");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    fn create_temp_loader() -> (ConfigLoader, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config_dir =
            Utf8PathBuf::from_path_buf(temp_dir.path().to_path_buf()).expect("Invalid UTF-8 path");
        (ConfigLoader::with_dir(config_dir), temp_dir)
    }

    #[test]
    fn test_embedded_presets_parse() {
        let config = ConfigLoader::embedded_presets().unwrap();
        let names: Vec<&str> = config.phase_names().collect();
        assert_eq!(names, vec!["code-generation", "knowledge-collection", "validation"]);
        config.validate().unwrap();
    }

    #[test]
    #[serial]
    fn test_load_without_user_file() {
        let (loader, _temp) = create_temp_loader();
        let config = loader.load().unwrap();
        assert_eq!(config.phases.len(), 3);
    }

    #[test]
    #[serial]
    fn test_user_file_overrides_preset() {
        let (loader, _temp) = create_temp_loader();
        fs::write(
            loader.user_config_path(),
            "phases:\n  validation:\n    minimum-completion-percentage: 95\n  deploy:\n    fallback-label: manual deploy\n",
        )
        .unwrap();

        let config = loader.load().unwrap();
        assert_eq!(config.phases.len(), 4);
        let validation = config.get("validation").unwrap();
        assert_eq!(validation.minimum_completion_percentage, Some(95.0));
        assert!(validation.retry_policy.is_none());
    }

    #[test]
    #[serial]
    fn test_env_overrides_apply_to_every_phase() {
        let (loader, _temp) = create_temp_loader();
        env::set_var("REBOUND_MAX_ATTEMPTS", "5");

        let config = loader.load();
        env::remove_var("REBOUND_MAX_ATTEMPTS");

        for strategy in config.unwrap().resolved() {
            assert_eq!(strategy.retry_policy.max_attempts, 5);
        }
    }

    #[test]
    #[serial]
    fn test_invalid_env_override() {
        let (loader, _temp) = create_temp_loader();
        env::set_var("REBOUND_INITIAL_DELAY_MS", "soon");

        let result = loader.load();
        env::remove_var("REBOUND_INITIAL_DELAY_MS");

        assert!(matches!(result, Err(Error::InvalidConfig { .. })));
    }
}

//! Roadmap generator configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::llm::{LlmError, SUPPORTED_PROVIDERS};

/// Main roadmapgen configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// LLM provider configuration
    pub llm: LlmConfig,

    /// Directory checked first for `.pmt` prompt overrides
    #[serde(rename = "prompts-dir")]
    pub prompts_dir: Option<PathBuf>,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Call this early in startup to fail fast with a clear error message
    /// instead of failing on the first API call.
    pub fn validate(&self) -> Result<()> {
        if !SUPPORTED_PROVIDERS.contains(&self.llm.provider.as_str()) {
            return Err(LlmError::UnsupportedProvider(self.llm.provider.clone()).into());
        }
        self.llm.get_api_key().map(|_| ())
    }

    /// Load configuration with fallback chain
    ///
    /// 1. Explicit `--config` path (errors are fatal)
    /// 2. `./.roadmapgen.yml`
    /// 3. `~/.config/roadmapgen/roadmapgen.yml`
    /// 4. Built-in defaults
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        for candidate in Self::default_locations() {
            if !candidate.exists() {
                continue;
            }
            match Self::load_from_file(&candidate) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", candidate.display(), e);
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is initialized
    ///
    /// Errors are swallowed; the full load reports them once logging is up.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        Self::load(config_path).ok().and_then(|c| c.log_level)
    }

    fn default_locations() -> Vec<PathBuf> {
        let mut locations = vec![PathBuf::from(".roadmapgen.yml")];
        if let Some(config_dir) = dirs::config_dir() {
            locations.push(config_dir.join("roadmapgen").join("roadmapgen.yml"));
        }
        locations
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name (only "anthropic" is supported)
    pub provider: String,

    /// Model identifier sent with every request
    pub model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// File containing the API key, used when the env var is unset
    #[serde(rename = "api-key-file")]
    pub api_key_file: Option<String>,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Transport timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "anthropic".to_string(),
            model: "claude-3-7-sonnet-20250219".to_string(),
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            api_key_file: None,
            base_url: "https://api.anthropic.com".to_string(),
            // Room for the 6000-8000 token roadmaps the prompt asks for
            max_tokens: 10_000,
            timeout_ms: 600_000,
        }
    }
}

impl LlmConfig {
    /// Resolve the API key: environment variable first, then key file
    pub fn get_api_key(&self) -> Result<String> {
        debug!(api_key_env = %self.api_key_env, api_key_file = ?self.api_key_file, "get_api_key: called");
        if let Ok(key) = std::env::var(&self.api_key_env) {
            let key = key.trim().to_string();
            if !key.is_empty() {
                debug!("get_api_key: found in environment");
                return Ok(key);
            }
        }

        if let Some(ref file) = self.api_key_file {
            let path = expand_home(file);
            debug!(?path, "get_api_key: trying key file");
            let key = fs::read_to_string(&path)
                .context(format!("Failed to read API key file {}", path.display()))?
                .trim()
                .to_string();
            if !key.is_empty() {
                return Ok(key);
            }
            return Err(eyre::eyre!("API key file {} is empty", path.display()));
        }

        Err(eyre::eyre!(
            "LLM API key not found. Set the {} environment variable.",
            self.api_key_env
        ))
    }
}

/// Expand a leading `~/` to the home directory
fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.llm.provider, "anthropic");
        assert!(config.log_level.is_none());
        assert!(config.prompts_dir.is_none());
    }

    #[test]
    fn test_llm_config_defaults() {
        let config = LlmConfig::default();

        assert_eq!(config.provider, "anthropic");
        assert!(config.model.contains("sonnet"));
        assert_eq!(config.api_key_env, "ANTHROPIC_API_KEY");
        assert_eq!(config.base_url, "https://api.anthropic.com");
        assert_eq!(config.max_tokens, 10_000);
    }

    #[test]
    fn test_deserialize_config() {
        let yaml = r#"
log-level: debug
prompts-dir: ./my-prompts

llm:
  provider: anthropic
  model: claude-opus-4
  api-key-env: MY_API_KEY
  api-key-file: /tmp/key
  base-url: https://api.example.com
  max-tokens: 8192
  timeout-ms: 60000
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.prompts_dir, Some(PathBuf::from("./my-prompts")));
        assert_eq!(config.llm.model, "claude-opus-4");
        assert_eq!(config.llm.api_key_env, "MY_API_KEY");
        assert_eq!(config.llm.api_key_file.as_deref(), Some("/tmp/key"));
        assert_eq!(config.llm.base_url, "https://api.example.com");
        assert_eq!(config.llm.max_tokens, 8192);
        assert_eq!(config.llm.timeout_ms, 60000);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let yaml = r#"
llm:
  model: claude-haiku
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        // Specified value
        assert_eq!(config.llm.model, "claude-haiku");

        // Defaults for unspecified
        assert_eq!(config.llm.provider, "anthropic");
        assert_eq!(config.llm.api_key_env, "ANTHROPIC_API_KEY");
        assert_eq!(config.llm.max_tokens, 10_000);
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rmg.yml");
        std::fs::write(&path, "llm:\n  max-tokens: 2048\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.llm.max_tokens, 2048);
    }

    #[test]
    fn test_load_explicit_path_missing_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.yml");

        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    #[serial]
    fn test_get_api_key_from_env() {
        let config = LlmConfig {
            api_key_env: "RMG_TEST_KEY_ENV".to_string(),
            ..Default::default()
        };
        // SAFETY: serialized test, no other thread reads this variable
        unsafe { std::env::set_var("RMG_TEST_KEY_ENV", "  sk-test  ") };

        assert_eq!(config.get_api_key().unwrap(), "sk-test");
        assert!(Config { llm: config, ..Default::default() }.validate().is_ok());

        unsafe { std::env::remove_var("RMG_TEST_KEY_ENV") };
    }

    #[test]
    #[serial]
    fn test_get_api_key_from_file() {
        let dir = TempDir::new().unwrap();
        let key_path = dir.path().join("key");
        std::fs::write(&key_path, "sk-from-file\n").unwrap();

        let config = LlmConfig {
            api_key_env: "RMG_TEST_KEY_UNSET".to_string(),
            api_key_file: Some(key_path.to_string_lossy().into_owned()),
            ..Default::default()
        };
        unsafe { std::env::remove_var("RMG_TEST_KEY_UNSET") };

        assert_eq!(config.get_api_key().unwrap(), "sk-from-file");
    }

    #[test]
    #[serial]
    fn test_get_api_key_missing() {
        let config = LlmConfig {
            api_key_env: "RMG_TEST_KEY_MISSING".to_string(),
            ..Default::default()
        };
        unsafe { std::env::remove_var("RMG_TEST_KEY_MISSING") };

        let err = config.get_api_key().unwrap_err();
        assert!(err.to_string().contains("RMG_TEST_KEY_MISSING"));
        assert!(Config { llm: config, ..Default::default() }.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_validate_reports_unknown_provider_before_missing_key() {
        let config = Config {
            llm: LlmConfig {
                provider: "openai".to_string(),
                api_key_env: "RMG_TEST_KEY_OTHER_PROVIDER".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        unsafe { std::env::remove_var("RMG_TEST_KEY_OTHER_PROVIDER") };

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Unknown LLM provider: 'openai'"));
        assert!(!err.to_string().contains("API key"));
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("/abs/path"), PathBuf::from("/abs/path"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/key"), home.join("key"));
        }
    }
}

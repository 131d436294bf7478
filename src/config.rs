//! planloop configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main planloop configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Reasoning backend configuration
    pub llm: LlmConfig,

    /// Plan generation limits
    pub generator: GeneratorConfig,

    /// Execution strategy and concurrency
    pub executor: ExecutorConfig,

    /// Reflection prompt bounds
    pub reflector: ReflectorConfig,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Call this early to fail fast with a clear message instead of a
    /// missing-key error on the first backend call.
    pub fn validate(&self) -> Result<()> {
        if std::env::var(&self.llm.api_key_env).is_err() {
            return Err(eyre::eyre!(
                "LLM API key not found. Set the {} environment variable.",
                self.llm.api_key_env
            ));
        }
        if self.executor.max_parallel_steps == 0 {
            return Err(eyre::eyre!("executor.max-parallel-steps must be at least 1"));
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path)
                .context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .planloop.yml
        let local_config = PathBuf::from(".planloop.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/planloop/planloop.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("planloop").join("planloop.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!(
                            "Failed to load config from {}: {}",
                            user_config.display(),
                            e
                        );
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Reasoning backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name (currently only "anthropic" supported)
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl LlmConfig {
    /// Read the API key from the configured environment variable
    pub fn api_key(&self) -> Result<String> {
        std::env::var(&self.api_key_env).map_err(|_| {
            eyre::eyre!(
                "API key not found in environment variable {}",
                self.api_key_env
            )
        })
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "anthropic".to_string(),
            model: "claude-sonnet-4-20250514".to_string(),
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            base_url: "https://api.anthropic.com".to_string(),
            max_tokens: 4096,
            timeout_ms: 120_000,
        }
    }
}

/// Plan generation limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Maximum steps the generator will ask for in one plan
    #[serde(rename = "max-steps")]
    pub max_steps: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self { max_steps: 10 }
    }
}

/// Which execution strategy the executor uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStrategy {
    /// One step at a time; the first failure halts the run
    #[default]
    Sequential,
    /// Concurrent steps bounded by `max-parallel-steps`; failures are isolated
    Parallel,
}

impl std::fmt::Display for ExecutionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sequential => write!(f, "sequential"),
            Self::Parallel => write!(f, "parallel"),
        }
    }
}

/// Execution strategy and concurrency
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Strategy to run plans with
    pub strategy: ExecutionStrategy,

    /// Admission gate size for the parallel strategy
    #[serde(rename = "max-parallel-steps")]
    pub max_parallel_steps: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            strategy: ExecutionStrategy::Sequential,
            max_parallel_steps: 4,
        }
    }
}

/// Reflection prompt bounds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReflectorConfig {
    /// Per-step result/error excerpt length in the reflection prompt
    #[serde(rename = "max-excerpt-chars")]
    pub max_excerpt_chars: usize,
}

impl Default for ReflectorConfig {
    fn default() -> Self {
        Self {
            max_excerpt_chars: 200,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.llm.provider, "anthropic");
        assert_eq!(config.generator.max_steps, 10);
        assert_eq!(config.executor.strategy, ExecutionStrategy::Sequential);
        assert_eq!(config.executor.max_parallel_steps, 4);
        assert_eq!(config.reflector.max_excerpt_chars, 200);
    }

    #[test]
    fn test_llm_config_defaults() {
        let config = LlmConfig::default();

        assert_eq!(config.provider, "anthropic");
        assert!(config.model.contains("sonnet"));
        assert_eq!(config.api_key_env, "ANTHROPIC_API_KEY");
        assert_eq!(config.base_url, "https://api.anthropic.com");
    }

    #[test]
    fn test_deserialize_config() {
        let yaml = r#"
llm:
  provider: anthropic
  model: claude-opus-4
  api-key-env: MY_API_KEY
  base-url: https://api.example.com
  max-tokens: 8192
  timeout-ms: 60000

generator:
  max-steps: 6

executor:
  strategy: parallel
  max-parallel-steps: 8

reflector:
  max-excerpt-chars: 300
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.llm.model, "claude-opus-4");
        assert_eq!(config.llm.api_key_env, "MY_API_KEY");
        assert_eq!(config.llm.max_tokens, 8192);
        assert_eq!(config.generator.max_steps, 6);
        assert_eq!(config.executor.strategy, ExecutionStrategy::Parallel);
        assert_eq!(config.executor.max_parallel_steps, 8);
        assert_eq!(config.reflector.max_excerpt_chars, 300);
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
        assert_eq!(config.executor.max_parallel_steps, 4);
    }

    #[test]
    fn test_validate_rejects_zero_parallelism() {
        let mut config = Config::default();
        // Point at a variable that exists so only parallelism can fail
        config.llm.api_key_env = "PATH".to_string();
        config.executor.max_parallel_steps = 0;
        assert!(config.validate().is_err());

        config.executor.max_parallel_steps = 2;
        assert!(config.validate().is_ok());
    }
}

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const TASKWEAVE_DIR: &str = ".taskweave";

pub const MIN_ITERATIONS: usize = 3;
pub const MAX_ITERATIONS: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SearchConfig {
    /// `tavily` or `none`.
    pub provider: String,
    pub api_key: String,
    pub max_results: usize,
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            provider: "tavily".to_string(),
            api_key: String::new(),
            max_results: 5,
            timeout_secs: 15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RecorderConfig {
    pub enabled: bool,
    pub path: PathBuf,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: get_taskweave_dir().join("steps.jsonl"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: Option<String>,
    pub api_key: String,
    pub base_url: Option<String>,
    pub model: String,
    pub temperature: f64,
    pub max_iterations: usize,
    pub call_timeout_secs: u64,
    pub output_dir: PathBuf,
    pub log_level: String,
    pub search: SearchConfig,
    pub recorder: RecorderConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            provider: None,
            api_key: String::new(),
            base_url: None,
            model: "llama3.1".to_string(),
            temperature: 0.0,
            max_iterations: MIN_ITERATIONS,
            call_timeout_secs: 120,
            output_dir: get_taskweave_dir().join("output"),
            log_level: "info".to_string(),
            search: SearchConfig::default(),
            recorder: RecorderConfig::default(),
        }
    }
}

pub fn get_taskweave_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(TASKWEAVE_DIR)
}

pub fn get_config_path() -> PathBuf {
    get_taskweave_dir().join("config.toml")
}

pub fn ensure_home_dir() -> Result<PathBuf> {
    let dir = get_taskweave_dir();

    if !dir.exists() {
        std::fs::create_dir_all(&dir).with_context(|| {
            format!("Failed to create taskweave directory at {}", dir.display())
        })?;
    }

    Ok(dir)
}

impl Config {
    pub fn load_or_init() -> Result<Self> {
        if config_exists() {
            load_config()
        } else {
            let mut config = Config::default();
            config.validate()?;
            Ok(config)
        }
    }

    /// Clamps the iteration budget into range and rejects unusable values.
    pub fn validate(&mut self) -> Result<()> {
        if self.model.trim().is_empty() {
            bail!("Config error: 'model' must not be empty");
        }

        let clamped = self.max_iterations.clamp(MIN_ITERATIONS, MAX_ITERATIONS);
        if clamped != self.max_iterations {
            tracing::warn!(
                requested = self.max_iterations,
                using = clamped,
                "max_iterations out of range, clamping"
            );
            self.max_iterations = clamped;
        }

        if self.call_timeout_secs == 0 {
            bail!("Config error: 'call_timeout_secs' must be greater than zero");
        }

        Ok(())
    }

    pub fn call_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.call_timeout_secs)
    }
}

pub fn load_config() -> Result<Config> {
    let config_path = get_config_path();

    if !config_path.exists() {
        bail!("Config file not found. Run 'taskweave onboard' to set up your configuration.");
    }

    load_from(&config_path)
}

pub fn load_from(config_path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config from {}", config_path.display()))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config from {}", config_path.display()))?;

    config.validate()?;

    Ok(config)
}

pub fn save_config(config: &Config) -> Result<()> {
    ensure_home_dir()?;
    save_to(config, &get_config_path())
}

pub fn save_to(config: &Config, config_path: &Path) -> Result<()> {
    let content =
        toml::to_string_pretty(config).with_context(|| "Failed to serialize config to TOML")?;

    if let Some(parent) = config_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    std::fs::write(config_path, content)
        .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

    Ok(())
}

pub fn config_exists() -> bool {
    get_config_path().exists()
}

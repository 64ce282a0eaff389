use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

use anyhow::Context;

/// Default config template created when no config exists
const DEFAULT_CONFIG: &str = r#"
[defaults]
policy = "policies/default.yml"  # Policy document used when --policy is omitted
out = "runs"                     # Output directory for run artifacts

[logging]
level = "info"  # trace, debug, info, warn, error
"#;

#[derive(Debug, Deserialize, Clone)]
pub struct DefaultsConfig {
    pub policy: String,
    pub out: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub defaults: DefaultsConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Get the global config path: ~/.talon/talon.toml
    fn global_config_path() -> anyhow::Result<PathBuf> {
        let home = dirs::home_dir().context("could not find home directory")?;
        Ok(home.join(".talon").join("talon.toml"))
    }

    /// Ensure global config directory and file exist, creating defaults if needed
    fn ensure_global_config() -> anyhow::Result<PathBuf> {
        let config_path = Self::global_config_path()?;
        let config_dir = config_path
            .parent()
            .context("config path has no parent directory")?;

        if !config_dir.exists() {
            fs::create_dir_all(config_dir)?;
            eprintln!("Created config directory: {}", config_dir.display());
        }

        if !config_path.exists() {
            fs::write(&config_path, DEFAULT_CONFIG.trim())?;
            eprintln!("Created default config: {}", config_path.display());
        }

        Ok(config_path)
    }

    /// Load configuration with layered approach:
    /// 1. Global config: ~/.talon/talon.toml (auto-created if missing)
    /// 2. Local override: ./talon.toml (workspace, optional)
    /// 3. Environment variables with TALON__ prefix (highest priority)
    pub fn load() -> anyhow::Result<Self> {
        // Load .env file from current directory
        dotenvy::dotenv().ok();

        let global_config_path = Self::ensure_global_config()?;

        let config = config::Config::builder()
            .add_source(config::File::from(global_config_path))
            .add_source(config::File::with_name("talon").required(false))
            .add_source(config::Environment::with_prefix("TALON").separator("__"))
            .build()?;

        let config: Self = config.try_deserialize()?;
        Ok(config)
    }
}

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where sitewipe keeps its config, namespaces and logs.
#[derive(Debug, Clone)]
pub struct Home {
    root: PathBuf,
}

impl Home {
    /// Use the given directory, or fall back to ~/.sitewipe
    pub fn resolve(explicit: Option<PathBuf>) -> Self {
        let root = explicit.unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("/tmp"))
                .join(".sitewipe")
        });
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the config file path
    pub fn config_path(&self) -> PathBuf {
        self.root.join("config.toml")
    }

    /// Synced namespace: the nine clear settings
    pub fn sync_path(&self) -> PathBuf {
        self.root.join("sync.json")
    }

    /// Local namespace: managed sites
    pub fn local_path(&self) -> PathBuf {
        self.root.join("local.json")
    }

    /// Get the logs directory
    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    /// Create the home and logs directories
    pub fn init_dirs(&self) -> Result<()> {
        for dir in [self.root.clone(), self.logs_dir()] {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }
        Ok(())
    }
}

/// CLI preferences. The clear settings themselves live in the synced namespace.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Firefox profile to operate on when --profile-dir is not given
    #[serde(default)]
    pub firefox_profile: Option<PathBuf>,

    /// Output format preference
    #[serde(default)]
    pub output_format: OutputFormat,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
    Quiet,
}

impl Config {
    /// Load config from file, or use defaults if it does not exist
    pub fn load(home: &Home) -> Result<Self> {
        let path = home.config_path();
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            let config: Config = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config: {}", path.display()))?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save config to file
    pub fn save(&self, home: &Home) -> Result<()> {
        home.init_dirs()?;
        let path = home.config_path();
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&path, contents)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }
}

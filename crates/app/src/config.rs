//! Command line and configuration file selection

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use foldcard_config::EditorConfig;
use tracing::info;

/// Environment variable naming a config file when `--config` is absent
pub const CONFIG_ENV: &str = "FOLDCARD_CONFIG";

#[derive(Debug, Parser)]
#[command(name = "foldcard")]
#[command(about = "Replay card design scripts and export the face textures")]
pub struct Cli {
    /// Editor settings (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// JSON array of editor commands to replay
    #[arg(long)]
    pub script: Option<PathBuf>,

    /// Directory exported files are written to
    #[arg(long, default_value = ".")]
    pub out: PathBuf,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    pub print_config: bool,
}

impl Cli {
    /// Config file from the command line, falling back to the environment
    pub fn config_path(&self) -> Option<PathBuf> {
        self.config
            .clone()
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
    }

    /// Load the editor configuration, or the defaults when none is given
    pub fn editor_config(&self) -> Result<EditorConfig> {
        match self.config_path() {
            Some(path) => {
                let config = EditorConfig::load(&path)
                    .with_context(|| format!("Failed to load {}", path.display()))?;
                info!("Loaded configuration from {}", path.display());
                Ok(config)
            }
            None => Ok(EditorConfig::default()),
        }
    }
}

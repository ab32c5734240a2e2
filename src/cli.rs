use std::path::PathBuf;

use clap::Parser;

use crate::config::ThemeMode;

/// Veswo: terminal study assistant backed by a local model server
#[derive(Parser, Debug, Clone)]
#[command(name = "veswo")]
#[command(author = "Veswo")]
#[command(version)]
#[command(about = "Terminal study assistant for a local model backend", long_about = None)]
pub struct Cli {
    /// Path to a config.toml to use instead of the platform config directory
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Base URL of the assistant backend. Overrides config.
    #[arg(long, env = "VESWO_BACKEND_URL", value_name = "URL")]
    pub backend_url: Option<String>,

    /// Log level (trace, debug, info, warn, error). Overrides config.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Colour theme. Overrides config.
    #[arg(long, value_enum)]
    pub theme: Option<ThemeMode>,

    /// Start in compact overlay mode
    #[arg(long, default_value_t = false)]
    pub overlay: bool,

    /// Write a default config file (at --config, or the platform location) and exit
    #[arg(long, default_value_t = false)]
    pub init_config: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

mod theme;

pub use theme::{Theme, ThemeMode};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use directories::BaseDirs;

use crate::cli::Cli;
use crate::error::{AssistantError, Result};

const CONFIG_DIR: &str = "veswo";
const MAIN_CONFIG_FILE: &str = "config.toml";
const LOG_FILE: &str = "veswo.log";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub backend: BackendConfig,
    pub presentation: PresentationConfig,
    pub shell: ShellConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub log_level: String,
    pub log_file: Option<PathBuf>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    pub poll_interval_ms: u64,
    /// Unset means the readiness probe retries forever.
    pub max_probe_attempts: Option<u32>,
    pub request_timeout_secs: Option<u64>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            poll_interval_ms: 2000,
            max_probe_attempts: None,
            request_timeout_secs: None,
        }
    }
}

impl BackendConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PresentationConfig {
    pub theme: ThemeMode,
    pub overlay_turns: usize,
    pub start_in_overlay: bool,
    /// Treat `\$` in replies as a literal dollar instead of a math delimiter.
    pub escaped_dollars: bool,
}

impl Default for PresentationConfig {
    fn default() -> Self {
        Self {
            theme: ThemeMode::Light,
            overlay_turns: 3,
            start_in_overlay: false,
            escaped_dollars: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// argv of a command that writes a PNG screenshot to stdout, e.g. `["grim", "-"]`
    pub screenshot_command: Vec<String>,
}

impl AppConfig {
    /// Load from `path`, or the platform config directory when `path` is `None`.
    ///
    /// An explicit `path` must exist. A missing default file yields defaults.
    /// A file that cannot be read or parsed also yields defaults, along with a
    /// warning for the caller to report once logging is up.
    pub fn load(path: Option<&Path>) -> Result<(Self, Option<String>)> {
        let path = match path {
            Some(p) if !p.exists() => {
                return Err(AssistantError::ConfigNotFound {
                    path: p.to_path_buf(),
                })
            }
            Some(p) => p.to_path_buf(),
            None => Self::default_path()?,
        };
        match load_toml_file(&path) {
            Ok(config) => Ok((config.unwrap_or_default(), None)),
            Err(warning) => Ok((Self::default(), Some(warning))),
        }
    }

    /// `config.toml` in the platform config directory.
    pub fn default_path() -> Result<PathBuf> {
        config_dir().map(|dir| dir.join(MAIN_CONFIG_FILE))
    }

    /// Apply command-line overrides on top of file values.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(url) = &cli.backend_url {
            self.backend.base_url = url.clone();
        }
        if let Some(level) = &cli.log_level {
            self.general.log_level = level.clone();
        }
        if let Some(theme) = cli.theme {
            self.presentation.theme = theme;
        }
        if cli.overlay {
            self.presentation.start_in_overlay = true;
        }
    }

    /// Where logs go when `general.log_file` is not set.
    pub fn log_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.general.log_file {
            return Ok(path.clone());
        }
        BaseDirs::new()
            .map(|dirs| dirs.data_local_dir().join(CONFIG_DIR).join(LOG_FILE))
            .ok_or_else(|| AssistantError::Config("Could not determine data directory".to_string()))
    }

    /// Write the default config to `path`. An existing file is left untouched.
    pub fn write_default(path: &Path) -> Result<()> {
        if path.exists() {
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AssistantError::Config(format!("Failed to create config dir: {}", e)))?;
        }
        let content = toml::to_string_pretty(&AppConfig::default())
            .map_err(|e| AssistantError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)
            .map_err(|e| AssistantError::Config(format!("Failed to write config: {}", e)))?;
        Ok(())
    }
}

fn config_dir() -> Result<PathBuf> {
    BaseDirs::new()
        .map(|dirs| dirs.config_dir().join(CONFIG_DIR))
        .ok_or_else(|| AssistantError::Config("Could not determine config directory".to_string()))
}

fn load_toml_file<T>(path: &Path) -> std::result::Result<Option<T>, String>
where
    T: for<'de> Deserialize<'de>,
{
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    toml::from_str(&content)
        .map(Some)
        .map_err(|e| format!("Failed to parse {}: {}", path.display(), e))
}

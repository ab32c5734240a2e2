use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssistantError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image selection failed: {0}")]
    Selection(String),

    #[error("Host shell error: {0}")]
    Shell(#[from] crate::shell::ShellError),

    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error("Event channel closed")]
    ChannelClosed,
}

pub type Result<T> = std::result::Result<T, AssistantError>;

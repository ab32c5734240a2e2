use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{AssistantError, Result};

/// Send `tracing` output to `path`. The terminal belongs to the UI.
///
/// `RUST_LOG` wins over `level`. Keep the returned guard alive until exit or
/// buffered lines are lost.
pub fn init(path: &Path, level: &str) -> Result<WorkerGuard> {
    let dir = path
        .parent()
        .ok_or_else(|| AssistantError::Logging(format!("{} has no parent directory", path.display())))?;
    let file_name = path
        .file_name()
        .ok_or_else(|| AssistantError::Logging(format!("{} is not a file path", path.display())))?;
    std::fs::create_dir_all(dir)?;

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("veswo={}", level)))
        .map_err(|e| AssistantError::Logging(e.to_string()))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false),
        )
        .try_init()
        .map_err(|e| AssistantError::Logging(e.to_string()))?;

    Ok(guard)
}

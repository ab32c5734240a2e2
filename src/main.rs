mod app;
mod backend;
mod cli;
mod config;
mod conversation;
mod dispatch;
mod error;
mod logging;
mod presentation;
mod readiness;
mod render;
mod session;
mod shell;

#[cfg(test)]
mod testing;

use color_eyre::eyre::Result;
use cli::Cli;
use config::AppConfig;

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse_args();

    if cli.init_config {
        let path = match &cli.config {
            Some(path) => path.clone(),
            None => AppConfig::default_path()?,
        };
        AppConfig::write_default(&path)?;
        println!("Config: {}", path.display());
        return Ok(());
    }

    let (mut config, config_warning) = AppConfig::load(cli.config.as_deref())?;
    config.apply_cli(&cli);

    // Held until exit so buffered log lines are flushed
    let _log_guard = logging::init(&config.log_path()?, &config.general.log_level)?;
    if let Some(warning) = config_warning {
        tracing::warn!("{}, using defaults", warning);
        eprintln!("veswo: {}, using defaults", warning);
    }
    tracing::info!(backend = %config.backend.base_url, "Starting veswo");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let mut app = app::App::new(&config)?;
        app.run().await
    })?;

    Ok(())
}
